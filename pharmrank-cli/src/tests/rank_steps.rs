//! Behaviour-driven step definitions driving the rank CLI scenarios.

use super::helpers::{Workspace, reference_population, write_candidates};
use super::*;
use crate::rank::{RankReport, run_rank_with};
use pharmrank_core::WeightProfile;
use pharmrank_core::test_support::{CandidateBuilder, reference_date};
use pharmrank_scorer::{ModelConfig, RankingModel, save};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;

#[derive(Debug)]
struct RankWorld {
    workspace: Workspace,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl RankWorld {
    fn new() -> Self {
        Self {
            workspace: Workspace::new(),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn build_command_line(&self) -> Vec<String> {
        vec![
            "pharmrank".to_owned(),
            "rank".to_owned(),
            self.workspace.request().into_string(),
            format!("--{ARG_RANK_MODEL}"),
            self.workspace.model().into_string(),
            format!("--{ARG_RANK_AS_OF}"),
            reference_date().to_string(),
        ]
    }

    fn report(&self) -> RankReport {
        let borrowed = self.result.borrow();
        let result = borrowed.as_ref().expect("result recorded");
        result.as_ref().expect("expected success");
        serde_json::from_slice(&self.stdout.borrow()).expect("output should be a rank report")
    }
}

#[fixture]
fn world() -> RankWorld {
    RankWorld::new()
}

#[given("a fitted model exists on disk")]
fn fitted_model_exists(#[from(world)] world: &RankWorld) {
    let population: Vec<_> = reference_population()
        .iter()
        .map(|record| record.to_candidate().expect("reference record is valid"))
        .collect();
    let model = RankingModel::fit(&population, WeightProfile::default(), ModelConfig::relative())
        .expect("fit model");
    save(&model, &world.workspace.model()).expect("save model");
}

#[given("a candidate batch exists on disk")]
fn candidate_batch_exists(#[from(world)] world: &RankWorld) {
    write_candidates(&world.workspace.request(), &reference_population());
}

#[given("a candidate batch with a duplicate id exists on disk")]
fn batch_with_duplicate_id(#[from(world)] world: &RankWorld) {
    let mut batch = reference_population();
    batch.push(
        CandidateBuilder::new("P001")
            .distance(0.1)
            .price(1.0)
            .stock(500)
            .input(),
    );
    write_candidates(&world.workspace.request(), &batch);
}

#[when("I run the rank command")]
fn run_rank_command(#[from(world)] world: &RankWorld) {
    let invocation = world.build_command_line();
    let parsed = Cli::try_parse_from(invocation).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Rank(args) => {
            let mut buffer = world.stdout.borrow_mut();
            run_rank_with(args, &mut *buffer)
        }
        Command::Fit(_) => panic!("expected rank command"),
    });
    world.result.replace(Some(outcome));
}

#[then("the command succeeds and prints P001 first")]
fn command_prints_p001_first(#[from(world)] world: &RankWorld) {
    let report = world.report();
    let ids: Vec<&str> = report.ranked.iter().map(|entry| entry.id.as_str()).collect();
    assert_eq!(ids.first(), Some(&"P001"));
    assert_eq!(ids.len(), 4);
    assert!(report.skipped.is_empty());
    assert!(
        report
            .ranked
            .iter()
            .all(|entry| (0.0..=1.0).contains(&entry.score))
    );
}

#[then("the duplicate candidate is reported as skipped")]
fn duplicate_is_skipped(#[from(world)] world: &RankWorld) {
    let report = world.report();
    assert_eq!(report.ranked.len(), 4);
    let [skipped] = report.skipped.as_slice() else {
        panic!("expected one skipped candidate, got {:?}", report.skipped);
    };
    assert_eq!(skipped.index, 4);
    assert_eq!(skipped.id.as_deref(), Some("P001"));
    assert!(skipped.reason.contains("duplicate"));
}

#[then("the command fails because the model artefact is missing")]
fn command_fails_missing_model(#[from(world)] world: &RankWorld) {
    let borrowed = world.result.borrow();
    let error = borrowed
        .as_ref()
        .expect("result recorded")
        .as_ref()
        .expect_err("expected error");
    match error {
        CliError::MissingSourceFile { field, path } => {
            assert_eq!(*field, ARG_RANK_MODEL);
            assert_eq!(*path, world.workspace.model());
        }
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

macro_rules! register_rank_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/rank_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: RankWorld) {
            let _ = world;
        }
    };
}

register_rank_scenario!(rank_happy_path, "ranking a batch against a fitted model");
register_rank_scenario!(rank_reports_skipped, "reporting invalid candidates without aborting");
register_rank_scenario!(rank_missing_model, "rejecting a missing model artefact");
