//! Behavioural coverage for saving and loading model artefacts.

use std::cell::RefCell;

use bincode::Options;
use camino::{Utf8Path, Utf8PathBuf};
use pharmrank_core::test_support::{CandidateBuilder, reference_date};
use pharmrank_core::{Candidate, Scorer, WeightProfile};
use pharmrank_scorer::{
    ARTEFACT_MAGIC, ArtefactError, ModelConfig, RankingModel, SCHEMA_REGRESSOR, load, save,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

/// Temporary directory and the artefact path inside it.
#[derive(Debug)]
pub struct Workspace {
    _dir: TempDir,
    artefact: Utf8PathBuf,
}

/// Fresh workspace for each scenario.
#[fixture]
pub fn workspace() -> Workspace {
    let dir = match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("create temporary directory: {err}"),
    };
    let artefact = match Utf8PathBuf::from_path_buf(dir.path().join("models").join("ranking.bin"))
    {
        Ok(path) => path,
        Err(path) => panic!("temporary path should be UTF-8: {}", path.display()),
    };
    Workspace {
        _dir: dir,
        artefact,
    }
}

/// Reference population and the model fitted on it.
#[fixture]
pub fn fitted() -> RefCell<Option<(Vec<Candidate>, RankingModel)>> {
    RefCell::new(None)
}

/// Outcome of loading the artefact.
#[fixture]
pub fn loaded() -> RefCell<Option<Result<RankingModel, ArtefactError>>> {
    RefCell::new(None)
}

fn write_envelope(path: &Utf8Path, schema: u16, payload: Vec<u8>) {
    let bytes = bincode::DefaultOptions::new()
        .serialize(&(ARTEFACT_MAGIC, schema, payload))
        .unwrap_or_else(|err| panic!("encode envelope: {err}"));
    let parent = path
        .parent()
        .unwrap_or_else(|| panic!("artefact path should have a parent"));
    std::fs::create_dir_all(parent.as_std_path())
        .unwrap_or_else(|err| panic!("create artefact directory: {err}"));
    std::fs::write(path.as_std_path(), bytes)
        .unwrap_or_else(|err| panic!("write artefact: {err}"));
}

#[given("a model fitted on a reference population")]
fn fitted_model(fitted: &RefCell<Option<(Vec<Candidate>, RankingModel)>>) {
    let population = vec![
        CandidateBuilder::new("P001")
            .distance(0.8)
            .price(25.0)
            .stock(90)
            .build(),
        CandidateBuilder::new("P002")
            .distance(8.0)
            .price(20.0)
            .stock(100)
            .expires_in(730)
            .build(),
        CandidateBuilder::new("P003")
            .distance(3.2)
            .price(41.5)
            .stock(12)
            .expires_in(20)
            .build(),
        CandidateBuilder::new("P004")
            .distance(14.0)
            .price(9.99)
            .stock(0)
            .expires_in(-3)
            .build(),
    ];
    let model = RankingModel::fit(&population, WeightProfile::default(), ModelConfig::relative())
        .unwrap_or_else(|err| panic!("fit model: {err}"));
    *fitted.borrow_mut() = Some((population, model));
}

#[given("an artefact with an unknown schema tag on disk")]
fn unknown_schema_artefact(workspace: &Workspace) {
    write_envelope(&workspace.artefact, 7, Vec::new());
}

#[given("a regressor artefact on disk")]
fn regressor_artefact(workspace: &Workspace) {
    write_envelope(&workspace.artefact, SCHEMA_REGRESSOR, vec![1, 2, 3, 4]);
}

#[when("I save and reload the model")]
fn save_and_reload(
    workspace: &Workspace,
    fitted: &RefCell<Option<(Vec<Candidate>, RankingModel)>>,
    loaded: &RefCell<Option<Result<RankingModel, ArtefactError>>>,
) {
    let binding = fitted.borrow();
    let Some((_, model)) = binding.as_ref() else {
        panic!("model must be fitted");
    };
    save(model, &workspace.artefact).unwrap_or_else(|err| panic!("save model: {err}"));
    *loaded.borrow_mut() = Some(load(&workspace.artefact));
}

#[when("I load the artefact")]
fn load_artefact(
    workspace: &Workspace,
    loaded: &RefCell<Option<Result<RankingModel, ArtefactError>>>,
) {
    *loaded.borrow_mut() = Some(load(&workspace.artefact));
}

#[then("the reloaded model scores every candidate identically")]
fn reloaded_scores_match(
    fitted: &RefCell<Option<(Vec<Candidate>, RankingModel)>>,
    loaded: &RefCell<Option<Result<RankingModel, ArtefactError>>>,
) {
    let fitted_binding = fitted.borrow();
    let Some((population, original)) = fitted_binding.as_ref() else {
        panic!("model must be fitted");
    };
    let loaded_binding = loaded.borrow();
    let reloaded = match loaded_binding.as_ref() {
        Some(Ok(model)) => model,
        Some(Err(err)) => panic!("reload should succeed, got {err}"),
        None => panic!("load result must be recorded"),
    };
    let sample = CandidateBuilder::new("sample")
        .distance(30.0)
        .price(1.0)
        .stock(500)
        .build();
    for candidate in population.iter().chain(std::iter::once(&sample)) {
        assert_eq!(
            reloaded.score(candidate, reference_date()),
            original.score(candidate, reference_date()),
            "scores diverge for {}",
            candidate.id
        );
    }
}

#[then("loading fails with an incompatible schema error")]
fn load_fails_incompatible(loaded: &RefCell<Option<Result<RankingModel, ArtefactError>>>) {
    let binding = loaded.borrow();
    match binding.as_ref() {
        Some(Err(ArtefactError::IncompatibleSchema { path, .. })) => {
            assert!(path.as_str().ends_with("ranking.bin"));
        }
        Some(Err(other)) => panic!("unexpected error: {other}"),
        Some(Ok(_)) => panic!("expected the artefact to be rejected"),
        None => panic!("load result must be recorded"),
    }
}

#[scenario(path = "tests/features/artefacts.feature", index = 0)]
fn reloaded_model_scores_like_fitted_model(
    workspace: Workspace,
    fitted: RefCell<Option<(Vec<Candidate>, RankingModel)>>,
    loaded: RefCell<Option<Result<RankingModel, ArtefactError>>>,
) {
    let _ = (workspace, fitted, loaded);
}

#[scenario(path = "tests/features/artefacts.feature", index = 1)]
fn unknown_schema_is_rejected(
    workspace: Workspace,
    fitted: RefCell<Option<(Vec<Candidate>, RankingModel)>>,
    loaded: RefCell<Option<Result<RankingModel, ArtefactError>>>,
) {
    let _ = (workspace, fitted, loaded);
}

#[scenario(path = "tests/features/artefacts.feature", index = 2)]
fn regressor_is_rejected(
    workspace: Workspace,
    fitted: RefCell<Option<(Vec<Candidate>, RankingModel)>>,
    loaded: RefCell<Option<Result<RankingModel, ArtefactError>>>,
) {
    let _ = (workspace, fitted, loaded);
}
