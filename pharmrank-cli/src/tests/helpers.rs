//! Test helpers for laying out candidate files and artefacts on disk.

use camino::{Utf8Path, Utf8PathBuf};
use pharmrank_core::CandidateInput;
use pharmrank_core::test_support::CandidateBuilder;
use tempfile::TempDir;

pub(super) fn write_utf8(path: &Utf8Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent directory");
    }
    std::fs::write(path, bytes).expect("write file");
}

pub(super) fn write_candidates(path: &Utf8Path, candidates: &[CandidateInput]) {
    let payload = serde_json::to_string_pretty(candidates).expect("serialize candidates");
    write_utf8(path, payload.as_bytes());
}

/// Temporary directory with UTF-8 paths for datasets, requests and models.
#[derive(Debug)]
pub(super) struct Workspace {
    _tmp: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let tmp = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
        Self { _tmp: tmp, root }
    }

    pub(super) fn dataset(&self) -> Utf8PathBuf {
        self.root.join("population.json")
    }

    pub(super) fn request(&self) -> Utf8PathBuf {
        self.root.join("request.json")
    }

    pub(super) fn model(&self) -> Utf8PathBuf {
        self.root.join("models").join("ranking.bin")
    }
}

/// Four pharmacies spanning the usual trade-offs, expiring relative to
/// [`pharmrank_core::test_support::reference_date`].
pub(super) fn reference_population() -> Vec<CandidateInput> {
    vec![
        CandidateBuilder::new("P001")
            .distance(0.8)
            .price(25.0)
            .stock(90)
            .expires_in(365)
            .input(),
        CandidateBuilder::new("P002")
            .distance(8.0)
            .price(20.0)
            .stock(100)
            .expires_in(730)
            .input(),
        CandidateBuilder::new("P003")
            .distance(3.2)
            .price(41.5)
            .stock(12)
            .expires_in(20)
            .input(),
        CandidateBuilder::new("P004")
            .distance(14.0)
            .price(9.99)
            .stock(0)
            .expires_in(-3)
            .input(),
    ]
}
