//! Capability-based file helpers for model artefacts and request payloads.
//!
//! Every path is resolved through `cap-std` directory handles so callers
//! never touch ambient `std::fs` directly. [`write_atomic`] stages bytes in
//! a hidden sibling file and renames it over the target, so a reader sees
//! either the previous artefact or the complete new one.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use log::debug;
use std::io::{self, Read, Write};
use std::path::Component;
use std::sync::atomic::{AtomicU64, Ordering};

static STAGING_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Open a UTF-8 file path using ambient authority.
///
/// # Errors
/// Propagates the underlying open error.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Read the whole file at `path` into memory.
///
/// # Errors
/// Propagates open and read errors.
pub fn read_bytes(path: &Utf8Path) -> io::Result<Vec<u8>> {
    let mut file = open_utf8_file(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Open the directory containing `path` and return it with the file name.
///
/// # Errors
/// Fails when `path` has no file name or its parent cannot be opened.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("target should include a file name"))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Create every missing directory above `path`.
///
/// # Errors
/// Propagates directory creation errors.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }

    let (base_dir, relative) = base_dir_and_relative(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base_dir.create_dir_all(&relative)
}

/// Return whether `path` is a regular file.
///
/// # Errors
/// Fails with [`io::ErrorKind::NotFound`] when `path` or its parent is
/// missing, and propagates any other metadata error.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = open_dir_and_file(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.is_file())
}

/// Replace the file at `path` with `bytes` in one rename.
///
/// The bytes go to `.{name}.tmp{pid}.{seq}` next to the target, where
/// `seq` is unique per call within the process, are flushed to disk and
/// then renamed over `path`. Concurrent writers never share a staging file. On failure the staging file is
/// removed and any previous file at `path` is left untouched.
///
/// # Errors
/// Propagates open, write, sync and rename errors.
pub fn write_atomic(path: &Utf8Path, bytes: &[u8]) -> io::Result<()> {
    let (dir, name) = open_dir_and_file(path)?;
    let sequence = STAGING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let staging = format!(".{name}.tmp{}.{sequence}", std::process::id());
    let result = stage_and_rename(&dir, &staging, &name, bytes);
    if result.is_err() && dir.remove_file(&staging).is_ok() {
        debug!("removed staging file {staging} after a failed write to {path}");
    }
    result
}

fn stage_and_rename(dir: &fs_utf8::Dir, staging: &str, name: &str, bytes: &[u8]) -> io::Result<()> {
    let mut file = dir.create(staging)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    dir.rename(staging, dir, name)
}

/// Split a parent path into an ambient base directory and a relative
/// suffix that `cap-std` can resolve beneath it.
///
/// # Errors
/// Fails when the base cannot be opened or the path is not UTF-8.
pub fn base_dir_and_relative(parent: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_parent = parent.as_std_path();

    let (base, relative) = match std_parent.components().next() {
        // Drive or UNC prefix.
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let base = Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .or_else(|_| std_parent.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other("failed to strip prefix from parent path"))?
                .to_path_buf();
            (base, relative)
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other("failed to strip root from absolute path"))?
                .to_path_buf();
            (base, relative)
        }
        _ => (Utf8PathBuf::from("."), std_parent.to_path_buf()),
    };

    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    let relative = Utf8PathBuf::from_path_buf(relative)
        .map_err(|_| io::Error::other("non-UTF-8 parent path"))?;

    Ok((dir, relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn workdir() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
        (dir, root)
    }

    fn entries(root: &Utf8Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(root)
            .expect("list dir")
            .map(|entry| {
                entry
                    .expect("dir entry")
                    .file_name()
                    .into_string()
                    .expect("utf-8 name")
            })
            .collect();
        names.sort();
        names
    }

    #[rstest]
    fn write_atomic_replaces_existing_file(workdir: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workdir;
        let target = root.join("model.bin");
        write_atomic(&target, b"first").expect("first write");
        write_atomic(&target, b"second").expect("second write");

        assert_eq!(read_bytes(&target).expect("read back"), b"second");
        assert_eq!(entries(&root), vec!["model.bin".to_owned()]);
    }

    #[rstest]
    fn concurrent_writes_to_one_target_stage_separately(workdir: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workdir;
        let target_buf = root.join("model.bin");
        let target = target_buf.as_path();
        let payloads: Vec<Vec<u8>> = (0..8_u8).map(|writer| vec![writer; 4096]).collect();

        std::thread::scope(|scope| {
            for payload in &payloads {
                scope.spawn(move || write_atomic(target, payload).expect("concurrent write"));
            }
        });

        let written = read_bytes(target).expect("read back");
        assert!(payloads.contains(&written), "target holds one whole payload");
        assert_eq!(entries(&root), vec!["model.bin".to_owned()]);
    }

    #[rstest]
    fn write_atomic_fails_without_parent(workdir: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workdir;
        let target = root.join("missing").join("model.bin");
        let err = write_atomic(&target, b"bytes").expect_err("parent is missing");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(entries(&root).is_empty());
    }

    #[rstest]
    fn write_atomic_leaves_previous_file_when_rename_fails(workdir: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workdir;
        let target = root.join("occupied");
        std::fs::create_dir(target.as_std_path()).expect("create blocking dir");
        std::fs::write(target.join("keep").as_std_path(), b"x").expect("populate dir");

        assert!(write_atomic(&target, b"bytes").is_err());
        assert_eq!(entries(&root), vec!["occupied".to_owned()]);
    }

    #[rstest]
    fn ensure_parent_dir_creates_nested_directories(workdir: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workdir;
        let target = root.join("a").join("b").join("model.bin");
        ensure_parent_dir(&target).expect("create parents");
        assert!(root.join("a").join("b").as_std_path().is_dir());
    }

    #[rstest]
    fn file_is_file_distinguishes_files(workdir: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workdir;
        let file = root.join("payload.json");
        std::fs::write(file.as_std_path(), b"[]").expect("write payload");

        assert!(file_is_file(&file).expect("inspect file"));
        assert!(!file_is_file(&root).expect("inspect directory"));
        for missing in [root.join("absent.json"), root.join("nope").join("x.json")] {
            let err = file_is_file(&missing).expect_err("missing path should error");
            assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
        }
    }

    #[rstest]
    fn base_dir_and_relative_splits_relative_paths() {
        let (_dir, relative) =
            base_dir_and_relative(Utf8Path::new("artefacts/models")).expect("split path");
        assert_eq!(relative, Utf8PathBuf::from("artefacts/models"));
    }
}
