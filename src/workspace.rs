//! Per-problem workspace materialization.
//!
//! A workspace is the template archive's directory tree, unpacked to
//! `<root>/<source>-<id>`, with one designated file replaced by generated
//! code:
//!
//! ```text
//! <root>/
//!   leetcode-1/            ← template root from the archive, renamed
//!     Package.swift
//!     Source/
//!       Global.swift       ← overwritten with generated code
//!     Tests/...
//! ```
//!
//! Each call starts from scratch: an existing workspace for the same problem
//! is removed first. The archive is unpacked into a scratch directory inside
//! `<root>` so the final move is a same-filesystem rename; if the rename is
//! refused, the tree is copied instead.
//!
//! The directory name must be a single path segment under `<root>`; ids that
//! would resolve elsewhere are refused before anything is removed.
//!
//! Nothing is rolled back on failure. Calls for the same target directory
//! are serialized within a process.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::WorkspaceConfig;
use crate::error::IngestError;
use crate::models::ProblemInfo;

const SCRATCH_PREFIX: &str = ".dsakit-extract-";
const MACOS_METADATA_DIR: &str = "__MACOSX";

pub struct WorkspaceMaterializer {
    root: PathBuf,
    template_archive: PathBuf,
    template_root: Option<String>,
    target_file: PathBuf,
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl WorkspaceMaterializer {
    pub fn new(config: &WorkspaceConfig) -> Self {
        Self {
            root: absolutize(&config.root),
            template_archive: config.template_archive.clone(),
            template_root: config
                .template_root
                .clone()
                .filter(|name| !name.trim().is_empty()),
            target_file: config.target_file.clone(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Container directory holding every workspace.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute directory a problem's workspace lives in.
    pub fn workspace_dir(&self, problem: &ProblemInfo) -> PathBuf {
        self.root.join(problem.workspace_name())
    }

    /// Fail with `ResourceMissing` unless the template archive is a file.
    pub fn check_template(&self) -> Result<(), IngestError> {
        if self.template_archive.is_file() {
            Ok(())
        } else {
            Err(IngestError::ResourceMissing(format!(
                "template archive not found: {}",
                self.template_archive.display()
            )))
        }
    }

    /// Workspace directory for `problem`, which must be a direct child of
    /// the root. The id comes from a remote page, so anything that would
    /// resolve elsewhere is refused.
    fn target_dir(&self, problem: &ProblemInfo) -> Result<PathBuf, IngestError> {
        let name = problem.workspace_name();
        let mut components = Path::new(&name).components();
        let single_segment = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_segment || name.contains(['/', '\\', '\0']) {
            return Err(IngestError::Workspace(format!(
                "problem id {:?} is not usable as a directory name",
                problem.id
            )));
        }

        let target = self.root.join(&name);
        if target.parent() != Some(self.root.as_path()) {
            return Err(IngestError::Workspace(format!(
                "{} is outside {}",
                target.display(),
                self.root.display()
            )));
        }
        Ok(target)
    }

    /// Build the workspace for `problem` and write `code` into the target file.
    /// Returns the absolute workspace path.
    pub fn materialize(&self, problem: &ProblemInfo, code: &str) -> Result<PathBuf, IngestError> {
        self.check_template()?;
        let target = self.target_dir(problem)?;

        fs::create_dir_all(&self.root).map_err(|e| {
            workspace_err(format!("creating {}", self.root.display()), e)
        })?;

        let lock = self.lock_for(&target);
        let result = {
            let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            self.build(&target, code)
        };
        self.release_lock(&target, lock);
        result
    }

    fn build(&self, target: &Path, code: &str) -> Result<PathBuf, IngestError> {
        remove_existing(target)?;

        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(&self.root)
            .map_err(|e| workspace_err("creating scratch directory".to_string(), e))?;

        unpack_archive(&self.template_archive, scratch.path())?;

        let template_dir = self.locate_template_dir(scratch.path())?;
        move_tree(&template_dir, target)?;

        let code_path = target.join(&self.target_file);
        if let Some(parent) = code_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| workspace_err(format!("creating {}", parent.display()), e))?;
        }
        fs::write(&code_path, code)
            .map_err(|e| workspace_err(format!("writing {}", code_path.display()), e))?;

        info!(workspace = %target.display(), "workspace materialized");
        Ok(target.to_path_buf())
    }

    fn lock_for(&self, target: &Path) -> Arc<Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(target.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the map entry once no other caller holds the target's lock.
    fn release_lock(&self, target: &Path, lock: Arc<Mutex<()>>) {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // One reference in the map, one here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(target);
        }
    }

    /// The configured template root, or the archive's single top-level
    /// directory, or the whole unpacked tree.
    fn locate_template_dir(&self, unpacked: &Path) -> Result<PathBuf, IngestError> {
        if let Some(name) = &self.template_root {
            let dir = unpacked.join(name);
            if !dir.is_dir() {
                return Err(IngestError::Workspace(format!(
                    "template root '{}' not found in {}",
                    name,
                    self.template_archive.display()
                )));
            }
            return Ok(dir);
        }

        let entries = fs::read_dir(unpacked)
            .map_err(|e| workspace_err(format!("listing {}", unpacked.display()), e))?;
        let top_level: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.file_name().map_or(true, |n| n != MACOS_METADATA_DIR))
            .collect();

        match top_level.as_slice() {
            [single] if single.is_dir() => Ok(single.clone()),
            _ => Ok(unpacked.to_path_buf()),
        }
    }
}

fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn workspace_err(action: String, err: impl std::fmt::Display) -> IngestError {
    IngestError::Workspace(format!("{}: {}", action, err))
}

fn remove_existing(target: &Path) -> Result<(), IngestError> {
    let metadata = match fs::symlink_metadata(target) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(workspace_err(format!("inspecting {}", target.display()), e)),
    };

    debug!(workspace = %target.display(), "removing previous workspace");
    let result = if metadata.is_dir() {
        fs::remove_dir_all(target)
    } else {
        fs::remove_file(target)
    };
    result.map_err(|e| workspace_err(format!("removing {}", target.display()), e))
}

fn unpack_archive(archive_path: &Path, into: &Path) -> Result<(), IngestError> {
    let file = fs::File::open(archive_path).map_err(|e| {
        IngestError::ResourceMissing(format!(
            "template archive {} could not be opened: {}",
            archive_path.display(),
            e
        ))
    })?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| workspace_err(format!("reading {}", archive_path.display()), e))?;
    archive
        .extract(into)
        .map_err(|e| workspace_err(format!("extracting {}", archive_path.display()), e))
}

/// Rename `from` to `to`. Only a cross-device rename falls back to a copy;
/// any other failure (e.g. `to` reappeared and is not empty) is an error.
fn move_tree(from: &Path, to: &Path) -> Result<(), IngestError> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            warn!(error = %e, "rename crosses devices, copying workspace instead");
            copy_tree(from, to)
        }
        Err(e) => Err(workspace_err(
            format!("moving template into {}", to.display()),
            e,
        )),
    }
}

#[cfg(unix)]
const EXDEV: i32 = 18;
// ERROR_NOT_SAME_DEVICE
#[cfg(windows)]
const EXDEV: i32 = 17;

#[cfg(any(unix, windows))]
fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(EXDEV)
}

#[cfg(not(any(unix, windows)))]
fn is_cross_device(_err: &io::Error) -> bool {
    false
}

fn copy_tree(from: &Path, to: &Path) -> Result<(), IngestError> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|e| workspace_err(format!("walking {}", from.display()), e))?;
        let relative = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let dest = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)
                .map_err(|e| workspace_err(format!("creating {}", dest.display()), e))?;
        } else {
            fs::copy(entry.path(), &dest)
                .map_err(|e| workspace_err(format!("copying to {}", dest.display()), e))?;
        }
    }
    Ok(())
}
