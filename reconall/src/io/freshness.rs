//! Modification-time dependency checks under a subject directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::trace;

use crate::core::resume::Freshness;
use crate::core::steps::Step;

/// True if every target exists and is strictly newer than every dependency.
///
/// A missing target or dependency makes the check fail; so does an empty
/// target list, since nothing proves the step ran.
pub fn check_depends(targets: &[PathBuf], dependencies: &[PathBuf]) -> bool {
    let Some(oldest_target) = mtimes(targets).and_then(|times| times.into_iter().min()) else {
        return false;
    };
    match mtimes(dependencies) {
        Some(times) => times.into_iter().all(|time| time < oldest_target),
        None => false,
    }
}

fn mtimes(paths: &[PathBuf]) -> Option<Vec<SystemTime>> {
    paths.iter().map(|path| mtime(path)).collect()
}

fn mtime(path: &Path) -> Option<SystemTime> {
    match fs::metadata(path).and_then(|meta| meta.modified()) {
        Ok(time) => Some(time),
        Err(err) => {
            trace!(path = %path.display(), err = %err, "no modification time");
            None
        }
    }
}

/// Freshness oracle rooted at `<subjects_dir>/<subject_id>`.
#[derive(Debug, Clone)]
pub struct SubjectDir {
    root: PathBuf,
}

impl SubjectDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, patterns: &[String]) -> Vec<PathBuf> {
        patterns.iter().map(|rel| self.root.join(rel)).collect()
    }
}

impl Freshness for SubjectDir {
    fn is_satisfied(&self, step: &Step) -> bool {
        check_depends(&self.resolve(&step.outputs), &self.resolve(&step.inputs))
    }
}
