//! Test-only helpers for building FreeSurfer subject directories on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use filetime::FileTime;
use tempfile::TempDir;

use crate::core::steps::Step;

/// A temporary `SUBJECTS_DIR` holding one subject.
pub struct SubjectFixture {
    temp: TempDir,
    subject_id: String,
}

impl SubjectFixture {
    pub fn new(subject_id: &str) -> Result<Self> {
        let temp = tempfile::tempdir().context("create subjects dir")?;
        let fixture = Self {
            temp,
            subject_id: subject_id.to_string(),
        };
        fs::create_dir_all(fixture.subject_dir()).context("create subject dir")?;
        Ok(fixture)
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn subjects_dir(&self) -> &Path {
        self.temp.path()
    }

    pub fn subject_dir(&self) -> PathBuf {
        self.temp.path().join(&self.subject_id)
    }

    /// Absolute path of `rel` inside the subject directory.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.subject_dir().join(rel)
    }

    /// Create `<subject>/mri`, which marks the subject as resumable.
    pub fn mark_started(&self) -> Result<()> {
        fs::create_dir_all(self.path("mri")).context("create mri dir")
    }

    /// Create (or rewrite) `rel` with a modification time `age_secs` in the past.
    pub fn touch(&self, rel: &str, age_secs: u64) -> Result<PathBuf> {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, b"").with_context(|| format!("write {}", path.display()))?;
        let when = SystemTime::now() - Duration::from_secs(age_secs);
        filetime::set_file_mtime(&path, FileTime::from_system_time(when))
            .with_context(|| format!("set mtime {}", path.display()))?;
        Ok(path)
    }

    /// Touch every output of every step, all with the same age.
    pub fn complete_steps(&self, steps: &[Step], age_secs: u64) -> Result<()> {
        for step in steps {
            for output in &step.outputs {
                self.touch(output, age_secs)?;
            }
        }
        Ok(())
    }

    /// Write `contents` to `rel` inside the subject directory.
    pub fn write(&self, rel: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}
