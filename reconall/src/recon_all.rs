//! `recon-all` invocation: base command line plus resume flags.
//!
//! The base command is composed from [`ReconAllInputs`] first. Expert options
//! and, for subjects that already have an `mri/` directory, `-no<step>` flags
//! are then layered on top.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use tracing::{debug, info, instrument};

use crate::core::cmdline::CommandLine;
use crate::core::directive::{Directive, Hemisphere, Stage};
use crate::core::resume::{ResumePlan, apply_plan, plan_resume};
use crate::core::selector::select_steps;
use crate::io::config::ReconallConfig;
use crate::io::expert::{is_expert_binary, prepare_expert_args};
use crate::io::freshness::SubjectDir;
use crate::io::runner::RunRequest;

pub const PROGRAM: &str = "recon-all";
pub const DEFAULT_SUBJECT_ID: &str = "recon_all";

/// `-xopts-<mode>` handling of an existing expert-options file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XoptsMode {
    Use,
    Clean,
    Overwrite,
}

impl XoptsMode {
    pub fn as_str(self) -> &'static str {
        match self {
            XoptsMode::Use => "use",
            XoptsMode::Clean => "clean",
            XoptsMode::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for XoptsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for XoptsMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "use" => Ok(XoptsMode::Use),
            "clean" => Ok(XoptsMode::Clean),
            "overwrite" => Ok(XoptsMode::Overwrite),
            other => Err(anyhow!(
                "xopts must be one of use, clean, overwrite; got '{other}'"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconAllInputs {
    pub subject_id: String,
    /// Defaults to the working directory.
    pub subjects_dir: Option<PathBuf>,
    pub stage: Stage,
    pub hemi: Option<Hemisphere>,
    pub t1_files: Vec<PathBuf>,
    pub t2_file: Option<PathBuf>,
    pub use_t2: bool,
    pub flair_file: Option<PathBuf>,
    pub use_flair: bool,
    /// Extra flags passed through verbatim; entries are split on whitespace.
    pub flags: Vec<String>,
    pub openmp: Option<u32>,
    pub parallel: bool,
    pub hires: bool,
    pub mprage: bool,
    pub big_ventricles: bool,
    pub brainstem: bool,
    pub hippocampal_subfields_t1: bool,
    /// Explicit expert file; excludes `expert_options`.
    pub expert: Option<PathBuf>,
    pub xopts: Option<XoptsMode>,
    /// `(binary, args)` pairs written to an expert-options file.
    pub expert_options: Vec<(String, String)>,
    /// Run even when every step is up to date.
    pub force_run: bool,
}

impl Default for ReconAllInputs {
    fn default() -> Self {
        Self {
            subject_id: DEFAULT_SUBJECT_ID.to_string(),
            subjects_dir: None,
            stage: Stage::default(),
            hemi: None,
            t1_files: Vec::new(),
            t2_file: None,
            use_t2: false,
            flair_file: None,
            use_flair: false,
            flags: Vec::new(),
            openmp: None,
            parallel: false,
            hires: false,
            mprage: false,
            big_ventricles: false,
            brainstem: false,
            hippocampal_subfields_t1: false,
            expert: None,
            xopts: None,
            expert_options: Vec::new(),
            force_run: false,
        }
    }
}

impl ReconAllInputs {
    pub fn validate(&self) -> Result<()> {
        let subject_id = self.subject_id.trim();
        if subject_id.is_empty() {
            bail!("subject_id must not be empty");
        }
        if subject_id.contains('/') {
            bail!("subject_id must not contain '/': {subject_id}");
        }
        if self.stage == Stage::Directive(Directive::AutoreconHemi) && self.hemi.is_none() {
            bail!("directive autorecon-hemi requires a hemisphere (lh or rh)");
        }
        if self.openmp == Some(0) {
            bail!("openmp must be > 0");
        }
        if self.expert.is_some() && !self.expert_options.is_empty() {
            bail!("expert file and per-binary expert options are mutually exclusive");
        }
        if let Some((binary, _)) = self
            .expert_options
            .iter()
            .find(|(binary, _)| !is_expert_binary(binary))
        {
            bail!("unknown expert-options binary '{binary}'");
        }
        Ok(())
    }
}

/// A validated `recon-all` invocation rooted at a working directory.
#[derive(Debug, Clone)]
pub struct ReconAll {
    inputs: ReconAllInputs,
    workdir: PathBuf,
}

impl ReconAll {
    pub fn new(inputs: ReconAllInputs, workdir: impl Into<PathBuf>) -> Result<Self> {
        inputs.validate()?;
        Ok(Self {
            inputs,
            workdir: workdir.into(),
        })
    }

    /// `SUBJECTS_DIR` as rendered on the command line.
    pub fn subjects_dir(&self) -> &Path {
        self.inputs.subjects_dir.as_deref().unwrap_or(&self.workdir)
    }

    /// `<subjects_dir>/<subject_id>`, resolved against the working directory.
    pub fn subject_dir(&self) -> PathBuf {
        self.workdir
            .join(self.subjects_dir())
            .join(&self.inputs.subject_id)
    }

    /// A subject is resumed once `recon-all` has created its `mri/` directory.
    pub fn is_resuming(&self) -> bool {
        self.subject_dir().join("mri").is_dir()
    }

    /// Command line built from inputs, before expert and resume flags.
    ///
    /// T1 inputs are left out for a resumed subject; `recon-all` refuses `-i`
    /// once the subject exists.
    pub fn base_cmdline(&self) -> CommandLine {
        let inputs = &self.inputs;
        let resuming = self.is_resuming();
        let mut cmd = CommandLine::new(PROGRAM);
        cmd.extend(inputs.stage.leading_flags(inputs.hemi));
        if let Some(flair) = &inputs.flair_file {
            cmd.arg("-FLAIR").arg(flair.display().to_string());
        }
        if resuming && !inputs.t1_files.is_empty() {
            debug!(count = inputs.t1_files.len(), "subject exists, dropping T1 inputs");
        } else {
            for t1 in &inputs.t1_files {
                cmd.arg("-i").arg(t1.display().to_string());
            }
        }
        if let Some(t2) = &inputs.t2_file {
            cmd.arg("-T2").arg(t2.display().to_string());
        }
        if inputs.big_ventricles {
            cmd.arg("-bigventricles");
        }
        if inputs.brainstem {
            cmd.arg("-brainstem-structures");
        }
        if let Some(expert) = &inputs.expert {
            cmd.arg("-expert").arg(expert.display().to_string());
        }
        cmd.extend(inputs.flags.iter().flat_map(|flag| flag.split_whitespace()));
        if let Some(hemi) = inputs
            .hemi
            .filter(|_| inputs.stage != Stage::Directive(Directive::AutoreconHemi))
        {
            cmd.arg("-hemi").arg(hemi.as_str());
        }
        if inputs.hippocampal_subfields_t1 {
            cmd.arg("-hippocampal-subfields-T1");
        }
        if inputs.hires {
            cmd.arg("-hires");
        }
        if inputs.mprage {
            cmd.arg("-mprage");
        }
        if let Some(threads) = inputs.openmp {
            cmd.arg("-openmp").arg(threads.to_string());
        }
        if inputs.parallel {
            cmd.arg("-parallel");
        }
        cmd.arg("-subjid").arg(inputs.subject_id.as_str());
        cmd.arg("-sd").arg(self.subjects_dir().display().to_string());
        if inputs.use_flair {
            cmd.arg("-FLAIRpial");
        }
        if inputs.use_t2 {
            cmd.arg("-T2pial");
        }
        if let Some(mode) = inputs.xopts {
            cmd.arg(format!("-xopts-{mode}"));
        }
        cmd
    }

    /// Resume decisions for the selected steps against `cmd`.
    pub fn plan(&self, cmd: &CommandLine) -> ResumePlan {
        let steps = select_steps(&self.inputs.stage, self.inputs.hemi);
        plan_resume(
            cmd,
            &steps,
            self.inputs.stage.is_explicit_steps(),
            &SubjectDir::new(self.subject_dir()),
        )
    }

    /// Final command line: base + expert options + resume flags.
    ///
    /// Returns the `echo recon-all: nothing to do` placeholder when a resumed
    /// subject has nothing left to run and `force_run` is off. A new subject
    /// given explicit steps runs every one of them.
    #[instrument(skip_all, fields(subject_id = %self.inputs.subject_id))]
    pub fn cmdline(&self) -> Result<CommandLine> {
        let mut cmd = self.base_cmdline();
        if self.inputs.expert.is_none() {
            cmd.extend(prepare_expert_args(
                &self.inputs.expert_options,
                self.inputs.xopts.is_some(),
                &self.subject_dir(),
                &self.workdir,
            )?);
        }

        if !self.is_resuming() {
            debug!(subject_dir = %self.subject_dir().display(), "new subject, no resume flags");
            cmd.extend(self.inputs.stage.step_flags());
            return Ok(cmd);
        }

        let plan = self.plan(&cmd);
        for step in &plan.steps {
            debug!(step = step.name, decision = ?step.decision, "resume decision");
        }
        let cmd = apply_plan(cmd, &plan, self.inputs.force_run);
        if cmd.is_nothing_to_do() {
            info!("recon-all complete: not running");
        } else {
            info!(command = %cmd, "resume recon-all");
        }
        Ok(cmd)
    }

    /// Run request for the final command line.
    pub fn run_request(&self, cfg: &ReconallConfig) -> Result<RunRequest> {
        Ok(RunRequest {
            command: self.cmdline()?,
            workdir: self.workdir.clone(),
            log_path: self.workdir.join(&cfg.log_dir).join("recon-all.log"),
            timeout: Duration::from_secs(cfg.timeout_secs),
            output_limit_bytes: cfg.output_limit_bytes,
            env: vec![(
                "SUBJECTS_DIR".to_string(),
                self.workdir.join(self.subjects_dir()).display().to_string(),
            )],
        })
    }
}
