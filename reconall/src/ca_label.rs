//! `mri_ca_label` invocation and its output listing.
//!
//! With `-write_probs <prefix>` the tool also writes three posterior maps,
//! `<prefix>000.mgz` to `<prefix>002.mgz`, which
//! [`with_label_probabilities`] adds to the listing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, bail};
use serde::Serialize;

use crate::core::cmdline::CommandLine;
use crate::io::config::ReconallConfig;
use crate::io::runner::RunRequest;

pub const PROGRAM: &str = "mri_ca_label";
pub const LABEL_PROBABILITIES_KEY: &str = "label_probabilities";
pub const LABEL_PROBABILITY_COUNT: usize = 3;

/// A single produced file or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OutputValue {
    File(PathBuf),
    Files(Vec<PathBuf>),
}

/// Output name to produced path(s).
pub type OutputListing = BTreeMap<String, OutputValue>;

/// Add the posterior probability maps written for `write_probs`, if set.
///
/// Relative prefixes resolve against `cwd`. Files are not checked for
/// existence.
pub fn with_label_probabilities(
    mut outputs: OutputListing,
    write_probs: Option<&str>,
    cwd: &Path,
) -> OutputListing {
    if let Some(prefix) = write_probs {
        let files = (0..LABEL_PROBABILITY_COUNT)
            .map(|i| cwd.join(format!("{prefix}{i:03}.mgz")))
            .collect();
        outputs.insert(
            LABEL_PROBABILITIES_KEY.to_string(),
            OutputValue::Files(files),
        );
    }
    outputs
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaLabelInputs {
    pub in_file: PathBuf,
    pub transform: PathBuf,
    pub template: PathBuf,
    pub out_file: PathBuf,
    pub align: bool,
    pub prior: Option<f64>,
    /// `(label, threshold)` for `-relabel_unlikely`.
    pub relabel_unlikely: Option<(u32, f64)>,
    pub no_big_ventricles: bool,
    pub label: Option<PathBuf>,
    pub aseg: Option<PathBuf>,
    pub intensities: Option<PathBuf>,
    /// Prefix for `-write_probs`.
    pub write_probs: Option<String>,
    /// Exported as `OMP_NUM_THREADS`.
    pub num_threads: Option<u32>,
}

impl CaLabelInputs {
    pub fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("in_file", &self.in_file),
            ("transform", &self.transform),
            ("template", &self.template),
            ("out_file", &self.out_file),
        ] {
            if path.as_os_str().is_empty() {
                bail!("{name} is required");
            }
        }
        if self.write_probs.as_deref().is_some_and(str::is_empty) {
            bail!("write_probs prefix must not be empty");
        }
        if self.num_threads == Some(0) {
            bail!("num_threads must be > 0");
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CaLabel {
    inputs: CaLabelInputs,
    workdir: PathBuf,
}

impl CaLabel {
    pub fn new(inputs: CaLabelInputs, workdir: impl Into<PathBuf>) -> Result<Self> {
        inputs.validate()?;
        Ok(Self {
            inputs,
            workdir: workdir.into(),
        })
    }

    pub fn cmdline(&self) -> CommandLine {
        let inputs = &self.inputs;
        let mut cmd = CommandLine::new(PROGRAM);
        if inputs.align {
            cmd.arg("-align");
        }
        if let Some(aseg) = &inputs.aseg {
            cmd.arg("-aseg").arg(aseg.display().to_string());
        }
        if let Some(intensities) = &inputs.intensities {
            cmd.arg("-r").arg(intensities.display().to_string());
        }
        if let Some(label) = &inputs.label {
            cmd.arg("-l").arg(label.display().to_string());
        }
        if inputs.no_big_ventricles {
            cmd.arg("-nobigventricles");
        }
        if let Some(prior) = inputs.prior {
            cmd.arg("-prior").arg(format!("{prior:.1}"));
        }
        if let Some((label, threshold)) = inputs.relabel_unlikely {
            cmd.arg("-relabel_unlikely")
                .arg(label.to_string())
                .arg(format!("{threshold:.1}"));
        }
        if let Some(prefix) = &inputs.write_probs {
            cmd.arg("-write_probs").arg(prefix.as_str());
        }
        for path in [
            &inputs.in_file,
            &inputs.transform,
            &inputs.template,
            &inputs.out_file,
        ] {
            cmd.arg(path.display().to_string());
        }
        cmd
    }

    /// Listing without the probability maps.
    pub fn base_outputs(&self) -> OutputListing {
        OutputListing::from([(
            "out_file".to_string(),
            OutputValue::File(self.workdir.join(&self.inputs.out_file)),
        )])
    }

    pub fn list_outputs(&self) -> OutputListing {
        with_label_probabilities(
            self.base_outputs(),
            self.inputs.write_probs.as_deref(),
            &self.workdir,
        )
    }

    pub fn run_request(&self, cfg: &ReconallConfig) -> RunRequest {
        let env = self
            .inputs
            .num_threads
            .map(|n| vec![("OMP_NUM_THREADS".to_string(), n.to_string())])
            .unwrap_or_default();
        RunRequest {
            command: self.cmdline(),
            workdir: self.workdir.clone(),
            log_path: self.workdir.join(&cfg.log_dir).join("mri_ca_label.log"),
            timeout: Duration::from_secs(cfg.timeout_secs),
            output_limit_bytes: cfg.output_limit_bytes,
            env,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_inputs() -> CaLabelInputs {
        CaLabelInputs {
            in_file: PathBuf::from("/data/norm.mgz"),
            transform: PathBuf::from("/data/talairach.m3z"),
            template: PathBuf::from("/data/RB_all_2016-05-10.vc700.gca"),
            out_file: PathBuf::from("aseg.auto_noCCseg.mgz"),
            align: true,
            prior: Some(0.5),
            relabel_unlikely: Some((9, 0.3)),
            write_probs: Some("posterior".to_string()),
            ..CaLabelInputs::default()
        }
    }

    #[test]
    fn cmdline_matches_tool_syntax() {
        let ca_label = CaLabel::new(example_inputs(), "/work").expect("ca_label");
        assert_eq!(
            ca_label.cmdline().to_string(),
            "mri_ca_label -align -prior 0.5 -relabel_unlikely 9 0.3 -write_probs posterior \
             /data/norm.mgz /data/talairach.m3z /data/RB_all_2016-05-10.vc700.gca \
             aseg.auto_noCCseg.mgz"
        );
    }

    #[test]
    fn probability_maps_are_listed_in_order() {
        let ca_label = CaLabel::new(example_inputs(), "/work").expect("ca_label");
        let outputs = ca_label.list_outputs();
        assert_eq!(
            outputs.get(LABEL_PROBABILITIES_KEY),
            Some(&OutputValue::Files(vec![
                PathBuf::from("/work/posterior000.mgz"),
                PathBuf::from("/work/posterior001.mgz"),
                PathBuf::from("/work/posterior002.mgz"),
            ]))
        );
        assert_eq!(
            outputs.get("out_file"),
            Some(&OutputValue::File(PathBuf::from(
                "/work/aseg.auto_noCCseg.mgz"
            )))
        );
    }

    #[test]
    fn listing_is_unchanged_without_prefix() {
        let inputs = CaLabelInputs {
            write_probs: None,
            ..example_inputs()
        };
        let ca_label = CaLabel::new(inputs, "/work").expect("ca_label");
        assert_eq!(ca_label.list_outputs(), ca_label.base_outputs());
        assert!(!ca_label.cmdline().has_arg("-write_probs"));
    }

    #[test]
    fn absolute_prefix_is_kept() {
        let outputs =
            with_label_probabilities(OutputListing::new(), Some("/tmp/probs/p"), Path::new("/work"));
        assert_eq!(
            outputs.get(LABEL_PROBABILITIES_KEY),
            Some(&OutputValue::Files(vec![
                PathBuf::from("/tmp/probs/p000.mgz"),
                PathBuf::from("/tmp/probs/p001.mgz"),
                PathBuf::from("/tmp/probs/p002.mgz"),
            ]))
        );
    }

    #[test]
    fn listing_serializes_as_flat_json() {
        let ca_label = CaLabel::new(example_inputs(), "/work").expect("ca_label");
        let json = serde_json::to_value(ca_label.list_outputs()).expect("json");
        assert_eq!(json["out_file"], "/work/aseg.auto_noCCseg.mgz");
        assert_eq!(json[LABEL_PROBABILITIES_KEY][2], "/work/posterior002.mgz");
    }

    #[test]
    fn missing_required_input_is_rejected() {
        let inputs = CaLabelInputs {
            template: PathBuf::new(),
            ..example_inputs()
        };
        let err = CaLabel::new(inputs, "/work").unwrap_err();
        assert!(err.to_string().contains("template"));
    }

    #[test]
    fn num_threads_is_exported() {
        let inputs = CaLabelInputs {
            num_threads: Some(2),
            ..example_inputs()
        };
        let ca_label = CaLabel::new(inputs, "/work").expect("ca_label");
        let request = ca_label.run_request(&ReconallConfig::default());
        assert_eq!(
            request.env,
            vec![("OMP_NUM_THREADS".to_string(), "2".to_string())]
        );
    }
}
