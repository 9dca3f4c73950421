//! Expert-options file for `recon-all -expert`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Binaries that accept expert options, in the order lines are written.
pub const EXPERT_BINARIES: &[&str] = &[
    "talairach",
    "mri_normalize",
    "mri_watershed",
    "mri_em_register",
    "mri_ca_normalize",
    "mri_ca_register",
    "mri_remove_neck",
    "mri_ca_label",
    "mri_segstats",
    "mri_mask",
    "mri_segment",
    "mri_edit_wm_with_aseg",
    "mri_pretess",
    "mri_fill",
    "mri_tessellate",
    "mris_smooth",
    "mri_inflate",
    "mris_sphere",
    "mris_fix_topology",
    "mris_make_surfaces",
    "mris_surf2vol",
    "mris_register",
    "mrisp_paint",
    "mris_ca_label",
    "mris_anatomical_stats",
    "mri_aparc2aseg",
];

pub const EXPERT_FILE_NAME: &str = "expert.opts";

pub fn is_expert_binary(name: &str) -> bool {
    EXPERT_BINARIES.contains(&name)
}

/// Render `<binary> <args>` lines in [`EXPERT_BINARIES`] order.
///
/// Returns `None` when no options are set. When a binary is given twice the
/// last value wins.
pub fn render_expert_options(options: &[(String, String)]) -> Option<String> {
    let lines: Vec<String> = EXPERT_BINARIES
        .iter()
        .filter_map(|binary| {
            options
                .iter()
                .rev()
                .find(|(name, _)| name == binary)
                .map(|(_, args)| format!("{binary} {args}\n"))
        })
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.concat())
    }
}

/// Arguments to append for per-binary expert options.
///
/// Reuses the subject's `scripts/expert-options` (`-xopts-use`) when it already
/// holds the same contents and no `-xopts-*` mode was chosen; otherwise writes
/// `expert.opts` into `workdir` and returns `-expert <path>`.
pub fn prepare_expert_args(
    options: &[(String, String)],
    xopts_set: bool,
    subject_dir: &Path,
    workdir: &Path,
) -> Result<Vec<String>> {
    let Some(contents) = render_expert_options(options) else {
        return Ok(Vec::new());
    };

    if !xopts_set && existing_expert_options(subject_dir)?.as_deref() == Some(contents.as_str()) {
        debug!("subject expert options unchanged");
        return Ok(vec!["-xopts-use".to_string()]);
    }

    let path = workdir.join(EXPERT_FILE_NAME);
    fs::write(&path, &contents).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "wrote expert options");
    Ok(vec!["-expert".to_string(), path.display().to_string()])
}

fn existing_expert_options(subject_dir: &Path) -> Result<Option<String>> {
    let path = subject_dir.join("scripts").join("expert-options");
    if !path.exists() {
        return Ok(None);
    }
    let contents =
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    Ok(Some(contents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::SubjectFixture;

    fn opts(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(binary, args)| (binary.to_string(), args.to_string()))
            .collect()
    }

    #[test]
    fn lines_follow_binary_order() {
        let rendered = render_expert_options(&opts(&[
            ("mris_make_surfaces", "-max 3.5"),
            ("talairach", "-nuiterations 2"),
        ]));
        assert_eq!(
            rendered.as_deref(),
            Some("talairach -nuiterations 2\nmris_make_surfaces -max 3.5\n")
        );
        assert_eq!(render_expert_options(&[]), None);
    }

    #[test]
    fn writes_expert_file_into_workdir() {
        let subject = SubjectFixture::new("sub-01").expect("fixture");
        let workdir = tempfile::tempdir().expect("tempdir");
        let args = prepare_expert_args(
            &opts(&[("mri_ca_label", "-nobigventricles")]),
            false,
            &subject.subject_dir(),
            workdir.path(),
        )
        .expect("prepare");

        let path = workdir.path().join(EXPERT_FILE_NAME);
        assert_eq!(args, vec!["-expert".to_string(), path.display().to_string()]);
        assert_eq!(
            fs::read_to_string(&path).expect("read"),
            "mri_ca_label -nobigventricles\n"
        );
    }

    #[test]
    fn matching_subject_options_are_reused() {
        let subject = SubjectFixture::new("sub-01").expect("fixture");
        subject
            .write("scripts/expert-options", "mri_ca_label -nobigventricles\n")
            .expect("write");
        let workdir = tempfile::tempdir().expect("tempdir");
        let options = opts(&[("mri_ca_label", "-nobigventricles")]);

        let args = prepare_expert_args(&options, false, &subject.subject_dir(), workdir.path())
            .expect("prepare");
        assert_eq!(args, vec!["-xopts-use"]);
        assert!(!workdir.path().join(EXPERT_FILE_NAME).exists());

        let args = prepare_expert_args(&options, true, &subject.subject_dir(), workdir.path())
            .expect("prepare");
        assert_eq!(args[0], "-expert");
    }

    #[test]
    fn no_options_means_no_args() {
        let workdir = tempfile::tempdir().expect("tempdir");
        let args = prepare_expert_args(&[], false, workdir.path(), workdir.path()).expect("prepare");
        assert!(args.is_empty());
    }
}
