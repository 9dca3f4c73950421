//! Static `recon-all` step tables (FreeSurfer 6 directory layout).
//!
//! Every step lists the files it produces and the files it depends on, relative
//! to `<subjects_dir>/<subject_id>/`. Per-hemisphere steps are written once with
//! a `{hemi}` placeholder and expanded for `lh` and `rh` on lookup.

use super::directive::Hemisphere;

const HEMI: &str = "{hemi}";

/// A step as written in the static table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSpec {
    pub name: &'static str,
    pub outputs: &'static [&'static str],
    pub inputs: &'static [&'static str],
}

/// A step with concrete (hemisphere-expanded) relative paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: &'static str,
    pub outputs: Vec<String>,
    pub inputs: Vec<String>,
}

impl StepSpec {
    const fn new(
        name: &'static str,
        outputs: &'static [&'static str],
        inputs: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            outputs,
            inputs,
        }
    }

    fn expand(&self, hemi: Option<Hemisphere>) -> Step {
        let fill = |pattern: &&str| match hemi {
            Some(hemi) => pattern.replace(HEMI, hemi.as_str()),
            None => (*pattern).to_string(),
        };
        Step {
            name: self.name,
            outputs: self.outputs.iter().map(fill).collect(),
            inputs: self.inputs.iter().map(fill).collect(),
        }
    }
}

/// Step names accepted for an explicit step list.
///
/// Includes FreeSurfer 5.3/6.0 only names (`careginv`, `rmneck`, `skull-lta`,
/// `label-exvivo-ec`) that the v6 table does not carry; requesting them selects
/// nothing.
pub const STEP_NAMES: &[&str] = &[
    "motioncor",
    "talairach",
    "nuintensitycor",
    "normalization",
    "skullstrip",
    "gcareg",
    "canorm",
    "careg",
    "careginv",
    "rmneck",
    "skull-lta",
    "calabel",
    "normalization2",
    "maskbfs",
    "segmentation",
    "tessellate",
    "smooth1",
    "inflate1",
    "qsphere",
    "fix",
    "white",
    "smooth2",
    "inflate2",
    "curvHK",
    "curvstats",
    "sphere",
    "surfreg",
    "jacobian_white",
    "avgcurv",
    "cortparc",
    "pial",
    "pctsurfcon",
    "parcstats",
    "cortparc2",
    "parcstats2",
    "cortparc3",
    "parcstats3",
    "label-exvivo-ec",
    "cortribbon",
    "hyporelabel",
    "segstats",
    "aparc2aseg",
    "apas2aseg",
    "wmparc",
    "balabels",
];

pub fn is_step_name(name: &str) -> bool {
    STEP_NAMES.contains(&name)
}

const AUTORECON1: &[StepSpec] = &[
    StepSpec::new("motioncor", &["mri/rawavg.mgz", "mri/orig.mgz"], &[]),
    StepSpec::new(
        "talairach",
        &[
            "mri/orig_nu.mgz",
            "mri/transforms/talairach.auto.xfm",
            "mri/transforms/talairach.xfm",
        ],
        &[],
    ),
    StepSpec::new("nuintensitycor", &["mri/nu.mgz"], &[]),
    StepSpec::new("normalization", &["mri/T1.mgz"], &[]),
    StepSpec::new(
        "skullstrip",
        &[
            "mri/transforms/talairach_with_skull.lta",
            "mri/brainmask.auto.mgz",
            "mri/brainmask.mgz",
        ],
        &[],
    ),
];

const AUTORECON2_VOLONLY: &[StepSpec] = &[
    StepSpec::new("gcareg", &["mri/transforms/talairach.lta"], &[]),
    StepSpec::new("canorm", &["mri/norm.mgz"], &[]),
    StepSpec::new("careg", &["mri/transforms/talairach.m3z"], &[]),
    StepSpec::new(
        "calabel",
        &[
            "mri/aseg.auto_noCCseg.mgz",
            "mri/aseg.auto.mgz",
            "mri/aseg.presurf.mgz",
        ],
        &[],
    ),
    StepSpec::new("normalization2", &["mri/brain.mgz"], &[]),
    StepSpec::new("maskbfs", &["mri/brain.finalsurfs.mgz"], &[]),
    StepSpec::new(
        "segmentation",
        &["mri/wm.seg.mgz", "mri/wm.asegedit.mgz", "mri/wm.mgz"],
        &[],
    ),
    StepSpec::new("fill", &["mri/filled.mgz"], &[]),
];

const AUTORECON2_HEMI: &[StepSpec] = &[
    StepSpec::new("tessellate", &["surf/{hemi}.orig.nofix"], &[]),
    StepSpec::new("smooth1", &["surf/{hemi}.smoothwm.nofix"], &[]),
    StepSpec::new("inflate1", &["surf/{hemi}.inflated.nofix"], &[]),
    StepSpec::new("qsphere", &["surf/{hemi}.qsphere.nofix"], &[]),
    StepSpec::new("fix", &["surf/{hemi}.orig"], &[]),
    StepSpec::new(
        "white",
        &[
            "surf/{hemi}.white.preaparc",
            "surf/{hemi}.curv",
            "surf/{hemi}.area",
            "label/{hemi}.cortex.label",
        ],
        &[],
    ),
    StepSpec::new("smooth2", &["surf/{hemi}.smoothwm"], &[]),
    StepSpec::new("inflate2", &["surf/{hemi}.inflated", "surf/{hemi}.sulc"], &[]),
    StepSpec::new(
        "curvHK",
        &[
            "surf/{hemi}.white.H",
            "surf/{hemi}.white.K",
            "surf/{hemi}.inflated.H",
            "surf/{hemi}.inflated.K",
        ],
        &[],
    ),
    StepSpec::new("curvstats", &["stats/{hemi}.curv.stats"], &[]),
];

const AUTORECON3_HEMI: &[StepSpec] = &[
    StepSpec::new("sphere", &["surf/{hemi}.sphere"], &[]),
    StepSpec::new("surfreg", &["surf/{hemi}.sphere.reg"], &[]),
    StepSpec::new("jacobian_white", &["surf/{hemi}.jacobian_white"], &[]),
    StepSpec::new("avgcurv", &["surf/{hemi}.avg_curv"], &[]),
    StepSpec::new("cortparc", &["label/{hemi}.aparc.annot"], &[]),
    StepSpec::new(
        "pial",
        &[
            "surf/{hemi}.pial",
            "surf/{hemi}.curv.pial",
            "surf/{hemi}.area.pial",
            "surf/{hemi}.thickness",
            "surf/{hemi}.white",
        ],
        &[],
    ),
    StepSpec::new("parcstats", &["stats/{hemi}.aparc.stats"], &[]),
    StepSpec::new("cortparc2", &["label/{hemi}.aparc.a2009s.annot"], &[]),
    StepSpec::new("parcstats2", &["stats/{hemi}.aparc.a2009s.stats"], &[]),
    StepSpec::new("cortparc3", &["label/{hemi}.aparc.DKTatlas.annot"], &[]),
    StepSpec::new("parcstats3", &["stats/{hemi}.aparc.DKTatlas.stats"], &[]),
    StepSpec::new("pctsurfcon", &["surf/{hemi}.w-g.pct.mgh"], &[]),
];

const AUTORECON3_VOLUME: &[StepSpec] = &[
    StepSpec::new(
        "cortribbon",
        &["mri/lh.ribbon.mgz", "mri/rh.ribbon.mgz", "mri/ribbon.mgz"],
        &[],
    ),
    StepSpec::new("hyporelabel", &["mri/aseg.presurf.hypos.mgz"], &[]),
    StepSpec::new(
        "aparc2aseg",
        &[
            "mri/aparc+aseg.mgz",
            "mri/aparc.a2009s+aseg.mgz",
            "mri/aparc.DKTatlas+aseg.mgz",
        ],
        &[],
    ),
    StepSpec::new("apas2aseg", &["mri/aseg.mgz"], &["mri/aparc+aseg.mgz"]),
    StepSpec::new("segstats", &["stats/aseg.stats"], &[]),
    StepSpec::new("wmparc", &["mri/wmparc.mgz", "stats/wmparc.stats"], &[]),
    // The ctab files are written last, so this short list is enough.
    StepSpec::new(
        "balabels",
        &[
            "label/BA_exvivo.ctab",
            "label/BA_exvivo.thresh.ctab",
            "label/lh.entorhinal_exvivo.label",
            "label/rh.entorhinal_exvivo.label",
            "label/lh.perirhinal_exvivo.label",
            "label/rh.perirhinal_exvivo.label",
        ],
        &[],
    ),
];

fn expand(table: &[StepSpec], hemi: Option<Hemisphere>) -> Vec<Step> {
    table.iter().map(|spec| spec.expand(hemi)).collect()
}

fn both_hemis(table: &[StepSpec]) -> Vec<Step> {
    let mut steps = expand(table, Some(Hemisphere::Left));
    steps.extend(expand(table, Some(Hemisphere::Right)));
    steps
}

pub fn autorecon1() -> Vec<Step> {
    expand(AUTORECON1, None)
}

pub fn autorecon2_volonly() -> Vec<Step> {
    expand(AUTORECON2_VOLONLY, None)
}

pub fn autorecon2_hemi(hemi: Hemisphere) -> Vec<Step> {
    expand(AUTORECON2_HEMI, Some(hemi))
}

/// All `lh` surface steps followed by all `rh` surface steps.
pub fn autorecon2_perhemi() -> Vec<Step> {
    both_hemis(AUTORECON2_HEMI)
}

pub fn autorecon2() -> Vec<Step> {
    let mut steps = autorecon2_volonly();
    steps.extend(autorecon2_perhemi());
    steps
}

pub fn autorecon3_hemi(hemi: Hemisphere) -> Vec<Step> {
    expand(AUTORECON3_HEMI, Some(hemi))
}

pub fn autorecon3() -> Vec<Step> {
    let mut steps = both_hemis(AUTORECON3_HEMI);
    steps.extend(expand(AUTORECON3_VOLUME, None));
    steps
}

/// Surface steps of autorecon2 and autorecon3 for a single hemisphere.
pub fn autorecon_hemi(hemi: Hemisphere) -> Vec<Step> {
    let mut steps = autorecon2_hemi(hemi);
    steps.extend(autorecon3_hemi(hemi));
    steps
}

/// Every step `recon-all -all` runs, in pipeline order.
pub fn master() -> Vec<Step> {
    let mut steps = autorecon1();
    steps.extend(autorecon2());
    steps.extend(autorecon3());
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(steps: &[Step]) -> Vec<&'static str> {
        steps.iter().map(|step| step.name).collect()
    }

    #[test]
    fn hemisphere_placeholder_is_expanded() {
        let steps = autorecon2_hemi(Hemisphere::Right);
        assert_eq!(steps[0].outputs, vec!["surf/rh.orig.nofix".to_string()]);
        assert!(
            steps
                .iter()
                .flat_map(|step| step.outputs.iter())
                .all(|path| !path.contains(HEMI))
        );
    }

    #[test]
    fn perhemi_lists_left_then_right() {
        let steps = autorecon2_perhemi();
        assert_eq!(steps.len(), 2 * AUTORECON2_HEMI.len());
        assert_eq!(steps[0].outputs[0], "surf/lh.orig.nofix");
        assert_eq!(steps[AUTORECON2_HEMI.len()].outputs[0], "surf/rh.orig.nofix");
    }

    #[test]
    fn master_starts_with_autorecon1_and_ends_with_balabels() {
        let steps = master();
        assert_eq!(
            &names(&steps)[..5],
            &[
                "motioncor",
                "talairach",
                "nuintensitycor",
                "normalization",
                "skullstrip"
            ]
        );
        assert_eq!(steps.last().map(|step| step.name), Some("balabels"));
    }

    #[test]
    fn apas2aseg_depends_on_aparc_aseg() {
        let step = autorecon3()
            .into_iter()
            .find(|step| step.name == "apas2aseg")
            .expect("apas2aseg step");
        assert_eq!(step.inputs, vec!["mri/aparc+aseg.mgz".to_string()]);
    }

    #[test]
    fn table_names_are_accepted_step_names() {
        for step in master() {
            if step.name == "fill" {
                continue;
            }
            assert!(is_step_name(step.name), "{} not accepted", step.name);
        }
    }
}
