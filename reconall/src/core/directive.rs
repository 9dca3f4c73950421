//! `recon-all` process directives, hemispheres and the directive/step stage.

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};

use super::steps::is_step_name;

/// Multi-stage `recon-all` directive, rendered as `-<name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Directive {
    #[default]
    All,
    Autorecon1,
    Autorecon2,
    Autorecon2Volonly,
    Autorecon2Perhemi,
    Autorecon2Inflate1,
    Autorecon2Cp,
    Autorecon2Wm,
    Autorecon3,
    Autorecon3T2pial,
    AutoreconPial,
    AutoreconHemi,
    LocalGI,
    Qcache,
}

impl Directive {
    pub const ALL: [Directive; 14] = [
        Directive::All,
        Directive::Autorecon1,
        Directive::Autorecon2,
        Directive::Autorecon2Volonly,
        Directive::Autorecon2Perhemi,
        Directive::Autorecon2Inflate1,
        Directive::Autorecon2Cp,
        Directive::Autorecon2Wm,
        Directive::Autorecon3,
        Directive::Autorecon3T2pial,
        Directive::AutoreconPial,
        Directive::AutoreconHemi,
        Directive::LocalGI,
        Directive::Qcache,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Directive::All => "all",
            Directive::Autorecon1 => "autorecon1",
            Directive::Autorecon2 => "autorecon2",
            Directive::Autorecon2Volonly => "autorecon2-volonly",
            Directive::Autorecon2Perhemi => "autorecon2-perhemi",
            Directive::Autorecon2Inflate1 => "autorecon2-inflate1",
            Directive::Autorecon2Cp => "autorecon2-cp",
            Directive::Autorecon2Wm => "autorecon2-wm",
            Directive::Autorecon3 => "autorecon3",
            Directive::Autorecon3T2pial => "autorecon3-T2pial",
            Directive::AutoreconPial => "autorecon-pial",
            Directive::AutoreconHemi => "autorecon-hemi",
            Directive::LocalGI => "localGI",
            Directive::Qcache => "qcache",
        }
    }

    /// True for every `autorecon2*` variant.
    pub fn is_autorecon2(self) -> bool {
        self.as_str().starts_with("autorecon2")
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Directive {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Directive::ALL
            .into_iter()
            .find(|directive| directive.as_str() == s)
            .ok_or_else(|| anyhow!("unknown recon-all directive '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    Left,
    Right,
}

impl Hemisphere {
    pub fn as_str(self) -> &'static str {
        match self {
            Hemisphere::Left => "lh",
            Hemisphere::Right => "rh",
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hemisphere {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lh" => Ok(Hemisphere::Left),
            "rh" => Ok(Hemisphere::Right),
            other => Err(anyhow!("hemisphere must be 'lh' or 'rh', got '{other}'")),
        }
    }
}

/// What `recon-all` is asked to do: one directive or an explicit step list.
///
/// The two are mutually exclusive; `Stage::from_parts` enforces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Directive(Directive),
    Steps(Vec<String>),
}

impl Default for Stage {
    fn default() -> Self {
        Stage::Directive(Directive::default())
    }
}

impl Stage {
    /// Combine optional directive and step list. Neither set means `-all`.
    pub fn from_parts(directive: Option<Directive>, steps: Vec<String>) -> Result<Self> {
        match (directive, steps.is_empty()) {
            (Some(_), false) => bail!("directive and steps are mutually exclusive"),
            (Some(directive), true) => Ok(Stage::Directive(directive)),
            (None, false) => {
                if let Some(unknown) = steps.iter().find(|step| !is_step_name(step)) {
                    bail!("unknown recon-all step '{unknown}'");
                }
                Ok(Stage::Steps(steps))
            }
            (None, true) => Ok(Stage::default()),
        }
    }

    pub fn is_explicit_steps(&self) -> bool {
        matches!(self, Stage::Steps(_))
    }

    /// Flags placed at position 0 of the command line.
    ///
    /// `-autorecon-hemi` takes the hemisphere as its argument. Explicit steps
    /// render nothing here; resume planning decides `-<step>` or `-no<step>`.
    pub fn leading_flags(&self, hemi: Option<Hemisphere>) -> Vec<String> {
        match self {
            Stage::Directive(Directive::AutoreconHemi) => {
                let mut flags = vec![format!("-{}", Directive::AutoreconHemi)];
                flags.extend(hemi.map(|hemi| hemi.as_str().to_string()));
                flags
            }
            Stage::Directive(directive) => vec![format!("-{directive}")],
            Stage::Steps(_) => Vec::new(),
        }
    }

    /// `-<step>` for every requested step; empty in directive mode.
    pub fn step_flags(&self) -> Vec<String> {
        match self {
            Stage::Directive(_) => Vec::new(),
            Stage::Steps(steps) => steps.iter().map(|step| format!("-{step}")).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_names_round_trip() {
        for directive in Directive::ALL {
            assert_eq!(directive.as_str().parse::<Directive>().ok(), Some(directive));
        }
    }

    #[test]
    fn unknown_directive_is_rejected() {
        let err = "autorecon4".parse::<Directive>().unwrap_err();
        assert!(err.to_string().contains("autorecon4"));
    }

    #[test]
    fn autorecon2_family_is_detected_by_prefix() {
        assert!(Directive::Autorecon2Cp.is_autorecon2());
        assert!(Directive::Autorecon2Perhemi.is_autorecon2());
        assert!(!Directive::AutoreconHemi.is_autorecon2());
        assert!(!Directive::Autorecon3.is_autorecon2());
    }

    #[test]
    fn stage_defaults_to_all() {
        let stage = Stage::from_parts(None, Vec::new()).expect("stage");
        assert_eq!(stage, Stage::Directive(Directive::All));
        assert_eq!(stage.leading_flags(None), vec!["-all".to_string()]);
    }

    #[test]
    fn stage_rejects_directive_with_steps() {
        let err = Stage::from_parts(Some(Directive::Autorecon1), vec!["motioncor".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn stage_rejects_unknown_step() {
        let err = Stage::from_parts(None, vec!["motioncorr".to_string()]).unwrap_err();
        assert!(err.to_string().contains("motioncorr"));
    }

    #[test]
    fn step_stage_renders_one_flag_per_step() {
        let stage =
            Stage::from_parts(None, vec!["motioncor".to_string(), "talairach".to_string()])
                .expect("stage");
        assert!(stage.is_explicit_steps());
        assert!(stage.leading_flags(Some(Hemisphere::Left)).is_empty());
        assert_eq!(stage.step_flags(), vec!["-motioncor", "-talairach"]);
    }

    #[test]
    fn autorecon_hemi_carries_its_hemisphere() {
        let stage = Stage::Directive(Directive::AutoreconHemi);
        assert_eq!(
            stage.leading_flags(Some(Hemisphere::Right)),
            vec!["-autorecon-hemi", "rh"]
        );
        assert!(Stage::Directive(Directive::Autorecon1).step_flags().is_empty());
    }
}
