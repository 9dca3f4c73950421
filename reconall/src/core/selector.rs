//! Resolve a directive or explicit step list to the steps worth checking.

use super::directive::{Directive, Hemisphere, Stage};
use super::steps::{self, Step};

/// Ordered steps to consider for resume flags.
///
/// Directives without a dedicated table (including `all`) fall back to the
/// full master list.
pub fn select_steps(stage: &Stage, hemi: Option<Hemisphere>) -> Vec<Step> {
    let directive = match stage {
        Stage::Steps(requested) => {
            return steps::master()
                .into_iter()
                .filter(|step| requested.iter().any(|name| name == step.name))
                .collect();
        }
        Stage::Directive(directive) => *directive,
    };

    match directive {
        Directive::Autorecon1 => steps::autorecon1(),
        Directive::Autorecon2Volonly => steps::autorecon2_volonly(),
        Directive::Autorecon2Perhemi => steps::autorecon2_perhemi(),
        d if d.is_autorecon2() => match hemi {
            Some(hemi) => {
                let mut selected = steps::autorecon2_volonly();
                selected.extend(steps::autorecon2_hemi(hemi));
                selected
            }
            None => steps::autorecon2(),
        },
        Directive::AutoreconHemi => match hemi {
            Some(Hemisphere::Left) => steps::autorecon_hemi(Hemisphere::Left),
            _ => steps::autorecon_hemi(Hemisphere::Right),
        },
        Directive::Autorecon3 => steps::autorecon3(),
        _ => steps::master(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn names(steps: &[Step]) -> Vec<&'static str> {
        steps.iter().map(|step| step.name).collect()
    }

    fn select(directive: Directive, hemi: Option<Hemisphere>) -> Vec<Step> {
        select_steps(&Stage::Directive(directive), hemi)
    }

    #[test]
    fn fixed_tables_are_returned_verbatim() {
        assert_eq!(select(Directive::Autorecon1, None), steps::autorecon1());
        assert_eq!(
            select(Directive::Autorecon2Volonly, Some(Hemisphere::Left)),
            steps::autorecon2_volonly()
        );
        assert_eq!(
            select(Directive::Autorecon2Perhemi, Some(Hemisphere::Right)),
            steps::autorecon2_perhemi()
        );
        assert_eq!(select(Directive::Autorecon3, None), steps::autorecon3());
    }

    #[test]
    fn autorecon2_variant_with_hemi_is_volonly_plus_hemi() {
        let selected = select(Directive::Autorecon2Cp, Some(Hemisphere::Right));
        let mut expected = steps::autorecon2_volonly();
        expected.extend(steps::autorecon2_hemi(Hemisphere::Right));
        assert_eq!(selected, expected);
        assert!(
            selected
                .iter()
                .flat_map(|step| step.outputs.iter())
                .all(|path| !path.starts_with("surf/lh."))
        );
    }

    #[test]
    fn autorecon2_without_hemi_covers_both_hemispheres() {
        assert_eq!(select(Directive::Autorecon2, None), steps::autorecon2());
        assert_eq!(select(Directive::Autorecon2Wm, None), steps::autorecon2());
    }

    #[test]
    fn autorecon_hemi_defaults_to_right() {
        assert_eq!(
            select(Directive::AutoreconHemi, Some(Hemisphere::Left)),
            steps::autorecon_hemi(Hemisphere::Left)
        );
        assert_eq!(
            select(Directive::AutoreconHemi, None),
            steps::autorecon_hemi(Hemisphere::Right)
        );
    }

    #[test]
    fn other_directives_fall_back_to_master() {
        for directive in [
            Directive::All,
            Directive::Autorecon3T2pial,
            Directive::AutoreconPial,
            Directive::LocalGI,
            Directive::Qcache,
        ] {
            assert_eq!(select(directive, None), steps::master(), "{directive}");
        }
    }

    #[test]
    fn explicit_steps_keep_master_order() {
        let stage = Stage::Steps(vec![
            "white".to_string(),
            "motioncor".to_string(),
            "careg".to_string(),
        ]);
        let selected = select_steps(&stage, None);
        assert_eq!(
            names(&selected),
            vec!["motioncor", "careg", "white", "white"]
        );
        let distinct: BTreeSet<_> = names(&selected).into_iter().collect();
        assert_eq!(distinct, BTreeSet::from(["careg", "motioncor", "white"]));
    }

    #[test]
    fn explicit_steps_missing_from_table_select_nothing() {
        let stage = Stage::Steps(vec!["careginv".to_string()]);
        assert!(select_steps(&stage, None).is_empty());
    }
}
