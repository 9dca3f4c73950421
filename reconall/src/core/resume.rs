//! Resume planning: decide which `-<step>` / `-no<step>` flags to append.
//!
//! Pure decision logic. Whether a step's outputs are up to date is delegated to
//! a [`Freshness`] implementation so tests can answer without touching disk.

use super::cmdline::CommandLine;
use super::steps::Step;

/// Answers whether a step's outputs are newer than its inputs.
pub trait Freshness {
    fn is_satisfied(&self, step: &Step) -> bool;
}

/// Per-step outcome of resume planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDecision {
    /// `-no<step>` was already in the base command.
    AlreadySkipped,
    /// `-<step>` was already in the base command.
    AlreadyForced,
    /// Outputs are up to date; append `-no<step>`.
    Skip,
    /// Outputs are stale in explicit-step mode; append `-<step>`.
    Force,
    /// Outputs are stale in directive mode; the directive runs it.
    NeedsRun,
}

impl StepDecision {
    pub fn needs_run(self) -> bool {
        matches!(
            self,
            StepDecision::AlreadyForced | StepDecision::Force | StepDecision::NeedsRun
        )
    }

    /// Flag to append for this decision, if any.
    pub fn flag(self, step: &str) -> Option<String> {
        match self {
            StepDecision::Skip => Some(format!("-no{step}")),
            StepDecision::Force => Some(format!("-{step}")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub name: &'static str,
    pub decision: StepDecision,
}

/// Decisions for every distinct step name, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumePlan {
    pub steps: Vec<PlannedStep>,
}

impl ResumePlan {
    pub fn needs_run(&self) -> bool {
        self.steps.iter().any(|step| step.decision.needs_run())
    }

    pub fn flags(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter_map(|step| step.decision.flag(step.name))
            .collect()
    }

    pub fn decision(&self, name: &str) -> Option<StepDecision> {
        self.steps
            .iter()
            .find(|step| step.name == name)
            .map(|step| step.decision)
    }
}

/// Plan resume flags for `steps` on top of `base`.
///
/// Steps sharing a name (the `lh` and `rh` entries of a surface step) collapse
/// into one decision; the step is skipped only if every entry is satisfied.
/// `recon-all` step flags are not per hemisphere, so deciding each entry on
/// its own could emit both `-no<step>` and `-<step>` for the same name.
///
/// Flags already in `base` are matched as whole tokens.
pub fn plan_resume<F: Freshness + ?Sized>(
    base: &CommandLine,
    steps: &[Step],
    explicit_steps: bool,
    freshness: &F,
) -> ResumePlan {
    let mut grouped: Vec<(&'static str, Vec<&Step>)> = Vec::new();
    for step in steps {
        match grouped.iter_mut().find(|(name, _)| *name == step.name) {
            Some((_, entries)) => entries.push(step),
            None => grouped.push((step.name, vec![step])),
        }
    }

    let steps = grouped
        .into_iter()
        .map(|(name, entries)| {
            let decision = if base.has_arg(&format!("-no{name}")) {
                StepDecision::AlreadySkipped
            } else if base.has_arg(&format!("-{name}")) {
                StepDecision::AlreadyForced
            } else if entries.iter().all(|step| freshness.is_satisfied(step)) {
                StepDecision::Skip
            } else if explicit_steps {
                StepDecision::Force
            } else {
                StepDecision::NeedsRun
            };
            PlannedStep { name, decision }
        })
        .collect();

    ResumePlan { steps }
}

/// Append the plan's flags to `base`, or return the no-op placeholder when
/// nothing needs to run and the caller did not force a run.
pub fn apply_plan(mut base: CommandLine, plan: &ResumePlan, force_run: bool) -> CommandLine {
    if !plan.needs_run() && !force_run {
        return CommandLine::nothing_to_do();
    }
    base.extend(plan.flags());
    base
}
