//! Step dependency graph and unlock gate.
//!
//! A single declarative table lists every step with its prerequisites and
//! whether the linear wizard shows it. The canvas view (all nodes, in
//! topological order) and the wizard view (presented nodes only) are both
//! derived from this table.
//!
//! The free functions gate on direct prerequisites. [`View`] evaluates the
//! same table for one presentation: in the wizard a hidden prerequisite is
//! replaced by its own prerequisites and completes together with the step
//! that needs it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::steps::step::StepId;

/// One row of the dependency table.
#[derive(Clone, Copy, Debug)]
pub struct StepNode {
    pub step: StepId,

    /// Steps that must be completed before this one can be attempted.
    pub prerequisites: &'static [StepId],

    /// Whether the linear wizard presents this step. Internal nodes are
    /// only visible on the graph canvas.
    pub wizard: bool,
}

/// The dependency table. Indexed by `StepId::index()`.
pub const STEP_TABLE: [StepNode; StepId::COUNT] = [
    StepNode { step: StepId::Input, prerequisites: &[], wizard: true },
    StepNode { step: StepId::Q, prerequisites: &[], wizard: true },
    StepNode { step: StepId::K, prerequisites: &[], wizard: true },
    StepNode { step: StepId::V, prerequisites: &[], wizard: true },
    StepNode { step: StepId::TransposeK, prerequisites: &[StepId::K], wizard: false },
    StepNode { step: StepId::Scores, prerequisites: &[StepId::Q, StepId::TransposeK], wizard: true },
    StepNode { step: StepId::Softmax, prerequisites: &[StepId::Scores], wizard: true },
    StepNode { step: StepId::Output, prerequisites: &[StepId::Softmax, StepId::V], wizard: true },
];

/// Gate state of a single step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    /// Some prerequisite is not completed yet.
    Locked,
    /// Attemptable but not yet verified.
    Unlocked,
    /// Verified correct; terminal until reset.
    Completed,
}

/// Table row for a step.
pub fn node(step: StepId) -> &'static StepNode {
    &STEP_TABLE[step.index()]
}

/// Prerequisites of `step`.
pub fn prerequisites_of(step: StepId) -> &'static [StepId] {
    node(step).prerequisites
}

/// Steps that list `step` as a prerequisite.
pub fn dependents_of(step: StepId) -> Vec<StepId> {
    STEP_TABLE
        .iter()
        .filter(|n| n.prerequisites.contains(&step))
        .map(|n| n.step)
        .collect()
}

/// All `(prerequisite, step)` edges, in table order.
pub fn edges() -> Vec<(StepId, StepId)> {
    STEP_TABLE
        .iter()
        .flat_map(|n| n.prerequisites.iter().map(move |&p| (p, n.step)))
        .collect()
}

/// Whether every prerequisite of `step` is in `completed`.
pub fn is_unlocked(step: StepId, completed: &BTreeSet<StepId>) -> bool {
    prerequisites_of(step).iter().all(|p| completed.contains(p))
}

/// Prerequisites of `step` still missing from `completed`.
pub fn missing_prerequisites(step: StepId, completed: &BTreeSet<StepId>) -> Vec<StepId> {
    prerequisites_of(step)
        .iter()
        .copied()
        .filter(|p| !completed.contains(p))
        .collect()
}

/// Gate state of `step` given `completed`.
pub fn step_state(step: StepId, completed: &BTreeSet<StepId>) -> StepState {
    if completed.contains(&step) {
        StepState::Completed
    } else if is_unlocked(step, completed) {
        StepState::Unlocked
    } else {
        StepState::Locked
    }
}

/// Dependents of `step` that become attemptable once `step` joins
/// `completed`, and were not attemptable before.
pub fn newly_unlocked(step: StepId, completed: &BTreeSet<StepId>) -> Vec<StepId> {
    let mut after = completed.clone();
    after.insert(step);
    dependents_of(step)
        .into_iter()
        .filter(|d| !completed.contains(d))
        .filter(|&d| !is_unlocked(d, completed) && is_unlocked(d, &after))
        .collect()
}

/// Which presentation a gate is evaluated for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// Presented steps only; hidden prerequisites are implied.
    #[default]
    Wizard,
    /// Every node, gated on its direct prerequisites.
    Canvas,
}

impl View {
    /// Prerequisites of `step` in this view.
    pub fn prerequisites(self, step: StepId) -> Vec<StepId> {
        match self {
            View::Wizard => wizard_prerequisites_of(step),
            View::Canvas => prerequisites_of(step).to_vec(),
        }
    }

    /// Whether every prerequisite of `step` in this view is in `completed`.
    pub fn is_unlocked(self, step: StepId, completed: &BTreeSet<StepId>) -> bool {
        self.prerequisites(step).iter().all(|p| completed.contains(p))
    }

    /// View prerequisites of `step` still missing from `completed`.
    pub fn missing_prerequisites(self, step: StepId, completed: &BTreeSet<StepId>) -> Vec<StepId> {
        self.prerequisites(step)
            .into_iter()
            .filter(|p| !completed.contains(p))
            .collect()
    }

    pub fn step_state(self, step: StepId, completed: &BTreeSet<StepId>) -> StepState {
        if completed.contains(&step) {
            StepState::Completed
        } else if self.is_unlocked(step, completed) {
            StepState::Unlocked
        } else {
            StepState::Locked
        }
    }

    /// Hidden steps recorded together with `step`, in topological order.
    /// Always empty on the canvas.
    pub fn implied_by(self, step: StepId, completed: &BTreeSet<StepId>) -> Vec<StepId> {
        match self {
            View::Wizard => hidden_prerequisites_of(step)
                .into_iter()
                .filter(|s| !completed.contains(s))
                .collect(),
            View::Canvas => Vec::new(),
        }
    }

    /// Steps that become attemptable in this view once `step` (and whatever
    /// it implies) joins `completed`.
    pub fn newly_unlocked(self, step: StepId, completed: &BTreeSet<StepId>) -> Vec<StepId> {
        let mut after = completed.clone();
        after.extend(self.implied_by(step, completed));
        after.insert(step);
        StepId::all()
            .into_iter()
            .filter(|s| !after.contains(s))
            .filter(|&s| !self.is_unlocked(s, completed) && self.is_unlocked(s, &after))
            .collect()
    }
}

/// Prerequisites of `step` as the wizard presents them. Each hidden
/// prerequisite is replaced by its own prerequisites, recursively.
pub fn wizard_prerequisites_of(step: StepId) -> Vec<StepId> {
    let mut shown = BTreeSet::new();
    let mut pending = prerequisites_of(step).to_vec();
    while let Some(p) = pending.pop() {
        if node(p).wizard {
            shown.insert(p);
        } else {
            pending.extend_from_slice(prerequisites_of(p));
        }
    }
    shown.into_iter().collect()
}

/// Hidden steps reachable from `step` through hidden prerequisites only,
/// in topological order.
pub fn hidden_prerequisites_of(step: StepId) -> Vec<StepId> {
    let mut hidden = BTreeSet::new();
    let mut pending = prerequisites_of(step).to_vec();
    while let Some(p) = pending.pop() {
        if !node(p).wizard && hidden.insert(p) {
            pending.extend_from_slice(prerequisites_of(p));
        }
    }
    topological_order()
        .into_iter()
        .filter(|s| hidden.contains(s))
        .collect()
}

/// Kahn's algorithm over the table; ready steps are taken in declaration
/// order so the result is deterministic.
pub fn topological_order() -> Vec<StepId> {
    let mut remaining: [usize; StepId::COUNT] = [0; StepId::COUNT];
    for n in &STEP_TABLE {
        remaining[n.step.index()] = n.prerequisites.len();
    }

    let mut ready: BTreeSet<StepId> = STEP_TABLE
        .iter()
        .filter(|n| n.prerequisites.is_empty())
        .map(|n| n.step)
        .collect();

    let mut order = Vec::with_capacity(StepId::COUNT);
    while let Some(step) = ready.pop_first() {
        order.push(step);
        for dep in dependents_of(step) {
            let slot = &mut remaining[dep.index()];
            *slot -= 1;
            if *slot == 0 {
                ready.insert(dep);
            }
        }
    }
    order
}

/// The linear wizard sequence: topological order restricted to presented
/// steps.
pub fn wizard_order() -> Vec<StepId> {
    topological_order()
        .into_iter()
        .filter(|&s| node(s).wizard)
        .collect()
}

/// Steps attemptable with nothing completed.
pub fn initially_unlocked() -> Vec<StepId> {
    let none = BTreeSet::new();
    StepId::all()
        .into_iter()
        .filter(|&s| is_unlocked(s, &none))
        .collect()
}
