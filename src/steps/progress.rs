//! Caller-held progress record: which steps are verified and where the
//! wizard cursor sits.
//!
//! The engine never mutates this on its own. A caller records a step as
//! completed after a successful validation; `mark_completed` reports whether
//! that was the first success so completion side effects fire once.
//!
//! Every gate question goes through the record's [`View`], so the cursor,
//! `jump_to` and `mark_completed` all agree on what is locked.

use std::collections::BTreeSet;

use crate::steps::graph::{self, StepState, View};
use crate::steps::step::StepId;

/// Completion set plus the wizard cursor.
#[derive(Clone, Debug)]
pub struct Progress {
    completed: BTreeSet<StepId>,

    /// Wizard sequence, derived once from the dependency table.
    wizard: Vec<StepId>,

    /// Index into `wizard`.
    cursor: usize,

    /// Advance the cursor when the current wizard step is first completed.
    auto_advance: bool,

    /// Presentation the gate is evaluated for.
    view: View,
}

impl Progress {
    /// Empty record in the wizard view, cursor on the first step.
    pub fn new() -> Self {
        Self {
            completed: BTreeSet::new(),
            wizard: graph::wizard_order(),
            cursor: 0,
            auto_advance: true,
            view: View::default(),
        }
    }

    /// Enable or disable auto-advance on completion.
    pub fn with_auto_advance(mut self, enabled: bool) -> Self {
        self.auto_advance = enabled;
        self
    }

    /// Evaluate the gate for `view` instead of the wizard.
    pub fn with_view(mut self, view: View) -> Self {
        self.view = view;
        self
    }

    /// Presentation the gate is evaluated for.
    pub fn view(&self) -> View {
        self.view
    }

    /// Record `step` as verified. Returns `true` only the first time, and
    /// `false` without recording anything while `step` is locked.
    ///
    /// In the wizard view the hidden prerequisites of `step` are recorded
    /// with it.
    pub fn mark_completed(&mut self, step: StepId) -> bool {
        if self.completed.contains(&step) || !self.is_unlocked(step) {
            return false;
        }
        let implied = self.view.implied_by(step, &self.completed);
        self.completed.extend(implied);
        self.completed.insert(step);

        if self.auto_advance && step == self.current_step() && self.next_is_open() {
            self.cursor += 1;
        }
        true
    }

    /// Whether `step` has been verified.
    pub fn is_completed(&self, step: StepId) -> bool {
        self.completed.contains(&step)
    }

    /// Every verified step.
    pub fn completed(&self) -> &BTreeSet<StepId> {
        &self.completed
    }

    /// Whether `step` can be attempted in this record's view.
    pub fn is_unlocked(&self, step: StepId) -> bool {
        self.view.is_unlocked(step, &self.completed)
    }

    /// Gate state of `step` in this record's view.
    pub fn state_of(&self, step: StepId) -> StepState {
        self.view.step_state(step, &self.completed)
    }

    /// Wizard step under the cursor.
    pub fn current_step(&self) -> StepId {
        self.wizard[self.cursor]
    }

    /// The wizard sequence.
    pub fn wizard_steps(&self) -> &[StepId] {
        &self.wizard
    }

    /// Whether a previous wizard step exists.
    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    /// Forward is offered only once the current step is verified and the
    /// next one is not locked.
    pub fn can_go_forward(&self) -> bool {
        self.is_completed(self.current_step()) && self.next_is_open()
    }

    fn next_is_open(&self) -> bool {
        match self.wizard.get(self.cursor + 1) {
            Some(&next) => self.state_of(next) != StepState::Locked,
            None => false,
        }
    }

    /// Move the cursor back. Returns the new current step, or `None` at the start.
    pub fn go_back(&mut self) -> Option<StepId> {
        if !self.can_go_back() {
            return None;
        }
        self.cursor -= 1;
        Some(self.current_step())
    }

    /// Move the cursor forward. Returns the new current step, or `None` if
    /// the move is not allowed.
    pub fn go_forward(&mut self) -> Option<StepId> {
        if !self.can_go_forward() {
            return None;
        }
        self.cursor += 1;
        Some(self.current_step())
    }

    /// Jump to a wizard step that is completed or attemptable.
    pub fn jump_to(&mut self, step: StepId) -> bool {
        let Some(idx) = self.wizard.iter().position(|&s| s == step) else {
            return false;
        };
        if self.state_of(step) == StepState::Locked {
            return false;
        }
        self.cursor = idx;
        true
    }

    /// Fraction of all graph steps completed, in `[0, 1]`.
    pub fn completion_ratio(&self) -> f64 {
        self.completed.len() as f64 / StepId::COUNT as f64
    }

    /// Position of the cursor in the wizard as a percentage, counting the
    /// current step as reached.
    pub fn wizard_position_percent(&self) -> f64 {
        (self.cursor + 1) as f64 / self.wizard.len() as f64 * 100.0
    }

    /// Whether every graph step is completed.
    pub fn is_finished(&self) -> bool {
        self.completed.len() == StepId::COUNT
    }

    /// Clear all completions and return the cursor to the first step.
    pub fn reset(&mut self) {
        self.completed.clear();
        self.cursor = 0;
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_completed_is_idempotent() {
        let mut p = Progress::new();
        assert!(p.mark_completed(StepId::Input));
        assert!(!p.mark_completed(StepId::Input));
        assert_eq!(p.completed().len(), 1);
    }

    #[test]
    fn test_auto_advance_once() {
        let mut p = Progress::new();
        assert_eq!(p.current_step(), StepId::Input);
        p.mark_completed(StepId::Input);
        assert_eq!(p.current_step(), StepId::Q);
        // Re-marking must not move the cursor again.
        p.mark_completed(StepId::Input);
        assert_eq!(p.current_step(), StepId::Q);
    }

    #[test]
    fn test_no_auto_advance_for_off_cursor_step() {
        let mut p = Progress::new();
        p.mark_completed(StepId::V);
        assert_eq!(p.current_step(), StepId::Input);
    }

    #[test]
    fn test_auto_advance_disabled() {
        let mut p = Progress::new().with_auto_advance(false);
        p.mark_completed(StepId::Input);
        assert_eq!(p.current_step(), StepId::Input);
        assert!(p.can_go_forward());
        assert_eq!(p.go_forward(), Some(StepId::Q));
    }

    #[test]
    fn test_navigation_rules() {
        let mut p = Progress::new().with_auto_advance(false);
        assert!(!p.can_go_back());
        assert!(!p.can_go_forward());
        assert_eq!(p.go_forward(), None);
        assert_eq!(p.go_back(), None);

        p.mark_completed(StepId::Input);
        assert_eq!(p.go_forward(), Some(StepId::Q));
        assert!(p.can_go_back());
        assert_eq!(p.go_back(), Some(StepId::Input));
    }

    #[test]
    fn test_locked_step_is_not_recorded() {
        let mut p = Progress::new();
        assert!(!p.mark_completed(StepId::Output));
        assert!(!p.mark_completed(StepId::Softmax));
        assert!(p.completed().is_empty());
        assert_eq!(p.current_step(), StepId::Input);

        let mut canvas = Progress::new().with_view(View::Canvas);
        canvas.mark_completed(StepId::Q);
        canvas.mark_completed(StepId::K);
        assert!(!canvas.mark_completed(StepId::Scores));
        assert_eq!(canvas.state_of(StepId::Scores), StepState::Locked);
    }

    #[test]
    fn test_wizard_records_hidden_prerequisites() {
        let mut p = Progress::new();
        p.mark_completed(StepId::Q);
        p.mark_completed(StepId::K);
        assert_eq!(p.state_of(StepId::Scores), StepState::Unlocked);
        assert!(p.mark_completed(StepId::Scores));
        assert!(p.is_completed(StepId::TransposeK));
        assert_eq!(p.completed().len(), 4);
    }

    #[test]
    fn test_forward_reaches_scores_in_wizard() {
        let mut p = Progress::new().with_auto_advance(false);
        for step in [StepId::Input, StepId::Q, StepId::K, StepId::V] {
            p.mark_completed(step);
            assert!(p.go_forward().is_some());
        }
        assert_eq!(p.current_step(), StepId::Scores);
        assert_eq!(p.state_of(StepId::Scores), StepState::Unlocked);
        assert!(p.jump_to(StepId::Input));
        assert!(p.jump_to(StepId::Scores));
    }

    #[test]
    fn test_canvas_cursor_waits_for_hidden_step() {
        let mut p = Progress::new().with_view(View::Canvas);
        for step in [StepId::Input, StepId::Q, StepId::K, StepId::V] {
            p.mark_completed(step);
        }
        // Auto-advance stops in front of the locked step.
        assert_eq!(p.current_step(), StepId::V);
        assert!(!p.can_go_forward());
        assert!(!p.jump_to(StepId::Scores));

        p.mark_completed(StepId::TransposeK);
        assert_eq!(p.go_forward(), Some(StepId::Scores));
    }

    #[test]
    fn test_jump_to_respects_gate() {
        let mut p = Progress::new();
        assert!(!p.jump_to(StepId::Scores));
        assert!(!p.jump_to(StepId::TransposeK));
        assert!(p.jump_to(StepId::V));
        assert_eq!(p.current_step(), StepId::V);
    }

    #[test]
    fn test_cursor_stops_at_last_step() {
        let mut p = Progress::new();
        for step in StepId::all() {
            p.mark_completed(step);
        }
        assert!(p.jump_to(StepId::Output));
        assert!(!p.can_go_forward());
        assert!(p.is_finished());
        assert_eq!(p.wizard_position_percent(), 100.0);
    }

    #[test]
    fn test_completion_ratio_and_reset() {
        let mut p = Progress::new();
        p.mark_completed(StepId::Q);
        p.mark_completed(StepId::K);
        assert_eq!(p.completion_ratio(), 0.25);
        assert_eq!(p.state_of(StepId::TransposeK), StepState::Unlocked);

        p.reset();
        assert!(p.completed().is_empty());
        assert_eq!(p.current_step(), StepId::Input);
        assert_eq!(p.state_of(StepId::TransposeK), StepState::Locked);
        assert_eq!(p.state_of(StepId::Q), StepState::Unlocked);
    }
}
