//! Tutorial session: grading wired to the progress record.
//!
//! A `Session` is what a presentation layer drives. Submitting a matrix for
//! a locked step is refused without grading; a first correct submission
//! records the completion exactly once and reports which steps it opened.
//! In the wizard view a correct submission also records the hidden steps it
//! subsumes, so following the wizard alone finishes the whole graph.

use tracing::{debug, info};

use crate::config::TOLERANCE;
use crate::core::matrix::Matrix;
use crate::core::weights::AttentionWeights;
use crate::error::Result;
use crate::grading::reference::ReferenceCalculator;
use crate::grading::validator::{ValidationResult, Validator};
use crate::steps::content::{step_info, StepInfo};
use crate::steps::graph::{StepState, View};
use crate::steps::progress::Progress;
use crate::steps::step::StepId;

/// Session configuration.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Largest accepted absolute deviation per cell.
    pub tolerance: f64,

    /// Advance the wizard cursor after the current step is first completed.
    pub auto_advance: bool,

    /// Presentation whose gate submissions are checked against.
    pub view: View,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tolerance: TOLERANCE,
            auto_advance: true,
            view: View::Wizard,
        }
    }
}

/// Result of one submission.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
    /// The step's prerequisites are not all completed; nothing was graded.
    Locked { missing: Vec<StepId> },

    /// Graded and wrong.
    Rejected(ValidationResult),

    /// First correct submission for the step.
    Completed {
        result: ValidationResult,
        /// Hidden steps recorded together with this one.
        implied: Vec<StepId>,
        /// Steps that became attemptable because of this completion.
        unlocked: Vec<StepId>,
    },

    /// Correct again for a step that was already completed. No state changed.
    AlreadyCompleted(ValidationResult),
}

impl SubmitOutcome {
    /// Whether the submission was graded correct.
    pub fn is_correct(&self) -> bool {
        matches!(
            self,
            SubmitOutcome::Completed { .. } | SubmitOutcome::AlreadyCompleted(_)
        )
    }

    /// Grading result, if the submission was graded.
    pub fn validation(&self) -> Option<&ValidationResult> {
        match self {
            SubmitOutcome::Locked { .. } => None,
            SubmitOutcome::Rejected(r)
            | SubmitOutcome::AlreadyCompleted(r)
            | SubmitOutcome::Completed { result: r, .. } => Some(r),
        }
    }
}

/// One learner's pass through the tutorial.
pub struct Session {
    weights: AttentionWeights,
    validator: Validator,
    progress: Progress,
}

impl Session {
    /// Fresh session over the tutorial weights.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_weights(config, AttentionWeights::tutorial())
    }

    /// Fresh session over custom weights.
    pub fn with_weights(config: SessionConfig, weights: AttentionWeights) -> Self {
        Self {
            weights,
            validator: Validator::with_tolerance(config.tolerance),
            progress: Progress::new()
                .with_auto_advance(config.auto_advance)
                .with_view(config.view),
        }
    }

    /// Completion set and wizard cursor.
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Mutable access for wizard navigation.
    pub fn progress_mut(&mut self) -> &mut Progress {
        &mut self.progress
    }

    pub fn weights(&self) -> &AttentionWeights {
        &self.weights
    }

    /// Gate state of `step` in the session's view.
    pub fn state(&self, step: StepId) -> StepState {
        self.progress.state_of(step)
    }

    /// Expected matrix for `step`.
    pub fn reference(&self, step: StepId) -> Result<Matrix> {
        ReferenceCalculator::new(&self.weights).reference_matrix(step)
    }

    /// Metadata and resolved operand matrices for `step`.
    pub fn describe(&self, step: StepId) -> Result<(StepInfo, Vec<(&'static str, Matrix)>)> {
        let info = step_info(step);
        let operands = info.resolve_operands(&ReferenceCalculator::new(&self.weights))?;
        Ok((info, operands))
    }

    /// Grade learner rows for `step` and record a first success.
    pub fn submit(&mut self, step: StepId, rows: &[Vec<f64>]) -> Result<SubmitOutcome> {
        let view = self.progress.view();
        let missing = view.missing_prerequisites(step, self.progress.completed());
        if !missing.is_empty() {
            debug!(%step, ?missing, "submission for locked step refused");
            return Ok(SubmitOutcome::Locked { missing });
        }

        let result = self
            .validator
            .validate_rows_with(&self.weights, step, rows)?;
        debug!(%step, valid = result.valid, wrong_cells = result.error_count(), "graded submission");

        if !result.valid {
            return Ok(SubmitOutcome::Rejected(result));
        }

        if self.progress.is_completed(step) {
            return Ok(SubmitOutcome::AlreadyCompleted(result));
        }

        let implied = view.implied_by(step, self.progress.completed());
        let unlocked = view.newly_unlocked(step, self.progress.completed());
        self.progress.mark_completed(step);
        info!(
            %step,
            ?implied,
            ?unlocked,
            completed = self.progress.completed().len(),
            "step completed"
        );

        Ok(SubmitOutcome::Completed {
            result,
            implied,
            unlocked,
        })
    }

    /// Return every step to its initial gated state.
    pub fn reset(&mut self) {
        info!(
            completed = self.progress.completed().len(),
            "resetting tutorial progress"
        );
        self.progress.reset();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::matrix::to_rows;
    use crate::steps::graph;

    fn reference_rows(session: &Session, step: StepId) -> Vec<Vec<f64>> {
        to_rows(&session.reference(step).unwrap())
    }

    fn canvas_session() -> Session {
        Session::new(SessionConfig {
            view: View::Canvas,
            ..Default::default()
        })
    }

    #[test]
    fn test_locked_step_is_not_graded() {
        let mut s = Session::default();
        let rows = reference_rows(&s, StepId::Scores);
        let outcome = s.submit(StepId::Scores, &rows).unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Locked {
                missing: vec![StepId::Q, StepId::K]
            }
        );
        assert!(outcome.validation().is_none());
        assert!(s.progress().completed().is_empty());

        let mut canvas = canvas_session();
        assert_eq!(
            canvas.submit(StepId::Scores, &rows).unwrap(),
            SubmitOutcome::Locked {
                missing: vec![StepId::Q, StepId::TransposeK]
            }
        );
    }

    #[test]
    fn test_wizard_walk_follows_cursor_to_the_end() {
        let mut s = Session::default();
        let wizard = s.progress().wizard_steps().to_vec();
        assert_eq!(wizard.len(), 7);

        for expected in wizard {
            let step = s.progress().current_step();
            assert_eq!(step, expected);
            assert_ne!(s.state(step), StepState::Locked, "{} locked under the cursor", step);

            let rows = reference_rows(&s, step);
            let outcome = s.submit(step, &rows).unwrap();
            assert!(outcome.is_correct(), "{} not accepted: {:?}", step, outcome);
        }

        assert_eq!(s.state(StepId::Output), StepState::Completed);
        assert_eq!(s.state(StepId::TransposeK), StepState::Completed);
        assert!(s.progress().is_finished());
        assert_eq!(s.progress().completion_ratio(), 1.0);
        assert_eq!(s.progress().current_step(), StepId::Output);
    }

    #[test]
    fn test_wizard_scores_records_transpose() {
        let mut s = Session::default();
        for step in [StepId::Q, StepId::K] {
            let rows = reference_rows(&s, step);
            s.submit(step, &rows).unwrap();
        }
        let rows = reference_rows(&s, StepId::Scores);
        match s.submit(StepId::Scores, &rows).unwrap() {
            SubmitOutcome::Completed {
                implied, unlocked, ..
            } => {
                assert_eq!(implied, vec![StepId::TransposeK]);
                assert_eq!(unlocked, vec![StepId::Softmax]);
            }
            other => panic!("expected completion, got {:?}", other),
        }
        assert_eq!(s.state(StepId::TransposeK), StepState::Completed);
    }

    #[test]
    fn test_canvas_requires_transpose_before_scores() {
        let mut s = canvas_session();
        for step in [StepId::Q, StepId::K] {
            let rows = reference_rows(&s, step);
            s.submit(step, &rows).unwrap();
        }
        let rows = reference_rows(&s, StepId::Scores);
        assert_eq!(
            s.submit(StepId::Scores, &rows).unwrap(),
            SubmitOutcome::Locked {
                missing: vec![StepId::TransposeK]
            }
        );
        assert_eq!(s.state(StepId::TransposeK), StepState::Unlocked);
    }

    #[test]
    fn test_wrong_submission_rejected() {
        let mut s = Session::default();
        let mut rows = reference_rows(&s, StepId::Q);
        rows[0][0] = 9.0;
        let outcome = s.submit(StepId::Q, &rows).unwrap();
        assert!(!outcome.is_correct());
        assert_eq!(outcome.validation().unwrap().error_cells(), vec![(0, 0)]);
        assert_eq!(s.state(StepId::Q), StepState::Unlocked);
    }

    #[test]
    fn test_completion_is_recorded_once() {
        let mut s = Session::default();
        let rows = reference_rows(&s, StepId::K);

        let first = s.submit(StepId::K, &rows).unwrap();
        match first {
            SubmitOutcome::Completed { ref unlocked, .. } => {
                assert_eq!(unlocked, &vec![StepId::TransposeK]);
            }
            other => panic!("expected completion, got {:?}", other),
        }

        let second = s.submit(StepId::K, &rows).unwrap();
        assert!(matches!(second, SubmitOutcome::AlreadyCompleted(ref r) if r.valid));
        assert_eq!(s.progress().completed().len(), 1);
    }

    #[test]
    fn test_wrong_resubmission_of_completed_step_keeps_completion() {
        let mut s = Session::default();
        let rows = reference_rows(&s, StepId::V);
        s.submit(StepId::V, &rows).unwrap();
        let outcome = s.submit(StepId::V, &[vec![0.0]]).unwrap();
        assert!(matches!(outcome, SubmitOutcome::Rejected(_)));
        assert_eq!(s.state(StepId::V), StepState::Completed);
    }

    #[test]
    fn test_full_walkthrough_in_topological_order() {
        let mut s = Session::default();
        for step in graph::topological_order() {
            let rows = reference_rows(&s, step);
            let outcome = s.submit(step, &rows).unwrap();
            assert!(
                matches!(outcome, SubmitOutcome::Completed { .. }),
                "{} should complete, got {:?}",
                step,
                outcome
            );
        }
        assert!(s.progress().is_finished());
        assert_eq!(s.progress().current_step(), StepId::Output);
    }

    #[test]
    fn test_reset_restores_initial_gate() {
        let mut s = Session::default();
        for step in [StepId::Q, StepId::K, StepId::TransposeK] {
            let rows = reference_rows(&s, step);
            s.submit(step, &rows).unwrap();
        }
        assert_eq!(s.state(StepId::Scores), StepState::Unlocked);

        s.reset();
        assert_eq!(s.state(StepId::Scores), StepState::Locked);
        assert_eq!(s.state(StepId::Q), StepState::Unlocked);
        assert_eq!(s.progress().current_step(), StepId::Input);
    }

    #[test]
    fn test_describe_resolves_operands() {
        let s = Session::default();
        let (info, operands) = s.describe(StepId::Scores).unwrap();
        assert_eq!(info.step, StepId::Scores);
        assert_eq!(operands.len(), 2);
        assert_eq!(operands[0].1, s.reference(StepId::Q).unwrap());
    }

    #[test]
    fn test_custom_tolerance_config() {
        let mut s = Session::new(SessionConfig {
            tolerance: 0.5,
            ..Default::default()
        });
        let mut rows = reference_rows(&s, StepId::Q);
        rows[1][0] += 0.25;
        assert!(s.submit(StepId::Q, &rows).unwrap().is_correct());
    }
}
