//! Property-based checks for the algebra, the validator and the gate.

use std::collections::BTreeSet;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use attention_tutor::core::matrix::{from_rows, multiply, softmax_rows, transpose, Matrix};
use attention_tutor::grading::reference::reference_matrix;
use attention_tutor::grading::validator::validate;
use attention_tutor::steps::graph::{self, StepState, View};
use attention_tutor::steps::progress::Progress;
use attention_tutor::steps::step::StepId;

fn matrix_strategy(max_dim: usize, range: f64) -> impl Strategy<Value = Matrix> {
    (1..=max_dim, 1..=max_dim).prop_flat_map(move |(r, c)| {
        prop::collection::vec(-range..range, r * c)
            .prop_map(move |cells| Matrix::from_shape_vec((r, c), cells).unwrap())
    })
}

fn step_strategy() -> impl Strategy<Value = StepId> {
    (0..StepId::COUNT).prop_map(|i| StepId::all()[i])
}

fn completed_strategy() -> impl Strategy<Value = BTreeSet<StepId>> {
    prop::collection::vec(step_strategy(), 0..StepId::COUNT)
        .prop_map(|steps| steps.into_iter().collect())
}

proptest! {
    #[test]
    fn prop_transpose_is_involution(m in matrix_strategy(8, 1000.0)) {
        prop_assert_eq!(transpose(&transpose(&m)), m);
    }

    #[test]
    fn prop_softmax_rows_are_distributions(m in matrix_strategy(8, 5000.0)) {
        let s = softmax_rows(&m);
        prop_assert_eq!(s.dim(), m.dim());
        for row in s.rows() {
            prop_assert!((row.sum() - 1.0).abs() < 1e-4, "row sums to {}", row.sum());
            for &v in row.iter() {
                prop_assert!(v.is_finite() && (0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn prop_multiply_shape(a in matrix_strategy(8, 10.0), b in matrix_strategy(8, 10.0)) {
        match multiply(&a, &b) {
            Ok(c) => {
                prop_assert_eq!(a.ncols(), b.nrows());
                prop_assert_eq!(c.dim(), (a.nrows(), b.ncols()));
            }
            Err(_) => prop_assert_ne!(a.ncols(), b.nrows()),
        }
    }

    #[test]
    fn prop_gate_matches_prerequisites(step in step_strategy(), done in completed_strategy()) {
        let unlocked = graph::is_unlocked(step, &done);
        let expected = graph::prerequisites_of(step).iter().all(|p| done.contains(p));
        prop_assert_eq!(unlocked, expected);

        let state = graph::step_state(step, &done);
        if done.contains(&step) {
            prop_assert_eq!(state, StepState::Completed);
        } else if unlocked {
            prop_assert_eq!(state, StepState::Unlocked);
        } else {
            prop_assert_eq!(state, StepState::Locked);
        }
    }

    #[test]
    fn prop_gate_is_monotonic(step in step_strategy(), done in completed_strategy(), extra in step_strategy()) {
        let mut more = done.clone();
        more.insert(extra);
        if graph::is_unlocked(step, &done) {
            prop_assert!(graph::is_unlocked(step, &more));
        }
    }

    #[test]
    fn prop_recorded_steps_keep_every_prerequisite(
        steps in prop::collection::vec(step_strategy(), 0..24),
        canvas in any::<bool>(),
    ) {
        let view = if canvas { View::Canvas } else { View::Wizard };
        let mut progress = Progress::new().with_view(view);
        for step in steps {
            let was_locked = progress.state_of(step) == StepState::Locked;
            let first = progress.mark_completed(step);
            if was_locked {
                prop_assert!(!first && !progress.is_completed(step));
            }
            // Whatever the view, the completed set stays closed under the
            // full prerequisite table.
            for &done in progress.completed() {
                prop_assert!(graph::is_unlocked(done, progress.completed()));
            }
            prop_assert_ne!(progress.state_of(progress.current_step()), StepState::Locked);
        }
    }
}

#[test]
fn test_reference_self_validates_for_every_step() {
    for step in StepId::all() {
        let expected = reference_matrix(step).unwrap();
        assert!(validate(step, &expected).unwrap().valid, "{}", step);
        assert_eq!(reference_matrix(step).unwrap(), expected);
    }
}

#[test]
fn test_random_perturbations_are_caught() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let step = StepId::all()[rng.gen_range(0..StepId::COUNT)];
        let mut candidate = reference_matrix(step).unwrap();
        let (rows, cols) = candidate.dim();
        let (i, j) = (rng.gen_range(0..rows), rng.gen_range(0..cols));
        let delta = rng.gen_range(0.001..1.0) * if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        candidate[[i, j]] += delta;

        let result = validate(step, &candidate).unwrap();
        assert!(!result.valid);
        assert_eq!(result.error_cells(), vec![(i, j)]);
    }
}

#[test]
fn test_random_small_noise_is_accepted() {
    let mut rng = StdRng::seed_from_u64(11);
    for step in StepId::all() {
        let mut candidate = reference_matrix(step).unwrap();
        candidate.mapv_inplace(|v| v + rng.gen_range(-5e-5..5e-5));
        assert!(validate(step, &candidate).unwrap().valid, "{}", step);
    }
}

#[test]
fn test_concrete_tutorial_values() {
    assert_eq!(reference_matrix(StepId::Q).unwrap()[[0, 0]], 10.0);
    assert_eq!(reference_matrix(StepId::K).unwrap()[[0, 0]], 2.0);
    assert_eq!(reference_matrix(StepId::Scores).unwrap()[[0, 0]], 10.0);

    let row = from_rows(&[vec![10.0, 10.0, 10.0, 0.0, 0.0]]).unwrap();
    let s = softmax_rows(&row);
    let expected = [0.3333, 0.3333, 0.3333, 0.0, 0.0];
    for (j, e) in expected.iter().enumerate() {
        assert!((s[[0, j]] - e).abs() < 1e-4);
    }
}

#[test]
fn test_stable_softmax_on_large_spread() {
    let m = from_rows(&[vec![1000.0, 0.0]]).unwrap();
    let s = softmax_rows(&m);
    assert!(s.iter().all(|v| !v.is_nan()));
}
