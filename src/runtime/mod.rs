//! Runtime module: ties grading and progress into a learner session.

pub mod session;
