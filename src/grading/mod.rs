//! Grading module — reference values and the cell-wise validator.

pub mod reference;
pub mod validator;
