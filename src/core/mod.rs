//! Core module — matrix algebra and the fixed tutorial data.

pub mod matrix;
pub mod weights;
