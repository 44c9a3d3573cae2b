//! Step identifiers for the attention walkthrough.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TutorError;

/// One node of the self-attention computation graph.
///
/// Declaration order is a valid topological order; `Ord` follows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Input,
    Q,
    K,
    V,
    TransposeK,
    Scores,
    Softmax,
    Output,
}

impl StepId {
    /// Number of steps.
    pub const COUNT: usize = 8;

    /// All steps in declaration order.
    pub fn all() -> [StepId; Self::COUNT] {
        [
            StepId::Input,
            StepId::Q,
            StepId::K,
            StepId::V,
            StepId::TransposeK,
            StepId::Scores,
            StepId::Softmax,
            StepId::Output,
        ]
    }

    pub fn index(&self) -> usize {
        match self {
            StepId::Input => 0,
            StepId::Q => 1,
            StepId::K => 2,
            StepId::V => 3,
            StepId::TransposeK => 4,
            StepId::Scores => 5,
            StepId::Softmax => 6,
            StepId::Output => 7,
        }
    }

    /// Stable snake_case name.
    pub fn name(&self) -> &'static str {
        match self {
            StepId::Input => "input",
            StepId::Q => "q",
            StepId::K => "k",
            StepId::V => "v",
            StepId::TransposeK => "transpose_k",
            StepId::Scores => "scores",
            StepId::Softmax => "softmax",
            StepId::Output => "output",
        }
    }

    /// Short label for progress displays.
    pub fn label(&self) -> &'static str {
        match self {
            StepId::Input => "Input",
            StepId::Q => "Query (Q)",
            StepId::K => "Key (K)",
            StepId::V => "Value (V)",
            StepId::TransposeK => "Transpose K",
            StepId::Scores => "Scores",
            StepId::Softmax => "Softmax",
            StepId::Output => "Output",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StepId {
    type Err = TutorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        StepId::all()
            .into_iter()
            .find(|step| step.name() == needle)
            .ok_or_else(|| TutorError::UnknownStep(s.to_string()))
    }
}
