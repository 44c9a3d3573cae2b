//! Teaching metadata for each step: what to compute, how, and which
//! matrices to show beside the input grid. [`step_lesson`] carries the
//! longer sidebar text.

use crate::core::matrix::Matrix;
use crate::error::Result;
use crate::grading::reference::ReferenceCalculator;
use crate::steps::graph;
use crate::steps::step::StepId;

/// Where an operand shown next to a step comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandSource {
    /// Token embeddings `X`.
    Input,
    /// Query weights.
    WeightQuery,
    /// Key weights.
    WeightKey,
    /// Value weights.
    WeightValue,
    /// Reference result of an upstream step.
    Step(StepId),
}

/// A matrix displayed next to a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Operand {
    pub name: &'static str,
    pub source: OperandSource,
}

/// Static description of a step.
#[derive(Clone, Debug)]
pub struct StepInfo {
    pub step: StepId,
    pub title: &'static str,
    pub description: &'static str,
    pub formula: &'static str,
    pub result_name: &'static str,
    pub hint: &'static str,
    pub operands: Vec<Operand>,
}

impl StepInfo {
    /// Resolve every operand to its matrix.
    pub fn resolve_operands(&self, calc: &ReferenceCalculator<'_>) -> Result<Vec<(&'static str, Matrix)>> {
        self.operands
            .iter()
            .map(|op| -> Result<(&'static str, Matrix)> {
                let m = match op.source {
                    OperandSource::Input => calc.weights().input.clone(),
                    OperandSource::WeightQuery => calc.weights().w_q.clone(),
                    OperandSource::WeightKey => calc.weights().w_k.clone(),
                    OperandSource::WeightValue => calc.weights().w_v.clone(),
                    OperandSource::Step(step) => calc.reference_matrix(step)?,
                };
                Ok((op.name, m))
            })
            .collect()
    }
}

const fn operand(name: &'static str, source: OperandSource) -> Operand {
    Operand { name, source }
}

/// Metadata for `step`.
pub fn step_info(step: StepId) -> StepInfo {
    use OperandSource::*;

    match step {
        StepId::Input => StepInfo {
            step,
            title: "Input Matrix",
            description: "The starting token embeddings (5×8). One row per token.",
            formula: "Input = X",
            result_name: "Input Matrix",
            hint: "This matrix is given. Copy the values as shown.",
            operands: vec![],
        },
        StepId::Q => StepInfo {
            step,
            title: "Query Matrix (Q)",
            description: "Multiply the Input with the query weights.",
            formula: "Q = Input × Wq",
            result_name: "Q Matrix (5×4)",
            hint: "Multiply each row of Input (5×8) with each column of Wq (8×4). \
                   Q₁₁ = (1×10) + (0×10) + (0×10) + 0 + 0 + 0 + 0 + 0 = 10",
            operands: vec![operand("Input (5×8)", Input), operand("Wq (8×4)", WeightQuery)],
        },
        StepId::K => StepInfo {
            step,
            title: "Key Matrix (K)",
            description: "Multiply the Input with the key weights.",
            formula: "K = Input × Wk",
            result_name: "K Matrix (5×4)",
            hint: "Same as Q but with Wk. K₁₁ = (1×2) + (0×2) + (0×2) + 0 + 0 + 0 + 0 + 0 = 2",
            operands: vec![operand("Input (5×8)", Input), operand("Wk (8×4)", WeightKey)],
        },
        StepId::V => StepInfo {
            step,
            title: "Value Matrix (V)",
            description: "Multiply the Input with the value weights.",
            formula: "V = Input × Wv",
            result_name: "V Matrix (5×4)",
            hint: "Use Wv. V₁₁ = (1×1) + 0 + 0 + 0 + 0 + 0 + 0 + 0 = 1",
            operands: vec![operand("Input (5×8)", Input), operand("Wv (8×4)", WeightValue)],
        },
        StepId::TransposeK => StepInfo {
            step,
            title: "Transpose K",
            description: "Flip the Key matrix so it can be multiplied with Q (4×5).",
            formula: "Kᵀ = transpose(K)",
            result_name: "Kᵀ Matrix (4×5)",
            hint: "Row i of K becomes column i of Kᵀ: K[i][j] → Kᵀ[j][i].",
            operands: vec![operand("K (5×4)", Step(StepId::K))],
        },
        StepId::Scores => StepInfo {
            step,
            title: "Attention Scores (Scaled)",
            description: "Compute raw scores Q × Kᵀ, then divide every value by √d_k = 2.0.",
            formula: "Scores = (Q × Kᵀ) / 2.0",
            result_name: "Scaled Scores Matrix (5×5)",
            hint: "Transpose K (4×5), multiply Q (5×4) by it to get raw scores (5×5), \
                   then divide each cell by 2.0. A raw score of 20 becomes 10.",
            operands: vec![operand("Q (5×4)", Step(StepId::Q)), operand("K (5×4)", Step(StepId::K))],
        },
        StepId::Softmax => StepInfo {
            step,
            title: "Softmax Attention",
            description: "Turn each row of scaled scores into probabilities that sum to 1.",
            formula: "Attention = softmax(Scaled Scores)",
            result_name: "Attention Matrix (5×5)",
            hint: "Per row: exp(value) / sum(exp(row)). Enter 1/3 as 0.3333 and 1/2 as 0.5000. \
                   Values next to exp(10) terms round to 0.0000.",
            operands: vec![operand("Scaled Scores (5×5)", Step(StepId::Scores))],
        },
        StepId::Output => StepInfo {
            step,
            title: "Final Output",
            description: "Weight the Value rows by the attention probabilities.",
            formula: "Output = Attention × V",
            result_name: "Output Matrix (5×4)",
            hint: "Multiply Attention (5×5) with V (5×4). Each output row is a weighted \
                   sum of V rows: Output₁₁ = (0.3333 × V₁₁) + (0.3333 × V₂₁) + ... + (0.0000 × V₅₁).",
            operands: vec![
                operand("Attention (5×5)", Step(StepId::Softmax)),
                operand("V (5×4)", Step(StepId::V)),
            ],
        },
    }
}

/// Sidebar lesson for a step.
#[derive(Clone, Debug)]
pub struct StepLesson {
    pub step: StepId,

    /// What the step computes and what the result means.
    pub explanation: &'static str,

    /// Why the step matters to attention as a whole.
    pub importance: &'static str,

    /// Worked calculation over the tutorial data, one line per entry.
    pub example: &'static str,

    pub tips: &'static [&'static str],
}

impl StepLesson {
    /// 1-based position in the wizard, `None` for canvas-only steps.
    pub fn number(&self) -> Option<usize> {
        graph::wizard_order()
            .iter()
            .position(|&s| s == self.step)
            .map(|i| i + 1)
    }
}

/// Lesson text for `step`.
pub fn step_lesson(step: StepId) -> StepLesson {
    match step {
        StepId::Input => StepLesson {
            step,
            explanation: "Input embeddings are numerical representations of the input tokens. \
                          Each row is one token and each column is one dimension of the \
                          embedding space.",
            importance: "Every later matrix is computed from these vectors. They turn words \
                         into dense numbers the model can process and learn from.",
            example: "Shape: 5 tokens × 8 dimensions\n\
                      First token 'The': [1, 0, 0, 0, 0, 0, 0, 0]",
            tips: &[
                "Each row corresponds to an input token's embedding.",
                "The number of columns is the embedding dimension.",
                "These initial values are typically learned during training.",
            ],
        },
        StepId::Q => StepLesson {
            step,
            explanation: "Q is the Input multiplied by the learned weights Wq. A query row \
                          says what information its token is looking for.",
            importance: "Queries are the question each position asks. How well a query \
                         matches each key decides how strongly that position attends.",
            example: "Q = X × Wq\n\
                      Q₁₁ = (1×10) + (0×10) + (0×10) + (0×0) + (0×0) + (0×0) + (0×0) + (0×0) = 10\n\
                      Result shape: (5, 4)",
            tips: &[
                "Each row in Q is the query vector of one token.",
                "Queries decide where attention focuses.",
                "Input.cols must equal Wq.rows for the product to exist.",
            ],
        },
        StepId::K => StepLesson {
            step,
            explanation: "K is the Input multiplied by the learned weights Wk. A key row \
                          says what information its token contains for others to find.",
            importance: "Keys label what each position offers. They are compared against \
                         queries to produce the raw attention scores.",
            example: "K = X × Wk\n\
                      K₁₁ = (1×2) + (0×2) + (0×2) + (0×0) + (0×0) + (0×0) + (0×0) + (0×0) = 2\n\
                      Result shape: (5, 4)",
            tips: &[
                "Keys describe the content available at each token position.",
                "They are scored against query vectors.",
                "Same multiplication as Q with different weights.",
            ],
        },
        StepId::V => StepLesson {
            step,
            explanation: "V is the Input multiplied by the learned weights Wv. Values hold \
                          the content that gets combined and passed forward.",
            importance: "Values are the payload. Attention only decides how much of each \
                         value vector reaches every output row.",
            example: "V = X × Wv\n\
                      V₁₁ = (1×1) + (0×0) + (0×0) + (0×0) + (0×0) + (0×0) + (0×0) + (0×0) = 1\n\
                      Result shape: (5, 4)",
            tips: &[
                "Values hold the information content.",
                "They are weighted by the attention probabilities.",
                "The final output is a weighted sum of value vectors.",
            ],
        },
        StepId::TransposeK => StepLesson {
            step,
            explanation: "Kᵀ swaps the rows and columns of K. Column j of Kᵀ is the key \
                          vector of token j.",
            importance: "Q is 5×4 and K is 5×4, so Q × K does not exist. Transposing K to \
                         4×5 lines every query up against every key in one product.",
            example: "K row 1 = [2, 0, 0, 0]\n\
                      Kᵀ column 1 = [2, 0, 0, 0]ᵀ\n\
                      Result shape: (4, 5)",
            tips: &[
                "Kᵀ[j][i] equals K[i][j].",
                "The wizard folds this step into the scores step.",
            ],
        },
        StepId::Scores => StepLesson {
            step,
            explanation: "Scores are Q multiplied by Kᵀ, then divided by √d_k = 2.0.",
            importance: "Each score measures how compatible one query is with one key. \
                         Scaling keeps the dot products from growing so large that softmax \
                         saturates.",
            example: "Scores = (Q × Kᵀ) / 2.0\n\
                      Q₁ = [10, 0, 0, 0], K₁ = [2, 0, 0, 0]\n\
                      Raw Score₁₁ = (10×2) + (0×0) + (0×0) + (0×0) = 20\n\
                      Scaled Score₁₁ = 20 / 2.0 = 10\n\
                      Result shape: (5, 5)",
            tips: &[
                "Higher scores mean a stronger potential attention link.",
                "K is transposed (4×5) so it can be multiplied with Q.",
                "Scaling normalizes the variance of the scores.",
                "Cell (i, j) is token i's query against token j's key.",
            ],
        },
        StepId::Softmax => StepLesson {
            step,
            explanation: "Softmax is applied to each row of the scaled scores, turning the \
                          row into a probability distribution that sums to 1.",
            importance: "The probabilities say how much each value vector contributes. \
                         Relevant positions get most of the weight and the rest fall close \
                         to zero.",
            example: "Row [10, 10, 10, 0, 0]\n\
                      exp(10) / (3·exp(10) + 2·exp(0)) ≈ 0.3333\n\
                      exp(0) / (3·exp(10) + 2·exp(0)) ≈ 0.0000\n\
                      Result row: [0.3333, 0.3333, 0.3333, 0.0000, 0.0000]",
            tips: &[
                "The exponential amplifies differences between scores.",
                "Subtracting the row maximum first keeps large values finite.",
                "Every row of the result sums to 1.",
            ],
        },
        StepId::Output => StepLesson {
            step,
            explanation: "The output is the attention matrix multiplied by V. Each token's \
                          new row blends the value vectors of the tokens it attends to.",
            importance: "This is the result of self-attention: a context-aware version of \
                         the input, ready for the next layer.",
            example: "Output = Attention × V\n\
                      Output₁₁ = (0.3333 × V₁₁) + (0.3333 × V₂₁) + (0.3333 × V₃₁) \
                      + (0.0000 × V₄₁) + (0.0000 × V₅₁)\n\
                      Result shape: (5, 4)",
            tips: &[
                "Each output row is a weighted sum of value vectors.",
                "The attention probabilities are the weights.",
                "A transformer passes this output on to its next layer.",
            ],
        },
    }
}
