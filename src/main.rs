//! attention-tutor — work through self-attention one matrix at a time.
//!
//! This is the CLI binary entry point.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use attention_tutor::core::matrix::{to_rows, Matrix};
use attention_tutor::core::weights::token_labels;
use attention_tutor::grading::validator::{ValidationResult, Validator};
use attention_tutor::runtime::session::{Session, SessionConfig, SubmitOutcome};
use attention_tutor::steps::content::step_lesson;
use attention_tutor::steps::graph;
use attention_tutor::steps::step::StepId;

/// Self-attention tutorial CLI.
#[derive(Parser, Debug)]
#[command(
    name = "attention-tutor",
    about = "Reproduce each matrix of self-attention and get it checked",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List steps in dependency order with their prerequisites.
    Steps,

    /// Show what a step asks for, its lesson, operands and the expected result.
    Show {
        /// Step name (input, q, k, v, transpose_k, scores, softmax, output).
        step: StepId,

        /// Hide the expected result.
        #[arg(long, default_value_t = false)]
        no_answer: bool,
    },

    /// Check a candidate matrix given as a JSON array of rows.
    Check {
        /// Step name.
        step: StepId,

        /// Path to the JSON file, or `-` for stdin.
        file: PathBuf,

        /// Largest accepted absolute deviation per cell.
        #[arg(long, default_value_t = attention_tutor::config::TOLERANCE)]
        tolerance: f64,

        /// Print the validation result as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Follow the wizard, submitting each reference matrix, and log unlocks.
    Walkthrough,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    tracing::debug!("attention-tutor v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Steps => list_steps(),
        Command::Show { step, no_answer } => show_step(step, no_answer)?,
        Command::Check {
            step,
            file,
            tolerance,
            json,
        } => check_candidate(step, &file, tolerance, json)?,
        Command::Walkthrough => walkthrough()?,
    }

    Ok(())
}

fn list_steps() {
    for step in graph::topological_order() {
        let prereqs: Vec<&str> = graph::prerequisites_of(step).iter().map(|p| p.name()).collect();
        let view = if graph::node(step).wizard { "wizard" } else { "canvas" };
        println!(
            "{:<12} {:<7} requires [{}]",
            step.name(),
            view,
            prereqs.join(", ")
        );
    }
}

fn show_step(step: StepId, no_answer: bool) -> Result<()> {
    let session = Session::default();
    let (info, operands) = session.describe(step)?;
    let lesson = step_lesson(step);

    match lesson.number() {
        Some(n) => println!("Step {}: {}", n, info.title),
        None => println!("{} (canvas only)", info.title),
    }
    println!("  {}", info.description);
    println!("  Formula: {}", info.formula);
    println!("  Hint: {}", info.hint);

    println!("\n{}", lesson.explanation);
    println!("\nWhy it matters: {}", lesson.importance);
    println!("\nExample:");
    for line in lesson.example.lines() {
        println!("  {}", line);
    }
    println!("\nTips:");
    for tip in lesson.tips {
        println!("  - {}", tip);
    }

    for (name, m) in &operands {
        println!("\n{}", name);
        print_matrix(m);
    }

    if !no_answer {
        println!("\n{}", info.result_name);
        print_matrix(&session.reference(step)?);
    }
    Ok(())
}

fn check_candidate(step: StepId, file: &Path, tolerance: f64, json: bool) -> Result<()> {
    let text = read_input(file)?;
    let rows: Vec<Vec<f64>> = serde_json::from_str(&text)
        .with_context(|| format!("candidate for '{}' is not a JSON array of rows", step))?;

    let result = Validator::with_tolerance(tolerance).validate_rows(step, &rows)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(step, &result);
    }

    if !result.valid {
        std::process::exit(1);
    }
    Ok(())
}

fn walkthrough() -> Result<()> {
    let mut session = Session::new(SessionConfig::default());

    let wizard_len = session.progress().wizard_steps().len();
    for _ in 0..wizard_len {
        let step = session.progress().current_step();
        let rows = to_rows(&session.reference(step)?);
        match session.submit(step, &rows)? {
            SubmitOutcome::Completed {
                implied, unlocked, ..
            } => {
                let names: Vec<&str> = unlocked.iter().map(|s| s.name()).collect();
                tracing::info!("{} verified; unlocked [{}]", step, names.join(", "));
                for hidden in implied {
                    tracing::info!("  {} recorded along with {}", hidden, step);
                }
            }
            other => bail!("reference for '{}' was not accepted: {:?}", step, other),
        }
    }

    tracing::info!(
        "All {} steps verified ({:.0}% complete).",
        session.progress().completed().len(),
        session.progress().completion_ratio() * 100.0
    );
    Ok(())
}

fn read_input(file: &Path) -> Result<String> {
    let mut text = String::new();
    if file.as_os_str() == "-" {
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read candidate from stdin")?;
    } else {
        text = std::fs::read_to_string(file)
            .with_context(|| format!("failed to read '{}'", file.display()))?;
    }
    Ok(text)
}

fn print_matrix(m: &Matrix) {
    let labels = token_labels(m);
    for (i, row) in to_rows(m).iter().enumerate() {
        let cells: Vec<String> = row.iter().map(|v| format!("{:>8.4}", v)).collect();
        match labels {
            Some(labels) => println!("  {:<7}[{}]", labels[i], cells.join(" ")),
            None => println!("  [{}]", cells.join(" ")),
        }
    }
}

fn print_result(step: StepId, result: &ValidationResult) {
    if result.valid {
        println!("{}: correct", step);
        return;
    }

    println!("{}: {} cell(s) wrong", step, result.error_count());
    for row in result.cell_errors.rows() {
        let marks: Vec<&str> = row.iter().map(|&e| if e { "x" } else { "." }).collect();
        println!("  {}", marks.join(" "));
    }
}
