//! `pollgen`: command-line front end for poll-engine.
//!
//! Usage:
//!   pollgen suggest "tous les samedis de mars" [--today 2026-03-01] [--config cfg.json] [--explain]
//!   pollgen visible --form form.json --answers answers.json [--clean]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use poll_engine::{
    clean_hidden_answers, visible_question_ids, AnswerMap, ConditionalRule, InterpreterConfig,
    Question, RruleCalendar, TemporalRequestInterpreter,
};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pollgen")]
#[command(about = "Date poll suggestions and form visibility rules", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn a French scheduling request into a poll suggestion (JSON)
    Suggest {
        /// The request, e.g. "vendredi soir ou samedi matin"
        text: String,
        /// Reference date (YYYY-MM-DD); defaults to today in the configured timezone
        #[arg(long)]
        today: Option<NaiveDate>,
        /// JSON interpreter config file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print constraints and consistency findings along with the suggestion
        #[arg(long)]
        explain: bool,
    },
    /// Evaluate visibility rules against a set of answers
    Visible {
        /// JSON file holding `{ "questions": [...], "rules": [...] }`
        #[arg(long)]
        form: PathBuf,
        /// JSON file holding the answers, keyed by question id
        #[arg(long)]
        answers: PathBuf,
        /// Print the answers with hidden questions removed instead of the visible ids
        #[arg(long)]
        clean: bool,
    },
}

#[derive(Deserialize)]
struct Form {
    questions: Vec<Question>,
    #[serde(default)]
    rules: Vec<ConditionalRule>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Suggest {
            text,
            today,
            config,
            explain,
        } => suggest(&text, today, config.as_deref(), explain),
        Commands::Visible {
            form,
            answers,
            clean,
        } => visible(&form, &answers, clean),
    }
}

fn suggest(text: &str, today: Option<NaiveDate>, config: Option<&Path>, explain: bool) -> Result<()> {
    let config = match config {
        Some(path) => InterpreterConfig::from_json_str(&read(path)?)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => InterpreterConfig::default(),
    };
    let interpreter = TemporalRequestInterpreter::new(config, Arc::new(RruleCalendar::new()));
    let today = match today {
        Some(date) => date,
        None => interpreter.today(Utc::now())?,
    };

    let interpretation = interpreter
        .interpret(text, today)
        .with_context(|| format!("Cannot build a poll from \"{text}\""))?;
    let json = if explain {
        serde_json::to_string_pretty(&interpretation)?
    } else {
        serde_json::to_string_pretty(&interpretation.suggestion)?
    };
    println!("{json}");
    Ok(())
}

fn visible(form: &Path, answers: &Path, clean: bool) -> Result<()> {
    let form: Form = serde_json::from_str(&read(form)?)
        .with_context(|| format!("Invalid form file {}", form.display()))?;
    let answers: AnswerMap = serde_json::from_str(&read(answers)?)
        .with_context(|| format!("Invalid answers file {}", answers.display()))?;

    let ids = visible_question_ids(&form.questions, &form.rules, &answers);
    let json = if clean {
        serde_json::to_string_pretty(&clean_hidden_answers(&answers, &ids))?
    } else {
        serde_json::to_string_pretty(&ids)?
    };
    println!("{json}");
    Ok(())
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
