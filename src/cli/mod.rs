//! Command-line parsing for the review insights tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the pipeline code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data::credentials::{OPENAI_ENV, SERPAPI_ENV};
use crate::domain::{DEFAULT_APP_ID, DEFAULT_APP_NAME, DEFAULT_MAX_REVIEWS, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "insights",
    version,
    about = "App Store review insights (SerpApi reviews + LLM analysis)"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch reviews, analyze them, print the report, and export the JSON.
    Analyze(AnalyzeArgs),
    /// Render a previously exported analysis JSON.
    Show(ShowArgs),
    /// Print review-count diagnostics for the review search.
    Debug(DebugArgs),
    /// Launch the interactive dashboard.
    ///
    /// This uses the same underlying pipeline as `insights analyze`, but renders
    /// results in a terminal UI using Ratatui.
    Tui(RunArgs),
}

/// Options shared by every command that talks to the hosted services.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// App Store product ID.
    #[arg(long, default_value = DEFAULT_APP_ID)]
    pub app_id: String,

    /// Human-readable app name used in the prompt and report.
    #[arg(long, default_value = DEFAULT_APP_NAME)]
    pub app_name: String,

    /// Number of reviews to request.
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_REVIEWS)]
    pub max_reviews: usize,

    /// Chat model used for the analysis.
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Per-request timeout for the hosted services (seconds).
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// SerpApi key.
    #[arg(long, env = SERPAPI_ENV, hide_env_values = true)]
    pub serpapi_key: Option<String>,

    /// OpenAI API key.
    #[arg(long, env = OPENAI_ENV, hide_env_values = true)]
    pub openai_key: Option<String>,

    /// Override the review search endpoint.
    #[arg(long, env = "SERPAPI_BASE_URL")]
    pub serpapi_url: Option<String>,

    /// Override the chat-completions base URL (OpenAI-compatible servers).
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub openai_url: Option<String>,

    /// Prompt on the terminal for any missing key.
    #[arg(long)]
    pub ask_keys: bool,
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Directory for the exported analysis JSON.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub export_dir: PathBuf,

    /// Do not write the analysis JSON.
    #[arg(long)]
    pub no_export: bool,

    /// Disable the terminal rating chart.
    #[arg(long)]
    pub no_plot: bool,

    /// Chart bar width (columns).
    #[arg(long, default_value_t = 40)]
    pub width: usize,

    /// Also list the first N raw reviews.
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub show_reviews: usize,
}

/// Options for rendering a saved analysis.
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Analysis JSON file produced by `insights analyze`.
    #[arg(value_name = "JSON")]
    pub path: PathBuf,

    /// Chart bar width (columns).
    #[arg(long, default_value_t = 40)]
    pub width: usize,
}

#[derive(Debug, Args)]
pub struct DebugArgs {
    /// App Store product ID.
    #[arg(long, default_value = DEFAULT_APP_ID)]
    pub app_id: String,

    /// App name shown in the report.
    #[arg(long, default_value = DEFAULT_APP_NAME)]
    pub app_name: String,

    /// Review counts to request, one search each.
    #[arg(long, value_delimiter = ',', default_values_t = crate::debug::DEFAULT_COUNTS)]
    pub counts: Vec<usize>,

    /// SerpApi key.
    #[arg(long, env = SERPAPI_ENV, hide_env_values = true)]
    pub serpapi_key: Option<String>,

    /// Override the review search endpoint.
    #[arg(long, env = "SERPAPI_BASE_URL")]
    pub serpapi_url: Option<String>,

    /// Per-request timeout (seconds).
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Also write the report to `debug/` as Markdown.
    #[arg(long)]
    pub bundle: bool,
}
