//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs logging
//! - resolves credentials
//! - runs the analysis pipeline
//! - prints reports/charts
//! - writes the JSON export

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalyzeArgs, Command, DebugArgs, RunArgs, ShowArgs};
use crate::data::{Credentials, SerpApiClient};
use crate::domain::{PROMPT_REVIEW_LIMIT, RunRequest};
use crate::error::{AnalysisError, AppError};

pub mod pipeline;

use pipeline::Endpoints;

/// Entry point for the `insights` binary.
pub fn run() -> Result<(), AppError> {
    // Keys may live in `.env`; clap reads them from the environment.
    dotenvy::dotenv().ok();

    // We want `insights` and `insights --app-id X` to behave like `insights tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    // The TUI owns the terminal; log lines would corrupt it.
    if !matches!(cli.command, Command::Tui(_)) {
        init_tracing(cli.verbose);
    }

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Show(args) => handle_show(args),
        Command::Debug(args) => handle_debug(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let request = run_request_from_args(&args.run);
    let credentials = credentials_from_args(&args.run)?;
    let (reviews, llm) = pipeline::build_clients(&credentials, &endpoints_from_args(&args.run))?;

    eprintln!("Fetching and analyzing {} reviews for {}...", request.max_reviews, request.app_name);
    let run = pipeline::run_with_progress(&request, &reviews, &llm, &mut |stage| {
        tracing::info!(%stage, "progress");
    })?;

    println!("{}", crate::report::format_run_summary(&run));
    println!("{}", crate::report::format_insights(&run.analysis));

    if !args.no_plot {
        println!(
            "{}",
            crate::plot::render_rating_histogram(&run.analysis.rating_distribution, args.width)
        );
    }

    if args.show_reviews > 0 {
        println!("{}", crate::report::format_reviews(&run.reviews, args.show_reviews, 100));
    }

    if !args.no_export {
        let path = crate::io::write_analysis_json(
            &args.export_dir,
            &request.app_name,
            &run.analysis,
            run.completed_at,
        )?;
        println!("Analysis JSON written to {}", path.display());
    }

    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let analysis = crate::io::read_analysis_json(&args.path)?;

    println!("{}", crate::report::format_insights(&analysis));
    println!(
        "{}",
        crate::plot::render_rating_histogram(&analysis.rating_distribution, args.width)
    );
    Ok(())
}

fn handle_debug(args: DebugArgs) -> Result<(), AppError> {
    let key = args
        .serpapi_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(AnalysisError::CredentialMissing {
            name: "SerpApi key",
            flag: "serpapi-key",
            env_var: crate::data::credentials::SERPAPI_ENV,
        })?;

    let mut client = SerpApiClient::new(key, Duration::from_secs(args.timeout_secs))?;
    if let Some(url) = &args.serpapi_url {
        client = client.with_base_url(url);
    }

    let probes = crate::debug::probe_counts(&client, &args.app_id, &args.counts);
    let report = crate::debug::format_diagnostics(&args.app_id, &args.app_name, &probes);
    print!("{report}");

    if args.bundle {
        let path = crate::debug::write_debug_bundle(&args.app_id, &report)?;
        println!("\nWrote debug bundle: {}", path.display());
    }
    Ok(())
}

fn handle_tui(args: RunArgs) -> Result<(), AppError> {
    // Resolve keys before the terminal switches to raw mode so prompts still work.
    let credentials = credentials_from_args(&args)?;
    crate::tui::run(run_request_from_args(&args), credentials, endpoints_from_args(&args))
}

pub fn run_request_from_args(args: &RunArgs) -> RunRequest {
    RunRequest {
        app_id: args.app_id.clone(),
        app_name: args.app_name.clone(),
        max_reviews: args.max_reviews,
        model: args.model.clone(),
        prompt_review_limit: PROMPT_REVIEW_LIMIT,
        ..RunRequest::default()
    }
}

pub fn endpoints_from_args(args: &RunArgs) -> Endpoints {
    Endpoints {
        serpapi_url: args.serpapi_url.clone(),
        openai_url: args.openai_url.clone(),
        timeout: Duration::from_secs(args.timeout_secs),
    }
}

fn credentials_from_args(args: &RunArgs) -> Result<Credentials, AppError> {
    if args.ask_keys {
        Credentials::resolve_interactive(args.serpapi_key.clone(), args.openai_key.clone())
    } else {
        Ok(Credentials::resolve(args.serpapi_key.clone(), args.openai_key.clone())?)
    }
}

/// Rewrite argv so `insights` defaults to `insights tui`.
///
/// Rules:
/// - `insights`                      -> `insights tui`
/// - `insights --app-id X ...`       -> `insights tui --app-id X ...`
/// - `insights -v analyze ...`       -> unchanged (global flags before a subcommand)
/// - `insights --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let has_subcommand = argv
        .iter()
        .skip(1)
        .any(|a| matches!(a.as_str(), "analyze" | "show" | "debug" | "tui"));
    if has_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_the_dashboard() {
        assert_eq!(rewrite_args(argv(&["insights"])), argv(&["insights", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["insights", "--app-id", "42"])),
            argv(&["insights", "tui", "--app-id", "42"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        assert_eq!(rewrite_args(argv(&["insights", "analyze"])), argv(&["insights", "analyze"]));
        assert_eq!(rewrite_args(argv(&["insights", "--help"])), argv(&["insights", "--help"]));
    }

    #[test]
    fn global_flags_may_precede_a_subcommand() {
        let rewritten = rewrite_args(argv(&["insights", "-v", "analyze"]));
        assert_eq!(rewritten, argv(&["insights", "-v", "analyze"]));

        let cli = crate::cli::Cli::try_parse_from(rewritten).unwrap();
        assert_eq!(cli.verbose, 1);
        assert!(matches!(cli.command, Command::Analyze(_)));

        let cli = crate::cli::Cli::try_parse_from(rewrite_args(argv(&["insights", "-vv"]))).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Tui(_)));
    }

    fn analyze_args_without_keys() -> AnalyzeArgs {
        let cli = crate::cli::Cli::try_parse_from(["insights", "analyze", "--no-export"]).unwrap();
        let Command::Analyze(mut args) = cli.command else {
            panic!("expected analyze");
        };
        // Ignore whatever the test environment exports.
        args.run.serpapi_key = None;
        args.run.openai_key = None;
        args
    }

    #[test]
    fn missing_keys_stop_before_any_client_is_built() {
        let args = analyze_args_without_keys();

        let err = credentials_from_args(&args.run).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("SERPAPI_KEY"));

        let mut args = analyze_args_without_keys();
        args.run.serpapi_key = Some("s".to_string());
        let err = handle_analyze(args).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn request_takes_flag_values() {
        let cli = crate::cli::Cli::try_parse_from([
            "insights", "tui", "--app-id", "42", "--app-name", "Slack", "-n", "10", "--model", "gpt-4o",
        ])
        .unwrap();
        let Command::Tui(args) = cli.command else {
            panic!("expected tui");
        };
        let request = run_request_from_args(&args);
        assert_eq!(request.app_id, "42");
        assert_eq!(request.app_name, "Slack");
        assert_eq!(request.max_reviews, 10);
        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.prompt_review_limit, 50);
        assert_eq!(request.max_tokens, 1000);
    }
}
