//! sparkgen CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation failure
//! - 4: Template error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sparkgen_guardrails::GuardrailError;
use sparkgen_spec::SpecError;

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const TEMPLATE_ERROR: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "sparkgen=debug"
    } else if cli.quiet {
        "sparkgen=warn"
    } else {
        "sparkgen=info"
    };
    let registry = tracing_subscriber::registry().with(
        EnvFilter::from_default_env()
            .add_directive(default_level.parse().unwrap())
            .add_directive("warn".parse().unwrap()),
    );
    let log_result = if cli.log_json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Commands::Validate(args) => commands::validate::execute(args).await,
        Commands::Resolve(args) => commands::resolve::execute(args).await,
        Commands::Plan(args) => commands::plan::execute(args).await,
        Commands::Schema(args) => commands::schema::execute(args).await,
        Commands::Init(args) => commands::init::execute(args).await,
        Commands::McpTools(args) => commands::mcp_tools::execute(args).await,
        Commands::Guardrails(args) => commands::guardrails::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(spec_error) = cause.downcast_ref::<SpecError>() {
            return match spec_error {
                SpecError::UnknownTemplate { .. } | SpecError::AlreadyExists(_) => ExitCodes::TEMPLATE_ERROR,
                SpecError::NotFound(_) => ExitCodes::INVALID_ARGS,
                e if e.is_validation() => ExitCodes::VALIDATION_FAILURE,
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
        if let Some(guardrail_error) = cause.downcast_ref::<GuardrailError>() {
            return match guardrail_error {
                GuardrailError::Violation(_) => ExitCodes::VALIDATION_FAILURE,
                e if e.is_validation() => ExitCodes::VALIDATION_FAILURE,
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("validation") || msg.contains("guardrail") {
        ExitCodes::VALIDATION_FAILURE
    } else if msg.contains("template") {
        ExitCodes::TEMPLATE_ERROR
    } else if msg.contains("argument") || msg.contains("not found") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}
