//! Validate command - Validate a workflow spec.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use serde::Serialize;
use tracing::info;

use sparkgen_spec::{SpecValidator, ValidationResult};

use super::SpecArgs;

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub spec: SpecArgs,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Serialize)]
struct ValidationReport<'a> {
    spec: String,
    workflow: &'a str,
    environment: &'a str,
    valid: bool,
    errors: &'a [String],
    warnings: &'a [String],
    checked_at: String,
}

pub async fn execute(args: ValidateArgs) -> Result<()> {
    info!("Validating workflow: {:?}", args.spec.spec);

    let loader = args.spec.loader();
    let spec = loader
        .load_unchecked()
        .with_context(|| format!("Failed to load workflow {:?}", args.spec.spec))?;

    let mut result = SpecValidator::validate_all(&spec, &loader.base_dir());
    if args.strict {
        promote_warnings(&mut result);
    }

    if args.json {
        let report = ValidationReport {
            spec: args.spec.spec.display().to_string(),
            workflow: &spec.name,
            environment: &spec.environment,
            valid: result.valid,
            errors: &result.errors,
            warnings: &result.warnings,
            checked_at: Utc::now().to_rfc3339(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&spec.name, &spec.environment, &result);
    }

    if !result.valid {
        anyhow::bail!("Validation failed with {} error(s)", result.errors.len());
    }
    Ok(())
}

fn promote_warnings(result: &mut ValidationResult) {
    for warning in std::mem::take(&mut result.warnings) {
        result.add_error(warning);
    }
}

fn print_report(workflow: &str, environment: &str, result: &ValidationResult) {
    println!("📋 Validating workflow '{}' (environment: {})...", workflow, environment);

    if result.valid {
        println!("   ✅ Spec validation passed");
    } else {
        println!("   ❌ Spec validation failed:");
        for error in &result.errors {
            println!("      - {}", error);
        }
    }

    for warning in &result.warnings {
        println!("   ⚠️  {}", warning);
    }
}
