//! Guardrails command - Self-test rules and check text against an agent's guardrails.

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use tracing::{debug, info};

use sparkgen_guardrails::{GuardrailEngine, GuardrailSettings, Stage};
use sparkgen_spec::AgentBlueprint;

use super::SpecArgs;

#[derive(Args)]
pub struct GuardrailsArgs {
    #[command(subcommand)]
    pub command: GuardrailsCommand,
}

#[derive(Subcommand)]
pub enum GuardrailsCommand {
    /// Run the example prompts attached to each rule
    Test(TestArgs),

    /// Run one piece of text through an agent's guardrails
    Check(CheckArgs),
}

#[derive(Args)]
pub struct TestArgs {
    #[command(flatten)]
    pub spec: SpecArgs,

    /// Only test this agent's rules
    #[arg(short, long)]
    pub agent: Option<String>,
}

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub spec: SpecArgs,

    /// Agent whose guardrails apply
    #[arg(short, long)]
    pub agent: String,

    /// Stage the text is checked at
    #[arg(long, value_enum, default_value_t = StageArg::Input)]
    pub stage: StageArg,

    /// Text to check
    #[arg(short, long)]
    pub text: String,

    /// Extra banned input term (repeatable)
    #[arg(long = "banned-term")]
    pub banned_terms: Vec<String>,

    /// Maximum output length
    #[arg(long)]
    pub max_output_len: Option<usize>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageArg {
    Input,
    Output,
    Tool,
}

impl From<StageArg> for Stage {
    fn from(stage: StageArg) -> Self {
        match stage {
            StageArg::Input => Stage::Input,
            StageArg::Output => Stage::Output,
            StageArg::Tool => Stage::Tool,
        }
    }
}

pub async fn execute(args: GuardrailsArgs) -> Result<()> {
    match args.command {
        GuardrailsCommand::Test(args) => run_tests(args),
        GuardrailsCommand::Check(args) => run_check(args),
    }
}

fn run_tests(args: TestArgs) -> Result<()> {
    let (_, spec, guardrails) = args.spec.load_resolved()?;

    let agents: Vec<&str> = match &args.agent {
        Some(agent) => {
            if spec.agent(agent).is_none() {
                anyhow::bail!("Agent '{}' not found", agent);
            }
            vec![agent.as_str()]
        }
        None => spec.agent_names(),
    };

    let mut failed = 0;
    let mut total = 0;
    for agent in agents {
        let engine = GuardrailEngine::new(guardrails.rules_for(agent))
            .with_context(|| format!("Failed to compile guardrails for agent '{}'", agent))?;
        let reports = engine.run_self_tests();
        println!("🛡️  {} ({} rule(s), {} test(s))", agent, engine.len(), reports.len());

        for report in &reports {
            total += 1;
            if report.passed {
                println!("   ✅ {}: {:?}", report.rule, report.prompt);
            } else {
                failed += 1;
                println!(
                    "   ❌ {}: {:?} expected {}, got {}",
                    report.rule,
                    report.prompt,
                    report.expected.as_str(),
                    report.observed.as_str()
                );
            }
        }
    }

    info!("{} of {} guardrail self-test(s) passed", total - failed, total);
    if failed > 0 {
        anyhow::bail!("Guardrail validation failed: {} of {} self-test(s) failed", failed, total);
    }
    println!();
    println!("✅ All {} guardrail self-test(s) passed", total);
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<()> {
    let (loader, spec, guardrails) = args.spec.load_resolved()?;

    let blueprints = AgentBlueprint::build_all(&spec, &loader.base_dir(), &guardrails)?;
    let blueprint = blueprints
        .iter()
        .find(|b| b.name == args.agent)
        .with_context(|| format!("Agent '{}' not found", args.agent))?;

    let mut settings = GuardrailSettings::from_env()?;
    settings.banned_terms.extend(args.banned_terms.iter().cloned());
    if let Some(max) = args.max_output_len {
        settings.max_output_len = max;
    }
    debug!("Guardrail settings: {:?}", settings);

    let manager = blueprint.guardrail_manager(&settings)?;
    if let Some(engine) = manager.engine() {
        let outcome = engine.check(args.stage.into(), &args.text);
        if !outcome.findings.is_empty() {
            println!("🔎 {}", outcome.summary());
        }
    }

    let sanitized = match args.stage {
        StageArg::Input => manager.run_pre(&args.text)?,
        StageArg::Output => manager.run_post(&args.text)?,
        StageArg::Tool => manager.run_tool(&args.text)?,
    };

    println!("✅ Allowed");
    println!("{}", sanitized);
    Ok(())
}
