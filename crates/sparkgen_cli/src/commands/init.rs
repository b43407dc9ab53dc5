//! Init command - Scaffold a workflow project.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use sparkgen_spec::templates::{self, TEMPLATES};
use sparkgen_spec::SpecError;

#[derive(Args)]
pub struct InitArgs {
    /// Built-in template to use
    #[arg(short, long, default_value = "rag_agentic")]
    pub template: String,

    /// Copy a template directory instead of a built-in template
    #[arg(long, conflicts_with = "template")]
    pub from: Option<PathBuf>,

    /// Destination directory (defaults to current directory)
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// Overwrite an existing workflow.yaml
    #[arg(short, long)]
    pub force: bool,

    /// List built-in templates and exit
    #[arg(long)]
    pub list: bool,
}

pub async fn execute(args: InitArgs) -> Result<()> {
    if args.list {
        println!("Available templates:");
        for template in TEMPLATES {
            println!("  {:<14} {}", template.name, template.description);
        }
        return Ok(());
    }

    let dest = match args.dest {
        Some(dest) => dest,
        None => std::env::current_dir()?,
    };

    let written = match &args.from {
        Some(source) => {
            if dest.join("workflow.yaml").exists() && !args.force {
                return Err(SpecError::AlreadyExists(dest.join("workflow.yaml")).into());
            }
            info!("Copying template from {:?} to {:?}", source, dest);
            templates::copy_template_dir(source, &dest)
                .with_context(|| format!("Failed to copy template directory {:?}", source))?
        }
        None => templates::init_template(&args.template, &dest, args.force)
            .with_context(|| format!("Failed to initialize template '{}'", args.template))?,
    };

    println!("✅ Initialized {} file(s) in {}", written.len(), dest.display());
    for path in &written {
        let shown = path.strip_prefix(&dest).unwrap_or(path);
        println!("  📄 {}", shown.display());
    }
    println!();
    println!("Next steps:");
    println!("  sparkgen validate --spec {}", dest.join("workflow.yaml").display());

    Ok(())
}
