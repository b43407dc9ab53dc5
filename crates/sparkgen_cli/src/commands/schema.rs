//! Schema command - Export the workflow JSON Schema.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use sparkgen_spec::{export_schema, write_schema};

#[derive(Args)]
pub struct SchemaArgs {
    /// Write the schema to this file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub async fn execute(args: SchemaArgs) -> Result<()> {
    match args.out {
        Some(path) => {
            write_schema(&path).with_context(|| format!("Failed to write schema to {:?}", path))?;
            println!("✅ Schema written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&export_schema()?)?),
    }
    Ok(())
}
