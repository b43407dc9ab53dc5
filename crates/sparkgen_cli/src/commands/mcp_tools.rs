//! MCP tools command - List function-tool specs for MCP gateways.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use sparkgen_spec::mcp::{build_tool_specs, load_gateways, tool_spec_name};

#[derive(Args)]
pub struct McpToolsArgs {
    /// Gateways file
    #[arg(short, long, env = "MCP_CONFIG_PATH", default_value = "mcp_gateways.yaml")]
    pub config: PathBuf,

    /// Print only the qualified tool names
    #[arg(long)]
    pub names_only: bool,
}

pub async fn execute(args: McpToolsArgs) -> Result<()> {
    let gateways = load_gateways(&args.config)
        .with_context(|| format!("Failed to load MCP gateways from {:?}", args.config))?;
    let specs = build_tool_specs(&gateways);
    info!("{} gateway(s), {} active tool(s)", gateways.len(), specs.len());

    if args.names_only {
        for spec in &specs {
            if let Some(name) = tool_spec_name(spec) {
                println!("{}", name);
            }
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&specs)?);
    }
    Ok(())
}
