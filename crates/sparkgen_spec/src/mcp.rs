//! MCP gateway configuration and tool specs.
//!
//! Gateways and their tools are declared either inline in the workflow's
//! `tools.mcp_connectors` or in a standalone gateways file:
//!
//! ```yaml
//! gateways:
//!   - name: local
//!     host: localhost
//!     port: 9000
//!     credentials:
//!       api_key: "${LOCAL_KEY}"
//!     tools:
//!       - name: search_docs
//!         resource: docs.search
//! ```
//!
//! Only active gateways and active tools are exposed to agents, under the
//! qualified name `mcp__<gateway>__<tool>`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{SpecError, SpecResult};
use crate::models::{McpConnector, McpProtocol, McpTool};

/// Environment variable pointing at the gateways file.
pub const MCP_CONFIG_PATH_VAR: &str = "MCP_CONFIG_PATH";

/// Normalize a gateway or tool name into an identifier fragment.
pub fn normalize_name(name: &str) -> String {
    static NON_IDENT: OnceLock<Regex> = OnceLock::new();
    let re = NON_IDENT.get_or_init(|| Regex::new(r"[^a-zA-Z0-9_]+").expect("identifier pattern is valid"));
    re.replace_all(name, "_").trim_matches('_').to_lowercase()
}

/// Qualified tool name as seen by agents.
pub fn qualified_tool_name(connector: &str, tool: &str) -> String {
    format!("mcp__{}__{}", normalize_name(connector), normalize_name(tool))
}

/// Resolve a `${ENV_VAR}` placeholder; other values pass through unchanged.
pub fn resolve_env(value: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    match value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
        Some(var) if crate::models::is_env_ref(value) => lookup(var).unwrap_or_default(),
        _ => value.to_string(),
    }
}

#[derive(Debug, Default, Deserialize)]
struct GatewaysFile {
    #[serde(default)]
    gateways: Vec<RawGateway>,
}

/// Ports may be written as numbers or quoted strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPort {
    Number(u16),
    Text(String),
}

impl RawPort {
    fn parse(self, gateway: &str) -> SpecResult<u16> {
        match self {
            RawPort::Number(port) => Ok(port),
            RawPort::Text(text) => text.trim().parse().map_err(|_| {
                SpecError::validation(format!("MCP gateway '{}' has an invalid port: {:?}", gateway, text))
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawGateway {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<RawPort>,
    #[serde(default)]
    protocol: Option<McpProtocol>,
    #[serde(default)]
    active: Option<bool>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    credentials: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    tools: Vec<RawTool>,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawTool {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    resource: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    active: Option<bool>,
    #[serde(default)]
    rate_limit_per_minute: Option<u32>,
}

/// Credential value as a string: placeholders are resolved, other scalars are rendered.
fn credential_value(value: serde_yaml::Value, lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(resolve_env(&s, lookup)),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Null => Some(String::new()),
        _ => None,
    }
}

/// Load gateways from a YAML file, resolving credentials from the process environment.
pub fn load_gateways(path: &Path) -> SpecResult<Vec<McpConnector>> {
    load_gateways_with(path, |key| std::env::var(key).ok())
}

/// Load gateways from a YAML file with an explicit variable lookup.
///
/// A missing file yields no gateways. Gateways without a name and tools
/// without a name or resource are skipped. Quoted ports are accepted.
pub fn load_gateways_with(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> SpecResult<Vec<McpConnector>> {
    if !path.exists() {
        debug!("No MCP gateways file at {:?}", path);
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)?;
    let file: GatewaysFile = if content.trim().is_empty() {
        GatewaysFile::default()
    } else {
        serde_yaml::from_str(&content)?
    };

    let mut connectors = Vec::new();
    for raw in file.gateways {
        let Some(name) = raw.name.filter(|n| !n.is_empty()) else {
            warn!("Skipping MCP gateway without a name");
            continue;
        };

        let mut connector = McpConnector::new(name);
        if let Some(host) = raw.host {
            connector.host = host;
        }
        if let Some(port) = raw.port {
            connector.port = port.parse(&connector.name)?;
        }
        connector.protocol = raw.protocol.unwrap_or_default();
        connector.active = raw.active.unwrap_or(true);
        connector.description = raw.description;
        connector.metadata = raw.metadata;
        for (key, value) in raw.credentials {
            match credential_value(value, &lookup) {
                Some(resolved) => {
                    connector.credentials.insert(key, resolved);
                }
                None => warn!("Skipping non-scalar credential '{}' on MCP gateway '{}'", key, connector.name),
            }
        }
        connector.tools = raw
            .tools
            .into_iter()
            .filter_map(|tool| match (tool.name, tool.resource) {
                (Some(name), Some(resource)) => Some(McpTool {
                    name,
                    resource,
                    description: tool.description,
                    active: tool.active.unwrap_or(true),
                    rate_limit_per_minute: tool.rate_limit_per_minute,
                }),
                _ => None,
            })
            .collect();
        connectors.push(connector);
    }

    Ok(connectors)
}

/// Active `(connector, tool)` pairs across all connectors.
pub fn active_tools(connectors: &[McpConnector]) -> impl Iterator<Item = (&McpConnector, &McpTool)> {
    connectors
        .iter()
        .filter(|c| c.active)
        .flat_map(|c| c.tools.iter().filter(|t| t.active).map(move |t| (c, t)))
}

/// Function-tool specs for every active tool on every active gateway.
pub fn build_tool_specs(connectors: &[McpConnector]) -> Vec<Value> {
    active_tools(connectors)
        .map(|(connector, tool)| tool_spec(connector, tool))
        .collect()
}

fn tool_spec(connector: &McpConnector, tool: &McpTool) -> Value {
    let gateway = normalize_name(&connector.name);
    let description = tool
        .description
        .clone()
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| format!("MCP resource {} via {} gateway.", tool.resource, gateway));

    json!({
        "type": "function",
        "function": {
            "name": qualified_tool_name(&connector.name, &tool.name),
            "description": description,
            "parameters": {
                "type": "object",
                "properties": {
                    "payload": {
                        "type": "object",
                        "description": "Structured payload forwarded to the MCP resource."
                    },
                    "resource": {
                        "type": "string",
                        "description": "Resource identifier (defaults to the configured resource).",
                        "default": tool.resource
                    }
                },
                "required": [],
                "additionalProperties": true
            }
        },
        "metadata": {
            "mcp_resource": tool.resource,
            "mcp_gateway": gateway,
            "connection": {
                "host": connector.host,
                "port": connector.port,
                "protocol": connector.protocol.as_str()
            }
        }
    })
}

/// Name of a tool spec built by [`build_tool_specs`].
pub fn tool_spec_name(spec: &Value) -> Option<&str> {
    spec.get("function")?.get("name")?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Local Gateway"), "local_gateway");
        assert_eq!(normalize_name("--docs.search--"), "docs_search");
        assert_eq!(qualified_tool_name("Local", "Search Docs"), "mcp__local__search_docs");
    }

    #[test]
    fn test_resolve_env() {
        let lookup = |key: &str| (key == "KEY").then(|| "value".to_string());
        assert_eq!(resolve_env("${KEY}", &lookup), "value");
        assert_eq!(resolve_env("${MISSING}", &lookup), "");
        assert_eq!(resolve_env("literal", &lookup), "literal");
    }

    #[test]
    fn test_missing_file_yields_nothing() {
        let temp = tempdir().unwrap();
        assert!(load_gateways(&temp.path().join("mcp.yaml")).unwrap().is_empty());
    }

    #[test]
    fn test_gateway_values_are_coerced() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("mcp.yaml");
        std::fs::write(
            &path,
            r#"
gateways:
  - name: Local
    port: "9100"
    active: false
    credentials:
      api_key: "${LOCAL_KEY}"
      retries: 3
      verify_tls: true
    tools:
      - name: search
        resource: docs.search
        rate_limit_per_minute: 30
      - name: no_resource
"#,
        )
        .unwrap();

        let lookup = |key: &str| (key == "LOCAL_KEY").then(|| "secret".to_string());
        let connectors = load_gateways_with(&path, lookup).unwrap();
        assert_eq!(connectors.len(), 1);
        let local = &connectors[0];
        assert_eq!(local.port, 9100);
        assert!(!local.active);
        assert_eq!(local.credentials["api_key"], "secret");
        assert_eq!(local.credentials["retries"], "3");
        assert_eq!(local.credentials["verify_tls"], "true");
        assert_eq!(local.tools.len(), 1);
        assert_eq!(local.tools[0].rate_limit_per_minute, Some(30));
        assert!(build_tool_specs(&connectors).is_empty());
    }

    #[test]
    fn test_invalid_port_rejected() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("mcp.yaml");
        std::fs::write(&path, "gateways:\n  - name: bad\n    port: eighty\n").unwrap();
        let err = load_gateways_with(&path, |_| None).unwrap_err();
        assert!(err.to_string().contains("invalid port"));
    }

    #[test]
    fn test_tool_spec_shape() {
        let mut connector = McpConnector::new("Local");
        connector.tools.push(McpTool {
            name: "search".into(),
            resource: "docs.search".into(),
            description: None,
            active: true,
            rate_limit_per_minute: None,
        });
        let specs = build_tool_specs(&[connector]);
        assert_eq!(tool_spec_name(&specs[0]), Some("mcp__local__search"));
        assert_eq!(specs[0]["metadata"]["connection"]["port"], 8000);
        assert_eq!(
            specs[0]["function"]["description"],
            "MCP resource docs.search via local gateway."
        );
    }
}
