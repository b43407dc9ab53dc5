//! JSON Schema export for `workflow.yaml`, for editor completion and linting.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::SpecResult;
use crate::models::WorkflowSpec;

/// JSON Schema describing [`WorkflowSpec`].
pub fn export_schema() -> SpecResult<Value> {
    let schema = schemars::schema_for!(WorkflowSpec);
    Ok(serde_json::to_value(&schema)?)
}

/// Write the schema as pretty JSON.
pub fn write_schema(path: &Path) -> SpecResult<()> {
    debug!("Writing workflow schema to {:?}", path);
    let schema = export_schema()?;
    fs::write(path, serde_json::to_string_pretty(&schema)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_lists_required_fields() {
        let schema = export_schema().unwrap();
        let required: Vec<_> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(required.contains(&"name"));
        assert!(required.contains(&"entry_agent"));
        assert!(required.contains(&"agents"));
        assert!(schema["definitions"]["GuardrailRule"].is_object());
    }
}
