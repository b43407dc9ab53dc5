//! Deep merge of YAML documents.

use serde_yaml::Value;

/// Recursively merge `overrides` into `base`.
///
/// Nested mappings merge key by key; for any other value the override wins.
/// Neither input is modified.
pub fn deep_merge(base: &Value, overrides: &Value) -> Value {
    match (base, overrides) {
        (Value::Mapping(base_map), Value::Mapping(override_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in override_map {
                let next = match merged.get(key) {
                    Some(existing @ Value::Mapping(_)) if value.is_mapping() => deep_merge(existing, value),
                    _ => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Mapping(merged)
        }
        _ => overrides.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_nested_merge() {
        let base = yaml("rag:\n  top_k: 3\n  enabled: true\nname: demo");
        let overrides = yaml("rag:\n  top_k: 1");
        let merged = deep_merge(&base, &overrides);
        assert_eq!(merged, yaml("rag:\n  top_k: 1\n  enabled: true\nname: demo"));
    }

    #[test]
    fn test_override_replaces_non_mappings() {
        let base = yaml("tools:\n  builtin: [a, b]\nllm: openai");
        let overrides = yaml("tools:\n  builtin: [c]\nllm:\n  model: x");
        let merged = deep_merge(&base, &overrides);
        assert_eq!(merged, yaml("tools:\n  builtin: [c]\nllm:\n  model: x"));
    }

    #[test]
    fn test_inputs_untouched() {
        let base = yaml("a:\n  b: 1");
        let overrides = yaml("a:\n  c: 2");
        let _ = deep_merge(&base, &overrides);
        assert_eq!(base, yaml("a:\n  b: 1"));
    }
}
