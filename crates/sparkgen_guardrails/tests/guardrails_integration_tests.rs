//! Integration tests for guardrail loading, resolution, and enforcement.

use std::fs;
use tempfile::tempdir;

use sparkgen_guardrails::{
    AgentGuardrailConfig, GuardrailConfig, GuardrailEngine, GuardrailError, GuardrailManager,
    GuardrailResolver, GuardrailSettings, Layer, Mode, Stage,
};

const DEFAULTS: &str = r#"
allowed_categories: [safety, privacy]
documentation: guardrails/README.md
apply_sets: [baseline]
sets:
  - name: baseline
    docs: guardrails/README.md
    rules:
      - name: empty_input
        categories: [" safety "]
        applies_to: [input]
        mode: block
        severity: medium
        priority: 1
        patterns: ['^\s*$']
        tests:
          - prompt: ""
            expected_outcome: block
          - prompt: "hi"
            expected_outcome: allow
      - name: pii_email
        categories: [privacy]
        applies_to: [output]
        mode: warn
        priority: 20
        patterns: ['[a-z]+@[a-z]+\.com']
  - name: strict
    rules:
      - name: pii_email
        categories: [privacy]
        applies_to: [output]
        mode: redact
        severity: high
        priority: 20
        patterns: ['[a-z]+@[a-z]+\.com']
"#;

fn write_defaults(dir: &std::path::Path) {
    fs::create_dir_all(dir.join("guardrails")).unwrap();
    fs::write(dir.join("guardrails/README.md"), "Guardrail docs.").unwrap();
    fs::write(dir.join("guardrails/default_guardrails.yaml"), DEFAULTS).unwrap();
}

#[test]
fn test_defaults_merge_and_resolve() {
    let temp = tempdir().unwrap();
    write_defaults(temp.path());

    let resolver = GuardrailResolver::new(temp.path());
    let (defaults, names) = resolver.load_defaults("guardrails/default_guardrails.yaml").unwrap();
    assert!(names.contains("baseline"));
    assert_eq!(defaults.sets[0].rules[0].categories, vec!["safety".to_string()]);

    let merged = resolver.merge_configs(&defaults, &GuardrailConfig::default());
    let agent = AgentGuardrailConfig {
        use_sets: vec!["strict".into()],
        ..Default::default()
    };
    resolver.validate_docs(&merged, &[&agent]).unwrap();

    let rules = resolver.resolve_agent_rules(&merged, &agent).unwrap();
    let names: Vec<_> = rules.iter().map(|r| r.rule.name.as_str()).collect();
    assert_eq!(names, vec!["empty_input", "pii_email"]);
    // same priority, higher severity from the strict set wins
    assert_eq!(rules[1].rule.mode, Mode::Redact);
    assert_eq!(rules[1].layer, Layer::Default);

    let engine = GuardrailEngine::new(&rules).unwrap();
    let outcome = engine.check(Stage::Output, "contact bob@example.com");
    assert_eq!(outcome.text, "contact [REDACTED:pii_email]");

    let reports = engine.run_self_tests();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.passed), "{:?}", reports);

    let debug = GuardrailResolver::serialize_rules_for_debug(&rules).unwrap();
    assert!(debug.contains("\"layer\": \"default\""));
}

#[test]
fn test_manager_with_resolved_rules() {
    let temp = tempdir().unwrap();
    write_defaults(temp.path());

    let resolver = GuardrailResolver::new(temp.path());
    let (defaults, _) = resolver.load_defaults("guardrails/default_guardrails.yaml").unwrap();
    let merged = resolver.merge_configs(&defaults, &GuardrailConfig::default());
    let rules = resolver
        .resolve_agent_rules(&merged, &AgentGuardrailConfig::default())
        .unwrap();

    let manager = GuardrailManager::from_settings(&GuardrailSettings::default())
        .with_engine(GuardrailEngine::new(&rules).unwrap());
    assert!(matches!(manager.run_pre(""), Err(GuardrailError::Violation(_))));
    assert_eq!(manager.run_pre("where is my parcel?").unwrap(), "where is my parcel?");
}

#[test]
fn test_invalid_rule_in_defaults() {
    let temp = tempdir().unwrap();
    fs::write(
        temp.path().join("defaults.yaml"),
        "sets:\n  - name: s\n    rules:\n      - name: r\n        categories: []\n",
    )
    .unwrap();

    let resolver = GuardrailResolver::new(temp.path());
    let err = resolver.load_defaults("defaults.yaml").unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("at least one category"));
}
