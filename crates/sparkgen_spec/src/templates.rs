//! Starter project templates.
//!
//! Built-in templates are embedded in the binary; a template can also be
//! copied from a directory on disk.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{SpecError, SpecResult};

/// A file written by a built-in template, relative to the destination.
pub struct TemplateFile {
    pub path: &'static str,
    pub content: &'static str,
}

/// A built-in starter template.
pub struct Template {
    pub name: &'static str,
    pub description: &'static str,
    pub files: &'static [TemplateFile],
}

pub const TEMPLATES: &[Template] = &[Template {
    name: "rag_agentic",
    description: "Two-agent retrieval workflow with layered guardrails",
    files: RAG_AGENTIC,
}];

pub fn available_templates() -> Vec<&'static str> {
    TEMPLATES.iter().map(|t| t.name).collect()
}

pub fn find_template(name: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.name == name)
}

/// Write a built-in template into `destination`.
///
/// Refuses to overwrite an existing `workflow.yaml` unless `force` is set.
pub fn init_template(name: &str, destination: &Path, force: bool) -> SpecResult<Vec<PathBuf>> {
    let template = find_template(name).ok_or_else(|| SpecError::UnknownTemplate {
        name: name.to_string(),
        available: available_templates().join(", "),
    })?;

    let workflow = destination.join("workflow.yaml");
    if workflow.exists() && !force {
        return Err(SpecError::AlreadyExists(workflow));
    }

    info!("Initializing template '{}' at {:?}", template.name, destination);
    let mut written = Vec::new();
    for file in template.files {
        let target = destination.join(file.path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!("Writing {:?}", target);
        fs::write(&target, file.content)?;
        written.push(target);
    }
    Ok(written)
}

/// Copy a template directory tree into `destination`, merging into existing directories.
///
/// Symlinks are followed; an unreadable entry aborts the copy.
pub fn copy_template_dir(source: &Path, destination: &Path) -> SpecResult<Vec<PathBuf>> {
    if !source.is_dir() {
        return Err(SpecError::NotFound(source.to_path_buf()));
    }

    let mut written = Vec::new();
    for entry in WalkDir::new(source).min_depth(1).follow_links(true) {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = destination.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            written.push(target);
        }
    }
    Ok(written)
}

const RAG_AGENTIC: &[TemplateFile] = &[
    TemplateFile {
        path: "workflow.yaml",
        content: r#"version: v1
name: rag_agentic
description: Triage incoming questions and answer them from the shop knowledge base.
entry_agent: triage
environment: dev

rag:
  enabled: true
  retriever: in_memory
  top_k: 3
  chunking:
    size: 500
    overlap: 50
    strategy: sliding_window
  citations: true
  collection: rag_agentic

storage:
  vector_store:
    backend: local_memory
    collection: rag_agentic_vectors
  document_store:
    backend: filesystem
    path: data/docs

tools:
  builtin: [get_delivery_date]

guardrails:
  defaults_path: guardrails/default_guardrails.yaml
  documentation: guardrails/README.md
  workflow_doc: guardrails/workflow.md
  apply_sets: [baseline]
  allowed_categories: [brand]
  sets:
    - name: brand_voice
      docs: guardrails/workflow.md
      rules:
        - name: competitor_mentions
          description: Flag answers that recommend competitors.
          categories: [brand]
          applies_to: [output]
          mode: warn
          severity: low
          priority: 50
          patterns: ['(?i)\bacme corp\b']

agents:
  - name: triage
    role: Triage agent
    prompt_file: prompts/triage.md
    tools: []
  - name: support
    role: Support agent
    prompt_file: prompts/support.md
    context_file: contexts/shop.md
    tools: [get_delivery_date]
    memory:
      short_term: true
      long_term: true
    guardrails:
      use_sets: [brand_voice]
      doc: guardrails/agents/support.md
      overrides:
        - name: pii_email
          categories: [privacy]
          applies_to: [output]
          mode: redact
          severity: high
          priority: 10
          patterns: ['[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}']

handoffs:
  - source: triage
    target: support
    trigger: always

observability:
  logging: basic
  tracing: true
  metrics: true

llm:
  provider: openai
  model: gpt-4o-mini
  api_key_env: LLM_API_KEY

environments:
  staging:
    rag:
      top_k: 5
  prod:
    observability:
      logging: verbose
"#,
    },
    TemplateFile {
        path: "prompts/triage.md",
        content: "Classify the user's question and hand it to the right specialist.\n",
    },
    TemplateFile {
        path: "prompts/support.md",
        content: "Answer the customer's question using the shop context. Cite your sources.\n",
    },
    TemplateFile {
        path: "contexts/shop.md",
        content: "Orders ship within two business days. Returns are accepted for 30 days.\n",
    },
    TemplateFile {
        path: "guardrails/default_guardrails.yaml",
        content: r#"allowed_categories: [safety, privacy]
documentation: guardrails/README.md
apply_sets: [baseline]
sets:
  - name: baseline
    description: Rules every agent runs with.
    docs: guardrails/README.md
    rules:
      - name: empty_input
        description: Block empty input.
        categories: [safety]
        applies_to: [input]
        mode: block
        severity: medium
        priority: 1
        patterns: ['^\s*$']
        message_templates:
          refusal: Please enter a question.
        tests:
          - prompt: ""
            expected_outcome: block
          - prompt: Where is my order?
            expected_outcome: allow
      - name: pii_email
        description: Warn when an answer contains an email address.
        categories: [privacy]
        applies_to: [output]
        mode: warn
        severity: medium
        priority: 20
        patterns: ['[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}']
        tests:
          - prompt: write to help@example.com
            expected_outcome: warn
"#,
    },
    TemplateFile {
        path: "guardrails/README.md",
        content: "# Guardrails\n\nDefault rules live in `default_guardrails.yaml`. Workflow sets and agent overrides take precedence.\n",
    },
    TemplateFile {
        path: "guardrails/workflow.md",
        content: "# Workflow guardrails\n\n`brand_voice` keeps answers on-brand.\n",
    },
    TemplateFile {
        path: "guardrails/agents/support.md",
        content: "# Support agent guardrails\n\nEmail addresses are redacted from answers.\n",
    },
];
