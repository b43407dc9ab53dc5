//! Data models for the workflow description.
//!
//! The structs mirror the YAML shape of `workflow.yaml`, so that parsing,
//! JSON Schema export, and runtime wiring share one definition.

use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use sparkgen_guardrails::{AgentGuardrailConfig, GuardrailConfig};

use crate::error::{SpecError, SpecResult};

/// Builtin tool every generated project ships with.
pub const DELIVERY_DATE_TOOL: &str = "get_delivery_date";

/// Spec format version.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum SpecVersion {
    #[default]
    #[serde(rename = "v1")]
    V1,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingStrategy {
    #[default]
    SlidingWindow,
    Sentence,
    Recursive,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Chunk size in tokens/characters
    #[serde(default = "default_chunk_size")]
    pub size: u32,
    /// Chunk overlap to preserve context
    #[serde(default = "default_chunk_overlap")]
    pub overlap: u32,
    #[serde(default)]
    pub strategy: ChunkingStrategy,
}

fn default_chunk_size() -> u32 {
    500
}

fn default_chunk_overlap() -> u32 {
    50
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
            overlap: default_chunk_overlap(),
            strategy: ChunkingStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RerankerProvider {
    #[default]
    None,
    Local,
    CrossEncoder,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RerankerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub provider: RerankerProvider,
    #[serde(default = "default_top_n")]
    pub top_n: u32,
}

fn default_top_n() -> u32 {
    3
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RetrieverKind {
    #[default]
    InMemory,
    Stub,
}

/// A named document collection agents can retrieve from.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct KnowledgeBase {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub collection: String,
    /// Context files ingested into the collection, relative to the workflow file's directory
    #[serde(default)]
    pub contexts: Vec<String>,
}

/// Retrieval-augmented generation settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RagConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub retriever: RetrieverKind,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub reranker: Option<RerankerConfig>,
    #[serde(default = "default_true")]
    pub citations: bool,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default)]
    pub knowledge_bases: Vec<KnowledgeBase>,
    /// Knowledge bases queried when an agent names none
    #[serde(default)]
    pub default_knowledge_bases: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_top_k() -> u32 {
    3
}

fn default_embedding_model() -> String {
    "local-hash-128".to_string()
}

fn default_collection() -> String {
    "sparkgen".to_string()
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retriever: RetrieverKind::default(),
            top_k: default_top_k(),
            embedding_model: default_embedding_model(),
            chunking: ChunkingConfig::default(),
            reranker: None,
            citations: true,
            collection: default_collection(),
            knowledge_bases: Vec::new(),
            default_knowledge_bases: Vec::new(),
        }
    }
}

impl RagConfig {
    pub fn knowledge_base(&self, name: &str) -> Option<&KnowledgeBase> {
        self.knowledge_bases.iter().find(|kb| kb.name == name)
    }

    /// Knowledge base names must be unique and every default must be declared.
    pub fn validate(&self) -> SpecResult<()> {
        let mut seen = HashSet::new();
        for kb in &self.knowledge_bases {
            if !seen.insert(kb.name.as_str()) {
                return Err(SpecError::validation(format!(
                    "Knowledge base '{}' is defined more than once.",
                    kb.name
                )));
            }
        }

        let unknown: Vec<&str> = self
            .default_knowledge_bases
            .iter()
            .filter(|name| !seen.contains(name.as_str()))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(SpecError::validation(format!(
                "Unknown default knowledge bases: {}",
                unknown.join(", ")
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MemoryStoreKind {
    #[default]
    MemoryStore,
    VectorStore,
    DocumentStore,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SummarizationPolicy {
    Truncate,
    #[default]
    Summarize,
}

/// One memory window (short- or long-term).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct MemoryWindow {
    #[serde(default)]
    pub store: MemoryStoreKind,
    /// Number of messages to retain; unbounded when null
    #[serde(default = "default_ttl_messages")]
    pub ttl_messages: Option<u32>,
    #[serde(default)]
    pub summarization_policy: SummarizationPolicy,
}

fn default_ttl_messages() -> Option<u32> {
    Some(20)
}

impl Default for MemoryWindow {
    fn default() -> Self {
        Self {
            store: MemoryStoreKind::default(),
            ttl_messages: default_ttl_messages(),
            summarization_policy: SummarizationPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct MemoryConfig {
    #[serde(default)]
    pub short_term: MemoryWindow,
    #[serde(default = "default_long_term")]
    pub long_term: MemoryWindow,
}

fn default_long_term() -> MemoryWindow {
    MemoryWindow {
        ttl_messages: None,
        ..Default::default()
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            short_term: MemoryWindow::default(),
            long_term: default_long_term(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VectorBackend {
    #[default]
    LocalMemory,
    ChromaStub,
    AzureAiSearch,
    Faiss,
}

impl VectorBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorBackend::LocalMemory => "local_memory",
            VectorBackend::ChromaStub => "chroma_stub",
            VectorBackend::AzureAiSearch => "azure_ai_search",
            VectorBackend::Faiss => "faiss",
        }
    }
}

/// Authentication for Azure AI Search: managed identity or an API key, not both.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AzureSearchAuth {
    #[serde(default)]
    pub use_msi: bool,
    /// `${ENV_VAR}` reference to the API key
    #[serde(default)]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AzureSearchConfig {
    pub endpoint: String,
    pub index_name: String,
    #[serde(default)]
    pub auth: AzureSearchAuth,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct FaissConfig {
    #[serde(default)]
    pub index_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct VectorStoreConfig {
    #[serde(default)]
    pub backend: VectorBackend,
    #[serde(default = "default_vector_collection")]
    pub collection: String,
    #[serde(default)]
    pub path: Option<String>,
    /// Values must be `${ENV_VAR}` references
    #[serde(default)]
    pub credentials: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_ai_search: Option<AzureSearchConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faiss: Option<FaissConfig>,
}

impl VectorStoreConfig {
    /// Index location for the faiss backend: `faiss.index_path`, else `path`.
    pub fn faiss_index_path(&self) -> Option<&str> {
        self.faiss
            .as_ref()
            .and_then(|f| f.index_path.as_deref())
            .or(self.path.as_deref())
            .filter(|p| !p.is_empty())
    }

    /// Backend-specific settings must be present and consistent.
    pub fn validate(&self) -> SpecResult<()> {
        ensure_env_refs(&self.credentials)?;
        match self.backend {
            VectorBackend::AzureAiSearch => {
                let azure = self.azure_ai_search.as_ref().ok_or_else(|| {
                    SpecError::validation("Vector store backend 'azure_ai_search' requires an 'azure_ai_search' block.")
                })?;
                match (azure.auth.use_msi, azure.auth.api_key_env.as_deref()) {
                    (true, Some(_)) => {
                        return Err(SpecError::validation(
                            "azure_ai_search auth: use_msi and api_key_env are mutually exclusive.",
                        ))
                    }
                    (false, None) => {
                        return Err(SpecError::validation(
                            "azure_ai_search auth requires either use_msi or api_key_env.",
                        ))
                    }
                    (false, Some(key)) if !is_env_ref(key) => {
                        return Err(SpecError::validation(
                            "azure_ai_search api_key_env must be provided as a ${ENV_VAR} reference.",
                        ))
                    }
                    _ => {}
                }
            }
            VectorBackend::Faiss if self.faiss_index_path().is_none() => {
                return Err(SpecError::validation(
                    "Vector store backend 'faiss' requires an index path ('faiss.index_path' or 'path').",
                ));
            }
            _ => {}
        }
        Ok(())
    }
}

fn default_vector_collection() -> String {
    "sparkgen_vectors".to_string()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: VectorBackend::default(),
            collection: default_vector_collection(),
            path: None,
            credentials: BTreeMap::new(),
            azure_ai_search: None,
            faiss: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocumentBackend {
    #[default]
    Filesystem,
    Stub,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DocumentStoreConfig {
    #[serde(default)]
    pub backend: DocumentBackend,
    #[serde(default = "default_docs_path")]
    pub path: String,
    /// Values must be `${ENV_VAR}` references
    #[serde(default)]
    pub credentials: BTreeMap<String, String>,
}

fn default_docs_path() -> String {
    "data/docs".to_string()
}

impl Default for DocumentStoreConfig {
    fn default() -> Self {
        Self {
            backend: DocumentBackend::default(),
            path: default_docs_path(),
            credentials: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct StorageConfig {
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub document_store: DocumentStoreConfig,
    #[serde(default = "default_memory_store_path")]
    pub memory_store_path: String,
}

fn default_memory_store_path() -> String {
    ".sparkgen_memory.json".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            vector_store: VectorStoreConfig::default(),
            document_store: DocumentStoreConfig::default(),
            memory_store_path: default_memory_store_path(),
        }
    }
}

/// A tool exposed by an MCP gateway.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct McpTool {
    pub name: String,
    pub resource: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub rate_limit_per_minute: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum McpProtocol {
    #[default]
    Ws,
    Wss,
    Http,
}

impl McpProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            McpProtocol::Ws => "ws",
            McpProtocol::Wss => "wss",
            McpProtocol::Http => "http",
        }
    }
}

/// An MCP gateway and the tools it exposes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct McpConnector {
    pub name: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub protocol: McpProtocol,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub description: Option<String>,
    /// Values must be `${ENV_VAR}` references
    #[serde(default)]
    pub credentials: BTreeMap<String, String>,
    #[serde(default)]
    pub tools: Vec<McpTool>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8000
}

impl McpConnector {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: default_host(),
            port: default_port(),
            protocol: McpProtocol::default(),
            active: true,
            description: None,
            credentials: BTreeMap::new(),
            tools: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ToolRegistry {
    #[serde(default = "default_builtin_tools")]
    pub builtin: Vec<String>,
    #[serde(default)]
    pub mcp_connectors: Vec<McpConnector>,
    /// When non-empty, only these qualified MCP tool names are bound to agents
    #[serde(default)]
    pub exposed_mcp_tools: Vec<String>,
}

fn default_builtin_tools() -> Vec<String> {
    vec![DELIVERY_DATE_TOOL.to_string()]
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self {
            builtin: default_builtin_tools(),
            mcp_connectors: Vec::new(),
            exposed_mcp_tools: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AgentMemoryBinding {
    #[serde(default = "default_true")]
    pub short_term: bool,
    #[serde(default)]
    pub long_term: bool,
    #[serde(default)]
    pub summary_prompt: Option<String>,
}

impl Default for AgentMemoryBinding {
    fn default() -> Self {
        Self {
            short_term: true,
            long_term: false,
            summary_prompt: None,
        }
    }
}

/// One agent in the workflow.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AgentSpec {
    pub name: String,
    pub role: String,
    /// Prompt file, relative to the workflow file's directory
    pub prompt_file: String,
    #[serde(default)]
    pub context_file: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub memory: AgentMemoryBinding,
    #[serde(default)]
    pub guardrails: AgentGuardrailConfig,
    #[serde(default)]
    pub handoff_notes: Option<String>,
}

/// A directed edge allowing `source` to delegate to `target`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct HandoffRule {
    pub source: String,
    pub target: String,
    #[serde(default = "default_trigger")]
    pub trigger: String,
    #[serde(default = "default_message_contract")]
    pub message_contract: String,
}

fn default_trigger() -> String {
    "always".to_string()
}

fn default_message_contract() -> String {
    "text".to_string()
}

impl HandoffRule {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            trigger: default_trigger(),
            message_contract: default_message_contract(),
        }
    }

    /// Whether a run follows this handoff automatically.
    pub fn is_automatic(&self) -> bool {
        matches!(self.trigger.as_str(), "always" | "on_success")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoggingLevel {
    #[default]
    Basic,
    Verbose,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingLevel,
    #[serde(default = "default_true")]
    pub tracing: bool,
    #[serde(default = "default_true")]
    pub metrics: bool,
    #[serde(default)]
    pub run_id_env: Option<String>,
    #[serde(default = "default_telemetry_endpoint")]
    pub telemetry_endpoint: Option<String>,
    #[serde(default)]
    pub mlflow_tracking_uri: Option<String>,
    #[serde(default)]
    pub langfuse_host: Option<String>,
    #[serde(default)]
    pub langfuse_public_key_env: Option<String>,
    #[serde(default)]
    pub langfuse_secret_key_env: Option<String>,
}

fn default_telemetry_endpoint() -> Option<String> {
    Some("https://telemetry.example.com/events".to_string())
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            logging: LoggingLevel::default(),
            tracing: true,
            metrics: true,
            run_id_env: None,
            telemetry_endpoint: default_telemetry_endpoint(),
            mlflow_tracking_uri: None,
            langfuse_host: None,
            langfuse_public_key_env: None,
            langfuse_secret_key_env: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[default]
    Openai,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub use_agents_sdk: bool,
    #[serde(default)]
    pub agent_id_env: Option<String>,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "LLM_API_KEY".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            use_agents_sdk: false,
            agent_id_env: None,
        }
    }
}

/// Per-environment overrides; every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct WorkflowOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rag: Option<RagConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolRegistry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardrails: Option<GuardrailConfig>,
}

/// Root of `workflow.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct WorkflowSpec {
    #[serde(default)]
    pub version: SpecVersion,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Agent that receives the user's query first
    pub entry_agent: String,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub rag: RagConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub tools: ToolRegistry,
    #[serde(default)]
    pub guardrails: GuardrailConfig,
    pub agents: Vec<AgentSpec>,
    #[serde(default)]
    pub handoffs: Vec<HandoffRule>,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub environments: BTreeMap<String, WorkflowOverrides>,
}

pub const DEFAULT_ENVIRONMENT: &str = "dev";

fn default_environment() -> String {
    DEFAULT_ENVIRONMENT.to_string()
}

impl WorkflowSpec {
    pub fn agent(&self, name: &str) -> Option<&AgentSpec> {
        self.agents.iter().find(|a| a.name == name)
    }

    pub fn agent_names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name.as_str()).collect()
    }

    /// Enforce model-level invariants and fill implied values.
    pub fn validate(&mut self) -> SpecResult<()> {
        let mut seen = HashSet::new();
        for agent in &self.agents {
            if !seen.insert(agent.name.as_str()) {
                return Err(SpecError::validation("Agent names must be unique."));
            }
        }
        if !seen.contains(self.entry_agent.as_str()) {
            return Err(SpecError::validation(format!(
                "entry_agent '{}' is not defined in agents.",
                self.entry_agent
            )));
        }

        if !self.tools.builtin.is_empty() && !self.tools.builtin.iter().any(|t| t == DELIVERY_DATE_TOOL) {
            self.tools.builtin.push(DELIVERY_DATE_TOOL.to_string());
        }

        self.rag.validate()?;
        self.storage.vector_store.validate()?;
        ensure_env_refs(&self.storage.document_store.credentials)?;
        for connector in &self.tools.mcp_connectors {
            ensure_env_refs(&connector.credentials)?;
        }

        self.guardrails.normalize()?;
        for agent in &mut self.agents {
            agent.guardrails.normalize()?;
        }

        Ok(())
    }
}

fn env_ref_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\$\{[A-Z0-9_]+\}$").expect("env ref pattern is valid"))
}

/// Whether `value` has the `${ENV_VAR}` form.
pub fn is_env_ref(value: &str) -> bool {
    env_ref_pattern().is_match(value)
}

fn ensure_env_refs(credentials: &BTreeMap<String, String>) -> SpecResult<()> {
    match credentials.iter().find(|(_, value)| !is_env_ref(value)) {
        Some((key, _)) => Err(SpecError::validation(format!(
            "Credential '{}' must be provided as a ${{ENV_VAR}} reference.",
            key
        ))),
        None => Ok(()),
    }
}
