//! Engine metadata catalog.
//!
//! Static descriptions of every known translation and term-extraction
//! engine: selector flag, backend execution style, rate-limit exemption and
//! the ordered detail-field schema (name, declared kind, sensitivity). The
//! settings builder coerces raw input against these tables; nothing in the
//! system introspects engine configuration at runtime.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

use crate::models::BackendKind;

/// Sentinel UI value meaning the term-extraction engine follows the main
/// translation engine instead of being configured separately.
pub const FOLLOW_MAIN_ENGINE: &str = "Follow main translation engine";

/// Declared type of an engine detail field. Closed set; coercion from raw
/// string input is a match over this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Integer,
    Boolean,
}

/// One entry in an engine's detail-field schema.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Credential fields; skipped when the caller may not supply secrets.
    pub sensitive: bool,
}

const fn text(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::String,
        sensitive: false,
    }
}

const fn secret(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::String,
        sensitive: true,
    }
}

const fn integer(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Integer,
        sensitive: false,
    }
}

const fn boolean(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Boolean,
        sensitive: false,
    }
}

/// Catalog entry for one translation engine.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EngineMetadata {
    /// Engine name as selected by clients.
    pub name: &'static str,
    /// Unique selector flag in the settings model.
    pub selector: &'static str,
    /// Execution style the engine requires.
    pub backend: BackendKind,
    /// Engines with server-side throttling skip rate-limit resolution.
    pub rate_limit_exempt: bool,
    /// LLM-capable engines may also drive term extraction.
    pub supports_term_extraction: bool,
    /// Ordered detail-field schema; empty for engines without configuration.
    pub fields: &'static [FieldSpec],
}

/// Every known translation engine, in UI order. The classic engines (Google,
/// Bing) predate the event-streaming execution path and run through the
/// callback backend; everything newer streams.
pub static TRANSLATION_ENGINES: &[EngineMetadata] = &[
    EngineMetadata {
        name: "Google",
        selector: "google",
        backend: BackendKind::Callback,
        rate_limit_exempt: false,
        supports_term_extraction: false,
        fields: &[],
    },
    EngineMetadata {
        name: "Bing",
        selector: "bing",
        backend: BackendKind::Callback,
        rate_limit_exempt: false,
        supports_term_extraction: false,
        fields: &[],
    },
    EngineMetadata {
        name: "OpenAI",
        selector: "openai",
        backend: BackendKind::Streaming,
        rate_limit_exempt: false,
        supports_term_extraction: true,
        fields: &[
            secret("openai_api_key"),
            text("openai_model"),
            text("openai_base_url"),
        ],
    },
    EngineMetadata {
        name: "AzureOpenAI",
        selector: "azure_openai",
        backend: BackendKind::Streaming,
        rate_limit_exempt: false,
        supports_term_extraction: true,
        fields: &[
            secret("azure_openai_api_key"),
            text("azure_openai_base_url"),
            text("azure_openai_model"),
            text("azure_openai_api_version"),
        ],
    },
    EngineMetadata {
        name: "DeepSeek",
        selector: "deepseek",
        backend: BackendKind::Streaming,
        rate_limit_exempt: false,
        supports_term_extraction: true,
        fields: &[secret("deepseek_api_key"), text("deepseek_model")],
    },
    EngineMetadata {
        name: "Ollama",
        selector: "ollama",
        backend: BackendKind::Streaming,
        rate_limit_exempt: false,
        supports_term_extraction: true,
        fields: &[
            text("ollama_host"),
            text("ollama_model"),
            integer("num_predict"),
        ],
    },
    EngineMetadata {
        name: "Xinference",
        selector: "xinference",
        backend: BackendKind::Streaming,
        rate_limit_exempt: false,
        supports_term_extraction: true,
        fields: &[text("xinference_host"), text("xinference_model")],
    },
    EngineMetadata {
        name: "ModelScope",
        selector: "modelscope",
        backend: BackendKind::Streaming,
        rate_limit_exempt: false,
        supports_term_extraction: true,
        fields: &[secret("modelscope_api_key"), text("modelscope_model")],
    },
    EngineMetadata {
        name: "Zhipu",
        selector: "zhipu",
        backend: BackendKind::Streaming,
        rate_limit_exempt: false,
        supports_term_extraction: true,
        fields: &[secret("zhipu_api_key"), text("zhipu_model")],
    },
    EngineMetadata {
        name: "SiliconFlow",
        selector: "siliconflow",
        backend: BackendKind::Streaming,
        rate_limit_exempt: false,
        supports_term_extraction: true,
        fields: &[
            secret("siliconflow_api_key"),
            text("siliconflow_model"),
            text("siliconflow_base_url"),
            boolean("siliconflow_enable_thinking"),
        ],
    },
    EngineMetadata {
        name: "SiliconFlowFree",
        selector: "siliconflow_free",
        backend: BackendKind::Streaming,
        // The free tier is throttled server-side; client rate limits are
        // ignored for it.
        rate_limit_exempt: true,
        supports_term_extraction: true,
        fields: &[],
    },
    EngineMetadata {
        name: "TencentMechineTranslation",
        selector: "tencent",
        backend: BackendKind::Streaming,
        rate_limit_exempt: false,
        supports_term_extraction: false,
        fields: &[
            secret("tencentcloud_secret_id"),
            secret("tencentcloud_secret_key"),
        ],
    },
    EngineMetadata {
        name: "Gemini",
        selector: "gemini",
        backend: BackendKind::Streaming,
        rate_limit_exempt: false,
        supports_term_extraction: true,
        fields: &[secret("gemini_api_key"), text("gemini_model")],
    },
    EngineMetadata {
        name: "Azure",
        selector: "azure",
        backend: BackendKind::Streaming,
        rate_limit_exempt: false,
        supports_term_extraction: false,
        fields: &[secret("azure_api_key"), text("azure_endpoint")],
    },
    EngineMetadata {
        name: "AnythingLLM",
        selector: "anythingllm",
        backend: BackendKind::Streaming,
        rate_limit_exempt: false,
        supports_term_extraction: false,
        fields: &[secret("anythingllm_apikey"), text("anythingllm_url")],
    },
    EngineMetadata {
        name: "Dify",
        selector: "dify",
        backend: BackendKind::Streaming,
        rate_limit_exempt: false,
        supports_term_extraction: false,
        fields: &[secret("dify_apikey"), text("dify_url")],
    },
    EngineMetadata {
        name: "Grok",
        selector: "grok",
        backend: BackendKind::Streaming,
        rate_limit_exempt: false,
        supports_term_extraction: true,
        fields: &[secret("grok_api_key"), text("grok_model")],
    },
    EngineMetadata {
        name: "Groq",
        selector: "groq",
        backend: BackendKind::Streaming,
        rate_limit_exempt: false,
        supports_term_extraction: true,
        fields: &[secret("groq_api_key"), text("groq_model")],
    },
    EngineMetadata {
        name: "QwenMt",
        selector: "qwenmt",
        backend: BackendKind::Streaming,
        rate_limit_exempt: false,
        supports_term_extraction: false,
        fields: &[
            secret("qwenmt_api_key"),
            text("qwenmt_model"),
            text("qwenmt_base_url"),
        ],
    },
    EngineMetadata {
        name: "OpenAICompatible",
        selector: "openai_compatible",
        backend: BackendKind::Streaming,
        rate_limit_exempt: false,
        supports_term_extraction: true,
        fields: &[
            secret("openai_compatible_api_key"),
            text("openai_compatible_base_url"),
            text("openai_compatible_model"),
        ],
    },
    EngineMetadata {
        name: "AliyunDashScope",
        selector: "aliyun_dashscope",
        backend: BackendKind::Streaming,
        rate_limit_exempt: false,
        supports_term_extraction: true,
        fields: &[
            secret("aliyun_dashscope_api_key"),
            text("aliyun_dashscope_model"),
            text("aliyun_dashscope_base_url"),
        ],
    },
    EngineMetadata {
        name: "DeepL",
        selector: "deepl",
        backend: BackendKind::Streaming,
        rate_limit_exempt: false,
        supports_term_extraction: false,
        fields: &[secret("deepl_auth_key")],
    },
    EngineMetadata {
        name: "ClaudeCode",
        selector: "claude_code",
        backend: BackendKind::Streaming,
        rate_limit_exempt: false,
        supports_term_extraction: true,
        fields: &[text("claude_code_path"), text("claude_code_model")],
    },
];

static ENGINES_BY_NAME: Lazy<HashMap<&'static str, &'static EngineMetadata>> =
    Lazy::new(|| TRANSLATION_ENGINES.iter().map(|m| (m.name, m)).collect());

/// Look up a translation engine by name.
pub fn translation_engine(name: &str) -> Option<&'static EngineMetadata> {
    ENGINES_BY_NAME.get(name).copied()
}

/// Engines that may also drive term extraction, in catalog order. Their
/// selector flags live under a `term_` prefix in the settings model.
pub fn term_extraction_engines() -> impl Iterator<Item = &'static EngineMetadata> {
    TRANSLATION_ENGINES
        .iter()
        .filter(|m| m.supports_term_extraction)
}

/// Look up a term-extraction engine by name.
pub fn term_extraction_engine(name: &str) -> Option<&'static EngineMetadata> {
    term_extraction_engines().find(|m| m.name == name)
}

/// Selector flag of an engine when used for term extraction.
pub fn term_selector(engine: &EngineMetadata) -> String {
    format!("term_{}", engine.selector)
}
