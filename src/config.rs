use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Phenoparse";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const FEEDBACK_FILE: &str = "feedback.json";
pub const HEURISTICS_FILE: &str = "heuristics.json";
pub const RULES_FILE: &str = "rules.tbl";
pub const SCHEMA_FILE: &str = "schema.json";

const DEFAULT_LOCAL_MODEL: &str = "llama3.1";
const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
const DEFAULT_CLOUD_MODEL: &str = "gpt-4o-mini";
const DEFAULT_CLOUD_BASE_URL: &str = "https://api.openai.com/v1";

/// Get the application data directory.
/// `PHENOPARSE_DATA_DIR` wins; otherwise ~/Phenoparse/, falling back to the
/// working directory when no home directory can be resolved.
pub fn app_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PHENOPARSE_DATA_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    match dirs::home_dir() {
        Some(home) => home.join(APP_NAME),
        None => PathBuf::from(".").join(APP_NAME),
    }
}

/// Locations of the persisted stores under one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_env() -> Self {
        Self::new(app_data_dir())
    }

    pub fn feedback(&self) -> PathBuf {
        self.root.join(FEEDBACK_FILE)
    }

    pub fn heuristics(&self) -> PathBuf {
        self.root.join(HEURISTICS_FILE)
    }

    pub fn rules(&self) -> PathBuf {
        self.root.join(RULES_FILE)
    }

    pub fn schema(&self) -> PathBuf {
        self.root.join(SCHEMA_FILE)
    }
}

/// Default `tracing` filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "phenoparse_lib=info,phenoparse=info,warn"
}

/// Which generative backend serves the primary extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    /// Hosted chat-completions API in JSON-object mode.
    Cloud,
    /// Locally hosted Ollama instance.
    Local,
}

impl LlmBackend {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "cloud" | "openai" => Some(Self::Cloud),
            "local" | "ollama" => Some(Self::Local),
            _ => None,
        }
    }
}

/// Runtime switch + per-backend settings for the generative extractor.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub backend: LlmBackend,
    pub local_model: String,
    pub ollama_host: String,
    pub cloud_model: String,
    pub cloud_base_url: String,
    pub cloud_api_key: Option<String>,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Local,
            local_model: DEFAULT_LOCAL_MODEL.to_string(),
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            cloud_model: DEFAULT_CLOUD_MODEL.to_string(),
            cloud_base_url: DEFAULT_CLOUD_BASE_URL.to_string(),
            cloud_api_key: None,
            temperature: 0.0,
        }
    }
}

impl LlmSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let backend = match get("PHENOPARSE_LLM_BACKEND") {
            Some(raw) => LlmBackend::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Unrecognized PHENOPARSE_LLM_BACKEND, using local");
                LlmBackend::Local
            }),
            None => defaults.backend,
        };

        let temperature = get("PHENOPARSE_TEMPERATURE")
            .and_then(|t| t.trim().parse::<f32>().ok())
            .map(|t| t.clamp(0.0, 1.0))
            .unwrap_or(defaults.temperature);

        Self {
            backend,
            local_model: get("PHENOPARSE_LOCAL_MODEL").unwrap_or(defaults.local_model),
            ollama_host: get("OLLAMA_HOST").unwrap_or(defaults.ollama_host),
            cloud_model: get("PHENOPARSE_CLOUD_MODEL").unwrap_or(defaults.cloud_model),
            cloud_base_url: get("PHENOPARSE_CLOUD_BASE_URL").unwrap_or(defaults.cloud_base_url),
            cloud_api_key: get("PHENOPARSE_CLOUD_API_KEY").or_else(|| get("OPENAI_API_KEY")),
            temperature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn data_paths_live_under_root() {
        let paths = DataPaths::new("/tmp/pp");
        assert_eq!(paths.feedback(), PathBuf::from("/tmp/pp/feedback.json"));
        assert_eq!(paths.heuristics(), PathBuf::from("/tmp/pp/heuristics.json"));
        assert_eq!(paths.rules(), PathBuf::from("/tmp/pp/rules.tbl"));
        assert_eq!(paths.schema(), PathBuf::from("/tmp/pp/schema.json"));
    }

    #[test]
    fn app_name_is_phenoparse() {
        assert_eq!(APP_NAME, "Phenoparse");
    }

    #[test]
    fn defaults_select_local_backend() {
        let settings = LlmSettings::from_lookup(lookup_from(&[]));
        assert_eq!(settings.backend, LlmBackend::Local);
        assert_eq!(settings.ollama_host, "http://localhost:11434");
        assert_eq!(settings.temperature, 0.0);
        assert!(settings.cloud_api_key.is_none());
    }

    #[test]
    fn cloud_backend_from_switch() {
        let settings = LlmSettings::from_lookup(lookup_from(&[
            ("PHENOPARSE_LLM_BACKEND", "Cloud"),
            ("OPENAI_API_KEY", "sk-test"),
            ("PHENOPARSE_CLOUD_MODEL", "gpt-4.1-mini"),
        ]));
        assert_eq!(settings.backend, LlmBackend::Cloud);
        assert_eq!(settings.cloud_api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.cloud_model, "gpt-4.1-mini");
    }

    #[test]
    fn explicit_key_wins_over_openai_key() {
        let settings = LlmSettings::from_lookup(lookup_from(&[
            ("PHENOPARSE_CLOUD_API_KEY", "primary"),
            ("OPENAI_API_KEY", "secondary"),
        ]));
        assert_eq!(settings.cloud_api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn unknown_backend_falls_back_to_local() {
        let settings =
            LlmSettings::from_lookup(lookup_from(&[("PHENOPARSE_LLM_BACKEND", "quantum")]));
        assert_eq!(settings.backend, LlmBackend::Local);
    }

    #[test]
    fn temperature_is_clamped() {
        let settings =
            LlmSettings::from_lookup(lookup_from(&[("PHENOPARSE_TEMPERATURE", "3.5")]));
        assert_eq!(settings.temperature, 1.0);
    }
}
