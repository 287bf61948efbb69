//! Service configuration and evaluator factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use civicquiz_core::evaluator::EvaluatorConfig;
use civicquiz_core::traits::SemanticEvaluator;

use crate::openai::OpenAiEvaluator;

/// Credentials and endpoint for the OpenAI evaluator.
///
/// Note: Custom Debug impl masks the API key to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

/// Top-level civicquiz configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CivicQuizConfig {
    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Question data file, read once at startup.
    #[serde(default = "default_questions_path")]
    pub questions_path: PathBuf,
    /// Upper bound on one semantic evaluation, in seconds.
    #[serde(default = "default_semantic_timeout")]
    pub semantic_timeout_secs: u64,
    /// Browser client files served under `/static`.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Semantic evaluator settings. Absent means string matching only.
    #[serde(default)]
    pub openai: Option<OpenAiConfig>,
}

fn default_port() -> u16 {
    8008
}
fn default_questions_path() -> PathBuf {
    PathBuf::from("questions.json")
}
fn default_semantic_timeout() -> u64 {
    10
}
fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

impl Default for CivicQuizConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            questions_path: default_questions_path(),
            semantic_timeout_secs: default_semantic_timeout(),
            static_dir: default_static_dir(),
            openai: None,
        }
    }
}

impl CivicQuizConfig {
    pub fn semantic_timeout(&self) -> Duration {
        Duration::from_secs(self.semantic_timeout_secs)
    }

    pub fn evaluator_config(&self) -> EvaluatorConfig {
        EvaluatorConfig {
            semantic_timeout: self.semantic_timeout(),
        }
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.semantic_timeout_secs == 0 {
            anyhow::bail!("semantic_timeout_secs must be at least 1");
        }
        Ok(())
    }

    /// Whether a usable API key is present.
    pub fn openai_configured(&self) -> bool {
        self.openai
            .as_ref()
            .is_some_and(|o| !o.api_key.trim().is_empty())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are copied as-is and never scanned again.
fn resolve_env_vars(s: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&lookup(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Expand `${VAR}` references in values that came from the config file.
pub fn resolve_config_refs(
    mut config: CivicQuizConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> CivicQuizConfig {
    if let Some(openai) = config.openai.as_mut() {
        openai.api_key = resolve_env_vars(&openai.api_key, &lookup);
        openai.base_url = openai.base_url.as_ref().map(|u| resolve_env_vars(u, &lookup));
        openai.model = openai.model.as_ref().map(|m| resolve_env_vars(m, &lookup));
    }
    config
}

/// Load variables from a `.env` file in the working directory, if present.
pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => tracing::debug!("loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("ignoring unreadable .env file: {e}"),
    }
}

/// Load configuration from `civicquiz.toml` in the current directory (if any),
/// then apply environment overrides.
///
/// Environment variables: `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `OPENAI_MODEL`,
/// `PORT`, `CIVICQUIZ_QUESTIONS`, `CIVICQUIZ_STATIC`.
pub fn load_config() -> Result<CivicQuizConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or from `civicquiz.toml` if it exists.
pub fn load_config_from(path: Option<&Path>) -> Result<CivicQuizConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => Some(PathBuf::from("civicquiz.toml")).filter(|p| p.exists()),
    };

    let config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<CivicQuizConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => CivicQuizConfig::default(),
    };

    let lookup = |name: &str| std::env::var(name).ok();
    let config = apply_env_overrides(resolve_config_refs(config, lookup), lookup)?;
    config.validate()?;
    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides(
    mut config: CivicQuizConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<CivicQuizConfig> {
    if let Some(port) = lookup("PORT") {
        config.port = port
            .trim()
            .parse()
            .with_context(|| format!("invalid PORT value: {port:?}"))?;
    }

    if let Some(path) = lookup("CIVICQUIZ_QUESTIONS") {
        config.questions_path = PathBuf::from(path);
    }

    if let Some(dir) = lookup("CIVICQUIZ_STATIC") {
        config.static_dir = PathBuf::from(dir);
    }

    if let Some(key) = lookup("OPENAI_API_KEY") {
        config
            .openai
            .get_or_insert_with(|| OpenAiConfig {
                api_key: String::new(),
                base_url: None,
                model: None,
            })
            .api_key = key;
    }

    if let Some(openai) = config.openai.as_mut() {
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            openai.base_url = Some(url);
        }
        if let Some(model) = lookup("OPENAI_MODEL") {
            openai.model = Some(model);
        }
    }

    Ok(config)
}

/// Create the semantic evaluator, or `None` when no API key is configured.
pub fn create_evaluator(config: &CivicQuizConfig) -> Result<Option<Arc<dyn SemanticEvaluator>>> {
    if !config.openai_configured() {
        return Ok(None);
    }
    let Some(openai) = config.openai.as_ref() else {
        return Ok(None);
    };

    let evaluator = OpenAiEvaluator::new(
        openai.api_key.trim(),
        openai.base_url.clone(),
        openai.model.clone(),
        config.semantic_timeout(),
    )
    .context("failed to build OpenAI client")?;

    tracing::info!(model = evaluator.model(), "semantic evaluation enabled");
    let evaluator: Arc<dyn SemanticEvaluator> = Arc::new(evaluator);
    Ok(Some(evaluator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn resolve_env_vars_basic() {
        let lookup = env(&[("_CIVICQUIZ_TEST_VAR", "hello")]);
        assert_eq!(resolve_env_vars("${_CIVICQUIZ_TEST_VAR}", &lookup), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_CIVICQUIZ_TEST_VAR}_suffix", &lookup),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${UNSET}", &lookup), "");
    }

    #[test]
    fn resolve_env_vars_does_not_rescan_substitutions() {
        let lookup = env(&[("SELF", "${SELF}"), ("A", "x")]);
        assert_eq!(resolve_env_vars("${SELF}", &lookup), "${SELF}");
        assert_eq!(resolve_env_vars("${A}-${SELF}-${A}", &lookup), "x-${SELF}-x");
        assert_eq!(resolve_env_vars("open ${A", &lookup), "open ${A");
    }

    #[test]
    fn env_values_are_taken_literally() {
        let config = apply_env_overrides(
            CivicQuizConfig::default(),
            env(&[("OPENAI_API_KEY", "${OPENAI_API_KEY}")]),
        )
        .unwrap();
        assert_eq!(config.openai.unwrap().api_key, "${OPENAI_API_KEY}");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = CivicQuizConfig {
            semantic_timeout_secs: 0,
            ..CivicQuizConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(CivicQuizConfig::default().validate().is_ok());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("civicquiz.toml");
        std::fs::write(&path, "semantic_timeout_secs = 0\n").unwrap();
        let err = load_config_from(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("semantic_timeout_secs"));
    }

    #[test]
    fn default_config() {
        let config = CivicQuizConfig::default();
        assert_eq!(config.port, 8008);
        assert_eq!(config.questions_path, PathBuf::from("questions.json"));
        assert_eq!(config.semantic_timeout(), Duration::from_secs(10));
        assert!(!config.openai_configured());
    }

    #[test]
    fn env_overrides() {
        let config = apply_env_overrides(
            CivicQuizConfig::default(),
            env(&[
                ("PORT", "9000"),
                ("OPENAI_API_KEY", "sk-test"),
                ("OPENAI_MODEL", "gpt-4.1-mini"),
                ("CIVICQUIZ_QUESTIONS", "/data/q.json"),
                ("CIVICQUIZ_STATIC", "/srv/static"),
            ]),
        )
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.questions_path, PathBuf::from("/data/q.json"));
        assert_eq!(config.static_dir, PathBuf::from("/srv/static"));
        assert!(config.openai_configured());
        let openai = config.openai.unwrap();
        assert_eq!(openai.api_key, "sk-test");
        assert_eq!(openai.model.as_deref(), Some("gpt-4.1-mini"));
    }

    #[test]
    fn blank_api_key_is_unconfigured() {
        let config =
            apply_env_overrides(CivicQuizConfig::default(), env(&[("OPENAI_API_KEY", "  ")]))
                .unwrap();
        assert!(!config.openai_configured());
        assert!(create_evaluator(&config).unwrap().is_none());
    }

    #[test]
    fn no_key_means_no_evaluator() {
        let config = apply_env_overrides(CivicQuizConfig::default(), env(&[])).unwrap();
        assert!(config.openai.is_none());
        assert!(create_evaluator(&config).unwrap().is_none());
    }

    #[test]
    fn configured_key_builds_evaluator() {
        let config = apply_env_overrides(
            CivicQuizConfig::default(),
            env(&[("OPENAI_API_KEY", "sk-test")]),
        )
        .unwrap();
        let evaluator = create_evaluator(&config).unwrap().unwrap();
        assert_eq!(evaluator.name(), "openai");
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = apply_env_overrides(CivicQuizConfig::default(), env(&[("PORT", "eighty")]))
            .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
port = 8080
questions_path = "data/questions.json"
semantic_timeout_secs = 4

[openai]
api_key = "${_CIVICQUIZ_KEY}"
model = "gpt-4o-mini"
"#;
        let config: CivicQuizConfig = toml::from_str(toml_str).unwrap();
        let config = resolve_config_refs(config, env(&[("_CIVICQUIZ_KEY", "sk-from-env")]));

        assert_eq!(config.port, 8080);
        assert_eq!(config.semantic_timeout_secs, 4);
        assert_eq!(config.openai.as_ref().unwrap().api_key, "sk-from-env");
    }

    #[test]
    fn load_missing_explicit_path_fails() {
        let err = load_config_from(Some(Path::new("/nonexistent/civicquiz.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("civicquiz.toml");
        std::fs::write(&path, "semantic_timeout_secs = 3\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.semantic_timeout_secs, 3);
    }

    #[test]
    fn debug_masks_api_key() {
        let config = OpenAiConfig {
            api_key: "sk-secret".into(),
            base_url: None,
            model: None,
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("***"));
    }
}
