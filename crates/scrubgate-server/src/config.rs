use anyhow::{Context, Result, anyhow, bail};
use scrubgate_core::MaskingMode;
use scrubgate_guard::{Authenticator, GuardConfig};
use scrubgate_observability::{LogFormat, LoggingConfig};
use scrubgate_pii::{CustomPattern, ModelRef};
use scrubgate_pipeline::PipelineDefaults;
use scrubgate_pipeline::options::parse_masking_char;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub masking: MaskingConfig,

    #[serde(default)]
    pub language: LanguageConfig,

    #[serde(default)]
    pub recognizers: RecognizerConfig,

    #[serde(default)]
    pub security: GuardConfig,

    /// Origins allowed to call the API cross-origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Take the client address from `X-Forwarded-For` / `X-Real-IP` when the
    /// peer is one of `trusted_proxies`
    #[serde(default)]
    pub trust_proxy_headers: bool,

    #[serde(default)]
    pub trusted_proxies: Vec<IpAddr>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskingConfig {
    #[serde(default = "default_masking_mode")]
    pub mode: MaskingMode,

    #[serde(default = "default_masking_char")]
    pub masking_char: String,

    #[serde(default = "default_false")]
    pub enable_preprocessing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    #[serde(default = "default_supported_languages")]
    pub supported: Vec<String>,

    #[serde(default = "default_language")]
    pub default: String,

    #[serde(default = "default_true")]
    pub auto_detect: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// Model per language. Languages without an entry use the built-in recognizer.
    #[serde(default = "default_models")]
    pub models: BTreeMap<String, String>,

    #[serde(default = "default_min_score")]
    pub min_score: f64,

    #[serde(default)]
    pub custom_patterns: Vec<CustomPattern>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            masking: MaskingConfig::default(),
            language: LanguageConfig::default(),
            recognizers: RecognizerConfig::default(),
            security: GuardConfig::default(),
            cors_origins: Vec::new(),
            trust_proxy_headers: false,
            trusted_proxies: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            mode: default_masking_mode(),
            masking_char: default_masking_char(),
            enable_preprocessing: false,
        }
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            supported: default_supported_languages(),
            default: default_language(),
            auto_detect: true,
        }
    }
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            models: default_models(),
            min_score: default_min_score(),
            custom_patterns: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents).context("invalid TOML config")?
        } else {
            // Default to YAML
            serde_yaml::from_str(&contents).context("invalid YAML config")?
        };

        Ok(config)
    }

    /// Merge environment variables into config (env vars take precedence)
    pub fn merge_env(&mut self) -> Result<()> {
        // Server settings
        if let Some(val) = env_var("SCRUBGATE_HOST") {
            self.host = val;
        }
        if let Some(port) = env_parse("SCRUBGATE_PORT")? {
            self.port = port;
        }

        // Masking defaults
        if let Some(mode) = env_var("SCRUBGATE_MASKING_MODE") {
            self.masking.mode = mode
                .parse()
                .map_err(|e| anyhow!("SCRUBGATE_MASKING_MODE: {}", e))?;
        }
        if let Some(val) = env_var("SCRUBGATE_MASKING_CHAR") {
            self.masking.masking_char = val;
        }
        if let Some(enabled) = env_bool("SCRUBGATE_ENABLE_PREPROCESSING")? {
            self.masking.enable_preprocessing = enabled;
        }

        // Language selection
        if let Some(list) = env_list("SCRUBGATE_SUPPORTED_LANGUAGES") {
            self.language.supported = list;
        }
        if let Some(val) = env_var("SCRUBGATE_DEFAULT_LANGUAGE") {
            self.language.default = val;
        }
        if let Some(enabled) = env_bool("SCRUBGATE_AUTO_DETECT_LANGUAGE")? {
            self.language.auto_detect = enabled;
        }
        if let Some(val) = env_var("SCRUBGATE_RECOGNIZER_MODELS") {
            self.recognizers.models = parse_models(&val)?;
        }

        // Authentication
        let auth = &mut self.security.auth;
        if let Some(enabled) = env_bool("SCRUBGATE_ENABLE_AUTH")? {
            auth.enabled = enabled;
        }
        if let Some(val) = env_var("SCRUBGATE_API_USERNAME") {
            auth.username = Some(val);
        }
        if let Some(val) = env_var("SCRUBGATE_API_PASSWORD") {
            auth.password = Some(val);
        }
        if let Some(len) = env_parse("SCRUBGATE_MIN_PASSWORD_LENGTH")? {
            auth.min_password_length = len;
        }

        // Rate limiting
        let rate = &mut self.security.rate_limit;
        if let Some(enabled) = env_bool("SCRUBGATE_ENABLE_RATE_LIMIT")? {
            rate.enabled = enabled;
        }
        if let Some(per_minute) = env_parse("SCRUBGATE_RATE_LIMIT_PER_MINUTE")? {
            rate.requests_per_interval = per_minute;
            rate.interval = Duration::from_secs(60);
        }
        if let Some(burst) = env_parse("SCRUBGATE_RATE_LIMIT_BURST")? {
            rate.burst = burst;
        }
        if let Some(secs) = env_parse("SCRUBGATE_RATE_LIMIT_IDLE_SECS")? {
            rate.idle_timeout = Duration::from_secs(secs);
        }
        if let Some(max) = env_parse("SCRUBGATE_RATE_LIMIT_MAX_CLIENTS")? {
            rate.max_clients = max;
        }

        // Resource limits
        let limits = &mut self.security.limits;
        if let Some(max) = env_parse("SCRUBGATE_MAX_TEXT_SIZE")? {
            limits.max_text_chars = max;
        }
        if let Some(max) = env_parse("SCRUBGATE_MAX_REQUEST_SIZE")? {
            limits.max_body_bytes = max;
        }
        if let Some(max) = env_parse("SCRUBGATE_MAX_ENTITIES")? {
            limits.max_entities = max;
        }
        if let Some(ms) = env_parse("SCRUBGATE_PROCESSING_TIMEOUT_MS")? {
            limits.processing_timeout_ms = ms;
        }

        if let Some(list) = env_list("SCRUBGATE_CORS_ORIGINS") {
            self.cors_origins = list;
        }

        // Reverse proxy
        if let Some(enabled) = env_bool("SCRUBGATE_TRUST_PROXY_HEADERS")? {
            self.trust_proxy_headers = enabled;
        }
        if let Some(list) = env_list("SCRUBGATE_TRUSTED_PROXIES") {
            self.trusted_proxies = list
                .iter()
                .map(|raw| {
                    raw.parse::<IpAddr>()
                        .map_err(|_| anyhow!("SCRUBGATE_TRUSTED_PROXIES: invalid address '{}'", raw))
                })
                .collect::<Result<_>>()?;
        }

        // Logging settings
        if let Some(enabled) = env_bool("SCRUBGATE_ENABLE_LOGGING")? {
            self.logging.log_requests = enabled;
        }
        if let Some(val) = env_var("SCRUBGATE_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = env_var("SCRUBGATE_LOG_FORMAT") {
            self.logging.format = val
                .parse::<LogFormat>()
                .map_err(|e| anyhow!("SCRUBGATE_LOG_FORMAT: {}", e))?;
        }

        Ok(())
    }

    /// Fail fast on settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.language.supported.is_empty() {
            bail!("at least one supported language is required");
        }
        if !self.language.supported.contains(&self.language.default) {
            bail!(
                "default language '{}' must be one of the supported languages ({})",
                self.language.default,
                self.language.supported.join(", ")
            );
        }

        parse_masking_char(&self.masking.masking_char)
            .context("invalid default masking character")?;

        for language in &self.language.supported {
            self.model_for(language)?;
        }

        Authenticator::from_config(&self.security.auth)?;
        self.security.limits.validate()?;

        let rate = &self.security.rate_limit;
        if rate.enabled {
            rate.validate()?;
            if rate.max_clients == 0 {
                bail!("rate limit max clients must be greater than 0");
            }
        }

        if self.trust_proxy_headers && self.trusted_proxies.is_empty() {
            bail!("trust_proxy_headers requires at least one trusted proxy address");
        }

        if !(0.0..=1.0).contains(&self.recognizers.min_score) {
            bail!("recognizer min_score must be within [0, 1]");
        }

        Ok(())
    }

    /// Validated model reference for `language`
    pub fn model_for(&self, language: &str) -> Result<ModelRef> {
        match self.recognizers.models.get(language) {
            Some(raw) => ModelRef::parse(raw)
                .with_context(|| format!("recognizer model for language '{}'", language)),
            None => Ok(ModelRef::builtin()),
        }
    }

    pub fn pipeline_defaults(&self) -> Result<PipelineDefaults> {
        Ok(PipelineDefaults {
            masking_mode: self.masking.mode,
            masking_char: parse_masking_char(&self.masking.masking_char)?,
            enable_preprocessing: self.masking.enable_preprocessing,
            log_metadata: self.logging.log_requests,
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_var(name)
        .map(|val| {
            val.trim()
                .parse::<T>()
                .map_err(|e| anyhow!("{}: invalid value '{}': {}", name, val, e))
        })
        .transpose()
}

fn env_bool(name: &str) -> Result<Option<bool>> {
    env_var(name)
        .map(|val| match val.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(anyhow!("{}: expected a boolean, got '{}'", name, val)),
        })
        .transpose()
}

fn env_list(name: &str) -> Option<Vec<String>> {
    env_var(name).map(|val| {
        val.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
}

/// Parse `lang=model` pairs separated by commas
fn parse_models(raw: &str) -> Result<BTreeMap<String, String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            pair.split_once('=')
                .map(|(lang, model)| (lang.trim().to_string(), model.trim().to_string()))
                .filter(|(lang, model)| !lang.is_empty() && !model.is_empty())
                .ok_or_else(|| anyhow!("SCRUBGATE_RECOGNIZER_MODELS: expected lang=model pairs"))
        })
        .collect()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_masking_mode() -> MaskingMode {
    MaskingMode::Redact
}

fn default_masking_char() -> String {
    "█".to_string()
}

fn default_supported_languages() -> Vec<String> {
    vec!["en".to_string(), "de".to_string()]
}

fn default_language() -> String {
    "en".to_string()
}

fn default_models() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("en".to_string(), "en_core_web_lg".to_string()),
        ("de".to_string(), "de_core_news_lg".to_string()),
    ])
}

fn default_min_score() -> f64 {
    0.5
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}
