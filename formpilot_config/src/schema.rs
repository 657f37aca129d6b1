use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub memory_source: MemorySourceConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub extraction: ExtractionSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    Anthropic,
    OpenAi,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    #[serde(default)]
    pub provider: EngineKind,
    #[serde(default = "EngineConfig::default_model")]
    pub model: String,
    #[serde(default = "EngineConfig::default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "EngineConfig::default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider: EngineKind::default(),
            model: Self::default_model(),
            max_tokens: Self::default_max_tokens(),
            temperature: 0.0,
            timeout_secs: Self::default_timeout_secs(),
            base_url: None,
            api_key: String::new(),
        }
    }
}

impl EngineConfig {
    fn default_model() -> String {
        "claude-3-5-sonnet-latest".to_string()
    }

    const fn default_max_tokens() -> u32 {
        4096
    }

    const fn default_timeout_secs() -> u64 {
        60
    }

    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Environment variable consulted when `api_key` is empty.
    #[must_use]
    pub const fn api_key_env(&self) -> &'static str {
        match self.provider {
            EngineKind::Anthropic => "ANTHROPIC_API_KEY",
            EngineKind::OpenAi => "OPENAI_API_KEY",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RendererConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub template_id: String,
    #[serde(default = "RendererConfig::default_title")]
    pub title: String,
    #[serde(default = "RendererConfig::default_font_size")]
    pub font_size: u32,
    #[serde(default = "RendererConfig::default_text_color")]
    pub text_color: String,
    #[serde(default = "RendererConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "RendererConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            template_id: String::new(),
            title: Self::default_title(),
            font_size: Self::default_font_size(),
            text_color: Self::default_text_color(),
            base_url: Self::default_base_url(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

impl RendererConfig {
    fn default_title() -> String {
        "Acord 125".to_string()
    }

    const fn default_font_size() -> u32 {
        10
    }

    fn default_text_color() -> String {
        "#333333".to_string()
    }

    fn default_base_url() -> String {
        "https://app.useanvil.com".to_string()
    }

    const fn default_timeout_secs() -> u64 {
        60
    }

    /// Rendering is enabled only with both a key and a template.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.template_id.trim().is_empty()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MemorySourceConfig {
    #[serde(default)]
    pub company_list_url: String,
    #[serde(default)]
    pub company_memory_url: String,
    #[serde(default)]
    pub list_api_key: String,
    #[serde(default)]
    pub memory_api_key: String,
    #[serde(default = "MemorySourceConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MemorySourceConfig {
    fn default() -> Self {
        Self {
            company_list_url: String::new(),
            company_memory_url: String::new(),
            list_api_key: String::new(),
            memory_api_key: String::new(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

impl MemorySourceConfig {
    const fn default_timeout_secs() -> u64 {
        30
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.company_list_url.trim().is_empty() && !self.company_memory_url.trim().is_empty()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TranscriptionConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "TranscriptionConfig::default_model")]
    pub model: String,
    #[serde(default = "TranscriptionConfig::default_base_url")]
    pub base_url: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: Self::default_model(),
            base_url: Self::default_base_url(),
        }
    }
}

impl TranscriptionConfig {
    fn default_model() -> String {
        "whisper-1".to_string()
    }

    fn default_base_url() -> String {
        "https://api.openai.com/v1".to_string()
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_bind")]
    pub bind: String,
    #[serde(default = "ServerConfig::default_static_dir")]
    pub static_dir: PathBuf,
    /// Empty means any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: Self::default_bind(),
            static_dir: Self::default_static_dir(),
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    fn default_bind() -> String {
        "0.0.0.0:8000".to_string()
    }

    fn default_static_dir() -> PathBuf {
        PathBuf::from("static")
    }

    /// Directory generated PDFs are written to.
    #[must_use]
    pub fn forms_dir(&self) -> PathBuf {
        self.static_dir.join("forms")
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    #[default]
    Reasoning,
    KeyPath,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ExtractionSettings {
    #[serde(default)]
    pub strategy: ExtractionStrategy,
}

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("formpilot"))
    }

    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load `~/formpilot/config.json` and fill empty secrets from the
    /// environment.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'formpilot init' to create config.",
                config_path.display()
            );
        }

        let mut config = Self::load_from(&config_path)?;
        config.fill_secrets_from(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults plus
    /// environment secrets.
    pub fn load_or_default() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            return Self::load();
        }

        info!(
            "No config at {}, using defaults and environment",
            config_path.display()
        );
        let mut config = Self::default();
        config.fill_secrets_from(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Environment variables consulted for empty config values, in the order
    /// [`Config::fill_secrets_from`] reads them. The engine key depends on the
    /// configured provider, so a name can appear twice.
    #[must_use]
    pub const fn secret_env_vars(&self) -> [&'static str; 8] {
        [
            self.engine.api_key_env(),
            "ANVIL_API_KEY",
            "ANVIL_TEMPLATE_EID",
            "RETOOL_COMPANY_LIST_KEY",
            "RETOOL_COMPANY_MEMORY_KEY",
            "RETOOL_COMPANY_LIST_URL",
            "RETOOL_COMPANY_MEMORY_URL",
            "OPENAI_API_KEY",
        ]
    }

    /// Fill every empty secret from `lookup`, keyed by environment variable
    /// name.
    pub fn fill_secrets_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fill = |slot: &mut String, name: &str| {
            if slot.trim().is_empty() {
                if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                    debug!("Using {name} from environment");
                    *slot = value;
                }
            }
        };

        let [
            engine_key,
            renderer_key,
            template_id,
            list_key,
            memory_key,
            list_url,
            memory_url,
            transcription_key,
        ] = self.secret_env_vars();
        fill(&mut self.engine.api_key, engine_key);
        fill(&mut self.renderer.api_key, renderer_key);
        fill(&mut self.renderer.template_id, template_id);
        fill(&mut self.memory_source.list_api_key, list_key);
        fill(&mut self.memory_source.memory_api_key, memory_key);
        fill(&mut self.memory_source.company_list_url, list_url);
        fill(&mut self.memory_source.company_memory_url, memory_url);
        fill(&mut self.transcription.api_key, transcription_key);
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.json");

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        std::fs::write(&config_path, CONFIG_TEMPLATE)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Add your reasoning engine API key (or set ANTHROPIC_API_KEY)");
        println!("   2. Add your Anvil API key and PDF template id to enable PDF output");
        println!("   3. Add the company list/memory workflow URLs and keys");
        println!("   4. Run 'formpilot serve' to start the API");
        println!();
        println!("🔧 Configuration options:");
        println!("   - engine.provider: anthropic or openai");
        println!("   - extraction.strategy: reasoning or key_path");
        println!("   - server.static_dir: generated PDFs are written to <static_dir>/forms");
        println!();
        Ok(())
    }
}

const CONFIG_TEMPLATE: &str = r##"{
  "engine": {
    "provider": "anthropic",
    "model": "claude-3-5-sonnet-latest",
    "max_tokens": 4096,
    "temperature": 0.0,
    "timeout_secs": 60,
    "api_key": ""
  },
  "renderer": {
    "api_key": "",
    "template_id": "",
    "title": "Acord 125",
    "font_size": 10,
    "text_color": "#333333"
  },
  "memory_source": {
    "company_list_url": "",
    "company_memory_url": "",
    "list_api_key": "",
    "memory_api_key": "",
    "timeout_secs": 30
  },
  "transcription": {
    "api_key": "",
    "model": "whisper-1"
  },
  "server": {
    "bind": "0.0.0.0:8000",
    "static_dir": "static",
    "allowed_origins": []
  },
  "extraction": {
    "strategy": "reasoning"
  }
}"##;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn template_parses_with_defaults() {
        let config: Config = serde_json::from_str(CONFIG_TEMPLATE).expect("template is valid");
        assert_eq!(config.engine.provider, EngineKind::Anthropic);
        assert_eq!(config.renderer.font_size, 10);
        assert_eq!(config.renderer.base_url, "https://app.useanvil.com");
        assert_eq!(config.extraction.strategy, ExtractionStrategy::Reasoning);
        assert_eq!(config.server.forms_dir(), PathBuf::from("static/forms"));
        assert!(!config.engine.has_credentials());
        assert!(!config.renderer.is_configured());
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn empty_object_is_a_valid_config() {
        let config: Config = serde_json::from_str("{}").expect("all sections default");
        assert_eq!(config.engine.timeout_secs, 60);
        assert_eq!(config.transcription.model, "whisper-1");
        assert_eq!(config.server.bind, "0.0.0.0:8000");
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn provider_names_parse() {
        let config: Config = serde_json::from_str(
            r#"{"engine": {"provider": "openai"}, "extraction": {"strategy": "key_path"}}"#,
        )
        .expect("valid config");
        assert_eq!(config.engine.provider, EngineKind::OpenAi);
        assert_eq!(config.engine.api_key_env(), "OPENAI_API_KEY");
        assert_eq!(config.extraction.strategy, ExtractionStrategy::KeyPath);
    }

    #[test]
    fn secrets_fill_only_when_empty() {
        let env: HashMap<&str, &str> = [
            ("ANTHROPIC_API_KEY", "sk-env"),
            ("ANVIL_API_KEY", "anvil-env"),
            ("OPENAI_API_KEY", "openai-env"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.renderer.api_key = "anvil-file".to_string();
        config.fill_secrets_from(|name| env.get(name).map(ToString::to_string));

        assert_eq!(config.engine.api_key, "sk-env");
        assert_eq!(config.renderer.api_key, "anvil-file");
        assert_eq!(config.transcription.api_key, "openai-env");
        assert!(config.memory_source.list_api_key.is_empty());
    }

    #[test]
    fn every_listed_variable_fills_a_value() {
        let config = Config::default();
        let vars = config.secret_env_vars();
        for expected in [
            "ANTHROPIC_API_KEY",
            "OPENAI_API_KEY",
            "ANVIL_TEMPLATE_EID",
            "RETOOL_COMPANY_LIST_URL",
            "RETOOL_COMPANY_MEMORY_URL",
        ] {
            assert!(vars.contains(&expected), "{expected} is not listed");
        }

        for var in vars {
            let mut filled = Config::default();
            filled.fill_secrets_from(|name| (name == var).then(|| "from-env".to_string()));
            let values = [
                &filled.engine.api_key,
                &filled.renderer.api_key,
                &filled.renderer.template_id,
                &filled.memory_source.list_api_key,
                &filled.memory_source.memory_api_key,
                &filled.memory_source.company_list_url,
                &filled.memory_source.company_memory_url,
                &filled.transcription.api_key,
            ];
            assert!(
                values.iter().any(|value| value.as_str() == "from-env"),
                "{var} fills nothing"
            );
        }
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn load_from_reads_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"server": {"static_dir": "/srv/forms-static"}}"#)
            .expect("write config");

        let config = Config::load_from(&path).expect("config loads");
        assert_eq!(
            config.server.forms_dir(),
            PathBuf::from("/srv/forms-static/forms")
        );
    }
}
