use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const FALLBACK_SUPABASE_URL: &str = "http://localhost:54321";
const FALLBACK_SUPABASE_KEY: &str = "placeholder";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub supabase: SupabaseConfig,

    pub bunny: BunnyConfig,

    pub uploads: UploadConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human readable format.
    pub json_logs: bool,

    #[serde(default)]
    pub suppress_connection_errors: bool,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            suppress_connection_errors: false,
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 6790,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    pub url: String,

    /// Public key sent as `apikey` on every request.
    pub anon_key: String,

    /// Privileged key used for table and storage calls. Falls back to the
    /// anon key when unset.
    pub service_key: Option<String>,

    pub storage_bucket: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u32,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: FALLBACK_SUPABASE_URL.to_string(),
            anon_key: FALLBACK_SUPABASE_KEY.to_string(),
            service_key: None,
            storage_bucket: "media".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

impl SupabaseConfig {
    #[must_use]
    pub fn api_key(&self) -> &str {
        self.service_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .unwrap_or(&self.anon_key)
    }

    #[must_use]
    pub fn uses_placeholder_credentials(&self) -> bool {
        self.url == FALLBACK_SUPABASE_URL || self.anon_key == FALLBACK_SUPABASE_KEY
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BunnyConfig {
    /// Upload videos to Bunny Stream instead of the storage bucket.
    pub enabled: bool,

    pub api_key: String,

    pub library_id: String,

    pub api_base: String,

    pub embed_base: String,
}

impl Default for BunnyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            library_id: String::new(),
            api_base: crate::constants::bunny::API_BASE.to_string(),
            embed_base: crate::constants::bunny::EMBED_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum accepted multipart body size in megabytes.
    pub max_upload_mb: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_mb: 2048,
        }
    }
}

impl UploadConfig {
    #[must_use]
    pub const fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "cinedex".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            supabase: SupabaseConfig::default(),
            bunny: BunnyConfig::default(),
            uploads: UploadConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides();

        if config.supabase.uses_placeholder_credentials() {
            warn!(
                "Supabase credentials missing, falling back to {}. Set SUPABASE_URL and SUPABASE_ANON_KEY.",
                config.supabase.url
            );
        }

        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    /// Environment variables win over the file so secrets can stay out of it.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("SUPABASE_URL") {
            self.supabase.url = url;
        }
        if let Some(key) = non_empty("SUPABASE_ANON_KEY") {
            self.supabase.anon_key = key;
        }
        if let Some(key) = non_empty("SUPABASE_SERVICE_KEY") {
            self.supabase.service_key = Some(key);
        }
        if let Some(key) = non_empty("BUNNY_API_KEY") {
            self.bunny.api_key = key;
            self.bunny.enabled = true;
        }
        if let Some(library) = non_empty("BUNNY_LIBRARY_ID") {
            self.bunny.library_id = library;
        }
        if let Some(port) = non_empty("CINEDEX_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("cinedex").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".cinedex").join("config.toml"));
        }

        paths
    }

    #[must_use]
    pub fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.supabase.url.trim().is_empty() {
            anyhow::bail!("Supabase URL cannot be empty");
        }

        url::Url::parse(&self.supabase.url)
            .with_context(|| format!("Invalid Supabase URL: {}", self.supabase.url))?;

        if self.server.port == 0 {
            anyhow::bail!("Server port must be > 0");
        }

        if self.bunny.enabled && (self.bunny.api_key.is_empty() || self.bunny.library_id.is_empty())
        {
            anyhow::bail!("Bunny upload requires both api_key and library_id when enabled");
        }

        if self.uploads.max_upload_mb == 0 {
            anyhow::bail!("uploads.max_upload_mb must be > 0");
        }

        Ok(())
    }
}
