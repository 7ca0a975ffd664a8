//! Daemon configuration: CLI flags and environment, over an optional TOML
//! file, over built-in defaults.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use mcp_router_api::{ApiConfig, AuthConfig, RateLimitConfig};
use mcp_router_client::McpClientConfig;
use serde::Deserialize;

pub const DEFAULT_PORT: u16 = 3032;
pub const DEFAULT_OFFICIAL_URL: &str = "http://notion_mcp:3030/mcp";
pub const DEFAULT_CUSTOM_URL: &str = "http://notion_mcp_dev:3031/mcp";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_RATE_LIMIT_WINDOW_MS: u64 = 900_000;
pub const DEFAULT_RATE_LIMIT_MAX: u32 = 100;

/// Command-line arguments; every option can also come from the environment
#[derive(Debug, Default, Parser)]
#[command(name = "mcp-routerd")]
#[command(author, version, about = "MCP tool-call router daemon")]
pub struct Args {
    /// TOML config file; CLI flags and environment override its values
    #[arg(short, long, env = "ROUTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen port
    #[arg(short, long, env = "ROUTER_PORT")]
    pub port: Option<u16>,

    /// Listen port as set by container platforms. `--port` and `ROUTER_PORT`
    /// take precedence, so an explicit flag is never overridden.
    #[arg(long = "platform-port", env = "PORT", hide = true)]
    pub platform_port: Option<u16>,

    /// Listen address
    #[arg(long, env = "ROUTER_BIND")]
    pub bind: Option<IpAddr>,

    /// Bearer token required on protected routes (unset disables auth)
    #[arg(long, env = "ROUTER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Official backend endpoint
    #[arg(long, env = "OFFICIAL_MCP_URL")]
    pub official_url: Option<String>,

    /// Official backend bearer token
    #[arg(long, env = "OFFICIAL_MCP_TOKEN", hide_env_values = true)]
    pub official_token: Option<String>,

    /// Custom backend endpoint
    #[arg(long, env = "CUSTOM_MCP_URL")]
    pub custom_url: Option<String>,

    /// Custom backend bearer token
    #[arg(long, env = "CUSTOM_MCP_TOKEN", hide_env_values = true)]
    pub custom_token: Option<String>,

    /// Per-call backend timeout in milliseconds
    #[arg(long, env = "MCP_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,

    /// Rate limit window in milliseconds
    #[arg(long, env = "RATE_LIMIT_WINDOW_MS")]
    pub rate_limit_window_ms: Option<u64>,

    /// Requests per caller per window
    #[arg(long, env = "RATE_LIMIT_MAX")]
    pub rate_limit_max: Option<u32>,

    /// Require the bearer token on /metrics too
    #[arg(long, env = "METRICS_REQUIRE_AUTH")]
    pub metrics_require_auth: Option<bool>,

    /// Emit logs as JSON lines
    #[arg(long, env = "ROUTER_LOG_JSON")]
    pub log_json: Option<bool>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, env = "ROUTER_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Values read from the TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub official: BackendSection,
    #[serde(default)]
    pub custom: BackendSection,
    #[serde(default)]
    pub rate_limit: RateLimitSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    pub port: Option<u16>,
    pub bind: Option<IpAddr>,
    pub api_key: Option<String>,
    pub metrics_require_auth: Option<bool>,
    pub request_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendSection {
    pub url: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitSection {
    pub window_ms: Option<u64>,
    pub max: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    pub json: Option<bool>,
    pub level: Option<String>,
}

impl FileConfig {
    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// One backend's resolved settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSettings {
    pub url: String,
    pub token: String,
}

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    pub listen: SocketAddr,
    pub api_key: Option<String>,
    pub metrics_require_auth: bool,
    pub official: BackendSettings,
    pub custom: BackendSettings,
    pub request_timeout: Duration,
    pub rate_limit: RateLimitConfig,
    pub log_json: bool,
    pub log_level: String,
}

impl RouterConfig {
    /// Load the file named by `--config` (if any) and merge `args` over it
    pub fn load(args: Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load_from(path)?,
            None => FileConfig::default(),
        };
        Self::merge(args, file)
    }

    /// Merge CLI/env values over file values over defaults, then validate
    pub fn merge(args: Args, file: FileConfig) -> Result<Self> {
        let port = args
            .port
            .or(args.platform_port)
            .or(file.server.port)
            .unwrap_or(DEFAULT_PORT);
        let bind = args
            .bind
            .or(file.server.bind)
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        let config = Self {
            listen: SocketAddr::new(bind, port),
            api_key: args
                .api_key
                .or(file.server.api_key)
                .filter(|k| !k.is_empty()),
            metrics_require_auth: args
                .metrics_require_auth
                .or(file.server.metrics_require_auth)
                .unwrap_or(false),
            official: BackendSettings {
                url: args
                    .official_url
                    .or(file.official.url)
                    .unwrap_or_else(|| DEFAULT_OFFICIAL_URL.to_string()),
                token: args.official_token.or(file.official.token).unwrap_or_default(),
            },
            custom: BackendSettings {
                url: args
                    .custom_url
                    .or(file.custom.url)
                    .unwrap_or_else(|| DEFAULT_CUSTOM_URL.to_string()),
                token: args.custom_token.or(file.custom.token).unwrap_or_default(),
            },
            request_timeout: Duration::from_millis(
                args.request_timeout_ms
                    .or(file.server.request_timeout_ms)
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
            ),
            rate_limit: RateLimitConfig {
                window: Duration::from_millis(
                    args.rate_limit_window_ms
                        .or(file.rate_limit.window_ms)
                        .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_MS),
                ),
                max_requests: args
                    .rate_limit_max
                    .or(file.rate_limit.max)
                    .unwrap_or(DEFAULT_RATE_LIMIT_MAX),
            },
            log_json: args.log_json.or(file.logging.json).unwrap_or(false),
            log_level: args
                .log_level
                .or(file.logging.level)
                .unwrap_or_else(|| "info".to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, backend) in [("official", &self.official), ("custom", &self.custom)] {
            let url = url::Url::parse(&backend.url)
                .with_context(|| format!("Invalid {} backend URL: {}", name, backend.url))?;
            if !matches!(url.scheme(), "http" | "https") {
                bail!("Invalid {} backend URL scheme: {}", name, url.scheme());
            }
        }
        if self.request_timeout.is_zero() {
            bail!("Request timeout must be greater than zero");
        }
        if self.rate_limit.window.is_zero() {
            bail!("Rate limit window must be greater than zero");
        }
        if self.rate_limit.max_requests == 0 {
            bail!("Rate limit max must be greater than zero");
        }
        Ok(())
    }

    /// Client settings for one backend
    pub fn client_config(&self, name: &str, backend: &BackendSettings) -> McpClientConfig {
        McpClientConfig {
            name: name.to_string(),
            base_url: backend.url.clone(),
            auth_token: backend.token.clone(),
            request_timeout: self.request_timeout,
        }
    }

    /// Settings for the HTTP surface
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            auth: AuthConfig {
                api_key: self.api_key.clone(),
                metrics_require_auth: self.metrics_require_auth,
            },
            rate_limit: self.rate_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = RouterConfig::merge(Args::default(), FileConfig::default()).unwrap();

        assert_eq!(config.listen, "0.0.0.0:3032".parse().unwrap());
        assert_eq!(config.api_key, None);
        assert!(!config.metrics_require_auth);
        assert_eq!(config.official.url, DEFAULT_OFFICIAL_URL);
        assert_eq!(config.custom.token, "");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.rate_limit, RateLimitConfig::default());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn args_override_file_values() {
        let file: FileConfig = toml::from_str(
            r#"
            [server]
            port = 4000
            api_key = "from-file"

            [official]
            url = "http://official.internal:3030/mcp"
            token = "file-token"

            [rate_limit]
            max = 5
            "#,
        )
        .unwrap();
        let args = Args {
            port: Some(5000),
            official_token: Some("cli-token".into()),
            ..Default::default()
        };

        let config = RouterConfig::merge(args, file).unwrap();

        assert_eq!(config.listen.port(), 5000);
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.official.url, "http://official.internal:3030/mcp");
        assert_eq!(config.official.token, "cli-token");
        assert_eq!(config.rate_limit.max_requests, 5);
    }

    #[test]
    fn router_port_wins_over_platform_port() {
        let args = Args {
            port: Some(7000),
            platform_port: Some(8000),
            ..Default::default()
        };
        let config = RouterConfig::merge(args, FileConfig::default()).unwrap();
        assert_eq!(config.listen.port(), 7000);

        let args = Args {
            platform_port: Some(8000),
            ..Default::default()
        };
        let config = RouterConfig::merge(args, FileConfig::default()).unwrap();
        assert_eq!(config.listen.port(), 8000);
    }

    #[test]
    fn empty_api_key_disables_auth() {
        let args = Args {
            api_key: Some(String::new()),
            ..Default::default()
        };
        let config = RouterConfig::merge(args, FileConfig::default()).unwrap();
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad_url = Args {
            custom_url: Some("not a url".into()),
            ..Default::default()
        };
        let err = RouterConfig::merge(bad_url, FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("custom backend URL"));

        let zero_max = Args {
            rate_limit_max: Some(0),
            ..Default::default()
        };
        assert!(RouterConfig::merge(zero_max, FileConfig::default()).is_err());

        let zero_window = Args {
            rate_limit_window_ms: Some(0),
            ..Default::default()
        };
        assert!(RouterConfig::merge(zero_window, FileConfig::default()).is_err());
    }

    #[test]
    fn load_reads_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[custom]\nurl = \"http://localhost:3031/mcp\"\n\n[logging]\njson = true"
        )
        .unwrap();

        let config = RouterConfig::load(Args {
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(config.custom.url, "http://localhost:3031/mcp");
        assert!(config.log_json);
    }

    #[test]
    fn unknown_file_keys_are_errors() {
        let parsed: Result<FileConfig, _> = toml::from_str("[server]\nprot = 1");
        assert!(parsed.is_err());
    }

    #[test]
    fn cli_parses_flags() {
        let args = Args::try_parse_from([
            "mcp-routerd",
            "--port",
            "9999",
            "--metrics-require-auth",
            "true",
            "--rate-limit-max",
            "10",
        ])
        .unwrap();
        assert_eq!(args.port, Some(9999));
        assert_eq!(args.metrics_require_auth, Some(true));
        assert_eq!(args.rate_limit_max, Some(10));
    }
}
