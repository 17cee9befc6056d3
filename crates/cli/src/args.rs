use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use temporal_mcp_api::{ConnectionOverrides, SettingsOverrides, config::parse_flag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// MCP over stdin/stdout.
    Stdio,
    /// Streamable HTTP on a loopback address, path /mcp.
    Http,
}

/// Serve Temporal workflow operations as MCP tools.
///
/// Every connection flag falls back to its environment variable, then to the
/// documented default.
#[derive(Debug, Parser)]
#[command(name = "temporal-mcp-server", version)]
pub struct Cli {
    /// Temporal frontend address [env: TEMPORAL_HOST] [default: localhost:7233]
    #[arg(long, value_name = "HOST:PORT")]
    pub host: Option<String>,

    /// Temporal namespace [env: TEMPORAL_NAMESPACE] [default: default]
    #[arg(long)]
    pub namespace: Option<String>,

    /// Enable TLS; auto-detected from the host when unset [env: TEMPORAL_TLS_ENABLED]
    #[arg(long, value_name = "BOOL", value_parser = parse_flag)]
    pub tls_enabled: Option<bool>,

    /// mTLS client certificate (PEM) [env: TEMPORAL_TLS_CLIENT_CERT_PATH]
    #[arg(long, value_name = "PATH")]
    pub tls_cert: Option<PathBuf>,

    /// mTLS client key (PEM) [env: TEMPORAL_TLS_CLIENT_KEY_PATH]
    #[arg(long, value_name = "PATH")]
    pub tls_key: Option<PathBuf>,

    /// API key sent as a bearer token; forces TLS [env: TEMPORAL_API_KEY]
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Port of the frontend HTTP API [env: TEMPORAL_HTTP_PORT] [default: 7243]
    #[arg(long, value_name = "PORT")]
    pub http_port: Option<u16>,

    /// Per-request timeout in seconds [env: TEMPORAL_MCP_REQUEST_TIMEOUT] [default: 30]
    #[arg(long, value_name = "SECONDS")]
    pub request_timeout: Option<u64>,

    /// Default wait of get_workflow_result in seconds [env: TEMPORAL_MCP_RESULT_TIMEOUT] [default: 60]
    #[arg(long, value_name = "SECONDS")]
    pub result_timeout: Option<u64>,

    /// Workflows a batch tool processes at once [env: TEMPORAL_MCP_BATCH_CONCURRENCY] [default: 4]
    #[arg(long, value_name = "N")]
    pub batch_concurrency: Option<usize>,

    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    pub transport: Transport,

    /// Loopback address for the HTTP transport [default: 127.0.0.1:8787]
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,
}

impl Cli {
    pub fn connection_overrides(&self) -> ConnectionOverrides {
        ConnectionOverrides {
            host: self.host.clone(),
            namespace: self.namespace.clone(),
            tls_enabled: self.tls_enabled,
            tls_cert: self.tls_cert.clone(),
            tls_key: self.tls_key.clone(),
            api_key: self.api_key.clone(),
            http_port: self.http_port,
            request_timeout_secs: self.request_timeout,
        }
    }

    pub fn settings_overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            result_timeout_secs: self.result_timeout,
            batch_concurrency: self.batch_concurrency,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use temporal_mcp_api::{ConnectionConfig, ServerSettings};

    use super::*;

    fn parse(arguments: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("temporal-mcp-server").chain(arguments.iter().copied())).unwrap()
    }

    #[test]
    fn flags_beat_environment() {
        let cli = parse(&["--host", "temporal.internal:7233", "--namespace", "orders", "--result-timeout", "5"]);
        temp_env::with_vars(
            [
                ("TEMPORAL_HOST", Some("env.example.com:7233")),
                ("TEMPORAL_NAMESPACE", Some("from-env")),
                ("TEMPORAL_MCP_RESULT_TIMEOUT", Some("90")),
            ],
            || {
                let config = ConnectionConfig::resolve(cli.connection_overrides()).unwrap();
                assert_eq!(config.host, "temporal.internal:7233");
                assert_eq!(config.namespace, "orders");
                let settings = ServerSettings::resolve(cli.settings_overrides()).unwrap();
                assert_eq!(settings.result_timeout, Duration::from_secs(5));
            },
        );
    }

    #[test]
    fn environment_fills_missing_flags() {
        let cli = parse(&[]);
        temp_env::with_vars(
            [
                ("TEMPORAL_HOST", Some("env.example.com:7233")),
                ("TEMPORAL_TLS_ENABLED", None),
                ("TEMPORAL_TLS_CLIENT_CERT_PATH", None),
                ("TEMPORAL_TLS_CLIENT_KEY_PATH", None),
                ("TEMPORAL_API_KEY", None),
            ],
            || {
                let config = ConnectionConfig::resolve(cli.connection_overrides()).unwrap();
                assert_eq!(config.host, "env.example.com:7233");
                assert!(config.tls_enabled);
            },
        );
        assert_eq!(cli.transport, Transport::Stdio);
    }

    #[test]
    fn tls_flag_accepts_boolean_spellings() {
        assert_eq!(parse(&["--tls-enabled", "yes"]).tls_enabled, Some(true));
        assert_eq!(parse(&["--tls-enabled", "0"]).tls_enabled, Some(false));
        assert!(Cli::try_parse_from(["temporal-mcp-server", "--tls-enabled", "maybe"]).is_err());
    }

    #[test]
    fn http_transport_is_selectable() {
        let cli = parse(&["--transport", "http", "--bind", "127.0.0.1:9100"]);
        assert_eq!(cli.transport, Transport::Http);
        assert_eq!(cli.bind.as_deref(), Some("127.0.0.1:9100"));
    }
}
