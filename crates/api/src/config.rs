//! Connection and server settings resolution.
//!
//! Every value is resolved with the same precedence: an explicit override
//! (usually a CLI flag) wins over the matching environment variable, which wins
//! over the documented default. Empty environment values count as unset.
//!
//! TLS is decided once here:
//! - an API key or a complete client certificate pair forces TLS on;
//! - otherwise an explicit flag is honoured;
//! - otherwise TLS is enabled for every host that is not a local address.

use std::{env, fmt, path::PathBuf, time::Duration};

use thiserror::Error;
use tracing::warn;
use url::Url;

pub const DEFAULT_HOST: &str = "localhost:7233";
pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_HTTP_PORT: u16 = 7243;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RESULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_BATCH_CONCURRENCY: usize = 4;

pub const HOST_ENV: &str = "TEMPORAL_HOST";
pub const NAMESPACE_ENV: &str = "TEMPORAL_NAMESPACE";
pub const TLS_ENABLED_ENV: &str = "TEMPORAL_TLS_ENABLED";
pub const TLS_CLIENT_CERT_ENV: &str = "TEMPORAL_TLS_CLIENT_CERT_PATH";
pub const TLS_CLIENT_KEY_ENV: &str = "TEMPORAL_TLS_CLIENT_KEY_PATH";
pub const API_KEY_ENV: &str = "TEMPORAL_API_KEY";
pub const HTTP_PORT_ENV: &str = "TEMPORAL_HTTP_PORT";
pub const REQUEST_TIMEOUT_ENV: &str = "TEMPORAL_MCP_REQUEST_TIMEOUT";
pub const RESULT_TIMEOUT_ENV: &str = "TEMPORAL_MCP_RESULT_TIMEOUT";
pub const BATCH_CONCURRENCY_ENV: &str = "TEMPORAL_MCP_BATCH_CONCURRENCY";

/// Hosts that never get TLS through auto-detection.
const LOCAL_HOSTS: &[&str] = &["localhost", "127.0.0.1", "::1", "host.docker.internal"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("mTLS needs both a client certificate and a client key; the {missing} is missing")]
    IncompleteMtls { missing: &'static str },

    #[error("invalid value '{value}' for {name}: {reason}")]
    InvalidValue { name: &'static str, value: String, reason: String },

    #[error("failed to read {what} '{}': {source}", path.display())]
    ReadCredential {
        what: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TLS material: {message}")]
    InvalidCredential { message: String },

    #[error("failed to build the Temporal HTTP client: {message}")]
    Client { message: String },
}

impl ConfigError {
    fn invalid(name: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            name,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Values supplied explicitly, typically parsed from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionOverrides {
    pub host: Option<String>,
    pub namespace: Option<String>,
    pub tls_enabled: Option<bool>,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
    pub api_key: Option<String>,
    pub http_port: Option<u16>,
    pub request_timeout_secs: Option<u64>,
}

/// Why TLS ended up on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsDecision {
    /// An API key or client certificate requires TLS.
    Forced,
    /// Taken from the flag or `TEMPORAL_TLS_ENABLED`.
    Explicit,
    /// Derived from whether the host is a local address.
    AutoDetected,
}

impl fmt::Display for TlsDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TlsDecision::Forced => "forced",
            TlsDecision::Explicit => "explicit",
            TlsDecision::AutoDetected => "auto-detected",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCertificate {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Resolved connection settings. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// `host:port` of the cluster frontend as configured.
    pub host: String,
    pub namespace: String,
    pub tls_enabled: bool,
    pub tls_decision: TlsDecision,
    pub client_certificate: Option<ClientCertificate>,
    pub api_key: Option<String>,
    /// Port of the frontend HTTP API, substituted for the port in `host`.
    pub http_port: u16,
    pub request_timeout: Duration,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("namespace", &self.namespace)
            .field("tls_enabled", &self.tls_enabled)
            .field("tls_decision", &self.tls_decision)
            .field("client_certificate", &self.client_certificate)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("http_port", &self.http_port)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ConnectionConfig {
    /// Resolve against the process environment.
    pub fn resolve(overrides: ConnectionOverrides) -> Result<Self, ConfigError> {
        Self::resolve_with(overrides, |name| env::var(name).ok())
    }

    /// Resolve against an arbitrary variable lookup.
    pub fn resolve_with(overrides: ConnectionOverrides, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let source = Source { lookup: &lookup };

        let host = source.string(overrides.host, HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let (host_name, _) = split_host(&host)?;
        let namespace = source
            .string(overrides.namespace, NAMESPACE_ENV)
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let api_key = source.string(overrides.api_key, API_KEY_ENV);

        let cert_path = overrides.tls_cert.or_else(|| source.env(TLS_CLIENT_CERT_ENV).map(PathBuf::from));
        let key_path = overrides.tls_key.or_else(|| source.env(TLS_CLIENT_KEY_ENV).map(PathBuf::from));
        let client_certificate = match (cert_path, key_path) {
            (Some(cert_path), Some(key_path)) => Some(ClientCertificate { cert_path, key_path }),
            (Some(_), None) => return Err(ConfigError::IncompleteMtls { missing: "client key" }),
            (None, Some(_)) => return Err(ConfigError::IncompleteMtls {
                missing: "client certificate",
            }),
            (None, None) => None,
        };

        let explicit_tls = match overrides.tls_enabled {
            Some(flag) => Some(flag),
            None => source
                .env(TLS_ENABLED_ENV)
                .map(|raw| parse_flag(&raw).map_err(|reason| ConfigError::invalid(TLS_ENABLED_ENV, raw, reason)))
                .transpose()?,
        };

        let (tls_enabled, tls_decision) = if api_key.is_some() || client_certificate.is_some() {
            if explicit_tls == Some(false) {
                warn!("TLS disabled explicitly but an API key or client certificate is configured; enabling TLS");
            }
            (true, TlsDecision::Forced)
        } else if let Some(flag) = explicit_tls {
            (flag, TlsDecision::Explicit)
        } else {
            (!is_local_host(&host_name), TlsDecision::AutoDetected)
        };

        let http_port = match overrides.http_port {
            Some(port) => port,
            None => source.parsed::<u16>(HTTP_PORT_ENV)?.unwrap_or(DEFAULT_HTTP_PORT),
        };
        if http_port == 0 {
            return Err(ConfigError::invalid(HTTP_PORT_ENV, "0", "port must be between 1 and 65535"));
        }

        let request_timeout_secs = match overrides.request_timeout_secs {
            Some(secs) => secs,
            None => source.parsed::<u64>(REQUEST_TIMEOUT_ENV)?.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        };
        if request_timeout_secs == 0 {
            return Err(ConfigError::invalid(REQUEST_TIMEOUT_ENV, "0", "timeout must be at least one second"));
        }

        Ok(Self {
            host,
            namespace,
            tls_enabled,
            tls_decision,
            client_certificate,
            api_key,
            http_port,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }

    /// Host part of the configured address, without brackets or port.
    pub fn host_name(&self) -> String {
        split_host(&self.host).map(|(name, _)| name).unwrap_or_else(|_| self.host.clone())
    }

    pub fn is_local(&self) -> bool {
        is_local_host(&self.host_name())
    }

    /// Root URL of the frontend HTTP API.
    pub fn http_base_url(&self) -> Result<Url, ConfigError> {
        let scheme = if self.tls_enabled { "https" } else { "http" };
        let host_name = self.host_name();
        let authority = if host_name.contains(':') {
            format!("[{host_name}]")
        } else {
            host_name
        };
        let raw = format!("{scheme}://{authority}:{}/", self.http_port);
        Url::parse(&raw).map_err(|error| ConfigError::invalid(HOST_ENV, self.host.clone(), error.to_string()))
    }
}

/// Dispatcher knobs that are not part of the connection itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub result_timeout_secs: Option<u64>,
    pub batch_concurrency: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerSettings {
    /// Upper bound for `get_workflow_result` when the caller gives none.
    pub result_timeout: Duration,
    /// Sub-operations a batch tool keeps in flight.
    pub batch_concurrency: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            result_timeout: Duration::from_secs(DEFAULT_RESULT_TIMEOUT_SECS),
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }
}

impl ServerSettings {
    pub fn resolve(overrides: SettingsOverrides) -> Result<Self, ConfigError> {
        Self::resolve_with(overrides, |name| env::var(name).ok())
    }

    pub fn resolve_with(overrides: SettingsOverrides, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let source = Source { lookup: &lookup };
        let result_timeout_secs = match overrides.result_timeout_secs {
            Some(secs) => secs,
            None => source.parsed::<u64>(RESULT_TIMEOUT_ENV)?.unwrap_or(DEFAULT_RESULT_TIMEOUT_SECS),
        };
        if result_timeout_secs == 0 {
            return Err(ConfigError::invalid(RESULT_TIMEOUT_ENV, "0", "timeout must be at least one second"));
        }
        let batch_concurrency = match overrides.batch_concurrency {
            Some(limit) => limit,
            None => source.parsed::<usize>(BATCH_CONCURRENCY_ENV)?.unwrap_or(DEFAULT_BATCH_CONCURRENCY),
        };
        if batch_concurrency == 0 {
            return Err(ConfigError::invalid(BATCH_CONCURRENCY_ENV, "0", "concurrency must be at least 1"));
        }
        Ok(Self {
            result_timeout: Duration::from_secs(result_timeout_secs),
            batch_concurrency,
        })
    }
}

/// Parses the boolean spellings accepted for TLS flags.
pub fn parse_flag(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(format!("expected true or false, got '{other}'")),
    }
}

pub fn is_local_host(host_name: &str) -> bool {
    let trimmed = host_name.trim_start_matches('[').trim_end_matches(']');
    LOCAL_HOSTS.iter().any(|local| trimmed.eq_ignore_ascii_case(local))
}

/// Splits `host:port` (or `[v6]:port`) into its parts.
fn split_host(host: &str) -> Result<(String, u16), ConfigError> {
    let trimmed = host.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::invalid(HOST_ENV, host, "host must not be empty"));
    }
    let (name, port) = if let Some(rest) = trimmed.strip_prefix('[') {
        let (name, tail) = rest
            .split_once(']')
            .ok_or_else(|| ConfigError::invalid(HOST_ENV, host, "unterminated IPv6 address"))?;
        let port = tail
            .strip_prefix(':')
            .ok_or_else(|| ConfigError::invalid(HOST_ENV, host, "expected host:port"))?;
        (name, port)
    } else {
        trimmed
            .rsplit_once(':')
            .filter(|(name, _)| !name.contains(':'))
            .ok_or_else(|| ConfigError::invalid(HOST_ENV, host, "expected host:port"))?
    };
    if name.is_empty() {
        return Err(ConfigError::invalid(HOST_ENV, host, "host name must not be empty"));
    }
    let port = port
        .parse::<u16>()
        .map_err(|error| ConfigError::invalid(HOST_ENV, host, format!("invalid port: {error}")))?;
    Ok((name.to_string(), port))
}

struct Source<'a, F: Fn(&str) -> Option<String>> {
    lookup: &'a F,
}

impl<F: Fn(&str) -> Option<String>> Source<'_, F> {
    fn env(&self, name: &str) -> Option<String> {
        (self.lookup)(name).map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
    }

    fn string(&self, explicit: Option<String>, name: &str) -> Option<String> {
        explicit
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .or_else(|| self.env(name))
    }

    fn parsed<T>(&self, name: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: fmt::Display,
    {
        self.env(name)
            .map(|raw| raw.parse::<T>().map_err(|error| ConfigError::invalid(name, raw.clone(), error.to_string())))
            .transpose()
    }
}
