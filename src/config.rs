//! Gateway configuration
//!
//! Everything is read from the process environment. Unset variables fall back
//! to defaults; malformed values are rejected.

use {
    crate::error::ConfigError,
    crate::limits::ResourceLimits,
    std::net::{IpAddr, Ipv4Addr, SocketAddr},
    std::str::FromStr,
    std::time::Duration,
};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://www.youngsinc.com/yis7beta_service";
pub const DEFAULT_SSE_KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Upstream customer API settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    pub base_url: String,
    /// `None` means a single attempt with no client-side deadline
    pub timeout: Option<Duration>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub host: IpAddr,
    pub port: u16,
    pub upstream: UpstreamConfig,
    pub sse_keep_alive: Duration,
    pub limits: ResourceLimits,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            upstream: UpstreamConfig::default(),
            sse_keep_alive: DEFAULT_SSE_KEEP_ALIVE,
            limits: ResourceLimits::default(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = parse_var(&lookup, "HOST")?.unwrap_or(defaults.host);
        let port = parse_var(&lookup, "PORT")?.unwrap_or(defaults.port);

        let base_url = match lookup("CUSTOMER_API_BASE_URL") {
            Some(value) => {
                let trimmed = value.trim();
                if reqwest::Url::parse(trimmed).is_err() {
                    return Err(ConfigError::Invalid {
                        var: "CUSTOMER_API_BASE_URL",
                        value,
                    });
                }
                trimmed.to_string()
            }
            None => defaults.upstream.base_url,
        };
        let timeout = parse_var::<u64, _>(&lookup, "UPSTREAM_TIMEOUT_SECS")?
            .map(Duration::from_secs);

        let sse_keep_alive = parse_var::<u64, _>(&lookup, "SSE_KEEP_ALIVE_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.sse_keep_alive);

        let limits = ResourceLimits {
            max_sessions: parse_var(&lookup, "MAX_SESSIONS")?.or(defaults.limits.max_sessions),
            max_message_size: parse_var(&lookup, "MAX_MESSAGE_SIZE")?
                .unwrap_or(defaults.limits.max_message_size),
        };

        Ok(Self {
            host,
            port,
            upstream: UpstreamConfig { base_url, timeout },
            sse_keep_alive,
            limits,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_upstream_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.upstream.base_url = base_url.into();
        self
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
