//! Runtime configuration from `COLDWATCH_*` environment variables.

use coldwatch_auth::TokenConfig;

const DEFAULT_RATE_LIMIT: usize = 60;
const DEFAULT_ACCESS_TTL_SECS: i64 = 900;
const DEFAULT_REFRESH_TTL_SECS: i64 = 7 * 86_400;

pub(crate) struct ServerConfig {
    pub(crate) tokens: TokenConfig,
    /// Per-device telemetry limit, readings per minute.
    pub(crate) rate_limit: usize,
}

impl ServerConfig {
    /// Read configuration from the environment.
    ///
    /// `COLDWATCH_JWT_SECRET` is mandatory: the server refuses to start with
    /// an absent or empty signing secret rather than falling back to a
    /// well-known default. A `rate_limit` argument (from the CLI) wins over
    /// `COLDWATCH_RATE_LIMIT`.
    pub(crate) fn from_env(rate_limit: Option<usize>) -> Result<Self, String> {
        let secret = std::env::var("COLDWATCH_JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                "COLDWATCH_JWT_SECRET must be set to a non-empty signing secret".to_string()
            })?;

        let rate_limit = rate_limit
            .or_else(|| env_parse("COLDWATCH_RATE_LIMIT"))
            .unwrap_or(DEFAULT_RATE_LIMIT);
        let access_ttl_secs =
            env_parse("COLDWATCH_ACCESS_TTL_SECS").unwrap_or(DEFAULT_ACCESS_TTL_SECS);
        let refresh_ttl_secs =
            env_parse("COLDWATCH_REFRESH_TTL_SECS").unwrap_or(DEFAULT_REFRESH_TTL_SECS);

        Ok(Self {
            tokens: TokenConfig {
                secret,
                access_ttl_secs,
                refresh_ttl_secs,
            },
            rate_limit,
        })
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
