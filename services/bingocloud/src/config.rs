use std::fmt::{Debug, Formatter};

use super::constants::*;
use stratus_core::{utils::Redact, Context};

/// Config carries all the configuration for the BingoCloud driver.
#[derive(Clone, Default)]
pub struct Config {
    /// `endpoint` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`BINGO_ENDPOINT`]
    pub endpoint: Option<String>,
    /// `access_key_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`BINGO_ACCESS_KEY_ID`]
    pub access_key_id: Option<String>,
    /// `secret_access_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`BINGO_SECRET_ACCESS_KEY`]
    pub secret_access_key: Option<String>,
    /// Restrict the account to read calls.
    ///
    /// A read-only client rejects every action that is not a `Get*`,
    /// `List*` or `Describe*` before anything is sent. Not loaded from the
    /// environment.
    pub read_only: bool,
}

impl Config {
    /// Create a new Config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set access_key_id
    pub fn with_access_key_id(mut self, access_key_id: impl Into<String>) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self
    }

    /// Set secret_access_key
    pub fn with_secret_access_key(mut self, secret_access_key: impl Into<String>) -> Self {
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Set read_only
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Load config from env.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if let Some(v) = ctx.env_var(BINGO_ENDPOINT) {
            self.endpoint.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(BINGO_ACCESS_KEY_ID) {
            self.access_key_id.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(BINGO_SECRET_ACCESS_KEY) {
            self.secret_access_key.get_or_insert(v);
        }

        self
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .field(
                "access_key_id",
                &self.access_key_id.as_ref().map(Redact::from),
            )
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(Redact::from),
            )
            .field("read_only", &self.read_only)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_core::StaticEnv;

    #[test]
    fn test_from_env_fills_only_missing_fields() {
        let ctx = Context::default().with_env(StaticEnv {
            envs: [
                (BINGO_ENDPOINT.to_string(), "http://10.0.0.1".to_string()),
                (BINGO_ACCESS_KEY_ID.to_string(), "env_ak".to_string()),
                (BINGO_SECRET_ACCESS_KEY.to_string(), "env_sk".to_string()),
            ]
            .into_iter()
            .collect(),
        });

        let config = Config::new().with_access_key_id("explicit_ak").from_env(&ctx);
        assert_eq!(config.endpoint.as_deref(), Some("http://10.0.0.1"));
        assert_eq!(config.access_key_id.as_deref(), Some("explicit_ak"));
        assert_eq!(config.secret_access_key.as_deref(), Some("env_sk"));
        assert!(!config.read_only);
    }
}
