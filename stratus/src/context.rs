use std::time::Duration;

use stratus_core::{Context, Error, OsEnv, Result};
use stratus_http_send_reqwest::ReqwestHttpSend;

/// Per-request deadline of the default transport.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// How long a connect may take before the endpoint counts as unreachable.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Build a [`Context`] wired for production use: a reqwest-backed HTTP
/// transport with a 300 second request deadline and a 5 second connect
/// timeout, plus the process environment.
///
/// # Example
///
/// ```no_run
/// # fn main() -> stratus::Result<()> {
/// let ctx = stratus::default_context()?;
/// # let _ = ctx;
/// # Ok(())
/// # }
/// ```
pub fn default_context() -> Result<Context> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| Error::config_invalid("failed to build HTTP client").with_source(e))?;
    Ok(Context::new()
        .with_http_send(ReqwestHttpSend::new(client))
        .with_env(OsEnv))
}
