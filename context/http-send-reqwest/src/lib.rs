//! Production HTTP transport for stratus drivers, backed by [`reqwest`].

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::BodyExt;
use reqwest::{Client, ClientBuilder, Proxy, Request};
use stratus_core::{Error, HttpSend, Result};

/// [`HttpSend`] implementation on a shared `reqwest::Client`.
#[derive(Debug, Default)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a transport that gives up on a request after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::build(Client::builder().timeout(timeout))
    }

    /// Build a transport with a request timeout, routed through `proxy`.
    pub fn with_timeout_and_proxy(timeout: Duration, proxy: Proxy) -> Result<Self> {
        Self::build(Client::builder().timeout(timeout).proxy(proxy))
    }

    fn build(builder: ClientBuilder) -> Result<Self> {
        let client = builder
            .build()
            .map_err(|e| Error::config_invalid("failed to build HTTP client").with_source(e))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let req = Request::try_from(req)
            .map_err(|e| Error::transport("invalid outgoing request").with_source(e))?;
        let resp: http::Response<_> = self
            .client
            .execute(req)
            .await
            .map_err(|e| Error::transport("request failed").with_source(e))?
            .into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(|e| Error::transport("failed to read response body").with_source(e))?;
        Ok(http::Response::from_parts(parts, bs))
    }
}
