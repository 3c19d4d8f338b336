use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use bytes::Bytes;
use chrono::FixedOffset;
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::OnceCell;

use stratus_core::model::Capability;
use stratus_core::time::{self, DateTime};
use stratus_core::utils::Redact;
use stratus_core::{hash, value, Context, Error, Result};

use crate::config::Config;
use crate::constants::*;
use crate::region::{Region, RegionPayload};
use crate::response;

/// Signed client for one BingoCloud account.
///
/// The client is cheap to clone; every resource adapter holds one and
/// funnels its calls through [`Client::invoke`].
#[derive(Clone)]
pub struct Client {
    pub(crate) ctx: Context,
    endpoint: String,
    host: String,
    path: String,
    access_key_id: String,
    secret_access_key: String,
    read_only: bool,
    regions: Vec<RegionPayload>,
    user: Arc<OnceCell<String>>,
    time: Option<DateTime>,
}

impl Client {
    /// Build a client from `config`, probing the endpoint and caching the
    /// account's region list.
    ///
    /// Fails fast when a required field is missing, the endpoint does not
    /// parse, or the endpoint does not answer at all.
    pub async fn new(config: Config, ctx: Context) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| Error::config_invalid("endpoint is required"))?;
        let access_key_id = config
            .access_key_id
            .clone()
            .ok_or_else(|| Error::config_invalid("access_key_id is required"))?;
        let secret_access_key = config
            .secret_access_key
            .clone()
            .ok_or_else(|| Error::config_invalid("secret_access_key is required"))?;

        let (host, path) = split_endpoint(&endpoint)?;

        probe(&ctx, &endpoint).await?;

        let mut client = Client {
            ctx,
            endpoint,
            host,
            path,
            access_key_id,
            secret_access_key,
            read_only: config.read_only,
            regions: Vec::new(),
            user: Arc::new(OnceCell::new()),
            time: None,
        };
        client.regions = client.describe_regions().await?;
        Ok(client)
    }

    /// All regions the account can reach.
    pub fn regions(&self) -> Vec<Region> {
        self.regions
            .iter()
            .map(|payload| self.region_from(payload.clone()))
            .collect()
    }

    /// One region by id. The empty id picks the first region, which is
    /// what single-region deployments report.
    pub fn region(&self, id: &str) -> Result<Region> {
        for payload in &self.regions {
            if payload.region_id == id {
                return Ok(self.region_from(payload.clone()));
            }
        }
        if id.is_empty() {
            if let Some(payload) = self.regions.first() {
                return Ok(self.region_from(payload.clone()));
            }
        }
        Err(Error::not_found(format!("region {id}")))
    }

    /// What this provider can drive.
    pub fn capabilities(&self) -> Vec<Capability> {
        vec![
            Capability::Compute,
            Capability::Network,
            Capability::SecurityGroup,
            Capability::Eip,
            Capability::Loadbalancer,
            Capability::ObjectStore,
        ]
    }

    /// Owner id of the account, resolved from the quota listing on first
    /// use and cached for the lifetime of the client.
    ///
    /// Resolution failures degrade to an empty owner so that listings on
    /// accounts without quota access still work, just unfiltered.
    pub(crate) async fn account_user(&self) -> String {
        self.user
            .get_or_init(|| async {
                match self.fetch_owner_id().await {
                    Ok(owner) => owner,
                    Err(err) => {
                        debug!("failed to resolve account owner: {err:?}");
                        String::new()
                    }
                }
            })
            .await
            .clone()
    }

    async fn fetch_owner_id(&self) -> Result<String> {
        let resp = self.invoke("DescribeQuotas", Vec::new()).await?;
        let quotas: Vec<QuotaPayload> = value::decode_list_at(&resp, &["quotaSet"])?;
        Ok(quotas.first().map(|q| q.owner_id.clone()).unwrap_or_default())
    }

    async fn describe_regions(&self) -> Result<Vec<RegionPayload>> {
        let resp = self.invoke("DescribeRegions", Vec::new()).await?;
        value::decode_list_at(&resp, &["regionInfo"])
    }

    fn region_from(&self, payload: RegionPayload) -> Region {
        Region {
            client: self.clone(),
            payload,
        }
    }

    /// Send one signed query call and return the decoded, normalized
    /// response with the `<Action>Response` wrapper already removed.
    pub(crate) async fn invoke(&self, action: &str, params: Vec<(String, String)>) -> Result<Value> {
        if self.read_only && !is_read_call(action) {
            return Err(Error::account_read_only(format!(
                "{action} is not allowed on a read-only account"
            )));
        }

        let mut query = self.build_query(action, &params);
        let signature = self.sign(&query);
        push_pair(&mut query, "Signature", &signature);

        let req = http::Request::post(&self.endpoint)
            .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Bytes::from(query))?;
        let resp = self.ctx.http_send_as_string(req).await?;

        let tree = response::normalize(stratus_core::xml::from_xml(resp.body())?);
        debug!("{} response: {}", action, &tree);
        response::check_provider_error(&tree)?;
        Ok(response::unwrap_action(tree, action))
    }

    /// Assemble the unsigned query string: the action, the caller's
    /// parameters, then the protocol fields, each pair form-encoded.
    fn build_query(&self, action: &str, params: &[(String, String)]) -> String {
        let mut query = String::new();
        push_pair(&mut query, "Action", action);
        for (k, v) in params {
            push_pair(&mut query, k, v);
        }

        let time = self.time.unwrap_or_else(time::now);
        let timestamp = time::format_millis_z(time, provider_offset());
        push_pair(&mut query, "Timestamp", &timestamp);
        push_pair(&mut query, "AWSAccessKeyId", &self.access_key_id);
        push_pair(&mut query, "Version", API_VERSION);
        push_pair(&mut query, "SignatureVersion", SIGNATURE_VERSION);
        push_pair(&mut query, "SignatureMethod", SIGNATURE_METHOD);
        query
    }

    /// Canonical text covered by the signature: the method, the endpoint
    /// authority and path, then the query pairs sorted by parameter name.
    fn string_to_sign(&self, query: &str) -> String {
        let mut items: Vec<&str> = query.split('&').collect();
        items.sort_by_key(|item| (item.split('=').next().unwrap_or(""), *item));
        format!("POST\n{}\n{}\n{}", self.host, self.path, items.join("&"))
    }

    fn sign(&self, query: &str) -> String {
        let string_to_sign = self.string_to_sign(query);
        debug!("string to sign: {}", &string_to_sign);
        hash::base64_hmac_sha256(self.secret_access_key.as_bytes(), string_to_sign.as_bytes())
    }

    /// Specify the signing time.
    ///
    /// This is used for testing only.
    #[cfg(test)]
    pub(crate) fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }
}

impl Debug for Client {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

/// Reachability check sent before the first signed call. Any answer
/// counts; only a transport-level failure marks the endpoint bad.
async fn probe(ctx: &Context, endpoint: &str) -> Result<()> {
    let req = http::Request::get(endpoint).body(Bytes::new())?;
    ctx.http_send(req).await.map_err(|e| {
        Error::config_invalid(format!("endpoint `{endpoint}` is not accessible")).with_source(e)
    })?;
    Ok(())
}

/// Split the endpoint into the authority and path covered by the
/// signature. An endpoint without a path signs as `/`.
fn split_endpoint(endpoint: &str) -> Result<(String, String)> {
    let uri: http::Uri = endpoint.parse()?;
    let host = uri
        .authority()
        .map(|a| a.to_string())
        .ok_or_else(|| Error::config_invalid(format!("endpoint `{endpoint}` has no host")))?;
    let path = match uri.path() {
        "" => "/".to_string(),
        p => p.to_string(),
    };
    Ok((host, path))
}

fn is_read_call(action: &str) -> bool {
    action.starts_with("Get") || action.starts_with("List") || action.starts_with("Describe")
}

fn provider_offset() -> FixedOffset {
    // SAFETY: the provider offset is a constant well inside the valid range.
    FixedOffset::east_opt(PROVIDER_UTC_OFFSET_SECS).unwrap()
}

fn push_pair(query: &mut String, key: &str, value: &str) {
    if !query.is_empty() {
        query.push('&');
    }
    let pair = form_urlencoded::Serializer::new(String::new())
        .append_pair(key, value)
        .finish();
    query.push_str(&pair);
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct QuotaPayload {
    owner_id: String,
}

#[cfg(test)]
pub(crate) fn test_client(ctx: Context) -> Client {
    Client {
        ctx,
        endpoint: "http://10.0.0.1:8080/api".to_string(),
        host: "10.0.0.1:8080".to_string(),
        path: "/api".to_string(),
        access_key_id: "AKIDEXAMPLE".to_string(),
        secret_access_key: "SECRETEXAMPLE".to_string(),
        read_only: false,
        regions: Vec::new(),
        user: Arc::new(OnceCell::new()),
        time: None,
    }
}
