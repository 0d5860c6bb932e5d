//! Amadeus Self-Service client: OAuth2 session + flight offers + locations.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;

use super::FlightProvider;
use crate::core::error::{CredentialError, ProviderError};
use crate::domain::normalize::RawFlightOffersResponse;
use crate::domain::query::FlightQuery;
use crate::infra::config::ProviderConfig;
use crate::infra::http::headers::add_standard_headers;
use crate::infra::runtime::limits::make_http_client;

const TOKEN_PATH: &str = "/v1/security/oauth2/token";
const FLIGHT_OFFERS_PATH: &str = "/v2/shopping/flight-offers";
const LOCATIONS_PATH: &str = "/v1/reference-data/locations";

/// Tokens are treated as expired this long before the provider says so.
const EXPIRY_SKEW: Duration = Duration::from_secs(30);

pub const CLIENT_ID_VAR: &str = "AMADEUS_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "AMADEUS_CLIENT_SECRET";

/// Validated client credentials. Checking them performs no network I/O.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    pub fn new(client_id: &str, client_secret: &str) -> Result<Self, CredentialError> {
        Ok(Self {
            client_id: check_credential(CLIENT_ID_VAR, client_id)?,
            client_secret: check_credential(CLIENT_SECRET_VAR, client_secret)?,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

fn check_credential(name: &'static str, raw: &str) -> Result<String, CredentialError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(CredentialError::Missing(name));
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(CredentialError::Malformed(name));
    }
    Ok(value.to_string())
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + EXPIRY_SKEW < self.expires_at
    }
}

/// Credentials plus the cached bearer token.
///
/// The mutex is held across a refresh, so concurrent callers wait for the
/// in-flight refresh instead of starting their own. The slot is written only
/// once a refresh has fully succeeded.
struct Session {
    credentials: Credentials,
    token: Mutex<Option<AccessToken>>,
}

#[derive(Clone)]
pub struct AmadeusClient {
    base: String,
    http: Client,
    session: Arc<Session>,
}

#[derive(Deserialize)]
struct TokenWire {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Deserialize)]
struct LocationsWire {
    #[serde(default)]
    data: Vec<JsonValue>,
}

impl AmadeusClient {
    pub fn new(cfg: &ProviderConfig, credentials: Credentials) -> Result<Self, ProviderError> {
        let http = make_http_client(cfg)
            .map_err(|e| ProviderError::Permanent(format!("cannot build http client: {e}")))?;
        Ok(Self {
            base: cfg.base_url.trim_end_matches('/').to_string(),
            http,
            session: Arc::new(Session {
                credentials,
                token: Mutex::new(None),
            }),
        })
    }

    /// Current bearer token, refreshing it first if needed.
    async fn bearer(&self) -> Result<String, ProviderError> {
        let mut slot = self.session.token.lock().await;
        if let Some(token) = slot.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }
        let fresh = self.fetch_token().await?;
        let value = fresh.value.clone();
        *slot = Some(fresh);
        Ok(value)
    }

    /// Drop the cached token if it is still the one that was rejected.
    async fn invalidate(&self, rejected: &str) {
        let mut slot = self.session.token.lock().await;
        if slot.as_ref().is_some_and(|t| t.value == rejected) {
            *slot = None;
        }
    }

    async fn fetch_token(&self) -> Result<AccessToken, ProviderError> {
        let url = format!("{}{}", self.base, TOKEN_PATH);
        let creds = &self.session.credentials;
        tracing::debug!(endpoint = %url, client_id = %creds.client_id, "amadeus token refresh");
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
        ];
        let (builder, _rid) = add_standard_headers(self.http.post(url), None);
        let resp = builder.form(&form).send().await.map_err(classify_transport)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(%status, "amadeus token refresh rejected");
            return Err(classify_status(status, &body));
        }
        let wire: TokenWire = resp.json().await.map_err(classify_decode)?;
        let expires_at = Instant::now()
            .checked_add(Duration::from_secs(wire.expires_in))
            .ok_or_else(|| {
                ProviderError::Permanent(format!(
                    "token lifetime out of range: expires_in={}",
                    wire.expires_in
                ))
            })?;
        Ok(AccessToken {
            value: wire.access_token,
            expires_at,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        op: &'static str,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, ProviderError> {
        let start = Instant::now();
        let res = self.get_json_inner(path, query).await;
        match &res {
            Ok(_) => {
                let elapsed_ms = start.elapsed().as_millis() as f64;
                crate::infra::logging::log_metric(op, "provider_latency_ms", elapsed_ms);
            }
            Err(e) => {
                tracing::warn!(op, error = %e, transient = e.is_transient(), "amadeus call failed");
                crate::infra::logging::log_metric(op, "provider_error_total", 1.0);
            }
        }
        res
    }

    async fn get_json_inner<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, ProviderError> {
        let token = self.bearer().await?;
        let url = format!("{}{}", self.base, path);
        let (builder, rid) =
            add_standard_headers(self.http.get(&url).query(query).bearer_auth(&token), None);
        tracing::debug!(endpoint = %url, request_id = %rid, "amadeus request");
        let resp = builder.send().await.map_err(classify_transport)?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            self.invalidate(&token).await;
            return Err(ProviderError::Transient(
                "access token rejected by provider; session reset".into(),
            ));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }
        resp.json::<T>().await.map_err(classify_decode)
    }
}

#[async_trait]
impl FlightProvider for AmadeusClient {
    async fn flight_offers(&self, query: &FlightQuery) -> Result<RawFlightOffersResponse, ProviderError> {
        self.get_json("flight_offers", FLIGHT_OFFERS_PATH, &query.to_pairs())
            .await
    }

    async fn airport(&self, code: &str) -> Result<Option<JsonValue>, ProviderError> {
        let query = [("subType", "AIRPORT".to_string()), ("keyword", code.to_string())];
        let body: LocationsWire = self.get_json("airport", LOCATIONS_PATH, &query).await?;
        Ok(body
            .data
            .into_iter()
            .find(|loc| loc.get("iataCode").and_then(JsonValue::as_str) == Some(code)))
    }
}

fn classify_transport(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() || e.is_connect() || e.is_request() {
        ProviderError::Transient(e.to_string())
    } else {
        ProviderError::Permanent(e.to_string())
    }
}

fn classify_decode(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Transient(e.to_string())
    } else {
        ProviderError::Permanent(format!("undecodable provider response: {e}"))
    }
}

fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    let detail = provider_message(body).unwrap_or_else(|| "no details".into());
    let msg = format!("upstream status {status}: {detail}");
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        ProviderError::Transient(msg)
    } else {
        ProviderError::Permanent(msg)
    }
}

/// Pull a human-readable message out of an Amadeus error body.
fn provider_message(body: &str) -> Option<String> {
    let v: JsonValue = serde_json::from_str(body).ok()?;
    if let Some(first) = v.get("errors").and_then(|e| e.get(0)) {
        let title = first.get("title").and_then(JsonValue::as_str).unwrap_or("");
        let detail = first.get("detail").and_then(JsonValue::as_str).unwrap_or("");
        let joined = [title, detail]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(": ");
        return (!joined.is_empty()).then_some(joined);
    }
    v.get("error_description")
        .or_else(|| v.get("error"))
        .and_then(JsonValue::as_str)
        .map(str::to_string)
}
