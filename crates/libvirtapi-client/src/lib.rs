// # libvirtApi HTTP client
//
// This crate implements the `NetworkApi` and `LoadBalancerApi` traits of
// `libvirtapi-core` against the libvirtApi REST service.
//
// ## Behaviour
//
// - One HTTP request per trait call, bounded by the configured timeout
// - HTTP basic auth with the resolved username and password
// - Non-2xx responses become `Error::Api` carrying the status and raw body
// - A 404 on a GET is the `Lookup::NotFound` outcome, not an error
// - Malformed 2xx bodies become `Error::Decode`
// - No retry, no backoff, no caching
//
// ## Security Requirements
//
// - The password NEVER appears in logs or `Debug` output
//
// ## API Reference
//
// - Create network: POST `/api/network`
// - Get / delete network: GET / DELETE `/api/network/:id`
// - Create load balancer: POST `/api/loadbalancer`
// - Get / update / delete load balancer: GET / PUT / DELETE
//   `/api/loadbalancer/:namespace/:name`

use async_trait::async_trait;
use libvirtapi_core::config::{ClientSettings, ProviderConfig};
use libvirtapi_core::model::{LoadBalancer, LoadBalancerKey, NewNetwork, Network};
use libvirtapi_core::traits::{LoadBalancerApi, Lookup, NetworkApi};
use libvirtapi_core::{Error, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Body of a successful load balancer create
#[derive(Debug, Deserialize)]
struct CreatedLoadBalancer {
    #[serde(default)]
    ip: Option<String>,
}

/// libvirtApi REST client
///
/// Cloning is cheap: clones share one connection pool, so a single client
/// can serve many concurrent reconciliations.
///
/// # Security
///
/// The Debug implementation does NOT expose the password.
#[derive(Clone)]
pub struct LibvirtApiClient {
    /// Base URL, username, password and timeout
    settings: ClientSettings,

    /// Parsed base URL
    base: Url,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for LibvirtApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibvirtApiClient")
            .field("host", &self.settings.host)
            .field("username", &self.settings.username)
            .field("password", &"<REDACTED>")
            .field("timeout", &self.settings.timeout)
            .finish()
    }
}

impl LibvirtApiClient {
    /// Create a client from resolved settings
    ///
    /// # Returns
    ///
    /// - `Ok(LibvirtApiClient)`: Ready to use; no request has been made
    /// - `Err(Error::Config)`: Invalid settings or the HTTP client could not be built
    pub fn new(settings: ClientSettings) -> Result<Self> {
        settings.validate()?;

        let base = Url::parse(&settings.host).map_err(|e| {
            Error::config(format!("invalid libvirtApi hostname {}: {}", settings.host, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(Error::config(format!(
                "libvirtApi hostname cannot be used as a base URL: {}",
                settings.host
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            settings,
            base,
            client,
        })
    }

    /// Resolve a declared provider configuration and build a client from it
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let settings = config.resolve()?;
        tracing::info!("Configured libvirtApi client for {}", settings.host);
        Self::new(settings)
    }

    /// Resolved settings this client was built from
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Build `{host}/api/{segments...}`, escaping each segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::config("libvirtApi hostname cannot be used as a base URL"))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.settings.username, Some(&self.settings.password))
            .header(CONTENT_TYPE, "application/json")
    }

    /// Send a request and return the body of a 2xx response
    ///
    /// With `allow_not_found`, a 404 yields `Ok(None)` instead of an error.
    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        allow_not_found: bool,
    ) -> Result<Option<String>> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::transport(format!(
                    "request timed out after {:?}: {}",
                    self.settings.timeout, e
                ))
            } else {
                Error::transport(format!("HTTP request failed: {}", e))
            }
        })?;

        let status = response.status();
        if allow_not_found && status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            tracing::debug!("libvirtApi answered {}: {}", status, body);
            return Err(Error::api(status.as_u16(), body));
        }

        Ok(Some(body))
    }

    async fn send_expecting_body(&self, builder: reqwest::RequestBuilder) -> Result<String> {
        // Without allow_not_found every non-2xx is already an error.
        Ok(self.send(builder, false).await?.unwrap_or_default())
    }

    fn decode<T: DeserializeOwned>(what: &str, body: &str) -> Result<T> {
        serde_json::from_str(body).map_err(|e| Error::decode(what, e))
    }

    fn load_balancer_url(&self, key: &LoadBalancerKey) -> Result<Url> {
        self.endpoint(&["loadbalancer", &key.namespace, &key.name])
    }
}

#[async_trait]
impl NetworkApi for LibvirtApiClient {
    async fn create_network(&self, payload: &NewNetwork) -> Result<Network> {
        let url = self.endpoint(&["network"])?;
        tracing::debug!("POST {} name={}", url, payload.name);

        let body = self
            .send_expecting_body(self.request(Method::POST, url).json(payload))
            .await?;
        Self::decode("network", &body)
    }

    async fn get_network(&self, id: i64) -> Result<Lookup<Network>> {
        let url = self.endpoint(&["network", &id.to_string()])?;
        tracing::debug!("GET {}", url);

        match self.send(self.request(Method::GET, url), true).await? {
            Some(body) => Ok(Lookup::Found(Self::decode("network", &body)?)),
            None => Ok(Lookup::NotFound),
        }
    }

    async fn delete_network(&self, id: i64) -> Result<()> {
        let url = self.endpoint(&["network", &id.to_string()])?;
        tracing::debug!("DELETE {}", url);

        self.send_expecting_body(self.request(Method::DELETE, url))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LoadBalancerApi for LibvirtApiClient {
    async fn create_load_balancer(&self, payload: &LoadBalancer) -> Result<String> {
        let url = self.endpoint(&["loadbalancer"])?;
        tracing::debug!("POST {} key={}", url, payload.key());

        let body = self
            .send_expecting_body(self.request(Method::POST, url).json(payload))
            .await?;
        let created: CreatedLoadBalancer = Self::decode("load balancer", &body)?;

        match created.ip {
            Some(ip) if !ip.is_empty() => Ok(ip),
            _ => Err(Error::decode(
                "load balancer",
                format!("create response carried no ip: {}", body),
            )),
        }
    }

    async fn get_load_balancer(&self, key: &LoadBalancerKey) -> Result<Lookup<LoadBalancer>> {
        let url = self.load_balancer_url(key)?;
        tracing::debug!("GET {}", url);

        match self.send(self.request(Method::GET, url), true).await? {
            Some(body) => Ok(Lookup::Found(Self::decode("load balancer", &body)?)),
            None => Ok(Lookup::NotFound),
        }
    }

    async fn update_load_balancer(&self, payload: &LoadBalancer) -> Result<()> {
        let url = self.load_balancer_url(&payload.key())?;
        tracing::debug!(
            "PUT {} ({} ports, {} nodes)",
            url,
            payload.ports.len(),
            payload.nodes.len()
        );

        self.send_expecting_body(self.request(Method::PUT, url).json(payload))
            .await?;
        Ok(())
    }

    async fn delete_load_balancer(&self, key: &LoadBalancerKey) -> Result<()> {
        let url = self.load_balancer_url(key)?;
        tracing::debug!("DELETE {}", url);

        self.send_expecting_body(self.request(Method::DELETE, url))
            .await?;
        Ok(())
    }
}
