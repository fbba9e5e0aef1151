// Async HTTP client for the storefront service.
//
// Owns URL construction, the HTTP verbs, and response/error decoding.
// Endpoint groups (cards, orders, workers) are implemented as inherent
// methods in their own modules to keep this one focused on transport.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

// ── Error response shape from the service ────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the storefront service.
///
/// Communicates via JSON REST endpoints rooted at `base_url`
/// (e.g. `http://localhost:8080` or `http://host/MTG-Service/`).
pub struct ShopClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ShopClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client from a base URL and transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        Ok(Self { http, base_url })
    }

    /// The service base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append path segments to the base URL, percent-encoding each one.
    ///
    /// Set names may contain spaces or slashes, so segments are never
    /// joined as raw strings.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        Self::handle_response(resp).await
    }

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, &str)],
    ) -> Result<T, Error> {
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        Self::handle_response(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    pub(crate) async fn delete(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        Self::handle_empty(resp).await
    }

    pub(crate) async fn delete_with_response<T: DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<T, Error> {
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        Self::handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        let message = match serde_json::from_str::<ErrorResponse>(&raw) {
            Ok(ErrorResponse {
                message: Some(m), ..
            }) => m,
            Ok(ErrorResponse { error: Some(e), .. }) => e,
            _ if raw.trim().is_empty() => status.to_string(),
            _ => raw,
        };

        Error::Http {
            status: status.as_u16(),
            message,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ShopClient {
        ShopClient::from_reqwest(base, reqwest::Client::new()).unwrap()
    }

    #[test]
    fn url_appends_segments_to_bare_host() {
        let c = client("http://localhost:8080");
        let url = c.url(&["card", "1", "LEB"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/card/1/LEB");
    }

    #[test]
    fn url_keeps_service_prefix() {
        let c = client("http://localhost:8080/MTG-Service/");
        let url = c.url(&["orders"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/MTG-Service/orders");
    }

    #[test]
    fn url_percent_encodes_set_names() {
        let c = client("http://localhost:8080");
        let url = c.url(&["card", "7", "Fourth Edition/EN"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/card/7/Fourth%20Edition%2FEN"
        );
    }

    #[test]
    fn rejects_non_base_urls() {
        let result = ShopClient::from_reqwest("mailto:shop@example.com", reqwest::Client::new());
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
