use crate::domain::model::PostalCodeRequest;
use crate::utils::error::Result;
use crate::utils::trace::RequestContext;
use axum::body::Bytes;
use reqwest::header::{HeaderMap, HeaderName, CACHE_CONTROL, CONTENT_LANGUAGE, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use tracing::Instrument;
use url::Url;

/// Response headers copied from the wrapper back to the caller. Anything else
/// (hop-by-hop, server internals) stays behind.
pub const RELAYED_HEADERS: [HeaderName; 3] = [CONTENT_TYPE, CONTENT_LANGUAGE, CACHE_CONTROL];

/// The wrapper's answer, passed back to the caller untouched.
#[derive(Debug, Clone)]
pub struct RelayedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub fn relay_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut relayed = HeaderMap::new();
    for name in RELAYED_HEADERS.iter() {
        for value in upstream.get_all(name) {
            relayed.append(name.clone(), value.clone());
        }
    }
    relayed
}

/// Client for the wrapper service.
#[derive(Debug, Clone)]
pub struct WrapperClient {
    client: Client,
    endpoint: Url,
}

impl WrapperClient {
    pub fn new(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    /// POST the request to the wrapper, carrying `ctx`'s trace context.
    pub async fn forward(
        &self,
        ctx: &RequestContext,
        request: &PostalCodeRequest,
    ) -> Result<RelayedResponse> {
        let call = ctx.child("wrapper-request");
        self.send(&call, request)
            .instrument(call.span().clone())
            .await
    }

    async fn send(&self, call: &RequestContext, request: &PostalCodeRequest) -> Result<RelayedResponse> {
        let mut headers = HeaderMap::new();
        call.inject(&mut headers);

        tracing::debug!("Forwarding to wrapper at: {}", self.endpoint);
        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(headers)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Wrapper response status: {}", status);

        let headers = relay_headers(response.headers());
        let body = response.bytes().await?;
        Ok(RelayedResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, CONNECTION, TRANSFER_ENCODING};

    #[test]
    fn test_relay_headers_allow_list() {
        let mut upstream = HeaderMap::new();
        upstream.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        upstream.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        upstream.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        upstream.insert("x-internal-host", HeaderValue::from_static("wrapper-7f9c"));

        let relayed = relay_headers(&upstream);
        assert_eq!(relayed.len(), 1);
        assert_eq!(relayed[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_relay_headers_keeps_repeated_values() {
        let mut upstream = HeaderMap::new();
        upstream.append(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        upstream.append(CACHE_CONTROL, HeaderValue::from_static("private"));

        let relayed = relay_headers(&upstream);
        let values: Vec<&str> = relayed
            .get_all(CACHE_CONTROL)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values, vec!["no-store", "private"]);
    }

    #[test]
    fn test_relay_headers_empty() {
        assert!(relay_headers(&HeaderMap::new()).is_empty());
    }
}
