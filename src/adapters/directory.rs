use crate::adapters::join_segments;
use crate::domain::model::LocalityResult;
use crate::domain::ports::LocalityDirectory;
use crate::utils::error::{Result, WeatherError};
use crate::utils::trace::RequestContext;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use tracing::Instrument;
use url::Url;

const SERVICE: &str = "directory";

/// ViaCEP payload. Only the fields the wrapper needs.
#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    localidade: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    erro: bool,
}

// ViaCEP has sent the flag both as a JSON bool and as the string "true".
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => s.trim().eq_ignore_ascii_case("true"),
    })
}

impl From<ViaCepResponse> for LocalityResult {
    fn from(response: ViaCepResponse) -> Self {
        let name = response.localidade.trim();
        if response.erro || name.is_empty() {
            LocalityResult::not_found()
        } else {
            LocalityResult::found(name)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViaCepDirectory {
    client: Client,
    base_url: Url,
}

impl ViaCepDirectory {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    fn lookup_url(&self, code: &str) -> Result<Url> {
        join_segments(&self.base_url, &["ws", code, "json", ""])
    }

    async fn fetch(&self, code: &str) -> Result<LocalityResult> {
        let url = self.lookup_url(code)?;
        tracing::debug!("Looking up postal code at: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        tracing::debug!("Directory response status: {}", status);

        if !status.is_success() {
            return Err(WeatherError::UpstreamStatusError {
                service: SERVICE,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let parsed: ViaCepResponse = serde_json::from_slice(&body)?;
        Ok(parsed.into())
    }
}

#[async_trait]
impl LocalityDirectory for ViaCepDirectory {
    async fn resolve(&self, ctx: &RequestContext, code: &str) -> Result<LocalityResult> {
        let call = ctx.child("viacep-request");
        self.fetch(code).instrument(call.span().clone()).await
    }
}
