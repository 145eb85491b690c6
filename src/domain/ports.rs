use crate::domain::model::{LocalityResult, TemperatureReading};
use crate::utils::error::Result;
use crate::utils::trace::RequestContext;
use async_trait::async_trait;

/// Resolves a postal code to a locality name.
#[async_trait]
pub trait LocalityDirectory: Send + Sync {
    /// `Ok` with `found == false` means the code is unknown; `Err` is a fault.
    async fn resolve(&self, ctx: &RequestContext, code: &str) -> Result<LocalityResult>;
}

/// Current conditions for a locality.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current_temperature(
        &self,
        ctx: &RequestContext,
        locality: &str,
    ) -> Result<TemperatureReading>;
}
