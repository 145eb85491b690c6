pub mod pipeline;

pub use crate::domain::model::{LocalityResult, TemperatureReading, WeatherResult};
pub use crate::domain::ports::{LocalityDirectory, WeatherSource};
pub use crate::utils::error::Result;
pub use pipeline::{LookupOutcome, WeatherPipeline};
