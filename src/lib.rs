pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{OrchestratorCli, OrchestratorSettings, TomlConfig, WrapperCli, WrapperSettings};
pub use core::{LookupOutcome, WeatherPipeline};
pub use utils::error::{Result, WeatherError};
