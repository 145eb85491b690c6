pub mod error;
pub mod logger;
pub mod trace;
pub mod validation;
