pub mod config;
pub mod error;
pub mod types;

pub use config::{HarnessConfig, InstrumentationConfig, SendMode};
pub use error::ThroughputError;
pub use types::{ClientId, Result};
