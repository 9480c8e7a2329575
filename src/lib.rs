//! Adapter that publishes rf projects, experiments and scene evaluations
//! to the Vision experiment-tracking API.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod vision;

pub use config::VisionConfig;
pub use error::{Result, VisionError};
pub use vision::VisionApiClient;
