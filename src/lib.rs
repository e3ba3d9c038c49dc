pub mod algo;
pub mod config;
pub mod error;
pub mod model;
pub mod ops;
pub mod session;

#[cfg(feature = "mcp")]
pub mod mcp;

pub use config::AnalyticsConfig;
pub use error::AnalyticsError;
pub use session::ReportView;
