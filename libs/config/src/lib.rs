//! # Parity Engine Configuration
//!
//! Runtime settings for hosts embedding the pool math engines.
//!
//! ## Features
//!
//! - **Fee Bounds**: accepted swap fee range, converted to
//!   [`parity_types::FeeBounds`] for [`parity_types::SwapFeePercentage::with_bounds`]
//! - **Logging**: `tracing` filter directive and JSON output switch
//!
//! Solver iteration caps are fixed by the engines and are not configurable.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use parity_config::{init_tracing, EngineConfig};
//!
//! let config = EngineConfig::load(None)?;
//! init_tracing(&config.logging)?;
//! let bounds = config.fee_bounds()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod engine_config;
pub mod logging;

pub use engine_config::{EngineConfig, FeeBoundsConfig, LoggingConfig};
pub use logging::init_tracing;
