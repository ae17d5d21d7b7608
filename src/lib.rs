//! # asset_budget - Image Asset Discovery and Optimization
//!
//! Finds every raster image a document references, on its visual canvas and
//! in its structured content repository, measures transfer sizes with as
//! little traffic as possible, and re-encodes assets that exceed a byte
//! budget while keeping the best achievable quality.
//!
//! ## Architecture Layers
//!
//! - **Domain**: Asset descriptors, lifecycle state, compression policy, classification rules
//! - **Application**: Ports, pipeline components (gate, resolver, thumbnails, batching,
//!   compression search), discovery, use cases and the [`AssetSession`] facade
//! - **Infrastructure**: HTTP/local transport, JPEG codec, project-file host
//!
//! ## Example Usage
//!
//! ```no_run
//! use asset_budget::{application::builder::SessionBuilder, infrastructure::host::ProjectFileHost, Config};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let config = Config::from_env();
//! let host = Arc::new(ProjectFileHost::open("project.yaml", "optimized").await?);
//! let session = SessionBuilder::new(config.clone())
//!     .with_project(host)
//!     .with_default_adapters(".")?
//!     .build()?;
//!
//! let report = session.run_scan().await?;
//! println!("{}", report.summary(config.budget_bytes));
//! let summary = session.optimize_all(config.budget_bytes).await;
//! println!("saved {} bytes", summary.bytes_saved());
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export key types explicitly to avoid ambiguity
pub use application::session::AssetSession;
pub use application::{dto, ports, use_cases};
pub use config::Config;
pub use domain::errors as domain_errors;
pub use domain::{entities, value_objects};
