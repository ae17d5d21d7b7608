//! Discovery of image references on the canvas and in the content repository

mod extract;
mod scanner;

pub use extract::{field_address, is_populated, node_address, ExtractionError};
pub use scanner::{deduplicate, DiscoveryError, DiscoveryOutcome, DiscoveryScanner, ScannerConfig};
