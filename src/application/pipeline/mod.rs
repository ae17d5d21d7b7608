pub mod batch_runner;
pub mod compression;
pub mod concurrency_gate;
pub mod progress;
pub mod size_resolver;
pub mod thumbnail;

pub use batch_runner::{BatchConfig, BatchRunner, BatchStats};
pub use compression::{CompressedImage, CompressionAttempt, CompressionEngine, CompressionError};
pub use concurrency_gate::{ConcurrencyGate, GatePermit};
pub use progress::{ProgressBand, ProgressSink, ScanProgress};
pub use size_resolver::{parse_content_range_total, SizeResolver, SizeSource};
pub use thumbnail::{ThumbnailConfig, ThumbnailGenerator};
