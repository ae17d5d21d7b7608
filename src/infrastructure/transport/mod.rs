mod http;
mod local;
mod routing;

pub use http::{HttpTransport, HttpTransportOptions};
pub use local::LocalFileTransport;
pub use routing::RoutingTransport;
