pub mod codec;
pub mod entitlement;
pub mod host;
pub mod transport;
