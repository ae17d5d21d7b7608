pub mod builder;
pub mod discovery;
pub mod dto;
pub mod errors;
pub mod pipeline;
pub mod ports;
pub mod session;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_utils;
