pub mod ndr;
pub mod gateway;
pub mod storage;
pub mod config;
pub mod error;
pub mod utils;

pub use error::{GatewayError, NdrError, Result};
pub use config::Config;
