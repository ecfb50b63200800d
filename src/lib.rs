pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod region;
pub mod sign;
pub mod types;

pub use auth::{Session, TokenResult};
pub use client::AqaraClient;
pub use error::{Error, Result};
pub use models::{Device, DeviceList, DeviceQuery};
pub use region::Region;
pub use sign::{Credentials, Signer};
