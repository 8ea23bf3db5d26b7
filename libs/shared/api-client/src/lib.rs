pub mod client;
pub mod credentials;
pub mod error;
pub mod jwt;

pub use client::ApiClient;
pub use credentials::Credentials;
pub use error::{app_error, ApiError};
