//! HTTP module containing client setup and credential loading.
//!
//! - [`client`] - HTTP client creation and middleware configuration
//! - [`credentials`] - Headers loaded from a JSON credentials file
//!
//! # Examples
//!
//! ```rust,no_run
//! use imgfetch::http::{create_http_client, Credentials, HttpClientConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let headers = Credentials::load_header_map("credentials.json").await?;
//! let client = create_http_client(HttpClientConfig {
//!     headers: Some(headers),
//!     ..HttpClientConfig::default()
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod credentials;

pub use client::{create_http_client, HttpClientConfig};
pub use credentials::{Credentials, DEFAULT_CREDENTIALS_PATH};
