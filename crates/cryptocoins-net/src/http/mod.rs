//! Typed HTTP fetching with cache fallback.
//!
//! [`FetchClient`] is the single entry point. It checks connectivity,
//! validates the endpoint, performs one transport call, falls back to the
//! response cache when the call fails, and decodes the bytes into the
//! caller's type.
//!
//! # Example
//!
//! ```ignore
//! use cryptocoins_net::http::{FetchClient, Request};
//!
//! let client = FetchClient::builder().build()?;
//!
//! // Await directly
//! let coins: Vec<Coin> = client.fetch(&Request::get(endpoint)).await?;
//!
//! // Or spawn and keep a handle to cancel
//! let pending = client.spawn::<Vec<Coin>>(Request::get(endpoint));
//! pending.cancel();
//! assert!(pending.wait().await.is_err());
//! ```

mod client;
mod pending;
mod request;
mod transport;

pub use client::{FetchClient, FetchClientBuilder};
pub use pending::{PendingFetch, RequestHandle, RequestId};
pub use request::{HttpMethod, Request};
pub use transport::{
    ReqwestTransport, Transport, TransportConfig, TransportRequest, TransportResponse,
    default_user_agent,
};
