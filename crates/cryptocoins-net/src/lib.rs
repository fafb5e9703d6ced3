//! Resilient typed HTTP fetching for CryptoCoins.
//!
//! This crate provides the networking layer of the app:
//!
//! - **Fetch client**: One typed `fetch` operation with a strictly ordered
//!   pipeline (connectivity, URL validation, transport, cache fallback, decode)
//! - **Certificate pinning**: Every TLS connection must present one pinned
//!   leaf certificate, failing closed when the pin is missing
//! - **Response cache**: Memory and disk tiers holding the last good body per
//!   endpoint, used only when the network fails
//! - **Retry**: An opt-in wrapper retrying transient server statuses
//! - **Connectivity**: Interface-based reachability with change monitoring
//!
//! # Fetching
//!
//! ```ignore
//! use cryptocoins_net::http::{FetchClient, Request};
//! use cryptocoins_net::tls::PinSource;
//!
//! let client = FetchClient::builder()
//!     .pinned_certificate(PinSource::file("certs/myserver.cer"))
//!     .build()?;
//!
//! let coins: Vec<Coin> = client
//!     .fetch(&Request::get("https://api.example.com/coins"))
//!     .await?;
//! ```
//!
//! # Error Handling
//!
//! Failures are classified into [`NetworkError`]:
//!
//! ```ignore
//! match client.fetch::<Vec<Coin>>(&request).await {
//!     Ok(coins) => show(coins),
//!     Err(NetworkError::Transport(TransportError::NotConnected)) => show_offline(),
//!     Err(NetworkError::Transport(cause)) => show_error(cause),
//!     Err(NetworkError::Decode(err)) => report(err.path),
//!     Err(NetworkError::None) => unreachable!(),
//! }
//! ```
//!
//! # Configuration
//!
//! ```ignore
//! let config = FetchConfig::from_file("cryptocoins.toml")?;
//! let service = CoinService::from_config(&config)?;
//! let coins = service.fetch_coins().await?;
//! ```

pub mod cache;
pub mod coin;
pub mod config;
pub mod connectivity;
pub mod decode;
mod error;
pub mod http;
pub mod retry;
pub mod tls;

pub use cache::{ResponseCache, TieredCache};
pub use coin::{Coin, CoinFilter, CoinKind, CoinService};
pub use config::{ConfigError, FetchConfig};
pub use connectivity::{AlwaysConnected, ConnectivityGuard, NetworkMonitor, StaticConnectivity};
pub use decode::{DecodeError, DecodeErrorKind, Decoder, JsonDecoder};
pub use error::{BuildError, NetworkError, Result, TransportError};
pub use http::{FetchClient, FetchClientBuilder, HttpMethod, PendingFetch, Request, RequestHandle};
pub use retry::{RetryPolicy, RetryingClient};
pub use tls::{PinSource, PinnedCertificate, TlsConfig, TrustValidator};
