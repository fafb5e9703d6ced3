//! Logging facilities for CryptoCoins.
//!
//! CryptoCoins uses the `tracing` crate for instrumentation. Library crates
//! only emit events; to see them, install a subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("cryptocoins_net::fetch=debug,cryptocoins_net::tls=warn")
//!         .init();
//! }
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "cryptocoins_core";
    /// Task group target.
    pub const SYNC: &str = "cryptocoins_core::sync";
    /// Fetch pipeline target.
    pub const FETCH: &str = "cryptocoins_net::fetch";
    /// Response cache target.
    pub const CACHE: &str = "cryptocoins_net::cache";
    /// Certificate pinning target.
    pub const TLS: &str = "cryptocoins_net::tls";
    /// Connectivity checks target.
    pub const CONNECTIVITY: &str = "cryptocoins_net::connectivity";
    /// Retry wrapper target.
    pub const RETRY: &str = "cryptocoins_net::retry";
}
