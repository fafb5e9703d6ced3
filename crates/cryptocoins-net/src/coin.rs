//! The coin listing model and the service that fetches it.

use serde::Deserialize;

use crate::config::FetchConfig;
use crate::error::{BuildError, Result};
use crate::http::{FetchClient, FetchClientBuilder, Request};
use crate::retry::{RetryPolicy, RetryingClient};

/// Endpoint serving the coin list when none is configured.
pub const DEFAULT_COINS_ENDPOINT: &str = "https://37656be98b8f42ae8348e4da3ee3193f.api.mockbin.io/";

/// Kind of listed asset, from the wire field `type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum CoinKind {
    /// A native coin.
    Coin,
    /// A token issued on another chain.
    Token,
    /// Any other kind, kept verbatim.
    Other(String),
}

impl From<String> for CoinKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "coin" => Self::Coin,
            "token" => Self::Token,
            _ => Self::Other(raw),
        }
    }
}

impl std::fmt::Display for CoinKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Coin => f.write_str("coin"),
            Self::Token => f.write_str("token"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// One listed crypto asset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Coin {
    /// Display name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Recently listed.
    pub is_new: bool,
    /// Currently trading.
    pub is_active: bool,
    /// Asset kind.
    #[serde(rename = "type")]
    pub kind: CoinKind,
}

/// A set of coin filter options.
///
/// A coin passes when it satisfies every selected option. The empty set
/// passes everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CoinFilter(u8);

impl CoinFilter {
    /// No filtering.
    pub const NONE: Self = Self(0);
    /// Only tokens.
    pub const TOKEN: Self = Self(1 << 0);
    /// Only coins.
    pub const COINS: Self = Self(1 << 1);
    /// Only active assets.
    pub const ACTIVE: Self = Self(1 << 2);
    /// Only inactive assets.
    pub const INACTIVE: Self = Self(1 << 3);
    /// Only new assets.
    pub const NEW: Self = Self(1 << 4);

    /// Returns true if this set contains every option in `other`.
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Returns true if no option is selected.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Add or remove an option.
    pub fn toggle(&mut self, option: Self) {
        self.0 ^= option.0;
    }

    /// Check a coin against every selected option.
    pub fn matches(self, coin: &Coin) -> bool {
        (!self.contains(Self::TOKEN) || coin.kind == CoinKind::Token)
            && (!self.contains(Self::COINS) || coin.kind == CoinKind::Coin)
            && (!self.contains(Self::ACTIVE) || coin.is_active)
            && (!self.contains(Self::INACTIVE) || !coin.is_active)
            && (!self.contains(Self::NEW) || coin.is_new)
    }

    /// Keep the coins that match.
    pub fn apply<'a>(self, coins: &'a [Coin]) -> Vec<&'a Coin> {
        coins.iter().filter(|coin| self.matches(coin)).collect()
    }
}

impl std::ops::BitOr for CoinFilter {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for CoinFilter {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Fetches the coin listing.
#[derive(Clone, Debug)]
pub struct CoinService {
    client: RetryingClient,
    endpoint: String,
}

impl CoinService {
    /// Create a service that fetches from the default endpoint without retries.
    pub fn new(client: FetchClient) -> Self {
        Self {
            client: RetryingClient::new(client, RetryPolicy::none()),
            endpoint: DEFAULT_COINS_ENDPOINT.to_string(),
        }
    }

    /// Build a service, its client and its retry policy from configuration.
    pub fn from_config(config: &FetchConfig) -> std::result::Result<Self, BuildError> {
        let client = FetchClientBuilder::from_config(config).build()?;
        Ok(Self::new(client)
            .with_endpoint(&config.coins_endpoint)
            .with_retry_policy(config.retry_policy()))
    }

    /// Fetch from a different endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Retry retryable status failures.
    pub fn with_retry_policy(self, policy: RetryPolicy) -> Self {
        Self {
            client: RetryingClient::new(self.client.inner().clone(), policy),
            endpoint: self.endpoint,
        }
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch the listing.
    pub async fn fetch_coins(&self) -> Result<Vec<Coin>> {
        self.client.fetch(&Request::get(&self.endpoint)).await
    }

    /// Case-insensitive substring search on name or symbol.
    ///
    /// An empty or blank query returns every coin.
    pub fn search<'a>(coins: &'a [Coin], query: &str) -> Vec<&'a Coin> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return coins.iter().collect();
        }
        coins
            .iter()
            .filter(|coin| {
                coin.name.to_lowercase().contains(&query)
                    || coin.symbol.to_lowercase().contains(&query)
            })
            .collect()
    }
}
