//! Closed value sets shared by the deriver, the client island and the store.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    Usd,
    Cad,
    Eur,
    Gbp,
    Jpy,
}

impl CurrencyCode {
    pub const ALL: [CurrencyCode; 5] = [
        CurrencyCode::Usd,
        CurrencyCode::Cad,
        CurrencyCode::Eur,
        CurrencyCode::Gbp,
        CurrencyCode::Jpy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CurrencyCode::Usd => "USD",
            CurrencyCode::Cad => "CAD",
            CurrencyCode::Eur => "EUR",
            CurrencyCode::Gbp => "GBP",
            CurrencyCode::Jpy => "JPY",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        CurrencyCode::ALL
            .into_iter()
            .find(|code| code.as_str() == value)
            .ok_or_else(|| DomainError::validation(format!("`{value}` is not a known currency")))
    }
}

/// Ordered location cycle walked by the client island.
///
/// The first entry doubles as the fallback for locations outside the cycle.
pub const LOCATION_CYCLE: [(&str, CurrencyCode); 5] = [
    ("US", CurrencyCode::Usd),
    ("CA", CurrencyCode::Cad),
    ("EU", CurrencyCode::Eur),
    ("UK", CurrencyCode::Gbp),
    ("JP", CurrencyCode::Jpy),
];

/// Returns the cycle entry that follows `location`.
///
/// An unmatched location resolves to the first entry, mirroring a "not found" index of -1
/// advancing to 0.
pub fn next_location(location: &str) -> (&'static str, CurrencyCode) {
    let next = LOCATION_CYCLE
        .iter()
        .position(|(code, _)| *code == location)
        .map_or(0, |index| (index + 1) % LOCATION_CYCLE.len());
    LOCATION_CYCLE[next]
}
