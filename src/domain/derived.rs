//! Configuration derived from the (simulated) request context on every render.

use serde::Serialize;

use super::types::{CurrencyCode, next_location};

/// Request-scoped inputs the deriver reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInputs {
    pub auth_token: bool,
    pub geo_country_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedConfig {
    pub is_logged_in: bool,
    pub currency_code: CurrencyCode,
    pub user_location: String,
}

impl DerivedConfig {
    /// Advance to the next `(location, currency)` pair of the location cycle.
    pub fn cycled(&self) -> Self {
        let (location, currency) = next_location(&self.user_location);
        Self {
            is_logged_in: self.is_logged_in,
            currency_code: currency,
            user_location: location.to_string(),
        }
    }

    pub fn with_login_toggled(&self) -> Self {
        Self {
            is_logged_in: !self.is_logged_in,
            ..self.clone()
        }
    }
}

/// Derive the page configuration. Total and side-effect free; never cached across renders.
pub fn derive_config(auth_token: bool, geo_country_code: &str) -> DerivedConfig {
    let currency_code = if geo_country_code == "CA" {
        CurrencyCode::Cad
    } else {
        CurrencyCode::Usd
    };

    DerivedConfig {
        is_logged_in: auth_token,
        currency_code,
        user_location: geo_country_code.to_string(),
    }
}

impl From<&RequestInputs> for DerivedConfig {
    fn from(inputs: &RequestInputs) -> Self {
        derive_config(inputs.auth_token, &inputs.geo_country_code)
    }
}
