//! Client-owned state island.
//!
//! The server hands a copy of the derived configuration to a [`ClientState`] container and
//! never looks at it again. Containers are made available to components through an explicit
//! [`ClientScope`] chain: a scope either provides a container or inherits its parent's, and
//! resolution walks towards the root so the closest provider wins.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{derived::DerivedConfig, error::DomainError, types::CurrencyCode};
use crate::util::lock::{rw_read, rw_write};

const SOURCE: &str = "application::client_state";

/// Raised when a component asks for a container that no ancestor scope provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("container not found in ancestor scope")]
pub struct ConfigurationError;

/// Shared handle to one container; clones observe each other's mutations immediately.
#[derive(Debug, Clone)]
pub struct ClientState {
    inner: Arc<RwLock<DerivedConfig>>,
}

impl ClientState {
    pub fn new(initial: DerivedConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    pub fn snapshot(&self) -> DerivedConfig {
        rw_read(&self.inner, SOURCE, "snapshot").clone()
    }

    /// Step to the next location and its currency. Returns the new state.
    pub fn cycle_location(&self) -> DerivedConfig {
        let mut state = rw_write(&self.inner, SOURCE, "cycle_location");
        *state = state.cycled();
        state.clone()
    }

    /// Flip the login flag. Returns the new state.
    pub fn toggle_login(&self) -> DerivedConfig {
        let mut state = rw_write(&self.inner, SOURCE, "toggle_login");
        *state = state.with_login_toggled();
        state.clone()
    }
}

#[derive(Debug)]
struct ScopeNode {
    provided: Option<ClientState>,
    parent: Option<Arc<ScopeNode>>,
}

/// Explicitly threaded provider chain for client containers.
#[derive(Debug, Clone, Default)]
pub struct ClientScope {
    node: Option<Arc<ScopeNode>>,
}

impl ClientScope {
    /// A scope with no provider anywhere above it.
    pub fn root() -> Self {
        Self::default()
    }

    /// Child scope providing `state` to itself and every descendant.
    pub fn provide(&self, state: ClientState) -> Self {
        self.child(Some(state))
    }

    /// Child scope inheriting whatever its ancestors provide.
    pub fn nested(&self) -> Self {
        self.child(None)
    }

    fn child(&self, provided: Option<ClientState>) -> Self {
        Self {
            node: Some(Arc::new(ScopeNode {
                provided,
                parent: self.node.clone(),
            })),
        }
    }

    /// Resolve the closest provided container.
    pub fn use_client_state(&self) -> Result<ClientState, ConfigurationError> {
        let mut current = self.node.as_deref();
        while let Some(node) = current {
            if let Some(state) = &node.provided {
                return Ok(state.clone());
            }
            current = node.parent.as_deref();
        }
        Err(ConfigurationError)
    }
}

/// Wire form of the container as exchanged with the browser island.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSignals {
    pub is_logged_in: bool,
    pub currency_code: String,
    pub user_location: String,
}

impl From<&DerivedConfig> for ClientSignals {
    fn from(config: &DerivedConfig) -> Self {
        Self {
            is_logged_in: config.is_logged_in,
            currency_code: config.currency_code.as_str().to_string(),
            user_location: config.user_location.clone(),
        }
    }
}

impl TryFrom<ClientSignals> for DerivedConfig {
    type Error = DomainError;

    fn try_from(signals: ClientSignals) -> Result<Self, Self::Error> {
        Ok(Self {
            is_logged_in: signals.is_logged_in,
            currency_code: signals.currency_code.parse::<CurrencyCode>()?,
            user_location: signals.user_location,
        })
    }
}
