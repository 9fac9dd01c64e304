//! Home page composition.
//!
//! Every render derives the configuration afresh from the request inputs, hands a copy to the
//! client island through an explicit scope, and reads the store for the server panel.

use std::sync::Arc;

use tracing::debug;

use crate::{
    application::{
        client_state::{ClientScope, ClientState, ConfigurationError},
        error::AppError,
        preferences::PreferencesService,
    },
    domain::{
        derived::{DerivedConfig, RequestInputs},
        preferences::PreferencesSnapshot,
    },
    revalidate::{Epoch, HOME_PATH},
};

/// Everything the home template needs, by value.
#[derive(Debug, Clone)]
pub struct HomePage {
    pub environment: String,
    /// Configuration as seen by the server-rendered component.
    pub server: DerivedConfig,
    /// Initial state of the client island.
    pub client: DerivedConfig,
    pub preferences: PreferencesSnapshot,
    pub epoch: Epoch,
}

pub struct PageService {
    preferences: Arc<PreferencesService>,
    defaults: RequestInputs,
    environment: String,
}

impl PageService {
    pub fn new(
        preferences: Arc<PreferencesService>,
        defaults: RequestInputs,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            preferences,
            defaults,
            environment: environment.into(),
        }
    }

    /// Render with the configured simulated inputs.
    pub async fn render_home(&self) -> Result<HomePage, AppError> {
        self.compose_home(&self.defaults).await
    }

    pub async fn compose_home(&self, inputs: &RequestInputs) -> Result<HomePage, AppError> {
        let server = DerivedConfig::from(inputs);
        let scope = ClientScope::root().provide(ClientState::new(server.clone()));
        let client = client_island(&scope.nested())?;

        let preferences = self.preferences.get_preferences().await;
        let epoch = self.preferences.revalidator().path_epoch(HOME_PATH);

        debug!(
            target = "splitrender::render",
            geo = %inputs.geo_country_code,
            currency = %server.currency_code,
            epoch,
            "Composed home page"
        );

        Ok(HomePage {
            environment: self.environment.clone(),
            server,
            client,
            preferences,
            epoch,
        })
    }
}

fn client_island(scope: &ClientScope) -> Result<DerivedConfig, ConfigurationError> {
    Ok(scope.use_client_state()?.snapshot())
}
