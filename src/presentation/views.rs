use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::{
        client_state::ClientSignals,
        error::HttpError,
        page::HomePage,
    },
    domain::{derived::DerivedConfig, preferences::PreferencesSnapshot, types::CurrencyCode},
};

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_document<T: Template>(
    template: &T,
    source: &'static str,
) -> Result<String, TemplateRenderError> {
    template
        .render()
        .map_err(|err| TemplateRenderError::new(source, "Template rendering failed", err))
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_document(&template, "presentation::views::render_template_response") {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

#[derive(Clone)]
pub struct ConfigView {
    pub is_logged_in: bool,
    pub currency_code: &'static str,
    pub user_location: String,
}

impl From<&DerivedConfig> for ConfigView {
    fn from(config: &DerivedConfig) -> Self {
        Self {
            is_logged_in: config.is_logged_in,
            currency_code: config.currency_code.as_str(),
            user_location: config.user_location.clone(),
        }
    }
}

#[derive(Clone)]
pub struct CurrencyChoice {
    pub code: &'static str,
    pub selected: bool,
}

#[derive(Clone)]
pub struct PreferencesView {
    pub currency: String,
    pub theme: String,
    pub currency_toggle_enabled: bool,
    pub choices: Vec<CurrencyChoice>,
}

impl From<&PreferencesSnapshot> for PreferencesView {
    fn from(snapshot: &PreferencesSnapshot) -> Self {
        let choices = CurrencyCode::ALL
            .into_iter()
            .map(|code| CurrencyChoice {
                code: code.as_str(),
                selected: code.as_str() == snapshot.currency,
            })
            .collect();

        Self {
            currency: snapshot.currency.clone(),
            theme: snapshot.theme.clone(),
            currency_toggle_enabled: snapshot.currency_toggle_enabled,
            choices,
        }
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub environment: String,
    pub server: ConfigView,
    pub preferences: PreferencesView,
    pub epoch: u64,
    /// JSON seed for the client island's datastar signals.
    pub client_signals: String,
}

impl HomeTemplate {
    pub fn from_page(page: &HomePage) -> Result<Self, serde_json::Error> {
        let client_signals = serde_json::to_string(&ClientSignals::from(&page.client))?;
        Ok(Self {
            environment: page.environment.clone(),
            server: ConfigView::from(&page.server),
            preferences: PreferencesView::from(&page.preferences),
            epoch: page.epoch,
            client_signals,
        })
    }
}

#[derive(Template)]
#[template(path = "partials/preferences_panel.html")]
pub struct PreferencesPanelTemplate {
    pub preferences: PreferencesView,
    pub epoch: u64,
}

impl PreferencesPanelTemplate {
    pub fn new(snapshot: &PreferencesSnapshot, epoch: u64) -> Self {
        Self {
            preferences: PreferencesView::from(snapshot),
            epoch,
        }
    }
}

#[derive(Template)]
#[template(path = "partials/action_status.html")]
pub struct ActionStatusTemplate {
    pub kind: &'static str,
    pub text: String,
}

impl ActionStatusTemplate {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: "success",
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: "error",
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::derived::derive_config;

    fn page() -> HomePage {
        let config = derive_config(true, "CA");
        HomePage {
            environment: "development".to_string(),
            server: config.clone(),
            client: config,
            preferences: PreferencesSnapshot {
                currency: "EUR".to_string(),
                theme: "light".to_string(),
                currency_toggle_enabled: true,
            },
            epoch: 3,
        }
    }

    #[test]
    fn home_document_contains_server_and_client_state() {
        let template = HomeTemplate::from_page(&page()).unwrap();
        let html = render_document(&template, "test").unwrap();

        assert!(html.contains("development"));
        assert!(html.contains("id=\"server-config\""));
        assert!(html.contains("CAD"));
        assert!(html.contains("id=\"preferences-panel\""));
        assert!(html.contains("data-epoch=\"3\""));
        assert!(html.contains("isLoggedIn"));
    }

    #[test]
    fn client_seed_is_escaped_inside_its_attribute() {
        let mut page = page();
        page.client = derive_config(true, "CA' onmouseover='alert(1)");

        let template = HomeTemplate::from_page(&page).unwrap();
        let html = render_document(&template, "test").unwrap();

        assert!(!html.contains("onmouseover='alert"));
        assert!(html.contains("CA&#39; onmouseover=&#39;alert(1)"));
        assert!(html.contains("&#34;userLocation&#34;"));
    }

    #[test]
    fn preferences_view_marks_the_stored_currency() {
        let view = PreferencesView::from(&page().preferences);
        let selected: Vec<_> = view
            .choices
            .iter()
            .filter(|choice| choice.selected)
            .map(|choice| choice.code)
            .collect();
        assert_eq!(selected, vec!["EUR"]);
    }

    #[test]
    fn unknown_stored_currency_selects_nothing() {
        let snapshot = PreferencesSnapshot {
            currency: "XYZ".to_string(),
            theme: "light".to_string(),
            currency_toggle_enabled: false,
        };
        let html = render_document(&PreferencesPanelTemplate::new(&snapshot, 0), "test").unwrap();
        assert!(html.contains("XYZ"));
        assert!(!html.contains("selected"));
    }
}
