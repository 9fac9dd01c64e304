use std::{process, sync::Arc};

use splitrender::{
    application::{
        error::AppError, page::PageService, preferences::PreferencesService,
        repos::PreferencesRepo,
    },
    config,
    domain::derived::RequestInputs,
    infra::{
        error::InfraError,
        http::{self, HttpState},
        memory::{InMemoryPreferences, StoreLatency},
        telemetry,
    },
    presentation::views::{HomeTemplate, render_document},
    revalidate::{RevalidateConfig, Revalidator},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let app = build_application_context(&settings);

    match command {
        config::Command::Serve(_) => serve_http(&settings, app).await,
        config::Command::Render(_) => render_once(app).await,
    }
}

struct ApplicationContext {
    pages: Arc<PageService>,
    preferences: Arc<PreferencesService>,
    simulation: RequestInputs,
}

/// Composition root: the only place the shared store is created.
fn build_application_context(settings: &config::Settings) -> ApplicationContext {
    let repo: Arc<dyn PreferencesRepo> = Arc::new(InMemoryPreferences::new(StoreLatency::from(
        &settings.store,
    )));
    let revalidator = Arc::new(Revalidator::new(RevalidateConfig::from(
        &settings.revalidate,
    )));
    let preferences = Arc::new(
        PreferencesService::new(repo, revalidator)
            .with_strict_currency(settings.store.strict_currency),
    );

    let simulation = RequestInputs {
        auth_token: settings.simulation.auth_token,
        geo_country_code: settings.simulation.geo_country_code.clone(),
    };
    let pages = Arc::new(PageService::new(
        preferences.clone(),
        simulation.clone(),
        settings.environment.name.clone(),
    ));

    ApplicationContext {
        pages,
        preferences,
        simulation,
    }
}

async fn render_once(app: ApplicationContext) -> Result<(), AppError> {
    let page = app.pages.render_home().await?;
    let template = HomeTemplate::from_page(&page)
        .map_err(|err| AppError::unexpected(format!("failed to encode client state: {err}")))?;
    let html = render_document(&template, "main::render_once")
        .map_err(|err| AppError::unexpected(err.to_string()))?;
    println!("{html}");
    Ok(())
}

async fn serve_http(settings: &config::Settings, app: ApplicationContext) -> Result<(), AppError> {
    let router = http::build_router(HttpState {
        pages: app.pages,
        preferences: app.preferences,
        simulation: app.simulation,
    });

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "splitrender::server",
        addr = %settings.server.addr,
        environment = %settings.environment.name,
        "Listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}
