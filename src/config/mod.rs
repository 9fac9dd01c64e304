//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, num::NonZeroUsize, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

mod cli;
#[cfg(test)]
mod tests;

pub use cli::{CliArgs, Command, RenderArgs, ServeArgs, ServeOverrides, SimulationOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "splitrender";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_AUTH_TOKEN: bool = true;
const DEFAULT_GEO_COUNTRY_CODE: &str = "CA";
const DEFAULT_READ_LATENCY_MS: u64 = 100;
const DEFAULT_CURRENCY_WRITE_LATENCY_MS: u64 = 500;
const DEFAULT_FLAG_WRITE_LATENCY_MS: u64 = 300;
const DEFAULT_REVALIDATE_HISTORY_LIMIT: usize = 64;
/// Upper bound for any simulated store latency.
const MAX_LATENCY_MS: u64 = 60_000;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub environment: EnvironmentSettings,
    pub simulation: SimulationSettings,
    pub store: StoreSettings,
    pub revalidate: RevalidateSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct EnvironmentSettings {
    /// Display-only label shown in the page header.
    pub name: String,
}

/// Fixed request inputs the simulated middleware attaches to every request.
#[derive(Debug, Clone)]
pub struct SimulationSettings {
    pub auth_token: bool,
    pub geo_country_code: String,
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub read_latency: Duration,
    pub currency_write_latency: Duration,
    pub flag_write_latency: Duration,
    pub strict_currency: bool,
}

#[derive(Debug, Clone)]
pub struct RevalidateSettings {
    pub enabled: bool,
    pub history_limit: NonZeroUsize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("SPLITRENDER").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Render(args)) => raw.apply_simulation_overrides(&args.simulation),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    environment: RawEnvironmentSettings,
    simulation: RawSimulationSettings,
    store: RawStoreSettings,
    revalidate: RawRevalidateSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }

        self.apply_simulation_overrides(&overrides.simulation);
    }

    fn apply_simulation_overrides(&mut self, overrides: &SimulationOverrides) {
        if let Some(name) = overrides.environment.as_ref() {
            self.environment.name = Some(name.clone());
        }
        if let Some(auth) = overrides.auth_token {
            self.simulation.auth_token = Some(auth);
        }
        if let Some(geo) = overrides.geo_country_code.as_ref() {
            self.simulation.geo_country_code = Some(geo.clone());
        }
        if let Some(strict) = overrides.strict_currency {
            self.store.strict_currency = Some(strict);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            environment,
            simulation,
            store,
            revalidate,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            environment: build_environment_settings(environment)?,
            simulation: build_simulation_settings(simulation)?,
            store: build_store_settings(store)?,
            revalidate: build_revalidate_settings(revalidate)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_environment_settings(
    environment: RawEnvironmentSettings,
) -> Result<EnvironmentSettings, LoadError> {
    let name = non_blank(environment.name, DEFAULT_ENVIRONMENT, "environment.name")?;
    Ok(EnvironmentSettings { name })
}

fn build_simulation_settings(
    simulation: RawSimulationSettings,
) -> Result<SimulationSettings, LoadError> {
    let geo_country_code = non_blank(
        simulation.geo_country_code,
        DEFAULT_GEO_COUNTRY_CODE,
        "simulation.geo_country_code",
    )?;

    Ok(SimulationSettings {
        auth_token: simulation.auth_token.unwrap_or(DEFAULT_AUTH_TOKEN),
        geo_country_code,
    })
}

fn build_store_settings(store: RawStoreSettings) -> Result<StoreSettings, LoadError> {
    Ok(StoreSettings {
        read_latency: latency(
            store.read_latency_ms,
            DEFAULT_READ_LATENCY_MS,
            "store.read_latency_ms",
        )?,
        currency_write_latency: latency(
            store.currency_write_latency_ms,
            DEFAULT_CURRENCY_WRITE_LATENCY_MS,
            "store.currency_write_latency_ms",
        )?,
        flag_write_latency: latency(
            store.flag_write_latency_ms,
            DEFAULT_FLAG_WRITE_LATENCY_MS,
            "store.flag_write_latency_ms",
        )?,
        strict_currency: store.strict_currency.unwrap_or(false),
    })
}

fn build_revalidate_settings(
    revalidate: RawRevalidateSettings,
) -> Result<RevalidateSettings, LoadError> {
    let limit = revalidate
        .history_limit
        .unwrap_or(DEFAULT_REVALIDATE_HISTORY_LIMIT);
    let history_limit = NonZeroUsize::new(limit).ok_or_else(|| {
        LoadError::invalid("revalidate.history_limit", "must be greater than zero")
    })?;

    Ok(RevalidateSettings {
        enabled: revalidate.enabled.unwrap_or(true),
        history_limit,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawEnvironmentSettings {
    name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSimulationSettings {
    auth_token: Option<bool>,
    geo_country_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStoreSettings {
    read_latency_ms: Option<u64>,
    currency_write_latency_ms: Option<u64>,
    flag_write_latency_ms: Option<u64>,
    strict_currency: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRevalidateSettings {
    enabled: Option<bool>,
    history_limit: Option<usize>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_blank(
    value: Option<String>,
    default: &str,
    key: &'static str,
) -> Result<String, LoadError> {
    match value {
        Some(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(LoadError::invalid(key, "must not be empty"));
            }
            Ok(trimmed.to_string())
        }
        None => Ok(default.to_string()),
    }
}

fn latency(value: Option<u64>, default_ms: u64, key: &'static str) -> Result<Duration, LoadError> {
    let ms = value.unwrap_or(default_ms);
    if ms > MAX_LATENCY_MS {
        return Err(LoadError::invalid(
            key,
            format!("must not exceed {MAX_LATENCY_MS} ms"),
        ));
    }
    Ok(Duration::from_millis(ms))
}
