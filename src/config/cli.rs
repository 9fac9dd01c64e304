use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the splitrender binary.
#[derive(Debug, Parser)]
#[command(
    name = "splitrender",
    version,
    about = "Split server/client rendering demo"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "SPLITRENDER_CONFIG_FILE",
        value_name = "PATH"
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve the demo over HTTP.
    Serve(Box<ServeArgs>),
    /// Render the home document once and print it to stdout.
    Render(RenderArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub simulation: SimulationOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub simulation: SimulationOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

/// Inputs the simulated middleware feeds into every render.
#[derive(Debug, Args, Default, Clone)]
pub struct SimulationOverrides {
    /// Override the displayed environment name.
    #[arg(long = "environment", value_name = "NAME")]
    pub environment: Option<String>,

    /// Pretend an auth token is (or is not) present.
    #[arg(
        long = "auth-token",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub auth_token: Option<bool>,

    /// Override the simulated geo country code.
    #[arg(long = "geo-country-code", value_name = "CODE")]
    pub geo_country_code: Option<String>,

    /// Reject currencies outside the known set.
    #[arg(
        long = "strict-currency",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub strict_currency: Option<bool>,
}
