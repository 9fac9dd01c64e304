use std::path::PathBuf;

use clap::Parser;

use super::*;

fn write_config(contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("splitrender-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(&path, contents).expect("write temp config");
    path
}

#[test]
fn defaults_describe_the_demo_setup() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.to_string(), "127.0.0.1:3000");
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.environment.name, "development");
    assert!(settings.simulation.auth_token);
    assert_eq!(settings.simulation.geo_country_code, "CA");
    assert_eq!(settings.store.read_latency, Duration::from_millis(100));
    assert_eq!(settings.store.currency_write_latency, Duration::from_millis(500));
    assert_eq!(settings.store.flag_write_latency, Duration::from_millis(300));
    assert!(!settings.store.strict_currency);
    assert!(settings.revalidate.enabled);
    assert_eq!(settings.revalidate.history_limit.get(), 64);
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.simulation.geo_country_code = Some("US".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        simulation: SimulationOverrides {
            geo_country_code: Some("JP".to_string()),
            auth_token: Some(false),
            ..Default::default()
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.simulation.geo_country_code, "JP");
    assert!(!settings.simulation.auth_token);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn config_file_is_layered_under_cli() {
    let path = write_config(
        r#"
[server]
port = 8080

[store]
currency_write_latency_ms = 20
strict_currency = true

[revalidate]
enabled = false
"#,
    );

    let args = CliArgs::parse_from([
        "splitrender",
        "--config-file",
        path.to_str().expect("utf-8 temp path"),
        "serve",
        "--server-port",
        "9090",
    ]);
    let settings = load(&args).expect("valid settings");
    let _ = std::fs::remove_file(&path);

    assert_eq!(settings.server.addr.port(), 9090);
    assert_eq!(settings.store.currency_write_latency, Duration::from_millis(20));
    assert!(settings.store.strict_currency);
    assert!(!settings.revalidate.enabled);
}

#[test]
fn missing_explicit_config_file_is_an_error() {
    let args = CliArgs::parse_from([
        "splitrender",
        "--config-file",
        "/nonexistent/splitrender-missing.toml",
    ]);
    assert!(matches!(load(&args), Err(LoadError::Build(_))));
}

#[test]
fn zero_port_is_rejected() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(0);
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(err, LoadError::Invalid { key: "server.port", .. }));
}

#[test]
fn unparsable_host_is_rejected() {
    let mut raw = RawSettings::default();
    raw.server.host = Some("not a host".to_string());
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(err, LoadError::Invalid { key: "server.addr", .. }));
}

#[test]
fn unknown_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("chatty".to_string());
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(err, LoadError::Invalid { key: "logging.level", .. }));
}

#[test]
fn blank_geo_code_is_rejected() {
    let mut raw = RawSettings::default();
    raw.simulation.geo_country_code = Some("   ".to_string());
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "simulation.geo_country_code",
            ..
        }
    ));
}

#[test]
fn excessive_latency_is_rejected() {
    let mut raw = RawSettings::default();
    raw.store.read_latency_ms = Some(MAX_LATENCY_MS + 1);
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "store.read_latency_ms",
            ..
        }
    ));
}

#[test]
fn zero_history_limit_is_rejected() {
    let mut raw = RawSettings::default();
    raw.revalidate.history_limit = Some(0);
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "revalidate.history_limit",
            ..
        }
    ));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["splitrender"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "splitrender",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--server-port",
        "8081",
        "--log-json",
        "yes",
        "--auth-token",
        "false",
        "--strict-currency",
        "true",
        "--environment",
        "staging",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            let overrides = serve.overrides;
            assert_eq!(overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(overrides.server_port, Some(8081));
            assert_eq!(overrides.log_json, Some(true));
            assert_eq!(overrides.simulation.auth_token, Some(false));
            assert_eq!(overrides.simulation.strict_currency, Some(true));
            assert_eq!(overrides.simulation.environment.as_deref(), Some("staging"));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_render_arguments() {
    let args = CliArgs::parse_from(["splitrender", "render", "--geo-country-code", "US"]);

    match args.command.expect("render command") {
        Command::Render(render) => {
            assert_eq!(render.simulation.geo_country_code.as_deref(), Some("US"));
            assert_eq!(render.simulation.auth_token, None);
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn render_command_applies_simulation_overrides() {
    let args = CliArgs::parse_from([
        "splitrender",
        "render",
        "--auth-token",
        "no",
        "--geo-country-code",
        "UK",
    ]);
    let mut raw = RawSettings::default();
    if let Some(Command::Render(render)) = args.command.as_ref() {
        raw.apply_simulation_overrides(&render.simulation);
    }
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(!settings.simulation.auth_token);
    assert_eq!(settings.simulation.geo_country_code, "UK");
}
