use assert_cmd::Command;
use predicates::str::contains;

fn splitrender() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("splitrender"));
    cmd.env("SPLITRENDER__STORE__READ_LATENCY_MS", "0")
        .env_remove("SPLITRENDER_CONFIG_FILE");
    cmd
}

#[test]
fn render_prints_the_home_document() {
    let assert = splitrender().arg("render").assert().success();

    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("<!doctype html>"));
    assert!(output.contains("id=\"preferences-panel\""));
    assert!(output.contains("CAD"));
    assert!(output.contains("development"));
}

#[test]
fn render_honours_simulation_overrides() {
    let assert = splitrender()
        .args([
            "render",
            "--geo-country-code",
            "US",
            "--auth-token",
            "false",
            "--environment",
            "staging",
        ])
        .assert()
        .success();

    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("&#34;userLocation&#34;:&#34;US&#34;"));
    assert!(output.contains("&#34;isLoggedIn&#34;:false"));
    assert!(output.contains("staging"));
}

#[test]
fn invalid_configuration_fails_fast() {
    splitrender()
        .env("SPLITRENDER__SERVER__PORT", "0")
        .arg("render")
        .assert()
        .failure()
        .stderr(contains("server.port"));
}
