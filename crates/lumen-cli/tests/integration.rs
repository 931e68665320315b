//! Integration tests for lumen-cli.
//!
//! Tests invoke the built `lumen` binary with an isolated config directory.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Helper to get the `lumen` binary with its config dir pointed at `home`.
fn lumen_bin(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_lumen"));
    cmd.env("XDG_CONFIG_HOME", home).env("HOME", home).env("RUST_LOG", "warn");
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ---------------------------------------------------------------------------
// `lumen effects` / `lumen args`
// ---------------------------------------------------------------------------

#[test]
fn cli_effects_lists_every_type() {
    let home = TempDir::new().unwrap();
    let output = lumen_bin(home.path()).arg("effects").output().unwrap();
    assert!(output.status.success(), "lumen effects failed");

    let text = stdout(&output);
    assert!(text.contains("Available Effects"));
    for type_name in [
        "audio.AudioInput",
        "colors.StaticRGBColor",
        "colors.ColorWheel",
        "colors.InterpolateHSV",
        "effects.Mirror",
        "effects.Append",
        "effects.Combine",
        "effects.AfterGlow",
        "audioreactive.Spectrum",
        "audioreactive.VUMeterRMS",
        "audioreactive.VUMeterPeak",
        "audioreactive.MovingLight",
        "devices.LEDOutput",
    ] {
        assert!(text.contains(type_name), "listing should contain '{type_name}'");
    }
}

#[test]
fn cli_effects_filters_by_category() {
    let home = TempDir::new().unwrap();
    let output = lumen_bin(home.path())
        .args(["effects", "--category", "compositor"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("effects.Mirror"));
    assert!(text.contains("effects.AfterGlow"));
    assert!(!text.contains("audioreactive.Spectrum"));
}

#[test]
fn cli_effects_rejects_unknown_category() {
    let home = TempDir::new().unwrap();
    let output = lumen_bin(home.path())
        .args(["effects", "--category", "lasers"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn cli_args_shows_both_schemas() {
    let home = TempDir::new().unwrap();
    let output = lumen_bin(home.path())
        .args(["args", "audioreactive.VUMeterPeak"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("Constructor parameters"));
    assert!(text.contains("Tunable parameters"));
    assert!(text.contains("num_pixels"));
    assert!(text.contains("db_range"));
}

#[test]
fn cli_args_unknown_type_fails() {
    let home = TempDir::new().unwrap();
    let output = lumen_bin(home.path())
        .args(["args", "effects.Nonexistent"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("effects.Nonexistent"));
}

// ---------------------------------------------------------------------------
// `lumen presets` / `lumen save` / `lumen inspect`
// ---------------------------------------------------------------------------

#[test]
fn cli_presets_lists_factory_presets() {
    let home = TempDir::new().unwrap();
    let output = lumen_bin(home.path()).arg("presets").output().unwrap();
    assert!(output.status.success());

    let text = stdout(&output);
    for name in ["movingLight", "movingLights", "spectrum", "vuPeak", "staticColor"] {
        assert!(text.contains(name), "presets should list '{name}'");
    }
    assert!(text.contains("(none)"));
}

#[test]
fn cli_save_then_inspect() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("out").join("vu.json");

    let output = lumen_bin(home.path())
        .args(["save", "--preset", "vuPeak", "--pixels", "60", "--out"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success(), "save failed: {}", String::from_utf8_lossy(&output.stderr));
    assert!(file.is_file());

    let output = lumen_bin(home.path()).arg("inspect").arg(&file).output().unwrap();
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("devices.LEDOutput"));
    assert!(text.contains("audioreactive.VUMeterPeak"));
    assert!(text.contains("num_pixels=30"));
    assert!(text.contains("Execution order:"));
}

#[test]
fn cli_inspect_json_lists_order() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("static.json");
    let status = lumen_bin(home.path())
        .args(["save", "--preset", "staticColor", "--out"])
        .arg(&file)
        .status()
        .unwrap();
    assert!(status.success());

    let output = lumen_bin(home.path())
        .args(["inspect", "--json"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success());
    let listing: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let order = listing["executionOrder"].as_array().unwrap();
    assert_eq!(order.len(), listing["nodes"].as_array().unwrap().len());
    // LED output (node 0) consumes everything, so it runs last
    assert_eq!(order.last().unwrap(), 0);
}

#[cfg(target_os = "linux")]
#[test]
fn cli_save_defaults_to_user_graphs_dir() {
    let home = TempDir::new().unwrap();
    let status = lumen_bin(home.path())
        .args(["save", "--preset", "spectrum", "--pixels", "20"])
        .status()
        .unwrap();
    assert!(status.success());
    assert!(home.path().join("lumen/graphs/spectrum.json").is_file());

    let output = lumen_bin(home.path()).args(["inspect", "spectrum"]).output().unwrap();
    assert!(output.status.success(), "saved graph should resolve by name");

    let output = lumen_bin(home.path()).arg("presets").output().unwrap();
    assert!(!stdout(&output).contains("(none)"));
}

#[test]
fn cli_inspect_missing_file_fails() {
    let home = TempDir::new().unwrap();
    let output = lumen_bin(home.path())
        .args(["inspect", "no-such-graph"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// `lumen render`
// ---------------------------------------------------------------------------

#[test]
fn cli_render_reports_timings() {
    let home = TempDir::new().unwrap();
    let output = lumen_bin(home.path())
        .args(["render", "--preset", "movingLight", "--ticks", "20", "--pixels", "40"])
        .output()
        .unwrap();
    assert!(output.status.success(), "render failed: {}", String::from_utf8_lossy(&output.stderr));

    let text = stdout(&output);
    assert!(text.contains("Done:"));
    assert!(text.contains("audioreactive.MovingLight"));
    assert!(text.contains("Failures"));
}

#[test]
fn cli_render_requires_a_graph() {
    let home = TempDir::new().unwrap();
    let output = lumen_bin(home.path()).args(["render", "--ticks", "5"]).output().unwrap();
    assert!(!output.status.success());
}
