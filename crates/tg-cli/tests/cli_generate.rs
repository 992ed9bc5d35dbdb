use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_toygen"))
}

fn repo_root() -> PathBuf {
    // crates/tg-cli -> repo root
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..").canonicalize().unwrap()
}

fn fixture_path(name: &str) -> PathBuf {
    repo_root().join("tests/fixtures/toygen").join(name)
}

fn tmp_path(filename: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("toygen_cli_{}_{}_{}", std::process::id(), nanos, filename));
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

fn stdout_json(out: &Output) -> serde_json::Value {
    assert!(
        out.status.success(),
        "toygen should succeed, stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("stdout should be valid JSON")
}

fn read_toys(path: &PathBuf) -> serde_json::Value {
    let bytes = std::fs::read(path).expect("toy file should exist");
    serde_json::from_slice(&bytes).expect("toy file should be valid JSON")
}

fn toy_sum(toys: &serde_json::Value, name: &str) -> f64 {
    toys["histograms"]
        .as_array()
        .unwrap()
        .iter()
        .find(|h| h["name"] == name)
        .unwrap_or_else(|| panic!("toy {name} missing"))["content"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_f64().unwrap())
        .sum()
}

#[test]
fn generate_writes_one_toy_per_region() {
    let config = fixture_path("run.yaml");
    let output = tmp_path("toys.json");
    let out = run(&["generate", "--config", config.to_str().unwrap(), "--output", output.to_str().unwrap()]);
    let summary = stdout_json(&out);

    assert_eq!(summary["seed"], 42);
    assert!(summary["failures"].as_array().unwrap().is_empty());
    let regions = summary["regions"].as_array().unwrap();
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0]["region"], "SR_fail");
    assert_eq!(regions[0]["role"], "fail");
    assert_eq!(regions[0]["n_events"], 20);
    assert_eq!(regions[1]["region"], "SR_pass");
    assert_eq!(regions[1]["n_events"], 10);
    // (data - ttbar) in the fail region: 20 - 4.
    assert!((regions[0]["asimov_integral"].as_f64().unwrap() - 16.0).abs() < 1e-9);
    // ttbar (2) + 0.5 * fail residual (16).
    assert!((regions[1]["asimov_integral"].as_f64().unwrap() - 10.0).abs() < 1e-9);

    let toys = read_toys(&output);
    assert!((toy_sum(&toys, "SR_fail") - 20.0).abs() < 1e-9);
    assert!((toy_sum(&toys, "SR_pass") - 10.0).abs() < 1e-9);
    let _ = std::fs::remove_file(&output);
}

#[test]
fn generate_creates_summary_parent_directories() {
    let config = fixture_path("run.yaml");
    let dir = tmp_path("summary_dir");
    let output = dir.join("toys/toys.json");
    let summary = dir.join("reports/nested/summary.json");
    let out = run(&[
        "generate",
        "--config",
        config.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--summary",
        summary.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    assert!(out.stdout.is_empty(), "summary goes to the file, not stdout");

    let v: serde_json::Value = serde_json::from_slice(&std::fs::read(&summary).unwrap()).unwrap();
    assert_eq!(v["regions"].as_array().unwrap().len(), 2);
    assert!(output.exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn generate_is_deterministic_for_fixed_seed() {
    let config = fixture_path("run.yaml");
    let a = tmp_path("a.json");
    let b = tmp_path("b.json");
    for p in [&a, &b] {
        let out = run(&[
            "generate",
            "--config",
            config.to_str().unwrap(),
            "--seed",
            "1234",
            "--output",
            p.to_str().unwrap(),
        ]);
        assert_eq!(stdout_json(&out)["seed"], 1234);
    }
    assert_eq!(read_toys(&a), read_toys(&b));
    let _ = std::fs::remove_file(&a);
    let _ = std::fs::remove_file(&b);
}

#[test]
fn generate_json_config_blinds_fail_region() {
    let config = fixture_path("run.json");
    let output = tmp_path("blind.json");
    let out = run(&["generate", "--config", config.to_str().unwrap(), "--output", output.to_str().unwrap()]);
    let summary = stdout_json(&out);

    assert_eq!(summary["seed"], 7);
    let regions = summary["regions"].as_array().unwrap();
    assert!(regions[0]["n_events"].is_null(), "blinded fail region has no toy");
    assert!(regions[1]["n_events"].as_u64().is_some());

    let toys = read_toys(&output);
    let names: Vec<&str> =
        toys["histograms"].as_array().unwrap().iter().map(|h| h["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["SR_pass"]);
    let _ = std::fs::remove_file(&output);
}

#[test]
fn generate_rejects_mismatched_chain() {
    let config = fixture_path("run_bad_chain.yaml");
    let output = tmp_path("bad.json");
    let out = run(&["generate", "--config", config.to_str().unwrap(), "--output", output.to_str().unwrap()]);
    assert!(!out.status.success(), "mismatched chain should fail");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("transfer"), "stderr={stderr}");
    assert!(!output.exists());
}

#[test]
fn transfer_shapes_evaluates_on_template_binning() {
    let template = fixture_path("hists/data.json");
    let out = run(&[
        "transfer-shapes",
        "--template",
        template.to_str().unwrap(),
        "--histogram",
        "data_SR_fail",
        "--form",
        "1x0",
        "--params",
        "1,2",
    ]);
    let v = stdout_json(&out);
    assert_eq!(v["name"], "1x0");
    let content: Vec<f64> = v["content"].as_array().unwrap().iter().map(|c| c.as_f64().unwrap()).collect();
    // Normalized x centres 0.25 / 0.75 -> 1 + 2x.
    assert_eq!(content, vec![1.5, 1.5, 2.5, 2.5]);
}

#[test]
fn transfer_shapes_rejects_wrong_parameter_count() {
    let template = fixture_path("hists/data.json");
    let out = run(&[
        "transfer-shapes",
        "--template",
        template.to_str().unwrap(),
        "--histogram",
        "data_SR_fail",
        "--form",
        "2x1",
        "--params",
        "1,2",
    ]);
    assert!(!out.status.success());
}

#[test]
fn version_prints_crate_version() {
    let out = run(&["version"]);
    assert!(out.status.success());
    let s = String::from_utf8_lossy(&out.stdout);
    assert!(s.starts_with("toygen "), "stdout={s}");
}
