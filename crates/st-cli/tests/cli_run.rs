use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_spectrack"))
}

fn repo_root() -> PathBuf {
    // crates/st-cli -> repo root
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..").canonicalize().unwrap()
}

fn fixture_path(name: &str) -> PathBuf {
    repo_root().join("tests/fixtures").join(name)
}

fn tmp_path(filename: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("spectrack_cli_{}_{}_{}", std::process::id(), nanos, filename));
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

fn stdout_json(out: &Output) -> serde_json::Value {
    assert!(out.status.success(), "command failed, stderr={}", String::from_utf8_lossy(&out.stderr));
    serde_json::from_slice(&out.stdout).expect("stdout should be valid JSON")
}

#[test]
fn version_smoke() {
    let out = run(&["version"]);
    assert!(out.status.success(), "version should succeed");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("spectrack "), "unexpected stdout: {}", stdout);
}

#[test]
fn default_config_is_the_reference_setup() {
    let v = stdout_json(&run(&["default-config"]));
    assert_eq!(v["geometry"]["planes_per_side"], 2);
    assert_eq!(v["physics"]["beam_momentum"], 0.05);
    assert_eq!(v["cuts"]["cut1"], 8.0);
    assert_eq!(v["run"]["events"], 5000);
}

#[test]
fn run_writes_artifact_to_stdout() {
    let out = run(&["run", "--events", "50", "--seed", "3"]);
    let v = stdout_json(&out);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Generated tracks                          50"), "unexpected stderr: {}", stderr);

    assert_eq!(v["schema_version"], "spectrack_run_v1");
    assert_eq!(v["meta"]["events"], 50);
    assert_eq!(v["meta"]["seed"], 3);

    let s = &v["summary"];
    let generated = s["generated"].as_u64().unwrap();
    let reconstructed = s["reconstructed"].as_u64().unwrap();
    let inefficient = s["lost_missing_hit"].as_u64().unwrap();
    let rejected = s["lost_quality_cuts"].as_u64().unwrap();
    assert_eq!(generated, 50);
    assert_eq!(reconstructed + inefficient + rejected, generated);

    let hists = v["histograms"].as_array().expect("histograms should be an array");
    assert_eq!(hists.len(), 15);
    for h in hists {
        let edges = h["bin_edges"].as_array().unwrap();
        let content = h["bin_content"].as_array().unwrap();
        assert_eq!(edges.len(), content.len() + 1, "{}", h["name"]);
    }
    assert_eq!(v["pull_summary"].as_array().unwrap().len(), 5);
}

#[test]
fn run_with_output_file_prints_summary() {
    let out_path = tmp_path("run.json");
    let config = fixture_path("gaussian_detector.yaml");
    assert!(config.exists(), "missing fixture: {}", config.display());

    let out = run(&[
        "run",
        "--config",
        config.to_string_lossy().as_ref(),
        "--output",
        out_path.to_string_lossy().as_ref(),
    ]);
    assert!(out.status.success(), "run should succeed, stderr={}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Generated tracks"), "unexpected stdout: {}", stdout);

    let bytes = std::fs::read(&out_path).expect("artifact should be written");
    let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v["meta"]["events"], 200);
    assert_eq!(v["config"]["physics"]["noise_occupancy"], 0.0);
    assert_eq!(v["summary"]["noise_hits"], 0);
    // full efficiency: no event lacks a hit
    assert_eq!(v["summary"]["lost_missing_hit"], 0);
    let _ = std::fs::remove_file(&out_path);
}

#[test]
fn run_is_independent_of_thread_count() {
    let one = stdout_json(&run(&["run", "--events", "80", "--threads", "1"]));
    let four = stdout_json(&run(&["run", "--events", "80", "--threads", "4"]));
    assert_eq!(one["summary"], four["summary"]);
    assert_eq!(one["histograms"], four["histograms"]);
    assert_eq!(one["pull_summary"], four["pull_summary"]);
    assert_eq!(one["meta"]["threads"], 1);
    assert_eq!(four["meta"]["threads"], 4);

    let auto = stdout_json(&run(&["run", "--events", "20", "--threads", "0"]));
    assert!(auto["meta"]["threads"].as_u64().unwrap() >= 1);
}

#[test]
fn unsupported_geometry_fails_loudly() {
    let config = fixture_path("three_planes_per_side.json");
    let out = run(&["run", "--config", config.to_string_lossy().as_ref()]);
    assert!(!out.status.success(), "run with 3 planes per side should fail");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Unsupported"), "unexpected stderr: {}", stderr);
}

#[test]
fn invalid_config_is_rejected() {
    let path = tmp_path("bad.yaml");
    std::fs::write(&path, "physics:\n  hit_efficiency: 1.5\n").unwrap();
    let out = run(&["run", "--config", path.to_string_lossy().as_ref()]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("hit_efficiency"), "unexpected stderr: {}", stderr);
    let _ = std::fs::remove_file(&path);
}
