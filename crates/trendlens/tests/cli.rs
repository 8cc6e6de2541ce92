//! End-to-end CLI integration tests
//!
//! These tests invoke the compiled binary as a subprocess to verify
//! that the CLI behaves correctly from a user's perspective. Analysis
//! tests read cards from a fixture file and pin `--now` so windows are
//! deterministic.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::NamedTempFile;

const NOW: &str = "2024-06-15T12:00:00Z";

const CARDS: &str = r#"{"data": [
    {"id": 1, "created_at": "2024-06-14T09:00:00Z", "title": "Tokio internals", "tech_stack": ["Rust"]},
    {"id": 2, "created_at": "2024-06-13T09:00:00Z", "title": "Shipping a Rust CLI"},
    {"id": 3, "created_at": "2024-06-12T09:00:00Z", "title": "LLM agents in Python", "ai_category": null},
    {"id": 4, "created_at": "2024-06-03T09:00:00Z", "title": "Django tips"},
    {"id": 5, "created_at": "2024-06-02T09:00:00Z", "title": "Cargo workspaces"},
    {"id": 6, "created_at": "not a date", "title": "Rust again"},
    {"id": "g7", "created_at": "2024-06-14", "title": "GPT-4o review"}
]}"#;

/// Returns a Command configured to run our binary.
///
/// Note: `cargo_bin` is marked deprecated for edge cases involving custom
/// cargo build directories, but works correctly for standard project layouts.
#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.env_remove("TRENDLENS_WINDOW_DAYS")
        .env_remove("TRENDLENS_API_BASE_URL");
    cmd
}

fn cards_file(body: &str) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), body).unwrap();
    file
}

fn run_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("failed to run command");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("invalid JSON output")
}

fn trends_json(extra: &[&str]) -> Value {
    let cards = cards_file(CARDS);
    let mut c = cmd();
    c.args(["trends", "--json", "--now", NOW, "-i"])
        .arg(cards.path())
        .args(extra);
    run_json(&mut c)
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_shows_usage() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("trends"))
        .stdout(predicate::str::contains("classify"));
}

#[test]
fn long_help_lists_environment() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("TRENDLENS_API_BASE_URL"));
}

#[test]
fn version_flag_shows_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn version_only_prints_bare_version() {
    cmd()
        .arg("--version-only")
        .assert()
        .success()
        .stdout(predicate::str::diff(format!(
            "{}\n",
            env!("CARGO_PKG_VERSION")
        )));
}

// =============================================================================
// Info Command
// =============================================================================

#[test]
fn info_shows_package_name_and_version() {
    cmd()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_NAME")))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn info_json_outputs_valid_json() {
    let json = run_json(cmd().args(["info", "--json"]));

    assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["config"]["window_days"], 7);
}

// =============================================================================
// Global Flags
// =============================================================================

#[test]
fn quiet_flag_accepted() {
    cmd().args(["-q", "info"]).assert().success();
}

#[test]
fn multiple_verbose_flags_accepted() {
    cmd().args(["-vv", "info"]).assert().success();
}

#[test]
fn color_never_accepted() {
    cmd().args(["--color", "never", "info"]).assert().success();
}

// =============================================================================
// Trends Command
// =============================================================================

#[test]
fn trends_json_ranks_by_current_count() {
    let json = trends_json(&[]);
    let languages = &json["reports"][0];

    assert_eq!(languages["taxonomy"], "languages");
    assert_eq!(languages["window_days"], 7);
    assert_eq!(languages["total_items"], 7);
    assert_eq!(languages["excluded_items"], 1);
    assert_eq!(languages["sample_data"], false);

    let rust = &languages["records"][0];
    assert_eq!(rust["category"], "rust");
    assert_eq!(rust["current_count"], 2);
    assert_eq!(rust["previous_count"], 1);
    assert_eq!(rust["growth_percent"], 100.0);
    assert_eq!(rust["trend_direction"], "up");
    assert_eq!(rust["daily_histogram"].as_array().unwrap().len(), 7);

    let python = &languages["records"][1];
    assert_eq!(python["category"], "python");
    assert_eq!(python["trend_direction"], "stable");
}

#[test]
fn trends_json_includes_every_category() {
    let json = trends_json(&["--taxonomy", "languages"]);
    let reports = json["reports"].as_array().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["records"].as_array().unwrap().len(), 12);
}

#[test]
fn trends_window_flag_widens_window() {
    let json = trends_json(&["--window", "30d", "-t", "languages"]);
    let languages = &json["reports"][0];
    assert_eq!(languages["window_days"], 30);
    assert_eq!(languages["records"][0]["category"], "rust");
    assert_eq!(languages["records"][0]["current_count"], 3);
}

#[test]
fn trends_json_includes_model_scores() {
    let json = trends_json(&[]);
    let gpt = json["models"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["name"] == "GPT-4o")
        .expect("GPT-4o should be listed");
    assert_eq!(gpt["mention_count"], 1);
}

#[test]
fn trends_text_output_shows_categories() {
    let cards = cards_file(CARDS);
    cmd()
        .args(["--color", "never", "trends", "--now", NOW, "-i"])
        .arg(cards.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("languages"))
        .stdout(predicate::str::contains("Rust"))
        .stdout(predicate::str::contains("+100.0%"));
}

#[test]
fn trends_sample_data_is_flagged() {
    let cards = cards_file("[]");
    cmd()
        .args(["trends", "--sample-data", "--now", NOW, "-i"])
        .arg(cards.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("SAMPLE DATA"));
}

#[test]
fn trends_without_sample_data_stays_zero() {
    let cards = cards_file("[]");
    let mut c = cmd();
    c.args(["trends", "--json", "--now", NOW, "-i"]).arg(cards.path());
    let json = run_json(&mut c);
    for report in json["reports"].as_array().unwrap() {
        assert_eq!(report["sample_data"], false);
        for record in report["records"].as_array().unwrap() {
            assert_eq!(record["current_count"], 0);
        }
    }
}

#[test]
fn trends_unknown_taxonomy_fails() {
    let cards = cards_file(CARDS);
    cmd()
        .args(["trends", "-t", "frameworks", "-i"])
        .arg(cards.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown taxonomy"));
}

#[test]
fn trends_invalid_window_fails() {
    cmd()
        .args(["trends", "--window", "14"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported window"));
}

#[test]
fn trends_malformed_input_fails() {
    let cards = cards_file("{not json");
    cmd()
        .args(["trends", "-i"])
        .arg(cards.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to decode cards"));
}

#[test]
fn trends_missing_input_fails() {
    cmd()
        .args(["trends", "-i", "/nonexistent/cards.json"])
        .assert()
        .failure();
}

#[test]
fn trends_unreachable_api_reports_load_failure() {
    let json = run_json(
        cmd()
            .env("TRENDLENS_API_BASE_URL", "http://127.0.0.1:9")
            .env("TRENDLENS_FETCH__MAX_RETRIES", "0")
            .env("TRENDLENS_FETCH__TIMEOUT_SECS", "2")
            .args(["trends", "--json", "--now", NOW]),
    );
    assert_eq!(json["reports"][0]["total_items"], 0);

    cmd()
        .env("TRENDLENS_API_BASE_URL", "http://127.0.0.1:9")
        .env("TRENDLENS_FETCH__MAX_RETRIES", "0")
        .env("TRENDLENS_FETCH__TIMEOUT_SECS", "2")
        .args(["trends", "--now", NOW])
        .assert()
        .success()
        .stderr(predicate::str::contains("load failed"));
}

// =============================================================================
// Classify Command
// =============================================================================

#[test]
fn classify_text_json() {
    let json = run_json(cmd().args(["classify", "--json", "--text", "Rust bindings for PyTorch"]));
    let categories = &json[0]["categories"];
    assert_eq!(json[0]["id"], "text");
    assert_eq!(categories["languages"], serde_json::json!(["python", "rust"]));
    assert_eq!(categories["ai-fields"], serde_json::json!(["machine-learning"]));
}

#[test]
fn classify_word_boundary_rejects_glued_keywords() {
    let json = run_json(cmd().args([
        "classify",
        "--json",
        "--text",
        "trusted builds",
        "--word-boundary",
        "-t",
        "languages",
    ]));
    assert_eq!(json[0]["categories"]["languages"], serde_json::json!([]));
}

#[test]
fn classify_input_file() {
    let cards = cards_file(CARDS);
    let json = run_json(cmd().args(["classify", "--json", "-i"]).arg(cards.path()));
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 7);
    assert_eq!(items[2]["id"], "3");
    assert_eq!(items[2]["categories"]["languages"], serde_json::json!(["python"]));
}

#[test]
fn classify_input_and_text_conflict() {
    cmd()
        .args(["classify", "-i", "cards.json", "--text", "rust"])
        .assert()
        .failure();
}

// =============================================================================
// Models Command
// =============================================================================

#[test]
fn models_json_sorted_by_capability() {
    let cards = cards_file(CARDS);
    let json = run_json(cmd().args(["models", "--json", "-i"]).arg(cards.path()));
    let models = json.as_array().unwrap();
    assert_eq!(models[0]["name"], "o1");
    let caps: Vec<u64> = models
        .iter()
        .map(|m| m["base_capability"].as_u64().unwrap())
        .collect();
    assert!(caps.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn models_text_output() {
    let cards = cards_file("[]");
    cmd()
        .args(["models", "-i"])
        .arg(cards.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Claude 3.5 Sonnet"));
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn invalid_subcommand_shows_error() {
    cmd()
        .arg("not-a-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

// =============================================================================
// Chdir Flag
// =============================================================================

#[test]
fn chdir_flag_changes_directory() {
    cmd().args(["-C", "/tmp", "info"]).assert().success();
}

#[test]
fn chdir_nonexistent_fails() {
    cmd()
        .args(["-C", "/nonexistent/path/that/does/not/exist", "info"])
        .assert()
        .failure();
}
