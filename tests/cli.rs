//! Runs the `grocer` binary against a temporary workspace.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

fn setup_test_env() -> (TempDir, PathBuf) {
    setup_test_env_with_upstream("http://127.0.0.1:9")
}

fn setup_test_env_with_upstream(base_url: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    fs::write(
        config_dir.join("rules.toml"),
        r#"
[[rule]]
id = "house_salsa"
canonical_name = "salsa verde"
category = "condiments"
match_keywords = ["salsa verde"]
avoid_keywords = ["chips"]
"#,
    )
    .unwrap();

    let config_content = format!(
        r#"[db]
path = "{root}/data/grocer.sqlite"

[upstream]
static_token = "test-token"
base_url = "{base_url}"

[rules]
path = "{root}/config/rules.toml"

[logging]
level = "warn"
"#,
        root = root.display(),
        base_url = base_url
    );

    let config_path = config_dir.join("grocer.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_grocer(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_grocer"))
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run grocer binary");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

fn json_stdout(stdout: &str) -> Value {
    serde_json::from_str(stdout).unwrap_or_else(|e| panic!("stdout is not JSON ({}): {}", e, stdout))
}

#[test]
fn test_init_is_idempotent() {
    let (tmp, config) = setup_test_env();

    let (stdout, stderr, ok) = run_grocer(&config, &["init"]);
    assert!(ok, "init failed: {}", stderr);
    assert!(stdout.contains("Database initialized successfully."));
    assert!(tmp.path().join("data/grocer.sqlite").exists());

    let (_, stderr, ok) = run_grocer(&config, &["init"]);
    assert!(ok, "second init failed: {}", stderr);
}

#[test]
fn test_rules_for_term() {
    let (_tmp, config) = setup_test_env();

    let (stdout, stderr, ok) = run_grocer(&config, &["rules", "2 Boneless Chicken Breasts"]);
    assert!(ok, "rules failed: {}", stderr);
    let v = json_stdout(&stdout);
    assert_eq!(v["ingredient_rule"]["id"], "chicken_breast");
    assert_eq!(v["category_rule"]["category"], "protein");

    let (stdout, _, ok) = run_grocer(&config, &["rules", "green salsa verde"]);
    assert!(ok);
    assert_eq!(json_stdout(&stdout)["ingredient_rule"]["id"], "house_salsa");
}

#[test]
fn test_rules_list() {
    let (_tmp, config) = setup_test_env();

    let (stdout, stderr, ok) = run_grocer(&config, &["rules"]);
    assert!(ok, "rules failed: {}", stderr);
    let v = json_stdout(&stdout);
    let ids: Vec<&str> = v
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"house_salsa"));
    assert!(ids.contains(&"chicken_breast"));
}

#[test]
fn test_rank_offline() {
    let (tmp, config) = setup_test_env();
    let candidates = tmp.path().join("candidates.json");
    fs::write(
        &candidates,
        r#"[
            {"id": "1", "description": "Purina Chicken Dog Food", "categories": ["Pet Care"]},
            {"id": "2", "description": "Breaded Chicken Breast Nuggets", "categories": ["Frozen"]},
            {"id": "3", "description": "Boneless Skinless Chicken Breast", "categories": ["Meat & Seafood"]},
            {"id": "4", "description": "Chicken Breast Tenderloins", "stockLevel": "TEMPORARILY_OUT_OF_STOCK"}
        ]"#,
    )
    .unwrap();

    let (stdout, stderr, ok) = run_grocer(
        &config,
        &["rank", "chicken breast", "--file", candidates.to_str().unwrap()],
    );
    assert!(ok, "rank failed: {}", stderr);

    let v = json_stdout(&stdout);
    assert_eq!(v["rule"], "chicken_breast");
    assert_eq!(v["ranked"][0]["id"], "3");
    assert_eq!(v["ranked"].as_array().unwrap().len(), 2);

    let excluded = v["excluded"].as_array().unwrap();
    assert_eq!(excluded.len(), 2);
    assert_eq!(excluded[0]["reason"], "pet_food");
    assert_eq!(excluded[1]["reason"], "out_of_stock");
}

#[test]
fn test_stats_and_sweep_on_empty_store() {
    let (_tmp, config) = setup_test_env();
    run_grocer(&config, &["init"]);

    let (stdout, stderr, ok) = run_grocer(&config, &["stats", "--json"]);
    assert!(ok, "stats failed: {}", stderr);
    let v = json_stdout(&stdout);
    assert_eq!(v["cache_entries"], 0);
    assert_eq!(v["rate_windows"], 0);

    let (stdout, stderr, ok) = run_grocer(&config, &["sweep"]);
    assert!(ok, "sweep failed: {}", stderr);
    assert_eq!(json_stdout(&stdout)["cache_entries"], 0);
}

#[test]
fn test_invalid_config_is_rejected() {
    let (tmp, _) = setup_test_env();
    let bad = tmp.path().join("bad.toml");
    fs::write(
        &bad,
        format!(
            "[db]\npath = \"{}/x.sqlite\"\n\n[rate_limit]\nper_second = 50\nper_hour = 10\n",
            tmp.path().display()
        ),
    )
    .unwrap();

    let (_, stderr, ok) = run_grocer(&bad, &["rules"]);
    assert!(!ok);
    assert!(stderr.contains("rate_limit.per_second"));
}

#[test]
fn test_missing_config_file() {
    let (tmp, _) = setup_test_env();
    let (_, stderr, ok) = run_grocer(&tmp.path().join("nope.toml"), &["init"]);
    assert!(!ok);
    assert!(stderr.contains("Failed to read config file"));
}

async fn milk_products() -> Json<Value> {
    Json(json!({
        "data": [{
            "productId": "0001111041600",
            "description": "Kroger Whole Milk",
            "categories": ["Dairy"],
            "items": [{ "size": "1 gal", "soldBy": "UNIT", "price": { "regular": 3.79 } }]
        }],
        "meta": { "pagination": { "total": 1 } }
    }))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_warm_persists_before_exit() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let app = Router::new().route("/products", get(milk_products));
        axum::serve(listener, app).await.unwrap();
    });

    let (_tmp, config) = setup_test_env_with_upstream(&base);
    let ((warm_out, warm_err, warm_ok), (stats_out, stats_err, stats_ok)) =
        tokio::task::spawn_blocking(move || {
            let warm = run_grocer(&config, &["warm", "whole milk"]);
            let stats = run_grocer(&config, &["stats", "--json"]);
            (warm, stats)
        })
        .await
        .unwrap();

    assert!(warm_ok, "warm failed: {}", warm_err);
    assert_eq!(json_stdout(&warm_out)["warmed"][0], "whole milk");

    assert!(stats_ok, "stats failed: {}", stats_err);
    let v = json_stdout(&stats_out);
    assert_eq!(v["cache_entries"], 1);
    assert_eq!(v["live_entries"], 1);
}
