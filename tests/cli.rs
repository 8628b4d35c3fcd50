//! End-to-end tests that drive the `sfs` binary against a scratch SQLite
//! database: init idempotence, CSV load, search through the SQLite LIKE
//! path (including literal metacharacters), browse, clear, and stats.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn sfs_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("sfs");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    fs::write(
        data_dir.join("products.csv"),
        "id,title,brand,category,product_type,sku,price,rating,stock\n\
         1,Wireless Mouse,Logitech,Electronics,peripheral,LOG-001,24.99,4.7,10\n\
         2,Mechanical Keyboard,Keychron,Electronics,peripheral,KEY-002,89.00,4.8,5\n\
         3,100% Cotton Shirt,Zara,Clothing,apparel,ZAR-003,19.99,4.2,20\n",
    )
    .unwrap();

    let config_content = format!(
        r#"[db]
path = "{root}/data/catalog.sqlite"

[cache]
backend = "memory"

[ingest]
batch_size = 1000
csv_path = "{root}/data/products.csv"

[server]
bind = "127.0.0.1:7601"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("storefront.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_sfs(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = sfs_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run sfs binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_sfs(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_sfs(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_sfs(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_load_reports_counts() {
    let (_tmp, config_path) = setup_test_env();

    run_sfs(&config_path, &["init"]);
    let (stdout, stderr, success) = run_sfs(&config_path, &["load"]);
    assert!(success, "load failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Parsed 3 valid records"));
    assert!(stdout.contains("inserted:   3"));
    assert!(stdout.contains("duplicates: 0"));
}

#[test]
fn test_reload_counts_duplicates() {
    let (_tmp, config_path) = setup_test_env();

    run_sfs(&config_path, &["init"]);
    run_sfs(&config_path, &["load"]);
    let (stdout, _, success) = run_sfs(&config_path, &["load"]);
    assert!(success);
    assert!(stdout.contains("inserted:   0"));
    assert!(stdout.contains("duplicates: 3"));
}

#[test]
fn test_search_finds_loaded_products() {
    let (_tmp, config_path) = setup_test_env();

    run_sfs(&config_path, &["init"]);
    run_sfs(&config_path, &["load"]);

    let (stdout, stderr, success) = run_sfs(&config_path, &["search", "mouse"]);
    assert!(success, "search failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Wireless Mouse"));
    assert!(stdout.contains("1 matches"));
}

#[test]
fn test_search_matches_like_metacharacters_literally() {
    let (_tmp, config_path) = setup_test_env();

    run_sfs(&config_path, &["init"]);
    run_sfs(&config_path, &["load"]);

    // "100%" must match only the shirt, not act as a wildcard.
    let (stdout, _, success) = run_sfs(&config_path, &["search", "100%"]);
    assert!(success);
    assert!(stdout.contains("100% Cotton Shirt"));
    assert!(stdout.contains("1 matches"));
}

#[test]
fn test_search_no_matches_is_not_an_error() {
    let (_tmp, config_path) = setup_test_env();

    run_sfs(&config_path, &["init"]);
    run_sfs(&config_path, &["load"]);

    let (stdout, _, success) = run_sfs(&config_path, &["search", "zzzzz"]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_search_price_sort() {
    let (_tmp, config_path) = setup_test_env();

    run_sfs(&config_path, &["init"]);
    run_sfs(&config_path, &["load"]);

    let (stdout, _, success) =
        run_sfs(&config_path, &["search", "peripheral", "--sort", "price_asc"]);
    assert!(success);
    let mouse = stdout.find("Wireless Mouse").expect("mouse in results");
    let keyboard = stdout.find("Mechanical Keyboard").expect("keyboard in results");
    assert!(mouse < keyboard, "cheaper product must come first");
}

#[test]
fn test_suggest_returns_prefix_matches() {
    let (_tmp, config_path) = setup_test_env();

    run_sfs(&config_path, &["init"]);
    run_sfs(&config_path, &["load"]);

    let (stdout, _, success) = run_sfs(&config_path, &["suggest", "me"]);
    assert!(success);
    assert!(stdout.contains("Mechanical Keyboard"));
    assert!(!stdout.contains("Wireless Mouse"));
}

#[test]
fn test_browse_by_category() {
    let (_tmp, config_path) = setup_test_env();

    run_sfs(&config_path, &["init"]);
    run_sfs(&config_path, &["load"]);

    let (stdout, _, success) = run_sfs(&config_path, &["browse", "category", "Electronics"]);
    assert!(success);
    assert!(stdout.contains("2 matches"));
    // rating desc: keyboard (4.8) before mouse (4.7)
    let keyboard = stdout.find("Mechanical Keyboard").unwrap();
    let mouse = stdout.find("Wireless Mouse").unwrap();
    assert!(keyboard < mouse);
}

#[test]
fn test_top_rated() {
    let (_tmp, config_path) = setup_test_env();

    run_sfs(&config_path, &["init"]);
    run_sfs(&config_path, &["load"]);

    let (stdout, _, success) = run_sfs(&config_path, &["top"]);
    assert!(success);
    assert!(stdout.contains("Mechanical Keyboard"));
    assert!(stdout.contains("Wireless Mouse"));
    assert!(!stdout.contains("Cotton Shirt"), "4.2 is below the threshold");
}

#[test]
fn test_clear_empties_catalog() {
    let (_tmp, config_path) = setup_test_env();

    run_sfs(&config_path, &["init"]);
    run_sfs(&config_path, &["load"]);

    let (stdout, _, success) = run_sfs(&config_path, &["clear"]);
    assert!(success);
    assert!(stdout.contains("Deleted 3 products."));

    let (stdout, _, success) = run_sfs(&config_path, &["search", "mouse"]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_stats_reports_catalog_shape() {
    let (_tmp, config_path) = setup_test_env();

    run_sfs(&config_path, &["init"]);
    run_sfs(&config_path, &["load"]);

    let (stdout, _, success) = run_sfs(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Products:    3"));
    assert!(stdout.contains("Categories:  2"));
    assert!(stdout.contains("Brands:      3"));
}
