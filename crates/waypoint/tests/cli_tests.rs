//! Integration tests for the waypoint CLI.
//!
//! These tests drive the compiled binary end to end in temporary directories.

use rstest::{fixture, rstest};
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

mod common;
use common::{run_json, run_waypoint_in_dir};

// ============================================================================
// Test Fixtures
// ============================================================================

/// Provides a fresh temporary directory for each test
#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Provides a temporary directory with an initialized waypoint repository
#[fixture]
fn initialized_dir() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp directory");
    let output = run_waypoint_in_dir(temp.path(), &["init", "--prefix", "test", "--quiet"]);
    assert!(
        output.status.success(),
        "Failed to initialize waypoint: {:?}",
        String::from_utf8_lossy(&output.stderr)
    );
    temp
}

/// Create an item through the CLI and return its id.
fn create_item(dir: &Path, title: &str, extra: &[&str]) -> String {
    let mut args = vec!["item", "create", title];
    args.extend_from_slice(extra);
    let item = run_json(dir, &args);
    item["id"].as_str().expect("item should have an id").to_string()
}

/// Add a dependency through the CLI and return the edge id.
fn add_dep(dir: &Path, from: &str, to: &str, edge_type: &str) -> String {
    let edge = run_json(dir, &["dep", "add", from, to, "--type", edge_type]);
    edge["id"].as_str().expect("edge should have an id").to_string()
}

fn ids(value: &Value) -> Vec<String> {
    value
        .as_array()
        .expect("expected a JSON array")
        .iter()
        .map(|item| item["id"].as_str().unwrap_or_default().to_string())
        .collect()
}

// ============================================================================
// Help and Setup Tests
// ============================================================================

#[rstest]
fn test_cli_help_shows_all_commands(temp_dir: TempDir) {
    let output = run_waypoint_in_dir(temp_dir.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    for command in ["init", "info", "item", "dep", "ready", "blocked", "plan"] {
        assert!(stdout.contains(command), "help should list '{command}'");
    }
}

#[rstest]
fn test_cli_no_args(temp_dir: TempDir) {
    let output = run_waypoint_in_dir(temp_dir.path(), &[]);
    assert!(output.status.success());
}

#[rstest]
fn test_cli_version(temp_dir: TempDir) {
    let output = run_waypoint_in_dir(temp_dir.path(), &["--version"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[rstest]
fn test_commands_fail_outside_repository(temp_dir: TempDir) {
    let output = run_waypoint_in_dir(temp_dir.path(), &["plan"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Not a waypoint repository"));
}

#[rstest]
fn test_init_creates_layout(temp_dir: TempDir) {
    let output = run_waypoint_in_dir(temp_dir.path(), &["init", "--prefix", "road"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Item prefix: road"));
    let waypoint_dir = temp_dir.path().join(".waypoint");
    assert!(waypoint_dir.join("config.yaml").exists());
    assert!(waypoint_dir.join("roadmap.jsonl").exists());
}

#[rstest]
fn test_init_twice_fails(initialized_dir: TempDir) {
    let output = run_waypoint_in_dir(initialized_dir.path(), &["init"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("already initialized"));
}

#[rstest]
fn test_commands_work_from_subdirectory(initialized_dir: TempDir) {
    let nested = initialized_dir.path().join("docs").join("notes");
    std::fs::create_dir_all(&nested).unwrap();

    let id = create_item(&nested, "From below", &[]);

    let items = run_json(initialized_dir.path(), &["item", "list"]);
    assert_eq!(ids(&items), [id]);
}

// ============================================================================
// Item Tests
// ============================================================================

#[rstest]
fn test_item_create_and_show(initialized_dir: TempDir) {
    let dir = initialized_dir.path();
    let id = create_item(dir, "Launch beta", &["-p", "1", "-b", "platform", "-e", "4"]);
    assert!(id.starts_with("test-"), "unexpected id {id}");

    let shown = run_json(dir, &["item", "show", &id]);
    assert_eq!(shown["title"], "Launch beta");
    assert_eq!(shown["status"], "planned");
    assert_eq!(shown["priority"], 1);
    assert_eq!(shown["branch"], "platform");
    assert_eq!(shown["effort_days"], 4);
}

#[rstest]
fn test_item_update_sets_and_clears(initialized_dir: TempDir) {
    let dir = initialized_dir.path();
    let id = create_item(dir, "Search", &["-o", "sam"]);

    let updated = run_json(
        dir,
        &["item", "update", &id, "-s", "in-progress", "--no-owner", "-m", "v2"],
    );

    assert_eq!(updated["status"], "in_progress");
    assert_eq!(updated["milestone"], "v2");
    assert!(updated.get("owner").is_none());
}

#[rstest]
fn test_item_show_unknown_fails(initialized_dir: TempDir) {
    let output = run_waypoint_in_dir(initialized_dir.path(), &["item", "show", "test-zzzz"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Item not found"));
}

#[rstest]
fn test_item_list_filters_by_branch(initialized_dir: TempDir) {
    let dir = initialized_dir.path();
    let platform = create_item(dir, "Platform work", &["-b", "platform"]);
    create_item(dir, "Data work", &["-b", "data"]);

    let items = run_json(dir, &["item", "list", "--branch", "platform"]);
    assert_eq!(ids(&items), [platform]);
}

#[rstest]
fn test_item_delete_cascades_dependencies(initialized_dir: TempDir) {
    let dir = initialized_dir.path();
    let a = create_item(dir, "A", &[]);
    let b = create_item(dir, "B", &[]);
    let c = create_item(dir, "C", &[]);
    add_dep(dir, &a, &b, "blocks");
    add_dep(dir, &c, &b, "requires");

    let deleted = run_json(dir, &["item", "delete", &b]);
    assert_eq!(deleted["deleted"], b.as_str());
    assert_eq!(deleted["removed_dependencies"].as_array().unwrap().len(), 2);

    let deps = run_json(dir, &["dep", "list", &a]);
    assert!(deps.as_array().unwrap().is_empty());
    let ready = run_json(dir, &["ready"]);
    assert_eq!(ready.as_array().unwrap().len(), 2);
}

// ============================================================================
// Dependency Tests
// ============================================================================

#[rstest]
fn test_dep_add_rejects_cycle_and_duplicate(initialized_dir: TempDir) {
    let dir = initialized_dir.path();
    let a = create_item(dir, "A", &[]);
    let b = create_item(dir, "B", &[]);
    let edge_id = add_dep(dir, &a, &b, "blocks");
    assert!(edge_id.contains('-'));

    let reverse = run_waypoint_in_dir(dir, &["dep", "add", &b, &a]);
    assert!(!reverse.status.success());
    assert!(String::from_utf8_lossy(&reverse.stderr).contains("cycle"));

    let duplicate = run_waypoint_in_dir(dir, &["dep", "add", &a, &b, "--type", "related"]);
    assert!(!duplicate.status.success());
    assert!(String::from_utf8_lossy(&duplicate.stderr).contains("already exists"));

    let self_loop = run_waypoint_in_dir(dir, &["dep", "add", &a, &a]);
    assert!(!self_loop.status.success());
}

#[rstest]
fn test_dep_add_unknown_item_fails(initialized_dir: TempDir) {
    let dir = initialized_dir.path();
    let a = create_item(dir, "A", &[]);

    let output = run_waypoint_in_dir(dir, &["dep", "add", &a, "test-zzzz"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid item reference"));
}

#[rstest]
fn test_dep_check_reports_without_writing(initialized_dir: TempDir) {
    let dir = initialized_dir.path();
    let a = create_item(dir, "A", &[]);
    let b = create_item(dir, "B", &[]);
    add_dep(dir, &a, &b, "requires");

    let check = run_json(dir, &["dep", "check", &b, &a]);
    assert_eq!(check["would_create_cycle"], true);
    let check = run_json(dir, &["dep", "check", &a, &b]);
    assert_eq!(check["would_create_cycle"], false);

    let deps = run_json(dir, &["dep", "list", &b]);
    assert!(deps.as_array().unwrap().is_empty());
}

#[rstest]
fn test_dep_list_reverse_and_type_change(initialized_dir: TempDir) {
    let dir = initialized_dir.path();
    let a = create_item(dir, "A", &[]);
    let b = create_item(dir, "B", &[]);
    let edge_id = add_dep(dir, &a, &b, "blocks");

    let dependents = run_json(dir, &["dep", "list", &b, "--reverse"]);
    assert_eq!(dependents[0]["source_id"], a.as_str());
    assert_eq!(dependents[0]["type"], "blocks");

    let changed = run_json(dir, &["dep", "type", &edge_id, "related"]);
    assert_eq!(changed["type"], "related");
    assert_eq!(changed["id"], edge_id.as_str());

    let ready = run_json(dir, &["ready"]);
    assert!(ids(&ready).contains(&a));
}

#[rstest]
fn test_dep_remove(initialized_dir: TempDir) {
    let dir = initialized_dir.path();
    let a = create_item(dir, "A", &[]);
    let b = create_item(dir, "B", &[]);
    let edge_id = add_dep(dir, &a, &b, "blocks");

    let removed = run_json(dir, &["dep", "remove", &edge_id]);
    assert_eq!(removed["id"], edge_id.as_str());

    let again = run_waypoint_in_dir(dir, &["dep", "remove", &edge_id]);
    assert!(!again.status.success());
    assert!(String::from_utf8_lossy(&again.stderr).contains("Dependency not found"));

    // The reverse direction is legal once the edge is gone.
    add_dep(dir, &b, &a, "blocks");
}

#[rstest]
fn test_dep_tree_text_and_json(initialized_dir: TempDir) {
    let dir = initialized_dir.path();
    let launch = create_item(dir, "Launch", &[]);
    let api = create_item(dir, "API", &[]);
    let schema = create_item(dir, "Schema", &[]);
    add_dep(dir, &launch, &api, "blocks");
    add_dep(dir, &api, &schema, "requires");

    let output = run_waypoint_in_dir(dir, &["dep", "tree", &launch]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&launch));
    assert!(stdout.contains(&api));
    assert!(stdout.contains(&schema));
    assert!(stdout.contains("(requires)"));

    let tree = run_json(dir, &["dep", "tree", &launch, "--depth", "1"]);
    assert_eq!(tree["id"], launch.as_str());
    let children = tree["dependencies"].as_array().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0]["id"], api.as_str());
    assert!(children[0]["dependencies"].as_array().unwrap().is_empty());
}

#[rstest]
fn test_dep_cycles_empty_for_acyclic_graph(initialized_dir: TempDir) {
    let dir = initialized_dir.path();
    let a = create_item(dir, "A", &[]);
    let b = create_item(dir, "B", &[]);
    add_dep(dir, &a, &b, "blocks");

    let cycles = run_json(dir, &["dep", "cycles"]);
    assert!(cycles.as_array().unwrap().is_empty());
}

// ============================================================================
// Planning Tests
// ============================================================================

#[rstest]
fn test_ready_blocked_and_plan(initialized_dir: TempDir) {
    let dir = initialized_dir.path();
    let release = create_item(dir, "Release", &[]);
    let build = create_item(dir, "Build", &[]);
    let design = create_item(dir, "Design", &[]);
    add_dep(dir, &release, &build, "blocks");
    add_dep(dir, &build, &design, "requires");

    let ready = run_json(dir, &["ready"]);
    assert_eq!(ids(&ready), [design.clone()]);

    let blocked = run_json(dir, &["blocked"]);
    let blocked_ids: Vec<&str> = blocked
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|entry| entry["item"]["id"].as_str())
        .collect();
    assert_eq!(blocked_ids.len(), 2);
    assert!(blocked_ids.contains(&release.as_str()));
    assert!(blocked_ids.contains(&build.as_str()));

    let plan = run_json(dir, &["plan"]);
    assert_eq!(ids(&plan), [design.clone(), build.clone(), release.clone()]);

    run_json(dir, &["item", "update", &design, "-s", "completed"]);
    let ready = run_json(dir, &["ready"]);
    assert_eq!(ids(&ready), [build.clone()]);
    let plan = run_json(dir, &["plan"]);
    assert_eq!(ids(&plan), [build.clone(), release.clone()]);
    let plan = run_json(dir, &["plan", "--all"]);
    assert_eq!(ids(&plan).len(), 3);
}

#[rstest]
fn test_info_counts(initialized_dir: TempDir) {
    let dir = initialized_dir.path();
    let a = create_item(dir, "A", &["-b", "platform", "-e", "3"]);
    let b = create_item(dir, "B", &["-b", "platform", "-e", "2"]);
    add_dep(dir, &a, &b, "blocks");

    let info = run_json(dir, &["info"]);
    assert_eq!(info["item_prefix"], "test");
    assert_eq!(info["items"]["total"], 2);
    assert_eq!(info["items"]["planned"], 2);
    assert_eq!(info["dependencies"], 1);
    assert_eq!(info["branches"][0]["branch"], "platform");
    assert_eq!(info["branches"][0]["effort_days"], 5);
}

#[rstest]
fn test_text_output_is_readable(initialized_dir: TempDir) {
    let dir = initialized_dir.path();
    let output = run_waypoint_in_dir(dir, &["ready"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No ready items found."));

    let output = run_waypoint_in_dir(dir, &["item", "create", "Text mode"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Created item: test-"));
}
