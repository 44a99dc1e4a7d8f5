use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

fn write_file(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn ttree(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ttree"))
        .args(args)
        .output()
        .unwrap()
}

fn json_output(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8(output.stdout.clone()).unwrap();
    serde_json::from_str(&stdout).unwrap()
}

fn child_names(node: &serde_json::Value) -> Vec<String> {
    node.get("children")
        .and_then(|c| c.as_array())
        .map(|children| {
            children
                .iter()
                .map(|c| c["name"].as_str().unwrap().to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn cli_json_respects_gitignore_and_default_ignores() {
    let dir = tempdir().unwrap();

    write_file(&dir.path().join("a.txt"), "hello world\n");
    write_file(&dir.path().join("sub/b.txt"), "ignored content\n");
    write_file(&dir.path().join("node_modules/pkg/index.js"), "module.exports = 1;\n");
    write_file(&dir.path().join(".gitignore"), "sub\n");

    let output = ttree(&[dir.path().to_str().unwrap(), "--json"]);
    assert!(output.status.success());

    let v = json_output(&output);
    let names = child_names(&v["tree"]);

    assert!(names.contains(&"a.txt".to_string()));
    assert!(!names.contains(&"sub".to_string()));
    assert!(!names.contains(&"node_modules".to_string()));

    assert_eq!(v["tree"]["type"], "directory");
    assert_eq!(v["stats"]["totalDirectories"], 1);
    assert_eq!(v["stats"]["totalFiles"], 2);
    assert!(v["stats"]["totalTokens"].as_u64().unwrap() > 0);
    assert!(v.get("costs").is_none());
}

#[test]
fn cli_directory_totals_survive_threshold() {
    let dir = tempdir().unwrap();

    write_file(&dir.path().join("docs/big.md"), &"word ".repeat(200));
    write_file(&dir.path().join("docs/small.md"), "hi");

    let full = json_output(&ttree(&[dir.path().to_str().unwrap(), "--json"]));
    let filtered = json_output(&ttree(&[
        dir.path().to_str().unwrap(),
        "--json",
        "--threshold",
        "50",
    ]));

    let docs_full = &full["tree"]["children"][0];
    let docs_filtered = &filtered["tree"]["children"][0];

    assert_eq!(child_names(docs_full), vec!["big.md", "small.md"]);
    assert_eq!(child_names(docs_filtered), vec!["big.md"]);
    assert_eq!(docs_full["tokens"], docs_filtered["tokens"]);
    assert_eq!(full["stats"]["totalTokens"], filtered["stats"]["totalTokens"]);
}

#[test]
fn cli_text_output_has_tree_and_stats() {
    let dir = tempdir().unwrap();

    write_file(&dir.path().join("src/main.rs"), "fn main() {}\n");
    write_file(&dir.path().join("logo.png"), "binary-ish");

    let output = ttree(&[dir.path().to_str().unwrap(), "--no-color", "--sort", "tokens"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("├── src/ ("));
    assert!(stdout.contains("│   └── main.rs ("));
    assert!(stdout.contains("└── logo.png (0 tokens)"));
    assert!(stdout.contains("\nTotal: "));
    assert!(stdout.contains("Files: 2, Directories: 2"));
    assert!(!stdout.contains('\u{1b}'));
}

#[test]
fn cli_no_files_and_max_depth() {
    let dir = tempdir().unwrap();

    write_file(&dir.path().join("a/b/c/deep.txt"), "deep text");
    write_file(&dir.path().join("top.txt"), "top");

    let output = ttree(&[
        dir.path().to_str().unwrap(),
        "--json",
        "--no-files",
        "-d",
        "1",
    ]);
    assert!(output.status.success());

    let v = json_output(&output);
    assert_eq!(child_names(&v["tree"]), vec!["a"]);
    assert_eq!(child_names(&v["tree"]["children"][0]), vec!["b"]);
    assert_eq!(child_names(&v["tree"]["children"][0]["children"][0]), Vec::<String>::new());
    assert_eq!(v["stats"]["totalFiles"], 0);
}

#[test]
fn cli_cost_json() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a.txt"), "some text to price\n");

    let output = ttree(&[
        dir.path().to_str().unwrap(),
        "--json",
        "--cost",
        "--models",
        "gpt-4o,gpt-4o-mini",
    ]);
    assert!(output.status.success());

    let v = json_output(&output);
    let costs = v["costs"].as_array().unwrap();
    assert_eq!(costs.len(), 2);
    assert_eq!(costs[0]["modelId"], "gpt-4o");
}

#[test]
fn cli_negative_threshold_is_config_error() {
    let dir = tempdir().unwrap();

    let output = ttree(&[dir.path().to_str().unwrap(), "--json", "--threshold", "-1"]);
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8(output.stderr).unwrap();
    let line = stderr.lines().last().unwrap();
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert!(v["error"].as_str().unwrap().contains("threshold"));
}

#[test]
fn cli_zero_max_depth_is_config_error() {
    let dir = tempdir().unwrap();
    let output = ttree(&[dir.path().to_str().unwrap(), "--max-depth", "0"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn cli_missing_root_exits_3() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");

    let output = ttree(&[missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(3));

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("error:"));
}

#[test]
fn cli_unknown_encoding_exits_4() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a.txt"), "hello");

    let output = ttree(&[dir.path().to_str().unwrap(), "-e", "no-such-encoding"]);
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn cli_completions() {
    let output = ttree(&["--completions", "bash"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("ttree"));
}
