use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn graphviz_available() -> bool {
    Command::new("dot").arg("-V").output().map(|o| o.status.success()).unwrap_or(false)
}

fn graph_cmd(src: &Path, out: &Path) -> Command {
    let mut cmd = Command::cargo_bin("md-link-graph").unwrap();
    cmd.arg("graph").arg(src).arg("-o").arg(out).arg("-n").arg("links");
    cmd
}

#[test]
fn graph_writes_dot_and_reports_rasterizer_outcome() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("docs");
    write(&src.join("a.md"), "# A\n[b](./b.md)\n");
    write(&src.join("b.md"), "# B\nno links\n");
    let out = dir.path().join("out");

    let assert = graph_cmd(&src, &out).assert();
    if graphviz_available() {
        assert
            .success()
            .stdout(predicate::str::contains("Markdown files"))
            .stdout(predicate::str::contains("Internal links"));
        assert!(out.join("links.svg").is_file());
    } else {
        assert.code(1).stderr(predicate::str::contains("Graphviz"));
    }

    let dot = fs::read_to_string(out.join("links.dot")).unwrap();
    assert!(dot.starts_with("digraph markdown_links {"));
    assert!(dot.contains("node_a_md -> node_b_md [label=\"b (L2)\"];"));
    assert!(dot.contains("node_b_md [label=\"b.md\", fillcolor=\"lightblue\""));
}

#[test]
fn rasterizer_failure_keeps_dot_and_exits_nonzero() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("docs");
    write(&src.join("a.md"), "[missing](./c.md)\n");
    write(&src.join("md-link-graph.toml"), "[dot]\nprogram = \"md-link-graph-no-such-binary\"\n");
    let out = dir.path().join("out");

    graph_cmd(&src, &out)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Rendering svg failed"))
        .stderr(predicate::str::contains("apt-get install graphviz"));

    let dot = fs::read_to_string(out.join("links.dot")).unwrap();
    assert!(dot.contains("node_c_md [label=\"c.md\", fillcolor=\"lightcoral\""));
    assert!(!out.join("links.svg").exists());
}

#[test]
fn zero_markdown_files_is_not_an_error() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("empty");
    fs::create_dir_all(&src).unwrap();
    write(&src.join("notes.txt"), "[x](y.md)");
    let out = dir.path().join("out");

    graph_cmd(&src, &out)
        .assert()
        .success()
        .stdout(predicate::str::contains("No markdown files found"));
    assert!(!out.join("links.dot").exists());
}

#[test]
fn missing_directory_fails() {
    let dir = tempdir().unwrap();
    graph_cmd(&dir.path().join("nope"), &dir.path().join("out"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Directory not found"));
}

#[test]
fn quiet_suppresses_stdout() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("empty");
    fs::create_dir_all(&src).unwrap();
    graph_cmd(&src, &dir.path().join("out")).arg("--quiet").assert().success().stdout(predicate::str::is_empty());
}

#[test]
fn flags_shape_the_dot_output() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("docs");
    write(&src.join("a.md"), "[b](b.md)\n[site](https://example.com/page#top)\n");
    write(&src.join("b.md"), "");
    write(&src.join("lonely.md"), "nothing here\n");
    write(&src.join("md-link-graph.toml"), "[dot]\nprogram = \"md-link-graph-no-such-binary\"\n");
    let out = dir.path().join("out");

    // default: lonely.md shown, external link leaves no trace
    let _ = graph_cmd(&src, &out).assert().code(1);
    let dot = fs::read_to_string(out.join("links.dot")).unwrap();
    assert!(dot.contains("node_lonely_md"));
    assert!(!dot.contains("example.com"));
    assert!(!dot.contains("ext_"));

    let _ = graph_cmd(&src, &out)
        .args(["--include-external", "--hide-isolated", "--rankdir", "TB", "--theme", "dark"])
        .assert()
        .code(1);
    let dot = fs::read_to_string(out.join("links.dot")).unwrap();
    assert!(!dot.contains("node_lonely_md"));
    assert!(dot.contains("https://example.com/page#top"));
    assert!(dot.contains("shape=ellipse"));
    assert!(dot.contains("rankdir=TB;"));
    assert!(dot.contains("fontcolor=\"white\""));
}

#[test]
fn json_export_lists_nodes_and_edges() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("docs");
    write(&src.join("a.md"), "[b](b.md#intro)\n");
    write(&src.join("b.md"), "");
    write(&src.join("md-link-graph.toml"), "[dot]\nprogram = \"md-link-graph-no-such-binary\"\n");
    let out = dir.path().join("out");
    let json = dir.path().join("graph.json");

    let _ = graph_cmd(&src, &out).arg("--json").arg(&json).assert().code(1);
    let snap: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(snap["files"].as_array().unwrap().len(), 2);
    let edges = snap["edges"].as_array().unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0]["target"]["kind"], "file");
    assert!(edges[0]["target"]["id"].as_str().unwrap().ends_with("b.md"));
}

#[test]
fn completions_are_generated() {
    Command::cargo_bin("md-link-graph")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("md-link-graph"));
}
