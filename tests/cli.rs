//! End-to-end tests that run the `mdsite` binary against temp source trees.
//!
//! Run with: `cargo test --test cli`

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn mdsite(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mdsite"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run mdsite")
}

fn build(root: &Path) -> Output {
    mdsite(&[root.to_str().unwrap()])
}

fn write(root: &Path, relative: &str, contents: &[u8]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn builds_page_stylesheet_and_image() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let png: Vec<u8> = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]
        .into_iter()
        .chain((0..200).map(|i| i as u8))
        .collect();
    write(root, "index.md", b"%%\ntitle = Home\nstyle = style.scss\n%%\n# Home\n");
    write(root, "style.scss", b"$c: #336699;\nbody { h1 { color: $c; } }\n");
    write(root, "img.png", &png);

    let output = build(root);
    assert!(output.status.success(), "{}", stderr(&output));

    let html = fs::read_to_string(root.join("out/index.html")).unwrap();
    assert!(html.contains("<title>Home</title>"));
    assert!(html.contains(r#"href="style.css""#));
    assert!(html.contains("<h1>Home</h1>"));

    let css = fs::read_to_string(root.join("out/style.css")).unwrap();
    assert!(css.contains("body h1"));
    assert!(css.contains("#336699"));

    assert_eq!(fs::read(root.join("out/img.png")).unwrap(), png);
    assert!(!root.join("out/style.scss").exists());

    let log = stderr(&output);
    assert!(log.contains("generated 1 static files"));
    assert!(log.contains("copied 2 static assets"));
}

#[test]
fn missing_path_fails() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope");

    let output = build(&missing);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("error[input-not-found]"));
    assert!(!missing.exists());
}

#[test]
fn broken_stylesheet_fails_with_line() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "bad.scss", b"a {\n  color: red;\n}\nb { color: $nope; }\n");

    let output = build(tmp.path());

    assert!(!output.status.success());
    let log = stderr(&output);
    assert!(log.contains("error[stylesheet-transpile]"), "{log}");
    assert!(log.contains("(line 4)"), "{log}");
}

#[test]
fn keep_going_builds_the_rest_but_still_fails() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a.md", b"%%\nnot an option\n%%\n");
    write(tmp.path(), "b.md", b"# B\n");

    let output = mdsite(&["--keep-going", tmp.path().to_str().unwrap()]);

    assert!(!output.status.success());
    assert!(tmp.path().join("out/b.html").is_file());
    assert!(stderr(&output).contains("error[option-parse]"));
}

#[test]
fn config_keep_going_matches_flag() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "mdsite.toml", b"[build]\nkeep_going = true\n");
    write(tmp.path(), "a.md", b"%%\ntitle = x\n");
    write(tmp.path(), "b.md", b"# B\n");

    let output = build(tmp.path());

    assert!(!output.status.success());
    assert!(tmp.path().join("out/b.html").is_file());
    assert!(!tmp.path().join("out/mdsite.toml").exists());
}

#[test]
fn rebuilding_is_byte_identical() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "docs/page.md",
        b"%%\ntitle = Page\ncode = yes\nmath = yes\n%%\n```rust\nfn main() {}\n```\n\n$$e^{i\\pi}$$\n",
    );
    write(tmp.path(), "docs/page.scss", b"p { margin: 0; }\n");

    assert!(build(tmp.path()).status.success());
    let html = fs::read(tmp.path().join("out/docs/page.html")).unwrap();
    let css = fs::read(tmp.path().join("out/docs/page.css")).unwrap();

    assert!(build(tmp.path()).status.success());
    assert_eq!(fs::read(tmp.path().join("out/docs/page.html")).unwrap(), html);
    assert_eq!(fs::read(tmp.path().join("out/docs/page.css")).unwrap(), css);
}

#[test]
fn bad_config_fails() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "mdsite.toml", b"[server]\nport = \"high\"\n");
    write(tmp.path(), "index.md", b"# x\n");

    let output = build(tmp.path());

    assert!(!output.status.success());
    assert!(stderr(&output).contains("error[config]"));
}
