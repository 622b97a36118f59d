use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn arbor() -> Command {
    Command::new(env!("CARGO_BIN_EXE_arbor"))
}

fn create_foo() -> TempDir {
    let temp = TempDir::new().unwrap();
    let foo = temp.path().join("foo");
    fs::create_dir_all(foo.join("bar")).unwrap();
    fs::create_dir_all(foo.join("baz")).unwrap();
    fs::write(foo.join("bar/bar0"), "").unwrap();
    fs::write(foo.join("bar/bar1"), "").unwrap();
    fs::write(foo.join("baz/baz0"), "").unwrap();
    temp
}

#[test]
fn test_prints_tree() {
    let temp = create_foo();
    let output = arbor()
        .current_dir(temp.path())
        .args(["-j", "2", "--stats", "foo"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let expected = "\
┌──foo
├┬─bar
│├──bar0
│└──bar1
└┬─baz
 └──baz0

2 directories, 3 files
";
    assert_eq!(stdout, expected);
}

#[test]
fn test_json_export() {
    let temp = create_foo();
    let output = arbor()
        .current_dir(temp.path())
        .args(["--json", "foo"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["name"], "foo");
    assert_eq!(json["children"][0]["name"], "bar");
    assert_eq!(json["children"][1]["children"][0]["name"], "baz0");
}

#[test]
fn test_zero_concurrency_rejected() {
    let temp = create_foo();
    let output = arbor()
        .current_dir(temp.path())
        .args(["-j", "0", "foo"])
        .output()
        .unwrap();

    assert!(!output.status.success());
}
