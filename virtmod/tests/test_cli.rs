// Allow deprecated APIs (assert_cmd::cargo_bin is deprecated but still works)
#![allow(deprecated)]

use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*; // Used for writing assertions
use rstest::rstest;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::{tempdir, TempDir};

const ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M1 1"/></svg>"#;

/// Project with two icon directories, a patched dependency and a config file.
fn project() -> TempDir {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    for dir in ["icons", "more-icons"] {
        fs::create_dir_all(root.join(dir)).unwrap();
        fs::write(root.join(dir).join("home.svg"), ICON).unwrap();
    }
    fs::write(root.join("more-icons").join("gear.svg"), ICON).unwrap();

    let lib = root.join("node_modules").join("some-lib");
    fs::create_dir_all(&lib).unwrap();
    fs::write(
        lib.join("index.js"),
        "import './polyfill.css';\nexport const answer = 42;\n",
    )
    .unwrap();

    fs::write(
        root.join("virtmod.json"),
        r#"{
  "env": { "whitelist": ["API_URL"] },
  "icons": { "dirs": ["icons", "more-icons"] },
  "patches": [
    { "pathSuffix": "some-lib/index.js", "removeLine": "import './polyfill.css';" }
  ]
}"#,
    )
    .unwrap();
    tmp
}

fn virtmod(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("virtmod").unwrap();
    cmd.current_dir(root)
        .arg("--config")
        .arg(root.join("virtmod.json"));
    cmd
}

#[rstest(
    specifier,
    expected,
    case("virtual:fib", "virtual:fib"),
    case("virtual:env", "virtual:env"),
    case("virtual:svg-icons-register", "virtual:svg-icons-register"),
    case("virtual:unknown", "not handled"),
    case("react", "not handled")
)]
fn test_resolve(specifier: &str, expected: &str) -> Result<(), Box<dyn std::error::Error>> {
    let tmp = project();
    virtmod(tmp.path())
        .arg("resolve")
        .arg(specifier)
        .assert()
        .success()
        .stdout(predicate::str::contains(expected));
    Ok(())
}

#[test]
fn test_load_fib() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = project();
    virtmod(tmp.path())
        .args(["load", "virtual:fib"])
        .assert()
        .success()
        .stdout(predicate::str::contains("export default function fib(n)"));
    Ok(())
}

#[test]
fn test_load_env_is_whitelisted() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = project();
    virtmod(tmp.path())
        .env("API_URL", "https://x")
        .env("OTHER", "y")
        .args(["load", "virtual:env"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""API_URL": "https://x""#))
        .stdout(predicate::str::contains("OTHER").not());
    Ok(())
}

#[test]
fn test_load_unknown_virtual_fails() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = project();
    virtmod(tmp.path())
        .args(["load", "virtual:unknown"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("virtual:unknown"));
    Ok(())
}

#[test]
fn test_load_dependency_is_patched() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = project();
    virtmod(tmp.path())
        .args(["load", "some-lib"])
        .assert()
        .success()
        .stdout(predicate::eq("export const answer = 42;\n"));
    Ok(())
}

#[test]
fn test_sprite_has_one_symbol_per_stem() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = project();
    let output = tmp.path().join("sprite.svg");
    virtmod(tmp.path())
        .arg("sprite")
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("duplicate symbol id `icon-home`"));

    let sprite = fs::read_to_string(&output)?;
    assert_eq!(sprite.matches(r#"<symbol id="icon-home""#).count(), 1);
    assert_eq!(sprite.matches(r#"<symbol id="icon-gear""#).count(), 1);
    assert!(sprite.contains(r#"id="__svg__icons__dom__""#));
    Ok(())
}

#[test]
fn test_icon_markup() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = project();
    virtmod(tmp.path())
        .args(["icon", "gear"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r##"href="#icon-gear""##));

    virtmod(tmp.path())
        .args(["icon", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("icon-missing"));
    Ok(())
}

#[test]
fn test_patch_command() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = project();
    let file = tmp
        .path()
        .join("node_modules")
        .join("some-lib")
        .join("index.js");
    virtmod(tmp.path())
        .arg("patch")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("polyfill.css").not())
        .stdout(predicate::str::contains("export const answer = 42;"));
    Ok(())
}

#[test]
fn test_modules_listing() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = project();
    virtmod(tmp.path())
        .arg("modules")
        .assert()
        .success()
        .stdout(predicate::str::contains("virtual:env (env)"))
        .stdout(predicate::str::contains("virtual:fib (fib)"));
    Ok(())
}

#[test]
fn test_missing_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    Command::cargo_bin("virtmod")?
        .arg("--config")
        .arg(tmp.path().join("absent.json"))
        .arg("modules")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
    Ok(())
}
