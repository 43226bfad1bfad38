//! JVM provisioning short path: an already installed component is probed for
//! its display version instead of hitting the network.

use std::fs;

use serde_json::json;
use tempfile::TempDir;

use pocketmc::install::Installer;
use pocketmc::Context;


#[test]
fn existing_jvm_release_version() {

    let tmp_dir = TempDir::new().unwrap();
    let context = Context::new(tmp_dir.path());

    let version_dir = context.version_dir("jvm-test");
    fs::create_dir_all(&version_dir).unwrap();
    fs::write(context.version_metadata_file("jvm-test"), serde_json::to_string(&json!({
        "mainClass": "a.B",
        "javaVersion": { "component": "java-runtime-gamma", "majorVersion": 17 },
    })).unwrap()).unwrap();

    // Fake an installed component with both unix and windows binary names.
    let bin_dir = context.jvm_dir.join("java-runtime-gamma").join("bin");
    fs::create_dir_all(&bin_dir).unwrap();
    fs::write(bin_dir.join("java"), b"").unwrap();
    fs::write(bin_dir.join("javaw.exe"), b"").unwrap();
    fs::write(context.jvm_dir.join("java-runtime-gamma").join("release"),
        "IMPLEMENTOR=\"Mojang\"\nJAVA_VERSION=\"17.0.8\"\n").unwrap();

    let mut installer = Installer::new(&context, "jvm-test");
    installer.prepare_meta().unwrap();
    installer.prepare_jvm().unwrap();

    assert_eq!(installer.jvm_version(), Some("17.0.8"));
    let exec = installer.jvm_exec().unwrap();
    assert!(exec.starts_with(context.jvm_dir.join("java-runtime-gamma")));
    assert_eq!(installer.pending_downloads(), 0);

}

#[test]
fn existing_jvm_without_release_file() {

    let tmp_dir = TempDir::new().unwrap();
    let context = Context::new(tmp_dir.path());

    let version_dir = context.version_dir("jvm-test");
    fs::create_dir_all(&version_dir).unwrap();
    // Without a 'javaVersion' object the component defaults to jre-legacy.
    fs::write(context.version_metadata_file("jvm-test"), r#"{ "mainClass": "a.B" }"#).unwrap();

    let bin_dir = context.jvm_dir.join("jre-legacy").join("bin");
    fs::create_dir_all(&bin_dir).unwrap();
    fs::write(bin_dir.join("java"), b"").unwrap();
    fs::write(bin_dir.join("javaw.exe"), b"").unwrap();

    let mut installer = Installer::new(&context, "jvm-test");
    installer.prepare_meta().unwrap();
    installer.prepare_jvm().unwrap();

    assert_eq!(installer.jvm_version(), Some("unknown"));

}
