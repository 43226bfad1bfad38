//! Context directory layout and version listing.

use std::fs;

use tempfile::TempDir;

use pocketmc::Context;


#[test]
fn directories_layout() {

    let tmp_dir = TempDir::new().unwrap();
    let main_dir = tmp_dir.path().join("main");
    let work_dir = tmp_dir.path().join("work");

    let context = Context::new_with_work_dir(&main_dir, &work_dir);
    assert_eq!(context.versions_dir, main_dir.join("versions"));
    assert_eq!(context.assets_dir, main_dir.join("assets"));
    assert_eq!(context.libraries_dir, main_dir.join("libraries"));
    assert_eq!(context.jvm_dir, main_dir.join("jvm"));
    assert_eq!(context.work_dir, work_dir);
    // The per-launch bin directory lives in the working directory.
    assert_eq!(context.bin_dir, work_dir.join("bin"));

    // With a single directory, the working directory is the main one.
    let context = Context::new(&main_dir);
    assert_eq!(context.work_dir, main_dir);

}

#[test]
fn list_versions() {

    let tmp_dir = TempDir::new().unwrap();
    let context = Context::new(tmp_dir.path());

    assert_eq!(context.list_versions().count(), 0);
    assert!(!context.has_version_metadata("1.19.4"));

    // Only directories with a matching metadata file are listed.
    fs::create_dir_all(context.version_dir("1.19.4")).unwrap();
    fs::write(context.version_metadata_file("1.19.4"), "{}").unwrap();
    fs::create_dir_all(context.version_dir("no-metadata")).unwrap();

    let versions = context.list_versions().collect::<Vec<_>>();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].0, "1.19.4");
    assert!(context.has_version_metadata("1.19.4"));
    assert!(!context.has_version_metadata("no-metadata"));

}
