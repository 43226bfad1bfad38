//! Launch preparation and startup with injected runner and bin directory.

use std::cell::RefCell;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;
use std::fs;

use serde_json::json;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use pocketmc::install::Installer;
use pocketmc::launch::{self, Start, StartOptions};
use pocketmc::Context;


/// Write a ready-to-launch fake version: metadata plus an existing JAR.
fn prepare_context(tmp_dir: &TempDir, id: &str, metadata: &serde_json::Value) -> Context {

    let context = Context::new_with_work_dir(
        tmp_dir.path().join("main"),
        tmp_dir.path().join("work"));

    let version_dir = context.version_dir(id);
    fs::create_dir_all(&version_dir).unwrap();
    fs::write(context.version_metadata_file(id), serde_json::to_string(metadata).unwrap()).unwrap();
    fs::write(version_dir.join(format!("{id}.jar")), b"fake jar").unwrap();
    fs::create_dir_all(&context.work_dir).unwrap();

    context

}

#[test]
fn legacy_arguments_and_replacements() {

    let tmp_dir = TempDir::new().unwrap();
    let context = prepare_context(&tmp_dir, "legacy", &json!({
        "mainClass": "net.minecraft.client.Minecraft",
        "type": "release",
        "minecraftArguments": "--username ${auth_player_name} --session ${auth_session} --custom ${unknown_token}",
    }));

    let mut installer = Installer::new(&context, "legacy");
    installer.prepare_meta().unwrap();
    installer.prepare_jar().unwrap();
    installer.prepare_libraries().unwrap();

    let mut start = Start::new(&installer);
    let mut opts = StartOptions::with_offline(
        Some("SomeVeryLongUsername".to_string()),
        Some("123E4567-E89B-12D3-A456-426614174000".to_string()));
    opts.jvm_exec = Some(PathBuf::from("java"));
    opts.disable_chat = true;
    opts.server_address = Some("mc.example.com".to_string());
    opts.server_port = Some(25599);
    start.prepare(&opts).unwrap();

    // The UUID is always 32 lowercase hex characters, the username at most
    // 16 characters.
    let uuid = start.uuid().unwrap();
    assert_eq!(uuid, "123e4567e89b12d3a456426614174000");
    assert_eq!(start.username().unwrap(), "SomeVeryLongUser");

    let repl = &start.args_replacements;
    assert_eq!(repl["user_properties"], "{}");
    assert_eq!(repl["version_type"], "release");
    assert_eq!(repl["version_name"], "legacy");
    assert_eq!(repl["auth_access_token"], "");
    assert_eq!(repl["auth_session"], "");
    assert_eq!(repl["user_type"], "");
    assert!(repl["classpath"].contains("legacy.jar"));

    // Without modern arguments the built-in JVM template applies.
    assert!(start.jvm_args.contains(&"-cp".to_string()));
    assert!(start.jvm_args.contains(&"${classpath}".to_string()));
    assert!(start.jvm_args.contains(&"-Djava.library.path=${natives_directory}".to_string()));

    // Legacy game arguments split on spaces, flags appended after.
    assert_eq!(start.game_args[0], "--username");
    assert_eq!(start.game_args[1], "${auth_player_name}");
    assert!(start.game_args.contains(&"--disableChat".to_string()));
    let server_pos = start.game_args.iter().position(|a| a == "--server").unwrap();
    assert_eq!(start.game_args[server_pos + 1], "mc.example.com");
    let port_pos = start.game_args.iter().position(|a| a == "--port").unwrap();
    assert_eq!(start.game_args[port_pos + 1], "25599");

}

#[test]
fn modern_arguments_and_features() {

    let tmp_dir = TempDir::new().unwrap();
    let context = prepare_context(&tmp_dir, "modern", &json!({
        "mainClass": "net.minecraft.client.main.Main",
        "type": "snapshot",
        "arguments": {
            "jvm": [ "-Xss1M", "-cp", "${classpath}" ],
            "game": [
                "--gameDir", "${game_directory}",
                {
                    "rules": [{ "action": "allow", "features": { "has_custom_resolution": true } }],
                    "value": ["--width", "${resolution_width}", "--height", "${resolution_height}"]
                },
            ],
        },
    }));

    let mut installer = Installer::new(&context, "modern");
    installer.prepare_meta().unwrap();
    installer.prepare_jar().unwrap();
    installer.prepare_libraries().unwrap();

    let mut start = Start::new(&installer);
    let mut opts = StartOptions::default();
    opts.jvm_exec = Some(PathBuf::from("java"));
    opts.resolution = Some((1280, 720));
    start.prepare(&opts).unwrap();

    assert_eq!(start.main_class.as_deref(), Some("net.minecraft.client.main.Main"));
    assert_eq!(start.jvm_args[1], "-Xss1M");
    assert!(start.game_args.contains(&"--width".to_string()));
    assert_eq!(start.args_replacements["resolution_width"], "1280");

    // Without an explicit identity, a random UUID drives the username.
    let uuid = start.uuid().unwrap().to_string();
    assert_eq!(uuid.len(), 32);
    assert!(uuid.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_eq!(start.username().unwrap(), &uuid[..8]);

}

#[test]
fn start_extracts_natives_and_substitutes() {

    let tmp_dir = TempDir::new().unwrap();

    // A fake native archive with entries that must not be extracted.
    let native_rel_path = "com/example/native/1.0/native-1.0-natives-all.jar";
    let native_data = {
        let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.start_file("libnative.so", options).unwrap();
        writer.write_all(b"elf").unwrap();
        writer.start_file("META-INF/MANIFEST.MF", options).unwrap();
        writer.write_all(b"Manifest-Version: 1.0").unwrap();
        writer.start_file("libnative.so.sha1", options).unwrap();
        writer.write_all(b"0000").unwrap();
        writer.finish().unwrap().into_inner()
    };

    let context = prepare_context(&tmp_dir, "natives", &json!({
        "mainClass": "net.minecraft.client.Minecraft",
        "minecraftArguments": "--username ${auth_player_name}",
        "libraries": [
            {
                "name": "com.example:native:1.0",
                "natives": { "linux": "natives-all", "windows": "natives-all", "osx": "natives-all" },
                "downloads": {
                    "classifiers": {
                        "natives-all": {
                            "path": native_rel_path,
                            "url": "https://example.com/native.jar",
                            "size": native_data.len(),
                            "sha1": null,
                        },
                    },
                },
            },
        ],
    }));

    // Pre-install the native archive so nothing needs to be downloaded.
    let native_file = context.libraries_dir.join(native_rel_path);
    fs::create_dir_all(native_file.parent().unwrap()).unwrap();
    fs::write(&native_file, &native_data).unwrap();

    let mut installer = Installer::new(&context, "natives");
    installer.prepare_meta().unwrap();
    installer.prepare_jar().unwrap();
    installer.prepare_libraries().unwrap();
    assert_eq!(installer.pending_downloads(), 0);
    assert_eq!(installer.native_libs(), [native_file.clone()]);

    let mut start = Start::new(&installer);
    let mut opts = StartOptions::with_offline(Some("Player".to_string()), None);
    opts.jvm_exec = Some(PathBuf::from("java"));
    start.prepare(&opts).unwrap();

    let bin_dir = tmp_dir.path().join("bin-scratch");
    let bin_dir_for_factory = bin_dir.clone();
    start.bin_dir_factory = Box::new(move |_common| bin_dir_for_factory.clone());

    let seen = Rc::new(RefCell::new(None::<(Vec<String>, PathBuf, bool, bool)>));
    let seen_witness = Rc::clone(&seen);
    let bin_dir_for_runner = bin_dir.clone();
    start.runner = Box::new(move |args, cwd| {
        // Observed while the game would run: natives are extracted, filtered.
        let extracted = bin_dir_for_runner.join("libnative.so").is_file();
        let filtered = !bin_dir_for_runner.join("META-INF").exists()
            && !bin_dir_for_runner.join("libnative.so.sha1").exists();
        *seen_witness.borrow_mut() = Some((args.to_vec(), cwd.to_path_buf(), extracted, filtered));
        Ok(())
    });

    start.start().unwrap();

    let (args, cwd, extracted, filtered) = seen.borrow().clone().unwrap();
    assert!(extracted);
    assert!(filtered);
    assert_eq!(cwd, context.work_dir);

    // argv = [jvm, ...jvm_args, main_class, ...game_args], substituted.
    assert_eq!(args[0], "java");
    let main_pos = args.iter().position(|a| a == "net.minecraft.client.Minecraft").unwrap();
    assert_eq!(args[main_pos + 1], "--username");
    assert_eq!(args[main_pos + 2], "Player");

    // The natives directory substitution points inside the scratch dir.
    let lib_path_arg = args.iter().find(|a| a.starts_with("-Djava.library.path=")).unwrap();
    assert!(lib_path_arg.contains("bin-scratch"));

    // The scratch directory is removed once the runner returned.
    assert!(!bin_dir.exists());

}

#[test]
fn extract_native_filter() {
    assert!(launch::can_extract_native("libnative.so"));
    assert!(launch::can_extract_native("native.dll"));
    assert!(!launch::can_extract_native("META-INF/MANIFEST.MF"));
    assert!(!launch::can_extract_native("something.git"));
    assert!(!launch::can_extract_native("libnative.so.sha1"));
}
