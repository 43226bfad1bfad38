//! Game startup: argument composition, natives extraction and process spawn.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::fs::{self, File};
use std::io::{self, BufReader};

use once_cell::sync::Lazy;
use serde_json::{json, Value};
use zip::result::ZipError;
use zip::ZipArchive;
use uuid::Uuid;

use crate::install::{self, Installer};
use crate::rule::{self, Argument};
use crate::auth::AuthSession;
use crate::path::PathBufExt;


/// Launcher identity constants substituted into `${launcher_name}` and
/// `${launcher_version}`.
pub const LAUNCHER_NAME: &str = env!("CARGO_PKG_NAME");
pub const LAUNCHER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The built-in JVM arguments template used when the version metadata
/// predates `arguments.jvm`. The template goes through the regular rule
/// evaluation so the OS-gated entries only apply where relevant.
static LEGACY_JVM_ARGS: Lazy<Vec<Argument>> = Lazy::new(|| {
    serde_json::from_value(json!([
        {
            "rules": [{"action": "allow", "os": {"name": "osx"}}],
            "value": ["-XstartOnFirstThread"]
        },
        {
            "rules": [{"action": "allow", "os": {"name": "windows"}}],
            "value": "-XX:HeapDumpPath=MojangTricksIntelDriversForPerformance_javaw.exe_minecraft.exe.heapdump"
        },
        {
            "rules": [{"action": "allow", "os": {"name": "windows", "version": "^10\\."}}],
            "value": ["-Dos.name=Windows 10", "-Dos.version=10.0"]
        },
        "-Djava.library.path=${natives_directory}",
        "-Dminecraft.launcher.brand=${launcher_name}",
        "-Dminecraft.launcher.version=${launcher_version}",
        "-cp",
        "${classpath}",
    ])).unwrap()
});

/// Options configuring a launch, independent of the installed version.
#[derive(Debug, Default)]
pub struct StartOptions {
    /// Authenticated session substituted into the auth arguments; when
    /// absent an offline session is derived from `username`/`uuid`.
    pub auth_session: Option<AuthSession>,
    /// Offline UUID, dashes are removed and it is lowercased.
    pub uuid: Option<String>,
    /// Offline username, truncated to 16 characters.
    pub username: Option<String>,
    /// Enable the demo mode feature.
    pub demo: bool,
    /// Initial window resolution, also enables the resolution feature.
    pub resolution: Option<(u16, u16)>,
    pub disable_multiplayer: bool,
    pub disable_chat: bool,
    /// Server address to join directly on startup.
    pub server_address: Option<String>,
    pub server_port: Option<u16>,
    /// JVM executable overriding the one provisioned by the installer.
    pub jvm_exec: Option<PathBuf>,
    /// Additional feature flags for rule evaluation.
    pub features: HashSet<String>,
}

impl StartOptions {

    /// Options for an online launch with an authenticated session.
    pub fn with_online(auth_session: AuthSession) -> Self {
        Self {
            auth_session: Some(auth_session),
            ..Self::default()
        }
    }

    /// Options for an offline launch with optional username and UUID.
    pub fn with_offline(username: Option<String>, uuid: Option<String>) -> Self {
        Self {
            username,
            uuid,
            ..Self::default()
        }
    }

}

/// Factory producing the per-launch scratch directory where natives are
/// extracted, given the context's common bin directory.
pub type BinDirFactory = Box<dyn Fn(&Path) -> PathBuf>;

/// Runner invoked with the final argument vector and the working directory.
pub type Runner = Box<dyn FnMut(&[String], &Path) -> io::Result<()>>;

/// Controls the starting procedure of an installed version: [`Self::prepare`]
/// composes the arguments, which can then be freely altered before
/// [`Self::start`] extracts the natives and spawns the process.
pub struct Start<'inst, 'ctx> {
    /// The ready installer this start borrows its state from.
    installer: &'inst Installer<'ctx>,
    /// The `${...}` replacement table applied at start time.
    pub args_replacements: HashMap<String, String>,
    /// Main class of the game, filled by prepare.
    pub main_class: Option<String>,
    /// JVM arguments, the executable first, filled by prepare.
    pub jvm_args: Vec<String>,
    /// Game arguments, filled by prepare.
    pub game_args: Vec<String>,
    /// Factory for the per-launch natives directory.
    pub bin_dir_factory: BinDirFactory,
    /// The process runner, defaults to spawn-and-wait.
    pub runner: Runner,
}

impl std::fmt::Debug for Start<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Start")
            .field("installer", &self.installer.id())
            .field("main_class", &self.main_class)
            .field("jvm_args", &self.jvm_args)
            .field("game_args", &self.game_args)
            .finish()
    }
}

impl<'inst, 'ctx> Start<'inst, 'ctx> {

    /// Create a new start for a ready installer with default hooks.
    pub fn new(installer: &'inst Installer<'ctx>) -> Self {
        Self {
            installer,
            args_replacements: HashMap::new(),
            main_class: None,
            jvm_args: Vec::new(),
            game_args: Vec::new(),
            bin_dir_factory: Box::new(default_bin_dir_factory),
            runner: Box::new(default_runner),
        }
    }

    /// The effective player name, after [`Self::prepare`].
    pub fn username(&self) -> Option<&str> {
        self.args_replacements.get("auth_player_name").map(String::as_str)
    }

    /// The effective player UUID, after [`Self::prepare`].
    pub fn uuid(&self) -> Option<&str> {
        self.args_replacements.get("auth_uuid").map(String::as_str)
    }

    /// Fill the replacement table and the JVM and game argument lists from
    /// the resolved version metadata and the given options. The lists and
    /// table can be altered afterward, replacements happen in
    /// [`Self::start`].
    pub fn prepare(&mut self, opts: &StartOptions) -> Result<()> {

        let installer = self.installer;
        let context = installer.context();
        let metadata = installer.metadata()?;

        let main_class = metadata.get("mainClass")
            .and_then(Value::as_str)
            .filter(|class| !class.is_empty())
            .ok_or(Error::MainClassNotFound)?
            .to_string();

        let jvm_exec = opts.jvm_exec.clone()
            .or_else(|| installer.jvm_exec().map(Path::to_path_buf))
            .ok_or(Error::JvmExecNotSet)?;

        // Feature flags for rules evaluation.
        let mut features = opts.features.clone();
        if opts.demo {
            features.insert("is_demo_user".to_string());
        }
        if opts.resolution.is_some() {
            features.insert("has_custom_resolution".to_string());
        }

        // Resolve the effective player identity.
        let (uuid, username) = match &opts.auth_session {
            Some(session) => (
                session.uuid().to_string(),
                session.username().to_string(),
            ),
            None => {
                let uuid = match &opts.uuid {
                    Some(uuid) => uuid.replace('-', "").to_lowercase(),
                    None => Uuid::new_v4().as_simple().to_string(),
                };
                let username = match &opts.username {
                    Some(username) => username.chars().take(16).collect(),
                    None => uuid[..8].to_string(),
                };
                (uuid, username)
            }
        };

        let session = opts.auth_session.as_ref();

        let classpath = std::env::join_paths(installer.classpath_libs().iter().map(absolute))
            .map_err(|_| Error::InvalidClassPath)?
            .to_string_lossy()
            .into_owned();

        self.args_replacements.clear();
        for (key, value) in [
            // Game
            ("auth_player_name", username),
            ("version_name", installer.id().to_string()),
            ("game_directory", absolute(&context.work_dir).display().to_string()),
            ("assets_root", absolute(&context.assets_dir).display().to_string()),
            ("assets_index_name", installer.assets_index_version().unwrap_or_default().to_string()),
            ("auth_uuid", uuid),
            ("auth_access_token", session.map(|s| s.format_token_argument(false)).unwrap_or_default()),
            ("auth_xuid", session.map(|s| s.xuid().to_string()).unwrap_or_default()),
            ("clientid", session.map(|s| s.client_id().to_string()).unwrap_or_default()),
            ("user_type", session.map(|s| s.user_type().to_string()).unwrap_or_default()),
            ("version_type", metadata.get("type").and_then(Value::as_str).unwrap_or_default().to_string()),
            // Game (legacy)
            ("auth_session", session.map(|s| s.format_token_argument(true)).unwrap_or_default()),
            ("game_assets", installer.assets_virtual_dir().map(|dir| absolute(dir).display().to_string()).unwrap_or_default()),
            ("user_properties", "{}".to_string()),
            // JVM
            ("natives_directory", String::new()),
            ("launcher_name", LAUNCHER_NAME.to_string()),
            ("launcher_version", LAUNCHER_VERSION.to_string()),
            ("classpath", classpath),
        ] {
            self.args_replacements.insert(key.to_string(), value);
        }

        if let Some((width, height)) = opts.resolution {
            self.args_replacements.insert("resolution_width".to_string(), width.to_string());
            self.args_replacements.insert("resolution_height".to_string(), height.to_string());
        }

        // JVM arguments, the executable always comes first.
        self.jvm_args.clear();
        self.jvm_args.push(jvm_exec.display().to_string());

        match metadata.get("arguments").and_then(|args| args.get("jvm")) {
            Some(value) => {
                let args: Vec<Argument> = install::project(value)?;
                rule::interpret_args(&args, &features, &mut self.jvm_args);
            }
            None => rule::interpret_args(&LEGACY_JVM_ARGS, &features, &mut self.jvm_args),
        }

        if let (Some(argument), Some(file)) = (installer.logging_argument(), installer.logging_file()) {
            self.jvm_args.push(argument.replace("${path}", &absolute(file).display().to_string()));
        }

        // The launch wrapper of old versions needs the client JAR path.
        if main_class == "net.minecraft.launchwrapper.Launch" {
            if let Some(jar_file) = installer.jar_file() {
                self.jvm_args.push(format!("-Dminecraft.client.jar={}", absolute(jar_file).display()));
            }
        }

        // Game arguments.
        self.game_args.clear();

        match metadata.get("arguments").and_then(|args| args.get("game")) {
            Some(value) => {
                let args: Vec<Argument> = install::project(value)?;
                rule::interpret_args(&args, &features, &mut self.game_args);
            }
            None => {
                let legacy_args = metadata.get("minecraftArguments")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                self.game_args.extend(legacy_args.split(' ')
                    .filter(|arg| !arg.is_empty())
                    .map(str::to_string));
            }
        }

        if opts.disable_multiplayer {
            self.game_args.push("--disableMultiplayer".to_string());
        }

        if opts.disable_chat {
            self.game_args.push("--disableChat".to_string());
        }

        if let Some(server_address) = &opts.server_address {
            self.game_args.push("--server".to_string());
            self.game_args.push(server_address.clone());
        }

        if let Some(server_port) = opts.server_port {
            self.game_args.push("--port".to_string());
            self.game_args.push(server_port.to_string());
        }

        self.main_class = Some(main_class);
        Ok(())

    }

    /// Start the game: obtain a scratch directory from the bin dir factory,
    /// extract the natives into it, substitute the replacement table over the
    /// prepared arguments and hand the final argument vector to the runner.
    /// The scratch directory is removed once the runner returns, and also on
    /// unwind through a drop guard.
    pub fn start(&mut self) -> Result<()> {

        let main_class = self.main_class.clone()
            .ok_or(Error::MainClassNotFound)?;

        let bin_dir = (self.bin_dir_factory)(&self.installer.context().bin_dir);
        fs::create_dir_all(&bin_dir)
            .map_err(|e| Error::new_io_file(e, bin_dir.clone()))?;

        let mut cleanup = BinDirCleanup {
            dir: bin_dir.clone(),
            done: false,
        };

        for native_lib in self.installer.native_libs() {
            extract_natives(native_lib, &bin_dir)?;
        }

        self.args_replacements.insert(
            "natives_directory".to_string(),
            absolute(&bin_dir).display().to_string());

        let mut args = Vec::with_capacity(self.jvm_args.len() + 1 + self.game_args.len());
        args.extend(self.jvm_args.iter().cloned());
        args.push(main_class);
        args.extend(self.game_args.iter().cloned());

        rule::replace_strings_args(&mut args, |name| {
            self.args_replacements.get(name).cloned()
        });

        let work_dir = self.installer.context().work_dir.clone();
        (self.runner)(&args, &work_dir)
            .map_err(|e| Error::Io { error: e, file: None })?;

        cleanup.run();
        Ok(())

    }

}

/// Removes the per-launch natives directory exactly once, both after a
/// normal run and on unwind.
struct BinDirCleanup {
    dir: PathBuf,
    done: bool,
}

impl BinDirCleanup {

    fn run(&mut self) {
        if !self.done {
            let _ = fs::remove_dir_all(&self.dir);
            self.done = true;
        }
    }

}

impl Drop for BinDirCleanup {
    fn drop(&mut self) {
        self.run();
    }
}

/// Return true if an archive entry should be extracted to the natives
/// directory.
pub fn can_extract_native(name: &str) -> bool {
    !name.starts_with("META-INF") && !name.ends_with(".git") && !name.ends_with(".sha1")
}

/// Extract the allowed entries of a native library archive into the given
/// directory, preserving the archive layout.
fn extract_natives(archive_file: &Path, bin_dir: &Path) -> Result<()> {

    let reader = File::open(archive_file)
        .map_err(|e| Error::new_io_file(e, archive_file.to_path_buf()))
        .map(BufReader::new)?;

    let mut archive = ZipArchive::new(reader)
        .map_err(|e| Error::new_zip_file(e, archive_file.to_path_buf()))?;

    for i in 0..archive.len() {

        let mut file = archive.by_index(i)
            .map_err(|e| Error::new_zip_file(e, archive_file.to_path_buf()))?;

        if !can_extract_native(file.name()) || file.is_dir() {
            continue;
        }

        let Some(rel_path) = file.enclosed_name() else {
            continue;
        };

        let dst_file = bin_dir.join(rel_path);
        if let Some(parent) = dst_file.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::new_io_file(e, parent.to_path_buf()))?;
        }

        let mut dst = File::create(&dst_file)
            .map_err(|e| Error::new_io_file(e, dst_file.clone()))?;

        io::copy(&mut file, &mut dst)
            .map_err(|e| Error::new_io_file(e, dst_file))?;

    }

    Ok(())

}

/// The default factory for the per-launch natives directory, a random UUID
/// under the context's common bin directory.
fn default_bin_dir_factory(common_bin_dir: &Path) -> PathBuf {
    common_bin_dir.to_path_buf().joined(Uuid::new_v4().to_string())
}

/// The default runner, spawning the process and waiting for its exit.
fn default_runner(args: &[String], cwd: &Path) -> io::Result<()> {
    Command::new(&args[0])
        .args(&args[1..])
        .current_dir(cwd)
        .spawn()?
        .wait()?;
    Ok(())
}

/// Make a path absolute for argument substitution, paths that cannot be
/// canonicalized (not existing yet) are used as-is.
fn absolute(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Type alias for a result with the launch error type.
pub type Result<T> = std::result::Result<T, Error>;

/// The launcher could not prepare or start the game.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The resolved metadata has no main class.
    #[error("main class not found")]
    MainClassNotFound,
    /// No JVM executable was set in options nor provisioned by the installer.
    #[error("jvm exec not set")]
    JvmExecNotSet,
    /// A class path entry contains a path separator.
    #[error("invalid class path")]
    InvalidClassPath,
    /// Error from the installer, the version is not ready.
    #[error("install: {0}")]
    Install(#[from] install::Error),
    /// A generic system's IO error with optional file source.
    #[error("io: {error} @ {file:?}")]
    Io {
        #[source]
        error: io::Error,
        file: Option<Box<Path>>,
    },
    /// A Zip error while extracting natives.
    #[error("zip: {error} @ {file}")]
    Zip {
        #[source]
        error: ZipError,
        file: Box<Path>,
    },
}

impl Error {

    #[inline]
    fn new_io_file(error: io::Error, file: impl Into<Box<Path>>) -> Self {
        Self::Io { error, file: Some(file.into()) }
    }

    #[inline]
    fn new_zip_file(error: ZipError, file: impl Into<Box<Path>>) -> Self {
        Self::Zip { error, file: file.into() }
    }

}
