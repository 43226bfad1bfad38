//! Version installer: resolves a version's metadata and materializes on disk
//! every artifact required to run it.
//!
//! The installer is a sequence of `prepare_*` steps that reconcile the
//! metadata with the local filesystem and enqueue every missing artifact into
//! a [`DownloadList`], followed by a final [`Installer::download`] drain.
//! Each step is idempotent in intent but may enqueue duplicate entries when
//! invoked again before a drain, so callers run each step at most once per
//! install.

pub mod serde;

use std::collections::HashSet;
use std::io::{self, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::fs::{self, File};

use serde_json::Value;
use sha1::{Digest, Sha1};

use crate::download::{self, DownloadList};
use crate::manifest::{self, VersionManifest};
use crate::path::{PathExt, PathBufExt};
use crate::rule::interpret_rules;
use crate::{http, platform};


/// Base URL for downloading game's assets.
pub(crate) const RESOURCES_URL: &str = "https://resources.download.minecraft.net/";

/// The URL to the aggregate manifest for Mojang-provided JVMs.
pub(crate) const JVM_META_MANIFEST_URL: &str = "https://launchermeta.mojang.com/v1/products/java-runtime/2ec0cc96c44e5a76b9c8b7c39df7210883d12871/all.json";

/// Default cap on the number of parents resolved through `inheritsFrom`.
const META_RECURSION_LIMIT: usize = 50;

/// Installer for a single version within a [`Context`](crate::Context).
///
/// The installer borrows its context and accumulates both the resolved state
/// (metadata, file paths, classpath) and the pending download list while the
/// `prepare_*` steps advance. Once ready it is consumed by reference by the
/// [`Start`](crate::launch::Start) launcher.
#[derive(Debug)]
pub struct Installer<'ctx> {
    /// The context defining every directory used by this installer.
    context: &'ctx crate::Context,
    /// Identifier of the version to install.
    id: String,
    /// The manifest client, lazily constructed when a metadata or alias needs
    /// to be resolved online.
    manifest: Option<VersionManifest>,
    /// Accumulated downloads for all prepare steps.
    dl: DownloadList,
    /// The fully resolved metadata document, no `inheritsFrom` remains.
    metadata: Option<Value>,
    /// Path of the client JAR file.
    jar_file: Option<PathBuf>,
    /// Resolved assets index version.
    assets_index_version: Option<String>,
    /// Virtual directory of the assets index, for legacy versions.
    assets_virtual_dir: Option<PathBuf>,
    /// Number of assets objects in the resolved index.
    assets_count: Option<usize>,
    /// Path of the logger configuration file.
    logging_file: Option<PathBuf>,
    /// JVM argument template of the logger, carries `${path}`.
    logging_argument: Option<String>,
    /// Class path entries, the client JAR first.
    classpath_libs: Vec<PathBuf>,
    /// Native library archives to extract before launching.
    native_libs: Vec<PathBuf>,
    /// Display version of the resolved JVM.
    jvm_version: Option<String>,
    /// Path of the JVM executable.
    jvm_exec: Option<PathBuf>,
}

impl<'ctx> Installer<'ctx> {

    /// Create a new installer for the given exact version id.
    pub fn new(context: &'ctx crate::Context, id: impl Into<String>) -> Self {
        Self {
            context,
            id: id.into(),
            manifest: None,
            dl: DownloadList::new(),
            metadata: None,
            jar_file: None,
            assets_index_version: None,
            assets_virtual_dir: None,
            assets_count: None,
            logging_file: None,
            logging_argument: None,
            classpath_libs: Vec::new(),
            native_libs: Vec::new(),
            jvm_version: None,
            jvm_exec: None,
        }
    }

    /// The version id this installer targets.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The context this installer works in.
    #[inline]
    pub fn context(&self) -> &'ctx crate::Context {
        self.context
    }

    /// Replace the manifest client used to resolve missing metadata, this can
    /// point to a custom manifest to support more versions.
    #[inline]
    pub fn set_manifest(&mut self, manifest: VersionManifest) -> &mut Self {
        self.manifest = Some(manifest);
        self
    }

    fn ensure_manifest(&mut self) -> &VersionManifest {
        self.manifest.get_or_insert_with(VersionManifest::new)
    }

    /// The resolved metadata document, error if meta is not yet prepared.
    pub fn metadata(&self) -> Result<&Value> {
        self.metadata.as_ref().ok_or(Error::NotPrepared { what: "metadata" })
    }

    /// Path of the client JAR file, once [`Self::prepare_jar`] has run.
    #[inline]
    pub fn jar_file(&self) -> Option<&Path> {
        self.jar_file.as_deref()
    }

    /// The resolved assets index version, if the version has assets.
    #[inline]
    pub fn assets_index_version(&self) -> Option<&str> {
        self.assets_index_version.as_deref()
    }

    /// The virtual assets directory, if the version has assets.
    #[inline]
    pub fn assets_virtual_dir(&self) -> Option<&Path> {
        self.assets_virtual_dir.as_deref()
    }

    /// Number of asset objects of the resolved index.
    #[inline]
    pub fn assets_count(&self) -> Option<usize> {
        self.assets_count
    }

    /// Path of the logger configuration, if the version defines one.
    #[inline]
    pub fn logging_file(&self) -> Option<&Path> {
        self.logging_file.as_deref()
    }

    /// The logger JVM argument template, carries a `${path}` placeholder.
    #[inline]
    pub fn logging_argument(&self) -> Option<&str> {
        self.logging_argument.as_deref()
    }

    /// Class path entries, seeded with the client JAR.
    #[inline]
    pub fn classpath_libs(&self) -> &[PathBuf] {
        &self.classpath_libs
    }

    /// Native library archives to extract into the per-launch directory.
    #[inline]
    pub fn native_libs(&self) -> &[PathBuf] {
        &self.native_libs
    }

    /// Path of the resolved JVM executable, once [`Self::prepare_jvm`] ran.
    #[inline]
    pub fn jvm_exec(&self) -> Option<&Path> {
        self.jvm_exec.as_deref()
    }

    /// Display version of the resolved JVM.
    #[inline]
    pub fn jvm_version(&self) -> Option<&str> {
        self.jvm_version.as_deref()
    }

    /// Number of entries currently pending download.
    #[inline]
    pub fn pending_downloads(&self) -> usize {
        self.dl.len()
    }

    /// Resolve the version's metadata with the default parent recursion cap.
    pub fn prepare_meta(&mut self) -> Result<()> {
        self.prepare_meta_with_limit(META_RECURSION_LIMIT)
    }

    /// Resolve the version's metadata. Each document of the `inheritsFrom`
    /// chain is loaded from disk or fetched-and-persisted through the
    /// manifest; the parent chain is merged under the child, child keys win,
    /// nested objects merge recursively and lists are parent-then-child
    /// concatenations. The chain is capped at `recursion_limit` parents.
    pub fn prepare_meta_with_limit(&mut self, recursion_limit: usize) -> Result<()> {

        let root_id = self.id.clone();
        let mut metadata = self.load_or_fetch_meta(&root_id)?;
        let mut remaining = recursion_limit;

        while let Some(parent_id) = metadata.get("inheritsFrom").and_then(Value::as_str).map(str::to_string) {

            if remaining == 0 {
                return Err(Error::TooManyParents { id: root_id });
            }
            remaining -= 1;

            let parent = self.load_or_fetch_meta(&parent_id)?;

            // The key is present so the document is an object.
            metadata.as_object_mut().unwrap().remove("inheritsFrom");
            merge_metadata(&mut metadata, parent);

        }

        self.metadata = Some(metadata);
        Ok(())

    }

    /// Load a version metadata document from disk; missing or malformed
    /// documents are fetched through the manifest and persisted.
    fn load_or_fetch_meta(&mut self, id: &str) -> Result<Value> {

        let file = self.context.version_metadata_file(id);

        match File::open(&file) {
            Ok(reader) => {
                // A malformed document is treated as absent and re-fetched.
                if let Ok(value) = serde_json::from_reader::<_, Value>(BufReader::new(reader)) {
                    return Ok(value);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => (),
            Err(e) => return Err(Error::new_io_file(e, file)),
        }

        let url = match self.ensure_manifest().get_version(id)? {
            Some(version) => version.url.clone(),
            None => return Err(Error::VersionNotFound { id: id.to_string() }),
        };

        let value = http::json_simple_request(&url, None)?;

        let dir = self.context.version_dir(id);
        fs::create_dir_all(&dir)
            .map_err(|e| Error::new_io_file(e, dir))?;

        let writer = File::create(&file)
            .map_err(|e| Error::new_io_file(e, file.clone()))?;
        serde_json::to_writer_pretty(writer, &value)
            .map_err(|e| Error::new_io_file(io::Error::from(e), file))?;

        Ok(value)

    }

    /// Locate the client JAR of the version, enqueue it if the metadata has
    /// download information and the file is absent or has a wrong size. If
    /// the metadata has no download information the file must already exist.
    pub fn prepare_jar(&mut self) -> Result<()> {

        let metadata = self.metadata()?;
        let jar_file = self.context.version_dir(&self.id).join_with_extension(&self.id, "jar");

        let dl = match metadata.get("downloads").and_then(|d| d.get("client")) {
            Some(value) => Some(project::<serde::Download>(value)?),
            None => None,
        };

        if let Some(dl) = dl {
            if !check_file(&jar_file, dl.size, None)? {
                self.dl.push(dl.url, jar_file.clone())
                    .set_expect_size(dl.size)
                    .set_expect_sha1(dl.sha1.map(|sha1| sha1.0))
                    .set_name(format!("{}.jar", self.id));
            }
        } else if !jar_file.is_file() {
            return Err(Error::JarNotFound { id: self.id.clone() });
        }

        self.jar_file = Some(jar_file);
        Ok(())

    }

    /// Resolve the assets index of the version, if any, and enqueue every
    /// missing or wrongly-sized object. Legacy indexes that map to resources
    /// or to a virtual directory register a post-download callback that
    /// copies the objects under their logical names.
    pub fn prepare_assets(&mut self) -> Result<()> {

        let metadata = self.metadata()?;

        let index_info = match metadata.get("assetIndex") {
            Some(value) => project::<serde::AssetIndexInfo>(value)?,
            None => return Ok(()),
        };

        // The legacy 'assets' field overrides the index version.
        let index_version = metadata.get("assets")
            .and_then(Value::as_str)
            .unwrap_or(&index_info.id)
            .to_string();

        let indexes_dir = self.context.assets_dir.join("indexes");
        let index_file = indexes_dir.join_with_extension(&index_version, "json");

        let index: serde::AssetIndex = match read_json_file(&index_file)? {
            Some(index) => index,
            None => {
                let value = http::json_simple_request(&index_info.download.url, None)?;
                fs::create_dir_all(&indexes_dir)
                    .map_err(|e| Error::new_io_file(e, indexes_dir.clone()))?;
                let writer = File::create(&index_file)
                    .map_err(|e| Error::new_io_file(e, index_file.clone()))?;
                serde_json::to_writer(writer, &value)
                    .map_err(|e| Error::new_io_file(io::Error::from(e), index_file))?;
                project(&value)?
            }
        };

        let objects_dir = self.context.assets_dir.join("objects");
        let virtual_dir = self.context.assets_dir.join("virtual").joined(&index_version);

        // Multiple logical names can point to the same object, only download
        // each object once.
        let mut unique_hashes = HashSet::new();
        let mut mapped_objects = Vec::new();

        for (name, object) in &index.objects {

            let hash = object.hash.to_string();
            let hash_prefix = &hash[0..2];
            let object_file = objects_dir.join(hash_prefix).joined(&hash);

            if index.map_to_resources || index.r#virtual {
                mapped_objects.push((object_file.clone(), name.clone()));
            }

            if !unique_hashes.insert(object.hash.0) {
                continue;
            }

            if !check_file(&object_file, Some(object.size), None)? {
                self.dl.push(format!("{RESOURCES_URL}{hash_prefix}/{hash}"), object_file)
                    .set_expect_size(Some(object.size))
                    .set_expect_sha1(Some(object.hash.0))
                    .set_name(name.clone());
            }

        }

        if index.map_to_resources || index.r#virtual {

            let resources_dir = index.map_to_resources
                .then(|| self.context.work_dir.join("resources"));
            let callback_virtual_dir = index.r#virtual
                .then(|| virtual_dir.clone());

            self.dl.add_callback(move || {
                for (object_file, name) in &mapped_objects {
                    if let Some(resources_dir) = &resources_dir {
                        copy_asset_object(object_file, &resources_dir.join(name))?;
                    }
                    if let Some(virtual_dir) = &callback_virtual_dir {
                        copy_asset_object(object_file, &virtual_dir.join(name))?;
                    }
                }
                Ok(())
            });

        }

        self.assets_count = Some(index.objects.len());
        self.assets_virtual_dir = Some(virtual_dir);
        self.assets_index_version = Some(index_version);
        Ok(())

    }

    /// Enqueue the client logger configuration, if the version defines one,
    /// and record its argument template.
    pub fn prepare_logger(&mut self) -> Result<()> {

        let metadata = self.metadata()?;

        let logging = match metadata.get("logging").and_then(|l| l.get("client")) {
            Some(value) => project::<serde::Logging>(value)?,
            None => return Ok(()),
        };

        let file = self.context.assets_dir
            .join("log_configs")
            .joined(&logging.file.id);

        if !check_file(&file, logging.file.download.size, None)? {
            self.dl.push(logging.file.download.url, file.clone())
                .set_expect_size(logging.file.download.size)
                .set_expect_sha1(logging.file.download.sha1.map(|sha1| sha1.0))
                .set_name(logging.file.id);
        }

        self.logging_file = Some(file);
        self.logging_argument = Some(logging.argument);
        Ok(())

    }

    /// Resolve every library of the version: rules gate each entry, natives
    /// entries pick their OS classifier (with `${arch}` substituted by the
    /// probed bit width), artifacts resolve through their download descriptor
    /// first and fall back to maven-coordinate paths, optionally downloaded
    /// from the entry's bare repository URL.
    pub fn prepare_libraries(&mut self) -> Result<()> {

        let metadata = self.metadata()?;

        let jar_file = self.jar_file.clone()
            .ok_or(Error::NotPrepared { what: "jar" })?;

        let libraries: Vec<serde::Library> = match metadata.get("libraries") {
            Some(value) => project(value)?,
            None => Vec::new(),
        };

        // The class path starts with the client JAR itself, old versions
        // expect it first.
        self.classpath_libs.clear();
        self.classpath_libs.push(jar_file);
        self.native_libs.clear();

        // Library rules never carry feature predicates.
        let features = HashSet::new();

        for lib in libraries {

            if let Some(rules) = &lib.rules {
                if !interpret_rules(rules, &features) {
                    continue;
                }
            }

            // When natives are present, the OS classifier overrides the
            // artifact; an entry with no classifier for this OS is skipped.
            let mut classifier = None;
            if let Some(natives) = &lib.natives {
                let Some(os_name) = platform::os_name() else { continue };
                let Some(template) = natives.get(os_name) else { continue };
                let mut value = template.clone();
                if let Some(bits) = platform::os_bits() {
                    value = value.replace("${arch}", bits);
                }
                classifier = Some(value);
            }

            let descriptor = match &classifier {
                Some(classifier) => lib.downloads.classifiers.get(classifier),
                None => lib.downloads.artifact.as_ref(),
            };

            let lib_file;
            let mut source = None;

            if let Some(descriptor) = descriptor {

                lib_file = match &descriptor.path {
                    Some(path) => self.context.libraries_dir.join(path),
                    None => match maven_rel_path(&lib.name, classifier.as_deref()) {
                        Some(rel) => self.context.libraries_dir.join(rel),
                        None => continue,
                    }
                };

                source = Some((
                    descriptor.download.url.clone(),
                    descriptor.download.size,
                    descriptor.download.sha1.map(|sha1| sha1.0),
                ));

            } else {

                // Not maven-formatted names cannot be resolved at all.
                let Some(rel) = maven_rel_path(&lib.name, classifier.as_deref()) else {
                    continue;
                };

                lib_file = self.context.libraries_dir.join(&rel);

                if !lib_file.is_file() {
                    // Without a repository to fetch from, the entry is
                    // silently skipped.
                    let Some(repo_url) = &lib.url else { continue };
                    let mut url = repo_url.clone();
                    if !url.ends_with('/') {
                        url.push('/');
                    }
                    url.push_str(&rel.to_string_lossy().replace('\\', "/"));
                    source = Some((url, None, None));
                }

            }

            if let Some((url, size, sha1)) = source {
                if !check_file(&lib_file, size, None)? {
                    let name = match &classifier {
                        Some(classifier) => format!("{}:{}", lib.name, classifier),
                        None => lib.name.clone(),
                    };
                    self.dl.push(url, lib_file.clone())
                        .set_expect_size(size)
                        .set_expect_sha1(sha1)
                        .set_name(name);
                }
            }

            if classifier.is_some() {
                self.native_libs.push(lib_file);
            } else {
                self.classpath_libs.push(lib_file);
            }

        }

        Ok(())

    }

    /// Provision the Mojang JVM component required by the version, defaulting
    /// to `jre-legacy`. An already installed component is only probed for its
    /// display version, otherwise every file of the component's manifest is
    /// enqueued and executables are made executable after download.
    pub fn prepare_jvm(&mut self) -> Result<()> {

        let metadata = self.metadata()?;

        let component = match metadata.get("javaVersion") {
            Some(value) => project::<serde::JavaVersion>(value)?.component,
            None => None,
        }.unwrap_or_else(|| "jre-legacy".to_string());

        let jvm_dir = self.context.jvm_dir.join(&component);
        let jvm_exec = jvm_dir.join("bin").joined(platform::jvm_exec_name());

        if jvm_exec.is_file() {
            self.jvm_version = Some(read_jvm_release_version(&jvm_dir.join("release"))
                .unwrap_or_else(|| "unknown".to_string()));
            self.jvm_exec = Some(jvm_exec);
            return Ok(());
        }

        let meta_manifest: serde::JvmMetaManifest =
            project(&http::json_simple_request(JVM_META_MANIFEST_URL, None)?)?;

        let platform_manifest = platform::jvm_platform()
            .and_then(|key| meta_manifest.platforms.get(key))
            .ok_or(Error::JvmUnsupportedArch)?;

        let variant = platform_manifest.components.get(&component)
            .and_then(|variants| variants.first())
            .ok_or(Error::JvmUnsupportedVersion)?;

        let manifest: serde::JvmManifest =
            project(&http::json_simple_request(&variant.manifest.url, None)?)?;

        let mut exec_files = Vec::new();

        for (rel_path, manifest_file) in &manifest.files {
            if let serde::JvmManifestFile::File { executable, downloads } = manifest_file {

                // NOTE: Unsafe path joining.
                let file = jvm_dir.join(rel_path);

                if *executable {
                    exec_files.push(file.clone());
                }

                let dl = &downloads.raw;
                if !check_file(&file, dl.size, None)? {
                    self.dl.push(dl.url.clone(), file)
                        .set_expect_size(dl.size)
                        .set_expect_sha1(dl.sha1.map(|sha1| sha1.0))
                        .set_name(rel_path.clone());
                }

            }
        }

        self.dl.add_callback(move || {
            #[cfg(unix)] {
                use std::os::unix::fs::PermissionsExt;
                for file in &exec_files {
                    fs::set_permissions(file, fs::Permissions::from_mode(0o777))?;
                }
            }
            #[cfg(not(unix))] {
                let _ = &exec_files;
            }
            Ok(())
        });

        // Normalized display version, the name can carry a build suffix.
        let name = &variant.version.name;
        let version = name.split('.')
            .take(3)
            .collect::<Vec<_>>()
            .join(".")
            .replace("8u51", "1.8.0_51");

        self.jvm_version = Some(version);
        self.jvm_exec = Some(jvm_exec);
        Ok(())

    }

    /// Drain the accumulated download list, then clear it. Post-download
    /// callbacks registered by prepare steps only run when every entry
    /// succeeded.
    pub fn download(&mut self, handler: impl download::Handler) -> Result<()> {
        self.dl.download_files(handler)?;
        self.dl.reset();
        Ok(())
    }

    /// Run the full prepare sequence followed by the download drain. The JVM
    /// provisioning is optional so embedders can run on their own JVM.
    pub fn install(&mut self, handler: impl download::Handler, jvm: bool) -> Result<()> {
        self.prepare_meta()?;
        self.prepare_jar()?;
        self.prepare_assets()?;
        self.prepare_logger()?;
        self.prepare_libraries()?;
        if jvm {
            self.prepare_jvm()?;
        }
        self.download(handler)
    }

}

/// Type alias for a result with the installer error type.
pub type Result<T> = std::result::Result<T, Error>;

/// The installer could not proceed to the installation of a version.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The version is not present locally and the manifest has no entry to
    /// fetch it from.
    #[error("version not found: {id}")]
    VersionNotFound {
        id: String,
    },
    /// The `inheritsFrom` chain of the version exceeds the recursion cap.
    #[error("too many parents: {id}")]
    TooManyParents {
        id: String,
    },
    /// The version JAR has no download information and is not already on
    /// disk, the class path cannot be built.
    #[error("jar not found: {id}")]
    JarNotFound {
        id: String,
    },
    /// Mojang provides no JVM for the probed platform.
    #[error("jvm: unsupported arch")]
    JvmUnsupportedArch,
    /// Mojang provides no JVM for the requested component on this platform.
    #[error("jvm: unsupported version")]
    JvmUnsupportedVersion,
    /// A prepare step was called before one it depends on.
    #[error("not prepared: {what}")]
    NotPrepared {
        what: &'static str,
    },
    /// A generic system's IO error with optional file source.
    #[error("io: {error} @ {file:?}")]
    Io {
        #[source]
        error: io::Error,
        file: Option<Box<Path>>,
    },
    /// A JSON document doesn't match the schema a prepare step projects.
    #[error("schema: {error}")]
    Schema {
        #[source]
        error: serde_path_to_error::Error<serde_json::Error>,
    },
    /// Error while requesting a JSON endpoint.
    #[error("request: {0}")]
    JsonRequest(#[from] http::JsonRequestError),
    /// Error from the manifest client.
    #[error("manifest: {0}")]
    Manifest(#[from] manifest::Error),
    /// Error from the download engine, raised at the end of a batch.
    #[error("download: {0}")]
    Download(#[from] download::Error),
}

impl Error {

    #[inline]
    pub(crate) fn new_io_file(error: io::Error, file: impl Into<Box<Path>>) -> Self {
        Self::Io { error, file: Some(file.into()) }
    }

}

/// Project a typed view out of a generic JSON tree, unknown fields ignored.
pub(crate) fn project<'de, T: ::serde::de::Deserialize<'de>>(value: &'de Value) -> Result<T> {
    serde_path_to_error::deserialize(value)
        .map_err(|error| Error::Schema { error })
}

/// Read and deserialize a JSON file, a missing or malformed file is reported
/// as none so the caller can fetch it again.
fn read_json_file<T: ::serde::de::DeserializeOwned>(file: &Path) -> Result<Option<T>> {
    match File::open(file) {
        Ok(reader) => Ok(serde_json::from_reader(BufReader::new(reader)).ok()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::new_io_file(e, file.to_path_buf())),
    }
}

/// Merge a parent metadata document under a child one: keys of the child win,
/// nested objects merge recursively and lists become the parent's items
/// followed by the child's.
pub(crate) fn merge_metadata(child: &mut Value, parent: Value) {

    let (Value::Object(child), Value::Object(parent)) = (child, parent) else {
        return;
    };

    for (key, parent_value) in parent {
        match child.entry(key) {
            serde_json::map::Entry::Vacant(entry) => {
                entry.insert(parent_value);
            }
            serde_json::map::Entry::Occupied(mut entry) => {
                match (entry.get_mut(), parent_value) {
                    (child_value @ Value::Object(_), parent_value @ Value::Object(_)) => {
                        merge_metadata(child_value, parent_value);
                    }
                    (Value::Array(child_items), Value::Array(mut parent_items)) => {
                        parent_items.append(child_items);
                        *child_items = parent_items;
                    }
                    _ => (),
                }
            }
        }
    }

}

/// Compute the on-disk relative path of a maven coordinate
/// `group:artifact:version`, none if the name doesn't have three parts.
fn maven_rel_path(name: &str, classifier: Option<&str>) -> Option<PathBuf> {

    let mut parts = name.split(':');
    let group = parts.next()?;
    let artifact = parts.next()?;
    let version = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let mut path = PathBuf::new();
    for group_part in group.split('.') {
        path.push(group_part);
    }
    path.push(artifact);
    path.push(version);

    let file_name = match classifier {
        Some(classifier) => format!("{artifact}-{version}-{classifier}.jar"),
        None => format!("{artifact}-{version}.jar"),
    };
    path.push(file_name);

    Some(path)

}

/// Check that a file exists with the given size and SHA-1, when expected;
/// false means the file should be (re)downloaded.
pub(crate) fn check_file(
    file: &Path,
    size: Option<u32>,
    sha1: Option<&[u8; 20]>,
) -> Result<bool> {
    check_file_inner(file, size, sha1)
        .map_err(|e| Error::new_io_file(e, file.to_path_buf()))
}

fn check_file_inner(
    file: &Path,
    size: Option<u32>,
    sha1: Option<&[u8; 20]>,
) -> io::Result<bool> {

    if let Some(sha1) = sha1 {
        match File::open(file) {
            Ok(mut reader) => {

                // Cheap size check before hashing the whole file.
                if let Some(size) = size {
                    let actual_size = reader.seek(SeekFrom::End(0))?;
                    if size as u64 != actual_size {
                        return Ok(false);
                    }
                    reader.seek(SeekFrom::Start(0))?;
                }

                let mut digest = Sha1::new();
                io::copy(&mut reader, &mut digest)?;
                Ok(digest.finalize().as_slice() == sha1)

            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    } else {
        match (file.metadata(), size) {
            (Ok(metadata), Some(size)) => Ok(metadata.len() == size as u64),
            (Ok(_metadata), None) => Ok(true),
            (Err(e), _) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            (Err(e), _) => Err(e),
        }
    }

}

/// Copy an asset object under its logical name, nothing is done if the
/// destination already exists because pre-1.6 versions alter these copies on
/// their own.
fn copy_asset_object(object_file: &Path, dst_file: &Path) -> io::Result<()> {
    if !dst_file.is_file() {
        if let Some(parent) = dst_file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(object_file, dst_file)?;
    }
    Ok(())
}

/// Extract the display version from a JVM `release` file, the value of its
/// `JAVA_VERSION="…"` line.
fn read_jvm_release_version(file: &Path) -> Option<String> {
    let content = fs::read_to_string(file).ok()?;
    content.lines()
        .filter_map(|line| line.trim_end().strip_prefix("JAVA_VERSION=\""))
        .filter_map(|line| line.strip_suffix('"'))
        .map(str::to_string)
        .next()
}
