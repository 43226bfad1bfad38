//! Typed views over the dynamic JSON documents handled by the installer.
//!
//! Version metadata is merged as a generic tree, these structures are only
//! projected from it at each prepare step, so unknown fields are naturally
//! ignored and never an error.

use std::collections::HashMap;

use crate::serde::Sha1HashString;
use crate::rule::{Argument, Rule};


/// The version channel, as found in metadata and in the manifest.
#[derive(serde::Deserialize, serde::Serialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VersionType {
    Release,
    Snapshot,
    OldBeta,
    OldAlpha,
}

impl VersionType {

    pub fn as_str(self) -> &'static str {
        match self {
            VersionType::Release => "release",
            VersionType::Snapshot => "snapshot",
            VersionType::OldBeta => "old_beta",
            VersionType::OldAlpha => "old_alpha",
        }
    }

}

/// Download information of a single file.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct Download {
    pub url: String,
    pub size: Option<u32>,
    pub sha1: Option<Sha1HashString>,
}

/// The `assetIndex` object of a version metadata.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct AssetIndexInfo {
    pub id: String,
    #[serde(flatten)]
    pub download: Download,
}

/// An asset index document.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct AssetIndex {
    /// For versions <= 13w23b, assets are copied under the working
    /// directory's `resources` directory.
    #[serde(default)]
    pub map_to_resources: bool,
    /// For 13w23b < version <= 1.7.2, assets are copied under their logical
    /// name in the index's virtual directory.
    #[serde(default)]
    pub r#virtual: bool,
    /// Mapping of logical asset names to their download information.
    pub objects: HashMap<String, AssetObject>,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct AssetObject {
    pub size: u32,
    pub hash: Sha1HashString,
}

/// A library entry of a version metadata.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct Library {
    /// Maven coordinate `group:artifact:version`.
    pub name: String,
    #[serde(default)]
    pub downloads: LibraryDownloads,
    /// Mapping from OS identifier to the natives classifier template.
    pub natives: Option<HashMap<String, String>>,
    pub rules: Option<Vec<Rule>>,
    /// Bare maven repository root used as a fallback download source.
    pub url: Option<String>,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Default, Clone)]
pub struct LibraryDownloads {
    pub artifact: Option<LibraryDownload>,
    #[serde(default)]
    pub classifiers: HashMap<String, LibraryDownload>,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct LibraryDownload {
    /// On-disk path relative to the libraries directory, derived from the
    /// maven coordinate when absent.
    pub path: Option<String>,
    #[serde(flatten)]
    pub download: Download,
}

/// The `logging.client` object of a version metadata.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct Logging {
    /// JVM argument template carrying a `${path}` placeholder.
    pub argument: String,
    pub file: LoggingFile,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct LoggingFile {
    pub id: String,
    #[serde(flatten)]
    pub download: Download,
}

/// The `javaVersion` object of a version metadata.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JavaVersion {
    pub component: Option<String>,
    pub major_version: Option<u32>,
}

/// The `arguments` object of a modern version metadata.
#[derive(serde::Deserialize, serde::Serialize, Debug, Default, Clone)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<Argument>,
    #[serde(default)]
    pub jvm: Vec<Argument>,
}

/// The aggregate manifest of Mojang-provided JVMs, keyed by platform then by
/// component name.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
#[serde(transparent)]
pub struct JvmMetaManifest {
    pub platforms: HashMap<String, JvmMetaManifestPlatform>,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
#[serde(transparent)]
pub struct JvmMetaManifestPlatform {
    pub components: HashMap<String, Vec<JvmMetaManifestVariant>>,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct JvmMetaManifestVariant {
    pub manifest: Download,
    pub version: JvmMetaManifestVersion,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct JvmMetaManifestVersion {
    pub name: String,
}

/// The per-component manifest of a Mojang-provided JVM.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct JvmManifest {
    pub files: HashMap<String, JvmManifestFile>,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum JvmManifestFile {
    Directory,
    File {
        #[serde(default)]
        executable: bool,
        downloads: JvmManifestFileDownloads,
    },
    Link {
        target: String,
    },
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct JvmManifestFileDownloads {
    pub raw: Download,
}
