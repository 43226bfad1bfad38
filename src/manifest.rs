//! Client for Mojang's version manifest.

use chrono::{DateTime, FixedOffset};
use once_cell::sync::OnceCell;

use crate::install::serde::VersionType;
use crate::http::{self, JsonRequestError};


/// Static URL to the version manifest provided by Mojang.
pub(crate) const VERSION_MANIFEST_URL: &str = "https://launchermeta.mojang.com/mc/game/version_manifest.json";

/// Lazy client for the version manifest: the manifest is fetched on the first
/// operation that needs it and cached in memory for the whole lifetime of the
/// instance.
#[derive(Debug)]
pub struct VersionManifest {
    /// URL of the manifest document.
    url: Box<str>,
    /// Cached manifest data once fetched.
    data: OnceCell<Manifest>,
}

impl Default for VersionManifest {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionManifest {

    /// Create a manifest client pointing at the official Mojang manifest.
    pub fn new() -> Self {
        Self::new_with_url(VERSION_MANIFEST_URL)
    }

    /// Create a manifest client pointing at a custom manifest URL.
    pub fn new_with_url(url: impl Into<Box<str>>) -> Self {
        Self {
            url: url.into(),
            data: OnceCell::new(),
        }
    }

    /// Fetch the manifest if not already cached.
    fn ensure_data(&self) -> Result<&Manifest> {
        self.data.get_or_try_init(|| {
            let value = http::json_simple_request(&self.url, None)?;
            let manifest = serde_path_to_error::deserialize(value)?;
            Ok(manifest)
        })
    }

    /// If the given version is a `release` or `snapshot` alias, return the
    /// version id it points to together with true; any other id is returned
    /// unchanged with false.
    pub fn filter_latest(&self, version: &str) -> Result<(String, bool)> {
        if version == "release" || version == "snapshot" {
            let latest = &self.ensure_data()?.latest;
            let id = match version {
                "release" => latest.release.as_deref(),
                _ => latest.snapshot.as_deref(),
            };
            if let Some(id) = id {
                return Ok((id.to_string(), true));
            }
        }
        Ok((version.to_string(), false))
    }

    /// Return the manifest entry of the given version id, after alias
    /// expansion, none if the manifest doesn't know this version.
    pub fn get_version(&self, version: &str) -> Result<Option<&ManifestVersion>> {
        let (version, _alias) = self.filter_latest(version)?;
        Ok(self.ensure_data()?.versions.iter().find(|v| v.id == version))
    }

    /// Return all versions listed in the manifest, unchanged.
    pub fn all_versions(&self) -> Result<&[ManifestVersion]> {
        Ok(&self.ensure_data()?.versions)
    }

}

/// Type alias for a result with the manifest error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error while fetching or decoding the version manifest.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The manifest could not be requested.
    #[error("request: {0}")]
    Request(#[from] JsonRequestError),
    /// The manifest document doesn't have the expected schema.
    #[error("schema: {0}")]
    Schema(#[from] serde_path_to_error::Error<serde_json::Error>),
}

/// Schema of the whole manifest document.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct Manifest {
    /// Aliases to the latest release and snapshot ids.
    pub latest: ManifestLatest,
    /// All known versions, most recent first.
    pub versions: Vec<ManifestVersion>,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct ManifestLatest {
    pub release: Option<String>,
    pub snapshot: Option<String>,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ManifestVersion {
    pub id: String,
    pub r#type: VersionType,
    /// URL of the version's own metadata document.
    pub url: String,
    pub time: DateTime<FixedOffset>,
    pub release_time: DateTime<FixedOffset>,
}
