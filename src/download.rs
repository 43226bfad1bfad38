//! Batch HTTP(S) download engine with integrity verification.
//!
//! Entries pushed to a [`DownloadList`] are grouped by origin so that each
//! origin gets a single kept-alive connection, then drained sequentially.
//! Each entry is verified against its expected size and SHA-1 and retried up
//! to three times; failures are only reported at the end of the batch so one
//! broken entry doesn't abort the others.

use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::fs;

use indexmap::IndexMap;
use sha1::{Digest, Sha1};
use reqwest::{header, Client, StatusCode, Url};


/// Number of attempts for each entry before recording its failure.
const ENTRY_ATTEMPTS: usize = 3;

/// Capacity of the write buffer each response is streamed through.
const WRITE_BUF_SIZE: usize = 64 * 1024;

/// A list of pending downloads with deferred actions to run once the whole
/// batch has been successfully drained.
#[derive(Default)]
pub struct DownloadList {
    /// All entries to be downloaded, in push order.
    entries: Vec<Entry>,
    /// Actions deferred until every entry succeeded.
    callbacks: Vec<Box<dyn FnOnce() -> io::Result<()>>>,
}

impl std::fmt::Debug for DownloadList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadList")
            .field("entries", &self.entries)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

impl DownloadList {

    /// Create a new empty download list.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of entries pushed into this list.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return true if this list has no entry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the summed expected size of all entries, entries of unknown
    /// size count for zero.
    pub fn size(&self) -> u64 {
        self.entries.iter()
            .map(|entry| entry.expect_size.unwrap_or(0) as u64)
            .sum()
    }

    /// Push a new entry to be downloaded from the given URL into the given
    /// file, the returned handle can be used to set expectations on it.
    pub fn push(&mut self, url: impl Into<Box<str>>, file: impl Into<Box<Path>>) -> &mut Entry {
        self.entries.push(Entry::new(url.into(), file.into()));
        self.entries.last_mut().unwrap()
    }

    /// Register an action to run after a fully successful drain of the batch,
    /// actions run in registration order.
    pub fn add_callback(&mut self, callback: impl FnOnce() -> io::Result<()> + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    /// Clear all entries and callbacks.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.callbacks.clear();
    }

    /// Download every entry of this list and then run the registered
    /// callbacks, see the module documentation for the actual policy. The
    /// entries are kept in the list, callbacks are consumed when run.
    pub fn download_files(&mut self, mut handler: impl Handler) -> Result<()> {

        if !self.entries.is_empty() {

            // A client that cannot even be built will never connect anywhere,
            // report every entry as a connection failure.
            let Ok(client) = crate::http::client() else {
                return Err(Error::Failures {
                    failures: self.entries.iter()
                        .map(|entry| (entry.url.clone(), EntryErrorKind::ConnError))
                        .collect(),
                });
            };

            let failures = crate::tokio::sync(
                download_entries(client, &self.entries, &mut handler))?;

            if !failures.is_empty() {
                return Err(Error::Failures { failures });
            }

        }

        for callback in self.callbacks.drain(..) {
            callback().map_err(Error::new_io)?;
        }

        Ok(())

    }

}

/// A single download entry, an URL downloaded into a destination file with
/// optional expected size and SHA-1 to verify.
#[derive(Debug)]
pub struct Entry {
    /// The URL to download the file from, its scheme must be http or https.
    url: Box<str>,
    /// The file the downloaded content is written to.
    file: Box<Path>,
    /// Optional expected size of the file.
    expect_size: Option<u32>,
    /// Optional expected SHA-1 of the file.
    expect_sha1: Option<[u8; 20]>,
    /// Optional display name reported through progress, defaults to the URL.
    name: Option<Box<str>>,
}

impl Entry {

    fn new(url: Box<str>, file: Box<Path>) -> Self {
        Self {
            url,
            file,
            expect_size: None,
            expect_sha1: None,
            name: None,
        }
    }

    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[inline]
    pub fn file(&self) -> &Path {
        &self.file
    }

    #[inline]
    pub fn set_expect_size(&mut self, size: Option<u32>) -> &mut Self {
        self.expect_size = size;
        self
    }

    #[inline]
    pub fn set_expect_sha1(&mut self, sha1: Option<[u8; 20]>) -> &mut Self {
        self.expect_sha1 = sha1;
        self
    }

    #[inline]
    pub fn set_name(&mut self, name: impl Into<Box<str>>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// The name reported through progress callbacks.
    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }

}

/// Progress of an in-flight batch, passed to the progress handler after each
/// received chunk; the handler is the place to throttle display updates.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    /// Total bytes received for the batch so far, bytes of failed attempts
    /// are subtracted before each retry. May exceed `total` when entries
    /// have unknown expected sizes.
    pub size: u64,
    /// Summed expected size of the batch.
    pub total: u64,
    /// Display name of the entry being downloaded.
    pub name: &'a str,
    /// Bytes received for that entry so far.
    pub entry_size: u32,
    /// Expected size of that entry, zero if unknown.
    pub entry_total: u32,
}

/// A handler for watching the progress of a download batch.
pub trait Handler {

    /// Notification of batch progress after a chunk has been received.
    fn handle_download_progress(&mut self, progress: Progress) {
        let _ = progress;
    }

}

/// Blanket implementation that ignores progress.
impl Handler for () { }

impl<H: Handler + ?Sized> Handler for &'_ mut H {
    fn handle_download_progress(&mut self, progress: Progress) {
        (*self).handle_download_progress(progress)
    }
}

/// Type alias for a result with the download error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error raised by a download batch.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// At least one entry failed all of its attempts; the map associates the
    /// entry URL with its last error, in batch order.
    #[error("download failed for {} entries", failures.len())]
    Failures {
        failures: IndexMap<Box<str>, EntryErrorKind>,
    },
    /// A local I/O error, aborting the batch, while writing a destination
    /// file or running a post-batch callback.
    #[error("io: {error} @ {file:?}")]
    Io {
        #[source]
        error: io::Error,
        file: Option<Box<Path>>,
    },
}

impl Error {

    #[inline]
    pub(crate) fn new_io(error: io::Error) -> Self {
        Self::Io { error, file: None }
    }

    #[inline]
    pub(crate) fn new_io_file(error: io::Error, file: impl Into<Box<Path>>) -> Self {
        Self::Io { error, file: Some(file.into()) }
    }

}

/// The terminal error of a single entry.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryErrorKind {
    /// The connection failed or the URL is not a valid http(s) URL.
    #[error("conn error")]
    ConnError,
    /// The server answered with a status different from 200.
    #[error("not found")]
    NotFound,
    /// The downloaded size does not match the expected size.
    #[error("invalid size")]
    InvalidSize,
    /// The downloaded SHA-1 does not match the expected SHA-1.
    #[error("invalid sha1")]
    InvalidSha1,
}

/// Origin key grouping entries that can share a connection.
type Origin = (bool, String);

/// Parse the origin of an URL, none if the URL is not a valid http(s) URL.
fn entry_origin(url: &str) -> Option<Origin> {
    let url = Url::parse(url).ok()?;
    let https = match url.scheme() {
        "http" => false,
        "https" => true,
        _ => return None,
    };
    let mut host = url.host_str()?.to_string();
    if let Some(port) = url.port() {
        host.push(':');
        host.push_str(&port.to_string());
    }
    Some((https, host))
}

/// Drain all entries, grouped by origin, returning the failure map.
async fn download_entries(
    client: Client,
    entries: &[Entry],
    handler: &mut dyn Handler,
) -> Result<IndexMap<Box<str>, EntryErrorKind>> {

    // Group entry indices by origin, in first-seen order so that the overall
    // sequential behavior is stable; per-origin order is the push order.
    let mut origins = IndexMap::<Origin, Vec<usize>>::new();
    let mut failures = IndexMap::new();

    for (index, entry) in entries.iter().enumerate() {
        match entry_origin(&entry.url) {
            Some(origin) => origins.entry(origin).or_default().push(index),
            None => { failures.insert(entry.url.clone(), EntryErrorKind::ConnError); }
        }
    }

    let total = entries.iter()
        .map(|entry| entry.expect_size.unwrap_or(0) as u64)
        .sum::<u64>();
    let mut size = 0u64;

    for indices in origins.values() {
        let last_index = *indices.last().unwrap();
        for &index in indices {

            let entry = &entries[index];

            // The connection is reused along the origin's queue and closed
            // with its last request.
            let connection = if index == last_index { "close" } else { "keep-alive" };

            let mut kind = EntryErrorKind::ConnError;
            let mut success = false;

            for _ in 0..ENTRY_ATTEMPTS {
                match download_entry(&client, entry, connection, &mut size, total, handler).await {
                    Ok(Ok(())) => {
                        success = true;
                        break;
                    }
                    Ok(Err(new_kind)) => {
                        kind = new_kind;
                    }
                    Err(error) => return Err(error),
                }
            }

            if !success {
                failures.insert(entry.url.clone(), kind);
            }

        }
    }

    Ok(failures)

}

/// Attempt a single entry once. The outer result is a batch-aborting local
/// error, the inner result is the per-attempt verdict. The global size is
/// rolled back when the attempt fails after receiving data.
async fn download_entry(
    client: &Client,
    entry: &Entry,
    connection: &str,
    size: &mut u64,
    total: u64,
    handler: &mut dyn Handler,
) -> Result<std::result::Result<(), EntryErrorKind>> {

    let res = client.get(&*entry.url)
        .header(header::CONNECTION, connection)
        .send().await;

    let mut res = match res {
        Ok(res) => res,
        Err(_) => return Ok(Err(EntryErrorKind::ConnError)),
    };

    if res.status() != StatusCode::OK {
        return Ok(Err(EntryErrorKind::NotFound));
    }

    if let Some(parent) = entry.file.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::new_io_file(e, &*entry.file))?;
    }

    let dst = fs::File::create(&*entry.file)
        .map_err(|e| Error::new_io_file(e, &*entry.file))?;
    let mut dst = BufWriter::with_capacity(WRITE_BUF_SIZE, dst);

    let mut sha1 = entry.expect_sha1.map(|_| Sha1::new());
    let mut entry_size = 0u32;

    loop {

        let chunk = match res.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(_) => {
                *size -= entry_size as u64;
                return Ok(Err(EntryErrorKind::ConnError));
            }
        };

        dst.write_all(&chunk)
            .map_err(|e| Error::new_io_file(e, &*entry.file))?;

        if let Some(sha1) = &mut sha1 {
            sha1.update(&chunk);
        }

        entry_size = entry_size.saturating_add(chunk.len() as u32);
        *size += chunk.len() as u64;

        handler.handle_download_progress(Progress {
            size: *size,
            total,
            name: entry.name(),
            entry_size,
            entry_total: entry.expect_size.unwrap_or(0),
        });

    }

    dst.flush()
        .map_err(|e| Error::new_io_file(e, &*entry.file))?;

    if let Some(expect_size) = entry.expect_size {
        if entry_size != expect_size {
            *size -= entry_size as u64;
            return Ok(Err(EntryErrorKind::InvalidSize));
        }
    }

    if let (Some(sha1), Some(expect_sha1)) = (sha1, &entry.expect_sha1) {
        if sha1.finalize().as_slice() != expect_sha1 {
            *size -= entry_size as u64;
            return Ok(Err(EntryErrorKind::InvalidSha1));
        }
    }

    Ok(Ok(()))

}
