//! Download engine tests against a local mock server.

use std::cell::Cell;
use std::rc::Rc;
use std::fs;

use sha1::{Digest, Sha1};
use tempfile::TempDir;

use pocketmc::download::{DownloadList, EntryErrorKind, Error, Progress};


fn sha1_of(data: &[u8]) -> [u8; 20] {
    let mut digest = Sha1::new();
    digest.update(data);
    digest.finalize().into()
}

#[test]
fn integrity_success() {

    let tmp_dir = TempDir::new().unwrap();
    let dst = tmp_dir.path().join("sub").join("hello.txt");

    let mut server = mockito::Server::new();
    server.mock("GET", "/hello.txt")
        .with_body(b"hello")
        .create();

    let mut dl = DownloadList::new();
    dl.push(format!("{}/hello.txt", server.url()), dst.clone())
        .set_expect_size(Some(5))
        .set_expect_sha1(Some(sha1_of(b"hello")))
        .set_name("hello.txt");

    assert_eq!(dl.len(), 1);
    assert_eq!(dl.size(), 5);

    dl.download_files(()).unwrap();
    assert_eq!(fs::read(&dst).unwrap(), b"hello");

}

#[test]
fn integrity_sha1_mismatch() {

    let tmp_dir = TempDir::new().unwrap();
    let dst = tmp_dir.path().join("hello.txt");

    let mut server = mockito::Server::new();
    let mock = server.mock("GET", "/hello.txt")
        .with_body(b"HELLO")
        .expect(3)  // One request per attempt.
        .create();

    let url = format!("{}/hello.txt", server.url());
    let mut dl = DownloadList::new();
    dl.push(url.clone(), dst)
        .set_expect_size(Some(5))
        .set_expect_sha1(Some(sha1_of(b"hello")));

    match dl.download_files(()) {
        Err(Error::Failures { failures }) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[url.as_str()], EntryErrorKind::InvalidSha1);
        }
        other => panic!("unexpected result: {other:?}"),
    }

    mock.assert();

}

#[test]
fn size_mismatch_and_not_found() {

    let tmp_dir = TempDir::new().unwrap();

    let mut server = mockito::Server::new();
    server.mock("GET", "/short.bin")
        .with_body(b"abc")
        .create();
    server.mock("GET", "/missing.bin")
        .with_status(404)
        .create();

    let short_url = format!("{}/short.bin", server.url());
    let missing_url = format!("{}/missing.bin", server.url());

    let mut dl = DownloadList::new();
    dl.push(short_url.clone(), tmp_dir.path().join("short.bin"))
        .set_expect_size(Some(10));
    dl.push(missing_url.clone(), tmp_dir.path().join("missing.bin"));

    match dl.download_files(()) {
        Err(Error::Failures { failures }) => {
            assert_eq!(failures[short_url.as_str()], EntryErrorKind::InvalidSize);
            assert_eq!(failures[missing_url.as_str()], EntryErrorKind::NotFound);
        }
        other => panic!("unexpected result: {other:?}"),
    }

}

#[test]
fn invalid_scheme_reported() {

    let tmp_dir = TempDir::new().unwrap();

    let mut dl = DownloadList::new();
    dl.push("ftp://example.com/file", tmp_dir.path().join("file"));

    match dl.download_files(()) {
        Err(Error::Failures { failures }) => {
            assert_eq!(failures["ftp://example.com/file"], EntryErrorKind::ConnError);
        }
        other => panic!("unexpected result: {other:?}"),
    }

}

#[test]
fn callbacks_after_success_only() {

    let tmp_dir = TempDir::new().unwrap();

    let mut server = mockito::Server::new();
    server.mock("GET", "/ok.bin")
        .with_body(b"ok")
        .create();
    server.mock("GET", "/bad.bin")
        .with_status(500)
        .create();

    // Callbacks run when the batch fully succeeds.
    let ran = Rc::new(Cell::new(false));
    let ran_witness = Rc::clone(&ran);

    let mut dl = DownloadList::new();
    dl.push(format!("{}/ok.bin", server.url()), tmp_dir.path().join("ok.bin"));
    dl.add_callback(move || {
        ran_witness.set(true);
        Ok(())
    });
    dl.download_files(()).unwrap();
    assert!(ran.get());

    // Callbacks run for an empty batch too.
    let ran = Rc::new(Cell::new(false));
    let ran_witness = Rc::clone(&ran);

    let mut dl = DownloadList::new();
    dl.add_callback(move || {
        ran_witness.set(true);
        Ok(())
    });
    dl.download_files(()).unwrap();
    assert!(ran.get());

    // Callbacks don't run when any entry failed.
    let ran = Rc::new(Cell::new(false));
    let ran_witness = Rc::clone(&ran);

    let mut dl = DownloadList::new();
    dl.push(format!("{}/bad.bin", server.url()), tmp_dir.path().join("bad.bin"));
    dl.add_callback(move || {
        ran_witness.set(true);
        Ok(())
    });
    assert!(dl.download_files(()).is_err());
    assert!(!ran.get());

}

#[test]
fn progress_reported() {

    let tmp_dir = TempDir::new().unwrap();

    let mut server = mockito::Server::new();
    server.mock("GET", "/a.bin")
        .with_body(b"aaaa")
        .create();
    server.mock("GET", "/b.bin")
        .with_body(b"bb")
        .create();

    let mut dl = DownloadList::new();
    dl.push(format!("{}/a.bin", server.url()), tmp_dir.path().join("a.bin"))
        .set_expect_size(Some(4))
        .set_name("a");
    dl.push(format!("{}/b.bin", server.url()), tmp_dir.path().join("b.bin"))
        .set_expect_size(Some(2))
        .set_name("b");

    struct ProgressHandler {
        last_size: u64,
        total: u64,
    }

    impl pocketmc::download::Handler for ProgressHandler {
        fn handle_download_progress(&mut self, progress: Progress) {
            // Total bytes only grow while entries succeed.
            assert!(progress.size >= self.last_size);
            self.last_size = progress.size;
            self.total = progress.total;
        }
    }

    let mut handler = ProgressHandler { last_size: 0, total: 0 };
    dl.download_files(&mut handler).unwrap();

    assert_eq!(handler.last_size, 6);
    assert_eq!(handler.total, 6);

}
