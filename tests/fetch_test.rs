//! Downloads over HTTP against a local mock server.

use std::fs;
use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use httpmock::prelude::*;
use stepforge::fetch::{fetch_and_unpack, Fetcher, HttpFetcher, MemberFilter};
use stepforge::StepforgeError;
use tempfile::TempDir;

fn tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, contents.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

#[test]
fn downloads_and_unpacks_archive() {
    let server = MockServer::start();
    let body = tar_gz(&[
        ("zlib-1.3/zlib.h", "#define ZLIB_VERSION \"1.3\"\n"),
        ("zlib-1.3/doc/manual.html", "<html></html>\n"),
    ]);
    let mock = server.mock(|when, then| {
        when.method(GET).path("/zlib-1.3.tar.gz");
        then.status(200).body(body.clone());
    });
    let temp = TempDir::new().unwrap();
    let fetcher = HttpFetcher::new().unwrap();
    let filter = MemberFilter::excluding([".html"]);

    let archive = fetch_and_unpack(
        &fetcher,
        &server.url("/zlib-1.3.tar.gz"),
        &temp.path().join("downloads"),
        &temp.path().join("src"),
        &filter,
    )
    .unwrap();

    mock.assert();
    assert_eq!(archive, temp.path().join("downloads/zlib-1.3.tar.gz"));
    assert!(temp.path().join("src/zlib-1.3/zlib.h").is_file());
    assert!(!temp.path().join("src/zlib-1.3/doc/manual.html").exists());
}

#[test]
fn not_found_is_a_fetch_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.path("/missing.tar.gz");
        then.status(404);
    });
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("missing.tar.gz");

    let err = HttpFetcher::new()
        .unwrap()
        .download(&server.url("/missing.tar.gz"), &dest)
        .unwrap_err();

    match err {
        StepforgeError::FetchError { url, message } => {
            assert!(url.ends_with("/missing.tar.gz"));
            assert!(message.contains("404"));
        }
        other => panic!("expected fetch error, got {:?}", other),
    }
    assert!(!dest.exists());
}

#[test]
fn corrupt_archive_is_a_fetch_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.path("/broken.tar.gz");
        then.status(200).body("definitely not gzip");
    });
    let temp = TempDir::new().unwrap();

    let err = fetch_and_unpack(
        &HttpFetcher::new().unwrap(),
        &server.url("/broken.tar.gz"),
        temp.path(),
        &temp.path().join("src"),
        &MemberFilter::default(),
    )
    .unwrap_err();

    assert!(matches!(err, StepforgeError::FetchError { .. }));
}

#[test]
fn file_urls_are_copied() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("local.tar.gz");
    fs::File::create(&source)
        .unwrap()
        .write_all(&tar_gz(&[("local/README", "hi\n")]))
        .unwrap();

    let url = format!("file://{}", source.display());
    fetch_and_unpack(
        &HttpFetcher::new().unwrap(),
        &url,
        &temp.path().join("downloads"),
        &temp.path().join("src"),
        &MemberFilter::default(),
    )
    .unwrap();

    assert_eq!(
        fs::read_to_string(temp.path().join("src/local/README")).unwrap(),
        "hi\n"
    );
}

#[test]
fn missing_local_source_keeps_copy_error() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("absent.tar.gz");
    let dest = temp.path().join("downloads/absent.tar.gz");

    let err = HttpFetcher::new()
        .unwrap()
        .download(&source.display().to_string(), &dest)
        .unwrap_err();

    match err {
        StepforgeError::FetchError { message, .. } => {
            assert!(message.contains("cannot copy"), "{}", message);
        }
        other => panic!("expected fetch error, got {:?}", other),
    }
    assert!(!dest.exists());
}
