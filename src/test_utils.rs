// src/test_utils.rs

//! Shared fixtures for unit tests

use crate::repository::{Transport, TransportError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Cursor, Write};

/// In-memory transport serving canned responses and recording requests
///
/// Unknown URLs answer with HTTP 404.
#[derive(Default)]
pub struct FakeTransport {
    responses: RefCell<HashMap<String, Result<Vec<u8>, u16>>>,
    requests: RefCell<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, body: impl AsRef<[u8]>) {
        self.responses
            .borrow_mut()
            .insert(url.to_string(), Ok(body.as_ref().to_vec()));
    }

    pub fn fail(&self, url: &str, status: u16) {
        self.responses.borrow_mut().insert(url.to_string(), Err(status));
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl Transport for FakeTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.requests.borrow_mut().push(url.to_string());
        match self.responses.borrow().get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(TransportError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(TransportError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// Timestamp stored on every zip entry built by `zip_archive` (2014-05-01T12:00:00Z)
pub const ZIP_MTIME: u64 = 1_398_945_600;

/// Build a zip archive; names ending in `/` become directory entries
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let stamp = zip::DateTime::from_date_and_time(2014, 5, 1, 12, 0, 0).unwrap();
    let options = SimpleFileOptions::default().last_modified_time(stamp);

    for (name, content) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
    }

    writer.finish().unwrap().into_inner()
}

/// Build a gzip'd tar archive with a leading pax global header, like GitHub tarballs
pub fn tar_gz_archive(entries: &[(&str, &[u8])], mtime: u64) -> Vec<u8> {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tar::{Builder, EntryType, Header};

    let mut builder = Builder::new(GzEncoder::new(Vec::new(), Compression::default()));

    let comment = b"52 comment=0123456789abcdef0123456789abcdef01234567\n";
    let mut pax = Header::new_ustar();
    pax.set_path("pax_global_header").unwrap();
    pax.set_entry_type(EntryType::XGlobalHeader);
    pax.set_size(comment.len() as u64);
    pax.set_mode(0o644);
    pax.set_cksum();
    builder.append(&pax, &comment[..]).unwrap();

    for (name, content) in entries {
        let mut header = Header::new_ustar();
        header.set_path(name).unwrap();
        header.set_mtime(mtime);
        if name.ends_with('/') {
            header.set_entry_type(EntryType::Directory);
            header.set_size(0);
            header.set_mode(0o755);
        } else {
            header.set_entry_type(EntryType::Regular);
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
        }
        header.set_cksum();
        builder.append(&header, *content).unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}
