// src/filesystem/mod.rs

//! Release archive extraction and package removal
//!
//! GitHub wraps release contents in a single `<owner>-<repo>-<sha>/`
//! directory. Extraction strips that wrapper, renames it to the package name,
//! drops entries matched by the package's ignore rules and writes the rest
//! under the install directory with their archived timestamps.

pub mod ignore;

pub use ignore::is_ignored;

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{Cursor, Read, Write};
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tar::{Archive, EntryType};
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// Largest buffer reserved up front for an entry; sizes come from the archive
const MAX_PREALLOC: u64 = 1 << 20;

/// Archive container format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveFormat {
    Zip,
    TarGz,
}

/// Detect the archive format from magic bytes
fn detect_format(bytes: &[u8]) -> Result<ArchiveFormat> {
    // Zip local file header: "PK\x03\x04" (or "PK\x05\x06" for an empty archive)
    if bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(b"PK\x05\x06") {
        return Ok(ArchiveFormat::Zip);
    }

    // Gzip magic: 0x1F 0x8B
    if bytes.starts_with(&[0x1F, 0x8B]) {
        return Ok(ArchiveFormat::TarGz);
    }

    Err(Error::Extraction(
        "Unrecognized archive format (expected zip or tar.gz)".to_string(),
    ))
}

/// Extract a release archive into `<target_dir>/<package_name>/`
///
/// Returns the number of files written.
pub fn extract<S: AsRef<str>>(
    archive: &[u8],
    target_dir: &Path,
    package_name: &str,
    ignore: &[S],
) -> Result<usize> {
    let package_dir = target_dir.join(package_name);

    let written = match detect_format(archive)? {
        ArchiveFormat::Zip => extract_zip(archive, &package_dir, ignore)?,
        ArchiveFormat::TarGz => extract_tar_gz(archive, &package_dir, ignore)?,
    };

    info!("Extracted {} files into {}", written, package_dir.display());
    Ok(written)
}

fn extract_zip<S: AsRef<str>>(archive: &[u8], package_dir: &Path, ignore: &[S]) -> Result<usize> {
    let mut zip = ZipArchive::new(Cursor::new(archive))
        .map_err(|e| Error::Extraction(format!("Failed to open zip archive: {}", e)))?;

    if zip.is_empty() {
        return Ok(0);
    }

    let prefix = {
        let first = zip
            .by_index(0)
            .map_err(|e| Error::Extraction(format!("Failed to read zip entry 0: {}", e)))?;
        wrapper_prefix(first.name())
    };
    debug!("Archive wrapper directory: {}", prefix);

    let mut written = 0;
    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| Error::Extraction(format!("Failed to read zip entry {}: {}", index, e)))?;

        // Directories have no size and are created on demand
        if entry.is_dir() || entry.size() == 0 {
            continue;
        }

        let name = entry.name().to_string();
        let Some(relative) = name.strip_prefix(&prefix) else {
            warn!("Skipping entry outside wrapper directory: {}", name);
            continue;
        };

        if is_ignored(&name, ignore, &prefix) {
            debug!("Ignoring {}", relative);
            continue;
        }

        let mut content = entry_buffer(entry.size());
        entry
            .read_to_end(&mut content)
            .map_err(|e| Error::Extraction(format!("Failed to read {}: {}", name, e)))?;

        let modified = entry.last_modified().and_then(zip_timestamp);
        write_entry(package_dir, relative, &content, modified)?;
        written += 1;
    }

    Ok(written)
}

fn extract_tar_gz<S: AsRef<str>>(
    archive: &[u8],
    package_dir: &Path,
    ignore: &[S],
) -> Result<usize> {
    let mut tar = Archive::new(GzDecoder::new(Cursor::new(archive)));
    let entries = tar
        .entries()
        .map_err(|e| Error::Extraction(format!("Failed to read tar archive: {}", e)))?;

    let mut prefix: Option<String> = None;
    let mut written = 0;

    for entry in entries {
        let mut entry =
            entry.map_err(|e| Error::Extraction(format!("Failed to read tar entry: {}", e)))?;

        let entry_type = entry.header().entry_type();
        if matches!(entry_type, EntryType::XGlobalHeader | EntryType::XHeader) {
            continue;
        }

        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let wrapper = prefix.get_or_insert_with(|| wrapper_prefix(&name)).clone();

        if entry_type.is_dir() || entry.size() == 0 {
            continue;
        }
        if !entry_type.is_file() {
            debug!("Skipping non-regular entry {}", name);
            continue;
        }

        let Some(relative) = name.strip_prefix(&wrapper) else {
            warn!("Skipping entry outside wrapper directory: {}", name);
            continue;
        };

        if is_ignored(&name, ignore, &wrapper) {
            debug!("Ignoring {}", relative);
            continue;
        }

        let mut content = entry_buffer(entry.size());
        entry
            .read_to_end(&mut content)
            .map_err(|e| Error::Extraction(format!("Failed to read {}: {}", name, e)))?;

        let modified = entry
            .header()
            .mtime()
            .ok()
            .map(|secs| UNIX_EPOCH + Duration::from_secs(secs));
        write_entry(package_dir, relative, &content, modified)?;
        written += 1;
    }

    Ok(written)
}

/// Read buffer for an entry whose header declares `declared` bytes
fn entry_buffer(declared: u64) -> Vec<u8> {
    Vec::with_capacity(declared.min(MAX_PREALLOC) as usize)
}

/// Wrapper directory named by the first archive entry, with a trailing `/`
fn wrapper_prefix(first_entry: &str) -> String {
    match first_entry.split('/').find(|s| !s.is_empty()) {
        Some(segment) => format!("{}/", segment),
        None => String::new(),
    }
}

/// Convert a zip (DOS) timestamp to system time, treating it as UTC
fn zip_timestamp(stamp: zip::DateTime) -> Option<SystemTime> {
    let naive = chrono::NaiveDate::from_ymd_opt(
        stamp.year().into(),
        stamp.month().into(),
        stamp.day().into(),
    )?
    .and_hms_opt(
        stamp.hour().into(),
        stamp.minute().into(),
        stamp.second().into(),
    )?;

    let secs = u64::try_from(naive.and_utc().timestamp()).ok()?;
    Some(UNIX_EPOCH + Duration::from_secs(secs))
}

/// Reject relative paths that could escape the package directory
fn safe_relative_path(relative: &str) -> Result<PathBuf> {
    let path = Path::new(relative);
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => {
                return Err(Error::Extraction(format!(
                    "Archive entry escapes package directory: {}",
                    relative
                )));
            }
        }
    }
    Ok(path.to_path_buf())
}

fn write_entry(
    package_dir: &Path,
    relative: &str,
    content: &[u8],
    modified: Option<SystemTime>,
) -> Result<()> {
    let dest = package_dir.join(safe_relative_path(relative)?);

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(&dest)?;
    file.write_all(content)?;

    if let Some(modified) = modified {
        if let Err(e) = file.set_modified(modified) {
            warn!("Failed to set modification time on {}: {}", dest.display(), e);
        }
    }

    Ok(())
}

/// Recursively delete `<target_dir>/<package_name>`
///
/// Callers check that the package is installed first.
pub fn remove(target_dir: &Path, package_name: &str) -> Result<()> {
    let package_dir = target_dir.join(package_name);
    fs::remove_dir_all(&package_dir)?;
    info!("Removed {}", package_dir.display());
    Ok(())
}
