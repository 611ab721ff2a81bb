//! Firmware image packing and inspection.
//!
//! The image is a single deterministic artifact: a checksum line, a small
//! textual header, then one `path\nsize\ncontent` record per manifest file
//! plus a synthetic trailing `datafiles.json` record. The checksum covers
//! everything after the checksum line, so byte-identical input trees
//! produce byte-identical images.

use crate::error::{BuildError, Result};
use crate::firmware::DeviceInfo;
use crate::root::FileEntry;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Format version tag written at the top of every image.
pub const VERSION_LINE: &str = "Version: 1 -- Firmware Device Image File";

/// Path of the synthetic record listing all declared datafile tokens.
pub const DATAFILES_RECORD: &str = "datafiles.json";

fn write_record(payload: &mut Vec<u8>, path: &str, content: &[u8]) {
    payload.extend_from_slice(path.as_bytes());
    payload.push(b'\n');
    payload.extend_from_slice(content.len().to_string().as_bytes());
    payload.push(b'\n');
    payload.extend_from_slice(content);
}

/// Serialize a device's resolved files into the full image byte stream,
/// checksum line included. `entries` must be in manifest (path) order;
/// the packer re-sorts defensively so the checksum can never depend on
/// caller ordering.
pub fn pack(device: &DeviceInfo, entries: &[FileEntry]) -> Result<Vec<u8>> {
    let mut ordered: Vec<&FileEntry> = entries.iter().collect();
    ordered.sort_by(|a, b| a.path.cmp(&b.path));

    let mut payload = Vec::new();
    payload.extend_from_slice(format!("{VERSION_LINE}\n").as_bytes());
    payload.extend_from_slice(format!("Device Id: {}\n", device.id).as_bytes());
    payload.extend_from_slice(format!("Device Name: {}\n", device.name).as_bytes());
    payload.extend_from_slice(format!("Total files: {}\n", ordered.len() + 1).as_bytes());
    payload.push(b'\n');

    // Tokens from every included script, deduplicated and sorted. Always
    // serialized as an array: [] when none exist, never null.
    let mut datafiles: BTreeSet<String> = BTreeSet::new();
    for entry in &ordered {
        let source = entry.source_path();
        let content = fs::read(&source).map_err(|e| BuildError::io(&source, e))?;
        write_record(&mut payload, &entry.path, &content);
        datafiles.extend(entry.datafiles.iter().cloned());
    }
    let tokens: Vec<&String> = datafiles.iter().collect();
    let datafiles_json = serde_json::to_vec(&tokens).map_err(|e| BuildError::Json {
        path: DATAFILES_RECORD.into(),
        source: e,
    })?;
    write_record(&mut payload, DATAFILES_RECORD, &datafiles_json);

    let mut hasher = Sha256::new();
    hasher.update(&payload);
    let checksum = format!("{:x}", hasher.finalize());

    let mut image = Vec::with_capacity(payload.len() + 80);
    image.extend_from_slice(format!("Checksum: {checksum}\n").as_bytes());
    image.extend_from_slice(&payload);
    Ok(image)
}

/// One record of an inspected image.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub path: String,
    pub size: usize,
}

/// Summary of an image file: header fields, records, checksum status.
#[derive(Debug)]
pub struct ImageInfo {
    pub device_id: String,
    pub device_name: String,
    pub total_files: usize,
    pub checksum: String,
    pub checksum_ok: bool,
    pub records: Vec<ImageRecord>,
}

fn malformed(path: &Path, reason: impl Into<String>) -> BuildError {
    BuildError::MalformedImage {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn take_line<'a>(path: &Path, bytes: &'a [u8], pos: &mut usize) -> Result<&'a str> {
    let rest = &bytes[*pos..];
    let end = rest
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| malformed(path, "unterminated line"))?;
    let line =
        std::str::from_utf8(&rest[..end]).map_err(|_| malformed(path, "non-UTF8 header line"))?;
    *pos += end + 1;
    Ok(line)
}

fn header_value<'a>(path: &Path, line: &'a str, key: &str) -> Result<&'a str> {
    line.strip_prefix(key)
        .and_then(|rest| rest.strip_prefix(": "))
        .ok_or_else(|| malformed(path, format!("expected {key} header")))
}

/// Parse an image file and verify its checksum. The builder-side
/// counterpart of the device's image consumer; used by `show image`.
pub fn inspect(path: &Path) -> Result<ImageInfo> {
    let bytes = fs::read(path).map_err(|e| BuildError::io(path, e))?;
    let mut pos = 0;

    let checksum_line = take_line(path, &bytes, &mut pos)?;
    let checksum = header_value(path, checksum_line, "Checksum")?.to_string();
    let payload = &bytes[pos..];
    let mut hasher = Sha256::new();
    hasher.update(payload);
    let checksum_ok = format!("{:x}", hasher.finalize()) == checksum;

    let version_line = take_line(path, &bytes, &mut pos)?;
    if version_line != VERSION_LINE {
        return Err(malformed(path, format!("unknown version {version_line:?}")));
    }
    let device_id = header_value(path, take_line(path, &bytes, &mut pos)?, "Device Id")?.to_string();
    let device_name =
        header_value(path, take_line(path, &bytes, &mut pos)?, "Device Name")?.to_string();
    let total_files: usize = header_value(path, take_line(path, &bytes, &mut pos)?, "Total files")?
        .parse()
        .map_err(|_| malformed(path, "bad file count"))?;
    if !take_line(path, &bytes, &mut pos)?.is_empty() {
        return Err(malformed(path, "missing blank line after header"));
    }

    let mut records = Vec::with_capacity(total_files);
    for _ in 0..total_files {
        let record_path = take_line(path, &bytes, &mut pos)?.to_string();
        let size: usize = take_line(path, &bytes, &mut pos)?
            .parse()
            .map_err(|_| malformed(path, format!("bad size for record {record_path:?}")))?;
        let end = pos
            .checked_add(size)
            .filter(|&end| end <= bytes.len())
            .ok_or_else(|| malformed(path, format!("truncated record {record_path:?}")))?;
        pos = end;
        records.push(ImageRecord {
            path: record_path,
            size,
        });
    }
    if pos != bytes.len() {
        return Err(malformed(path, "trailing bytes after last record"));
    }

    Ok(ImageInfo {
        device_id,
        device_name,
        total_files,
        checksum,
        checksum_ok,
        records,
    })
}
