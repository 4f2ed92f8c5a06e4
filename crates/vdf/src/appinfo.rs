//! `appcache/appinfo.vdf`: a header followed by per-app records, each
//! carrying fixed metadata and one binary KV tree.

use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::VdfError;
use crate::binary::{self, eof};
use crate::node::{Node, Section};

/// Magic for the layout without the binary-data digest.
pub const MAGIC_V27: u32 = 0x0756_4427;
/// Magic for the layout with a second 20-byte digest after `change_number`.
pub const MAGIC_V28: u32 = 0x0756_4428;

/// Bytes of fixed record metadata counted by `size` in the V27 layout.
const FIXED_LEN_V27: u64 = 4 + 4 + 8 + 20 + 4;

/// One app entry from appinfo.vdf.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfoRecord {
    pub app_id: u32,
    /// Declared length of the record after the `size` field.
    pub size: u32,
    pub info_state: u32,
    /// Epoch seconds.
    pub last_updated: u32,
    pub access_token: u64,
    #[serde(serialize_with = "serialize_digest")]
    pub checksum: [u8; 20],
    pub change_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary_checksum: Option<[u8; 20]>,
    pub data: Section,
}

impl AppInfoRecord {
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::from(self.last_updated), 0)
    }

    /// SHA-1 of the text form of the record data, as lowercase hex.
    pub fn checksum_hex(&self) -> String {
        hex::encode(self.checksum)
    }

    /// The store name under `appinfo/common/name`, when present.
    pub fn common_name(&self) -> Option<&str> {
        self.data
            .get_path_ci(&["appinfo", "common", "name"])
            .and_then(Node::as_str)
    }
}

fn serialize_digest<S: serde::Serializer>(digest: &[u8; 20], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(digest))
}

/// Reads appinfo.vdf from disk, streaming one record at a time.
pub fn load_app_info(path: &Path) -> Result<Vec<AppInfoRecord>, VdfError> {
    let file = File::open(path)?;
    read_app_info(BufReader::new(file))
}

/// Parses an in-memory appinfo.vdf image.
pub fn parse_app_info(data: &[u8]) -> Result<Vec<AppInfoRecord>, VdfError> {
    read_app_info(data)
}

/// Reads records until the zero app-id terminator.
///
/// Each record body is read as exactly `size` bytes and must be consumed
/// exactly by its fixed fields plus KV tree; anything else is a
/// [`VdfError::SizeMismatch`]. A stream that ends early is
/// [`VdfError::UnexpectedEof`].
pub fn read_app_info<R: Read>(mut reader: R) -> Result<Vec<AppInfoRecord>, VdfError> {
    let mut offset: u64 = 0;

    let magic = read_u32(&mut reader, &mut offset, "header magic")?;
    if magic != MAGIC_V27 && magic != MAGIC_V28 {
        return Err(VdfError::UnsupportedVersion(magic));
    }
    let _universe = read_u32(&mut reader, &mut offset, "header universe")?;

    let mut records = Vec::new();
    loop {
        let app_id = read_u32(&mut reader, &mut offset, "app id")?;
        if app_id == 0 {
            return Ok(records);
        }
        let size = read_u32(&mut reader, &mut offset, "record size")?;

        // Bounded read: a corrupt size must not turn into a huge allocation.
        let mut body = Vec::new();
        reader
            .by_ref()
            .take(u64::from(size))
            .read_to_end(&mut body)?;
        if body.len() != size as usize {
            return Err(eof(offset, "record body"));
        }
        let record = parse_record(app_id, size, &body, magic, offset)?;
        offset += u64::from(size);
        records.push(record);
    }
}

fn read_u32<R: Read>(
    reader: &mut R,
    offset: &mut u64,
    context: &'static str,
) -> Result<u32, VdfError> {
    let value = reader
        .read_u32::<LittleEndian>()
        .map_err(|e| binary::read_error(e, *offset, context))?;
    *offset += 4;
    Ok(value)
}

/// Decodes one record body. `base` is the body's offset in the file, used
/// to report absolute positions.
fn parse_record(
    app_id: u32,
    size: u32,
    body: &[u8],
    magic: u32,
    base: u64,
) -> Result<AppInfoRecord, VdfError> {
    let fixed_len = if magic == MAGIC_V28 {
        FIXED_LEN_V27 + 20
    } else {
        FIXED_LEN_V27
    };
    if (body.len() as u64) < fixed_len {
        return Err(VdfError::SizeMismatch {
            app_id,
            declared: size,
            consumed: fixed_len,
        });
    }

    let mut cur = Cursor::new(body);
    let info_state = cur.read_u32::<LittleEndian>()?;
    let last_updated = cur.read_u32::<LittleEndian>()?;
    let access_token = cur.read_u64::<LittleEndian>()?;
    let mut checksum = [0u8; 20];
    cur.read_exact(&mut checksum)?;
    let change_number = cur.read_u32::<LittleEndian>()?;
    let binary_checksum = if magic == MAGIC_V28 {
        let mut digest = [0u8; 20];
        cur.read_exact(&mut digest)?;
        Some(digest)
    } else {
        None
    };

    let data = binary::read_tree(&mut cur).map_err(|e| match e {
        // The tree ran off the end of the declared record.
        VdfError::UnexpectedEof { .. } => VdfError::SizeMismatch {
            app_id,
            declared: size,
            consumed: u64::from(size) + 1,
        },
        VdfError::UnknownType { tag, offset } => VdfError::UnknownType {
            tag,
            offset: base + offset,
        },
        other => other,
    })?;

    let consumed = cur.position();
    if consumed != u64::from(size) {
        return Err(VdfError::SizeMismatch {
            app_id,
            declared: size,
            consumed,
        });
    }

    Ok(AppInfoRecord {
        app_id,
        size,
        info_state,
        last_updated,
        access_token,
        checksum,
        change_number,
        binary_checksum,
        data,
    })
}
