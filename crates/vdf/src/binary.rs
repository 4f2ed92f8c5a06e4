//! Binary KeyValues tree reader shared by the appinfo and shortcuts dialects.
//!
//! An entry is a type tag, a NUL-terminated key and a payload. Tag `0x00`
//! opens a nested section whose entries run until an end marker (`0x08`, or
//! the rarer `0x0b`), which carries no key.

use std::io::{BufRead, Cursor};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::VdfError;
use crate::node::{Scalar, Section};

/// Binary VDF type markers.
pub const TYPE_SECTION: u8 = 0x00;
pub const TYPE_STRING: u8 = 0x01;
pub const TYPE_INT32: u8 = 0x02;
pub const TYPE_FLOAT32: u8 = 0x03;
pub const TYPE_POINTER: u8 = 0x04;
pub const TYPE_WIDE_STRING: u8 = 0x05;
pub const TYPE_COLOR: u8 = 0x06;
pub const TYPE_UINT64: u8 = 0x07;
pub const TYPE_END: u8 = 0x08;
pub const TYPE_INT64: u8 = 0x0a;
pub const TYPE_ALT_END: u8 = 0x0b;

/// Reads one entry stream up to and including its end marker.
///
/// The cursor is left just past the end marker, so callers can compare the
/// position with a declared size. Nesting is tracked on an explicit stack.
pub fn read_tree(cur: &mut Cursor<&[u8]>) -> Result<Section, VdfError> {
    let mut stack: Vec<(String, Section)> = Vec::new();
    let mut current = Section::new();

    loop {
        let offset = cur.position();
        let tag = cur.read_u8().map_err(|_| eof(offset, "type tag"))?;

        match tag {
            TYPE_END | TYPE_ALT_END => match stack.pop() {
                Some((key, mut parent)) => {
                    parent.insert(key, std::mem::take(&mut current));
                    current = parent;
                }
                None => return Ok(current),
            },
            TYPE_SECTION => {
                let key = read_cstring(cur)?;
                stack.push((key, std::mem::take(&mut current)));
            }
            TYPE_STRING | TYPE_INT32 | TYPE_FLOAT32 | TYPE_POINTER | TYPE_WIDE_STRING
            | TYPE_COLOR | TYPE_UINT64 | TYPE_INT64 => {
                let key = read_cstring(cur)?;
                let value = read_scalar(cur, tag)?;
                current.insert(key, value);
            }
            other => return Err(VdfError::UnknownType { tag: other, offset }),
        }
    }
}

fn read_scalar(cur: &mut Cursor<&[u8]>, tag: u8) -> Result<Scalar, VdfError> {
    let offset = cur.position();
    let scalar = match tag {
        TYPE_STRING => Scalar::String(read_cstring(cur)?),
        TYPE_WIDE_STRING => Scalar::WideString(read_wide_string(cur)?),
        TYPE_INT32 => Scalar::Int32(
            cur.read_i32::<LittleEndian>()
                .map_err(|_| eof(offset, "int32"))?,
        ),
        TYPE_FLOAT32 => Scalar::Float32(
            cur.read_f32::<LittleEndian>()
                .map_err(|_| eof(offset, "float32"))?,
        ),
        TYPE_POINTER => Scalar::Pointer(
            cur.read_u32::<LittleEndian>()
                .map_err(|_| eof(offset, "pointer"))?,
        ),
        TYPE_COLOR => Scalar::Color(
            cur.read_u32::<LittleEndian>()
                .map_err(|_| eof(offset, "color"))?,
        ),
        TYPE_UINT64 => Scalar::UInt64(
            cur.read_u64::<LittleEndian>()
                .map_err(|_| eof(offset, "uint64"))?,
        ),
        TYPE_INT64 => Scalar::Int64(
            cur.read_i64::<LittleEndian>()
                .map_err(|_| eof(offset, "int64"))?,
        ),
        other => return Err(VdfError::UnknownType { tag: other, offset }),
    };
    Ok(scalar)
}

/// Reads a NUL-terminated string. Invalid UTF-8 is replaced.
pub fn read_cstring(cur: &mut Cursor<&[u8]>) -> Result<String, VdfError> {
    let start = cur.position();
    let mut buf = Vec::new();
    cur.read_until(0x00, &mut buf)?;
    if buf.pop() != Some(0x00) {
        return Err(eof(start, "string"));
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Reads a UTF-16LE string terminated by a zero code unit.
fn read_wide_string(cur: &mut Cursor<&[u8]>) -> Result<String, VdfError> {
    let start = cur.position();
    let mut units = Vec::new();
    loop {
        let unit = cur
            .read_u16::<LittleEndian>()
            .map_err(|_| eof(start, "wide string"))?;
        if unit == 0 {
            return Ok(String::from_utf16_lossy(&units));
        }
        units.push(unit);
    }
}

/// Maps a failed read at `offset` to a codec error; running out of bytes is
/// [`VdfError::UnexpectedEof`].
pub(crate) fn read_error(e: std::io::Error, offset: u64, context: &'static str) -> VdfError {
    match e.kind() {
        std::io::ErrorKind::UnexpectedEof => eof(offset, context),
        _ => VdfError::Io(e),
    }
}

pub(crate) fn eof(offset: u64, context: &'static str) -> VdfError {
    VdfError::UnexpectedEof { offset, context }
}
