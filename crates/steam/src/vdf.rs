//! Binary VDF codec used by `appinfo.vdf` and `shortcuts.vdf`.
//!
//! Every entry starts with a type byte, followed (except for the end marker)
//! by a null-terminated name and a type-specific little-endian payload.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::debug;

use crate::node::{Node, Table, list_to_table};

/// Binary VDF type markers.
const VDF_TYPE_OBJECT: u8 = 0x00;
const VDF_TYPE_STRING: u8 = 0x01;
const VDF_TYPE_INT32: u8 = 0x02;
const VDF_TYPE_FLOAT32: u8 = 0x03;
const VDF_TYPE_POINTER: u8 = 0x04;
const VDF_TYPE_WIDE_STRING: u8 = 0x05;
const VDF_TYPE_COLOR: u8 = 0x06;
const VDF_TYPE_UINT64: u8 = 0x07;
const VDF_TYPE_END: u8 = 0x08;

/// Header bytes after the app ID of the first record in `appinfo.vdf`.
const APP_INFO_FIRST_HEADER: usize = 49;
/// Header bytes after the app ID of every following record.
const APP_INFO_HEADER: usize = 48;

/// Shortcut fields stored as 0/1 integers.
pub const SHORTCUT_BOOLEANS: &[&str] = &["IsHidden", "AllowDesktopConfig", "AllowOverlay", "OpenVR"];
/// Shortcut fields stored as Unix timestamps.
pub const SHORTCUT_TIMESTAMPS: &[&str] = &["LastPlayTime"];
/// Shortcut fields stored as index-keyed tables.
pub const SHORTCUT_LISTS: &[&str] = &["tags"];

/// Rendered in place of a zero timestamp.
pub const NEVER: &str = "Never";

/// Errors from decoding binary VDF.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// A read started exactly at the end of the buffer.
    #[error("end of data at offset {offset}")]
    Eof { offset: usize },

    #[error("truncated data at offset {offset}: needed {needed} bytes, buffer is {len} bytes")]
    Truncated {
        offset: usize,
        needed: usize,
        len: usize,
    },

    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("unknown type marker 0x{marker:02x} for key '{key}' at offset {offset}")]
    UnknownType {
        marker: u8,
        key: String,
        offset: usize,
    },

    #[error("expected root key '{expected}'")]
    MissingRoot { expected: &'static str },

    #[error("cannot encode '{key}': {reason}")]
    Unencodable { key: String, reason: String },
}

/// One record of `appinfo.vdf`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppInfoRecord {
    pub app_id: u32,
    pub entries: Table,
}

/// Decodes a single binary table, reading entries until its end marker.
pub fn decode_table(data: &[u8]) -> Result<Table, DecodeError> {
    let mut reader = Reader::new(data);
    read_table(&mut reader)
}

/// Parses the records of `appinfo.vdf`.
///
/// Records are read until a read starts exactly at the end of the buffer;
/// that is the normal end of the stream. Any other failure is returned.
pub fn parse_app_info(data: &[u8]) -> Result<Vec<AppInfoRecord>, DecodeError> {
    let mut reader = Reader::new(data);
    let mut records = Vec::new();

    loop {
        let header_len = if records.is_empty() {
            APP_INFO_FIRST_HEADER
        } else {
            APP_INFO_HEADER
        };

        match read_app_info_record(&mut reader, header_len) {
            Ok(record) => records.push(record),
            Err(DecodeError::Eof { offset }) => {
                debug!(offset, count = records.len(), "reached end of app info data");
                break;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(records)
}

fn read_app_info_record(reader: &mut Reader<'_>, header_len: usize) -> Result<AppInfoRecord, DecodeError> {
    let app_id = reader.read_u32()?;
    reader.take(header_len)?;
    let entries = read_table(reader)?;
    Ok(AppInfoRecord { app_id, entries })
}

/// Parses `shortcuts.vdf` and converts typed fields.
///
/// Returns the root table (`{"shortcuts": {"0": {...}, ...}}`) with boolean
/// flags as [`Node::Bool`], play times as RFC 2822 strings (or `"Never"`)
/// and tags flattened to a [`Node::List`].
pub fn parse_shortcuts(data: &[u8]) -> Result<Table, DecodeError> {
    let mut root = decode_table(data)?;
    let shortcuts = root
        .get_mut("shortcuts")
        .and_then(Node::as_table_mut)
        .ok_or(DecodeError::MissingRoot {
            expected: "shortcuts",
        })?;

    for entry in shortcuts.values_mut() {
        if let Some(fields) = entry.as_table_mut() {
            convert_shortcut(fields);
        }
    }

    Ok(root)
}

/// Encodes a shortcuts root table, undoing the conversions of
/// [`parse_shortcuts`].
pub fn encode_shortcuts(root: &Table) -> Result<Vec<u8>, DecodeError> {
    let mut root = root.clone();
    let shortcuts = root
        .get_mut("shortcuts")
        .and_then(Node::as_table_mut)
        .ok_or(DecodeError::MissingRoot {
            expected: "shortcuts",
        })?;

    for entry in shortcuts.values_mut() {
        if let Some(fields) = entry.as_table_mut() {
            unconvert_shortcut(fields)?;
        }
    }

    Ok(encode_table(&root))
}

/// Encodes a table as a complete binary VDF document.
///
/// Booleans are written as int32 0/1 and lists as index-keyed tables.
pub fn encode_table(table: &Table) -> Vec<u8> {
    let mut out = Vec::new();
    write_entries(&mut out, table);
    out.push(VDF_TYPE_END);
    out
}

fn convert_shortcut(fields: &mut Table) {
    for &name in SHORTCUT_BOOLEANS {
        if let Some(node) = fields.get_mut(name)
            && let Node::Int32(v) = *node
        {
            *node = Node::Bool(v == 1);
        }
    }

    for &name in SHORTCUT_TIMESTAMPS {
        if let Some(node) = fields.get_mut(name)
            && let Node::Int32(v) = *node
        {
            *node = Node::String(format_timestamp(v));
        }
    }

    for &name in SHORTCUT_LISTS {
        if let Some(node) = fields.get_mut(name)
            && let Node::Table(t) = node
        {
            let values = t.values().cloned().collect();
            *node = Node::List(values);
        }
    }
}

fn unconvert_shortcut(fields: &mut Table) -> Result<(), DecodeError> {
    for &name in SHORTCUT_BOOLEANS {
        if let Some(node) = fields.get_mut(name)
            && let Node::Bool(b) = *node
        {
            *node = Node::Int32(i32::from(b));
        }
    }

    for &name in SHORTCUT_TIMESTAMPS {
        if let Some(node) = fields.get_mut(name)
            && let Node::String(s) = node
        {
            let secs = parse_timestamp(s).ok_or_else(|| DecodeError::Unencodable {
                key: name.to_string(),
                reason: format!("'{s}' is not a timestamp"),
            })?;
            *node = Node::Int32(secs);
        }
    }

    for &name in SHORTCUT_LISTS {
        if let Some(node) = fields.get_mut(name)
            && let Node::List(items) = node
        {
            *node = Node::Table(list_to_table(items));
        }
    }

    Ok(())
}

/// Renders a shortcut timestamp. Zero means the shortcut was never played.
fn format_timestamp(raw: i32) -> String {
    if raw == 0 {
        return NEVER.to_string();
    }
    // Stored as int32 but written by Steam as an unsigned count of seconds.
    let secs = i64::from(raw as u32);
    match Utc.timestamp_opt(secs, 0).single() {
        Some(dt) => dt.to_rfc2822(),
        None => secs.to_string(),
    }
}

fn parse_timestamp(s: &str) -> Option<i32> {
    if s == NEVER {
        return Some(0);
    }
    let secs = match DateTime::parse_from_rfc2822(s) {
        Ok(dt) => dt.timestamp(),
        Err(_) => s.parse::<i64>().ok()?,
    };
    u32::try_from(secs).ok().map(|v| v as i32)
}

fn write_entries(out: &mut Vec<u8>, table: &Table) {
    for (key, node) in table {
        match node {
            Node::Table(child) => {
                write_header(out, VDF_TYPE_OBJECT, key);
                write_entries(out, child);
                out.push(VDF_TYPE_END);
            }
            Node::List(items) => {
                write_header(out, VDF_TYPE_OBJECT, key);
                write_entries(out, &list_to_table(items));
                out.push(VDF_TYPE_END);
            }
            Node::String(s) => {
                write_header(out, VDF_TYPE_STRING, key);
                write_cstring(out, s);
            }
            Node::Int32(v) => {
                write_header(out, VDF_TYPE_INT32, key);
                out.extend_from_slice(&v.to_le_bytes());
            }
            Node::Bool(b) => {
                write_header(out, VDF_TYPE_INT32, key);
                out.extend_from_slice(&i32::from(*b).to_le_bytes());
            }
            Node::Float32(v) => {
                write_header(out, VDF_TYPE_FLOAT32, key);
                out.extend_from_slice(&v.to_le_bytes());
            }
            Node::UInt64(v) => {
                write_header(out, VDF_TYPE_UINT64, key);
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
    }
}

fn write_header(out: &mut Vec<u8>, marker: u8, key: &str) {
    out.push(marker);
    write_cstring(out, key);
}

fn write_cstring(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
    out.push(0x00);
}

/// Reads entries into a table until the end marker.
fn read_table(reader: &mut Reader<'_>) -> Result<Table, DecodeError> {
    let mut table = Table::new();

    loop {
        let marker_offset = reader.pos;
        let marker = reader.read_u8()?;
        if marker == VDF_TYPE_END {
            return Ok(table);
        }

        let key = reader.read_cstring()?;

        let value = match marker {
            VDF_TYPE_OBJECT => Node::Table(read_table(reader)?),
            VDF_TYPE_STRING | VDF_TYPE_WIDE_STRING => Node::String(reader.read_cstring()?),
            VDF_TYPE_INT32 | VDF_TYPE_POINTER | VDF_TYPE_COLOR => Node::Int32(reader.read_i32()?),
            VDF_TYPE_FLOAT32 => Node::Float32(reader.read_f32()?),
            VDF_TYPE_UINT64 => Node::UInt64(reader.read_u64()?),
            _ => {
                return Err(DecodeError::UnknownType {
                    marker,
                    key,
                    offset: marker_offset,
                });
            }
        };

        table.insert(key, value);
    }
}

/// Bounds-checked cursor over a byte buffer.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the next `n` bytes.
    ///
    /// Starting at the very end is [`DecodeError::Eof`]; running past it
    /// from anywhere else is [`DecodeError::Truncated`].
    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let len = self.data.len();
        if self.pos == len {
            return Err(DecodeError::Eof { offset: self.pos });
        }
        if self.pos + n > len {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed: n,
                len,
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take_array::<1>()?[0])
    }

    fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    fn read_u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    fn read_f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_le_bytes(self.take_array()?))
    }

    /// Reads a null-terminated string.
    fn read_cstring(&mut self) -> Result<String, DecodeError> {
        let start = self.pos;
        if start == self.data.len() {
            return Err(DecodeError::Eof { offset: start });
        }
        let end = self.data[start..]
            .iter()
            .position(|&b| b == 0x00)
            .map(|i| start + i)
            .ok_or(DecodeError::UnterminatedString { offset: start })?;
        let s = String::from_utf8_lossy(&self.data[start..end]).into_owned();
        self.pos = end + 1;
        Ok(s)
    }
}
