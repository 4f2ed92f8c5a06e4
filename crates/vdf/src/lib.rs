//! Steam KeyValues ("VDF") codec.
//!
//! Two encodings share one tree shape ([`Node`] / [`Section`]):
//!
//! - [`text`]: the brace-nested, quoted format used by most config files.
//!   Parsed and written back.
//! - [`binary`]: the type-tagged format, read through two dialects:
//!   [`appinfo`] (`appcache/appinfo.vdf`) and [`shortcuts`]
//!   (`userdata/<id>/config/shortcuts.vdf`). Read-only.

pub mod appinfo;
pub mod binary;
pub mod node;
pub mod shortcuts;
pub mod text;

// Re-export primary types.
pub use appinfo::{AppInfoRecord, load_app_info, parse_app_info, read_app_info};
pub use node::{Node, Scalar, Section};
pub use shortcuts::{ShortcutRecord, generate_app_id, load_shortcuts, parse_shortcuts};

/// Errors for VDF decoding and encoding.
#[derive(Debug, thiserror::Error)]
pub enum VdfError {
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("unexpected end of data at offset {offset} reading {context}")]
    UnexpectedEof { offset: u64, context: &'static str },

    #[error("unknown type tag 0x{tag:02x} at offset {offset}")]
    UnknownType { tag: u8, offset: u64 },

    #[error("record for app {app_id} declares {declared} bytes but {consumed} were consumed")]
    SizeMismatch {
        app_id: u32,
        declared: u32,
        consumed: u64,
    },

    #[error("unsupported appinfo version 0x{0:08x}")]
    UnsupportedVersion(u32),

    #[error("unexpected structure: {0}")]
    Structure(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VdfError {
    /// Returns true when the input bytes do not match the expected grammar,
    /// as opposed to a failure reading them.
    pub fn is_format_error(&self) -> bool {
        !matches!(self, VdfError::Io(_))
    }
}
