use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by `compress` and `decompress`.
///
/// An empty input is not represented here: it produces a valid, header-only
/// artifact and is reported through [`crate::codec::Report::is_empty`].
#[derive(Error, Debug)]
pub enum CodecError {
    /// The input path does not exist.
    #[error("source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// Reading or writing failed mid-operation.
    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),

    /// The artifact header or payload is truncated or malformed.
    #[error("corrupted stream: {0}")]
    CorruptedStream(String),

    /// A symbol being encoded has no code in the table derived for it.
    #[error("alphabet mismatch: symbol {0:#04x} has no code")]
    AlphabetMismatch(u8),
}

impl CodecError {
    pub(crate) fn corrupted(msg: impl Into<String>) -> Self {
        Self::CorruptedStream(msg.into())
    }
}

pub type Result<T, E = CodecError> = std::result::Result<T, E>;

/// Like `anyhow::ensure!`, but fails with [`CodecError::CorruptedStream`].
macro_rules! ensure_stream {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::CodecError::corrupted(format!($($arg)+)));
        }
    };
}

pub(crate) use ensure_stream;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_distinct() {
        let errors = [
            CodecError::SourceNotFound {
                path: PathBuf::from("missing.txt"),
            },
            CodecError::Io(io::Error::other("disk full")),
            CodecError::corrupted("bad magic"),
            CodecError::AlphabetMismatch(b'z'),
        ];

        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert_eq!(messages[0], "source not found: missing.txt");
        assert_eq!(messages[1], "I/O failure: disk full");
        assert_eq!(messages[2], "corrupted stream: bad magic");
        assert_eq!(messages[3], "alphabet mismatch: symbol 0x7a has no code");
    }
}
