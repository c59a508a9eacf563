//! Static two-pass Huffman coder over bytes.
//!
//! ```no_run
//! use std::path::Path;
//!
//! let report = huffpack::compress_file(Path::new("input.txt"), Path::new("input.hfp"))?;
//! println!("{} -> {} bytes", report.input_bytes, report.output_bytes);
//! huffpack::decompress_file(Path::new("input.hfp"), Path::new("restored.txt"))?;
//! # Ok::<(), huffpack::CodecError>(())
//! ```

pub mod bitstream;
pub mod codec;
pub mod container;
pub mod error;
pub mod frequency;
pub mod huffman;

pub use codec::{Report, compress, compress_file, decompress, decompress_file};
pub use error::{CodecError, Result};
pub use frequency::FrequencyTable;
pub use huffman::{CodeTable, HuffmanTree};
