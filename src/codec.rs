use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::bitstream::{BitReader, BitWriter};
use crate::container::{Header, Reader};
use crate::error::{CodecError, Result, ensure_stream};
use crate::frequency::FrequencyTable;
use crate::huffman::{CodeTable, HuffmanTree, NodeType};

/// Outcome of a compress or decompress run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Report {
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub distinct_symbols: usize,
    pub payload_bits: u64,
}

impl Report {
    /// True when the plaintext side of the run was empty.
    pub fn is_empty(&self) -> bool {
        self.distinct_symbols == 0
    }

    /// Output size over input size, `None` when the input was empty.
    pub fn ratio(&self) -> Option<f64> {
        (self.input_bytes > 0).then(|| self.output_bytes as f64 / self.input_bytes as f64)
    }
}

/// Appends the code of every symbol in `input` to a fresh bit writer.
pub fn encode(input: &[u8], codes: &CodeTable) -> Result<BitWriter> {
    let mut writer = BitWriter::with_capacity(input.len());
    for &symbol in input {
        let code = codes
            .get(symbol)
            .ok_or(CodecError::AlphabetMismatch(symbol))?;
        writer.write(code);
    }

    Ok(writer)
}

/// Walks `tree` bit by bit until `symbols` symbols have been emitted.
///
/// A lone-leaf tree consumes one `0` bit per occurrence.
pub fn decode(reader: &mut BitReader<'_>, tree: &HuffmanTree, symbols: u64) -> Result<Vec<u8>> {
    let root = tree.root();
    // every symbol costs at least one bit
    let capacity = usize::try_from(symbols)
        .unwrap_or(usize::MAX)
        .min(reader.remaining());
    let mut decoded = Vec::with_capacity(capacity);

    if let NodeType::Leaf(symbol) = root.node_type() {
        for _ in 0..symbols {
            match reader.read() {
                Some(false) => decoded.push(*symbol),
                Some(true) => {
                    return Err(CodecError::corrupted("set bit in single-symbol payload"));
                }
                None => return Err(CodecError::corrupted("payload ended early")),
            }
        }
    } else {
        let mut current_node = root;
        while (decoded.len() as u64) < symbols {
            let Some(bit) = reader.read() else {
                let state = if std::ptr::eq(current_node, root) {
                    "between"
                } else {
                    "inside"
                };
                return Err(CodecError::corrupted(format!(
                    "payload ended {state} codes after {} of {symbols} symbols",
                    decoded.len()
                )));
            };

            current_node = current_node
                .child(bit)
                .expect("cursor is reset to the root on every leaf");

            if let NodeType::Leaf(symbol) = current_node.node_type() {
                decoded.push(*symbol);
                current_node = root;
            }
        }
    }

    ensure_stream!(
        reader.is_exhausted(),
        "{} payload bits left after the last symbol",
        reader.remaining()
    );

    Ok(decoded)
}

/// Compresses `input` into a self-describing artifact.
pub fn compress(input: &[u8]) -> Result<Vec<u8>> {
    compress_with_report(input).map(|(artifact, _)| artifact)
}

/// Restores the plaintext held in `artifact`.
pub fn decompress(artifact: &[u8]) -> Result<Vec<u8>> {
    decompress_with_report(artifact).map(|(plain, _)| plain)
}

fn compress_with_report(input: &[u8]) -> Result<(Vec<u8>, Report)> {
    let freqs = FrequencyTable::count(input);
    log::trace!("frequency table: {:?}", freqs);

    let (payload, bit_count) = match HuffmanTree::build(&freqs) {
        Some(tree) => {
            log::trace!("code table:\n{tree}");
            let writer = encode(input, tree.codes())?;
            let bit_count = writer.bit_count();
            (writer.into_bytes(), bit_count)
        }
        None => {
            log::info!("compressing empty input");
            (Vec::new(), 0)
        }
    };

    let header = Header { freqs, bit_count };
    let mut artifact = Vec::with_capacity(header.encoded_len() + payload.len());
    header.write_to(&mut artifact);
    artifact.extend_from_slice(&payload);

    let report = Report {
        input_bytes: input.len() as u64,
        output_bytes: artifact.len() as u64,
        distinct_symbols: header.freqs.len(),
        payload_bits: bit_count,
    };
    log::debug!(
        "compressed {} bytes into {} ({} distinct symbols, {} payload bits)",
        report.input_bytes,
        report.output_bytes,
        report.distinct_symbols,
        report.payload_bits
    );

    Ok((artifact, report))
}

fn decompress_with_report(artifact: &[u8]) -> Result<(Vec<u8>, Report)> {
    let mut reader = Reader::new(artifact);
    let header = reader.parse_header()?;
    let payload = reader.payload();

    let decoded = match HuffmanTree::build(&header.freqs) {
        Some(tree) => {
            let expected = tree.encoded_bits();
            ensure_stream!(
                header.bit_count == expected,
                "header records {} payload bits, frequencies imply {}",
                header.bit_count,
                expected
            );
            let mut bits = BitReader::new(payload, header.bit_count)?;
            decode(&mut bits, &tree, tree.weight())?
        }
        None => {
            ensure_stream!(
                header.bit_count == 0 && payload.is_empty(),
                "empty alphabet with {} payload bits and {} payload bytes",
                header.bit_count,
                payload.len()
            );
            log::info!("decompressing empty input");
            Vec::new()
        }
    };

    let report = Report {
        input_bytes: artifact.len() as u64,
        output_bytes: decoded.len() as u64,
        distinct_symbols: header.freqs.len(),
        payload_bits: header.bit_count,
    };
    log::debug!(
        "decompressed {} bytes into {}",
        report.input_bytes,
        report.output_bytes
    );

    Ok((decoded, report))
}

/// Compresses the file at `input` into `output`.
///
/// `output` is only replaced once the whole artifact has been written.
pub fn compress_file(input: &Path, output: &Path) -> Result<Report> {
    let plain = read_source(input)?;
    let (artifact, report) = compress_with_report(&plain)?;
    write_atomic(output, &artifact)?;
    Ok(report)
}

/// Decompresses the artifact at `input` into `output`.
///
/// `output` is only replaced once the stream has been fully validated and
/// decoded.
pub fn decompress_file(input: &Path, output: &Path) -> Result<Report> {
    let artifact = read_source(input)?;
    let (plain, report) = decompress_with_report(&artifact)?;
    write_atomic(output, &plain)?;
    Ok(report)
}

fn read_source(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => CodecError::SourceNotFound {
            path: path.to_path_buf(),
        },
        _ => CodecError::Io(e),
    })
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    // dropped (and removed) on any early return
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    log::debug!("wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(input: &[u8]) {
        let artifact = compress(input).unwrap();
        assert_eq!(decompress(&artifact).unwrap(), input);
    }

    #[test]
    fn roundtrips_degenerate_inputs() {
        roundtrip(b"");
        roundtrip(b"a");
        roundtrip(b"aaaa");
        roundtrip(b"abcdefg");
    }

    #[test]
    fn roundtrips_skewed_text() {
        roundtrip(
            b"We the People of the United States, in Order to form a more perfect Union, \
              establish Justice, insure domestic Tranquility, provide for the common defence",
        );
    }

    #[test]
    fn roundtrips_every_byte_value() {
        let input: Vec<u8> = (0..=255u8).chain((0..=255u8).rev()).chain([0, 0, 0]).collect();
        roundtrip(&input);
    }

    #[test]
    fn single_symbol_payload_is_one_zero_bit_each() {
        let artifact = compress(b"aaaa").unwrap();
        let mut reader = Reader::new(&artifact);
        let header = reader.parse_header().unwrap();
        assert_eq!(header.bit_count, 4);
        assert_eq!(reader.payload(), &[0b0000_0000]);
    }

    #[test]
    fn empty_input_is_header_only() {
        let (artifact, report) = compress_with_report(b"").unwrap();
        assert!(report.is_empty());
        assert_eq!(report.payload_bits, 0);
        assert_eq!(report.ratio(), None);
        assert_eq!(artifact.len(), Header::default().encoded_len());
    }

    #[test]
    fn compression_is_deterministic() {
        let input = b"she sells sea shells by the sea shore";
        assert_eq!(compress(input).unwrap(), compress(input).unwrap());
    }

    #[test]
    fn skewed_input_uses_fewer_than_eight_bits_per_symbol() {
        let input: Vec<u8> = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaabbbbbbbbbbccccd".to_vec();
        let (_, report) = compress_with_report(&input).unwrap();
        assert!(report.payload_bits < 8 * input.len() as u64);
    }

    #[test]
    fn encode_rejects_foreign_symbol() {
        let tree = HuffmanTree::build(&FrequencyTable::count(b"abc")).unwrap();
        assert!(matches!(
            encode(b"abz", tree.codes()),
            Err(CodecError::AlphabetMismatch(b'z'))
        ));
    }

    #[test]
    fn decode_stops_at_symbol_count() {
        let input = b"abracadabra";
        let tree = HuffmanTree::build(&FrequencyTable::count(input)).unwrap();
        let writer = encode(input, tree.codes()).unwrap();
        let bit_count = writer.bit_count();
        let bytes = writer.into_bytes();

        let mut reader = BitReader::new(&bytes, bit_count).unwrap();
        assert_eq!(decode(&mut reader, &tree, 11).unwrap(), input);

        let mut reader = BitReader::new(&bytes, bit_count).unwrap();
        assert!(matches!(
            decode(&mut reader, &tree, 5),
            Err(CodecError::CorruptedStream(_))
        ));
    }

    #[test]
    fn decode_reports_truncation() {
        let input = b"abracadabra";
        let tree = HuffmanTree::build(&FrequencyTable::count(input)).unwrap();
        let writer = encode(input, tree.codes()).unwrap();
        let bytes = writer.into_bytes();

        let mut reader = BitReader::new(&bytes[..1], 8).unwrap();
        assert!(matches!(
            decode(&mut reader, &tree, 11),
            Err(CodecError::CorruptedStream(_))
        ));
    }

    #[test]
    fn rejects_tampered_bit_count() {
        let input = b"hello world";
        let mut artifact = compress(input).unwrap();
        let header_len = Header {
            freqs: FrequencyTable::count(input),
            bit_count: 0,
        }
        .encoded_len();
        // low byte of the bit count field
        artifact[header_len - 1] ^= 1;
        assert!(matches!(
            decompress(&artifact),
            Err(CodecError::CorruptedStream(_))
        ));
    }

    #[test]
    fn rejects_trailing_and_missing_payload() {
        let artifact = compress(b"hello world").unwrap();

        let mut longer = artifact.clone();
        longer.push(0);
        assert!(matches!(
            decompress(&longer),
            Err(CodecError::CorruptedStream(_))
        ));

        let shorter = &artifact[..artifact.len() - 1];
        assert!(matches!(
            decompress(shorter),
            Err(CodecError::CorruptedStream(_))
        ));
    }

    #[test]
    fn rejects_payload_on_empty_alphabet() {
        let mut artifact = compress(b"").unwrap();
        artifact.push(0xff);
        assert!(matches!(
            decompress(&artifact),
            Err(CodecError::CorruptedStream(_))
        ));
    }

    #[test]
    fn rejects_set_bit_in_single_symbol_payload() {
        let mut artifact = compress(b"aaa").unwrap();
        let last = artifact.len() - 1;
        artifact[last] = 0b0100_0000;
        assert!(matches!(
            decompress(&artifact),
            Err(CodecError::CorruptedStream(_))
        ));
    }
}
