use std::collections::BTreeMap;

use crate::error::{Result, ensure_stream};

/// Occurrence count of every byte seen in an input.
///
/// Every present symbol has a count of at least one. Iteration is in
/// ascending symbol order, which is the order leaves enter the merge queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<u8, u64>,
}

impl FrequencyTable {
    /// Counts `input` in a single pass.
    pub fn count(input: &[u8]) -> Self {
        let mut counts: BTreeMap<u8, u64> = BTreeMap::new();
        for &symbol in input {
            *counts.entry(symbol).or_default() += 1;
        }

        Self { counts }
    }

    /// Rebuilds a table from persisted pairs, rejecting zero counts and
    /// symbols that are repeated or out of ascending order.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u8, u64)>) -> Result<Self> {
        let mut counts = BTreeMap::new();
        let mut last: Option<u8> = None;

        for (symbol, freq) in pairs {
            ensure_stream!(freq >= 1, "symbol {symbol:#04x} has zero frequency");
            if let Some(prev) = last {
                ensure_stream!(
                    symbol > prev,
                    "symbol {symbol:#04x} follows {prev:#04x} out of order"
                );
            }
            last = Some(symbol);
            counts.insert(symbol, freq);
        }

        Ok(Self { counts })
    }

    pub fn get(&self, symbol: u8) -> u64 {
        self.counts.get(&symbol).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts, i.e. the length of the counted input.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts.iter().map(|(&symbol, &freq)| (symbol, freq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;

    #[test]
    fn counts_each_symbol() {
        let table = FrequencyTable::count(b"abracadabra");
        assert_eq!(table.get(b'a'), 5);
        assert_eq!(table.get(b'b'), 2);
        assert_eq!(table.get(b'r'), 2);
        assert_eq!(table.get(b'c'), 1);
        assert_eq!(table.get(b'd'), 1);
        assert_eq!(table.get(b'z'), 0);
        assert_eq!(table.len(), 5);
        assert_eq!(table.total(), 11);
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let table = FrequencyTable::count(b"");
        assert!(table.is_empty());
        assert_eq!(table.total(), 0);
    }

    #[test]
    fn iterates_in_symbol_order() {
        let table = FrequencyTable::count(b"zyxzy");
        let symbols: Vec<u8> = table.iter().map(|(s, _)| s).collect();
        assert_eq!(symbols, b"xyz");
    }

    #[test]
    fn from_pairs_matches_count() {
        let counted = FrequencyTable::count(b"hello");
        let rebuilt = FrequencyTable::from_pairs(counted.iter()).unwrap();
        assert_eq!(counted, rebuilt);
    }

    #[test]
    fn from_pairs_rejects_zero_and_disorder() {
        assert!(matches!(
            FrequencyTable::from_pairs([(b'a', 0)]),
            Err(CodecError::CorruptedStream(_))
        ));
        assert!(matches!(
            FrequencyTable::from_pairs([(b'b', 1), (b'a', 1)]),
            Err(CodecError::CorruptedStream(_))
        ));
        assert!(matches!(
            FrequencyTable::from_pairs([(b'a', 1), (b'a', 2)]),
            Err(CodecError::CorruptedStream(_))
        ));
    }
}
