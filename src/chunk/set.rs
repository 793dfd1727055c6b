//! The ordered chunk set: chunks keyed by `sequence_number`, duplicates
//! rejected on insert.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::VbsError;

use super::types::Chunk;

/// Chunks of one recording, strictly ordered by `sequence_number` with no
/// duplicates. Sequence numbers need not be consecutive.
#[derive(Default)]
pub struct OrderedChunkSet {
    chunks: BTreeMap<u64, Chunk>,
}

impl OrderedChunkSet {
    pub fn new() -> Self {
        OrderedChunkSet { chunks: BTreeMap::new() }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Inserts `chunk`, failing with [`VbsError::DuplicateChunk`] if its
    /// `sequence_number` is already present. `source` names the file or
    /// directory the duplicate was detected within, for the error message.
    pub fn insert(&mut self, chunk: Chunk, source: &Path) -> Result<(), VbsError> {
        let seq = chunk.sequence_number;
        if self.chunks.contains_key(&seq) {
            return Err(VbsError::DuplicateChunk {
                sequence_number: seq,
                source: source.to_path_buf(),
            });
        }
        self.chunks.insert(seq, chunk);
        Ok(())
    }

    /// Iterates chunks in ascending `sequence_number` order.
    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    /// Consumes the set, yielding chunks in ascending `sequence_number`
    /// order — used by virtual-file construction to assign `logical_offset`.
    pub fn into_sorted_vec(self) -> Vec<Chunk> {
        self.chunks.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn chunk(seq: u64) -> Chunk {
        Chunk::new_scattered(seq, 4, PathBuf::from(format!("rec.{seq:08}")))
    }

    #[test]
    fn insert_orders_by_sequence_number() {
        let mut set = OrderedChunkSet::new();
        set.insert(chunk(5), Path::new("d")).unwrap();
        set.insert(chunk(0), Path::new("d")).unwrap();
        set.insert(chunk(2), Path::new("d")).unwrap();
        let seqs: Vec<u64> = set.iter().map(|c| c.sequence_number).collect();
        assert_eq!(seqs, vec![0, 2, 5]);
    }

    #[test]
    fn insert_rejects_duplicate_sequence_number() {
        let mut set = OrderedChunkSet::new();
        set.insert(chunk(0), Path::new("d")).unwrap();
        let err = set.insert(chunk(0), Path::new("d")).unwrap_err();
        assert!(matches!(err, VbsError::DuplicateChunk { sequence_number: 0, .. }));
    }
}
