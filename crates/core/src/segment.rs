//! Segment: one channel's contribution to a message.
//!
//! A segment couples a transport channel name with the inclusive symbol
//! range that channel is authorized to carry, the fragments routed to it
//! (message-position key → symbol), and three optional metadata entries used
//! for reassembly: significant bits in the message's final fragment, this
//! segment's sequence number, and the total segment count.
//!
//! Segments are built incrementally on the send side and handed to the
//! transport once complete; on the receive side they are reconstructed
//! read-only (see [`crate::assembly::ReceivedSegment`]).

use crate::codec::Symbol;
use crate::error::{Result, SegmentError};
use std::collections::HashMap;

/// Metadata field index: significant bits in the final fragment.
pub const SIGNIFICANT_BITS_FIELD: usize = 0;

/// Metadata field index: segment sequence number.
pub const SEGMENT_NUMBER_FIELD: usize = 1;

/// Metadata field index: total segment count for the message.
pub const SEGMENT_COUNT_FIELD: usize = 2;

/// Number of metadata fields per segment.
pub const NUM_METADATA_FIELDS: usize = 3;

/// One optional (key, symbol) metadata pair. Starts unset; set once per send.
#[derive(Debug, Clone, Default)]
struct MetadataEntry {
    key: Option<String>,
    value: Option<Symbol>,
}

/// A per-channel message chunk with a symbol-range constraint and
/// reassembly metadata.
#[derive(Debug, Clone)]
pub struct Segment {
    channel: String,
    min_val: i32,
    max_val: i32,
    fragments: HashMap<String, Symbol>,
    metadata: [MetadataEntry; NUM_METADATA_FIELDS],
}

impl Segment {
    /// Create an empty segment for a channel with its authorized range.
    pub fn new(channel: impl Into<String>, min_val: i32, max_val: i32) -> Self {
        Self {
            channel: channel.into(),
            min_val,
            max_val,
            fragments: HashMap::new(),
            metadata: Default::default(),
        }
    }

    /// The transport channel this segment is dispatched on.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Smallest symbol this segment may carry (inclusive).
    pub fn min_val(&self) -> i32 {
        self.min_val
    }

    /// Largest symbol this segment may carry (inclusive).
    pub fn max_val(&self) -> i32 {
        self.max_val
    }

    /// Whether a fragment symbol lies within this segment's range.
    pub fn value_within_limits(&self, value: Symbol) -> bool {
        value >= self.min_val && value <= self.max_val
    }

    /// Add a fragment under a message-position key.
    ///
    /// Re-adding a key overwrites (last write wins); the assembler
    /// generates unique keys, so an overwrite is a caller logic error
    /// rather than something detected here.
    ///
    /// # Errors
    /// `ValueOutOfRange` if the symbol is outside `[min_val, max_val]`.
    pub fn add_fragment(&mut self, key: impl Into<String>, value: Symbol) -> Result<()> {
        if !self.value_within_limits(value) {
            return Err(SegmentError::ValueOutOfRange {
                value,
                min: self.min_val,
                max: self.max_val,
            }
            .into());
        }

        self.fragments.insert(key.into(), value);
        Ok(())
    }

    /// Iterate fragment (key, symbol) entries, in no particular order.
    pub fn fragments(&self) -> impl Iterator<Item = (&str, Symbol)> {
        self.fragments.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of fragment entries in this segment.
    ///
    /// Fragment entries always have both key and value set (the map cannot
    /// represent a partial entry), so this is just the map size.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Whether the segment carries no fragments.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Whether the metadata entry at `index` has its key set.
    pub fn has_metadata_key(&self, index: usize) -> Result<bool> {
        check_index(index)?;
        Ok(self.metadata[index].key.is_some())
    }

    /// Set the metadata key at `index`. Re-setting overwrites.
    pub fn set_metadata_key(&mut self, index: usize, key: impl Into<String>) -> Result<()> {
        check_index(index)?;
        self.metadata[index].key = Some(key.into());
        Ok(())
    }

    /// The metadata key at `index`, if set.
    pub fn metadata_key(&self, index: usize) -> Result<Option<&str>> {
        check_index(index)?;
        Ok(self.metadata[index].key.as_deref())
    }

    /// All metadata keys that have been set.
    pub fn metadata_keys(&self) -> Vec<&str> {
        self.metadata
            .iter()
            .filter_map(|entry| entry.key.as_deref())
            .collect()
    }

    /// Set the metadata value at `index`. Re-setting overwrites.
    pub fn set_metadata_value(&mut self, index: usize, value: Symbol) -> Result<()> {
        check_index(index)?;
        self.metadata[index].value = Some(value);
        Ok(())
    }

    /// The metadata value at `index`, if set.
    pub fn metadata_value(&self, index: usize) -> Result<Option<Symbol>> {
        check_index(index)?;
        Ok(self.metadata[index].value)
    }

    /// Merge fragments and fully-set metadata entries into one key → symbol
    /// view for the transport.
    ///
    /// Metadata entries missing a key or a value are omitted. Metadata keys
    /// must not collide with fragment keys; that is the caller's
    /// responsibility.
    pub fn fragment_message_key_map(&self) -> HashMap<String, Symbol> {
        let mut map = self.fragments.clone();

        for entry in &self.metadata {
            if let (Some(key), Some(value)) = (&entry.key, entry.value) {
                map.insert(key.clone(), value);
            }
        }

        map
    }
}

fn check_index(index: usize) -> Result<()> {
    if index >= NUM_METADATA_FIELDS {
        return Err(SegmentError::InvalidMetadataIndex {
            index,
            max: NUM_METADATA_FIELDS - 1,
        }
        .into());
    }
    Ok(())
}
