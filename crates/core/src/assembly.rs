//! Message assembly: splitting a message across channel segments and
//! reconstructing it on the far side.
//!
//! # Send path
//!
//! The message becomes an MSB-first bit stream, cut into fragments of
//! `fragment_width` bits. Each fragment's symbol value decides its channel:
//! the registry entry whose range holds the value. Fragment keys carry the
//! *global* fragment ordinal, because consecutive fragments routinely land
//! on different channels and per-segment positions could not reconstruct
//! the interleaving. Each segment then receives its metadata: sequence
//! number and total segment count on every segment, the final fragment's
//! significant-bit count on the segment that carries it.
//!
//! # Receive path
//!
//! Segments arrive in any order. Reassembly validates the announced segment
//! count against what actually arrived, orders segments by sequence number,
//! merges fragments by ordinal (rejecting duplicates and gaps), truncates
//! the final fragment to its significant bits, and rebuilds the bytes.
//! Reconstruction fails fast and whole; a partial message is never
//! returned.

use crate::alphabet::PlatformCapability;
use crate::bits;
use crate::codec::{self, Symbol};
use crate::container::Container;
use crate::error::{AssemblyError, Result};
use crate::protocol::{
    ChannelRegistry, FRAGMENT_KEY_PREFIX, SEGMENT_COUNT_KEY, SEGMENT_NUMBER_KEY,
    SIGNIFICANT_BITS_KEY,
};
use crate::segment::{
    Segment, SEGMENT_COUNT_FIELD, SEGMENT_NUMBER_FIELD, SIGNIFICANT_BITS_FIELD,
};
use crate::transport::Transport;
use std::collections::{BTreeMap, HashSet};

/// A segment reconstructed from a received container. Read-only; exists
/// only for the duration of reassembly.
#[derive(Debug, Clone)]
pub struct ReceivedSegment {
    /// Channel the container arrived on
    pub channel: String,

    /// Fragments decoded from the container, by global ordinal
    pub fragments: BTreeMap<usize, Symbol>,

    /// Significant bits in the message's final fragment, if this segment
    /// carries it
    pub significant_bits: Option<Symbol>,

    /// This segment's sequence number
    pub sequence_number: Option<Symbol>,

    /// Total segment count announced for the message
    pub segment_count: Option<Symbol>,
}

/// Splits messages into channel segments and reassembles them.
pub struct MessageAssembler {
    capability: PlatformCapability,
    fragment_width: usize,
    registry: ChannelRegistry,
}

impl MessageAssembler {
    /// Create an assembler whose registry partitions the platform's full
    /// symbol space across the protocol channels.
    pub fn new(capability: PlatformCapability, fragment_width: usize) -> Result<Self> {
        let space = codec::symbol_space(capability)?;
        Ok(Self {
            capability,
            fragment_width,
            registry: ChannelRegistry::partition(space),
        })
    }

    /// Create an assembler over a caller-provided channel registry.
    pub fn with_registry(
        capability: PlatformCapability,
        fragment_width: usize,
        registry: ChannelRegistry,
    ) -> Self {
        Self {
            capability,
            fragment_width,
            registry,
        }
    }

    /// The channel registry in use.
    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// Fragment width in bits.
    pub fn fragment_width(&self) -> usize {
        self.fragment_width
    }

    /// Platform capability both endpoints agreed on.
    pub fn capability(&self) -> PlatformCapability {
        self.capability
    }

    /// Split a message into per-channel segments with reassembly metadata.
    ///
    /// An empty message yields no segments.
    ///
    /// # Errors
    /// - `NoChannelForSymbol` if a fragment value fits no channel's range
    /// - Bit errors for an invalid fragment width
    pub fn split(&self, message: &[u8]) -> Result<Vec<Segment>> {
        let (fragments, significant_bits) = bits::split_fragments(message, self.fragment_width)?;

        // Route fragments; segments come into existence lazily, keyed by
        // registry position so sequence numbers follow channel order.
        let mut by_channel: BTreeMap<usize, Segment> = BTreeMap::new();

        for (ordinal, &symbol) in fragments.iter().enumerate() {
            let (index, spec) = self
                .registry
                .iter()
                .enumerate()
                .find(|(_, c)| c.holds(symbol))
                .ok_or(AssemblyError::NoChannelForSymbol { symbol })?;

            let segment = by_channel
                .entry(index)
                .or_insert_with(|| Segment::new(spec.name.clone(), spec.min_val, spec.max_val));

            segment.add_fragment(format!("{FRAGMENT_KEY_PREFIX}{ordinal}"), symbol)?;
        }

        let mut segments: Vec<Segment> = by_channel.into_values().collect();
        let count = segments.len();

        for (sequence, segment) in segments.iter_mut().enumerate() {
            segment.set_metadata_key(SEGMENT_NUMBER_FIELD, SEGMENT_NUMBER_KEY)?;
            segment.set_metadata_value(SEGMENT_NUMBER_FIELD, sequence as Symbol)?;
            segment.set_metadata_key(SEGMENT_COUNT_FIELD, SEGMENT_COUNT_KEY)?;
            segment.set_metadata_value(SEGMENT_COUNT_FIELD, count as Symbol)?;
        }

        // The segment carrying the final fragment records its width
        if !segments.is_empty() {
            let last_key = format!("{FRAGMENT_KEY_PREFIX}{}", fragments.len() - 1);
            let carrier = segments
                .iter_mut()
                .find(|s| s.fragments().any(|(key, _)| key == last_key))
                .expect("final fragment was routed to some segment");
            carrier.set_metadata_key(SIGNIFICANT_BITS_FIELD, SIGNIFICANT_BITS_KEY)?;
            carrier.set_metadata_value(SIGNIFICANT_BITS_FIELD, significant_bits as Symbol)?;
        }

        Ok(segments)
    }

    /// Encode a segment's merged key map into a fresh container.
    pub fn encode_segment(&self, segment: &Segment) -> Result<Container> {
        let mut container = Container::new();
        self.encode_segment_into(segment, &mut container)?;
        Ok(container)
    }

    fn encode_segment_into(&self, segment: &Segment, container: &mut Container) -> Result<()> {
        for (key, symbol) in segment.fragment_message_key_map() {
            codec::encode_symbol(container, &key, symbol, self.capability)?;
        }
        Ok(())
    }

    /// Reconstruct a read-only segment view from a received container.
    ///
    /// # Errors
    /// - `NoSymbolDecodable` if any entry is malformed
    /// - `InvalidFragmentKey` for a key that is neither metadata nor a
    ///   fragment ordinal
    /// - `DuplicateFragment` if two keys resolve to the same ordinal
    pub fn decode_segment(&self, channel: &str, container: &Container) -> Result<ReceivedSegment> {
        let mut segment = ReceivedSegment {
            channel: channel.to_string(),
            fragments: BTreeMap::new(),
            significant_bits: None,
            sequence_number: None,
            segment_count: None,
        };

        for key in container.keys() {
            let symbol = codec::decode_symbol(container, key, self.capability)?;

            match key {
                SIGNIFICANT_BITS_KEY => segment.significant_bits = Some(symbol),
                SEGMENT_NUMBER_KEY => segment.sequence_number = Some(symbol),
                SEGMENT_COUNT_KEY => segment.segment_count = Some(symbol),
                _ => {
                    let position = key
                        .strip_prefix(FRAGMENT_KEY_PREFIX)
                        .and_then(|suffix| suffix.parse::<usize>().ok())
                        .ok_or_else(|| AssemblyError::InvalidFragmentKey {
                            key: key.to_string(),
                        })?;

                    if segment.fragments.insert(position, symbol).is_some() {
                        return Err(AssemblyError::DuplicateFragment { position }.into());
                    }
                }
            }
        }

        Ok(segment)
    }

    /// Split, encode, and hand every segment of a message to the transport.
    ///
    /// Returns the number of segments dispatched.
    pub fn dispatch(&self, message: &[u8], transport: &mut dyn Transport) -> Result<usize> {
        let segments = self.split(message)?;

        for segment in &segments {
            let mut container = transport.create_container();
            self.encode_segment_into(segment, &mut container)?;
            transport.dispatch(segment.channel(), container);
        }

        Ok(segments.len())
    }

    /// Drain every registry channel of the transport and decode what
    /// arrived.
    pub fn collect(&self, transport: &mut dyn Transport) -> Result<Vec<ReceivedSegment>> {
        let mut received = Vec::new();

        for channel in self.registry.iter() {
            while let Some(container) = transport.receive(&channel.name) {
                received.push(self.decode_segment(&channel.name, &container)?);
            }
        }

        Ok(received)
    }

    /// Reassemble the original message from received segments.
    ///
    /// Tolerates arbitrary arrival order. Fails fast and whole: any
    /// inconsistency aborts reconstruction.
    ///
    /// # Errors
    /// - `NoSegments` if nothing arrived
    /// - `MissingSegmentCount` / `MissingSequenceNumber` for segments
    ///   without their metadata
    /// - `SegmentCountMismatch` if segments disagree about the count
    /// - `IncompleteMessage` if the count disagrees with what arrived
    /// - `DuplicateSequenceNumber`, `DuplicateFragment`, `MissingFragment`
    ///   for inconsistent segment sets
    pub fn reassemble(&self, segments: &[ReceivedSegment]) -> Result<Vec<u8>> {
        if segments.is_empty() {
            return Err(AssemblyError::NoSegments.into());
        }

        // Segment-count consensus, then completeness
        let mut expected: Option<Symbol> = None;
        for segment in segments {
            let count = segment
                .segment_count
                .ok_or_else(|| AssemblyError::MissingSegmentCount {
                    channel: segment.channel.clone(),
                })?;
            match expected {
                None => expected = Some(count),
                Some(first) if first != count => {
                    return Err(AssemblyError::SegmentCountMismatch {
                        first,
                        other: count,
                    }
                    .into());
                }
                Some(_) => {}
            }
        }
        let expected = expected.expect("at least one segment") as usize;

        if segments.len() != expected {
            return Err(AssemblyError::IncompleteMessage {
                expected,
                received: segments.len(),
            }
            .into());
        }

        // Order by sequence number, rejecting duplicates
        let mut ordered: Vec<&ReceivedSegment> = Vec::with_capacity(segments.len());
        let mut seen = HashSet::new();
        for segment in segments {
            let sequence = segment
                .sequence_number
                .ok_or_else(|| AssemblyError::MissingSequenceNumber {
                    channel: segment.channel.clone(),
                })?;
            if !seen.insert(sequence) {
                return Err(AssemblyError::DuplicateSequenceNumber { sequence }.into());
            }
            ordered.push(segment);
        }
        ordered.sort_by_key(|s| s.sequence_number);

        // Merge fragments by global ordinal
        let mut merged: BTreeMap<usize, Symbol> = BTreeMap::new();
        let mut significant_bits = None;
        for segment in ordered {
            for (&position, &symbol) in &segment.fragments {
                if merged.insert(position, symbol).is_some() {
                    return Err(AssemblyError::DuplicateFragment { position }.into());
                }
            }
            if segment.significant_bits.is_some() {
                significant_bits = segment.significant_bits;
            }
        }

        // Ordinals must be contiguous from zero
        for (index, (&position, _)) in merged.iter().enumerate() {
            if position != index {
                return Err(AssemblyError::MissingFragment { position: index }.into());
            }
        }

        let fragments: Vec<Symbol> = merged.into_values().collect();
        let significant_bits = significant_bits
            .map(|bits| bits as usize)
            .unwrap_or(self.fragment_width);

        bits::join_fragments(&fragments, self.fragment_width, significant_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::transport::LoopbackTransport;

    fn assembler() -> MessageAssembler {
        MessageAssembler::new(PlatformCapability::latest(), 8).unwrap()
    }

    #[test]
    fn test_split_routes_by_symbol_range() {
        let assembler = assembler();
        // Bytes 0 and 200 land in different channels of the 462-value space
        let segments = assembler.split(&[0, 200, 0]).unwrap();

        assert_eq!(segments.len(), 2);
        let zero_segment = segments.iter().find(|s| s.value_within_limits(0)).unwrap();
        let high_segment = segments.iter().find(|s| s.value_within_limits(200)).unwrap();

        // Global ordinals: fragments 0 and 2 carry byte 0, fragment 1 carries 200
        let zero_map = zero_segment.fragment_message_key_map();
        assert_eq!(zero_map.get("f0"), Some(&0));
        assert_eq!(zero_map.get("f2"), Some(&0));
        assert_eq!(high_segment.fragment_message_key_map().get("f1"), Some(&200));
    }

    #[test]
    fn test_split_sets_metadata_on_every_segment() {
        let assembler = assembler();
        let segments = assembler.split(&[0, 100, 200]).unwrap();
        assert_eq!(segments.len(), 3);

        let mut sequences = Vec::new();
        for segment in &segments {
            sequences.push(segment.metadata_value(SEGMENT_NUMBER_FIELD).unwrap().unwrap());
            assert_eq!(
                segment.metadata_value(SEGMENT_COUNT_FIELD).unwrap(),
                Some(3)
            );
        }
        sequences.sort_unstable();
        assert_eq!(sequences, vec![0, 1, 2]);

        // Exactly one segment carries the significant-bits entry
        let carriers = segments
            .iter()
            .filter(|s| s.metadata_value(SIGNIFICANT_BITS_FIELD).unwrap().is_some())
            .count();
        assert_eq!(carriers, 1);
    }

    #[test]
    fn test_split_empty_message() {
        let assembler = assembler();
        assert!(assembler.split(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_no_channel_for_symbol() {
        // Legacy capability: 7 slots -> symbol space 154 < 256, so byte
        // values above the space cannot be routed at width 8
        let assembler = MessageAssembler::new(PlatformCapability(3), 8).unwrap();
        let result = assembler.split(&[200]);
        assert!(matches!(
            result,
            Err(Error::Assembly(AssemblyError::NoChannelForSymbol { symbol: 200 }))
        ));
    }

    #[test]
    fn test_round_trip_through_loopback() {
        let message = b"covert greetings from the slot channel";
        for width in [4, 6, 8] {
            let assembler =
                MessageAssembler::new(PlatformCapability::latest(), width).unwrap();
            let mut transport = LoopbackTransport::new();

            assembler.dispatch(message, &mut transport).unwrap();
            let received = assembler.collect(&mut transport).unwrap();
            let rebuilt = assembler.reassemble(&received).unwrap();

            assert_eq!(rebuilt, message, "width {width}");
        }
    }

    #[test]
    fn test_round_trip_non_byte_aligned_tail() {
        // 5 bits never divides 8 * len evenly, exercising the
        // significant-bits truncation path
        let assembler = MessageAssembler::new(PlatformCapability::latest(), 5).unwrap();
        let mut transport = LoopbackTransport::new();
        let message = b"xyz";

        assembler.dispatch(message, &mut transport).unwrap();
        let received = assembler.collect(&mut transport).unwrap();
        assert_eq!(assembler.reassemble(&received).unwrap(), message);
    }

    #[test]
    fn test_reassemble_tolerates_any_segment_order() {
        let assembler = assembler();
        let mut transport = LoopbackTransport::new();
        let message = &[0u8, 100, 200, 50, 150, 250];

        assembler.dispatch(message, &mut transport).unwrap();
        let mut received = assembler.collect(&mut transport).unwrap();
        received.reverse();

        assert_eq!(assembler.reassemble(&received).unwrap(), message);
    }

    #[test]
    fn test_incomplete_message() {
        let assembler = assembler();
        let mut transport = LoopbackTransport::new();

        // Three distinct channels dispatched
        let dispatched = assembler.dispatch(&[0, 100, 200], &mut transport).unwrap();
        assert_eq!(dispatched, 3);

        let mut received = assembler.collect(&mut transport).unwrap();
        received.pop(); // lose one segment

        let result = assembler.reassemble(&received);
        assert!(matches!(
            result,
            Err(Error::Assembly(AssemblyError::IncompleteMessage { expected: 3, received: 2 }))
        ));
    }

    #[test]
    fn test_reassemble_no_segments() {
        let result = assembler().reassemble(&[]);
        assert!(matches!(
            result,
            Err(Error::Assembly(AssemblyError::NoSegments))
        ));
    }

    #[test]
    fn test_segment_count_mismatch() {
        let assembler = assembler();
        let mut transport = LoopbackTransport::new();
        assembler.dispatch(&[0, 200], &mut transport).unwrap();

        let mut received = assembler.collect(&mut transport).unwrap();
        received[0].segment_count = Some(5);

        let result = assembler.reassemble(&received);
        assert!(matches!(
            result,
            Err(Error::Assembly(AssemblyError::SegmentCountMismatch { .. }))
        ));
    }

    #[test]
    fn test_duplicate_fragment_across_segments() {
        let assembler = assembler();
        let mut transport = LoopbackTransport::new();
        assembler.dispatch(&[0, 200], &mut transport).unwrap();

        let mut received = assembler.collect(&mut transport).unwrap();
        // Claim an ordinal the other segment already owns
        let stolen = *received[0].fragments.keys().next().unwrap();
        received[1].fragments.insert(stolen, 0);

        let result = assembler.reassemble(&received);
        assert!(matches!(
            result,
            Err(Error::Assembly(AssemblyError::DuplicateFragment { .. }))
        ));
    }

    #[test]
    fn test_decode_segment_rejects_unknown_keys() {
        let assembler = assembler();
        let mut container = Container::new();
        codec::encode_symbol(&mut container, "bogus", 1, assembler.capability()).unwrap();

        let result = assembler.decode_segment("data_0", &container);
        assert!(matches!(
            result,
            Err(Error::Assembly(AssemblyError::InvalidFragmentKey { .. }))
        ));
    }

    #[test]
    fn test_decode_segment_reads_metadata() {
        let assembler = assembler();
        let segments = assembler.split(&[42]).unwrap();
        assert_eq!(segments.len(), 1);

        let container = assembler.encode_segment(&segments[0]).unwrap();
        let decoded = assembler
            .decode_segment(segments[0].channel(), &container)
            .unwrap();

        assert_eq!(decoded.sequence_number, Some(0));
        assert_eq!(decoded.segment_count, Some(1));
        assert_eq!(decoded.significant_bits, Some(8));
        assert_eq!(decoded.fragments.get(&0), Some(&42));
    }
}
