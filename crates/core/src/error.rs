//! Error types for the slot-channel system.
//!
//! All operations return structured errors rather than panicking.
//! Failures are local and synchronous: no operation retries internally, and
//! message reconstruction fails fast and whole rather than returning a
//! partial result.

use thiserror::Error;

/// Top-level error type for all operations in the system.
///
/// Each variant corresponds to a specific failure domain:
/// - Codec: symbol encode/decode against a container
/// - Segment: fragment range and metadata bookkeeping
/// - Assembly: channel routing, segment validation, reassembly
/// - Bits: reading/writing the message bit stream
#[derive(Debug, Error)]
pub enum Error {
    /// Symbol codec error (e.g. symbol out of alphabet, undecodable entry)
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Segment construction or metadata error
    #[error("segment error: {0}")]
    Segment(#[from] SegmentError),

    /// Message split/reassembly error
    #[error("assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    /// Bit-level I/O error
    #[error("bit error: {0}")]
    Bits(#[from] BitError),
}

/// Symbol codec and alphabet errors.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Symbols are non-negative by definition
    #[error("negative symbol {value} cannot be encoded")]
    NegativeSymbol { value: i32 },

    /// Symbol exceeds what the alphabet plus expansion codes can express
    #[error("symbol {symbol} exceeds alphabet limit {max} (expansion budget exhausted)")]
    AlphabetExhausted { symbol: i32, max: i32 },

    /// No slot at the key held a decodable value
    #[error("no symbol decodable at key \"{key}\"")]
    NoSymbolDecodable { key: String },

    /// Platform capability version outside the known range
    #[error("invalid platform capability version {version}")]
    InvalidCapability { version: u32 },
}

/// Segment errors.
#[derive(Debug, Error)]
pub enum SegmentError {
    /// Fragment symbol outside the segment's authorized range
    #[error("value {value} outside segment range [{min}, {max}]")]
    ValueOutOfRange { value: i32, min: i32, max: i32 },

    /// Metadata index must be < NUM_METADATA_FIELDS
    #[error("metadata index {index} out of bounds (max {max})")]
    InvalidMetadataIndex { index: usize, max: usize },
}

/// Message split and reassembly errors.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// No registered channel's range can carry the fragment symbol
    #[error("no channel can carry symbol {symbol}")]
    NoChannelForSymbol { symbol: i32 },

    /// Fewer (or more) segments arrived than the decoded count announced
    #[error("incomplete message: expected {expected} segments, received {received}")]
    IncompleteMessage { expected: usize, received: usize },

    /// Reassembly was invoked with no segments at all
    #[error("no segments received")]
    NoSegments,

    /// Segments disagree about the total segment count
    #[error("segment count mismatch: {first} vs {other}")]
    SegmentCountMismatch { first: i32, other: i32 },

    /// A received segment carries no sequence-number metadata
    #[error("segment on channel \"{channel}\" has no sequence number")]
    MissingSequenceNumber { channel: String },

    /// A received segment carries no segment-count metadata
    #[error("segment on channel \"{channel}\" has no segment count")]
    MissingSegmentCount { channel: String },

    /// Two received segments claim the same sequence number
    #[error("duplicate segment sequence number {sequence}")]
    DuplicateSequenceNumber { sequence: i32 },

    /// Two fragments claim the same message position
    #[error("duplicate fragment at position {position}")]
    DuplicateFragment { position: usize },

    /// A gap in the fragment ordinals (a fragment is unaccounted for)
    #[error("missing fragment at position {position}")]
    MissingFragment { position: usize },

    /// A container key is neither a metadata key nor a fragment key
    #[error("unrecognized container key \"{key}\"")]
    InvalidFragmentKey { key: String },
}

/// Bit-level I/O errors.
#[derive(Debug, Error)]
pub enum BitError {
    /// Attempted to read more bits than remain in the stream
    #[error("insufficient bits: requested {requested}, available {available}")]
    InsufficientBits { requested: usize, available: usize },

    /// Invalid bit count (0 or more than 32 bits per operation)
    #[error("invalid bit count: {0}")]
    InvalidBitCount(usize),
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;
