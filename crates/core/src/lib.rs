//! slotchannel-core: Covert storage channel over typed-slot containers
//!
//! This library implements a covert channel that encodes integer symbols
//! into *which typed slot of a key/value container is occupied*. The
//! container is an otherwise conventional transport payload; presence and
//! type of a value at a key carry the signal, never the value's content.
//!
//! # Architecture
//!
//! The system is designed around clear module boundaries:
//! - `container`: Typed-slot key/value store (the transport payload)
//! - `alphabet`: Slot probe order, sentinels, and platform capability
//! - `codec`: Symbol encode/decode with expansion-code nesting
//! - `segment`: Per-channel message chunks with reassembly metadata
//! - `protocol`: Wire constants and the channel registry
//! - `bits`: Bit-level message fragmentation
//! - `assembly`: Message split, routing, and reassembly
//! - `transport`: Delivery boundary with a seeded impairment simulator
//! - `metrics`: Throughput and bit-error measurement
//!
//! # Design Principles
//!
//! - **No panics**: All errors are structured and recoverable
//! - **Pure data paths**: Encode/decode are single-threaded transformations
//!   with no shared state; only the transport boundary sees concurrency
//! - **Deterministic**: Seeded randomness makes simulated runs reproducible
//! - **Fail whole**: Reassembly never returns a partial message

pub mod alphabet;
pub mod assembly;
pub mod bits;
pub mod codec;
pub mod container;
pub mod error;
pub mod metrics;
pub mod protocol;
pub mod segment;
pub mod transport;

// Re-export commonly used types
pub use error::{Error, Result};
