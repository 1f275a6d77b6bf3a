//! Protocol constants and the channel registry.
//!
//! Everything two endpoints must agree on, beyond the probe order in
//! [`crate::alphabet`], lives here: the expansion budget, the reserved key
//! names, and the named transport channels with their symbol sub-ranges.
//! These are fixed protocol definitions, not configuration.

/// Number of expansion codes the protocol defines.
///
/// Together with the platform's alphabet size `n` this bounds the symbol
/// range: `0 ..= n * NUM_EXPANSION_CODES - 1`. Fixed by the protocol even
/// though `n` varies per platform.
pub const NUM_EXPANSION_CODES: i32 = 22;

/// Inner key used at every nesting level of an expansion-encoded symbol.
pub const EXPANSION_KEY: &str = "ex";

/// Prefix for fragment keys; the suffix is the global fragment ordinal.
pub const FRAGMENT_KEY_PREFIX: &str = "f";

/// Metadata key: significant bits in the message's final fragment.
pub const SIGNIFICANT_BITS_KEY: &str = "sig_bits";

/// Metadata key: this segment's sequence number.
pub const SEGMENT_NUMBER_KEY: &str = "segment_number";

/// Metadata key: total number of segments in the message.
pub const SEGMENT_COUNT_KEY: &str = "segment_count";

/// Metadata key names, indexed by metadata field index.
pub const METADATA_KEYS: [&str; 3] = [
    SIGNIFICANT_BITS_KEY,
    SEGMENT_NUMBER_KEY,
    SEGMENT_COUNT_KEY,
];

/// Number of named transport channels.
pub const NUM_CHANNELS: usize = 100;

/// The name of the `index`-th transport channel.
pub fn channel_name(index: usize) -> String {
    format!("data_{index}")
}

/// A named transport channel and the symbol sub-range it may carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    /// Transport channel name (e.g. `data_17`)
    pub name: String,

    /// Smallest symbol this channel is authorized to carry (inclusive)
    pub min_val: i32,

    /// Largest symbol this channel is authorized to carry (inclusive)
    pub max_val: i32,
}

impl ChannelSpec {
    /// Whether a symbol falls within this channel's authorized range.
    pub fn holds(&self, symbol: i32) -> bool {
        symbol >= self.min_val && symbol <= self.max_val
    }
}

/// The ordered list of channels partitioning the symbol space.
///
/// Ranges are contiguous, non-overlapping, and cover `0 ..= space - 1`
/// exactly. At most [`NUM_CHANNELS`] channels are created; a symbol space
/// smaller than the channel count yields fewer, single-value channels.
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    channels: Vec<ChannelSpec>,
}

impl ChannelRegistry {
    /// Partition a symbol space of `space` values across the channels.
    ///
    /// Earlier channels absorb the remainder, so ranges differ in width by
    /// at most one.
    pub fn partition(space: i32) -> Self {
        let space = space.max(0) as usize;
        let count = NUM_CHANNELS.min(space);

        let mut channels = Vec::with_capacity(count);
        if count == 0 {
            return Self { channels };
        }

        let base = space / count;
        let remainder = space % count;

        let mut next_min = 0i32;
        for index in 0..count {
            let width = base + usize::from(index < remainder);
            let min_val = next_min;
            let max_val = min_val + width as i32 - 1;
            next_min = max_val + 1;

            channels.push(ChannelSpec {
                name: channel_name(index),
                min_val,
                max_val,
            });
        }

        Self { channels }
    }

    /// The channel authorized to carry a symbol, if any.
    pub fn channel_for(&self, symbol: i32) -> Option<&ChannelSpec> {
        self.channels.iter().find(|c| c.holds(symbol))
    }

    /// Look up a channel by name.
    pub fn by_name(&self, name: &str) -> Option<&ChannelSpec> {
        self.channels.iter().find(|c| c.name == name)
    }

    /// Iterate channels in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &ChannelSpec> {
        self.channels.iter()
    }

    /// Number of channels in the registry.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether the registry holds no channels.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
