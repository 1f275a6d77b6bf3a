//! Symbol codec: integer symbols in and out of typed-slot containers.
//!
//! A symbol is carried by *which* slot is occupied at a key. The platform's
//! alphabet size `n` (see [`crate::alphabet`]) covers symbols `0 .. n`
//! directly; larger symbols take the expansion path, where the key holds a
//! nested container instead of a base slot: one nesting level per unit of
//! expansion code, with the innermost level encoding `symbol % n` at a fixed
//! inner key.
//!
//! Decode checks for a nested container *before* probing base slots:
//! presence of the expansion slot is the unconditional "expansion path
//! taken" signal. Base slots are then probed in the fixed alphabet order.
//!
//! Both sides must agree on the platform capability; `n` is the modulus of
//! the expansion arithmetic and a mismatch garbles every symbol above the
//! smaller alphabet.

use crate::alphabet::{PlatformCapability, SlotType, PROBE_ORDER};
use crate::container::{Container, SlotValue};
use crate::error::{CodecError, Result};
use crate::protocol::{EXPANSION_KEY, NUM_EXPANSION_CODES};

/// The atomic unit encoded per (key, container). Non-negative.
pub type Symbol = i32;

/// Total number of symbols expressible on a platform:
/// `usable_slot_count * NUM_EXPANSION_CODES`.
pub fn symbol_space(capability: PlatformCapability) -> Result<i32> {
    Ok(capability.usable_slot_count()? * NUM_EXPANSION_CODES)
}

/// Largest encodable symbol on a platform.
pub fn max_symbol(capability: PlatformCapability) -> Result<i32> {
    Ok(symbol_space(capability)? - 1)
}

/// Encode one symbol into the container at `key`.
///
/// Only `key` is touched; mutual exclusivity of slots at a key is the
/// container's own invariant.
///
/// # Errors
/// - `NegativeSymbol` if `symbol < 0`
/// - `InvalidCapability` if the capability is unknown
/// - `AlphabetExhausted` if the symbol exceeds the expansion budget
pub fn encode_symbol(
    container: &mut Container,
    key: &str,
    symbol: Symbol,
    capability: PlatformCapability,
) -> Result<()> {
    if symbol < 0 {
        return Err(CodecError::NegativeSymbol { value: symbol }.into());
    }

    let n = capability.usable_slot_count()?;
    let expansion = symbol / n;
    let slot_index = (symbol % n) as usize;

    if expansion >= NUM_EXPANSION_CODES {
        return Err(CodecError::AlphabetExhausted {
            symbol,
            max: n * NUM_EXPANSION_CODES - 1,
        }
        .into());
    }

    // Innermost sentinel first, then one wrapping container per unit of
    // expansion code. Bounded by NUM_EXPANSION_CODES, never recursive.
    let mut value = SlotType::at(slot_index).sentinel();
    for _ in 0..expansion {
        let mut inner = Container::new();
        inner.set(EXPANSION_KEY, value);
        value = SlotValue::Nested(inner);
    }

    container.set(key, value);
    Ok(())
}

/// Decode the symbol stored in the container at `key`.
///
/// # Errors
/// - `InvalidCapability` if the capability is unknown
/// - `NoSymbolDecodable` if no slot at the key holds a decodable value, or
///   the nesting exceeds the expansion budget (malformed entry)
pub fn decode_symbol(
    container: &Container,
    key: &str,
    capability: PlatformCapability,
) -> Result<Symbol> {
    let n = capability.usable_slot_count()?;

    // Expansion check comes first: a nested container is the unconditional
    // signal, regardless of what base probes would report.
    let mut depth: i32 = 0;
    let mut current = container;
    let mut probe_key = key;
    while let Some(inner) = current.nested(probe_key) {
        depth += 1;
        if depth >= NUM_EXPANSION_CODES {
            return Err(CodecError::NoSymbolDecodable {
                key: key.to_string(),
            }
            .into());
        }
        current = inner;
        probe_key = EXPANSION_KEY;
    }

    for (index, slot) in PROBE_ORDER.iter().enumerate() {
        if current.probe(probe_key, *slot).is_some() {
            return Ok(index as i32 + n * depth);
        }
    }

    Err(CodecError::NoSymbolDecodable {
        key: key.to_string(),
    }
    .into())
}
