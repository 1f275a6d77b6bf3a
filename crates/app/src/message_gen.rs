//! Sample message generation for simulation runs.
//!
//! When no message is specified, we generate one with mixed content: runs of
//! repeated bytes, text-like data over a limited alphabet, and random bytes.
//! The mix makes routing visible in the metrics (different byte values land
//! on different channels) and gives bit-error counting something nontrivial
//! to chew on.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generate a deterministic sample message.
///
/// # Arguments
/// - `seed`: random seed for determinism
/// - `size_bytes`: exact size of the generated message
pub fn generate_sample_message(seed: u64, size_bytes: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(size_bytes);

    while data.len() < size_bytes {
        let chunk_size = (size_bytes - data.len()).min(32);
        let chunk_type: u8 = rng.gen_range(0..10);

        match chunk_type {
            // 30% runs of a repeated byte
            0..=2 => {
                let value: u8 = rng.gen();
                data.extend(std::iter::repeat(value).take(chunk_size));
            }

            // 50% text-like data over a limited alphabet
            3..=7 => {
                let alphabet = b"abcdefghijklmnopqrstuvwxyz .!,\n";
                for _ in 0..chunk_size {
                    let index = rng.gen_range(0..alphabet.len());
                    data.push(alphabet[index]);
                }
            }

            // 20% random bytes
            _ => {
                for _ in 0..chunk_size {
                    data.push(rng.gen());
                }
            }
        }
    }

    data.truncate(size_bytes);
    data
}
