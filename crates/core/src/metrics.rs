//! Measurement of channel runs: timing, throughput, and bit errors.
//!
//! The measurement harness around the channel wants two numbers above all:
//! effective throughput (message bits over elapsed time) and the bit-error
//! rate of the reconstructed message. This module collects those along with
//! per-stage counters for understanding where a run degraded.
//!
//! # Thread Safety
//!
//! `ChannelMetrics` is NOT thread-safe. Wrap in `Arc<Mutex<_>>` or keep one
//! instance per thread and merge at the end.

use std::time::{Duration, Instant};

/// Counters and timing for one message transfer across the channel.
#[derive(Debug, Clone)]
pub struct ChannelMetrics {
    // === Timing ===
    /// When the transfer started
    pub start_time: Instant,

    /// When the transfer ended (set on completion)
    pub end_time: Option<Instant>,

    // === Message ===
    /// Bytes in the original message
    pub message_bytes: u64,

    /// Bits in the original message
    pub message_bits: u64,

    /// Bytes in the reconstructed message
    pub output_bytes: u64,

    // === Encoding ===
    /// Fragments encoded into containers
    pub fragments_encoded: u64,

    /// Fragments decoded from received containers
    pub fragments_decoded: u64,

    // === Transport ===
    /// Segments handed to the transport
    pub segments_dispatched: u64,

    /// Segments received and decoded
    pub segments_received: u64,

    /// Containers dropped in transit
    pub containers_dropped: u64,

    // === Verification ===
    /// Differing bits between sent and reconstructed message
    pub bit_errors: u64,
}

impl ChannelMetrics {
    /// Create new metrics with the start time set to now.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            end_time: None,
            message_bytes: 0,
            message_bits: 0,
            output_bytes: 0,
            fragments_encoded: 0,
            fragments_decoded: 0,
            segments_dispatched: 0,
            segments_received: 0,
            containers_dropped: 0,
            bit_errors: 0,
        }
    }

    /// Mark the transfer as complete.
    pub fn complete(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Total duration (or current elapsed time if not complete).
    pub fn duration(&self) -> Duration {
        match self.end_time {
            Some(end) => end.duration_since(self.start_time),
            None => self.start_time.elapsed(),
        }
    }

    /// Effective throughput in message bits per second.
    pub fn throughput_bps(&self) -> f64 {
        let seconds = self.duration().as_secs_f64();
        if seconds == 0.0 {
            0.0
        } else {
            self.message_bits as f64 / seconds
        }
    }

    /// Bit-error rate of the reconstructed message (errors / message bits).
    pub fn bit_error_rate(&self) -> f64 {
        if self.message_bits == 0 {
            0.0
        } else {
            self.bit_errors as f64 / self.message_bits as f64
        }
    }

    /// Fraction of dispatched segments that arrived.
    pub fn delivery_rate(&self) -> f64 {
        if self.segments_dispatched == 0 {
            0.0
        } else {
            self.segments_received as f64 / self.segments_dispatched as f64
        }
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n=== Transfer Summary ===");
        println!("Duration: {} ms", self.duration().as_millis());
        println!();

        println!("Message:  {} bytes ({} bits)", self.message_bytes, self.message_bits);
        println!("Output:   {} bytes", self.output_bytes);
        println!();

        println!("=== Encoding ===");
        println!("Fragments encoded: {}", self.fragments_encoded);
        println!("Fragments decoded: {}", self.fragments_decoded);
        println!();

        println!("=== Transport ===");
        println!("Segments dispatched: {}", self.segments_dispatched);
        println!("Segments received: {} ({:.1}%)", self.segments_received, self.delivery_rate() * 100.0);
        println!("Containers dropped: {}", self.containers_dropped);
        println!();

        println!("=== Verification ===");
        println!("Bit errors: {} ({:.4}%)", self.bit_errors, self.bit_error_rate() * 100.0);
        println!();

        println!("=== Performance ===");
        println!("Throughput: {:.1} bits/s", self.throughput_bps());
        println!();
    }

    /// Print just the final result (pass/fail).
    pub fn print_result(&self) {
        if self.bit_errors == 0 && self.message_bytes == self.output_bytes {
            println!("✓ Transfer completed successfully");
            println!(
                "  {} bytes in {} ms ({:.1} bits/s)",
                self.message_bytes,
                self.duration().as_millis(),
                self.throughput_bps()
            );
        } else if self.output_bytes == 0 {
            println!("✗ Transfer failed: message could not be reconstructed");
        } else {
            println!(
                "✗ Transfer failed: {} bit errors ({:.4}% of message)",
                self.bit_errors,
                self.bit_error_rate() * 100.0
            );
        }
    }

    /// Export metrics as a simple text format (for parsing/testing).
    pub fn export_text(&self) -> String {
        format!(
            "duration_ms={}\n\
             message_bytes={}\n\
             message_bits={}\n\
             output_bytes={}\n\
             fragments_encoded={}\n\
             fragments_decoded={}\n\
             segments_dispatched={}\n\
             segments_received={}\n\
             containers_dropped={}\n\
             bit_errors={}\n\
             bit_error_rate={:.6}\n\
             throughput_bps={:.1}\n",
            self.duration().as_millis(),
            self.message_bytes,
            self.message_bits,
            self.output_bytes,
            self.fragments_encoded,
            self.fragments_decoded,
            self.segments_dispatched,
            self.segments_received,
            self.containers_dropped,
            self.bit_errors,
            self.bit_error_rate(),
            self.throughput_bps(),
        )
    }
}

impl Default for ChannelMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Count differing bits between a sent and a reconstructed message.
///
/// Bytes beyond the shorter message count as fully erroneous (8 bits each),
/// so a truncated reconstruction is penalized rather than ignored.
pub fn count_bit_errors(sent: &[u8], received: &[u8]) -> u64 {
    let common = sent.len().min(received.len());

    let mut errors: u64 = sent[..common]
        .iter()
        .zip(&received[..common])
        .map(|(a, b)| (a ^ b).count_ones() as u64)
        .sum();

    errors += 8 * (sent.len().abs_diff(received.len())) as u64;
    errors
}
