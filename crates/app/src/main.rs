//! slotchannel-sim: end-to-end simulation of the typed-slot covert channel.
//!
//! Pipeline: message -> split into fragments -> encode into containers ->
//! simulated transport (loss, reordering) -> decode -> reassemble ->
//! verify -> metrics.

mod config;
mod message_gen;

use config::Config;
use slotchannel_core::alphabet::PlatformCapability;
use slotchannel_core::assembly::MessageAssembler;
use slotchannel_core::metrics::{count_bit_errors, ChannelMetrics};
use slotchannel_core::transport::SimulatedTransport;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("error: {message}");
            eprintln!("try --help for usage");
            std::process::exit(2);
        }
    };

    if config.print_config {
        config.print();
    }

    std::process::exit(run(&config));
}

fn run(config: &Config) -> i32 {
    let message = match load_message(config) {
        Ok(message) => message,
        Err(error) => {
            eprintln!("error: could not load message: {error}");
            return 2;
        }
    };

    let capability = PlatformCapability(config.capability);
    let assembler = match MessageAssembler::new(capability, config.fragment_width) {
        Ok(assembler) => assembler,
        Err(error) => {
            eprintln!("error: {error}");
            return 2;
        }
    };

    let mut metrics = ChannelMetrics::new();
    metrics.message_bytes = message.len() as u64;
    metrics.message_bits = message.len() as u64 * 8;

    let mut transport = SimulatedTransport::new(config.transport);

    // Send side
    let dispatched = match assembler.dispatch(&message, &mut transport) {
        Ok(count) => count,
        Err(error) => {
            eprintln!("error: dispatch failed: {error}");
            return 1;
        }
    };
    metrics.segments_dispatched = dispatched as u64;
    metrics.fragments_encoded = (message.len() as u64 * 8).div_ceil(config.fragment_width as u64);

    // Receive side
    let received = match assembler.collect(&mut transport) {
        Ok(received) => received,
        Err(error) => {
            eprintln!("error: decoding a received container failed: {error}");
            return 1;
        }
    };
    metrics.segments_received = received.len() as u64;
    metrics.fragments_decoded = received.iter().map(|s| s.fragments.len() as u64).sum();
    metrics.containers_dropped = transport.stats().dropped;

    let outcome = assembler.reassemble(&received);
    metrics.complete();

    match outcome {
        Ok(rebuilt) => {
            metrics.output_bytes = rebuilt.len() as u64;
            metrics.bit_errors = count_bit_errors(&message, &rebuilt);

            let sent_crc = checksum(&message);
            let rebuilt_crc = checksum(&rebuilt);

            if config.print_metrics {
                metrics.print_summary();
                println!("Checksum: sent {sent_crc:#010x}, rebuilt {rebuilt_crc:#010x}");
            }
            metrics.print_result();

            if metrics.bit_errors == 0 && sent_crc == rebuilt_crc {
                0
            } else {
                1
            }
        }
        Err(error) => {
            if config.print_metrics {
                metrics.print_summary();
            }
            println!("✗ Transfer failed: {error}");
            1
        }
    }
}

fn load_message(config: &Config) -> std::io::Result<Vec<u8>> {
    if let Some(text) = &config.text {
        return Ok(text.clone().into_bytes());
    }
    if let Some(path) = &config.input_file {
        return std::fs::read(path);
    }
    Ok(message_gen::generate_sample_message(
        config.transport.seed,
        config.sample_bytes,
    ))
}

fn checksum(bytes: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}
