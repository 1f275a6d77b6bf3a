//! Configuration for the slot-channel simulator.
//!
//! Handles parsing command-line arguments and generating sensible defaults
//! (including randomized defaults that are reproducible with a seed).
//!
//! # Philosophy
//!
//! The tool should work with ZERO arguments, using intelligent defaults.
//! All defaults are printed so runs are reproducible.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use slotchannel_core::alphabet::MAX_KNOWN_VERSION;
use slotchannel_core::transport::TransportConfig;
use std::path::PathBuf;

/// Complete configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct Config {
    // === Message ===
    /// Literal message text (overrides --in and generation)
    pub text: Option<String>,

    /// Input file to transfer (None = generate sample)
    pub input_file: Option<PathBuf>,

    /// Size of the generated sample message in bytes
    pub sample_bytes: usize,

    // === Channel ===
    /// Fragment width in bits
    pub fragment_width: usize,

    /// Platform capability version for both endpoints
    pub capability: u32,

    // === Transport ===
    /// Transport simulation config
    pub transport: TransportConfig,

    // === Behavior ===
    /// Whether to print detailed config
    pub print_config: bool,

    /// Whether to print the detailed metrics summary
    pub print_metrics: bool,
}

impl Config {
    /// Parse configuration from command-line arguments.
    ///
    /// If no arguments are provided, generates randomized defaults using a
    /// time-based seed. If --seed is provided, uses that seed for all
    /// randomness (fully deterministic).
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        let mut text: Option<String> = None;
        let mut input_file: Option<PathBuf> = None;
        let mut seed: Option<u64> = None;
        let mut sample_bytes: Option<usize> = None;
        let mut fragment_width: Option<usize> = None;
        let mut capability: Option<u32> = None;
        let mut loss_rate: Option<f64> = None;
        let mut reorder_window: Option<usize> = None;
        let mut print_config = false;
        let mut print_metrics = true;

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--text" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--text requires a string".to_string());
                    }
                    text = Some(args[i].clone());
                }
                "--in" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--in requires a path".to_string());
                    }
                    input_file = Some(PathBuf::from(&args[i]));
                }
                "--seed" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--seed requires a number".to_string());
                    }
                    seed = Some(args[i].parse().map_err(|_| "invalid seed")?);
                }
                "--sample-bytes" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--sample-bytes requires a number".to_string());
                    }
                    sample_bytes = Some(args[i].parse().map_err(|_| "invalid sample-bytes")?);
                }
                "--fragment-width" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--fragment-width requires a number".to_string());
                    }
                    fragment_width = Some(args[i].parse().map_err(|_| "invalid fragment-width")?);
                }
                "--capability" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--capability requires a number".to_string());
                    }
                    capability = Some(args[i].parse().map_err(|_| "invalid capability")?);
                }
                "--loss" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--loss requires a number".to_string());
                    }
                    loss_rate = Some(args[i].parse().map_err(|_| "invalid loss rate")?);
                }
                "--no-loss" => {
                    loss_rate = Some(0.0);
                }
                "--reorder-window" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--reorder-window requires a number".to_string());
                    }
                    reorder_window = Some(args[i].parse().map_err(|_| "invalid reorder-window")?);
                }
                "--print-config" => {
                    print_config = true;
                }
                "--no-metrics" => {
                    print_metrics = false;
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                _ => {
                    return Err(format!("unknown argument: {}", args[i]));
                }
            }
            i += 1;
        }

        // Determine seed (explicit or time-based)
        let seed = seed.unwrap_or_else(|| {
            use std::time::{SystemTime, UNIX_EPOCH};
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_millis() as u64
        });

        // Generate defaults using the seed
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let config = Config {
            text,
            input_file,
            sample_bytes: sample_bytes.unwrap_or(256),
            fragment_width: fragment_width.unwrap_or(8),
            capability: capability.unwrap_or(MAX_KNOWN_VERSION),
            transport: TransportConfig {
                loss_rate: loss_rate.unwrap_or_else(|| {
                    // Bias toward small loss rates
                    let r: f64 = rng.gen();
                    (r * r * 0.05).min(0.05) // 0-5%, biased toward 0
                }),
                reorder_window: reorder_window.unwrap_or_else(|| rng.gen_range(0..=8)),
                seed,
            },
            print_config,
            print_metrics,
        };

        Ok(config)
    }

    /// Print the configuration in human-readable form.
    pub fn print(&self) {
        println!("=== Configuration ===");
        match (&self.text, &self.input_file) {
            (Some(text), _) => println!("Message: {:?} ({} bytes)", text, text.len()),
            (None, Some(path)) => println!("Message: file {:?}", path),
            (None, None) => println!("Message: generated sample ({} bytes)", self.sample_bytes),
        }
        println!();
        println!("Fragment width: {} bits", self.fragment_width);
        println!("Capability: version {}", self.capability);
        println!();
        println!("=== Transport Simulation ===");
        println!("Seed: {}", self.transport.seed);
        println!("Loss rate: {:.2}%", self.transport.loss_rate * 100.0);
        println!("Reorder window: {} containers", self.transport.reorder_window);
        println!();
    }
}

fn print_help() {
    println!("slotchannel-sim: covert channel over typed-slot containers");
    println!();
    println!("USAGE:");
    println!("    slotchannel-sim [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --text <STRING>         Message to send (default: generate sample)");
    println!("    --in <PATH>             Message file to send");
    println!("    --sample-bytes <N>      Generated sample size (default: 256)");
    println!("    --seed <N>              Random seed for determinism");
    println!();
    println!("    --fragment-width <N>    Fragment width in bits (default: 8)");
    println!("    --capability <N>        Platform capability version (default: {MAX_KNOWN_VERSION})");
    println!();
    println!("    --loss <RATE>           Container loss rate 0.0-1.0 (default: random 0-0.05)");
    println!("    --no-loss               Disable loss (same as --loss 0)");
    println!("    --reorder-window <N>    Reorder window (default: random 0-8)");
    println!();
    println!("    --print-config          Print resolved configuration");
    println!("    --no-metrics            Don't print metrics summary");
    println!("    --help, -h              Print this help");
    println!();
    println!("EXAMPLES:");
    println!("    slotchannel-sim                               # Run with random defaults");
    println!("    slotchannel-sim --seed 42 --no-loss           # Deterministic lossless run");
    println!("    slotchannel-sim --text hello --print-config   # Send a literal message");
    println!("    slotchannel-sim --capability 3 --fragment-width 7");
    println!();
}
