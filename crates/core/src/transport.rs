//! Transport boundary: container delivery between endpoints.
//!
//! The core treats the transport as an opaque collaborator that moves
//! containers over named channels. [`Transport`] is the narrow interface the
//! codec and assembler need; two implementations ship with the crate:
//!
//! - [`LoopbackTransport`]: lossless per-channel FIFO queues, for tests and
//!   baseline runs.
//! - [`SimulatedTransport`]: deterministic impairments (loss, bounded
//!   reordering) driven by a seeded ChaCha8 RNG. Given the same seed and
//!   inputs, behavior is bit-identical.
//!
//! Delivery is best-effort, at most once per container. Ordering across
//! channels is never guaranteed; reassembly tolerates that by design.
//!
//! # Thread Safety
//! Not thread-safe; use one instance per thread or synchronize externally.

use crate::container::Container;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{HashMap, VecDeque};

/// The transport interface the core depends on.
pub trait Transport {
    /// Create an empty container suitable for this transport.
    fn create_container(&self) -> Container {
        Container::new()
    }

    /// Hand a container to the transport for delivery on a channel.
    fn dispatch(&mut self, channel: &str, container: Container);

    /// Take the next delivered container on a channel, if any.
    fn receive(&mut self, channel: &str) -> Option<Container>;
}

/// Lossless, in-order, in-memory transport.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    queues: HashMap<String, VecDeque<Container>>,
}

impl LoopbackTransport {
    /// Create an empty loopback transport.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for LoopbackTransport {
    fn dispatch(&mut self, channel: &str, container: Container) {
        self.queues
            .entry(channel.to_string())
            .or_default()
            .push_back(container);
    }

    fn receive(&mut self, channel: &str) -> Option<Container> {
        self.queues.get_mut(channel)?.pop_front()
    }
}

/// Configuration for transport simulation.
#[derive(Debug, Clone, Copy)]
pub struct TransportConfig {
    /// Container drop probability [0.0, 1.0]
    pub loss_rate: f64,

    /// Reordering window: a dispatched container may overtake up to this
    /// many containers already queued on its channel
    pub reorder_window: usize,

    /// Random seed for determinism
    pub seed: u64,
}

impl TransportConfig {
    /// A configuration with no impairments (perfect delivery).
    pub fn perfect(seed: u64) -> Self {
        Self {
            loss_rate: 0.0,
            reorder_window: 0,
            seed,
        }
    }

    /// A default configuration with moderate impairments.
    pub fn default_with_seed(seed: u64) -> Self {
        Self {
            loss_rate: 0.01, // 1% loss
            reorder_window: 4,
            seed,
        }
    }
}

/// Transport simulator with seeded loss and reordering.
pub struct SimulatedTransport {
    config: TransportConfig,
    rng: ChaCha8Rng,
    queues: HashMap<String, VecDeque<Container>>,

    // Statistics
    dispatched: u64,
    dropped: u64,
    delivered: u64,
}

impl SimulatedTransport {
    /// Create a simulator with the given configuration.
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            queues: HashMap::new(),
            dispatched: 0,
            dropped: 0,
            delivered: 0,
        }
    }

    /// Containers queued and not yet received, across all channels.
    pub fn pending_count(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    /// Whether any containers are still queued.
    pub fn has_pending(&self) -> bool {
        self.pending_count() > 0
    }

    /// Statistics about transport behavior so far.
    pub fn stats(&self) -> TransportStats {
        TransportStats {
            dispatched: self.dispatched,
            dropped: self.dropped,
            delivered: self.delivered,
            pending: self.pending_count(),
        }
    }
}

impl Transport for SimulatedTransport {
    fn dispatch(&mut self, channel: &str, container: Container) {
        self.dispatched += 1;

        if self.config.loss_rate > 0.0 {
            let roll: f64 = self.rng.gen();
            if roll < self.config.loss_rate {
                self.dropped += 1;
                return;
            }
        }

        let queue = self.queues.entry(channel.to_string()).or_default();

        // A new container may overtake up to reorder_window queued ones
        let window = self.config.reorder_window.min(queue.len());
        let position = if window == 0 {
            queue.len()
        } else {
            queue.len() - self.rng.gen_range(0..=window)
        };
        queue.insert(position, container);
    }

    fn receive(&mut self, channel: &str) -> Option<Container> {
        let container = self.queues.get_mut(channel)?.pop_front()?;
        self.delivered += 1;
        Some(container)
    }
}

/// Statistics about simulated transport behavior.
#[derive(Debug, Clone, Copy)]
pub struct TransportStats {
    /// Containers handed to the transport
    pub dispatched: u64,

    /// Containers dropped by the loss model
    pub dropped: u64,

    /// Containers received by the far side
    pub delivered: u64,

    /// Containers still queued
    pub pending: usize,
}

impl TransportStats {
    /// Fraction of dispatched containers that were dropped.
    pub fn loss_rate(&self) -> f64 {
        if self.dispatched == 0 {
            0.0
        } else {
            self.dropped as f64 / self.dispatched as f64
        }
    }

    /// Fraction of dispatched containers delivered so far.
    pub fn delivery_rate(&self) -> f64 {
        if self.dispatched == 0 {
            0.0
        } else {
            self.delivered as f64 / self.dispatched as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::SlotValue;

    fn tagged_container(tag: i32) -> Container {
        let mut c = Container::new();
        c.set("tag", SlotValue::I32(tag));
        c
    }

    fn tag_of(container: &Container) -> i32 {
        match container.get("tag") {
            Some(SlotValue::I32(v)) => *v,
            other => panic!("unexpected tag slot: {other:?}"),
        }
    }

    #[test]
    fn test_loopback_fifo_per_channel() {
        let mut transport = LoopbackTransport::new();
        transport.dispatch("a", tagged_container(1));
        transport.dispatch("b", tagged_container(2));
        transport.dispatch("a", tagged_container(3));

        assert_eq!(tag_of(&transport.receive("a").unwrap()), 1);
        assert_eq!(tag_of(&transport.receive("a").unwrap()), 3);
        assert_eq!(tag_of(&transport.receive("b").unwrap()), 2);
        assert!(transport.receive("a").is_none());
        assert!(transport.receive("unknown").is_none());
    }

    #[test]
    fn test_perfect_simulation_delivers_in_order() {
        let mut transport = SimulatedTransport::new(TransportConfig::perfect(42));

        for tag in 0..10 {
            transport.dispatch("ch", tagged_container(tag));
        }

        for tag in 0..10 {
            assert_eq!(tag_of(&transport.receive("ch").unwrap()), tag);
        }

        let stats = transport.stats();
        assert_eq!(stats.dispatched, 10);
        assert_eq!(stats.dropped, 0);
        assert_eq!(stats.delivered, 10);
        assert_eq!(stats.pending, 0);
    }

    #[test]
    fn test_loss_drops_containers() {
        let config = TransportConfig {
            loss_rate: 0.5,
            reorder_window: 0,
            seed: 42,
        };
        let mut transport = SimulatedTransport::new(config);

        for tag in 0..100 {
            transport.dispatch("ch", tagged_container(tag));
        }

        let stats = transport.stats();
        assert_eq!(stats.dispatched, 100);
        // Bernoulli(0.5): allow a generous band
        assert!(stats.dropped >= 30 && stats.dropped <= 70, "dropped {}", stats.dropped);
        assert_eq!(stats.pending as u64, 100 - stats.dropped);
    }

    #[test]
    fn test_reordering_preserves_the_set() {
        let config = TransportConfig {
            loss_rate: 0.0,
            reorder_window: 8,
            seed: 7,
        };
        let mut transport = SimulatedTransport::new(config);

        for tag in 0..50 {
            transport.dispatch("ch", tagged_container(tag));
        }

        let mut received = Vec::new();
        while let Some(container) = transport.receive("ch") {
            received.push(tag_of(&container));
        }

        // Every container arrives exactly once, whatever the order
        assert_eq!(received.len(), 50);
        let mut sorted = received.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_determinism() {
        let config = TransportConfig::default_with_seed(12345);
        let mut first = SimulatedTransport::new(config);
        let mut second = SimulatedTransport::new(config);

        for tag in 0..40 {
            first.dispatch("ch", tagged_container(tag));
            second.dispatch("ch", tagged_container(tag));
        }

        assert_eq!(first.stats().dropped, second.stats().dropped);

        loop {
            let a = first.receive("ch");
            let b = second.receive("ch");
            match (a, b) {
                (None, None) => break,
                (Some(a), Some(b)) => assert_eq!(tag_of(&a), tag_of(&b)),
                other => panic!("simulations diverged: {other:?}"),
            }
        }
    }

    #[test]
    fn test_loss_rate_helpers() {
        let stats = TransportStats {
            dispatched: 100,
            dropped: 5,
            delivered: 95,
            pending: 0,
        };
        assert_eq!(stats.loss_rate(), 0.05);
        assert_eq!(stats.delivery_rate(), 0.95);

        let empty = TransportStats {
            dispatched: 0,
            dropped: 0,
            delivered: 0,
            pending: 0,
        };
        assert_eq!(empty.loss_rate(), 0.0);
        assert_eq!(empty.delivery_rate(), 0.0);
    }
}
