// src/distributor.rs
//! Fan-out of completed fixes to every registered consumer.
//!
//! Each consumer owns its own bounded queue, so a publish hands exactly one
//! copy to every consumer that is still listening. A consumer whose queue is
//! full misses that fix instead of stalling acquisition.

use crate::gps::Fix;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Pause between two deliveries of the same fix
pub const DEFAULT_PACING: Duration = Duration::from_millis(100);

/// Fixes a consumer may have queued before new ones are dropped for it
pub const DEFAULT_QUEUE_DEPTH: usize = 4;

/// Receiving end handed to a consumer at registration
#[derive(Debug)]
pub struct FixReceiver {
    id: usize,
    name: String,
    rx: mpsc::Receiver<Fix>,
}

impl FixReceiver {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the next fix; `None` once the distributor is gone
    pub async fn recv(&mut self) -> Option<Fix> {
        self.rx.recv().await
    }
}

#[derive(Debug)]
struct Consumer {
    id: usize,
    name: String,
    tx: mpsc::Sender<Fix>,
}

#[derive(Debug)]
pub struct Distributor {
    consumers: Vec<Consumer>,
    next_id: usize,
    pacing: Duration,
    queue_depth: usize,
}

impl Distributor {
    pub fn new(pacing: Duration, queue_depth: usize) -> Self {
        Self {
            consumers: Vec::new(),
            next_id: 0,
            pacing,
            queue_depth: queue_depth.max(1),
        }
    }

    /// Register a consumer. Must happen before the first publish.
    pub fn register(&mut self, name: &str) -> FixReceiver {
        let (tx, rx) = mpsc::channel(self.queue_depth);
        let id = self.next_id;
        self.next_id += 1;

        self.consumers.push(Consumer {
            id,
            name: name.to_string(),
            tx,
        });
        log::debug!("Registered consumer #{} ({}), {} total", id, name, self.consumers.len());

        FixReceiver {
            id,
            name: name.to_string(),
            rx,
        }
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    pub fn consumer_names(&self) -> Vec<&str> {
        self.consumers.iter().map(|c| c.name.as_str()).collect()
    }

    /// Deliver one copy of `fix` to every registered consumer, pausing between
    /// deliveries. Consumers that have shut down are dropped from the registry.
    /// Returns the number of copies delivered.
    pub async fn publish(&mut self, fix: &Fix) -> usize {
        log::debug!("Good read, broadcasting to {} receivers", self.consumers.len());

        let mut delivered = 0;
        let mut closed = Vec::new();

        for (index, consumer) in self.consumers.iter().enumerate() {
            if index > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }

            match consumer.tx.try_send(fix.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    log::warn!(
                        "Consumer #{} ({}) is {} fixes behind, skipping this fix",
                        consumer.id,
                        consumer.name,
                        self.queue_depth
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    log::info!("Consumer #{} ({}) has stopped", consumer.id, consumer.name);
                    closed.push(consumer.id);
                }
            }
        }

        if !closed.is_empty() {
            self.consumers.retain(|c| !closed.contains(&c.id));
        }

        delivered
    }
}

impl Default for Distributor {
    fn default() -> Self {
        Self::new(DEFAULT_PACING, DEFAULT_QUEUE_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn fix_at(latitude: f64) -> Fix {
        Fix {
            latitude,
            longitude: 11.5,
            ..Fix::default()
        }
    }

    #[tokio::test]
    async fn test_every_consumer_gets_one_copy() {
        let mut distributor = Distributor::new(Duration::ZERO, 4);
        let mut receivers: Vec<_> = (0..4)
            .map(|i| distributor.register(&format!("consumer-{}", i)))
            .collect();
        assert_eq!(distributor.consumer_count(), 4);

        for cycle in 0..3 {
            let delivered = distributor.publish(&fix_at(48.0 + cycle as f64)).await;
            assert_eq!(delivered, 4);
        }

        for receiver in receivers.iter_mut() {
            for cycle in 0..3 {
                let fix = receiver.recv().await.unwrap();
                assert_eq!(fix.latitude, 48.0 + cycle as f64);
            }
            assert!(receiver.rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn test_full_queue_skips_only_that_consumer() {
        let mut distributor = Distributor::new(Duration::ZERO, 1);
        let mut fast = distributor.register("fast");
        let mut slow = distributor.register("slow");

        assert_eq!(distributor.publish(&fix_at(1.0)).await, 2);
        assert_eq!(fast.recv().await.unwrap().latitude, 1.0);

        // "slow" has not drained its single slot yet
        assert_eq!(distributor.publish(&fix_at(2.0)).await, 1);
        assert_eq!(fast.recv().await.unwrap().latitude, 2.0);
        assert_eq!(slow.recv().await.unwrap().latitude, 1.0);
        assert_eq!(distributor.consumer_count(), 2);
    }

    #[tokio::test]
    async fn test_stopped_consumer_is_removed() {
        let mut distributor = Distributor::new(Duration::ZERO, 2);
        let mut alive = distributor.register("alive");
        let stopped = distributor.register("stopped");
        drop(stopped);

        assert_eq!(distributor.publish(&fix_at(1.0)).await, 1);
        assert_eq!(distributor.consumer_names(), vec!["alive"]);
        assert!(alive.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_pacing_between_deliveries() {
        let pacing = Duration::from_millis(20);
        let mut distributor = Distributor::new(pacing, DEFAULT_QUEUE_DEPTH);
        let _receivers: Vec<_> = (0..3).map(|_| distributor.register("paced")).collect();

        let start = Instant::now();
        distributor.publish(&fix_at(1.0)).await;
        assert!(start.elapsed() >= pacing * 2);
    }

    #[tokio::test]
    async fn test_receiver_ends_with_distributor() {
        let mut distributor = Distributor::default();
        let mut receiver = distributor.register("orphan");
        assert_eq!(receiver.name(), "orphan");
        assert_eq!(receiver.id(), 0);

        drop(distributor);
        assert!(receiver.recv().await.is_none());
    }
}
