//! In-process pub/sub bus (spec §4.8), generalized from the reference
//! workspace's per-bot `broadcast::Sender<BotEvent>` /
//! `watch::Sender<EnhancedBotStatus>` pairing in `bot_actor.rs` into a
//! registry keyed by run id, plus one global channel for run-agnostic
//! topics such as `PRICE_UPDATE`.

use run_core::events::Event;
use run_core::traits::BroadcastBus;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::broadcast;

/// Bounded per-subscriber queue depth (spec §4.8 default).
const QUEUE_DEPTH: usize = 64;

struct RunChannel {
    sender: broadcast::Sender<Event>,
    sequence: AtomicU64,
    last_run_update: Mutex<Option<Event>>,
}

impl RunChannel {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(QUEUE_DEPTH);
        Self {
            sender,
            sequence: AtomicU64::new(0),
            last_run_update: Mutex::new(None),
        }
    }

    fn next_seq(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst)
    }
}

/// The broadcast bus. `Bus` is cheap to clone (an `Arc` inside) so every
/// component that needs to publish — scheduler, round controller, trade
/// executor — holds its own handle. The run registry uses a plain
/// `std::sync::RwLock`, not `tokio::sync::RwLock`: every critical section is
/// a single `HashMap` lookup/insert, never an `.await`, so a blocking lock
/// is both correct and avoids a lock-across-await hazard entirely.
#[derive(Clone)]
pub struct Bus {
    runs: Arc<RwLock<HashMap<String, Arc<RunChannel>>>>,
    global: Arc<broadcast::Sender<Event>>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    #[must_use]
    pub fn new() -> Self {
        let (global, _) = broadcast::channel(QUEUE_DEPTH);
        Self {
            runs: Arc::new(RwLock::new(HashMap::new())),
            global: Arc::new(global),
        }
    }

    fn channel_for(&self, run_id: &str) -> Arc<RunChannel> {
        if let Some(channel) = self.runs.read().expect("lock poisoned").get(run_id) {
            return channel.clone();
        }
        self.runs
            .write()
            .expect("lock poisoned")
            .entry(run_id.to_string())
            .or_insert_with(|| Arc::new(RunChannel::new()))
            .clone()
    }

    /// Next sequence number for `run_id`, used by the run scheduler/round
    /// controller to stamp events so the strict per-run ordering of spec §5
    /// and §8 property 7 is externally observable.
    #[must_use]
    pub fn next_sequence(&self, run_id: &str) -> u64 {
        self.channel_for(run_id).next_seq()
    }
}

impl BroadcastBus for Bus {
    fn publish(&self, event: Event) {
        let Some(run_id) = event.run_id() else {
            // Global topic (e.g. PRICE_UPDATE); drop silently if nobody is
            // listening, matching broadcast::Sender::send's own contract.
            let _ = self.global.send(event);
            return;
        };
        let channel = self.channel_for(run_id);

        if matches!(event, Event::RunUpdate { .. }) {
            *channel.last_run_update.lock().expect("lock poisoned") = Some(event.clone());
        }

        // A lagging/absent subscriber set yields Err(SendError); that means
        // "nobody is listening right now," never a producer-side fault —
        // the producer never blocks and never treats this as an error.
        let _ = channel.sender.send(event);
    }

    async fn subscribe_run(&self, run_id: &str) -> (Option<Event>, broadcast::Receiver<Event>) {
        let channel = self.channel_for(run_id);
        let snapshot = channel.last_run_update.lock().expect("lock poisoned").clone();
        (snapshot, channel.sender.subscribe())
    }

    fn subscribe_global(&self) -> broadcast::Receiver<Event> {
        self.global.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use run_core::models::{Run, RunStatus};
    use tokio::time::{timeout, Duration};

    fn sample_run(id: &str) -> Run {
        Run {
            id: id.to_string(),
            numeric_id: 1,
            pair: "SOL/USDC".to_string(),
            status: RunStatus::Waiting,
            lobby_duration_seconds: 600,
            round_duration_seconds: 600,
            cooldown_seconds: 60,
            total_rounds: 6,
            current_round: 0,
            min_deposit: 10,
            max_deposit: 100,
            max_participants: 50,
            total_pool: 0,
            platform_fee_bps: 1_500,
            created_at: chrono::Utc::now(),
            started_at: None,
            ended_at: None,
        }
    }

    #[tokio::test]
    async fn publish_delivers_to_subscriber() {
        let bus = Bus::new();
        let (_, mut rx) = bus.subscribe_run("run-1").await;
        bus.publish(Event::RunUpdate {
            run: sample_run("run-1"),
            seq: bus.next_sequence("run-1"),
        });
        let received = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        assert!(matches!(received, Event::RunUpdate { .. }));
    }

    #[tokio::test]
    async fn resubscribe_receives_current_snapshot() {
        let bus = Bus::new();
        bus.publish(Event::RunUpdate {
            run: sample_run("run-2"),
            seq: bus.next_sequence("run-2"),
        });
        let (snapshot, _rx) = bus.subscribe_run("run-2").await;
        assert!(snapshot.is_some());
    }

    #[tokio::test]
    async fn sequence_numbers_increase_monotonically() {
        let bus = Bus::new();
        let first = bus.next_sequence("run-3");
        let second = bus.next_sequence("run-3");
        assert!(second > first);
    }

    #[tokio::test]
    async fn global_topic_is_independent_of_run_topics() {
        let bus = Bus::new();
        let mut global_rx = bus.subscribe_global();
        bus.publish(Event::PriceUpdate {
            symbol: "SOL/USDC".to_string(),
            price: rust_decimal::Decimal::from(100),
            source: "drift-oracle".to_string(),
            timestamp: chrono::Utc::now(),
        });
        let received = timeout(Duration::from_secs(1), global_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(received, Event::PriceUpdate { .. }));
    }
}
