//! The collaborator set a `RunActor` is built against: one `Arc<dyn Trait>`
//! per component seam of `run_core::traits`, bundled so round-controller and
//! trade-executor free functions (`round_controller.rs`, `trade_executor.rs`)
//! take one argument instead of seven.

use run_core::clock::Clock;
use run_core::config::ExecutorConfig;
use run_core::traits::{BroadcastBus, ChainAdapter, DexAdapter, PriceOracle, Store};
use run_core::ChaosRng;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct RunDeps {
    pub store: Arc<dyn Store>,
    pub bus: Arc<dyn BroadcastBus>,
    pub oracle: Arc<dyn PriceOracle>,
    pub chain: Arc<dyn ChainAdapter>,
    pub dex: Arc<dyn DexAdapter>,
    pub clock: Arc<dyn Clock>,
    /// `ChaosRng::draw` takes `&mut self`; a plain `std::sync::Mutex` is
    /// enough since a draw is a handful of `gen_range` calls, never an
    /// `.await`.
    pub chaos: Arc<Mutex<Box<dyn ChaosRng>>>,
    pub executor: ExecutorConfig,
    pub oracle_stale_seconds: i64,
}
