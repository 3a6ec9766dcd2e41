//! DEX adapter implementations satisfying `run_core::traits::DexAdapter`
//! (spec §4.7): a real HTTP client and a fully local mock, selected once at
//! wiring time by a `mode` flag.

pub mod mock;
pub mod real;

pub use mock::MockDexAdapter;
pub use real::RealDexAdapter;
