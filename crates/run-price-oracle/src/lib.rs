//! Composite price oracle: on-chain perp oracle primary, CEX websocket/REST
//! secondary fallback.

pub mod binance;
pub mod composite;
pub mod drift;

pub use composite::{CompositeOracle, OracleConfig};
pub use drift::DriftOracleClient;
