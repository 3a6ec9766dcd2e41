//! `CompositeOracle`: on-chain primary + CEX secondary, fanned into one
//! `watch::Sender<PriceSample>` per symbol — the same status-broadcast idiom
//! the reference workspace uses for bot status (`watch::Sender<
//! EnhancedBotStatus>` in `bot_actor.rs`).

use crate::binance::BinanceFeed;
use crate::drift::DriftOracleClient;
use async_trait::async_trait;
use chrono::Utc;
use run_core::errors::{OrchestratorError, Result};
use run_core::traits::{PriceOracle, PriceSample, PriceSource};
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub struct OracleConfig {
    pub rpc_url: String,
    pub binance_ws_url: String,
    pub binance_rest_url: String,
    pub drift_poll_interval: Duration,
}

pub struct CompositeOracle {
    channels: HashMap<String, watch::Receiver<PriceSample>>,
}

impl CompositeOracle {
    /// Spawns the primary on-chain poll task and the secondary
    /// websocket/REST task for every symbol, each writing into its own
    /// `watch` channel. The background tasks are detached: they run for the
    /// lifetime of the process, matching the reference workspace's
    /// fire-and-forget `tokio::spawn` inside `BotActor::start`.
    #[must_use]
    pub fn spawn(
        config: OracleConfig,
        symbols: &[String],
        oracle_accounts: HashMap<String, Pubkey>,
    ) -> Self {
        let drift = Arc::new(DriftOracleClient::new(config.rpc_url, oracle_accounts));
        let binance = Arc::new(BinanceFeed::new(config.binance_ws_url, config.binance_rest_url));
        let mut channels = HashMap::new();

        for symbol in symbols {
            let (tx, rx) = watch::channel(PriceSample {
                price: Decimal::ZERO,
                source: PriceSource::BinanceRest,
                timestamp: Utc::now(),
            });
            channels.insert(symbol.clone(), rx);

            spawn_drift_poll(Arc::clone(&drift), symbol.clone(), config.drift_poll_interval, tx.clone());
            spawn_binance_feed(Arc::clone(&binance), symbol.clone(), tx);
        }

        Self { channels }
    }
}

fn spawn_drift_poll(
    drift: Arc<DriftOracleClient>,
    symbol: String,
    interval: Duration,
    tx: watch::Sender<PriceSample>,
) {
    tokio::spawn(async move {
        loop {
            match drift.poll(&symbol).await {
                Ok(price) => {
                    let _ = tx.send(PriceSample {
                        price,
                        source: PriceSource::DriftOracle,
                        timestamp: Utc::now(),
                    });
                }
                Err(err) => {
                    tracing::warn!(%symbol, error = %err, "drift oracle poll failed");
                }
            }
            tokio::time::sleep(interval).await;
        }
    });
}

fn spawn_binance_feed(binance: Arc<BinanceFeed>, symbol: String, tx: watch::Sender<PriceSample>) {
    let binance_symbol = symbol.replace('/', "");
    tokio::spawn(async move {
        binance
            .run(&binance_symbol, |price, from_ws| {
                let _ = tx.send(PriceSample {
                    price,
                    source: if from_ws {
                        PriceSource::BinanceWs
                    } else {
                        PriceSource::BinanceRest
                    },
                    timestamp: Utc::now(),
                });
            })
            .await
    });
}

#[async_trait]
impl PriceOracle for CompositeOracle {
    async fn latest(&self, symbol: &str) -> Result<PriceSample> {
        self.channels
            .get(symbol)
            .map(|rx| *rx.borrow())
            .ok_or_else(|| {
                OrchestratorError::StateInvariantViolation(format!(
                    "no oracle feed configured for {symbol}"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn latest_errors_for_unconfigured_symbol() {
        let oracle = CompositeOracle {
            channels: HashMap::new(),
        };
        assert!(oracle.latest("SOL/USDC").await.is_err());
    }

    #[tokio::test]
    async fn latest_reads_current_channel_value() {
        let (tx, rx) = watch::channel(PriceSample {
            price: Decimal::from(100),
            source: PriceSource::DriftOracle,
            timestamp: Utc::now(),
        });
        let mut channels = HashMap::new();
        channels.insert("SOL/USDC".to_string(), rx);
        let oracle = CompositeOracle { channels };

        let sample = oracle.latest("SOL/USDC").await.unwrap();
        assert_eq!(sample.price, Decimal::from(100));

        tx.send(PriceSample {
            price: Decimal::from(101),
            source: PriceSource::BinanceWs,
            timestamp: Utc::now(),
        })
        .unwrap();
        let sample = oracle.latest("SOL/USDC").await.unwrap();
        assert_eq!(sample.price, Decimal::from(101));
    }
}
