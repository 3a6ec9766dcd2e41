//! Real DEX adapter: long-lived HTTP client against the configured perp
//! exchange, modeled directly on the reference workspace's
//! `HyperliquidClient` (`exchange-hyperliquid/src/client.rs`): a
//! `reqwest::Client` paired with a `governor` rate limiter, one `get`/`post`
//! helper the typed calls build on.

use async_trait::async_trait;
use governor::{clock::DefaultClock, state::direct::NotKeyed, state::InMemoryState, Quota, RateLimiter};
use run_core::errors::{OrchestratorError, Result};
use run_core::models::PositionDirection;
use run_core::traits::{ClosePositionReceipt, DexAccountInfo, DexAdapter, DexPosition, OpenPositionReceipt};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::sync::Arc;

pub struct RealDexAdapter {
    http: reqwest::Client,
    base_url: String,
    subaccount: String,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl RealDexAdapter {
    /// # Panics
    /// Panics if the rate limiter quota cannot be constructed, which only
    /// happens for a zero quota (never the case for the literal here).
    #[must_use]
    pub fn new(base_url: String, subaccount: String) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(10).expect("10 is non-zero"));
        Self {
            http: reqwest::Client::new(),
            base_url,
            subaccount,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Verifies the configured subaccount exists and is tradable. Called
    /// once at startup (spec §4.7); the caller demotes to mock mode on
    /// `Err`, with a loud `SystemLog` warning.
    ///
    /// # Errors
    /// Returns `ExternalPermanent` if the subaccount cannot be found or
    /// initialized, `ExternalTransient` for any other HTTP failure.
    pub async fn verify_subaccount(&self) -> Result<()> {
        self.get_account_info().await.map(|_| ())
    }

    async fn get(&self, endpoint: &str) -> Result<serde_json::Value> {
        self.rate_limiter.until_ready().await;
        let url = format!("{}{endpoint}", self.base_url);
        let response = self.http.get(&url).send().await.map_err(http_err)?;
        response.json().await.map_err(http_err)
    }

    async fn post(&self, endpoint: &str, body: serde_json::Value) -> Result<serde_json::Value> {
        self.rate_limiter.until_ready().await;
        let url = format!("{}{endpoint}", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(http_err)?;
        response.json().await.map_err(http_err)
    }
}

fn http_err(err: reqwest::Error) -> OrchestratorError {
    OrchestratorError::ExternalTransient {
        service: "dex".to_string(),
        source: anyhow::Error::new(err),
    }
}

fn parse_decimal(value: &serde_json::Value, field: &str) -> Result<Decimal> {
    let raw = value
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| OrchestratorError::ExternalPermanent {
            service: "dex".to_string(),
            source: anyhow::anyhow!("missing field {field} in DEX response"),
        })?;
    Decimal::from_str(raw).map_err(|e| OrchestratorError::ExternalPermanent {
        service: "dex".to_string(),
        source: anyhow::Error::new(e),
    })
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    market_symbol: String,
    direction: String,
    base_amount: String,
    entry_price: String,
}

#[async_trait]
impl DexAdapter for RealDexAdapter {
    async fn get_account_info(&self) -> Result<DexAccountInfo> {
        let body = self
            .get(&format!("/account?subaccount={}", self.subaccount))
            .await?;
        let available_collateral = parse_decimal(&body, "available_collateral")?
            .round()
            .to_string()
            .parse::<i64>()
            .map_err(|e| OrchestratorError::ExternalPermanent {
                service: "dex".to_string(),
                source: anyhow::Error::new(e),
            })?;
        Ok(DexAccountInfo { available_collateral })
    }

    async fn get_open_positions(&self) -> Result<Vec<DexPosition>> {
        let body = self
            .get(&format!("/positions?subaccount={}", self.subaccount))
            .await?;
        let raw: Vec<RawPosition> = serde_json::from_value(body).map_err(|e| {
            OrchestratorError::ExternalPermanent {
                service: "dex".to_string(),
                source: anyhow::Error::new(e),
            }
        })?;
        raw.into_iter()
            .map(|p| {
                Ok(DexPosition {
                    market_symbol: p.market_symbol,
                    direction: match p.direction.as_str() {
                        "LONG" => PositionDirection::Long,
                        "SHORT" => PositionDirection::Short,
                        other => {
                            return Err(OrchestratorError::ExternalPermanent {
                                service: "dex".to_string(),
                                source: anyhow::anyhow!("unknown position direction {other}"),
                            })
                        }
                    },
                    base_amount: Decimal::from_str(&p.base_amount).map_err(|e| {
                        OrchestratorError::ExternalPermanent {
                            service: "dex".to_string(),
                            source: anyhow::Error::new(e),
                        }
                    })?,
                    entry_price: Decimal::from_str(&p.entry_price).map_err(|e| {
                        OrchestratorError::ExternalPermanent {
                            service: "dex".to_string(),
                            source: anyhow::Error::new(e),
                        }
                    })?,
                })
            })
            .collect()
    }

    async fn get_oracle_price(&self, market_symbol: &str) -> Result<Decimal> {
        let body = self.get(&format!("/oracle-price?market={market_symbol}")).await?;
        parse_decimal(&body, "price")
    }

    async fn open_position(
        &self,
        market_symbol: &str,
        direction: PositionDirection,
        base_amount: Decimal,
        leverage: Decimal,
    ) -> Result<OpenPositionReceipt> {
        let body = serde_json::json!({
            "subaccount": self.subaccount,
            "market": market_symbol,
            "direction": match direction {
                PositionDirection::Long => "LONG",
                PositionDirection::Short => "SHORT",
            },
            "base_amount": base_amount.to_string(),
            "leverage": leverage.to_string(),
        });
        let response = self.post("/open-position", body).await?;
        Ok(OpenPositionReceipt {
            transaction_id: response
                .get("transaction_id")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            entry_price: parse_decimal(&response, "entry_price")?,
        })
    }

    async fn close_position(&self, market_symbol: &str) -> Result<ClosePositionReceipt> {
        let body = serde_json::json!({
            "subaccount": self.subaccount,
            "market": market_symbol,
        });
        let response = self.post("/close-position", body).await?;
        let realized_pnl = parse_decimal(&response, "realized_pnl")?
            .round()
            .to_string()
            .parse::<i64>()
            .map_err(|e| OrchestratorError::ExternalPermanent {
                service: "dex".to_string(),
                source: anyhow::Error::new(e),
            })?;
        Ok(ClosePositionReceipt {
            transaction_id: response
                .get("transaction_id")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            exit_price: parse_decimal(&response, "exit_price")?,
            realized_pnl,
        })
    }
}
