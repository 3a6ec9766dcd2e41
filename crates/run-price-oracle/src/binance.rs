//! Secondary price feed: a Binance trade-stream WebSocket with a REST poll
//! fallback, modeled on the reference workspace's `HyperliquidWebSocket`
//! reconnect-and-ping loop.

use anyhow::{Context, Result};
use futures_util::StreamExt;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};

pub struct BinanceFeed {
    ws_url: String,
    rest_url: String,
    http: reqwest::Client,
}

impl BinanceFeed {
    #[must_use]
    pub fn new(ws_url: String, rest_url: String) -> Self {
        Self {
            ws_url,
            rest_url,
            http: reqwest::Client::new(),
        }
    }

    /// Runs forever, invoking `on_price` for every trade tick. Falls back to
    /// REST polling at 1 Hz whenever the socket drops, and keeps retrying the
    /// socket connection in the background.
    pub async fn run(&self, symbol: &str, mut on_price: impl FnMut(Decimal, bool)) -> ! {
        loop {
            match self.stream_trades(symbol, &mut on_price).await {
                Ok(()) => {}
                Err(err) => {
                    tracing::warn!(%symbol, error = %err, "binance websocket stream ended, falling back to REST");
                }
            }
            self.rest_fallback_loop(symbol, &mut on_price).await;
        }
    }

    async fn stream_trades(
        &self,
        symbol: &str,
        on_price: &mut impl FnMut(Decimal, bool),
    ) -> Result<()> {
        let stream_name = format!("{}@trade", symbol.to_lowercase());
        let url = format!("{}/ws/{}", self.ws_url, stream_name);
        let (mut ws, _) = connect_async(&url)
            .await
            .with_context(|| format!("connecting to {url}"))?;
        tracing::info!(%symbol, "binance websocket connected");

        while let Some(msg) = ws.next().await {
            let msg = msg?;
            let Message::Text(text) = msg else { continue };
            let parsed: serde_json::Value = serde_json::from_str(&text)?;
            if let Some(price_str) = parsed.get("p").and_then(|v| v.as_str()) {
                if let Ok(price) = Decimal::from_str(price_str) {
                    on_price(price, true);
                }
            }
        }
        anyhow::bail!("binance websocket stream closed")
    }

    /// Polls REST every second until the caller's outer loop reconnects the
    /// socket. Runs a bounded number of attempts so a permanently-down feed
    /// doesn't spin the task forever without yielding back to `run`'s retry.
    async fn rest_fallback_loop(&self, symbol: &str, on_price: &mut impl FnMut(Decimal, bool)) {
        const MAX_FALLBACK_TICKS: u32 = 30;
        for _ in 0..MAX_FALLBACK_TICKS {
            match self.rest_poll_once(symbol).await {
                Ok(price) => on_price(price, false),
                Err(err) => tracing::warn!(%symbol, error = %err, "binance REST poll failed"),
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }

    async fn rest_poll_once(&self, symbol: &str) -> Result<Decimal> {
        let url = format!("{}/ticker/price?symbol={}", self.rest_url, symbol.to_uppercase());
        let body: serde_json::Value = self.http.get(&url).send().await?.json().await?;
        let price_str = body
            .get("price")
            .and_then(|v| v.as_str())
            .context("missing price field in Binance REST response")?;
        Ok(Decimal::from_str(price_str)?)
    }
}
