//! Minimal on-chain perp oracle reader.
//!
//! The full Drift oracle account layout is out of scope (spec §1: the
//! on-chain program itself is not implemented here); this reads a
//! Pyth/Drift-style `(price: i64, exponent: i32)` pair at a fixed byte
//! offset, which is the layout both programs publish for their oracle
//! accounts.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;

const PRICE_OFFSET: usize = 8;
const EXPONENT_OFFSET: usize = 16;

pub struct DriftOracleClient {
    rpc: RpcClient,
    oracle_accounts: HashMap<String, Pubkey>,
}

impl DriftOracleClient {
    #[must_use]
    pub fn new(rpc_url: String, oracle_accounts: HashMap<String, Pubkey>) -> Self {
        Self {
            rpc: RpcClient::new(rpc_url),
            oracle_accounts,
        }
    }

    /// Fetches and decodes the oracle account for `symbol`.
    ///
    /// # Errors
    /// Returns an error if `symbol` has no configured oracle account, the
    /// RPC call fails, or the account data is too short to decode.
    pub async fn poll(&self, symbol: &str) -> Result<Decimal> {
        let account = self
            .oracle_accounts
            .get(symbol)
            .with_context(|| format!("no oracle account configured for {symbol}"))?;

        let data = self
            .rpc
            .get_account_data(account)
            .await
            .with_context(|| format!("fetching oracle account for {symbol}"))?;

        if data.len() < EXPONENT_OFFSET + 4 {
            anyhow::bail!("oracle account data for {symbol} too short: {} bytes", data.len());
        }

        let price_raw = i64::from_le_bytes(data[PRICE_OFFSET..PRICE_OFFSET + 8].try_into()?);
        let exponent = i32::from_le_bytes(data[EXPONENT_OFFSET..EXPONENT_OFFSET + 4].try_into()?);

        decode_price(price_raw, exponent)
    }
}

fn decode_price(price_raw: i64, exponent: i32) -> Result<Decimal> {
    let mut price = Decimal::from(price_raw);
    if exponent < 0 {
        price.set_scale(u32::try_from(-exponent)?)?;
    } else {
        price *= Decimal::from(10i64.pow(u32::try_from(exponent)?));
    }
    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn decodes_negative_exponent_as_fixed_point() {
        assert_eq!(decode_price(12_345_678, -2).unwrap(), dec!(123456.78));
    }

    #[test]
    fn decodes_zero_exponent_verbatim() {
        assert_eq!(decode_price(42, 0).unwrap(), Decimal::from(42));
    }
}
