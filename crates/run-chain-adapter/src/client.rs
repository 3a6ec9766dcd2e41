//! `SolanaChainAdapter`: issues the fixed instruction set of the on-chain
//! run-lifecycle program. Modeled on the reference workspace's
//! `HyperliquidClient` (a thin client wrapping a typed call surface behind
//! one struct) with the HTTP+rate-limiter pairing swapped for an RPC client
//! and transaction signing.

use crate::discriminator::instruction_discriminator;
use crate::pda::{platform_pda, run_pda, trade_pda, vault_pda};
use async_trait::async_trait;
use borsh::BorshSerialize;
use run_core::errors::{OrchestratorError, Result};
use run_core::models::{RunConfig, Trade, TradeDirection};
use run_core::traits::{ChainAdapter, ChainReceipt};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::Transaction;
use std::time::Duration;

pub struct SolanaChainAdapter {
    rpc: RpcClient,
    program_id: Pubkey,
    payer: Keypair,
    call_timeout: Duration,
}

impl SolanaChainAdapter {
    #[must_use]
    pub fn new(rpc_url: String, program_id: Pubkey, payer: Keypair, call_timeout: Duration) -> Self {
        Self {
            rpc: RpcClient::new(rpc_url),
            program_id,
            payer,
            call_timeout,
        }
    }

    /// Bootstraps the platform account; a one-time operation, not part of
    /// the `ChainAdapter` trait since no run-scoped caller ever issues it.
    ///
    /// # Errors
    /// Returns `ExternalPermanent` if the platform account already exists
    /// (spec §4.6: "fails if account exists"), or `ExternalTransient` for
    /// any other RPC failure.
    pub async fn initialize_platform(&self, fee_bps: u32) -> Result<ChainReceipt> {
        let (platform, _bump) = platform_pda(&self.program_id);
        if self.account_exists(&platform).await? {
            return Err(OrchestratorError::ExternalPermanent {
                service: "solana".to_string(),
                source: anyhow::anyhow!("platform account already initialized"),
            });
        }
        #[derive(BorshSerialize)]
        struct Args {
            fee_bps: u32,
        }
        let ix = self.build_instruction(
            "initialize_platform",
            &Args { fee_bps },
            vec![
                AccountMeta::new(platform, false),
                AccountMeta::new(self.payer.pubkey(), true),
                AccountMeta::new_readonly(solana_sdk::system_program::ID, false),
            ],
        );
        let signature = self.send(ix).await?;
        Ok(ChainReceipt {
            signature,
            already_existed: false,
        })
    }

    async fn account_exists(&self, pubkey: &Pubkey) -> Result<bool> {
        match self.rpc.get_account(pubkey).await {
            Ok(_) => Ok(true),
            Err(err) if err.to_string().contains("AccountNotFound") => Ok(false),
            Err(err) => Err(rpc_err(err)),
        }
    }

    fn build_instruction(
        &self,
        name: &str,
        args: &impl BorshSerialize,
        accounts: Vec<AccountMeta>,
    ) -> Instruction {
        let mut data = instruction_discriminator(name).to_vec();
        args.serialize(&mut data).expect("borsh serialization is infallible for these args");
        Instruction {
            program_id: self.program_id,
            accounts,
            data,
        }
    }

    async fn send(&self, instruction: Instruction) -> Result<String> {
        let blockhash = self
            .rpc
            .get_latest_blockhash()
            .await
            .map_err(rpc_err)?;
        let tx = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&self.payer.pubkey()),
            &[&self.payer],
            blockhash,
        );
        let signature = tokio::time::timeout(
            self.call_timeout,
            self.rpc.send_and_confirm_transaction(&tx),
        )
        .await
        .map_err(|_| OrchestratorError::ExternalTransient {
            service: "solana".to_string(),
            source: anyhow::anyhow!("transaction confirmation timed out"),
        })?
        .map_err(rpc_err)?;
        Ok(signature.to_string())
    }
}

fn rpc_err(err: solana_client::client_error::ClientError) -> OrchestratorError {
    OrchestratorError::ExternalTransient {
        service: "solana".to_string(),
        source: anyhow::Error::new(err),
    }
}

fn decimal_to_micros(value: Decimal) -> i64 {
    (value * Decimal::from(1_000_000))
        .round()
        .to_i64()
        .unwrap_or(0)
}

#[async_trait]
impl ChainAdapter for SolanaChainAdapter {
    async fn create_run(&self, numeric_run_id: u64, cfg: &RunConfig) -> Result<ChainReceipt> {
        let (run_account, _bump) = run_pda(&self.program_id, numeric_run_id);
        if self.account_exists(&run_account).await? {
            return Ok(ChainReceipt {
                signature: String::new(),
                already_existed: true,
            });
        }

        #[derive(BorshSerialize)]
        struct Args {
            run_id: u64,
            min_deposit: i64,
            max_deposit: i64,
            max_participants: u32,
        }
        let ix = self.build_instruction(
            "create_run",
            &Args {
                run_id: numeric_run_id,
                min_deposit: cfg.min_deposit,
                max_deposit: cfg.max_deposit,
                max_participants: cfg.max_participants,
            },
            vec![
                AccountMeta::new(run_account, false),
                AccountMeta::new(self.payer.pubkey(), true),
                AccountMeta::new_readonly(solana_sdk::system_program::ID, false),
            ],
        );
        let signature = self.send(ix).await?;
        Ok(ChainReceipt {
            signature,
            already_existed: false,
        })
    }

    async fn create_run_vault(&self, numeric_run_id: u64) -> Result<ChainReceipt> {
        let (vault_account, _bump) = vault_pda(&self.program_id, numeric_run_id);
        if self.account_exists(&vault_account).await? {
            return Ok(ChainReceipt {
                signature: String::new(),
                already_existed: true,
            });
        }

        let (run_account, _bump) = run_pda(&self.program_id, numeric_run_id);
        #[derive(BorshSerialize)]
        struct Args {
            run_id: u64,
        }
        let ix = self.build_instruction(
            "create_run_vault",
            &Args {
                run_id: numeric_run_id,
            },
            vec![
                AccountMeta::new(vault_account, false),
                AccountMeta::new_readonly(run_account, false),
                AccountMeta::new(self.payer.pubkey(), true),
                AccountMeta::new_readonly(solana_sdk::system_program::ID, false),
            ],
        );
        let signature = self.send(ix).await?;
        Ok(ChainReceipt {
            signature,
            already_existed: false,
        })
    }

    async fn start_run(&self, numeric_run_id: u64) -> Result<ChainReceipt> {
        let (run_account, _bump) = run_pda(&self.program_id, numeric_run_id);
        #[derive(BorshSerialize)]
        struct Args {
            run_id: u64,
        }
        let ix = self.build_instruction(
            "start_run",
            &Args {
                run_id: numeric_run_id,
            },
            vec![
                AccountMeta::new(run_account, false),
                AccountMeta::new(self.payer.pubkey(), true),
            ],
        );
        let signature = self.send(ix).await?;
        Ok(ChainReceipt {
            signature,
            already_existed: false,
        })
    }

    async fn record_trade(
        &self,
        numeric_run_id: u64,
        round: u16,
        trade: &Trade,
    ) -> Result<ChainReceipt> {
        let (trade_account, _bump) = trade_pda(&self.program_id, numeric_run_id, round);
        let (run_account, _bump) = run_pda(&self.program_id, numeric_run_id);

        #[derive(BorshSerialize)]
        struct Args {
            run_id: u64,
            round: u16,
            direction: u8,
            leverage_tenths: u32,
            position_size_percent_tenths: u32,
            entry_price_micros: i64,
        }
        let direction = match trade.direction {
            TradeDirection::Long => 0u8,
            TradeDirection::Short => 1u8,
            TradeDirection::Skip => 2u8,
        };
        let ix = self.build_instruction(
            "record_trade",
            &Args {
                run_id: numeric_run_id,
                round,
                direction,
                leverage_tenths: trade.leverage_tenths,
                position_size_percent_tenths: trade.position_size_percent_tenths,
                entry_price_micros: decimal_to_micros(trade.entry_price),
            },
            vec![
                AccountMeta::new(trade_account, false),
                AccountMeta::new_readonly(run_account, false),
                AccountMeta::new(self.payer.pubkey(), true),
                AccountMeta::new_readonly(solana_sdk::system_program::ID, false),
            ],
        );
        // Non-fatal by contract (spec §4.6): callers log and continue rather
        // than aborting round settlement on failure.
        let signature = self.send(ix).await?;
        Ok(ChainReceipt {
            signature,
            already_existed: false,
        })
    }

    async fn settle_run(
        &self,
        numeric_run_id: u64,
        final_balance: i64,
        shares: &[(String, i64)],
    ) -> Result<ChainReceipt> {
        let (run_account, _bump) = run_pda(&self.program_id, numeric_run_id);
        let (vault_account, _bump) = vault_pda(&self.program_id, numeric_run_id);

        #[derive(BorshSerialize)]
        struct Args {
            run_id: u64,
            final_balance: i64,
            shares: Vec<(String, i64)>,
        }
        let ix = self.build_instruction(
            "settle_run",
            &Args {
                run_id: numeric_run_id,
                final_balance,
                shares: shares.to_vec(),
            },
            vec![
                AccountMeta::new(run_account, false),
                AccountMeta::new(vault_account, false),
                AccountMeta::new(self.payer.pubkey(), true),
            ],
        );
        let signature = self.send(ix).await?;
        Ok(ChainReceipt {
            signature,
            already_existed: false,
        })
    }

    async fn withdraw(&self, numeric_run_id: u64, user_id: &str) -> Result<ChainReceipt> {
        let (run_account, _bump) = run_pda(&self.program_id, numeric_run_id);
        let (vault_account, _bump) = vault_pda(&self.program_id, numeric_run_id);

        #[derive(BorshSerialize)]
        struct Args {
            run_id: u64,
            user: String,
        }
        let ix = self.build_instruction(
            "withdraw",
            &Args {
                run_id: numeric_run_id,
                user: user_id.to_string(),
            },
            vec![
                AccountMeta::new_readonly(run_account, false),
                AccountMeta::new(vault_account, false),
                AccountMeta::new(self.payer.pubkey(), true),
            ],
        );
        let signature = self.send(ix).await?;
        Ok(ChainReceipt {
            signature,
            already_existed: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_to_micros_rounds_to_nearest() {
        assert_eq!(decimal_to_micros(Decimal::new(1_500_001, 6)), 1_500_001);
        assert_eq!(decimal_to_micros(Decimal::new(10, 1)), 1_000_000);
    }
}
