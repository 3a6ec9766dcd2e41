//! Client-side issuance of the fixed on-chain instruction set (spec §4.6).
//! The on-chain program itself is out of scope; this crate only issues
//! instructions against its deployed address and reads account state.

pub mod client;
pub mod discriminator;
pub mod pda;

pub use client::SolanaChainAdapter;
