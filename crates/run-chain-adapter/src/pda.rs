//! Program-derived address seeds, exactly as tabulated in the on-chain
//! interface contract. These must match the deployed program byte-for-byte;
//! nothing here is free to change without a matching program upgrade.

use solana_sdk::pubkey::Pubkey;

#[must_use]
pub fn platform_pda(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"platform"], program_id)
}

#[must_use]
pub fn run_pda(program_id: &Pubkey, numeric_run_id: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"run", &numeric_run_id.to_le_bytes()], program_id)
}

#[must_use]
pub fn vault_pda(program_id: &Pubkey, numeric_run_id: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"vault", &numeric_run_id.to_le_bytes()], program_id)
}

#[must_use]
pub fn trade_pda(program_id: &Pubkey, numeric_run_id: u64, round: u16) -> (Pubkey, u8) {
    let round_u8 = u8::try_from(round).unwrap_or(u8::MAX);
    Pubkey::find_program_address(
        &[b"trade", &numeric_run_id.to_le_bytes(), &[round_u8]],
        program_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_pda_is_deterministic_for_same_numeric_id() {
        let program_id = Pubkey::new_unique();
        assert_eq!(run_pda(&program_id, 7), run_pda(&program_id, 7));
    }

    #[test]
    fn run_pda_differs_across_numeric_ids() {
        let program_id = Pubkey::new_unique();
        assert_ne!(run_pda(&program_id, 7), run_pda(&program_id, 8));
    }

    #[test]
    fn trade_pda_differs_across_rounds() {
        let program_id = Pubkey::new_unique();
        assert_ne!(
            trade_pda(&program_id, 7, 0),
            trade_pda(&program_id, 7, 1)
        );
    }
}
