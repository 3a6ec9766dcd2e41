//! Anchor's client-side instruction discriminator: the first 8 bytes of
//! `sha256("global:<instruction_name>")`, prepended to the Borsh-encoded
//! argument struct. This mirrors `anchor-lang`'s `#[program]` macro output
//! without requiring the macro itself (which expands on the program side,
//! out of scope here).

use sha2::{Digest, Sha256};

#[must_use]
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    let preimage = format!("global:{name}");
    let hash = Sha256::digest(preimage.as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash[..8]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminator_is_stable_for_a_given_name() {
        assert_eq!(
            instruction_discriminator("create_run"),
            instruction_discriminator("create_run")
        );
    }

    #[test]
    fn discriminator_differs_across_names() {
        assert_ne!(
            instruction_discriminator("create_run"),
            instruction_discriminator("settle_run")
        );
    }
}
