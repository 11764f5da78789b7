//! Ed25519 key pairs backed by a 32 byte seed

use rand::RngCore;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::signer::keypair::keypair_from_seed;
use std::fmt;

use crate::error::{Error, Result};
use crate::keys::derive::{derive_from_mnemonic, DerivationPath};
use crate::keys::mnemonic::MnemonicPhrase;

/// A signing key and its public key.
///
/// Only the seed is stored. A `solana_sdk` signer is rebuilt from it when
/// signing, so the pair stays `Clone` and comparable.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    seed: [u8; 32],
    public_key: Pubkey,
}

impl KeyPair {
    pub fn from_seed(seed: [u8; 32]) -> Result<Self> {
        let keypair = Self::signer_for(&seed)?;
        Ok(Self {
            seed,
            public_key: keypair.pubkey(),
        })
    }

    /// Derive the key at `path` from a mnemonic
    pub fn derive(path: &DerivationPath, mnemonic: &MnemonicPhrase) -> Result<Self> {
        derive_from_mnemonic(path, mnemonic)
    }

    /// Random key, not part of any derivation tree
    pub fn generate() -> Result<Self> {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        Self::from_seed(seed)
    }

    pub fn public_key(&self) -> Pubkey {
        self.public_key
    }

    pub fn seed(&self) -> &[u8; 32] {
        &self.seed
    }

    pub fn signer(&self) -> Result<Keypair> {
        Self::signer_for(&self.seed)
    }

    pub fn sign(&self, message: &[u8]) -> Result<Signature> {
        Ok(self.signer()?.sign_message(message))
    }

    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        signature.verify(self.public_key.as_ref(), message)
    }

    fn signer_for(seed: &[u8; 32]) -> Result<Keypair> {
        keypair_from_seed(seed).map_err(|e| Error::Derivation(e.to_string()))
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_seed_public_key() {
        let seed: [u8; 32] =
            hex::decode("68e0fe46dfb67e368c75379acec591dad19df3cde26e63b93a8e704f1dade7a3")
                .unwrap()
                .try_into()
                .unwrap();
        let key_pair = KeyPair::from_seed(seed).unwrap();
        assert_eq!(
            hex::encode(key_pair.public_key().to_bytes()),
            "8c8a13df77a28f3445213a0f432fde644acaa215fc72dcdf300d5efaa85d350c"
        );
    }

    #[test]
    fn test_sign_and_verify() {
        let key_pair = KeyPair::generate().unwrap();
        let signature = key_pair.sign(b"tray").unwrap();
        assert!(key_pair.verify(b"tray", &signature));
        assert!(!key_pair.verify(b"other", &signature));
    }

    #[test]
    fn test_signer_matches_public_key() {
        let key_pair = KeyPair::generate().unwrap();
        assert_eq!(key_pair.signer().unwrap().pubkey(), key_pair.public_key());
    }

    #[test]
    fn test_debug_hides_seed() {
        let key_pair = KeyPair::from_seed([7u8; 32]).unwrap();
        let debug = format!("{:?}", key_pair);
        assert!(debug.contains(&key_pair.public_key().to_string()));
        assert!(!debug.contains(&hex::encode([7u8; 32])));
    }
}
