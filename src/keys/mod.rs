//! Mnemonics, derivation paths and key pairs

pub mod derive;
pub mod keypair;
pub mod mnemonic;

pub use derive::{derive, master_key, DerivationPath, ExtendedKey, Index};
pub use keypair::KeyPair;
pub use mnemonic::{MnemonicPhrase, WordCount};
