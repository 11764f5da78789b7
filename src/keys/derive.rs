//! Hierarchical ed25519 key derivation (SLIP-0010)
//!
//! Paths use BIP32 syntax, `m/44'/501'/0'/0'`. Every step uses private
//! child derivation, `HMAC-SHA512(chain, 0x00 || key || ser32(index))`.
//! A hardened index sets the top bit before serializing. A normal index is
//! serialized as-is, which is what Sollet-style paths such as
//! `m/44'/501'/0'/0'/0'/1` expect.
//!
//! A path may carry a password, written after a `#`:
//! `m/44'/501'/0'/0'/0'/0#getcode.com`. The password is folded into the
//! BIP39 seed, so each password produces an independent key tree.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::keys::keypair::KeyPair;
use crate::keys::mnemonic::MnemonicPhrase;

type HmacSha512 = Hmac<Sha512>;

/// Offset added to hardened child numbers
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

const ED25519_SEED_KEY: &[u8] = b"ed25519 seed";
const PASSWORD_SEPARATOR: char = '#';

/// One step of a derivation path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Index {
    value: u32,
    hardened: bool,
}

impl Index {
    pub const fn hardened(value: u32) -> Self {
        Self {
            value,
            hardened: true,
        }
    }

    pub const fn normal(value: u32) -> Self {
        Self {
            value,
            hardened: false,
        }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn is_hardened(&self) -> bool {
        self.hardened
    }

    /// Serialized child number fed into the HMAC
    fn child_number(&self) -> u32 {
        if self.hardened {
            self.value | HARDENED_OFFSET
        } else {
            self.value
        }
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.value)
        } else {
            write!(f, "{}", self.value)
        }
    }
}

impl FromStr for Index {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (digits, hardened) = match s.strip_suffix('\'') {
            Some(digits) => (digits, true),
            None => (s, false),
        };

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::MalformedPath(format!("non-numeric index: {:?}", s)));
        }

        let value: u32 = digits
            .parse()
            .map_err(|_| Error::MalformedPath(format!("index out of range: {}", s)))?;

        if value >= HARDENED_OFFSET {
            return Err(Error::MalformedPath(format!("index out of range: {}", s)));
        }

        Ok(Self { value, hardened })
    }
}

/// An immutable derivation path with an optional password
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    indexes: Vec<Index>,
    password: Option<String>,
}

impl DerivationPath {
    pub fn new(indexes: Vec<Index>) -> Self {
        Self {
            indexes,
            password: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// `m/44'/501'/0'/0'`, the owner account
    pub fn solana() -> Self {
        Self::sollet(0)
    }

    /// `m/44'/501'/<account>'`
    pub fn solana_bip44(account: u32) -> Self {
        Self::new(vec![
            Index::hardened(44),
            Index::hardened(501),
            Index::hardened(account),
        ])
    }

    /// `m/44'/501'/<account>'/0'`, as used by Sollet and Phantom
    pub fn sollet(account: u32) -> Self {
        let mut path = Self::solana_bip44(account);
        path.indexes.push(Index::hardened(0));
        path
    }

    /// `m/44'/501'/0'/0'/<index>'/2`
    pub fn bucket_incoming(index: u32) -> Self {
        Self::under_solana(index, 2)
    }

    /// `m/44'/501'/0'/0'/<index>'/3`
    pub fn bucket_outgoing(index: u32) -> Self {
        Self::under_solana(index, 3)
    }

    /// `m/44'/501'/0'/0'/0'/<bill value>`
    pub fn bucket(bill_value: u32) -> Self {
        Self::under_solana(0, bill_value)
    }

    /// `m/44'/501'/0'/0'/1'/0`
    pub fn swap() -> Self {
        Self::under_solana(1, 0)
    }

    /// `m/44'/501'/0'/0'/0'/0` salted with the domain
    pub fn relationship(domain: &str) -> Self {
        Self::under_solana(0, 0).with_password(domain)
    }

    fn under_solana(hardened: u32, leaf: u32) -> Self {
        let mut path = Self::solana();
        path.indexes.push(Index::hardened(hardened));
        path.indexes.push(Index::normal(leaf));
        path
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for index in &self.indexes {
            write!(f, "/{}", index)?;
        }
        if let Some(password) = &self.password {
            write!(f, "{}{}", PASSWORD_SEPARATOR, password)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (path, password) = match s.split_once(PASSWORD_SEPARATOR) {
            Some((path, password)) if !password.is_empty() => (path, Some(password.to_string())),
            Some(_) => return Err(Error::MalformedPath(format!("empty password: {}", s))),
            None => (s, None),
        };

        let mut segments = path.trim().split('/');
        if segments.next() != Some("m") {
            return Err(Error::MalformedPath(format!("path must start with 'm': {}", s)));
        }

        let indexes = segments
            .map(Index::from_str)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { indexes, password })
    }
}

impl Serialize for DerivationPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DerivationPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A private key together with its chain code
#[derive(Clone, PartialEq, Eq)]
pub struct ExtendedKey {
    pub key: [u8; 32],
    pub chain_code: [u8; 32],
}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("chain_code", &hex::encode(self.chain_code))
            .finish_non_exhaustive()
    }
}

impl ExtendedKey {
    fn from_hmac(key: &[u8], parts: &[&[u8]]) -> Result<Self> {
        let mut mac = HmacSha512::new_from_slice(key)
            .map_err(|e| Error::Derivation(e.to_string()))?;
        for part in parts {
            mac.update(part);
        }
        let output = mac.finalize().into_bytes();

        let mut extended = Self {
            key: [0u8; 32],
            chain_code: [0u8; 32],
        };
        extended.key.copy_from_slice(&output[..32]);
        extended.chain_code.copy_from_slice(&output[32..]);
        Ok(extended)
    }

    pub fn child(&self, index: Index) -> Result<Self> {
        Self::from_hmac(
            &self.chain_code,
            &[&[0u8], &self.key, &index.child_number().to_be_bytes()],
        )
    }
}

/// Master key and chain code for a seed
pub fn master_key(seed: &[u8]) -> Result<ExtendedKey> {
    ExtendedKey::from_hmac(ED25519_SEED_KEY, &[seed])
}

/// Walk `path` from the master key of `seed`
pub fn derive_extended(path: &DerivationPath, seed: &[u8]) -> Result<ExtendedKey> {
    path.indexes()
        .iter()
        .try_fold(master_key(seed)?, |parent, index| parent.child(*index))
}

/// Derive the key pair and chain code at `path`
pub fn derive(path: &DerivationPath, seed: &[u8]) -> Result<(KeyPair, [u8; 32])> {
    let extended = derive_extended(path, seed)?;
    let key_pair = KeyPair::from_seed(extended.key)?;
    Ok((key_pair, extended.chain_code))
}

/// Seed the mnemonic with the path's password and derive
pub fn derive_from_mnemonic(path: &DerivationPath, mnemonic: &MnemonicPhrase) -> Result<KeyPair> {
    let seed = mnemonic.seed(path.password().unwrap_or_default());
    let (key_pair, _) = derive(path, &seed)?;
    Ok(key_pair)
}
