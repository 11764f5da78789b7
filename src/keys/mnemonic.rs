//! BIP39 recovery phrases
//!
//! Only 12 and 24 word phrases from the English wordlist are accepted.
//! Everything else is rejected at parse time.

use bip39::{Language, Mnemonic};
use rand::RngCore;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Number of words in a supported phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordCount {
    Twelve,
    TwentyFour,
}

impl WordCount {
    pub fn words(&self) -> usize {
        match self {
            WordCount::Twelve => 12,
            WordCount::TwentyFour => 24,
        }
    }

    /// Entropy size in bytes backing a phrase of this length
    pub fn entropy_len(&self) -> usize {
        match self {
            WordCount::Twelve => 16,
            WordCount::TwentyFour => 32,
        }
    }

    pub fn from_words(count: usize) -> Result<Self> {
        match count {
            12 => Ok(WordCount::Twelve),
            24 => Ok(WordCount::TwentyFour),
            other => Err(Error::InvalidMnemonicLength(other)),
        }
    }
}

/// A validated BIP39 mnemonic phrase
#[derive(Clone, PartialEq, Eq)]
pub struct MnemonicPhrase {
    inner: Mnemonic,
}

impl MnemonicPhrase {
    /// Parse a phrase, checking word count, wordlist membership and checksum
    pub fn new(phrase: &str) -> Result<Self> {
        WordCount::from_words(phrase.split_whitespace().count())?;
        let inner = Mnemonic::parse_in(Language::English, phrase)?;
        Ok(Self { inner })
    }

    pub fn from_words<S: AsRef<str>>(words: &[S]) -> Result<Self> {
        let phrase = words
            .iter()
            .map(|w| w.as_ref())
            .collect::<Vec<_>>()
            .join(" ");
        Self::new(&phrase)
    }

    pub fn from_entropy(entropy: &[u8]) -> Result<Self> {
        let count = match entropy.len() {
            16 => WordCount::Twelve,
            32 => WordCount::TwentyFour,
            other => {
                return Err(Error::InvalidMnemonic(format!(
                    "unsupported entropy length: {} bytes",
                    other
                )))
            }
        };
        let inner = Mnemonic::from_entropy_in(Language::English, entropy)?;
        debug_assert_eq!(inner.word_count(), count.words());
        Ok(Self { inner })
    }

    /// Generate a fresh phrase from OS randomness
    pub fn generate(count: WordCount) -> Result<Self> {
        let mut entropy = vec![0u8; count.entropy_len()];
        rand::thread_rng().fill_bytes(&mut entropy);
        Self::from_entropy(&entropy)
    }

    pub fn entropy(&self) -> Vec<u8> {
        self.inner.to_entropy()
    }

    pub fn words(&self) -> Vec<String> {
        self.phrase().split(' ').map(String::from).collect()
    }

    pub fn word_count(&self) -> usize {
        self.inner.word_count()
    }

    pub fn phrase(&self) -> String {
        self.inner.to_string()
    }

    /// 64 byte BIP39 seed: PBKDF2-HMAC-SHA512 over the phrase, salted with
    /// `"mnemonic" + password`
    pub fn seed(&self, password: &str) -> [u8; 64] {
        self.inner.to_seed(password)
    }
}

impl FromStr for MnemonicPhrase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

// Never print the words
impl fmt::Debug for MnemonicPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MnemonicPhrase({} words)", self.word_count())
    }
}
