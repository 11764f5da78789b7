//! Per-domain relationship accounts

use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;

use crate::accounts::cluster::AccountCluster;
use crate::accounts::domain::Domain;
use crate::accounts::timelock::TimelockParams;
use crate::error::Result;
use crate::keys::{DerivationPath, MnemonicPhrase};

/// An account derived for one domain, salted with the domain name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub domain: Domain,
    pub cluster: AccountCluster,
    pub partial_balance: u64,
}

impl Relationship {
    pub fn new(domain: Domain, mnemonic: &MnemonicPhrase, params: &TimelockParams) -> Result<Self> {
        let path = DerivationPath::relationship(domain.as_str());
        let cluster = AccountCluster::derive(0, &path, mnemonic, params)?;
        Ok(Self {
            domain,
            cluster,
            partial_balance: 0,
        })
    }
}

/// Relationships indexed by domain and by vault address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipBox {
    by_domain: HashMap<Domain, Relationship>,
    by_vault: HashMap<Pubkey, Domain>,
}

impl RelationshipBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the relationship for its domain
    pub fn insert(&mut self, relationship: Relationship) {
        if let Some(previous) = self.by_domain.get(&relationship.domain) {
            self.by_vault.remove(&previous.cluster.vault_public_key());
        }
        self.by_vault.insert(
            relationship.cluster.vault_public_key(),
            relationship.domain.clone(),
        );
        self.by_domain.insert(relationship.domain.clone(), relationship);
    }

    pub fn contains(&self, domain: &Domain) -> bool {
        self.by_domain.contains_key(domain)
    }

    pub fn relationship(&self, domain: &Domain) -> Option<&Relationship> {
        self.by_domain.get(domain)
    }

    pub fn relationship_for_vault(&self, vault: &Pubkey) -> Option<&Relationship> {
        self.by_vault
            .get(vault)
            .and_then(|domain| self.by_domain.get(domain))
    }

    /// Returns false when the domain is unknown
    pub fn set_balance(&mut self, domain: &Domain, balance: u64) -> bool {
        match self.by_domain.get_mut(domain) {
            Some(relationship) => {
                relationship.partial_balance = balance;
                true
            }
            None => false,
        }
    }

    /// Sorted by balance, ties broken by domain
    pub fn relationships(&self, largest_first: bool) -> Vec<&Relationship> {
        let mut all: Vec<&Relationship> = self.by_domain.values().collect();
        all.sort_by(|a, b| {
            a.partial_balance
                .cmp(&b.partial_balance)
                .then_with(|| b.domain.cmp(&a.domain))
        });
        if largest_first {
            all.reverse();
        }
        all
    }

    pub fn balance(&self) -> u64 {
        self.by_domain
            .values()
            .fold(0u64, |sum, r| sum.saturating_add(r.partial_balance))
    }

    pub fn len(&self) -> usize {
        self.by_domain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_domain.is_empty()
    }
}
