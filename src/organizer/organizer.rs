//! Organizer
//!
//! Owns the mnemonic and the tray for one identity. Ledger snapshots come in
//! through [`Organizer::set_account_info`] and overwrite local balances.

use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

use crate::accounts::{
    AccountCluster, AccountType, DepositAccount, Domain, ExternalAccount, IndexedAccount, Relationship,
    TimelockParams, TrayAccount,
};
use crate::error::Result;
use crate::keys::{KeyPair, MnemonicPhrase};
use crate::organizer::account_info::{AccountInfo, ManagementState};
use crate::tray::{InternalExchange, Tray};

/// What happened to each reported account during reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Balances written into local state
    pub applied: usize,
    /// Temporary accounts moved to the server's index
    pub rotated: Vec<(IndexedAccount, u32)>,
    /// Vaults that matched nothing local
    pub skipped: Vec<Pubkey>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Organizer {
    mnemonic: MnemonicPhrase,
    tray: Tray,
    account_infos: HashMap<Pubkey, AccountInfo>,
}

impl Organizer {
    pub fn new(mnemonic: MnemonicPhrase) -> Result<Self> {
        Self::with_params(mnemonic, TimelockParams::default())
    }

    pub fn with_params(mnemonic: MnemonicPhrase, params: TimelockParams) -> Result<Self> {
        let tray = Tray::with_params(&mnemonic, params)?;
        Ok(Self {
            mnemonic,
            tray,
            account_infos: HashMap::new(),
        })
    }

    pub fn mnemonic(&self) -> &MnemonicPhrase {
        &self.mnemonic
    }

    pub fn tray(&self) -> &Tray {
        &self.tray
    }

    /// Replace the tray wholesale, e.g. with one a payment was built against
    pub fn set_tray(&mut self, tray: Tray) {
        self.tray = tray;
    }

    // Balances

    pub fn slots_balance(&self) -> u64 {
        self.tray.slots_balance()
    }

    pub fn available_balance(&self) -> u64 {
        self.tray.available_balance()
    }

    pub fn available_deposit_balance(&self) -> u64 {
        self.tray.available_deposit_balance()
    }

    pub fn available_incoming_balance(&self) -> u64 {
        self.tray.available_incoming_balance()
    }

    // Accounts

    pub fn owner_key_pair(&self) -> &KeyPair {
        self.tray.owner().cluster.authority()
    }

    pub fn primary_vault(&self) -> Pubkey {
        self.tray.owner().cluster.vault_public_key()
    }

    pub fn incoming_vault(&self) -> Pubkey {
        self.tray.incoming().cluster.vault_public_key()
    }

    pub fn all_accounts(&self) -> Vec<(TrayAccount, &AccountCluster)> {
        self.tray.all_accounts()
    }

    pub fn relationship_for(&self, domain: &Domain) -> Option<&Relationship> {
        self.tray.relationships().relationship(domain)
    }

    pub fn relationships_largest_first(&self) -> Vec<&Relationship> {
        self.tray.relationships().relationships(true)
    }

    /// The locally derived cluster currently backing `account`
    pub fn cluster_for(&self, account: &AccountType) -> Option<&AccountCluster> {
        match account {
            AccountType::Tray(account) => Some(self.tray.cluster(*account)),
            AccountType::External(ExternalAccount::Relationship(domain)) => {
                self.relationship_for(domain).map(|r| &r.cluster)
            }
            AccountType::External(ExternalAccount::RemoteSend | ExternalAccount::Swap) => None,
        }
    }

    pub fn info_for(&self, account: &AccountType) -> Option<&AccountInfo> {
        let vault = self.cluster_for(account)?.vault_public_key();
        self.account_infos.get(&vault)
    }

    /// True once any reported account has left the locked state
    pub fn is_unlocked(&self) -> bool {
        self.account_infos
            .values()
            .any(|info| info.management_state != ManagementState::Locked)
    }

    pub fn has_account_infos(&self) -> bool {
        !self.account_infos.is_empty()
    }

    /// Call `f` for every reported account that has a local cluster
    pub fn map_accounts<T, F>(&self, mut f: F) -> Vec<T>
    where
        F: FnMut(&AccountCluster, &AccountInfo) -> T,
    {
        self.account_infos
            .values()
            .filter_map(|info| {
                self.cluster_for(&info.account_type)
                    .map(|cluster| f(cluster, info))
            })
            .collect()
    }

    // Reconciliation

    /// Adopt a ledger snapshot keyed by vault address.
    ///
    /// Temporary accounts whose vault doesn't match are re-derived at the
    /// reported index. Any other mismatch is logged and left alone. The
    /// snapshot is applied to a copy of the tray and only committed when
    /// every step succeeds.
    pub fn set_account_info(
        &mut self,
        account_infos: HashMap<Pubkey, AccountInfo>,
    ) -> Result<ReconcileReport> {
        let mut tray = self.tray.clone();

        let domains: Vec<Domain> = account_infos
            .values()
            .filter_map(|info| {
                info.relationship
                    .clone()
                    .or_else(|| info.account_type.relationship_domain().cloned())
            })
            .collect();
        let created = tray.create_relationships(&domains)?;
        if created > 0 {
            debug!(created, "Added relationships from account info");
        }

        let report = propagate_balances(&mut tray, &account_infos)?;

        self.tray = tray;
        self.account_infos = account_infos;
        info!(
            applied = report.applied,
            rotated = report.rotated.len(),
            skipped = report.skipped.len(),
            "Reconciled account info"
        );
        Ok(report)
    }

    // Payments

    pub fn receive(&mut self, from: DepositAccount, amount: u64) -> Result<Vec<InternalExchange>> {
        self.tray.receive(from, amount)
    }

    pub fn transfer(&mut self, amount: u64) -> Result<Vec<InternalExchange>> {
        self.tray.transfer(amount)
    }

    pub fn redistribute(&mut self) -> Result<Vec<InternalExchange>> {
        self.tray.redistribute()
    }
}

fn propagate_balances(
    tray: &mut Tray,
    account_infos: &HashMap<Pubkey, AccountInfo>,
) -> Result<ReconcileReport> {
    let mut report = ReconcileReport::default();
    let mut tray_balances: HashMap<TrayAccount, u64> = HashMap::new();
    let mut relationship_balances: Vec<(Domain, u64)> = Vec::new();

    // Sorted so repeated snapshots rotate the same way
    let mut infos: Vec<(&Pubkey, &AccountInfo)> = account_infos.iter().collect();
    infos.sort_by_key(|(vault, _)| **vault);

    for (vault, info) in infos {
        let vault = *vault;

        match &info.account_type {
            AccountType::Tray(account) => {
                if tray.cluster(*account).vault_public_key() == vault {
                    tray_balances.insert(*account, info.balance);
                    report.applied += 1;
                    continue;
                }

                let Some(indexed) = account.indexed() else {
                    error!(
                        account = %account,
                        vault = %vault,
                        "Non-indexed account doesn't match the reported vault"
                    );
                    report.skipped.push(vault);
                    continue;
                };

                warn!(account = %account, index = info.index, "Updating account index");
                tray.set_index(indexed, info.index)?;

                if tray.cluster(*account).vault_public_key() != vault {
                    error!(
                        account = %account,
                        index = info.index,
                        vault = %vault,
                        "Indexed account mismatch after re-deriving"
                    );
                    report.skipped.push(vault);
                    continue;
                }

                tray_balances.insert(*account, info.balance);
                report.rotated.push((indexed, info.index));
                report.applied += 1;
            }
            AccountType::External(ExternalAccount::Relationship(domain)) => {
                let matches = tray
                    .relationships()
                    .relationship(domain)
                    .is_some_and(|r| r.cluster.vault_public_key() == vault);

                if matches {
                    relationship_balances.push((domain.clone(), info.balance));
                    report.applied += 1;
                } else {
                    error!(domain = %domain, vault = %vault, "Relationship doesn't match the reported vault");
                    report.skipped.push(vault);
                }
            }
            AccountType::External(account) => {
                debug!(account = %account, vault = %vault, "Not tracked by the tray");
                report.skipped.push(vault);
            }
        }
    }

    tray.set_balances(&tray_balances)?;
    for (domain, balance) in relationship_balances {
        tray.relationships_mut().set_balance(&domain, balance);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::SlotType;
    use crate::error::Error;
    use std::str::FromStr;
    use std::sync::OnceLock;

    fn organizer() -> Organizer {
        static ORGANIZER: OnceLock<Organizer> = OnceLock::new();
        ORGANIZER
            .get_or_init(|| {
                let mnemonic = MnemonicPhrase::new(
                    "couple divorce usage surprise before range feature source bubble chunk spot away",
                )
                .unwrap();
                Organizer::new(mnemonic).unwrap()
            })
            .clone()
    }

    fn bucket_balance(slot: SlotType) -> u64 {
        match slot {
            SlotType::Bucket1 => 4,
            SlotType::Bucket10 => 30,
            SlotType::Bucket100 => 500,
            SlotType::Bucket1k => 7_000,
            SlotType::Bucket10k => 20_000,
            SlotType::Bucket100k => 100_000,
            SlotType::Bucket1m => 6_000_000,
        }
    }

    /// Snapshot matching every local account, buckets funded
    fn snapshot(organizer: &Organizer) -> HashMap<Pubkey, AccountInfo> {
        organizer
            .all_accounts()
            .into_iter()
            .map(|(account, cluster)| {
                let balance = match account {
                    TrayAccount::Bucket(slot) => bucket_balance(slot),
                    _ => 0,
                };
                let vault = cluster.vault_public_key();
                (
                    vault,
                    AccountInfo::new(cluster.index(), account.into(), vault, balance),
                )
            })
            .collect()
    }

    fn pubkey(s: &str) -> Pubkey {
        Pubkey::from_str(s).unwrap()
    }

    #[test]
    fn test_fresh_organizer() {
        let organizer = organizer();
        assert!(!organizer.has_account_infos());
        assert!(!organizer.is_unlocked());
        assert_eq!(organizer.available_balance(), 0);
        assert_eq!(
            organizer.owner_key_pair().public_key().to_string(),
            "769viUZ9uFWmTrY5q2xQ7cBnhgxWw56N3Y8RE48EQxh4"
        );
        assert_eq!(
            organizer.primary_vault().to_string(),
            "ApHaQqxfeJacD2k2qVprjqGsbk6yRcEQ4Q78wMJhgMbX"
        );
        assert_eq!(
            organizer.incoming_vault().to_string(),
            "GuNGMBpA1rkZrSEHjBtMAJo4xZVwFpoKAXhGMpgHZQ97"
        );
    }

    #[test]
    fn test_reconcile_full_snapshot() {
        let mut organizer = organizer();
        let infos = snapshot(&organizer);

        let report = organizer.set_account_info(infos).unwrap();

        assert_eq!(report.applied, 10);
        assert!(report.rotated.is_empty());
        assert!(report.is_clean());
        assert_eq!(organizer.slots_balance(), 6_127_534);
        assert_eq!(organizer.available_balance(), 6_127_534);
        assert!(organizer.has_account_infos());
        assert!(!organizer.is_unlocked());
        assert_eq!(organizer.map_accounts(|_, info| info.balance).len(), 10);

        let info = organizer
            .info_for(&AccountType::bucket(SlotType::Bucket1k))
            .unwrap();
        assert_eq!(info.balance, 7_000);
    }

    #[test]
    fn test_reconcile_overwrites_local_balances() {
        let mut organizer = organizer();
        organizer.set_account_info(snapshot(&organizer)).unwrap();
        organizer.transfer(9_000).unwrap();
        assert_eq!(organizer.slots_balance(), 6_118_534);

        organizer.set_account_info(snapshot(&organizer)).unwrap();
        assert_eq!(organizer.slots_balance(), 6_127_534);
    }

    #[test]
    fn test_reconcile_rotates_incoming() {
        let mut organizer = organizer();
        let vault = pubkey("5hDSftbbRbz1YKVQduSuLzbPepVnXkrVLZ5GyNzDzXh");
        let infos = HashMap::from([(vault, AccountInfo::new(1, AccountType::INCOMING, vault, 50))]);

        let report = organizer.set_account_info(infos).unwrap();

        assert_eq!(report.rotated, vec![(IndexedAccount::Incoming, 1)]);
        assert_eq!(report.applied, 1);
        assert_eq!(organizer.incoming_vault(), vault);
        assert_eq!(organizer.tray().incoming().cluster.index(), 1);
        assert_eq!(organizer.available_incoming_balance(), 50);
    }

    #[test]
    fn test_reconcile_rotates_outgoing() {
        let mut organizer = organizer();
        let vault = pubkey("GZwb12crAtN7bJXa3A56FCTBCY5CjqMFSS2THdDMbSWG");
        let infos = HashMap::from([(vault, AccountInfo::new(5, AccountType::OUTGOING, vault, 0))]);

        let report = organizer.set_account_info(infos).unwrap();
        assert_eq!(report.rotated, vec![(IndexedAccount::Outgoing, 5)]);
        assert_eq!(organizer.tray().outgoing().cluster.index(), 5);
    }

    #[test]
    fn test_reconcile_unresolved_indexed_mismatch() {
        let mut organizer = organizer();
        let vault = Pubkey::new_unique();
        let infos = HashMap::from([(vault, AccountInfo::new(3, AccountType::INCOMING, vault, 50))]);

        let report = organizer.set_account_info(infos).unwrap();

        assert_eq!(report.skipped, vec![vault]);
        assert_eq!(report.applied, 0);
        assert_eq!(organizer.available_incoming_balance(), 0);
    }

    #[test]
    fn test_reconcile_non_indexed_mismatch() {
        let mut organizer = organizer();
        let mut infos = snapshot(&organizer);
        let bogus = Pubkey::new_unique();
        infos.retain(|_, info| info.account_type != AccountType::PRIMARY);
        infos.insert(bogus, AccountInfo::new(0, AccountType::PRIMARY, bogus, 1_000));

        let report = organizer.set_account_info(infos).unwrap();

        assert_eq!(report.skipped, vec![bogus]);
        assert_eq!(report.applied, 9);
        assert_eq!(organizer.available_deposit_balance(), 0);
        assert_eq!(organizer.primary_vault().to_string(), "ApHaQqxfeJacD2k2qVprjqGsbk6yRcEQ4Q78wMJhgMbX");
    }

    #[test]
    fn test_reconcile_failure_keeps_previous_state() {
        let mut organizer = organizer();
        organizer.set_account_info(snapshot(&organizer)).unwrap();
        let previous_infos = organizer.map_accounts(|_, info| info.balance).len();

        let mut infos = snapshot(&organizer);
        let million = organizer.tray().slot(SlotType::Bucket1m).cluster.vault_public_key();
        if let Some(info) = infos.get_mut(&million) {
            info.balance = u64::MAX;
        }
        let incoming = pubkey("5hDSftbbRbz1YKVQduSuLzbPepVnXkrVLZ5GyNzDzXh");
        infos.retain(|_, info| info.account_type != AccountType::INCOMING);
        infos.insert(incoming, AccountInfo::new(1, AccountType::INCOMING, incoming, 50));

        assert!(matches!(
            organizer.set_account_info(infos),
            Err(Error::BalanceOverflow(_))
        ));

        // Neither the rotation nor the new infos were committed
        assert_eq!(organizer.tray().incoming().cluster.index(), 0);
        assert_eq!(
            organizer.incoming_vault().to_string(),
            "GuNGMBpA1rkZrSEHjBtMAJo4xZVwFpoKAXhGMpgHZQ97"
        );
        assert_eq!(organizer.slots_balance(), 6_127_534);
        assert_eq!(organizer.map_accounts(|_, info| info.balance).len(), previous_infos);
        assert_eq!(
            organizer
                .info_for(&AccountType::bucket(SlotType::Bucket1m))
                .unwrap()
                .balance,
            6_000_000
        );
    }

    #[test]
    fn test_reconcile_relationships() {
        let mut organizer = organizer();
        let getcode = Domain::new("getcode.com").unwrap();
        let example = Domain::new("example.com").unwrap();
        let getcode_vault = pubkey("2VtpWNr7EiC1oHhFfNMb6gh2Qy7gz3Xp3VFZe3K8FRvW");
        let example_vault = pubkey("EyR1sG39horg7gokLD7PrYR7YVx41bJsF21XnVnm24Fg");

        let infos = HashMap::from([
            (
                getcode_vault,
                AccountInfo::new(0, AccountType::relationship(getcode.clone()), getcode_vault, 77),
            ),
            (
                example_vault,
                AccountInfo::new(0, AccountType::relationship(example.clone()), example_vault, 300),
            ),
        ]);

        let report = organizer.set_account_info(infos).unwrap();

        assert_eq!(report.applied, 2);
        assert_eq!(organizer.relationship_for(&getcode).unwrap().partial_balance, 77);
        let order: Vec<&str> = organizer
            .relationships_largest_first()
            .iter()
            .map(|r| r.domain.as_str())
            .collect();
        assert_eq!(order, vec!["example.com", "getcode.com"]);
        assert_eq!(
            organizer
                .info_for(&AccountType::relationship(getcode))
                .unwrap()
                .balance,
            77
        );
        // Relationship funds sit outside the tray
        assert_eq!(organizer.available_balance(), 0);
    }

    #[test]
    fn test_reconcile_untracked_accounts() {
        let mut organizer = organizer();
        let vault = Pubkey::new_unique();
        let infos = HashMap::from([(
            vault,
            AccountInfo::new(0, ExternalAccount::RemoteSend.into(), vault, 10),
        )]);

        let report = organizer.set_account_info(infos).unwrap();
        assert_eq!(report.skipped, vec![vault]);
        assert!(organizer.has_account_infos());
        assert!(organizer
            .info_for(&AccountType::External(ExternalAccount::RemoteSend))
            .is_none());
    }

    #[test]
    fn test_is_unlocked() {
        let mut organizer = organizer();
        let mut infos = snapshot(&organizer);
        organizer.set_account_info(infos.clone()).unwrap();
        assert!(!organizer.is_unlocked());

        let primary = organizer.primary_vault();
        if let Some(info) = infos.get_mut(&primary) {
            info.management_state = ManagementState::Unlocked;
        }
        organizer.set_account_info(infos).unwrap();
        assert!(organizer.is_unlocked());
    }

    #[test]
    fn test_payments_pass_through() {
        let mut organizer = organizer();
        let mut infos = snapshot(&organizer);
        let primary = organizer.primary_vault();
        if let Some(info) = infos.get_mut(&primary) {
            info.balance = 1_234;
        }
        organizer.set_account_info(infos).unwrap();

        let exchanges = organizer.receive(DepositAccount::Primary, 1_234).unwrap();
        assert_eq!(exchanges.len(), 4);
        assert_eq!(organizer.slots_balance(), 6_128_768);

        organizer.redistribute().unwrap();
        assert_eq!(organizer.slots_balance(), 6_128_768);

        assert_eq!(
            organizer.transfer(10_000_000).unwrap_err(),
            Error::InsufficientTrayBalance {
                available: 6_128_768,
                required: 10_000_000
            }
        );
    }

    #[test]
    fn test_set_tray() {
        let mut organizer = organizer();
        let mut tray = organizer.tray().clone();
        tray.set_balances(&HashMap::from([(TrayAccount::Bucket(SlotType::Bucket10), 90)])).unwrap();
        organizer.set_tray(tray);
        assert_eq!(organizer.slots_balance(), 90);
    }
}
