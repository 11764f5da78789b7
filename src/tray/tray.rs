//! The tray: denomination slots plus the primary and temporary accounts
//!
//! Every mutating operation returns the list of [`InternalExchange`]s it
//! applied. The transaction layer turns each one into a transfer
//! instruction. Value is only ever moved between accounts, never created.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::accounts::{
    AccountCluster, DepositAccount, Domain, IndexedAccount, Relationship, RelationshipBox, SlotType,
    TimelockParams, TrayAccount,
};
use crate::error::{Error, Result};
use crate::keys::{self, MnemonicPhrase};
use crate::tray::exchange::{
    normalize, normalize_largest, DynamicStep, InternalExchange, MAX_BILLS_PER_EXCHANGE,
};
use crate::tray::slot::{PartialAccount, Slot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tray {
    slots: Vec<Slot>,
    owner: PartialAccount,
    incoming: PartialAccount,
    outgoing: PartialAccount,
    relationships: RelationshipBox,
    mnemonic: MnemonicPhrase,
    params: TimelockParams,
    max_bills: u64,
}

impl Tray {
    pub fn new(mnemonic: &MnemonicPhrase) -> Result<Self> {
        Self::with_params(mnemonic, TimelockParams::default())
    }

    pub fn with_params(mnemonic: &MnemonicPhrase, params: TimelockParams) -> Result<Self> {
        let seed = mnemonic.seed("");
        let cluster = |index: u32, account: TrayAccount| -> Result<AccountCluster> {
            let (authority, _) = keys::derive(&account.derivation_path(index), &seed)?;
            AccountCluster::with_params(index, authority, &params)
        };

        let slots = SlotType::ALL
            .iter()
            .map(|slot_type| {
                cluster(0, TrayAccount::Bucket(*slot_type)).map(|c| Slot::new(*slot_type, c))
            })
            .collect::<Result<Vec<_>>>()?;

        let owner = PartialAccount::new(cluster(0, TrayAccount::Primary)?);
        let incoming = PartialAccount::new(cluster(0, TrayAccount::Incoming)?);
        let outgoing = PartialAccount::new(cluster(0, TrayAccount::Outgoing)?);

        Ok(Self {
            slots,
            owner,
            incoming,
            outgoing,
            relationships: RelationshipBox::new(),
            mnemonic: mnemonic.clone(),
            params,
            max_bills: MAX_BILLS_PER_EXCHANGE,
        })
    }

    /// Cap the bills moved by one exchange
    pub fn with_max_bills(mut self, max_bills: u64) -> Result<Self> {
        if !(1..=MAX_BILLS_PER_EXCHANGE).contains(&max_bills) {
            return Err(Error::Config(format!(
                "max bills per exchange must be 1 to {}, got {}",
                MAX_BILLS_PER_EXCHANGE, max_bills
            )));
        }
        self.max_bills = max_bills;
        Ok(self)
    }

    // Balances

    // The combined balance of every account fits in a u64. `set_balances`
    // and `increment` reject writes that would break that, so these sums
    // never overflow.

    pub fn slots_balance(&self) -> u64 {
        self.slots
            .iter()
            .fold(0, |total, s| total.saturating_add(s.partial_balance))
    }

    pub fn available_balance(&self) -> u64 {
        self.slots_balance()
            .saturating_add(self.available_deposit_balance())
            .saturating_add(self.available_incoming_balance())
    }

    pub fn available_deposit_balance(&self) -> u64 {
        self.owner.partial_balance
    }

    pub fn available_incoming_balance(&self) -> u64 {
        self.incoming.partial_balance
    }

    /// Slot balance that does not add up to a whole bill
    pub fn dust(&self) -> u64 {
        self.slots.iter().map(|s| s.remainder()).sum()
    }

    pub fn partial_balance(&self, account: TrayAccount) -> u64 {
        match account {
            TrayAccount::Primary => self.owner.partial_balance,
            TrayAccount::Incoming => self.incoming.partial_balance,
            TrayAccount::Outgoing => self.outgoing.partial_balance,
            TrayAccount::Bucket(slot_type) => self.slot(slot_type).partial_balance,
        }
    }

    /// Overwrite balances for every account present in `balances`.
    ///
    /// Fails without changing anything when the resulting total would not
    /// fit in a u64.
    pub fn set_balances(&mut self, balances: &HashMap<TrayAccount, u64>) -> Result<()> {
        let mut updated = self.clone();
        for (account, balance) in balances {
            *updated.balance_mut(*account) = *balance;
        }
        if updated.total_balance().is_none() {
            return Err(Error::BalanceOverflow(format!(
                "reported balances sum past {}",
                u64::MAX
            )));
        }
        *self = updated;
        Ok(())
    }

    pub fn increment(&mut self, account: TrayAccount, amount: u64) -> Result<()> {
        let overflow =
            || Error::BalanceOverflow(format!("{} cannot take another {}", account, amount));
        self.total_balance()
            .and_then(|total| total.checked_add(amount))
            .ok_or_else(overflow)?;

        let balance = self.balance_mut(account);
        let current = *balance;
        *balance = current.checked_add(amount).ok_or_else(overflow)?;
        Ok(())
    }

    pub fn decrement(&mut self, account: TrayAccount, amount: u64) -> Result<()> {
        let balance = self.balance_mut(account);
        let current = *balance;
        *balance = current.checked_sub(amount).ok_or_else(|| {
            Error::InvalidSlotBalance(format!(
                "{} holds {}, cannot remove {}",
                account, current, amount
            ))
        })?;
        Ok(())
    }

    /// Sum over every tray account, `None` on overflow
    fn total_balance(&self) -> Option<u64> {
        self.slots
            .iter()
            .map(|s| s.partial_balance)
            .chain([
                self.owner.partial_balance,
                self.incoming.partial_balance,
                self.outgoing.partial_balance,
            ])
            .try_fold(0u64, |total, balance| total.checked_add(balance))
    }

    fn balance_mut(&mut self, account: TrayAccount) -> &mut u64 {
        match account {
            TrayAccount::Primary => &mut self.owner.partial_balance,
            TrayAccount::Incoming => &mut self.incoming.partial_balance,
            TrayAccount::Outgoing => &mut self.outgoing.partial_balance,
            TrayAccount::Bucket(slot_type) => &mut self.slots[slot_type.index()].partial_balance,
        }
    }

    fn move_amount(&mut self, from: TrayAccount, to: TrayAccount, amount: u64) -> Result<()> {
        self.decrement(from, amount)?;
        self.increment(to, amount)
    }

    // Accounts

    pub fn mnemonic(&self) -> &MnemonicPhrase {
        &self.mnemonic
    }

    pub fn params(&self) -> &TimelockParams {
        &self.params
    }

    pub fn owner(&self) -> &PartialAccount {
        &self.owner
    }

    pub fn incoming(&self) -> &PartialAccount {
        &self.incoming
    }

    pub fn outgoing(&self) -> &PartialAccount {
        &self.outgoing
    }

    pub fn cluster(&self, account: TrayAccount) -> &AccountCluster {
        match account {
            TrayAccount::Primary => &self.owner.cluster,
            TrayAccount::Incoming => &self.incoming.cluster,
            TrayAccount::Outgoing => &self.outgoing.cluster,
            TrayAccount::Bucket(slot_type) => &self.slot(slot_type).cluster,
        }
    }

    /// Primary, incoming, outgoing, then slots smallest first
    pub fn all_accounts(&self) -> Vec<(TrayAccount, &AccountCluster)> {
        let mut accounts = vec![
            (TrayAccount::Primary, &self.owner.cluster),
            (TrayAccount::Incoming, &self.incoming.cluster),
            (TrayAccount::Outgoing, &self.outgoing.cluster),
        ];
        accounts.extend(
            self.slots
                .iter()
                .map(|s| (TrayAccount::Bucket(s.slot_type), &s.cluster)),
        );
        accounts
    }

    /// Re-derive a temporary account at `index`. The new account starts empty.
    pub fn set_index(&mut self, account: IndexedAccount, index: u32) -> Result<()> {
        let path = account.derivation_path(index);
        let cluster = AccountCluster::derive(index, &path, &self.mnemonic, &self.params)?;
        match account {
            IndexedAccount::Incoming => self.incoming = PartialAccount::new(cluster),
            IndexedAccount::Outgoing => self.outgoing = PartialAccount::new(cluster),
        }
        Ok(())
    }

    pub fn increment_incoming(&mut self) -> Result<()> {
        let next = next_index(self.incoming.cluster.index())?;
        self.set_index(IndexedAccount::Incoming, next)
    }

    pub fn increment_outgoing(&mut self) -> Result<()> {
        let next = next_index(self.outgoing.cluster.index())?;
        self.set_index(IndexedAccount::Outgoing, next)
    }

    // Relationships

    pub fn relationships(&self) -> &RelationshipBox {
        &self.relationships
    }

    pub fn relationships_mut(&mut self) -> &mut RelationshipBox {
        &mut self.relationships
    }

    /// Derive relationships for any domains not seen before. Returns how many were added.
    pub fn create_relationships<'a, I>(&mut self, domains: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a Domain>,
    {
        let mut created = 0;
        for domain in domains {
            if self.relationships.contains(domain) {
                continue;
            }
            let relationship = Relationship::new(domain.clone(), &self.mnemonic, &self.params)?;
            debug!(domain = %domain, "Created relationship");
            self.relationships.insert(relationship);
            created += 1;
        }
        Ok(created)
    }

    // Slots

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, slot_type: SlotType) -> &Slot {
        &self.slots[slot_type.index()]
    }

    pub fn slot_down(&self, slot_type: SlotType) -> Option<&Slot> {
        slot_type
            .index()
            .checked_sub(1)
            .and_then(|i| self.slots.get(i))
    }

    pub fn slot_up(&self, slot_type: SlotType) -> Option<&Slot> {
        self.slots.get(slot_type.index() + 1)
    }

    // Redistribute

    /// Remove gaps between consecutive slots and trim oversized ones.
    ///
    /// Large bills are first broken down one at a time until each smaller
    /// slot can make change for the slot above it. Surplus small bills are
    /// then exchanged upwards. For example `[1, 0, 10, 10, 0, 0, 0]` bills
    /// (11,001 total) become `[11, 9, 9, 10, 0, 0, 0]`.
    pub fn redistribute(&mut self) -> Result<Vec<InternalExchange>> {
        let mut exchanges = self.exchange_large_to_small()?;
        exchanges.extend(self.exchange_small_to_large()?);
        debug!(exchanges = exchanges.len(), "Redistributed tray");
        Ok(exchanges)
    }

    /// Break one bill into the slot below whenever that slot holds fewer
    /// than `fit - 1` bills, then rescan.
    pub fn exchange_large_to_small(&mut self) -> Result<Vec<InternalExchange>> {
        let mut exchanges = Vec::new();

        for i in (0..self.slots.len()).rev() {
            if i == 0 {
                break;
            }

            let current = &self.slots[i];
            let smaller = &self.slots[i - 1];

            if current.bill_count() == 0 {
                continue;
            }

            let how_many_fit = current.bill_value() / smaller.bill_value();
            if smaller.bill_count() >= how_many_fit - 1 {
                continue;
            }

            let from = TrayAccount::Bucket(current.slot_type);
            let to = TrayAccount::Bucket(smaller.slot_type);
            let amount = current.bill_value();

            self.move_amount(from, to, amount)?;
            exchanges.push(InternalExchange::new(from, to, amount));

            exchanges.extend(self.exchange_large_to_small()?);
        }

        Ok(exchanges)
    }

    /// Move surplus bills up once a slot holds at least `2 * fit - 1`,
    /// leaving `fit - 1` behind, then rescan.
    pub fn exchange_small_to_large(&mut self) -> Result<Vec<InternalExchange>> {
        let mut exchanges = Vec::new();

        for i in 0..self.slots.len() {
            let Some(larger) = self.slots.get(i + 1) else {
                break;
            };
            let current = &self.slots[i];

            let how_many_fit = larger.bill_value() / current.bill_value();
            let how_many_we_have = current.bill_count();
            let how_many_to_leave = (how_many_fit - 1).min(how_many_we_have);

            if how_many_we_have < how_many_fit * 2 - 1 {
                continue;
            }

            let how_many_to_exchange =
                (how_many_we_have - how_many_to_leave) / how_many_fit * how_many_fit;
            let amount = how_many_to_exchange * current.bill_value();

            let from = TrayAccount::Bucket(current.slot_type);
            let to = TrayAccount::Bucket(larger.slot_type);

            self.move_amount(from, to, amount)?;
            exchanges.extend(
                normalize_largest(amount, self.max_bills)
                    .into_iter()
                    .map(|chunk| InternalExchange::new(from, to, chunk)),
            );

            exchanges.extend(self.exchange_small_to_large()?);
        }

        Ok(exchanges)
    }

    // Receive

    /// Move `amount` from `from` into the slots, largest denomination first
    pub fn receive(&mut self, from: DepositAccount, amount: u64) -> Result<Vec<InternalExchange>> {
        let from = TrayAccount::from(from);
        let available = self.partial_balance(from);
        if available < amount {
            return Err(Error::InvalidSlotBalance(format!(
                "{} holds {}, cannot receive {}",
                from, available, amount
            )));
        }

        let snapshot = self.clone();
        let result = self.receive_into_slots(from, amount);
        if result.is_err() {
            *self = snapshot;
        }
        result
    }

    fn receive_into_slots(&mut self, from: TrayAccount, amount: u64) -> Result<Vec<InternalExchange>> {
        let mut exchanges = Vec::new();
        let mut remaining = amount;

        for i in (0..self.slots.len()).rev() {
            let slot_type = self.slots[i].slot_type;
            let bill_value = slot_type.bill_value();

            let how_many_fit = remaining / bill_value;
            if how_many_fit == 0 {
                continue;
            }

            let deposit = how_many_fit * bill_value;
            let to = TrayAccount::Bucket(slot_type);

            exchanges.extend(
                normalize(slot_type, deposit, self.max_bills)
                    .into_iter()
                    .map(|chunk| InternalExchange::new(from, to, chunk)),
            );
            self.move_amount(from, to, deposit)?;

            remaining -= deposit;
        }

        Ok(exchanges)
    }

    // Transfer

    /// Move `amount` from the slots into the outgoing account.
    ///
    /// Tries paying with the bills already in the slots. If that can't hit
    /// the exact amount, the tray is restored and the dynamic strategy
    /// breaks a larger bill down to make change. On failure the tray is
    /// left as it was.
    pub fn transfer(&mut self, amount: u64) -> Result<Vec<InternalExchange>> {
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }

        let available = self.slots_balance();
        if available < amount {
            return Err(Error::InsufficientTrayBalance {
                available,
                required: amount,
            });
        }

        let snapshot = self.clone();

        match self.withdraw_naively(amount) {
            Ok(exchanges) => Ok(exchanges),
            Err(e) => {
                debug!(amount, error = %e, "Naive withdrawal failed, trying dynamic strategy");
                *self = snapshot.clone();

                match self.withdraw_dynamically(amount) {
                    Ok(exchanges) => Ok(exchanges),
                    Err(e) => {
                        warn!(amount, error = %e, "Dynamic withdrawal failed");
                        *self = snapshot;
                        Err(e)
                    }
                }
            }
        }
    }

    /// Pay from largest to smallest using only bills already present
    pub fn withdraw_naively(&mut self, amount: u64) -> Result<Vec<InternalExchange>> {
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }

        let mut exchanges = Vec::new();
        let mut remaining = amount;

        for i in (0..self.slots.len()).rev() {
            let slot = &self.slots[i];
            if slot.partial_balance == 0 {
                continue;
            }

            let how_many_fit = remaining / slot.bill_value();
            let send = how_many_fit.min(slot.bill_count()) * slot.bill_value();
            if send == 0 {
                continue;
            }

            let slot_type = slot.slot_type;
            exchanges.extend(self.send_to_outgoing(slot_type, send)?);
            remaining -= send;
        }

        if remaining > 0 {
            return Err(Error::InvalidSlotBalance(format!(
                "{} left unpaid by available bills",
                remaining
            )));
        }

        Ok(exchanges)
    }

    pub fn withdraw_dynamically(&mut self, amount: u64) -> Result<Vec<InternalExchange>> {
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }

        let available = self.slots_balance();
        if available < amount {
            return Err(Error::InsufficientTrayBalance {
                available,
                required: amount,
            });
        }

        let step = self.withdraw_dynamically_step1(amount)?;
        let exchanges = self.withdraw_dynamically_step2(&step)?;

        let mut all = step.exchanges;
        all.extend(exchanges);
        Ok(all)
    }

    /// Drain slots smallest first while each bill fits in what is left.
    /// Returns the first non-empty slot larger than the remainder.
    pub fn withdraw_dynamically_step1(&mut self, amount: u64) -> Result<DynamicStep> {
        let mut exchanges = Vec::new();
        let mut remaining = amount;

        for i in 0..self.slots.len() {
            let slot = &self.slots[i];
            if slot.partial_balance == 0 {
                continue;
            }

            if remaining == 0 || remaining < slot.bill_value() {
                break;
            }

            let how_many_fit = remaining / slot.bill_value();
            let send = how_many_fit.min(slot.bill_count()) * slot.bill_value();
            if send > 0 {
                let slot_type = slot.slot_type;
                exchanges.extend(self.send_to_outgoing(slot_type, send)?);
                remaining -= send;
            }
        }

        let index = self
            .slots
            .iter()
            .position(|s| s.bill_value() > remaining && s.bill_count() > 0);

        if index.is_none() && remaining > 0 {
            return Err(Error::InvalidStepIndex(remaining));
        }

        Ok(DynamicStep {
            remaining,
            // Index 0 is a no-op in step 2
            index: index.unwrap_or(0),
            exchanges,
        })
    }

    /// Break one bill at `step.index` all the way down, paying what fits
    /// at each level on the way
    pub fn withdraw_dynamically_step2(&mut self, step: &DynamicStep) -> Result<Vec<InternalExchange>> {
        if step.index == 0 || step.index >= self.slots.len() || step.remaining == 0 {
            return Ok(Vec::new());
        }

        let mut exchanges = Vec::new();
        let mut remaining = step.remaining;

        if self.slots[step.index].bill_count() < 1 {
            return Err(Error::SlotAtIndexEmpty(step.index));
        }

        exchanges.push(self.split_down(step.index)?);

        for i in (0..step.index).rev() {
            if i > 0 {
                exchanges.push(self.split_down(i)?);
            }

            let slot = &self.slots[i];
            let how_many_fit = remaining / slot.bill_value();
            if how_many_fit == 0 {
                continue;
            }

            if slot.bill_count() < how_many_fit {
                return Err(Error::InvalidSlotBalance(format!(
                    "slot {} holds {} bills, needs {}",
                    slot.slot_type,
                    slot.bill_count(),
                    how_many_fit
                )));
            }

            let send = how_many_fit * slot.bill_value();
            let from = TrayAccount::Bucket(slot.slot_type);
            self.move_amount(from, TrayAccount::Outgoing, send)?;
            exchanges.push(InternalExchange::new(from, TrayAccount::Outgoing, send));
            remaining -= send;
        }

        Ok(exchanges)
    }

    /// Exchange one bill of slot `index` into the slot below it
    fn split_down(&mut self, index: usize) -> Result<InternalExchange> {
        let from = TrayAccount::Bucket(self.slots[index].slot_type);
        let to = TrayAccount::Bucket(self.slots[index - 1].slot_type);
        let amount = self.slots[index].bill_value();
        self.move_amount(from, to, amount)?;
        Ok(InternalExchange::new(from, to, amount))
    }

    fn send_to_outgoing(&mut self, slot_type: SlotType, amount: u64) -> Result<Vec<InternalExchange>> {
        let from = TrayAccount::Bucket(slot_type);
        let exchanges = normalize(slot_type, amount, self.max_bills)
            .into_iter()
            .map(|chunk| InternalExchange::new(from, TrayAccount::Outgoing, chunk))
            .collect();
        self.move_amount(from, TrayAccount::Outgoing, amount)?;
        Ok(exchanges)
    }

    // Reporting

    /// One line per account: label, vault address, balance
    pub fn reportable_representation(&self) -> Vec<String> {
        let mut lines = vec![
            report_line("Primary", &self.owner.cluster, self.owner.partial_balance),
            report_line("Incoming", &self.incoming.cluster, self.incoming.partial_balance),
            report_line("Outgoing", &self.outgoing.cluster, self.outgoing.partial_balance),
        ];
        lines.extend(
            self.slots
                .iter()
                .map(|s| report_line(&s.slot_type.to_string(), &s.cluster, s.partial_balance)),
        );
        lines
    }
}

fn next_index(index: u32) -> Result<u32> {
    index
        .checked_add(1)
        .filter(|next| *next < keys::derive::HARDENED_OFFSET)
        .ok_or_else(|| Error::Derivation(format!("account index exhausted at {}", index)))
}

fn report_line(label: &str, cluster: &AccountCluster, balance: u64) -> String {
    format!(
        "{:<8} {:<44} {}",
        label,
        cluster.vault_public_key().to_string(),
        balance
    )
}
