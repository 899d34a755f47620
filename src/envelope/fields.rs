//! Domain wrappers pairing each entity type with its sensitive fields
//!
//! Each wrapper copies the record, runs the generic field helpers over the
//! designated fields and leaves everything else untouched. With encryption
//! disabled every wrapper is the identity function, so the rest of the
//! application reads and writes domain objects without knowing whether
//! encryption is active.

use crate::error::SealResult;
use crate::models::{BankAccount, Bill, Counterparty, Transaction};

use super::service::EnvelopeService;

impl EnvelopeService {
    /// Encrypt the sensitive fields of a transaction
    pub fn encrypt_transaction_fields(&self, tx: &Transaction) -> SealResult<Transaction> {
        Ok(Transaction {
            description: self.encrypt_field(tx.description.as_deref())?,
            notes: self.encrypt_field(tx.notes.as_deref())?,
            ..tx.clone()
        })
    }

    /// Decrypt the sensitive fields of a transaction
    pub fn decrypt_transaction_fields(&self, tx: &Transaction) -> SealResult<Transaction> {
        Ok(Transaction {
            description: self.decrypt_field(tx.description.as_deref())?,
            notes: self.decrypt_field(tx.notes.as_deref())?,
            ..tx.clone()
        })
    }

    /// Encrypt the sensitive fields of a bill
    pub fn encrypt_bill_fields(&self, bill: &Bill) -> SealResult<Bill> {
        Ok(Bill {
            description: self.encrypt_field(bill.description.as_deref())?,
            notes: self.encrypt_field(bill.notes.as_deref())?,
            ..bill.clone()
        })
    }

    /// Decrypt the sensitive fields of a bill
    pub fn decrypt_bill_fields(&self, bill: &Bill) -> SealResult<Bill> {
        Ok(Bill {
            description: self.decrypt_field(bill.description.as_deref())?,
            notes: self.decrypt_field(bill.notes.as_deref())?,
            ..bill.clone()
        })
    }

    /// Encrypt the sensitive fields of a bank account
    pub fn encrypt_bank_account_fields(&self, account: &BankAccount) -> SealResult<BankAccount> {
        Ok(BankAccount {
            account_number: self.encrypt_field(account.account_number.as_deref())?,
            notes: self.encrypt_field(account.notes.as_deref())?,
            ..account.clone()
        })
    }

    /// Decrypt the sensitive fields of a bank account
    pub fn decrypt_bank_account_fields(&self, account: &BankAccount) -> SealResult<BankAccount> {
        Ok(BankAccount {
            account_number: self.decrypt_field(account.account_number.as_deref())?,
            notes: self.decrypt_field(account.notes.as_deref())?,
            ..account.clone()
        })
    }

    /// Encrypt the sensitive fields of a counterparty
    pub fn encrypt_counterparty_fields(&self, cp: &Counterparty) -> SealResult<Counterparty> {
        Ok(Counterparty {
            notes: self.encrypt_field(cp.notes.as_deref())?,
            ..cp.clone()
        })
    }

    /// Decrypt the sensitive fields of a counterparty
    pub fn decrypt_counterparty_fields(&self, cp: &Counterparty) -> SealResult<Counterparty> {
        Ok(Counterparty {
            notes: self.decrypt_field(cp.notes.as_deref())?,
            ..cp.clone()
        })
    }
}
