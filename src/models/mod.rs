//! Domain records with encryption-designated fields
//!
//! Trimmed views of the application's domain objects, carrying only what the
//! field-encryption wrappers touch: the sensitive string fields (always
//! `Option<String>`) plus enough non-sensitive context to show that those
//! pass through untouched. Amounts follow the cents-as-integers convention.

pub mod ids;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use ids::{BankAccountId, BillId, CounterpartyId, TransactionId};

/// A financial transaction
///
/// Sensitive fields: `description`, `notes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,
    /// Transaction date
    pub date: NaiveDate,
    /// Amount in cents (negative for outflow)
    pub amount_cents: i64,
    /// What the transaction was for
    pub description: Option<String>,
    /// Free-form personal notes
    pub notes: Option<String>,
}

/// A recurring bill
///
/// Sensitive fields: `description`, `notes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    /// Unique identifier
    pub id: BillId,
    /// Amount in cents
    pub amount_cents: i64,
    /// Day of month the bill is due (1-31)
    pub due_day: u8,
    /// What the bill is for
    pub description: Option<String>,
    /// Free-form personal notes
    pub notes: Option<String>,
}

/// A bank account
///
/// Sensitive fields: `account_number`, `notes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    /// Unique identifier
    pub id: BankAccountId,
    /// Display name, not sensitive
    pub name: String,
    /// The account number at the institution
    pub account_number: Option<String>,
    /// Free-form personal notes
    pub notes: Option<String>,
}

/// A counterparty (payee or payer)
///
/// Sensitive field: `notes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counterparty {
    /// Unique identifier
    pub id: CounterpartyId,
    /// Display name, not sensitive
    pub name: String,
    /// Free-form personal notes
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_serde_round_trip() {
        let tx = Transaction {
            id: TransactionId::new(),
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            amount_cents: -4250,
            description: Some("Groceries".to_string()),
            notes: None,
        };

        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, back);
    }

    #[test]
    fn test_null_fields_serialize_as_null() {
        let cp = Counterparty {
            id: CounterpartyId::new(),
            name: "Landlord".to_string(),
            notes: None,
        };
        let json = serde_json::to_value(&cp).unwrap();
        assert!(json.get("notes").unwrap().is_null());
    }
}
