use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub i64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Debit,
    Credit,
}

impl EntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Debit => "debit",
            EntryType::Credit => "credit",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debit" => Ok(EntryType::Debit),
            "credit" => Ok(EntryType::Credit),
            other => Err(format!("Unknown entry type: '{other}'")),
        }
    }
}

/// A transaction field a pattern can inspect.
///
/// Field names outside the known set are kept as `Unknown` so that rules
/// written against a newer schema still load; they always read as empty text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionField {
    Date,
    Payee,
    Description,
    Amount,
    Currency,
    Type,
    AccountNumber,
    TransactionType,
    ArchiveId,
    Unknown(String),
}

impl TransactionField {
    pub const ALL: [TransactionField; 9] = [
        TransactionField::Date,
        TransactionField::Payee,
        TransactionField::Description,
        TransactionField::Amount,
        TransactionField::Currency,
        TransactionField::Type,
        TransactionField::AccountNumber,
        TransactionField::TransactionType,
        TransactionField::ArchiveId,
    ];

    pub fn name(&self) -> &str {
        match self {
            TransactionField::Date => "date",
            TransactionField::Payee => "payee",
            TransactionField::Description => "description",
            TransactionField::Amount => "amount",
            TransactionField::Currency => "currency",
            TransactionField::Type => "type",
            TransactionField::AccountNumber => "accountNumber",
            TransactionField::TransactionType => "transactionType",
            TransactionField::ArchiveId => "archiveId",
            TransactionField::Unknown(name) => name,
        }
    }
}

impl From<&str> for TransactionField {
    fn from(name: &str) -> Self {
        TransactionField::ALL
            .iter()
            .find(|f| f.name() == name)
            .cloned()
            .unwrap_or_else(|| TransactionField::Unknown(name.to_string()))
    }
}

impl From<String> for TransactionField {
    fn from(name: String) -> Self {
        TransactionField::from(name.as_str())
    }
}

impl From<TransactionField> for String {
    fn from(field: TransactionField) -> Self {
        field.name().to_string()
    }
}

impl fmt::Display for TransactionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default)]
    pub id: Option<TransactionId>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub payee: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amount: Money,
    #[serde(default)]
    pub currency: String,
    #[serde(default, rename = "type")]
    pub entry_type: Option<EntryType>,
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub transaction_type: String,
    #[serde(default)]
    pub archive_id: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub category_confidence: Option<u8>,
    #[serde(default)]
    pub manually_edited: bool,
    #[serde(default)]
    pub ignored: Option<bool>,
}

impl Transaction {
    pub fn new(payee: &str, description: &str, amount: Money) -> Self {
        Transaction {
            id: None,
            date: None,
            payee: payee.to_string(),
            description: description.to_string(),
            amount,
            currency: String::new(),
            entry_type: None,
            account_number: String::new(),
            transaction_type: String::new(),
            archive_id: String::new(),
            category: None,
            category_confidence: None,
            manually_edited: false,
            ignored: None,
        }
    }

    /// Text value of `field` as seen by pattern matching. Missing values and
    /// unknown fields read as the empty string.
    pub fn field_text(&self, field: &TransactionField) -> String {
        match field {
            TransactionField::Date => self.date.map(|d| d.to_string()).unwrap_or_default(),
            TransactionField::Payee => self.payee.clone(),
            TransactionField::Description => self.description.clone(),
            TransactionField::Amount => self.amount.to_string(),
            TransactionField::Currency => self.currency.clone(),
            TransactionField::Type => self
                .entry_type
                .map(|t| t.as_str().to_string())
                .unwrap_or_default(),
            TransactionField::AccountNumber => self.account_number.clone(),
            TransactionField::TransactionType => self.transaction_type.clone(),
            TransactionField::ArchiveId => self.archive_id.clone(),
            TransactionField::Unknown(_) => String::new(),
        }
    }
}
