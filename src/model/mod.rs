//! Types that represent the core data model: date keys, amounts and the three daily record
//! schemas.
mod amount;
mod date_key;
mod edit;
mod income;
mod ledger;
mod notebook;

pub use amount::{Amount, AmountError};
pub use date_key::DateKey;
pub use edit::{Edit, IncomeUpdate};
pub use income::{IncomeDay, ID_PHOTO_PRICE};
pub use ledger::{LedgerDay, Transaction, TransactionType};
pub use notebook::{NotebookDay, StoredImage};

use crate::error::validation;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Selects which daily record schema a data directory uses. It is chosen once, when the data
/// directory is created, and records of one schema are never read as another.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
    /// Income and expense transactions plus a notebook.
    #[default]
    Ledger,
    /// Fixed income fields (ID photos, photo editing, design work, other) plus a notebook.
    FixedFields,
    /// A notebook plus a gallery of stored images.
    NotebookGallery,
}

serde_plain::derive_display_from_serialize!(SchemaVariant);
serde_plain::derive_fromstr_from_deserialize!(SchemaVariant);

impl SchemaVariant {
    /// Whether records of this schema carry money amounts.
    pub fn has_money(&self) -> bool {
        !matches!(self, SchemaVariant::NotebookGallery)
    }
}

/// The behaviour every daily record schema provides.
///
/// `Default` is the zero-value record: it stands in for every date that has no stored record, so
/// consumers never see a missing record.
pub trait DailyRecord:
    Default + Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The schema this record type implements.
    const VARIANT: SchemaVariant;

    /// Headers of the CSV columns between `Date` and `Notebook`.
    const CSV_COLUMNS: &'static [&'static str];

    /// The free-text notebook entry for the day.
    fn notebook(&self) -> &str;

    /// The day's total (income total, or net for the ledger). Zero for schemas without money.
    fn total(&self) -> Amount;

    /// The raw values for `CSV_COLUMNS`, in order.
    fn csv_fields(&self) -> Vec<String>;

    /// Human readable, multi-line rendering of the record.
    fn describe(&self) -> String;

    /// Applies `edit` to a copy of this record. Returns a validation error, and leaves `self`
    /// untouched, when the edit is invalid or not supported by this schema.
    fn apply(&self, edit: &Edit, now: DateTime<Utc>) -> Result<Self>;
}

/// The error returned for an edit the configured schema cannot express.
pub(crate) fn unsupported(edit: &Edit, variant: SchemaVariant) -> crate::Error {
    validation(format!(
        "Cannot {} because this notebook uses the '{variant}' schema",
        edit.action()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_schema_variant_strings() {
        assert_eq!(SchemaVariant::FixedFields.to_string(), "fixed_fields");
        assert_eq!(
            SchemaVariant::from_str("notebook_gallery").unwrap(),
            SchemaVariant::NotebookGallery
        );
        assert!(SchemaVariant::from_str("spreadsheet").is_err());
    }

    #[test]
    fn test_zero_records_total_zero() {
        assert!(LedgerDay::default().total().is_zero());
        assert!(IncomeDay::default().total().is_zero());
        assert!(NotebookDay::default().total().is_zero());
    }
}
