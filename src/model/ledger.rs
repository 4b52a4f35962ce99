use crate::error::validation;
use crate::model::{unsupported, Amount, DailyRecord, Edit, SchemaVariant};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Whether a transaction adds to or subtracts from the day's net.
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
pub enum TransactionType {
    #[default]
    Income,
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

/// One entry in a day's ledger. `amount` is non-negative; the sign comes from `kind`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub description: String,
    pub amount: Amount,
}

/// A day in the ledger schema: a list of transactions and a notebook.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerDay {
    pub transactions: Vec<Transaction>,
    pub notebook: String,
}

impl LedgerDay {
    /// Sum of all transactions of the given kind.
    pub fn sum_of(&self, kind: TransactionType) -> Amount {
        self.transactions
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.amount)
            .sum()
    }

    pub fn income(&self) -> Amount {
        self.sum_of(TransactionType::Income)
    }

    pub fn expense(&self) -> Amount {
        self.sum_of(TransactionType::Expense)
    }

    /// Income minus expense.
    pub fn net(&self) -> Amount {
        self.income() - self.expense()
    }

    fn with_transaction(
        &self,
        kind: TransactionType,
        description: &str,
        amount: &str,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let description = description.trim();
        if description.is_empty() {
            return Err(validation("The transaction description must not be empty"));
        }
        let amount = Amount::from_str(amount)
            .map_err(|_| validation(format!("The amount '{}' is not a number", amount.trim())))?;
        if !amount.is_within_entry_limit() {
            return Err(validation(format!(
                "The amount must not be more than {}",
                Amount::entry_limit()
            )));
        }
        if amount.is_negative() {
            return Err(validation(format!(
                "The amount must not be negative, use the '{}' type instead",
                TransactionType::Expense
            )));
        }

        let mut next = self.clone();
        next.transactions.push(Transaction {
            id: next_transaction_id(&self.transactions, now),
            kind,
            description: description.to_string(),
            amount,
        });
        Ok(next)
    }

    fn without_transaction(&self, id: &str) -> Self {
        let mut next = self.clone();
        if let Some(ix) = next.transactions.iter().position(|t| t.id == id) {
            next.transactions.remove(ix);
        }
        next
    }
}

/// Derives an id from the insertion instant, bumped until it is unused in `existing`.
pub(crate) fn next_transaction_id(existing: &[Transaction], now: DateTime<Utc>) -> String {
    let mut millis = now.timestamp_millis();
    loop {
        let candidate = format!("txn-{millis}");
        if !existing.iter().any(|t| t.id == candidate) {
            return candidate;
        }
        millis += 1;
    }
}

impl DailyRecord for LedgerDay {
    const VARIANT: SchemaVariant = SchemaVariant::Ledger;
    const CSV_COLUMNS: &'static [&'static str] = &["Income", "Expense", "Net"];

    fn notebook(&self) -> &str {
        &self.notebook
    }

    fn total(&self) -> Amount {
        self.net()
    }

    fn csv_fields(&self) -> Vec<String> {
        vec![
            self.income().plain(),
            self.expense().plain(),
            self.net().plain(),
        ]
    }

    fn describe(&self) -> String {
        let mut out = String::new();
        if self.transactions.is_empty() {
            out.push_str("No transactions\n");
        }
        for t in &self.transactions {
            let sign = match t.kind {
                TransactionType::Income => '+',
                TransactionType::Expense => '-',
            };
            out.push_str(&format!(
                "{}  {sign}{:>12}  {}\n",
                t.id, t.amount, t.description
            ));
        }
        out.push_str(&format!(
            "Income {}, Expense {}, Net {}",
            self.income(),
            self.expense(),
            self.net()
        ));
        out
    }

    fn apply(&self, edit: &Edit, now: DateTime<Utc>) -> Result<Self> {
        match edit {
            Edit::SetNotebook { text } => Ok(Self {
                notebook: text.clone(),
                ..self.clone()
            }),
            Edit::AddTransaction {
                kind,
                description,
                amount,
            } => self.with_transaction(*kind, description, amount, now),
            Edit::DeleteTransaction { id } => Ok(self.without_transaction(id)),
            Edit::SetIncome(_) | Edit::AppendImage { .. } => {
                Err(unsupported(edit, Self::VARIANT))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{error_type, ErrorType};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 20, 9, 30, 0).unwrap()
    }

    fn add(kind: TransactionType, description: &str, amount: &str) -> Edit {
        Edit::AddTransaction {
            kind,
            description: description.to_string(),
            amount: amount.to_string(),
        }
    }

    #[test]
    fn test_net_and_delete_by_id() {
        let day = LedgerDay::default()
            .apply(&add(TransactionType::Income, "Wedding shoot", "500"), now())
            .unwrap()
            .apply(&add(TransactionType::Expense, "Printer ink", "120"), now())
            .unwrap();
        assert_eq!(day.net(), Amount::from(380));

        let expense_id = day
            .transactions
            .iter()
            .find(|t| t.kind == TransactionType::Expense)
            .unwrap()
            .id
            .clone();
        let day = day
            .apply(&Edit::DeleteTransaction { id: expense_id }, now())
            .unwrap();
        assert_eq!(day.net(), Amount::from(500));
        assert_eq!(day.transactions.len(), 1);
    }

    #[test]
    fn test_ids_unique_at_same_instant() {
        let day = LedgerDay::default()
            .apply(&add(TransactionType::Income, "a", "1"), now())
            .unwrap()
            .apply(&add(TransactionType::Income, "b", "2"), now())
            .unwrap()
            .apply(&add(TransactionType::Income, "c", "3"), now())
            .unwrap();
        let mut ids: Vec<&str> = day.transactions.iter().map(|t| t.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
        assert_eq!(day.transactions[0].id, format!("txn-{}", now().timestamp_millis()));
    }

    #[test]
    fn test_rejects_empty_description() {
        let day = LedgerDay::default();
        let err = day
            .apply(&add(TransactionType::Income, "   ", "100"), now())
            .unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Validation));
    }

    #[test]
    fn test_rejects_unparseable_and_negative_amounts() {
        let day = LedgerDay::default();
        for amount in ["", "ten", "-5"] {
            let err = day
                .apply(&add(TransactionType::Expense, "Lunch", amount), now())
                .unwrap_err();
            assert_eq!(error_type(&err), Some(ErrorType::Validation), "{amount}");
        }
    }

    #[test]
    fn test_rejects_amount_over_entry_limit() {
        let huge = "79228162514264337593543950335";
        let day = LedgerDay::default()
            .apply(&add(TransactionType::Income, "a", "1,000,000,000,000"), now())
            .unwrap();
        let err = day
            .apply(&add(TransactionType::Income, "b", huge), now())
            .unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Validation));
        assert_eq!(day.net(), Amount::from(1_000_000_000u32) * 1000);
    }

    #[test]
    fn test_near_max_stored_amounts_do_not_overflow() {
        let huge: Amount = "79228162514264337593543950335".parse().unwrap();
        let txn = |id: &str, kind| Transaction {
            id: id.to_string(),
            kind,
            description: "x".to_string(),
            amount: huge,
        };
        let day = LedgerDay {
            transactions: vec![
                txn("txn-1", TransactionType::Income),
                txn("txn-2", TransactionType::Income),
                txn("txn-3", TransactionType::Expense),
            ],
            notebook: String::new(),
        };
        assert_eq!(day.income(), huge);
        assert!(day.net().is_zero());
        assert_eq!(day.csv_fields().len(), 3);
    }

    #[test]
    fn test_delete_unknown_id_is_noop() {
        let day = LedgerDay::default()
            .apply(&add(TransactionType::Income, "a", "1"), now())
            .unwrap();
        let after = day
            .apply(
                &Edit::DeleteTransaction {
                    id: "txn-0".to_string(),
                },
                now(),
            )
            .unwrap();
        assert_eq!(after, day);
    }

    #[test]
    fn test_income_edit_unsupported() {
        let err = LedgerDay::default()
            .apply(&Edit::SetIncome(Default::default()), now())
            .unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Validation));
        assert!(err.to_string().contains("ledger"));
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{"transactions":[{"id":"txn-1","type":"expense","description":"Ink","amount":120}],"notebook":"hi"}"#;
        let day: LedgerDay = serde_json::from_str(json).unwrap();
        assert_eq!(day.expense(), Amount::from(120));
        assert_eq!(day.notebook, "hi");
    }
}
