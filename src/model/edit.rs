use crate::model::{Amount, TransactionType};
use serde::{Deserialize, Serialize};

/// A single change an editing surface wants to make to the selected day's record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "edit")]
pub enum Edit {
    /// Replace the notebook text.
    SetNotebook { text: String },
    /// Overwrite the given income fields, leaving the others as they are.
    SetIncome(IncomeUpdate),
    /// Append a transaction. `amount` is the raw user input and is validated on apply.
    AddTransaction {
        kind: TransactionType,
        description: String,
        amount: String,
    },
    /// Remove the transaction with this id, if present.
    DeleteTransaction { id: String },
    /// Append an image (an inline `data:` URL) to the gallery.
    AppendImage { src: String },
}

impl Edit {
    /// A short verb phrase for messages, e.g. "add a transaction".
    pub fn action(&self) -> &'static str {
        match self {
            Edit::SetNotebook { .. } => "update the notebook",
            Edit::SetIncome(_) => "update income fields",
            Edit::AddTransaction { .. } => "add a transaction",
            Edit::DeleteTransaction { .. } => "delete a transaction",
            Edit::AppendImage { .. } => "add an image",
        }
    }
}

/// A partial update of the fixed income fields. `None` keeps the current value.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeUpdate {
    pub id_photos: Option<u32>,
    pub photo_editing: Option<Amount>,
    pub design_work: Option<Amount>,
    pub other_income: Option<Amount>,
}

impl IncomeUpdate {
    pub fn is_empty(&self) -> bool {
        self.id_photos.is_none()
            && self.photo_editing.is_none()
            && self.design_work.is_none()
            && self.other_income.is_none()
    }
}
