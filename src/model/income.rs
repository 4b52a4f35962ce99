use crate::error::validation;
use crate::model::{unsupported, Amount, DailyRecord, Edit, IncomeUpdate, SchemaVariant};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Price of one ID photo session, in baht. Totals are always computed with this value.
pub const ID_PHOTO_PRICE: u32 = 30;

/// A day in the fixed-fields schema.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IncomeDay {
    /// Number of ID photo sessions.
    pub id_photos: u32,
    pub photo_editing: Amount,
    pub design_work: Amount,
    pub other_income: Amount,
    pub notebook: String,
}

impl IncomeDay {
    /// Income from ID photos: `id_photos * ID_PHOTO_PRICE`.
    pub fn id_photo_income(&self) -> Amount {
        Amount::from(ID_PHOTO_PRICE) * self.id_photos
    }
}

impl DailyRecord for IncomeDay {
    const VARIANT: SchemaVariant = SchemaVariant::FixedFields;
    const CSV_COLUMNS: &'static [&'static str] = &[
        "ID Photos (Count)",
        "Photo Editing (THB)",
        "Design Work (THB)",
        "Other Income (THB)",
        "Total Income (THB)",
    ];

    fn notebook(&self) -> &str {
        &self.notebook
    }

    fn total(&self) -> Amount {
        self.id_photo_income() + self.photo_editing + self.design_work + self.other_income
    }

    fn csv_fields(&self) -> Vec<String> {
        vec![
            self.id_photos.to_string(),
            self.photo_editing.plain(),
            self.design_work.plain(),
            self.other_income.plain(),
            self.total().plain(),
        ]
    }

    fn describe(&self) -> String {
        format!(
            "ID photos     {:>4} x {ID_PHOTO_PRICE} = {}\n\
             Photo editing        {}\n\
             Design work          {}\n\
             Other income         {}\n\
             Total                {}",
            self.id_photos,
            self.id_photo_income(),
            self.photo_editing,
            self.design_work,
            self.other_income,
            self.total()
        )
    }

    fn apply(&self, edit: &Edit, _now: DateTime<Utc>) -> Result<Self> {
        match edit {
            Edit::SetNotebook { text } => Ok(Self {
                notebook: text.clone(),
                ..self.clone()
            }),
            Edit::SetIncome(update) => {
                check_update(update)?;
                Ok(Self {
                    id_photos: update.id_photos.unwrap_or(self.id_photos),
                    photo_editing: update.photo_editing.unwrap_or(self.photo_editing),
                    design_work: update.design_work.unwrap_or(self.design_work),
                    other_income: update.other_income.unwrap_or(self.other_income),
                    notebook: self.notebook.clone(),
                })
            }
            Edit::AddTransaction { .. }
            | Edit::DeleteTransaction { .. }
            | Edit::AppendImage { .. } => Err(unsupported(edit, Self::VARIANT)),
        }
    }
}

/// Rejects money fields beyond the entry limit.
fn check_update(update: &IncomeUpdate) -> Result<()> {
    let fields = [
        ("photo editing", update.photo_editing),
        ("design work", update.design_work),
        ("other income", update.other_income),
    ];
    for (name, value) in fields {
        if let Some(value) = value {
            if !value.is_within_entry_limit() {
                return Err(validation(format!(
                    "The {name} amount must not be more than {}",
                    Amount::entry_limit()
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{error_type, ErrorType};
    use chrono::TimeZone;

    #[test]
    fn test_total_uses_fixed_photo_price() {
        let day = IncomeDay {
            id_photos: 2,
            photo_editing: Amount::from(100),
            design_work: Amount::ZERO,
            other_income: Amount::from(50),
            notebook: String::new(),
        };
        assert_eq!(day.total(), Amount::from(210));
        assert_eq!(
            day.csv_fields(),
            vec!["2", "100", "0", "50", "210"]
        );
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let day = IncomeDay {
            id_photos: 3,
            design_work: Amount::from(400),
            notebook: "busy".to_string(),
            ..Default::default()
        };
        let update = IncomeUpdate {
            id_photos: Some(5),
            ..Default::default()
        };
        let next = day.apply(&Edit::SetIncome(update), now).unwrap();
        assert_eq!(next.id_photos, 5);
        assert_eq!(next.design_work, Amount::from(400));
        assert_eq!(next.notebook, "busy");
        assert_eq!(day.id_photos, 3);
    }

    #[test]
    fn test_rejects_amount_over_entry_limit() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let update = IncomeUpdate {
            id_photos: Some(u32::MAX),
            other_income: Some("79228162514264337593543950335".parse().unwrap()),
            ..Default::default()
        };
        let err = IncomeDay::default()
            .apply(&Edit::SetIncome(update), now)
            .unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Validation));
    }

    #[test]
    fn test_max_photo_count_does_not_overflow() {
        let day = IncomeDay {
            id_photos: u32::MAX,
            photo_editing: Amount::entry_limit(),
            design_work: Amount::entry_limit(),
            other_income: Amount::entry_limit(),
            notebook: String::new(),
        };
        assert_eq!(day.id_photo_income(), Amount::from(u32::MAX) * ID_PHOTO_PRICE);
        assert!(day.total() > Amount::entry_limit());
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let day: IncomeDay = serde_json::from_str(r#"{"idPhotos":4,"notebook":"x"}"#).unwrap();
        assert_eq!(day.total(), Amount::from(120));
        assert!(day.photo_editing.is_zero());
    }
}
