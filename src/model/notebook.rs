use crate::error::validation;
use crate::model::{unsupported, Amount, DailyRecord, Edit, SchemaVariant};
use crate::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// An image kept in the day's gallery.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    /// The image bytes as an inline `data:` URL.
    pub src: String,
    /// ISO-8601 instant the image was added.
    pub timestamp: String,
}

/// A day in the notebook-and-gallery schema.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotebookDay {
    pub notebook: String,
    pub images: Vec<StoredImage>,
}

impl DailyRecord for NotebookDay {
    const VARIANT: SchemaVariant = SchemaVariant::NotebookGallery;
    const CSV_COLUMNS: &'static [&'static str] = &["Images"];

    fn notebook(&self) -> &str {
        &self.notebook
    }

    fn total(&self) -> Amount {
        Amount::ZERO
    }

    fn csv_fields(&self) -> Vec<String> {
        vec![self.images.len().to_string()]
    }

    fn describe(&self) -> String {
        let mut out = format!("{} image(s)", self.images.len());
        for image in &self.images {
            let kind = image
                .src
                .strip_prefix("data:")
                .and_then(|rest| rest.split(';').next())
                .unwrap_or("unknown");
            out.push_str(&format!("\n  {}  {kind}", image.timestamp));
        }
        out
    }

    fn apply(&self, edit: &Edit, now: DateTime<Utc>) -> Result<Self> {
        match edit {
            Edit::SetNotebook { text } => Ok(Self {
                notebook: text.clone(),
                ..self.clone()
            }),
            Edit::AppendImage { src } => {
                if !src.starts_with("data:") {
                    return Err(validation("An image must be an inline data: URL"));
                }
                let mut next = self.clone();
                next.images.push(StoredImage {
                    src: src.clone(),
                    timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
                });
                Ok(next)
            }
            Edit::SetIncome(_) | Edit::AddTransaction { .. } | Edit::DeleteTransaction { .. } => {
                Err(unsupported(edit, Self::VARIANT))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_append_image_records_instant() {
        let now = Utc.with_ymd_and_hms(2025, 10, 20, 9, 30, 0).unwrap();
        let day = NotebookDay::default()
            .apply(
                &Edit::AppendImage {
                    src: "data:image/png;base64,AAAA".to_string(),
                },
                now,
            )
            .unwrap();
        assert_eq!(day.images.len(), 1);
        assert_eq!(day.images[0].timestamp, "2025-10-20T09:30:00.000Z");
        assert!(day.describe().contains("image/png"));
    }

    #[test]
    fn test_rejects_non_data_url() {
        let now = Utc.with_ymd_and_hms(2025, 10, 20, 9, 30, 0).unwrap();
        let result = NotebookDay::default().apply(
            &Edit::AppendImage {
                src: "/tmp/cat.png".to_string(),
            },
            now,
        );
        assert!(result.is_err());
    }
}
