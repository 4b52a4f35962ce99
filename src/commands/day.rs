//! Commands that read or edit the record of a single day.

use crate::annotate::{self, Caption};
use crate::commands::Out;
use crate::error::{validation, ErrorType, IntoResult};
use crate::model::{Amount, DailyRecord, DateKey, Edit, IncomeUpdate, TransactionType};
use crate::pipeline::{NoticeLevel, Session};
use crate::{utils, Config, Result};
use base64::Engine;
use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use tracing::warn;

/// A day's record together with its computed total.
#[derive(Debug, Clone, Serialize)]
pub struct DayView<R: DailyRecord> {
    pub date: DateKey,
    pub total: Amount,
    pub record: R,
}

impl<R: DailyRecord> DayView<R> {
    fn new(date: DateKey, record: R) -> Self {
        Self {
            date,
            total: record.total(),
            record,
        }
    }

    fn render(&self) -> String {
        let mut out = format!("{}\n{}\n", self.date, self.record.describe());
        if R::VARIANT.has_money() {
            out.push_str(&format!("Daily total: {}\n", self.total));
        }
        let notebook = self.record.notebook();
        if notebook.is_empty() {
            out.push_str("Notebook: (empty)");
        } else {
            out.push_str(&format!("Notebook:\n{notebook}"));
        }
        out
    }
}

/// Shows the record for `date`. A date without a stored record shows the empty record.
pub async fn show<R: DailyRecord>(config: &Config, date: DateKey) -> Result<Out<DayView<R>>> {
    let session: Session<R> = Session::open(config).await;
    let view = DayView::new(date, session.record(&date).into_owned());
    let output = view.render();
    let message = if session.store().contains(&date) {
        format!("The record for {date}")
    } else {
        format!("There is no record for {date} yet")
    };
    Ok(Out::new(message, view).with_output(output))
}

/// Replaces the notebook text of `date`.
pub async fn notebook<R: DailyRecord>(
    config: &Config,
    date: DateKey,
    text: String,
) -> Result<Out<DayView<R>>> {
    edit::<R>(config, date, Edit::SetNotebook { text }).await
}

/// Overwrites the given income fields of `date`.
pub async fn income<R: DailyRecord>(
    config: &Config,
    date: DateKey,
    update: IncomeUpdate,
) -> Result<Out<DayView<R>>> {
    if update.is_empty() {
        return Err(validation(
            "Nothing to update, pass at least one income field",
        ));
    }
    edit::<R>(config, date, Edit::SetIncome(update)).await
}

/// Appends a transaction to `date`.
pub async fn txn_add<R: DailyRecord>(
    config: &Config,
    date: DateKey,
    kind: TransactionType,
    description: String,
    amount: String,
) -> Result<Out<DayView<R>>> {
    edit::<R>(
        config,
        date,
        Edit::AddTransaction {
            kind,
            description,
            amount,
        },
    )
    .await
}

/// Removes the transaction `id` from `date`. An unknown id leaves the record as it is.
pub async fn txn_delete<R: DailyRecord>(
    config: &Config,
    date: DateKey,
    id: String,
) -> Result<Out<DayView<R>>> {
    edit::<R>(config, date, Edit::DeleteTransaction { id }).await
}

/// Adds the image file at `path` to the gallery of `date` as an inline `data:` URL.
///
/// With a `caption` the image is decoded, the caption is drawn over its lower part in `font` (or
/// an installed system font) and the result is stored as a PNG. A blank caption only converts the
/// image to PNG.
pub async fn image_add<R: DailyRecord>(
    config: &Config,
    date: DateKey,
    path: &Path,
    caption: Option<&str>,
    font: Option<&Path>,
) -> Result<Out<DayView<R>>> {
    let (mime, bytes) = read_image(path).await?;
    let src = match caption {
        None => data_url(mime, &bytes),
        Some(text) => {
            let caption = if text.trim().is_empty() {
                None
            } else {
                Some(Caption::load(text, font).await?)
            };
            let png = annotate::annotate(&bytes, caption.as_ref())?;
            data_url("image/png", &png)
        }
    };
    edit::<R>(config, date, Edit::AppendImage { src }).await
}

async fn edit<R: DailyRecord>(config: &Config, date: DateKey, edit: Edit) -> Result<Out<DayView<R>>> {
    let mut session: Session<R> = Session::open(config).await;
    let notices = session.dispatch(date, edit, Utc::now()).await?;

    let mut messages = Vec::new();
    for notice in notices {
        match notice.level {
            NoticeLevel::Info => messages.push(notice.message),
            NoticeLevel::Warning => warn!("{}", notice.message),
        }
    }

    let view = DayView::new(date, session.record(&date).into_owned());
    let output = view.render();
    Ok(Out::new(messages.join("\n"), view).with_output(output))
}

async fn read_image(path: &Path) -> Result<(&'static str, Vec<u8>)> {
    let mime = mime_type(path)?;
    let bytes = utils::read_bytes(path).await.pub_result(ErrorType::Io)?;
    if bytes.is_empty() {
        return Err(validation(format!(
            "The image file '{}' is empty",
            path.display()
        )));
    }
    Ok((mime, bytes))
}

fn data_url(mime: &str, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{encoded}")
}

fn mime_type(path: &Path) -> Result<&'static str> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => Ok("image/png"),
        Some("jpg") | Some("jpeg") => Ok("image/jpeg"),
        Some("gif") => Ok("image/gif"),
        Some("webp") => Ok("image/webp"),
        _ => Err(validation(format!(
            "'{}' is not a supported image, use png, jpeg, gif or webp",
            path.display()
        ))),
    }
}
