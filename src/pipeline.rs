//! The mutation pipeline shared by every editing surface.
//!
//! An edit is applied in four steps: snapshot the selected day's record, apply a pure
//! transformation to the copy, commit the copy into the store, then persist the store. `reduce`
//! does the first three and describes the rest as `Effect`s; `Session::dispatch` performs them.

use crate::model::{DailyRecord, DateKey, Edit};
use crate::store::RecordStore;
use crate::{Config, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::borrow::Cow;
use std::path::PathBuf;
use tracing::{debug, warn};

/// A side effect requested by `reduce`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Write the whole store to the durable slot.
    Persist,
    /// Show a notice to the user.
    Notify(Notice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// A dismissable message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// The outcome of a successful `reduce`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduced<R: DailyRecord> {
    pub store: RecordStore<R>,
    pub effects: Vec<Effect>,
}

/// Applies `edit` to the record for `date` and commits it into a new store.
///
/// A record that does not exist yet starts from the schema's zero value. If the edit is rejected
/// the error is returned and no new store is produced, so the caller's store is unchanged.
pub fn reduce<R: DailyRecord>(
    store: &RecordStore<R>,
    date: DateKey,
    edit: &Edit,
    now: DateTime<Utc>,
) -> Result<Reduced<R>> {
    let current = store.get(&date);
    let updated = current.apply(edit, now)?;
    let store = store.commit(date, updated);
    Ok(Reduced {
        store,
        effects: vec![
            Effect::Persist,
            Effect::Notify(Notice::info(format!("Saved the record for {date}"))),
        ],
    })
}

/// Owns the record store for the lifetime of one run of the program and routes every edit
/// through `reduce`.
#[derive(Debug, Clone)]
pub struct Session<R: DailyRecord> {
    store: RecordStore<R>,
    slot: PathBuf,
}

impl<R: DailyRecord> Session<R> {
    /// Loads the store from the configured durable slot. Never fails, see `RecordStore::load`.
    pub async fn open(config: &Config) -> Self {
        let store = RecordStore::load(config.records_path(), &config.backup()).await;
        Self::with_store(store, config.records_path().to_path_buf())
    }

    /// A session over an existing store that persists to `slot`.
    pub fn with_store(store: RecordStore<R>, slot: PathBuf) -> Self {
        Self { store, slot }
    }

    pub fn store(&self) -> &RecordStore<R> {
        &self.store
    }

    /// The record for `date`, or the zero-value record.
    pub fn record(&self, date: &DateKey) -> Cow<'_, R> {
        self.store.get(date)
    }

    /// Applies `edit` to `date` and performs the resulting effects.
    ///
    /// # Errors
    /// Returns the validation error when the edit is rejected; the store is left unchanged.
    /// A persistence failure is not an error: it is reported as a warning notice and the session
    /// continues with the in-memory store.
    pub async fn dispatch(
        &mut self,
        date: DateKey,
        edit: Edit,
        now: DateTime<Utc>,
    ) -> Result<Vec<Notice>> {
        debug!("Applying {} to {date}", edit.action());
        let reduced = reduce(&self.store, date, &edit, now)?;
        self.store = reduced.store;

        let mut notices = Vec::new();
        for effect in reduced.effects {
            match effect {
                Effect::Persist => {
                    if let Err(e) = self.store.persist(&self.slot).await {
                        warn!("Unable to save the records, keeping changes in memory: {e:#}");
                        notices.push(Notice::warning(format!(
                            "The change was kept in memory but could not be saved: {e:#}"
                        )));
                    }
                }
                Effect::Notify(notice) => notices.push(notice),
            }
        }
        Ok(notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{error_type, ErrorType};
    use crate::model::{Amount, IncomeDay, IncomeUpdate, LedgerDay, TransactionType};
    use crate::test::TestEnv;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn key(s: &str) -> DateKey {
        DateKey::from_str(s).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 20, 9, 30, 0).unwrap()
    }

    fn add(description: &str, amount: &str) -> Edit {
        Edit::AddTransaction {
            kind: TransactionType::Income,
            description: description.to_string(),
            amount: amount.to_string(),
        }
    }

    #[test]
    fn test_reduce_creates_record_on_first_write() {
        let store: RecordStore<LedgerDay> = RecordStore::new();
        let reduced = reduce(&store, key("2025-10-20"), &add("Shoot", "500"), now()).unwrap();
        assert!(store.is_empty());
        assert_eq!(reduced.store.len(), 1);
        assert_eq!(
            reduced.store.get(&key("2025-10-20")).net(),
            Amount::from(500)
        );
        assert_eq!(reduced.effects[0], Effect::Persist);
        assert!(matches!(reduced.effects[1], Effect::Notify(_)));
    }

    #[test]
    fn test_reduce_rejects_empty_description() {
        let store: RecordStore<LedgerDay> = RecordStore::new();
        let err = reduce(&store, key("2025-10-20"), &add("", "500"), now()).unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Validation));
    }

    #[test]
    fn test_edits_to_different_dates_are_independent() {
        let store: RecordStore<IncomeDay> = RecordStore::new();
        let update = |n| {
            Edit::SetIncome(IncomeUpdate {
                id_photos: Some(n),
                ..Default::default()
            })
        };
        let store = reduce(&store, key("2025-10-01"), &update(1), now())
            .unwrap()
            .store;
        let store = reduce(&store, key("2025-10-02"), &update(2), now())
            .unwrap()
            .store;
        assert_eq!(store.get(&key("2025-10-01")).id_photos, 1);
        assert_eq!(store.get(&key("2025-10-02")).id_photos, 2);
    }

    #[tokio::test]
    async fn test_dispatch_persists() {
        let env = TestEnv::new().await;
        let config = env.config();
        let mut session: Session<LedgerDay> = Session::open(&config).await;
        let notices = session
            .dispatch(key("2025-10-20"), add("Shoot", "500"), now())
            .await
            .unwrap();
        assert!(notices.iter().all(|n| n.level == NoticeLevel::Info));

        let reopened: Session<LedgerDay> = Session::open(&config).await;
        assert_eq!(reopened.store(), session.store());
    }

    #[tokio::test]
    async fn test_dispatch_rejected_edit_leaves_store_unchanged() {
        let env = TestEnv::new().await;
        let config = env.config();
        let mut session: Session<LedgerDay> = Session::open(&config).await;
        session
            .dispatch(key("2025-10-20"), add("Shoot", "500"), now())
            .await
            .unwrap();
        let before = session.store().clone();
        assert!(session
            .dispatch(key("2025-10-20"), add("", "10"), now())
            .await
            .is_err());
        assert_eq!(session.store(), &before);
    }

    #[tokio::test]
    async fn test_dispatch_persist_failure_is_warning() {
        let env = TestEnv::new().await;
        let config = env.config();
        let slot = config.root().join("no-such-dir").join("records.json");
        let mut session: Session<LedgerDay> = Session::with_store(RecordStore::new(), slot);
        let notices = session
            .dispatch(key("2025-10-20"), add("Shoot", "500"), now())
            .await
            .unwrap();
        assert!(notices.iter().any(|n| n.level == NoticeLevel::Warning));
        assert_eq!(session.store().len(), 1);
    }
}
