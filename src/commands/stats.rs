use crate::commands::Out;
use crate::model::{DailyRecord, DateKey};
use crate::pipeline::Session;
use crate::views::{self, MonthlyAggregate};
use crate::{Config, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Shows the total and the per-day average for the month of `date`.
pub async fn stats<R: DailyRecord>(config: &Config, date: DateKey) -> Result<Out<MonthlyAggregate>> {
    let session: Session<R> = Session::open(config).await;
    let aggregate = views::monthly_aggregate(session.store(), &date);
    let output = format!(
        "{}: {} day(s), total {}, average {}",
        aggregate.month, aggregate.days, aggregate.total, aggregate.average
    );
    Ok(Out::new(format!("Monthly summary for {}", aggregate.month), aggregate).with_output(output))
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
}

/// Writes every stored day to `out` as CSV.
pub async fn export<R: DailyRecord>(config: &Config, out: &Path) -> Result<Out<ExportSummary>> {
    let session: Session<R> = Session::open(config).await;
    let rows = views::export(session.store(), out).await?;
    Ok(Out::new(
        format!("Exported {rows} day(s) to {}", out.display()),
        ExportSummary {
            path: out.to_path_buf(),
            rows,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::income;
    use crate::error::{error_type, ErrorType};
    use crate::model::{Amount, IncomeDay, IncomeUpdate, SchemaVariant};
    use crate::test::TestEnv;
    use std::str::FromStr;

    fn key(s: &str) -> DateKey {
        DateKey::from_str(s).unwrap()
    }

    async fn set_photos(config: &Config, date: &str, id_photos: u32) {
        income::<IncomeDay>(
            config,
            key(date),
            IncomeUpdate {
                id_photos: Some(id_photos),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_stats_for_month() {
        let env = TestEnv::with_schema(SchemaVariant::FixedFields).await;
        let config = env.config();
        set_photos(&config, "2025-10-01", 1).await;
        set_photos(&config, "2025-10-31", 3).await;
        set_photos(&config, "2025-11-01", 10).await;

        let out = stats::<IncomeDay>(&config, key("2025-10-15")).await.unwrap();
        let aggregate = out.structure().unwrap();
        assert_eq!(aggregate.days, 2);
        assert_eq!(aggregate.total, Amount::from(120));
        assert_eq!(aggregate.average, Amount::from(60));
    }

    #[tokio::test]
    async fn test_export_after_edits() {
        let env = TestEnv::with_schema(SchemaVariant::FixedFields).await;
        let config = env.config();
        set_photos(&config, "2025-10-02", 1).await;
        set_photos(&config, "2025-10-01", 2).await;

        let path = config.root().join("export.csv");
        let out = export::<IncomeDay>(&config, &path).await.unwrap();
        assert_eq!(out.structure().unwrap().rows, 2);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let dates: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[0].to_string())
            .collect();
        assert_eq!(dates, vec!["2025-10-01", "2025-10-02"]);
    }

    #[tokio::test]
    async fn test_export_empty_store() {
        let env = TestEnv::with_schema(SchemaVariant::FixedFields).await;
        let config = env.config();
        let err = export::<IncomeDay>(&config, &config.root().join("export.csv"))
            .await
            .unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Validation));
    }
}
