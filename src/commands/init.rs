use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::SchemaVariant;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its subdirectories and an initial `config.json` that fixes the
/// record schema for this data directory.
///
/// # Arguments
/// - `home` - The directory that will be the root of data directory, e.g. `$HOME/daily-tools`
/// - `schema` - The daily record schema. Records written under one schema are never read under
///   another, so this cannot be changed later.
///
/// # Errors
/// - Returns an error if the data directory is already initialized.
/// - Returns an error if any file operations fail.
pub async fn init(home: &Path, schema: SchemaVariant) -> Result<Out<()>> {
    let config = Config::create(home, schema)
        .await
        .context("Unable to create the data directory and config")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Created the data directory at {} using the '{schema}' schema",
        config.root().display()
    )
    .into())
}

/// Prints the display-only user token.
pub async fn whoami(config: &Config) -> Result<Out<String>> {
    let user_id = config.user_id().to_string();
    Ok(Out::new("Your user id", user_id.clone()).with_output(user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_type;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_then_init_again() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("daily");
        let out = init(&home, SchemaVariant::NotebookGallery).await.unwrap();
        assert!(out.message().contains("notebook_gallery"));
        assert_eq!(
            Config::load(&home).await.unwrap().schema(),
            SchemaVariant::NotebookGallery
        );

        let err = init(&home, SchemaVariant::Ledger).await.unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Config));
    }

    #[tokio::test]
    async fn test_whoami() {
        let env = crate::test::TestEnv::new().await;
        let out = whoami(&env.config()).await.unwrap();
        assert!(out.output().unwrap().starts_with("user_"));
    }
}
