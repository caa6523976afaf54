//! SQLite bootstrap for the candidate-interview database.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};

/// Open the interview database, creating the file and any missing parent
/// directories, and bring the schema up to date. Accepts both the
/// `sqlite:path` form of `DATABASE_URL` and a bare file path.
pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);
    let path = std::env::current_dir()?.join(path);
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }

    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_creates_missing_parent_dirs_and_migrates() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("data").join("interviews.db");

        let pool = connect(nested.to_str().unwrap()).await.unwrap();

        // The migrated schema is queryable straight away.
        sqlx::query("SELECT count(*) FROM candidate_interviews")
            .execute(&pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_connect_accepts_sqlite_url_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("interviews.db").display());
        assert!(connect(&url).await.is_ok());
    }
}
