use crate::config::config;
use crate::model::lead::Lead;
use crate::Result;
use log::debug;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Sqlite, SqlitePool};

pub mod backup;
pub mod call_log;
pub mod csv;
pub mod fetch;
pub mod lead;
pub mod metrics;
pub mod queue;
pub mod search;
pub mod whatsapp;

pub const STORAGE_KEY: &str = "coldcall_pro_data";

#[derive(Clone)]
pub struct Db {
    pub db: SqlitePool,
}

impl Db {
    pub async fn new() -> Result<Db> {
        init_db(&config().DB_URL).await
    }

    /// Connects and makes sure the storage table exists.
    pub async fn connect(db_url: &str) -> Result<Db> {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(db_url)
            .await?;
        create_schema(&db).await?;
        Ok(Db { db })
    }

    /// The whole collection, newest first. A missing row means no leads yet.
    pub async fn load_leads(&self) -> Result<Vec<Lead>> {
        let blob: Option<(String,)> = sqlx::query_as("SELECT value FROM storage WHERE key = $1")
            .bind(STORAGE_KEY)
            .fetch_optional(&self.db)
            .await?;
        match blob {
            None => Ok(Vec::new()),
            Some((value,)) => Ok(serde_json::from_str(&value)?),
        }
    }

    pub async fn save_leads(&self, leads: &[Lead]) -> Result<()> {
        let value = serde_json::to_string(leads)?;
        sqlx::query(
            r#"
            INSERT INTO storage (key, value) VALUES ($1, $2)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_on = datetime('now', 'localtime')"#,
        )
        .bind(STORAGE_KEY)
        .bind(value)
        .execute(&self.db)
        .await?;
        debug!("saved {} leads", leads.len());
        Ok(())
    }

    pub async fn read_lead(&self, id: &str) -> Result<Option<Lead>> {
        let leads = self.load_leads().await?;
        Ok(leads.into_iter().find(|l| l.id == id))
    }
}

async fn create_schema(pool: &SqlitePool) -> Result<()> {
    let qry = r#"
    CREATE TABLE IF NOT EXISTS storage
    (
        key             TEXT PRIMARY KEY    NOT NULL,
        value           TEXT                NOT NULL,
        updated_on      DATETIME DEFAULT    (datetime('now', 'localtime'))
    );
    "#;
    let _ = sqlx::query(qry).execute(pool).await?;
    Ok(())
}

pub async fn init_db(db_url: &str) -> Result<Db> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        Sqlite::create_database(db_url).await?;
        log::info!("database created successfully");
    }
    Db::connect(db_url).await
}

#[cfg(test)]
pub(crate) async fn memory_db() -> Db {
    Db::connect("sqlite::memory:").await.unwrap()
}
