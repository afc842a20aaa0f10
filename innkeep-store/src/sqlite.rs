// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for permission records.
use std::sync::Arc;

use sqlx::migrate::{MigrateDatabase, Migrator};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Sqlite, migrate};
use thiserror::Error;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

use crate::config::StoreConfig;

/// Create SQLite database if it doesn't already exist.
pub async fn create_database(url: &str) -> Result<(), SqliteError> {
    if !Sqlite::database_exists(url).await? {
        Sqlite::create_database(url).await?
    }
    Ok(())
}

/// Get migrations from folder without running them.
pub fn migrations() -> Migrator {
    migrate!()
}

/// Run any pending database migrations from inside the application.
pub async fn run_pending_migrations(pool: &sqlx::SqlitePool) -> Result<(), SqliteError> {
    migrations().run(pool).await?;
    Ok(())
}

pub struct SqliteStoreBuilder {
    url: String,
    max_connections: u32,
    run_migrations: bool,
    create_database: bool,
}

impl Default for SqliteStoreBuilder {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}

impl SqliteStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            url: config.database_url.clone(),
            max_connections: config.max_connections,
            create_database: config.create_database,
            run_migrations: config.run_migrations,
        }
    }

    #[cfg(any(test, feature = "test_utils"))]
    pub fn random_memory_url(mut self) -> Self {
        // Every temporary database gets its own random name to keep parallel tests isolated from
        // each other.
        //
        // See related issue: https://github.com/launchbadge/sqlx/issues/2510
        self.url = format!(
            "sqlite://innkeep{}?mode=memory&cache=private",
            rand::random::<u32>()
        );
        self
    }

    pub fn database_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn create_database(mut self, create_database: bool) -> Self {
        self.create_database = create_database;
        self
    }

    pub fn run_default_migrations(mut self, run_migrations: bool) -> Self {
        self.run_migrations = run_migrations;
        self
    }

    pub async fn build<'a>(self) -> Result<SqliteStore<'a>, SqliteError> {
        if self.create_database {
            create_database(&self.url).await?;
        }

        let pool: sqlx::SqlitePool = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.url)
            .await?;

        if self.run_migrations {
            run_pending_migrations(&pool).await?;
        }

        Ok(SqliteStore::new(pool))
    }
}

pub type Transaction<'a> = sqlx::Transaction<'a, Sqlite>;

/// SQLite database with connection pool and transaction provider.
///
/// Cloned instances share the same pool and the same transaction, if one was started. Writes go
/// through `tx` and fail with `TransactionMissing` when no transaction was begun. Reads go
/// through `execute` directly on the pool and only see committed data.
///
/// SQLite serializes write transactions, this is made explicit with a `TransactionPermit` which is
/// held from `begin` until `commit` or `rollback`. Any other caller of `begin` waits until the
/// permit was given back.
#[derive(Clone, Debug)]
pub struct SqliteStore<'a> {
    tx: Arc<Mutex<Option<Transaction<'a>>>>,
    pool: sqlx::SqlitePool,
    semaphore: Arc<Semaphore>,
}

impl<'a> SqliteStore<'a> {
    pub(crate) fn new(pool: sqlx::SqlitePool) -> Self {
        Self {
            tx: Arc::default(),
            pool,
            // Only one write transaction at a time.
            semaphore: Arc::new(Semaphore::new(1)),
        }
    }

    /// Shortcut building an in-memory SQLite database with a randomised name for testing purposes.
    #[cfg(any(test, feature = "test_utils"))]
    pub async fn temporary() -> Self {
        SqliteStoreBuilder::new()
            .random_memory_url()
            .max_connections(1)
            .build()
            .await
            .expect("migrations succeeded")
    }

    /// Execute SQL query within transaction.
    ///
    /// This method will return an error when no transaction is currently given. Make sure to call
    /// `begin` before.
    ///
    /// Failed queries do _not_ roll back the transaction automatically.
    pub async fn tx<F, R>(&self, f: F) -> Result<R, SqliteError>
    where
        F: AsyncFnOnce(&mut Transaction) -> Result<R, SqliteError>,
    {
        let mut tx_ref = self.tx.lock().await;
        let tx = tx_ref.as_mut().ok_or(SqliteError::TransactionMissing)?;

        f(tx).await
    }

    /// Execute SQL query directly.
    pub async fn execute<F, R>(&self, f: F) -> Result<R, SqliteError>
    where
        F: AsyncFnOnce(&sqlx::SqlitePool) -> Result<R, SqliteError>,
    {
        f(&self.pool).await
    }
}

impl<'a> crate::traits::Transaction for SqliteStore<'a> {
    type Error = SqliteError;

    type Permit = TransactionPermit;

    /// Begins a transaction.
    ///
    /// Waits while another caller holds the permit.
    async fn begin(&self) -> Result<TransactionPermit, SqliteError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore is never closed while the store exists");

        let mut tx_ref = self.tx.lock().await;
        assert!(
            tx_ref.is_none(),
            "can't have an already existing transaction after an just-acquired permit"
        );

        let tx = self.pool.begin().await?;
        tx_ref.replace(tx);

        Ok(TransactionPermit(permit))
    }

    /// Rolls back the transaction and frees the permit.
    async fn rollback(&self, permit: TransactionPermit) -> Result<(), SqliteError> {
        let Some(tx) = self.tx.lock().await.take() else {
            panic!("can't have no transaction without dropping permit first")
        };

        let result = tx.rollback().await.map_err(SqliteError::Sqlite);

        // The permit is released on success and on error.
        drop(permit);

        result
    }

    /// Commits the transaction and frees the permit.
    async fn commit(&self, permit: TransactionPermit) -> Result<(), SqliteError> {
        let Some(tx) = self.tx.lock().await.take() else {
            panic!("can't have no transaction without dropping permit first")
        };

        let result = tx.commit().await.map_err(SqliteError::Sqlite);

        drop(permit);

        result
    }
}

#[allow(unused)]
pub struct TransactionPermit(OwnedSemaphorePermit);

#[derive(Debug, Error)]
pub enum SqliteError {
    /// Writes can only ever happen inside a transaction which was started _before_.
    #[error("tried to interact with inexistant transaction")]
    TransactionMissing,

    /// SQLite database and connection error.
    #[error(transparent)]
    Sqlite(#[from] sqlx::Error),

    /// SQL table schema migration error.
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Invalid, corrupted data was found in the database.
    #[error("could not decode corrupted '{0}' value from database")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use std::task::Poll;

    use futures_test::task::noop_context;
    use sqlx::{query, query_as};
    use tokio::pin;

    use crate::config::StoreConfig;
    use crate::sqlite::{SqliteError, SqliteStoreBuilder};
    use crate::traits::Transaction;

    #[tokio::test]
    async fn build_from_config() {
        let config = StoreConfig {
            max_connections: 1,
            ..StoreConfig::default()
        };

        let store = SqliteStoreBuilder::from_config(&config)
            .random_memory_url()
            .build()
            .await
            .unwrap();

        // Migrations ran, the permission table exists.
        let count = store
            .execute(async |pool| {
                let row: (i64,) = query_as("SELECT COUNT(*) FROM permissions_v1")
                    .fetch_one(pool)
                    .await?;
                Ok(row.0)
            })
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn transaction_provider() {
        let store = SqliteStoreBuilder::new()
            .run_default_migrations(false)
            .random_memory_url()
            .build()
            .await
            .unwrap();

        // Writing without a transaction fails.
        assert!(matches!(
            store.tx(async |_| Ok(())).await,
            Err(SqliteError::TransactionMissing)
        ));

        let permit = store.begin().await.expect("no error");

        // A second transaction has to wait for the first one.
        assert!(matches!(
            {
                let fut = store.begin();
                let mut cx = noop_context();
                pin!(fut);
                fut.poll(&mut cx)
            },
            Poll::Pending
        ));

        assert!(store.tx(async |_| Ok(())).await.is_ok());
        assert!(store.commit(permit).await.is_ok());

        assert!(matches!(
            store.tx(async |_| Ok(())).await,
            Err(SqliteError::TransactionMissing)
        ));
    }

    #[tokio::test]
    async fn rolled_back_writes_are_discarded() {
        let store = SqliteStoreBuilder::new()
            .random_memory_url()
            .max_connections(1)
            .build()
            .await
            .unwrap();

        let permit = store.begin().await.unwrap();
        store
            .tx(async |tx| {
                query(
                    "
                    INSERT INTO
                        permissions_v1 (
                            user_id,
                            page,
                            can_view,
                            can_create,
                            can_update,
                            can_delete,
                            is_active
                        )
                    VALUES
                        ('7', 'units', 1, 1, 1, 0, 1)
                    ",
                )
                .execute(&mut **tx)
                .await?;
                Ok(())
            })
            .await
            .unwrap();

        // The uncommitted row is visible inside the transaction.
        let dirty = store
            .tx(async |tx| {
                let row: (i64,) = query_as("SELECT COUNT(*) FROM permissions_v1")
                    .fetch_one(&mut **tx)
                    .await?;
                Ok(row.0)
            })
            .await
            .unwrap();
        assert_eq!(dirty, 1);

        store.rollback(permit).await.unwrap();

        let count = store
            .execute(async |pool| {
                let row: (i64,) = query_as("SELECT COUNT(*) FROM permissions_v1")
                    .fetch_one(pool)
                    .await?;
                Ok(row.0)
            })
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
