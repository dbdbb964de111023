use async_trait::async_trait;
use jiff::Timestamp;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use ushort_core::repository::{ReadRepository, Repository, Result};
use ushort_core::{Link, LinkId, StorageError, Token};

const ORIGINAL_URL_UNIQUE: &str = "links_original_url_key";
const SHORT_TOKEN_UNIQUE: &str = "links_short_token_key";

/// PostgreSQL implementation of the repository contract.
///
/// Uniqueness of `original_url` and `short_token` is enforced by table
/// constraints. A link waiting for its token stores `NULL`, so any number of
/// pending rows can coexist under the token constraint.
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    /// Creates a repository from an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new connection pool.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Query(format!("migration failed: {e}")))?;
        info!("link store schema is up to date");
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn id_to_db(id: LinkId) -> Result<i64> {
    i64::try_from(id.get())
        .map_err(|_| StorageError::InvalidData(format!("link id {id} exceeds BIGINT range")))
}

fn link_from_row(row: &PgRow) -> Result<Link> {
    let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
    let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
    let short_token: Option<String> = row.try_get("short_token").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;

    let id = u64::try_from(id)
        .map(LinkId::new)
        .map_err(|_| StorageError::InvalidData(format!("negative link id {id}")))?;
    let created_at = Timestamp::from_second(created_at).map_err(|e| {
        StorageError::InvalidData(format!("invalid created_at timestamp '{created_at}': {e}"))
    })?;

    Ok(Link {
        id,
        original_url,
        token: short_token.map(Token::new_unchecked),
        created_at,
    })
}

fn violated_constraint(err: &sqlx::Error) -> Option<String> {
    let db_err = err.as_database_error()?;
    if !db_err.is_unique_violation() {
        return None;
    }
    Some(db_err.constraint().unwrap_or_default().to_string())
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl ReadRepository for PgRepository {
    async fn find_by_token(&self, token: &Token) -> Result<Option<Link>> {
        let row = sqlx::query(
            r#"
            SELECT id, original_url, short_token, created_at
            FROM links
            WHERE short_token = $1
            LIMIT 1
            "#,
        )
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(link_from_row).transpose()
    }

    async fn find_by_url(&self, original_url: &str) -> Result<Option<Link>> {
        let row = sqlx::query(
            r#"
            SELECT id, original_url, short_token, created_at
            FROM links
            WHERE original_url = $1
            LIMIT 1
            "#,
        )
        .bind(original_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(link_from_row).transpose()
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn insert(&self, original_url: &str) -> Result<LinkId> {
        let result = sqlx::query(
            r#"
            INSERT INTO links (original_url, short_token, created_at)
            VALUES ($1, NULL, $2)
            RETURNING id
            "#,
        )
        .bind(original_url)
        .bind(Timestamp::now().as_second())
        .fetch_one(&self.pool)
        .await;

        let row = match result {
            Ok(row) => row,
            Err(err) => {
                return Err(match violated_constraint(&err).as_deref() {
                    Some(ORIGINAL_URL_UNIQUE) => StorageError::DuplicateUrl(original_url.to_owned()),
                    _ => map_sqlx_error(err),
                });
            }
        };

        let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
        let id = u64::try_from(id)
            .map(LinkId::new)
            .map_err(|_| StorageError::InvalidData(format!("negative link id {id}")))?;
        debug!(%id, "inserted link");
        Ok(id)
    }

    async fn set_token(&self, id: LinkId, token: &Token) -> Result<()> {
        let db_id = id_to_db(id)?;

        let result = sqlx::query(
            r#"
            UPDATE links
            SET short_token = $2
            WHERE id = $1
              AND (short_token IS NULL OR short_token = $2)
            "#,
        )
        .bind(db_id)
        .bind(token.as_str())
        .execute(&self.pool)
        .await;

        let updated = match result {
            Ok(done) => done.rows_affected(),
            Err(err) => {
                return Err(match violated_constraint(&err).as_deref() {
                    Some(SHORT_TOKEN_UNIQUE) => StorageError::DuplicateToken(token.to_string()),
                    _ => map_sqlx_error(err),
                });
            }
        };

        if updated > 0 {
            debug!(%id, %token, "assigned token");
            return Ok(());
        }

        // Nothing matched: either the id is unknown or it holds another token.
        let exists = sqlx::query("SELECT 1 FROM links WHERE id = $1")
            .bind(db_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .is_some();

        if exists {
            Err(StorageError::TokenImmutable(id))
        } else {
            Err(StorageError::NotFound(id))
        }
    }

    async fn find_tokenless(&self, after: Option<LinkId>, limit: usize) -> Result<Vec<Link>> {
        let after = after.map(id_to_db).transpose()?.unwrap_or(0);

        let rows = sqlx::query(
            r#"
            SELECT id, original_url, short_token, created_at
            FROM links
            WHERE short_token IS NULL AND id > $1
            ORDER BY id
            LIMIT $2
            "#,
        )
        .bind(after)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(link_from_row).collect()
    }

    async fn links_after(&self, after: Option<LinkId>, limit: usize) -> Result<Vec<Link>> {
        let after = after.map(id_to_db).transpose()?.unwrap_or(0);

        let rows = sqlx::query(
            r#"
            SELECT id, original_url, short_token, created_at
            FROM links
            WHERE id > $1
            ORDER BY id
            LIMIT $2
            "#,
        )
        .bind(after)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(link_from_row).collect()
    }
}
