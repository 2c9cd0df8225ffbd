//! Postgres-backed company repository.
//!
//! Queries are built at runtime (no compile-time checked macros), so the
//! crate builds without a live database. The schema lives in
//! `migrations/001_companies.sql` and is applied by [`PostgresCompanyRepository::migrate`].
//!
//! ## Error Mapping
//!
//! Every sqlx error becomes a [`StorageError`] carrying the SQLSTATE as a
//! number (e.g. `23505` for the `UQ_Companies_Isin` unique constraint) and the
//! raw engine message. Classification into client messages happens at the
//! API boundary.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgPoolOptions};
use tracing::instrument;

use corpreg_core::{Company, CompanyChanges, CompanyDto, CompanyId};

use super::{CompanyRepository, StorageError};

const MIGRATION: &str = include_str!("../../migrations/001_companies.sql");

const SELECT_COLUMNS: &str = r#"
    SELECT id, name, exchange, ticker, isin, website, date_created, date_updated, updated_by
    FROM companies
"#;

#[derive(Debug, Clone)]
pub struct PostgresCompanyRepository {
    pool: Arc<PgPool>,
}

impl PostgresCompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| StorageError::from_sqlx("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the `companies` table and its constraints if missing.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::raw_sql(MIGRATION)
            .execute(&*self.pool)
            .await
            .map_err(|e| StorageError::from_sqlx("migrate", e))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CompanyRepository for PostgresCompanyRepository {
    #[instrument(skip(self), fields(company_id = %id), err)]
    async fn find_by_id(&self, id: CompanyId) -> Result<Option<Company>, StorageError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| StorageError::from_sqlx("find_by_id", e))?;

        row.map(|r| company_from_row(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_by_isin(&self, isin: &str) -> Result<Option<Company>, StorageError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE isin = $1"))
            .bind(isin)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| StorageError::from_sqlx("find_by_isin", e))?;

        row.map(|r| company_from_row(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_all(&self) -> Result<Vec<Company>, StorageError> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY date_created ASC, id ASC"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| StorageError::from_sqlx("list_all", e))?;

        rows.iter().map(company_from_row).collect()
    }

    #[instrument(
        skip(self, company),
        fields(company_id = %company.id(), isin = %company.isin()),
        err
    )]
    async fn insert(&self, company: &Company) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO companies
                (id, name, exchange, ticker, isin, website, date_created, date_updated, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(company.id().as_uuid())
        .bind(company.name())
        .bind(company.exchange())
        .bind(company.ticker())
        .bind(company.isin())
        .bind(company.website())
        .bind(company.date_created())
        .bind(company.date_updated())
        .bind(company.updated_by())
        .execute(&*self.pool)
        .await
        .map_err(|e| StorageError::from_sqlx("insert", e))?;

        Ok(())
    }

    #[instrument(skip(self, changes), fields(company_id = %id, isin = %changes.isin), err)]
    async fn update(
        &self,
        id: CompanyId,
        changes: CompanyChanges,
    ) -> Result<Option<Company>, StorageError> {
        let row = sqlx::query(
            r#"
            UPDATE companies
            SET name = $2, exchange = $3, ticker = $4, isin = $5, website = $6,
                updated_by = $7, date_updated = $8
            WHERE id = $1
            RETURNING id, name, exchange, ticker, isin, website,
                date_created, date_updated, updated_by
            "#,
        )
        .bind(id.as_uuid())
        .bind(&changes.name)
        .bind(&changes.exchange)
        .bind(&changes.ticker)
        .bind(&changes.isin)
        .bind(changes.website.as_deref())
        .bind(changes.updated_by.as_deref())
        .bind(Utc::now())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| StorageError::from_sqlx("update", e))?;

        row.map(|r| company_from_row(&r)).transpose()
    }
}

struct CompanyRow {
    id: uuid::Uuid,
    name: String,
    exchange: String,
    ticker: String,
    isin: String,
    website: Option<String>,
    date_created: DateTime<Utc>,
    date_updated: Option<DateTime<Utc>>,
    updated_by: Option<String>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for CompanyRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(CompanyRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            exchange: row.try_get("exchange")?,
            ticker: row.try_get("ticker")?,
            isin: row.try_get("isin")?,
            website: row.try_get("website")?,
            date_created: row.try_get("date_created")?,
            date_updated: row.try_get("date_updated")?,
            updated_by: row.try_get("updated_by")?,
        })
    }
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Company::from(CompanyDto {
            id: CompanyId::from_uuid(row.id),
            name: row.name,
            exchange: row.exchange,
            ticker: row.ticker,
            isin: row.isin,
            website: row.website,
            date_created: row.date_created,
            date_updated: row.date_updated,
            updated_by: row.updated_by,
        })
    }
}

fn company_from_row(row: &sqlx::postgres::PgRow) -> Result<Company, StorageError> {
    use sqlx::FromRow;

    CompanyRow::from_row(row)
        .map(Company::from)
        .map_err(|e| StorageError::from_sqlx("decode_company_row", e))
}
