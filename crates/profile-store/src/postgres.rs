use async_trait::async_trait;
use common::RecordId;
use sqlx::PgPool;

use crate::row::{Collection, Row, UniqueField};
use crate::store::ProfileStore;
use crate::{Result, StoreError};

/// PostgreSQL-backed profile store implementation.
#[derive(Clone)]
pub struct PostgresProfileStore {
    pool: PgPool,
}

impl PostgresProfileStore {
    /// Creates a new PostgreSQL profile store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    /// Maps a unique-index violation onto the conflict it represents.
    fn map_insert_error(collection: Collection, err: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = err {
            let field = match db_err.constraint() {
                Some("users_email_active") => Some(UniqueField::Email),
                Some("clients_tax_id_active") | Some("studios_tax_id_active") => {
                    Some(UniqueField::TaxId)
                }
                _ => None,
            };
            if let Some(field) = field {
                return StoreError::Conflict { collection, field };
            }
        }
        StoreError::Database(err)
    }
}

#[async_trait]
impl ProfileStore for PostgresProfileStore {
    async fn insert(&self, row: Row) -> Result<RecordId> {
        let collection = row.collection();
        let id = row.id();

        let query = match row {
            Row::User(user) => sqlx::query(
                r#"
                INSERT INTO users (id, email, role)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(user.id.as_uuid())
            .bind(user.email)
            .bind(user.role.as_str()),
            Row::Client(client) => sqlx::query(
                r#"
                INSERT INTO clients (id, user_id, name, email, phone, tax_id, act,
                    postal_code, street, city, state, district, latitude, longitude)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                "#,
            )
            .bind(client.id.as_uuid())
            .bind(client.user_id.as_uuid())
            .bind(client.name)
            .bind(client.email)
            .bind(client.phone)
            .bind(client.tax_id)
            .bind(client.act.map(|a| a.as_str()))
            .bind(client.postal_code)
            .bind(client.street)
            .bind(client.city)
            .bind(client.state)
            .bind(client.district)
            .bind(client.latitude)
            .bind(client.longitude),
            Row::Studio(studio) => sqlx::query(
                r#"
                INSERT INTO studios (id, user_id, name, legal_name, email, phone, tax_id,
                    image_url, customer_id, subscription_id, subscription_status, subscription_due)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(studio.id.as_uuid())
            .bind(studio.user_id.as_uuid())
            .bind(studio.name)
            .bind(studio.legal_name)
            .bind(studio.email)
            .bind(studio.phone)
            .bind(studio.tax_id)
            .bind(studio.image_url)
            .bind(studio.customer_id)
            .bind(studio.subscription_id)
            .bind(studio.subscription_status.as_str())
            .bind(studio.subscription_due),
            Row::Address(address) => sqlx::query(
                r#"
                INSERT INTO addresses (id, user_id, postal_code, street, number, city,
                    state, district, complement, latitude, longitude)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(address.id.as_uuid())
            .bind(address.user_id.as_uuid())
            .bind(address.postal_code)
            .bind(address.street)
            .bind(address.number)
            .bind(address.city)
            .bind(address.state)
            .bind(address.district)
            .bind(address.complement)
            .bind(address.latitude)
            .bind(address.longitude),
        };

        query
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_insert_error(collection, e))?;

        Ok(id)
    }

    async fn delete(&self, collection: Collection, id: RecordId) -> Result<()> {
        let sql = match collection {
            Collection::Users => "DELETE FROM users WHERE id = $1",
            Collection::Clients => "DELETE FROM clients WHERE id = $1",
            Collection::Studios => "DELETE FROM studios WHERE id = $1",
            Collection::Addresses => "DELETE FROM addresses WHERE id = $1",
        };

        // Deleting an absent row affects zero rows and is not an error.
        sqlx::query(sql).bind(id.as_uuid()).execute(&self.pool).await?;
        Ok(())
    }

    async fn exists(&self, field: UniqueField, value: &str) -> Result<bool> {
        let sql = match field {
            UniqueField::Email => {
                "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND deleted_at IS NULL)"
            }
            UniqueField::TaxId => {
                r#"
                SELECT EXISTS (
                    SELECT 1 FROM clients WHERE tax_id = $1 AND deleted_at IS NULL
                    UNION ALL
                    SELECT 1 FROM studios WHERE tax_id = $1 AND deleted_at IS NULL
                )
                "#
            }
        };

        let found: bool = sqlx::query_scalar(sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;
        Ok(found)
    }
}
