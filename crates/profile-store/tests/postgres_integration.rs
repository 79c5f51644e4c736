//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p profile-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use common::UserId;
use profile_store::{
    AccountRole, ActKind, ClientRow, Collection, PostgresProfileStore, ProfileStore, RecordId, Row,
    StoreError, UniqueField, UserRow,
};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_registration_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn setup_store() -> PostgresProfileStore {
    let info = get_container_info().await;
    let pool = PgPool::connect(&info.connection_string).await.unwrap();
    PostgresProfileStore::new(pool)
}

fn user_row(email: &str) -> (UserId, Row) {
    let id = UserId::new();
    (
        id,
        Row::User(UserRow {
            id,
            email: email.to_string(),
            role: AccountRole::Client,
        }),
    )
}

fn client_row(user_id: UserId, tax_id: &str) -> Row {
    Row::Client(ClientRow {
        id: RecordId::new(),
        user_id,
        name: "Ana Souza".to_string(),
        email: format!("{tax_id}@example.com"),
        phone: "11 99999-0000".to_string(),
        tax_id: tax_id.to_string(),
        act: Some(ActKind::Musician),
        postal_code: "01310100".to_string(),
        street: "Avenida Paulista".to_string(),
        city: "São Paulo".to_string(),
        state: "SP".to_string(),
        district: "Bela Vista".to_string(),
        latitude: Some(-23.561),
        longitude: Some(-46.655),
    })
}

#[tokio::test]
async fn insert_then_exists() {
    let store = setup_store().await;
    let (_, row) = user_row("exists@example.com");

    store.insert(row).await.unwrap();

    assert!(store
        .exists(UniqueField::Email, "exists@example.com")
        .await
        .unwrap());
    assert!(!store
        .exists(UniqueField::Email, "missing@example.com")
        .await
        .unwrap());
}

#[tokio::test]
async fn unique_index_closes_check_then_insert_race() {
    let store = setup_store().await;
    let (_, first) = user_row("race@example.com");
    let (_, second) = user_row("race@example.com");

    store.insert(first).await.unwrap();

    // A concurrent registration that passed the pre-check still conflicts here.
    let err = store.insert(second).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Conflict {
            collection: Collection::Users,
            field: UniqueField::Email,
        }
    ));
}

#[tokio::test]
async fn tax_id_unique_across_client_profiles() {
    let store = setup_store().await;
    let (user_a, row_a) = user_row("taxa@example.com");
    let (user_b, row_b) = user_row("taxb@example.com");
    store.insert(row_a).await.unwrap();
    store.insert(row_b).await.unwrap();

    store.insert(client_row(user_a, "52998224725")).await.unwrap();
    let err = store
        .insert(client_row(user_b, "52998224725"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Conflict {
            field: UniqueField::TaxId,
            ..
        }
    ));
}

#[tokio::test]
async fn soft_deleted_rows_leave_uniqueness_scope() {
    let store = setup_store().await;
    let (id, row) = user_row("gone@example.com");
    store.insert(row).await.unwrap();

    sqlx::query("UPDATE users SET deleted_at = now() WHERE id = $1")
        .bind(id.as_uuid())
        .execute(store.pool())
        .await
        .unwrap();

    assert!(!store
        .exists(UniqueField::Email, "gone@example.com")
        .await
        .unwrap());

    // The partial index admits a fresh registration with the same email.
    let (_, again) = user_row("gone@example.com");
    store.insert(again).await.unwrap();
}

#[tokio::test]
async fn delete_is_idempotent() {
    let store = setup_store().await;
    let (id, row) = user_row("delete@example.com");
    store.insert(row).await.unwrap();

    store
        .delete(Collection::Users, RecordId::from(id))
        .await
        .unwrap();
    store
        .delete(Collection::Users, RecordId::from(id))
        .await
        .unwrap();

    assert!(!store
        .exists(UniqueField::Email, "delete@example.com")
        .await
        .unwrap());
}
