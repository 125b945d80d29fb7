use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{map_unique, AccountUpdate, StoreError, StoreResult};
use crate::models::User;

pub async fn insert_user(pool: &PgPool, user: &User) -> StoreResult<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, password_hash, balance, is_admin, is_active, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(user.balance)
    .bind(user.is_admin)
    .bind(user.is_active)
    .bind(user.created_at)
    .fetch_one(pool)
    .await
    .map_err(|e| map_unique(e, format!("username {}", user.username)))
}

pub async fn get_user(pool: &PgPool, id: Uuid) -> StoreResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> StoreResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn list_users(pool: &PgPool) -> StoreResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(pool)
        .await?;

    Ok(users)
}

/// Apply only the fields that are set; untouched columns keep their value.
pub async fn update_account(
    pool: &PgPool,
    id: Uuid,
    update: &AccountUpdate,
) -> StoreResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET balance = COALESCE($2, balance),
            is_active = COALESCE($3, is_active),
            is_admin = COALESCE($4, is_admin),
            password_hash = COALESCE($5, password_hash)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(update.balance)
    .bind(update.is_active)
    .bind(update.is_admin)
    .bind(update.password_hash.as_deref())
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn count_users(pool: &PgPool) -> StoreResult<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

/// Conditional debit inside a placement transaction.
///
/// The `balance >= $2` guard makes concurrent debits serialize on the row;
/// a miss is either an unknown account or not enough funds.
pub async fn debit(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    amount: Decimal,
) -> StoreResult<Decimal> {
    let debited: Option<(Decimal,)> = sqlx::query_as(
        r#"
        UPDATE users
        SET balance = balance - $2
        WHERE id = $1 AND balance >= $2
        RETURNING balance
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .fetch_optional(&mut **tx)
    .await?;

    if let Some((balance,)) = debited {
        return Ok(balance);
    }

    let current: Option<(Decimal,)> = sqlx::query_as("SELECT balance FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;

    match current {
        Some((available,)) => Err(StoreError::InsufficientBalance {
            available,
            required: amount,
        }),
        None => Err(StoreError::AccountNotFound(user_id)),
    }
}

pub async fn credit(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    amount: Decimal,
) -> StoreResult<Decimal> {
    let row: Option<(Decimal,)> = sqlx::query_as(
        "UPDATE users SET balance = balance + $2 WHERE id = $1 RETURNING balance",
    )
    .bind(user_id)
    .bind(amount)
    .fetch_optional(&mut **tx)
    .await?;

    row.map(|(balance,)| balance)
        .ok_or(StoreError::AccountNotFound(user_id))
}

pub async fn balance_in(tx: &mut Transaction<'_, Postgres>, user_id: Uuid) -> StoreResult<Decimal> {
    let row: Option<(Decimal,)> = sqlx::query_as("SELECT balance FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;

    row.map(|(balance,)| balance)
        .ok_or(StoreError::AccountNotFound(user_id))
}
