use crate::db::connection::DbPool;
use crate::db::models::User;
use sqlx::Error;
use uuid::Uuid;

pub async fn get_user_by_username(
    pool: &DbPool,
    username: &str,
) -> Result<Option<User>, Error> {
    let row = sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn create_user(
    pool: &DbPool,
    user_id: Uuid,
    username: &str,
    password_hash: &str,
) -> Result<(), Error> {
    sqlx::query("INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(username)
        .bind(password_hash)
        .execute(pool)
        .await?;

    Ok(())
}
