use crate::db::connection::DbPool;
use crate::db::models::Vote;
use sqlx::{Error, Row};
use uuid::Uuid;

/// Record the user's ballot for a question, replacing any earlier one.
pub async fn upsert_vote(
    pool: &DbPool,
    user_id: Uuid,
    question_id: Uuid,
    choice_id: Uuid,
) -> Result<Vote, Error> {
    let vote_id = Uuid::new_v4();

    let vote = sqlx::query_as::<_, Vote>(
        "INSERT INTO votes (id, user_id, question_id, choice_id) VALUES ($1, $2, $3, $4) \
         ON CONFLICT (question_id, user_id) DO UPDATE SET choice_id = EXCLUDED.choice_id \
         RETURNING id, user_id, question_id, choice_id",
    )
    .bind(vote_id)
    .bind(user_id)
    .bind(question_id)
    .bind(choice_id)
    .fetch_one(pool)
    .await?;

    Ok(vote)
}

/// The display text of the user's current ballot for a question, if any.
pub async fn previous_vote_text(
    pool: &DbPool,
    user_id: Uuid,
    question_id: Uuid,
) -> Result<Option<String>, Error> {
    let row = sqlx::query(
        "SELECT c.choice_text FROM votes v \
         JOIN choices c ON c.id = v.choice_id \
         WHERE v.user_id = $1 AND v.question_id = $2",
    )
    .bind(user_id)
    .bind(question_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.get("choice_text")))
}
