use crate::db::connection::DbPool;
use crate::db::models::Choice;
use sqlx::Error;
use uuid::Uuid;

pub async fn add_choice(
    pool: &DbPool,
    question_id: Uuid,
    choice_text: &str,
) -> Result<Uuid, Error> {
    let choice_id = Uuid::new_v4();

    sqlx::query("INSERT INTO choices (id, question_id, choice_text) VALUES ($1, $2, $3)")
        .bind(choice_id)
        .bind(question_id)
        .bind(choice_text)
        .execute(pool)
        .await?;

    Ok(choice_id)
}

/// Fetch a choice only if it belongs to the given question.
pub async fn get_choice_for_question(
    pool: &DbPool,
    question_id: Uuid,
    choice_id: Uuid,
) -> Result<Option<Choice>, Error> {
    let row = sqlx::query_as::<_, Choice>(
        "SELECT id, question_id, choice_text, votes FROM choices \
         WHERE id = $1 AND question_id = $2",
    )
    .bind(choice_id)
    .bind(question_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn list_choices(pool: &DbPool, question_id: Uuid) -> Result<Vec<Choice>, Error> {
    let rows = sqlx::query_as::<_, Choice>(
        "SELECT id, question_id, choice_text, votes FROM choices \
         WHERE question_id = $1 ORDER BY choice_text",
    )
    .bind(question_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Re-derive every vote count for the question from the vote rows.
///
/// Counting from the source of truth keeps the tallies correct when a ballot
/// moves from one choice to another, where an increment would drift.
pub async fn recount_votes(pool: &DbPool, question_id: Uuid) -> Result<(), Error> {
    sqlx::query(
        r#"
        UPDATE choices SET votes = tally.vote_count
        FROM (
            SELECT c.id AS choice_id, COUNT(v.id) AS vote_count
            FROM choices c
            LEFT JOIN votes v ON v.choice_id = c.id
            WHERE c.question_id = $1
            GROUP BY c.id
        ) AS tally
        WHERE choices.id = tally.choice_id
        "#,
    )
    .bind(question_id)
    .execute(pool)
    .await?;

    Ok(())
}
