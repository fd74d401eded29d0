use crate::db::connection::DbPool;
use crate::db::models::Question;
use chrono::{DateTime, Utc};
use sqlx::Error;
use uuid::Uuid;

/// Filter and ordering applied by [`list_questions`].
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    /// Keep questions whose publication date is at or before this instant.
    pub published_no_later_than: Option<DateTime<Utc>>,
    pub order: QuestionOrder,
}

#[derive(Debug, Clone, Copy, Default)]
pub enum QuestionOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

pub async fn create_question(
    pool: &DbPool,
    question_text: &str,
    pub_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
) -> Result<Uuid, Error> {
    let question_id = Uuid::new_v4();

    sqlx::query("INSERT INTO questions (id, question_text, pub_date, end_date) VALUES ($1, $2, $3, $4)")
        .bind(question_id)
        .bind(question_text)
        .bind(pub_date)
        .bind(end_date)
        .execute(pool)
        .await?;

    Ok(question_id)
}

pub async fn get_question(pool: &DbPool, question_id: Uuid) -> Result<Option<Question>, Error> {
    let row = sqlx::query_as::<_, Question>(
        "SELECT id, question_text, pub_date, end_date FROM questions WHERE id = $1",
    )
    .bind(question_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn list_questions(
    pool: &DbPool,
    filter: &QuestionFilter,
) -> Result<Vec<Question>, Error> {
    let direction = match filter.order {
        QuestionOrder::NewestFirst => "DESC",
        QuestionOrder::OldestFirst => "ASC",
    };

    let rows = if let Some(cutoff) = filter.published_no_later_than {
        let sql = format!(
            "SELECT id, question_text, pub_date, end_date FROM questions \
             WHERE pub_date <= $1 ORDER BY pub_date {direction}"
        );
        sqlx::query_as::<_, Question>(&sql)
            .bind(cutoff)
            .fetch_all(pool)
            .await?
    } else {
        let sql = format!(
            "SELECT id, question_text, pub_date, end_date FROM questions \
             ORDER BY pub_date {direction}"
        );
        sqlx::query_as::<_, Question>(&sql).fetch_all(pool).await?
    };

    Ok(rows)
}
