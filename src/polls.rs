use crate::audit::client_ip;
use crate::auth::{SessionUser, maybe_session_user, session_user};
use crate::db::models::Question;
use crate::db::repositories::{choice_repository, question_repository, vote_repository};
use crate::db::repositories::question_repository::{QuestionFilter, QuestionOrder};
use crate::error::{PollError, VoteError};
use crate::startup::AppState;
use crate::voting::cast_vote;
use axum::{
    extract::{ConnectInfo, Extension, Form, Json, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tower_sessions::Session;
use uuid::Uuid;

const FLASH_KEY: &str = "flash_messages";

// Response DTOs
#[derive(Debug, Serialize)]
pub struct QuestionSummary {
    pub id: Uuid,
    pub question_text: String,
    pub pub_date: String,
    pub published_recently: bool,
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub latest_questions: Vec<QuestionSummary>,
    pub username: Option<String>,
    pub messages: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ChoiceOption {
    pub id: Uuid,
    pub choice_text: String,
}

#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub id: Uuid,
    pub question_text: String,
    pub pub_date: String,
    pub choices: Vec<ChoiceOption>,
    pub previous_vote: Option<String>,
    pub error_message: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChoiceTally {
    pub id: Uuid,
    pub choice_text: String,
    pub votes: i64,
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub id: Uuid,
    pub question_text: String,
    pub choices: Vec<ChoiceTally>,
}

#[derive(Debug, Deserialize)]
pub struct VoteForm {
    pub choice: Option<String>,
}

async fn push_flash(session: &Session, message: &str) {
    let mut messages: Vec<String> = session
        .get(FLASH_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    messages.push(message.to_string());
    let _ = session.insert(FLASH_KEY, messages).await;
}

/// Pending flash messages, cleared once read.
async fn take_flash(session: &Session) -> Vec<String> {
    session
        .remove::<Vec<String>>(FLASH_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

fn parse_choice(raw: Option<&str>) -> Option<Uuid> {
    raw.and_then(|value| Uuid::parse_str(value.trim()).ok())
}

/// The detail page context: the question, its choices, and the acting user's
/// current ballot for it (if any).
async fn detail_page(
    app_state: &AppState,
    user: Option<&SessionUser>,
    question: Question,
    error_message: Option<String>,
) -> Result<DetailResponse, PollError> {
    let choices = choice_repository::list_choices(&app_state.db, question.id).await?;

    let previous_vote = match user {
        Some(user) => {
            vote_repository::previous_vote_text(&app_state.db, user.id, question.id).await?
        }
        None => None,
    };

    Ok(DetailResponse {
        id: question.id,
        question_text: question.question_text,
        pub_date: question.pub_date.to_rfc3339(),
        choices: choices
            .into_iter()
            .map(|choice| ChoiceOption {
                id: choice.id,
                choice_text: choice.choice_text,
            })
            .collect(),
        previous_vote,
        error_message,
        username: user.map(|user| user.username.clone()),
    })
}

/// List every published question, newest first
pub async fn index(
    Extension(app_state): Extension<AppState>,
    session: Session,
) -> Result<impl IntoResponse, PollError> {
    let now = Utc::now();

    let username = maybe_session_user(&session).await.map(|user| user.username);
    let messages = take_flash(&session).await;

    let filter = QuestionFilter {
        published_no_later_than: Some(now),
        order: QuestionOrder::NewestFirst,
    };
    let questions = question_repository::list_questions(&app_state.db, &filter).await?;

    let latest_questions = questions
        .into_iter()
        .map(|question| {
            let published_recently = question.was_published_recently(now);
            QuestionSummary {
                id: question.id,
                question_text: question.question_text,
                pub_date: question.pub_date.to_rfc3339(),
                published_recently,
            }
        })
        .collect();

    Ok((
        StatusCode::OK,
        Json(IndexResponse {
            latest_questions,
            username,
            messages,
        }),
    ))
}

/// The voting page for one question
///
/// Unknown ids and questions outside their voting window both send the
/// browser back to the index with a flash message.
pub async fn detail(
    Extension(app_state): Extension<AppState>,
    session: Session,
    Path(question_id): Path<Uuid>,
) -> Result<Response, PollError> {
    let now = Utc::now();

    let Some(question) = question_repository::get_question(&app_state.db, question_id).await?
    else {
        push_flash(&session, "This poll does not exist.").await;
        return Ok(Redirect::to("/").into_response());
    };

    if !question.can_vote(now) {
        push_flash(&session, "This poll is already closed.").await;
        return Ok(Redirect::to("/").into_response());
    }

    let user = maybe_session_user(&session).await;
    let page = detail_page(&app_state, user.as_ref(), question, None).await?;

    Ok((StatusCode::OK, Json(page)).into_response())
}

/// Current tallies for one question, visible regardless of the voting window
pub async fn results(
    Extension(app_state): Extension<AppState>,
    Path(question_id): Path<Uuid>,
) -> Result<impl IntoResponse, PollError> {
    let question = question_repository::get_question(&app_state.db, question_id)
        .await?
        .ok_or(PollError::QuestionNotFound)?;

    let choices = choice_repository::list_choices(&app_state.db, question_id).await?;

    Ok((
        StatusCode::OK,
        Json(ResultsResponse {
            id: question.id,
            question_text: question.question_text,
            choices: choices
                .into_iter()
                .map(|choice| ChoiceTally {
                    id: choice.id,
                    choice_text: choice.choice_text,
                    votes: choice.votes,
                })
                .collect(),
        }),
    ))
}

/// Cast a ballot (authenticated users only)
///
/// A missing or foreign `choice` re-renders the detail context with an inline
/// error message rather than failing the request; success redirects to the
/// results view.
pub async fn vote(
    Extension(app_state): Extension<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    session: Session,
    Path(question_id): Path<Uuid>,
    Form(form): Form<VoteForm>,
) -> Result<Response, PollError> {
    let user = session_user(&session)
        .await
        .map_err(|_| PollError::Unauthorized)?;
    let ip = client_ip(&headers, remote);

    let Some(choice_id) = parse_choice(form.choice.as_deref()) else {
        let question = question_repository::get_question(&app_state.db, question_id)
            .await?
            .ok_or(PollError::QuestionNotFound)?;
        if !question.can_vote(Utc::now()) {
            push_flash(&session, "This poll is already closed.").await;
            return Ok(Redirect::to("/").into_response());
        }
        let page = detail_page(
            &app_state,
            Some(&user),
            question,
            Some("You didn't select a choice.".to_string()),
        )
        .await?;
        return Ok((StatusCode::OK, Json(page)).into_response());
    };

    match cast_vote(&app_state, &user, &ip, question_id, choice_id).await {
        Ok(()) => Ok(Redirect::to(&format!("/{question_id}/results")).into_response()),
        Err(VoteError::QuestionNotFound) => Err(PollError::QuestionNotFound),
        Err(VoteError::VotingClosed) => {
            push_flash(&session, "This poll is already closed.").await;
            Ok(Redirect::to("/").into_response())
        }
        Err(VoteError::InvalidChoice) => {
            let question = question_repository::get_question(&app_state.db, question_id)
                .await?
                .ok_or(PollError::QuestionNotFound)?;
            let page = detail_page(
                &app_state,
                Some(&user),
                question,
                Some("You didn't select a choice.".to_string()),
            )
            .await?;
            Ok((StatusCode::OK, Json(page)).into_response())
        }
        Err(VoteError::DatabaseError(msg)) => Err(PollError::DatabaseError(msg)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_choice_accepts_a_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_choice(Some(&id.to_string())), Some(id));
    }

    #[test]
    fn parse_choice_trims_whitespace() {
        let id = Uuid::new_v4();
        assert_eq!(parse_choice(Some(&format!("  {id} "))), Some(id));
    }

    #[test]
    fn parse_choice_rejects_missing_field() {
        assert_eq!(parse_choice(None), None);
    }

    #[test]
    fn parse_choice_rejects_empty_field() {
        assert_eq!(parse_choice(Some("")), None);
    }

    #[test]
    fn parse_choice_rejects_garbage() {
        assert_eq!(parse_choice(Some("not-a-uuid")), None);
    }
}
