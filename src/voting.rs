use crate::audit::AuthEvent;
use crate::auth::SessionUser;
use crate::db::repositories::{choice_repository, question_repository, vote_repository};
use crate::error::VoteError;
use crate::startup::AppState;
use chrono::Utc;
use uuid::Uuid;

/// Record `voter`'s ballot for a question.
///
/// Rejections happen before any write: an unknown question, a closed voting
/// window, or a choice that is not a child of the question leave the store
/// untouched. On success the ballot is upserted (one per user per question,
/// latest wins), every choice tally for the question is re-derived from the
/// vote rows, and a `VoteCast` audit event is emitted.
pub async fn cast_vote(
    state: &AppState,
    voter: &SessionUser,
    ip: &str,
    question_id: Uuid,
    choice_id: Uuid,
) -> Result<(), VoteError> {
    let now = Utc::now();

    let question = question_repository::get_question(&state.db, question_id)
        .await?
        .ok_or(VoteError::QuestionNotFound)?;

    if !question.can_vote(now) {
        return Err(VoteError::VotingClosed);
    }

    choice_repository::get_choice_for_question(&state.db, question_id, choice_id)
        .await?
        .ok_or(VoteError::InvalidChoice)?;

    vote_repository::upsert_vote(&state.db, voter.id, question_id, choice_id).await?;
    choice_repository::recount_votes(&state.db, question_id).await?;

    state.auth_events.emit(&AuthEvent::VoteCast {
        username: voter.username.clone(),
        ip: ip.to_string(),
        question_id,
        at: now,
    });

    Ok(())
}
