use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Question {
    pub id: Uuid,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl Question {
    /// A question is visible once its publication date has passed.
    pub fn is_published(&self, now: DateTime<Utc>) -> bool {
        now >= self.pub_date
    }

    /// True when the publication date falls within the last 24 hours.
    pub fn was_published_recently(&self, now: DateTime<Utc>) -> bool {
        now - Duration::days(1) <= self.pub_date && self.pub_date <= now
    }

    /// Votes are accepted between publication and end date, bounds inclusive.
    pub fn can_vote(&self, now: DateTime<Utc>) -> bool {
        self.pub_date <= now && now <= self.end_date
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Choice {
    pub id: Uuid,
    pub question_id: Uuid,
    pub choice_text: String,
    pub votes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub question_id: Uuid,
    pub choice_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(pub_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Question {
        Question {
            id: Uuid::new_v4(),
            question_text: "What's new?".to_string(),
            pub_date,
            end_date,
        }
    }

    #[test]
    fn is_published_with_past_question() {
        let now = Utc::now();
        let q = question(now - Duration::days(1), now + Duration::days(1));
        assert!(q.is_published(now));
    }

    #[test]
    fn is_published_with_future_question() {
        let now = Utc::now();
        let q = question(now + Duration::days(1), now + Duration::days(2));
        assert!(!q.is_published(now));
    }

    #[test]
    fn is_published_at_exact_publication_instant() {
        let now = Utc::now();
        let q = question(now, now + Duration::days(1));
        assert!(q.is_published(now));
    }

    #[test]
    fn was_published_recently_with_future_question() {
        let now = Utc::now();
        let q = question(now + Duration::days(30), now + Duration::days(31));
        assert!(!q.was_published_recently(now));
    }

    #[test]
    fn was_published_recently_with_old_question() {
        let now = Utc::now();
        let q = question(
            now - Duration::days(1) - Duration::seconds(1),
            now + Duration::days(1),
        );
        assert!(!q.was_published_recently(now));
    }

    #[test]
    fn was_published_recently_with_recent_question() {
        let now = Utc::now();
        let q = question(
            now - Duration::hours(23) - Duration::minutes(59) - Duration::seconds(59),
            now + Duration::days(1),
        );
        assert!(q.was_published_recently(now));
    }

    #[test]
    fn can_vote_within_window() {
        let now = Utc::now();
        let q = question(now - Duration::days(1), now + Duration::days(1));
        assert!(q.can_vote(now));
    }

    #[test]
    fn can_vote_before_publication() {
        let now = Utc::now();
        let q = question(now + Duration::days(1), now + Duration::days(2));
        assert!(!q.can_vote(now));
    }

    #[test]
    fn can_vote_after_end_date() {
        let now = Utc::now();
        let q = question(now - Duration::days(2), now - Duration::days(1));
        assert!(!q.can_vote(now));
    }

    #[test]
    fn can_vote_at_window_bounds() {
        let now = Utc::now();
        let opens_now = question(now, now + Duration::days(1));
        let closes_now = question(now - Duration::days(1), now);
        assert!(opens_now.can_vote(now));
        assert!(closes_now.can_vote(now));
    }
}
