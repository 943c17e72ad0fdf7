// src/domain/comments.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::core::{AuctionId, CommentId, Entity, Errors, User, UserId, Validator};

pub const MAX_COMMENT_LENGTH: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
    Active,
    Flagged,
    Deleted,
}

impl CommentStatus {
    pub const ALL: [CommentStatus; 3] = [
        CommentStatus::Active,
        CommentStatus::Flagged,
        CommentStatus::Deleted,
    ];
}

impl fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CommentStatus::Active => "active",
            CommentStatus::Flagged => "flagged",
            CommentStatus::Deleted => "deleted",
        };
        write!(f, "{}", text)
    }
}

impl FromStr for CommentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommentStatus::ALL
            .iter()
            .copied()
            .find(|status| status.to_string() == s)
            .ok_or_else(|| format!("Unknown comment status: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    pub user: UserId,
    pub reason: String,
    pub flagged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub auction_id: AuctionId,
    pub user: UserId,
    pub user_name: String,
    pub content: String,
    pub status: CommentStatus,
    pub flags: Vec<Flag>,
    pub deletion_reason: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing)]
    pub seq: u64,
}

impl Comment {
    pub fn new(
        id: CommentId,
        auction_id: AuctionId,
        author: &User,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<Comment, Errors> {
        let content = content.trim();
        let mut v = Validator::new();
        v.check(!content.is_empty(), "content", "Comment cannot be empty")
            .check(
                content.chars().count() <= MAX_COMMENT_LENGTH,
                "content",
                "Comment is too long",
            );
        v.finish()?;

        Ok(Comment {
            id,
            auction_id,
            user: author.user_id().clone(),
            user_name: author.name().to_string(),
            content: content.to_string(),
            status: CommentStatus::Active,
            flags: Vec::new(),
            deletion_reason: None,
            deleted_at: None,
            created_at: at,
            updated_at: at,
            seq: 0,
        })
    }

    fn transition_error(&self, action: &'static str) -> Errors {
        Errors::InvalidStateTransition {
            entity: Entity::Comment,
            status: self.status.to_string(),
            action,
        }
    }

    pub fn is_flagged_by(&self, user: &UserId) -> bool {
        self.flags.iter().any(|flag| &flag.user == user)
    }

    /// A second flag from the same user is collapsed into the first one.
    pub fn flag(&self, user: &User, reason: &str, at: DateTime<Utc>) -> Result<Comment, Errors> {
        if self.status == CommentStatus::Deleted {
            return Err(self.transition_error("flag"));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(Errors::invalid("reason", "A reason is required to flag a comment"));
        }

        let mut next = self.clone();
        if !self.is_flagged_by(user.user_id()) {
            next.flags.push(Flag {
                user: user.user_id().clone(),
                reason: reason.to_string(),
                flagged_at: at,
            });
            next.updated_at = at;
        }
        if !next.flags.is_empty() {
            next.status = CommentStatus::Flagged;
        }
        Ok(next)
    }

    pub fn clear_flags(&self, at: DateTime<Utc>) -> Result<Comment, Errors> {
        if self.status == CommentStatus::Deleted {
            return Err(self.transition_error("clear flags of"));
        }
        let mut next = self.clone();
        next.flags.clear();
        next.status = CommentStatus::Active;
        next.updated_at = at;
        Ok(next)
    }

    /// Soft delete, the content is kept for moderators.
    pub fn delete(&self, reason: &str, at: DateTime<Utc>) -> Result<Comment, Errors> {
        if self.status == CommentStatus::Deleted {
            return Err(self.transition_error("delete"));
        }
        let mut next = self.clone();
        next.status = CommentStatus::Deleted;
        next.deletion_reason = Some(reason.trim().to_string()).filter(|r| !r.is_empty());
        next.deleted_at = Some(at);
        next.updated_at = at;
        Ok(next)
    }

    pub fn restore(&self, at: DateTime<Utc>) -> Result<Comment, Errors> {
        if self.status != CommentStatus::Deleted {
            return Err(self.transition_error("restore"));
        }
        let mut next = self.clone();
        next.status = CommentStatus::Active;
        next.deletion_reason = None;
        next.deleted_at = None;
        next.updated_at = at;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn user(n: u8) -> User {
        User::Bidder { user_id: format!("u{}", n), name: format!("User {}", n) }
    }

    fn comment() -> Comment {
        Comment::new(Uuid::from_u128(1), Uuid::from_u128(2), &user(1), "  Any rust on the frame?  ", at()).unwrap()
    }

    #[test]
    fn content_is_trimmed_and_bounded() {
        assert_eq!(comment().content, "Any rust on the frame?");
        assert!(Comment::new(Uuid::new_v4(), Uuid::new_v4(), &user(1), "   ", at()).is_err());
        let long = "x".repeat(MAX_COMMENT_LENGTH + 1);
        assert!(Comment::new(Uuid::new_v4(), Uuid::new_v4(), &user(1), &long, at()).is_err());
    }

    #[test]
    fn flagging_moves_to_flagged_and_collapses_repeats() {
        let flagged = comment().flag(&user(2), "spam", at()).unwrap();
        assert_eq!(flagged.status, CommentStatus::Flagged);
        assert_eq!(flagged.flags.len(), 1);

        let again = flagged.flag(&user(2), "still spam", at()).unwrap();
        assert_eq!(again.flags, flagged.flags);

        let other = again.flag(&user(3), "rude", at()).unwrap();
        assert_eq!(other.flags.len(), 2);
        assert!(comment().flag(&user(2), "  ", at()).is_err());
    }

    #[test]
    fn clearing_flags_always_resets() {
        for count in 0..3u8 {
            let mut c = comment();
            for n in 0..count {
                c = c.flag(&user(10 + n), "reason", at()).unwrap();
            }
            let cleared = c.clear_flags(at()).unwrap();
            assert!(cleared.flags.is_empty());
            assert_eq!(cleared.status, CommentStatus::Active);
        }
    }

    #[test]
    fn delete_and_restore() {
        let deleted = comment().delete("off-topic", at()).unwrap();
        assert_eq!(deleted.status, CommentStatus::Deleted);
        assert_eq!(deleted.content, "Any rust on the frame?");
        assert_eq!(deleted.deletion_reason.as_deref(), Some("off-topic"));
        assert!(deleted.flag(&user(2), "spam", at()).is_err());

        let restored = deleted.restore(at()).unwrap();
        assert_eq!(restored.status, CommentStatus::Active);
        assert_eq!(restored.deletion_reason, None);

        assert!(matches!(
            comment().restore(at()),
            Err(Errors::InvalidStateTransition { .. })
        ));
    }
}
