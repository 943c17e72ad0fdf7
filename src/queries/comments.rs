// src/queries/comments.rs
use serde::Deserialize;
use std::collections::BTreeMap;

use super::{filter_value, histogram, paginate, Page, PageRequest};
use crate::domain::{AuctionId, Comment, CommentStatus, Repository};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentFilter {
    pub status: Option<String>,
    pub auction_id: Option<AuctionId>,
}

/// Moderation queue: most flagged first, then newest.
pub fn moderation_queue<'a>(repository: &'a Repository, filter: &CommentFilter, page: PageRequest) -> Page<&'a Comment> {
    let status: Option<CommentStatus> = filter_value(&filter.status);
    let mut matching: Vec<&Comment> = repository
        .comment_list()
        .into_iter()
        .filter(|c| status.map_or(true, |s| c.status == s))
        .filter(|c| filter.auction_id.map_or(true, |id| c.auction_id == id))
        .collect();
    matching.sort_by(|a, b| {
        b.flags
            .len()
            .cmp(&a.flags.len())
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    paginate(matching, page)
}

/// Public thread under an auction, oldest first, without deleted comments.
pub fn auction_thread<'a>(repository: &'a Repository, auction_id: &AuctionId) -> Vec<&'a Comment> {
    let mut thread: Vec<&Comment> = repository
        .comments_for_auction(auction_id)
        .into_iter()
        .filter(|c| c.status != CommentStatus::Deleted)
        .collect();
    thread.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    thread
}

pub fn status_histogram(repository: &Repository) -> BTreeMap<String, usize> {
    histogram(&CommentStatus::ALL, repository.comments.values().map(|c| c.status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn user(n: u8) -> User {
        User::Bidder { user_id: format!("u{}", n), name: format!("U{}", n) }
    }

    fn repo() -> Repository {
        let at = Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap();
        let auction_id = Uuid::from_u128(1);
        let mut repo = Repository::default();
        for n in 0..3u8 {
            let comment = Comment::new(
                Uuid::from_u128(10 + n as u128),
                auction_id,
                &user(n),
                &format!("comment {}", n),
                at + Duration::minutes(n as i64),
            )
            .unwrap();
            repo.comments.insert(comment.id, comment);
        }
        let flagged = repo.comments[&Uuid::from_u128(10)]
            .flag(&user(1), "spam", at)
            .and_then(|c| c.flag(&user(2), "rude", at))
            .unwrap();
        repo.comments.insert(flagged.id, flagged);
        let deleted = repo.comments[&Uuid::from_u128(12)].delete("off topic", at).unwrap();
        repo.comments.insert(deleted.id, deleted);
        repo
    }

    #[test]
    fn queue_puts_most_flagged_first() {
        let repo = repo();
        let page = moderation_queue(&repo, &CommentFilter::default(), PageRequest::default());
        assert_eq!(page.items[0].id, Uuid::from_u128(10));
        assert_eq!(page.total, 3);

        let deleted = CommentFilter { status: Some("deleted".into()), auction_id: None };
        let page = moderation_queue(&repo, &deleted, PageRequest::default());
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, Uuid::from_u128(12));
    }

    #[test]
    fn thread_hides_deleted_comments() {
        let repo = repo();
        let thread = auction_thread(&repo, &Uuid::from_u128(1));
        let ids: Vec<_> = thread.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![Uuid::from_u128(10), Uuid::from_u128(11)]);
        assert_eq!(status_histogram(&repo)["flagged"], 1);
        assert_eq!(status_histogram(&repo)["deleted"], 1);
    }
}
