// src/services/notifier.rs
//! Outgoing notifications. Delivery is best effort: callers log failures and
//! carry on, a lost email never undoes a committed change.
use log::{info, warn};
use thiserror::Error;

use crate::domain::{CommandSuccess, OfferStatus, Repository};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Delivery to {recipient} failed: {reason}")]
    Delivery { recipient: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Email address, or `user:<id>` for account holders.
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

pub trait Notifier: Send + Sync {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log instead of a mail relay.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            "{:<12} --> to={} subject={:?}",
            "Notify", notification.recipient, notification.subject
        );
        Ok(())
    }
}

pub fn deliver(notifier: &dyn Notifier, notifications: &[Notification]) {
    for notification in notifications {
        if let Err(e) = notifier.send(notification) {
            warn!("{:<12} --> {}", "Notify", e);
        }
    }
}

fn user(id: &str) -> String {
    format!("user:{}", id)
}

/// Messages owed to people affected by a committed command.
pub fn notifications_for(success: &CommandSuccess, repository: &Repository) -> Vec<Notification> {
    match success {
        CommandSuccess::ContactQuerySubmitted { query } => vec![Notification {
            recipient: query.email.clone(),
            subject: format!("We received your message [{}]", query.query_id()),
            body: format!(
                "Hi {}, thanks for reaching out. Our team will get back to you soon.",
                query.name
            ),
        }],
        CommandSuccess::ContactQueryUpdated { previous, query }
            if query.status.is_responded()
                && !query.response.is_empty()
                && query.response != previous.response =>
        {
            vec![Notification {
                recipient: query.email.clone(),
                subject: format!("Update on your query [{}]", query.query_id()),
                body: query.response.clone(),
            }]
        }
        CommandSuccess::OfferMade { offer } => vec![Notification {
            recipient: user(&offer.seller),
            subject: "New offer on your auction".to_string(),
            body: format!("{} offered {}", offer.bidder_name, offer.amount),
        }],
        CommandSuccess::OfferUpdated { offer } => match offer.status {
            OfferStatus::Rejected | OfferStatus::Countered => vec![Notification {
                recipient: user(&offer.bidder),
                subject: format!("Your offer was {}", offer.status),
                body: offer.seller_response.clone().unwrap_or_default(),
            }],
            OfferStatus::Withdrawn => vec![Notification {
                recipient: user(&offer.seller),
                subject: "An offer was withdrawn".to_string(),
                body: format!("{} withdrew their offer of {}", offer.bidder_name, offer.amount),
            }],
            _ => Vec::new(),
        },
        CommandSuccess::AuctionSold { auction, closed_offers, .. } => {
            let mut out = vec![Notification {
                recipient: user(auction.seller_id()),
                subject: format!("{} has sold", auction.details.title),
                body: format!("Final price {}{}", auction.details.currency, auction.current_price),
            }];
            if let Some(winner) = &auction.winner {
                out.push(Notification {
                    recipient: user(winner),
                    subject: format!("You won {}", auction.details.title),
                    body: format!("Final price {}{}", auction.details.currency, auction.current_price),
                });
            }
            out.extend(closed_offers.iter().filter_map(|id| repository.offers.get(id)).map(|offer| {
                Notification {
                    recipient: user(&offer.bidder),
                    subject: "Your offer was declined".to_string(),
                    body: offer.seller_response.clone().unwrap_or_default(),
                }
            }));
            out
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContactForm, ContactQuery, ContactQueryPatch, QueryStatus};
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;
    use uuid::Uuid;

    struct Failing(Mutex<usize>);

    impl Notifier for Failing {
        fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
            *self.0.lock().unwrap() += 1;
            Err(NotifyError::Delivery {
                recipient: notification.recipient.clone(),
                reason: "relay down".into(),
            })
        }
    }

    fn query() -> ContactQuery {
        let form = ContactForm {
            name: Some("A".into()),
            email: Some("a@x.com".into()),
            user_type: Some("seller".into()),
            message: Some("help".into()),
            ..ContactForm::default()
        };
        ContactQuery::submit(Uuid::new_v4(), &form, None, None, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
            .unwrap()
    }

    #[test]
    fn failures_are_swallowed() {
        let notifier = Failing(Mutex::new(0));
        let success = CommandSuccess::ContactQuerySubmitted { query: query() };
        let notes = notifications_for(&success, &Repository::default());
        deliver(&notifier, &notes);
        assert_eq!(*notifier.0.lock().unwrap(), 1);
    }

    #[test]
    fn only_new_responses_are_mailed() {
        let previous = query();
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let resolved = previous.apply(
            &ContactQueryPatch {
                status: Some(QueryStatus::Resolved),
                response: Some("Fixed".into()),
                ..Default::default()
            },
            at,
        );
        let success = CommandSuccess::ContactQueryUpdated { previous: previous.clone(), query: resolved.clone() };
        assert_eq!(notifications_for(&success, &Repository::default()).len(), 1);

        let again = CommandSuccess::ContactQueryUpdated { previous: resolved.clone(), query: resolved };
        assert!(notifications_for(&again, &Repository::default()).is_empty());
    }
}
