// src/domain/offers.rs
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::auctions::Auction;
use super::core::{AuctionId, Entity, Errors, OfferId, User, UserId, Validator};
use super::states::State;
use crate::money::AmountValue;

/// How long a bidder's offer stays open for the seller.
pub const OFFER_WINDOW_HOURS: i64 = 48;

pub const SUPERSEDED_RESPONSE: &str = "Auction sold to another buyer";
pub const CANCELLED_RESPONSE: &str = "Auction was cancelled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Countered,
    Expired,
    Withdrawn,
}

impl OfferStatus {
    pub const ALL: [OfferStatus; 6] = [
        OfferStatus::Pending,
        OfferStatus::Accepted,
        OfferStatus::Rejected,
        OfferStatus::Countered,
        OfferStatus::Expired,
        OfferStatus::Withdrawn,
    ];

    /// Offers still waiting on somebody: the seller for `pending`, the
    /// bidder for `countered`.
    pub fn is_open(&self) -> bool {
        matches!(self, OfferStatus::Pending | OfferStatus::Countered)
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            OfferStatus::Pending => "pending",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Rejected => "rejected",
            OfferStatus::Countered => "countered",
            OfferStatus::Expired => "expired",
            OfferStatus::Withdrawn => "withdrawn",
        };
        write!(f, "{}", text)
    }
}

impl FromStr for OfferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OfferStatus::ALL
            .iter()
            .copied()
            .find(|status| status.to_string() == s)
            .ok_or_else(|| format!("Unknown offer status: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterOffer {
    pub amount: AmountValue,
    pub message: Option<String>,
    pub countered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SellerDecision {
    Accept,
    Reject { message: Option<String> },
    Counter { amount: AmountValue, message: Option<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CounterDecision {
    Accept,
    Decline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: OfferId,
    pub auction_id: AuctionId,
    pub bidder: UserId,
    pub bidder_name: String,
    pub seller: UserId,
    pub amount: AmountValue,
    pub message: Option<String>,
    pub status: OfferStatus,
    pub counter_offer: Option<CounterOffer>,
    pub seller_response: Option<String>,
    /// Price the sale closed at, set once the offer is accepted.
    pub agreed_amount: Option<AmountValue>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing)]
    pub seq: u64,
}

impl Offer {
    pub fn new(
        id: OfferId,
        auction: &Auction,
        bidder: &User,
        amount: AmountValue,
        message: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Offer, Errors> {
        if bidder.user_id() == auction.seller_id() {
            return Err(Errors::SellerCannotParticipate(auction.id));
        }
        let mut v = Validator::new();
        v.check(amount > 0, "amount", "Offer amount must be positive")
            .within_limit(amount, "amount");
        v.finish()?;

        let auction = auction.inc(at);
        if !auction.accepts_offers() {
            return Err(Errors::InvalidStateTransition {
                entity: Entity::Auction,
                status: auction.status.to_string(),
                action: "make an offer on",
            });
        }

        Ok(Offer {
            id,
            auction_id: auction.id,
            bidder: bidder.user_id().clone(),
            bidder_name: bidder.name().to_string(),
            seller: auction.seller_id().clone(),
            amount,
            message: message.filter(|m| !m.trim().is_empty()),
            status: OfferStatus::Pending,
            counter_offer: None,
            seller_response: None,
            agreed_amount: None,
            created_at: at,
            expires_at: at + Duration::hours(OFFER_WINDOW_HOURS),
            responded_at: None,
            updated_at: at,
            seq: 0,
        })
    }

    fn transition_error(&self, action: &'static str) -> Errors {
        Errors::InvalidStateTransition {
            entity: Entity::Offer,
            status: self.status.to_string(),
            action,
        }
    }

    fn require(&self, status: OfferStatus, action: &'static str) -> Result<(), Errors> {
        if self.status == status {
            Ok(())
        } else {
            Err(self.transition_error(action))
        }
    }

    fn settle(&self, status: OfferStatus, at: DateTime<Utc>) -> Offer {
        let mut next = self.clone();
        next.status = status;
        next.updated_at = at;
        next
    }

    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.status == OfferStatus::Pending && self.expires_at > now {
            Some(self.expires_at - now)
        } else {
            None
        }
    }

    /// Seller's answer to a pending offer.
    pub fn respond(&self, decision: &SellerDecision, at: DateTime<Utc>) -> Result<Offer, Errors> {
        let current = self.inc(at);
        current.require(OfferStatus::Pending, "respond to")?;

        let mut next = match decision {
            SellerDecision::Accept => {
                let mut next = current.settle(OfferStatus::Accepted, at);
                next.agreed_amount = Some(current.amount);
                next
            }
            SellerDecision::Reject { message } => {
                let mut next = current.settle(OfferStatus::Rejected, at);
                next.seller_response = message.clone();
                next
            }
            SellerDecision::Counter { amount, message } => {
                let mut v = Validator::new();
                v.check(*amount > 0, "amount", "Counter offer amount must be positive")
                    .within_limit(*amount, "amount");
                v.finish()?;
                let mut next = current.settle(OfferStatus::Countered, at);
                next.counter_offer = Some(CounterOffer {
                    amount: *amount,
                    message: message.clone(),
                    countered_at: at,
                });
                next.seller_response = message.clone();
                next
            }
        };
        next.responded_at = Some(at);
        Ok(next)
    }

    /// Bidder's answer to the seller's counter offer.
    pub fn respond_to_counter(&self, decision: CounterDecision, at: DateTime<Utc>) -> Result<Offer, Errors> {
        self.require(OfferStatus::Countered, "answer the counter of")?;
        match decision {
            CounterDecision::Accept => {
                let mut next = self.settle(OfferStatus::Accepted, at);
                next.agreed_amount = self.counter_offer.as_ref().map(|c| c.amount);
                Ok(next)
            }
            CounterDecision::Decline => Ok(self.settle(OfferStatus::Rejected, at)),
        }
    }

    pub fn withdraw(&self, at: DateTime<Utc>) -> Result<Offer, Errors> {
        let current = self.inc(at);
        current.require(OfferStatus::Pending, "withdraw")?;
        Ok(current.settle(OfferStatus::Withdrawn, at))
    }

    /// Closes an open offer because the auction no longer takes offers.
    pub fn close_unanswered(&self, response: &str, at: DateTime<Utc>) -> Offer {
        let current = self.inc(at);
        if !current.status.is_open() {
            return current;
        }
        let mut next = current.settle(OfferStatus::Rejected, at);
        next.seller_response = Some(response.to_string());
        next
    }
}

impl State for Offer {
    /// Pending offers lapse once their window has passed.
    fn inc(&self, now: DateTime<Utc>) -> Offer {
        if self.status == OfferStatus::Pending && self.expires_at < now {
            self.settle(OfferStatus::Expired, now)
        } else {
            self.clone()
        }
    }

    fn has_ended(&self) -> bool {
        !self.status.is_open()
    }
}
