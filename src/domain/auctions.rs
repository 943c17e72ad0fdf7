// src/domain/auctions.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::core::{AuctionId, Entity, Errors, User, UserId, Validator};
use super::media::{MediaItem, MediaKind};
use super::states::State;
use crate::money::{Amount, AmountValue, Currency, MoneyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuctionType {
    #[default]
    Standard,
    Reserve,
    BuyNow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionStatus {
    Draft,
    Active,
    Sold,
    Ended,
    Cancelled,
}

impl AuctionStatus {
    pub const ALL: [AuctionStatus; 5] = [
        AuctionStatus::Draft,
        AuctionStatus::Active,
        AuctionStatus::Sold,
        AuctionStatus::Ended,
        AuctionStatus::Cancelled,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AuctionStatus::Sold | AuctionStatus::Ended | AuctionStatus::Cancelled
        )
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AuctionStatus::Draft => "draft",
            AuctionStatus::Active => "active",
            AuctionStatus::Sold => "sold",
            AuctionStatus::Ended => "ended",
            AuctionStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", text)
    }
}

impl FromStr for AuctionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuctionStatus::ALL
            .iter()
            .copied()
            .find(|status| status.to_string() == s)
            .ok_or_else(|| format!("Unknown auction status: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionBid {
    pub bidder: UserId,
    pub bidder_name: String,
    pub amount: AmountValue,
    pub timestamp: DateTime<Utc>,
}

/// How an auction reached `sold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleChannel {
    Bidding,
    BuyNow,
    Offer,
}

/// Seller supplied listing fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionDetails {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub auction_type: AuctionType,
    #[serde(default)]
    pub currency: Currency,
    pub start_price: AmountValue,
    pub bid_increment: AmountValue,
    pub reserve_price: Option<AmountValue>,
    pub buy_now_price: Option<AmountValue>,
    #[serde(default)]
    pub allow_offers: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl AuctionDetails {
    pub fn validate(&self) -> Result<(), Errors> {
        let mut v = Validator::new();
        v.check(!self.title.trim().is_empty(), "title", "Title is required")
            .check(self.start_price > 0, "startPrice", "Start price must be positive")
            .check(self.bid_increment > 0, "bidIncrement", "Bid increment must be positive")
            .within_limit(self.start_price, "startPrice")
            .within_limit(self.bid_increment, "bidIncrement")
            .check(
                self.end_date > self.start_date,
                "endDate",
                "End date must be after start date",
            );

        match self.auction_type {
            AuctionType::Reserve => match self.reserve_price {
                Some(reserve) => {
                    v.check(
                        reserve >= self.start_price,
                        "reservePrice",
                        "Reserve price must be at least the start price",
                    )
                    .within_limit(reserve, "reservePrice");
                }
                None => {
                    v.push("reservePrice", "Reserve price is required for reserve auctions");
                }
            },
            AuctionType::BuyNow => match self.buy_now_price {
                Some(buy_now) => {
                    v.check(
                        buy_now >= self.start_price,
                        "buyNowPrice",
                        "Buy now price must be at least the start price",
                    )
                    .within_limit(buy_now, "buyNowPrice");
                }
                None => {
                    v.push("buyNowPrice", "Buy now price is required for buy now auctions");
                }
            },
            AuctionType::Standard => {}
        }
        v.finish()
    }

    fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.categories = self
            .categories
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if self.auction_type != AuctionType::Reserve {
            self.reserve_price = None;
        }
        if self.auction_type != AuctionType::BuyNow {
            self.buy_now_price = None;
        }
        self
    }
}

/// Partial update of the listing fields; absent fields stay as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub categories: Option<Vec<String>>,
    pub auction_type: Option<AuctionType>,
    pub start_price: Option<AmountValue>,
    pub bid_increment: Option<AmountValue>,
    pub reserve_price: Option<AmountValue>,
    pub buy_now_price: Option<AmountValue>,
    pub allow_offers: Option<bool>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl AuctionPatch {
    fn touches_pricing(&self) -> bool {
        self.auction_type.is_some()
            || self.start_price.is_some()
            || self.bid_increment.is_some()
            || self.reserve_price.is_some()
            || self.buy_now_price.is_some()
            || self.start_date.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub id: AuctionId,
    pub seller: User,
    #[serde(flatten)]
    pub details: AuctionDetails,
    pub photos: Vec<MediaItem>,
    pub documents: Vec<MediaItem>,
    pub service_records: Vec<MediaItem>,
    pub status: AuctionStatus,
    pub bids: Vec<AuctionBid>,
    pub current_price: AmountValue,
    pub winner: Option<UserId>,
    pub sold_via: Option<SaleChannel>,
    pub cancellation_reason: Option<String>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing)]
    pub seq: u64,
}

impl Auction {
    pub fn new(
        id: AuctionId,
        seller: User,
        details: AuctionDetails,
        photos: Vec<MediaItem>,
        documents: Vec<MediaItem>,
        service_records: Vec<MediaItem>,
        at: DateTime<Utc>,
    ) -> Result<Auction, Errors> {
        details.validate()?;
        if photos.len() < MediaKind::Photos.min_items() {
            return Err(Errors::invalid("photos", "At least one photo is required"));
        }
        let details = details.normalized();
        let status = if details.start_date <= at {
            AuctionStatus::Active
        } else {
            AuctionStatus::Draft
        };
        let auction = Auction {
            id,
            seller,
            current_price: details.start_price,
            details,
            photos,
            documents,
            service_records,
            status,
            bids: Vec::new(),
            winner: None,
            sold_via: None,
            cancellation_reason: None,
            version: 1,
            created_at: at,
            updated_at: at,
            seq: 0,
        };
        // An auction created after its end date closes straight away.
        Ok(auction.inc(at))
    }

    pub fn seller_id(&self) -> &UserId {
        self.seller.user_id()
    }

    pub fn media(&self, kind: MediaKind) -> &[MediaItem] {
        match kind {
            MediaKind::Photos => &self.photos,
            MediaKind::Documents => &self.documents,
            MediaKind::ServiceRecords => &self.service_records,
        }
    }

    pub fn set_media(&mut self, kind: MediaKind, items: Vec<MediaItem>) {
        match kind {
            MediaKind::Photos => self.photos = items,
            MediaKind::Documents => self.documents = items,
            MediaKind::ServiceRecords => self.service_records = items,
        }
    }

    pub fn ensure_version(&self, expected: Option<u64>) -> Result<(), Errors> {
        match expected {
            Some(expected) if expected != self.version => Err(Errors::Conflict {
                entity: Entity::Auction,
                id: self.id.to_string(),
                expected,
                actual: self.version,
            }),
            _ => Ok(()),
        }
    }

    pub fn ensure_editable_by(&self, editor: &User) -> Result<(), Errors> {
        if editor.is_admin() || editor.user_id() == self.seller_id() {
            Ok(())
        } else {
            Err(Errors::Forbidden(
                "Only the seller or an administrator may edit this auction".to_string(),
            ))
        }
    }

    fn transition_error(&self, action: &'static str) -> Errors {
        Errors::InvalidStateTransition {
            entity: Entity::Auction,
            status: self.status.to_string(),
            action,
        }
    }

    fn touched(mut self, at: DateTime<Utc>) -> Auction {
        self.version += 1;
        self.updated_at = at;
        self
    }

    /// Lowest amount the next bid may have.
    pub fn minimum_next_bid(&self) -> Result<AmountValue, MoneyError> {
        let currency = self.details.currency;
        if self.bids.is_empty() {
            Ok(self.details.start_price)
        } else {
            let next = Amount::new(currency, self.current_price) + Amount::new(currency, self.details.bid_increment);
            Ok(next?.value())
        }
    }

    pub fn highest_bid(&self) -> Option<&AuctionBid> {
        self.bids.iter().max_by(|a, b| {
            a.amount
                .cmp(&b.amount)
                .then_with(|| b.timestamp.cmp(&a.timestamp))
        })
    }

    /// Bids ordered by amount, highest first; equal amounts keep placement order.
    pub fn bids_by_amount(&self) -> Vec<AuctionBid> {
        let mut bids = self.bids.clone();
        bids.sort_by(|a, b| b.amount.cmp(&a.amount));
        bids
    }

    pub fn reserve_met(&self) -> bool {
        match (self.details.auction_type, self.details.reserve_price) {
            (AuctionType::Reserve, Some(reserve)) => self
                .highest_bid()
                .map(|bid| bid.amount >= reserve)
                .unwrap_or(false),
            _ => true,
        }
    }

    pub fn apply_patch(&self, patch: &AuctionPatch, at: DateTime<Utc>) -> Result<Auction, Errors> {
        let current = self.inc(at);
        if current.status.is_terminal() {
            return Err(current.transition_error("edit"));
        }
        if !current.bids.is_empty() && patch.touches_pricing() {
            return Err(Errors::invalid(
                "auctionType",
                "Pricing and start date cannot change once bidding has started",
            ));
        }

        let mut details = current.details.clone();
        if let Some(title) = &patch.title {
            details.title = title.clone();
        }
        if let Some(description) = &patch.description {
            details.description = description.clone();
        }
        if let Some(categories) = &patch.categories {
            details.categories = categories.clone();
        }
        if let Some(auction_type) = patch.auction_type {
            details.auction_type = auction_type;
        }
        if let Some(start_price) = patch.start_price {
            details.start_price = start_price;
        }
        if let Some(bid_increment) = patch.bid_increment {
            details.bid_increment = bid_increment;
        }
        if patch.reserve_price.is_some() {
            details.reserve_price = patch.reserve_price;
        }
        if patch.buy_now_price.is_some() {
            details.buy_now_price = patch.buy_now_price;
        }
        if let Some(allow_offers) = patch.allow_offers {
            details.allow_offers = allow_offers;
        }
        if let Some(start_date) = patch.start_date {
            details.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            details.end_date = end_date;
        }
        details.validate()?;
        if details.end_date <= at {
            return Err(Errors::invalid("endDate", "End date must be in the future"));
        }
        if current.status == AuctionStatus::Active && details.start_date > at {
            return Err(Errors::invalid(
                "startDate",
                "An auction that has started cannot be moved back to draft",
            ));
        }

        let mut next = current;
        if next.bids.is_empty() {
            next.current_price = details.start_price;
        }
        next.details = details.normalized();
        Ok(next.touched(at).inc(at))
    }

    pub fn add_bid(&self, bidder: &User, amount: AmountValue, at: DateTime<Utc>) -> Result<(Auction, AuctionBid), Errors> {
        if bidder.user_id() == self.seller_id() {
            return Err(Errors::SellerCannotParticipate(self.id));
        }
        let current = self.inc(at);
        if current.status != AuctionStatus::Active {
            return Err(current.transition_error("bid on"));
        }
        let mut v = Validator::new();
        v.within_limit(amount, "amount");
        v.finish()?;
        let minimum = current.minimum_next_bid()?;
        if amount < minimum {
            return Err(Errors::BidTooLow { minimum });
        }

        let bid = AuctionBid {
            bidder: bidder.user_id().clone(),
            bidder_name: bidder.name().to_string(),
            amount,
            timestamp: at,
        };
        let mut next = current;
        next.bids.push(bid.clone());
        next.current_price = amount;
        Ok((next.touched(at), bid))
    }

    pub fn buy_now(&self, buyer: &User, at: DateTime<Utc>) -> Result<Auction, Errors> {
        if buyer.user_id() == self.seller_id() {
            return Err(Errors::SellerCannotParticipate(self.id));
        }
        let current = self.inc(at);
        let price = match (current.details.auction_type, current.details.buy_now_price) {
            (AuctionType::BuyNow, Some(price)) => price,
            _ => return Err(Errors::invalid("auctionType", "This auction has no buy now price")),
        };
        current.sell_to(buyer.user_id(), price, SaleChannel::BuyNow, at)
    }

    /// Closes an active auction in favour of `buyer` at `price`.
    pub fn sell_to(
        &self,
        buyer: &UserId,
        price: AmountValue,
        channel: SaleChannel,
        at: DateTime<Utc>,
    ) -> Result<Auction, Errors> {
        let current = self.inc(at);
        if current.status != AuctionStatus::Active {
            return Err(current.transition_error("sell"));
        }
        let mut next = current;
        next.status = AuctionStatus::Sold;
        next.winner = Some(buyer.clone());
        next.current_price = price;
        next.sold_via = Some(channel);
        Ok(next.touched(at))
    }

    pub fn cancel(&self, reason: Option<String>, at: DateTime<Utc>) -> Result<Auction, Errors> {
        let current = self.inc(at);
        if current.status.is_terminal() {
            return Err(current.transition_error("cancel"));
        }
        let mut next = current;
        next.status = AuctionStatus::Cancelled;
        next.cancellation_reason = reason;
        Ok(next.touched(at))
    }

    pub fn accepts_offers(&self) -> bool {
        self.status == AuctionStatus::Active && self.details.allow_offers
    }
}

impl State for Auction {
    fn inc(&self, now: DateTime<Utc>) -> Auction {
        let mut next = self.clone();
        if next.status == AuctionStatus::Draft && now >= next.details.start_date {
            next.status = AuctionStatus::Active;
        }
        if next.status == AuctionStatus::Active && now >= next.details.end_date {
            let winner = match next.highest_bid() {
                Some(bid) if next.reserve_met() => Some((bid.bidder.clone(), bid.amount)),
                _ => None,
            };
            match winner {
                Some((bidder, amount)) => {
                    next.status = AuctionStatus::Sold;
                    next.winner = Some(bidder);
                    next.current_price = amount;
                    next.sold_via = Some(SaleChannel::Bidding);
                }
                None => next.status = AuctionStatus::Ended,
            }
        }
        if next.status != self.status {
            next = next.touched(now);
        }
        next
    }

    fn has_ended(&self) -> bool {
        self.status.is_terminal()
    }
}
