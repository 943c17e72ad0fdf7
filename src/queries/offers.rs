// src/queries/offers.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{filter_value, paginate, Page, PageRequest};
use crate::domain::{AuctionId, Offer, OfferStatus, Repository, State, UserId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferStatistics {
    pub total: usize,
    pub pending: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub countered: usize,
    pub expired: usize,
    pub withdrawn: usize,
}

impl OfferStatistics {
    pub fn from_offers<'a>(offers: impl IntoIterator<Item = &'a Offer>) -> Self {
        let mut stats = OfferStatistics::default();
        for offer in offers {
            stats.total += 1;
            match offer.status {
                OfferStatus::Pending => stats.pending += 1,
                OfferStatus::Accepted => stats.accepted += 1,
                OfferStatus::Rejected => stats.rejected += 1,
                OfferStatus::Countered => stats.countered += 1,
                OfferStatus::Expired => stats.expired += 1,
                OfferStatus::Withdrawn => stats.withdrawn += 1,
            }
        }
        stats
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferFilter {
    pub status: Option<String>,
}

pub struct OfferListing {
    pub page: Page<Offer>,
    pub statistics: OfferStatistics,
}

fn listing(offers: Vec<Offer>, filter: &OfferFilter, page: PageRequest) -> OfferListing {
    let statistics = OfferStatistics::from_offers(&offers);
    let status: Option<OfferStatus> = filter_value(&filter.status);
    let mut matching: Vec<Offer> = offers
        .into_iter()
        .filter(|offer| status.map_or(true, |s| offer.status == s))
        .collect();
    matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    OfferListing {
        page: paginate(matching, page),
        statistics,
    }
}

/// A bidder's own offers as they stand at `now`, newest first.
pub fn offers_by_bidder(
    repository: &Repository,
    bidder: &UserId,
    filter: &OfferFilter,
    page: PageRequest,
    now: DateTime<Utc>,
) -> OfferListing {
    let offers = repository
        .offer_list()
        .into_iter()
        .filter(|offer| &offer.bidder == bidder)
        .map(|offer| offer.inc(now))
        .collect();
    listing(offers, filter, page)
}

pub fn offers_for_auction(
    repository: &Repository,
    auction_id: &AuctionId,
    filter: &OfferFilter,
    page: PageRequest,
    now: DateTime<Utc>,
) -> OfferListing {
    let offers = repository
        .offers_for_auction(auction_id)
        .into_iter()
        .map(|offer| offer.inc(now))
        .collect();
    listing(offers, filter, page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{handle, AuctionDetails, AuctionType, Command, MediaItem, SellerDecision, User};
    use crate::money::Currency;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap()
    }

    fn bidder(n: u8) -> User {
        User::Bidder { user_id: format!("b{}", n), name: format!("B{}", n) }
    }

    fn seller() -> User {
        User::Seller { user_id: "s".into(), name: "S".into() }
    }

    fn repo() -> Repository {
        let add = Command::AddAuction {
            at: now(),
            auction_id: Uuid::from_u128(1),
            seller: seller(),
            details: AuctionDetails {
                title: "Civic".into(),
                description: String::new(),
                categories: vec![],
                auction_type: AuctionType::Standard,
                currency: Currency::USD,
                start_price: 5_000,
                bid_increment: 100,
                reserve_price: None,
                buy_now_price: None,
                allow_offers: true,
                start_date: now(),
                end_date: now() + Duration::days(14),
            },
            photos: vec![MediaItem {
                id: Uuid::new_v4(),
                url: "u".into(),
                caption: String::new(),
                storage_key: "k".into(),
                filename: "f".into(),
            }],
            documents: vec![],
            service_records: vec![],
        };
        let mut repo = handle(add, Repository::default()).unwrap().1;
        for (n, (who, hours)) in [(1u8, 0i64), (1, 1), (2, 2)].iter().enumerate() {
            let offer = Command::MakeOffer {
                at: now() + Duration::hours(*hours),
                offer_id: Uuid::from_u128(10 + n as u128),
                auction_id: Uuid::from_u128(1),
                bidder: bidder(*who),
                amount: 4_000 + n as i64 * 100,
                message: None,
            };
            repo = handle(offer, repo).unwrap().1;
        }
        let reject = Command::RespondToOffer {
            at: now() + Duration::hours(3),
            auction_id: Uuid::from_u128(1),
            offer_id: Uuid::from_u128(10),
            seller: seller(),
            decision: SellerDecision::Reject { message: None },
        };
        handle(reject, repo).unwrap().1
    }

    #[test]
    fn bidder_sees_only_own_offers_newest_first() {
        let listing = offers_by_bidder(&repo(), &"b1".to_string(), &OfferFilter::default(), PageRequest::default(), now());
        let ids: Vec<_> = listing.page.items.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![Uuid::from_u128(11), Uuid::from_u128(10)]);
        assert_eq!(listing.statistics, OfferStatistics { total: 2, pending: 1, rejected: 1, ..Default::default() });
    }

    #[test]
    fn statistics_reflect_lapsed_offers() {
        let later = now() + Duration::hours(60);
        let listing = offers_for_auction(&repo(), &Uuid::from_u128(1), &OfferFilter::default(), PageRequest::default(), later);
        assert_eq!(listing.statistics.expired, 2);
        assert_eq!(listing.statistics.rejected, 1);

        let pending_only = OfferFilter { status: Some("pending".into()) };
        let listing = offers_for_auction(&repo(), &Uuid::from_u128(1), &pending_only, PageRequest::default(), now());
        assert_eq!(listing.page.total, 2);
        assert_eq!(listing.statistics.total, 3);
    }
}
