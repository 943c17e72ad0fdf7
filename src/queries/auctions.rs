// src/queries/auctions.rs
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;

use super::{contains_ci, filter_value, histogram, paginate, search_term, Page, PageRequest};
use crate::domain::{Auction, AuctionStatus, Repository, State};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuctionSort {
    #[default]
    Newest,
    EndingSoon,
    PriceLow,
    PriceHigh,
}

impl FromStr for AuctionSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(AuctionSort::Newest),
            "ending_soon" => Ok(AuctionSort::EndingSoon),
            "price_low" => Ok(AuctionSort::PriceLow),
            "price_high" => Ok(AuctionSort::PriceHigh),
            _ => Err(format!("Unknown sort: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionFilter {
    pub status: Option<String>,
    pub category: Option<String>,
    pub seller: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

impl AuctionFilter {
    pub fn matches(&self, auction: &Auction) -> bool {
        let status: Option<AuctionStatus> = filter_value(&self.status);
        let category = search_term(&self.category).filter(|c| c != "all");

        status.map_or(true, |s| auction.status == s)
            && category.map_or(true, |c| {
                auction.details.categories.iter().any(|own| own.to_lowercase() == c)
            })
            && self.seller.as_ref().map_or(true, |s| auction.seller_id() == s)
            && search_term(&self.search).map_or(true, |term| {
                contains_ci(&auction.details.title, &term)
                    || contains_ci(&auction.details.description, &term)
            })
    }
}

/// Auctions as they stand at `now`, filtered and sorted.
pub fn list_auctions(
    repository: &Repository,
    filter: &AuctionFilter,
    page: PageRequest,
    now: DateTime<Utc>,
) -> Page<Auction> {
    let mut matching: Vec<Auction> = repository
        .auction_list()
        .into_iter()
        .map(|auction| auction.inc(now))
        .filter(|auction| filter.matches(auction))
        .collect();

    match filter_value(&filter.sort).unwrap_or_default() {
        AuctionSort::Newest => matching.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        AuctionSort::EndingSoon => matching.sort_by(|a, b| a.details.end_date.cmp(&b.details.end_date)),
        AuctionSort::PriceLow => matching.sort_by_key(|a| a.current_price),
        AuctionSort::PriceHigh => matching.sort_by(|a, b| b.current_price.cmp(&a.current_price)),
    }
    paginate(matching, page)
}

pub fn status_histogram(repository: &Repository, now: DateTime<Utc>) -> BTreeMap<String, usize> {
    histogram(
        &AuctionStatus::ALL,
        repository.auctions.values().map(|a| a.inc(now).status),
    )
}
