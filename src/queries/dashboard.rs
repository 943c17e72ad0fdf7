// src/queries/dashboard.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{auctions, comments, histogram};
use crate::domain::{AuctionStatus, OfferStatus, QueryStatus, Repository, State};
use crate::money::AmountValue;

/// Admin overview of the whole marketplace.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub auctions: BTreeMap<String, usize>,
    pub offers: BTreeMap<String, usize>,
    pub comments: BTreeMap<String, usize>,
    pub flagged_comments: usize,
    pub open_contact_queries: usize,
    pub total_bids: usize,
    pub gross_sales: AmountValue,
    pub commission_earned: AmountValue,
}

pub fn dashboard(repository: &Repository, now: DateTime<Utc>) -> DashboardStats {
    let sold: Vec<AmountValue> = repository
        .auctions
        .values()
        .map(|a| a.inc(now))
        .filter(|a| a.status == AuctionStatus::Sold)
        .map(|a| a.current_price)
        .collect();
    let comment_counts = comments::status_histogram(repository);

    DashboardStats {
        auctions: auctions::status_histogram(repository, now),
        offers: histogram(
            &OfferStatus::ALL,
            repository.offers.values().map(|o| o.inc(now).status),
        ),
        flagged_comments: comment_counts.get("flagged").copied().unwrap_or(0),
        comments: comment_counts,
        open_contact_queries: repository
            .contact_queries
            .values()
            .filter(|q| matches!(q.status, QueryStatus::New | QueryStatus::InProgress))
            .count(),
        total_bids: repository.auctions.values().map(|a| a.bids.len()).sum(),
        gross_sales: sold.iter().fold(0, |total: AmountValue, price| total.saturating_add(*price)),
        commission_earned: sold
            .iter()
            .filter_map(|price| repository.commission.earned(*price).ok())
            .fold(0, |total: AmountValue, earned| total.saturating_add(earned)),
    }
}
