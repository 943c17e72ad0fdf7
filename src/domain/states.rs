// src/domain/states.rs
use chrono::{DateTime, Utc};

/// Time-driven progression shared by auctions and offers.
///
/// `inc` moves the entity forward to `now` without any actor involved
/// (draft auctions opening, auctions closing, offers lapsing). It must be
/// idempotent: incrementing twice to the same instant yields the same value.
pub trait State {
    fn inc(&self, now: DateTime<Utc>) -> Self
    where
        Self: Sized;

    fn has_ended(&self) -> bool;
}
