// src/domain/mod.rs
pub mod auctions;
pub mod comments;
pub mod commands;
pub mod commission;
pub mod contact;
pub mod core;
pub mod media;
pub mod offers;
pub mod states;

use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub use self::auctions::*;
pub use self::comments::*;
pub use self::commands::*;
pub use self::commission::*;
pub use self::contact::*;
pub use self::core::*;
pub use self::media::*;
pub use self::offers::*;
pub use self::states::*;

pub const ENDED_RESPONSE: &str = "Auction has ended";

/// Every document the marketplace owns. Handlers work on a copy and the
/// copy only replaces the live one when the whole command succeeded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Repository {
    pub auctions: HashMap<AuctionId, Auction>,
    pub offers: HashMap<OfferId, Offer>,
    pub comments: HashMap<CommentId, Comment>,
    pub contact_queries: HashMap<ContactQueryId, ContactQuery>,
    pub commission: CommissionConfig,
    next_seq: u64,
}

fn by_seq<'a, T, F>(items: impl Iterator<Item = &'a T>, seq: F) -> Vec<&'a T>
where
    T: 'a,
    F: Fn(&T) -> u64,
{
    let mut items: Vec<&T> = items.collect();
    items.sort_by_key(|item| seq(item));
    items
}

impl Repository {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    pub fn auction(&self, id: &AuctionId) -> Result<&Auction, Errors> {
        self.auctions
            .get(id)
            .ok_or_else(|| Errors::not_found(Entity::Auction, id))
    }

    pub fn offer(&self, id: &OfferId) -> Result<&Offer, Errors> {
        self.offers
            .get(id)
            .ok_or_else(|| Errors::not_found(Entity::Offer, id))
    }

    pub fn comment(&self, id: &CommentId) -> Result<&Comment, Errors> {
        self.comments
            .get(id)
            .ok_or_else(|| Errors::not_found(Entity::Comment, id))
    }

    pub fn contact_query(&self, id: &ContactQueryId) -> Result<&ContactQuery, Errors> {
        self.contact_queries
            .get(id)
            .ok_or_else(|| Errors::not_found(Entity::ContactQuery, query_reference(id)))
    }

    /// Accepts either the full id or the `UQ` reference shown to admins.
    pub fn resolve_contact_query(&self, raw: &str) -> Result<ContactQueryId, Errors> {
        let raw = raw.trim();
        if let Ok(id) = ContactQueryId::parse_str(raw) {
            return Ok(id);
        }
        let reference = raw.to_uppercase();
        let mut matches = self
            .contact_queries
            .keys()
            .filter(|id| query_reference(id) == reference);
        match (matches.next(), matches.next()) {
            (Some(id), None) => Ok(*id),
            (None, _) => Err(Errors::not_found(Entity::ContactQuery, raw)),
            (Some(_), Some(_)) => Err(Errors::invalid(
                "queryId",
                "Reference matches more than one query, use the full id",
            )),
        }
    }

    /// All auctions in creation order.
    pub fn auction_list(&self) -> Vec<&Auction> {
        by_seq(self.auctions.values(), |a| a.seq)
    }

    pub fn offer_list(&self) -> Vec<&Offer> {
        by_seq(self.offers.values(), |o| o.seq)
    }

    pub fn comment_list(&self) -> Vec<&Comment> {
        by_seq(self.comments.values(), |c| c.seq)
    }

    pub fn contact_query_list(&self) -> Vec<&ContactQuery> {
        by_seq(self.contact_queries.values(), |q| q.seq)
    }

    pub fn offers_for_auction(&self, auction_id: &AuctionId) -> Vec<&Offer> {
        by_seq(
            self.offers.values().filter(|o| &o.auction_id == auction_id),
            |o| o.seq,
        )
    }

    pub fn comments_for_auction(&self, auction_id: &AuctionId) -> Vec<&Comment> {
        by_seq(
            self.comments.values().filter(|c| &c.auction_id == auction_id),
            |c| c.seq,
        )
    }

    fn put_auction(&mut self, mut auction: Auction) {
        if !self.auctions.contains_key(&auction.id) {
            auction.seq = self.next_seq();
        }
        self.auctions.insert(auction.id, auction);
    }

    fn put_offer(&mut self, mut offer: Offer) {
        if !self.offers.contains_key(&offer.id) {
            offer.seq = self.next_seq();
        }
        self.offers.insert(offer.id, offer);
    }

    fn put_comment(&mut self, mut comment: Comment) {
        if !self.comments.contains_key(&comment.id) {
            comment.seq = self.next_seq();
        }
        self.comments.insert(comment.id, comment);
    }

    fn put_contact_query(&mut self, mut query: ContactQuery) {
        if !self.contact_queries.contains_key(&query.id) {
            query.seq = self.next_seq();
        }
        self.contact_queries.insert(query.id, query);
    }

    /// Offer addressed to `auction_id` that `actor` is a party to.
    fn owned_offer(
        &self,
        auction_id: &AuctionId,
        offer_id: &OfferId,
        owner: impl Fn(&Offer) -> &UserId,
        actor: &User,
    ) -> Result<&Offer, Errors> {
        match self.offers.get(offer_id) {
            Some(offer) if &offer.auction_id == auction_id && owner(offer) == actor.user_id() => Ok(offer),
            _ => Err(Errors::not_found(Entity::Offer, offer_id)),
        }
    }

    /// Rejects every still open offer on the auction except `keep`.
    fn close_open_offers(
        &mut self,
        auction_id: &AuctionId,
        keep: Option<OfferId>,
        response: &str,
        at: DateTime<Utc>,
    ) -> Vec<OfferId> {
        let candidates: Vec<Offer> = self
            .offers_for_auction(auction_id)
            .into_iter()
            .filter(|o| Some(o.id) != keep && o.status.is_open())
            .cloned()
            .collect();

        let mut closed = Vec::new();
        for offer in candidates {
            let next = offer.close_unanswered(response, at);
            if next.status == OfferStatus::Rejected {
                closed.push(next.id);
            }
            self.put_offer(next);
        }
        closed
    }

    fn sell_through_offer(
        &mut self,
        offer: Offer,
        at: DateTime<Utc>,
    ) -> Result<CommandSuccess, Errors> {
        let price = offer.agreed_amount.unwrap_or(offer.amount);
        let auction = self
            .auction(&offer.auction_id)?
            .sell_to(&offer.bidder, price, SaleChannel::Offer, at)?;
        let closed_offers = self.close_open_offers(&auction.id, Some(offer.id), SUPERSEDED_RESPONSE, at);
        self.put_offer(offer.clone());
        self.put_auction(auction.clone());
        Ok(CommandSuccess::AuctionSold {
            auction,
            offer: Some(offer),
            closed_offers,
        })
    }
}

pub fn auctions(repository: &Repository) -> Vec<Auction> {
    repository.auction_list().into_iter().cloned().collect()
}

pub fn handle(command: Command, mut repository: Repository) -> Result<(CommandSuccess, Repository), Errors> {
    let success = apply(command, &mut repository)?;
    Ok((success, repository))
}

fn apply(command: Command, repository: &mut Repository) -> Result<CommandSuccess, Errors> {
    match command {
        Command::AddAuction { at, auction_id, seller, details, photos, documents, service_records } => {
            if repository.auctions.contains_key(&auction_id) {
                return Err(Errors::invalid("id", format!("Auction already exists: {}", auction_id)));
            }
            let auction = Auction::new(auction_id, seller, details, photos, documents, service_records, at)?;
            repository.put_auction(auction.clone());
            Ok(CommandSuccess::AuctionAdded { auction })
        }

        Command::EditAuction {
            at,
            auction_id,
            editor,
            expected_version,
            patch,
            photos,
            documents,
            service_records,
        } => {
            let current = repository.auction(&auction_id)?;
            current.ensure_editable_by(&editor)?;
            current.ensure_version(expected_version)?;
            let mut next = current.apply_patch(&patch, at)?;

            for (kind, items) in [
                (MediaKind::Photos, photos),
                (MediaKind::Documents, documents),
                (MediaKind::ServiceRecords, service_records),
            ] {
                if let Some(items) = items {
                    if items.len() < kind.min_items() {
                        return Err(Errors::invalid(kind.field(), "At least one photo is required"));
                    }
                    next.set_media(kind, items);
                }
            }
            repository.put_auction(next.clone());
            Ok(CommandSuccess::AuctionUpdated { auction: next })
        }

        Command::PlaceBid { at, auction_id, bidder, amount } => {
            let (next, bid) = repository.auction(&auction_id)?.add_bid(&bidder, amount, at)?;
            repository.put_auction(next.clone());
            Ok(CommandSuccess::BidAccepted { auction: next, bid })
        }

        Command::BuyNow { at, auction_id, buyer } => {
            let next = repository.auction(&auction_id)?.buy_now(&buyer, at)?;
            let closed_offers = repository.close_open_offers(&auction_id, None, SUPERSEDED_RESPONSE, at);
            repository.put_auction(next.clone());
            Ok(CommandSuccess::AuctionSold {
                auction: next,
                offer: None,
                closed_offers,
            })
        }

        Command::CancelAuction { at, auction_id, reason } => {
            let next = repository.auction(&auction_id)?.cancel(reason, at)?;
            let closed_offers = repository.close_open_offers(&auction_id, None, CANCELLED_RESPONSE, at);
            repository.put_auction(next.clone());
            Ok(CommandSuccess::AuctionCancelled {
                auction: next,
                closed_offers,
            })
        }

        Command::AdvanceAuctions { at } => {
            let moved: Vec<Auction> = repository
                .auction_list()
                .into_iter()
                .map(|auction| (auction.status, auction.inc(at)))
                .filter(|(before, after)| *before != after.status)
                .map(|(_, after)| after)
                .collect();

            let mut ids = Vec::with_capacity(moved.len());
            for auction in moved {
                if auction.has_ended() {
                    repository.close_open_offers(&auction.id, None, ENDED_RESPONSE, at);
                }
                ids.push(auction.id);
                repository.put_auction(auction);
            }
            Ok(CommandSuccess::AuctionsAdvanced { auctions: ids })
        }

        Command::MakeOffer { at, offer_id, auction_id, bidder, amount, message } => {
            if repository.offers.contains_key(&offer_id) {
                return Err(Errors::invalid("id", format!("Offer already exists: {}", offer_id)));
            }
            let offer = Offer::new(offer_id, repository.auction(&auction_id)?, &bidder, amount, message, at)?;
            repository.put_offer(offer.clone());
            Ok(CommandSuccess::OfferMade { offer })
        }

        Command::RespondToOffer { at, auction_id, offer_id, seller, decision } => {
            let next = repository
                .owned_offer(&auction_id, &offer_id, |o| &o.seller, &seller)?
                .respond(&decision, at)?;
            if next.status == OfferStatus::Accepted {
                return repository.sell_through_offer(next, at);
            }
            repository.put_offer(next.clone());
            Ok(CommandSuccess::OfferUpdated { offer: next })
        }

        Command::WithdrawOffer { at, auction_id, offer_id, bidder } => {
            let next = repository
                .owned_offer(&auction_id, &offer_id, |o| &o.bidder, &bidder)?
                .withdraw(at)?;
            repository.put_offer(next.clone());
            Ok(CommandSuccess::OfferUpdated { offer: next })
        }

        Command::RespondToCounter { at, auction_id, offer_id, bidder, decision } => {
            let next = repository
                .owned_offer(&auction_id, &offer_id, |o| &o.bidder, &bidder)?
                .respond_to_counter(decision, at)?;
            if next.status == OfferStatus::Accepted {
                return repository.sell_through_offer(next, at);
            }
            repository.put_offer(next.clone());
            Ok(CommandSuccess::OfferUpdated { offer: next })
        }

        Command::ExpireOffers { at } => {
            let lapsed: Vec<Offer> = repository
                .offer_list()
                .into_iter()
                .filter(|offer| offer.status == OfferStatus::Pending && offer.expires_at < at)
                .map(|offer| offer.inc(at))
                .collect();
            let ids = lapsed.iter().map(|offer| offer.id).collect();
            for offer in lapsed {
                repository.put_offer(offer);
            }
            Ok(CommandSuccess::OffersExpired { offers: ids })
        }

        Command::AddComment { at, comment_id, auction_id, author, content } => {
            repository.auction(&auction_id)?;
            if repository.comments.contains_key(&comment_id) {
                return Err(Errors::invalid("id", format!("Comment already exists: {}", comment_id)));
            }
            let comment = Comment::new(comment_id, auction_id, &author, &content, at)?;
            repository.put_comment(comment.clone());
            Ok(CommandSuccess::CommentAdded { comment })
        }

        Command::FlagComment { at, comment_id, user, reason } => {
            let next = repository.comment(&comment_id)?.flag(&user, &reason, at)?;
            repository.put_comment(next.clone());
            Ok(CommandSuccess::CommentUpdated { comment: next })
        }

        Command::ClearCommentFlags { at, comment_id } => {
            let next = repository.comment(&comment_id)?.clear_flags(at)?;
            repository.put_comment(next.clone());
            Ok(CommandSuccess::CommentUpdated { comment: next })
        }

        Command::DeleteComment { at, comment_id, reason } => {
            let next = repository.comment(&comment_id)?.delete(&reason, at)?;
            repository.put_comment(next.clone());
            Ok(CommandSuccess::CommentUpdated { comment: next })
        }

        Command::RestoreComment { at, comment_id } => {
            let next = repository.comment(&comment_id)?.restore(at)?;
            repository.put_comment(next.clone());
            Ok(CommandSuccess::CommentUpdated { comment: next })
        }

        Command::SubmitContactQuery { at, query_id, form, ip_address, user_agent } => {
            if repository.contact_queries.contains_key(&query_id) {
                return Err(Errors::invalid("id", format!("Query already exists: {}", query_reference(&query_id))));
            }
            let query = ContactQuery::submit(query_id, &form, ip_address, user_agent, at)?;
            repository.put_contact_query(query.clone());
            Ok(CommandSuccess::ContactQuerySubmitted { query })
        }

        Command::UpdateContactQuery { at, query_id, patch } => {
            let previous = repository.contact_query(&query_id)?.clone();
            let query = previous.apply(&patch, at);
            repository.put_contact_query(query.clone());
            Ok(CommandSuccess::ContactQueryUpdated { previous, query })
        }

        Command::DeleteContactQuery { at: _, query_id } => {
            repository
                .contact_queries
                .remove(&query_id)
                .ok_or_else(|| Errors::not_found(Entity::ContactQuery, query_reference(&query_id)))?;
            Ok(CommandSuccess::ContactQueryDeleted { query_id })
        }

        Command::UpdateCommission { at: _, config } => {
            config.validate()?;
            repository.commission = config;
            Ok(CommandSuccess::CommissionUpdated { config })
        }
    }
}
