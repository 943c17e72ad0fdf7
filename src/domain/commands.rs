use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::auctions::{Auction, AuctionBid, AuctionDetails, AuctionPatch};
use super::comments::Comment;
use super::commission::CommissionConfig;
use super::contact::{ContactForm, ContactQuery, ContactQueryPatch};
use super::core::{AuctionId, CommentId, ContactQueryId, OfferId, User};
use super::media::MediaItem;
use super::offers::{CounterDecision, Offer, SellerDecision};
use crate::money::AmountValue;

/// Everything that changes the marketplace. Commands carry their own
/// timestamp and identifiers so a journal of them replays deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum Command {
    AddAuction {
        at: DateTime<Utc>,
        auction_id: AuctionId,
        seller: User,
        details: AuctionDetails,
        photos: Vec<MediaItem>,
        #[serde(default)]
        documents: Vec<MediaItem>,
        #[serde(default)]
        service_records: Vec<MediaItem>,
    },

    EditAuction {
        at: DateTime<Utc>,
        auction_id: AuctionId,
        editor: User,
        expected_version: Option<u64>,
        patch: AuctionPatch,
        photos: Option<Vec<MediaItem>>,
        documents: Option<Vec<MediaItem>>,
        service_records: Option<Vec<MediaItem>>,
    },

    PlaceBid {
        at: DateTime<Utc>,
        auction_id: AuctionId,
        bidder: User,
        amount: AmountValue,
    },

    BuyNow {
        at: DateTime<Utc>,
        auction_id: AuctionId,
        buyer: User,
    },

    CancelAuction {
        at: DateTime<Utc>,
        auction_id: AuctionId,
        reason: Option<String>,
    },

    /// Opens and closes auctions whose dates have passed.
    AdvanceAuctions { at: DateTime<Utc> },

    MakeOffer {
        at: DateTime<Utc>,
        offer_id: OfferId,
        auction_id: AuctionId,
        bidder: User,
        amount: AmountValue,
        message: Option<String>,
    },

    RespondToOffer {
        at: DateTime<Utc>,
        auction_id: AuctionId,
        offer_id: OfferId,
        seller: User,
        decision: SellerDecision,
    },

    WithdrawOffer {
        at: DateTime<Utc>,
        auction_id: AuctionId,
        offer_id: OfferId,
        bidder: User,
    },

    RespondToCounter {
        at: DateTime<Utc>,
        auction_id: AuctionId,
        offer_id: OfferId,
        bidder: User,
        decision: CounterDecision,
    },

    /// Moves every pending offer past its window to expired.
    ExpireOffers { at: DateTime<Utc> },

    AddComment {
        at: DateTime<Utc>,
        comment_id: CommentId,
        auction_id: AuctionId,
        author: User,
        content: String,
    },

    FlagComment {
        at: DateTime<Utc>,
        comment_id: CommentId,
        user: User,
        reason: String,
    },

    ClearCommentFlags {
        at: DateTime<Utc>,
        comment_id: CommentId,
    },

    DeleteComment {
        at: DateTime<Utc>,
        comment_id: CommentId,
        reason: String,
    },

    RestoreComment {
        at: DateTime<Utc>,
        comment_id: CommentId,
    },

    SubmitContactQuery {
        at: DateTime<Utc>,
        query_id: ContactQueryId,
        form: ContactForm,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    UpdateContactQuery {
        at: DateTime<Utc>,
        query_id: ContactQueryId,
        patch: ContactQueryPatch,
    },

    DeleteContactQuery {
        at: DateTime<Utc>,
        query_id: ContactQueryId,
    },

    UpdateCommission {
        at: DateTime<Utc>,
        config: CommissionConfig,
    },
}

impl Command {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Command::AddAuction { at, .. }
            | Command::EditAuction { at, .. }
            | Command::PlaceBid { at, .. }
            | Command::BuyNow { at, .. }
            | Command::CancelAuction { at, .. }
            | Command::AdvanceAuctions { at }
            | Command::MakeOffer { at, .. }
            | Command::RespondToOffer { at, .. }
            | Command::WithdrawOffer { at, .. }
            | Command::RespondToCounter { at, .. }
            | Command::ExpireOffers { at }
            | Command::AddComment { at, .. }
            | Command::FlagComment { at, .. }
            | Command::ClearCommentFlags { at, .. }
            | Command::DeleteComment { at, .. }
            | Command::RestoreComment { at, .. }
            | Command::SubmitContactQuery { at, .. }
            | Command::UpdateContactQuery { at, .. }
            | Command::DeleteContactQuery { at, .. }
            | Command::UpdateCommission { at, .. } => *at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "$type")]
pub enum CommandSuccess {
    AuctionAdded {
        auction: Auction,
    },
    AuctionUpdated {
        auction: Auction,
    },
    BidAccepted {
        auction: Auction,
        bid: AuctionBid,
    },
    AuctionSold {
        auction: Auction,
        offer: Option<Offer>,
        /// Open offers closed because the auction is gone.
        closed_offers: Vec<OfferId>,
    },
    AuctionCancelled {
        auction: Auction,
        closed_offers: Vec<OfferId>,
    },
    AuctionsAdvanced {
        auctions: Vec<AuctionId>,
    },
    OfferMade {
        offer: Offer,
    },
    OfferUpdated {
        offer: Offer,
    },
    OffersExpired {
        offers: Vec<OfferId>,
    },
    CommentAdded {
        comment: Comment,
    },
    CommentUpdated {
        comment: Comment,
    },
    ContactQuerySubmitted {
        query: ContactQuery,
    },
    ContactQueryUpdated {
        previous: ContactQuery,
        query: ContactQuery,
    },
    ContactQueryDeleted {
        query_id: ContactQueryId,
    },
    CommissionUpdated {
        config: CommissionConfig,
    },
}

impl CommandSuccess {
    /// Sweeps that found nothing to do; the repository is unchanged.
    pub fn changes_nothing(&self) -> bool {
        match self {
            CommandSuccess::AuctionsAdvanced { auctions } => auctions.is_empty(),
            CommandSuccess::OffersExpired { offers } => offers.is_empty(),
            _ => false,
        }
    }
}
