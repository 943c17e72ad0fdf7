use chrono::Duration;
use vehicle_auctions::domain::{
    handle, AuctionPatch, AuctionStatus, AuctionType, Command, CommandSuccess, Errors, SaleChannel, State,
};
#[path = "utils/mod.rs"]
mod utils;
use utils::*;

fn bid(bidder: vehicle_auctions::User, amount: i64, minutes: i64) -> Command {
    Command::PlaceBid {
        at: sample_bid_time() + Duration::minutes(minutes),
        auction_id: sample_auction_id(),
        bidder,
        amount,
    }
}

#[test]
fn can_increment_auction_state() {
    let repository = run(vec![add_auction(AuctionType::Standard)]);
    let auction = repository.auction(&sample_auction_id()).unwrap();

    // Can increment twice
    let s = auction.inc(sample_bid_time());
    assert_eq!(s, s.inc(sample_bid_time()));

    assert!(!auction.inc(sample_ends_at() - Duration::seconds(1)).has_ended());
    assert!(auction.inc(sample_ends_at() + Duration::seconds(1)).has_ended());
}

#[test]
fn draft_auction_opens_on_its_start_date() {
    let mut command = add_auction(AuctionType::Standard);
    if let Command::AddAuction { at, .. } = &mut command {
        *at = sample_starts_at() - Duration::days(2);
    }
    let repository = run(vec![command]);
    let auction = repository.auction(&sample_auction_id()).unwrap();
    assert_eq!(auction.status, AuctionStatus::Draft);
    assert_eq!(auction.inc(sample_starts_at()).status, AuctionStatus::Active);

    let (success, repository) = run_on(repository, Command::AdvanceAuctions { at: sample_bid_time() });
    assert_eq!(success, CommandSuccess::AuctionsAdvanced { auctions: vec![sample_auction_id()] });
    assert_eq!(repository.auction(&sample_auction_id()).unwrap().status, AuctionStatus::Active);
}

#[test]
fn highest_bidder_wins_at_end() {
    let repository = run(vec![
        add_auction(AuctionType::Standard),
        bid(buyer_1(), 8_000, 0),
        bid(buyer_2(), 8_500, 1),
    ]);

    let err = handle(bid(buyer_3(), 8_600, 2), repository.clone()).unwrap_err();
    assert_eq!(err, Errors::BidTooLow { minimum: 8_750 });

    let auction = repository.auction(&sample_auction_id()).unwrap();
    let amounts: Vec<i64> = auction.bids_by_amount().iter().map(|b| b.amount).collect();
    assert_eq!(amounts, vec![8_500, 8_000]);

    let ended = auction.inc(sample_ends_at());
    assert_eq!(ended.status, AuctionStatus::Sold);
    assert_eq!(ended.winner.as_deref(), Some("Buyer_2"));
    assert_eq!(ended.sold_via, Some(SaleChannel::Bidding));
}

#[test]
fn reserve_not_met_ends_without_winner() {
    let repository = run(vec![add_auction(AuctionType::Reserve), bid(buyer_1(), 9_000, 0)]);
    let ended = repository.auction(&sample_auction_id()).unwrap().inc(sample_ends_at());
    assert_eq!(ended.status, AuctionStatus::Ended);
    assert_eq!(ended.winner, None);
}

#[test]
fn seller_cannot_bid_on_own_auction() {
    let repository = run(vec![add_auction(AuctionType::Standard)]);
    let err = handle(bid(sample_seller(), 9_000, 0), repository).unwrap_err();
    assert_eq!(err, Errors::SellerCannotParticipate(sample_auction_id()));
}

#[test]
fn buy_now_closes_open_offers() {
    let repository = run(vec![
        add_auction(AuctionType::BuyNow),
        make_offer(1, buyer_1(), 9_000, sample_bid_time()),
    ]);
    let (success, repository) = run_on(
        repository,
        Command::BuyNow { at: sample_bid_time(), auction_id: sample_auction_id(), buyer: buyer_2() },
    );
    match success {
        CommandSuccess::AuctionSold { auction, closed_offers, .. } => {
            assert_eq!(auction.current_price, 15_000);
            assert_eq!(closed_offers, vec![offer_id(1)]);
        }
        other => panic!("unexpected {:?}", other),
    }
    let offer = repository.offer(&offer_id(1)).unwrap();
    assert_eq!(offer.seller_response.as_deref(), Some("Auction sold to another buyer"));
}

#[test]
fn terminal_auctions_cannot_be_edited_or_cancelled() {
    let repository = run(vec![
        add_auction(AuctionType::Standard),
        Command::CancelAuction { at: sample_bid_time(), auction_id: sample_auction_id(), reason: Some("fraud".into()) },
    ]);
    let cancel_again = Command::CancelAuction { at: sample_bid_time(), auction_id: sample_auction_id(), reason: None };
    assert!(matches!(
        handle(cancel_again, repository.clone()),
        Err(Errors::InvalidStateTransition { .. })
    ));

    let edit = Command::EditAuction {
        at: sample_bid_time(),
        auction_id: sample_auction_id(),
        editor: admin(),
        expected_version: None,
        patch: AuctionPatch { title: Some("New".into()), ..AuctionPatch::default() },
        photos: None,
        documents: None,
        service_records: None,
    };
    assert!(matches!(handle(edit, repository), Err(Errors::InvalidStateTransition { .. })));
}

#[test]
fn only_owner_or_admin_may_edit() {
    let repository = run(vec![add_auction(AuctionType::Standard)]);
    let edit = |editor| Command::EditAuction {
        at: sample_bid_time(),
        auction_id: sample_auction_id(),
        editor,
        expected_version: Some(1),
        patch: AuctionPatch { description: Some("Fresh tyres".into()), ..AuctionPatch::default() },
        photos: None,
        documents: None,
        service_records: None,
    };
    assert!(matches!(handle(edit(buyer_1()), repository.clone()), Err(Errors::Forbidden(_))));

    let (success, repository) = run_on(repository, edit(admin()));
    match success {
        CommandSuccess::AuctionUpdated { auction } => assert_eq!(auction.version, 2),
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(handle(edit(sample_seller()), repository), Err(Errors::Conflict { .. })));
}

#[test]
fn removing_every_photo_is_rejected() {
    let repository = run(vec![add_auction(AuctionType::Standard)]);
    let edit = Command::EditAuction {
        at: sample_bid_time(),
        auction_id: sample_auction_id(),
        editor: sample_seller(),
        expected_version: None,
        patch: AuctionPatch::default(),
        photos: Some(vec![]),
        documents: None,
        service_records: None,
    };
    let err = handle(edit, repository.clone()).unwrap_err();
    assert_eq!(err.field_errors().unwrap()[0].field, "photos");
    assert_eq!(repository.auction(&sample_auction_id()).unwrap().photos.len(), 1);
}
