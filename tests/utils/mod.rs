#![allow(dead_code)]
use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;
use vehicle_auctions::domain::{
    handle, AuctionDetails, AuctionId, AuctionType, Command, CommandSuccess, ContactForm, MediaItem, OfferId,
    Repository, User,
};
use vehicle_auctions::money::Currency;
// See https://users.rust-lang.org/t/sharing-code-and-macros-in-tests-directory/3098/7

// Sample data for tests
pub fn sample_auction_id() -> AuctionId {
    Uuid::from_u128(1)
}

pub fn sample_starts_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

pub fn sample_ends_at() -> DateTime<Utc> {
    sample_starts_at() + Duration::days(10)
}

pub fn sample_bid_time() -> DateTime<Utc> {
    sample_starts_at() + Duration::days(1)
}

pub fn sample_seller() -> User {
    User::Seller {
        user_id: "Sample_Seller".to_string(),
        name: "Seller".to_string(),
    }
}

pub fn buyer_1() -> User {
    User::Bidder {
        user_id: "Buyer_1".to_string(),
        name: "Buyer 1".to_string(),
    }
}

pub fn buyer_2() -> User {
    User::Bidder {
        user_id: "Buyer_2".to_string(),
        name: "Buyer 2".to_string(),
    }
}

pub fn buyer_3() -> User {
    User::Bidder {
        user_id: "Buyer_3".to_string(),
        name: "Buyer 3".to_string(),
    }
}

pub fn admin() -> User {
    User::Admin {
        user_id: "Admin_1".to_string(),
    }
}

pub fn sample_photo(name: &str) -> MediaItem {
    MediaItem {
        id: Uuid::new_v4(),
        url: format!("http://cdn.test/photos/{}", name),
        caption: String::new(),
        storage_key: format!("photos/{}", name),
        filename: name.to_string(),
    }
}

pub fn sample_details(auction_type: AuctionType) -> AuctionDetails {
    AuctionDetails {
        title: "2015 Subaru Outback".to_string(),
        description: "One owner, full service history".to_string(),
        categories: vec!["wagon".to_string()],
        auction_type,
        currency: Currency::USD,
        start_price: 8_000,
        bid_increment: 250,
        reserve_price: (auction_type == AuctionType::Reserve).then_some(12_000),
        buy_now_price: (auction_type == AuctionType::BuyNow).then_some(15_000),
        allow_offers: true,
        start_date: sample_starts_at(),
        end_date: sample_ends_at(),
    }
}

pub fn add_auction(auction_type: AuctionType) -> Command {
    Command::AddAuction {
        at: sample_starts_at(),
        auction_id: sample_auction_id(),
        seller: sample_seller(),
        details: sample_details(auction_type),
        photos: vec![sample_photo("front.jpg")],
        documents: vec![],
        service_records: vec![],
    }
}

pub fn make_offer(n: u128, bidder: User, amount: i64, at: DateTime<Utc>) -> Command {
    Command::MakeOffer {
        at,
        offer_id: offer_id(n),
        auction_id: sample_auction_id(),
        bidder,
        amount,
        message: None,
    }
}

pub fn offer_id(n: u128) -> OfferId {
    Uuid::from_u128(100 + n)
}

pub fn sample_contact_form() -> ContactForm {
    ContactForm {
        name: Some("A".to_string()),
        email: Some("a@x.com".to_string()),
        user_type: Some("bidder".to_string()),
        message: Some("help".to_string()),
        ..ContactForm::default()
    }
}

/// Applies the commands in order and panics on the first failure.
pub fn run(commands: Vec<Command>) -> Repository {
    commands.into_iter().fold(Repository::default(), |repository, command| {
        handle(command, repository).unwrap().1
    })
}

pub fn run_on(repository: Repository, command: Command) -> (CommandSuccess, Repository) {
    handle(command, repository).unwrap()
}
