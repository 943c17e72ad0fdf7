// src/web/app.rs
use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse};
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use log::info;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use super::types::{
    ApiError, ApiResponse, ApiResult, AppState, AuctionView, BidRequest, CommentRequest, ContactQueryView,
    CreateAuctionRequest, EditAuctionRequest, FlagRequest, OfferRequest, OfferView, PageParams, ReasonRequest,
};
use crate::config::Config;
use crate::domain::{
    query_reference, CommandSuccess, CommissionConfig, ContactForm, ContactQueryPatch, CounterDecision, Entity,
    Errors, Offer, Repository, Role, SellerDecision, State, User,
};
use crate::domain::commands::Command;
use crate::marketplace::{AuctionEdit, Marketplace};
use crate::queries::auctions::{list_auctions, AuctionFilter};
use crate::queries::comments::{auction_thread, moderation_queue, status_histogram, CommentFilter};
use crate::queries::contact::{contact_stats, list_queries, ContactQueryFilter};
use crate::queries::dashboard::dashboard;
use crate::queries::offers::{offers_by_bidder, offers_for_auction, OfferFilter};
use crate::services::notifier::{LogNotifier, Notifier};
use crate::services::storage::{FileMediaStorage, InMemoryMediaStorage, MediaStorage, StorageError};

pub fn init_app_state(config: &Config, repository: Repository) -> Result<AppState, StorageError> {
    let storage: Arc<dyn MediaStorage> = match config.media_root() {
        Some(root) => {
            info!("{:<12} --> writing media to {}", "Media", root.display());
            Arc::new(FileMediaStorage::new(root, &config.media_base_url)?)
        }
        None => Arc::new(InMemoryMediaStorage::new(&config.media_base_url)),
    };
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    let mut marketplace = Marketplace::new(repository, storage, notifier);
    if let Some(path) = &config.data_file {
        marketplace = marketplace.with_journal(path.clone());
    }
    Ok(AppState {
        marketplace: Arc::new(marketplace),
        default_page_size: config.default_page_size,
        max_page_size: config.max_page_size,
    })
}

#[derive(Deserialize)]
struct JwtPayload {
    sub: String,
    name: Option<String>,
    role: Role,
}

// Read x-jwt-payload header and extract user information
fn get_auth_user(req: &HttpRequest) -> Option<User> {
    let auth_header = req.headers().get("x-jwt-payload")?;
    let decoded = general_purpose::STANDARD.decode(auth_header.to_str().ok()?.trim()).ok()?;
    let payload: JwtPayload = serde_json::from_slice(&decoded).ok()?;
    let user_id = payload.sub;
    let name = payload.name.unwrap_or_else(|| user_id.clone());
    Some(match payload.role {
        Role::Bidder => User::Bidder { user_id, name },
        Role::Seller => User::Seller { user_id, name },
        Role::Admin => User::Admin { user_id },
    })
}

fn require_user(req: &HttpRequest) -> Result<User, ApiError> {
    get_auth_user(req).ok_or(ApiError(Errors::Unauthorized))
}

fn require_role(req: &HttpRequest, roles: &[Role]) -> Result<User, ApiError> {
    let user = require_user(req)?;
    if roles.contains(&user.role()) {
        Ok(user)
    } else {
        Err(ApiError(Errors::Forbidden(format!(
            "This action is not available to the {:?} role",
            user.role()
        ))))
    }
}

fn parse_id(entity: Entity, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError(Errors::not_found(entity, raw)))
}

fn respond(status: StatusCode, message: Option<&str>, data: Value) -> HttpResponse {
    let mut body = ApiResponse::ok(data);
    if let Some(message) = message {
        body = body.with_message(message);
    }
    HttpResponse::build(status).json(body)
}

fn commission(state: &AppState) -> Result<CommissionConfig, ApiError> {
    Ok(state.marketplace.read(|r| r.commission)?)
}

/// Response data for a committed command.
fn success_data(success: &CommandSuccess, commission: &CommissionConfig) -> Value {
    let now = Utc::now();
    let offer_view = |offer: &Offer| OfferView::new(offer.clone(), now);
    match success {
        CommandSuccess::AuctionAdded { auction } | CommandSuccess::AuctionUpdated { auction } => {
            json!({ "auction": AuctionView::new(auction, commission) })
        }
        CommandSuccess::BidAccepted { auction, bid } => {
            json!({ "auction": AuctionView::new(auction, commission), "bid": bid })
        }
        CommandSuccess::AuctionSold { auction, offer, closed_offers } => json!({
            "auction": AuctionView::new(auction, commission),
            "offer": offer.as_ref().map(offer_view),
            "closedOffers": closed_offers,
        }),
        CommandSuccess::AuctionCancelled { auction, closed_offers } => json!({
            "auction": AuctionView::new(auction, commission),
            "closedOffers": closed_offers,
        }),
        CommandSuccess::AuctionsAdvanced { auctions } => json!({ "auctions": auctions }),
        CommandSuccess::OfferMade { offer } | CommandSuccess::OfferUpdated { offer } => {
            json!({ "offer": offer_view(offer) })
        }
        CommandSuccess::OffersExpired { offers } => json!({ "expired": offers.len(), "offers": offers }),
        CommandSuccess::CommentAdded { comment } | CommandSuccess::CommentUpdated { comment } => {
            json!({ "comment": comment })
        }
        CommandSuccess::ContactQuerySubmitted { query } | CommandSuccess::ContactQueryUpdated { query, .. } => {
            json!({ "query": ContactQueryView::from(query) })
        }
        CommandSuccess::ContactQueryDeleted { query_id } => json!({ "queryId": query_reference(query_id) }),
        CommandSuccess::CommissionUpdated { config } => json!({ "commission": config }),
    }
}

fn execute(state: &AppState, command: Command, status: StatusCode, message: Option<&str>) -> ApiResult {
    let success = state.marketplace.execute(command)?;
    let data = success_data(&success, &commission(state)?);
    Ok(respond(status, message, data))
}

fn client_ip(req: &HttpRequest) -> Option<String> {
    req.connection_info().realip_remote_addr().map(str::to_string)
}

fn user_agent(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// --- Contact queries

async fn submit_contact(req: HttpRequest, form: web::Json<ContactForm>, data: web::Data<AppState>) -> ApiResult {
    let command = Command::SubmitContactQuery {
        at: Utc::now(),
        query_id: Uuid::new_v4(),
        form: form.into_inner(),
        ip_address: client_ip(&req),
        user_agent: user_agent(&req),
    };
    execute(
        &data,
        command,
        StatusCode::CREATED,
        Some("Your query has been submitted successfully"),
    )
}

async fn get_contact_queries(
    req: HttpRequest,
    filter: web::Query<ContactQueryFilter>,
    params: web::Query<PageParams>,
    data: web::Data<AppState>,
) -> ApiResult {
    require_role(&req, &[Role::Admin])?;
    let page = data.page(&params);
    let body = data.marketplace.read(|repository| {
        let listing = list_queries(repository, &filter, page);
        let views: Vec<ContactQueryView> = listing.page.items.iter().map(|q| ContactQueryView::from(*q)).collect();
        json!({
            "queries": views,
            "statistics": listing.statistics,
            "pagination": listing.page.pagination("totalQueries"),
        })
    })?;
    Ok(respond(StatusCode::OK, None, body))
}

async fn get_contact_stats(req: HttpRequest, data: web::Data<AppState>) -> ApiResult {
    require_role(&req, &[Role::Admin])?;
    let stats = data.marketplace.read(|repository| contact_stats(repository, Utc::now()))?;
    Ok(respond(StatusCode::OK, None, json!({ "stats": stats })))
}

async fn update_contact_query(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<Value>,
    data: web::Data<AppState>,
) -> ApiResult {
    require_role(&req, &[Role::Admin])?;
    let query_id = data.marketplace.read(|repository| repository.resolve_contact_query(&path))??;
    let patch = ContactQueryPatch::from_json(&body);
    let command = Command::UpdateContactQuery { at: Utc::now(), query_id, patch };
    execute(&data, command, StatusCode::OK, Some("Query updated successfully"))
}

async fn delete_contact_query(req: HttpRequest, path: web::Path<String>, data: web::Data<AppState>) -> ApiResult {
    require_role(&req, &[Role::Admin])?;
    let query_id = data.marketplace.read(|repository| repository.resolve_contact_query(&path))??;
    let command = Command::DeleteContactQuery { at: Utc::now(), query_id };
    execute(&data, command, StatusCode::OK, Some("Query deleted successfully"))
}

// --- Auctions

async fn get_auctions(
    filter: web::Query<AuctionFilter>,
    params: web::Query<PageParams>,
    data: web::Data<AppState>,
) -> ApiResult {
    let page = data.page(&params);
    let now = Utc::now();
    let body = data.marketplace.read(|repository| {
        let listing = list_auctions(repository, &filter, page, now);
        let views: Vec<AuctionView> = listing
            .items
            .iter()
            .map(|a| AuctionView::new(a, &repository.commission))
            .collect();
        json!({
            "auctions": views,
            "statistics": crate::queries::auctions::status_histogram(repository, now),
            "pagination": listing.pagination("totalAuctions"),
        })
    })?;
    Ok(respond(StatusCode::OK, None, body))
}

async fn get_auction(path: web::Path<String>, data: web::Data<AppState>) -> ApiResult {
    let auction_id = parse_id(Entity::Auction, &path)?;
    let now = Utc::now();
    let view = data.marketplace.read(|repository| {
        repository
            .auction(&auction_id)
            .map(|auction| AuctionView::new(&auction.inc(now), &repository.commission))
    })??;
    Ok(respond(StatusCode::OK, None, json!({ "auction": view })))
}

async fn create_auction(
    req: HttpRequest,
    body: web::Json<CreateAuctionRequest>,
    data: web::Data<AppState>,
) -> ApiResult {
    let seller = require_role(&req, &[Role::Seller])?;
    let request = body.into_inner();
    let auction_id = request.id.unwrap_or_else(Uuid::new_v4);
    let (details, media) = request.media()?;
    let auction = data
        .marketplace
        .create_auction(Utc::now(), auction_id, seller, details, media)?;
    let view = AuctionView::new(&auction, &commission(&data)?);
    Ok(respond(
        StatusCode::CREATED,
        Some("Auction created successfully"),
        json!({ "auction": view }),
    ))
}

async fn edit_auction(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<EditAuctionRequest>,
    data: web::Data<AppState>,
) -> ApiResult {
    let editor = require_role(&req, &[Role::Seller, Role::Admin])?;
    let auction_id = parse_id(Entity::Auction, &path)?;
    let (expected_version, patch, media) = body.into_inner().media()?;
    let auction = data.marketplace.edit_auction(AuctionEdit {
        at: Utc::now(),
        auction_id,
        editor,
        expected_version,
        patch,
        media,
    })?;
    let view = AuctionView::new(&auction, &commission(&data)?);
    Ok(respond(
        StatusCode::OK,
        Some("Auction updated successfully"),
        json!({ "auction": view }),
    ))
}

async fn place_bid(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<BidRequest>,
    data: web::Data<AppState>,
) -> ApiResult {
    let bidder = require_role(&req, &[Role::Bidder])?;
    let auction_id = parse_id(Entity::Auction, &path)?;
    let command = Command::PlaceBid { at: Utc::now(), auction_id, bidder, amount: body.amount };
    execute(&data, command, StatusCode::OK, Some("Bid placed successfully"))
}

async fn buy_now(req: HttpRequest, path: web::Path<String>, data: web::Data<AppState>) -> ApiResult {
    let buyer = require_role(&req, &[Role::Bidder])?;
    let auction_id = parse_id(Entity::Auction, &path)?;
    let command = Command::BuyNow { at: Utc::now(), auction_id, buyer };
    execute(&data, command, StatusCode::OK, Some("Purchase completed"))
}

async fn cancel_auction(
    req: HttpRequest,
    path: web::Path<String>,
    body: Option<web::Json<ReasonRequest>>,
    data: web::Data<AppState>,
) -> ApiResult {
    require_role(&req, &[Role::Admin])?;
    let auction_id = parse_id(Entity::Auction, &path)?;
    let reason = body.and_then(|b| b.into_inner().reason);
    let command = Command::CancelAuction { at: Utc::now(), auction_id, reason };
    execute(&data, command, StatusCode::OK, Some("Auction cancelled"))
}

// --- Offers

async fn make_offer(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<OfferRequest>,
    data: web::Data<AppState>,
) -> ApiResult {
    let bidder = require_role(&req, &[Role::Bidder])?;
    let auction_id = parse_id(Entity::Auction, &path)?;
    let body = body.into_inner();
    let command = Command::MakeOffer {
        at: Utc::now(),
        offer_id: Uuid::new_v4(),
        auction_id,
        bidder,
        amount: body.amount,
        message: body.message,
    };
    execute(&data, command, StatusCode::CREATED, Some("Offer submitted successfully"))
}

async fn get_auction_offers(
    req: HttpRequest,
    path: web::Path<String>,
    filter: web::Query<OfferFilter>,
    params: web::Query<PageParams>,
    data: web::Data<AppState>,
) -> ApiResult {
    let user = require_role(&req, &[Role::Seller, Role::Admin])?;
    let auction_id = parse_id(Entity::Auction, &path)?;
    let page = data.page(&params);
    let now = Utc::now();
    let body = data.marketplace.read(|repository| -> Result<Value, Errors> {
        let auction = repository.auction(&auction_id)?;
        if !user.is_admin() && auction.seller_id() != user.user_id() {
            return Err(Errors::Forbidden("Only the seller can view offers on this auction".to_string()));
        }
        let listing = offers_for_auction(repository, &auction_id, &filter, page, now);
        Ok(json!({
            "offers": listing.page.items.iter().map(|o| OfferView::new(o.clone(), now)).collect::<Vec<_>>(),
            "statistics": listing.statistics,
            "pagination": listing.page.pagination("totalOffers"),
        }))
    })??;
    Ok(respond(StatusCode::OK, None, body))
}

async fn respond_to_offer(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Json<SellerDecision>,
    data: web::Data<AppState>,
) -> ApiResult {
    let seller = require_role(&req, &[Role::Seller])?;
    let auction_id = parse_id(Entity::Auction, &path.0)?;
    let offer_id = parse_id(Entity::Offer, &path.1)?;
    let command = Command::RespondToOffer {
        at: Utc::now(),
        auction_id,
        offer_id,
        seller,
        decision: body.into_inner(),
    };
    execute(&data, command, StatusCode::OK, Some("Response recorded"))
}

async fn withdraw_offer(req: HttpRequest, path: web::Path<(String, String)>, data: web::Data<AppState>) -> ApiResult {
    let bidder = require_role(&req, &[Role::Bidder])?;
    let auction_id = parse_id(Entity::Auction, &path.0)?;
    let offer_id = parse_id(Entity::Offer, &path.1)?;
    let command = Command::WithdrawOffer { at: Utc::now(), auction_id, offer_id, bidder };
    execute(&data, command, StatusCode::OK, Some("Offer withdrawn successfully"))
}

async fn respond_to_counter(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Json<CounterDecision>,
    data: web::Data<AppState>,
) -> ApiResult {
    let bidder = require_role(&req, &[Role::Bidder])?;
    let auction_id = parse_id(Entity::Auction, &path.0)?;
    let offer_id = parse_id(Entity::Offer, &path.1)?;
    let command = Command::RespondToCounter {
        at: Utc::now(),
        auction_id,
        offer_id,
        bidder,
        decision: body.into_inner(),
    };
    execute(&data, command, StatusCode::OK, Some("Response recorded"))
}

async fn my_offers(
    req: HttpRequest,
    filter: web::Query<OfferFilter>,
    params: web::Query<PageParams>,
    data: web::Data<AppState>,
) -> ApiResult {
    let bidder = require_role(&req, &[Role::Bidder])?;
    let page = data.page(&params);
    let now = Utc::now();
    let body = data.marketplace.read(|repository| {
        let listing = offers_by_bidder(repository, bidder.user_id(), &filter, page, now);
        json!({
            "offers": listing.page.items.iter().map(|o| OfferView::new(o.clone(), now)).collect::<Vec<_>>(),
            "statistics": listing.statistics,
            "pagination": listing.page.pagination("totalOffers"),
        })
    })?;
    Ok(respond(StatusCode::OK, None, body))
}

async fn expire_offers(req: HttpRequest, data: web::Data<AppState>) -> ApiResult {
    require_role(&req, &[Role::Admin])?;
    execute(&data, Command::ExpireOffers { at: Utc::now() }, StatusCode::OK, None)
}

// --- Comments

async fn get_comments(path: web::Path<String>, data: web::Data<AppState>) -> ApiResult {
    let auction_id = parse_id(Entity::Auction, &path)?;
    let body = data.marketplace.read(|repository| -> Result<Value, Errors> {
        repository.auction(&auction_id)?;
        Ok(json!({ "comments": auction_thread(repository, &auction_id) }))
    })??;
    Ok(respond(StatusCode::OK, None, body))
}

async fn add_comment(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<CommentRequest>,
    data: web::Data<AppState>,
) -> ApiResult {
    let author = require_user(&req)?;
    let auction_id = parse_id(Entity::Auction, &path)?;
    let command = Command::AddComment {
        at: Utc::now(),
        comment_id: Uuid::new_v4(),
        auction_id,
        author,
        content: body.into_inner().content,
    };
    execute(&data, command, StatusCode::CREATED, Some("Comment posted"))
}

async fn flag_comment(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<FlagRequest>,
    data: web::Data<AppState>,
) -> ApiResult {
    let user = require_user(&req)?;
    let comment_id = parse_id(Entity::Comment, &path)?;
    let command = Command::FlagComment { at: Utc::now(), comment_id, user, reason: body.into_inner().reason };
    execute(&data, command, StatusCode::OK, Some("Comment flagged for review"))
}

async fn get_admin_comments(
    req: HttpRequest,
    filter: web::Query<CommentFilter>,
    params: web::Query<PageParams>,
    data: web::Data<AppState>,
) -> ApiResult {
    require_role(&req, &[Role::Admin])?;
    let page = data.page(&params);
    let body = data.marketplace.read(|repository| {
        let listing = moderation_queue(repository, &filter, page);
        json!({
            "comments": listing.items,
            "statistics": status_histogram(repository),
            "pagination": listing.pagination("totalComments"),
        })
    })?;
    Ok(respond(StatusCode::OK, None, body))
}

async fn clear_comment_flags(req: HttpRequest, path: web::Path<String>, data: web::Data<AppState>) -> ApiResult {
    require_role(&req, &[Role::Admin])?;
    let comment_id = parse_id(Entity::Comment, &path)?;
    let command = Command::ClearCommentFlags { at: Utc::now(), comment_id };
    execute(&data, command, StatusCode::OK, Some("Flags cleared"))
}

async fn delete_comment(
    req: HttpRequest,
    path: web::Path<String>,
    body: Option<web::Json<ReasonRequest>>,
    data: web::Data<AppState>,
) -> ApiResult {
    require_role(&req, &[Role::Admin])?;
    let comment_id = parse_id(Entity::Comment, &path)?;
    let reason = body.and_then(|b| b.into_inner().reason).unwrap_or_default();
    let command = Command::DeleteComment { at: Utc::now(), comment_id, reason };
    execute(&data, command, StatusCode::OK, Some("Comment deleted"))
}

async fn restore_comment(req: HttpRequest, path: web::Path<String>, data: web::Data<AppState>) -> ApiResult {
    require_role(&req, &[Role::Admin])?;
    let comment_id = parse_id(Entity::Comment, &path)?;
    let command = Command::RestoreComment { at: Utc::now(), comment_id };
    execute(&data, command, StatusCode::OK, Some("Comment restored"))
}

// --- Admin

async fn get_dashboard(req: HttpRequest, data: web::Data<AppState>) -> ApiResult {
    require_role(&req, &[Role::Admin])?;
    let stats = data.marketplace.read(|repository| dashboard(repository, Utc::now()))?;
    Ok(respond(StatusCode::OK, None, json!({ "dashboard": stats })))
}

async fn get_commission(req: HttpRequest, data: web::Data<AppState>) -> ApiResult {
    require_role(&req, &[Role::Admin])?;
    Ok(respond(StatusCode::OK, None, json!({ "commission": commission(&data)? })))
}

async fn update_commission(
    req: HttpRequest,
    body: web::Json<CommissionConfig>,
    data: web::Data<AppState>,
) -> ApiResult {
    let admin = require_role(&req, &[Role::Admin])?;
    let config = body.into_inner();
    info!("{:<12} --> {} set commission {:?}", "Admin", admin.user_id(), config);
    let command = Command::UpdateCommission { at: Utc::now(), config };
    execute(&data, command, StatusCode::OK, Some("Commission updated"))
}

async fn get_media(path: web::Path<String>, data: web::Data<AppState>) -> ApiResult {
    let key = path.into_inner();
    let object = data
        .marketplace
        .storage()
        .fetch(&key)
        .ok_or_else(|| ApiError(Errors::not_found(Entity::Media, &key)))?;
    Ok(HttpResponse::Ok()
        .content_type(object.content_type)
        .body(object.content))
}

fn bad_request(message: String) -> actix_web::Error {
    ApiError(Errors::invalid("body", message)).into()
}

// Configure routes
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| bad_request(err.to_string())))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| bad_request(err.to_string())))
        .service(
            web::scope("")
                .route("/contact/submit", web::post().to(submit_contact))
                .route("/contact/admin/queries", web::get().to(get_contact_queries))
                .route("/contact/admin/queries/stats", web::get().to(get_contact_stats))
                .route("/contact/admin/queries/{id}", web::put().to(update_contact_query))
                .route("/contact/admin/queries/{id}", web::delete().to(delete_contact_query))
                .route("/auctions", web::get().to(get_auctions))
                .route("/auctions", web::post().to(create_auction))
                .route("/auctions/{id}", web::get().to(get_auction))
                .route("/auctions/{id}", web::put().to(edit_auction))
                .route("/auctions/{id}/bids", web::post().to(place_bid))
                .route("/auctions/{id}/buy-now", web::post().to(buy_now))
                .route("/admin/auctions/{id}/cancel", web::post().to(cancel_auction))
                .route("/offers/my", web::get().to(my_offers))
                .route("/offers/auction/{auction_id}", web::get().to(get_auction_offers))
                .route("/offers/auction/{auction_id}/offer", web::post().to(make_offer))
                .route(
                    "/offers/auction/{auction_id}/offer/{offer_id}/respond",
                    web::put().to(respond_to_offer),
                )
                .route(
                    "/offers/auction/{auction_id}/offer/{offer_id}/withdraw",
                    web::post().to(withdraw_offer),
                )
                .route(
                    "/offers/auction/{auction_id}/offer/{offer_id}/counter-response",
                    web::post().to(respond_to_counter),
                )
                .route("/admin/offers/expire", web::post().to(expire_offers))
                .route("/comments/auction/{auction_id}", web::get().to(get_comments))
                .route("/comments/auction/{auction_id}", web::post().to(add_comment))
                .route("/comments/{id}/flag", web::post().to(flag_comment))
                .route("/admin/comments", web::get().to(get_admin_comments))
                .route("/admin/comments/{id}/clear-flags", web::put().to(clear_comment_flags))
                .route("/admin/comments/{id}/delete", web::put().to(delete_comment))
                .route("/admin/comments/{id}/restore", web::put().to(restore_comment))
                .route("/admin/dashboard", web::get().to(get_dashboard))
                .route("/admin/commission", web::get().to(get_commission))
                .route("/admin/commission", web::put().to(update_commission))
                .route("/media/{key:.*}", web::get().to(get_media)),
        );
}
