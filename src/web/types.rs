// src/web/types.rs
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    Auction, AuctionDetails, AuctionPatch, AuctionStatus, CommissionBreakdown, CommissionConfig, ContactQuery,
    Errors, FieldError, FileSignature, MediaSubmission, NewFile, Offer, OrderEntry,
};
use crate::marketplace::{Marketplace, MediaChanges};
use crate::money::AmountValue;
use crate::queries::PageRequest;

#[derive(Clone)]
pub struct AppState {
    pub marketplace: Arc<Marketplace>,
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl AppState {
    pub fn page(&self, params: &PageParams) -> PageRequest {
        PageRequest::new(params.page, params.limit, self.default_page_size, self.max_page_size)
    }
}

/// `{success, message?, data?, errors?}`
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl ApiResponse {
    pub fn ok(data: Value) -> Self {
        ApiResponse { success: true, message: None, data: Some(data), errors: None }
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }
}

/// Wraps a domain error so handlers can return it with `?`.
#[derive(Debug)]
pub struct ApiError(pub Errors);

impl From<Errors> for ApiError {
    fn from(e: Errors) -> Self {
        ApiError(e)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        match &self.0 {
            Errors::Internal(detail) => error!("{:<12} --> {}", "Internal", detail),
            other => warn!("{:<12} --> {}", "Rejected", other),
        }
        let body = ApiResponse {
            success: false,
            message: Some(self.0.public_message()),
            data: None,
            errors: self.0.field_errors().map(|errors| errors.to_vec()),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

pub type ApiResult = Result<HttpResponse, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

/// A file sent inline as base64.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFile {
    pub filename: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    pub size: Option<u64>,
    #[serde(default)]
    pub last_modified: i64,
    pub data: String,
}

fn default_content_type() -> String {
    "application/octet-stream".to_string()
}

impl UploadFile {
    fn decode(&self, field: &str) -> Result<NewFile, FieldError> {
        let content = general_purpose::STANDARD
            .decode(self.data.trim())
            .map_err(|_| FieldError::new(field, format!("{} is not valid base64", self.filename)))?;
        Ok(NewFile {
            signature: FileSignature {
                filename: self.filename.clone(),
                size: self.size.unwrap_or(content.len() as u64),
                last_modified: self.last_modified,
            },
            content_type: self.content_type.clone(),
            content,
        })
    }
}

fn decode_all(field: &str, files: &[UploadFile]) -> Result<Vec<NewFile>, Errors> {
    let mut decoded = Vec::with_capacity(files.len());
    let mut errors = Vec::new();
    for file in files {
        match file.decode(field) {
            Ok(file) => decoded.push(file),
            Err(e) => errors.push(e),
        }
    }
    if errors.is_empty() {
        Ok(decoded)
    } else {
        Err(Errors::Validation(errors))
    }
}

/// Uploads on creation: files in display order with optional captions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMedia {
    #[serde(default)]
    pub files: Vec<UploadFile>,
    #[serde(default)]
    pub captions: Vec<String>,
}

impl NewMedia {
    fn into_submission(self, field: &str) -> Result<MediaSubmission, Errors> {
        Ok(MediaSubmission {
            order: (0..self.files.len())
                .map(|i| OrderEntry { id: format!("new-{}", i), is_existing: false })
                .collect(),
            captions: self.captions,
            removed: Vec::new(),
            new_files: decode_all(field, &self.files)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuctionRequest {
    pub id: Option<Uuid>,
    #[serde(flatten)]
    pub details: AuctionDetails,
    #[serde(default)]
    pub photos: NewMedia,
    #[serde(default)]
    pub documents: NewMedia,
    #[serde(default)]
    pub service_records: NewMedia,
}

impl CreateAuctionRequest {
    pub fn media(self) -> Result<(AuctionDetails, MediaChanges), Errors> {
        Ok((
            self.details,
            MediaChanges {
                photos: Some(self.photos.into_submission("photos")?),
                documents: Some(self.documents.into_submission("documents")?),
                service_records: Some(self.service_records.into_submission("serviceRecords")?),
            },
        ))
    }
}

/// Edit of one media collection: the full order, captions by position,
/// removed existing ids and the new files in the order they appear.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaEdit {
    pub order: Vec<OrderEntry>,
    #[serde(default)]
    pub captions: Vec<String>,
    #[serde(default)]
    pub removed: Vec<Uuid>,
    #[serde(default)]
    pub new_files: Vec<UploadFile>,
}

impl MediaEdit {
    fn into_submission(self, field: &str) -> Result<MediaSubmission, Errors> {
        Ok(MediaSubmission {
            order: self.order,
            captions: self.captions,
            removed: self.removed,
            new_files: decode_all(field, &self.new_files)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditAuctionRequest {
    pub expected_version: Option<u64>,
    #[serde(flatten)]
    pub patch: AuctionPatch,
    pub photos: Option<MediaEdit>,
    pub documents: Option<MediaEdit>,
    pub service_records: Option<MediaEdit>,
}

impl EditAuctionRequest {
    pub fn media(self) -> Result<(Option<u64>, AuctionPatch, MediaChanges), Errors> {
        let media = MediaChanges {
            photos: self.photos.map(|m| m.into_submission("photos")).transpose()?,
            documents: self.documents.map(|m| m.into_submission("documents")).transpose()?,
            service_records: self
                .service_records
                .map(|m| m.into_submission("serviceRecords"))
                .transpose()?,
        };
        Ok((self.expected_version, self.patch, media))
    }
}

#[derive(Debug, Deserialize)]
pub struct BidRequest {
    pub amount: AmountValue,
}

#[derive(Debug, Deserialize)]
pub struct OfferRequest {
    pub amount: AmountValue,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct FlagRequest {
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReasonRequest {
    pub reason: Option<String>,
}

/// Contact query as returned to clients, with its public reference.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactQueryView<'a> {
    #[serde(flatten)]
    pub query: &'a ContactQuery,
    pub query_id: String,
}

impl<'a> From<&'a ContactQuery> for ContactQueryView<'a> {
    fn from(query: &'a ContactQuery) -> Self {
        ContactQueryView { query, query_id: query.query_id() }
    }
}

/// Auction with bids ranked by amount and, once sold, the fee breakdown.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionView {
    #[serde(flatten)]
    pub auction: Auction,
    pub minimum_next_bid: Option<AmountValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission: Option<CommissionBreakdown>,
}

impl AuctionView {
    pub fn new(auction: &Auction, commission: &CommissionConfig) -> Self {
        let mut auction = auction.clone();
        auction.bids = auction.bids_by_amount();
        AuctionView {
            minimum_next_bid: (auction.status == AuctionStatus::Active)
                .then(|| auction.minimum_next_bid().ok())
                .flatten(),
            commission: (auction.status == AuctionStatus::Sold)
                .then(|| commission.breakdown(auction.details.currency, auction.current_price).ok())
                .flatten(),
            auction,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferView {
    #[serde(flatten)]
    pub offer: Offer,
    pub time_remaining_seconds: Option<i64>,
}

impl OfferView {
    pub fn new(offer: Offer, now: DateTime<Utc>) -> Self {
        OfferView {
            time_remaining_seconds: offer.time_remaining(now).map(|d| d.num_seconds()),
            offer,
        }
    }
}
