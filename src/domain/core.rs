// src/domain/core.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::money::{AmountValue, MoneyError, MAX_AMOUNT};

pub type UserId = String;
pub type AuctionId = Uuid;
pub type OfferId = Uuid;
pub type CommentId = Uuid;
pub type ContactQueryId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Bidder,
    Seller,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum User {
    Bidder { user_id: UserId, name: String },
    Seller { user_id: UserId, name: String },
    Admin { user_id: UserId },
}

impl User {
    pub fn user_id(&self) -> &UserId {
        match self {
            User::Bidder { user_id, .. } => user_id,
            User::Seller { user_id, .. } => user_id,
            User::Admin { user_id } => user_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            User::Bidder { name, .. } | User::Seller { name, .. } => name,
            User::Admin { .. } => "Administrator",
        }
    }

    pub fn role(&self) -> Role {
        match self {
            User::Bidder { .. } => Role::Bidder,
            User::Seller { .. } => Role::Seller,
            User::Admin { .. } => Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }
}

impl<'de> Deserialize<'de> for User {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        let parts: Vec<&str> = text.split('|').collect();

        match parts.as_slice() {
            ["Bidder", user_id, name] => Ok(User::Bidder {
                user_id: user_id.to_string(),
                name: name.to_string(),
            }),
            ["Seller", user_id, name] => Ok(User::Seller {
                user_id: user_id.to_string(),
                name: name.to_string(),
            }),
            ["Admin", user_id] => Ok(User::Admin {
                user_id: user_id.to_string(),
            }),
            _ => Err(serde::de::Error::custom(format!(
                "parsing User failed, could not interpret values: {:?}",
                parts
            ))),
        }
    }
}

impl Serialize for User {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            User::Bidder { user_id, name } => write!(f, "Bidder|{}|{}", user_id, name),
            User::Seller { user_id, name } => write!(f, "Seller|{}|{}", user_id, name),
            User::Admin { user_id } => write!(f, "Admin|{}", user_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Auction,
    Offer,
    Comment,
    ContactQuery,
    Media,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Auction => write!(f, "Auction"),
            Entity::Offer => write!(f, "Offer"),
            Entity::Comment => write!(f, "Comment"),
            Entity::ContactQuery => write!(f, "Query"),
            Entity::Media => write!(f, "Media"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Collects field errors and turns them into a single `Errors::Validation`.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    pub fn within_limit(&mut self, value: AmountValue, field: &str) -> &mut Self {
        self.check(value <= MAX_AMOUNT, field, "Amount exceeds the maximum allowed")
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.push(FieldError::new(field, message));
        self
    }

    pub fn finish(self) -> Result<(), Errors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Errors::Validation(self.errors))
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Errors {
    #[error("Validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    #[error("{0} not found: {1}")]
    NotFound(Entity, String),

    #[error("Cannot {action} a {status} {entity}")]
    InvalidStateTransition {
        entity: Entity,
        status: String,
        action: &'static str,
    },

    #[error("Bid must be at least {minimum}")]
    BidTooLow { minimum: i64 },

    #[error("Sellers cannot bid on or make offers for their own auction: {0}")]
    SellerCannotParticipate(AuctionId),

    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{entity} {id} has been modified (expected version {expected}, found {actual})")]
    Conflict {
        entity: Entity,
        id: String,
        expected: u64,
        actual: u64,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl Errors {
    pub fn not_found(entity: Entity, id: impl ToString) -> Self {
        Errors::NotFound(entity, id.to_string())
    }

    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Errors::Validation(vec![FieldError::new(field, message)])
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Errors::Validation(_)
            | Errors::InvalidStateTransition { .. }
            | Errors::BidTooLow { .. }
            | Errors::SellerCannotParticipate(_) => 400,
            Errors::Unauthorized => 401,
            Errors::Forbidden(_) => 403,
            Errors::NotFound(_, _) => 404,
            Errors::Conflict { .. } => 409,
            Errors::Internal(_) => 500,
        }
    }

    /// Message safe to return to callers; internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Errors::Internal(_) => "Something went wrong, please try again later".to_string(),
            Errors::Validation(_) => "Validation failed".to_string(),
            other => other.to_string(),
        }
    }

    pub fn field_errors(&self) -> Option<&[FieldError]> {
        match self {
            Errors::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<MoneyError> for Errors {
    fn from(e: MoneyError) -> Self {
        Errors::invalid("amount", e.to_string())
    }
}
