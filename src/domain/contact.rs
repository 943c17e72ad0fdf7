// src/domain/contact.rs
//! Support tickets raised through the public contact form.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::core::{ContactQueryId, Errors, UserId, Validator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Bidder,
    Seller,
}

impl UserType {
    pub const ALL: [UserType; 2] = [UserType::Bidder, UserType::Seller];
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bidder" => Ok(UserType::Bidder),
            "seller" => Ok(UserType::Seller),
            _ => Err(format!("Unknown user type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryStatus {
    New,
    InProgress,
    Resolved,
    Closed,
}

impl QueryStatus {
    pub const ALL: [QueryStatus; 4] = [
        QueryStatus::New,
        QueryStatus::InProgress,
        QueryStatus::Resolved,
        QueryStatus::Closed,
    ];

    /// Statuses that count as the query having been answered.
    pub fn is_responded(&self) -> bool {
        matches!(self, QueryStatus::Resolved | QueryStatus::Closed)
    }
}

impl FromStr for QueryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(QueryStatus::New),
            "in-progress" => Ok(QueryStatus::InProgress),
            "resolved" => Ok(QueryStatus::Resolved),
            "closed" => Ok(QueryStatus::Closed),
            _ => Err(format!("Unknown query status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum QueryCategory {
    #[default]
    General,
    Bidding,
    Selling,
    Payment,
    Account,
    Technical,
    VehicleInspection,
    Shipping,
    Other,
}

impl QueryCategory {
    pub const ALL: [QueryCategory; 9] = [
        QueryCategory::General,
        QueryCategory::Bidding,
        QueryCategory::Selling,
        QueryCategory::Payment,
        QueryCategory::Account,
        QueryCategory::Technical,
        QueryCategory::VehicleInspection,
        QueryCategory::Shipping,
        QueryCategory::Other,
    ];
}

impl FromStr for QueryCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryCategory::ALL
            .iter()
            .copied()
            .find(|c| c.to_string() == s)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl fmt::Display for QueryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            QueryCategory::General => "general",
            QueryCategory::Bidding => "bidding",
            QueryCategory::Selling => "selling",
            QueryCategory::Payment => "payment",
            QueryCategory::Account => "account",
            QueryCategory::Technical => "technical",
            QueryCategory::VehicleInspection => "vehicle-inspection",
            QueryCategory::Shipping => "shipping",
            QueryCategory::Other => "other",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Medium, Priority::High, Priority::Urgent];

    pub fn rank(&self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Urgent => 4,
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// Short reference shown to users: "UQ" and the last six hex digits of the id.
pub fn query_reference(id: &ContactQueryId) -> String {
    let hex = id.simple().to_string();
    format!("UQ{}", hex[hex.len() - 6..].to_uppercase())
}

/// Raw contact form as submitted; every field is checked before use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub user_type: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub category: Option<String>,
}

fn filled(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && domain.contains('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactQuery {
    pub id: ContactQueryId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub user_type: UserType,
    pub subject: Option<String>,
    pub message: String,
    pub status: QueryStatus,
    pub category: QueryCategory,
    pub priority: Priority,
    pub assigned_to: Option<UserId>,
    pub notes: String,
    pub response: String,
    pub responded_at: Option<DateTime<Utc>>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing)]
    pub seq: u64,
}

impl ContactQuery {
    pub fn submit(
        id: ContactQueryId,
        form: &ContactForm,
        ip_address: Option<String>,
        user_agent: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<ContactQuery, Errors> {
        let name = filled(&form.name);
        let email = filled(&form.email).map(|e| e.to_lowercase());
        let message = filled(&form.message);
        let user_type = filled(&form.user_type).map(|t| UserType::from_str(&t.to_lowercase()));
        let category = filled(&form.category).map(|c| QueryCategory::from_str(&c.to_lowercase()));

        let mut v = Validator::new();
        v.check(name.is_some(), "name", "Name is required");
        match &email {
            None => {
                v.push("email", "Email is required");
            }
            Some(email) => {
                v.check(looks_like_email(email), "email", "Please provide a valid email address");
            }
        }
        match &user_type {
            None => {
                v.push("userType", "User type is required");
            }
            Some(parsed) => {
                v.check(parsed.is_ok(), "userType", "User type must be bidder or seller");
            }
        }
        v.check(message.is_some(), "message", "Message is required");
        if let Some(Err(e)) = &category {
            v.push("category", e.clone());
        }
        v.finish()?;

        Ok(ContactQuery {
            id,
            name: name.unwrap_or_default(),
            email: email.unwrap_or_default(),
            phone: filled(&form.phone),
            user_type: match user_type {
                Some(Ok(user_type)) => user_type,
                _ => return Err(Errors::invalid("userType", "User type is required")),
            },
            subject: filled(&form.subject),
            message: message.unwrap_or_default(),
            status: QueryStatus::New,
            category: category.and_then(Result::ok).unwrap_or_default(),
            priority: Priority::default(),
            assigned_to: None,
            notes: String::new(),
            response: String::new(),
            responded_at: None,
            ip_address,
            user_agent,
            created_at: at,
            updated_at: at,
            seq: 0,
        })
    }

    pub fn query_id(&self) -> String {
        query_reference(&self.id)
    }

    pub fn apply(&self, patch: &ContactQueryPatch, at: DateTime<Utc>) -> ContactQuery {
        let mut next = self.clone();
        if let Some(status) = patch.status {
            next.status = status;
            if status.is_responded() {
                next.responded_at = Some(at);
            }
        }
        if let Some(notes) = &patch.notes {
            next.notes = notes.clone();
        }
        if let Some(response) = &patch.response {
            next.response = response.clone();
        }
        if let Some(priority) = patch.priority {
            next.priority = priority;
        }
        if let Some(assigned_to) = &patch.assigned_to {
            next.assigned_to = assigned_to.clone();
        }
        next.updated_at = at;
        next
    }
}

/// Admin update of a query. Only these fields can ever change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactQueryPatch {
    pub status: Option<QueryStatus>,
    pub notes: Option<String>,
    pub response: Option<String>,
    pub priority: Option<Priority>,
    /// `Some(None)` unassigns.
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub assigned_to: Option<Option<UserId>>,
}

/// Keeps an explicit `null` apart from a missing key.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ContactQueryPatch {
    /// Picks the whitelisted keys out of an arbitrary JSON body. Unknown keys
    /// and values of the wrong shape are dropped.
    pub fn from_json(body: &Value) -> ContactQueryPatch {
        let text = |key: &str| body.get(key).and_then(Value::as_str);
        ContactQueryPatch {
            status: text("status").and_then(|s| QueryStatus::from_str(s).ok()),
            notes: text("notes").map(str::to_string),
            response: text("response").map(str::to_string),
            priority: text("priority").and_then(|p| Priority::from_str(p).ok()),
            assigned_to: match body.get("assignedTo") {
                Some(Value::Null) => Some(None),
                Some(Value::String(user)) if user.trim().is_empty() => Some(None),
                Some(Value::String(user)) => Some(Some(user.trim().to_string())),
                _ => None,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &ContactQueryPatch::default()
    }
}
