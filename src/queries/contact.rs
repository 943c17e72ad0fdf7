// src/queries/contact.rs
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use super::{contains_ci, filter_value, histogram, paginate, rate, search_term, Page, PageRequest};
use crate::domain::{ContactQuery, Priority, QueryCategory, QueryStatus, Repository, UserType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContactSort {
    #[default]
    Recent,
    Oldest,
    Priority,
    Name,
}

impl FromStr for ContactSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recent" | "newest" => Ok(ContactSort::Recent),
            "oldest" => Ok(ContactSort::Oldest),
            "priority" => Ok(ContactSort::Priority),
            "name" => Ok(ContactSort::Name),
            _ => Err(format!("Unknown sort: {}", s)),
        }
    }
}

/// Query-string filters of the admin list. Values that do not parse are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactQueryFilter {
    pub status: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub user_type: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

impl ContactQueryFilter {
    pub fn matches(&self, query: &ContactQuery) -> bool {
        let status: Option<QueryStatus> = filter_value(&self.status);
        let category: Option<QueryCategory> = filter_value(&self.category);
        let priority: Option<Priority> = filter_value(&self.priority);
        let user_type: Option<UserType> = filter_value(&self.user_type);

        status.map_or(true, |s| query.status == s)
            && category.map_or(true, |c| query.category == c)
            && priority.map_or(true, |p| query.priority == p)
            && user_type.map_or(true, |u| query.user_type == u)
            && self.date_from.map_or(true, |from| query.created_at >= from)
            && self.date_to.map_or(true, |to| query.created_at <= to)
            && search_term(&self.search).map_or(true, |term| {
                contains_ci(&query.name, &term)
                    || contains_ci(&query.email, &term)
                    || contains_ci(&query.message, &term)
                    || contains_ci(&query.query_id(), &term)
                    || query.subject.as_deref().map_or(false, |s| contains_ci(s, &term))
            })
    }

    pub fn sort(&self) -> ContactSort {
        filter_value(&self.sort).unwrap_or_default()
    }
}

/// Sorts in place. The input is expected in insertion order; every sort is
/// stable so equal keys keep that order.
pub fn sort_queries(queries: &mut [&ContactQuery], sort: ContactSort) {
    match sort {
        ContactSort::Recent => queries.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        ContactSort::Oldest => queries.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        ContactSort::Priority => queries.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank())),
        ContactSort::Name => queries.sort_by_key(|q| q.name.to_lowercase()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactListStatistics {
    pub total_queries: usize,
    pub new_queries: usize,
    pub in_progress_queries: usize,
    pub resolved_queries: usize,
    pub closed_queries: usize,
    pub urgent_queries: usize,
    pub response_rate: f64,
}

pub fn list_statistics(queries: &[&ContactQuery]) -> ContactListStatistics {
    let count = |status: QueryStatus| queries.iter().filter(|q| q.status == status).count();
    let resolved = count(QueryStatus::Resolved);
    let closed = count(QueryStatus::Closed);
    ContactListStatistics {
        total_queries: queries.len(),
        new_queries: count(QueryStatus::New),
        in_progress_queries: count(QueryStatus::InProgress),
        resolved_queries: resolved,
        closed_queries: closed,
        urgent_queries: queries.iter().filter(|q| q.priority == Priority::Urgent).count(),
        response_rate: rate(resolved + closed, queries.len()),
    }
}

pub struct ContactListing<'a> {
    pub page: Page<&'a ContactQuery>,
    pub statistics: ContactListStatistics,
}

/// Filtered, sorted page of queries plus statistics over all queries.
pub fn list_queries<'a>(
    repository: &'a Repository,
    filter: &ContactQueryFilter,
    page: PageRequest,
) -> ContactListing<'a> {
    let all = repository.contact_query_list();
    let statistics = list_statistics(&all);
    let mut matching: Vec<&ContactQuery> = all.into_iter().filter(|q| filter.matches(q)).collect();
    sort_queries(&mut matching, filter.sort());
    ContactListing {
        page: paginate(matching, page),
        statistics,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
    pub by_user_type: BTreeMap<String, usize>,
    pub today: usize,
    pub last_7_days: usize,
    pub last_30_days: usize,
    pub response_rate: f64,
    pub average_response_hours: Option<f64>,
}

pub fn contact_stats(repository: &Repository, now: DateTime<Utc>) -> ContactStats {
    let all = repository.contact_query_list();
    let since = |window: Duration| all.iter().filter(|q| q.created_at > now - window).count();
    let start_of_day = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|d| d.and_utc())
        .unwrap_or(now);

    let response_hours: Vec<f64> = all
        .iter()
        .filter_map(|q| q.responded_at.map(|r| (r - q.created_at).num_minutes() as f64 / 60.0))
        .collect();
    let average_response_hours = if response_hours.is_empty() {
        None
    } else {
        let mean = response_hours.iter().sum::<f64>() / response_hours.len() as f64;
        Some((mean * 10.0).round() / 10.0)
    };

    ContactStats {
        total: all.len(),
        by_status: histogram(&QueryStatus::ALL, all.iter().map(|q| q.status)),
        by_category: histogram(&QueryCategory::ALL, all.iter().map(|q| q.category)),
        by_priority: histogram(&Priority::ALL, all.iter().map(|q| q.priority)),
        by_user_type: histogram(&UserType::ALL, all.iter().map(|q| q.user_type)),
        today: all.iter().filter(|q| q.created_at >= start_of_day).count(),
        last_7_days: since(Duration::days(7)),
        last_30_days: since(Duration::days(30)),
        response_rate: rate(
            all.iter().filter(|q| q.status.is_responded()).count(),
            all.len(),
        ),
        average_response_hours,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{handle, Command, ContactForm, ContactQueryPatch};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 20, 15, 0, 0).unwrap()
    }

    fn submit(repo: Repository, n: u128, name: &str, message: &str, at: DateTime<Utc>) -> Repository {
        let form = ContactForm {
            name: Some(name.into()),
            email: Some(format!("{}@example.com", name.to_lowercase())),
            user_type: Some(if n % 2 == 0 { "bidder" } else { "seller" }.into()),
            message: Some(message.into()),
            ..ContactForm::default()
        };
        let command = Command::SubmitContactQuery {
            at,
            query_id: Uuid::from_u128(n),
            form,
            ip_address: None,
            user_agent: None,
        };
        handle(command, repo).unwrap().1
    }

    fn update(repo: Repository, n: u128, patch: ContactQueryPatch, at: DateTime<Utc>) -> Repository {
        handle(Command::UpdateContactQuery { at, query_id: Uuid::from_u128(n), patch }, repo)
            .unwrap()
            .1
    }

    fn prioritize(repo: Repository, n: u128, priority: Priority) -> Repository {
        update(repo, n, ContactQueryPatch { priority: Some(priority), ..Default::default() }, now())
    }

    fn seeded() -> Repository {
        let mut repo = Repository::default();
        let names = ["Dana", "alex", "Chris", "Bea", "Eve"];
        let priorities = [Priority::Low, Priority::Urgent, Priority::Medium, Priority::High, Priority::Urgent];
        for (i, (name, priority)) in names.iter().zip(priorities).enumerate() {
            let n = i as u128 + 1;
            repo = submit(repo, n, name, "Payment did not go through", now() - Duration::days(i as i64));
            repo = prioritize(repo, n, priority);
        }
        repo
    }

    fn names(listing: &ContactListing) -> Vec<String> {
        listing.page.items.iter().map(|q| q.name.clone()).collect()
    }

    #[test]
    fn priority_sort_is_stable() {
        let repo = seeded();
        let filter = ContactQueryFilter { sort: Some("priority".into()), ..Default::default() };
        let listing = list_queries(&repo, &filter, PageRequest::default());
        assert_eq!(names(&listing), vec!["alex", "Eve", "Bea", "Chris", "Dana"]);
    }

    #[test]
    fn other_sorts() {
        let repo = seeded();
        let by = |sort: &str| {
            let filter = ContactQueryFilter { sort: Some(sort.into()), ..Default::default() };
            names(&list_queries(&repo, &filter, PageRequest::default()))
        };
        assert_eq!(by("recent"), vec!["Dana", "alex", "Chris", "Bea", "Eve"]);
        assert_eq!(by("oldest"), vec!["Eve", "Bea", "Chris", "alex", "Dana"]);
        assert_eq!(by("name"), vec!["alex", "Bea", "Chris", "Dana", "Eve"]);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let repo = submit(seeded(), 42, "Zed", "My TITLE transfer is stuck", now());
        let find = |term: &str| {
            let filter = ContactQueryFilter { search: Some(term.into()), ..Default::default() };
            names(&list_queries(&repo, &filter, PageRequest::default()))
        };
        assert_eq!(find("title"), vec!["Zed"]);
        assert_eq!(find("ZED@EXAMPLE"), vec!["Zed"]);
        let reference = crate::domain::query_reference(&Uuid::from_u128(42)).to_lowercase();
        assert_eq!(find(&reference), vec!["Zed"]);
        assert!(find("nothing matches this").is_empty());
    }

    #[test]
    fn filters_combine() {
        let repo = seeded();
        let filter = ContactQueryFilter {
            priority: Some("urgent".into()),
            user_type: Some("bidder".into()),
            ..Default::default()
        };
        let listing = list_queries(&repo, &filter, PageRequest::default());
        assert_eq!(names(&listing), vec!["alex"]);
        assert_eq!(listing.statistics.total_queries, 5);
        assert_eq!(listing.statistics.urgent_queries, 2);

        let dated = ContactQueryFilter {
            date_from: Some(now() - Duration::days(1)),
            ..Default::default()
        };
        assert_eq!(list_queries(&repo, &dated, PageRequest::default()).page.total, 2);
    }

    #[test]
    fn stats_count_windows_and_responses() {
        let repo = update(
            seeded(),
            1,
            ContactQueryPatch { status: Some(QueryStatus::Resolved), ..Default::default() },
            now() + Duration::hours(2),
        );
        let stats = contact_stats(&repo, now() + Duration::hours(2));
        assert_eq!(stats.total, 5);
        assert_eq!(stats.by_status["resolved"], 1);
        assert_eq!(stats.by_status["new"], 4);
        assert_eq!(stats.by_category["general"], 5);
        assert_eq!(stats.today, 1);
        assert_eq!(stats.last_7_days, 5);
        assert_eq!(stats.response_rate, 20.0);
        assert_eq!(stats.average_response_hours, Some(2.0));
    }
}
