//! Filtering and ordering helpers shared by entry and asset listings.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::Value;

use autoblog_core::{Asset, Entry, Sort, SortOrder};

/// Comparable projection of one record field.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SortKey {
    Missing,
    Bool(bool),
    Number(f64),
    Time(DateTime<Utc>),
    Text(String),
}

impl SortKey {
    fn rank(&self) -> u8 {
        match self {
            SortKey::Missing => 0,
            SortKey::Bool(_) => 1,
            SortKey::Number(_) => 2,
            SortKey::Time(_) => 3,
            SortKey::Text(_) => 4,
        }
    }

    fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => SortKey::Missing,
            Some(Value::Bool(b)) => SortKey::Bool(*b),
            Some(Value::Number(n)) => n.as_f64().map(SortKey::Number).unwrap_or(SortKey::Missing),
            Some(Value::String(s)) => SortKey::Text(s.to_lowercase()),
            Some(other) => SortKey::Text(other.to_string()),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Bool(a), SortKey::Bool(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (SortKey::Time(a), SortKey::Time(b)) => a.cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

pub(crate) fn entry_sort_key(entry: &Entry, field: &str) -> SortKey {
    match field {
        "id" => SortKey::Text(entry.id.to_string()),
        "slug" => SortKey::Text(entry.slug.clone()),
        "collection" => SortKey::Text(entry.collection.clone()),
        "blueprint" => SortKey::Text(entry.blueprint.clone()),
        "published" => SortKey::Bool(entry.published),
        "created_at" => SortKey::Time(entry.created_at),
        "updated_at" => SortKey::Time(entry.updated_at),
        other => SortKey::from_value(entry.data.get(other)),
    }
}

pub(crate) fn asset_sort_key(asset: &Asset, field: &str) -> SortKey {
    match field {
        "path" => SortKey::Text(asset.path.clone()),
        "container" => SortKey::Text(asset.container.clone()),
        "title" => SortKey::Text(asset.display_title().to_lowercase()),
        "size" => SortKey::Number(asset.size as f64),
        "created_at" => SortKey::Time(asset.created_at),
        "updated_at" => SortKey::Time(asset.updated_at),
        other => SortKey::from_value(asset.data.get(other)),
    }
}

/// Stable sort by the projected key, honouring the requested direction.
pub(crate) fn sort_by_key<T, F>(items: &mut [T], sort: &Sort, key: F)
where
    F: Fn(&T, &str) -> SortKey,
{
    items.sort_by(|a, b| {
        let ordering = key(a, &sort.field).compare(&key(b, &sort.field));
        match sort.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// Exact match of a stored field value against a query-string value.
pub(crate) fn value_matches(value: Option<&Value>, expected: &str) -> bool {
    match value {
        Some(Value::String(s)) => s == expected,
        Some(Value::Bool(b)) => parse_bool(expected) == Some(*b),
        Some(Value::Number(n)) => n.to_string() == expected,
        _ => false,
    }
}

/// Lenient boolean parsing for query strings (`true/false`, `1/0`, `yes/no`, `on/off`).
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

pub(crate) fn paginate<T>(items: Vec<T>, offset: usize, limit: usize) -> Vec<T> {
    items.into_iter().skip(offset).take(limit).collect()
}
