//! Sorting, pagination and field projection shared by every list operation

use crate::error::FetchError;
use crate::types::{LanguageVersionRecord, RoadmapVersion, VersionRecord};
use chrono::NaiveDate;
use semver::{Prerelease, Version};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Largest accepted `limit`
pub const MAX_LIMIT: i64 = 1000;

/// Sort order for list results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    VersionDesc,
    VersionAsc,
    DateDesc,
    DateAsc,
}

impl SortOrder {
    pub const TOKENS: [&'static str; 4] = ["version_desc", "version_asc", "date_desc", "date_asc"];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::VersionDesc => "version_desc",
            SortOrder::VersionAsc => "version_asc",
            SortOrder::DateDesc => "date_desc",
            SortOrder::DateAsc => "date_asc",
        }
    }

    /// Parse a token, falling back to [`SortOrder::VersionDesc`]
    pub fn parse_lenient(token: &str) -> Self {
        token.parse().unwrap_or_default()
    }
}

impl FromStr for SortOrder {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "version_desc" => Ok(SortOrder::VersionDesc),
            "version_asc" => Ok(SortOrder::VersionAsc),
            "date_desc" => Ok(SortOrder::DateDesc),
            "date_asc" => Ok(SortOrder::DateAsc),
            other => Err(FetchError::Validation(format!(
                "sort must be one of {}, got '{}'",
                SortOrder::TOKENS.join(", "),
                other
            ))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records that can be ordered by version and date
pub trait Sortable {
    fn sort_version(&self) -> Option<&str>;
    fn sort_date(&self) -> Option<NaiveDate>;
}

impl Sortable for VersionRecord {
    fn sort_version(&self) -> Option<&str> {
        Some(&self.version)
    }

    fn sort_date(&self) -> Option<NaiveDate> {
        self.release_date
    }
}

impl Sortable for LanguageVersionRecord {
    fn sort_version(&self) -> Option<&str> {
        Some(&self.version)
    }

    fn sort_date(&self) -> Option<NaiveDate> {
        self.release_date
    }
}

impl Sortable for RoadmapVersion {
    fn sort_version(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn sort_date(&self) -> Option<NaiveDate> {
        self.due_date
    }
}

/// Comparable key for a version string
///
/// Valid semver parses directly. Anything else is padded from its leading
/// numeric components (`3.4` -> `3.4.0`, `7.1.0.beta1` -> `7.1.0-beta1`);
/// strings without a leading number sort as `0.0.0`.
pub fn version_key(raw: &str) -> Version {
    if let Ok(version) = Version::parse(raw) {
        return version;
    }

    let mut numbers = [0u64; 3];
    let mut rest = Vec::new();
    for (idx, part) in raw.split(['.', '-']).enumerate() {
        match part.parse::<u64>() {
            Ok(n) if idx < 3 && rest.is_empty() => numbers[idx] = n,
            _ => rest.push(part),
        }
    }

    let mut version = Version::new(numbers[0], numbers[1], numbers[2]);
    if !rest.is_empty() {
        version.pre = Prerelease::new(&rest.join(".")).unwrap_or(Prerelease::EMPTY);
    }
    version
}

fn compare<T: Sortable>(a: &T, b: &T, order: SortOrder) -> Ordering {
    let by_version = || {
        let a = a.sort_version().map(version_key);
        let b = b.sort_version().map(version_key);
        a.cmp(&b)
    };
    match order {
        SortOrder::VersionAsc => by_version(),
        SortOrder::VersionDesc => by_version().reverse(),
        SortOrder::DateAsc => a.sort_date().cmp(&b.sort_date()),
        SortOrder::DateDesc => b.sort_date().cmp(&a.sort_date()),
    }
}

/// Stable sort in place
pub fn sort<T: Sortable>(records: &mut [T], order: SortOrder) {
    records.sort_by(|a, b| compare(a, b, order));
}

/// Skip `offset` records and keep at most `limit`
pub fn paginate<T>(records: Vec<T>, offset: usize, limit: Option<usize>) -> Vec<T> {
    let remaining = records.into_iter().skip(offset);
    match limit {
        Some(limit) => remaining.take(limit).collect(),
        None => remaining.collect(),
    }
}

/// Sort then paginate; an unrecognized sort token means `version_desc`
pub fn apply<T: Sortable>(
    mut records: Vec<T>,
    limit: Option<usize>,
    offset: usize,
    sort_token: &str,
) -> Vec<T> {
    sort(&mut records, SortOrder::parse_lenient(sort_token));
    paginate(records, offset, limit)
}

/// Validated pagination and sort options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Query {
    pub limit: Option<usize>,
    pub offset: usize,
    pub sort: SortOrder,
}

impl Query {
    /// Validate caller-supplied options
    pub fn new(limit: Option<i64>, offset: Option<i64>, sort: Option<&str>) -> Result<Self, FetchError> {
        let limit = match limit {
            None => None,
            Some(l) if (1..=MAX_LIMIT).contains(&l) => Some(l as usize),
            Some(l) => {
                return Err(FetchError::Validation(format!(
                    "limit must be between 1 and {}, got {}",
                    MAX_LIMIT, l
                )))
            }
        };
        let offset = match offset {
            None => 0,
            Some(o) if o >= 0 => o as usize,
            Some(o) => {
                return Err(FetchError::Validation(format!(
                    "offset must not be negative, got {}",
                    o
                )))
            }
        };
        let sort = match sort {
            None => SortOrder::default(),
            Some(token) => token.parse()?,
        };
        Ok(Self { limit, offset, sort })
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Sort then paginate
    pub fn apply<T: Sortable>(&self, mut records: Vec<T>) -> Vec<T> {
        sort(&mut records, self.sort);
        self.paginate(records)
    }

    /// Paginate without reordering
    pub fn paginate<T>(&self, records: Vec<T>) -> Vec<T> {
        paginate(records, self.offset, self.limit)
    }
}

/// Keep only the named keys of each object
///
/// Works on a single object or an array of objects; unknown names are
/// ignored and an empty list leaves the value untouched.
pub fn select_fields(value: Value, fields: &[String]) -> Value {
    if fields.is_empty() {
        return value;
    }
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| select_fields(item, fields))
                .collect(),
        ),
        Value::Object(map) => {
            let projected: Map<String, Value> = map
                .into_iter()
                .filter(|(key, _)| fields.iter().any(|f| f == key))
                .collect();
            Value::Object(projected)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(versions: &[(&str, Option<(i32, u32, u32)>)]) -> Vec<VersionRecord> {
        versions
            .iter()
            .map(|(v, date)| {
                let mut record = VersionRecord::new(*v);
                record.release_date = date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
                record
            })
            .collect()
    }

    fn names(records: &[VersionRecord]) -> Vec<&str> {
        records.iter().map(|r| r.version.as_str()).collect()
    }

    #[test]
    fn test_version_sort_is_semantic() {
        let mut list = records(&[("1.10.0", None), ("1.2.0", None), ("1.9.3", None)]);
        sort(&mut list, SortOrder::VersionDesc);
        assert_eq!(names(&list), vec!["1.10.0", "1.9.3", "1.2.0"]);
    }

    #[test]
    fn test_desc_then_asc_is_reversed() {
        let input = records(&[
            ("2.0.0", None),
            ("0.9.1", None),
            ("10.0.0", None),
            ("2.0.10", None),
        ]);
        let mut desc = input.clone();
        sort(&mut desc, SortOrder::VersionDesc);
        let mut asc = input;
        sort(&mut asc, SortOrder::VersionAsc);
        let reversed: Vec<_> = asc.into_iter().rev().collect();
        assert_eq!(desc, reversed);
    }

    #[test]
    fn test_date_sort() {
        let list = records(&[
            ("1.0.0", Some((2020, 1, 1))),
            ("1.1.0", Some((2021, 6, 1))),
            ("0.9.0", Some((2019, 3, 1))),
        ]);
        let sorted = apply(list, None, 0, "date_desc");
        assert_eq!(names(&sorted), vec!["1.1.0", "1.0.0", "0.9.0"]);
    }

    #[test]
    fn test_offset_past_end_is_empty() {
        let list = records(&[("1.0.0", None), ("2.0.0", None)]);
        for token in SortOrder::TOKENS {
            for limit in [None, Some(1), Some(1000)] {
                assert!(apply(list.clone(), limit, 2, token).is_empty());
                assert!(apply(list.clone(), limit, 50, token).is_empty());
            }
        }
    }

    #[test]
    fn test_unknown_sort_falls_back_to_version_desc() {
        let list = records(&[("1.0.0", None), ("3.0.0", None), ("2.0.0", None)]);
        let sorted = apply(list, Some(2), 0, "popularity");
        assert_eq!(names(&sorted), vec!["3.0.0", "2.0.0"]);
    }

    #[test]
    fn test_version_key_padding() {
        assert_eq!(version_key("3.4"), Version::new(3, 4, 0));
        assert!(version_key("7.1.0.beta1") < version_key("7.1.0"));
        assert!(version_key("3.3.0-preview1") < version_key("3.3.0"));
        assert_eq!(version_key("trunk").major, 0);
    }

    #[test]
    fn test_query_validation() {
        assert!(Query::new(Some(0), None, None).is_err());
        assert!(Query::new(Some(1001), None, None).is_err());
        assert!(Query::new(None, Some(-1), None).is_err());
        assert!(matches!(
            Query::new(None, None, Some("newest")),
            Err(FetchError::Validation(_))
        ));

        let query = Query::new(Some(10), Some(5), Some("date_asc")).unwrap();
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.offset, 5);
        assert_eq!(query.sort, SortOrder::DateAsc);
    }

    #[test]
    fn test_select_fields() {
        let value = json!([
            {"name": "rails", "version": "7.1.0", "description": "Web framework"},
            {"name": "rack", "version": "3.0.0", "description": "Interface"}
        ]);
        let fields = vec!["name".to_string(), "version".to_string(), "bogus".to_string()];
        assert_eq!(
            select_fields(value, &fields),
            json!([
                {"name": "rails", "version": "7.1.0"},
                {"name": "rack", "version": "3.0.0"}
            ])
        );
    }

    #[test]
    fn test_select_fields_empty_is_passthrough() {
        let value = json!({"name": "rails", "downloads": 5});
        assert_eq!(select_fields(value.clone(), &[]), value);
    }
}
