/* 📖 # Why filter first and page second?

Clients page through the filtered result: `?q=name%3DMa&offset=10&pageSize=10` is the second
page of matches, not matches within the second page. Both steps keep collection order and
borrow from the store, so nothing is copied until a response is built.
*/

use std::borrow::Cow;

use regex::{Regex, RegexBuilder};
use url::form_urlencoded;

use mockrest_base::{ErrorKind, MockApiError, MockApiResult};

use crate::params::UrlParameters;
use crate::record::Record;

struct Condition {
    field: String,
    pattern: Regex,
}

/// How filter text is turned into conditions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterOptions<'a> {
    /// Match patterns case-sensitively.
    pub case_sensitive: bool,
    /// Field that a bare pattern (a filter entry without `=`) is matched against.
    pub default_field: Option<&'a str>,
}

/// Select the records matching every `field=pattern` pair of the filter.
///
/// Patterns are unanchored regular expressions, case-insensitive unless
/// `options.case_sensitive` is set. An entry without `=` is a pattern for
/// `options.default_field`; with no default field it names a field that must match the empty
/// pattern. A record lacking a filtered field does not match. An empty filter selects
/// everything.
pub fn apply_query<'a>(
    records: &'a [Record],
    filter: Option<&str>,
    options: FilterOptions<'_>,
) -> MockApiResult<Vec<&'a Record>> {
    let conditions = match filter {
        Some(filter) => parse_conditions(filter, options)?,
        None => Vec::new(),
    };
    Ok(records
        .iter()
        .filter(|record| {
            conditions.iter().all(|condition| {
                record
                    .field_text(&condition.field)
                    .is_some_and(|text| condition.pattern.is_match(&text))
            })
        })
        .collect())
}

/// Return the `[skip, skip + limit)` window of `items`, clamped to its length.
pub fn apply_paging<'a, T>(items: &'a [T], params: &UrlParameters) -> &'a [T] {
    if !params.has_paging() {
        return items;
    }
    let len = items.len();
    let start = params.skip.unwrap_or(0).min(len);
    let end = match params.limit {
        Some(limit) => start.saturating_add(limit).min(len),
        None => len,
    };
    &items[start..end]
}

fn parse_conditions(filter: &str, options: FilterOptions<'_>) -> MockApiResult<Vec<Condition>> {
    filter
        .split('&')
        .filter_map(|entry| {
            let (name, value) = form_urlencoded::parse(entry.as_bytes()).next()?;
            match options.default_field {
                Some(field) if !entry.contains('=') => Some((Cow::Borrowed(field), name)),
                _ => Some((name, value)),
            }
        })
        .filter(|(field, _)| !field.is_empty())
        .map(|(field, pattern)| -> MockApiResult<Condition> {
            let regex = RegexBuilder::new(&pattern)
                .case_insensitive(!options.case_sensitive)
                .build()
                .map_err(|e| {
                    Box::new(MockApiError::new(ErrorKind::InvalidFilter {
                        pattern: pattern.to_string(),
                        message: e.to_string(),
                    }))
                })?;
            Ok(Condition {
                field: field.into_owned(),
                pattern: regex,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn heroes() -> Vec<Record> {
        [
            json!({"id": 11, "name": "Mr. Nice", "power": 10}),
            json!({"id": 12, "name": "Narco", "power": 20}),
            json!({"id": 13, "name": "Bombasto"}),
            json!({"id": 14, "name": "Magneta", "power": 20}),
        ]
        .into_iter()
        .map(|v| Record::from_value(v).unwrap())
        .collect()
    }

    fn insensitive() -> FilterOptions<'static> {
        FilterOptions::default()
    }

    fn ids(records: &[&Record]) -> Vec<i64> {
        records
            .iter()
            .filter_map(|r| r.get("id").and_then(|v| v.as_i64()))
            .collect()
    }

    #[test]
    fn test_no_filter_selects_everything() {
        let records = heroes();
        assert_eq!(ids(&apply_query(&records, None, insensitive()).unwrap()), vec![11, 12, 13, 14]);
        assert_eq!(ids(&apply_query(&records, Some(""), insensitive()).unwrap()), vec![11, 12, 13, 14]);
    }

    #[test]
    fn test_filter_is_case_insensitive_by_default() {
        let records = heroes();
        assert_eq!(ids(&apply_query(&records, Some("name=ma"), insensitive()).unwrap()), vec![14]);
        assert_eq!(ids(&apply_query(&records, Some("name=^n"), insensitive()).unwrap()), vec![12]);
        let sensitive = FilterOptions {
            case_sensitive: true,
            ..insensitive()
        };
        assert!(apply_query(&records, Some("name=ma"), sensitive).unwrap().is_empty());
    }

    #[test]
    fn test_conditions_are_anded() {
        let records = heroes();
        let matched = apply_query(&records, Some("power=20&name=o"), insensitive()).unwrap();
        assert_eq!(ids(&matched), vec![12]);
    }

    #[test]
    fn test_missing_field_never_matches() {
        let records = heroes();
        let matched = apply_query(&records, Some("power=.*"), insensitive()).unwrap();
        assert_eq!(ids(&matched), vec![11, 12, 14]);
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let records = heroes();
        let err = apply_query(&records, Some("name=("), insensitive()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid filter pattern '('"));
    }

    #[test]
    fn test_bare_pattern_uses_default_field() {
        let records = heroes();
        let by_name = FilterOptions {
            default_field: Some("name"),
            ..insensitive()
        };
        assert_eq!(ids(&apply_query(&records, Some("ma"), by_name).unwrap()), vec![14]);
        assert_eq!(
            ids(&apply_query(&records, Some("o&power=20"), by_name).unwrap()),
            vec![12]
        );

        // Without a default field a bare entry names a field no hero has
        assert!(apply_query(&records, Some("ma"), insensitive()).unwrap().is_empty());
    }

    #[test]
    fn test_paging_windows() {
        let items: Vec<u32> = (0..5).collect();
        let page = |skip, limit| {
            apply_paging(&items, &UrlParameters { skip, limit, filter: None }).to_vec()
        };
        assert_eq!(page(None, None), vec![0, 1, 2, 3, 4]);
        assert_eq!(page(Some(1), Some(2)), vec![1, 2]);
        assert_eq!(page(Some(4), Some(10)), vec![4]);
        assert_eq!(page(Some(9), Some(2)), Vec::<u32>::new());
        assert_eq!(page(Some(3), None), vec![3, 4]);
        assert_eq!(page(None, Some(0)), Vec::<u32>::new());
    }

    #[test]
    fn test_paging_length_matches_clamped_window() {
        let items: Vec<usize> = (0..7).collect();
        let n = items.len();
        for s in 0..10 {
            for l in 0..10 {
                let params = UrlParameters { skip: Some(s), limit: Some(l), filter: None };
                let page = apply_paging(&items, &params);
                let start = s.min(n);
                assert_eq!(page.len(), l.min(n - start));
                assert_eq!(page, &items[start..start + page.len()]);
            }
        }
    }
}
