use percent_encoding::percent_decode_str;
use tracing::debug;

use crate::config::BackendConfig;
use crate::request::QueryParams;

/// Paging and filter settings extracted from one request's query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParameters {
    /// Records to omit from the front; never negative.
    pub skip: Option<usize>,
    /// Maximum number of records to return.
    pub limit: Option<usize>,
    /// Raw `field=pattern` list, already percent-decoded once more.
    pub filter: Option<String>,
}

impl UrlParameters {
    /// True if paging was requested.
    pub fn has_paging(&self) -> bool {
        self.skip.is_some() || self.limit.is_some()
    }
}

/// Reads [`UrlParameters`] using the parameter names configured for the backend.
///
/// A parameter whose name is not configured is never read.
#[derive(Debug, Clone, Copy)]
pub struct UrlParametersParser<'a> {
    skip_name: Option<&'a str>,
    limit_name: Option<&'a str>,
    filter_name: Option<&'a str>,
}

impl<'a> UrlParametersParser<'a> {
    pub fn new(config: &'a BackendConfig) -> Self {
        Self {
            skip_name: config.skip.as_deref(),
            limit_name: config.limit.as_deref(),
            filter_name: config.filter.as_deref(),
        }
    }

    pub fn parse(&self, query: &QueryParams) -> UrlParameters {
        let lookup = |name: Option<&str>| name.and_then(|n| query.get(n));
        UrlParameters {
            skip: lookup(self.skip_name).and_then(|raw| parse_count("skip", raw)),
            limit: lookup(self.limit_name).and_then(|raw| parse_count("limit", raw)),
            filter: lookup(self.filter_name)
                .map(|raw| percent_decode_str(raw).decode_utf8_lossy().into_owned()),
        }
    }
}

// Negative counts clamp to zero, non-numeric values are ignored
fn parse_count(what: &str, raw: &str) -> Option<usize> {
    match raw.trim().parse::<i64>() {
        Ok(n) => Some(usize::try_from(n).unwrap_or(0)),
        Err(_) => {
            debug!("ignoring non-numeric {} value '{}'", what, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paging_config() -> BackendConfig {
        BackendConfig {
            skip: Some("offset".to_string()),
            limit: Some("pageSize".to_string()),
            filter: Some("q".to_string()),
            ..BackendConfig::default()
        }
    }

    #[test]
    fn test_parse_configured_names() {
        let config = paging_config();
        let params = UrlParametersParser::new(&config)
            .parse(&QueryParams::parse("offset=2&pageSize=5&q=name%3DMa"));
        assert_eq!(
            params,
            UrlParameters {
                skip: Some(2),
                limit: Some(5),
                filter: Some("name=Ma".to_string()),
            }
        );
        assert!(params.has_paging());
    }

    #[test]
    fn test_unconfigured_names_are_ignored() {
        let config = BackendConfig::default();
        let params = UrlParametersParser::new(&config)
            .parse(&QueryParams::parse("skip=2&limit=5&filter=name%3DMa"));
        assert_eq!(params, UrlParameters::default());
        assert!(!params.has_paging());
    }

    #[test]
    fn test_skip_and_limit_are_independent() {
        let config = paging_config();
        let params = UrlParametersParser::new(&config).parse(&QueryParams::parse("pageSize=3"));
        assert_eq!(params.skip, None);
        assert_eq!(params.limit, Some(3));
    }

    #[test]
    fn test_negative_and_invalid_counts() {
        let config = paging_config();
        let params =
            UrlParametersParser::new(&config).parse(&QueryParams::parse("offset=-4&pageSize=ten"));
        assert_eq!(params.skip, Some(0));
        assert_eq!(params.limit, None);
    }

    #[test]
    fn test_filter_is_decoded_twice() {
        let config = paging_config();
        let params =
            UrlParametersParser::new(&config).parse(&QueryParams::parse("q=name%253DMa%2526id%253D1"));
        assert_eq!(params.filter.as_deref(), Some("name=Ma&id=1"));
    }
}
