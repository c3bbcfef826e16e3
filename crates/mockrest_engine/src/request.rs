/* 📖 # How is a request URL turned into addressing information?

The URL is resolved against `http://{host}{rootPath}`, so relative URLs such as
`api/heroes/12` land on the configured host. For a same-host URL the root path is stripped;
a URL on another host is treated as fully qualified and keeps its origin as a prefix of the
resource URL. What remains is split into `base/collection/id`:

```text
http://localhost/api/heroes.json/12?name=Ma
                 └┬┘ └──┬─┘└─┬─┘ └┬┘ └──┬──┘
                base  collection  id   query
                      (suffix dropped)
```
*/

use percent_encoding::percent_decode_str;
use url::Url;
use url::form_urlencoded;

use mockrest_base::{ErrorKind, MockApiError, MockApiResult};

use crate::config::BackendConfig;

/// Decoded query string parameters, in order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Parse an `application/x-www-form-urlencoded` query string.
    pub fn parse(query: &str) -> Self {
        Self {
            pairs: form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        }
    }

    /// First value for a parameter name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Addressing information derived from one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    /// Leading path segment, e.g. `api` or `commands`
    pub base: String,
    /// Collection name without any format suffix
    pub collection_name: String,
    /// Raw id segment, if present
    pub id: Option<String>,
    /// Canonical collection URL ending in `/`
    pub resource_url: String,
    /// Query parameters, present only for a non-empty query string
    pub query: Option<QueryParams>,
    /// User id taken from a bearer token, when token auth is enabled
    pub uid: Option<i64>,
}

impl RequestInfo {
    /// URL of a single record, used for `Location` headers.
    pub fn record_url(&self, id: &impl std::fmt::Display) -> String {
        format!("{}/{}", self.resource_url.trim_end_matches('/'), id)
    }
}

/// Resolve a request URL into addressing information.
pub fn parse_url(url: &str, config: &BackendConfig) -> MockApiResult<RequestInfo> {
    let root_path = if config.root_path.starts_with('/') {
        config.root_path.clone()
    } else {
        format!("/{}", config.root_path)
    };
    let origin = Url::parse(&format!("http://{}{}", config.host, root_path))
        .map_err(|e| url_error(url, e.to_string()))?;
    let location = origin.join(url).map_err(|e| url_error(url, e.to_string()))?;

    let location_host = match (location.host_str(), location.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => return Err(url_error(url, "url has no host")),
    };

    let full_path = location.path();
    let (path, url_root) = if location_host == config.host {
        let relative = full_path
            .strip_prefix(root_path.as_str())
            .unwrap_or_else(|| full_path.trim_start_matches('/'));
        (relative, String::new())
    } else {
        let relative = full_path.strip_prefix('/').unwrap_or(full_path);
        (relative, format!("{}://{}/", location.scheme(), location_host))
    };

    let mut segments = path.split('/');
    let base = segments.next().unwrap_or_default().to_string();
    let collection_segment = segments.next().unwrap_or_default();
    let collection_name = collection_segment
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string();
    if collection_name.is_empty() {
        return Err(url_error(url, "missing collection name"));
    }
    let id = segments
        .next()
        .filter(|segment| !segment.is_empty())
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned());

    let resource_url = format!("{}{}/{}/", url_root, base, collection_name);
    let query = location
        .query()
        .filter(|q| !q.is_empty())
        .map(QueryParams::parse);

    Ok(RequestInfo {
        base,
        collection_name,
        id,
        resource_url,
        query,
        uid: None,
    })
}

fn url_error(url: &str, message: impl Into<String>) -> Box<MockApiError> {
    Box::new(MockApiError::new(ErrorKind::UrlParse {
        url: url.to_string(),
        message: message.into(),
    }))
}
