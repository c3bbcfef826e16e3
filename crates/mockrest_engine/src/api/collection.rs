use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use mockrest_base::{
    ErrorKind, HttpMethod, HttpRequest, HttpResponse, HttpStatusCode, MockApiError, MockApiResult,
};

use crate::config::BackendConfig;
use crate::params::{UrlParameters, UrlParametersParser};
use crate::query::{FilterOptions, apply_paging, apply_query};
use crate::record::{Record, RecordId};
use crate::request::RequestInfo;
use crate::response::{data_response, error_response};
use crate::store::{Collection, StoreHandle, Upsert};

/// Body of a bulk update: `{ids: [...], props: {...}}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BulkUpdate {
    ids: Option<Vec<Value>>,
    props: Option<Map<String, Value>>,
}

/// Generic CRUD for one named collection.
pub(crate) struct CollectionHandler<'a> {
    store: &'a StoreHandle,
    config: &'a BackendConfig,
    info: &'a RequestInfo,
}

impl<'a> CollectionHandler<'a> {
    pub(crate) fn new(
        store: &'a StoreHandle,
        config: &'a BackendConfig,
        info: &'a RequestInfo,
    ) -> Self {
        Self {
            store,
            config,
            info,
        }
    }

    pub(crate) fn handle(&self, request: &HttpRequest) -> MockApiResult<HttpResponse> {
        debug!(
            method = %request.method(),
            collection = %self.info.collection_name,
            id = ?self.info.id,
            "handling collection request"
        );
        match request.method() {
            HttpMethod::Get => self.get(),
            HttpMethod::Post => self.post(request),
            HttpMethod::Put => self.bulk_update(request),
            HttpMethod::Delete => self.delete(),
            _ => Ok(error_response(
                HttpStatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed",
            )),
        }
    }

    fn name(&self) -> &str {
        &self.info.collection_name
    }

    fn get(&self) -> MockApiResult<HttpResponse> {
        let db = self.store.read();
        let Some(collection) = db.get(self.name()) else {
            return Ok(self.collection_not_found());
        };

        if let Some(raw_id) = &self.info.id {
            let id = collection.parse_id(raw_id);
            return Ok(match collection.find(&id) {
                Some(record) => data_response(HttpStatusCode::OK, record.clone().into_value()),
                None => self.record_not_found(raw_id),
            });
        }

        let params = match &self.info.query {
            Some(query) => UrlParametersParser::new(self.config).parse(query),
            None => UrlParameters::default(),
        };
        let options = FilterOptions {
            case_sensitive: self.config.case_sensitive_search,
            default_field: self.config.filter_field.as_deref(),
        };
        let matched = apply_query(collection.records(), params.filter.as_deref(), options)?;
        let page = apply_paging(&matched, &params);
        let data = page
            .iter()
            .map(|record| (*record).clone().into_value())
            .collect();
        Ok(data_response(HttpStatusCode::OK, Value::Array(data)))
    }

    fn post(&self, request: &HttpRequest) -> MockApiResult<HttpResponse> {
        let body = request
            .body()
            .as_json()
            .map_err(|e| malformed(e.to_string()))?
            .ok_or_else(|| malformed("request body is empty".to_string()))?;
        let mut record = Record::from_value(body)?;

        let mut db = self.store.write();
        let Some(collection) = db.get_mut(self.name()) else {
            return Ok(self.collection_not_found());
        };

        if !record.has_assigned_id() {
            let id = self.assign_id(collection)?;
            debug!(collection = %self.name(), id = %id, "assigned id to new record");
            record.set_id(&id);
        }
        let id = record
            .id()
            .ok_or_else(|| malformed("id must be a number or a string".to_string()))?;

        match collection.upsert(record.clone())? {
            Upsert::Replaced => Ok(HttpResponse::no_content()),
            Upsert::Inserted => Ok(data_response(HttpStatusCode::CREATED, record.into_value())
                .with_header("Location", self.info.record_url(&id))),
        }
    }

    // The URL id is only a fallback for a body without one
    fn assign_id(&self, collection: &Collection) -> MockApiResult<RecordId> {
        match &self.info.id {
            Some(raw_id) => Ok(collection.parse_id(raw_id)),
            None => collection.next_id().map(RecordId::from),
        }
    }

    fn bulk_update(&self, request: &HttpRequest) -> MockApiResult<HttpResponse> {
        let body = request
            .body()
            .as_json()
            .map_err(|e| malformed(e.to_string()))?
            .unwrap_or_else(|| json!({}));
        let update: BulkUpdate =
            serde_json::from_value(body).map_err(|e| malformed(e.to_string()))?;

        let mut db = self.store.write();
        let collection = db.get_mut(self.name());
        let (Some(collection), Some(ids), Some(props)) = (collection, update.ids, update.props)
        else {
            debug!(collection = %self.name(), "bulk update without ids or props");
            return Ok(data_response(HttpStatusCode::OK, json!({})));
        };

        let updated = collection.update_props(&ids, &props);
        let data = updated.into_iter().map(Record::into_value).collect();
        Ok(data_response(HttpStatusCode::OK, Value::Array(data)))
    }

    fn delete(&self) -> MockApiResult<HttpResponse> {
        let Some(raw_id) = &self.info.id else {
            return Ok(error_response(
                HttpStatusCode::NOT_FOUND,
                format!("Missing \"{}\" id", self.name()),
            ));
        };

        let mut db = self.store.write();
        let Some(collection) = db.get_mut(self.name()) else {
            return Ok(self.collection_not_found());
        };
        let id = collection.parse_id(raw_id);
        let removed = collection.remove(&id);
        if removed || !self.config.delete_404 {
            Ok(HttpResponse::no_content())
        } else {
            Ok(self.record_not_found(raw_id))
        }
    }

    fn record_not_found(&self, raw_id: &str) -> HttpResponse {
        error_response(
            HttpStatusCode::NOT_FOUND,
            format!("'{}' with id='{}' not found", self.name(), raw_id),
        )
    }

    fn collection_not_found(&self) -> HttpResponse {
        collection_not_found(self.name())
    }
}

/// The 404 answered for a collection the store does not hold.
pub(crate) fn collection_not_found(name: &str) -> HttpResponse {
    error_response(
        HttpStatusCode::NOT_FOUND,
        format!("Collection '{}' not found", name),
    )
}

fn malformed(message: String) -> Box<MockApiError> {
    Box::new(MockApiError::new(ErrorKind::MalformedBody { message }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::parse_url;
    use crate::store::Database;
    use mockrest_base::HttpBody;

    fn store() -> StoreHandle {
        StoreHandle::new(
            Database::from_json(json!({
                "heroes": [
                    {"id": 11, "name": "Mr. Nice"},
                    {"id": 12, "name": "Narco"}
                ],
                "keys": [
                    {"id": "a", "value": 1}
                ]
            }))
            .unwrap(),
        )
    }

    fn run(store: &StoreHandle, config: &BackendConfig, request: HttpRequest) -> HttpResponse {
        let info = parse_url(request.url(), config).unwrap();
        CollectionHandler::new(store, config, &info)
            .handle(&request)
            .unwrap()
    }

    fn body_json(response: &HttpResponse) -> Value {
        match response.body() {
            HttpBody::Json(value) => value.clone(),
            other => panic!("expected a JSON body, got {:?}", other),
        }
    }

    #[test]
    fn test_get_by_id() {
        let store = store();
        let config = BackendConfig::default();
        let found = run(&store, &config, HttpRequest::new(HttpMethod::Get, "api/heroes/12"));
        assert_eq!(body_json(&found), json!({"data": {"id": 12, "name": "Narco"}}));

        let missing = run(&store, &config, HttpRequest::new(HttpMethod::Get, "api/heroes/99"));
        assert_eq!(missing.status(), HttpStatusCode::NOT_FOUND);
        assert_eq!(
            body_json(&missing),
            json!({"error": "'heroes' with id='99' not found"})
        );

        let keyed = run(&store, &config, HttpRequest::new(HttpMethod::Get, "api/keys/a"));
        assert_eq!(body_json(&keyed), json!({"data": {"id": "a", "value": 1}}));
    }

    #[test]
    fn test_post_uses_url_id_when_body_has_none() {
        let store = store();
        let config = BackendConfig::default();
        let response = run(
            &store,
            &config,
            HttpRequest::new(HttpMethod::Post, "api/heroes/40").with_body(r#"{"name": "Dynama"}"#),
        );
        assert_eq!(response.status(), HttpStatusCode::CREATED);
        assert_eq!(body_json(&response), json!({"data": {"name": "Dynama", "id": 40}}));
        assert_eq!(
            response.headers().get("Location").map(String::as_str),
            Some("api/heroes/40")
        );
    }

    #[test]
    fn test_post_body_id_wins_over_url_id() {
        let store = store();
        let config = BackendConfig::default();
        let response = run(
            &store,
            &config,
            HttpRequest::new(HttpMethod::Post, "api/heroes/40")
                .with_body(r#"{"id": 11, "name": "Mr. Nicer"}"#),
        );
        assert_eq!(response.status(), HttpStatusCode::NO_CONTENT);
        assert_eq!(response.body(), &HttpBody::Empty);
        let db = store.read();
        let heroes = db.get("heroes").unwrap();
        assert_eq!(heroes.len(), 2);
        assert_eq!(heroes.records()[0].get("name"), Some(&json!("Mr. Nicer")));
    }

    #[test]
    fn test_post_rejects_non_object_bodies() {
        let store = store();
        let config = BackendConfig::default();
        for body in ["", "[1, 2]", "{oops"] {
            let request = HttpRequest::new(HttpMethod::Post, "api/heroes").with_body(body);
            let info = parse_url(request.url(), &config).unwrap();
            let result = CollectionHandler::new(&store, &config, &info).handle(&request);
            assert!(result.is_err(), "body {:?} should be rejected", body);
        }
    }

    #[test]
    fn test_bulk_update_without_ids_is_a_no_op() {
        let store = store();
        let config = BackendConfig::default();
        let response = run(
            &store,
            &config,
            HttpRequest::new(HttpMethod::Put, "api/heroes").with_body(r#"{"props": {"x": 1}}"#),
        );
        assert_eq!(response.status(), HttpStatusCode::OK);
        assert_eq!(body_json(&response), json!({"data": {}}));
        assert_eq!(store.read().get("heroes").unwrap().records()[0].get("x"), None);
    }

    #[test]
    fn test_delete_without_id() {
        let store = store();
        let config = BackendConfig::default();
        let response = run(&store, &config, HttpRequest::new(HttpMethod::Delete, "api/heroes"));
        assert_eq!(response.status(), HttpStatusCode::NOT_FOUND);
        assert_eq!(body_json(&response), json!({"error": "Missing \"heroes\" id"}));
    }

    #[test]
    fn test_unsupported_method() {
        let store = store();
        let config = BackendConfig::default();
        let response = run(&store, &config, HttpRequest::new(HttpMethod::Patch, "api/heroes/11"));
        assert_eq!(response.status(), HttpStatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_json(&response), json!({"error": "Method not allowed"}));
    }
}
