//! Table access through the backend's PostgREST endpoint.
//!
//! [`Query`] renders filters into PostgREST query parameters
//! (`column=op.value`), [`RestClient`] is the seam the services talk to and
//! [`PostgrestClient`] is the HTTP implementation.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PostgrestError {
    #[error("request to {table} failed: {source}")]
    Http {
        table: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{table} returned {status}: {message}")]
    Status {
        table: String,
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("failed to decode {table} rows: {source}")]
    Decode {
        table: String,
        #[source]
        source: serde_json::Error,
    },
}

impl PostgrestError {
    /// Unique violation reported by Postgres.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Status { status, code, .. } => match code.as_deref() {
                Some(code) => code == "23505",
                None => *status == 409,
            },
            _ => false,
        }
    }

    /// Foreign-key violation: the row being written points at a missing one.
    #[must_use]
    pub fn is_missing_reference(&self) -> bool {
        matches!(self, Self::Status { code: Some(code), .. } if code == "23503")
    }

    fn decode(table: &str, source: serde_json::Error) -> Self {
        Self::Decode {
            table: table.to_string(),
            source,
        }
    }
}

/// Builder for a PostgREST read, update or delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: String,
    select: Option<String>,
    filters: Vec<(String, String)>,
    order: Vec<String>,
    limit: Option<usize>,
}

impl Query {
    #[must_use]
    pub fn from(table: &str) -> Self {
        Self {
            table: table.to_string(),
            select: None,
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Sets the column list. Whitespace is stripped so multi-line embed
    /// definitions can be written readably.
    #[must_use]
    pub fn select(mut self, columns: &str) -> Self {
        let compact: String = columns.chars().filter(|c| !c.is_whitespace()).collect();
        self.select = Some(compact);
        self
    }

    #[must_use]
    pub fn eq(self, column: &str, value: impl fmt::Display) -> Self {
        self.filter(column, "eq", &quote_value(&value.to_string()))
    }

    #[must_use]
    pub fn gte(self, column: &str, value: impl fmt::Display) -> Self {
        self.filter(column, "gte", &quote_value(&value.to_string()))
    }

    #[must_use]
    pub fn lte(self, column: &str, value: impl fmt::Display) -> Self {
        self.filter(column, "lte", &quote_value(&value.to_string()))
    }

    #[must_use]
    pub fn in_list<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: fmt::Display,
    {
        let list = values
            .into_iter()
            .map(|v| quote_value(&v.to_string()))
            .collect::<Vec<_>>()
            .join(",");
        self.filter(column, "in", &format!("({list})"))
    }

    /// Adds a top-level `or=(…)` group. `conditions` is a comma separated list
    /// in PostgREST logical syntax, e.g. `title.ilike.*x*,year.gt.2000`.
    #[must_use]
    pub fn or(mut self, conditions: &str) -> Self {
        self.filters
            .push(("or".to_string(), format!("({conditions})")));
        self
    }

    /// Unique columns an upsert merges on, e.g. `media_id,user_id`.
    #[must_use]
    pub fn on_conflict(mut self, columns: &str) -> Self {
        self.filters
            .push(("on_conflict".to_string(), columns.to_string()));
        self
    }

    #[must_use]
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.order.push(format!("{column}.{direction}"));
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn filter(mut self, column: &str, op: &str, value: &str) -> Self {
        self.filters
            .push((column.to_string(), format!("{op}.{value}")));
        self
    }

    /// Rendered query parameters in insertion order.
    #[must_use]
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.filters.len() + 3);
        if let Some(select) = &self.select {
            params.push(("select".to_string(), select.clone()));
        }
        params.extend(self.filters.iter().cloned());
        if !self.order.is_empty() {
            params.push(("order".to_string(), self.order.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.params()
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Whether the query carries a filter on `column`.
    #[must_use]
    pub fn has_filter(&self, column: &str) -> bool {
        self.filters.iter().any(|(c, _)| c == column)
    }

    /// The rendered `op.value` of the first filter on `column`.
    #[must_use]
    pub fn filter_value(&self, column: &str) -> Option<&str> {
        self.filters
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }
}

/// One `or(...)` condition: `column.ilike.<pattern>`.
#[must_use]
pub fn ilike_condition(column: &str, pattern: &str) -> String {
    format!("{column}.ilike.{}", quote_value(pattern))
}

/// Wraps values containing PostgREST reserved characters in double quotes.
#[must_use]
pub fn quote_value(value: &str) -> String {
    let reserved = |c: char| matches!(c, ',' | '(' | ')' | '"' | ':' | '\\') || c.is_whitespace();
    if value.chars().any(reserved) {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

/// Table operations used by the services.
#[async_trait]
pub trait RestClient: Send + Sync {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, PostgrestError>;

    /// Inserts `rows` (an object or an array) and returns the stored rows.
    async fn insert(&self, table: &str, rows: Value) -> Result<Vec<Value>, PostgrestError>;

    /// Insert-or-merge on the unique columns listed in `on_conflict`.
    async fn upsert(
        &self,
        table: &str,
        rows: Value,
        on_conflict: &str,
    ) -> Result<Vec<Value>, PostgrestError>;

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>, PostgrestError>;

    async fn delete(&self, query: &Query) -> Result<(), PostgrestError>;
}

/// Runs `query` and decodes every row into `T`.
pub async fn fetch<T: DeserializeOwned>(
    rest: &dyn RestClient,
    query: &Query,
) -> Result<Vec<T>, PostgrestError> {
    let rows = rest.select(query).await?;
    decode_rows(query.table(), rows)
}

/// Runs `query` and decodes the first row, if any.
pub async fn fetch_optional<T: DeserializeOwned>(
    rest: &dyn RestClient,
    query: &Query,
) -> Result<Option<T>, PostgrestError> {
    let rows = rest.select(query).await?;
    rows.into_iter()
        .next()
        .map(|row| serde_json::from_value(row).map_err(|e| PostgrestError::decode(query.table(), e)))
        .transpose()
}

pub fn decode_rows<T: DeserializeOwned>(
    table: &str,
    rows: Vec<Value>,
) -> Result<Vec<T>, PostgrestError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(|e| PostgrestError::decode(table, e)))
        .collect()
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PostgrestClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestClient {
    #[must_use]
    pub fn with_shared_client(client: Client, project_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        }
    }

    fn request(&self, method: reqwest::Method, query: &Query) -> RequestBuilder {
        let mut url = format!("{}/{}", self.base_url, query.table());
        let qs = query.to_query_string();
        if !qs.is_empty() {
            url.push('?');
            url.push_str(&qs);
        }
        debug!(table = query.table(), %method, "PostgREST request");

        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(
        &self,
        table: &str,
        operation: &'static str,
        builder: RequestBuilder,
    ) -> Result<Response, PostgrestError> {
        let result = builder.send().await;

        let outcome = match &result {
            Ok(r) if r.status().is_success() => "success",
            _ => "error",
        };
        metrics::counter!(
            "backend_requests_total",
            "service" => "postgrest",
            "table" => table.to_string(),
            "operation" => operation,
            "outcome" => outcome
        )
        .increment(1);

        let response = result.map_err(|source| PostgrestError::Http {
            table: table.to_string(),
            source,
        })?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let (message, code) = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => {
                let message = match (body.message, body.details) {
                    (Some(m), Some(d)) => format!("{m} ({d})"),
                    (Some(m), None) => m,
                    (None, _) => text.clone(),
                };
                (message, body.code)
            }
            Err(_) => (text, None),
        };

        Err(PostgrestError::Status {
            table: table.to_string(),
            status,
            code,
            message,
        })
    }

    async fn rows(table: &str, response: Response) -> Result<Vec<Value>, PostgrestError> {
        let text = response.text().await.map_err(|source| PostgrestError::Http {
            table: table.to_string(),
            source,
        })?;

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Value>(&text).map_err(|e| PostgrestError::decode(table, e))? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            single => Ok(vec![single]),
        }
    }
}

#[async_trait]
impl RestClient for PostgrestClient {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, PostgrestError> {
        let builder = self.request(reqwest::Method::GET, query);
        let response = self.send(query.table(), "select", builder).await?;
        Self::rows(query.table(), response).await
    }

    async fn insert(&self, table: &str, rows: Value) -> Result<Vec<Value>, PostgrestError> {
        let builder = self
            .request(reqwest::Method::POST, &Query::from(table))
            .header("Prefer", "return=representation")
            .json(&rows);
        let response = self.send(table, "insert", builder).await?;
        Self::rows(table, response).await
    }

    async fn upsert(
        &self,
        table: &str,
        rows: Value,
        on_conflict: &str,
    ) -> Result<Vec<Value>, PostgrestError> {
        let builder = self
            .request(
                reqwest::Method::POST,
                &Query::from(table).on_conflict(on_conflict),
            )
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&rows);
        let response = self.send(table, "upsert", builder).await?;
        Self::rows(table, response).await
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>, PostgrestError> {
        let builder = self
            .request(reqwest::Method::PATCH, query)
            .header("Prefer", "return=representation")
            .json(&patch);
        let response = self.send(query.table(), "update", builder).await?;
        Self::rows(query.table(), response).await
    }

    async fn delete(&self, query: &Query) -> Result<(), PostgrestError> {
        let builder = self.request(reqwest::Method::DELETE, query);
        self.send(query.table(), "delete", builder).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_filters_in_order() {
        let query = Query::from("media_items")
            .select("id,\n  title")
            .eq("type", "movie")
            .gte("year", 1990)
            .lte("year", 2000)
            .order("year", false)
            .limit(10);

        assert_eq!(
            query.params(),
            vec![
                ("select".to_string(), "id,title".to_string()),
                ("type".to_string(), "eq.movie".to_string()),
                ("year".to_string(), "gte.1990".to_string()),
                ("year".to_string(), "lte.2000".to_string()),
                ("order".to_string(), "year.desc".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn in_list_quotes_reserved_values() {
        let query = Query::from("profiles").in_list("id", ["a", "b,c"]);
        assert_eq!(query.filter_value("id"), Some("in.(a,\"b,c\")"));
    }

    #[test]
    fn query_string_is_url_encoded() {
        let query = Query::from("media_items").or("title.ilike.*a b*");
        assert_eq!(query.to_query_string(), "or=%28title.ilike.%2Aa%20b%2A%29");
    }

    #[test]
    fn on_conflict_renders_as_query_parameter() {
        let query = Query::from("ratings").on_conflict("media_id,user_id");
        assert_eq!(query.to_query_string(), "on_conflict=media_id%2Cuser_id");
    }

    #[test]
    fn quote_value_escapes_quotes() {
        assert_eq!(quote_value("plain"), "plain");
        assert_eq!(quote_value("*war, peace*"), "\"*war, peace*\"");
        assert_eq!(quote_value("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn conflict_detection_uses_status_and_code() {
        let err = PostgrestError::Status {
            table: "ratings".to_string(),
            status: 409,
            code: None,
            message: "duplicate".to_string(),
        };
        assert!(err.is_conflict());

        let err = PostgrestError::Status {
            table: "ratings".to_string(),
            status: 400,
            code: Some("23505".to_string()),
            message: "duplicate key".to_string(),
        };
        assert!(err.is_conflict());

        let err = PostgrestError::Status {
            table: "ratings".to_string(),
            status: 400,
            code: Some("22P02".to_string()),
            message: "bad uuid".to_string(),
        };
        assert!(!err.is_conflict());
    }

    #[test]
    fn foreign_key_violation_is_not_a_conflict() {
        let err = PostgrestError::Status {
            table: "ratings".to_string(),
            status: 409,
            code: Some("23503".to_string()),
            message: "violates foreign key constraint".to_string(),
        };
        assert!(!err.is_conflict());
        assert!(err.is_missing_reference());
    }
}
