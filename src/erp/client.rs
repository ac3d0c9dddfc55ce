//! JSON-RPC client
//!
//! One `ErpClient` is shared by all requests (it only pools HTTP
//! connections). Everything that identifies a user lives in a [`Session`]
//! built from the request body and handed to [`ErpClient::connect`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use super::records::decode_records;
use super::ErpError;

/// Authenticated ERP session for a single request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub url: String,
    pub db: String,
    pub uid: i64,
    pub password: String,
}

/// Options for `search_read`
#[derive(Debug, Clone, Default)]
pub struct SearchOptions<'a> {
    pub fields: &'a [&'a str],
    pub limit: Option<usize>,
    pub order: Option<&'a str>,
}

impl<'a> SearchOptions<'a> {
    pub fn fields(fields: &'a [&'a str]) -> Self {
        Self {
            fields,
            ..Default::default()
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order(mut self, order: &'a str) -> Self {
        self.order = Some(order);
        self
    }

    fn to_kwargs(&self) -> Value {
        let mut kwargs = Map::new();
        kwargs.insert("fields".to_string(), json!(self.fields));
        if let Some(limit) = self.limit {
            kwargs.insert("limit".to_string(), json!(limit));
        }
        if let Some(order) = self.order {
            kwargs.insert("order".to_string(), json!(order));
        }
        Value::Object(kwargs)
    }
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    message: String,
    #[serde(default)]
    data: Option<RpcErrorData>,
}

#[derive(Deserialize)]
struct RpcErrorData {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl From<RpcError> for ErpError {
    fn from(e: RpcError) -> Self {
        let (name, detail) = match e.data {
            Some(data) => (data.name, data.message),
            None => (None, None),
        };
        ErpError::Remote {
            name,
            message: detail.unwrap_or(e.message),
        }
    }
}

/// HTTP client for the ERP JSON-RPC endpoint
#[derive(Clone)]
pub struct ErpClient {
    http: reqwest::Client,
    next_id: Arc<AtomicU64>,
}

impl ErpClient {
    pub fn new(timeout: Duration) -> Result<Self, ErpError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ErpError::Network(e.to_string()))?;

        Ok(Self {
            http,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Raw service call: `{url}/jsonrpc` with `service.method(*args)`
    pub async fn call(
        &self,
        url: &str,
        service: &str,
        method: &str,
        args: Value,
    ) -> Result<Value, ErpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "method": "call",
            "params": {
                "service": service,
                "method": method,
                "args": args,
            },
            "id": id,
        });

        debug!(service, method, id, "ERP call");

        let response = self
            .http
            .post(format!("{}/jsonrpc", url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ErpError::Http(response.status().as_u16()));
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| ErpError::InvalidResponse(e.to_string()))?;

        match envelope.error {
            Some(error) => Err(error.into()),
            None => Ok(envelope.result),
        }
    }

    /// Server version info. Also serves as a reachability probe.
    pub async fn version(&self, url: &str) -> Result<Value, ErpError> {
        self.call(url, "common", "version", json!([])).await
    }

    /// Returns the user id, or `None` when the server rejects the credentials.
    pub async fn authenticate(
        &self,
        url: &str,
        db: &str,
        login: &str,
        password: &str,
    ) -> Result<Option<i64>, ErpError> {
        let result = self
            .call(
                url,
                "common",
                "authenticate",
                json!([db, login, password, {}]),
            )
            .await?;

        match result {
            Value::Bool(false) | Value::Null => Ok(None),
            Value::Number(n) => n
                .as_i64()
                .filter(|uid| *uid > 0)
                .map(Some)
                .ok_or_else(|| ErpError::InvalidResponse(format!("bad uid {}", n))),
            other => Err(ErpError::InvalidResponse(format!(
                "unexpected authenticate result: {}",
                other
            ))),
        }
    }

    pub fn connect<'a>(&'a self, session: &'a Session) -> ErpConnection<'a> {
        ErpConnection {
            client: self,
            session,
        }
    }
}

/// Object-service calls bound to one session
pub struct ErpConnection<'a> {
    client: &'a ErpClient,
    session: &'a Session,
}

impl ErpConnection<'_> {
    pub async fn execute_kw(
        &self,
        model: &str,
        method: &str,
        args: Value,
        kwargs: Value,
    ) -> Result<Value, ErpError> {
        let s = self.session;
        self.client
            .call(
                &s.url,
                "object",
                "execute_kw",
                json!([s.db, s.uid, s.password, model, method, args, kwargs]),
            )
            .await
    }

    pub async fn search_read(
        &self,
        model: &str,
        domain: Value,
        options: &SearchOptions<'_>,
    ) -> Result<Value, ErpError> {
        self.execute_kw(model, "search_read", json!([domain]), options.to_kwargs())
            .await
    }

    /// `search_read` decoded into typed records
    pub async fn search_read_as<T: DeserializeOwned>(
        &self,
        model: &str,
        domain: Value,
        options: &SearchOptions<'_>,
    ) -> Result<Vec<T>, ErpError> {
        let value = self.search_read(model, domain, options).await?;
        decode_records(model, value)
    }

    pub async fn read_as<T: DeserializeOwned>(
        &self,
        model: &str,
        ids: &[i64],
        fields: &[&str],
    ) -> Result<Vec<T>, ErpError> {
        let value = self
            .execute_kw(model, "read", json!([ids]), json!({ "fields": fields }))
            .await?;
        decode_records(model, value)
    }

    /// Create one record and return its id
    pub async fn create(&self, model: &str, values: Value) -> Result<i64, ErpError> {
        self.create_with_context(model, values, None).await
    }

    pub async fn create_with_context(
        &self,
        model: &str,
        values: Value,
        context: Option<Value>,
    ) -> Result<i64, ErpError> {
        let kwargs = match context {
            Some(ctx) => json!({ "context": ctx }),
            None => json!({}),
        };
        let result = self.execute_kw(model, "create", json!([values]), kwargs).await?;

        record_id(&result).ok_or_else(|| {
            ErpError::InvalidResponse(format!("create on {} returned {}", model, result))
        })
    }

    pub async fn write(&self, model: &str, ids: &[i64], values: Value) -> Result<bool, ErpError> {
        let result = self
            .execute_kw(model, "write", json!([ids, values]), json!({}))
            .await?;
        Ok(result.as_bool().unwrap_or(false))
    }

    /// Call a public model method on the given records
    pub async fn call_method(
        &self,
        model: &str,
        method: &str,
        ids: &[i64],
        context: Option<Value>,
    ) -> Result<Value, ErpError> {
        let kwargs = match context {
            Some(ctx) => json!({ "context": ctx }),
            None => json!({}),
        };
        self.execute_kw(model, method, json!([ids]), kwargs).await
    }
}

/// `create` returns an id, or a one-element list on some server versions
fn record_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::Array(items) => items.first().and_then(Value::as_i64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_options_kwargs() {
        let kwargs = SearchOptions::fields(&["id", "name"])
            .limit(10)
            .order("date_order desc")
            .to_kwargs();

        assert_eq!(
            kwargs,
            json!({"fields": ["id", "name"], "limit": 10, "order": "date_order desc"})
        );
        assert_eq!(
            SearchOptions::fields(&["id"]).to_kwargs(),
            json!({"fields": ["id"]})
        );
    }

    #[test]
    fn test_remote_error_prefers_detail() {
        let error: RpcError = serde_json::from_value(json!({
            "code": 200,
            "message": "Odoo Server Error",
            "data": {"name": "odoo.exceptions.AccessDenied", "message": "Access Denied"}
        }))
        .unwrap();

        match ErpError::from(error) {
            ErpError::Remote { name, message } => {
                assert_eq!(name.as_deref(), Some("odoo.exceptions.AccessDenied"));
                assert_eq!(message, "Access Denied");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_record_id_shapes() {
        assert_eq!(record_id(&json!(42)), Some(42));
        assert_eq!(record_id(&json!([43])), Some(43));
        assert_eq!(record_id(&json!(false)), None);
    }
}
