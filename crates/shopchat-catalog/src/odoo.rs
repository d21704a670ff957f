use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shopchat_common::{Error, Result};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::product::{Catalog, PRODUCT_FIELDS, ProductRecord};
use crate::source::CatalogSource;
use crate::xmlrpc::{self, Value};

const COMMON_ENDPOINT: &str = "xmlrpc/2/common";
const OBJECT_ENDPOINT: &str = "xmlrpc/2/object";

/// Odoo eCommerce catalog reached over XML-RPC with an API key.
pub struct OdooCatalog {
    client: Client,
    base_url: String,
    database: String,
    username: String,
    api_key: String,
    model: String,
    timeout: Option<Duration>,
    uid: RwLock<Option<i64>>,
}

impl OdooCatalog {
    pub fn new(base_url: String, database: String, username: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            database,
            username,
            api_key,
            model: "product.template".to_string(),
            timeout: None,
            uid: RwLock::new(None),
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Authenticate and cache the user id for later calls.
    pub async fn connect(&self) -> Result<i64> {
        let endpoint = format!("{}/{COMMON_ENDPOINT}", self.base_url);
        info!("connecting to Odoo at {endpoint}");

        let params = [
            Value::from(self.database.as_str()),
            Value::from(self.username.as_str()),
            Value::from(self.api_key.as_str()),
            Value::struct_of(Vec::<(String, Value)>::new()),
        ];
        let result = self.call(COMMON_ENDPOINT, "authenticate", &params).await?;

        // Odoo answers `false` when the credentials are rejected.
        let uid = result.as_i64().filter(|uid| *uid > 0).ok_or_else(|| {
            Error::AuthFailure(format!(
                "Odoo rejected user {} on database {}",
                self.username, self.database
            ))
        })?;

        *self.uid.write().await = Some(uid);
        info!("authenticated with Odoo as uid {uid}");
        Ok(uid)
    }

    async fn uid(&self) -> Result<i64> {
        if let Some(uid) = *self.uid.read().await {
            return Ok(uid);
        }
        self.connect().await
    }

    async fn execute_kw(
        &self,
        method: &str,
        args: Vec<Value>,
        kwargs: Option<Value>,
    ) -> Result<Value> {
        let uid = self.uid().await?;
        let mut params = vec![
            Value::from(self.database.as_str()),
            Value::Int(uid),
            Value::from(self.api_key.as_str()),
            Value::from(self.model.as_str()),
            Value::from(method),
            Value::Array(args),
        ];
        if let Some(kwargs) = kwargs {
            params.push(kwargs);
        }

        let result = self.call(OBJECT_ENDPOINT, "execute_kw", &params).await;
        if let Err(Error::AuthFailure(_)) = &result {
            // Key revoked since login; force a fresh authenticate next time.
            *self.uid.write().await = None;
        }
        result
    }

    async fn call(&self, endpoint: &str, method: &str, params: &[Value]) -> Result<Value> {
        let url = format!("{}/{endpoint}", self.base_url);
        debug!("odoo call {method} on {url}");

        let mut request = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(xmlrpc::encode_call(method, params));
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::from_request("Odoo request failed", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::from_request("failed to read Odoo response", e))?;

        if !status.is_success() {
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        xmlrpc::parse_response(&body)?.into_result()
    }
}

#[async_trait]
impl CatalogSource for OdooCatalog {
    fn source_id(&self) -> &str {
        "odoo"
    }

    async fn fetch_available_products(&self) -> Result<Catalog> {
        let domain = Value::Array(vec![Value::Array(vec![
            Value::from("website_published"),
            Value::from("="),
            Value::Bool(true),
        ])]);
        let ids = self.execute_kw("search", vec![domain], None).await?;

        let ids = match ids {
            Value::Array(ids) => ids,
            other => {
                return Err(Error::MalformedPayload(format!(
                    "Odoo search returned {other:?} instead of an id list"
                )));
            }
        };
        if ids.is_empty() {
            info!("Odoo has no published products");
            return Ok(Catalog::Empty);
        }

        let fields = Value::Array(PRODUCT_FIELDS.iter().map(|f| Value::from(*f)).collect());
        let kwargs = Value::struct_of([("fields", fields)]);
        let rows = self
            .execute_kw("read", vec![Value::Array(ids)], Some(kwargs))
            .await?;

        let records: Vec<ProductRecord> = rows
            .as_array()
            .ok_or_else(|| {
                Error::MalformedPayload("Odoo read did not return a list of records".into())
            })?
            .iter()
            .map(ProductRecord::from_value)
            .collect();

        debug!("fetched {} products from Odoo", records.len());
        Ok(Catalog::from_records(records))
    }

    async fn health_check(&self) -> Result<bool> {
        match self.call(COMMON_ENDPOINT, "version", &[]).await {
            Ok(_) => Ok(true),
            Err(e) => {
                error!("Odoo health check failed: {e}");
                Ok(false)
            }
        }
    }
}
