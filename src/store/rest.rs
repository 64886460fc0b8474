use std::{
    sync::RwLock,
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{
    header::{
        HeaderMap,
        HeaderValue,
        AUTHORIZATION,
        USER_AGENT,
    },
    Client,
    RequestBuilder,
    Response,
};
use serde::{
    de::DeserializeOwned,
    Deserialize,
};
use serde_json::json;
use tracing::debug;

use super::{
    realtime::{
        RealtimeChannel,
        RealtimeConfig,
    },
    ChangeFeed,
    RemoteStore,
};
use crate::core::{
    errors::Result,
    models::{
        CardRow,
        SetRow,
    },
    Config,
    FlashdeckError,
    Session,
    SetPatch,
    Table,
    UserId,
};

const REST_PATH: &str = "rest/v1";
const SETS_WITH_CARDS: &str = "*,cards(*)";

/// Error body PostgREST sends with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// Client for a hosted PostgREST backend.
pub struct RestStore {
    client: Client,
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
    heartbeat_interval: Duration,
}

impl RestStore {
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config
            .backend_url
            .clone()
            .ok_or_else(|| FlashdeckError::Config("backend url is not set".to_string()))?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FlashdeckError::Custom(format!("HTTP client build failed: {e}")))?;

        let store = Self {
            client,
            base_url,
            anon_key: config.anon_key.clone(),
            access_token: RwLock::new(None),
            heartbeat_interval: config.heartbeat_interval,
        };
        store.authenticate(config.session.as_ref());
        Ok(store)
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/{}/{}", self.base_url, REST_PATH, table.name())
    }

    fn bearer(&self) -> String {
        let token = self.access_token.read().unwrap_or_else(|e| e.into_inner()).clone();
        token.unwrap_or_else(|| self.anon_key.clone())
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("flashdeck/0.1 (+reqwest)"));
        if let Ok(value) = HeaderValue::from_str(&self.anon_key) {
            headers.insert("apikey", value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.bearer())) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    fn request(&self, method: reqwest::Method, table: Table) -> RequestBuilder {
        self.client.request(method, self.table_url(table)).headers(self.headers())
    }

    /// Adds `Prefer: return=representation` so writes echo the stored rows.
    fn returning(&self, method: reqwest::Method, table: Table) -> RequestBuilder {
        self.request(method, table).header("Prefer", "return=representation")
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = ensure_success(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        ensure_success(request.send().await?).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiError>(&body) {
        Ok(ApiError { message: Some(message), details }) => match details {
            Some(details) if !details.is_empty() => format!("{message} ({details})"),
            _ => message,
        },
        _ if body.is_empty() => status.canonical_reason().unwrap_or("request failed").to_string(),
        _ => body,
    };

    Err(FlashdeckError::Remote { status: status.as_u16(), message })
}

fn scope_filter(scope: Option<&UserId>) -> String {
    match scope {
        Some(user) => format!("eq.{}", user),
        None => "is.null".to_string(),
    }
}

fn id_filter(id: &str) -> String {
    format!("eq.{}", id)
}

fn first_row<T>(rows: Vec<T>, missing: impl FnOnce() -> FlashdeckError) -> Result<T> {
    rows.into_iter().next().ok_or_else(missing)
}

#[async_trait]
impl RemoteStore for RestStore {
    fn authenticate(&self, session: Option<&Session>) {
        let mut token = self.access_token.write().unwrap_or_else(|e| e.into_inner());
        *token = session.map(|session| session.access_token.clone());
    }

    #[tracing::instrument(name = "rest.select_sets", skip(self))]
    async fn select_sets(&self, scope: Option<&UserId>) -> Result<Vec<SetRow>> {
        let request = self.request(reqwest::Method::GET, Table::Sets).query(&[
            ("select", SETS_WITH_CARDS.to_string()),
            ("order", "created_at.desc".to_string()),
            ("cards.order", "created_at.asc".to_string()),
            ("user_id", scope_filter(scope)),
        ]);

        let rows: Vec<SetRow> = self.send_json(request).await?;
        debug!(count = rows.len(), "sets selected");
        Ok(rows)
    }

    #[tracing::instrument(name = "rest.insert_set", skip(self))]
    async fn insert_set(&self, name: &str, scope: Option<&UserId>) -> Result<SetRow> {
        let body = json!({ "name": name, "user_id": scope.map(|user| user.0.as_str()) });
        let request = self.returning(reqwest::Method::POST, Table::Sets).json(&body);

        let rows: Vec<SetRow> = self.send_json(request).await?;
        first_row(rows, || FlashdeckError::Custom("insert returned no row".to_string()))
    }

    #[tracing::instrument(name = "rest.update_set", skip(self))]
    async fn update_set(&self, set_id: &str, patch: &SetPatch) -> Result<SetRow> {
        let request = self
            .returning(reqwest::Method::PATCH, Table::Sets)
            .query(&[("id", id_filter(set_id))])
            .json(patch);

        let rows: Vec<SetRow> = self.send_json(request).await?;
        first_row(rows, || FlashdeckError::SetNotFound(set_id.to_string()))
    }

    #[tracing::instrument(name = "rest.delete_set", skip(self))]
    async fn delete_set(&self, set_id: &str) -> Result<()> {
        let request =
            self.request(reqwest::Method::DELETE, Table::Sets).query(&[("id", id_filter(set_id))]);
        self.send_empty(request).await
    }

    #[tracing::instrument(name = "rest.insert_card", skip(self, definition))]
    async fn insert_card(&self, set_id: &str, term: &str, definition: &str) -> Result<CardRow> {
        let body = json!({ "set_id": set_id, "term": term, "definition": definition });
        let request = self.returning(reqwest::Method::POST, Table::Cards).json(&body);

        let rows: Vec<CardRow> = self.send_json(request).await?;
        first_row(rows, || FlashdeckError::Custom("insert returned no row".to_string()))
    }

    #[tracing::instrument(name = "rest.delete_card", skip(self))]
    async fn delete_card(&self, card_id: &str) -> Result<()> {
        let request = self
            .request(reqwest::Method::DELETE, Table::Cards)
            .query(&[("id", id_filter(card_id))]);
        self.send_empty(request).await
    }

    async fn subscribe(&self, table: Table) -> Result<ChangeFeed> {
        let config = RealtimeConfig {
            base_url: self.base_url.clone(),
            api_key: self.anon_key.clone(),
            access_token: Some(self.bearer()),
            heartbeat_interval: self.heartbeat_interval,
        };
        RealtimeChannel::new(config, table).spawn()
    }
}
