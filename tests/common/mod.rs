#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};

use tasktrack_api::config::AppConfig;
use tasktrack_api::database::{EntityStore, MemoryStore};
use tasktrack_api::services::{EmailError, EmailMessage, EmailSender, TokenService, UserService};
use tasktrack_api::{app, AppState};

pub const PASSWORD: &str = "password1";

/// Captures outgoing mail so tests can follow the links in it.
#[derive(Default)]
pub struct Outbox {
    messages: Mutex<Vec<EmailMessage>>,
}

impl Outbox {
    pub fn messages(&self) -> Vec<EmailMessage> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Token from the `?token=` link of the most recent message.
    pub fn last_token(&self) -> Option<String> {
        let last = self.messages().pop()?;
        let rest = last.text.split("token=").nth(1)?;
        Some(rest.split_whitespace().next()?.to_string())
    }
}

#[async_trait]
impl EmailSender for Outbox {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        self.messages
            .lock()
            .map_err(|e| EmailError::Delivery(e.to_string()))?
            .push(message);
        Ok(())
    }
}

pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub outbox: Arc<Outbox>,
    pub store: Arc<dyn EntityStore>,
    pub config: AppConfig,
}

impl TestServer {
    /// Serve the app on a free port against a fresh in-memory store.
    pub async fn start() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = AppConfig::test();
        let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
        let outbox = Arc::new(Outbox::default());
        let state = AppState::new(config.clone(), store.clone(), outbox.clone());

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self {
            base_url,
            client: reqwest::Client::new(),
            outbox,
            store,
            config,
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Seed a user straight through the services; returns (id, access token).
    pub async fn seed_user(&self, email: &str, role: &str) -> Result<(String, String)> {
        let body = json!({
            "name": "Test",
            "lastName": "User",
            "email": email,
            "password": PASSWORD,
            "role": role
        });
        let users = UserService::new(self.store.clone());
        let user = users
            .create_user(body.as_object().cloned().unwrap_or_default())
            .await
            .map_err(|e| anyhow::anyhow!("seed user: {}", e))?;
        let id = user.get("_id").and_then(Value::as_str).context("seeded user has no id")?.to_string();

        let tokens = TokenService::new(self.store.clone(), self.config.jwt.clone())
            .generate_auth_tokens(&id)
            .await
            .map_err(|e| anyhow::anyhow!("seed tokens: {}", e))?;
        Ok((id, tokens.access.token))
    }

    pub async fn admin_token(&self) -> Result<String> {
        Ok(self.seed_user("admin@example.com", "admin").await?.1)
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        let resp = self.client.get(self.url(path)).bearer_auth(token).send().await?;
        read(resp).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        let mut req = self.client.post(self.url(path)).json(&body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await?).await
    }

    pub async fn patch(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        let resp = self.client.patch(self.url(path)).bearer_auth(token).json(&body).send().await?;
        read(resp).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<StatusCode> {
        let resp = self.client.delete(self.url(path)).bearer_auth(token).send().await?;
        Ok(resp.status())
    }
}

/// Status plus JSON body; empty bodies (204) come back as `null`.
async fn read(resp: reqwest::Response) -> Result<(StatusCode, Value)> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).with_context(|| format!("non-JSON body with status {}", status))?
    };
    Ok((status, body))
}
