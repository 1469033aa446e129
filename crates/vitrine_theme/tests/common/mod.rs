//! Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use vitrine_theme::{
    FetchError, ThemeClient, ThemeDescriptor, ThemePreset, ThemeTransport, TransportResponse,
};

/// How the scripted service answers one slug
#[derive(Clone)]
pub enum Reply {
    Theme(ThemeDescriptor),
    Status(u16, String),
    Fail(FetchError),
}

/// Theme service with per-slug latency and replies, driven by tokio time
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    replies: Arc<Mutex<HashMap<String, (Duration, Reply)>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, slug: &str, delay: Duration, reply: Reply) -> &Self {
        self.replies
            .lock()
            .insert(slug.to_string(), (delay, reply));
        self
    }

    pub fn serve(&self, theme: ThemeDescriptor, delay: Duration) -> &Self {
        let slug = theme.slug().to_string();
        self.reply(&slug, delay, Reply::Theme(theme))
    }

    /// Slugs requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn client(&self) -> ThemeClient {
        ThemeClient::new(Arc::new(self.clone()))
    }
}

#[async_trait]
impl ThemeTransport for ScriptedTransport {
    async fn get_theme(&self, slug: &str) -> Result<TransportResponse, FetchError> {
        self.requests.lock().push(slug.to_string());
        let script = self.replies.lock().get(slug).cloned();
        let Some((delay, reply)) = script else {
            return Ok(TransportResponse::new(404, "not found"));
        };

        tokio::time::sleep(delay).await;
        match reply {
            Reply::Theme(theme) => Ok(TransportResponse::new(200, theme.to_json_pretty())),
            Reply::Status(status, body) => Ok(TransportResponse::new(status, body)),
            Reply::Fail(err) => Err(err),
        }
    }
}

/// The default preset under another slug
pub fn theme_named(slug: &str) -> ThemeDescriptor {
    let mut theme = ThemePreset::Default.descriptor();
    theme.meta.slug = slug.to_string();
    theme.meta.name = format!("Theme {slug}");
    theme
}
