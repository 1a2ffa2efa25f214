use crate::error::NotificationError;
use reqwest::blocking::{
    Client,
    multipart::{Form, Part},
};
use serde::Serialize;
use std::{fs, path::Path, time::Duration};
use url::Url;

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Hands a finished snapshot to some outside channel.
pub trait Notifier: Send + Sync {
    fn notify(&self, path: &Path, caption: &str) -> Result<(), NotificationError>;
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Uploads snapshots to a Discord webhook.
///
/// Uses a blocking client, so it must be created and used off the async runtime.
pub struct DiscordWebhook {
    webhook: Url,
    client: Client,
}

impl DiscordWebhook {
    pub fn new(webhook: Url) -> Result<Self, NotificationError> {
        let client = Client::builder().timeout(UPLOAD_TIMEOUT).build()?;

        Ok(Self::with_client(webhook, client))
    }

    pub fn with_client(webhook: Url, client: Client) -> Self {
        Self { webhook, client }
    }
}

impl Notifier for DiscordWebhook {
    fn notify(&self, path: &Path, caption: &str) -> Result<(), NotificationError> {
        let payload = serde_json::to_string(&WebhookPayload { content: caption })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot.png".to_owned());

        // read up front so the request carries a Content-Length
        let file = Part::bytes(fs::read(path)?)
            .file_name(file_name)
            .mime_str("image/png")?;

        let form = Form::new().text("payload_json", payload).part("files[0]", file);

        let response = self
            .client
            .post(self.webhook.clone())
            .multipart(form)
            .send()?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().unwrap_or_default();

            return Err(NotificationError::Rejected { status, body });
        }

        log::info!("posted {path:?} to webhook");

        Ok(())
    }
}
