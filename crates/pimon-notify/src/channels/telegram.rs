use crate::error::{NotifyError, Result};
use crate::utils::{truncate_string, MAX_BODY_LENGTH};
use crate::NotificationChannel;
use async_trait::async_trait;
use serde::Deserialize;

pub const ENV_BOT_TOKEN: &str = "PI_BOT_TOKEN";
pub const ENV_CHANNEL_ID: &str = "PI_CHANNEL_ID";
pub const ENV_API_BASE: &str = "PI_BOT_API";

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

const MAX_ATTEMPTS: u32 = 3;

/// Posts messages to a Telegram chat through the Bot API, using HTML parse mode.
pub struct TelegramChannel {
    client: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramChannel {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Builds the channel from `PI_BOT_TOKEN`, `PI_CHANNEL_ID` and the
    /// optional `PI_BOT_API` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`] but reads variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = non_empty(ENV_BOT_TOKEN)
            .ok_or_else(|| NotifyError::InvalidConfig(format!("{ENV_BOT_TOKEN} is not set")))?;
        let chat_id = non_empty(ENV_CHANNEL_ID)
            .ok_or_else(|| NotifyError::InvalidConfig(format!("{ENV_CHANNEL_ID} is not set")))?;

        let channel = Self::new(token, chat_id);
        Ok(match non_empty(ENV_API_BASE) {
            Some(api_base) => channel.with_api_base(api_base),
            None => channel,
        })
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }

    fn request_body(&self, message: &str) -> serde_json::Value {
        serde_json::json!({
            "chat_id": self.chat_id,
            "text": message,
            "parse_mode": "HTML",
        })
    }

    async fn send_once(&self, body: &serde_json::Value) -> Result<()> {
        let resp = self.client.post(self.endpoint()).json(body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        // Telegram reports refusals both through the status and the `ok` flag.
        let accepted = status.is_success()
            && serde_json::from_str::<ApiResponse>(&text).is_ok_and(|r| r.ok);
        if accepted {
            return Ok(());
        }

        let body = serde_json::from_str::<ApiResponse>(&text)
            .ok()
            .and_then(|r| r.description)
            .unwrap_or(text);
        Err(NotifyError::ApiError {
            service: "telegram".to_string(),
            status: status.as_u16(),
            body: truncate_string(&body, MAX_BODY_LENGTH),
        })
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    async fn send(&self, message: &str) -> Result<()> {
        if message.is_empty() {
            return Ok(());
        }

        let body = self.request_body(message);
        let mut last_err = None;

        for attempt in 0..MAX_ATTEMPTS {
            match self.send_once(&body).await {
                Ok(()) => {
                    tracing::info!(chat_id = %self.chat_id, attempt = attempt + 1, "Notification delivered");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(attempt = attempt + 1, error = %e, "Telegram send failed, retrying");
                    last_err = Some(e);
                }
            }
            if attempt + 1 < MAX_ATTEMPTS {
                tokio::time::sleep(std::time::Duration::from_millis(100 * 2u64.pow(attempt)))
                    .await;
            }
        }

        let err = last_err.unwrap_or_else(|| {
            NotifyError::InvalidConfig("no delivery attempt was made".to_string())
        });
        tracing::error!(error = %err, "Telegram send failed after {MAX_ATTEMPTS} attempts");
        Err(err)
    }

    fn channel_name(&self) -> &str {
        "telegram"
    }
}
