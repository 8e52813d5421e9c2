use serde_derive::{Deserialize, Serialize};
use std::{fmt, path::Path};
use thiserror::Error;

/// Identifies a chat that receives notifications: a numeric id, or a `@channelname`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    /// Numeric chat id; group chats have negative ids.
    Id(i64),
    /// A public channel name, like `@my_channel`.
    Name(String),
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}
impl From<&str> for ChatId {
    fn from(s: &str) -> Self {
        s.parse::<i64>().map_or_else(|_| Self::Name(s.to_string()), Self::Id)
    }
}
impl From<String> for ChatId {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

/// Describes why a notification could not be delivered.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TransportError {
    /// The HTTP request failed, or the response could not be read.
    #[cfg(feature = "telegram")]
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// The remote API rejected the request.
    #[error("API error {code}: {description}")]
    Api {
        /// Error code reported by the API.
        code: i64,
        /// Error description reported by the API.
        description: String,
    },

    /// The attachment could not be written or read.
    #[error("Attachment cannot be accessed")]
    Io(#[from] std::io::Error),
}

/// The remote side of a notification sink.
///
/// Implementations are shared between background jobs and must be thread-safe.
/// The provided implementation is [`TelegramBot`](crate::writers::TelegramBot);
/// tests and alternative chat services can implement this trait.
pub trait Transport: Send + Sync {
    /// Sends a plain text message to one chat.
    ///
    /// # Errors
    ///
    /// `TransportError` if the message was not accepted.
    fn send_message(&self, chat: &ChatId, text: &str) -> Result<(), TransportError>;

    /// Sends a file as document attachment to one chat.
    ///
    /// # Errors
    ///
    /// `TransportError` if the document was not accepted.
    fn send_document(&self, chat: &ChatId, path: &Path) -> Result<(), TransportError>;
}

#[cfg(feature = "telegram")]
pub use self::telegram::{TelegramBot, TELEGRAM_API_URL};

#[cfg(feature = "telegram")]
mod telegram {
    use super::{ChatId, Transport, TransportError};
    use reqwest::blocking::{multipart::Form, Client, Response};
    use serde_derive::Deserialize;
    use std::{path::Path, time::Duration};

    /// Base URL of the public Telegram Bot API.
    pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    #[derive(Deserialize)]
    struct ApiResponse {
        ok: bool,
        error_code: Option<i64>,
        description: Option<String>,
    }

    /// [`Transport`] implementation for the Telegram Bot API.
    ///
    /// Uses a blocking HTTP client; calls are done either in the logging thread or,
    /// with asynchronous notifications, on the shared worker pool.
    pub struct TelegramBot {
        client: Client,
        base_url: String,
    }

    impl TelegramBot {
        /// Creates a bot client for the public API, with a request timeout of 10 seconds.
        ///
        /// # Errors
        ///
        /// `TransportError::Http` if the HTTP client cannot be initialized.
        pub fn new(token: &str) -> Result<Self, TransportError> {
            Self::with_api_url(TELEGRAM_API_URL, token, DEFAULT_TIMEOUT)
        }

        /// Creates a bot client for a self-hosted Bot API server.
        ///
        /// # Errors
        ///
        /// `TransportError::Http` if the HTTP client cannot be initialized.
        pub fn with_api_url(
            api_url: &str,
            token: &str,
            timeout: Duration,
        ) -> Result<Self, TransportError> {
            let client = Client::builder().timeout(timeout).build()?;
            Ok(Self {
                client,
                base_url: format!("{}/bot{token}", api_url.trim_end_matches('/')),
            })
        }

        fn check(response: Response) -> Result<(), TransportError> {
            let status = response.status();
            let api_response: ApiResponse = response.json()?;
            if api_response.ok {
                Ok(())
            } else {
                Err(TransportError::Api {
                    code: api_response
                        .error_code
                        .unwrap_or_else(|| i64::from(status.as_u16())),
                    description: api_response
                        .description
                        .unwrap_or_else(|| status.to_string()),
                })
            }
        }
    }

    impl Transport for TelegramBot {
        fn send_message(&self, chat: &ChatId, text: &str) -> Result<(), TransportError> {
            let response = self
                .client
                .post(format!("{}/sendMessage", self.base_url))
                .json(&serde_json::json!({ "chat_id": chat, "text": text }))
                .send()?;
            Self::check(response)
        }

        fn send_document(&self, chat: &ChatId, path: &Path) -> Result<(), TransportError> {
            let form = Form::new()
                .text("chat_id", chat.to_string())
                .file("document", path)?;
            let response = self
                .client
                .post(format!("{}/sendDocument", self.base_url))
                .multipart(form)
                .send()?;
            Self::check(response)
        }
    }
}

#[cfg(test)]
mod test {
    use super::ChatId;

    #[test]
    fn test_chat_id() {
        assert_eq!(ChatId::from("-100123"), ChatId::Id(-100_123));
        assert_eq!(
            ChatId::from("@alerts"),
            ChatId::Name("@alerts".to_string())
        );
        assert_eq!(ChatId::from(42).to_string(), "42");

        #[derive(serde_derive::Deserialize)]
        struct Ids {
            ids: Vec<ChatId>,
        }
        let ids: Ids = toml::from_str(r#"ids = [12, "@news"]"#).unwrap();
        assert_eq!(
            ids.ids,
            vec![ChatId::Id(12), ChatId::Name("@news".to_string())]
        );
    }
}
