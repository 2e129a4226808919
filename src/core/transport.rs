use crate::prelude::*;

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::{Client, Request};
use rustls::ClientConfig;
use serde_json::Value;
use slog::Logger;

/// "Send JSON, get JSON" primitive the dispatcher talks to the Bot API through
pub trait ApiTransport: Send {
    /// Invokes an API method and returns the decoded JSON body, whatever
    /// the `ok` flag inside it says
    fn call(&self, method: &str, payload: &Value) -> BotResult<Value>;

    /// Download URL for a `file_path` returned by `getFile`
    fn file_url(&self, file_path: &str) -> String;
}

/// Bot API client posting JSON through a blocking reqwest client over rustls
pub struct HttpsTransport {
    client: Client,
    base_url: String,
    token: String,
    logger: Logger,
}

#[derive(Default)]
pub struct HttpsTransportBuilder {
    host: Option<String>,
    port: Option<u16>,
    token: Option<String>,
    tls_config: Option<Arc<ClientConfig>>,
    logger: Option<Logger>,
}

impl HttpsTransport {
    pub fn new() -> HttpsTransportBuilder {
        Default::default()
    }

    fn build_request(&self, method: &str, payload: &Value) -> BotResult<Request> {
        self.client
            .post(format!("{}/bot{}/{}", self.base_url, self.token, method))
            .json(payload)
            .build()
            .map_err(BotError::request)
    }
}

impl HttpsTransportBuilder {
    pub fn host(self, host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            ..self
        }
    }

    pub fn port(self, port: u16) -> Self {
        Self {
            port: Some(port),
            ..self
        }
    }

    pub fn token(self, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..self
        }
    }

    pub fn tls_config(self, tls_config: Arc<ClientConfig>) -> Self {
        Self {
            tls_config: Some(tls_config),
            ..self
        }
    }

    pub fn logger(self, logger: Logger) -> Self {
        Self {
            logger: Some(logger),
            ..self
        }
    }

    /// Must not be called from inside an async context: the blocking client
    /// owns its own runtime.
    pub fn build(self) -> BotResult<HttpsTransport> {
        let missing = |what: &str| {
            BotError::Config(format!("Did not provide {} for the https transport", what))
        };
        let host = self.host.ok_or_else(|| missing("a host"))?;
        let token = self.token.ok_or_else(|| missing("an API token"))?;
        let tls_config = self.tls_config.ok_or_else(|| missing("a tls config"))?;
        let logger = self.logger.ok_or_else(|| missing("a logger"))?;

        let base_url = match self.port.unwrap_or(443) {
            443 => format!("https://{}", host),
            port => format!("https://{}:{}", host, port),
        };
        // Long polls are bounded by the server-side timeout only
        let client = Client::builder()
            .use_preconfigured_tls(ClientConfig::clone(&tls_config))
            .timeout(None::<Duration>)
            .user_agent(concat!("tg_dispatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(BotError::request)?;

        Ok(HttpsTransport {
            client,
            base_url,
            token,
            logger,
        })
    }
}

impl ApiTransport for HttpsTransport {
    fn call(&self, method: &str, payload: &Value) -> BotResult<Value> {
        let request = self.build_request(method, payload)?;
        let response = self.client.execute(request).map_err(BotError::request)?;
        let status = response.status();
        let body = response.bytes().map_err(BotError::request)?;
        debug!(self.logger, "API call finished";
            "method" => method,
            "status" => status.as_u16(),
            "bytes" => body.len(),
        );

        // The API reports failures in-band, so the body is decoded whatever the status
        Ok(serde_json::from_slice(&body)?)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.base_url, self.token, file_path)
    }
}
