use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use reqwest::header::ACCEPT;
use serde_json::Value;

pub const DEFAULT_ENDPOINT: &str = "https://stats.panacea.website/statistics";

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed")]
    Connect,
    #[error("request timed out")]
    Timeout,
    #[error(transparent)]
    Http(reqwest::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect
        } else {
            Self::Http(err)
        }
    }
}

/// Sends one JSON body and reports the response status code.
pub trait Transport: Send + Sync + 'static {
    fn post_json(&self, url: &str, body: &Value) -> Result<u16, TransportError>;
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder().build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn post_json(&self, url: &str, body: &Value) -> Result<u16, TransportError> {
        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(body)
            .send()?;
        Ok(response.status().as_u16())
    }
}

/// Best-effort usage statistics. Failures never reach the caller.
pub struct Stats<T> {
    endpoint: String,
    transport: Arc<T>,
}

impl<T: Transport> Stats<T> {
    pub fn new(endpoint: impl Into<String>, transport: T) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport: Arc::new(transport),
        }
    }

    /// Posts `payload` and blocks; `true` only for `201 Created`.
    pub fn send(&self, payload: &Value) -> bool {
        send(self.transport.as_ref(), &self.endpoint, payload)
    }

    /// Posts `payload` from a background thread.
    pub fn track(&self, payload: Value) -> Dispatch {
        let (sender, receiver) = mpsc::channel();
        let transport = Arc::clone(&self.transport);
        let endpoint = self.endpoint.clone();
        let handle = thread::spawn(move || {
            let delivered = send(transport.as_ref(), &endpoint, &payload);
            // The receiver is gone once the process stopped waiting.
            let _ = sender.send(delivered);
        });
        Dispatch { receiver, handle }
    }
}

fn send<T: Transport>(transport: &T, endpoint: &str, payload: &Value) -> bool {
    match transport.post_json(endpoint, payload) {
        Ok(201) => {
            tracing::debug!("statistics delivered");
            true
        }
        Ok(status) => {
            tracing::debug!(status, "statistics rejected");
            false
        }
        Err(err) => {
            tracing::debug!(error = %err, "statistics not delivered");
            false
        }
    }
}

/// Handle to an in-flight statistics request.
pub struct Dispatch {
    receiver: Receiver<bool>,
    handle: JoinHandle<()>,
}

impl Dispatch {
    /// Waits at most `grace` for the request to finish.
    ///
    /// `None` means the request was still running and is abandoned with the
    /// process; no retry happens.
    pub fn wait(self, grace: Duration) -> Option<bool> {
        match self.receiver.recv_timeout(grace) {
            Ok(delivered) => {
                let _ = self.handle.join();
                Some(delivered)
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::debug!(?grace, "abandoning statistics request");
                None
            }
            Err(RecvTimeoutError::Disconnected) => Some(false),
        }
    }
}
