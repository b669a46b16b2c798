use std::cell::RefCell;
use std::collections::BTreeMap;
use std::future::Future;

/// Retrieves a dataset payload by URL or path.
///
/// Futures are not required to be `Send`; the viewer runs on one thread.
pub trait Fetch {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Network(String),
    Status { url: String, status: u16 },
    NotFound(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "network error: {msg}"),
            FetchError::Status { url, status } => write!(f, "HTTP {status} for {url}"),
            FetchError::NotFound(url) => write!(f, "no payload at {url}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Serves payloads from memory and records every request.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    payloads: BTreeMap<String, String>,
    requests: RefCell<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(mut self, url: impl Into<String>, payload: impl Into<String>) -> Self {
        self.payloads.insert(url.into(), payload.into());
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests.borrow().iter().filter(|u| *u == url).count()
    }
}

impl Fetch for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        self.payloads
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}
