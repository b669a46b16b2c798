use std::cell::RefCell;
use std::collections::BTreeMap;

use formats::{DEFAULT_OBJECT, DecodeError, decode_dataset};
use scene::{FeatureCollection, Resolution};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::fetch::{Fetch, FetchError};
use crate::residency::ResidencyState;

/// Where each resolution's dataset lives, and which topology object to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSources {
    pub coarse: String,
    pub fine: String,
    pub object: String,
}

impl DatasetSources {
    pub fn url(&self, resolution: Resolution) -> &str {
        match resolution {
            Resolution::Coarse => &self.coarse,
            Resolution::Fine => &self.fine,
        }
    }
}

impl Default for DatasetSources {
    fn default() -> Self {
        Self {
            coarse: "data/world-110m.json".to_string(),
            fine: "data/world-50m.json".to_string(),
            object: DEFAULT_OBJECT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    Fetch(FetchError),
    Decode(DecodeError),
    /// Another dataset is still loading; loads are serialized.
    Busy {
        pending: Resolution,
        requested: Resolution,
    },
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Fetch(e) => write!(f, "failed to fetch dataset: {e}"),
            LoadError::Decode(e) => write!(f, "failed to decode dataset: {e}"),
            LoadError::Busy { pending, requested } => write!(
                f,
                "cannot load {requested} dataset while {pending} is still loading"
            ),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Fetch(e) => Some(e),
            LoadError::Decode(e) => Some(e),
            LoadError::Busy { .. } => None,
        }
    }
}

#[derive(Debug, Default)]
struct SourceState {
    datasets: BTreeMap<Resolution, FeatureCollection>,
    residency: BTreeMap<Resolution, ResidencyState>,
    fetches: BTreeMap<Resolution, u32>,
    pending: Option<Resolution>,
}

/// Loads region datasets on first use and keeps them for the session.
///
/// Cache slots are written once, by replacing the whole value. At most one
/// load is in flight; a second request while one is pending fails with
/// [`LoadError::Busy`] instead of racing it.
#[derive(Debug)]
pub struct GeometrySource<F> {
    fetcher: F,
    sources: DatasetSources,
    state: RefCell<SourceState>,
}

impl<F: Fetch> GeometrySource<F> {
    pub fn new(fetcher: F, sources: DatasetSources) -> Self {
        Self {
            fetcher,
            sources,
            state: RefCell::new(SourceState::default()),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn sources(&self) -> &DatasetSources {
        &self.sources
    }

    pub fn cached(&self, resolution: Resolution) -> Option<FeatureCollection> {
        self.state.borrow().datasets.get(&resolution).cloned()
    }

    pub fn residency(&self, resolution: Resolution) -> ResidencyState {
        self.state
            .borrow()
            .residency
            .get(&resolution)
            .copied()
            .unwrap_or_default()
    }

    /// Number of network fetches issued for `resolution`.
    pub fn fetch_count(&self, resolution: Resolution) -> u32 {
        self.state
            .borrow()
            .fetches
            .get(&resolution)
            .copied()
            .unwrap_or(0)
    }

    pub fn pending(&self) -> Option<Resolution> {
        self.state.borrow().pending
    }

    /// Returns the dataset for `resolution`, fetching and decoding it on first use.
    pub async fn load(&self, resolution: Resolution) -> Result<FeatureCollection, LoadError> {
        if let Some(collection) = self.cached(resolution) {
            debug!(%resolution, features = collection.len(), "dataset cache hit");
            return Ok(collection);
        }

        let guard = self.begin(resolution)?;
        let url = self.sources.url(resolution);
        info!(%resolution, url, "fetching dataset");
        let fetched = self.fetcher.fetch(url).await;
        guard.complete();

        let payload = fetched.map_err(|e| {
            warn!(%resolution, url, error = %e, "dataset fetch failed");
            self.set_residency(resolution, ResidencyState::Failed);
            LoadError::Fetch(e)
        })?;

        self.set_residency(resolution, ResidencyState::Decoding);
        let decoded = decode_dataset(&payload, &self.sources.object).map_err(|e| {
            warn!(%resolution, error = %e, "dataset decode failed");
            self.set_residency(resolution, ResidencyState::Failed);
            LoadError::Decode(e)
        })?;
        if decoded.skipped > 0 {
            warn!(%resolution, skipped = decoded.skipped, "skipped features without area geometry");
        }

        let collection = decoded.collection;
        info!(%resolution, features = collection.len(), bytes = payload.len(), "dataset resident");
        let mut state = self.state.borrow_mut();
        state.datasets.insert(resolution, collection.clone());
        state.residency.insert(resolution, ResidencyState::Resident);
        Ok(collection)
    }

    fn begin(&self, resolution: Resolution) -> Result<PendingGuard<'_>, LoadError> {
        let mut state = self.state.borrow_mut();
        if let Some(pending) = state.pending {
            debug!(%pending, requested = %resolution, "load refused while another is pending");
            return Err(LoadError::Busy {
                pending,
                requested: resolution,
            });
        }
        state.pending = Some(resolution);
        *state.fetches.entry(resolution).or_insert(0) += 1;
        state.residency.insert(resolution, ResidencyState::Downloading);
        Ok(PendingGuard {
            state: &self.state,
            completed: false,
        })
    }

    fn set_residency(&self, resolution: Resolution, residency: ResidencyState) {
        self.state.borrow_mut().residency.insert(resolution, residency);
    }
}

/// Clears the pending slot when the fetch finishes or its future is dropped.
struct PendingGuard<'a> {
    state: &'a RefCell<SourceState>,
    completed: bool,
}

impl PendingGuard<'_> {
    fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        let Some(pending) = state.pending.take() else {
            return;
        };
        if !self.completed {
            state.residency.insert(pending, ResidencyState::Absent);
        }
    }
}
