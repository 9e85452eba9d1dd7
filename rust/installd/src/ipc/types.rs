use std::path::PathBuf;

use serde::Deserialize;

use crate::store::InstallmentStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub store: InstallmentStore,
    /// Seed file the store was last loaded from; `None` means the embedded seed.
    pub seed_path: Option<PathBuf>,
}
