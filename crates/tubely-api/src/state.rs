//! Application state shared by all handlers.

use crate::assets::AssetStore;
use std::sync::Arc;
use tubely_core::Config;
use tubely_db::VideoRepository;
use tubely_processing::{UrlSigner, VideoIngestPipeline};
use tubely_storage::LocalStorage;

pub struct AppState {
    pub config: Config,
    pub videos: Arc<dyn VideoRepository>,
    pub pipeline: Arc<VideoIngestPipeline>,
    pub signer: UrlSigner,
    pub assets: AssetStore,
    /// Set when objects live on the local backend and are served by `/media`.
    pub local_media: Option<Arc<LocalStorage>>,
}
