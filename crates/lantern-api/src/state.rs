use std::path::PathBuf;
use std::sync::Arc;

use lantern_gateway::dispatcher::Dispatcher;
use lantern_store::ChannelStore;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Arc<ChannelStore>,
    pub dispatcher: Dispatcher,
    pub upload_dir: PathBuf,
}
