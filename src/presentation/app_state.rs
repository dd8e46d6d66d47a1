// Application state for HTTP handlers
use crate::application::viewer_session::ViewerHandle;
use crate::domain::chart::Theme;
use crate::infrastructure::config::StreamSettings;

#[derive(Clone)]
pub struct AppState {
    pub viewer: ViewerHandle,
    pub stream: StreamSettings,
}

impl AppState {
    pub fn new(viewer: ViewerHandle, stream: StreamSettings) -> Self {
        Self { viewer, stream }
    }

    pub fn default_theme(&self) -> Theme {
        self.stream.theme
    }
}
