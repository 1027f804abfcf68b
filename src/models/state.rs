use super::history::GeneratedImageHistory;
use super::image::GenerationResult;
use serde::Serialize;

/// Snapshot of one orchestrator's observable state.
///
/// `is_loading` and `error` are never set together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorState {
    pub is_loading: bool,
    pub error: Option<String>,
    pub latest_image_url: Option<String>,
    pub history: GeneratedImageHistory,
}

impl OrchestratorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// History entry backing `latest_image_url`, if it came from a generation.
    pub fn latest_result(&self) -> Option<&GenerationResult> {
        self.latest_image_url
            .as_deref()
            .and_then(|url| self.history.find_by_url(url))
    }

    pub(crate) fn begin(&mut self) {
        self.is_loading = true;
        self.error = None;
    }

    pub(crate) fn succeed(&mut self, result: GenerationResult, still_loading: bool) {
        self.latest_image_url = Some(result.image_url().to_string());
        self.history.push(result);
        self.error = None;
        self.is_loading = still_loading;
    }

    pub(crate) fn fail(&mut self, message: Option<String>, still_loading: bool) {
        self.is_loading = still_loading;
        if !still_loading {
            self.error = message;
        }
    }
}
