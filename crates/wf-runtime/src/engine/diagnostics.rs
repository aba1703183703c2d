use super::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryWarning {
    pub message: String,
    pub metadata: Option<DebugMetadata>,
}

impl Story {
    pub fn last_error(&self) -> Option<&WeftError> {
        self.last_error.as_ref()
    }

    pub fn has_error(&self) -> bool {
        self.last_error.is_some()
    }

    pub fn reset_error(&mut self) {
        self.last_error = None;
    }

    pub fn warnings(&self) -> &[StoryWarning] {
        &self.warnings
    }

    pub fn drain_warnings(&mut self) -> Vec<StoryWarning> {
        std::mem::take(&mut self.warnings)
    }

    pub(super) fn warn(&mut self, message: String) {
        let metadata = self.best_metadata();
        warn!(message = %message, "story warning");
        self.warnings.push(StoryWarning { message, metadata });
    }

    pub(super) fn record_error(&mut self, error: WeftError) -> WeftError {
        let error = error.or_metadata(self.best_metadata());
        error!(code = %error.code, message = %error.message, "story runtime error");
        self.last_error = Some(error.clone());
        error
    }

    fn metadata_at(&self, path: &Path) -> Option<DebugMetadata> {
        let id = self.graph.content_at(path)?;
        self.graph.nearest_metadata(id).cloned()
    }

    pub(super) fn best_metadata(&self) -> Option<DebugMetadata> {
        if let Some(metadata) = self
            .call_stack
            .current_path()
            .and_then(|path| self.metadata_at(path))
        {
            return Some(metadata);
        }
        if let Some(metadata) = self
            .previous_path
            .as_ref()
            .and_then(|path| self.metadata_at(path))
        {
            return Some(metadata);
        }
        if let Some(metadata) = self
            .call_stack
            .frames()
            .iter()
            .rev()
            .filter_map(|frame| frame.path.as_ref())
            .find_map(|path| self.metadata_at(path))
        {
            return Some(metadata);
        }
        self.output.last_metadata().cloned()
    }
}
