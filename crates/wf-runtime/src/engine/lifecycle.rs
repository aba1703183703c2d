use super::*;

impl Story {
    pub fn new(graph: Arc<ContentGraph>, options: StoryOptions) -> Self {
        let story_seed = options.random_seed.unwrap_or(DEFAULT_RANDOM_SEED);
        debug!(seed = story_seed, nodes = graph.len(), "story created");
        Self {
            graph,
            story_seed,
            step_limit: options.step_limit.unwrap_or(DEFAULT_STEP_LIMIT),
            call_stack: CallStack::new(Some(Path::root())),
            evaluation_stack: Vec::new(),
            output: OutputStream::new(),
            sequence_counts: BTreeMap::new(),
            previous_path: None,
            pending_divert: None,
            pending_stack_push: false,
            temporary_frame: None,
            last_error: None,
            warnings: Vec::new(),
        }
    }

    pub fn from_root(root: Container, options: StoryOptions) -> Result<Self, WeftError> {
        let graph = ContentGraph::from_root(root)?;
        Ok(Self::new(Arc::new(graph), options))
    }

    pub fn graph(&self) -> &Arc<ContentGraph> {
        &self.graph
    }

    pub fn story_seed(&self) -> u32 {
        self.story_seed
    }

    pub fn can_continue(&self) -> bool {
        if self.last_error.is_some() {
            return false;
        }
        let Some(path) = self.call_stack.current_path() else {
            return false;
        };
        // An exhausted called frame still has its caller to return to.
        self.resolve_position(path).is_some()
            || (self.call_stack.can_pop() && !self.in_temporary_frame())
    }

    pub fn has_ended(&self) -> bool {
        !self.can_continue() && self.output.current_choices().is_empty()
    }

    pub fn current_text(&self) -> String {
        self.output.current_text()
    }

    pub fn current_tags(&self) -> Vec<&str> {
        self.output.current_tags()
    }

    pub fn current_choices(&self) -> Vec<&Choice> {
        self.output.current_choices()
    }

    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    pub fn evaluation_stack(&self) -> &[RuntimeValue] {
        &self.evaluation_stack
    }

    pub fn output(&self) -> &OutputStream {
        &self.output
    }

    pub fn visit_count(&self, path: &str) -> i64 {
        self.sequence_counts.get(path).copied().unwrap_or(0)
    }

    pub fn variable(&self, name: &str) -> Option<RuntimeValue> {
        self.call_stack.get_variable(name).ok()
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::test_support::*;
    use super::*;

    #[test]
    fn default_options_use_fixed_seed_and_step_limit() {
        let story = story_from(Container::new().with(Leaf::text("x")));
        assert_eq!(story.story_seed(), DEFAULT_RANDOM_SEED);
        assert_eq!(story.step_limit, DEFAULT_STEP_LIMIT);
        assert_eq!(story.call_stack().depth(), 1);
    }

    #[test]
    fn explicit_options_are_kept() {
        let story = Story::from_root(
            Container::new().with(Leaf::text("x")),
            StoryOptions {
                random_seed: Some(77),
                step_limit: Some(10),
            },
        )
        .expect("story should build");
        assert_eq!(story.story_seed(), 77);
        assert_eq!(story.step_limit, 10);
    }

    #[test]
    fn empty_story_cannot_continue() {
        let story = story_from(Container::new());
        assert!(!story.can_continue());
        assert!(story.has_ended());
    }

    #[test]
    fn graph_errors_surface_from_from_root() {
        let result = Story::from_root(
            Container::new()
                .with(Container::named("a"))
                .with(Container::named("a")),
            StoryOptions::default(),
        );
        let error = result.err().expect("duplicate names should fail");
        assert_eq!(error.code, "GRAPH_DUPLICATE_NAME");
    }

    #[test]
    fn stories_share_one_graph() {
        let graph = Arc::new(
            ContentGraph::from_root(Container::new().with(Leaf::text("shared")))
                .expect("graph should build"),
        );
        let mut first = Story::new(Arc::clone(&graph), StoryOptions::default());
        let second = Story::new(Arc::clone(&graph), StoryOptions::default());
        first.continue_story().expect("continue");
        assert_eq!(first.current_text(), "shared");
        assert!(second.can_continue());
        assert_eq!(Arc::strong_count(&graph), 3);
    }
}
