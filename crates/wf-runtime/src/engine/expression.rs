use super::*;

impl Story {
    /// The container stands in for the story graph inside a fresh frame. Top-level
    /// declarations land in the frame the story was in.
    pub fn evaluate_expression(
        &mut self,
        expression: Container,
    ) -> Result<Option<RuntimeValue>, WeftError> {
        let expression = Arc::new(ContentGraph::from_root(expression)?);

        let base_depth = self.call_stack.depth();
        let base_height = self.evaluation_stack.len();
        let saved_previous_path = self.previous_path.take();

        self.call_stack.push();
        self.call_stack.set_current_path(Some(Path::root()));
        self.temporary_frame = Some(base_depth);
        let story_graph = std::mem::replace(&mut self.graph, expression);
        debug!(depth = base_depth, "evaluating expression");

        let outcome = self.run_flow();

        self.graph = story_graph;
        self.temporary_frame = None;
        self.pending_divert = None;
        self.pending_stack_push = false;
        self.previous_path = saved_previous_path;
        while self.call_stack.depth() > base_depth {
            self.call_stack.pop()?;
        }

        let value = if self.evaluation_stack.len() > base_height {
            self.evaluation_stack.pop()
        } else {
            None
        };
        self.evaluation_stack.truncate(base_height);

        match outcome {
            Ok(()) => {
                debug!(value = ?value, "expression evaluated");
                Ok(value)
            }
            Err(error) => {
                error!(code = %error.code, message = %error.message, "expression failed");
                Err(error)
            }
        }
    }
}
