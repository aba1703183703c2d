use super::*;

impl Story {
    pub(super) fn perform_control_command(
        &mut self,
        command: ControlCommand,
        node_id: NodeId,
    ) -> Result<Flow, WeftError> {
        match command {
            ControlCommand::EvalStart => {
                let frame = self.call_stack.current_mut();
                if frame.in_expression_evaluation {
                    return Err(WeftError::new(
                        "ENGINE_NESTED_EVALUATION",
                        "EvalStart while already evaluating an expression.",
                    ));
                }
                frame.in_expression_evaluation = true;
            }
            ControlCommand::EvalEnd => {
                let frame = self.call_stack.current_mut();
                if !frame.in_expression_evaluation {
                    return Err(WeftError::new(
                        "ENGINE_NESTED_EVALUATION",
                        "EvalEnd without a matching EvalStart.",
                    ));
                }
                frame.in_expression_evaluation = false;
            }
            ControlCommand::EvalOutput => {
                let value = self.pop_evaluation_value()?;
                if let RuntimeValue::DivertTarget(path) = &value {
                    self.warn(format!("Printing divert target \"{}\" as text.", path));
                }
                if !value.is_void() {
                    let metadata = self.graph.nearest_metadata(node_id).cloned();
                    self.output.push_text(&value.to_string(), metadata);
                }
            }
            ControlCommand::StackPush => {
                self.pending_stack_push = true;
            }
            ControlCommand::StackPop => return self.pop_call_frame(),
            ControlCommand::Duplicate => {
                let top = self.evaluation_stack.last().cloned().ok_or_else(|| {
                    WeftError::new(
                        "ENGINE_EVALUATION_STACK_EMPTY",
                        "Duplicate needs a value on the evaluation stack.",
                    )
                })?;
                self.evaluation_stack.push(top);
            }
            ControlCommand::NoOp => {}
            ControlCommand::ChoiceCount => {
                let count = self.output.current_choices().len() as i64;
                self.evaluation_stack.push(RuntimeValue::Int(count));
            }
            ControlCommand::SequenceCount => {
                let key = self.sequence_key(node_id)?;
                let count = *self.sequence_counts.entry(key).or_insert(0);
                self.evaluation_stack.push(RuntimeValue::Int(count));
            }
            ControlCommand::SequenceIncrement => {
                let key = self.sequence_key(node_id)?;
                let count = self.sequence_counts.entry(key.clone()).or_insert(0);
                *count += 1;
                debug!(sequence = %key, count = *count, "sequence visited");
            }
            ControlCommand::SequenceShuffleIndex => {
                let element_count = match self.pop_evaluation_value()? {
                    RuntimeValue::Int(count) => count,
                    other => {
                        return Err(WeftError::new(
                            "ENGINE_TYPE_MISMATCH",
                            format!(
                                "Shuffle element count must be an int, got {}.",
                                other.type_name()
                            ),
                        ))
                    }
                };
                let key = self.sequence_key(node_id)?;
                let count = *self.sequence_counts.entry(key.clone()).or_insert(0);
                let index = shuffle_index(&key, count, element_count, self.story_seed)?;
                self.evaluation_stack.push(RuntimeValue::Int(index));
            }
        }
        Ok(Flow::Continue)
    }

    fn pop_call_frame(&mut self) -> Result<Flow, WeftError> {
        if self.in_temporary_frame() {
            self.call_stack.pop()?;
            return Ok(Flow::Stop);
        }
        match self.call_stack.pop() {
            Ok(_) => {
                debug!(depth = self.call_stack.depth(), "frame returned");
                Ok(Flow::Continue)
            }
            Err(error) if error.code == STACK_UNDERFLOW => {
                debug!("returned past the top level; story run ends");
                self.call_stack.set_current_path(None);
                Ok(Flow::Stop)
            }
            Err(error) => Err(error),
        }
    }

    fn sequence_key(&self, node_id: NodeId) -> Result<String, WeftError> {
        self.graph
            .sequence_container_of(node_id)
            .and_then(|container| self.graph.path_of(container))
            .map(|path| path.to_string())
            .ok_or_else(|| {
                WeftError::new(
                    "ENGINE_SEQUENCE_CONTAINER",
                    "Sequence command has no enclosing container.",
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::test_support::*;
    use super::*;

    #[test]
    fn nested_eval_start_is_rejected() {
        let mut story = story_from(
            Container::new()
                .with(ControlCommand::EvalStart)
                .with(ControlCommand::EvalStart),
        );
        let error = story.continue_story().expect_err("nested evaluation");
        assert_eq!(error.code, "ENGINE_NESTED_EVALUATION");
        assert!(story.has_error());
        assert!(!story.can_continue());
    }

    #[test]
    fn eval_output_prints_value_and_skips_void() {
        let mut story = story_from(
            Container::new()
                .with_all(eval_block(vec![
                    Leaf::value(RuntimeValue::Int(42)).into(),
                    ControlCommand::EvalOutput.into(),
                    Leaf::value(RuntimeValue::Void).into(),
                    ControlCommand::EvalOutput.into(),
                ])),
        );
        assert_eq!(story.continue_story().expect("continue"), "42");
        assert!(story.evaluation_stack().is_empty());
    }

    #[test]
    fn duplicate_copies_top_value() {
        let mut story = story_from(Container::new().with_all(eval_block(vec![
            Leaf::value(RuntimeValue::Int(3)).into(),
            ControlCommand::Duplicate.into(),
        ])));
        story.continue_story().expect("continue");
        assert_eq!(
            story.evaluation_stack(),
            &[RuntimeValue::Int(3), RuntimeValue::Int(3)]
        );
    }

    #[test]
    fn duplicate_on_empty_stack_fails() {
        let mut story = story_from(Container::new().with_all(eval_block(vec![
            ControlCommand::Duplicate.into(),
        ])));
        let error = story.continue_story().expect_err("empty stack");
        assert_eq!(error.code, "ENGINE_EVALUATION_STACK_EMPTY");
    }

    #[test]
    fn stack_pop_at_top_level_ends_without_error() {
        let mut story = story_from(
            Container::new()
                .with(Leaf::text("before"))
                .with(ControlCommand::StackPop)
                .with(Leaf::text("never")),
        );
        assert_eq!(story.continue_story().expect("continue"), "before");
        assert!(!story.has_error());
        assert!(story.has_ended());
    }

    #[test]
    fn sequence_count_and_increment_share_container_key() {
        let mut story = story_from(
            Container::new().with(
                Container::named("seq")
                    .counting_visits()
                    .with(ControlCommand::SequenceIncrement)
                    .with(ControlCommand::SequenceIncrement)
                    .with_all(eval_block(vec![ControlCommand::SequenceCount.into()])),
            ),
        );
        story.continue_story().expect("continue");
        assert_eq!(story.visit_count("seq"), 2);
        assert_eq!(story.evaluation_stack(), &[RuntimeValue::Int(2)]);
    }

    #[test]
    fn choice_count_sees_choices_so_far() {
        let mut story = story_from(
            Container::new()
                .with(Choice::new("A", p("0")))
                .with(Choice::new("B", p("0")))
                .with_all(eval_block(vec![ControlCommand::ChoiceCount.into()])),
        );
        story.continue_story().expect("continue");
        assert_eq!(story.evaluation_stack(), &[RuntimeValue::Int(2)]);
    }

    #[test]
    fn shuffle_index_needs_int_count() {
        let mut story = story_from(Container::new().with_all(eval_block(vec![
            Leaf::value("three").into(),
            ControlCommand::SequenceShuffleIndex.into(),
        ])));
        let error = story.continue_story().expect_err("string count");
        assert_eq!(error.code, "ENGINE_TYPE_MISMATCH");
    }

    #[test]
    fn huge_shuffle_count_fails_before_allocating() {
        let mut story = story_from(Container::new().with_all(eval_block(vec![
            Leaf::value(RuntimeValue::Int(1 << 40)).into(),
            ControlCommand::SequenceShuffleIndex.into(),
        ])));
        let error = story.continue_story().expect_err("oversized shuffle");
        assert_eq!(error.code, "ENGINE_SHUFFLE_TOO_LARGE");
        assert!(story.has_error());
    }
}
