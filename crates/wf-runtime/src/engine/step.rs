use super::*;

impl Story {
    pub fn continue_story(&mut self) -> Result<String, WeftError> {
        if let Some(error) = &self.last_error {
            return Err(error.clone());
        }
        if let Err(error) = self.run_flow() {
            self.pending_divert = None;
            self.pending_stack_push = false;
            return Err(self.record_error(error));
        }
        Ok(self.output.current_text())
    }

    pub(super) fn run_flow(&mut self) -> Result<(), WeftError> {
        let mut steps = 0usize;
        loop {
            let Some(current) = self.call_stack.current_path().cloned() else {
                break;
            };
            let Some((path, node_id)) = self.resolve_position(&current) else {
                self.leave_exhausted_frame(&current)?;
                continue;
            };

            steps += 1;
            if steps > self.step_limit {
                return Err(WeftError::new(
                    "ENGINE_STEP_LIMIT",
                    format!(
                        "Execution exceeded {} steps without reaching a choice or the end.",
                        self.step_limit
                    ),
                ));
            }

            self.call_stack.set_current_path(Some(path.clone()));
            let graph = Arc::clone(&self.graph);
            let Some(leaf) = graph.leaf(node_id) else {
                return Err(WeftError::new(
                    "ENGINE_NOT_A_LEAF",
                    format!("Resolved position \"{}\" is not a leaf.", path),
                ));
            };
            trace!(path = %path, node = ?leaf, "dispatch");

            let flow = self.perform(leaf, node_id)?;
            self.previous_path = Some(path);
            if flow == Flow::Stop {
                break;
            }

            self.next_content()?;

            if std::mem::take(&mut self.pending_stack_push) {
                self.call_stack.push();
                debug!(depth = self.call_stack.depth(), "frame pushed");
            }
        }
        Ok(())
    }

    pub(super) fn resolve_position(&self, path: &Path) -> Option<(Path, NodeId)> {
        let mut current = path.clone();
        loop {
            let id = self.graph.content_at(&current)?;
            let Some(container) = self.graph.container(id) else {
                return Some((current, id));
            };
            current = if container.is_empty() {
                self.graph.increment_path(&current)?
            } else {
                current.with_index(0)
            };
        }
    }

    fn perform(&mut self, leaf: &Leaf, node_id: NodeId) -> Result<Flow, WeftError> {
        match leaf {
            Leaf::Control(command) => return self.perform_control_command(*command, node_id),
            Leaf::Divert(divert) => self.request_divert(divert)?,
            Leaf::Branch(branch) => {
                let condition = self.pop_evaluation_value()?;
                let chosen = if condition.is_truthy() {
                    branch.true_divert.as_ref()
                } else {
                    branch.false_divert.as_ref()
                };
                if let Some(divert) = chosen {
                    self.request_divert(divert)?;
                }
            }
            Leaf::VariableReference(name) => {
                let value = self.call_stack.get_variable(name)?;
                self.evaluation_stack.push(value);
            }
            Leaf::VariableAssignment(assignment) => {
                let value = self.pop_evaluation_value()?;
                self.assign_variable(&assignment.name, value, assignment.is_new_declaration)?;
            }
            Leaf::NativeCall(function) => self.call_native(*function)?,
            Leaf::Choice(choice) => {
                if choice.has_condition && !self.pop_evaluation_value()?.is_truthy() {
                    return Ok(Flow::Continue);
                }
                debug!(text = %choice.text, target = %choice.path_on_choice, "choice surfaced");
                let metadata = self.graph.nearest_metadata(node_id).cloned();
                self.output.push_choice(choice.clone(), metadata);
            }
            Leaf::Error(node) => {
                let metadata = self.graph.nearest_metadata(node_id).map(|metadata| {
                    let line = metadata.line(node.use_end_line_number);
                    DebugMetadata::new(metadata.source.clone(), line, line)
                });
                let error = WeftError::new("ENGINE_AUTHOR_ERROR", node.message.clone());
                return Err(error.or_metadata(metadata));
            }
            Leaf::Text(text) => {
                if self.in_expression_evaluation() {
                    self.evaluation_stack.push(RuntimeValue::String(text.clone()));
                } else {
                    let metadata = self.graph.nearest_metadata(node_id).cloned();
                    self.output.push_text(text, metadata);
                }
            }
            Leaf::Value(value) => {
                if self.in_expression_evaluation() {
                    self.evaluation_stack.push(value.clone());
                } else if !value.is_void() {
                    let metadata = self.graph.nearest_metadata(node_id).cloned();
                    self.output.push_text(&value.to_string(), metadata);
                }
            }
            Leaf::Glue => {
                self.reject_in_expression("glue")?;
                self.output.push_glue();
            }
            Leaf::Tag(tag) => {
                self.reject_in_expression("tag")?;
                self.output.push_tag(tag);
            }
        }
        Ok(Flow::Continue)
    }

    fn in_expression_evaluation(&self) -> bool {
        self.call_stack.current().in_expression_evaluation
    }

    fn reject_in_expression(&self, kind: &str) -> Result<(), WeftError> {
        if self.in_expression_evaluation() {
            return Err(WeftError::new(
                "ENGINE_CONTENT_IN_EXPRESSION",
                format!("A {} cannot appear inside expression evaluation.", kind),
            ));
        }
        Ok(())
    }

    pub(super) fn pop_evaluation_value(&mut self) -> Result<RuntimeValue, WeftError> {
        self.evaluation_stack.pop().ok_or_else(|| {
            WeftError::new(
                "ENGINE_EVALUATION_STACK_EMPTY",
                "Expected a value on the evaluation stack.",
            )
        })
    }

    fn assign_variable(
        &mut self,
        name: &str,
        value: RuntimeValue,
        is_new_declaration: bool,
    ) -> Result<(), WeftError> {
        let prioritise_higher_frame = self.in_temporary_frame();
        if is_new_declaration
            && !prioritise_higher_frame
            && self.call_stack.is_declared_in_current_frame(name)
        {
            self.warn(format!(
                "Variable \"{}\" is declared again in the same scope.",
                name
            ));
        }
        self.call_stack
            .set_variable(name, value, is_new_declaration, prioritise_higher_frame)
    }

    fn request_divert(&mut self, divert: &Divert) -> Result<(), WeftError> {
        let target = match &divert.target {
            DivertTarget::Path(path) => path.clone(),
            DivertTarget::Variable(name) => match self.call_stack.get_variable(name)? {
                RuntimeValue::DivertTarget(path) => path,
                other => {
                    return Err(WeftError::new(
                        "ENGINE_DIVERT_TARGET_TYPE",
                        format!(
                            "Variable \"{}\" holds a {} rather than a divert target.",
                            name,
                            other.type_name()
                        ),
                    ))
                }
            },
        };
        self.pending_divert = Some(PendingDivert {
            target,
            is_function_call: divert.is_function_call,
        });
        Ok(())
    }

    fn next_content(&mut self) -> Result<(), WeftError> {
        if let Some(divert) = self.pending_divert.take() {
            let destination = self.divert_destination(&divert.target)?;
            if divert.is_function_call {
                self.call_stack.push();
            }
            debug!(
                target = %divert.target,
                function_call = divert.is_function_call,
                "divert"
            );
            self.call_stack.set_current_path(Some(destination));
            return Ok(());
        }
        self.advance()
    }

    pub(super) fn divert_destination(&mut self, target: &Path) -> Result<Path, WeftError> {
        if let Some(id) = self.graph.content_at(target) {
            if self.graph.container(id).is_some() {
                return Ok(self
                    .graph
                    .path_to_first_leaf_content(target)
                    .unwrap_or_else(|| target.clone()));
            }
            return Ok(target.clone());
        }
        if let Some(next) = self.graph.increment_path(target) {
            self.warn(format!(
                "Divert target \"{}\" does not resolve; continuing at \"{}\".",
                target, next
            ));
            return Ok(next);
        }
        Err(WeftError::new(
            "ENGINE_PATH_RESOLUTION",
            format!("Divert target \"{}\" did not resolve.", target),
        ))
    }

    fn advance(&mut self) -> Result<(), WeftError> {
        let Some(current) = self.call_stack.current_path().cloned() else {
            return Ok(());
        };
        if let Some(next) = self.graph.increment_path(&current) {
            self.call_stack.set_current_path(Some(next));
            return Ok(());
        }
        self.leave_exhausted_frame(&current)
    }

    // Nothing is left to run at `current`. A called frame returns to its caller
    // past the call site; the bottom frame and the expression frame just end.
    fn leave_exhausted_frame(&mut self, current: &Path) -> Result<(), WeftError> {
        if self.in_temporary_frame() || !self.call_stack.can_pop() {
            debug!(path = %current, "flow ran out of content");
            self.call_stack.set_current_path(None);
            return Ok(());
        }

        self.call_stack.pop()?;
        debug!(depth = self.call_stack.depth(), "frame fell through and popped");
        if self.in_expression_evaluation() {
            self.evaluation_stack.push(RuntimeValue::Void);
        }
        self.advance()
    }

    pub(super) fn in_temporary_frame(&self) -> bool {
        self.temporary_frame == Some(self.call_stack.depth() - 1)
    }
}
