use super::*;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub path: Option<Path>,
    pub in_expression_evaluation: bool,
    pub variables: BTreeMap<String, RuntimeValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallStack {
    frames: Vec<Frame>,
}

impl CallStack {
    pub fn new(start: Option<Path>) -> Self {
        Self {
            frames: vec![Frame {
                path: start,
                ..Frame::default()
            }],
        }
    }

    pub(super) fn from_frames(frames: Vec<Frame>) -> Result<Self, WeftError> {
        if frames.is_empty() {
            return Err(WeftError::new(
                "ENGINE_CALL_STACK_EMPTY",
                "A call stack needs at least one frame.",
            ));
        }
        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn can_pop(&self) -> bool {
        self.frames.len() > 1
    }

    pub fn current(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    pub fn current_mut(&mut self) -> &mut Frame {
        let top = self.frames.len() - 1;
        &mut self.frames[top]
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current().path.as_ref()
    }

    pub fn set_current_path(&mut self, path: Option<Path>) {
        self.current_mut().path = path;
    }

    pub fn push(&mut self) {
        let path = self.current().path.clone();
        self.frames.push(Frame {
            path,
            ..Frame::default()
        });
    }

    pub fn pop(&mut self) -> Result<Frame, WeftError> {
        if !self.can_pop() {
            return Err(WeftError::new(
                STACK_UNDERFLOW,
                "Cannot pop the bottom call-stack frame.",
            ));
        }
        Ok(self.frames.remove(self.frames.len() - 1))
    }

    pub fn get_variable(&self, name: &str) -> Result<RuntimeValue, WeftError> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.variables.get(name))
            .cloned()
            .ok_or_else(|| {
                WeftError::new(
                    "ENGINE_UNINITIALIZED_VARIABLE",
                    format!("Variable \"{}\" is not initialized.", name),
                )
            })
    }

    pub fn is_declared_in_current_frame(&self, name: &str) -> bool {
        self.current().variables.contains_key(name)
    }

    /// A declaration binds in the current frame, or in the frame beneath it when
    /// `prioritise_higher_frame` is set. A plain assignment updates the closest
    /// existing binding.
    pub fn set_variable(
        &mut self,
        name: &str,
        value: RuntimeValue,
        is_new_declaration: bool,
        prioritise_higher_frame: bool,
    ) -> Result<(), WeftError> {
        if is_new_declaration {
            let top = self.frames.len() - 1;
            let index = if prioritise_higher_frame && top > 0 {
                top - 1
            } else {
                top
            };
            self.frames[index].variables.insert(name.to_string(), value);
            return Ok(());
        }

        let slot = self
            .frames
            .iter_mut()
            .rev()
            .find_map(|frame| frame.variables.get_mut(name))
            .ok_or_else(|| {
                WeftError::new(
                    "ENGINE_UNKNOWN_VARIABLE",
                    format!("Cannot assign to undeclared variable \"{}\".", name),
                )
            })?;
        *slot = value;
        Ok(())
    }
}
