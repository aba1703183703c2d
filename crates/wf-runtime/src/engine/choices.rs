use super::*;

impl Story {
    pub fn choose_choice_index(&mut self, index: usize) -> Result<(), WeftError> {
        let choices = self.output.current_choices();
        let Some(choice) = choices.get(index) else {
            return Err(WeftError::new(
                "ENGINE_CHOICE_INDEX",
                format!(
                    "Choice index {} is out of range; {} choices are available.",
                    index,
                    choices.len()
                ),
            ));
        };
        let text = choice.text.clone();
        let target = choice.path_on_choice.clone();

        let destination = self.divert_destination(&target)?;
        debug!(index, text = %text, target = %target, "choice chosen");
        self.output.push_chosen_choice(index);
        self.call_stack.set_current_path(Some(destination));
        Ok(())
    }

    pub fn continue_with_choice_index(&mut self, index: usize) -> Result<String, WeftError> {
        self.choose_choice_index(index)?;
        self.continue_story()
    }

    pub fn choose_path_string(&mut self, path: &str) -> Result<(), WeftError> {
        let target: Path = path.parse()?;
        let destination = self.divert_destination(&target)?;
        debug!(target = %target, "divert by path string");
        self.call_stack.set_current_path(Some(destination));
        Ok(())
    }
}
