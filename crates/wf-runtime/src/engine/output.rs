use super::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OutputEntry {
    Text {
        text: String,
        metadata: Option<DebugMetadata>,
    },
    Glue,
    Tag {
        tag: String,
    },
    Choice {
        choice: Choice,
        metadata: Option<DebugMetadata>,
    },
    ChosenChoice {
        index: usize,
    },
}

impl OutputEntry {
    fn is_newline(&self) -> bool {
        matches!(self, Self::Text { text, .. } if text == "\n")
    }

    fn metadata(&self) -> Option<&DebugMetadata> {
        match self {
            Self::Text { metadata, .. } | Self::Choice { metadata, .. } => metadata.as_ref(),
            _ => None,
        }
    }
}

/// Append-only event log with newline collapsing and glue.
///
/// Never holds two newline entries in a row. Glue removes the newline right before
/// it, and is itself removed by the next non-glue content. Tags are transparent to
/// both rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputStream {
    entries: Vec<OutputEntry>,
}

impl OutputStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn from_entries(entries: Vec<OutputEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[OutputEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn last_content_index(&self) -> Option<usize> {
        self.entries
            .iter()
            .rposition(|entry| !matches!(entry, OutputEntry::Tag { .. }))
    }

    fn ends_in_newline(&self) -> bool {
        self.last_content_index()
            .is_some_and(|index| self.entries[index].is_newline())
    }

    fn ends_in_glue(&self) -> bool {
        self.last_content_index()
            .is_some_and(|index| matches!(self.entries[index], OutputEntry::Glue))
    }

    fn remove_trailing_glue(&mut self) {
        if let Some(index) = self.last_content_index() {
            if matches!(self.entries[index], OutputEntry::Glue) {
                self.entries.remove(index);
            }
        }
    }

    fn push_newline(&mut self, metadata: Option<DebugMetadata>) {
        self.entries.push(OutputEntry::Text {
            text: "\n".to_string(),
            metadata,
        });
    }

    pub fn push_text(&mut self, text: &str, metadata: Option<DebugMetadata>) {
        if text.is_empty() {
            return;
        }
        let body = text.trim_matches('\n');
        let leading = text.starts_with('\n');
        let trailing = !body.is_empty() && text.ends_with('\n');

        if leading && !self.ends_in_newline() && !self.ends_in_glue() {
            self.push_newline(metadata.clone());
        }
        if !body.is_empty() {
            self.remove_trailing_glue();
            self.entries.push(OutputEntry::Text {
                text: body.to_string(),
                metadata: metadata.clone(),
            });
        }
        if trailing {
            self.push_newline(metadata);
        }
    }

    pub fn push_glue(&mut self) {
        if let Some(index) = self.last_content_index() {
            if self.entries[index].is_newline() {
                self.entries.remove(index);
            }
        }
        if !self.ends_in_glue() {
            self.entries.push(OutputEntry::Glue);
        }
    }

    pub fn push_tag(&mut self, tag: &str) {
        self.entries.push(OutputEntry::Tag {
            tag: tag.to_string(),
        });
    }

    pub fn push_choice(&mut self, choice: Choice, metadata: Option<DebugMetadata>) {
        self.remove_trailing_glue();
        self.entries.push(OutputEntry::Choice { choice, metadata });
    }

    pub fn push_chosen_choice(&mut self, index: usize) {
        self.remove_trailing_glue();
        self.entries.push(OutputEntry::ChosenChoice { index });
    }

    fn since_last_chosen(&self) -> &[OutputEntry] {
        let start = self
            .entries
            .iter()
            .rposition(|entry| matches!(entry, OutputEntry::ChosenChoice { .. }))
            .map(|index| index + 1)
            .unwrap_or(0);
        &self.entries[start..]
    }

    pub fn current_text(&self) -> String {
        self.since_last_chosen()
            .iter()
            .filter_map(|entry| match entry {
                OutputEntry::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn current_choices(&self) -> Vec<&Choice> {
        self.since_last_chosen()
            .iter()
            .filter_map(|entry| match entry {
                OutputEntry::Choice { choice, .. } => Some(choice),
                _ => None,
            })
            .collect()
    }

    pub fn current_tags(&self) -> Vec<&str> {
        self.since_last_chosen()
            .iter()
            .filter_map(|entry| match entry {
                OutputEntry::Tag { tag } => Some(tag.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn last_metadata(&self) -> Option<&DebugMetadata> {
        self.entries.iter().rev().find_map(OutputEntry::metadata)
    }
}
