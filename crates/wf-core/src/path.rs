use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::WeftError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Component {
    Index(usize),
    Name(String),
}

impl Component {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Name(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Index(_) => None,
            Self::Name(name) => Some(name.as_str()),
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{}", index),
            Self::Name(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Path {
    components: Vec<Component>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn head(&self) -> Option<&Component> {
        self.components.first()
    }

    pub fn tail(&self) -> Path {
        Self {
            components: self.components.iter().skip(1).cloned().collect(),
        }
    }

    pub fn last_component(&self) -> Option<&Component> {
        self.components.last()
    }

    pub fn parent(&self) -> Option<Path> {
        if self.components.is_empty() {
            return None;
        }
        Some(Self {
            components: self.components[..self.components.len() - 1].to_vec(),
        })
    }

    pub fn with_component(&self, component: Component) -> Path {
        let mut components = self.components.clone();
        components.push(component);
        Self { components }
    }

    pub fn with_index(&self, index: usize) -> Path {
        self.with_component(Component::Index(index))
    }

    pub fn with_name(&self, name: impl Into<String>) -> Path {
        self.with_component(Component::Name(name.into()))
    }

    pub fn join(&self, relative: &Path) -> Path {
        let mut components = self.components.clone();
        components.extend(relative.components.iter().cloned());
        Self { components }
    }

    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.components.starts_with(&prefix.components)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, component) in self.components.iter().enumerate() {
            if index > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", component)?;
        }
        Ok(())
    }
}

fn name_regex() -> &'static Regex {
    static NAME: OnceLock<Regex> = OnceLock::new();
    NAME.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-]*$").expect("path name regex must compile")
    })
}

impl FromStr for Path {
    type Err = WeftError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        let mut components = Vec::new();
        for part in trimmed.split('.') {
            if let Ok(index) = part.parse::<usize>() {
                components.push(Component::Index(index));
                continue;
            }
            if !name_regex().is_match(part) {
                return Err(WeftError::new(
                    "PATH_PARSE",
                    format!("Invalid path component \"{}\" in \"{}\".", part, raw),
                ));
            }
            components.push(Component::Name(part.to_string()));
        }
        Ok(Self { components })
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.to_string()
    }
}

impl TryFrom<String> for Path {
    type Error = WeftError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<Vec<Component>> for Path {
    fn from(components: Vec<Component>) -> Self {
        Self::new(components)
    }
}
