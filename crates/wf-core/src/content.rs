use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::WeftError;
use crate::path::Path;
use crate::value::RuntimeValue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugMetadata {
    pub source: String,
    pub start_line: usize,
    pub end_line: usize,
}

impl DebugMetadata {
    pub fn new(source: impl Into<String>, start_line: usize, end_line: usize) -> Self {
        Self {
            source: source.into(),
            start_line,
            end_line,
        }
    }

    pub fn line(&self, use_end_line: bool) -> usize {
        if use_end_line {
            self.end_line
        } else {
            self.start_line
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DivertTarget {
    Path(Path),
    Variable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divert {
    pub target: DivertTarget,
    pub is_function_call: bool,
}

impl Divert {
    pub fn to(path: Path) -> Self {
        Self {
            target: DivertTarget::Path(path),
            is_function_call: false,
        }
    }

    pub fn to_variable(name: impl Into<String>) -> Self {
        Self {
            target: DivertTarget::Variable(name.into()),
            is_function_call: false,
        }
    }

    pub fn function_call(path: Path) -> Self {
        Self {
            target: DivertTarget::Path(path),
            is_function_call: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Branch {
    pub true_divert: Option<Divert>,
    pub false_divert: Option<Divert>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlCommand {
    EvalStart,
    EvalEnd,
    EvalOutput,
    StackPush,
    StackPop,
    Duplicate,
    NoOp,
    ChoiceCount,
    SequenceCount,
    SequenceIncrement,
    SequenceShuffleIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeFunction {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Negate,
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
    Not,
    And,
    Or,
    Min,
    Max,
}

impl NativeFunction {
    pub const ALL: [NativeFunction; 17] = [
        Self::Add,
        Self::Subtract,
        Self::Multiply,
        Self::Divide,
        Self::Modulo,
        Self::Negate,
        Self::Equal,
        Self::NotEqual,
        Self::Greater,
        Self::Less,
        Self::GreaterOrEqual,
        Self::LessOrEqual,
        Self::Not,
        Self::And,
        Self::Or,
        Self::Min,
        Self::Max,
    ];

    pub fn from_name(name: &str) -> Result<Self, WeftError> {
        Self::ALL
            .into_iter()
            .find(|function| function.name() == name)
            .ok_or_else(|| {
                WeftError::new(
                    "GRAPH_NATIVE_UNKNOWN",
                    format!("Unknown native function \"{}\".", name),
                )
            })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Negate => "_",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Greater => ">",
            Self::Less => "<",
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
            Self::Not => "!",
            Self::And => "&&",
            Self::Or => "||",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Self::Negate | Self::Not => 1,
            _ => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub text: String,
    pub path_on_choice: Path,
    pub has_condition: bool,
}

impl Choice {
    pub fn new(text: impl Into<String>, path_on_choice: Path) -> Self {
        Self {
            text: text.into(),
            path_on_choice,
            has_condition: false,
        }
    }

    pub fn conditional(text: impl Into<String>, path_on_choice: Path) -> Self {
        Self {
            has_condition: true,
            ..Self::new(text, path_on_choice)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNode {
    pub message: String,
    pub use_end_line_number: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableAssignment {
    pub name: String,
    pub is_new_declaration: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    Text(String),
    Glue,
    Value(RuntimeValue),
    Divert(Divert),
    Branch(Branch),
    Control(ControlCommand),
    VariableReference(String),
    VariableAssignment(VariableAssignment),
    NativeCall(NativeFunction),
    Choice(Choice),
    Tag(String),
    Error(ErrorNode),
}

impl Leaf {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn newline() -> Self {
        Self::Text("\n".to_string())
    }

    pub fn value(value: impl Into<RuntimeValue>) -> Self {
        Self::Value(value.into())
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag(tag.into())
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::VariableReference(name.into())
    }

    pub fn declare(name: impl Into<String>) -> Self {
        Self::VariableAssignment(VariableAssignment {
            name: name.into(),
            is_new_declaration: true,
        })
    }

    pub fn assign(name: impl Into<String>) -> Self {
        Self::VariableAssignment(VariableAssignment {
            name: name.into(),
            is_new_declaration: false,
        })
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorNode {
            message: message.into(),
            use_end_line_number: false,
        })
    }

    pub fn is_control(&self) -> bool {
        matches!(
            self,
            Self::Control(_)
                | Self::Divert(_)
                | Self::Branch(_)
                | Self::VariableReference(_)
                | Self::VariableAssignment(_)
                | Self::NativeCall(_)
        )
    }
}

impl From<ControlCommand> for Leaf {
    fn from(command: ControlCommand) -> Self {
        Self::Control(command)
    }
}

impl From<NativeFunction> for Leaf {
    fn from(function: NativeFunction) -> Self {
        Self::NativeCall(function)
    }
}

impl From<Divert> for Leaf {
    fn from(divert: Divert) -> Self {
        Self::Divert(divert)
    }
}

impl From<Branch> for Leaf {
    fn from(branch: Branch) -> Self {
        Self::Branch(branch)
    }
}

impl From<Choice> for Leaf {
    fn from(choice: Choice) -> Self {
        Self::Choice(choice)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Container(Container),
    Leaf(Leaf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub content: Content,
    pub metadata: Option<DebugMetadata>,
}

impl Node {
    pub fn with_metadata(mut self, metadata: DebugMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl From<Leaf> for Node {
    fn from(leaf: Leaf) -> Self {
        Self {
            content: Content::Leaf(leaf),
            metadata: None,
        }
    }
}

impl From<Container> for Node {
    fn from(container: Container) -> Self {
        Self {
            content: Content::Container(container),
            metadata: None,
        }
    }
}

impl From<ControlCommand> for Node {
    fn from(command: ControlCommand) -> Self {
        Leaf::from(command).into()
    }
}

impl From<NativeFunction> for Node {
    fn from(function: NativeFunction) -> Self {
        Leaf::from(function).into()
    }
}

impl From<Divert> for Node {
    fn from(divert: Divert) -> Self {
        Leaf::from(divert).into()
    }
}

impl From<Branch> for Node {
    fn from(branch: Branch) -> Self {
        Leaf::from(branch).into()
    }
}

impl From<Choice> for Node {
    fn from(choice: Choice) -> Self {
        Leaf::from(choice).into()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Container {
    pub name: Option<String>,
    pub content: Vec<Node>,
    pub named_only: BTreeMap<String, Node>,
    pub count_visits_for_sequencing: bool,
    pub metadata: Option<DebugMetadata>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn counting_visits(mut self) -> Self {
        self.count_visits_for_sequencing = true;
        self
    }

    pub fn with_metadata(mut self, metadata: DebugMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with(mut self, node: impl Into<Node>) -> Self {
        self.push(node);
        self
    }

    pub fn with_all<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.content.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn with_named_only(mut self, name: impl Into<String>, node: impl Into<Node>) -> Self {
        self.named_only.insert(name.into(), node.into());
        self
    }

    pub fn push(&mut self, node: impl Into<Node>) {
        self.content.push(node.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_function_names_round_trip() {
        for function in NativeFunction::ALL {
            assert_eq!(
                NativeFunction::from_name(function.name()).expect("known name"),
                function
            );
        }
        let error = NativeFunction::from_name("**").expect_err("unknown operator");
        assert_eq!(error.code, "GRAPH_NATIVE_UNKNOWN");
    }

    #[test]
    fn unary_operators_take_one_argument() {
        assert_eq!(NativeFunction::Negate.arity(), 1);
        assert_eq!(NativeFunction::Not.arity(), 1);
        assert_eq!(NativeFunction::Max.arity(), 2);
    }

    #[test]
    fn control_kinds_are_flagged() {
        assert!(Leaf::from(ControlCommand::EvalStart).is_control());
        assert!(Leaf::variable("x").is_control());
        assert!(!Leaf::text("hi").is_control());
        assert!(!Leaf::Glue.is_control());
        assert!(!Leaf::error("boom").is_control());
    }

    #[test]
    fn builder_keeps_order_and_named_only_children() {
        let container = Container::named("knot")
            .with(Leaf::text("a"))
            .with(ControlCommand::NoOp)
            .with_named_only("gather", Container::new().with(Leaf::text("b")));
        assert_eq!(container.content.len(), 2);
        assert!(container.named_only.contains_key("gather"));
        assert_eq!(container.name.as_deref(), Some("knot"));
    }

    #[test]
    fn metadata_line_selection() {
        let metadata = DebugMetadata::new("story.wf", 4, 7);
        assert_eq!(metadata.line(false), 4);
        assert_eq!(metadata.line(true), 7);
    }
}
