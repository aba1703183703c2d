use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace, warn};
use wf_core::{
    shuffle_index, Choice, Container, ContentGraph, ControlCommand, DebugMetadata, Divert,
    DivertTarget, Leaf, NativeFunction, NodeId, Path, RuntimeValue, WeftError,
};

mod callstack;
mod choices;
mod control;
mod diagnostics;
mod expression;
mod lifecycle;
mod native;
mod output;
mod snapshot;
mod step;

#[cfg(test)]
mod test_support;

pub use callstack::{CallStack, Frame};
pub use diagnostics::StoryWarning;
pub use native::evaluate_native;
pub use output::{OutputEntry, OutputStream};
pub use snapshot::{SnapshotFrame, StorySnapshot};

pub const DEFAULT_RANDOM_SEED: u32 = 1;
pub const DEFAULT_STEP_LIMIT: usize = 100_000;
pub const SNAPSHOT_SCHEMA_V1: &str = "story-snapshot.v1";

const STACK_UNDERFLOW: &str = "ENGINE_STACK_UNDERFLOW";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryOptions {
    pub random_seed: Option<u32>,
    pub step_limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingDivert {
    target: Path,
    is_function_call: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

#[derive(Debug)]
pub struct Story {
    graph: Arc<ContentGraph>,
    story_seed: u32,
    step_limit: usize,

    call_stack: CallStack,
    evaluation_stack: Vec<RuntimeValue>,
    output: OutputStream,
    sequence_counts: BTreeMap<String, i64>,

    previous_path: Option<Path>,
    pending_divert: Option<PendingDivert>,
    pending_stack_push: bool,
    temporary_frame: Option<usize>,

    last_error: Option<WeftError>,
    warnings: Vec<StoryWarning>,
}
