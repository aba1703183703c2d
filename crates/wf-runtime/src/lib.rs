mod engine;

pub use engine::{
    evaluate_native, CallStack, Frame, OutputEntry, OutputStream, SnapshotFrame, Story,
    StoryOptions, StorySnapshot, StoryWarning, DEFAULT_RANDOM_SEED, DEFAULT_STEP_LIMIT,
    SNAPSHOT_SCHEMA_V1,
};
