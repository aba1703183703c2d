use super::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFrame {
    pub path: Option<String>,
    pub in_expression_evaluation: bool,
    pub variables: BTreeMap<String, RuntimeValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorySnapshot {
    pub schema_version: String,
    pub story_seed: u32,
    pub frames: Vec<SnapshotFrame>,
    pub evaluation_stack: Vec<RuntimeValue>,
    pub sequence_counts: BTreeMap<String, i64>,
    pub output: Vec<OutputEntry>,
}

impl Story {
    pub fn snapshot(&self) -> StorySnapshot {
        StorySnapshot {
            schema_version: SNAPSHOT_SCHEMA_V1.to_string(),
            story_seed: self.story_seed,
            frames: self
                .call_stack
                .frames()
                .iter()
                .map(|frame| SnapshotFrame {
                    path: frame.path.as_ref().map(Path::to_string),
                    in_expression_evaluation: frame.in_expression_evaluation,
                    variables: frame.variables.clone(),
                })
                .collect(),
            evaluation_stack: self.evaluation_stack.clone(),
            sequence_counts: self.sequence_counts.clone(),
            output: self.output.entries().to_vec(),
        }
    }

    pub fn resume(&mut self, snapshot: StorySnapshot) -> Result<(), WeftError> {
        if snapshot.schema_version != SNAPSHOT_SCHEMA_V1 {
            return Err(WeftError::new(
                "SNAPSHOT_SCHEMA",
                format!(
                    "Unsupported snapshot schema \"{}\", expected \"{}\".",
                    snapshot.schema_version, SNAPSHOT_SCHEMA_V1
                ),
            ));
        }
        if snapshot.frames.is_empty() {
            return Err(WeftError::new(
                "SNAPSHOT_EMPTY",
                "Snapshot has no call-stack frames.",
            ));
        }

        let mut frames = Vec::with_capacity(snapshot.frames.len());
        for frame in snapshot.frames {
            let path = match frame.path {
                Some(raw) => Some(raw.parse::<Path>().map_err(|error| {
                    WeftError::new(
                        "SNAPSHOT_PATH",
                        format!("Snapshot frame path is invalid: {}", error.message),
                    )
                })?),
                None => None,
            };
            frames.push(Frame {
                path,
                in_expression_evaluation: frame.in_expression_evaluation,
                variables: frame.variables,
            });
        }

        self.call_stack = CallStack::from_frames(frames)?;
        self.story_seed = snapshot.story_seed;
        self.evaluation_stack = snapshot.evaluation_stack;
        self.sequence_counts = snapshot.sequence_counts;
        self.output = OutputStream::from_entries(snapshot.output);
        self.previous_path = None;
        self.pending_divert = None;
        self.pending_stack_push = false;
        self.last_error = None;
        debug!(
            depth = self.call_stack.depth(),
            seed = self.story_seed,
            "story resumed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::test_support::*;
    use super::*;

    fn choice_story() -> Container {
        Container::new()
            .with_all(eval_block(vec![
                Leaf::value(RuntimeValue::Int(2)).into(),
                Leaf::declare("keys").into(),
            ]))
            .with(Leaf::text("A door."))
            .with(Choice::new("Open", p("open")))
            .with_named_only(
                "open",
                Container::named("open")
                    .with(Leaf::text("It opens with "))
                    .with_all(eval_block(vec![
                        Leaf::variable("keys").into(),
                        ControlCommand::EvalOutput.into(),
                    ]))
                    .with(Leaf::text(" keys.")),
            )
    }

    #[test]
    fn snapshot_survives_json_and_resumes() {
        let mut story = story_from(choice_story());
        story.continue_story().expect("continue");

        let snapshot = story.snapshot();
        let json = serde_json::to_string(&snapshot).expect("snapshot should serialize");
        let decoded: StorySnapshot =
            serde_json::from_str(&json).expect("snapshot should deserialize");
        assert_eq!(decoded, snapshot);

        let mut resumed = story_from(choice_story());
        resumed.resume(decoded).expect("snapshot should resume");
        assert_eq!(resumed.current_text(), "A door.");
        assert_eq!(resumed.current_choices().len(), 1);
        assert_eq!(
            resumed.continue_with_choice_index(0).expect("choice"),
            "It opens with 2 keys."
        );
    }

    #[test]
    fn snapshot_json_uses_dotted_paths_and_schema() {
        let mut story = story_from(choice_story());
        story.continue_story().expect("continue");
        story.choose_choice_index(0).expect("choice");
        let json = serde_json::to_value(story.snapshot())
            .expect("snapshot should serialize");
        assert_eq!(json["schemaVersion"], "story-snapshot.v1");
        assert_eq!(json["frames"][0]["path"], "open.0");
        assert_eq!(json["frames"][0]["variables"]["keys"]["int"], 2);
    }

    #[test]
    fn resume_rejects_bad_snapshots_and_keeps_state() {
        let mut story = story_from(choice_story());
        story.continue_story().expect("continue");
        let good = story.snapshot();

        let mut wrong_schema = good.clone();
        wrong_schema.schema_version = "story-snapshot.v0".to_string();
        let error = story.resume(wrong_schema).expect_err("schema");
        assert_eq!(error.code, "SNAPSHOT_SCHEMA");

        let mut no_frames = good.clone();
        no_frames.frames.clear();
        let error = story.resume(no_frames).expect_err("frames");
        assert_eq!(error.code, "SNAPSHOT_EMPTY");

        let mut bad_path = good.clone();
        bad_path.frames[0].path = Some("not a path".to_string());
        let error = story.resume(bad_path).expect_err("path");
        assert_eq!(error.code, "SNAPSHOT_PATH");

        assert_eq!(story.snapshot(), good);
    }

    #[test]
    fn shuffle_continues_identically_after_resume() {
        let letters = ["A", "B", "C", "D"];
        let mut straight = story_from(choice_sequence(SequenceKind::Shuffle, &letters));
        let expected = play_choices(&mut straight, 6);

        let mut first_half = story_from(choice_sequence(SequenceKind::Shuffle, &letters));
        let mut resumed_run = play_choices(&mut first_half, 3);
        let json = serde_json::to_string(&first_half.snapshot())
            .expect("snapshot should serialize");

        let mut resumed = story_from(choice_sequence(SequenceKind::Shuffle, &letters));
        resumed
            .resume(serde_json::from_str(&json).expect("snapshot should deserialize"))
            .expect("resume");
        for _ in 0..3 {
            resumed_run.push(resumed.continue_with_choice_index(0).expect("choice"));
        }

        assert_eq!(resumed_run, expected);
        assert_eq!(resumed.visit_count("4"), 6);
    }
}
