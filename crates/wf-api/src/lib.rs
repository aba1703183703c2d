use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use wf_core::{Container, ContentGraph, WeftError};
use wf_runtime::{Story, StoryOptions, StorySnapshot};

#[derive(Debug, Clone, Default)]
pub struct CreateStoryOptions {
    pub root: Container,
    pub entry_path: Option<String>,
    pub options: StoryOptions,
}

#[derive(Debug, Clone)]
pub struct ResumeStoryOptions {
    pub root: Container,
    pub snapshot: StorySnapshot,
    pub options: StoryOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub text: String,
    pub tags: Vec<String>,
    pub choices: Vec<String>,
    pub ended: bool,
}

pub fn create_story(options: CreateStoryOptions) -> Result<Story, WeftError> {
    let graph = Arc::new(ContentGraph::from_root(options.root)?);
    let mut story = Story::new(graph, options.options);

    if let Some(entry) = options.entry_path {
        story.choose_path_string(&entry).map_err(|error| {
            WeftError::new(
                "API_ENTRY_PATH_NOT_FOUND",
                format!("Entry path \"{}\" is not usable: {}", entry, error.message),
            )
        })?;
    }
    debug!(seed = story.story_seed(), "story ready");
    Ok(story)
}

pub fn resume_story(options: ResumeStoryOptions) -> Result<Story, WeftError> {
    let mut story = Story::from_root(options.root, options.options)?;
    story.resume(options.snapshot)?;
    Ok(story)
}

pub fn play_turn(story: &mut Story) -> Result<Turn, WeftError> {
    while story.can_continue() {
        story.continue_story()?;
    }
    Ok(Turn {
        text: story.current_text(),
        tags: story
            .current_tags()
            .into_iter()
            .map(str::to_string)
            .collect(),
        choices: story
            .current_choices()
            .into_iter()
            .map(|choice| choice.text.clone())
            .collect(),
        ended: story.has_ended(),
    })
}

pub fn choose_and_play(story: &mut Story, index: usize) -> Result<Turn, WeftError> {
    story.choose_choice_index(index)?;
    play_turn(story)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_core::{Choice, Leaf, Path};

    fn path(raw: &str) -> Path {
        raw.parse().expect("path should parse")
    }

    fn greeting() -> Container {
        Container::new()
            .with(Leaf::tag("scene:door"))
            .with(Leaf::text("Someone knocks."))
            .with(Choice::new("Answer", path("answer")))
            .with(Choice::new("Ignore", path("ignore")))
            .with_named_only(
                "answer",
                Container::named("answer").with(Leaf::text("It is the postman.")),
            )
            .with_named_only(
                "ignore",
                Container::named("ignore").with(Leaf::text("The knocking stops.")),
            )
    }

    #[test]
    fn create_story_plays_first_turn() {
        let mut story = create_story(CreateStoryOptions {
            root: greeting(),
            ..CreateStoryOptions::default()
        })
        .expect("story should build");

        let turn = play_turn(&mut story).expect("turn should run");
        assert_eq!(turn.text, "Someone knocks.");
        assert_eq!(turn.tags, ["scene:door"]);
        assert_eq!(turn.choices, ["Answer", "Ignore"]);
        assert!(!turn.ended);
    }

    #[test]
    fn create_story_honours_entry_path() {
        let mut story = create_story(CreateStoryOptions {
            root: greeting(),
            entry_path: Some("ignore".to_string()),
            options: StoryOptions::default(),
        })
        .expect("story should build");
        let turn = play_turn(&mut story).expect("turn should run");
        assert_eq!(turn.text, "The knocking stops.");
        assert!(turn.ended);
    }

    #[test]
    fn create_story_rejects_unknown_entry_path() {
        let error = create_story(CreateStoryOptions {
            root: greeting(),
            entry_path: Some("cellar".to_string()),
            options: StoryOptions::default(),
        })
        .expect_err("unknown entry should fail");
        assert_eq!(error.code, "API_ENTRY_PATH_NOT_FOUND");
    }

    #[test]
    fn choose_and_play_reports_the_next_turn() {
        let mut story = create_story(CreateStoryOptions {
            root: greeting(),
            ..CreateStoryOptions::default()
        })
        .expect("story should build");
        play_turn(&mut story).expect("turn should run");

        let turn = choose_and_play(&mut story, 0).expect("choice should run");
        assert_eq!(turn.text, "It is the postman.");
        assert!(turn.tags.is_empty());
        assert!(turn.ended);
    }

    #[test]
    fn resume_story_restores_a_snapshot() {
        let mut story = create_story(CreateStoryOptions {
            root: greeting(),
            ..CreateStoryOptions::default()
        })
        .expect("story should build");
        play_turn(&mut story).expect("turn should run");
        let snapshot = story.snapshot();

        let mut resumed = resume_story(ResumeStoryOptions {
            root: greeting(),
            snapshot,
            options: StoryOptions::default(),
        })
        .expect("story should resume");
        let turn = choose_and_play(&mut resumed, 1).expect("choice should run");
        assert_eq!(turn.text, "The knocking stops.");
    }

    #[test]
    fn turn_serializes_in_camel_case() {
        let turn = Turn {
            text: "Hi".to_string(),
            tags: vec![],
            choices: vec!["Go".to_string()],
            ended: false,
        };
        let json = serde_json::to_value(&turn).expect("turn should serialize");
        assert_eq!(json["choices"][0], "Go");
        assert_eq!(json["ended"], false);
    }
}
