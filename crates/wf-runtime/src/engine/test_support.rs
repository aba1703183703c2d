use super::*;

pub(crate) use wf_core::{Branch, Node, SequenceKind};

pub(crate) fn p(raw: &str) -> Path {
    raw.parse().expect("test path should parse")
}

pub(crate) fn story_from(root: Container) -> Story {
    Story::from_root(
        root,
        StoryOptions {
            random_seed: Some(1),
            step_limit: None,
        },
    )
    .expect("test graph should build")
}

pub(crate) fn eval_block(nodes: Vec<Node>) -> Vec<Node> {
    let mut block = Vec::with_capacity(nodes.len() + 2);
    block.push(ControlCommand::EvalStart.into());
    block.extend(nodes);
    block.push(ControlCommand::EvalEnd.into());
    block
}

fn int(value: i64) -> Node {
    Leaf::value(RuntimeValue::Int(value)).into()
}

const PICK: &str = "pick";

pub(crate) fn sequence_container(kind: SequenceKind, elements: &[&str], at: usize) -> Container {
    let n = elements.len() as i64;
    let index_expression: Vec<Node> = match kind {
        SequenceKind::Stopping => vec![
            ControlCommand::SequenceCount.into(),
            int(n - 1),
            NativeFunction::Min.into(),
        ],
        SequenceKind::Cycle => vec![
            ControlCommand::SequenceCount.into(),
            int(n),
            NativeFunction::Modulo.into(),
        ],
        SequenceKind::Once => vec![ControlCommand::SequenceCount.into()],
        SequenceKind::Shuffle => vec![int(n), ControlCommand::SequenceShuffleIndex.into()],
    };
    let expression_len = index_expression.len();

    let mut choose = index_expression;
    choose.push(Leaf::assign(PICK).into());
    let mut container = Container::new().counting_visits().with_all(eval_block(choose));

    let rejoin = expression_len + 3 + elements.len() * 6;
    for (index, element) in elements.iter().enumerate() {
        let branch_name = format!("s{}", index);
        container = container
            .with_all(eval_block(vec![
                Leaf::variable(PICK).into(),
                int(index as i64),
                NativeFunction::Equal.into(),
            ]))
            .with(Branch {
                true_divert: Some(Divert::to(p(&format!("{}.{}", at, branch_name)))),
                false_divert: None,
            })
            .with_named_only(
                branch_name,
                Container::new()
                    .with(Leaf::text(*element))
                    .with(Divert::to(p(&format!("{}.{}", at, rejoin)))),
            );
    }
    container
        .with(ControlCommand::NoOp)
        .with(ControlCommand::SequenceIncrement)
}

fn declare_pick() -> Vec<Node> {
    vec![int(-1), Leaf::declare(PICK).into()]
}

pub(crate) fn looping_sequence(kind: SequenceKind, elements: &[&str], times: i64) -> Container {
    let mut prelude = declare_pick();
    prelude.push(int(0));
    prelude.push(Leaf::declare("i").into());
    Container::new()
        .with_all(eval_block(prelude))
        .with(sequence_container(kind, elements, 6))
        .with_all(eval_block(vec![
            Leaf::variable("i").into(),
            int(1),
            NativeFunction::Add.into(),
            Leaf::assign("i").into(),
            Leaf::variable("i").into(),
            int(times),
            NativeFunction::Less.into(),
        ]))
        .with(Branch {
            true_divert: Some(Divert::to(p("6"))),
            false_divert: None,
        })
}

pub(crate) fn choice_sequence(kind: SequenceKind, elements: &[&str]) -> Container {
    Container::new()
        .with_all(eval_block(declare_pick()))
        .with(sequence_container(kind, elements, 4))
        .with(Choice::new("Again", p("4")))
}

pub(crate) fn play_choices(story: &mut Story, turns: usize) -> Vec<String> {
    let mut texts = Vec::with_capacity(turns);
    for turn in 0..turns {
        let text = if turn == 0 {
            story.continue_story()
        } else {
            story.continue_with_choice_index(0)
        };
        texts.push(text.expect("turn should run"));
    }
    texts
}

pub(crate) fn drive_to_end(story: &mut Story) -> Vec<String> {
    let mut texts = vec![story.continue_story().expect("first turn should run")];
    for _ in 0..1_000 {
        if story.current_choices().is_empty() {
            break;
        }
        texts.push(
            story
                .continue_with_choice_index(0)
                .expect("choice should run"),
        );
    }
    texts
}
