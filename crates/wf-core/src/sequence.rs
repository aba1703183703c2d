use crate::error::WeftError;
use crate::rng::next_random_bounded;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    Stopping,
    Cycle,
    Once,
    Shuffle,
}

impl SequenceKind {
    pub fn chosen_index(self, count: usize, element_count: usize) -> Option<usize> {
        if element_count == 0 {
            return None;
        }
        match self {
            Self::Stopping => Some(count.min(element_count - 1)),
            Self::Cycle => Some(count % element_count),
            Self::Once => (count < element_count).then_some(count),
            Self::Shuffle => None,
        }
    }
}

pub const MAX_SHUFFLE_ELEMENTS: i64 = 1 << 16;

/// Deterministic shuffle pick for a sequence container.
///
/// The permutation for loop `count / element_count` is rebuilt from scratch on every
/// call, seeded by the character sum of `sequence_path`, the loop index and
/// `story_seed`. Only `count` needs to be persisted to reproduce the order.
pub fn shuffle_index(
    sequence_path: &str,
    count: i64,
    element_count: i64,
    story_seed: u32,
) -> Result<i64, WeftError> {
    if element_count <= 0 {
        return Err(WeftError::new(
            "ENGINE_SHUFFLE_EMPTY",
            format!(
                "Shuffle in \"{}\" needs a positive element count, got {}.",
                sequence_path, element_count
            ),
        ));
    }
    if element_count > MAX_SHUFFLE_ELEMENTS {
        return Err(WeftError::new(
            "ENGINE_SHUFFLE_TOO_LARGE",
            format!(
                "Shuffle in \"{}\" has {} elements; at most {} are supported.",
                sequence_path, element_count, MAX_SHUFFLE_ELEMENTS
            ),
        ));
    }
    if count < 0 {
        return Err(WeftError::new(
            "ENGINE_SHUFFLE_COUNT",
            format!("Shuffle in \"{}\" got negative count {}.", sequence_path, count),
        ));
    }

    let loop_index = count / element_count;
    let iteration_index = count % element_count;
    let path_hash = sequence_path
        .chars()
        .fold(0u32, |hash, ch| hash.wrapping_add(ch as u32));
    let mut state = path_hash
        .wrapping_add(loop_index as u32)
        .wrapping_add(story_seed);

    let mut unpicked = (0..element_count).collect::<Vec<_>>();
    let mut picked = 0;
    for _ in 0..=iteration_index {
        let remaining = u32::try_from(unpicked.len()).map_err(|_| {
            WeftError::new(
                "ENGINE_SHUFFLE_TOO_LARGE",
                format!("Shuffle in \"{}\" has too many elements.", sequence_path),
            )
        })?;
        let slot = next_random_bounded(&mut state, remaining) as usize;
        picked = unpicked.remove(slot);
    }
    Ok(picked)
}
