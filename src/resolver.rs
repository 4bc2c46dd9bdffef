use tracing::debug;

use crate::deck::Face;
use crate::session::{FaceStatus, SessionState};
use crate::sound::SoundPlayer;
use crate::timer::TimerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Verdict {
    Match,
    Mismatch,
}

/// A judged selection waiting for its delayed cleanup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingResolution {
    pub timer: TimerId,
    pub first: usize,
    pub second: usize,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cleanup {
    /// Both faces went back to idle
    Reverted,
    /// Both faces were taken off the board
    Removed { board_cleared: bool },
}

pub fn judge(faces: &[Face], first: usize, second: usize) -> Verdict {
    match (faces.get(first), faces.get(second)) {
        (Some(a), Some(b)) if first != second && a.pair_id == b.pair_id => Verdict::Match,
        _ => Verdict::Mismatch,
    }
}

/// Mark both faces with the verdict and trigger the matching sound.
/// The selection is left untouched until [`finish`] runs.
pub fn begin(
    state: &mut SessionState,
    first: usize,
    second: usize,
    sound: &mut dyn SoundPlayer,
) -> Verdict {
    let verdict = judge(&state.faces, first, second);
    let status = match verdict {
        Verdict::Match => FaceStatus::Success,
        Verdict::Mismatch => FaceStatus::Failure,
    };
    state.status_by_index.insert(first, status);
    state.status_by_index.insert(second, status);

    match verdict {
        Verdict::Match => {
            state.tally.matches += 1;
            sound.play_success();
        }
        Verdict::Mismatch => {
            state.tally.mismatches += 1;
            sound.play_failure();
        }
    }

    debug!(first, second, %verdict, "selection judged");
    verdict
}

/// Delayed half of a resolution: remove matched faces or flip mismatched
/// ones back, then clear the selection.
pub fn finish(state: &mut SessionState, pending: &PendingResolution) -> Cleanup {
    let cleanup = match pending.verdict {
        Verdict::Match => {
            remove_faces(state, pending.first, pending.second);
            Cleanup::Removed {
                board_cleared: state.faces.is_empty(),
            }
        }
        Verdict::Mismatch => {
            state.status_by_index.remove(&pending.first);
            state.status_by_index.remove(&pending.second);
            Cleanup::Reverted
        }
    };
    state.selection.clear();

    debug!(?cleanup, remaining = state.faces.len(), "resolution cleaned up");
    cleanup
}

fn remove_faces(state: &mut SessionState, first: usize, second: usize) {
    let (low, high) = if first < second {
        (first, second)
    } else {
        (second, first)
    };
    if high >= state.faces.len() || low == high {
        return;
    }

    state.faces.remove(high);
    state.faces.remove(low);

    // Status entries are keyed by index, so anything after a removed face shifts down
    let shifted = state
        .status_by_index
        .drain()
        .filter(|(idx, _)| *idx != low && *idx != high)
        .map(|(idx, status)| {
            let offset = usize::from(idx > low) + usize::from(idx > high);
            (idx - offset, status)
        })
        .collect();
    state.status_by_index = shifted;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::{Pair, Side};
    use crate::sound::RecordingSound;
    use crate::timer::Scheduler;
    use std::time::Duration;

    fn face(value: &str, pair_id: &str, side: Side) -> Face {
        Face {
            value: value.to_string(),
            pair_id: pair_id.to_string(),
            side,
        }
    }

    fn pending(first: usize, second: usize, verdict: Verdict) -> PendingResolution {
        let mut scheduler = Scheduler::new();
        PendingResolution {
            timer: scheduler.once(Duration::from_millis(500), ()),
            first,
            second,
            verdict,
        }
    }

    fn state() -> SessionState {
        // a-term, b-term, a-def, b-def
        SessionState::new(vec![
            face("cat", "a", Side::Term),
            face("dog", "b", Side::Term),
            face("feline", "a", Side::Definition),
            face("canine", "b", Side::Definition),
        ])
    }

    #[test]
    fn test_judge() {
        let s = state();
        assert_eq!(judge(&s.faces, 0, 2), Verdict::Match);
        assert_eq!(judge(&s.faces, 0, 1), Verdict::Mismatch);
        assert_eq!(judge(&s.faces, 0, 0), Verdict::Mismatch);
        assert_eq!(judge(&s.faces, 0, 9), Verdict::Mismatch);
    }

    #[test]
    fn test_begin_match_marks_success_and_plays() {
        let mut s = state();
        s.selection = vec![0, 2];
        let mut sound = RecordingSound::default();

        assert_eq!(begin(&mut s, 0, 2, &mut sound), Verdict::Match);
        assert_eq!(s.status(0), FaceStatus::Success);
        assert_eq!(s.status(2), FaceStatus::Success);
        assert_eq!(s.selection, vec![0, 2]);
        assert_eq!(sound.successes, 1);
        assert_eq!(sound.failures, 0);
        assert_eq!(s.tally.matches, 1);
    }

    #[test]
    fn test_begin_mismatch_marks_failure_and_plays() {
        let mut s = state();
        let mut sound = RecordingSound::default();

        assert_eq!(begin(&mut s, 1, 2, &mut sound), Verdict::Mismatch);
        assert_eq!(s.status(1), FaceStatus::Failure);
        assert_eq!(s.status(2), FaceStatus::Failure);
        assert_eq!(sound.failures, 1);
        assert_eq!(s.tally.mismatches, 1);
    }

    #[test]
    fn test_finish_match_removes_faces() {
        let mut s = state();
        s.selection = vec![2, 0];
        let mut sound = RecordingSound::default();
        let verdict = begin(&mut s, 2, 0, &mut sound);

        let resolution = pending(2, 0, verdict);
        let cleanup = finish(&mut s, &resolution);

        assert_eq!(
            cleanup,
            Cleanup::Removed {
                board_cleared: false
            }
        );
        let values: Vec<_> = s.faces.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(values, vec!["dog", "canine"]);
        assert!(s.status_by_index.is_empty());
        assert!(s.selection.is_empty());
    }

    #[test]
    fn test_finish_mismatch_reverts() {
        let mut s = state();
        s.selection = vec![0, 1];
        let mut sound = RecordingSound::default();
        let verdict = begin(&mut s, 0, 1, &mut sound);

        let resolution = pending(0, 1, verdict);
        assert_eq!(finish(&mut s, &resolution), Cleanup::Reverted);
        assert_eq!(s.faces.len(), 4);
        assert_eq!(s.status(0), FaceStatus::Idle);
        assert_eq!(s.status(1), FaceStatus::Idle);
        assert!(s.selection.is_empty());
    }

    #[test]
    fn test_finish_last_pair_clears_board() {
        let pairs = [Pair::new("a", "x", "y")];
        let mut s = SessionState::new(vec![
            face(&pairs[0].term, "a", Side::Term),
            face(&pairs[0].definition, "a", Side::Definition),
        ]);
        let mut sound = RecordingSound::default();
        let verdict = begin(&mut s, 0, 1, &mut sound);
        let resolution = pending(0, 1, verdict);
        assert_eq!(
            finish(&mut s, &resolution),
            Cleanup::Removed {
                board_cleared: true
            }
        );
    }

    #[test]
    fn test_remove_faces_shifts_remaining_statuses() {
        let mut s = state();
        s.status_by_index.insert(0, FaceStatus::Success);
        s.status_by_index.insert(2, FaceStatus::Success);
        s.status_by_index.insert(3, FaceStatus::Selected);

        remove_faces(&mut s, 0, 2);
        assert_eq!(s.status(1), FaceStatus::Selected);
        assert_eq!(s.status_by_index.len(), 1);
    }
}
