//! Pairs planner commands with motion labels for per-step display
//!
//! The planner returns a flat command list and a coarser motion list. Merging
//! folds runs of continuation tokens into one display unit; alignment then
//! walks the motions and assigns each robot step its command text.
//!
//! Index 0 of the output belongs to the start pose and is always empty.

use serde::Serialize;
use thiserror::Error;

use super::is_continuation;

const CAPTURE: &str = "CAPTURE";
const OFFSET: &str = "OFFSET";

/// Raised when the motion list needs more merged commands than exist
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GroupingError {
    #[error("motion {motion_index} ({motion}) needs merged command {needed}, only {available} available")]
    Misaligned {
        motion_index: usize,
        motion: String,
        needed: usize,
        available: usize,
    },
}

/// Display strings for each robot step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "labels", rename_all = "snake_case")]
pub enum StepAnnotations {
    /// No motion labels were supplied
    None,
    /// Commands annotated with their motions
    Aligned(Vec<String>),
    /// Merged commands without motions, used when alignment failed
    Raw(Vec<String>),
}

impl StepAnnotations {
    /// Label for a step, if one exists
    pub fn label(&self, step: usize) -> Option<&str> {
        match self {
            StepAnnotations::None => None,
            StepAnnotations::Aligned(labels) | StepAnnotations::Raw(labels) => {
                labels.get(step).map(String::as_str)
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, StepAnnotations::Raw(_))
    }
}

/// Merge runs of continuation tokens into single space-joined units
pub fn merge_commands<S: AsRef<str>>(commands: &[S]) -> Vec<String> {
    let mut merged = Vec::with_capacity(commands.len());
    let mut group: Vec<&str> = Vec::new();

    for command in commands.iter().map(AsRef::as_ref) {
        if is_continuation(command) {
            group.push(command);
            continue;
        }
        if !group.is_empty() {
            merged.push(group.join(" "));
            group.clear();
        }
        merged.push(command.to_string());
    }
    if !group.is_empty() {
        merged.push(group.join(" "));
    }
    merged
}

/// Bounds-checked view of the merged units for one motion
struct Units<'a> {
    merged: &'a [String],
    motion_index: usize,
    motion: &'a str,
}

impl<'a> Units<'a> {
    fn at(&self, index: usize) -> Result<&'a str, GroupingError> {
        self.merged
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| GroupingError::Misaligned {
                motion_index: self.motion_index,
                motion: self.motion.to_string(),
                needed: index,
                available: self.merged.len(),
            })
    }
}

/// Assign merged command units to motions, one label per robot step
///
/// * The first motion always takes unit 0.
/// * `CAPTURE` motions emit nothing; the motion before them absorbs the
///   capture unit.
/// * A `FORWARD`/`REVERSE` repeating the previous motion reuses the current
///   unit, since the planner merges straight runs into one command.
/// * Motions containing `OFFSET` span two units.
pub fn align_motions<S: AsRef<str>>(
    merged: &[String],
    motions: &[S],
) -> Result<Vec<String>, GroupingError> {
    let motions: Vec<&str> = motions.iter().map(AsRef::as_ref).collect();
    let Some(&first) = motions.first() else {
        return Ok(Vec::new());
    };

    let units = Units {
        merged,
        motion_index: 0,
        motion: first,
    };
    let mut labels = vec![String::new(), format!("{} ({first})", units.at(0)?)];
    let mut cursor = 0;
    let mut previous = first;

    for (index, &motion) in motions.iter().enumerate().skip(1) {
        let next = motions.get(index + 1).copied();
        let units = Units {
            merged,
            motion_index: index,
            motion,
        };

        if motion == CAPTURE {
            previous = motion;
            continue;
        }

        let capture_follows = next == Some(CAPTURE);

        if matches!(motion, "FORWARD" | "REVERSE") && motion == previous {
            if capture_follows {
                labels.push(format!(
                    "{} ({motion}), {} ({CAPTURE})",
                    units.at(cursor)?,
                    units.at(cursor + 1)?
                ));
                cursor += 1;
            } else {
                labels.push(format!("{} ({motion})", units.at(cursor)?));
            }
            previous = motion;
            continue;
        }

        cursor += 1;
        let is_offset = motion.contains(OFFSET);
        let label = match (is_offset, capture_follows) {
            (true, true) => format!(
                "{} {} ({motion}), {} ({CAPTURE})",
                units.at(cursor)?,
                units.at(cursor + 1)?,
                units.at(cursor + 2)?
            ),
            (true, false) => format!("{} {} ({motion})", units.at(cursor)?, units.at(cursor + 1)?),
            (false, true) => format!("{} ({motion}), {} ({CAPTURE})", units.at(cursor)?, units.at(cursor + 1)?),
            (false, false) => format!("{} ({motion})", units.at(cursor)?),
        };
        labels.push(label);
        cursor += usize::from(is_offset) + usize::from(capture_follows);
        previous = motion;
    }

    Ok(labels)
}

/// Derive per-step labels from one planner response
///
/// Absent or empty motions yield [`StepAnnotations::None`]. When the motions
/// reference more commands than exist, the merged commands are shown without
/// motion labels instead.
pub fn annotate_steps<S: AsRef<str>, M: AsRef<str>>(
    commands: &[S],
    motions: Option<&[M]>,
) -> StepAnnotations {
    let Some(motions) = motions.filter(|m| !m.is_empty()) else {
        return StepAnnotations::None;
    };

    let merged = merge_commands(commands);
    match align_motions(&merged, motions) {
        Ok(labels) => StepAnnotations::Aligned(labels),
        Err(err) => {
            tracing::warn!(error = %err, "motion labels do not line up with commands, showing raw commands");
            let mut labels = Vec::with_capacity(merged.len() + 1);
            labels.push(String::new());
            labels.extend(merged);
            StepAnnotations::Raw(labels)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn merge_keeps_target_commands_separate() {
        let merged = merge_commands(&["F10|50|0", "F10|50|0", "SNAP1", "FIN"]);
        assert_eq!(merged, strings(&["F10|50|0", "F10|50|0", "SNAP1 FIN"]));
    }

    #[test]
    fn merge_joins_a_run_of_continuation_tokens() {
        let merged = merge_commands(&["W50|0|20", "w50|0|20", "SNAP1", "FIN"]);
        assert_eq!(merged, strings(&["W50|0|20 w50|0|20 SNAP1 FIN"]));
    }

    #[test]
    fn merge_splits_on_interrupting_command() {
        let merged = merge_commands(&["W50|0|20", "SNAP1", "T50|35|90", "W50|0|10", "SNAP2", "FIN"]);
        assert_eq!(
            merged,
            strings(&["W50|0|20 SNAP1", "T50|35|90", "W50|0|10 SNAP2 FIN"])
        );
        assert!(merged.len() <= 6);
    }

    #[test]
    fn first_motion_is_paired_without_lookahead() {
        let merged = strings(&["T50|0|10", "W50|0|20 SNAP1 FIN"]);
        let labels = align_motions(&merged, &["FORWARD", "CAPTURE"]).unwrap();
        assert_eq!(labels, strings(&["", "T50|0|10 (FORWARD)"]));
    }

    #[test]
    fn capture_is_folded_into_the_preceding_motion() {
        let merged = strings(&["T50|0|10", "T50|35|90", "W50|0|20 SNAP1 FIN"]);
        let labels =
            align_motions(&merged, &["FORWARD", "FORWARD_RIGHT_TURN", "CAPTURE"]).unwrap();
        assert_eq!(
            labels,
            strings(&[
                "",
                "T50|0|10 (FORWARD)",
                "T50|35|90 (FORWARD_RIGHT_TURN), W50|0|20 SNAP1 FIN (CAPTURE)",
            ])
        );
    }

    #[test]
    fn repeated_straight_motion_reuses_the_unit() {
        let merged = strings(&["T50|0|30", "T50|-35|90"]);
        let labels = align_motions(
            &merged,
            &["FORWARD", "FORWARD", "FORWARD", "FORWARD_LEFT_TURN"],
        )
        .unwrap();
        assert_eq!(
            labels,
            strings(&[
                "",
                "T50|0|30 (FORWARD)",
                "T50|0|30 (FORWARD)",
                "T50|0|30 (FORWARD)",
                "T50|-35|90 (FORWARD_LEFT_TURN)",
            ])
        );
    }

    #[test]
    fn repeated_straight_motion_before_capture() {
        let merged = strings(&["t50|0|20", "W50|0|10 SNAP2"]);
        let labels = align_motions(&merged, &["REVERSE", "REVERSE", "CAPTURE"]).unwrap();
        assert_eq!(
            labels,
            strings(&["", "t50|0|20 (REVERSE)", "t50|0|20 (REVERSE), W50|0|10 SNAP2 (CAPTURE)"])
        );
    }

    #[test]
    fn offset_motion_spans_two_units() {
        let merged = strings(&["T50|0|10", "T50|-35|45", "T50|35|45", "T50|0|10"]);
        let labels =
            align_motions(&merged, &["FORWARD", "FORWARD_OFFSET_LEFT", "FORWARD"]).unwrap();
        assert_eq!(
            labels,
            strings(&[
                "",
                "T50|0|10 (FORWARD)",
                "T50|-35|45 T50|35|45 (FORWARD_OFFSET_LEFT)",
                "T50|0|10 (FORWARD)",
            ])
        );
    }

    #[test]
    fn offset_motion_before_capture() {
        let merged = strings(&["T50|0|10", "t50|35|45", "t50|-35|45", "W50|0|10 SNAP3 FIN"]);
        let labels =
            align_motions(&merged, &["FORWARD", "REVERSE_OFFSET_RIGHT", "CAPTURE"]).unwrap();
        assert_eq!(
            labels[2],
            "t50|35|45 t50|-35|45 (REVERSE_OFFSET_RIGHT), W50|0|10 SNAP3 FIN (CAPTURE)"
        );
    }

    #[test]
    fn short_command_list_is_reported() {
        let merged = strings(&["T50|0|10"]);
        let err = align_motions(&merged, &["FORWARD", "FORWARD_LEFT_TURN"]).unwrap_err();
        assert_eq!(
            err,
            GroupingError::Misaligned {
                motion_index: 1,
                motion: "FORWARD_LEFT_TURN".to_string(),
                needed: 1,
                available: 1,
            }
        );
        assert!(align_motions(&[], &["FORWARD"]).is_err());
    }

    #[test]
    fn annotate_skips_missing_motions() {
        let commands = ["T50|0|10", "FIN"];
        assert_eq!(annotate_steps::<_, &str>(&commands, None), StepAnnotations::None);
        assert_eq!(annotate_steps::<_, &str>(&commands, Some(&[])), StepAnnotations::None);
    }

    #[test]
    fn annotate_falls_back_to_raw_commands() {
        let commands = ["T50|0|10", "FIN"];
        let motions = ["FORWARD", "FORWARD_LEFT_TURN", "FORWARD_RIGHT_TURN"];
        let annotations = annotate_steps(&commands, Some(&motions[..]));
        assert!(annotations.is_degraded());
        assert_eq!(annotations, StepAnnotations::Raw(strings(&["", "T50|0|10", "FIN"])));
        assert_eq!(annotations.label(1), Some("T50|0|10"));
    }

    #[test]
    fn annotate_aligns_well_formed_responses() {
        let commands = ["T50|0|20", "T50|35|90", "W50|0|15", "w50|0|15", "SNAP1_C", "FIN"];
        let motions = ["FORWARD", "FORWARD", "FORWARD_RIGHT_TURN", "CAPTURE"];
        let annotations = annotate_steps(&commands, Some(&motions[..]));
        assert_eq!(annotations.label(0), Some(""));
        assert_eq!(annotations.label(2), Some("T50|0|20 (FORWARD)"));
        assert_eq!(
            annotations.label(3),
            Some("T50|35|90 (FORWARD_RIGHT_TURN), W50|0|15 w50|0|15 SNAP1_C FIN (CAPTURE)")
        );
        assert_eq!(annotations.label(4), None);
    }
}
