use serde::{Deserialize, Serialize};

use super::Schedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PhaseKind {
    Hold,
    Break,
}

/// Position of a phase inside the schedule. Inter-exercise breaks carry no position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rep_index: Option<usize>,
}

/// One timed step of a flattened schedule. Never zero-length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    #[serde(rename = "type")]
    pub kind: PhaseKind,
    pub label: String,
    pub duration_seconds: u32,
    pub meta: PhaseMeta,
}

impl Phase {
    fn hold(label: String, secs: u32, exercise: usize, set: usize, rep: usize) -> Self {
        Self {
            kind: PhaseKind::Hold,
            label,
            duration_seconds: secs,
            meta: PhaseMeta {
                exercise_index: Some(exercise),
                set_index: Some(set),
                rep_index: Some(rep),
            },
        }
    }

    fn rest(label: &str, secs: u32, meta: PhaseMeta) -> Self {
        Self {
            kind: PhaseKind::Break,
            label: label.to_string(),
            duration_seconds: secs,
            meta,
        }
    }

    pub fn is_hold(&self) -> bool {
        self.kind == PhaseKind::Hold
    }
}

/// Expand a schedule into the ordered list of phases the timer walks through.
///
/// Holds and breaks with a zero duration are dropped, so reps without a timed
/// hold only contribute their surrounding breaks.
pub fn flatten_schedule(schedule: &Schedule) -> Vec<Phase> {
    let mut phases = Vec::new();
    let exercise_count = schedule.exercises.len();

    for (ex_idx, exercise) in schedule.exercises.iter().enumerate() {
        let name = if exercise.name.trim().is_empty() {
            "Exercise"
        } else {
            exercise.name.as_str()
        };
        let sets = exercise.resolved_sets();

        for (set_idx, set) in sets.iter().enumerate() {
            for rep in 1..=set.reps {
                if set.hold_seconds > 0 {
                    phases.push(Phase::hold(
                        format!("{name} - Set {} Rep {rep}", set_idx + 1),
                        set.hold_seconds,
                        ex_idx,
                        set_idx,
                        (rep - 1) as usize,
                    ));
                }
                if rep < set.reps && set.break_between_reps_seconds > 0 {
                    phases.push(Phase::rest(
                        "Break between reps",
                        set.break_between_reps_seconds,
                        PhaseMeta {
                            exercise_index: Some(ex_idx),
                            set_index: Some(set_idx),
                            rep_index: None,
                        },
                    ));
                }
            }

            if set_idx + 1 < sets.len() {
                let secs = exercise.break_after_set(set_idx);
                if secs > 0 {
                    phases.push(Phase::rest(
                        "Break between sets",
                        secs,
                        PhaseMeta {
                            exercise_index: Some(ex_idx),
                            ..Default::default()
                        },
                    ));
                }
            }
        }

        if ex_idx + 1 < exercise_count {
            let secs = schedule.break_after_exercise(ex_idx);
            if secs > 0 {
                phases.push(Phase::rest(
                    "Break between exercises",
                    secs,
                    PhaseMeta::default(),
                ));
            }
        }
    }

    phases
}

pub fn total_seconds(phases: &[Phase]) -> u64 {
    phases.iter().map(|p| p.duration_seconds as u64).sum()
}

/// `m:ss`, minutes unbounded.
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
