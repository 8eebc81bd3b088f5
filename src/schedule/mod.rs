//! Back Mechanic schedules: the declarative exercise → set → rep model, its
//! flattening into timed phases, presets and stores.

pub mod builder;
pub mod flatten;
mod lenient;
pub mod presets;
pub mod store;

pub use builder::create_id;
pub use flatten::{flatten_schedule, format_duration, total_seconds, Phase, PhaseKind, PhaseMeta};
pub use presets::{preset, presets};
pub use store::{FileScheduleStore, ScheduleLibrary, StoredSchedule};

use serde::{Deserialize, Serialize};

/// A workout schedule as stored by the builder, the local file and the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::seconds")]
    pub break_between_exercises_seconds: u32,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

/// One exercise. The JSON shape is flat (either `sets` or the uniform fields);
/// in memory the two shapes are a [`SetPlan`] decided once on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ExerciseRecord", into = "ExerciseRecord")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub break_between_sets_seconds: u32,
    /// Replaces the schedule-level inter-exercise break after this exercise when positive.
    pub break_after_exercise_seconds: Option<u32>,
    pub plan: SetPlan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SetPlan {
    /// Legacy form: every set spelled out.
    Explicit(Vec<SetSpec>),
    /// Generated form: `sets_count` identical sets with optional per-set overrides.
    Uniform(UniformSets),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSpec {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::seconds")]
    pub reps: u32,
    #[serde(default, deserialize_with = "lenient::seconds")]
    pub hold_seconds: u32,
    #[serde(default, deserialize_with = "lenient::seconds")]
    pub break_between_reps_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UniformSets {
    pub sets_count: u32,
    pub reps_per_set: u32,
    pub rep_hold_seconds: u32,
    pub break_between_reps_seconds: u32,
    /// Sparse per-set rep override; `None` (or a missing entry) keeps `reps_per_set`.
    pub set_reps: Vec<Option<u32>>,
    /// Sparse per-set break override; `Some(0)` means "no break", `None` falls back.
    pub set_break_seconds: Vec<Option<u32>>,
}

/// A concrete set after the plan has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSet {
    pub reps: u32,
    pub hold_seconds: u32,
    pub break_between_reps_seconds: u32,
}

impl Exercise {
    pub fn resolved_sets(&self) -> Vec<ResolvedSet> {
        match &self.plan {
            SetPlan::Explicit(sets) => sets
                .iter()
                .map(|s| ResolvedSet {
                    reps: s.reps,
                    hold_seconds: s.hold_seconds,
                    break_between_reps_seconds: s.break_between_reps_seconds,
                })
                .collect(),
            SetPlan::Uniform(u) => (0..u.sets_count as usize)
                .map(|i| ResolvedSet {
                    reps: u.set_reps.get(i).copied().flatten().unwrap_or(u.reps_per_set),
                    hold_seconds: u.rep_hold_seconds,
                    break_between_reps_seconds: u.break_between_reps_seconds,
                })
                .collect(),
        }
    }

    pub fn set_count(&self) -> usize {
        match &self.plan {
            SetPlan::Explicit(sets) => sets.len(),
            SetPlan::Uniform(u) => u.sets_count as usize,
        }
    }

    /// Rep count of one set, 0 when the index is out of range.
    pub fn reps_in_set(&self, set_index: usize) -> u32 {
        self.resolved_sets()
            .get(set_index)
            .map(|s| s.reps)
            .unwrap_or(0)
    }

    /// Rest inserted after set `set_index` (callers skip the last set).
    pub fn break_after_set(&self, set_index: usize) -> u32 {
        if let SetPlan::Uniform(u) = &self.plan {
            if let Some(Some(secs)) = u.set_break_seconds.get(set_index) {
                return *secs;
            }
        }
        self.break_between_sets_seconds
    }
}

impl Schedule {
    /// Rest inserted after exercise `index` (callers skip the last exercise).
    pub fn break_after_exercise(&self, index: usize) -> u32 {
        match self
            .exercises
            .get(index)
            .and_then(|ex| ex.break_after_exercise_seconds)
        {
            Some(secs) if secs > 0 => secs,
            _ => self.break_between_exercises_seconds,
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Unnamed schedule"
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExerciseRecord {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "lenient::seconds")]
    break_between_sets_seconds: u32,
    #[serde(
        default,
        deserialize_with = "lenient::seconds_opt",
        skip_serializing_if = "Option::is_none"
    )]
    break_after_exercise_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    sets: Vec<SetSpec>,
    #[serde(
        default,
        deserialize_with = "lenient::seconds_opt",
        skip_serializing_if = "Option::is_none"
    )]
    sets_count: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient::seconds_opt",
        skip_serializing_if = "Option::is_none"
    )]
    reps_per_set: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient::seconds_opt",
        skip_serializing_if = "Option::is_none"
    )]
    rep_hold_seconds: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient::seconds_opt",
        skip_serializing_if = "Option::is_none"
    )]
    break_between_reps_seconds: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient::sparse",
        skip_serializing_if = "Option::is_none"
    )]
    set_reps: Option<Vec<Option<u32>>>,
    #[serde(
        default,
        deserialize_with = "lenient::sparse",
        skip_serializing_if = "Option::is_none"
    )]
    set_break_seconds: Option<Vec<Option<u32>>>,
}

impl From<ExerciseRecord> for Exercise {
    fn from(r: ExerciseRecord) -> Self {
        let plan = if !r.sets.is_empty() {
            SetPlan::Explicit(r.sets)
        } else {
            SetPlan::Uniform(UniformSets {
                sets_count: r.sets_count.unwrap_or(0),
                reps_per_set: r.reps_per_set.unwrap_or(0),
                rep_hold_seconds: r.rep_hold_seconds.unwrap_or(0),
                break_between_reps_seconds: r.break_between_reps_seconds.unwrap_or(0),
                set_reps: r.set_reps.unwrap_or_default(),
                set_break_seconds: r.set_break_seconds.unwrap_or_default(),
            })
        };
        Self {
            id: r.id,
            name: r.name,
            break_between_sets_seconds: r.break_between_sets_seconds,
            break_after_exercise_seconds: r.break_after_exercise_seconds,
            plan,
        }
    }
}

impl From<Exercise> for ExerciseRecord {
    fn from(ex: Exercise) -> Self {
        let mut record = ExerciseRecord {
            id: ex.id,
            name: ex.name,
            break_between_sets_seconds: ex.break_between_sets_seconds,
            break_after_exercise_seconds: ex.break_after_exercise_seconds,
            ..Default::default()
        };
        match ex.plan {
            SetPlan::Explicit(sets) => record.sets = sets,
            SetPlan::Uniform(u) => {
                record.sets_count = Some(u.sets_count);
                record.reps_per_set = Some(u.reps_per_set);
                record.rep_hold_seconds = Some(u.rep_hold_seconds);
                record.break_between_reps_seconds = Some(u.break_between_reps_seconds);
                record.set_reps = (!u.set_reps.is_empty()).then_some(u.set_reps);
                record.set_break_seconds =
                    (!u.set_break_seconds.is_empty()).then_some(u.set_break_seconds);
            }
        }
        record
    }
}
