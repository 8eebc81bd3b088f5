//! Editing operations used by the schedule builder. Every edit replaces the
//! affected element in its vector; nothing is shared between schedules.

use rand::Rng;

use std::str::FromStr;

use super::{Exercise, Schedule, SetPlan, SetSpec, UniformSets};
use crate::error::Error;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `<prefix>_<unix millis>_<6 base36 chars>`
pub fn create_id(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!(
        "{prefix}_{}_{suffix}",
        chrono::Utc::now().timestamp_millis()
    )
}

impl SetSpec {
    pub fn new(reps: u32, hold_seconds: u32, break_between_reps_seconds: u32) -> Self {
        Self {
            id: create_id("set"),
            reps,
            hold_seconds,
            break_between_reps_seconds,
        }
    }
}

impl Default for SetSpec {
    fn default() -> Self {
        Self::new(3, 10, 10)
    }
}

impl Exercise {
    pub fn new(name: &str) -> Self {
        Self {
            id: create_id("ex"),
            name: name.to_string(),
            break_between_sets_seconds: 30,
            break_after_exercise_seconds: None,
            plan: SetPlan::Explicit(vec![SetSpec::default()]),
        }
    }

    pub fn add_set(&mut self, set: SetSpec) {
        match &mut self.plan {
            SetPlan::Explicit(sets) => sets.push(set),
            SetPlan::Uniform(u) => u.sets_count += 1,
        }
    }

    pub fn remove_set(&mut self, index: usize) -> bool {
        match &mut self.plan {
            SetPlan::Explicit(sets) if index < sets.len() => {
                sets.remove(index);
                true
            }
            SetPlan::Uniform(u) if index < u.sets_count as usize => {
                u.sets_count -= 1;
                if index < u.set_reps.len() {
                    u.set_reps.remove(index);
                }
                if index < u.set_break_seconds.len() {
                    u.set_break_seconds.remove(index);
                }
                true
            }
            _ => false,
        }
    }

    /// Apply `edit` to a copy of the set and store it back. Only explicit plans have editable sets.
    pub fn update_set(&mut self, index: usize, edit: impl FnOnce(&mut SetSpec)) -> bool {
        let SetPlan::Explicit(sets) = &mut self.plan else {
            return false;
        };
        let Some(current) = sets.get(index) else {
            return false;
        };
        let mut updated = current.clone();
        edit(&mut updated);
        sets[index] = updated;
        true
    }

    /// Collapse the plan into the uniform form, keeping per-set rep counts as overrides.
    pub fn make_uniform(&mut self) {
        let SetPlan::Explicit(sets) = &self.plan else {
            return;
        };
        let first = sets.first().cloned().unwrap_or_default();
        let set_reps = if sets.iter().all(|s| s.reps == first.reps) {
            Vec::new()
        } else {
            sets.iter().map(|s| Some(s.reps)).collect()
        };
        self.plan = SetPlan::Uniform(UniformSets {
            sets_count: sets.len() as u32,
            reps_per_set: first.reps,
            rep_hold_seconds: first.hold_seconds,
            break_between_reps_seconds: first.break_between_reps_seconds,
            set_reps,
            set_break_seconds: Vec::new(),
        });
    }
}

/// `NAME:SETSxREPSxHOLD[/REST]`, e.g. `Bird Dog:3x8x10/5`. REST is the break
/// between reps and defaults to the hold time.
impl FromStr for Exercise {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidInput(format!("exercise {s:?}: expected NAME:SETSxREPSxHOLD[/REST]"));
        let (name, shape) = s.rsplit_once(':').ok_or_else(invalid)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid());
        }
        let (counts, rest) = match shape.split_once('/') {
            Some((counts, rest)) => (counts, Some(rest)),
            None => (shape, None),
        };
        let numbers: Vec<u32> = counts
            .split('x')
            .map(|n| n.trim().parse::<u32>())
            .collect::<Result<_, _>>()
            .map_err(|_| invalid())?;
        let [sets, reps, hold] = numbers[..] else {
            return Err(invalid());
        };
        if sets == 0 || reps == 0 || hold == 0 {
            return Err(invalid());
        }
        let rest = match rest {
            Some(r) => r.trim().parse::<u32>().map_err(|_| invalid())?,
            None => hold,
        };

        let mut exercise = Exercise::new(name);
        exercise.plan = SetPlan::Uniform(UniformSets {
            sets_count: sets,
            reps_per_set: reps,
            rep_hold_seconds: hold,
            break_between_reps_seconds: rest,
            ..UniformSets::default()
        });
        Ok(exercise)
    }
}

impl Schedule {
    /// Starting point for a custom routine.
    pub fn new_custom() -> Self {
        let mut first = Exercise::new("Exercise 1");
        first.break_between_sets_seconds = 20;
        Self {
            id: create_id("sch"),
            name: "My Back Routine".to_string(),
            break_between_exercises_seconds: 30,
            exercises: vec![first],
        }
    }

    pub fn add_exercise(&mut self, exercise: Exercise) {
        self.exercises.push(exercise);
    }

    pub fn remove_exercise(&mut self, index: usize) -> Option<Exercise> {
        (index < self.exercises.len()).then(|| self.exercises.remove(index))
    }

    pub fn update_exercise(&mut self, index: usize, edit: impl FnOnce(&mut Exercise)) -> bool {
        let Some(current) = self.exercises.get(index) else {
            return false;
        };
        let mut updated = current.clone();
        edit(&mut updated);
        self.exercises[index] = updated;
        true
    }
}
