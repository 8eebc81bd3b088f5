use include_dir::{include_dir, Dir};

use super::Schedule;

static PRESET_DIR: Dir = include_dir!("src/schedule/presets");

/// Display order of the bundled presets.
const PRESET_FILES: [&str; 3] = [
    "simple_big_three.json",
    "minimal_demo.json",
    "pyramid_uniform.json",
];

/// Bundled preset schedules, in display order.
pub fn presets() -> Vec<Schedule> {
    PRESET_FILES
        .iter()
        .filter_map(|name| read_preset(name))
        .collect()
}

/// Look a preset up by id, with or without the `preset_` prefix.
pub fn preset(id: &str) -> Option<Schedule> {
    let wanted = id.strip_prefix("preset_").unwrap_or(id).replace('-', "_");
    presets()
        .into_iter()
        .find(|s| s.id.strip_prefix("preset_").unwrap_or(&s.id) == wanted)
}

fn read_preset(file_name: &str) -> Option<Schedule> {
    let file = PRESET_DIR.get_file(file_name)?;
    let text = file.contents_utf8()?;
    match serde_json::from_str(text) {
        Ok(schedule) => Some(schedule),
        Err(e) => {
            log::error!("bundled preset {file_name} is invalid: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{flatten_schedule, total_seconds};

    #[test]
    fn all_presets_load() {
        let all = presets();
        assert_eq!(all.len(), PRESET_FILES.len());
        assert_eq!(all[0].name, "Simple Big Three (starter)");
        assert!(all.iter().all(|s| !s.exercises.is_empty()));
    }

    #[test]
    fn preset_lookup_accepts_short_ids() {
        assert!(preset("preset_minimal_demo").is_some());
        assert!(preset("minimal_demo").is_some());
        assert!(preset("minimal-demo").is_some());
        assert!(preset("nope").is_none());
    }

    #[test]
    fn preset_totals() {
        let big_three = preset("simple_big_three").unwrap();
        assert_eq!(total_seconds(&flatten_schedule(&big_three)), 750);

        let demo = preset("minimal_demo").unwrap();
        assert_eq!(total_seconds(&flatten_schedule(&demo)), 61);
    }

    #[test]
    fn pyramid_uses_uniform_overrides() {
        let pyramid = preset("pyramid_uniform").unwrap();
        let first = &pyramid.exercises[0];
        assert_eq!(first.set_count(), 3);
        assert_eq!(first.reps_in_set(2), 1);
        assert_eq!(first.break_after_set(1), 15);
    }
}
