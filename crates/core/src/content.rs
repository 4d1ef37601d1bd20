//! Lesson scripts bundled with the crate.

use crate::model::{LessonScript, ScriptError};

const ECO_RESPONDERS_JSON: &str = include_str!("../content/eco_responders.json");

/// The Eco-Responders wildfire lesson.
///
/// # Errors
///
/// Returns `ScriptError` if the bundled script fails validation.
pub fn eco_responders() -> Result<LessonScript, ScriptError> {
    LessonScript::from_json(ECO_RESPONDERS_JSON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Block;

    #[test]
    fn bundled_lesson_is_valid() {
        let script = eco_responders().unwrap();
        assert_eq!(script.title(), "Eco-Responders");
        assert_eq!(script.entry_id().as_str(), "hello");
        let ids: Vec<&str> = script.sections().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["hello", "the_call", "noaa_path", "field_path"]);
    }

    #[test]
    fn the_call_hosts_the_branch() {
        let script = eco_responders().unwrap();
        let host = script.section_containing_choice("the_call_path").unwrap();
        assert_eq!(host.id.as_str(), "the_call");
        let choice = script.choice("the_call_path").unwrap();
        let targets: Vec<&str> = choice
            .options
            .iter()
            .map(|opt| opt.continue_reveal.as_str())
            .collect();
        assert_eq!(targets, ["noaa_path", "field_path"]);
    }

    #[test]
    fn journals_carry_mission_challenges() {
        let script = eco_responders().unwrap();
        let noaa = script.section("noaa_path").unwrap();
        let keys: Vec<&str> = noaa
            .blocks
            .iter()
            .flat_map(Block::save_keys)
            .map(|key| key.as_str())
            .collect();
        assert_eq!(keys, ["noaa_prediction", "noaa_mission_challenge"]);
    }
}
