use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::ids::{ChoiceKey, SaveKey, SectionId};

/// Format marker written as `v` into every persisted state.
pub const STATE_VERSION: u32 = 2;

const PENDING_FIELD: &str = "pendingContinues";
const PENDING_FIELD_ALIAS: &str = "pendingChoice";

/// Feedback shown for a selected option whose branch is not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChoice {
    #[serde(rename = "feedbackText")]
    pub feedback_text: String,
    #[serde(rename = "continueReveal")]
    pub continue_reveal: SectionId,
}

/// Where a single choice key sits in its `Unselected -> Pending -> Confirmed` lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceStatus {
    Unselected,
    Pending(String),
    Confirmed(String),
}

/// Mutable per-learner progress.
///
/// Invariants upheld by every constructor:
/// - `revealed` is non-empty, duplicate-free and starts with the entry section.
/// - a pending entry only exists for a key that also has a recorded choice.
///
/// External data enters only through [`sanitize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressState {
    #[serde(rename = "v")]
    version: u32,
    revealed: Vec<SectionId>,
    choices: BTreeMap<ChoiceKey, String>,
    journals: BTreeMap<SaveKey, String>,
    #[serde(rename = "pendingContinues")]
    pending: BTreeMap<ChoiceKey, PendingChoice>,
}

impl ProgressState {
    /// Fresh state: only the entry section revealed, nothing chosen or written.
    #[must_use]
    pub fn new(entry: SectionId) -> Self {
        Self {
            version: STATE_VERSION,
            revealed: vec![entry],
            choices: BTreeMap::new(),
            journals: BTreeMap::new(),
            pending: BTreeMap::new(),
        }
    }

    /// Builds a state from loose parts, restoring every invariant.
    #[must_use]
    pub fn from_parts(
        entry: SectionId,
        revealed: Vec<SectionId>,
        choices: BTreeMap<ChoiceKey, String>,
        journals: BTreeMap<SaveKey, String>,
        pending: BTreeMap<ChoiceKey, PendingChoice>,
    ) -> Self {
        let mut seen = HashSet::new();
        seen.insert(entry.clone());
        let mut ordered = vec![entry];
        for id in revealed {
            if id.is_blank() {
                continue;
            }
            if seen.insert(id.clone()) {
                ordered.push(id);
            }
        }

        let choices: BTreeMap<ChoiceKey, String> = choices
            .into_iter()
            .filter(|(key, _)| !key.is_blank())
            .collect();
        let pending = pending
            .into_iter()
            .filter(|(key, entry)| choices.contains_key(key) && !entry.continue_reveal.is_blank())
            .collect();

        Self {
            version: STATE_VERSION,
            revealed: ordered,
            choices,
            journals: journals
                .into_iter()
                .filter(|(key, _)| !key.is_blank())
                .collect(),
            pending,
        }
    }

    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    #[must_use]
    pub fn entry_id(&self) -> &SectionId {
        &self.revealed[0]
    }

    #[must_use]
    pub fn revealed(&self) -> &[SectionId] {
        &self.revealed
    }

    #[must_use]
    pub fn is_revealed(&self, id: &str) -> bool {
        self.revealed.iter().any(|revealed| revealed.as_str() == id)
    }

    #[must_use]
    pub fn choices(&self) -> &BTreeMap<ChoiceKey, String> {
        &self.choices
    }

    #[must_use]
    pub fn choice(&self, key: &str) -> Option<&str> {
        self.choices.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn journals(&self) -> &BTreeMap<SaveKey, String> {
        &self.journals
    }

    #[must_use]
    pub fn journal(&self, key: &str) -> Option<&str> {
        self.journals.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn pending(&self) -> &BTreeMap<ChoiceKey, PendingChoice> {
        &self.pending
    }

    #[must_use]
    pub fn pending_for(&self, key: &str) -> Option<&PendingChoice> {
        self.pending.get(key)
    }

    #[must_use]
    pub fn choice_status(&self, key: &str) -> ChoiceStatus {
        match (self.choices.get(key), self.pending.contains_key(key)) {
            (None, _) => ChoiceStatus::Unselected,
            (Some(label), true) => ChoiceStatus::Pending(label.clone()),
            (Some(label), false) => ChoiceStatus::Confirmed(label.clone()),
        }
    }

    // ─── Mutators used by the reveal engine ───────────────────────────────────

    /// Appends `id` unless already revealed. Returns true when it was appended.
    pub(crate) fn push_revealed(&mut self, id: SectionId) -> bool {
        if self.is_revealed(id.as_str()) || id.is_blank() {
            return false;
        }
        self.revealed.push(id);
        true
    }

    /// Drops every section revealed after `id`. Returns how many were removed.
    ///
    /// No-op when `id` is not revealed. The entry section is never removed.
    pub(crate) fn truncate_after(&mut self, id: &str) -> usize {
        let Some(idx) = self.revealed.iter().position(|r| r.as_str() == id) else {
            return 0;
        };
        let before = self.revealed.len();
        self.revealed.truncate(idx + 1);
        before - self.revealed.len()
    }

    pub(crate) fn set_choice(&mut self, key: ChoiceKey, label: String) {
        self.choices.insert(key, label);
    }

    pub(crate) fn set_pending(&mut self, key: ChoiceKey, pending: PendingChoice) {
        self.pending.insert(key, pending);
    }

    pub(crate) fn take_pending(&mut self, key: &str) -> Option<PendingChoice> {
        self.pending.remove(key)
    }

    pub(crate) fn set_journal(&mut self, key: SaveKey, text: String) {
        self.journals.insert(key, text);
    }
}

/// Rebuilds a usable `ProgressState` from arbitrary, possibly hostile data.
///
/// Never fails: anything that is not an object degrades to the default state,
/// and each field falls back independently when malformed.
#[must_use]
pub fn sanitize(candidate: &Value, entry: &SectionId) -> ProgressState {
    let Value::Object(fields) = candidate else {
        return ProgressState::new(entry.clone());
    };

    let revealed = match fields.get("revealed") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(SectionId::from)
            .collect(),
        _ => Vec::new(),
    };

    let pending_field = fields
        .get(PENDING_FIELD)
        .or_else(|| fields.get(PENDING_FIELD_ALIAS));

    ProgressState::from_parts(
        entry.clone(),
        revealed,
        string_map(fields.get("choices")),
        string_map(fields.get("journals")),
        pending_map(pending_field),
    )
}

fn as_object(value: Option<&Value>) -> Option<&Map<String, Value>> {
    match value {
        Some(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn string_map<K: From<String> + Ord>(value: Option<&Value>) -> BTreeMap<K, String> {
    as_object(value)
        .map(|map| {
            map.iter()
                .filter_map(|(key, value)| {
                    value.as_str().map(|text| (K::from(key.clone()), text.to_owned()))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn pending_map(value: Option<&Value>) -> BTreeMap<ChoiceKey, PendingChoice> {
    as_object(value)
        .map(|map| {
            map.iter()
                .filter_map(|(key, value)| {
                    let entry = value.as_object()?;
                    let feedback_text = entry.get("feedbackText")?.as_str()?.to_owned();
                    let continue_reveal = entry.get("continueReveal")?.as_str()?;
                    Some((
                        ChoiceKey::from(key.clone()),
                        PendingChoice {
                            feedback_text,
                            continue_reveal: SectionId::from(continue_reveal),
                        },
                    ))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry() -> SectionId {
        SectionId::new("hello")
    }

    fn assert_well_formed(state: &ProgressState) {
        assert_eq!(state.revealed()[0], entry());
        let unique: HashSet<_> = state.revealed().iter().collect();
        assert_eq!(unique.len(), state.revealed().len());
        for key in state.pending().keys() {
            assert!(state.choices().contains_key(key));
        }
    }

    #[test]
    fn default_reveals_only_entry() {
        let state = ProgressState::new(entry());
        assert_eq!(state.revealed(), &[entry()]);
        assert!(state.choices().is_empty());
        assert!(state.journals().is_empty());
        assert!(state.pending().is_empty());
        assert_eq!(state.version(), STATE_VERSION);
    }

    #[test]
    fn sanitize_never_fails_on_malformed_input() {
        let inputs = [
            Value::Null,
            json!(42),
            json!("hello"),
            json!([1, 2, 3]),
            json!({}),
            json!({ "revealed": "the_call", "choices": [1], "journals": 7, "pendingContinues": "x" }),
            json!({ "revealed": [null, "", 5, "the_call"], "choices": { "k": 3 } }),
        ];
        for input in &inputs {
            let state = sanitize(input, &entry());
            assert_well_formed(&state);
        }
    }

    #[test]
    fn sanitize_substitutes_default_for_non_objects() {
        assert_eq!(sanitize(&json!([]), &entry()), ProgressState::new(entry()));
        assert_eq!(sanitize(&Value::Null, &entry()), ProgressState::new(entry()));
    }

    #[test]
    fn sanitize_prefixes_entry_and_drops_duplicates() {
        let state = sanitize(
            &json!({ "revealed": ["the_call", "", null, "the_call", "noaa_path"] }),
            &entry(),
        );
        let ids: Vec<&str> = state.revealed().iter().map(SectionId::as_str).collect();
        assert_eq!(ids, ["hello", "the_call", "noaa_path"]);
    }

    #[test]
    fn sanitize_moves_misplaced_entry_to_front() {
        let state = sanitize(&json!({ "revealed": ["the_call", "hello"] }), &entry());
        let ids: Vec<&str> = state.revealed().iter().map(SectionId::as_str).collect();
        assert_eq!(ids, ["hello", "the_call"]);
    }

    #[test]
    fn sanitize_keeps_only_string_values() {
        let state = sanitize(
            &json!({
                "choices": { "the_call_path": "Analyze NOAA Weather Data First", "bad": 1 },
                "journals": { "noaa_prediction": "dry\nhot", "n": null }
            }),
            &entry(),
        );
        assert_eq!(state.choices().len(), 1);
        assert_eq!(state.journal("noaa_prediction"), Some("dry\nhot"));
        assert_eq!(state.journal("n"), None);
    }

    #[test]
    fn sanitize_drops_orphaned_or_malformed_pending() {
        let state = sanitize(
            &json!({
                "choices": { "a": "One" },
                "pendingContinues": {
                    "a": { "feedbackText": "fb", "continueReveal": "x" },
                    "b": { "feedbackText": "fb", "continueReveal": "y" },
                    "c": "nope"
                }
            }),
            &entry(),
        );
        assert_eq!(state.pending().len(), 1);
        assert_eq!(state.choice_status("a"), ChoiceStatus::Pending("One".into()));
        assert_eq!(state.choice_status("b"), ChoiceStatus::Unselected);
    }

    #[test]
    fn sanitize_accepts_pending_choice_alias() {
        let state = sanitize(
            &json!({
                "choices": { "a": "One" },
                "pendingChoice": { "a": { "feedbackText": "fb", "continueReveal": "x" } }
            }),
            &entry(),
        );
        assert!(state.pending_for("a").is_some());
    }

    #[test]
    fn sanitize_is_identity_on_well_formed_state() {
        let mut state = ProgressState::new(entry());
        state.push_revealed(SectionId::new("the_call"));
        state.set_choice(ChoiceKey::new("k"), "One".into());
        state.set_journal(SaveKey::new("j"), "text".into());
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(sanitize(&value, &entry()), state);
    }

    #[test]
    fn truncate_after_keeps_anchor() {
        let mut state = ProgressState::new(entry());
        for id in ["a", "b", "c"] {
            state.push_revealed(SectionId::new(id));
        }
        assert_eq!(state.truncate_after("a"), 2);
        assert_eq!(state.revealed().len(), 2);
        assert_eq!(state.truncate_after("missing"), 0);
    }

    #[test]
    fn serializes_in_persisted_shape() {
        let value = serde_json::to_value(ProgressState::new(entry())).unwrap();
        assert_eq!(
            value,
            json!({
                "v": 2,
                "revealed": ["hello"],
                "choices": {},
                "journals": {},
                "pendingContinues": {}
            })
        );
    }
}
