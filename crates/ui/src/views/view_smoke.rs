use lesson_core::codec;
use lesson_core::content::eco_responders;
use lesson_core::model::{ChoiceKey, SaveKey, SectionId};
use lesson_core::reveal::RevealEngine;
use lesson_core::time::fixed_now;
use storage::repository::InMemoryRepository;

use super::test_harness::{setup_view_harness, setup_view_harness_with_repo};
use crate::vm::LessonIntent;

const NOAA: &str = "Analyze NOAA Weather Data First";
const FIELD: &str = "Go Straight to the Fire Zone for Field Observation";

fn choose(label: &str) -> LessonIntent {
    LessonIntent::Choose {
        key: ChoiceKey::new("the_call_path"),
        label: label.to_owned(),
    }
}

fn proceed() -> LessonIntent {
    LessonIntent::Continue(ChoiceKey::new("the_call_path"))
}

#[tokio::test(flavor = "current_thread")]
async fn lesson_view_smoke_renders_entry_section() {
    let mut harness = setup_view_harness().await;
    harness.rebuild();
    let html = harness.render();

    assert!(html.contains("Situation Briefing"), "missing entry title in {html}");
    assert!(html.contains("Begin Mission"), "missing reveal button in {html}");
    assert!(html.contains("Image Placeholder"), "missing placeholder in {html}");
    assert!(html.contains("forest_intro_right.png"), "missing filename in {html}");
    assert!(html.contains("Get Code"), "missing pause button in {html}");
    assert!(html.contains("Export PDF"), "missing export button in {html}");
    assert!(!html.contains("section-the_call"), "unexpected section in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn lesson_view_smoke_reveal_choose_and_continue() {
    let mut harness = setup_view_harness().await;
    harness.rebuild();

    harness
        .dispatch(LessonIntent::Reveal(SectionId::new("the_call")))
        .await;
    let html = harness.render();
    assert!(html.contains("section-the_call"), "missing the_call in {html}");
    assert!(html.contains(NOAA), "missing option in {html}");
    assert!(html.contains("Saved"), "missing save status in {html}");
    assert_eq!(harness.repo.write_count(), 1);

    harness.dispatch(choose(NOAA)).await;
    let html = harness.render();
    assert!(html.contains("Continue"), "missing continue in {html}");
    assert!(!html.contains("section-noaa_path"), "branch shown before continue in {html}");

    harness.dispatch(proceed()).await;
    let html = harness.render();
    assert!(html.contains("section-noaa_path"), "missing branch in {html}");
    assert!(html.contains("Mission Challenges"), "missing mission in {html}");
    assert!(html.contains("Build a Feedback Loop"), "missing widget in {html}");
    assert!(!html.contains(">Continue<"), "continue still shown in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn lesson_view_smoke_switching_branch_hides_old_branch() {
    let mut harness = setup_view_harness().await;
    harness.rebuild();

    harness
        .dispatch(LessonIntent::Reveal(SectionId::new("the_call")))
        .await;
    harness.dispatch(choose(NOAA)).await;
    harness.dispatch(proceed()).await;
    harness.dispatch(choose(FIELD)).await;

    let html = harness.render();
    assert!(!html.contains("section-noaa_path"), "old branch still shown in {html}");
    assert!(!html.contains("section-field_path"), "new branch shown early in {html}");

    harness.dispatch(proceed()).await;
    let html = harness.render();
    assert!(html.contains("section-field_path"), "missing new branch in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn lesson_view_smoke_journal_typing_is_debounced() {
    let mut harness = setup_view_harness().await;
    harness.rebuild();

    harness
        .dispatch(LessonIntent::Reveal(SectionId::new("noaa_path")))
        .await;
    let writes = harness.repo.write_count();

    harness
        .dispatch(LessonIntent::EditJournal {
            key: SaveKey::new("noaa_prediction"),
            text: "Drier fuel".to_owned(),
        })
        .await;
    let state = harness.services.lesson().snapshot();
    assert_eq!(state.journal("noaa_prediction"), Some("Drier fuel"));
    assert_eq!(harness.repo.write_count(), writes);

    harness.services.lesson().flush().await;
    assert_eq!(harness.repo.write_count(), writes + 1);
}

#[tokio::test(flavor = "current_thread")]
async fn lesson_view_smoke_rejects_unreadable_code() {
    let mut harness = setup_view_harness().await;
    harness.rebuild();

    harness.resume_with("R1.not-a-real-code").await;
    let html = harness.render();
    assert!(
        html.contains("That Resume Code could not be read. Please try again."),
        "missing notice in {html}"
    );
    assert!(!html.contains("section-the_call"), "state changed in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn lesson_view_smoke_resume_code_restores_progress() {
    let script = eco_responders().unwrap();
    let engine = RevealEngine::new(&script);
    let mut state = engine.initial_state();
    engine.advance(&mut state, &SectionId::new("the_call"));
    engine
        .select_choice(&mut state, &ChoiceKey::new("the_call_path"), NOAA)
        .unwrap();
    engine.confirm_choice(&mut state, &ChoiceKey::new("the_call_path"));
    let code = codec::encode(&state).unwrap();

    let mut harness = setup_view_harness().await;
    harness.rebuild();
    harness.resume_with(code.as_str()).await;

    let html = harness.render();
    assert!(html.contains("section-noaa_path"), "missing restored branch in {html}");
    assert!(html.contains("Progress restored."), "missing notice in {html}");
    assert_eq!(harness.services.lesson().snapshot(), state);
}

#[tokio::test(flavor = "current_thread")]
async fn lesson_view_smoke_restores_saved_progress() {
    let repo = InMemoryRepository::new();
    repo.insert_raw(
        "eco_v2_state",
        r#"{"v":2,"revealed":["hello","the_call"],"choices":{"the_call_path":"Analyze NOAA Weather Data First"},"journals":{},"pendingContinues":{"the_call_path":{"feedbackText":"Good call.","continueReveal":"noaa_path"}}}"#,
        fixed_now(),
    );

    let mut harness = setup_view_harness_with_repo(repo).await;
    harness.rebuild();
    let html = harness.render();
    assert!(html.contains("section-the_call"), "missing saved section in {html}");
    assert!(html.contains("Good call."), "missing pending feedback in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn lesson_view_smoke_start_over_returns_to_entry() {
    let mut harness = setup_view_harness().await;
    harness.rebuild();

    harness
        .dispatch(LessonIntent::Reveal(SectionId::new("the_call")))
        .await;
    harness.dispatch(LessonIntent::StartOver).await;

    let html = harness.render();
    assert!(html.contains("section-hello"), "missing entry in {html}");
    assert!(!html.contains("section-the_call"), "old progress shown in {html}");
}
