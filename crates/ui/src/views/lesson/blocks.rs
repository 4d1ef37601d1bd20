use dioxus::prelude::*;
use lesson_core::model::ChoiceKey;

use crate::vm::{
    BlockVm, ChoiceVm, FeedbackLoopVm, ImageVm, JournalVm, LessonIntent, PromptVm, SectionVm,
    move_node,
};

#[component]
pub fn SectionCard(section: SectionVm, on_intent: Callback<LessonIntent>) -> Element {
    let hue = section.tint_hue;
    let hue_b = (hue + 18) % 360;

    rsx! {
        section { class: "section", id: "{section.dom_id}",
            div {
                class: "card",
                style: "--tint-a: hsla({hue}, 55%, 55%, 0.12); --tint-b: hsla({hue_b}, 55%, 45%, 0.06);",
                div { class: "section-head",
                    h2 { class: "section-title", "{section.title}" }
                }
                div { class: "section-body",
                    for (index, block) in section.blocks.iter().enumerate() {
                        BlockView { key: "{index}", block: block.clone(), on_intent }
                    }
                }
            }
        }
    }
}

#[component]
fn BlockView(block: BlockVm, on_intent: Callback<LessonIntent>) -> Element {
    match block {
        BlockVm::Text { text } => rsx! {
            div { class: "content", "{text}" }
        },
        BlockVm::TextImage {
            text,
            image,
            image_first,
        } => rsx! {
            div { class: "two-col",
                if image_first {
                    div { class: "col-media", ImageFrame { image: image.clone() } }
                    div { class: "col-text", div { class: "content", "{text}" } }
                } else {
                    div { class: "col-text", div { class: "content", "{text}" } }
                    div { class: "col-media", ImageFrame { image: image.clone() } }
                }
            }
        },
        BlockVm::ImageCenter { image } => rsx! {
            div { class: "center-media", ImageFrame { image } }
        },
        BlockVm::Dropdown { title, text } => rsx! {
            details { class: "dropdown",
                summary { "{title}" }
                div { class: "dropdown-body", "{text}" }
            }
        },
        BlockVm::RevealButton { label, target } => rsx! {
            div { class: "choice-block",
                div { class: "btn-row",
                    button {
                        class: "btn primary",
                        r#type: "button",
                        onclick: move |_| on_intent.call(LessonIntent::Reveal(target.clone())),
                        "{label}"
                    }
                }
            }
        },
        BlockVm::Choice(choice) => rsx! {
            ChoiceView { choice, on_intent }
        },
        BlockVm::Journal(journal) => rsx! {
            JournalView { journal, on_intent }
        },
        BlockVm::FeedbackLoop(model) => rsx! {
            FeedbackLoopView { model }
        },
    }
}

#[component]
fn ImageFrame(image: ImageVm) -> Element {
    let mut loaded = use_signal(|| false);
    let src = format!("./images/{}", image.filename);
    let image_class = if loaded() { "lesson-image" } else { "lesson-image hidden" };

    rsx! {
        div { class: "image-frame",
            img {
                class: image_class,
                src,
                alt: "Image Placeholder",
                title: "{image.position_note}",
                loading: "lazy",
                onload: move |_| loaded.set(true),
                onerror: move |_| loaded.set(false),
            }
            if !loaded() {
                div { class: "img-placeholder", "{image.placeholder}" }
            }
        }
    }
}

#[component]
fn ChoiceView(choice: ChoiceVm, on_intent: Callback<LessonIntent>) -> Element {
    let continue_key = choice.key.clone();

    rsx! {
        div { class: "choice-block",
            div { class: "choice-title", "{choice.title}" }
            div { class: "btn-row",
                for option in choice.options.iter() {
                    ChoiceButton {
                        key: "{option.label}",
                        choice_key: choice.key.clone(),
                        label: option.label.clone(),
                        selected: option.selected,
                        on_intent,
                    }
                }
            }
            if let Some(feedback) = choice.pending_feedback.as_ref() {
                div { class: "feedback", "{feedback}" }
                div { class: "btn-row",
                    button {
                        class: "btn warning",
                        r#type: "button",
                        onclick: move |_| on_intent.call(LessonIntent::Continue(continue_key.clone())),
                        "Continue"
                    }
                }
            }
        }
    }
}

#[component]
fn ChoiceButton(
    choice_key: ChoiceKey,
    label: String,
    selected: bool,
    on_intent: Callback<LessonIntent>,
) -> Element {
    let class = if selected { "btn primary" } else { "btn" };
    let intent_label = label.clone();

    rsx! {
        button {
            class,
            r#type: "button",
            aria_pressed: "{selected}",
            onclick: move |_| {
                on_intent.call(LessonIntent::Choose {
                    key: choice_key.clone(),
                    label: intent_label.clone(),
                });
            },
            "{label}"
        }
    }
}

#[component]
fn JournalView(journal: JournalVm, on_intent: Callback<LessonIntent>) -> Element {
    rsx! {
        div { class: "journal",
            h4 { "{journal.main.title}" }
            div { class: "prompt", "{journal.main.prompt}" }
            JournalInput { prompt: journal.main.clone(), on_intent }
            if let Some(challenge) = journal.challenge.as_ref() {
                div { class: "mission",
                    div { class: "tag", "Mission Challenges" }
                    h4 { class: "mission-title", "{challenge.title}" }
                    div { class: "prompt", "{challenge.prompt}" }
                    JournalInput { prompt: challenge.clone(), on_intent }
                }
            }
        }
    }
}

#[component]
fn JournalInput(prompt: PromptVm, on_intent: Callback<LessonIntent>) -> Element {
    let key = prompt.key.clone();

    rsx! {
        textarea {
            id: "journal-{prompt.key}",
            value: "{prompt.text}",
            oninput: move |evt| {
                on_intent.call(LessonIntent::EditJournal {
                    key: key.clone(),
                    text: evt.value(),
                });
            },
        }
    }
}

/// Cards the learner arranges into a loop. The arrangement lives only in this view.
#[component]
fn FeedbackLoopView(model: FeedbackLoopVm) -> Element {
    let node_count = model.nodes.len();
    let mut order = use_signal(move || (0..node_count).collect::<Vec<usize>>());
    let mut dragging = use_signal(|| None::<usize>);

    let cards: Vec<(usize, usize, String)> = order()
        .iter()
        .enumerate()
        .filter_map(|(position, &node)| {
            model
                .nodes
                .get(node)
                .map(|label| (position, node, label.clone()))
        })
        .collect();
    let last = cards.len().saturating_sub(1);

    rsx! {
        div { class: "feedback-loop",
            h4 { "{model.title}" }
            div { class: "prompt", "{model.instructions}" }
            ol { class: "loop-nodes",
                for (position, node, label) in cards {
                    li {
                        key: "{node}",
                        class: "loop-node",
                        draggable: "true",
                        ondragstart: move |_| dragging.set(Some(position)),
                        ondragover: move |evt| evt.prevent_default(),
                        ondrop: move |evt| {
                            evt.prevent_default();
                            let from = dragging();
                            dragging.set(None);
                            if let Some(from) = from {
                                order.with_mut(|order| move_node(order, from, position));
                            }
                        },
                        span { class: "loop-label", "{label}" }
                        span { class: "loop-moves",
                            button {
                                class: "btn small",
                                r#type: "button",
                                disabled: position == 0,
                                onclick: move |_| {
                                    order.with_mut(|order| move_node(order, position, position.saturating_sub(1)));
                                },
                                "▲"
                            }
                            button {
                                class: "btn small",
                                r#type: "button",
                                disabled: position == last,
                                onclick: move |_| {
                                    order.with_mut(|order| move_node(order, position, position + 1));
                                },
                                "▼"
                            }
                        }
                    }
                }
            }
            div { class: "loop-back", "↺ back to the first card" }
        }
    }
}
