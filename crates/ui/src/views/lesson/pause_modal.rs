use std::time::Duration;

use dioxus::document::eval;
use dioxus::prelude::*;
use services::ShareArtifacts;

use crate::context::AppContext;
use crate::views::{ViewError, ViewState, view_state_from_resource};

use super::scripts::{copy_code_script, focus_script};

const COPIED_FEEDBACK: Duration = Duration::from_millis(900);
const RESUME_CODE_FIELD: &str = "resume-code";

#[component]
pub fn PauseModal(on_close: Callback<()>, on_start_over: Callback<()>) -> Element {
    let ctx = use_context::<AppContext>();
    let lesson = ctx.lesson();
    let copied = use_signal(|| false);

    let resource = use_resource(move || {
        let lesson = lesson.clone();
        async move {
            lesson.share_artifacts().map_err(|err| {
                tracing::warn!(error = %err, "could not build resume code");
                ViewError::ShareUnavailable
            })
        }
    });
    let state = view_state_from_resource(resource);

    use_effect(|| {
        let _ = eval(&focus_script("pause-modal"));
    });

    let on_copy = use_callback(move |code: String| {
        let mut copied = copied;
        let _ = eval(&copy_code_script(&code, RESUME_CODE_FIELD));
        copied.set(true);
        spawn(async move {
            tokio::time::sleep(COPIED_FEEDBACK).await;
            copied.set(false);
        });
    });

    rsx! {
        div {
            class: "modal-backdrop show",
            onclick: move |_| on_close.call(()),
            div {
                class: "modal",
                id: "pause-modal",
                role: "dialog",
                aria_modal: "true",
                tabindex: "0",
                onclick: move |evt| evt.stop_propagation(),
                onkeydown: move |evt| {
                    if evt.data.key() == Key::Escape {
                        evt.prevent_default();
                        on_close.call(());
                    }
                },
                div { class: "modal-head",
                    h3 { class: "modal-title", "Pause & Resume Later" }
                    button {
                        class: "btn",
                        id: "close-pause-modal",
                        r#type: "button",
                        onclick: move |_| on_close.call(()),
                        "Close"
                    }
                }
                match state {
                    ViewState::Idle | ViewState::Loading => rsx! {
                        p { class: "modal-body", "Preparing your code…" }
                    },
                    ViewState::Error(err) => {
                        let message = err.message();
                        rsx! {
                            p { class: "modal-body error", "{message}" }
                        }
                    }
                    ViewState::Ready(artifacts) => rsx! {
                        ShareDetails { artifacts, copied: copied(), on_copy }
                    },
                }
                div { class: "modal-actions",
                    button {
                        class: "btn warning",
                        id: "start-over-btn",
                        r#type: "button",
                        onclick: move |_| on_start_over.call(()),
                        "Start over"
                    }
                }
            }
        }
    }
}

#[component]
fn ShareDetails(artifacts: ShareArtifacts, copied: bool, on_copy: Callback<String>) -> Element {
    let code = artifacts.code.as_str().to_owned();
    let code_for_copy = code.clone();
    let copy_label = if copied { "Copied" } else { "Copy" };

    rsx! {
        p { class: "modal-body",
            "Copy this Resume Code, or scan the QR code to continue on another device."
        }
        div { class: "code-row",
            textarea {
                id: RESUME_CODE_FIELD,
                class: "resume-code",
                readonly: true,
                value: "{code}",
            }
            button {
                class: "btn",
                id: "copy-code-btn",
                r#type: "button",
                onclick: move |_| on_copy.call(code_for_copy.clone()),
                "{copy_label}"
            }
        }
        div { class: "qr", id: "qr-code", dangerous_inner_html: "{artifacts.qr_svg}" }
        a { class: "share-link", href: "{artifacts.link}", "{artifacts.link}" }
    }
}
