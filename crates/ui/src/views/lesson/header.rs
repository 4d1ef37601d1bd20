use dioxus::prelude::*;

use crate::vm::StatusPillVm;

#[component]
pub fn LessonHeader(
    title: String,
    status: StatusPillVm,
    resume_input: String,
    busy: bool,
    on_pause: Callback<()>,
    on_resume_input: Callback<String>,
    on_resume: Callback<()>,
    on_export: Callback<()>,
) -> Element {
    rsx! {
        header { class: "topbar",
            div { class: "brand",
                h1 { "{title}" }
            }
            div { class: "controls",
                if status.visible {
                    span { class: status.class, id: "save-status", "{status.label}" }
                }
                button {
                    class: "btn",
                    id: "pause-btn",
                    r#type: "button",
                    onclick: move |_| on_pause.call(()),
                    "Pause & Get Code"
                }
                div { class: "resume",
                    input {
                        id: "paste-code",
                        r#type: "text",
                        placeholder: "Paste a Resume Code",
                        value: "{resume_input}",
                        oninput: move |evt| on_resume_input.call(evt.value()),
                        onkeydown: move |evt| {
                            if evt.data.key() == Key::Enter {
                                on_resume.call(());
                            }
                        },
                    }
                    button {
                        class: "btn",
                        id: "resume-btn",
                        r#type: "button",
                        disabled: busy,
                        onclick: move |_| on_resume.call(()),
                        "Resume"
                    }
                }
                button {
                    class: "btn primary",
                    id: "export-btn",
                    r#type: "button",
                    disabled: busy,
                    onclick: move |_| on_export.call(()),
                    "Export PDF"
                }
            }
        }
    }
}
