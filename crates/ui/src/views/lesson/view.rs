use std::time::Duration;

use dioxus::document::eval;
use dioxus::prelude::*;

use crate::context::AppContext;
use crate::vm::{LessonIntent, map_save_status, project_lesson, section_dom_id};

use super::blocks::SectionCard;
use super::header::LessonHeader;
use super::pause_modal::PauseModal;
use super::scripts::{SCROLL_TO_TOP_SCRIPT, scroll_to_section_script};

#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::rc::Rc;

const NOTICE_DURATION: Duration = Duration::from_secs(5);
const IMAGES_NOTE: &str = "Images are placeholders until they are added to ./images/ with the exact file names shown.";

#[derive(Clone, Debug, PartialEq, Eq)]
struct Notice {
    text: String,
    is_error: bool,
}

/// Shows `text` until a newer notice replaces it or it expires.
fn show_notice(notice: Signal<Option<Notice>>, text: impl Into<String>, is_error: bool) {
    let mut notice = notice;
    let shown = Notice {
        text: text.into(),
        is_error,
    };
    notice.set(Some(shown.clone()));
    spawn(async move {
        tokio::time::sleep(NOTICE_DURATION).await;
        let current = notice.peek().clone();
        if current.as_ref() == Some(&shown) {
            notice.set(None);
        }
    });
}

#[component]
pub fn LessonView() -> Element {
    let ctx = use_context::<AppContext>();
    let lesson = ctx.lesson();
    let exports = ctx.exports();

    let revision = use_signal(|| 0_u64);
    let mut save_status = {
        let lesson = lesson.clone();
        use_signal(move || lesson.save_status())
    };
    let scroll_target = use_signal(|| None::<String>);
    let notice = use_signal(|| None::<Notice>);
    let mut show_pause = use_signal(|| false);
    let mut resume_input = use_signal(String::new);
    let busy = use_signal(|| false);

    {
        let lesson = lesson.clone();
        use_future(move || {
            let lesson = lesson.clone();
            async move {
                let mut status = lesson.subscribe_status();
                while status.changed().await.is_ok() {
                    let next = status.borrow_and_update().clone();
                    save_status.set(next);
                }
            }
        });
    }

    let vm = {
        let lesson = lesson.clone();
        use_memo(move || {
            let _ = revision();
            project_lesson(&lesson.script(), &lesson.snapshot())
        })
    };

    use_effect(move || {
        let mut scroll_target = scroll_target;
        let Some(dom_id) = scroll_target() else {
            return;
        };
        scroll_target.set(None);
        let _ = eval(&scroll_to_section_script(&dom_id));
    });

    let dispatch_intent = {
        let lesson = lesson.clone();
        use_callback(move |intent: LessonIntent| {
            let lesson = lesson.clone();
            let mut revision = revision;
            let mut scroll_target = scroll_target;
            let mut show_pause = show_pause;

            // A reveal button scrolls to its section even when it is already shown.
            let reveal_target = match &intent {
                LessonIntent::Reveal(target) => Some(target.clone()),
                _ => None,
            };
            let is_reset = intent == LessonIntent::StartOver;

            spawn(async move {
                match lesson.dispatch(intent.into_action()).await {
                    Ok(outcome) => {
                        if is_reset {
                            show_pause.set(false);
                        }
                        if outcome.is_changed() {
                            *revision.write() += 1;
                        }
                        if let Some(target) = reveal_target.or_else(|| outcome.scroll_target().cloned()) {
                            scroll_target.set(Some(section_dom_id(&target)));
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "lesson action rejected");
                        show_notice(notice, err.to_string(), true);
                    }
                }
            });
        })
    };

    let on_resume = {
        let lesson = lesson.clone();
        use_callback(move |()| {
            let lesson = lesson.clone();
            let raw = resume_input.peek().clone();
            let mut busy = busy;
            let mut revision = revision;
            let mut resume_input = resume_input;

            spawn(async move {
                busy.set(true);
                let result = lesson.apply_resume_code(&raw).await;
                busy.set(false);
                match result {
                    Ok(false) => {}
                    Ok(true) => {
                        *revision.write() += 1;
                        resume_input.set(String::new());
                        let _ = eval(SCROLL_TO_TOP_SCRIPT);
                        show_notice(notice, "Progress restored.", false);
                    }
                    Err(err) => show_notice(notice, err.to_string(), true),
                }
            });
        })
    };

    let on_export = {
        let lesson = lesson.clone();
        use_callback(move |()| {
            let lesson = lesson.clone();
            let exports = exports.clone();
            let mut busy = busy;

            spawn(async move {
                busy.set(true);
                lesson.flush().await;
                let script = lesson.script();
                let result = exports.export(&script, &lesson.snapshot()).await;
                busy.set(false);
                match result {
                    Ok(path) => {
                        show_notice(notice, format!("Journal saved to {}", path.display()), false);
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "journal export failed");
                        show_notice(notice, format!("Export failed: {err}"), true);
                    }
                }
            });
        })
    };

    #[cfg(test)]
    {
        let mut registered = use_signal(|| false);
        if !registered() {
            registered.set(true);
            if let Some(handles) = try_consume_context::<LessonTestHandles>() {
                handles.register(dispatch_intent, on_resume, resume_input);
            }
        }
    }

    let vm = vm();
    let status = map_save_status(&save_status());
    let current_notice = notice();

    rsx! {
        div { class: "page lesson-page", id: "lesson-root",
            LessonHeader {
                title: vm.title.clone(),
                status,
                resume_input: resume_input(),
                busy: busy(),
                on_pause: move |()| show_pause.set(true),
                on_resume_input: move |value| resume_input.set(value),
                on_resume,
                on_export,
            }
            if let Some(current) = current_notice {
                div {
                    class: if current.is_error { "notice error" } else { "notice" },
                    role: "status",
                    "{current.text}"
                }
            }
            p { class: "images-note", "{IMAGES_NOTE}" }
            div { class: "lesson", id: "lesson",
                for section in vm.sections.iter() {
                    SectionCard {
                        key: "{section.id}",
                        section: section.clone(),
                        on_intent: dispatch_intent,
                    }
                }
            }
            if show_pause() {
                PauseModal {
                    on_close: move |()| show_pause.set(false),
                    on_start_over: move |()| dispatch_intent.call(LessonIntent::StartOver),
                }
            }
        }
    }
}

#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct LessonTestHandles {
    dispatch: Rc<RefCell<Option<Callback<LessonIntent>>>>,
    resume: Rc<RefCell<Option<Callback<()>>>>,
    resume_input: Rc<RefCell<Option<Signal<String>>>>,
}

#[cfg(test)]
impl LessonTestHandles {
    pub(crate) fn register(
        &self,
        dispatch: Callback<LessonIntent>,
        resume: Callback<()>,
        resume_input: Signal<String>,
    ) {
        *self.dispatch.borrow_mut() = Some(dispatch);
        *self.resume.borrow_mut() = Some(resume);
        *self.resume_input.borrow_mut() = Some(resume_input);
    }

    pub(crate) fn dispatch(&self) -> Callback<LessonIntent> {
        (*self.dispatch.borrow()).expect("lesson dispatch registered")
    }

    pub(crate) fn resume(&self) -> Callback<()> {
        (*self.resume.borrow()).expect("resume registered")
    }

    pub(crate) fn resume_input(&self) -> Signal<String> {
        (*self.resume_input.borrow()).expect("resume input registered")
    }
}
