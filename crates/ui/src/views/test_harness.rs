use std::sync::Arc;

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use lesson_core::time::fixed_clock;
use services::{AppServices, ExportService, LessonConfig, LessonService};
use storage::repository::{InMemoryRepository, Storage};

use crate::context::{UiApp, build_app_context};
use crate::views::{LessonTestHandles, LessonView};
use crate::vm::LessonIntent;

struct TestApp {
    services: AppServices,
}

impl UiApp for TestApp {
    fn lesson(&self) -> Arc<LessonService> {
        self.services.lesson()
    }

    fn exports(&self) -> Arc<ExportService> {
        self.services.exports()
    }
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
    handles: LessonTestHandles,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for ViewHarnessProps {}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.handles.clone());
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    rsx! { LessonView {} }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub repo: InMemoryRepository,
    pub services: AppServices,
    pub handles: LessonTestHandles,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        for _ in 0..3 {
            let _ = tokio::time::timeout(
                std::time::Duration::from_millis(50),
                self.dom.wait_for_work(),
            )
            .await;
            self.dom.render_immediate(&mut NoOpMutations);
            self.dom.process_events();
        }
    }

    pub async fn dispatch(&mut self, intent: LessonIntent) {
        let dispatch = self.handles.dispatch();
        self.dom.in_runtime(|| dispatch.call(intent));
        self.drive_async().await;
    }

    pub async fn resume_with(&mut self, code: &str) {
        let mut input = self.handles.resume_input();
        let resume = self.handles.resume();
        self.dom.in_runtime(|| {
            input.set(code.to_owned());
            resume.call(());
        });
        self.drive_async().await;
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

pub async fn setup_view_harness() -> ViewHarness {
    setup_view_harness_with_repo(InMemoryRepository::new()).await
}

pub async fn setup_view_harness_with_repo(repo: InMemoryRepository) -> ViewHarness {
    let storage = Storage::from_repository(Arc::new(repo.clone()));
    let config = LessonConfig {
        export_dir: std::env::temp_dir(),
        ..LessonConfig::default()
    };
    let services = AppServices::from_storage(storage, config, fixed_clock())
        .await
        .expect("build services");
    let handles = LessonTestHandles::default();

    let dom = VirtualDom::new_with_props(
        ViewRouterHarness,
        ViewHarnessProps {
            app: Arc::new(TestApp {
                services: services.clone(),
            }),
            handles: handles.clone(),
        },
    );

    ViewHarness {
        dom,
        repo,
        services,
        handles,
    }
}
