//! The printable journal: what the learner chose and wrote, laid out on pages.
//!
//! [`collect`] picks the learner's own content out of the script and progress;
//! [`ExportLayout::paginate`] turns it into positioned text lines and response
//! boxes. Rendering those to a document format happens in the services layer.
//!
//! Coordinates are points measured from the top-left corner of the page, and a
//! text element's `y` is its baseline.

use crate::model::{ChoiceStatus, LessonScript, ProgressState, SaveKey};

pub const DOCUMENT_TITLE: &str = "My Journal";
pub const CHOICES_HEADING: &str = "My Selected Choices";
pub const PROMPTS_HEADING: &str = "My Prompts & Responses";
pub const NO_CHOICES_LINE: &str = "• (No choices selected yet)";
pub const BLANK_RESPONSE: &str = "(left blank)";

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 11.0;
const TITLE_LINE: f32 = 22.0;
const HEADING_LINE: f32 = 16.0;
const BODY_LINE: f32 = 14.0;
const BOX_MIN_HEIGHT: f32 = 70.0;
const BOX_PADDING: f32 = 8.0;
// First baseline inside a box sits this far below the padding edge.
const BOX_FIRST_BASELINE: f32 = 12.0;
const BOX_GAP_AFTER: f32 = 14.0;

/// One written-response prompt with whatever the learner stored for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptItem {
    pub title: String,
    pub prompt: String,
    pub save_key: SaveKey,
    /// `None` when nothing (or only whitespace) was written.
    pub response: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalExport {
    /// Labels of confirmed choices, in the order their host sections were revealed.
    pub choices: Vec<String>,
    pub prompts: Vec<PromptItem>,
}

/// Gathers the exportable content of revealed sections.
///
/// Narrative text is never included. A choice appears only once it is confirmed
/// and its host section is still revealed.
#[must_use]
pub fn collect(script: &LessonScript, state: &ProgressState) -> JournalExport {
    let mut export = JournalExport::default();

    for id in state.revealed() {
        let Some(section) = script.section(id.as_str()) else {
            continue;
        };
        for choice in section.choices() {
            if let ChoiceStatus::Confirmed(label) = state.choice_status(choice.choice_key.as_str()) {
                export.choices.push(label);
            }
        }
        for prompt in script.journal_prompts_in(id.as_str()) {
            let response = state
                .journal(prompt.save_key.as_str())
                .filter(|text| !text.trim().is_empty())
                .map(str::to_owned);
            export.prompts.push(PromptItem {
                title: prompt.title.to_owned(),
                prompt: prompt.prompt.to_owned(),
                save_key: prompt.save_key.clone(),
                response,
            });
        }
    }

    export
}

//
// ─── LAYOUT ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageGeometry {
    /// US Letter in points with a 40 pt margin.
    pub const LETTER: Self = Self {
        width: 612.0,
        height: 792.0,
        margin: 40.0,
    };

    #[must_use]
    pub fn content_width(&self) -> f32 {
        self.width - self.margin * 2.0
    }

    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.height - self.margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::LETTER
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text {
        x: f32,
        y: f32,
        size: f32,
        weight: FontWeight,
        text: String,
    },
    /// Stroked rectangle; `y` is the top edge.
    Box {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<Element>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|element| match element {
            Element::Text { text, .. } => Some(text.as_str()),
            Element::Box { .. } => None,
        })
    }

    pub fn boxes(&self) -> impl Iterator<Item = (f32, f32, f32, f32)> + '_ {
        self.elements.iter().filter_map(|element| match *element {
            Element::Box {
                x,
                y,
                width,
                height,
            } => Some((x, y, width, height)),
            Element::Text { .. } => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportLayout {
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
}

impl ExportLayout {
    /// Lays out the journal. Always produces at least one page.
    #[must_use]
    pub fn paginate(export: &JournalExport, geometry: PageGeometry) -> Self {
        let mut composer = Composer::new(geometry);

        composer.lines(DOCUMENT_TITLE, TITLE_SIZE, FontWeight::Bold, TITLE_LINE);

        composer.gap(10.0);
        composer.lines(CHOICES_HEADING, HEADING_SIZE, FontWeight::Bold, HEADING_LINE);
        if export.choices.is_empty() {
            composer.lines(NO_CHOICES_LINE, BODY_SIZE, FontWeight::Regular, BODY_LINE);
        } else {
            for label in &export.choices {
                composer.lines(&format!("• {label}"), BODY_SIZE, FontWeight::Regular, BODY_LINE);
            }
        }

        if !export.prompts.is_empty() {
            composer.gap(14.0);
            composer.lines(PROMPTS_HEADING, HEADING_SIZE, FontWeight::Bold, HEADING_LINE);
            for item in &export.prompts {
                composer.prompt(item);
            }
        }

        composer.finish()
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

struct Composer {
    geometry: PageGeometry,
    pages: Vec<Page>,
    y: f32,
}

impl Composer {
    fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![Page::default()],
            y: geometry.margin,
        }
    }

    fn finish(self) -> ExportLayout {
        ExportLayout {
            geometry: self.geometry,
            pages: self.pages,
        }
    }

    fn at_top(&self) -> bool {
        self.y <= self.geometry.margin
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = self.geometry.margin;
    }

    /// Starts a new page unless `needed` points still fit on this one.
    fn ensure_space(&mut self, needed: f32) {
        if !self.at_top() && self.y + needed > self.geometry.bottom() {
            self.new_page();
        }
    }

    fn gap(&mut self, points: f32) {
        self.y += points;
    }

    fn push(&mut self, element: Element) {
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(element);
        }
    }

    fn lines(&mut self, text: &str, size: f32, weight: FontWeight, line_height: f32) {
        for line in wrap(text, self.geometry.content_width(), size) {
            self.ensure_space(line_height);
            self.push(Element::Text {
                x: self.geometry.margin,
                y: self.y,
                size,
                weight,
                text: line,
            });
            self.y += line_height;
        }
    }

    fn prompt(&mut self, item: &PromptItem) {
        let width = self.geometry.content_width();
        let header_lines = wrap(&item.title, width, BODY_SIZE).len()
            + wrap(&item.prompt, width, BODY_SIZE).len();
        // Keep the prompt together with at least an empty response box.
        self.ensure_space(header_lines as f32 * BODY_LINE + 6.0 + BOX_MIN_HEIGHT);

        self.lines(&item.title, BODY_SIZE, FontWeight::Bold, BODY_LINE);
        self.lines(&item.prompt, BODY_SIZE, FontWeight::Regular, BODY_LINE);
        self.gap(6.0);
        self.response_box(item.response.as_deref().unwrap_or(BLANK_RESPONSE));
        self.gap(8.0);
    }

    fn response_box(&mut self, response: &str) {
        let inner_width = self.geometry.content_width() - BOX_PADDING * 2.0;
        let page_room = self.geometry.bottom() - self.geometry.margin - BOX_GAP_AFTER;
        let mut lines = wrap(response, inner_width, BODY_SIZE);

        loop {
            let available = self.geometry.bottom() - self.y - BOX_GAP_AFTER;
            let whole = box_height(lines.len());
            if whole <= available {
                self.draw_box(&lines);
                return;
            }
            // Move a box that would fit on a fresh page; split one that never would.
            if !self.at_top() && (whole <= page_room || available < BOX_MIN_HEIGHT) {
                self.new_page();
                continue;
            }

            let capacity = lines_fitting(available).clamp(1, lines.len());
            let rest = lines.split_off(capacity);
            self.draw_box(&lines);
            if rest.is_empty() {
                return;
            }
            lines = rest;
            self.new_page();
        }
    }

    fn draw_box(&mut self, lines: &[String]) {
        let top = self.y;
        let height = box_height(lines.len());
        self.push(Element::Box {
            x: self.geometry.margin,
            y: top,
            width: self.geometry.content_width(),
            height,
        });
        let x = self.geometry.margin + BOX_PADDING;
        let mut baseline = top + BOX_PADDING + BOX_FIRST_BASELINE;
        for line in lines {
            self.push(Element::Text {
                x,
                y: baseline,
                size: BODY_SIZE,
                weight: FontWeight::Regular,
                text: line.clone(),
            });
            baseline += BODY_LINE;
        }
        self.y = top + height + BOX_GAP_AFTER;
    }
}

fn box_height(line_count: usize) -> f32 {
    (line_count as f32 * BODY_LINE + BOX_PADDING * 2.0).max(BOX_MIN_HEIGHT)
}

fn lines_fitting(height: f32) -> usize {
    let usable = height - BOX_PADDING * 2.0;
    if usable <= 0.0 {
        0
    } else {
        (usable / BODY_LINE).floor() as usize
    }
}

//
// ─── TEXT MEASURE ──────────────────────────────────────────────────────────────
//

/// Approximate Helvetica advance width of `ch`, in ems.
fn char_em(ch: char) -> f32 {
    match ch {
        ' ' | 'i' | 'j' | 'l' | '.' | ',' | '\'' | '|' | '!' | ':' | ';' => 0.278,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '-' => 0.333,
        'm' | 'w' | 'M' | 'W' | '@' => 0.833,
        'A'..='Z' => 0.667,
        '0'..='9' => 0.556,
        _ => 0.556,
    }
}

#[must_use]
pub fn text_width(text: &str, size: f32) -> f32 {
    text.chars().map(char_em).sum::<f32>() * size
}

/// Greedy word wrap to `max_width` points.
///
/// Explicit newlines start new lines (blank lines are kept). A word wider than a
/// whole line is broken between characters.
#[must_use]
pub fn wrap(text: &str, max_width: f32, size: f32) -> Vec<String> {
    let mut out = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_owned()
            } else {
                format!("{line} {word}")
            };
            if text_width(&candidate, size) <= max_width {
                line = candidate;
                continue;
            }
            if !line.is_empty() {
                out.push(std::mem::take(&mut line));
            }
            if text_width(word, size) <= max_width {
                line = word.to_owned();
            } else {
                for ch in word.chars() {
                    line.push(ch);
                    if text_width(&line, size) > max_width && line.chars().count() > 1 {
                        line.pop();
                        out.push(std::mem::replace(&mut line, ch.to_string()));
                    }
                }
            }
        }
        out.push(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::eco_responders;
    use crate::model::{ChoiceKey, SectionId};
    use crate::reveal::RevealEngine;

    const NOAA: &str = "Analyze NOAA Weather Data First";

    fn noaa_state(script: &LessonScript) -> ProgressState {
        let engine = RevealEngine::new(script);
        let mut state = engine.initial_state();
        engine.advance(&mut state, &SectionId::new("the_call"));
        engine
            .select_choice(&mut state, &ChoiceKey::new("the_call_path"), NOAA)
            .unwrap();
        engine.confirm_choice(&mut state, &ChoiceKey::new("the_call_path"));
        engine.record_journal_text(&mut state, &SaveKey::new("noaa_prediction"), "More fires.");
        state
    }

    fn all_texts(layout: &ExportLayout) -> Vec<&str> {
        layout.pages.iter().flat_map(Page::texts).collect()
    }

    #[test]
    fn fresh_state_exports_nothing_personal() {
        let script = eco_responders().unwrap();
        let state = RevealEngine::new(&script).initial_state();
        let export = collect(&script, &state);
        assert!(export.choices.is_empty());
        assert!(export.prompts.is_empty());

        let layout = ExportLayout::paginate(&export, PageGeometry::LETTER);
        assert_eq!(
            all_texts(&layout),
            [DOCUMENT_TITLE, CHOICES_HEADING, NO_CHOICES_LINE]
        );
    }

    #[test]
    fn pending_choice_is_not_exported() {
        let script = eco_responders().unwrap();
        let engine = RevealEngine::new(&script);
        let mut state = engine.initial_state();
        engine.advance(&mut state, &SectionId::new("the_call"));
        engine
            .select_choice(&mut state, &ChoiceKey::new("the_call_path"), NOAA)
            .unwrap();

        assert!(collect(&script, &state).choices.is_empty());
    }

    #[test]
    fn confirmed_branch_exports_choice_and_prompts() {
        let script = eco_responders().unwrap();
        let export = collect(&script, &noaa_state(&script));

        assert_eq!(export.choices, [NOAA]);
        let keys: Vec<&str> = export.prompts.iter().map(|p| p.save_key.as_str()).collect();
        assert_eq!(keys, ["noaa_prediction", "noaa_mission_challenge"]);
        assert_eq!(export.prompts[0].response.as_deref(), Some("More fires."));
        assert_eq!(export.prompts[1].response, None);
    }

    #[test]
    fn blank_response_gets_placeholder_box() {
        let script = eco_responders().unwrap();
        let export = collect(&script, &noaa_state(&script));
        let layout = ExportLayout::paginate(&export, PageGeometry::LETTER);
        let texts = all_texts(&layout);

        assert!(texts.contains(&PROMPTS_HEADING));
        assert!(texts.contains(&"More fires."));
        assert!(texts.contains(&BLANK_RESPONSE));
        let boxes: Vec<_> = layout.pages.iter().flat_map(Page::boxes).collect();
        assert_eq!(boxes.len(), 2);
        assert!(boxes.iter().all(|&(_, _, _, h)| h >= BOX_MIN_HEIGHT));
    }

    #[test]
    fn long_response_continues_on_following_pages() {
        let long = (1..=150).map(|n| format!("line {n}")).collect::<Vec<_>>().join("\n");
        let export = JournalExport {
            choices: vec!["Pick".into()],
            prompts: vec![PromptItem {
                title: "Prediction".into(),
                prompt: "What happens next?".into(),
                save_key: SaveKey::new("p"),
                response: Some(long),
            }],
        };
        let geometry = PageGeometry::LETTER;
        let layout = ExportLayout::paginate(&export, geometry);

        assert!(layout.page_count() >= 3);
        let texts = all_texts(&layout);
        assert!(texts.contains(&"line 1"));
        assert!(texts.contains(&"line 150"));
        for page in &layout.pages {
            for (_, y, _, h) in page.boxes() {
                assert!(y >= geometry.margin);
                assert!(y + h <= geometry.bottom());
            }
        }
    }

    #[test]
    fn wrap_respects_width_and_newlines() {
        let lines = wrap("alpha beta gamma\n\ndelta", 60.0, 11.0);
        assert!(lines.len() >= 4);
        assert!(lines.iter().all(|line| text_width(line, 11.0) <= 60.0));
        assert!(lines.contains(&String::new()));
        assert_eq!(lines.last().map(String::as_str), Some("delta"));
    }

    #[test]
    fn wrap_breaks_overlong_words() {
        let word = "x".repeat(200);
        let lines = wrap(&word, 100.0, 11.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }
}
