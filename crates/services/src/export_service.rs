use std::path::{Path, PathBuf};

use lesson_core::export::{self, Element, ExportLayout, FontWeight, PageGeometry};
use lesson_core::model::{LessonScript, ProgressState};
use printpdf::path::PaintMode;
use printpdf::{BuiltinFont, Mm, PdfDocument, Pt, Rect};

use crate::error::ExportError;

pub const EXPORT_FILE_NAME: &str = "My_Journal.pdf";

/// Renders the learner's journal to PDF and writes it into `export_dir`.
#[derive(Debug, Clone)]
pub struct ExportService {
    export_dir: PathBuf,
    geometry: PageGeometry,
}

impl ExportService {
    #[must_use]
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
            geometry: PageGeometry::LETTER,
        }
    }

    #[must_use]
    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    #[must_use]
    pub fn target_path(&self) -> PathBuf {
        self.export_dir.join(EXPORT_FILE_NAME)
    }

    #[must_use]
    pub fn layout(&self, script: &LessonScript, state: &ProgressState) -> ExportLayout {
        ExportLayout::paginate(&export::collect(script, state), self.geometry)
    }

    /// Builds the PDF and writes it to [`target_path`](Self::target_path).
    ///
    /// # Errors
    ///
    /// Returns `ExportError` if rendering or the file write fails.
    pub async fn export(
        &self,
        script: &LessonScript,
        state: &ProgressState,
    ) -> Result<PathBuf, ExportError> {
        let bytes = render_pdf(&self.layout(script, state))?;
        let path = self.target_path();
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| ExportError::Write {
                path: path.clone(),
                source,
            })?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "journal exported");
        Ok(path)
    }
}

fn mm(points: f32) -> Mm {
    Mm::from(Pt(points))
}

/// Renders a laid-out journal with the built-in Helvetica faces.
///
/// # Errors
///
/// Returns `ExportError::Render` if the document cannot be assembled.
pub fn render_pdf(layout: &ExportLayout) -> Result<Vec<u8>, ExportError> {
    let geometry = layout.geometry;
    let (width, height) = (mm(geometry.width), mm(geometry.height));
    let (doc, first_page, first_layer) =
        PdfDocument::new(export::DOCUMENT_TITLE, width, height, "Journal");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|err| ExportError::Render(err.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|err| ExportError::Render(err.to_string()))?;

    for (index, page) in layout.pages.iter().enumerate() {
        let (page_index, layer_index) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(width, height, "Journal")
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);

        // PDF space grows upwards from the bottom edge.
        for element in &page.elements {
            match element {
                Element::Text {
                    x,
                    y,
                    size,
                    weight,
                    text,
                } => {
                    let font = match weight {
                        FontWeight::Regular => &regular,
                        FontWeight::Bold => &bold,
                    };
                    layer.use_text(text.clone(), *size, mm(*x), mm(geometry.height - *y), font);
                }
                Element::Box {
                    x,
                    y,
                    width: box_width,
                    height: box_height,
                } => {
                    let rect = Rect::new(
                        mm(*x),
                        mm(geometry.height - *y - *box_height),
                        mm(*x + *box_width),
                        mm(geometry.height - *y),
                    )
                    .with_mode(PaintMode::Stroke);
                    layer.add_rect(rect);
                }
            }
        }
    }

    doc.save_to_bytes()
        .map_err(|err| ExportError::Render(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::content::eco_responders;

    #[test]
    fn fresh_journal_renders_a_pdf() {
        let script = eco_responders().unwrap();
        let state = ProgressState::new(script.entry_id().clone());
        let service = ExportService::new(".");
        let bytes = render_pdf(&service.layout(&script, &state)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn target_is_fixed_file_name() {
        let service = ExportService::new("/tmp/out");
        assert_eq!(service.target_path(), PathBuf::from("/tmp/out/My_Journal.pdf"));
    }
}
