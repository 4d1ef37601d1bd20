//! The "Pause & Get Code" artifacts: resume code, shareable link and its QR image.

use lesson_core::codec::{self, ResumeCode};
use lesson_core::model::ProgressState;
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use url::Url;

use crate::error::ShareError;

/// Smallest rendered edge of the QR image, in pixels.
pub const QR_MIN_SIZE: u32 = 170;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareArtifacts {
    pub code: ResumeCode,
    pub link: Url,
    /// Standalone SVG document of `link` as a QR code.
    pub qr_svg: String,
}

/// Encodes `state` and derives the link and QR image from the code.
///
/// # Errors
///
/// Returns `ShareError` if the state cannot be encoded, `base_url` does not parse,
/// or the link is too long for a QR code.
pub fn share_artifacts(state: &ProgressState, base_url: &str) -> Result<ShareArtifacts, ShareError> {
    let code = codec::encode(state)?;
    let base = Url::parse(base_url)?;
    let link = codec::build_shareable_link(&base, &code);
    let qr_svg = qr_svg(link.as_str())?;
    Ok(ShareArtifacts { code, link, qr_svg })
}

/// Renders `data` as a QR code SVG with medium error correction.
///
/// # Errors
///
/// Returns `ShareError::Qr` when `data` exceeds QR capacity.
pub fn qr_svg(data: &str) -> Result<String, ShareError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)
        .map_err(ShareError::Qr)?;
    Ok(code
        .render::<svg::Color<'_>>()
        .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}
