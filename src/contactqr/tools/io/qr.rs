use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use tracing::{debug, instrument};

use crate::contactqr::tools::error::{Result, ToolError};
use crate::contactqr::tools::model::png_path_for;

/// Edge length of every rendered QR image, in pixels.
pub const QR_IMAGE_SIZE: u32 = 256;

/// Reads a vCard file and writes its QR code next to it as `<stem>.png`.
///
/// Returns the path of the written image.
#[instrument(level = "debug", skip_all, fields(vcf = %vcf_path.display()))]
pub fn write_qr_for_vcard(vcf_path: &Path) -> Result<PathBuf> {
    if vcf_path.file_stem().is_none_or(|stem| stem.is_empty()) {
        return Err(ToolError::InvalidVCardPath(vcf_path.to_path_buf()));
    }

    let content = fs::read_to_string(vcf_path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => ToolError::FileNotFound(vcf_path.to_path_buf()),
        _ => ToolError::Io(err),
    })?;
    if content.is_empty() {
        return Err(ToolError::EmptyFile(vcf_path.to_path_buf()));
    }

    let png_path = png_path_for(vcf_path);
    write_qr_png(&content, &png_path)?;
    debug!(png = %png_path.display(), "QR code written");
    Ok(png_path)
}

/// Encodes `text` with medium error correction and saves it as a
/// [`QR_IMAGE_SIZE`] square PNG.
pub fn write_qr_png(text: &str, png_path: &Path) -> Result<()> {
    let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::M)
        .map_err(|err| ToolError::Encode(err.to_string()))?;

    let rendered = code
        .render::<Luma<u8>>()
        .max_dimensions(QR_IMAGE_SIZE, QR_IMAGE_SIZE)
        .build();
    let sized = center_on_canvas(&rendered);

    sized.save_with_format(png_path, ImageFormat::Png)?;
    Ok(())
}

/// Pads a whole-module render onto a white [`QR_IMAGE_SIZE`] square so every
/// module keeps the same pixel width. Codes too dense to fit at one pixel per
/// module are scaled down instead.
fn center_on_canvas(rendered: &GrayImage) -> GrayImage {
    let (width, height) = rendered.dimensions();
    if width > QR_IMAGE_SIZE || height > QR_IMAGE_SIZE {
        return imageops::resize(rendered, QR_IMAGE_SIZE, QR_IMAGE_SIZE, FilterType::Nearest);
    }

    let mut canvas = GrayImage::from_pixel(QR_IMAGE_SIZE, QR_IMAGE_SIZE, Luma([255]));
    let x = i64::from((QR_IMAGE_SIZE - width) / 2);
    let y = i64::from((QR_IMAGE_SIZE - height) / 2);
    imageops::overlay(&mut canvas, rendered, x, y);
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_fixed_size_png_next_to_vcard() {
        let dir = tempdir().expect("temporary directory");
        let vcf = dir.path().join("a01.vcf");
        fs::write(&vcf, "BEGIN:VCARD\nVERSION:3.0\nFN:Test\nEND:VCARD\n").expect("vCard written");

        let png = write_qr_for_vcard(&vcf).expect("QR written");

        assert_eq!(png, dir.path().join("a01.png"));
        let decoded = image::open(&png).expect("PNG decoded");
        assert_eq!(decoded.width(), QR_IMAGE_SIZE);
        assert_eq!(decoded.height(), QR_IMAGE_SIZE);
    }

    #[test]
    fn smaller_render_is_centered_without_resampling() {
        let rendered = GrayImage::from_pixel(195, 195, Luma([0]));

        let canvas = center_on_canvas(&rendered);

        assert_eq!(canvas.dimensions(), (QR_IMAGE_SIZE, QR_IMAGE_SIZE));
        assert_eq!(canvas.get_pixel(29, 29), &Luma([255]));
        assert_eq!(canvas.get_pixel(30, 30), &Luma([0]));
        assert_eq!(canvas.get_pixel(224, 224), &Luma([0]));
        assert_eq!(canvas.get_pixel(225, 225), &Luma([255]));
        let dark = canvas.pixels().filter(|pixel| pixel.0[0] == 0).count();
        assert_eq!(dark, 195 * 195);
    }

    #[test]
    fn modules_keep_an_even_width() {
        let payload = b"BEGIN:VCARD\nFN:Test\nEND:VCARD\n";
        let code =
            QrCode::with_error_correction_level(payload, EcLevel::M).expect("payload encodes");
        let rendered = code
            .render::<Luma<u8>>()
            .max_dimensions(QR_IMAGE_SIZE, QR_IMAGE_SIZE)
            .build();
        let modules = code.width() as u32 + 8;
        assert_eq!(rendered.width() % modules, 0);

        let canvas = center_on_canvas(&rendered);
        let offset = (QR_IMAGE_SIZE - rendered.width()) / 2;
        let module_px = rendered.width() / modules;
        // The top-left finder pattern starts after the four-module quiet zone.
        let finder = offset + 4 * module_px;
        assert_eq!(canvas.get_pixel(finder, finder), &Luma([0]));
        assert_eq!(canvas.get_pixel(finder - 1, finder), &Luma([255]));
        assert_eq!(canvas.get_pixel(finder + 7 * module_px - 1, finder), &Luma([0]));
        assert_eq!(canvas.get_pixel(finder + 7 * module_px, finder), &Luma([255]));
    }

    #[test]
    fn empty_vcard_is_rejected_without_output() {
        let dir = tempdir().expect("temporary directory");
        let vcf = dir.path().join("empty.vcf");
        fs::write(&vcf, "").expect("vCard written");

        let error = write_qr_for_vcard(&vcf).expect_err("empty input rejected");

        assert!(matches!(error, ToolError::EmptyFile(_)));
        assert!(!dir.path().join("empty.png").exists());
    }

    #[test]
    fn missing_vcard_is_reported() {
        let dir = tempdir().expect("temporary directory");
        let error = write_qr_for_vcard(&dir.path().join("ghost.vcf")).expect_err("missing input");
        assert!(matches!(error, ToolError::FileNotFound(_)));
    }

    #[test]
    fn nameless_path_is_rejected() {
        let error = write_qr_for_vcard(Path::new("")).expect_err("invalid path");
        assert!(matches!(error, ToolError::InvalidVCardPath(_)));
    }
}
