//! QR code images for the report.

use anyhow::{Context, Result, anyhow, bail};
use base64::{Engine as _, engine::general_purpose};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, GrayImage, ImageEncoder, Luma};
use qrcode::{Color, QrCode};

/// Quiet-zone border, in modules.
const QUIET_ZONE: u32 = 4;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Largest accepted pixel size of one module.
pub const MAX_MODULE_PX: u32 = 64;

/// Render `text` as a grayscale PNG, `module_px` pixels per module.
pub fn qr_png(text: &str, module_px: u32) -> Result<Vec<u8>> {
    if module_px > MAX_MODULE_PX {
        bail!("QR module size {module_px}px exceeds {MAX_MODULE_PX}px");
    }
    let module_px = module_px.max(1);
    let code = QrCode::new(text.as_bytes()).context("cannot encode QR code")?;
    let width = u32::try_from(code.width()).context("QR code too large")?;
    let colors = code.to_colors();
    let size = width
        .checked_add(QUIET_ZONE * 2)
        .and_then(|modules| modules.checked_mul(module_px))
        .ok_or_else(|| anyhow!("QR image size overflows for {module_px}px modules"))?;

    let img = GrayImage::from_fn(size, size, |x, y| {
        let mx = (x / module_px).checked_sub(QUIET_ZONE);
        let my = (y / module_px).checked_sub(QUIET_ZONE);
        match (mx, my) {
            (Some(mx), Some(my)) if mx < width && my < width => {
                if colors[(my * width + mx) as usize] == Color::Dark {
                    DARK
                } else {
                    LIGHT
                }
            }
            _ => LIGHT,
        }
    });

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(img.as_raw(), size, size, ExtendedColorType::L8)
        .context("cannot encode PNG")?;
    Ok(png)
}

/// `data:image/png;base64,...` for embedding in an `<img>` tag.
pub fn qr_data_uri(text: &str, module_px: u32) -> Result<String> {
    let png = qr_png(text, module_px)?;
    Ok(format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(png)
    ))
}
