//! In-process capture: fragment layout, rasterization and a paginated PDF.
//!
//! Every fragment is laid out on its own SVG canvas as wide as the printable
//! area, rasterized at `pixel_density` and cut into page-high slices. Each
//! cycle therefore starts on a fresh page, and no content is cropped.

use async_trait::async_trait;
use log::debug;
use printpdf::image_crate::{DynamicImage, RgbImage};
use printpdf::{BuiltinFont, Image, ImageTransform, Mm, PdfDocument};

use super::{settle, CaptureFailure, CaptureResult, CaptureStrategy, FailureKind};
use crate::config::ExportConfig;
use crate::converters::html::{is_content_empty, prepare_for_capture, VisualFragment};
use crate::converters::svg::{convert_fragment_to_svg, LayoutOptions, PX_PER_MM};
use crate::models::export::{CaptureOutput, Document};

const NAME: &str = "raster";

/// Running header/footer font size in points.
const RUNNING_TEXT_PT: f32 = 8.0;

/// One page-high slice of a rasterized fragment, RGB8.
struct Slice {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

pub struct RasterStrategy {
    config: ExportConfig,
}

impl RasterStrategy {
    pub fn new(config: ExportConfig) -> Self {
        RasterStrategy { config }
    }
}

#[async_trait]
impl CaptureStrategy for RasterStrategy {
    fn name(&self) -> &str {
        NAME
    }

    async fn attempt_capture(&self, fragments: &[VisualFragment]) -> CaptureResult {
        let prepared = prepare_for_capture(fragments);
        if is_content_empty(&prepared) {
            return Err(CaptureFailure::new(
                NAME,
                FailureKind::ZeroContent,
                "no cycle or table content to render",
            ));
        }
        settle(self.config.settle_delay()).await;

        let config = self.config.clone();
        let bytes = tokio::task::spawn_blocking(move || render_pdf(&prepared, &config))
            .await
            .map_err(|e| CaptureFailure::new(NAME, FailureKind::Internal, e.to_string()))??;

        Ok(CaptureOutput::Download(Document::pdf(
            bytes,
            self.config.filename("pdf"),
        )))
    }
}

/// Builds the whole PDF. Runs on a blocking thread.
fn render_pdf(fragments: &[VisualFragment], config: &ExportConfig) -> Result<Vec<u8>, CaptureFailure> {
    let (page_w, page_h) = config.page_format.size_mm(config.landscape);
    let margin = config.margin_mm;
    let density = config.pixel_density;
    let layout = LayoutOptions::for_page(page_w, margin, config.page_style.clone());

    // Content height of one page in raster pixels.
    let slice_px = ((page_h - 2.0 * margin) * PX_PER_MM * f64::from(density)).floor() as u32;
    if slice_px == 0 {
        return Err(CaptureFailure::new(
            NAME,
            FailureKind::Internal,
            "page has no printable height",
        ));
    }

    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    options.font_family = config.page_style.primary_font().to_string();

    let mut slices = Vec::new();
    for fragment in fragments {
        let canvas = convert_fragment_to_svg(fragment, &layout)
            .map_err(|e| CaptureFailure::new(NAME, FailureKind::Internal, e.to_string()))?;
        let pixmap = rasterize(&canvas.svg, density, &options)?;
        debug!(
            "Rasterized cycle {} to {}x{} px",
            fragment.cycle_id,
            pixmap.width(),
            pixmap.height()
        );
        slices.extend(slice_pixmap(&pixmap, slice_px));
    }

    write_pdf(&slices, config)
}

fn rasterize(
    svg: &str,
    density: f32,
    options: &usvg::Options,
) -> Result<tiny_skia::Pixmap, CaptureFailure> {
    let tree = usvg::Tree::from_str(svg, options)
        .map_err(|e| CaptureFailure::new(NAME, FailureKind::Internal, format!("invalid SVG: {e}")))?;
    let size = tree.size();
    let width = (size.width() * density).ceil() as u32;
    let height = (size.height() * density).ceil() as u32;
    if width == 0 || height == 0 {
        return Err(CaptureFailure::new(
            NAME,
            FailureKind::RenderEmpty,
            format!("canvas is {width}x{height} px"),
        ));
    }

    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
        CaptureFailure::new(
            NAME,
            FailureKind::Internal,
            format!("cannot allocate a {width}x{height} px canvas"),
        )
    })?;
    pixmap.fill(tiny_skia::Color::WHITE);
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(density, density),
        &mut pixmap.as_mut(),
    );

    if is_blank(&pixmap) {
        return Err(CaptureFailure::new(
            NAME,
            FailureKind::RenderEmpty,
            "rasterized canvas is blank",
        ));
    }
    Ok(pixmap)
}

/// True when every pixel equals the first one.
fn is_blank(pixmap: &tiny_skia::Pixmap) -> bool {
    let data = pixmap.data();
    match data.get(..4) {
        Some(first) => data.chunks_exact(4).all(|px| px == first),
        None => true,
    }
}

/// Cuts the pixmap into contiguous horizontal slices of at most `slice_px` rows.
fn slice_pixmap(pixmap: &tiny_skia::Pixmap, slice_px: u32) -> Vec<Slice> {
    let width = pixmap.width();
    let stride = width as usize * 4;
    let data = pixmap.data();
    let mut slices = Vec::new();

    let mut top = 0;
    while top < pixmap.height() {
        let height = slice_px.min(pixmap.height() - top);
        let rows = &data[top as usize * stride..(top + height) as usize * stride];
        // The background is opaque, so dropping alpha keeps the colors exact.
        let rgb = rows
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();
        slices.push(Slice { width, height, rgb });
        top += height;
    }
    slices
}

fn write_pdf(slices: &[Slice], config: &ExportConfig) -> Result<Vec<u8>, CaptureFailure> {
    let internal = |e: printpdf::Error| CaptureFailure::new(NAME, FailureKind::Internal, e.to_string());
    let (page_w, page_h) = config.page_format.size_mm(config.landscape);
    let (page_w, page_h) = (page_w as f32, page_h as f32);
    let margin = config.margin_mm as f32;
    let dpi = 96.0 * config.pixel_density;
    let title = &config.page_style.title;
    let total = slices.len();

    let (doc, first_page, first_layer) = PdfDocument::new(title, Mm(page_w), Mm(page_h), "Layer 1");
    let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(internal)?;

    for (index, slice) in slices.iter().enumerate() {
        let (page, layer) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(page_w), Mm(page_h), "Layer 1")
        };
        let layer = doc.get_page(page).get_layer(layer);

        let buffer = RgbImage::from_raw(slice.width, slice.height, slice.rgb.clone()).ok_or_else(|| {
            CaptureFailure::new(NAME, FailureKind::Internal, "slice buffer size mismatch")
        })?;
        let slice_height_mm = slice.height as f32 / dpi * 25.4;
        Image::from_dynamic_image(&DynamicImage::ImageRgb8(buffer)).add_to_layer(
            layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(margin)),
                translate_y: Some(Mm(page_h - margin - slice_height_mm)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );

        // Running header and footer sit inside the margins.
        let text_y = margin / 2.0;
        layer.use_text(title.as_str(), RUNNING_TEXT_PT, Mm(margin), Mm(page_h - text_y), &font);
        layer.use_text(
            format!("Page {} of {}", index + 1, total),
            RUNNING_TEXT_PT,
            Mm(page_w - margin - 22.0),
            Mm(text_y),
            &font,
        );
    }

    let bytes = doc.save_to_bytes().map_err(internal)?;
    if bytes.len() < 64 {
        return Err(CaptureFailure::new(
            NAME,
            FailureKind::RenderEmpty,
            format!("PDF is only {} bytes", bytes.len()),
        ));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn striped(width: u32, height: u32) -> tiny_skia::Pixmap {
        let mut pixmap = tiny_skia::Pixmap::new(width, height).unwrap();
        pixmap.fill(tiny_skia::Color::WHITE);
        let paint = {
            let mut p = tiny_skia::Paint::default();
            p.set_color_rgba8(200, 0, 0, 255);
            p
        };
        let rect = tiny_skia::Rect::from_xywh(0.0, 0.0, width as f32, 2.0).unwrap();
        pixmap.fill_rect(rect, &paint, tiny_skia::Transform::identity(), None);
        pixmap
    }

    #[test]
    fn blank_detection() {
        let mut plain = tiny_skia::Pixmap::new(4, 4).unwrap();
        plain.fill(tiny_skia::Color::WHITE);
        assert!(is_blank(&plain));
        assert!(!is_blank(&striped(4, 4)));
    }

    #[test]
    fn slices_cover_every_row_without_overlap() {
        let pixmap = striped(3, 10);
        let slices = slice_pixmap(&pixmap, 4);
        let heights: Vec<u32> = slices.iter().map(|s| s.height).collect();
        assert_eq!(heights, vec![4, 4, 2]);
        assert!(slices.iter().all(|s| s.rgb.len() == (s.width * s.height * 3) as usize));
        // First rows are the red stripe.
        assert_eq!(&slices[0].rgb[..3], &[200, 0, 0]);
    }

    #[test]
    fn writes_one_page_per_slice() {
        let slices = slice_pixmap(&striped(20, 30), 10);
        let config = ExportConfig::default();
        let bytes = write_pdf(&slices, &config).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
