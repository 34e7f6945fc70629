//! PDF rendering of a laid-out document

use image::GenericImageView;
use printpdf::{
    Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Point,
};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants;
use crate::error::{ExportError, Result};
use crate::layout::{DocumentLayout, Element, FontWeight};

/// DejaVu Sans, embedded for any font slot left empty. Covers ₹ and →.
const BUNDLED_REGULAR: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
const BUNDLED_BOLD: &[u8] = include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf");

/// Optional TrueType fonts replacing the bundled DejaVu Sans pair. A
/// replacement needs glyphs for ₹ and →; characters the font lacks are
/// dropped from the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontFiles {
    pub regular: Option<PathBuf>,
    pub bold: Option<PathBuf>,
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn get(&self, weight: FontWeight) -> &IndirectFontRef {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }
}

/// Render every page of `layout` and return the PDF bytes
pub fn render_pdf(layout: &DocumentLayout, font_files: &FontFiles) -> Result<Vec<u8>> {
    let geometry = layout.geometry;
    let (doc, first_page, first_layer) = PdfDocument::new(
        layout.title.as_str(),
        Mm(geometry.width),
        Mm(geometry.height),
        constants::PDF_LAYER_NAME,
    );

    let fonts = Fonts {
        regular: load_font(&doc, font_files.regular.as_deref(), BUNDLED_REGULAR)?,
        bold: load_font(&doc, font_files.bold.as_deref(), BUNDLED_BOLD)?,
    };

    for (index, page) in layout.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) =
                doc.add_page(Mm(geometry.width), Mm(geometry.height), constants::PDF_LAYER_NAME);
            doc.get_page(page_index).get_layer(layer_index)
        };

        for element in &page.elements {
            draw(&layer, element, geometry.height, &fonts);
        }
    }

    debug!(pages = layout.pages.len(), title = %layout.title, "Rendering PDF");
    doc.save_to_bytes()
        .map_err(|e| ExportError::document(format!("failed to serialize PDF: {e:?}")))
}

fn load_font(doc: &PdfDocumentReference, path: Option<&Path>, bundled: &'static [u8]) -> Result<IndirectFontRef> {
    match path {
        Some(path) => {
            let file = std::fs::File::open(path)
                .map_err(|e| ExportError::font(format!("{}: {e}", path.display())))?;
            doc.add_external_font(file)
                .map_err(|e| ExportError::font(format!("{}: {e:?}", path.display())))
        }
        None => doc
            .add_external_font(bundled)
            .map_err(|e| ExportError::font(format!("bundled font: {e:?}"))),
    }
}

/// Draw one element; `page_height` flips layout Y (top-down) to PDF Y (bottom-up)
fn draw(layer: &PdfLayerReference, element: &Element, page_height: f32, fonts: &Fonts) {
    match element {
        Element::Text {
            x,
            y,
            size,
            weight,
            text,
        } => {
            layer.use_text(text.as_str(), *size, Mm(*x), Mm(page_height - y), fonts.get(*weight));
        }
        Element::Rule {
            x1,
            y1,
            x2,
            y2,
            thickness,
        } => {
            layer.set_outline_thickness(*thickness);
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(*x1), Mm(page_height - y1)), false),
                    (Point::new(Mm(*x2), Mm(page_height - y2)), false),
                ],
                is_closed: false,
            });
        }
        Element::Image {
            x,
            y,
            width,
            height,
            image,
        } => {
            // Scale through the DPI so the raster spans exactly `width` mm
            let dpi = image.width() as f32 * 25.4 / width;
            let rgb = image::DynamicImage::ImageRgb8(image.to_rgb8());
            Image::from_dynamic_image(&rgb).add_to_layer(
                layer.clone(),
                ImageTransform {
                    translate_x: Some(Mm(*x)),
                    translate_y: Some(Mm(page_height - y - height)),
                    dpi: Some(dpi),
                    ..Default::default()
                },
            );
        }
    }
}

/// Text of every page, one line per text run. Glyph IDs are mapped back
/// through each font's ToUnicode CMap.
#[cfg(test)]
pub(crate) fn extract_text(pdf: &[u8]) -> String {
    use printpdf::lopdf::{Document, Object, content::Content};
    use std::collections::HashMap;

    fn parse_cmap(cmap: &str) -> HashMap<u16, char> {
        cmap.lines()
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                let glyph = fields.next()?.strip_prefix('<')?.strip_suffix('>')?;
                let unicode = fields.next()?.strip_prefix('<')?.strip_suffix('>')?;
                let glyph = u16::from_str_radix(glyph, 16).ok()?;
                let unicode = char::from_u32(u32::from_str_radix(unicode, 16).ok()?)?;
                Some((glyph, unicode))
            })
            .collect()
    }

    let doc = Document::load_mem(pdf).unwrap();
    let mut text = String::new();

    for page_id in doc.get_pages().into_values() {
        // printpdf writes /Resources and /Font as indirect objects
        let fonts = doc
            .get_dictionary(page_id)
            .and_then(|page| page.get(b"Resources"))
            .and_then(|resources| doc.dereference(resources))
            .and_then(|(_, resources)| resources.as_dict())
            .and_then(|resources| resources.get(b"Font"))
            .and_then(|fonts| doc.dereference(fonts))
            .and_then(|(_, fonts)| fonts.as_dict())
            .unwrap();

        let cmaps: HashMap<Vec<u8>, HashMap<u16, char>> = fonts
            .iter()
            .map(|(name, font)| {
                let cmap = doc
                    .dereference(font)
                    .and_then(|(_, font)| font.as_dict())
                    .and_then(|font| font.get(b"ToUnicode"))
                    .and_then(|cmap| doc.dereference(cmap))
                    .and_then(|(_, cmap)| cmap.as_stream())
                    .map(|stream| stream.decompressed_content().unwrap_or_else(|_| stream.content.clone()))
                    .unwrap_or_default();
                (name.clone(), parse_cmap(&String::from_utf8_lossy(&cmap)))
            })
            .collect();

        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let mut current: Option<&HashMap<u16, char>> = None;
        for op in &content.operations {
            match op.operator.as_str() {
                "Tf" => {
                    current = op
                        .operands
                        .first()
                        .and_then(|name| name.as_name().ok())
                        .and_then(|name| cmaps.get(name));
                }
                "Tj" => {
                    if let (Some(Object::String(bytes, _)), Some(cmap)) = (op.operands.first(), current) {
                        for pair in bytes.chunks_exact(2) {
                            let glyph = u16::from_be_bytes([pair[0], pair[1]]);
                            text.extend(cmap.get(&glyph));
                        }
                    }
                }
                "ET" => text.push('\n'),
                _ => {}
            }
        }
    }
    text
}
