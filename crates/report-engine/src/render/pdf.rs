//! Commit stamped pages into a PDF document
//!
//! Fonts are the standard Helvetica pair, so the only embedded payload is
//! images. Each image resource is embedded once and shared by every page
//! that draws it.

use std::collections::HashMap;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::{debug, warn};

use super::overlay::{DrawOp, StampedPage};
use super::resources::{EmbeddedImage, ResourceLookup};
use crate::errors::RenderError;
use crate::layout::fonts::{encode_win_ansi, FontFace};
use crate::layout::styles::Rgb;
use crate::layout::templates::{PAGE_HEIGHT, PAGE_WIDTH};

/// Document information dictionary entries
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    pub subject: String,
}

/// Embedded image XObjects, keyed by resource name; `None` marks a miss
struct ImageCache<'a> {
    resources: &'a dyn ResourceLookup,
    embedded: HashMap<String, Option<(String, ObjectId)>>,
}

impl<'a> ImageCache<'a> {
    fn new(resources: &'a dyn ResourceLookup) -> Self {
        Self {
            resources,
            embedded: HashMap::new(),
        }
    }

    /// XObject name and id for a resource, embedding it on first use
    fn get(&mut self, doc: &mut Document, resource: &str) -> Option<(String, ObjectId)> {
        if let Some(entry) = self.embedded.get(resource) {
            return entry.clone();
        }
        let entry = match self.resources.image(resource) {
            Some(image) => {
                let name = format!("Im{}", self.embedded.len() + 1);
                let id = embed_image(doc, image);
                debug!(resource, xobject = %name, "Embedded image");
                Some((name, id))
            }
            None => {
                warn!(resource, "Image resource missing, element omitted");
                None
            }
        };
        self.embedded.insert(resource.to_string(), entry.clone());
        entry
    }
}

fn embed_image(doc: &mut Document, image: EmbeddedImage) -> ObjectId {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => image.width as i64,
        "Height" => image.height as i64,
        "ColorSpace" => image.color_space,
        "BitsPerComponent" => 8,
        "Filter" => image.filter.pdf_name(),
    };
    if let Some(mask) = image.soft_mask {
        let mask_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            mask,
        )
        .with_compression(false));
        dict.set("SMask", Object::Reference(mask_id));
    }
    // Already compressed; keep lopdf from deflating it again
    let stream = Stream::new(dict, image.data).with_compression(false);
    doc.add_object(stream)
}

fn real(value: f32) -> Object {
    Object::Real(value)
}

fn color_operands(color: Rgb) -> Vec<Object> {
    vec![real(color.0), real(color.1), real(color.2)]
}

/// Content stream operations for one drawing primitive
fn operations(op: &DrawOp, xobject: Option<&str>) -> Vec<Operation> {
    match op {
        DrawOp::Text {
            x,
            y,
            font,
            size,
            color,
            text,
            word_spacing,
        } => vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(font.resource_name().as_bytes().to_vec()), real(*size)],
            ),
            Operation::new("rg", color_operands(*color)),
            Operation::new("Tw", vec![real(*word_spacing)]),
            Operation::new("Td", vec![real(*x), real(*y)]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ],
        DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
            line_width,
        } => {
            let paint = match (fill.is_some(), stroke.is_some()) {
                (true, true) => "B",
                (true, false) => "f",
                (false, true) => "S",
                (false, false) => return Vec::new(),
            };
            let mut ops = vec![Operation::new("q", vec![])];
            if let Some(fill) = fill {
                ops.push(Operation::new("rg", color_operands(*fill)));
            }
            if let Some(stroke) = stroke {
                ops.push(Operation::new("RG", color_operands(*stroke)));
                ops.push(Operation::new("w", vec![real(*line_width)]));
            }
            ops.push(Operation::new(
                "re",
                vec![real(*x), real(*y), real(*width), real(*height)],
            ));
            ops.push(Operation::new(paint, vec![]));
            ops.push(Operation::new("Q", vec![]));
            ops
        }
        DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            color,
            width,
        } => vec![
            Operation::new("q", vec![]),
            Operation::new("RG", color_operands(*color)),
            Operation::new("w", vec![real(*width)]),
            Operation::new("m", vec![real(*x1), real(*y1)]),
            Operation::new("l", vec![real(*x2), real(*y2)]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ],
        DrawOp::Image {
            x,
            y,
            width,
            height,
            ..
        } => match xobject {
            Some(name) => vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![real(*width), real(0.0), real(0.0), real(*height), real(*x), real(*y)],
                ),
                Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
            None => Vec::new(),
        },
    }
}

/// Build the final document bytes from stamped pages
///
/// A document with no pages is still a valid, empty PDF.
pub fn write_pdf(
    pages: &[StampedPage],
    resources: &dyn ResourceLookup,
    info: &DocumentInfo,
) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for face in FontFace::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource_name(), Object::Reference(font_id));
    }

    let mut images = ImageCache::new(resources);
    let mut page_ids = Vec::with_capacity(pages.len());

    for page in pages {
        let mut operations_list = Vec::new();
        let mut xobjects = Dictionary::new();
        for op in &page.ops {
            let xobject = match op {
                DrawOp::Image { resource, .. } => match images.get(&mut doc, resource) {
                    Some((name, id)) => {
                        xobjects.set(name.as_str(), Object::Reference(id));
                        Some(name)
                    }
                    None => continue,
                },
                _ => None,
            };
            operations_list.extend(operations(op, xobject.as_deref()));
        }

        let content = Content {
            operations: operations_list,
        };
        let encoded = content
            .encode()
            .map_err(|e| RenderError::Encode(format!("page {}: {}", page.number, e)))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

        let mut page_resources = dictionary! {
            "Font" => Object::Dictionary(fonts.clone()),
        };
        if !xobjects.is_empty() {
            page_resources.set("XObject", Object::Dictionary(xobjects));
        }

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
            "Resources" => page_resources,
            "Contents" => Object::Reference(content_id),
        });
        page_ids.push(page_id);
    }

    let page_tree = dictionary! {
        "Type" => "Pages",
        "Count" => page_ids.len() as i64,
        "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
    };
    doc.objects.insert(pages_id, Object::Dictionary(page_tree));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(info.title.as_str()),
        "Author" => Object::string_literal(info.author.as_str()),
        "Subject" => Object::string_literal(info.subject.as_str()),
        "Producer" => Object::string_literal("esg-report-engine"),
    });
    doc.trailer.set("Info", Object::Reference(info_id));

    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| RenderError::Encode(format!("Save failed: {}", e)))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::styles::{StyleName, StyleSheet};
    use crate::layout::templates::TemplateKind;
    use crate::render::resources::{names, tests::tiny_png, MemoryResources};

    fn page(number: usize, ops: Vec<DrawOp>) -> StampedPage {
        StampedPage {
            number,
            template: TemplateKind::Body,
            ops,
        }
    }

    fn image(resource: &str) -> DrawOp {
        DrawOp::Image {
            resource: resource.to_string(),
            x: 10.0,
            y: 10.0,
            width: 36.0,
            height: 36.0,
        }
    }

    #[test]
    fn test_empty_document_is_valid() {
        let bytes = write_pdf(&[], &MemoryResources::new(), &DocumentInfo::default()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 0);
    }

    #[test]
    fn test_pages_carry_text() {
        let styles = StyleSheet::standard();
        let text = DrawOp::text(72.0, 700.0, styles.get(StyleName::Content), "Hello ESG", 0.0);
        let pages = vec![page(1, vec![text.clone()]), page(2, vec![text])];
        let bytes = write_pdf(&pages, &MemoryResources::new(), &DocumentInfo::default()).unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        let ops = Content::decode(&content).unwrap().operations;
        let shown: Vec<_> = ops
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| op.operands[0].as_str().ok())
            .collect();
        assert_eq!(shown, vec![b"Hello ESG".as_slice()]);
    }

    #[test]
    fn test_missing_image_is_omitted() {
        let pages = vec![page(1, vec![image(names::LOGOS[0])])];
        let bytes = write_pdf(&pages, &MemoryResources::new(), &DocumentInfo::default()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        let ops = Content::decode(&content).unwrap().operations;
        assert!(ops.iter().all(|op| op.operator != "Do"));
    }

    #[test]
    fn test_image_embedded_once_across_pages() {
        let resources = MemoryResources::new().with(
            names::LOGOS[0],
            tiny_png(png::ColorType::Rgb, &[0, 128, 255]),
        );
        let pages = vec![
            page(1, vec![image(names::LOGOS[0])]),
            page(2, vec![image(names::LOGOS[0])]),
        ];
        let bytes = write_pdf(&pages, &resources, &DocumentInfo::default()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let image_count = doc
            .objects
            .values()
            .filter(|o| {
                o.as_stream()
                    .ok()
                    .and_then(|s| s.dict.get(b"Subtype").ok())
                    .and_then(|s| s.as_name().ok())
                    == Some(b"Image".as_slice())
            })
            .count();
        assert_eq!(image_count, 1);
    }

    #[test]
    fn test_justified_text_sets_word_spacing() {
        let styles = StyleSheet::standard();
        let ops = operations(
            &DrawOp::text(0.0, 0.0, styles.get(StyleName::Content), "a b", 2.5),
            None,
        );
        let tw = ops.iter().find(|op| op.operator == "Tw").unwrap();
        assert_eq!(tw.operands, vec![Object::Real(2.5)]);
    }
}
