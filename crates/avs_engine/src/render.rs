use avs_core::{AvsDocument, DrawOp, PAGE_HEIGHT, PAGE_WIDTH};
use avs_logging::avs_debug;
use encoding_rs::WINDOWS_1252;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use thiserror::Error;

const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";
const STROKE_WIDTH: f32 = 0.8;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),
}

/// Consumer of finished documents.
pub trait DocumentRenderer {
    fn render(&self, document: &AvsDocument) -> Result<Vec<u8>, RenderError>;
}

/// Single-page A4 output with the base-14 Helvetica fonts.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfRenderer;

impl DocumentRenderer for PdfRenderer {
    fn render(&self, document: &AvsDocument) -> Result<Vec<u8>, RenderError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(font("Helvetica"));
        let bold_id = doc.add_object(font("Helvetica-Bold"));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                REGULAR_FONT => regular_id,
                BOLD_FONT => bold_id,
            },
        });

        let content = Content {
            operations: operations(document),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).map_err(lopdf::Error::from)?;
        avs_debug!(
            "Rendered document sequence={} ({} bytes)",
            document.sequence,
            bytes.len()
        );
        Ok(bytes)
    }
}

fn font(base: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn operations(document: &AvsDocument) -> Vec<Operation> {
    let mut ops = vec![Operation::new("w", vec![STROKE_WIDTH.into()])];
    for op in document.instructions() {
        match op {
            DrawOp::Text {
                x,
                y,
                size,
                bold,
                text,
            } => {
                let font = if *bold { BOLD_FONT } else { REGULAR_FONT };
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new("Tf", vec![font.into(), (*size).into()]));
                ops.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(win_ansi(text))],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
            DrawOp::Rect {
                x,
                y,
                width,
                height,
            } => {
                ops.push(rect(*x, *y, *width, *height));
                ops.push(Operation::new("S", vec![]));
            }
            DrawOp::Line { x1, y1, x2, y2 } => {
                ops.extend(line(*x1, *y1, *x2, *y2));
            }
            DrawOp::CheckBox {
                x,
                y,
                size,
                checked,
            } => {
                ops.push(rect(*x, *y, *size, *size));
                ops.push(Operation::new("S", vec![]));
                if *checked {
                    ops.extend(line(*x, *y, x + size, y + size));
                    ops.extend(line(*x, y + size, x + size, *y));
                }
            }
        }
    }
    ops
}

fn rect(x: f32, y: f32, width: f32, height: f32) -> Operation {
    Operation::new(
        "re",
        vec![x.into(), y.into(), width.into(), height.into()],
    )
}

fn line(x1: f32, y1: f32, x2: f32, y2: f32) -> [Operation; 3] {
    [
        Operation::new("m", vec![x1.into(), y1.into()]),
        Operation::new("l", vec![x2.into(), y2.into()]),
        Operation::new("S", vec![]),
    ]
}

// The standard fonts use WinAnsiEncoding; characters outside it are replaced.
fn win_ansi(text: &str) -> Vec<u8> {
    let (bytes, _, _) = WINDOWS_1252.encode(text);
    bytes.into_owned()
}
