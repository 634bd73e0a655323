//! Travel-authorization layout: turns an aggregation, a traveler and the office
//! record into an ordered list of draw instructions for a rendering sink.
//!
//! Coordinates are PDF points on an A4 page with the origin at the bottom-left.

use avs_logging::{avs_info, avs_warn};
use chrono::NaiveDate;

use crate::model::DATE_FORMAT;
use crate::profile::{resolve_profile, RequestKind, ServantType};
use crate::{
    AggregationResult, DocumentError, LineItem, OfficeConfig, OfficeConfigStore, TravelerProfile,
    TripMetadata,
};

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;
pub const MARGIN: f32 = 40.0;

/// Left edges of the item table columns, followed by the right edge of the table.
pub const TABLE_COLUMNS: [f32; 5] = [MARGIN, 110.0, 180.0, 455.0, PAGE_WIDTH - MARGIN];
pub const TABLE_ROW_HEIGHT: f32 = 16.0;

const TITLE: &str = "AUTORIZAÇÃO DE VIAGEM E SUPRIMENTO - AVS";
const BODY_SIZE: f32 = 10.0;
const CHECKBOX_SIZE: f32 = 8.0;
const CELL_PADDING: f32 = 3.0;
// Roughly what fits in the description column at the body font size.
const DESCRIPTION_MAX_CHARS: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    RequestType,
    Identity,
    ServantType,
    Trip,
    ItemTable,
    Total,
    Banking,
    Signatures,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        size: f32,
        bold: bool,
        text: String,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    CheckBox {
        x: f32,
        y: f32,
        size: f32,
        checked: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub section: Section,
    pub ops: Vec<DrawOp>,
}

/// A finished single-page document.
#[derive(Debug, Clone, PartialEq)]
pub struct AvsDocument {
    pub sequence: u32,
    pub blocks: Vec<Block>,
}

impl AvsDocument {
    pub fn sections(&self) -> Vec<Section> {
        self.blocks.iter().map(|block| block.section).collect()
    }

    pub fn block(&self, section: Section) -> Option<&Block> {
        self.blocks.iter().find(|block| block.section == section)
    }

    /// All draw instructions in rendering order.
    pub fn instructions(&self) -> impl Iterator<Item = &DrawOp> {
        self.blocks.iter().flat_map(|block| block.ops.iter())
    }

    /// Every text run, in order. Handy for summaries and assertions.
    pub fn texts(&self) -> Vec<&str> {
        self.instructions()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Validate the request, then consume one sequence number and lay out the document.
///
/// Profile resolution and the empty-aggregation check run before the office
/// store is touched, so a refused request leaves the counter unchanged.
pub fn generate_document(
    profiles: &[TravelerProfile],
    profile_index: usize,
    office: &mut dyn OfficeConfigStore,
    aggregation: Option<&AggregationResult>,
    trip: &TripMetadata,
    issued_on: NaiveDate,
) -> Result<AvsDocument, DocumentError> {
    let profile = resolve_profile(profiles, profile_index).inspect_err(|err| {
        avs_warn!("Document refused: {}", err);
    })?;
    let aggregation = match aggregation {
        Some(result) if !result.is_empty() => result,
        _ => {
            avs_warn!("Document refused: nothing aggregated");
            return Err(DocumentError::EmptyAggregation);
        }
    };

    let config = office.load()?;
    let sequence = office.consume_sequence()?;
    let document = build_document(profile, &config, aggregation, trip, sequence, issued_on);
    avs_info!(
        "Built document sequence={} items={} total={}",
        sequence,
        aggregation.items.len(),
        aggregation.combined_total
    );
    Ok(document)
}

/// Pure layout of an already validated request.
pub fn build_document(
    profile: &TravelerProfile,
    config: &OfficeConfig,
    aggregation: &AggregationResult,
    trip: &TripMetadata,
    sequence: u32,
    issued_on: NaiveDate,
) -> AvsDocument {
    let mut layout = Layout::new();

    layout.header(config, sequence, issued_on);
    layout.request_type(RequestKind::from_request_type(&trip.request_type));
    layout.identity(profile);
    layout.servant_type(ServantType::from_stored(&profile.servant_type));
    layout.trip(config, trip);
    layout.item_table(&aggregation.items);
    layout.total(&aggregation.combined_total);
    layout.banking(profile);
    layout.signatures(profile, config, issued_on);

    AvsDocument {
        sequence,
        blocks: layout.blocks,
    }
}

struct Layout {
    blocks: Vec<Block>,
    cursor: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            blocks: Vec::new(),
            cursor: PAGE_HEIGHT - MARGIN,
        }
    }

    fn push(&mut self, section: Section, ops: Vec<DrawOp>) {
        self.blocks.push(Block { section, ops });
    }

    fn advance(&mut self, by: f32) -> f32 {
        self.cursor -= by;
        self.cursor
    }

    fn header(&mut self, config: &OfficeConfig, sequence: u32, issued_on: NaiveDate) {
        let y = self.advance(4.0);
        let mut ops = vec![text(MARGIN, y, 13.0, true, &config.office_name)];
        let y = self.advance(20.0);
        ops.push(text(MARGIN, y, 12.0, true, TITLE));
        ops.push(text(
            PAGE_WIDTH - MARGIN - 90.0,
            y,
            12.0,
            true,
            &format!("Nº {:04}/{}", sequence, issued_on.format("%Y")),
        ));
        let y = self.advance(8.0);
        ops.push(DrawOp::Line {
            x1: MARGIN,
            y1: y,
            x2: PAGE_WIDTH - MARGIN,
            y2: y,
        });
        self.push(Section::Header, ops);
    }

    fn request_type(&mut self, kind: RequestKind) {
        let y = self.advance(22.0);
        let mut ops = Vec::new();
        checkbox(&mut ops, MARGIN, y, kind.advance, "Adiantamento");
        checkbox(&mut ops, MARGIN + 160.0, y, kind.reimbursement, "Ressarcimento");
        self.push(Section::RequestType, ops);
    }

    fn identity(&mut self, profile: &TravelerProfile) {
        let mut ops = Vec::new();
        let y = self.advance(24.0);
        ops.push(labelled(MARGIN, y, "Nome", &profile.name));
        let y = self.advance(15.0);
        ops.push(labelled(MARGIN, y, "Cargo", &profile.job_title));
        let y = self.advance(15.0);
        ops.push(labelled(MARGIN, y, "Matrícula", &profile.registration));
        ops.push(labelled(MARGIN + 260.0, y, "CPF", &profile.tax_id));
        self.push(Section::Identity, ops);
    }

    fn servant_type(&mut self, matched: Option<ServantType>) {
        let y = self.advance(22.0);
        let mut ops = Vec::new();
        let mut x = MARGIN;
        for kind in ServantType::ALL {
            checkbox(&mut ops, x, y, matched == Some(kind), kind.label());
            x += 130.0;
        }
        self.push(Section::ServantType, ops);
    }

    fn trip(&mut self, config: &OfficeConfig, trip: &TripMetadata) {
        let y = self.advance(24.0);
        let ops = vec![
            labelled(MARGIN, y, "Origem", &config.departure_city),
            labelled(MARGIN + 260.0, y, "Destino", &trip.destination),
        ];
        self.push(Section::Trip, ops);
    }

    fn item_table(&mut self, items: &[LineItem]) {
        self.advance(14.0);
        let mut ops = Vec::new();
        self.table_row(&mut ops, ["Nº", "Data", "Descrição", "Valor (R$)"], true);
        for item in items {
            let description = truncate(&item.description, DESCRIPTION_MAX_CHARS);
            self.table_row(
                &mut ops,
                [&item.number, &item.date, &description, &item.value],
                false,
            );
        }
        self.push(Section::ItemTable, ops);
    }

    fn table_row(&mut self, ops: &mut Vec<DrawOp>, cells: [&str; 4], bold: bool) {
        let top = self.cursor;
        let bottom = self.advance(TABLE_ROW_HEIGHT);
        for (column, cell) in cells.iter().enumerate() {
            let left = TABLE_COLUMNS[column];
            let right = TABLE_COLUMNS[column + 1];
            ops.push(DrawOp::Rect {
                x: left,
                y: bottom,
                width: right - left,
                height: top - bottom,
            });
            ops.push(text(
                left + CELL_PADDING,
                bottom + 4.5,
                BODY_SIZE - 1.0,
                bold,
                cell,
            ));
        }
    }

    fn total(&mut self, combined_total: &str) {
        let height = 20.0;
        let bottom = self.advance(height + 8.0);
        let left = TABLE_COLUMNS[2];
        let ops = vec![
            DrawOp::Rect {
                x: left,
                y: bottom,
                width: TABLE_COLUMNS[4] - left,
                height,
            },
            text(
                left + CELL_PADDING,
                bottom + 6.0,
                11.0,
                true,
                &format!("VALOR TOTAL: R$ {combined_total}"),
            ),
        ];
        self.push(Section::Total, ops);
    }

    fn banking(&mut self, profile: &TravelerProfile) {
        let mut ops = Vec::new();
        let y = self.advance(30.0);
        ops.push(text(MARGIN, y, BODY_SIZE, true, "Dados bancários"));
        let y = self.advance(15.0);
        ops.push(labelled(MARGIN, y, "Banco", &profile.bank_name));
        ops.push(labelled(MARGIN + 200.0, y, "Agência", &profile.bank_agency));
        ops.push(labelled(MARGIN + 340.0, y, "Conta", &profile.account_number));
        self.push(Section::Banking, ops);
    }

    fn signatures(&mut self, profile: &TravelerProfile, config: &OfficeConfig, issued_on: NaiveDate) {
        let mut ops = Vec::new();
        let y = self.advance(30.0);
        ops.push(text(
            MARGIN,
            y,
            BODY_SIZE,
            false,
            &format!("{}, {}", config.departure_city, issued_on.format(DATE_FORMAT)),
        ));

        let line_y = self.advance(50.0);
        let width = 220.0;
        let right_x = PAGE_WIDTH - MARGIN - width;
        for (x, name, role) in [
            (MARGIN, profile.name.as_str(), "Servidor(a)"),
            (
                right_x,
                config.responsible_name.as_str(),
                config.responsible_title.as_str(),
            ),
        ] {
            ops.push(DrawOp::Line {
                x1: x,
                y1: line_y,
                x2: x + width,
                y2: line_y,
            });
            ops.push(text(x, line_y - 12.0, BODY_SIZE, false, name));
            ops.push(text(x, line_y - 24.0, BODY_SIZE - 1.0, false, role));
        }
        self.advance(24.0);
        self.push(Section::Signatures, ops);
    }
}

fn text(x: f32, y: f32, size: f32, bold: bool, value: &str) -> DrawOp {
    DrawOp::Text {
        x,
        y,
        size,
        bold,
        text: value.to_string(),
    }
}

fn labelled(x: f32, y: f32, label: &str, value: &str) -> DrawOp {
    text(x, y, BODY_SIZE, false, &format!("{label}: {value}"))
}

fn checkbox(ops: &mut Vec<DrawOp>, x: f32, y: f32, checked: bool, label: &str) {
    ops.push(DrawOp::CheckBox {
        x,
        y,
        size: CHECKBOX_SIZE,
        checked,
    });
    ops.push(text(x + CHECKBOX_SIZE + 4.0, y, BODY_SIZE, false, label));
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
