//! AVS core: pure domain model, currency handling, session and office
//! contracts, and document layout.
pub mod currency;
mod document;
mod error;
mod model;
mod office;
mod profile;
mod session;
mod view_model;

pub use currency::{format_amount, parse_amount, ParseError};
pub use document::{
    build_document, generate_document, AvsDocument, Block, DrawOp, Section, MARGIN, PAGE_HEIGHT,
    PAGE_WIDTH, TABLE_COLUMNS, TABLE_ROW_HEIGHT,
};
pub use error::{DocumentError, StoreError};
pub use model::{
    AggregationBuilder, AggregationResult, FailedUrl, LineItem, ReceiptRecord, TripMetadata,
    DATE_FORMAT,
};
pub use office::{InMemoryOfficeConfig, OfficeConfig, OfficeConfigStore};
pub use profile::{resolve_profile, RequestKind, ServantType, TravelerProfile};
pub use session::{InMemorySession, SessionContext, SessionStore};
pub use view_model::AuthorizationSummary;
