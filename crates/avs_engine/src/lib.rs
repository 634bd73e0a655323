//! AVS engine: receipt fetching and extraction, batch aggregation, PDF
//! rendering and file persistence.
mod aggregate;
mod decode;
mod extract;
mod fetch;
mod filename;
mod persist;
mod receipt;
mod render;
mod types;

pub use aggregate::{aggregate, ChannelProgressSink, NullProgressSink, ProgressSink};
pub use decode::{decode_html, decode_page, DecodedHtml};
pub use extract::{ReceiptFieldStrategy, SelectorConfig, SelectorError, SelectorStrategy};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher, BROWSER_USER_AGENT};
pub use filename::session_filename;
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use receipt::{parse_issued_at, Clock, ReceiptExtractor, ReceiptSource};
pub use render::{DocumentRenderer, PdfRenderer, RenderError};
pub use types::{
    AggregationEvent, ExtractionError, FailureKind, FetchError, FetchMetadata, FetchOutput,
    ReceiptField,
};
