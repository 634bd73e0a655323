//! The inbound operations, one function each. Every handler receives the
//! session explicitly and performs one synchronous unit of work.

use avs_core::{
    generate_document, resolve_profile, AuthorizationSummary, DocumentError, OfficeConfigStore,
    SessionContext, StoreError, TravelerProfile, TripMetadata,
};
use avs_engine::{aggregate, DocumentRenderer, ProgressSink, ReceiptSource, RenderError};
use avs_logging::avs_info;
use chrono::NaiveDate;
use thiserror::Error;

/// Download name of the generated document.
pub const DOCUMENT_FILENAME: &str = "avs.pdf";

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[error("rendering failed: {0}")]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlAck {
    pub url: String,
    pub pending: usize,
}

pub fn add_url(session: &mut SessionContext<'_>, url: &str) -> Result<UrlAck, HandlerError> {
    let pending = session.add_url(url)?;
    Ok(UrlAck {
        url: url.trim().to_string(),
        pending,
    })
}

pub fn clear_urls(session: &mut SessionContext<'_>) -> Result<(), HandlerError> {
    session.clear()?;
    Ok(())
}

/// Aggregates every pending URL and stores the result for the document step.
///
/// The profile is resolved first; an invalid index stops here without
/// fetching anything or touching the stored aggregation.
pub async fn generate_authorization(
    session: &mut SessionContext<'_>,
    profiles: &[TravelerProfile],
    profile_index: usize,
    trip: TripMetadata,
    source: &dyn ReceiptSource,
    sink: &dyn ProgressSink,
) -> Result<AuthorizationSummary, HandlerError> {
    let profile = resolve_profile(profiles, profile_index)?;
    let urls = session.pending_urls()?;
    avs_info!(
        "Authorization requested for profile #{} with {} receipt urls",
        profile_index,
        urls.len()
    );

    let result = aggregate(source, &urls, sink).await;
    session.record_authorization(&result, &trip)?;
    Ok(AuthorizationSummary::new(profile, &trip, &result))
}

/// Builds and renders the document from the stored aggregation.
///
/// Refusals (unknown profile, nothing aggregated) leave the sequence counter
/// untouched. A rendering failure happens after the number was consumed.
pub fn generate_document_bytes(
    session: &SessionContext<'_>,
    profiles: &[TravelerProfile],
    profile_index: usize,
    office: &mut dyn OfficeConfigStore,
    renderer: &dyn DocumentRenderer,
    today: NaiveDate,
) -> Result<(u32, Vec<u8>), HandlerError> {
    let aggregation = session.aggregation()?;
    let trip = session.trip()?.unwrap_or_default();
    let document = generate_document(
        profiles,
        profile_index,
        office,
        aggregation.as_ref(),
        &trip,
        today,
    )?;
    let bytes = renderer.render(&document)?;
    Ok((document.sequence, bytes))
}
