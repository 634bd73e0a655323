use std::sync::mpsc;

use avs_core::{AggregationBuilder, AggregationResult};
use avs_logging::{avs_info, avs_warn};

use crate::receipt::ReceiptSource;
use crate::AggregationEvent;

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: AggregationEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: AggregationEvent) {}
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<AggregationEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<AggregationEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: AggregationEvent) {
        let _ = self.tx.send(event);
    }
}

/// Runs the extractor over every URL, strictly one after another and in the
/// given order. Per-URL failures are collected, never propagated.
pub async fn aggregate(
    source: &dyn ReceiptSource,
    urls: &[String],
    sink: &dyn ProgressSink,
) -> AggregationResult {
    sink.emit(AggregationEvent::Started {
        url_count: urls.len(),
    });

    let mut builder = AggregationBuilder::new();
    for (index, url) in urls.iter().enumerate() {
        match source.extract(url).await {
            Ok(record) => match builder.record_receipt(&record) {
                Ok(()) => sink.emit(AggregationEvent::Extracted {
                    index,
                    url: url.clone(),
                    total: record.total.clone(),
                }),
                Err(err) => sink.emit(AggregationEvent::Failed {
                    index,
                    url: url.clone(),
                    reason: err.to_string(),
                }),
            },
            Err(err) => {
                avs_warn!("Receipt {} of {} failed: {}", index + 1, urls.len(), err);
                let reason = err.to_string();
                builder.record_failure(url, reason.clone());
                sink.emit(AggregationEvent::Failed {
                    index,
                    url: url.clone(),
                    reason,
                });
            }
        }
    }

    let result = builder.finish();
    avs_info!(
        "Aggregated {} receipts ({} failed), total {}",
        result.items.len(),
        result.failed_urls.len(),
        result.combined_total
    );
    sink.emit(AggregationEvent::Finished {
        succeeded: result.items.len(),
        failed: result.failed_urls.len(),
        combined_total: result.combined_total.clone(),
    });
    result
}
