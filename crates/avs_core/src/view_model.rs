use serde::Serialize;

use crate::{AggregationResult, FailedUrl, LineItem, TravelerProfile, TripMetadata};

/// What the user sees after requesting an authorization.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AuthorizationSummary {
    pub traveler: String,
    pub destination: String,
    pub request_type: String,
    pub items: Vec<LineItem>,
    pub combined_total: String,
    pub issuers: Vec<String>,
    pub failed_urls: Vec<FailedUrl>,
    /// False when no receipt succeeded; the document cannot be generated.
    pub can_generate_document: bool,
}

impl AuthorizationSummary {
    pub fn new(profile: &TravelerProfile, trip: &TripMetadata, result: &AggregationResult) -> Self {
        Self {
            traveler: profile.name.clone(),
            destination: trip.destination.clone(),
            request_type: trip.request_type.clone(),
            items: result.items.clone(),
            combined_total: result.combined_total.clone(),
            issuers: result.issuers.iter().cloned().collect(),
            failed_urls: result.failed_urls.clone(),
            can_generate_document: !result.is_empty(),
        }
    }

    /// Plain-text rendering for terminal output.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Servidor(a): {}\n", self.traveler));
        out.push_str(&format!("Destino: {}\n", self.destination));
        out.push_str(&format!("Tipo de solicitação: {}\n", self.request_type));
        out.push('\n');
        for item in &self.items {
            out.push_str(&format!(
                "  {:<10} {:<10} {:<40} R$ {:>12}\n",
                item.number, item.date, item.description, item.value
            ));
        }
        out.push_str(&format!("\nValor total: R$ {}\n", self.combined_total));
        if !self.issuers.is_empty() {
            out.push_str(&format!("Emitentes: {}\n", self.issuers.join("; ")));
        }
        if !self.failed_urls.is_empty() {
            out.push_str("\nFalhas:\n");
            for failed in &self.failed_urls {
                out.push_str(&format!("  {} -> {}\n", failed.url, failed.reason));
            }
        }
        if !self.can_generate_document {
            out.push_str("\nNenhuma nota foi processada com sucesso; o documento não pode ser gerado.\n");
        }
        out
    }
}
