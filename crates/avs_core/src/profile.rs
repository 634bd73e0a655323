use serde::{Deserialize, Serialize};

use crate::DocumentError;

/// A registered traveler. Field order matches the columns of the profile file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TravelerProfile {
    #[serde(rename = "Nome")]
    pub name: String,
    #[serde(rename = "Agencia")]
    pub bank_agency: String,
    #[serde(rename = "Banco")]
    pub bank_name: String,
    #[serde(rename = "Conta")]
    pub account_number: String,
    #[serde(rename = "Matricula")]
    pub registration: String,
    #[serde(rename = "CPF")]
    pub tax_id: String,
    #[serde(rename = "TipoServidor")]
    pub servant_type: String,
    #[serde(rename = "Cargo")]
    pub job_title: String,
}

/// Employment categories printed as a checkbox row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServantType {
    Efetivo,
    Comissionado,
    AgentePolitico,
    ConselheiroMunicipal,
}

impl ServantType {
    pub const ALL: [ServantType; 4] = [
        ServantType::Efetivo,
        ServantType::Comissionado,
        ServantType::AgentePolitico,
        ServantType::ConselheiroMunicipal,
    ];

    /// Stored value this category matches after lower-casing.
    pub fn key(self) -> &'static str {
        match self {
            ServantType::Efetivo => "efetivo",
            ServantType::Comissionado => "comissionado",
            ServantType::AgentePolitico => "agente politico",
            ServantType::ConselheiroMunicipal => "conselheiro municipal",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ServantType::Efetivo => "Efetivo",
            ServantType::Comissionado => "Comissionado",
            ServantType::AgentePolitico => "Agente Político",
            ServantType::ConselheiroMunicipal => "Conselheiro Municipal",
        }
    }

    /// Exact match of the lower-cased stored value; anything else is `None`.
    pub fn from_stored(value: &str) -> Option<Self> {
        let lowered = value.to_lowercase();
        Self::ALL.into_iter().find(|kind| kind.key() == lowered)
    }
}

/// Which boxes of the request-type row are ticked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestKind {
    pub advance: bool,
    pub reimbursement: bool,
}

impl RequestKind {
    /// Case-insensitive substring match on "adiant" (adiantamento) and "ress"
    /// (ressarcimento).
    pub fn from_request_type(request_type: &str) -> Self {
        let lowered = request_type.to_lowercase();
        Self {
            advance: lowered.contains("adiant"),
            reimbursement: lowered.contains("ress"),
        }
    }
}

/// Look up `index` in the current profile list.
pub fn resolve_profile(
    profiles: &[TravelerProfile],
    index: usize,
) -> Result<&TravelerProfile, DocumentError> {
    profiles.get(index).ok_or(DocumentError::ProfileResolution {
        index,
        available: profiles.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn servant_type_is_lowercased_exact_match() {
        assert_eq!(ServantType::from_stored("EFETIVO"), Some(ServantType::Efetivo));
        assert_eq!(
            ServantType::from_stored("Agente Politico"),
            Some(ServantType::AgentePolitico)
        );
        assert_eq!(ServantType::from_stored("Agente Político"), None);
        assert_eq!(ServantType::from_stored(" efetivo"), None);
        assert_eq!(ServantType::from_stored("estagiario"), None);
    }

    #[test]
    fn request_kind_matches_substrings() {
        let kind = RequestKind::from_request_type("Adiantamento");
        assert!(kind.advance && !kind.reimbursement);
        let kind = RequestKind::from_request_type("RESSARCIMENTO");
        assert!(!kind.advance && kind.reimbursement);
        assert_eq!(RequestKind::from_request_type("outro"), RequestKind::default());
    }

    #[test]
    fn resolve_rejects_out_of_range() {
        let profiles = vec![TravelerProfile::default()];
        assert!(resolve_profile(&profiles, 0).is_ok());
        assert!(matches!(
            resolve_profile(&profiles, 1),
            Err(DocumentError::ProfileResolution { index: 1, available: 1 })
        ));
    }
}
