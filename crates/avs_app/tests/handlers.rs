use std::sync::{mpsc, Once};

use avs_app::handlers::{self, HandlerError};
use avs_app::persistence::{FileOfficeStore, FileSessionStore};
use avs_core::{
    DocumentError, InMemoryOfficeConfig, InMemorySession, OfficeConfig, OfficeConfigStore,
    SessionContext, TravelerProfile, TripMetadata,
};
use avs_engine::{
    AggregationEvent, ChannelProgressSink, FetchSettings, NullProgressSink, PdfRenderer,
    ReceiptExtractor,
};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(avs_logging::initialize_for_tests);
}

fn receipt_page(issuer: &str, total: &str, number: &str, issued: &str) -> String {
    format!(
        r#"<html><head><meta charset="utf-8"></head><body>
<div class="txtTopo">{issuer}</div>
<div id="totalNota"><span class="totalNumb txtMax">{total}</span></div>
<div data-role="collapsible">
  <h4>Informações gerais da Nota</h4>
  <ul><li><strong>Número: </strong>{number} <strong>Emissão: </strong>{issued} - Via Consumidor</li></ul>
</div>
</body></html>"#
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html; charset=utf-8")
}

fn profiles() -> Vec<TravelerProfile> {
    vec![TravelerProfile {
        name: "João da Silva".to_string(),
        bank_agency: "1234-5".to_string(),
        bank_name: "Banco do Brasil".to_string(),
        account_number: "98765-4".to_string(),
        registration: "4411".to_string(),
        tax_id: "123.456.789-00".to_string(),
        servant_type: "efetivo".to_string(),
        job_title: "Motorista".to_string(),
    }]
}

fn trip() -> TripMetadata {
    TripMetadata {
        destination: "Florianópolis".to_string(),
        request_type: "adiantamento".to_string(),
    }
}

fn office(next_sequence: u32) -> InMemoryOfficeConfig {
    InMemoryOfficeConfig::new(OfficeConfig {
        office_name: "Prefeitura Municipal de Exemplo".to_string(),
        responsible_name: "Maria Souza".to_string(),
        responsible_title: "Secretária".to_string(),
        departure_city: "Exemplo/SC".to_string(),
        next_sequence,
    })
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
}

async fn receipt_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nfce/1"))
        .respond_with(html(receipt_page(
            "POSTO CENTRAL LTDA",
            "1.250,00",
            "000123",
            "02/03/2024 10:22:33",
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/nfce/2"))
        .respond_with(html(receipt_page(
            "RESTAURANTE BOM SABOR",
            "50,50",
            "000456",
            "03/03/2024 12:01:00",
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/nfce/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    server
}

#[test]
fn add_url_reports_pending_count() {
    init_logging();
    let mut store = InMemorySession::new();
    let mut session = SessionContext::new(&mut store);

    let ack = handlers::add_url(&mut session, " http://a ").unwrap();
    assert_eq!(ack.url, "http://a");
    assert_eq!(ack.pending, 1);

    let ack = handlers::add_url(&mut session, "   ").unwrap();
    assert_eq!(ack.pending, 1);

    handlers::clear_urls(&mut session).unwrap();
    assert!(session.pending_urls().unwrap().is_empty());
}

#[tokio::test]
async fn authorization_then_document_end_to_end() {
    init_logging();
    let server = receipt_server().await;
    let mut store = InMemorySession::new();
    let mut session = SessionContext::new(&mut store);
    for suffix in ["/nfce/1", "/nfce/gone", "/nfce/2"] {
        handlers::add_url(&mut session, &format!("{}{}", server.uri(), suffix)).unwrap();
    }
    let extractor = ReceiptExtractor::with_settings(FetchSettings::default()).unwrap();
    let (tx, rx) = mpsc::channel();

    let summary = handlers::generate_authorization(
        &mut session,
        &profiles(),
        0,
        trip(),
        &extractor,
        &ChannelProgressSink::new(tx),
    )
    .await
    .unwrap();

    assert_eq!(summary.traveler, "João da Silva");
    assert_eq!(summary.combined_total, "1.300,50");
    assert_eq!(summary.items.len(), 2);
    assert_eq!(summary.items[0].number, "000123");
    assert_eq!(summary.items[0].date, "02/03/2024");
    assert_eq!(summary.items[1].description, "RESTAURANTE BOM SABOR");
    assert_eq!(summary.failed_urls.len(), 1);
    assert!(summary.failed_urls[0].url.ends_with("/nfce/gone"));
    assert!(summary.can_generate_document);

    let events: Vec<AggregationEvent> = rx.try_iter().collect();
    assert_eq!(events.len(), 5);
    assert!(matches!(
        events.last(),
        Some(AggregationEvent::Finished {
            succeeded: 2,
            failed: 1,
            ..
        })
    ));

    let mut office = office(12);
    let (sequence, bytes) = handlers::generate_document_bytes(
        &session,
        &profiles(),
        0,
        &mut office,
        &PdfRenderer,
        today(),
    )
    .unwrap();

    assert_eq!(sequence, 12);
    assert_eq!(office.next_sequence(), 13);
    assert!(bytes.starts_with(b"%PDF-1.5"));
}

#[tokio::test]
async fn unknown_profile_stops_before_fetching() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let mut store = InMemorySession::new();
    let mut session = SessionContext::new(&mut store);
    handlers::add_url(&mut session, &format!("{}/nfce/1", server.uri())).unwrap();
    let extractor = ReceiptExtractor::with_settings(FetchSettings::default()).unwrap();

    let err = handlers::generate_authorization(
        &mut session,
        &profiles(),
        3,
        trip(),
        &extractor,
        &NullProgressSink,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        HandlerError::Document(DocumentError::ProfileResolution {
            index: 3,
            available: 1
        })
    ));
    assert!(session.aggregation().unwrap().is_none());
}

#[tokio::test]
async fn all_failures_refuse_the_document() {
    init_logging();
    let server = receipt_server().await;
    let mut store = InMemorySession::new();
    let mut session = SessionContext::new(&mut store);
    handlers::add_url(&mut session, &format!("{}/nfce/gone", server.uri())).unwrap();
    let extractor = ReceiptExtractor::with_settings(FetchSettings::default()).unwrap();

    let summary = handlers::generate_authorization(
        &mut session,
        &profiles(),
        0,
        trip(),
        &extractor,
        &NullProgressSink,
    )
    .await
    .unwrap();
    assert!(!summary.can_generate_document);
    assert_eq!(summary.combined_total, "0,00");

    let mut office = office(5);
    let err = handlers::generate_document_bytes(
        &session,
        &profiles(),
        0,
        &mut office,
        &PdfRenderer,
        today(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        HandlerError::Document(DocumentError::EmptyAggregation)
    ));
    assert_eq!(office.next_sequence(), 5);
}

#[test]
fn document_without_authorization_is_refused() {
    init_logging();
    let mut store = InMemorySession::new();
    let session = SessionContext::new(&mut store);
    let mut office = office(1);

    let err = handlers::generate_document_bytes(
        &session,
        &profiles(),
        0,
        &mut office,
        &PdfRenderer,
        today(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        HandlerError::Document(DocumentError::EmptyAggregation)
    ));
    assert_eq!(office.next_sequence(), 1);
}

#[tokio::test]
async fn stale_profile_index_is_refused_at_document_time() {
    init_logging();
    let server = receipt_server().await;
    let mut store = InMemorySession::new();
    let mut session = SessionContext::new(&mut store);
    handlers::add_url(&mut session, &format!("{}/nfce/2", server.uri())).unwrap();
    let extractor = ReceiptExtractor::with_settings(FetchSettings::default()).unwrap();
    handlers::generate_authorization(
        &mut session,
        &profiles(),
        0,
        trip(),
        &extractor,
        &NullProgressSink,
    )
    .await
    .unwrap();

    let mut office = office(9);
    let err = handlers::generate_document_bytes(
        &session,
        &[],
        0,
        &mut office,
        &PdfRenderer,
        today(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        HandlerError::Document(DocumentError::ProfileResolution { .. })
    ));
    assert_eq!(office.next_sequence(), 9);
}

#[tokio::test]
async fn file_backed_flow_advances_the_stored_sequence() {
    init_logging();
    let server = receipt_server().await;
    let dir = TempDir::new().unwrap();
    let mut office = FileOfficeStore::new(dir.path());
    office
        .save(&OfficeConfig {
            next_sequence: 3,
            ..OfficeConfig::default()
        })
        .unwrap();

    {
        let mut store = FileSessionStore::open(dir.path(), "viagem").unwrap();
        let mut session = SessionContext::new(&mut store);
        handlers::add_url(&mut session, &format!("{}/nfce/1", server.uri())).unwrap();
        let extractor = ReceiptExtractor::with_settings(FetchSettings::default()).unwrap();
        handlers::generate_authorization(
            &mut session,
            &profiles(),
            0,
            trip(),
            &extractor,
            &NullProgressSink,
        )
        .await
        .unwrap();
    }

    let mut store = FileSessionStore::open(dir.path(), "viagem").unwrap();
    let session = SessionContext::new(&mut store);
    assert_eq!(session.trip().unwrap(), Some(trip()));
    let (sequence, _) = handlers::generate_document_bytes(
        &session,
        &profiles(),
        0,
        &mut office,
        &PdfRenderer,
        today(),
    )
    .unwrap();

    assert_eq!(sequence, 3);
    assert_eq!(
        FileOfficeStore::new(dir.path()).load().unwrap().next_sequence,
        4
    );
}
