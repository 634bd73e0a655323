use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use avs_app::handlers::{self, DOCUMENT_FILENAME};
use avs_app::persistence::{FileOfficeStore, FileSessionStore, ProfileFile};
use avs_core::{OfficeConfigStore, SessionContext, TravelerProfile, TripMetadata};
use avs_engine::{
    AggregationEvent, AtomicFileWriter, FetchSettings, PdfRenderer, ProgressSink,
    ReceiptExtractor,
};
use avs_logging::avs_info;
use chrono::Local;
use clap::{Args, Subcommand};

/// Where the command's state lives.
pub struct Workspace {
    pub data_dir: PathBuf,
    pub session_id: String,
}

impl Workspace {
    fn session(&self) -> anyhow::Result<FileSessionStore> {
        FileSessionStore::open(&self.data_dir, &self.session_id)
            .with_context(|| format!("failed to open session {:?}", self.session_id))
    }

    fn profiles(&self) -> anyhow::Result<Vec<TravelerProfile>> {
        ProfileFile::new(&self.data_dir)
            .load()
            .context("failed to read registered profiles")
    }
}

#[derive(Args)]
pub struct AuthorizeArgs {
    /// Index of the traveler, as shown by `profile list`
    #[arg(long)]
    profile: usize,

    /// Trip destination
    #[arg(long)]
    destination: String,

    /// Request type, e.g. "adiantamento" or "ressarcimento"
    #[arg(long)]
    request_type: String,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
pub struct DocumentArgs {
    /// Index of the traveler, as shown by `profile list`
    #[arg(long)]
    profile: usize,

    /// Output path (defaults to ./avs.pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    /// Register a traveler
    Add(ProfileAddArgs),
    /// List registered travelers with their index
    List,
}

#[derive(Args)]
pub struct ProfileAddArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    bank_agency: String,
    #[arg(long)]
    bank_name: String,
    #[arg(long)]
    account_number: String,
    #[arg(long)]
    registration: String,
    /// CPF
    #[arg(long)]
    tax_id: String,
    /// efetivo, comissionado, agente politico or conselheiro municipal
    #[arg(long)]
    servant_type: String,
    #[arg(long)]
    job_title: String,
}

#[derive(Subcommand)]
pub enum OfficeCommand {
    /// Show the office record
    Show,
    /// Update fields of the office record
    Set(OfficeSetArgs),
}

#[derive(Args)]
pub struct OfficeSetArgs {
    #[arg(long)]
    office_name: Option<String>,
    #[arg(long)]
    responsible_name: Option<String>,
    #[arg(long)]
    responsible_title: Option<String>,
    #[arg(long)]
    departure_city: Option<String>,
    #[arg(long)]
    next_sequence: Option<u32>,
}

pub fn add_url(ws: &Workspace, url: &str) -> anyhow::Result<()> {
    let mut store = ws.session()?;
    let mut session = SessionContext::new(&mut store);
    let ack = handlers::add_url(&mut session, url)?;
    println!("URL adicionada: {} ({} pendente(s))", ack.url, ack.pending);
    Ok(())
}

pub fn clear(ws: &Workspace) -> anyhow::Result<()> {
    let mut store = ws.session()?;
    handlers::clear_urls(&mut SessionContext::new(&mut store))?;
    println!("URLs e resultado anterior removidos.");
    Ok(())
}

pub fn pending(ws: &Workspace) -> anyhow::Result<()> {
    let mut store = ws.session()?;
    let urls = SessionContext::new(&mut store).pending_urls()?;
    if urls.is_empty() {
        println!("Nenhuma URL pendente.");
    }
    for (i, url) in urls.iter().enumerate() {
        println!("{:>3}  {}", i + 1, url);
    }
    Ok(())
}

pub async fn authorize(ws: &Workspace, args: AuthorizeArgs) -> anyhow::Result<()> {
    let profiles = ws.profiles()?;
    let mut store = ws.session()?;
    let mut session = SessionContext::new(&mut store);
    let extractor = ReceiptExtractor::with_settings(FetchSettings::default())
        .context("failed to set up the HTTP client")?;
    let trip = TripMetadata {
        destination: args.destination,
        request_type: args.request_type,
    };

    let summary = handlers::generate_authorization(
        &mut session,
        &profiles,
        args.profile,
        trip,
        &extractor,
        &TerminalProgressSink,
    )
    .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary.render());
    }
    Ok(())
}

pub fn document(ws: &Workspace, args: DocumentArgs) -> anyhow::Result<()> {
    let profiles = ws.profiles()?;
    let mut store = ws.session()?;
    let session = SessionContext::new(&mut store);
    let mut office = FileOfficeStore::new(&ws.data_dir);

    let (sequence, bytes) = handlers::generate_document_bytes(
        &session,
        &profiles,
        args.profile,
        &mut office,
        &PdfRenderer,
        Local::now().date_naive(),
    )?;

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(DOCUMENT_FILENAME));
    let path = write_output(&output, &bytes)?;
    avs_info!("Wrote document sequence={} to {:?}", sequence, path);
    println!("AVS nº {:04} gerada em {}", sequence, path.display());
    Ok(())
}

pub fn profile(ws: &Workspace, command: ProfileCommand) -> anyhow::Result<()> {
    let file = ProfileFile::new(&ws.data_dir);
    match command {
        ProfileCommand::Add(args) => {
            let index = file.add(TravelerProfile {
                name: args.name,
                bank_agency: args.bank_agency,
                bank_name: args.bank_name,
                account_number: args.account_number,
                registration: args.registration,
                tax_id: args.tax_id,
                servant_type: args.servant_type,
                job_title: args.job_title,
            })?;
            println!("Perfil cadastrado com índice {index}.");
        }
        ProfileCommand::List => {
            let profiles = file.load()?;
            if profiles.is_empty() {
                println!("Nenhum perfil cadastrado.");
            }
            for (index, profile) in profiles.iter().enumerate() {
                println!(
                    "{:>3}  {}  ({}, matrícula {})",
                    index, profile.name, profile.job_title, profile.registration
                );
            }
        }
    }
    Ok(())
}

pub fn office(ws: &Workspace, command: OfficeCommand) -> anyhow::Result<()> {
    let mut store = FileOfficeStore::new(&ws.data_dir);
    let mut config = store.load()?;
    if let OfficeCommand::Set(args) = command {
        if let Some(value) = args.office_name {
            config.office_name = value;
        }
        if let Some(value) = args.responsible_name {
            config.responsible_name = value;
        }
        if let Some(value) = args.responsible_title {
            config.responsible_title = value;
        }
        if let Some(value) = args.departure_city {
            config.departure_city = value;
        }
        if let Some(value) = args.next_sequence {
            if value == 0 {
                bail!("the sequence starts at 1");
            }
            config.next_sequence = value;
        }
        store.save(&config)?;
    }
    println!("Órgão: {}", config.office_name);
    println!(
        "Responsável: {} ({})",
        config.responsible_name, config.responsible_title
    );
    println!("Cidade de partida: {}", config.departure_city);
    println!("Próxima AVS: {}", config.next_sequence);
    Ok(())
}

fn write_output(output: &Path, bytes: &[u8]) -> anyhow::Result<PathBuf> {
    let filename = output
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("invalid output path {:?}", output))?;
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let path = AtomicFileWriter::new(dir)
        .write(filename, bytes)
        .with_context(|| format!("failed to write {:?}", output))?;
    Ok(path)
}

/// Prints one line per receipt to stderr while the aggregation runs.
struct TerminalProgressSink;

impl ProgressSink for TerminalProgressSink {
    fn emit(&self, event: AggregationEvent) {
        match event {
            AggregationEvent::Started { url_count } => {
                eprintln!("Consultando {url_count} nota(s)...");
            }
            AggregationEvent::Extracted { index, url, total } => {
                eprintln!("  [{}] ok    R$ {:>10}  {}", index + 1, total, url);
            }
            AggregationEvent::Failed { index, url, reason } => {
                eprintln!("  [{}] falha {}: {}", index + 1, url, reason);
            }
            AggregationEvent::Finished { .. } => {}
        }
    }
}
