use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use serde::Serialize;
use tokio::sync::{watch, Mutex};

use quiz_granny_admin::api::ApiClient;
use quiz_granny_admin::approval::toggle_approval;
use quiz_granny_admin::config::Settings;
use quiz_granny_admin::export::export_questions;
use quiz_granny_admin::health::{wait_for_backend, GateStatus};
use quiz_granny_admin::import::{import_questions, ImportFile};
use quiz_granny_admin::listing::{refresh, Filters, QuestionList, QuestionRow, Selector};
use quiz_granny_admin::session::{self, LocalStore};
use quiz_granny_admin::telemetry::init_tracing;
use quiz_granny_admin::toast::Toasts;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the operator
    Login {
        email: String,
        /// Read from stdin when omitted
        #[clap(long)]
        password: Option<String>,
    },
    /// Forget the stored operator
    Logout,
    /// Work with the question bank
    Questions {
        #[clap(subcommand)]
        command: QuestionCommands,
    },
    /// Wait until the backend reports healthy
    Health,
}

#[derive(Subcommand)]
enum QuestionCommands {
    /// Print one page of questions
    List {
        #[clap(long, default_value = "")]
        search: String,
        #[clap(long, default_value = "all")]
        category: String,
        #[clap(long, default_value = "all")]
        difficulty: String,
        #[clap(long, default_value_t = 1)]
        page: usize,
        /// Write the page as CSV to stdout
        #[clap(long)]
        csv: bool,
    },
    /// Upload a CSV or Excel file of questions
    Import { file: PathBuf },
    /// Save the backend's CSV export into a directory
    Export { dir: PathBuf },
    /// Flip the approval flag of a question
    Approve { id: String },
}

#[derive(Serialize)]
struct CsvRow<'a> {
    number: usize,
    id: &'a str,
    title: &'a str,
    categories: String,
    difficulty: u8,
    correct: char,
    created_by: &'a str,
    approved: bool,
}

impl<'a> From<&'a QuestionRow> for CsvRow<'a> {
    fn from(row: &'a QuestionRow) -> Self {
        CsvRow {
            number: row.number,
            id: &row.id,
            title: &row.title,
            categories: row.categories_text(),
            difficulty: row.difficulty,
            correct: row.correct,
            created_by: &row.created_by,
            approved: row.approved,
        }
    }
}

/// Prints queued notifications. Fails when any of them is an error.
fn report(toasts: &mut Toasts) -> anyhow::Result<()> {
    let toasts = toasts.drain();
    for toast in &toasts {
        if toast.is_error() {
            eprintln!("error: {}", toast.message);
        } else {
            println!("{}", toast.message);
        }
    }
    if toasts.iter().any(|t| t.is_error()) {
        bail!("command failed");
    }
    Ok(())
}

fn read_password() -> anyhow::Result<SecretString> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(SecretString::from(line.trim_end_matches(['\r', '\n']).to_owned()))
}

async fn list(
    api: &ApiClient,
    settings: &Settings,
    filters: Filters,
    page: usize,
    csv: bool,
) -> anyhow::Result<()> {
    let list = Mutex::new(QuestionList::new(settings.page_size));
    let mut toasts = Toasts::default();
    let loaded = refresh(api, &list, &mut toasts).await;
    report(&mut toasts)?;
    if !loaded {
        bail!("questions were not loaded");
    }
    let mut list = list.lock().await;
    list.set_filters(filters);
    list.go_to_page(page);
    let view = list.view();

    if csv {
        let mut writer = csv::Writer::from_writer(io::stdout());
        for row in &view.rows {
            writer.serialize(CsvRow::from(row))?;
        }
        writer.flush()?;
        return Ok(());
    }
    for row in &view.rows {
        println!(
            "{:>4}  {}  [{}]  {}  answer {}  {}",
            row.number,
            row.title,
            row.categories_text(),
            row.difficulty_label,
            row.correct,
            if row.approved { "approved" } else { "pending" },
        );
    }
    println!(
        "page {} of {}, {} of {} questions",
        view.page,
        view.total_pages.max(1),
        view.filtered,
        view.total
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = Settings::load().context("Cannot load settings")?;
    let store = LocalStore::open(&settings.storage_path)
        .with_context(|| format!("Cannot open {}", settings.storage_path.display()))?;
    let api = ApiClient::new(&settings.backend_url, settings.request_timeout())?;
    let mut toasts = Toasts::default();

    match cli.command {
        Commands::Login { email, password } => {
            let password = match password {
                Some(password) => SecretString::from(password),
                None => read_password()?,
            };
            let operator = session::login(&api, &store, &email, &password).await?;
            println!("Logged in as {} ({})", operator.username, operator.role);
        }
        Commands::Logout => {
            session::logout(&store)?;
            println!("Logged out");
        }
        Commands::Health => {
            let (status, _) = watch::channel(GateStatus::default());
            wait_for_backend(&api, &settings.health, &status).await?;
            println!("{}", status.borrow().message);
        }
        Commands::Questions { command } => match command {
            QuestionCommands::List {
                search,
                category,
                difficulty,
                page,
                csv,
            } => {
                let filters = Filters {
                    search,
                    category: Selector::parse(&category),
                    difficulty: Selector::parse(&difficulty),
                };
                list(&api, &settings, filters, page, csv).await?;
            }
            QuestionCommands::Import { file } => {
                let bytes = tokio::fs::read(&file)
                    .await
                    .with_context(|| format!("Cannot read {}", file.display()))?;
                let file_name = file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let list = Mutex::new(QuestionList::new(settings.page_size));
                let (progress, _) = watch::channel(Default::default());
                import_questions(
                    &api,
                    &list,
                    vec![ImportFile { file_name, bytes }],
                    &settings.import,
                    &progress,
                    &mut toasts,
                )
                .await;
                report(&mut toasts)?;
            }
            QuestionCommands::Export { dir } => {
                let operator = store.session();
                if let Some(file) = export_questions(&api, operator.as_ref(), &mut toasts).await {
                    tokio::fs::create_dir_all(&dir).await?;
                    let path = dir.join(&file.file_name);
                    tokio::fs::write(&path, &file.bytes)
                        .await
                        .with_context(|| format!("Cannot write {}", path.display()))?;
                    println!("Wrote {}", path.display());
                }
                report(&mut toasts)?;
            }
            QuestionCommands::Approve { id } => {
                let operator = store.session();
                let list = Mutex::new(QuestionList::new(settings.page_size));
                refresh(&api, &list, &mut toasts).await;
                toggle_approval(&api, &list, operator.as_ref(), &id, &mut toasts).await;
                report(&mut toasts)?;
            }
        },
    }
    Ok(())
}
