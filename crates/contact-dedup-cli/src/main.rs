use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use contact_dedup_core::{
    AppConfig, ContactOrder, Database, DeduplicatorService, DuplicateGroup, DuplicateResolver,
    ExitCode, NewContact, Outcome, ResultCode, import_contacts, plan_deletion,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "contact-dedup",
    about = "Find and remove duplicate contacts",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format.
    /// Also enabled by setting CONTACT_DEDUP_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Path to configuration file.
    #[arg(long, short = 'c', global = true, env = "CONTACT_DEDUP_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Only log errors.
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete duplicate contacts, keeping the first of each group.
    Dedupe {
        /// Show what would be deleted without deleting anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// List duplicate groups without deleting anything.
    Scan,

    /// List all contacts.
    List {
        #[arg(long, value_enum, default_value = "name")]
        sort: SortKey,
    },

    /// Add a contact.
    Add {
        #[arg(long)]
        name: Option<String>,
        #[arg(long, action = clap::ArgAction::Append)]
        phone: Vec<String>,
        #[arg(long, action = clap::ArgAction::Append)]
        email: Vec<String>,
        /// Sync account owning the contact.
        #[arg(long)]
        account: Option<String>,
    },

    /// Import contacts from a JSON file.
    Import { file: PathBuf },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run diagnostics.
    Doctor,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortKey {
    Name,
    Id,
}

impl From<SortKey> for ContactOrder {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Name => ContactOrder::DisplayNameNoCase,
            SortKey::Id => ContactOrder::Id,
        }
    }
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration.
    Show,
    /// Print the config file path.
    Path,
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    let json_output = cli.json || std::env::var("CONTACT_DEDUP_JSON").as_deref() == Ok("1");

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let mut config = AppConfig::load_from(&config_path)?;
    if let Ok(data_dir) = std::env::var("CONTACT_DEDUP_DATA_DIR") {
        config.set_data_dir(data_dir.into());
    }

    init_tracing(&cli, &config);

    match cli.command {
        // ── Dedupe ─────────────────────────────────────────────────────────
        Commands::Dedupe { dry_run: true } | Commands::Scan => {
            let db = open_db(&config)?;
            let groups = DuplicateResolver::new(&db).find_duplicates()?;
            let candidates = plan_deletion(&groups);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "groups": groups, "would_delete": candidates.len() },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                print_groups(&groups);
            }
        }

        Commands::Dedupe { dry_run: false } => {
            let db = Arc::new(open_db(&config)?);
            let service = Arc::new(DeduplicatorService::from_config(db, &config.dedup));

            if !json_output && !cli.quiet {
                println!("Searching for duplicates...");
            }
            let outcome = service.run_async().await;
            let code = ResultCode::from(outcome);
            let deleted = match outcome {
                Outcome::Success(count) => count,
                _ => 0,
            };
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": if code == ResultCode::ErrorOccurred { "error" } else { "ok" },
                    "data": {
                        "code": code.as_i32(),
                        "message": code.status_message(),
                        "deleted": deleted,
                    },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if deleted > 0 {
                println!("{} ({deleted} deleted)", code.status_message());
            } else {
                println!("{}", code.status_message());
            }

            if code != ResultCode::Success {
                std::process::exit(code.as_i32());
            }
        }

        // ── Contacts ───────────────────────────────────────────────────────
        Commands::List { sort } => {
            let db = open_db(&config)?;
            let contacts = db.list_contacts(sort.into())?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": contacts, "total": contacts.len() },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if contacts.is_empty() {
                println!("No contacts. Use `contact-dedup add` or `contact-dedup import`.");
            } else {
                for contact in &contacts {
                    let name = contact.name().unwrap_or("(no name)");
                    let phones = db.phone_numbers_of(contact.id)?.join(", ");
                    let emails = db.email_addresses_of(contact.id)?.join(", ");
                    println!("{:>6}  {name:<30}  {phones:<25}  {emails}", contact.id);
                }
            }
        }

        Commands::Add { name, phone, email, account } => {
            let contact = NewContact {
                display_name: name,
                phones: phone.into_iter().map(Some).collect(),
                emails: email.into_iter().map(Some).collect(),
                account_type: account,
            };
            let db = open_db(&config)?;
            let id = db.insert_contact(&contact)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"id":id},"meta":{"duration_ms":dur}}))?;
            } else {
                println!("Added contact {id}");
            }
        }

        Commands::Import { file } => {
            let db = open_db(&config)?;
            let ids = import_contacts(&db, &file)?;
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"imported":ids.len(),"ids":ids},"meta":{"duration_ms":dur}}))?;
            } else {
                println!("Imported {} contacts from {}", ids.len(), file.display());
            }
        }

        // ── Config ─────────────────────────────────────────────────────────
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                if json_output {
                    print_json(&serde_json::to_value(&config)?)?;
                } else {
                    println!("config_path             = {}", config_path.display());
                    println!("data_dir                = {}", config.core.data_dir);
                    println!("database_path           = {}", config.database_path().display());
                    println!("bypass_sync_restriction = {}", config.dedup.bypass_sync_restriction);
                    println!("logging.level           = {}", config.logging.level);
                }
            }
            ConfigAction::Path => println!("{}", config_path.display()),
        },

        // ── Doctor ─────────────────────────────────────────────────────────
        Commands::Doctor => {
            if config_path.exists() {
                println!("✓ Config: {}", config_path.display());
            } else {
                println!("○ Config: not found (using defaults)");
            }

            let db_path = config.database_path();
            let mut issues = 0;
            match open_db(&config) {
                Ok(db) => {
                    let count = db.count_contacts().unwrap_or(0);
                    let versions = db.schema_versions().unwrap_or_default();
                    println!(
                        "✓ Database: {} ({count} contacts, schema {:?})",
                        db_path.display(),
                        versions.last()
                    );
                }
                Err(e) => {
                    issues += 1;
                    println!("✗ Database: {e}");
                }
            }

            if issues == 0 {
                println!("\nAll checks passed ✓");
            } else {
                println!("\n{issues} issues found");
                std::process::exit(ExitCode::GeneralError as i32);
            }
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing(cli: &Cli, config: &AppConfig) {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn print_groups(groups: &[DuplicateGroup]) {
    if groups.is_empty() {
        println!("{}", ResultCode::NoDuplicatesFound.status_message());
        return;
    }

    let total: usize = groups.iter().map(|g| g.duplicates().len()).sum();
    println!("Found {} duplicate groups ({total} contacts would be deleted):", groups.len());
    for group in groups {
        println!("  {}", group.fingerprint());
        println!("    keep   {}", group.survivor());
        for id in group.duplicates() {
            println!("    delete {id}");
        }
    }
}

fn open_db(config: &AppConfig) -> Result<Database> {
    let db_path = config.database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Database::open(&db_path)?)
}
