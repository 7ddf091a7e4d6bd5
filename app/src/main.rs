//! Command-line front end for MediaVault.
//!
//! Every subcommand mounts the dashboard shell, feeds it the messages a user
//! would trigger and prints the resulting toasts.

mod config;

use api_client::{MediaKind, StoreSettings, UploadFile, UploadSettings};
use auth::{AuthClient, IdentityConfig};
use clap::{Parser, Subcommand, ValueEnum};
use gallery::{CollectionFilter, MoveRequest};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use ui::{
    settle, AuthMode, CollectionsMessage, Dashboard, DashboardMessage, GalleryMessage, Program, Services,
    Toast, UploadMessage,
};

#[derive(Parser)]
#[command(name = "mediavault", author, version, about = "MediaVault media library CLI")]
struct Cli {
    /// Override log level (e.g. info, debug)
    #[arg(long)]
    log_level: Option<String>,
    /// Override the directory holding logs and the error log
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Enable tokio console for debugging
    #[arg(long)]
    debug_console: bool,
    /// Store the session in ~/.mediavault/session.json instead of the system keyring
    #[arg(long)]
    use_file_store: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Image,
    Video,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Image => MediaKind::Image,
            KindArg::Video => MediaKind::Video,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Password confirmation, defaults to the password
        #[arg(long)]
        confirm: Option<String>,
    },
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Upload files one after another
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Only accept files of this kind (defaults to the first file's kind)
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        /// Collection to file every upload under
        #[arg(long)]
        collection: Option<String>,
        /// MIME type to declare instead of guessing from the extension
        #[arg(long)]
        content_type: Option<String>,
    },
    /// List media, newest first
    List {
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        /// Only items in this collection
        #[arg(long, conflicts_with = "uncategorized")]
        collection: Option<String>,
        /// Only items without a collection
        #[arg(long)]
        uncategorized: bool,
    },
    /// List collections with their image and video counts
    Collections,
    /// Create a new collection
    CreateCollection {
        /// Name of the new collection
        name: String,
    },
    /// Move a media item to another collection
    Move {
        /// ID of the media item
        media_id: String,
        /// Target collection ID
        #[arg(long, conflicts_with = "uncategorized", required_unless_present = "uncategorized")]
        to: Option<String>,
        /// Remove the item from its collection
        #[arg(long)]
        uncategorized: bool,
    },
    /// Delete a media record
    Delete {
        /// ID of the media item
        media_id: String,
    },
}

fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

fn init_logging(cfg: &config::AppConfig) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&cfg.data_dir)?;
    let file_appender = rolling::daily(&cfg.data_dir, "mediavault.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr.with_max_level(tracing::Level::WARN).and(file_writer))
        .with_filter(EnvFilter::new(cfg.log_level.clone()));
    let registry = tracing_subscriber::registry().with(fmt_layer);

    #[cfg(feature = "tokio-console")]
    if cfg.debug_console {
        registry.with(console_subscriber::spawn()).init();
        return Ok(guard);
    }
    registry.init();
    Ok(guard)
}

fn build_services(cfg: &config::AppConfig) -> Services {
    Services {
        auth: AuthClient::new(IdentityConfig {
            api_key: cfg.api_key.clone(),
            identity_base_url: cfg.identity_base_url.clone(),
            token_base_url: cfg.token_base_url.clone(),
        }),
        store: StoreSettings {
            base_url: cfg.store_base_url.clone(),
            project_id: cfg.project_id.clone(),
        },
        uploads: UploadSettings {
            base_url: cfg.upload_base_url.clone(),
            cloud_name: cfg.cloud_name.clone(),
            upload_preset: cfg.upload_preset.clone(),
            folder: cfg.upload_folder(),
        },
        error_log: Some(cfg.error_log_path()),
    }
}

/// Print toasts and report whether any of them was an error.
fn flush_toasts(toasts: Vec<Toast>) -> bool {
    let mut failed = false;
    for toast in toasts {
        if toast.is_error() {
            failed = true;
            eprintln!("✖ {}", toast);
        } else {
            println!("✔ {}", toast);
        }
    }
    failed
}

async fn send(dashboard: &mut Dashboard, message: DashboardMessage) {
    let cmd = dashboard.update(message);
    settle(dashboard, cmd).await;
}

fn require_identity(dashboard: &Dashboard) -> bool {
    if dashboard.identity().is_none() {
        eprintln!("Not signed in. Run `mediavault login` first.");
        return false;
    }
    true
}

async fn run(command: Commands, services: Services) -> Result<bool, Box<dyn std::error::Error>> {
    let tab = match &command {
        Commands::Collections => Some("collections"),
        _ => None,
    };
    let (mut dashboard, cmd) = Dashboard::new(services, tab);
    settle(&mut dashboard, cmd).await;

    match command {
        Commands::Register {
            email,
            password,
            confirm,
        } => {
            let confirm = confirm.unwrap_or_else(|| password.clone());
            send(&mut dashboard, DashboardMessage::SetAuthMode(AuthMode::Register)).await;
            send(&mut dashboard, DashboardMessage::EmailChanged(email)).await;
            send(&mut dashboard, DashboardMessage::PasswordChanged(password)).await;
            send(&mut dashboard, DashboardMessage::ConfirmChanged(confirm)).await;
            send(&mut dashboard, DashboardMessage::SubmitAuth).await;
        }
        Commands::Login { email, password } => {
            send(&mut dashboard, DashboardMessage::SetAuthMode(AuthMode::Login)).await;
            send(&mut dashboard, DashboardMessage::EmailChanged(email)).await;
            send(&mut dashboard, DashboardMessage::PasswordChanged(password)).await;
            send(&mut dashboard, DashboardMessage::SubmitAuth).await;
        }
        Commands::Logout => {
            send(&mut dashboard, DashboardMessage::Logout).await;
        }
        Commands::Whoami => match dashboard.identity() {
            Some(identity) => println!("{} ({})", identity.email, identity.user_id),
            None => println!("Not signed in"),
        },
        Commands::Upload {
            files,
            kind,
            collection,
            content_type,
        } => {
            if !require_identity(&dashboard) {
                return Ok(false);
            }
            let mut selected = Vec::with_capacity(files.len());
            for path in &files {
                let mime = content_type.as_deref().unwrap_or_else(|| guess_mime(path));
                selected.push(UploadFile::from_path(path, mime).await?);
            }
            let kind = kind
                .map(MediaKind::from)
                .or_else(|| selected.first().map(UploadFile::kind))
                .unwrap_or(MediaKind::Image);
            send(&mut dashboard, DashboardMessage::Upload(UploadMessage::SetKind(kind))).await;
            send(
                &mut dashboard,
                DashboardMessage::Upload(UploadMessage::SetTargetCollection(collection)),
            )
            .await;
            send(
                &mut dashboard,
                DashboardMessage::Upload(UploadMessage::FilesSelected(selected)),
            )
            .await;
            if let Some(panel) = dashboard.upload() {
                println!("Uploading {}", panel.selection_label());
            }
            send(&mut dashboard, DashboardMessage::Upload(UploadMessage::Start)).await;
        }
        Commands::List {
            kind,
            collection,
            uncategorized,
        } => {
            if !require_identity(&dashboard) {
                return Ok(false);
            }
            let filter = if uncategorized {
                CollectionFilter::Uncategorized
            } else {
                CollectionFilter::from_selector(collection.as_deref())
            };
            send(
                &mut dashboard,
                DashboardMessage::Gallery(GalleryMessage::SetCollectionFilter(filter)),
            )
            .await;
            send(
                &mut dashboard,
                DashboardMessage::Gallery(GalleryMessage::SetKind(kind.map(MediaKind::from))),
            )
            .await;
            if let Some(view) = dashboard.gallery() {
                let items = view.visible_items();
                for item in &items {
                    println!(
                        "{}\t{}\t{}\t{}\t{}",
                        item.id,
                        item.kind,
                        view.collection_name(item.collection_id.as_deref()),
                        item.created_at.format("%Y-%m-%d"),
                        item.media_url
                    );
                }
                println!("{} item(s)", items.len());
            }
        }
        Commands::Collections => {
            if !require_identity(&dashboard) {
                return Ok(false);
            }
            if let Some(view) = dashboard.collections() {
                let summaries = view.summaries();
                for summary in &summaries {
                    println!(
                        "{}\t{}\t{} images, {} videos\tcreated {}",
                        summary.id,
                        summary.name,
                        summary.counts.images,
                        summary.counts.videos,
                        summary.created_label()
                    );
                }
                println!("{} collection(s)", summaries.len());
            }
        }
        Commands::CreateCollection { name } => {
            if !require_identity(&dashboard) {
                return Ok(false);
            }
            for message in [
                GalleryMessage::OpenCreateCollection,
                GalleryMessage::CollectionNameChanged(name),
                GalleryMessage::SubmitCreateCollection,
            ] {
                send(&mut dashboard, DashboardMessage::Gallery(message)).await;
            }
        }
        Commands::Move {
            media_id,
            to,
            uncategorized,
        } => {
            if !require_identity(&dashboard) {
                return Ok(false);
            }
            let target = if uncategorized { None } else { to };
            send(
                &mut dashboard,
                DashboardMessage::Collections(CollectionsMessage::Gallery(GalleryMessage::RequestMove(
                    MoveRequest { media_id, target },
                ))),
            )
            .await;
        }
        Commands::Delete { media_id } => {
            if !require_identity(&dashboard) {
                return Ok(false);
            }
            send(&mut dashboard, DashboardMessage::RequestDelete(media_id)).await;
            send(&mut dashboard, DashboardMessage::ConfirmDelete).await;
        }
    }

    Ok(!flush_toasts(dashboard.take_toasts()))
}

#[cfg_attr(feature = "trace-spans", tracing::instrument)]
#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.use_file_store {
        std::env::set_var(auth::USE_FILE_STORE_ENV, "1");
    }

    let overrides = config::AppConfigOverrides {
        log_level: cli.log_level.clone(),
        data_dir: cli.data_dir.clone(),
        debug_console: cli.debug_console,
    };
    let cfg = config::AppConfig::load_from(cli.config.clone()).apply_overrides(&overrides);
    let _guard = init_logging(&cfg)?;

    let missing = cfg.missing_keys();
    if !missing.is_empty() {
        tracing::warn!(?missing, "configuration is incomplete");
    }

    let ok = run(cli.command, build_services(&cfg)).await?;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
