use clap::{Args, Parser, Subcommand};
use memories::check;
use memories::config;
use memories::imaging::RustSanitizer;
use memories::ingest::{AlbumDraft, AlbumEdit, Pipeline, UploadFile, UploadRequest};
use memories::logging::{self, LogFormat};
use memories::output;
use memories::storage::{AlbumRepository, Store};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "memories")]
#[command(about = "Personal photo catalogue")]
#[command(long_about = "\
Personal photo catalogue

Albums and photo metadata live in a SQLite database; uploaded files live
under the uploads directory, one subdirectory per album:

  data/
  ├── memories.db                  # Albums and photos
  └── uploads/
      └── summer-roadtrip/         # Album slug
          └── 20250214180000-9f2c41d07be84a6f8d1e3c5b7a90f214.jpg

JPEG uploads are rotated upright and stripped of all metadata (location,
camera identifiers, thumbnails) before they are written. Other formats are
stored as uploaded.

Run 'memories gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Print list, show, and check results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create, inspect, and edit albums
    #[command(subcommand)]
    Album(AlbumCommand),
    /// Upload and delete photos
    #[command(subcommand)]
    Photo(PhotoCommand),
    /// Compare the uploads directory against the database
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(Subcommand)]
enum AlbumCommand {
    /// Create an album; the slug is derived from the title unless given
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List albums, newest first
    List,
    /// Show an album and its photos
    Show { slug: String },
    /// Change an album's title or description
    Update {
        slug: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete an album, its photos, and its upload directory
    Delete { slug: String },
    /// Use one of the album's photos as its cover
    Cover { slug: String, photo_id: i64 },
    /// Remove the album's cover photo
    Uncover { slug: String },
}

#[derive(Subcommand)]
enum PhotoCommand {
    /// Sanitize a file and add it to an album
    Upload(UploadArgs),
    /// Delete a photo and its file
    Delete { id: i64 },
}

#[derive(Args)]
struct UploadArgs {
    /// Target album slug
    slug: String,
    /// Image file to upload
    file: PathBuf,
    #[arg(long)]
    caption: Option<String>,
    /// Capture time, YYYY-MM-DDTHH:MM (UTC)
    #[arg(long)]
    taken_at: Option<String>,
    /// Declared MIME type (defaults to the file extension)
    #[arg(long)]
    content_type: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let app_config = config::load_config(&cli.config)?;
    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    logging::init(&app_config.logging.level, format);

    let store = Store::open(&app_config.storage.database)?;
    let albums = store.albums();
    let photos = store.photos();
    let sanitizer = RustSanitizer::new(app_config.images.quality());
    let pipeline = Pipeline::new(
        &albums,
        &photos,
        &sanitizer,
        &app_config.storage.uploads_dir,
    );

    match cli.command {
        Command::Album(cmd) => run_album(&pipeline, &albums, cmd, cli.json)?,
        Command::Photo(cmd) => run_photo(&pipeline, cmd)?,
        Command::Check => {
            let report = check::audit(&albums, &photos, pipeline.uploads_dir())?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_lines(&output::format_check_report(&report));
            }
            if !report.is_clean() {
                std::process::exit(1);
            }
        }
        Command::GenConfig => {}
    }

    Ok(())
}

fn run_album(
    pipeline: &Pipeline<'_>,
    albums: &dyn AlbumRepository,
    cmd: AlbumCommand,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let lines = match cmd {
        AlbumCommand::Create {
            title,
            slug,
            description,
        } => {
            let album = pipeline.create_album(&AlbumDraft {
                title,
                slug,
                description,
            })?;
            output::format_album_saved("Created", &album)
        }
        AlbumCommand::List => {
            let list = albums.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&list)?);
                return Ok(());
            }
            output::format_album_list(&list)
        }
        AlbumCommand::Show { slug } => {
            let (album, photos) = pipeline.album_with_photos(&slug)?;
            if json {
                let value = serde_json::json!({ "album": album, "photos": photos });
                println!("{}", serde_json::to_string_pretty(&value)?);
                return Ok(());
            }
            output::format_album_detail(&album, &photos)
        }
        AlbumCommand::Update {
            slug,
            title,
            description,
        } => {
            let album = pipeline.update_album(&slug, &AlbumEdit { title, description })?;
            output::format_album_saved("Updated", &album)
        }
        AlbumCommand::Delete { slug } => output::format_album_deleted(&pipeline.delete_album(&slug)?),
        AlbumCommand::Cover { slug, photo_id } => {
            output::format_album_saved("Cover set for", &pipeline.set_cover(&slug, photo_id)?)
        }
        AlbumCommand::Uncover { slug } => {
            output::format_album_saved("Cover cleared for", &pipeline.clear_cover(&slug)?)
        }
    };
    output::print_lines(&lines);
    Ok(())
}

fn run_photo(pipeline: &Pipeline<'_>, cmd: PhotoCommand) -> Result<(), Box<dyn std::error::Error>> {
    let lines = match cmd {
        PhotoCommand::Upload(args) => {
            let file = read_upload(&args.file, args.content_type)?;
            let uploaded = pipeline.upload(UploadRequest {
                album_slug: args.slug,
                file: Some(file),
                caption: args.caption,
                taken_at: args.taken_at,
            })?;
            output::format_upload(&uploaded)
        }
        PhotoCommand::Delete { id } => output::format_photo_deleted(&pipeline.delete_photo(id)?),
    };
    output::print_lines(&lines);
    Ok(())
}

fn read_upload(path: &Path, content_type: Option<String>) -> std::io::Result<UploadFile> {
    Ok(UploadFile {
        original_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        content_type,
        bytes: std::fs::read(path)?,
    })
}
