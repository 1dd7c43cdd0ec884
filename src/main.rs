use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use folio::config::Config;
use folio::logging;
use folio::storage::{FileStorage, StorageBackend};
use folio::store::{CategoryFilter, PhotoId, PhotoStore};
use folio::ui::{
    GallerySettings, GalleryView, HeadlessSurface, NoticeKind, ProfileSlot, ProfileUploader,
    UploadOrigin,
};
use folio::upload::{discover_files, DataUrl, FileBlob};

enum Command {
    Gallery(GalleryCommand),
    Profile { slot: ProfileSlot, path: PathBuf },
}

enum GalleryCommand {
    List(Option<String>),
    Upload(Vec<PathBuf>),
    Show(PhotoId),
    Delete { id: PhotoId, yes: bool },
    Download { id: PhotoId, out: Option<PathBuf> },
}

struct Args {
    config_path: Option<PathBuf>,
    command: Command,
}

fn parse_args() -> Result<Args> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config_path = None;
    let mut rest = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("folio {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                let Some(path) = args.get(i + 1) else {
                    bail!("--config requires a path argument");
                };
                config_path = Some(PathBuf::from(path));
                i += 1;
            }
            _ => rest.push(args[i].clone()),
        }
        i += 1;
    }

    let parse_id = |s: Option<&String>| -> Result<PhotoId> {
        let s = s.context("missing photo id")?;
        s.parse().with_context(|| format!("invalid photo id '{}'", s))
    };

    let command = match rest.first().map(String::as_str) {
        None | Some("list") => Command::Gallery(GalleryCommand::List(rest.get(1).cloned())),
        Some("upload") => {
            if rest.len() < 2 {
                bail!("upload requires at least one path");
            }
            Command::Gallery(GalleryCommand::Upload(
                rest[1..].iter().map(PathBuf::from).collect(),
            ))
        }
        Some("show") => Command::Gallery(GalleryCommand::Show(parse_id(rest.get(1))?)),
        Some("delete") => Command::Gallery(GalleryCommand::Delete {
            id: parse_id(rest.get(1))?,
            yes: rest.iter().skip(2).any(|a| a == "--yes" || a == "-y"),
        }),
        Some("download") => Command::Gallery(GalleryCommand::Download {
            id: parse_id(rest.get(1))?,
            out: rest.get(2).map(PathBuf::from),
        }),
        Some("profile") => {
            let slot = rest
                .get(1)
                .and_then(|s| ProfileSlot::parse(s))
                .context("profile requires a slot: home or contact")?;
            let path = rest.get(2).context("profile requires an image path")?;
            Command::Profile {
                slot,
                path: PathBuf::from(path),
            }
        }
        Some(other) => {
            print_help();
            bail!("Unknown command: {}", other);
        }
    };

    Ok(Args {
        config_path,
        command,
    })
}

fn print_help() {
    println!(
        r#"folio - local photo gallery for a personal portfolio

USAGE:
    folio [OPTIONS] [COMMAND]

COMMANDS:
    list [CATEGORY]             List photos, optionally only one category
    upload PATH...              Upload image files; directories are walked
    show ID                     Show one photo's details
    delete ID [--yes]           Delete a photo (asks unless --yes)
    download ID [OUT]           Save a photo's image to OUT
    profile home|contact PATH   Set a profile photo

OPTIONS:
    --config, -c PATH   Path to config file
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    FOLIO_CONFIG        Path to config file (overrides default location)
    FOLIO_LOG           Log level (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/folio/config.toml"#
    );
}

/// Print what the surface was told to show the user.
fn report(surface: &mut HeadlessSurface) {
    for alert in surface.alerts.drain(..) {
        eprintln!("! {}", alert);
    }
    for notice in surface.notices.drain(..) {
        match notice.kind {
            NoticeKind::Success => println!("{}", notice.message),
            NoticeKind::Error => eprintln!("! {}", notice.message),
        }
    }
}

fn ask(question: &str) -> Result<bool> {
    use std::io::Write;

    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;

    let config = match &args.config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match logging::init(&config.logging) {
        Ok(sink) => tracing::debug!(?sink, "Logging ready"),
        Err(e) => eprintln!("warning: logging disabled: {:#}", e),
    }

    let storage: Arc<dyn StorageBackend> = Arc::new(FileStorage::new(
        config.storage.path.clone(),
        config.storage.quota_bytes,
    ));

    match args.command {
        Command::Profile { slot, path } => run_profile(storage, &config, slot, &path).await,
        Command::Gallery(command) => run_gallery(storage, &config, command).await,
    }
}

async fn run_profile(
    storage: Arc<dyn StorageBackend>,
    config: &Config,
    slot: ProfileSlot,
    path: &Path,
) -> Result<()> {
    let file = FileBlob::from_path(path).with_context(|| format!("Cannot open {}", path.display()))?;

    let mut uploader = ProfileUploader::from_config(storage, HeadlessSurface::default(), config);
    uploader.initialize();
    let result = uploader.upload(file, slot).await;
    report(uploader.surface_mut());
    result?;
    Ok(())
}

async fn run_gallery(
    storage: Arc<dyn StorageBackend>,
    config: &Config,
    command: GalleryCommand,
) -> Result<()> {
    let confirm_answer = match &command {
        GalleryCommand::Delete { yes: true, .. } => true,
        GalleryCommand::Delete { id, yes: false } => ask(&format!("Delete photo {}?", id))?,
        _ => false,
    };

    let store = Arc::new(PhotoStore::new(storage));
    let mut view = GalleryView::new(
        store,
        HeadlessSurface::new(confirm_answer),
        GallerySettings::from_config(config),
    );
    view.initialize();

    match command {
        GalleryCommand::List(category) => {
            if let Some(category) = category {
                view.filter(CategoryFilter::parse(&category));
            }
            let shown = view.surface().visible_ids();
            for photo in view.store().list().iter().filter(|p| shown.contains(&p.id)) {
                println!(
                    "{}\t{}\t{}\t{}",
                    photo.id,
                    photo.category,
                    photo.date.format("%Y-%m-%d %H:%M"),
                    photo.title
                );
            }
            if view.prompt_visible() {
                println!("No photos yet. Add some with `folio upload PATH...`");
            }
        }
        GalleryCommand::Upload(paths) => {
            let files = discover_files(&paths);
            if files.is_empty() {
                bail!("No files found");
            }
            let result = view.accept_files(files, UploadOrigin::Picker).await;
            report(view.surface_mut());
            let batch = result?;
            println!(
                "Uploaded {} of {} files ({} rejected, {} failed)",
                batch.added.len(),
                batch.submitted,
                batch.rejected.len(),
                batch.failed.len()
            );
            for (name, reason) in &batch.rejected {
                println!("  skipped {}: {}", name, reason);
            }
        }
        GalleryCommand::Show(id) => {
            if !view.open_detail_by_id(&id) {
                bail!("No photo with id {}", id);
            }
            if let Some(photo) = view.selected() {
                println!("id:          {}", photo.id);
                println!("title:       {}", photo.title);
                println!("description: {}", photo.description);
                println!("category:    {}", photo.category);
                println!("date:        {}", photo.date.to_rfc3339());
                println!("size:        {} bytes encoded", photo.url.len());
            }
        }
        GalleryCommand::Delete { id, .. } => {
            if !view.open_detail_by_id(&id) {
                bail!("No photo with id {}", id);
            }
            let result = view.delete_selected().await;
            report(view.surface_mut());
            result?;
        }
        GalleryCommand::Download { id, out } => {
            if !view.open_detail_by_id(&id) {
                bail!("No photo with id {}", id);
            }
            view.download();
            let Some((url, filename)) = view.surface_mut().downloads.pop() else {
                bail!("Nothing to download");
            };
            let image = DataUrl::parse(&url).context("Stored image is not a base64 data URL")?;
            let out = out.unwrap_or_else(|| PathBuf::from(filename));
            std::fs::write(&out, &image.bytes)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Saved {} ({} bytes)", out.display(), image.bytes.len());
        }
    }

    Ok(())
}
