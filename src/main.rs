use clap::{Parser, Subcommand};
use face_part_swap::backend::HttpBackend;
use face_part_swap::cache::GalleryCache;
use face_part_swap::config::{self, ClientConfig};
use face_part_swap::render;
use face_part_swap::ring::GalleryRing;
use face_part_swap::runtime::{self, Event, EventLoop};
use face_part_swap::script::{self, ScriptCommand};
use face_part_swap::session::{Session, UiAction};
use face_part_swap::upload;
use log::LevelFilter;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "face-part-swap")]
#[command(about = "Browse face-part galleries and swap a part onto your photo")]
#[command(long_about = "\
Browse face-part galleries and swap a part onto your photo

A session starts on the configured default part. Step through its example
faces, compare two of them side by side, choose one, supply a photo and
submit the swap. The backend composites the chosen part onto the photo.

Script commands (one per line, '#' starts a comment):

  part <name>             switch part (gallery is fetched once, then cached)
  next | prev             step the gallery ring
  choose                  choose the face on screen
  zoom                    open the comparison overlay
  upper | lower           pick an overlay slot
  page-next | page-prev   page the overlay
  commit | close          leave the overlay, choosing or not
  photo <path>            supply your photo (png or jpeg)
  swap                    submit the swap
  download <dir>          save the displayed result
  show                    print the session
  wait                    wait for outstanding calls
  quit

Run 'face-part-swap gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    /// Backend base URL, overriding backend.base_url
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch and list the example faces of a part
    Gallery {
        /// Part to list; defaults to the configured default part
        #[arg(long)]
        part: Option<String>,
    },
    /// Drive a session from a command script
    Run {
        /// Script file; stdin when omitted
        #[arg(long)]
        script: Option<PathBuf>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    face_part_swap::init_logging(LevelFilter::Info);
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut client_config = config::load_config(&cli.config)?;
    if let Some(base_url) = cli.base_url {
        client_config.backend.base_url = base_url;
        client_config.validate()?;
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Command::Gallery { part } => {
            let part = part.unwrap_or_else(|| client_config.default_part.clone());
            rt.block_on(list_gallery(&client_config, &part))?;
        }
        Command::Run { script } => {
            let local = tokio::task::LocalSet::new();
            local.block_on(&rt, run_session(client_config, script))?;
        }
        Command::GenConfig => {}
    }

    Ok(())
}

async fn list_gallery(config: &ClientConfig, part: &str) -> Result<(), Box<dyn std::error::Error>> {
    let backend = HttpBackend::new(&config.backend)?;
    let mut cache = GalleryCache::new();
    GalleryRing::activate(&mut cache, &backend, part).await?;
    if let Some(gallery) = cache.peek(part) {
        render::print_gallery(gallery);
    }
    println!("Cache: {}", cache.stats());
    Ok(())
}

async fn run_session(
    config: ClientConfig,
    script_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    let accepted = config.upload.accepted_types.clone();
    let event_loop = EventLoop::new(Session::new(config, backend));
    let tx = event_loop.sender();
    let handle = tokio::task::spawn_local(event_loop.run(render::print_update));

    let input: Box<dyn AsyncBufRead + Unpin> = match &script_path {
        Some(path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };
    let mut lines = input.lines();
    let mut number = 0;

    runtime::idle(&tx).await;
    while let Some(line) = lines.next_line().await? {
        number += 1;
        let command = match script::parse_line(number, &line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        let event = match command {
            ScriptCommand::Action(action) => Event::Action(action),
            ScriptCommand::Photo(path) => match upload::read_photo(&path, &accepted) {
                Ok(photo) => Event::Action(UiAction::SupplyPhoto { photo }),
                Err(e) => {
                    eprintln!("! {e}");
                    continue;
                }
            },
            ScriptCommand::Download(dir) => Event::Download { dir },
            ScriptCommand::Show => Event::Show,
            ScriptCommand::Wait => {
                runtime::idle(&tx).await;
                continue;
            }
            ScriptCommand::Quit => break,
        };
        if tx.send(event).is_err() {
            break;
        }
    }

    runtime::idle(&tx).await;
    let _ = tx.send(Event::Quit);
    let session = handle.await?;
    println!("Cache: {}", session.cache().stats());
    Ok(())
}
