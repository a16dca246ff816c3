use anyhow::Context;
use clap::{Parser, Subcommand};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
    sync::Mutex,
};

use crate::catalog::{Catalog, MusicApi};
use crate::config;
use crate::domain::{id::TrackId, quality::Quality, track::Track};
use crate::radio::{Advance, advance_stored};
use crate::storage::db::i64_seconds_to_local_time;
use crate::storage::operations::Storage;
use crate::storage::{lock, schema::keys};

#[derive(Parser)]
#[command(name = "doradeck")]
#[command(version = "0.1")]
#[command(about = "Music player with an endless radio")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search the catalog for tracks
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Start a new queue with a track
    Play { id: String },
    /// Go to the next track, the radio picks one when the queue runs out
    Next,
    /// Go back to the previous track
    Prev,
    /// Show the queue
    Queue,
    /// Like or unlike the current track
    Like,
    /// List liked tracks
    Favorites,
    /// Start a new queue with the liked tracks
    PlayFavorites,
    /// Show or set the preferred streaming quality
    Quality {
        /// one of 12kbps, 48kbps, 96kbps, 160kbps, 320kbps
        value: Option<Quality>,
    },
    /// Download a track as mp3
    Download {
        id: String,
        /// Directory to write the file to
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Run http server exposing the player
    Serve,
}

/// formats seconds as m:ss
fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn print_track(marker: &str, track: &Track) {
    let duration = track
        .metadata
        .duration
        .map(|d| format!(" [{}]", format_time(d)))
        .unwrap_or_default();
    println!(
        "{marker} {}  {} - {} ({}){duration}",
        track.id, track.metadata.artist, track.metadata.title, track.metadata.album
    );
}

fn print_now_playing(track: &Track, quality: Quality) {
    print_track("▶", track);
    match track.stream_url(quality) {
        Some(url) => println!("  stream ({quality}): {url}"),
        None => println!("  no stream url available for this track"),
    }
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let cfg = config::Config::load(&cli.config)?;
    let mut storage = Storage::new(&cfg.database).with_context(|| "Failed to open storage")?;

    match cli.command {
        Commands::Search { query } => {
            let api = MusicApi::new(cfg.api);
            let query = query.join(" ");
            let tracks = api
                .search(&query)
                .with_context(|| format!("Failed to search for '{query}'"))?;

            if tracks.is_empty() {
                println!("Nothing found for '{query}'");
            }
            for track in &tracks {
                let marker = if storage.is_favorite(&track.id)? {
                    "♥"
                } else {
                    "-"
                };
                print_track(marker, track);
            }
        }

        Commands::Play { id } => {
            let api = MusicApi::new(cfg.api);
            let track = api
                .track(&TrackId::from(id))
                .with_context(|| "Failed to fetch track")?;

            let mut queue = storage.load_queue()?;
            queue.play_single(track.clone());
            storage.save_queue(&queue)?;
            print_now_playing(&track, storage.quality()?);
        }

        Commands::Next => {
            let api = MusicApi::new(cfg.api);
            let policy = cfg.radio.policy();
            let storage = Mutex::new(storage);
            let advance = advance_stored(&storage, &api, &policy, &mut rand::rng())?;
            let quality = lock(&storage)?.quality()?;

            match advance {
                Advance::Queued(track) => print_now_playing(&track, quality),
                Advance::Enqueued { track, tier } => {
                    println!("Radio pick (tier: {tier}):");
                    print_now_playing(&track, quality);
                }
                Advance::Exhausted => {
                    println!("Radio stopped: no recommendation left, pick a track with \"play\"")
                }
                Advance::Stale => {
                    println!("Queue changed while looking for the next track, nothing added")
                }
            }
        }

        Commands::Prev => {
            let mut queue = storage.load_queue()?;
            match queue.previous().cloned() {
                Some(track) => {
                    storage.save_queue(&queue)?;
                    print_now_playing(&track, storage.quality()?);
                }
                None => println!("Queue is empty"),
            }
        }

        Commands::Queue => {
            let queue = storage.load_queue()?;
            if queue.is_empty() {
                println!("Queue is empty");
                return Ok(());
            }
            if let Some(saved) = storage.last_updated(keys::QUEUE)? {
                println!(
                    "Queue of {} tracks, updated {}",
                    queue.tracks().len(),
                    i64_seconds_to_local_time(saved)?
                );
            }
            for (i, track) in queue.tracks().iter().enumerate() {
                let marker = if Some(i) == queue.cursor() { "▶" } else { " " };
                print_track(marker, track);
            }
            if !queue.has_upcoming() {
                println!("The radio picks what comes after the current track");
            }
        }

        Commands::Like => {
            let queue = storage.load_queue()?;
            match queue.current() {
                Some(track) => {
                    let liked = storage.toggle_favorite(track)?;
                    let verb = if liked { "Liked" } else { "Unliked" };
                    println!(
                        "{verb} {} - {}",
                        track.metadata.artist, track.metadata.title
                    );
                }
                None => println!("Nothing is playing"),
            }
        }

        Commands::Favorites => {
            let favorites = storage.favorites()?;
            println!("{} liked tracks", favorites.len());
            for track in &favorites {
                print_track("♥", track);
            }
        }

        Commands::PlayFavorites => {
            let favorites = storage.favorites()?;
            if favorites.is_empty() {
                println!("No liked tracks yet");
                return Ok(());
            }
            let mut queue = storage.load_queue()?;
            queue.replace(favorites, 0);
            storage.save_queue(&queue)?;
            if let Some(track) = queue.current() {
                print_now_playing(track, storage.quality()?);
            }
        }

        Commands::Quality { value } => match value {
            Some(quality) => {
                storage.set_quality(quality)?;
                println!("Quality set to {quality}");
            }
            None => println!("Quality: {}", storage.quality()?),
        },

        Commands::Download { id, out } => {
            let api = MusicApi::new(cfg.api);
            let track = api
                .track(&TrackId::from(id))
                .with_context(|| "Failed to fetch track")?;
            let quality = storage.quality()?;

            let path = out.join(track.download_file_name());
            let file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.to_string_lossy()))?;
            let mut writer = BufWriter::new(file);
            let size = api
                .download(&track, quality, &mut writer)
                .with_context(|| format!("Failed to download {}", track.id))?;
            writer.flush()?;

            println!(
                "Downloaded {} ({size} bytes, {quality}) to {}",
                track.metadata.title,
                path.to_string_lossy()
            );
        }

        Commands::Serve => {
            println!("Starting HTTP server...");

            let api = MusicApi::new(cfg.api);
            let http_server =
                crate::http::server::HttpServer::new(storage, api, cfg.radio.policy(), cfg.http);

            println!(
                "HTTP server running at http://{}:{}",
                http_server.config.bind_addr, http_server.config.port
            );
            http_server.run();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(59), "0:59");
        assert_eq!(format_time(262), "4:22");
        assert_eq!(format_time(3600), "60:00");
    }

    #[test]
    fn test_parse_cli() {
        let cli = Cli::parse_from(["doradeck", "search", "tum", "hi", "ho"]);
        match cli.command {
            Commands::Search { query } => assert_eq!(query.join(" "), "tum hi ho"),
            _ => panic!("expected search"),
        }
        assert_eq!(cli.config, PathBuf::from("config.toml"));

        let cli = Cli::parse_from(["doradeck", "-c", "other.toml", "quality", "96kbps"]);
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert!(matches!(
            cli.command,
            Commands::Quality {
                value: Some(Quality::Kbps96)
            }
        ));

        assert!(Cli::try_parse_from(["doradeck", "quality", "loud"]).is_err());
        assert!(Cli::try_parse_from(["doradeck", "search"]).is_err());
    }
}
