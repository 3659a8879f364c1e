/// Banger Player - headless music streaming client
use anyhow::Context;
use banger_catalog::HttpArtworkLoader;
use banger_core::types::{PlaylistId, RepeatMode, Track};
use banger_core::{ArtworkLoader, PlaylistStore};
use banger_player::{App, PlayOptions, Player, PlayerConfig, QueueSource};
use banger_playback::format_time;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "banger")]
#[command(about = "Stream, organize and play tracks from the Jamendo catalog", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./banger.toml when present)
    #[arg(short, long, global = true, env = "BANGER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the home feed
    Feed,
    /// Search the catalog
    Search {
        /// Free-text query
        query: String,
    },
    /// Browse a genre tag
    Genre {
        /// Tag such as rock, jazz or chillout
        tag: String,
    },
    /// Manage playlists
    Playlists {
        #[command(subcommand)]
        action: PlaylistCommand,
    },
    /// List favorite tracks
    Favorites,
    /// List recently played tracks
    History,
    /// Play a queue interactively
    Play(PlayArgs),
}

#[derive(Subcommand)]
enum PlaylistCommand {
    /// List all playlists
    List,
    /// Show the tracks of a playlist
    Show { id: String },
    /// Create a playlist
    Create {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Rename a playlist
    Rename { id: String, name: String },
    /// Delete a playlist
    Delete { id: String },
    /// Add the best catalog match for a query
    Add { id: String, query: String },
    /// Remove a track by id
    Remove { id: String, track_id: String },
}

#[derive(Args)]
struct PlayArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Start with shuffle on
    #[arg(long)]
    shuffle: bool,

    /// Repeat mode
    #[arg(long, value_enum, default_value_t = RepeatArg::Off)]
    repeat: RepeatArg,

    /// Queue position to start from
    #[arg(long, default_value_t = 0)]
    start: usize,

    /// Playback clock multiplier for the simulated engine
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Args)]
#[group(required = false, multiple = false)]
struct SourceArgs {
    /// Search query to build the queue from (home feed when nothing is given)
    query: Option<String>,

    #[arg(long)]
    genre: Option<String>,

    /// Playlist id
    #[arg(long)]
    playlist: Option<String>,

    #[arg(long)]
    favorites: bool,

    #[arg(long)]
    history: bool,
}

impl SourceArgs {
    fn into_source(self) -> QueueSource {
        if let Some(query) = self.query {
            QueueSource::Search(query)
        } else if let Some(tag) = self.genre {
            QueueSource::Genre(tag)
        } else if let Some(id) = self.playlist {
            QueueSource::Playlist(id)
        } else if self.favorites {
            QueueSource::Favorites
        } else if self.history {
            QueueSource::History
        } else {
            QueueSource::Feed
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RepeatArg {
    Off,
    All,
    One,
}

impl From<RepeatArg> for RepeatMode {
    fn from(arg: RepeatArg) -> Self {
        match arg {
            RepeatArg::Off => RepeatMode::Off,
            RepeatArg::All => RepeatMode::All,
            RepeatArg::One => RepeatMode::One,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "banger=info,banger_player=info,banger_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = PlayerConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let app = App::open(config).await?;

    match cli.command {
        Commands::Feed => feed(&app).await?,
        Commands::Search { query } => search(&app, &query).await?,
        Commands::Genre { tag } => {
            let tracks = app.queue(&QueueSource::Genre(tag.clone())).await?;
            println!("Genre {tag}:");
            print_tracks(&tracks);
        }
        Commands::Playlists { action } => playlists(&app, action).await?,
        Commands::Favorites => {
            let tracks = app.store().favorite_tracks().await?;
            println!("Favorites ({}):", tracks.len());
            print_tracks(&tracks);
        }
        Commands::History => {
            let tracks = app.store().recently_played().await?;
            println!("Recently played ({}):", tracks.len());
            print_tracks(&tracks);
        }
        Commands::Play(args) => play(&app, args).await?,
    }

    Ok(())
}

async fn feed(app: &App) -> anyhow::Result<()> {
    let feed = app.catalog().home_feed().await?;
    println!("Home feed ({}):", feed.source);
    print_tracks(&feed.tracks);
    Ok(())
}

async fn search(app: &App, query: &str) -> anyhow::Result<()> {
    let results = app.catalog().search_with_suggestions(query).await?;

    println!("Results for {query:?}:");
    print_tracks(&results.tracks);

    if !results.suggestions.is_empty() {
        println!();
        println!("More {}:", results.suggested_genre);
        print_tracks(&results.suggestions);
    }
    Ok(())
}

async fn playlists(app: &App, action: PlaylistCommand) -> anyhow::Result<()> {
    let store = app.store();

    match action {
        PlaylistCommand::List => {
            for playlist in store.get_playlists().await? {
                println!(
                    "  {} - {} ({} tracks){}",
                    playlist.id,
                    playlist.name,
                    playlist.track_count(),
                    if playlist.is_default { " [default]" } else { "" }
                );
            }
        }
        PlaylistCommand::Show { id } => {
            let playlist = app.playlist(&id).await?;
            println!("{}", playlist.name);
            if let Some(description) = &playlist.description {
                println!("{description}");
            }
            print_tracks(&playlist.tracks);
        }
        PlaylistCommand::Create { name, description } => {
            let playlist = store
                .create_playlist(&name, description.as_deref())
                .await?;
            println!("Created playlist {} ({})", playlist.name, playlist.id);
        }
        PlaylistCommand::Rename { id, name } => {
            store.rename_playlist(&PlaylistId::from(id.as_str()), &name).await?;
            println!("Renamed playlist {id} to {name}");
        }
        PlaylistCommand::Delete { id } => {
            store.delete_playlist(&PlaylistId::from(id.as_str())).await?;
            println!("Deleted playlist {id}");
        }
        PlaylistCommand::Add { id, query } => {
            let playlist = app.playlist(&id).await?;
            let track = app.first_match(&query).await?;
            if store.add_track(&playlist.id, &track).await? {
                println!("Added {} to {}", track.title, playlist.name);
            } else {
                println!("{} is already in {}", track.title, playlist.name);
            }
        }
        PlaylistCommand::Remove { id, track_id } => {
            let playlist = app.playlist(&id).await?;
            let track = playlist
                .tracks
                .iter()
                .find(|t| t.id.as_str() == track_id)
                .with_context(|| format!("track {track_id} is not in {}", playlist.name))?;
            if store.remove_track(&playlist.id, track).await? {
                println!("Removed {} from {}", track.title, playlist.name);
            }
        }
    }

    Ok(())
}

async fn play(app: &App, args: PlayArgs) -> anyhow::Result<()> {
    let source = args.source.into_source();
    let tracks = app.queue(&source).await?;
    let playlist = match &source {
        QueueSource::Playlist(id) => Some(app.playlist(id).await?),
        _ => None,
    };

    let artwork = match HttpArtworkLoader::new() {
        Ok(loader) => Some(Arc::new(loader) as Arc<dyn ArtworkLoader>),
        Err(e) => {
            tracing::warn!(error = %e, "Artwork loader unavailable, using placeholders");
            None
        }
    };

    let options = PlayOptions {
        shuffle: args.shuffle,
        repeat: args.repeat.into(),
        speed: args.speed,
        progress: !args.no_progress,
    };
    let player = Player::start(&app.config().playback, app.store(), artwork, &options);

    match playlist {
        Some(playlist) => {
            player.engine().register_all(&playlist.tracks);
            player.handle().play_user_playlist(playlist, args.start)?;
        }
        None => player.play(tracks, args.start)?,
    }

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let outcome = player.run(stdin).await;
    player.shutdown().await?;
    outcome?;

    println!();
    Ok(())
}

fn print_tracks(tracks: &[Track]) {
    if tracks.is_empty() {
        println!("  (none)");
        return;
    }
    for (i, track) in tracks.iter().enumerate() {
        println!(
            "  {:>2}. {} - {} [{}] ({})",
            i + 1,
            track.title,
            track.artist,
            format_time(track.duration()),
            track.id
        );
    }
}
