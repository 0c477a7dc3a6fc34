//! mpdwire CLI
//!
//! Command-line interface for talking to a Music Player Daemon.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use mpdwire::{Arg, Client, Config, Filter, Record, Reply, TracingLogger, Watcher, WatchEvent};
use tracing_subscriber::{fmt, EnvFilter};

/// mpdwire CLI
#[derive(Parser, Debug)]
#[command(name = "mpdwire-cli")]
#[command(about = "CLI for the Music Player Daemon")]
#[command(version)]
struct Args {
    /// Server host or Unix socket path (defaults to MPD_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Server port (defaults to MPD_PORT, then 6600)
    #[arg(short, long)]
    port: Option<u16>,

    /// Password sent after connecting
    #[arg(long)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show player status
    Status,

    /// Show the current song
    Current,

    /// Start playback, optionally at a queue position
    Play {
        /// Queue position
        pos: Option<u32>,
    },

    /// Toggle pause
    Pause,

    /// Stop playback
    Stop,

    /// Next song in the queue
    Next,

    /// Previous song in the queue
    Prev,

    /// Add a file or directory to the queue
    Add {
        /// URI relative to the music directory
        uri: String,
    },

    /// List the queue
    Queue,

    /// Search the database for an exact tag value
    Find {
        /// Tag name (artist, album, title, ...)
        tag: String,

        /// Value to match
        value: String,
    },

    /// Save a song's cover art to a file
    Albumart {
        /// Song URI
        uri: String,

        /// Output file
        out: String,
    },

    /// Send a command from the command table with string arguments
    Raw {
        /// Command name
        command: String,

        /// Arguments
        args: Vec<String>,
    },

    /// Print status changes until interrupted
    Watch,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mpdwire=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> mpdwire::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.password.is_some() {
        config.password = args.password;
    }
    let poll_interval = config.poll_interval();

    let client = Client::connect_with(config, Arc::new(TracingLogger))?;
    if let Some(version) = client.version() {
        tracing::debug!("server protocol {}", version);
    }

    match args.command {
        Commands::Status => print_record(&client.status()?),
        Commands::Current => match client.current_song()? {
            Some(song) => print_record(&song),
            None => println!("(nothing playing)"),
        },
        Commands::Play { pos } => {
            let args: Vec<Arg> = pos.into_iter().map(Arg::from).collect();
            client.call("play", &args)?;
        }
        Commands::Pause => {
            client.call("pause", &[])?;
        }
        Commands::Stop => {
            client.call("stop", &[])?;
        }
        Commands::Next => {
            client.call("next", &[])?;
        }
        Commands::Prev => {
            client.call("previous", &[])?;
        }
        Commands::Add { uri } => {
            client.call("add", &[Arg::from(uri)])?;
        }
        Commands::Queue => {
            let songs = client.call("playlistinfo", &[])?.into_records().unwrap_or_default();
            for song in songs {
                let pos = song.get("Pos").unwrap_or("?");
                let title = song.get("Title").or(song.get("file")).unwrap_or("");
                println!("{:>4}  {}", pos, title);
            }
        }
        Commands::Find { tag, value } => {
            let filter = Filter::tag(tag).eq(value);
            let songs = client.call("find", &[Arg::from(filter)])?.into_records().unwrap_or_default();
            for song in songs {
                println!("{}", song.get("file").unwrap_or(""));
            }
        }
        Commands::Albumart { uri, out } => match client.album_art(&uri)? {
            Some(art) => match std::fs::write(&out, &art.data) {
                Ok(()) => println!("wrote {} bytes to {}", art.data.len(), out),
                Err(e) => tracing::error!("failed to write {}: {}", out, e),
            },
            None => println!("no cover art for {}", uri),
        },
        Commands::Raw { command, args } => {
            let args: Vec<Arg> = args.into_iter().map(Arg::from).collect();
            print_reply(client.call(&command, &args)?);
        }
        Commands::Watch => watch(Arc::new(client), poll_interval),
    }

    Ok(())
}

fn watch(client: Arc<Client>, interval: Duration) {
    let watcher = Watcher::spawn(client, interval);
    for event in watcher.events().iter() {
        match event {
            WatchEvent::Changed { key, previous, current } => println!(
                "{}: {} -> {}",
                key,
                previous.as_deref().unwrap_or("-"),
                current.as_deref().unwrap_or("-")
            ),
            WatchEvent::Connection { connected } => {
                println!("connection: {}", if connected { "up" } else { "down" })
            }
        }
    }
}

fn print_record(record: &Record) {
    for pair in record {
        println!("{}: {}", pair.key, pair.value);
    }
}

fn print_reply(reply: Reply) {
    match reply {
        Reply::Nothing | Reply::Deferred => println!("OK"),
        Reply::List(values) => values.iter().for_each(|v| println!("{}", v)),
        Reply::Pairs(pairs) => pairs
            .iter()
            .for_each(|p| println!("{}: {}", p.key, p.value)),
        Reply::Record(record) => {
            if let Some(record) = record {
                print_record(&record);
            }
        }
        Reply::Records(records) => {
            for (i, record) in records.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print_record(record);
            }
        }
    }
}
