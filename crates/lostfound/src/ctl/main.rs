//! lostfoundctl - Command line client for the lost & found backend
//!
//! Chats with the agent (streamed), browses posts and claims and inspects
//! public system data.

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use lostfound::agent::StreamRequest;
use lostfound::posts::{Campus, MyPostQuery, MyPostStatus, PostQuery, PostStatus, PublishType};
use lostfound::{ClientConfig, LostFoundClient, StreamEvent, StreamOutcome};

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        let _ = writeln!(io::stderr(), "Error: {err:?}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

#[tokio::main]
async fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config_path()?;

    // Init must work even when the existing file does not parse.
    if let Command::Config {
        command: ConfigCommand::Init { force },
    } = &cli.command
    {
        return handle_config_init(&config_path, *force);
    }

    let config = cli.load_config(&config_path)?;
    init_logging(&cli, &config);
    debug!("Using API at {}", config.base_url);

    let client = LostFoundClient::connect(&config).context("building HTTP client")?;

    match cli.command {
        Command::Config { command } => match command {
            ConfigCommand::Init { force } => handle_config_init(&config_path, force),
            ConfigCommand::Show => handle_config_show(&config, &config_path, cli.json),
        },
        Command::Sessions => handle_sessions(&client, cli.json).await,
        Command::NewSession { title } => {
            handle_new_session(&client, title.as_deref(), cli.json).await
        }
        Command::History { session_id } => handle_history(&client, &session_id, cli.json).await,
        Command::Chat {
            message,
            session,
            title,
            images,
        } => {
            handle_chat(
                &client,
                session.as_deref(),
                title.as_deref(),
                &message,
                images,
                cli.json,
            )
            .await
        }
        Command::Posts { command } => handle_posts(&client, command, cli.json).await,
        Command::Claims { command } => handle_claims(&client, command, cli.json).await,
        Command::System { command } => handle_system(&client, command, cli.json).await,
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "lostfoundctl",
    author,
    version,
    about = "Command line client for the campus lost & found backend and its agent chat."
)]
struct Cli {
    /// API root URL, e.g. http://localhost:8080/api (overrides the config file)
    #[arg(long, short = 's', env = "LOSTFOUND_SERVER_URL", global = true)]
    server: Option<String>,

    /// Bearer token (overrides the config file)
    #[arg(long, env = "LOSTFOUND_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Path to the config file
    #[arg(long, short = 'c', env = "LOSTFOUND_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all logging
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// List agent chat sessions
    Sessions,

    /// Start a new agent chat session and print its id
    NewSession {
        /// Optional session title
        title: Option<String>,
    },

    /// Show the messages of a chat session
    History {
        /// Session ID
        session_id: String,
    },

    /// Send a message to the agent and stream the reply (Ctrl-C cancels)
    Chat {
        /// The message to send
        message: String,

        /// Existing session ID; a new session is created when omitted
        #[arg(long, short = 'S')]
        session: Option<String>,

        /// Title for the new session when --session is omitted
        #[arg(long, conflicts_with = "session")]
        title: Option<String>,

        /// Image URL to attach (repeatable)
        #[arg(long = "image", short = 'i')]
        images: Vec<String>,
    },

    /// Browse posts
    Posts {
        #[command(subcommand)]
        command: PostsCommand,
    },

    /// Inspect claims
    Claims {
        #[command(subcommand)]
        command: ClaimsCommand,
    },

    /// Public system data
    System {
        #[command(subcommand)]
        command: SystemCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

#[derive(Debug, Subcommand)]
enum PostsCommand {
    /// List public posts
    List {
        /// LOST or FOUND
        #[arg(long = "type")]
        publish_type: Option<PublishType>,
        /// Item category
        #[arg(long)]
        item_type: Option<String>,
        /// ZHAO_HUI, PING_FENG or MO_GAN_SHAN
        #[arg(long)]
        campus: Option<Campus>,
        #[arg(long)]
        location: Option<String>,
        /// PENDING, APPROVED, SOLVED, CANCELLED, REJECTED or ARCHIVED
        #[arg(long)]
        status: Option<PostStatus>,
        #[arg(long)]
        page: Option<i64>,
        #[arg(long)]
        page_size: Option<i64>,
    },
    /// Show one post
    Show {
        /// Post ID
        id: String,
        /// Show the author-side record (review status, reject reason)
        #[arg(long)]
        record: bool,
    },
    /// List your own posts
    Mine {
        #[arg(long = "type")]
        publish_type: Option<PublishType>,
        #[arg(long)]
        status: Option<MyPostStatus>,
        #[arg(long)]
        page: Option<i64>,
        #[arg(long)]
        page_size: Option<i64>,
    },
}

#[derive(Debug, Subcommand)]
enum ClaimsCommand {
    /// List claims filed against a post
    List {
        /// Post ID
        post_id: String,
    },
}

#[derive(Debug, Subcommand)]
enum SystemCommand {
    /// Show the public configuration
    Config,
    /// List announcements
    Announcements {
        #[arg(long)]
        page: Option<i64>,
        #[arg(long)]
        page_size: Option<i64>,
    },
}

impl Cli {
    fn config_path(&self) -> Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => ClientConfig::default_path().context("could not determine config directory"),
        }
    }

    fn load_config(&self, path: &Path) -> Result<ClientConfig> {
        let mut config = ClientConfig::load(Some(path))
            .with_context(|| format!("loading config from {}", path.display()))?;
        if let Some(server) = &self.server {
            config.base_url = server.trim().trim_end_matches('/').to_string();
        }
        if let Some(token) = &self.token {
            config.auth_token = Some(token.trim().to_string()).filter(|t| !t.is_empty());
        }
        Ok(config)
    }

    fn effective_log_level(&self, config: &ClientConfig) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Off;
        }
        match self.verbose {
            0 => config.logging.level.parse().unwrap_or(LevelFilter::Info),
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn init_logging(cli: &Cli, config: &ClientConfig) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let level = cli.effective_log_level(config);
    if level == LevelFilter::Off {
        log::set_max_level(LevelFilter::Off);
        return;
    }
    let level = level.to_string().to_lowercase();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("lostfound={level},lostfound_protocol={level},lostfoundctl={level}"))
    });

    // Logs go to stderr so stdout stays parseable.
    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(io::stderr)
                    .with_ansi(io::stderr().is_terminal()),
            )
            .try_init()
            .ok();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Cut `text` to `max` characters for table output.
fn clip(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

// ============================================================================
// Config
// ============================================================================

fn handle_config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "config file {} already exists (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {parent:?}"))?;
    }
    let body = ClientConfig::default()
        .to_toml(path)
        .context("serializing default config to TOML")?;
    fs::write(path, body).with_context(|| format!("writing config file to {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn handle_config_show(config: &ClientConfig, path: &Path, json_output: bool) -> Result<()> {
    let mut shown = config.clone();
    if shown.auth_token.is_some() {
        shown.auth_token = Some("<redacted>".to_string());
    }
    if json_output {
        return print_json(&shown);
    }
    let body = shown
        .to_toml(path)
        .context("serializing config to TOML")?;
    print!("{body}");
    Ok(())
}

// ============================================================================
// Agent
// ============================================================================

async fn handle_sessions(client: &LostFoundClient, json_output: bool) -> Result<()> {
    let sessions = client.agent.list_sessions().await?;
    if json_output {
        return print_json(&sessions);
    }
    if sessions.is_empty() {
        println!("No sessions found");
        return Ok(());
    }
    println!("{:<24} {:<40} {:<20}", "ID", "TITLE", "UPDATED");
    println!("{}", "-".repeat(84));
    for session in &sessions {
        let title = if session.title.is_empty() {
            "(untitled)"
        } else {
            &session.title
        };
        let updated = session
            .updated_at
            .split('T')
            .next()
            .unwrap_or(&session.updated_at);
        println!(
            "{:<24} {:<40} {:<20}",
            session.session_id,
            clip(title, 38),
            updated
        );
    }
    Ok(())
}

async fn handle_new_session(
    client: &LostFoundClient,
    title: Option<&str>,
    json_output: bool,
) -> Result<()> {
    let session_id = client.agent.create_session(title).await?;
    if json_output {
        print_json(&serde_json::json!({ "session_id": session_id }))
    } else {
        println!("{session_id}");
        Ok(())
    }
}

async fn handle_history(client: &LostFoundClient, session_id: &str, json_output: bool) -> Result<()> {
    let messages = client.agent.history(session_id).await?;
    if json_output {
        return print_json(&messages);
    }
    if messages.is_empty() {
        println!("No messages");
    }
    for message in &messages {
        println!(
            "[{}] {}: {}",
            message.created_at,
            message.role.as_str(),
            message.content
        );
        for image in &message.images {
            println!("    image: {image}");
        }
    }
    Ok(())
}

async fn handle_chat(
    client: &LostFoundClient,
    session: Option<&str>,
    title: Option<&str>,
    message: &str,
    images: Vec<String>,
    json_output: bool,
) -> Result<()> {
    let session_id = match session {
        Some(id) => id.to_string(),
        None => {
            let id = client.agent.create_session(title).await?;
            eprintln!("Started session {id}");
            id
        }
    };

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let request = StreamRequest::new(session_id, message).with_images(images);
    let mut stdout = io::stdout();
    let outcome = client
        .agent
        .stream_message(
            &request,
            &cancel,
            |event| {
                if json_output {
                    match serde_json::to_string(&event) {
                        Ok(line) => println!("{line}"),
                        Err(e) => warn!("Failed to serialize event: {}", e),
                    }
                    return;
                }
                match event {
                    StreamEvent::Content { text } => {
                        print!("{text}");
                        let _ = stdout.flush();
                    }
                    StreamEvent::ToolCall { data } => {
                        eprintln!("\x1b[2m[tool] {} {}\x1b[0m", data.name, data.arguments);
                    }
                    StreamEvent::ToolResult { data } => {
                        eprintln!("\x1b[2m[tool result] {}\x1b[0m", data.tool_name);
                    }
                }
            },
            || {
                if !json_output {
                    println!();
                }
            },
        )
        .await;
    ctrl_c.abort();

    match outcome? {
        StreamOutcome::Cancelled { events } => {
            eprintln!("\nCancelled after {events} events");
        }
        outcome @ StreamOutcome::Completed { .. } => {
            debug!("Chat finished: {:?}", outcome);
        }
    }
    Ok(())
}

// ============================================================================
// Posts and claims
// ============================================================================

async fn handle_posts(client: &LostFoundClient, command: PostsCommand, json_output: bool) -> Result<()> {
    match command {
        PostsCommand::List {
            publish_type,
            item_type,
            campus,
            location,
            status,
            page,
            page_size,
        } => {
            let query = PostQuery {
                publish_type,
                item_type,
                campus,
                location,
                status,
                page,
                page_size,
                ..PostQuery::default()
            };
            let result = client.posts.list_posts(&query).await?;
            if json_output {
                return print_json(&result);
            }
            println!(
                "{:<8} {:<6} {:<24} {:<12} {:<20} {:<8}",
                "ID", "TYPE", "NAME", "CATEGORY", "LOCATION", "STATUS"
            );
            println!("{}", "-".repeat(84));
            for item in &result.list {
                println!(
                    "{:<8} {:<6} {:<24} {:<12} {:<20} {:<8}",
                    item.id,
                    item.post_type,
                    clip(&item.item_name, 22),
                    clip(&item.item_type, 10),
                    clip(&item.location, 18),
                    item.item_status
                );
            }
            println!(
                "Page {} ({} per page), {} total",
                result.page, result.page_size, result.total
            );
        }
        PostsCommand::Show { id, record } => {
            if record {
                let record = client.posts.post_detail_record(&id).await?;
                if json_output {
                    return print_json(&record);
                }
                println!("{} [{}] {}", record.id, record.post_type, record.item_name);
                println!("Review:   {}", record.review_status);
                println!("Status:   {}", record.item_status);
                println!("Created:  {}", record.created_at);
                if let Some(updated) = &record.updated_at {
                    println!("Updated:  {updated}");
                }
                if let Some(reason) = &record.reject_reason {
                    println!("Rejected: {reason}");
                }
            } else {
                let item = client.posts.post_detail(&id).await?;
                if json_output {
                    return print_json(&item);
                }
                println!("{} [{}] {}", item.id, item.post_type, item.item_name);
                println!("Category: {}", item.item_type);
                println!("Status:   {}", item.item_status);
                println!("Where:    {} (kept at {})", item.location, item.storage_location);
                println!("When:     {}", item.event_time);
                println!("Features: {}", item.features);
                if !item.contact.is_empty() {
                    println!("Contact:  {}", item.contact);
                }
                if let Some(reward) = &item.reward_description {
                    println!("Reward:   {reward}");
                }
                println!("Claims:   {}", item.claim_count);
                for image in &item.images {
                    println!("Image:    {image}");
                }
            }
        }
        PostsCommand::Mine {
            publish_type,
            status,
            page,
            page_size,
        } => {
            let query = MyPostQuery {
                publish_type,
                status,
                page,
                page_size,
            };
            let result = client.posts.my_posts(&query).await?;
            if json_output {
                return print_json(&result);
            }
            println!(
                "{:<8} {:<6} {:<24} {:<8} {:<8}",
                "ID", "TYPE", "NAME", "REVIEW", "STATUS"
            );
            println!("{}", "-".repeat(60));
            for record in &result.list {
                println!(
                    "{:<8} {:<6} {:<24} {:<8} {:<8}",
                    record.id,
                    record.post_type,
                    clip(&record.item_name, 22),
                    record.review_status,
                    record.item_status
                );
            }
        }
    }
    Ok(())
}

async fn handle_claims(client: &LostFoundClient, command: ClaimsCommand, json_output: bool) -> Result<()> {
    match command {
        ClaimsCommand::List { post_id } => {
            let claims = client.posts.list_claims(&post_id).await?;
            if json_output {
                return print_json(&claims);
            }
            if claims.is_empty() {
                println!("No claims");
            }
            for claim in &claims {
                println!(
                    "{:<8} {:<10} {:<20} {}",
                    claim.id,
                    claim.status,
                    claim.created_at,
                    clip(&claim.description, 60)
                );
            }
        }
    }
    Ok(())
}

// ============================================================================
// System
// ============================================================================

async fn handle_system(client: &LostFoundClient, command: SystemCommand, json_output: bool) -> Result<()> {
    match command {
        SystemCommand::Config => {
            let config = client.system.public_config().await?;
            if json_output {
                return print_json(&config);
            }
            println!("Item types:          {}", config.item_types.join(", "));
            println!("Feedback types:      {}", config.feedback_types.join(", "));
            println!("Claim validity days: {}", config.claim_validity_days);
            println!("Publish limit:       {}", config.publish_limit);
        }
        SystemCommand::Announcements { page, page_size } => {
            let result = client.system.announcements(page, page_size).await?;
            if json_output {
                return print_json(&result);
            }
            for announcement in &result.list {
                println!(
                    "{} [{}] {}",
                    announcement.created_at, announcement.kind, announcement.title
                );
            }
        }
    }
    Ok(())
}
