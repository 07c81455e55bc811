use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context as _, Result};
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use tracing_subscriber::EnvFilter;

use nerdfeed_application::{FeedSettings, FeedUseCase, Notice, PublishOutcome};
use nerdfeed_core::storage::ImageUpload;
use nerdfeed_infrastructure::{BackendConfig, InMemoryBackend, supabase};

mod commands;
mod helper;
mod render;

use commands::{Command, help_text};
use helper::FeedHelper;

#[derive(Parser)]
#[command(name = "nerdfeed")]
#[command(version, about = "TODAY IN NERD HISTORY - a tiny social feed in your terminal", long_about = None)]
struct Cli {
    /// Run against an in-memory backend (sign-in codes are printed)
    #[arg(long)]
    offline: bool,

    /// Config file (defaults to <config dir>/nerdfeed/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

enum Flow {
    Continue,
    Quit,
}

/// The page: use case plus the offline backend when running without network.
struct Page {
    usecase: Arc<FeedUseCase>,
    offline: Option<InMemoryBackend>,
    /// Number of entries last rendered, read by the line editor
    feed_len: Arc<AtomicUsize>,
}

impl Page {
    async fn show(&self) {
        let state = self.usecase.snapshot().await;
        self.feed_len.store(state.posts.len(), Ordering::Relaxed);
        print!("{}", render::render_page(&state));
    }

    async fn handle(&self, command: Command) -> Flow {
        match command {
            Command::SignIn(email) => match self.usecase.request_sign_in(&email).await {
                Ok(true) => {
                    if let Some(code) = self.offline.as_ref().and_then(|m| m.pending_code(email.trim())) {
                        println!("{}", format!("(offline) sign-in code: {code}").bright_black());
                    }
                    println!("{}", format!("Then run /verify {} <code>", email.trim()).bright_black());
                }
                Ok(false) => println!("{}", "Sign-in cancelled.".bright_black()),
                Err(e) => eprintln!("{}", format!("Could not send sign-in link: {e}").red()),
            },
            Command::Verify { email, code } => match self.usecase.verify_sign_in(&email, &code).await {
                Ok(_) => self.show().await,
                Err(e) => eprintln!("{}", format!("Sign-in failed: {e}").red()),
            },
            Command::SignOut => match self.usecase.sign_out().await {
                Ok(()) => println!("{}", "Signed out.".bright_green()),
                Err(e) => eprintln!("{}", format!("Sign-out failed: {e}").red()),
            },
            Command::Image(None) => {
                self.usecase.clear_image().await;
                self.show().await;
            }
            Command::Image(Some(path)) => match read_image(&path).await {
                Ok(image) => {
                    self.usecase.select_image(image).await;
                    self.show().await;
                }
                Err(e) => eprintln!("{}", format!("{e:#}").red()),
            },
            Command::Draft(text) => {
                self.usecase.set_draft_content(text).await;
                self.show().await;
            }
            Command::Post(text) => {
                if let Some(text) = text {
                    self.usecase.set_draft_content(text).await;
                }
                match self.usecase.publish().await {
                    PublishOutcome::Published(report) => {
                        if report.image_dropped {
                            println!("{}", "Posted without the image (upload failed).".yellow());
                        }
                        self.show().await;
                    }
                    PublishOutcome::Busy => println!("{}", "Still posting...".bright_black()),
                    // Notices were already printed by the notifier.
                    PublishOutcome::Rejected(_) | PublishOutcome::Failed(_) => {}
                }
            }
            Command::Like(position) => {
                let post_id = self
                    .usecase
                    .snapshot()
                    .await
                    .posts
                    .get(position - 1)
                    .map(|post| post.id.clone());
                let Some(post_id) = post_id else {
                    eprintln!("{}", format!("No post number {position}.").red());
                    return Flow::Continue;
                };
                let outcome = self.usecase.like(&post_id).await;
                if let Some(feedback) = render::like_feedback(&outcome) {
                    println!("{feedback}");
                }
            }
            Command::Refresh => {
                // A failed fetch keeps the previous feed; the error is only logged.
                let _ = self.usecase.refresh_feed().await;
                self.show().await;
            }
            Command::Help => println!("{}", help_text().bright_black()),
            Command::Quit => return Flow::Quit,
            Command::Invalid(hint) => eprintln!("{}", hint.yellow()),
        }
        Flow::Continue
    }
}

async fn read_image(path: &Path) -> Result<ImageUpload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Could not read image {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} is not a file", path.display()))?;
    Ok(ImageUpload::new(file_name, bytes))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nerdfeed=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    // ===== Backend Initialization =====
    let (backend, settings, offline) = if cli.offline {
        tracing::info!("[Backend] Running offline with the in-memory backend");
        let memory = InMemoryBackend::new();
        (memory.backend(), FeedSettings::default(), Some(memory))
    } else {
        let config = BackendConfig::load(cli.config.as_deref())
            .await
            .context("Backend configuration is incomplete (or run with --offline)")?;
        let settings = FeedSettings {
            storage_bucket: config.storage_bucket.clone(),
        };
        (supabase::connect(&config)?, settings, None)
    };

    let usecase = Arc::new(FeedUseCase::new(backend, settings));
    usecase
        .set_notifier(Arc::new(|notice: Notice| println!("{}", render::render_notice(notice))))
        .await;
    let tracker = usecase.start().await;
    let feed_len = Arc::new(AtomicUsize::new(0));
    let page = Page {
        usecase,
        offline,
        feed_len: feed_len.clone(),
    };

    // ===== REPL Setup =====
    let mut rl = Editor::new()?;
    rl.set_helper(Some(FeedHelper::new(feed_len)));

    page.show().await;
    println!("{}", "Type text to draft a post, /help for commands.".bright_black());
    println!();

    // ===== Main REPL Loop =====
    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let Some(command) = Command::parse(&line) else {
                    continue;
                };
                let _ = rl.add_history_entry(line.trim());
                if let Flow::Quit = page.handle(command).await {
                    break;
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    tracker.stop();
    println!("{}", "Goodbye!".bright_green());
    Ok(())
}
