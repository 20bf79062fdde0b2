//! Command-line interface.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::client::Client;
use crate::domain::{GenerationRequest, ImageRecord, RANDOM_SEED, StylePreset};
use crate::domain::request::{DEFAULT_HEIGHT, DEFAULT_STEPS, DEFAULT_WIDTH};

#[derive(Debug, Parser)]
#[command(name = "imagegen", version, about = "Image generation client")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate an image from a prompt
    Generate(GenerateArgs),
    /// List past generations, newest first
    History(HistoryArgs),
    /// Show the most recent generations
    Recent {
        /// How many to show (defaults to history.recent_count)
        #[arg(long)]
        count: Option<usize>,
    },
    /// Show one generation
    Image { id: i64 },
    /// List the service's style presets
    Presets,
    /// Download a generated image
    Download {
        id: i64,
        /// Target file (defaults to the image's file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Manage the stored privilege key
    PrivilegeKey {
        #[command(subcommand)]
        action: PrivilegeKeyAction,
    },
}

#[derive(Debug, Subcommand)]
enum PrivilegeKeyAction {
    /// Store a key to send with every generate request
    Set { key: String },
    /// Forget the stored key
    Clear,
    /// Show whether a key is in use
    Show,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[arg(value_name = "PROMPT", required = true)]
    prompt: Vec<String>,
    #[arg(short, long)]
    negative: Option<String>,
    /// -1 asks the service for a random seed
    #[arg(long, default_value_t = RANDOM_SEED, allow_hyphen_values = true)]
    seed: i64,
    #[arg(long, default_value_t = DEFAULT_STEPS)]
    steps: u32,
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    width: u32,
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    height: u32,
    /// Style preset id (see `imagegen presets`)
    #[arg(long)]
    preset: Option<u32>,
    /// Directory to save the generated image into
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl GenerateArgs {
    fn to_request(&self) -> GenerationRequest {
        let mut request = GenerationRequest::new(self.prompt.join(" "))
            .with_seed(self.seed)
            .with_steps(self.steps)
            .with_size(self.width, self.height)
            .with_style_preset(self.preset);
        if let Some(negative) = &self.negative {
            request = request.with_negative_prompt(negative.clone());
        }
        request
    }
}

#[derive(Debug, Args)]
struct HistoryArgs {
    #[arg(long, default_value_t = 1)]
    page: usize,
    /// Defaults to history.page_size
    #[arg(long)]
    page_size: Option<usize>,
    /// Case-insensitive match on prompt or negative prompt
    #[arg(short, long)]
    filter: Option<String>,
}

impl Cli {
    /// Whether this command may need the challenge bridge.
    #[must_use]
    pub const fn needs_challenge(&self) -> bool {
        matches!(self.command, Command::Generate(_))
    }

    /// Execute the command against a wired client.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn execute(self, client: &Client) -> anyhow::Result<()> {
        match self.command {
            Command::Generate(args) => {
                let result = client.orchestrator.generate(args.to_request()).await?;
                println!("id:    {}", result.id);
                println!("seed:  {}", result.seed);
                println!("image: {}", result.image_url);
                if let Some(dir) = &args.output {
                    let target = dir.join(file_name(&result.image_url, result.id));
                    save(client, &result.image_url, &target).await?;
                }
            }
            Command::History(args) => {
                let page_size = args.page_size.unwrap_or(client.history.page_size);
                let page = client
                    .pager
                    .load_page(args.page, page_size, args.filter.as_deref())
                    .await?;
                for record in &page.records {
                    print_record(record);
                }
                println!(
                    "page {}/{} ({} images, {} hidden by filter)",
                    page.page, page.total_pages, page.total_ids, page.filtered_out
                );
            }
            Command::Recent { count } => {
                let count = count.unwrap_or(client.history.recent_count);
                for record in client.pager.recent(count).await? {
                    print_record(&record);
                }
            }
            Command::Image { id } => {
                let record = client.transport.image(id).await?;
                print_record(&record);
                println!("  negative: {}", record.negative_prompt);
                println!(
                    "  seed {} | {} steps | {}x{}",
                    record.seed, record.steps, record.width, record.height
                );
            }
            Command::Presets => {
                for preset in client.transport.style_presets().await? {
                    print_preset(&preset);
                }
            }
            Command::Download { id, output } => {
                let record = client.transport.image(id).await?;
                let target =
                    output.unwrap_or_else(|| PathBuf::from(file_name(&record.image_url, id)));
                save(client, &record.image_url, &target).await?;
            }
            Command::PrivilegeKey { action } => match action {
                PrivilegeKeyAction::Set { key } => {
                    anyhow::ensure!(!key.trim().is_empty(), "privilege key cannot be empty");
                    client.privilege.set(&key).await?;
                    println!("privilege key stored");
                }
                PrivilegeKeyAction::Clear => {
                    if client.privilege.clear().await? {
                        println!("privilege key cleared");
                    } else {
                        println!("no privilege key stored");
                    }
                }
                PrivilegeKeyAction::Show => match client.privilege.current().await? {
                    Some(key) => println!("privilege key in use: {}", mask(&key)),
                    None => println!("no privilege key in use"),
                },
            },
        }
        Ok(())
    }
}

async fn save(client: &Client, locator: &str, target: &Path) -> anyhow::Result<()> {
    let bytes = client.transport.download(locator).await?;
    tokio::fs::write(target, &bytes)
        .await
        .with_context(|| format!("cannot write {}", target.display()))?;
    println!("saved {} ({} bytes)", target.display(), bytes.len());
    Ok(())
}

/// Last path segment of an artifact locator, or `<id>.png`.
fn file_name(locator: &str, id: i64) -> String {
    locator
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .map_or_else(|| format!("{id}.png"), str::to_string)
}

fn print_record(record: &ImageRecord) {
    let created = record
        .created_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    println!(
        "#{:<6} {:<16} {:<10} {}",
        record.id, created, record.status, record.prompt
    );
}

fn print_preset(preset: &StylePreset) {
    let state = if preset.enabled { "" } else { " (disabled)" };
    println!("{:>4}  {}{}", preset.id, preset.name, state);
    if !preset.description.is_empty() {
        println!("      {}", preset.description);
    }
}

/// Show only the first few characters of a key.
fn mask(key: &str) -> String {
    let shown: String = key.chars().take(4).collect();
    format!("{shown}****")
}
