use std::sync::Arc;
use std::time::Duration;

use cards::{
    Card, CardFeed, ConfigError, FetchPolicy, SourceConfig, SupabaseSource, ANON_KEY_VARS,
    DEFAULT_TABLE, PAGE_LIMIT, RETRY_DELAY, URL_VARS,
};
use clap::{Parser, Subcommand};
use render::{render_card, render_summary};
use utilities::{confirm, input};
use viewer::CardViewer;

mod render;
mod utilities;
mod viewer;

#[derive(Parser)]
#[command(name = "flashcards", about = "Browse the published flashcard deck", version)]
struct Cli {
    /// Supabase project URL (default: $SUPABASE_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Supabase anon key (default: $SUPABASE_ANON_KEY)
    #[arg(long, global = true)]
    anon_key: Option<String>,

    /// Table holding the cards
    #[arg(long, global = true, default_value = DEFAULT_TABLE)]
    table: String,

    /// Maximum number of cards to load
    #[arg(long, global = true, default_value_t = PAGE_LIMIT)]
    limit: usize,

    /// Wait before the automatic second attempt, in milliseconds
    #[arg(long, global = true, default_value_t = RETRY_DELAY.as_millis() as u64)]
    retry_delay_ms: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Go through the deck one card at a time (default)
    View,

    /// Print the loaded deck
    List {
        #[arg(long, default_value = "plain")]
        format: OutputFormat,
    },
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum OutputFormat {
    Plain,
    Json,
}

impl Cli {
    /// Flags win over the environment, one value at a time.
    fn source_config(&self) -> Result<SourceConfig, ConfigError> {
        let config = SourceConfig::from_lookup(|name| {
            let flag = if name == URL_VARS[0] {
                self.url.clone()
            } else if name == ANON_KEY_VARS[0] {
                self.anon_key.clone()
            } else {
                None
            };
            flag.or_else(|| std::env::var(name).ok())
        })?;
        Ok(config.with_table(&self.table))
    }

    fn policy(&self) -> FetchPolicy {
        FetchPolicy {
            limit: self.limit,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            ..FetchPolicy::default()
        }
    }
}

enum Outcome {
    Reload,
    Quit,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.source_config()?;
    log::debug!("loading cards from {}/{}", config.url, config.table);
    let source = Arc::new(SupabaseSource::new(config));
    let mut feed = CardFeed::mount(source, cli.policy());

    match cli.command.unwrap_or(Command::View) {
        Command::View => view(&mut feed).await,
        Command::List { format } => list(&feed, &format).await,
    }
}

async fn view(feed: &mut CardFeed) -> anyhow::Result<()> {
    loop {
        if feed.state().is_loading {
            println!("Loading flashcards...");
        }
        let state = feed.settled().await;
        if let Some(error) = &state.error {
            println!("Couldn't load cards");
            println!("{error}");
            if confirm("Try again? (Y/n): ", true)? {
                feed.retry();
                continue;
            }
            return Ok(());
        }
        if state.cards.is_empty() {
            println!("No published cards yet");
            println!("Add a few rows to `cards` and set `is_published = true`.");
            return Ok(());
        }
        match browse(&state.cards)? {
            Outcome::Reload => feed.retry(),
            Outcome::Quit => return Ok(()),
        }
    }
}

fn browse(cards: &[Card]) -> anyhow::Result<Outcome> {
    let mut viewer = CardViewer::new(cards.len());
    println!("enter: flip, n: next, p: prev, h: hint, d: details, r: reload, q: quit");
    loop {
        let card = &cards[viewer.index()];
        println!("{}", render_card(card, &viewer));
        let line = input(">> ")?;
        if line.is_empty() {
            // stdin closed
            return Ok(Outcome::Quit);
        }
        match viewer::Command::parse(&line) {
            Some(viewer::Command::Flip) => viewer.flip(),
            Some(viewer::Command::Next) => {
                if !viewer.next() {
                    println!("This is the last card.");
                }
            }
            Some(viewer::Command::Prev) => {
                if !viewer.prev() {
                    println!("This is the first card.");
                }
            }
            Some(viewer::Command::Hint) => {
                if !viewer.revealed || card.example_de.is_none() || card.example_hint.is_none() {
                    println!("No hint to show.");
                } else {
                    viewer.toggle_hint();
                }
            }
            Some(viewer::Command::Details) => {
                if !viewer.revealed || !card.has_details() {
                    println!("No details to show.");
                } else {
                    viewer.toggle_details();
                }
            }
            Some(viewer::Command::Reload) => return Ok(Outcome::Reload),
            Some(viewer::Command::Quit) => return Ok(Outcome::Quit),
            None => println!("Unknown command {}.", line.trim()),
        }
        println!("----------------------------------------");
    }
}

async fn list(feed: &CardFeed, format: &OutputFormat) -> anyhow::Result<()> {
    let state = feed.settled().await;
    if let Some(error) = state.error {
        anyhow::bail!("Couldn't load cards: {error}");
    }
    match format {
        OutputFormat::Plain => {
            if state.cards.is_empty() {
                println!("No published cards yet");
            }
            for (index, card) in state.cards.iter().enumerate() {
                println!("{}", render_summary(index, card));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&state.cards)?),
    }
    Ok(())
}
