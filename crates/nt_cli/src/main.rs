use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use clap::{ArgAction, Parser, Subcommand};
use nt_core::config::{load_config, Config};
use nt_core::{Article, ArticleStorage, Error, ALL_TOPICS};
use nt_feeds::dedup::DEFAULT_SIMILARITY_THRESHOLD;
use nt_feeds::{init_logging, FeedManager, HttpFetcher, RefreshOutcome, TopicClassifier, TopicTable};
use nt_inference::models::ChatModel;
use nt_inference::{create_model, SummaryService};
use nt_storage::{Settings, SummaryCache};
use tracing::info;

/// Read from the working directory when `--config` is not given.
const DEFAULT_CONFIG: &str = "nt.toml";

#[derive(Debug, Clone)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    /// Sums `<number><unit>` groups (`s`, `m`, `h`, `d`), e.g. `1h15m`. A
    /// trailing bare number counts as seconds.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let too_large = || format!("Duration is too large: {}", s);
        let mut total = 0u64;
        let mut digits = String::new();

        for c in s.chars().filter(|c| !c.is_whitespace()) {
            if c.is_ascii_digit() {
                digits.push(c);
                continue;
            }
            let unit = match c {
                's' => 1,
                'm' => 60,
                'h' => 3_600,
                'd' => 86_400,
                _ => return Err(format!("Invalid duration unit: {}", c)),
            };
            if digits.is_empty() {
                return Err(format!("Missing number before '{}'", c));
            }
            total = add_group(total, &digits, unit).ok_or_else(too_large)?;
            digits.clear();
        }
        if !digits.is_empty() {
            total = add_group(total, &digits, 1).ok_or_else(too_large)?;
        }

        if total == 0 {
            return Err("Duration must be greater than zero".to_string());
        }
        Ok(HumanDuration(Duration::from_secs(total)))
    }
}

fn add_group(total: u64, digits: &str, unit: u64) -> Option<u64> {
    digits.parse::<u64>().ok()?.checked_mul(unit)?.checked_add(total)
}

#[derive(Parser, Debug)]
#[command(author, version, about = "RSS/Atom reader with topic digests", long_about = None)]
pub struct Cli {
    /// TOML configuration file, defaults to ./nt.toml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Storage backend: sqlite or memory
    #[arg(long, global = true)]
    storage: Option<String>,
    /// SQLite database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage subscriptions
    Feeds {
        #[command(subcommand)]
        command: Option<FeedCommands>,
    },
    /// Fetch every subscribed feed
    Refresh {
        /// Keep refreshing until interrupted
        #[arg(long)]
        watch: bool,
        /// Interval between refreshes (e.g. 30m, 1h, 1h15m), defaults to the stored setting
        #[arg(long)]
        interval: Option<HumanDuration>,
    },
    /// List the newest articles
    Articles {
        #[arg(long)]
        topic: Option<String>,
        /// Only articles of this feed URL
        #[arg(long, conflicts_with = "topic")]
        feed: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Topics with article counts
    Topics,
    Stats,
    /// Articles with a similar title
    Similar {
        id: String,
        #[arg(long, default_value_t = DEFAULT_SIMILARITY_THRESHOLD)]
        threshold: f64,
    },
    /// Most frequent title words
    Trending {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    Summarize {
        #[command(subcommand)]
        command: SummarizeCommands,
    },
    Settings {
        #[command(subcommand)]
        command: Option<SettingsCommands>,
    },
}

#[derive(Subcommand, Debug)]
enum FeedCommands {
    List,
    Add {
        url: String,
        #[arg(long)]
        name: Option<String>,
    },
    Remove {
        url: String,
    },
    /// Subscribe to the built-in feed list
    Defaults,
}

#[derive(Subcommand, Debug)]
enum SummarizeCommands {
    /// Today's digest of a topic, streamed as it is generated
    Topic { id: String },
    Article { id: String },
}

#[derive(Subcommand, Debug)]
enum SettingsCommands {
    Show,
    /// Store the chat API key, an empty value clears it
    SetKey { key: String },
    /// Minutes between refreshes in watch mode
    SetInterval { minutes: u64 },
    SetAutoSummarize {
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },
    /// Send a one-word test request to the chat API
    Test,
}

fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => load_config(Path::new(DEFAULT_CONFIG))?,
        None => Config::default(),
    };
    if let Some(backend) = &cli.storage {
        config.storage.backend = backend.clone();
    }
    if let Some(db) = &cli.db {
        config.storage.path = db.clone();
    }
    config.validate()?;
    Ok(config)
}

struct App {
    config: Config,
    storage: Arc<dyn ArticleStorage>,
    manager: FeedManager,
    settings: Settings,
}

impl App {
    async fn new(config: Config) -> anyhow::Result<Self> {
        let storage = nt_storage::create_storage(&config.storage.backend, &config.storage.path)
            .await
            .with_context(|| format!("cannot open {} storage", config.storage.backend))?;
        info!("💾 Storage ready (using {})", config.storage.backend);

        let settings = Settings::load(storage.as_ref()).await?;
        let table = config
            .topics
            .as_deref()
            .map(TopicTable::from_config)
            .unwrap_or_default();
        let fetcher = Arc::new(HttpFetcher::new(&config.feeds)?);
        let manager = FeedManager::new(
            storage.clone(),
            fetcher,
            TopicClassifier::new(Arc::new(table)),
            config.feeds.clone(),
        );
        manager.load().await?;

        Ok(Self {
            config,
            storage,
            manager,
            settings,
        })
    }

    fn inference_config(&self) -> nt_inference::Config {
        nt_inference::Config::from(&self.config.inference).with_api_key(self.settings.api_key.clone())
    }

    fn summary_service(&self) -> anyhow::Result<SummaryService> {
        let model = create_model(&self.inference_config())?;
        info!("🧠 Inference model ready (using {})", model.name());
        Ok(SummaryService::new(model, SummaryCache::new(self.storage.clone())))
    }

    async fn refresh(&self) -> anyhow::Result<()> {
        if self.storage.list_feeds().await?.is_empty() {
            info!("📚 No subscriptions yet, adding the default feeds");
            let added = self.manager.add_default_feeds().await?;
            println!("Subscribed to {} default feeds", added.len());
        }

        match self.manager.refresh_all().await? {
            RefreshOutcome::Skipped => println!("A refresh is already running"),
            RefreshOutcome::Completed(report) => {
                println!(
                    "📰 {} articles fetched, {} shown, {} expired",
                    report.articles.len(),
                    report.working_set_len,
                    report.evicted
                );
                for failure in &report.errors {
                    println!("⚠️  {} ({}): {}", failure.feed.name, failure.feed.url, failure.error);
                }
            }
        }
        Ok(())
    }

    async fn watch(&self, interval: Duration) -> anyhow::Result<()> {
        info!("Running in periodic mode with {}s interval", interval.as_secs());
        loop {
            if let Err(e) = self.refresh().await {
                eprintln!("Error during refresh: {:#}", e);
            }
            info!("Waiting {}s before next refresh", interval.as_secs());
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = tokio::signal::ctrl_c() => return Ok(()),
            }
        }
    }

    fn print_article(&self, article: &Article) {
        let table = self.manager.classifier().table();
        let icon = table
            .get(article.topic_or_other())
            .map_or("", |topic| topic.icon.as_str());
        println!(
            "{} [{}] {}",
            icon,
            article.published_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            article.title
        );
        println!("    {} · {}", article.feed_title, article.id);
    }

    async fn articles(&self, topic: Option<&str>, feed: Option<&str>, limit: usize) -> anyhow::Result<()> {
        let articles = match feed {
            Some(url) => self.manager.articles_for_feed(url).await,
            None => self.manager.articles(topic).await,
        };
        if articles.is_empty() {
            println!("No articles, run `nt refresh` first");
        }
        for article in articles.iter().take(limit) {
            self.print_article(article);
        }

        if let Some(topic) = topic.filter(|t| *t != ALL_TOPICS) {
            if self.settings.auto_summarize && !articles.is_empty() {
                println!();
                if let Err(e) = self.digest(topic).await {
                    eprintln!("Digest unavailable: {:#}", e);
                }
            }
        }
        Ok(())
    }

    async fn digest(&self, topic: &str) -> anyhow::Result<()> {
        let table = self.manager.classifier().table();
        if topic == ALL_TOPICS || table.get(topic).is_none() {
            return Err(Error::NotFound(format!("topic {}", topic)).into());
        }
        let label = table.label(topic).to_string();
        let articles = self.manager.articles(Some(topic)).await;
        let service = self.summary_service()?;

        let digest = service
            .topic_digest(topic, &label, &articles, |chunk| {
                print!("{}", chunk);
                let _ = std::io::stdout().flush();
            })
            .await?;
        match digest {
            None => println!("No articles for {}", label),
            Some(digest) if digest.cached => println!("{}", digest.content),
            Some(_) => println!(),
        }
        Ok(())
    }

    async fn summarize_article(&self, id: &str) -> anyhow::Result<()> {
        let article = self
            .manager
            .article(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("article {}", id)))?;
        if let Some(summary) = &article.summary {
            println!("{}", summary);
            return Ok(());
        }

        let summary = self.summary_service()?.summarize_article(&article).await?;
        self.manager.record_summary(id, &summary).await?;
        println!("{}", summary);
        Ok(())
    }

    async fn feeds(&self, command: FeedCommands) -> anyhow::Result<()> {
        match command {
            FeedCommands::List => {
                let feeds = self.manager.feeds_with_counts().await?;
                if feeds.is_empty() {
                    println!("No subscriptions, add one with `nt feeds add <url>`");
                }
                for (feed, count) in feeds {
                    let last_fetch = feed.last_fetch.map_or_else(
                        || "never".to_string(),
                        |at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
                    );
                    println!("{} <{}>", feed.name, feed.url);
                    println!("    {} articles, last fetched {}", count, last_fetch);
                }
            }
            FeedCommands::Add { url, name } => {
                let (feed, count) = self.manager.add_feed(&url, name.as_deref()).await?;
                println!("➕ {} added with {} articles", feed.name, count);
            }
            FeedCommands::Remove { url } => {
                self.manager.remove_feed(&url).await?;
                println!("🗑️  {} removed", url);
            }
            FeedCommands::Defaults => {
                let added = self.manager.add_default_feeds().await?;
                for feed in &added {
                    println!("➕ {} <{}>", feed.name, feed.url);
                }
                println!("Subscribed to {} default feeds", added.len());
            }
        }
        Ok(())
    }

    async fn settings(&mut self, command: SettingsCommands) -> anyhow::Result<()> {
        match command {
            SettingsCommands::Show => {
                let inference = self.inference_config();
                println!("provider:         {}", inference.provider);
                println!("model:            {}", inference.model_name);
                println!("api key:          {}", mask_key(inference.api_key.as_deref()));
                println!("refresh interval: {} min", self.settings.refresh_interval);
                println!("auto summarize:   {}", self.settings.auto_summarize);
                return Ok(());
            }
            SettingsCommands::SetKey { key } => {
                let key = key.trim();
                self.settings.api_key = (!key.is_empty()).then(|| key.to_string());
            }
            SettingsCommands::SetInterval { minutes } => {
                if minutes == 0 {
                    return Err(Error::Config("refresh interval must be at least 1 minute".to_string()).into());
                }
                self.settings.refresh_interval = minutes;
            }
            SettingsCommands::SetAutoSummarize { enabled } => {
                self.settings.auto_summarize = enabled;
            }
            SettingsCommands::Test => {
                let reply = ChatModel::new(&self.inference_config())?.test_connection().await?;
                println!("✅ Connection works: {}", reply.trim());
                return Ok(());
            }
        }
        self.settings.save(self.storage.as_ref()).await?;
        println!("Settings saved");
        Ok(())
    }
}

/// Keeps the last four characters of a key.
fn mask_key(key: Option<&str>) -> String {
    match key {
        None => "not set".to_string(),
        Some(key) if key.chars().count() <= 8 => "****".to_string(),
        Some(key) => {
            let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
            format!("****{}", tail)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    let mut app = App::new(config).await?;

    match cli.command {
        Commands::Feeds { command } => app.feeds(command.unwrap_or(FeedCommands::List)).await?,
        Commands::Refresh { watch, interval } => {
            if watch {
                let interval = interval
                    .map(|i| i.0)
                    .unwrap_or_else(|| Duration::from_secs(app.settings.refresh_interval.saturating_mul(60)));
                app.watch(interval).await?;
            } else {
                app.refresh().await?;
            }
        }
        Commands::Articles { topic, feed, limit } => {
            app.articles(topic.as_deref(), feed.as_deref(), limit).await?
        }
        Commands::Topics => {
            for topic in app.manager.topics().await {
                println!("{} {} ({}): {}", topic.icon, topic.name, topic.id, topic.count);
            }
        }
        Commands::Stats => {
            let stats = app.manager.stats().await?;
            println!("articles:  {}", stats.total_news);
            println!("feeds:     {}", stats.total_feeds);
            println!("summaries: {}", stats.total_summaries);
            for (topic, count) in &stats.topic_counts {
                println!("    {}: {}", topic, count);
            }
        }
        Commands::Similar { id, threshold } => {
            let similar = app.manager.similar(&id, threshold).await?;
            if similar.is_empty() {
                println!("No similar articles");
            }
            for item in similar {
                println!("{:>3.0}% {} ({})", item.similarity * 100.0, item.article.title, item.article.id);
            }
        }
        Commands::Trending { limit } => {
            for keyword in app.manager.trending(limit).await {
                println!("{}: {}", keyword.word, keyword.count);
            }
        }
        Commands::Summarize { command } => match command {
            SummarizeCommands::Topic { id } => app.digest(&id).await?,
            SummarizeCommands::Article { id } => app.summarize_article(&id).await?,
        },
        Commands::Settings { command } => {
            app.settings(command.unwrap_or(SettingsCommands::Show)).await?
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}
