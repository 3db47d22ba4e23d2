//! WidgetFX host binary
//!
//! Runs the foreground refresh, prints widget timelines, or hosts a live
//! widget surface that accepts keypad presses on stdin.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use widgetfx_common::{CurrencyCode, Preset};
use widgetfx_fx::{KeypadButton, RateGateway};
use widgetfx_refresh::{
    ForegroundSession, KeypadMutation, Metrics, NotifyReload, RefreshConfig, RegenerationReason,
    SharedMetrics, TimelineGenerator, TimelineScheduler,
};
use widgetfx_store::{FileBackend, SharedStore};

/// WidgetFX CLI
#[derive(Parser, Debug)]
#[command(name = "widgetfx")]
#[command(about = "Currency converter refresh and widget host")]
struct Args {
    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch rates and history, then persist the conversion
    Refresh {
        /// Base currency
        #[arg(long)]
        base: Option<CurrencyCode>,

        /// Target currency
        #[arg(long)]
        target: Option<CurrencyCode>,

        /// Amount text
        #[arg(long)]
        amount: Option<String>,
    },

    /// Print the widget timeline built from the shared store
    Timeline,

    /// Host the widget: print timelines, read keypad presses from stdin
    Widget,

    /// Replace the widget amount presets
    Presets {
        /// Preset amounts, at most six
        #[arg(required = true)]
        amounts: Vec<Decimal>,
    },
}

struct App {
    config: RefreshConfig,
    store: SharedStore,
    reload: Arc<NotifyReload>,
    metrics: SharedMetrics,
}

impl App {
    fn new(config: RefreshConfig) -> anyhow::Result<Self> {
        let backend = FileBackend::open(&config.store_root, &config.app_group)
            .context("Failed to open shared store")?;
        info!(dir = %backend.dir().display(), "Shared store opened");

        Ok(Self {
            config,
            store: SharedStore::new(Arc::new(backend)),
            reload: Arc::new(NotifyReload::new()),
            metrics: Arc::new(Metrics::new()),
        })
    }

    fn session(&self) -> anyhow::Result<ForegroundSession> {
        let client = reqwest::Client::builder()
            .timeout(self.config.providers.http_timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let gateway = RateGateway::http(client, &self.config.providers.endpoints());

        Ok(ForegroundSession::new(
            Arc::new(gateway),
            self.store.clone(),
            self.reload.clone(),
            self.metrics.clone(),
            self.config.trend_days,
        ))
    }

    fn generator(&self) -> TimelineGenerator {
        TimelineGenerator::new(self.store.clone(), self.config.timeline_interval)
    }

    async fn refresh(
        &self,
        base: Option<CurrencyCode>,
        target: Option<CurrencyCode>,
        amount: Option<String>,
    ) -> anyhow::Result<()> {
        let mut session = self.session()?;

        let base = base.unwrap_or_else(|| session.base().clone());
        let target = target.unwrap_or_else(|| session.target().clone());
        session.set_pair(base, target);
        if let Some(amount) = amount {
            session.update_amount(&amount);
        }

        session.activate().await;

        if let Some(notice) = session.notice() {
            warn!(notice, "Showing cached data");
        }

        let report = json!({
            "rate": session.formatted_rate(),
            "result": session.formatted_result(),
            "notice": session.notice(),
            "metrics": self.metrics.snapshot(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }

    fn timeline(&self) -> anyhow::Result<()> {
        let timeline = self
            .generator()
            .timeline(chrono::Utc::now(), RegenerationReason::Initial);
        println!("{}", serde_json::to_string_pretty(&timeline)?);
        Ok(())
    }

    fn presets(&self, amounts: Vec<Decimal>) -> anyhow::Result<()> {
        let presets = amounts
            .into_iter()
            .map(|amount| Preset::new(amount.normalize().to_string(), amount))
            .collect();

        let mut session = self.session()?;
        session.update_presets(presets)?;
        println!("{}", serde_json::to_string_pretty(session.presets())?);
        Ok(())
    }

    async fn widget(&self) -> anyhow::Result<()> {
        let scheduler = TimelineScheduler::new(
            self.generator(),
            self.reload.clone(),
            self.metrics.clone(),
        );
        let keypad = KeypadMutation::new(self.store.clone(), self.reload.clone(), self.metrics.clone());

        let placeholder = self.generator().placeholder_entry(chrono::Utc::now());
        println!("{}", serde_json::to_string(&placeholder)?);

        let input = tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match KeypadButton::from_str(line) {
                            Ok(button) => {
                                if let Err(e) = keypad.handle(button) {
                                    error!(error = %e, "Keypad edit not persisted");
                                }
                            }
                            Err(e) => warn!(error = %e, "Ignoring input"),
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        error!(error = %e, "Failed to read keypad input");
                        break;
                    }
                }
            }
        });

        scheduler
            .run(
                |timeline| match serde_json::to_string(timeline) {
                    Ok(line) => println!("{line}"),
                    Err(e) => error!(error = %e, "Failed to encode timeline"),
                },
                async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!(error = %e, "Failed to listen for Ctrl+C");
                    }
                    info!("Shutdown signal received");
                },
            )
            .await;

        input.abort();
        info!(metrics = ?self.metrics.snapshot(), "Widget host stopped");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = RefreshConfig::from_env();

    // Initialize logging; stdout carries command output
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(
            args.log_json
                .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with(
            (!args.log_json)
                .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
        .init();

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let app = App::new(config)?;

    match args.command {
        Command::Refresh {
            base,
            target,
            amount,
        } => app.refresh(base, target, amount).await,
        Command::Timeline => app.timeline(),
        Command::Widget => app.widget().await,
        Command::Presets { amounts } => app.presets(amounts),
    }
}
