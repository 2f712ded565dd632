use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use litmus::animation::driver::{InstantDriver, TimerDriver};
use litmus::config::{EngineConfig, ScoringBackend, WidgetConfig};
use litmus::output::{terminal, truncate_chars};
use litmus::scoring::client::{DirectApiClient, LocalServerClient};
use litmus::scoring::coordinator::{user_facing_message, ScoreRequestCoordinator};
use litmus::scoring::traits::{max_span_score, ScoreFetcher};
use litmus::session;
use litmus::widget::events::WidgetEvent;
use litmus::widget::machine::WidgetBuilder;

/// Litmus: a live toxicity indicator in your terminal.
///
/// Scores text through a checker backend (a local server or the Perspective
/// API) and renders the widget's animated indicator state.
#[derive(Parser)]
#[command(name = "litmus", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a single piece of text and print the indicator
    Check {
        /// The text to score
        text: String,
    },

    /// Interactively score stdin lines through the full animation engine
    Watch {
        /// Animation speed multiplier (higher plays transitions faster)
        #[arg(long, default_value = "4.0")]
        speed: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let engine = EngineConfig::load()?;
    let fetcher = build_fetcher(&engine)?;

    match cli.command {
        Commands::Check { text } => run_check(&engine, fetcher, &text).await,
        Commands::Watch { speed } => run_watch(&engine, fetcher, speed).await,
    }
}

fn build_fetcher(engine: &EngineConfig) -> Result<Arc<dyn ScoreFetcher>> {
    Ok(match engine.backend {
        ScoringBackend::LocalServer => Arc::new(LocalServerClient::new(&engine.server_url)?),
        ScoringBackend::DirectApi => {
            engine.require_perspective()?;
            Arc::new(DirectApiClient::new(engine.perspective_api_key.clone())?)
        }
    })
}

/// One-shot mode: score the text, run the widget to its settled state with
/// the instant driver, and print the result.
async fn run_check(
    engine: &EngineConfig,
    fetcher: Arc<dyn ScoreFetcher>,
    text: &str,
) -> Result<()> {
    let widget_config = WidgetConfig::default();
    let session_id = session::get_or_create_session_id(&engine.session_dir)?;

    let widget = WidgetBuilder::new(widget_config.clone())?
        .driver(Arc::new(InstantDriver))
        .fetcher(fetcher.clone())
        .session_id(session_id.clone())
        .spawn()?;
    let mut events = widget.subscribe();

    println!("  {} {}", "checking:".dimmed(), truncate_chars(text, 80).dimmed());

    let response = match fetcher
        .check(text, &session_id, engine.community_id.as_deref())
        .await
    {
        Ok(response) => response,
        Err(e) => {
            println!("  {}", user_facing_message(&e).red());
            return Ok(());
        }
    };

    widget.allow_feedback(true);
    widget.notify_score_change(max_span_score(&response));

    while let Ok(event) = events.recv().await {
        if event == WidgetEvent::ScoreChangeAnimationCompleted {
            break;
        }
    }

    let snapshot = widget.snapshot().await;
    terminal::display_indicator(&snapshot, &widget_config);
    Ok(())
}

/// Interactive mode: every stdin line is debounced and scored; the
/// indicator re-renders whenever its score animation completes.
async fn run_watch(engine: &EngineConfig, fetcher: Arc<dyn ScoreFetcher>, speed: f64) -> Result<()> {
    let widget_config = WidgetConfig::default();
    let session_id = session::get_or_create_session_id(&engine.session_dir)?;

    let widget = WidgetBuilder::new(widget_config.clone())?
        .driver(Arc::new(TimerDriver::with_speed(speed)))
        .fetcher(fetcher.clone())
        .session_id(session_id.clone())
        .spawn()?;
    let coordinator = ScoreRequestCoordinator::new(
        fetcher,
        widget.clone(),
        session_id,
        engine.community_id.clone(),
    );

    let listener_widget = widget.clone();
    let listener_config = widget_config.clone();
    let mut events = widget.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                WidgetEvent::ScoreChangeAnimationCompleted => {
                    let snapshot = listener_widget.snapshot().await;
                    terminal::display_indicator(&snapshot, &listener_config);
                }
                WidgetEvent::FeedbackSubmitted(_) => {
                    println!("  {}", "Thanks for the feedback!".green());
                }
                WidgetEvent::ModelInfoLinkClicked => {
                    println!(
                        "  {}",
                        "Scores come from a machine-learned toxicity model.".dimmed()
                    );
                }
                _ => {}
            }
        }
    });

    println!("{}", "Type to score. Blank line clears.".bold());
    println!(
        "{}",
        "Commands: /wrong  /toxic  /fine  /info  /quit".dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_text = String::new();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            // Feedback flow: open the question layer, then answer it
            "/wrong" => widget.transition_to_layer(1),
            "/toxic" => widget.submit_feedback(last_text.clone(), true),
            "/fine" => widget.submit_feedback(last_text.clone(), false),
            "/info" => widget.model_info_link_clicked(),
            text => {
                last_text = text.to_string();
                coordinator.on_text_changed(text).await;
            }
        }
    }

    Ok(())
}
