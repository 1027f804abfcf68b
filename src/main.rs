use futures::StreamExt;
use imagegen::logger::{self, LogLevel, LoggerConfig};
use imagegen::{
    Config, HttpImageClient, ImageGenerator, MockImageClient, OrchestratorState,
    RequestOrchestrator, TriggerOutcome,
};
use std::env;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "Type a prompt to generate an image. Commands: :history, :select <n>, :state, :quit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let config = Config::from_env();

    let level = config
        .log_level
        .as_deref()
        .and_then(|raw| raw.parse::<LogLevel>().ok())
        .unwrap_or(LogLevel::Info);
    logger::init_with_config(LoggerConfig::new().with_level(level))?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }
    logger::log_config_info(&config);

    let generator: Box<dyn ImageGenerator> = if env::args().any(|arg| arg == "--offline") {
        log::info!("🧪 Offline mode: images come from a local stub");
        Box::new(MockImageClient::echo("https://placeholder.local/images"))
    } else {
        Box::new(HttpImageClient::new(config.client.clone())?)
    };
    let orchestrator = Arc::new(RequestOrchestrator::with_config(
        generator,
        config.orchestrator.clone(),
    ));

    let mut states = orchestrator.state_stream();
    let watcher = tokio::spawn(async move {
        while let Some(state) = states.next().await {
            if state.is_loading {
                log::info!("⏳ Generating...");
            } else if let Some(error) = &state.error {
                log::warn!("{}", error);
            }
        }
    });

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => continue,
            ":quit" | ":q" => break,
            ":help" => println!("{}", HELP),
            ":history" => print_history(&orchestrator.get_state()),
            ":state" => println!("{}", serde_json::to_string_pretty(&orchestrator.get_state())?),
            command if command.starts_with(":select") => {
                let state = orchestrator.get_state();
                let entry = command
                    .trim_start_matches(":select")
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|index| state.history.get(index));
                match entry {
                    Some(entry) if orchestrator.select_latest(entry.image_url()) => {
                        println!("🖼️  {} ({})", entry.image_url(), entry.prompt());
                    }
                    _ => println!("No such history entry; see :history"),
                }
            }
            prompt => match orchestrator.trigger(prompt).await {
                TriggerOutcome::Completed(result) => {
                    println!("🖼️  {}", result.image_url());
                }
                TriggerOutcome::Failed { message, .. } => println!("❌ {}", message),
                TriggerOutcome::Rejected => println!("Still working on the previous prompt"),
                TriggerOutcome::Skipped => {}
            },
        }
    }

    watcher.abort();
    Ok(())
}

fn print_history(state: &OrchestratorState) {
    if state.history.is_empty() {
        println!("No images generated yet");
        return;
    }

    let latest = state.latest_image_url.as_deref();
    for (index, entry) in state.history.iter().enumerate() {
        let marker = if Some(entry.image_url()) == latest { "*" } else { " " };
        println!("{} {:>3}. {} - {}", marker, index + 1, entry.prompt(), entry.image_url());
    }
}
