mod notice;

use aiadapter_common::{logger, HostConfig, SettingField};
use aiadapter_plugin::{AiAdapterPlugin, AppContext, JsonFileStore};
use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use notice::ConsoleNotifier;
use std::path::PathBuf;
use std::sync::Arc;

/// Find the nearest .env file, walking up from the current directory
fn find_env_file() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        let candidate = current_dir.join(".env");
        if candidate.exists() {
            return Some(candidate);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

fn load_dotenv() {
    match find_env_file() {
        Some(env_path) => {
            dotenv::from_path(&env_path).ok();
        }
        None => {
            dotenv::dotenv().ok();
        }
    }
}

#[derive(Parser)]
#[command(name = "aiadapter")]
#[command(about = "AI adapter - route prompts to Ollama or Gemini", long_about = None)]
struct Cli {
    /// Directory holding the persisted settings
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a text prompt with the selected model
    Query {
        prompt: String,
    },

    /// Answer a prompt about an image with the selected image model
    QueryImage {
        prompt: String,

        /// Image file to send along with the prompt
        #[arg(long)]
        image: PathBuf,
    },

    /// List known models
    Models,

    /// Pull the selected model onto the Ollama server
    Pull,

    /// Show the settings page
    Settings,

    /// Change a setting (provider, model, image-model, debug, ollama-url, ollama-token, gemini-key)
    Set {
        key: String,
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    load_dotenv();

    if let Some(dir) = &cli.data_dir {
        std::env::set_var("AIADAPTER_DATA_DIR", dir);
    }

    let config = HostConfig::from_env()?;
    config.ensure_directories()?;
    let debug_toggle = logger::setup_logging(&config.log_dir, &config.log_level)?;

    tracing::info!("Settings file: {}", config.data_file().display());

    let ctx = AppContext::new(
        Arc::new(JsonFileStore::new(config.data_file())),
        Arc::new(ConsoleNotifier::new()),
    )
    .with_debug_toggle(debug_toggle);

    let mut plugin = AiAdapterPlugin::new(ctx);
    plugin.onload().await;

    let result = run(&mut plugin, cli.command).await;
    plugin.onunload();
    result
}

async fn run(plugin: &mut AiAdapterPlugin, command: Commands) -> Result<()> {
    match command {
        Commands::Query { prompt } => {
            let answer = plugin.api().try_query(&prompt).await?;
            println!("{}", answer);
        }
        Commands::QueryImage { prompt, image } => {
            let bytes = std::fs::read(&image)
                .with_context(|| format!("Failed to read image {}", image.display()))?;
            let encoded = STANDARD.encode(bytes);

            let answer = plugin.api().try_query_with_image(&prompt, &encoded).await?;
            println!("{}", answer);
        }
        Commands::Models => {
            let ctx = plugin.context();
            let settings = ctx.settings().read().clone();

            for model in ctx.registry().read().models() {
                let selected = (model.image_ready
                    && model.same_slot(&settings.selected_image_model))
                    || (!model.image_ready && model.same_slot(&settings.selected_model));

                println!(
                    "{} {:<7} {:<6} {:<32} {}",
                    if selected { "*" } else { " " },
                    model.provider,
                    if model.image_ready { "image" } else { "text" },
                    model.name,
                    model.model
                );
            }
        }
        Commands::Pull => {
            plugin.context().pull_selected_model().await?;
        }
        Commands::Settings => {
            let tab = plugin
                .settings_tab()
                .context("Settings tab is not registered")?;
            print!("{}", tab.display());
        }
        Commands::Set { key, value } => {
            let field: SettingField = key.parse()?;
            let change = field.change(&value)?;

            let tab = plugin
                .settings_tab()
                .context("Settings tab is not registered")?;
            tab.apply(change).await?;
            println!("{} updated", field.key());
        }
    }

    Ok(())
}
