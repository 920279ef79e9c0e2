#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::doc_markdown,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::uninlined_format_args
)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{Input, Password};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use streamsage::assistant::{self, DeployPlatform, Task, TemplateCategory};
use streamsage::credentials::{self, Credential};
use streamsage::dispatch::{Dispatcher, GenerationParams, TurnOutcome};
use streamsage::export::export_artifact;
use streamsage::providers::openai::OpenAiProvider;
use streamsage::providers::DispatchError;
use streamsage::security::SecretStore;
use streamsage::session::{Role, Session, DISPLAY_MESSAGE_LIMIT};
use streamsage::updates::UpdateIndex;
use streamsage::Config;

/// StreamSage - your AI pair-developer for Streamlit.
#[derive(Parser, Debug)]
#[command(name = "streamsage")]
#[command(version = "2.0.0")]
#[command(about = "AI assistant for Streamlit development.", long_about = None)]
struct Cli {
    /// Model to use (overrides config)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Sampling temperature, clamped to 0.1 - 1.0
    #[arg(short, long, global = true)]
    temperature: Option<f64>,

    /// Reply length cap, clamped to 500 - 4000 tokens
    #[arg(long, global = true)]
    max_tokens: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive chat with running conversation history
    Chat,

    /// Generate a complete Streamlit application
    Generate {
        /// What the application should do
        prompt: String,

        /// Save the generated code under this file name
        #[arg(long)]
        out: Option<String>,
    },

    /// Comprehensive review of a Streamlit source file
    Analyze {
        /// Path to the Python file to review
        file: PathBuf,
    },

    /// Performance analysis of a Streamlit source file
    Profile {
        /// Path to the Python file to profile
        file: PathBuf,
    },

    /// Security analysis of a Streamlit source file
    Scan {
        /// Path to the Python file to scan
        file: PathBuf,
    },

    /// Generate a pre-built application template
    Template {
        /// Template category
        #[arg(value_enum)]
        category: TemplateCategory,

        /// Save the generated code under this file name
        #[arg(long)]
        out: Option<String>,
    },

    /// Deployment guide for a hosting platform
    Deploy {
        /// Target platform
        #[arg(value_enum)]
        platform: DeployPlatform,
    },

    /// Browse or search the Streamlit release notes
    Updates {
        /// Keyword to search for; omit to browse everything
        keyword: Option<String>,

        /// List the versions covered by the index
        #[arg(long)]
        versions: bool,
    },

    /// Manage the OpenAI API key
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },

    /// Show the resolved configuration
    Status,
}

#[derive(Subcommand, Debug)]
enum KeyCommands {
    /// Store an API key (prompts when --key is omitted)
    Set {
        #[arg(long)]
        key: Option<String>,
    },
    /// Verify the resolved key with one minimal completion
    Test,
    /// Show where the key would come from, without revealing it
    Status,
    /// Remove the stored key from the config
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respects RUST_LOG, defaults to INFO
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let mut config = Config::load_or_init()?;
    if let Some(model) = &cli.model {
        config.default_model = model.clone();
    }
    if let Some(temperature) = cli.temperature {
        config.default_temperature = temperature;
    }
    if let Some(max_tokens) = cli.max_tokens {
        config.default_max_tokens = max_tokens;
    }

    let params = GenerationParams {
        temperature: config.default_temperature,
        max_tokens: config.default_max_tokens,
    };

    match cli.command {
        Commands::Chat => run_chat(&config, params).await,
        Commands::Generate { prompt, out } => {
            run_task(&config, Task::Generate, &prompt, out.as_deref(), params).await
        }
        Commands::Analyze { file } => {
            let code = read_source(&file)?;
            run_task(&config, Task::Analyze, &code, None, params).await
        }
        Commands::Profile { file } => {
            let code = read_source(&file)?;
            run_task(&config, Task::Profile, &code, None, params).await
        }
        Commands::Scan { file } => {
            let code = read_source(&file)?;
            run_task(&config, Task::Scan, &code, None, params).await
        }
        Commands::Template { category, out } => {
            run_task(&config, Task::Template, category.brief(), out.as_deref(), params).await
        }
        Commands::Deploy { platform } => {
            run_task(&config, Task::Deploy, platform.label(), None, params).await
        }
        Commands::Updates { keyword, versions } => {
            run_updates(&config, keyword.as_deref(), versions);
            Ok(())
        }
        Commands::Key { command } => run_key(&mut config, command, params).await,
        Commands::Status => {
            run_status(&config);
            Ok(())
        }
    }
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read source file: {}", path.display()))
}

fn update_index(config: &Config) -> UpdateIndex {
    let path = config
        .updates_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("data/streamlit_updates.json"));
    UpdateIndex::load(&path)
}

/// Resolve a credential, falling back to one interactive prompt. The
/// prompted value goes through the same validation; a second failure is
/// terminal.
fn resolve_credential(config: &Config) -> Result<Credential> {
    let store = SecretStore::new(config.config_dir(), config.secrets.encrypt);
    match credentials::resolve(None, config, &store) {
        Ok(credential) => Ok(credential),
        Err(error) => {
            warn!(%error, "no usable API key, prompting");
            let entered: String = Password::new()
                .with_prompt("OpenAI API key")
                .interact()
                .context("failed to read API key from terminal")?;
            credentials::validate(&entered).map_err(Into::into)
        }
    }
}

fn build_dispatcher(config: &Config, credential: Credential) -> Dispatcher {
    let base_url = std::env::var("STREAMSAGE_BASE_URL").ok();
    let provider = OpenAiProvider::with_base_url(base_url.as_deref(), credential);
    Dispatcher::new(Box::new(provider), config.default_model.clone())
}

async fn run_chat(config: &Config, params: GenerationParams) -> Result<()> {
    let credential = resolve_credential(config)?;
    let session = Session::new(credential);
    let index = update_index(config);
    let dispatcher = build_dispatcher(config, session.credential.clone());
    let mut conversation = session.conversation;

    info!(session_id = %session.id, model = %dispatcher.model(), "chat session started");
    println!(
        "{} - type 'exit' to quit, '/history' to review the conversation.\n",
        style("StreamSage chat").bold()
    );
    if let Some(greeting) = conversation.last() {
        println!("{}: {}\n", style("StreamSage").cyan(), greeting.content);
    }

    loop {
        let input: String = Input::new().with_prompt("you").interact_text()?;
        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            println!("Goodbye!");
            return Ok(());
        }
        if trimmed == "/history" {
            for message in conversation.recent(DISPLAY_MESSAGE_LIMIT) {
                let speaker = match message.role {
                    Role::System => continue,
                    Role::User => "you",
                    Role::Assistant => "StreamSage",
                };
                println!("{speaker}: {}", message.content);
            }
            println!();
            continue;
        }

        match dispatcher
            .chat_turn(&mut conversation, trimmed, &index, params)
            .await
        {
            TurnOutcome::Reply(reply) | TurnOutcome::LocalReply(reply) => {
                println!("\n{}: {reply}\n", style("StreamSage").cyan());
            }
            TurnOutcome::Failed(error) => {
                eprintln!("\n{}\n", style(error).red());
            }
        }
    }
}

async fn run_task(
    config: &Config,
    task: Task,
    input: &str,
    out: Option<&str>,
    params: GenerationParams,
) -> Result<()> {
    let credential = resolve_credential(config)?;
    let dispatcher = build_dispatcher(config, credential);

    let reply = dispatcher
        .task(
            assistant::system_prompt(task),
            &assistant::user_prompt(task, input),
            params,
        )
        .await?;

    println!("{reply}");

    if let Some(name) = out {
        let path = export_artifact(&std::env::current_dir()?, name, &reply)?;
        println!("\nSaved to {}", path.display());
    }
    Ok(())
}

fn run_updates(config: &Config, keyword: Option<&str>, versions: bool) {
    let index = update_index(config);

    if versions {
        println!("Versions covered: {}", index.available_versions().join(", "));
        return;
    }

    if let Some(keyword) = keyword {
        println!("{}", index.lookup(keyword));
        return;
    }

    // Full browse: every category with its entries
    let (highlights, notable, other) = index.counts();
    println!(
        "Update index: {} (status: {})",
        index.metadata.source, index.metadata.status
    );
    println!(
        "{highlights} highlights, {notable} notable changes, {other} other changes\n"
    );

    for (title, items) in [
        ("Highlights", &index.document.highlights),
        ("Notable Changes", &index.document.notable_changes),
        ("Other Changes", &index.document.other_changes),
    ] {
        if items.is_empty() {
            continue;
        }
        println!("## {title}");
        for (name, entry) in items {
            println!("- {name}");
            if let Some(description) = &entry.description {
                println!("    {description}");
            }
            if let Some(documentation) = &entry.documentation {
                println!("    docs: {documentation}");
            }
            if let Some(issue) = &entry.issue {
                println!("    issue: {issue}");
            }
            if let Some(issues) = &entry.issues {
                println!("    issues: {}", issues.join(", "));
            }
        }
        println!();
    }
}

async fn run_key(config: &mut Config, command: KeyCommands, params: GenerationParams) -> Result<()> {
    match command {
        KeyCommands::Set { key } => {
            let entered = match key {
                Some(key) => key,
                None => Password::new()
                    .with_prompt("OpenAI API key")
                    .interact()
                    .context("failed to read API key from terminal")?,
            };
            let credential = credentials::validate(&entered)?;
            config.api_key = Some(credential.expose().to_string());
            config.save()?;
            println!("API key saved to {}", config.config_path.display());
            Ok(())
        }
        KeyCommands::Test => {
            let credential = resolve_credential(config)?;
            let dispatcher = build_dispatcher(config, credential);
            // Smallest request the clamp allows
            let probe = GenerationParams {
                temperature: params.temperature,
                max_tokens: 1,
            };
            match dispatcher.task("You are a connectivity probe.", "Hello", probe).await {
                Ok(_) => println!("API key is valid."),
                Err(DispatchError::Auth { .. }) => println!("API key was rejected (401)."),
                Err(DispatchError::RateLimited { .. }) => {
                    println!("Key accepted but rate limited (429). Try again shortly.");
                }
                Err(DispatchError::PaymentRequired { .. }) => {
                    println!("Key accepted but quota exhausted (402). Check billing.");
                }
                Err(error) => println!("Could not verify key: {error}"),
            }
            Ok(())
        }
        KeyCommands::Status => {
            if std::env::var(credentials::ENV_VAR).is_ok() {
                println!("Key source: {} environment variable", credentials::ENV_VAR);
            } else if config.api_key.is_some() {
                println!("Key source: config file ({})", config.config_path.display());
            } else {
                println!("No API key configured.");
            }
            Ok(())
        }
        KeyCommands::Clear => {
            config.api_key = None;
            config.save()?;
            println!("Stored API key removed.");
            Ok(())
        }
    }
}

fn run_status(config: &Config) {
    let index = update_index(config);
    let (highlights, notable, other) = index.counts();

    println!("StreamSage configuration");
    println!("  config:      {}", config.config_path.display());
    println!("  model:       {}", config.default_model);
    println!("  temperature: {}", config.default_temperature);
    println!("  max tokens:  {}", config.default_max_tokens);
    println!(
        "  key:         {}",
        if std::env::var(credentials::ENV_VAR).is_ok() {
            "from environment"
        } else if config.api_key.is_some() {
            "stored in config"
        } else {
            "not set"
        }
    );
    println!(
        "  updates:     {} ({}; {} entries)",
        index.metadata.source,
        index.metadata.status,
        highlights + notable + other
    );
}
