//! CLI for NanoCanvas - generate or edit images with Gemini.

use clap::{Args, Parser, Subcommand};
use nanocanvas::image::{GenerationAdapter, ImageGenerator};
use nanocanvas::{GeminiBackend, GeminiModel, Session, SessionState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nanocanvas")]
#[command(about = "Generate or edit images from text prompts via Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an image, or edit one with --input
    Generate(GenerateArgs),

    /// Interactive session: open images, submit prompts, save results
    Session(BackendArgs),

    /// List available models
    Models,
}

#[derive(Args)]
struct BackendArgs {
    /// Model alias (nano-banana, nano-banana-pro) or any Gemini model id
    #[arg(short, long, default_value = "nano-banana")]
    model: String,

    /// Fail a generation that takes longer than this many seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Args)]
struct GenerateArgs {
    /// The prompt describing the image or the edit
    prompt: String,

    /// Source image to edit
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file path (defaults to nano-canvas-<timestamp>.png)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    backend: BackendArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => generate(args, cli.json).await?,
        Commands::Session(args) => run_session(args, cli.json).await?,
        Commands::Models => list_models(cli.json)?,
    }

    Ok(())
}

fn build_generator(args: &BackendArgs) -> anyhow::Result<Arc<dyn ImageGenerator>> {
    let backend = GeminiBackend::builder().model_id(&args.model).build()?;
    Ok(Arc::new(GenerationAdapter::new(backend)))
}

fn new_session(args: &BackendArgs) -> Session {
    match args.timeout {
        Some(secs) => Session::new().with_timeout(Duration::from_secs(secs)),
        None => Session::new(),
    }
}

async fn generate(args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    let generator = build_generator(&args.backend)?;
    let mut session = new_session(&args.backend);

    if let Some(ref input) = args.input {
        session.open_source_image(input).await?;
    }
    session.set_prompt(&args.prompt);

    let state = session.submit(generator).await;
    let saved = match state {
        SessionState::Success => Some(session.download(args.output.as_deref()).await?),
        _ => None,
    };

    if json_output {
        let result = serde_json::json!({
            "success": saved.is_some(),
            "state": state,
            "mode": if args.input.is_some() { "edit" } else { "generate" },
            "output": saved.as_ref().map(|p| p.display().to_string()),
            "message": session.message(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if let Some(path) = saved {
        println!("Saved image: {}", path.display());
    }

    match state {
        SessionState::Success => Ok(()),
        _ => anyhow::bail!(session
            .message()
            .unwrap_or("An unknown error occurred while communicating with Gemini.")
            .to_string()),
    }
}

const SESSION_HELP: &str = "\
Commands:
  :open <path>   select a source image to edit
  :clear         remove the source image
  :save [path]   save the current result
  :status        show the session state
  :quit          exit
Anything else is submitted as a prompt.";

/// One line of session input.
#[derive(Debug, PartialEq, Eq)]
enum SessionCommand<'a> {
    Empty,
    Quit,
    Open(&'a str),
    Clear,
    Save(Option<&'a str>),
    Status,
    Help,
    /// Submitted exactly as typed.
    Prompt(&'a str),
}

fn parse_line(raw: &str) -> SessionCommand<'_> {
    let line = raw.trim();
    if line.is_empty() {
        return SessionCommand::Empty;
    }

    let (command, arg) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let arg = arg.trim();
    match command {
        ":quit" | ":q" => SessionCommand::Quit,
        ":open" => SessionCommand::Open(arg),
        ":clear" => SessionCommand::Clear,
        ":save" => SessionCommand::Save((!arg.is_empty()).then_some(arg)),
        ":status" => SessionCommand::Status,
        ":help" => SessionCommand::Help,
        _ => SessionCommand::Prompt(raw),
    }
}

async fn run_session(args: BackendArgs, json_output: bool) -> anyhow::Result<()> {
    let generator = build_generator(&args)?;
    let mut session = new_session(&args);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    if !json_output {
        println!("{}", SESSION_HELP);
    }
    loop {
        if !json_output {
            stdout
                .write_all(format!("[{}] > ", session.action_label()).as_bytes())
                .await?;
            stdout.flush().await?;
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let mut saved = None;
        match parse_line(&line) {
            SessionCommand::Empty => continue,
            SessionCommand::Quit => break,
            SessionCommand::Open(path) => {
                if let Err(e) = session.open_source_image(path).await {
                    if !json_output {
                        eprintln!("{}", e);
                    }
                } else if !json_output {
                    let size = session.source_image().map_or(0, |image| image.size());
                    println!("Source image selected: {} ({} bytes)", path, size);
                }
            }
            SessionCommand::Clear => {
                session.clear_source_image();
                if !json_output {
                    println!("Source image removed");
                }
            }
            SessionCommand::Save(path) => match session.download(path.map(Path::new)).await {
                Ok(path) => {
                    if !json_output {
                        println!("Saved image: {}", path.display());
                    }
                    saved = Some(path);
                }
                Err(e) => {
                    if !json_output {
                        eprintln!("{}", e);
                    }
                }
            },
            SessionCommand::Status => {
                if !json_output {
                    print_status(&session);
                }
            }
            SessionCommand::Help => {
                if !json_output {
                    println!("{}", SESSION_HELP);
                }
            }
            SessionCommand::Prompt(prompt) => {
                session.set_prompt(prompt);
                let state = session.submit(Arc::clone(&generator)).await;
                if !json_output {
                    match state {
                        SessionState::Success => {
                            println!("Image ready. Use :save to download it.")
                        }
                        _ => {
                            if let Some(message) = session.message() {
                                eprintln!("{}", message);
                            }
                        }
                    }
                }
            }
        }

        if json_output {
            let mut status = status_json(&session);
            if let Some(path) = saved {
                status["output"] = serde_json::json!(path.display().to_string());
            }
            println!("{}", serde_json::to_string(&status)?);
        }
    }

    Ok(())
}

/// One-line JSON snapshot of the session, printed after every input line.
fn status_json(session: &Session) -> serde_json::Value {
    serde_json::json!({
        "state": session.state(),
        "mode": if session.is_edit_mode() { "edit" } else { "generate" },
        "source_size": session.source_image().map(|image| image.size()),
        "result_available": session.previews().result().is_some(),
        "message": session.message(),
    })
}

fn print_status(session: &Session) {
    println!("State:  {}", session.state());
    println!(
        "Mode:   {}",
        if session.is_edit_mode() {
            "edit"
        } else {
            "generate"
        }
    );
    println!(
        "Result: {}",
        if session.previews().result().is_some() {
            "available"
        } else {
            "none"
        }
    );
    if let Some(message) = session.message() {
        println!("Message: {}", message);
    }
}

fn list_models(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct ModelInfo {
        alias: String,
        id: String,
        default: bool,
    }

    let models: Vec<ModelInfo> = GeminiModel::KNOWN
        .iter()
        .map(|m| ModelInfo {
            alias: m.alias().to_string(),
            id: m.as_str().to_string(),
            default: *m == GeminiModel::default(),
        })
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&models)?);
    } else {
        println!("Available models:\n");
        for m in &models {
            let marker = if m.default { "*" } else { " " };
            println!("  {} {} ({})", marker, m.alias, m.id);
        }
        println!("\nAny other Gemini model id is passed through as-is.");
        println!("API key: GOOGLE_API_KEY (or API_KEY)");
    }

    Ok(())
}
