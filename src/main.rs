use clap::{Parser, Subcommand};
use mdshot::{looks_like_markdown, ChatClient, Error, Renderer, Result, Settings};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mdshot", version, about = "Render Markdown to a cropped PNG; correct or translate text via a chat endpoint")]
struct Cli {
    /// Path to a TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render Markdown (file or stdin) to a cropped PNG
    Render {
        /// Input file; reads stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output PNG path
        #[arg(short, long, default_value = "out.png")]
        output: PathBuf,
    },
    /// Check whether text looks like Markdown (exit 1 when it does not)
    Detect {
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Correct grammar and spelling via the configured chat endpoint
    Grammar {
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Translate via the configured chat endpoint
    Translate {
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Target language (overrides settings)
        #[arg(short, long)]
        lang: Option<String>,
    },
    /// Explain the text via the configured chat endpoint
    Explain {
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    match cli.command {
        Command::Render { input, output } => {
            let text = read_input(input)?;
            if text.trim().is_empty() {
                return Err(Error::EmptyInput);
            }
            if !looks_like_markdown(&text) {
                log::warn!("Input does not look like Markdown; rendering anyway");
            }

            let renderer = Renderer::new(settings.render_options());
            let image = renderer.render(&text).await?;
            image.save(&output)?;
            println!("{} ({}x{})", output.display(), image.width, image.height);
        }
        Command::Detect { input } => {
            let text = read_input(input)?;
            if looks_like_markdown(&text) {
                println!("markdown");
            } else {
                println!("plain");
                std::process::exit(1);
            }
        }
        Command::Grammar { input } => {
            let text = read_input(input)?;
            let client = ChatClient::new(settings.chat_config())?;
            println!("{}", client.correct_grammar(&text).await?);
        }
        Command::Translate { input, lang } => {
            let text = read_input(input)?;
            let target = lang.unwrap_or_else(|| settings.chat.target_language.clone());
            let client = ChatClient::new(settings.chat_config())?;
            println!("{}", client.translate(&text, &target).await?);
        }
        Command::Explain { input } => {
            let text = read_input(input)?;
            let client = ChatClient::new(settings.chat_config())?;
            println!("{}", client.explain(&text).await?);
        }
    }

    Ok(())
}

fn read_input(path: Option<PathBuf>) -> Result<String> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}
