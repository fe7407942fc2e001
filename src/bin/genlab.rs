//! CLI for GenLab - generate, edit and animate images.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use genlab::media::decode_data_uri;
use genlab::{
    Credential, CredentialGate, EnvCredentialHost, ImageSize, InlineImage, Lab, Session, Tool,
    VideoAspectRatio,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "genlab")]
#[command(about = "Generate images, edit them, and animate them into videos (Gemini, Veo)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Override the API root
    #[arg(long, global = true)]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that an API key is available
    Check(CheckArgs),

    /// Generate an image from a text prompt
    Image(ImageArgs),

    /// Edit an image following a text instruction
    Edit(EditArgs),

    /// Animate an image into a video
    Video(VideoArgs),
}

#[derive(Args)]
struct CheckArgs {
    /// Also ask the image service whether it accepts the key
    #[arg(long)]
    remote: bool,
}

#[derive(Args)]
struct ImageArgs {
    /// The text prompt describing the image
    prompt: String,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,

    /// Output resolution
    #[arg(short, long, value_enum, default_value = "1K")]
    size: SizeArg,
}

#[derive(Args)]
struct EditArgs {
    /// The edit instruction
    prompt: String,

    /// Image to edit
    #[arg(short, long)]
    input: PathBuf,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct VideoArgs {
    /// How the image should move (optional)
    #[arg(default_value = "")]
    prompt: String,

    /// First frame of the video
    #[arg(short, long)]
    input: PathBuf,

    /// Aspect ratio
    #[arg(long, value_enum, default_value = "16:9")]
    aspect_ratio: AspectRatioArg,

    /// Seconds between status checks
    #[arg(long, default_value_t = 5)]
    poll_interval: u64,

    /// Give up after this many seconds (waits indefinitely by default)
    #[arg(long)]
    max_wait: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SizeArg {
    #[value(name = "1K")]
    OneK,
    #[value(name = "2K")]
    TwoK,
    #[value(name = "4K")]
    FourK,
}

impl From<SizeArg> for ImageSize {
    fn from(arg: SizeArg) -> Self {
        match arg {
            SizeArg::OneK => ImageSize::OneK,
            SizeArg::TwoK => ImageSize::TwoK,
            SizeArg::FourK => ImageSize::FourK,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AspectRatioArg {
    #[value(name = "16:9")]
    Landscape,
    #[value(name = "9:16")]
    Portrait,
}

impl From<AspectRatioArg> for VideoAspectRatio {
    fn from(arg: AspectRatioArg) -> Self {
        match arg {
            AspectRatioArg::Landscape => VideoAspectRatio::Landscape,
            AspectRatioArg::Portrait => VideoAspectRatio::Portrait,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let session = Session::new(CredentialGate::new(EnvCredentialHost));
    let ready = session.connect().await;
    if !ready {
        anyhow::bail!(readiness_message(ready));
    }
    if let Commands::Check(CheckArgs { remote: false }) = &cli.command {
        print_result(cli.json, "check", None, readiness_message(ready))?;
        return Ok(());
    }
    let credential = Credential::from_env()?;

    let mut builder = Lab::builder();
    if let Some(url) = &cli.base_url {
        builder = builder.base_url(url);
    }

    match cli.command {
        Commands::Check(_) => {
            let lab = builder.build()?;
            lab.health_check(&credential).await?;
            print_result(cli.json, "check", None, "API key accepted")?;
        }
        Commands::Image(args) => {
            require_prompt(&args.prompt)?;
            let lab = builder.build()?;
            session.select(Tool::Generator);
            let uri = run_form(
                &session,
                lab.generate_image(&credential, &args.prompt, args.size.into()),
            )
            .await?;
            save_data_uri(&uri, &args.output)?;
            print_result(cli.json, "image", Some(&args.output), "Generated image")?;
        }
        Commands::Edit(args) => {
            require_prompt(&args.prompt)?;
            let lab = builder.build()?;
            let source = InlineImage::from_file(&args.input)
                .with_context(|| format!("reading {}", args.input.display()))?;
            session.select(Tool::Editor);
            let uri = run_form(
                &session,
                lab.edit_image(&credential, &source.to_data_uri(), &args.prompt),
            )
            .await?;
            save_data_uri(&uri, &args.output)?;
            print_result(cli.json, "edit", Some(&args.output), "Edited image")?;
        }
        Commands::Video(args) => {
            builder = builder.poll_interval(Duration::from_secs(args.poll_interval));
            if let Some(secs) = args.max_wait {
                builder = builder.max_wait(Duration::from_secs(secs));
            }
            let lab = builder.build()?;
            let source = InlineImage::from_file(&args.input)
                .with_context(|| format!("reading {}", args.input.display()))?;

            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_ctrl_c.cancel();
                }
            });

            session.select(Tool::Video);
            eprintln!("Generating video, this usually takes a few minutes...");
            let uri = run_form(
                &session,
                lab.generate_video(
                    &credential,
                    &source.to_data_uri(),
                    &args.prompt,
                    args.aspect_ratio.into(),
                    Some(cancel),
                ),
            )
            .await?;

            if cli.json {
                let result = serde_json::json!({
                    "type": "video",
                    "success": true,
                    "uri": uri,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{uri}");
            }
        }
    }

    Ok(())
}

fn require_prompt(prompt: &str) -> anyhow::Result<()> {
    if prompt.trim().is_empty() {
        anyhow::bail!("prompt must not be empty");
    }
    Ok(())
}

/// Submits through the active tool's form so errors render the same way.
async fn run_form<F>(session: &Session<EnvCredentialHost>, action: F) -> anyhow::Result<String>
where
    F: std::future::Future<Output = genlab::Result<String>>,
{
    let state = session
        .form(session.active())
        .submit(action)
        .await
        .context("a request is already running")?;
    match (state.error, state.result) {
        (Some(error), _) => anyhow::bail!(error),
        (None, Some(result)) => Ok(result),
        (None, None) => anyhow::bail!("no result"),
    }
}

fn readiness_message(ready: bool) -> &'static str {
    if ready {
        "ready"
    } else {
        "not ready: no API key available; set GOOGLE_API_KEY or API_KEY \
         (see https://ai.google.dev/gemini-api/docs/billing)"
    }
}

fn save_data_uri(uri: &str, output: &Path) -> anyhow::Result<()> {
    let (_, bytes) = decode_data_uri(uri)?;
    std::fs::write(output, bytes).with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}

fn print_result(
    json_output: bool,
    kind: &str,
    output: Option<&Path>,
    message: &str,
) -> anyhow::Result<()> {
    if json_output {
        let result = serde_json::json!({
            "type": kind,
            "success": true,
            "output": output.map(|p| p.display().to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        match output {
            Some(path) => println!("{message}: {}", path.display()),
            None => println!("{message}"),
        }
    }
    Ok(())
}
