use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::Parser;
use client_core::{FlowController, ImageFile, LocalPreviewStore, Outcome, SessionSnapshot};
use scene_service::{GeminiSceneService, SceneService, UnavailableSceneService};
use shared::{
    domain::{ActionType, AppStep},
    protocol::GeneratedImage,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

/// Put your avatar in a generated scene.
#[derive(Parser, Debug)]
struct Args {
    /// Avatar image to upload.
    #[arg(long)]
    avatar: PathBuf,
    /// Friend images (collab takes one, group up to three).
    #[arg(long = "friend")]
    friends: Vec<PathBuf>,
    #[arg(long, default_value = "solo")]
    action: ActionType,
    /// Scene description. Omit to let the model pick one.
    #[arg(long)]
    prompt: Option<String>,
    /// Improve the prompt before generating.
    #[arg(long)]
    enhance: bool,
    /// Unlock premium (HD, no watermark, group and contest modes).
    #[arg(long)]
    premium: bool,
    /// Keep the watermark even with premium.
    #[arg(long)]
    keep_watermark: bool,
    /// Request standard definition even with premium.
    #[arg(long)]
    sd: bool,
    #[arg(long)]
    out_dir: Option<PathBuf>,
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();
    let settings = config::load_settings(args.config.as_deref())?;

    let service: Arc<dyn SceneService> = match settings.gemini_config() {
        Some(gemini) => Arc::new(GeminiSceneService::new(gemini)?),
        None => {
            warn!("no Gemini API key configured; remote calls will fail");
            Arc::new(UnavailableSceneService::new(
                "set GEMINI_API_KEY or api_key in snapscene.toml",
            ))
        }
    };
    let controller = FlowController::new(service, Arc::new(LocalPreviewStore::new()));

    let snapshot = run_wizard(&controller, &args).await?;
    let out_dir = args
        .out_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.out_dir));
    let written = write_results(&snapshot, &out_dir).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "action": args.action,
            "prompt": snapshot.prompt,
            "hd": snapshot.entitlements.hd_output(),
            "watermark": snapshot.entitlements.wants_watermark(),
            "images": written,
        }))?
    );
    Ok(())
}

async fn run_wizard(controller: &FlowController, args: &Args) -> Result<SessionSnapshot> {
    let avatar = ImageFile::from_path(&args.avatar).await?;
    controller.verify_and_admit(avatar).await;
    let snapshot = controller.snapshot().await;
    if snapshot.step != AppStep::ChooseAction {
        bail!(
            "{}",
            snapshot
                .error_message()
                .unwrap_or("avatar was not admitted")
        );
    }

    if args.premium {
        controller.upgrade().await;
        if args.keep_watermark {
            controller.toggle_remove_watermark().await;
        }
        if args.sd {
            controller.toggle_hd().await;
        }
    }

    if controller.select_action(args.action).await == Outcome::NeedsUpgrade {
        bail!("the {} action needs premium; pass --premium", args.action);
    }

    if controller.step().await == AppStep::UploadFriend {
        for path in &args.friends {
            let friend = ImageFile::from_path(path).await?;
            if controller.add_friend_image(friend).await == Outcome::Ignored {
                warn!(path = %path.display(), "friend limit reached; skipping");
            }
        }
        controller.done_adding_friends().await;
    } else if !args.friends.is_empty() {
        warn!(action = %args.action, "friend images are ignored for this action");
    }

    if let Some(prompt) = &args.prompt {
        controller.set_prompt(prompt.as_str()).await;
    }

    match controller.step().await {
        AppStep::ContestMode => {
            if args.prompt.is_none() {
                bail!("contest mode needs --prompt");
            }
            controller.generate_contest().await;
        }
        AppStep::DescribeScene => match &args.prompt {
            Some(_) => {
                if args.enhance {
                    controller.enhance_prompt().await;
                    info!(prompt = %controller.snapshot().await.prompt, "prompt enhanced");
                }
                controller.generate().await;
            }
            None => controller.surprise_me().await,
        },
        other => bail!("unexpected wizard step {other}"),
    }

    let snapshot = controller.snapshot().await;
    match snapshot.step {
        AppStep::Result | AppStep::ContestResult => Ok(snapshot),
        _ => Err(anyhow!(
            "{}",
            snapshot.error_message().unwrap_or("generation did not finish")
        )),
    }
}

async fn write_results(snapshot: &SessionSnapshot, out_dir: &Path) -> Result<Vec<String>> {
    let images: Vec<&GeneratedImage> = match snapshot.results.single() {
        Some(image) => vec![image],
        None => snapshot.results.contest().iter().collect(),
    };

    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("failed to create output dir '{}'", out_dir.display()))?;

    let mut written = Vec::with_capacity(images.len());
    for (index, image) in images.into_iter().enumerate() {
        let bytes = STANDARD
            .decode(image.png_b64.trim())
            .context("generated image is not valid base64")?;
        let path = out_dir.join(format!("scene-{}.png", index + 1));
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        info!(path = %path.display(), "wrote generated image");
        written.push(path.display().to_string());
    }
    Ok(written)
}
