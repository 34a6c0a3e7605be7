//! Remote operations: set the in-flight flag, release the session lock across the
//! call, then fold the outcome back in.
//!
//! Each call captures the session epoch before suspending. Full resets and
//! back-navigation bump the epoch, so a resolution that arrives afterwards is
//! discarded instead of resurrecting cleared state.

use futures::future::join_all;
use shared::{domain::AppStep, error::FlowError, protocol::GeneratedImage};
use tracing::{debug, info, warn};

use crate::{
    encoding::{self, ImageFile},
    gate, move_to,
    preview::ImageSlot,
    session::{GenerationResults, Session, CONTEST_ENTRIES},
    transitions, FlowController,
};

const VERIFY_FAILED_MESSAGE: &str = "Could not verify the image. Please try again.";
const EMPTY_IMAGE_MESSAGE: &str = "Failed to generate image. The result was empty.";
const CONTEST_INCOMPLETE_MESSAGE: &str = "Could not generate all contest images. Please try again.";
const EMPTY_SURPRISE_MESSAGE: &str = "The surprise prompt came back empty. Please try again.";
const EMPTY_ENHANCE_MESSAGE: &str = "The enhanced prompt came back empty. Please try again.";

#[derive(Debug, Clone, Copy)]
enum GenerateEntry {
    /// Requested from DescribeScene.
    Fresh,
    /// Continuation of a surprise-me run already in Generating.
    AfterSurprise { epoch: u64 },
}

impl FlowController {
    /// Verifies `file` is an avatar and, if so, admits it as the primary image.
    pub async fn verify_and_admit(&self, file: ImageFile) {
        let epoch = {
            let mut session = self.session.lock().await;
            if session.step != AppStep::Upload || session.transient.is_verifying {
                return;
            }
            session.transient.is_verifying = true;
            session.transient.error = None;
            session.epoch
        };

        let encoded = encoding::encode_image(&file);
        debug!(name = file.name(), mime = file.mime_type(), "verifying avatar");
        let verdict = self.service.verify_is_avatar(&encoded).await;

        let mut session = self.session.lock().await;
        if is_stale(&session, epoch, "verify_is_avatar") {
            return;
        }
        session.transient.is_verifying = false;
        match verdict {
            Ok(verdict) if verdict.is_avatar => {
                info!(name = file.name(), "avatar accepted");
                session.primary = Some(ImageSlot::new(file, &self.previews));
                move_to(&mut session, AppStep::ChooseAction);
            }
            Ok(verdict) => {
                info!(reason = %verdict.reason, "avatar rejected");
                session.transient.error = Some(FlowError::rejected(&verdict.reason));
            }
            Err(err) => {
                warn!(
                    error = %err,
                    retryable = err.is_retryable(),
                    "avatar verification failed"
                );
                session.transient.error = Some(FlowError::remote(VERIFY_FAILED_MESSAGE));
            }
        }
    }

    /// Generates a single scene from the current prompt.
    pub async fn generate(&self) {
        self.run_generate(None, GenerateEntry::Fresh).await;
    }

    async fn run_generate(&self, prompt_override: Option<String>, entry: GenerateEntry) {
        let (epoch, files, prompt, hd) = {
            let mut session = self.session.lock().await;
            let admitted = match entry {
                GenerateEntry::Fresh => {
                    session.step == AppStep::DescribeScene && !session.transient.is_loading
                }
                GenerateEntry::AfterSurprise { epoch } => {
                    session.epoch == epoch && session.step == AppStep::Generating
                }
            };
            if !admitted {
                return;
            }

            let prompt = prompt_override.unwrap_or_else(|| session.prompt.clone());
            if !transitions::can_generate(&prompt, session.primary.is_some(), session.action_type) {
                if let GenerateEntry::AfterSurprise { .. } = entry {
                    session.transient.is_loading = false;
                    move_to(&mut session, AppStep::DescribeScene);
                }
                return;
            }

            let files = scene_files(&session);
            let prompt = gate::watermarked_prompt(&prompt, &session.entitlements);
            let hd = session.entitlements.hd_output();
            move_to(&mut session, AppStep::Generating);
            session.transient.is_loading = true;
            session.transient.error = None;
            session.results = GenerationResults::None;
            (session.epoch, files, prompt, hd)
        };

        let images = encoding::encode_all(&files);
        info!(images = images.len(), hd, "requesting scene generation");
        let outcome = self.service.edit_image(&images, &prompt, hd).await;

        let mut session = self.session.lock().await;
        if is_stale(&session, epoch, "edit_image") {
            return;
        }
        session.transient.is_loading = false;
        match outcome {
            Ok(Some(png)) if !png.trim().is_empty() => {
                session.results = GenerationResults::Single(GeneratedImage::new(png));
                move_to(&mut session, AppStep::Result);
            }
            Ok(_) => {
                warn!("scene generation returned no image");
                fail(
                    &mut session,
                    FlowError::empty_result(EMPTY_IMAGE_MESSAGE),
                    AppStep::DescribeScene,
                );
            }
            Err(err) => {
                warn!(
                    error = %err,
                    retryable = err.is_retryable(),
                    "scene generation failed"
                );
                fail(
                    &mut session,
                    FlowError::remote(err.to_string()),
                    AppStep::DescribeScene,
                );
            }
        }
    }

    /// Runs three independent generations from the primary image. All must succeed.
    pub async fn generate_contest(&self) {
        let (epoch, file, prompt, hd) = {
            let mut session = self.session.lock().await;
            if session.step != AppStep::ContestMode || session.transient.is_loading {
                return;
            }
            if !transitions::can_generate_contest(&session.prompt, session.primary.is_some()) {
                return;
            }
            let Some(primary) = session.primary.as_ref() else {
                return;
            };
            let file = primary.file().clone();
            let prompt = session.prompt.clone();
            let hd = session.entitlements.is_hd;
            move_to(&mut session, AppStep::Generating);
            session.transient.is_loading = true;
            session.transient.error = None;
            session.results = GenerationResults::None;
            (session.epoch, file, prompt, hd)
        };

        let image = [encoding::encode_image(&file)];
        info!(entries = CONTEST_ENTRIES, hd, "requesting contest generation");
        let requests = (0..CONTEST_ENTRIES).map(|_| self.service.edit_image(&image, &prompt, hd));
        let outcomes = join_all(requests).await;

        let mut session = self.session.lock().await;
        if is_stale(&session, epoch, "edit_image(contest)") {
            return;
        }
        session.transient.is_loading = false;

        let mut images = Vec::with_capacity(CONTEST_ENTRIES);
        let mut first_error = None;
        for outcome in outcomes {
            match outcome {
                Ok(Some(png)) if !png.trim().is_empty() => images.push(GeneratedImage::new(png)),
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        error = %err,
                        retryable = err.is_retryable(),
                        "contest entry failed"
                    );
                    first_error.get_or_insert_with(|| err.to_string());
                }
            }
        }

        if let Some(message) = first_error {
            fail(&mut session, FlowError::remote(message), AppStep::ContestMode);
            return;
        }
        match <[GeneratedImage; CONTEST_ENTRIES]>::try_from(images) {
            Ok(images) => {
                session.results = GenerationResults::Contest(images);
                move_to(&mut session, AppStep::ContestResult);
            }
            Err(partial) => {
                warn!(succeeded = partial.len(), "contest generation incomplete");
                fail(
                    &mut session,
                    FlowError::empty_result(CONTEST_INCOMPLETE_MESSAGE),
                    AppStep::ContestMode,
                );
            }
        }
    }

    /// Asks the service for a scene prompt, shows it, then generates with it.
    pub async fn surprise_me(&self) {
        let (epoch, files) = {
            let mut session = self.session.lock().await;
            if session.step != AppStep::DescribeScene
                || session.transient.is_loading
                || session.primary.is_none()
            {
                return;
            }
            let files = scene_files(&session);
            move_to(&mut session, AppStep::Generating);
            session.transient.is_loading = true;
            session.transient.error = None;
            session.results = GenerationResults::None;
            (session.epoch, files)
        };

        let images = encoding::encode_all(&files);
        info!(images = images.len(), "requesting surprise prompt");
        let outcome = self.service.generate_surprise_prompt(&images).await;

        let prompt = {
            let mut session = self.session.lock().await;
            if is_stale(&session, epoch, "generate_surprise_prompt") {
                return;
            }
            let resolved = match outcome {
                Ok(prompt) if !prompt.trim().is_empty() => {
                    session.prompt = prompt.clone();
                    Ok(prompt)
                }
                Ok(_) => Err(FlowError::empty_result(EMPTY_SURPRISE_MESSAGE)),
                Err(err) => {
                    warn!(
                        error = %err,
                        retryable = err.is_retryable(),
                        "surprise prompt failed"
                    );
                    Err(FlowError::remote(err.to_string()))
                }
            };
            match resolved {
                Ok(prompt) => prompt,
                Err(error) => {
                    session.transient.is_loading = false;
                    fail(&mut session, error, AppStep::DescribeScene);
                    return;
                }
            }
        };

        self.run_generate(Some(prompt), GenerateEntry::AfterSurprise { epoch })
            .await;
    }

    /// Replaces the prompt with an improved version. The step does not change.
    pub async fn enhance_prompt(&self) {
        let (epoch, files, prompt) = {
            let mut session = self.session.lock().await;
            if session.step != AppStep::DescribeScene
                || session.transient.is_enhancing_prompt
                || session.transient.is_loading
            {
                return;
            }
            if session.prompt.trim().is_empty() || session.primary.is_none() {
                return;
            }
            session.transient.is_enhancing_prompt = true;
            session.transient.error = None;
            (session.epoch, scene_files(&session), session.prompt.clone())
        };

        let images = encoding::encode_all(&files);
        debug!(images = images.len(), "requesting prompt enhancement");
        let outcome = self.service.enhance_prompt(&images, &prompt).await;

        let mut session = self.session.lock().await;
        if is_stale(&session, epoch, "enhance_prompt") {
            return;
        }
        session.transient.is_enhancing_prompt = false;
        match outcome {
            Ok(enhanced) if !enhanced.trim().is_empty() => {
                session.prompt = enhanced.trim().to_string();
            }
            Ok(_) => {
                session.transient.error = Some(FlowError::empty_result(EMPTY_ENHANCE_MESSAGE));
            }
            Err(err) => {
                warn!(
                    error = %err,
                    retryable = err.is_retryable(),
                    "prompt enhancement failed"
                );
                session.transient.error = Some(FlowError::remote(err.to_string()));
            }
        }
    }
}

/// Primary image first, then friends in display order.
fn scene_files(session: &Session) -> Vec<ImageFile> {
    session
        .primary
        .iter()
        .chain(session.friends.iter())
        .map(|slot| slot.file().clone())
        .collect()
}

fn is_stale(session: &Session, epoch: u64, operation: &str) -> bool {
    if session.epoch == epoch {
        return false;
    }
    debug!(
        operation,
        started = epoch,
        current = session.epoch,
        "discarding stale remote resolution"
    );
    true
}

fn fail(session: &mut Session, error: FlowError, back_to: AppStep) {
    session.transient.error = Some(error);
    session.results = GenerationResults::None;
    move_to(session, back_to);
}
