//! Step-flow controller for the SnapScene wizard.
//!
//! [`FlowController`] owns the wizard session, applies the transition table, runs the
//! remote operations against a [`SceneService`], and manages preview lifetimes. Every
//! mutation goes through a named operation; views only ever read a
//! [`SessionSnapshot`] or a [`StepView`].

use std::sync::Arc;

use scene_service::SceneService;
use shared::domain::{ActionType, AppStep};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub mod encoding;
pub mod gate;
pub mod preview;
mod remote_ops;
pub mod session;
pub mod transitions;
pub mod view;

pub use encoding::{file_to_encoded_data, EncodeError, ImageFile};
pub use gate::{Outcome, WATERMARK_CLAUSE};
pub use preview::{ImageSlot, LocalPreviewStore, PreviewHandle, PreviewStore};
pub use session::{GenerationResults, SessionSnapshot, Transient, CONTEST_ENTRIES};
pub use view::StepView;

use session::Session;
use transitions::{Decision, Effect, Trigger};

pub struct FlowController {
    session: Mutex<Session>,
    service: Arc<dyn SceneService>,
    previews: Arc<dyn PreviewStore>,
}

impl FlowController {
    pub fn new(service: Arc<dyn SceneService>, previews: Arc<dyn PreviewStore>) -> Self {
        Self {
            session: Mutex::new(Session::default()),
            service,
            previews,
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }

    pub async fn step(&self) -> AppStep {
        self.session.lock().await.step
    }

    pub async fn view(&self) -> StepView {
        StepView::from_snapshot(&self.snapshot().await)
    }

    pub async fn select_action(&self, action: ActionType) -> Outcome {
        self.apply(Trigger::SelectAction(action)).await
    }

    pub async fn back(&self) -> Outcome {
        self.apply(Trigger::Back).await
    }

    pub async fn done_adding_friends(&self) -> Outcome {
        self.apply(Trigger::Done).await
    }

    /// "Start over" from a result screen.
    pub async fn reset(&self) -> Outcome {
        self.apply(Trigger::Reset).await
    }

    async fn apply(&self, trigger: Trigger) -> Outcome {
        let mut session = self.session.lock().await;
        match transitions::decide(session.step, trigger, &session.entitlements) {
            Decision::Ignore => {
                debug!(step = %session.step, ?trigger, "ignoring transition");
                Outcome::Ignored
            }
            Decision::Paywall => {
                info!(step = %session.step, ?trigger, "premium required; opening paywall");
                session.paywall_open = true;
                Outcome::NeedsUpgrade
            }
            Decision::Move { to, effect } => {
                match effect {
                    Effect::None => {}
                    Effect::SetAction(action) => session.action_type = Some(action),
                    Effect::ClearScene => session.clear_scene(),
                    Effect::FullReset => session.reset(),
                }
                move_to(&mut session, to);
                Outcome::Performed
            }
        }
    }

    pub async fn add_friend_image(&self, file: ImageFile) -> Outcome {
        let mut session = self.session.lock().await;
        if session.step != AppStep::UploadFriend || session.friends.len() >= session.friend_cap() {
            return Outcome::Ignored;
        }
        let slot = ImageSlot::new(file, &self.previews);
        debug!(name = slot.file().name(), "friend image added");
        session.friends.push(slot);
        session.transient.error = None;
        Outcome::Performed
    }

    pub async fn remove_friend_image(&self, index: usize) -> Outcome {
        let mut session = self.session.lock().await;
        if session.step != AppStep::UploadFriend || index >= session.friends.len() {
            return Outcome::Ignored;
        }
        drop(session.friends.remove(index));
        Outcome::Performed
    }

    pub async fn set_prompt(&self, prompt: impl Into<String>) -> Outcome {
        let mut session = self.session.lock().await;
        if !matches!(session.step, AppStep::DescribeScene | AppStep::ContestMode) {
            return Outcome::Ignored;
        }
        session.prompt = prompt.into();
        Outcome::Performed
    }

    pub async fn toggle_remove_watermark(&self) -> Outcome {
        let mut session = self.session.lock().await;
        let outcome = gate::toggle_remove_watermark(&mut session.entitlements);
        if outcome == Outcome::NeedsUpgrade {
            session.paywall_open = true;
        }
        outcome
    }

    pub async fn toggle_hd(&self) -> Outcome {
        let mut session = self.session.lock().await;
        let outcome = gate::toggle_hd(&mut session.entitlements);
        if outcome == Outcome::NeedsUpgrade {
            session.paywall_open = true;
        }
        outcome
    }

    /// Unlocks premium. There is no payment step, so this always succeeds.
    pub async fn upgrade(&self) {
        let mut session = self.session.lock().await;
        gate::upgrade(&mut session.entitlements);
        session.paywall_open = false;
        info!("session upgraded to premium");
    }

    pub async fn dismiss_paywall(&self) {
        self.session.lock().await.paywall_open = false;
    }
}

/// The only place the step is written.
fn move_to(session: &mut Session, to: AppStep) {
    if session.step != to {
        info!(from = %session.step, to = %to, "wizard step changed");
    }
    session.step = to;
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
