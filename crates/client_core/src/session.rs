//! The wizard session aggregate and its read-only snapshot.

use shared::{
    domain::{ActionType, AppStep, Entitlements},
    error::FlowError,
    protocol::GeneratedImage,
};

use crate::{gate, preview::ImageSlot};

/// Number of images a contest run produces.
pub const CONTEST_ENTRIES: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GenerationResults {
    #[default]
    None,
    Single(GeneratedImage),
    Contest([GeneratedImage; CONTEST_ENTRIES]),
}

impl GenerationResults {
    pub fn single(&self) -> Option<&GeneratedImage> {
        match self {
            GenerationResults::Single(image) => Some(image),
            _ => None,
        }
    }

    pub fn contest(&self) -> &[GeneratedImage] {
        match self {
            GenerationResults::Contest(images) => images,
            _ => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, GenerationResults::None)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transient {
    pub is_loading: bool,
    pub is_verifying: bool,
    pub is_enhancing_prompt: bool,
    pub error: Option<FlowError>,
}

/// Mutable state of one wizard run. Fields are only written by the controller.
#[derive(Debug, Default)]
pub(crate) struct Session {
    pub(crate) step: AppStep,
    pub(crate) action_type: Option<ActionType>,
    pub(crate) primary: Option<ImageSlot>,
    pub(crate) friends: Vec<ImageSlot>,
    pub(crate) prompt: String,
    pub(crate) entitlements: Entitlements,
    pub(crate) results: GenerationResults,
    pub(crate) transient: Transient,
    pub(crate) paywall_open: bool,
    pub(crate) epoch: u64,
}

impl Session {
    pub(crate) fn friend_cap(&self) -> usize {
        self.action_type.map(ActionType::friend_cap).unwrap_or(0)
    }

    /// Returns every field to its initial value except premium status. Dropping the
    /// image slots revokes their previews.
    pub(crate) fn reset(&mut self) {
        let entitlements = gate::reset_entitlements(&self.entitlements);
        let epoch = self.epoch.wrapping_add(1);
        *self = Session {
            entitlements,
            epoch,
            ..Session::default()
        };
    }

    /// Back-navigation to ChooseAction: drops scene inputs and in-flight markers.
    pub(crate) fn clear_scene(&mut self) {
        self.prompt.clear();
        self.transient = Transient::default();
        self.friends.clear();
        self.epoch = self.epoch.wrapping_add(1);
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            step: self.step,
            action_type: self.action_type,
            primary_preview: self.primary.as_ref().map(|slot| slot.preview_url().to_string()),
            friend_previews: self
                .friends
                .iter()
                .map(|slot| slot.preview_url().to_string())
                .collect(),
            prompt: self.prompt.clone(),
            entitlements: self.entitlements,
            results: self.results.clone(),
            transient: self.transient.clone(),
            paywall_open: self.paywall_open,
        }
    }
}

/// Owned copy of what a view may read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub step: AppStep,
    pub action_type: Option<ActionType>,
    pub primary_preview: Option<String>,
    pub friend_previews: Vec<String>,
    pub prompt: String,
    pub entitlements: Entitlements,
    pub results: GenerationResults,
    pub transient: Transient,
    pub paywall_open: bool,
}

impl SessionSnapshot {
    pub fn error_message(&self) -> Option<&str> {
        self.transient.error.as_ref().map(FlowError::message)
    }
}
