//! Premium gate: entitlement toggles, upgrade, and watermark decisions.

use shared::domain::{ActionType, Entitlements};

pub const WATERMARK_CLAUSE: &str = ". Add a small, subtle, semi-transparent watermark in the \
bottom-right corner with the text 'SnapScene'.";

/// Result of a user operation that may be gated or guarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Performed,
    /// The caller must show the paywall instead.
    NeedsUpgrade,
    /// A guard failed; nothing changed.
    Ignored,
}

pub fn admits_action(entitlements: &Entitlements, action: ActionType) -> bool {
    !action.requires_premium() || entitlements.is_premium
}

pub fn toggle_remove_watermark(entitlements: &mut Entitlements) -> Outcome {
    if !entitlements.is_premium {
        return Outcome::NeedsUpgrade;
    }
    entitlements.remove_watermark = !entitlements.remove_watermark;
    Outcome::Performed
}

pub fn toggle_hd(entitlements: &mut Entitlements) -> Outcome {
    if !entitlements.is_premium {
        return Outcome::NeedsUpgrade;
    }
    entitlements.is_hd = !entitlements.is_hd;
    Outcome::Performed
}

pub fn upgrade(entitlements: &mut Entitlements) {
    *entitlements = Entitlements {
        is_premium: true,
        remove_watermark: true,
        is_hd: true,
    };
}

/// Entitlements after a full reset: premium persists, toggles fall back to it.
pub fn reset_entitlements(entitlements: &Entitlements) -> Entitlements {
    Entitlements {
        is_premium: entitlements.is_premium,
        remove_watermark: entitlements.is_premium,
        is_hd: entitlements.is_premium,
    }
}

pub fn watermarked_prompt(prompt: &str, entitlements: &Entitlements) -> String {
    if entitlements.wants_watermark() {
        format!("{prompt}{WATERMARK_CLAUSE}")
    } else {
        prompt.to_string()
    }
}
