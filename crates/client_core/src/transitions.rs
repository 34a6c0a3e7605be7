//! Pure step-transition rules.

use shared::domain::{ActionType, AppStep, Entitlements};

use crate::gate::admits_action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    SelectAction(ActionType),
    Done,
    Back,
    Reset,
}

/// State change that accompanies a step move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    SetAction(ActionType),
    /// Drop prompt, error and friend images.
    ClearScene,
    FullReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Move { to: AppStep, effect: Effect },
    Paywall,
    Ignore,
}

pub fn decide(step: AppStep, trigger: Trigger, entitlements: &Entitlements) -> Decision {
    use AppStep::*;

    match (step, trigger) {
        (ChooseAction, Trigger::SelectAction(action)) => {
            if !admits_action(entitlements, action) {
                return Decision::Paywall;
            }
            let to = match action {
                ActionType::Solo => DescribeScene,
                ActionType::Collab | ActionType::Group => UploadFriend,
                ActionType::Contest => ContestMode,
            };
            Decision::Move {
                to,
                effect: Effect::SetAction(action),
            }
        }
        (ChooseAction, Trigger::Back) => Decision::Move {
            to: Upload,
            effect: Effect::FullReset,
        },
        (UploadFriend, Trigger::Done) => Decision::Move {
            to: DescribeScene,
            effect: Effect::None,
        },
        (UploadFriend | DescribeScene | ContestMode, Trigger::Back) => Decision::Move {
            to: ChooseAction,
            effect: Effect::ClearScene,
        },
        (Generating | Result | ContestResult, Trigger::Reset) => Decision::Move {
            to: Upload,
            effect: Effect::FullReset,
        },
        _ => Decision::Ignore,
    }
}

/// Guard for the single-image generation path. Whitespace counts as a prompt here;
/// only the contest path trims.
pub fn can_generate(prompt: &str, has_primary: bool, action: Option<ActionType>) -> bool {
    !prompt.is_empty() && has_primary && action.is_some()
}

/// Guard for the contest path; the action type is implied by the step.
pub fn can_generate_contest(prompt: &str, has_primary: bool) -> bool {
    !prompt.trim().is_empty() && has_primary
}

#[cfg(test)]
mod tests {
    use super::*;

    const FREE: Entitlements = Entitlements {
        is_premium: false,
        remove_watermark: false,
        is_hd: false,
    };
    const PREMIUM: Entitlements = Entitlements {
        is_premium: true,
        remove_watermark: true,
        is_hd: true,
    };

    #[test]
    fn choose_action_routes_by_action() {
        let cases = [
            (ActionType::Solo, AppStep::DescribeScene),
            (ActionType::Collab, AppStep::UploadFriend),
            (ActionType::Group, AppStep::UploadFriend),
            (ActionType::Contest, AppStep::ContestMode),
        ];
        for (action, to) in cases {
            assert_eq!(
                decide(AppStep::ChooseAction, Trigger::SelectAction(action), &PREMIUM),
                Decision::Move {
                    to,
                    effect: Effect::SetAction(action)
                }
            );
        }
    }

    #[test]
    fn premium_actions_open_paywall_for_free_users() {
        assert_eq!(
            decide(
                AppStep::ChooseAction,
                Trigger::SelectAction(ActionType::Group),
                &FREE
            ),
            Decision::Paywall
        );
        assert_eq!(
            decide(
                AppStep::ChooseAction,
                Trigger::SelectAction(ActionType::Contest),
                &FREE
            ),
            Decision::Paywall
        );
    }

    #[test]
    fn back_targets_depend_on_step() {
        assert_eq!(
            decide(AppStep::ChooseAction, Trigger::Back, &FREE),
            Decision::Move {
                to: AppStep::Upload,
                effect: Effect::FullReset
            }
        );
        for step in [
            AppStep::UploadFriend,
            AppStep::DescribeScene,
            AppStep::ContestMode,
        ] {
            assert_eq!(
                decide(step, Trigger::Back, &FREE),
                Decision::Move {
                    to: AppStep::ChooseAction,
                    effect: Effect::ClearScene
                }
            );
        }
        assert_eq!(decide(AppStep::Upload, Trigger::Back, &FREE), Decision::Ignore);
        assert_eq!(decide(AppStep::Result, Trigger::Back, &FREE), Decision::Ignore);
    }

    #[test]
    fn unlisted_pairs_are_ignored() {
        for step in AppStep::ALL {
            if step != AppStep::ChooseAction {
                assert_eq!(
                    decide(step, Trigger::SelectAction(ActionType::Solo), &PREMIUM),
                    Decision::Ignore
                );
            }
            if step != AppStep::UploadFriend {
                assert_eq!(decide(step, Trigger::Done, &PREMIUM), Decision::Ignore);
            }
        }
        assert_eq!(decide(AppStep::Upload, Trigger::Reset, &FREE), Decision::Ignore);
        assert_eq!(
            decide(AppStep::DescribeScene, Trigger::Reset, &FREE),
            Decision::Ignore
        );
    }

    #[test]
    fn generation_guards() {
        assert!(can_generate("sunset", true, Some(ActionType::Solo)));
        assert!(can_generate("   ", true, Some(ActionType::Solo)));
        assert!(!can_generate("", true, Some(ActionType::Solo)));
        assert!(!can_generate("sunset", false, Some(ActionType::Solo)));
        assert!(!can_generate("sunset", true, None));
        assert!(can_generate_contest("sunset", true));
        assert!(!can_generate_contest("", true));
        assert!(!can_generate_contest("  ", true));
    }
}
