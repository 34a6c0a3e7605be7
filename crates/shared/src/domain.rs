use std::fmt;

use serde::{Deserialize, Serialize};

/// Wizard position. The flow starts at `Upload` and has no terminal step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppStep {
    #[default]
    Upload,
    ChooseAction,
    UploadFriend,
    DescribeScene,
    Generating,
    Result,
    ContestMode,
    ContestResult,
}

impl AppStep {
    pub const ALL: [AppStep; 8] = [
        AppStep::Upload,
        AppStep::ChooseAction,
        AppStep::UploadFriend,
        AppStep::DescribeScene,
        AppStep::Generating,
        AppStep::Result,
        AppStep::ContestMode,
        AppStep::ContestResult,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppStep::Upload => "upload",
            AppStep::ChooseAction => "chooseAction",
            AppStep::UploadFriend => "uploadFriend",
            AppStep::DescribeScene => "describeScene",
            AppStep::Generating => "generating",
            AppStep::Result => "result",
            AppStep::ContestMode => "contestMode",
            AppStep::ContestResult => "contestResult",
        }
    }
}

impl fmt::Display for AppStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Solo,
    Collab,
    Group,
    Contest,
}

impl ActionType {
    /// Maximum number of friend images this action accepts.
    pub fn friend_cap(self) -> usize {
        match self {
            ActionType::Collab => 1,
            ActionType::Group => 3,
            ActionType::Solo | ActionType::Contest => 0,
        }
    }

    pub fn requires_premium(self) -> bool {
        matches!(self, ActionType::Group | ActionType::Contest)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Solo => "solo",
            ActionType::Collab => "collab",
            ActionType::Group => "group",
            ActionType::Contest => "contest",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "solo" => Ok(ActionType::Solo),
            "collab" => Ok(ActionType::Collab),
            "group" => Ok(ActionType::Group),
            "contest" => Ok(ActionType::Contest),
            other => Err(format!("unknown action type '{other}'")),
        }
    }
}

/// Premium entitlements. `remove_watermark` and `is_hd` only mean anything while
/// `is_premium` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlements {
    pub is_premium: bool,
    pub remove_watermark: bool,
    pub is_hd: bool,
}

impl Entitlements {
    pub fn wants_watermark(&self) -> bool {
        !self.is_premium || !self.remove_watermark
    }

    pub fn hd_output(&self) -> bool {
        self.is_premium && self.is_hd
    }
}
