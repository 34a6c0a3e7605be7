//! Per-step view props, derived purely from a session snapshot.

use shared::domain::AppStep;

use crate::session::SessionSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepView {
    Upload {
        is_verifying: bool,
        error: Option<String>,
    },
    ChooseAction {
        image_preview: String,
        is_premium: bool,
    },
    UploadFriend {
        friend_previews: Vec<String>,
        max_friends: usize,
        can_add: bool,
    },
    DescribeScene {
        image_previews: Vec<String>,
        prompt: String,
        is_enhancing_prompt: bool,
        is_premium: bool,
        remove_watermark: bool,
        is_hd: bool,
        error: Option<String>,
    },
    ContestMode {
        image_preview: String,
        prompt: String,
        error: Option<String>,
    },
    /// Shared by Generating and Result.
    ResultDisplay {
        is_loading: bool,
        generated_image: Option<String>,
        is_hd: bool,
    },
    ContestResult {
        images: Vec<String>,
    },
}

impl StepView {
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        let error = snapshot.error_message().map(str::to_string);
        let primary = snapshot.primary_preview.clone().unwrap_or_default();

        match snapshot.step {
            AppStep::Upload => StepView::Upload {
                is_verifying: snapshot.transient.is_verifying,
                error,
            },
            AppStep::ChooseAction => StepView::ChooseAction {
                image_preview: primary,
                is_premium: snapshot.entitlements.is_premium,
            },
            AppStep::UploadFriend => {
                let max_friends = snapshot.action_type.map(|a| a.friend_cap()).unwrap_or(0);
                StepView::UploadFriend {
                    can_add: snapshot.friend_previews.len() < max_friends,
                    friend_previews: snapshot.friend_previews.clone(),
                    max_friends,
                }
            }
            AppStep::DescribeScene => {
                let mut image_previews = Vec::with_capacity(1 + snapshot.friend_previews.len());
                image_previews.push(primary);
                image_previews.extend(snapshot.friend_previews.iter().cloned());
                StepView::DescribeScene {
                    image_previews,
                    prompt: snapshot.prompt.clone(),
                    is_enhancing_prompt: snapshot.transient.is_enhancing_prompt,
                    is_premium: snapshot.entitlements.is_premium,
                    remove_watermark: snapshot.entitlements.remove_watermark,
                    is_hd: snapshot.entitlements.is_hd,
                    error,
                }
            }
            AppStep::ContestMode => StepView::ContestMode {
                image_preview: primary,
                prompt: snapshot.prompt.clone(),
                error,
            },
            AppStep::Generating | AppStep::Result => StepView::ResultDisplay {
                is_loading: snapshot.transient.is_loading,
                generated_image: snapshot.results.single().map(|image| image.data_url()),
                is_hd: snapshot.entitlements.hd_output(),
            },
            AppStep::ContestResult => StepView::ContestResult {
                images: snapshot
                    .results
                    .contest()
                    .iter()
                    .map(|image| image.data_url())
                    .collect(),
            },
        }
    }
}
