//! Linear stage machine for one chatbot creation.

use serde_json::Value;
use tracing::{info, warn};

use docutalk_types::creation::{
    ChatbotDraft, CreationEvent, CreationPayload, CreationStage, StageTransition,
};

use super::classifier::classify;

/// Tracks the creation stage and the draft assembled from stage payloads.
///
/// Stages only move forward. A payload whose stage is not ahead of the
/// current one is reported as a duplicate and leaves both stage and draft
/// untouched. `Finalized` is terminal.
#[derive(Debug, Clone)]
pub struct CreationProgress {
    stage: CreationStage,
    draft: ChatbotDraft,
}

impl Default for CreationProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl CreationProgress {
    pub fn new() -> Self {
        Self {
            stage: CreationStage::Idle,
            draft: ChatbotDraft::default(),
        }
    }

    pub fn stage(&self) -> CreationStage {
        self.stage
    }

    pub fn draft(&self) -> &ChatbotDraft {
        &self.draft
    }

    pub fn is_finalized(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Apply a recognised payload.
    pub fn apply(&mut self, payload: &CreationPayload) -> StageTransition {
        let target = payload.stage();
        if target <= self.stage {
            warn!(
                current = %self.stage,
                received = %target,
                "creation stage not ahead of current state, ignoring"
            );
            return StageTransition::Duplicate {
                current: self.stage,
            };
        }

        match payload {
            CreationPayload::Identity { title, description } => {
                self.draft.title = Some(title.clone());
                self.draft.description = Some(description.clone());
            }
            CreationPayload::Icon { data } => self.draft.icon = Some(data.clone()),
            CreationPayload::Prompts { suggested } => {
                self.draft.suggested_prompts = suggested.clone();
            }
            CreationPayload::Finalized { chatbot_id } => {
                self.draft.chatbot_id = Some(chatbot_id.clone());
            }
        }

        let from = self.stage;
        self.stage = target;
        info!(%from, to = %target, step = target.step(), "creation stage advanced");
        StageTransition::Advanced { from, to: target }
    }

    /// Classify a decoded object and apply it.
    pub fn observe(&mut self, object: Value) -> CreationEvent {
        match classify(&object) {
            Some(payload) => {
                let transition = self.apply(&payload);
                CreationEvent::Stage {
                    payload,
                    transition,
                }
            }
            None => {
                warn!(%object, "unrecognised creation payload");
                CreationEvent::UnknownStagePayload { object }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transition_of(event: &CreationEvent) -> Option<StageTransition> {
        match event {
            CreationEvent::Stage { transition, .. } => Some(*transition),
            _ => None,
        }
    }

    #[test]
    fn full_sequence_advances_in_order() {
        let mut progress = CreationProgress::new();
        let objects = [
            json!({"title": "Docs", "description": "About docs"}),
            json!({"icon": "aWNvbg=="}),
            json!({"suggested_prompts": ["How?", "Why?"]}),
            json!({"chatbot_id": "bot-9"}),
        ];
        let expected = [
            (CreationStage::Idle, CreationStage::GotIdentity),
            (CreationStage::GotIdentity, CreationStage::GotIcon),
            (CreationStage::GotIcon, CreationStage::GotPrompts),
            (CreationStage::GotPrompts, CreationStage::Finalized),
        ];

        for (object, (from, to)) in objects.into_iter().zip(expected) {
            let event = progress.observe(object);
            assert_eq!(
                transition_of(&event),
                Some(StageTransition::Advanced { from, to })
            );
        }

        assert!(progress.is_finalized());
        let draft = progress.draft();
        assert_eq!(draft.title.as_deref(), Some("Docs"));
        assert_eq!(draft.icon.as_deref(), Some("aWNvbg=="));
        assert_eq!(draft.suggested_prompts, vec!["How?", "Why?"]);
        assert_eq!(draft.chatbot_id.as_deref(), Some("bot-9"));
    }

    #[test]
    fn gaps_are_legal() {
        let mut progress = CreationProgress::new();
        let event = progress.observe(json!({"chatbot_id": "direct"}));
        assert_eq!(
            transition_of(&event),
            Some(StageTransition::Advanced {
                from: CreationStage::Idle,
                to: CreationStage::Finalized
            })
        );
        assert!(progress.draft().title.is_none());
    }

    #[test]
    fn payload_after_finalized_is_duplicate() {
        let mut progress = CreationProgress::new();
        progress.observe(json!({"title": "A", "description": "a"}));
        progress.observe(json!({"chatbot_id": "done"}));

        let event = progress.observe(json!({"title": "B", "description": "b"}));
        assert_eq!(
            transition_of(&event),
            Some(StageTransition::Duplicate {
                current: CreationStage::Finalized
            })
        );
        // Still surfaced with its payload, but the draft is unchanged.
        assert!(matches!(
            event,
            CreationEvent::Stage {
                payload: CreationPayload::Identity { .. },
                ..
            }
        ));
        assert_eq!(progress.draft().title.as_deref(), Some("A"));
        assert_eq!(progress.stage(), CreationStage::Finalized);
    }

    #[test]
    fn out_of_order_and_repeated_stages_are_duplicates() {
        let mut progress = CreationProgress::new();
        progress.observe(json!({"suggested_prompts": ["p"]}));

        let icon = progress.observe(json!({"icon": "late"}));
        assert_eq!(
            transition_of(&icon),
            Some(StageTransition::Duplicate {
                current: CreationStage::GotPrompts
            })
        );
        let again = progress.observe(json!({"suggested_prompts": ["q"]}));
        assert!(matches!(
            transition_of(&again),
            Some(StageTransition::Duplicate { .. })
        ));
        assert_eq!(progress.draft().suggested_prompts, vec!["p"]);
        assert!(progress.draft().icon.is_none());
    }

    #[test]
    fn unknown_shape_is_reported_without_state_change() {
        let mut progress = CreationProgress::new();
        let event = progress.observe(json!({"progress": 0.5}));
        assert_eq!(
            event,
            CreationEvent::UnknownStagePayload {
                object: json!({"progress": 0.5})
            }
        );
        assert_eq!(progress.stage(), CreationStage::Idle);
    }
}
