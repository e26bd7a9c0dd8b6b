//! Chatbot creation types.
//!
//! A creation stream delivers up to four stage payloads in a fixed order
//! (identity, icon, prompts, finalization), interleaved with credit frames.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::stream::CreditNotice;

/// One recognised stage payload of the creation stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum CreationPayload {
    /// Generated title and description.
    Identity { title: String, description: String },

    /// Generated icon, base64-encoded image bytes.
    Icon { data: String },

    /// Suggested opening prompts, in display order.
    Prompts { suggested: Vec<String> },

    /// The chatbot was persisted under this id. Terminal.
    Finalized { chatbot_id: String },
}

impl CreationPayload {
    /// The stage the state machine reaches once this payload is applied.
    pub fn stage(&self) -> CreationStage {
        match self {
            CreationPayload::Identity { .. } => CreationStage::GotIdentity,
            CreationPayload::Icon { .. } => CreationStage::GotIcon,
            CreationPayload::Prompts { .. } => CreationStage::GotPrompts,
            CreationPayload::Finalized { .. } => CreationStage::Finalized,
        }
    }
}

/// Linear creation state. Ordering follows the stream order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationStage {
    Idle,
    GotIdentity,
    GotIcon,
    GotPrompts,
    Finalized,
}

impl CreationStage {
    /// Zero-based step index, as shown by progress displays (0..=4).
    pub fn step(&self) -> u8 {
        match self {
            CreationStage::Idle => 0,
            CreationStage::GotIdentity => 1,
            CreationStage::GotIcon => 2,
            CreationStage::GotPrompts => 3,
            CreationStage::Finalized => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CreationStage::Finalized)
    }
}

impl fmt::Display for CreationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreationStage::Idle => write!(f, "idle"),
            CreationStage::GotIdentity => write!(f, "got_identity"),
            CreationStage::GotIcon => write!(f, "got_icon"),
            CreationStage::GotPrompts => write!(f, "got_prompts"),
            CreationStage::Finalized => write!(f, "finalized"),
        }
    }
}

impl FromStr for CreationStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(CreationStage::Idle),
            "got_identity" => Ok(CreationStage::GotIdentity),
            "got_icon" => Ok(CreationStage::GotIcon),
            "got_prompts" => Ok(CreationStage::GotPrompts),
            "finalized" => Ok(CreationStage::Finalized),
            other => Err(format!("invalid creation stage: '{other}'")),
        }
    }
}

/// What applying a payload did to the stage machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageTransition {
    /// The machine moved forward.
    Advanced {
        from: CreationStage,
        to: CreationStage,
    },

    /// The payload's stage was not ahead of the current state.
    Duplicate { current: CreationStage },
}

/// One item of a creation stream as seen by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CreationEvent {
    /// A recognised stage payload and its effect on the stage machine.
    Stage {
        payload: CreationPayload,
        transition: StageTransition,
    },

    /// A credit frame interleaved with the JSON objects.
    CreditNotice(CreditNotice),

    /// A JSON object matching none of the known stage shapes.
    UnknownStagePayload { object: serde_json::Value },
}

/// A document to upload for chatbot creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub const PDF_CONTENT_TYPE: &'static str = "application/pdf";

    pub fn is_pdf(&self) -> bool {
        self.content_type == Self::PDF_CONTENT_TYPE
    }
}

/// Request body of the create endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationRequest {
    pub documents: Vec<DocumentUpload>,
    pub model: String,
}

/// Server-side estimate for a prospective creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreationEstimate {
    pub total_pages: u32,
    /// Seconds.
    pub estimated_duration: f64,
}

/// Everything gathered from a creation stream so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatbotDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub suggested_prompts: Vec<String>,
    pub chatbot_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered_like_the_stream() {
        assert!(CreationStage::Idle < CreationStage::GotIdentity);
        assert!(CreationStage::GotIdentity < CreationStage::GotIcon);
        assert!(CreationStage::GotIcon < CreationStage::GotPrompts);
        assert!(CreationStage::GotPrompts < CreationStage::Finalized);
    }

    #[test]
    fn payload_stage_mapping() {
        let identity = CreationPayload::Identity {
            title: "t".to_string(),
            description: "d".to_string(),
        };
        assert_eq!(identity.stage(), CreationStage::GotIdentity);
        let done = CreationPayload::Finalized {
            chatbot_id: "abc".to_string(),
        };
        assert_eq!(done.stage(), CreationStage::Finalized);
        assert!(done.stage().is_terminal());
    }

    #[test]
    fn stage_display_from_str_roundtrip() {
        for stage in [
            CreationStage::Idle,
            CreationStage::GotIdentity,
            CreationStage::GotIcon,
            CreationStage::GotPrompts,
            CreationStage::Finalized,
        ] {
            let parsed: CreationStage = stage.to_string().parse().unwrap();
            assert_eq!(parsed, stage);
        }
        assert!("bogus".parse::<CreationStage>().is_err());
    }

    #[test]
    fn stage_steps() {
        assert_eq!(CreationStage::Idle.step(), 0);
        assert_eq!(CreationStage::Finalized.step(), 4);
    }

    #[test]
    fn pdf_detection() {
        let doc = DocumentUpload {
            file_name: "a.pdf".to_string(),
            content_type: DocumentUpload::PDF_CONTENT_TYPE.to_string(),
            bytes: vec![],
        };
        assert!(doc.is_pdf());
    }
}
