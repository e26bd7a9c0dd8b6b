//! Chatbot creation service.
//!
//! Validates uploads, asks the backend for an estimate, then drives the
//! creation stream through the JSON object decoder and the stage machine.
//! When the chatbot is finalized the account data is refreshed once so the
//! new chatbot shows up in the catalog.

use std::sync::Arc;

use futures_util::Stream;
use secrecy::SecretString;
use tracing::{info, warn};

use docutalk_types::account::UserProfile;
use docutalk_types::config::CreationLimits;
use docutalk_types::creation::{
    CreationEstimate, CreationEvent, CreationRequest, CreationStage, DocumentUpload,
    StageTransition,
};
use docutalk_types::error::ClientError;
use docutalk_types::stream::CreditNotice;

use crate::backend::ChatbotBackend;
use crate::creation::CreationProgress;
use crate::credits::{refresh_account, spawn_refetch, CreditLedger};
use crate::stream::{JsonObjectStreamDecoder, JsonStreamItem};

/// Check an upload set against the creation limits.
pub fn validate_documents(
    documents: &[DocumentUpload],
    limits: &CreationLimits,
) -> Result<(), ClientError> {
    if documents.is_empty() {
        return Err(ClientError::InvalidRequest(
            "at least one document is required".to_string(),
        ));
    }
    if documents.len() > limits.max_files {
        return Err(ClientError::InvalidRequest(format!(
            "too many documents: {} (maximum {})",
            documents.len(),
            limits.max_files
        )));
    }
    if let Some(doc) = documents.iter().find(|d| !d.is_pdf()) {
        return Err(ClientError::InvalidRequest(format!(
            "{} is not a PDF ({})",
            doc.file_name, doc.content_type
        )));
    }
    Ok(())
}

/// Drives chatbot creation for one user.
pub struct CreationService<B: ChatbotBackend> {
    backend: Arc<B>,
    token: Arc<SecretString>,
    ledger: CreditLedger,
    limits: CreationLimits,
    model: String,
    progress: CreationProgress,
    profile: Option<UserProfile>,
}

impl<B: ChatbotBackend + 'static> CreationService<B> {
    pub fn new(
        backend: Arc<B>,
        token: Arc<SecretString>,
        ledger: CreditLedger,
        limits: CreationLimits,
        model: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            token,
            ledger,
            limits,
            model: model.into(),
            progress: CreationProgress::new(),
            profile: None,
        }
    }

    pub fn progress(&self) -> &CreationProgress {
        &self.progress
    }

    /// Profile fetched by the post-finalization refresh, if it ran.
    pub fn refreshed_profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn current_remaining_credits(&self) -> Option<i64> {
        self.ledger.remaining()
    }

    /// Validate the documents and fetch the page and duration estimate.
    ///
    /// Fails with `InvalidRequest` when the page total exceeds the limit.
    pub async fn estimate(&self, documents: &[DocumentUpload]) -> Result<CreationEstimate, ClientError> {
        validate_documents(documents, &self.limits)?;
        let request = self.request(documents.to_vec());
        let estimate = self.backend.estimate_creation(&self.token, &request).await?;
        if estimate.total_pages > self.limits.max_pages {
            return Err(ClientError::InvalidRequest(format!(
                "documents have {} pages (maximum {})",
                estimate.total_pages, self.limits.max_pages
            )));
        }
        Ok(estimate)
    }

    /// Upload the documents and stream creation progress.
    ///
    /// Every decoded object is surfaced as a [`CreationEvent`], duplicates
    /// and unknown shapes included. The first transition to `Finalized`
    /// refreshes the profile and credits before its event is yielded.
    pub fn start_creation(
        &mut self,
        documents: Vec<DocumentUpload>,
    ) -> impl Stream<Item = Result<CreationEvent, ClientError>> + Send + '_ {
        async_stream::try_stream! {
            validate_documents(&documents, &self.limits)?;
            self.progress = CreationProgress::new();
            self.profile = None;

            let request = self.request(documents);
            info!(documents = request.documents.len(), model = %request.model, "starting chatbot creation");
            let body = self.backend.create_chatbot(&self.token, &request).await?;
            let mut decoder = JsonObjectStreamDecoder::new(body);

            while let Some(item) = decoder.next_item().await? {
                match item {
                    JsonStreamItem::Object(object) => {
                        let event = self.progress.observe(object);
                        if reached_finalized(&event) {
                            self.refresh_after_finalize().await;
                        }
                        yield event;
                    }
                    JsonStreamItem::Credit(notice) => {
                        self.on_credit_notice(&notice);
                        yield CreationEvent::CreditNotice(notice);
                    }
                }
            }

            if !self.progress.is_finalized() {
                warn!(stage = %self.progress.stage(), "creation stream ended before finalization");
            }
        }
    }

    fn request(&self, documents: Vec<DocumentUpload>) -> CreationRequest {
        CreationRequest {
            documents,
            model: self.model.clone(),
        }
    }

    async fn refresh_after_finalize(&mut self) {
        match refresh_account(&*self.backend, &self.token, &self.ledger).await {
            Ok(profile) => self.profile = Some(profile),
            Err(e) => warn!(error = %e, "account refresh after creation failed"),
        }
    }

    fn on_credit_notice(&self, notice: &CreditNotice) {
        self.ledger.apply_notice(notice);
        spawn_refetch(self.backend.clone(), self.token.clone(), self.ledger.clone());
    }
}

fn reached_finalized(event: &CreationEvent) -> bool {
    matches!(
        event,
        CreationEvent::Stage {
            transition: StageTransition::Advanced {
                to: CreationStage::Finalized,
                ..
            },
            ..
        }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedBackend, CREDIT_FRAME};
    use docutalk_types::creation::CreationPayload;
    use futures_util::StreamExt;

    fn pdf(name: &str) -> DocumentUpload {
        DocumentUpload {
            file_name: name.to_string(),
            content_type: DocumentUpload::PDF_CONTENT_TYPE.to_string(),
            bytes: b"%PDF-1.7".to_vec(),
        }
    }

    fn new_service(backend: ScriptedBackend) -> (CreationService<ScriptedBackend>, Arc<ScriptedBackend>) {
        let backend = Arc::new(backend);
        let service = CreationService::new(
            backend.clone(),
            Arc::new(SecretString::from("t")),
            CreditLedger::new(1000.0),
            CreationLimits::default(),
            "gemini-2.0-flash-001",
        );
        (service, backend)
    }

    async fn run(
        service: &mut CreationService<ScriptedBackend>,
        documents: Vec<DocumentUpload>,
    ) -> Result<Vec<CreationEvent>, ClientError> {
        let stream = service.start_creation(documents);
        futures_util::pin_mut!(stream);
        let mut events = Vec::new();
        while let Some(event) = stream.next().await {
            events.push(event?);
        }
        Ok(events)
    }

    #[test]
    fn validation_rules() {
        let limits = CreationLimits::default();
        assert!(validate_documents(&[], &limits).is_err());
        assert!(validate_documents(&[pdf("a.pdf")], &limits).is_ok());

        let too_many: Vec<_> = (0..21).map(|i| pdf(&format!("{i}.pdf"))).collect();
        assert!(validate_documents(&too_many, &limits).is_err());

        let text = DocumentUpload {
            file_name: "notes.txt".to_string(),
            content_type: "text/plain".to_string(),
            bytes: vec![],
        };
        let err = validate_documents(&[pdf("a.pdf"), text], &limits).unwrap_err();
        assert!(err.to_string().contains("notes.txt"));
    }

    #[tokio::test]
    async fn estimate_enforces_page_limit() {
        let mut backend = ScriptedBackend::new();
        backend.estimate.total_pages = 201;
        let (service, _) = new_service(backend);
        let err = service.estimate(&[pdf("big.pdf")]).await.unwrap_err();
        assert!(err.to_string().contains("201 pages"));

        let (service, _) = new_service(ScriptedBackend::new());
        let estimate = service.estimate(&[pdf("small.pdf")]).await.unwrap();
        assert_eq!(estimate.total_pages, 12);
    }

    #[tokio::test]
    async fn full_creation_with_interleaved_credits() {
        let identity = r#"{"title": "Manual {v2}", "description": "Says \"}\" a lot"}"#;
        let icon = r#"{"icon": "aWNvbg=="}"#;
        let prompts = r#"{"suggested_prompts": ["How?", "Why {not}?"]}"#;
        let done = r#"{"chatbot_id": "bot-42"}"#;
        let body = format!("{identity}{CREDIT_FRAME}{icon}{CREDIT_FRAME}{prompts}{done}");
        // Feed in awkward 5-byte chunks.
        let chunks: Vec<String> = body
            .as_bytes()
            .chunks(5)
            .map(|c| String::from_utf8(c.to_vec()).unwrap())
            .collect();
        let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();

        let backend = ScriptedBackend::new().with_creation_chunks(&refs);
        let (mut service, backend) = new_service(backend);
        let events = run(&mut service, vec![pdf("manual.pdf")]).await.unwrap();

        let stages: Vec<CreationStage> = events
            .iter()
            .filter_map(|e| match e {
                CreationEvent::Stage {
                    transition: StageTransition::Advanced { to, .. },
                    ..
                } => Some(*to),
                _ => None,
            })
            .collect();
        assert_eq!(
            stages,
            vec![
                CreationStage::GotIdentity,
                CreationStage::GotIcon,
                CreationStage::GotPrompts,
                CreationStage::Finalized,
            ]
        );
        let credit_events = events
            .iter()
            .filter(|e| matches!(e, CreationEvent::CreditNotice(_)))
            .count();
        assert_eq!(credit_events, 2);

        let draft = service.progress().draft();
        assert_eq!(draft.title.as_deref(), Some("Manual {v2}"));
        assert_eq!(draft.suggested_prompts, vec!["How?", "Why {not}?"]);
        assert_eq!(draft.chatbot_id.as_deref(), Some("bot-42"));

        // One refresh after finalization.
        assert_eq!(backend.calls("fetch_profile"), 1);
        assert!(service.refreshed_profile().is_some());
    }

    #[tokio::test]
    async fn duplicate_after_finalized_is_surfaced_without_second_refresh() {
        let backend = ScriptedBackend::new().with_creation_chunks(&[
            r#"{"chatbot_id": "a"}"#,
            r#"{"chatbot_id": "b"}{"unexpected": true}"#,
        ]);
        let (mut service, backend) = new_service(backend);
        let events = run(&mut service, vec![pdf("x.pdf")]).await.unwrap();

        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[1],
            CreationEvent::Stage {
                payload: CreationPayload::Finalized { .. },
                transition: StageTransition::Duplicate {
                    current: CreationStage::Finalized
                },
            }
        ));
        assert!(matches!(
            &events[2],
            CreationEvent::UnknownStagePayload { .. }
        ));
        assert_eq!(service.progress().draft().chatbot_id.as_deref(), Some("a"));
        assert_eq!(backend.calls("fetch_profile"), 1);
    }

    #[tokio::test]
    async fn invalid_documents_never_reach_the_backend() {
        let (mut service, backend) = new_service(ScriptedBackend::new());
        let err = run(&mut service, Vec::new()).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
        assert_eq!(backend.calls("create_chatbot"), 0);
    }

    #[tokio::test]
    async fn refresh_failure_does_not_abort_the_stream() {
        let backend = ScriptedBackend::new()
            .failing("fetch_profile")
            .with_creation_chunks(&[r#"{"chatbot_id": "z"}"#]);
        let (mut service, _) = new_service(backend);
        let events = run(&mut service, vec![pdf("x.pdf")]).await.unwrap();
        assert_eq!(events.len(), 1);
        assert!(service.progress().is_finalized());
        assert!(service.refreshed_profile().is_none());
    }
}
