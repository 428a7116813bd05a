//! Query pipeline orchestrator
//!
//! One invocation walks the stage machine:
//!
//! ```text
//! text:  RECEIVED → KEYWORD_EXTRACTED → CONTEXT_RESOLVED → ANSWER_READY → DONE
//! voice: RECEIVED → TRANSCRIBING → KEYWORD_EXTRACTED → CONTEXT_RESOLVED
//!        → ANSWER_READY → SYNTHESIZING → ARTIFACT_STORED → DONE
//! ```
//!
//! Any stage can end the request with a `PipelineFailure` naming the stage
//! that was being entered. Adapter calls are bounded by per-stage timeouts
//! and never retried. Invocations share nothing but the two stores.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use store_assistant_config::{LlmSettings, PipelineConfig};
use store_assistant_core::{
    Answer, AnswerSource, ArtifactId, Error, ErrorKind, LanguageModel, PipelineStage, ProductStore,
    ResolvedContext, Result, SpeechToText, TextToSpeech, VoiceAnswer,
};
use store_assistant_llm::{AnswerGenerator, AnswerGeneratorConfig};
use store_assistant_persistence::AudioArtifactStore;
use store_assistant_pipeline::{validate_wav, ScratchAudio, SpeechSynthesisAdapter, TranscriptionAdapter};
use store_assistant_rag::ContextAssembler;
use store_assistant_text_processing::KeywordExtractor;

use crate::events::PipelineEvent;

const EVENT_CAPACITY: usize = 256;

// =============================================================================
// Configuration
// =============================================================================

/// Injected capabilities, built once at startup
#[derive(Clone)]
pub struct Capabilities {
    pub store: Arc<dyn ProductStore>,
    pub model: Arc<dyn LanguageModel>,
    pub stt: Arc<dyn SpeechToText>,
    pub tts: Arc<dyn TextToSpeech>,
}

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct QueryPipelineConfig {
    pub transcription_timeout: Duration,
    pub store_timeout: Duration,
    pub generation_timeout: Duration,
    pub synthesis_timeout: Duration,
    /// Return the text answer without audio when synthesis or storage fails
    pub degrade_on_synthesis_failure: bool,
    pub max_audio_bytes: usize,
    pub scratch_dir: Option<PathBuf>,
    pub generator: AnswerGeneratorConfig,
}

impl QueryPipelineConfig {
    pub fn from_settings(pipeline: &PipelineConfig, llm: &LlmSettings) -> Self {
        Self {
            transcription_timeout: Duration::from_millis(pipeline.transcription_timeout_ms),
            store_timeout: Duration::from_millis(pipeline.store_timeout_ms),
            generation_timeout: Duration::from_millis(pipeline.generation_timeout_ms),
            synthesis_timeout: Duration::from_millis(pipeline.synthesis_timeout_ms),
            degrade_on_synthesis_failure: pipeline.degrade_on_synthesis_failure,
            max_audio_bytes: pipeline.max_audio_bytes,
            scratch_dir: pipeline.scratch_dir.as_ref().map(PathBuf::from),
            generator: AnswerGeneratorConfig::from_settings(llm, pipeline),
        }
    }
}

impl Default for QueryPipelineConfig {
    fn default() -> Self {
        Self::from_settings(&PipelineConfig::default(), &LlmSettings::default())
    }
}

// =============================================================================
// Failure
// =============================================================================

/// Terminal failure of one invocation
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{stage} failed: {error}")]
pub struct PipelineFailure {
    pub request_id: Uuid,
    /// Stage being entered when the error occurred
    pub stage: PipelineStage,
    pub error: Error,
    /// Terse answer from the first match, set only for generation failures
    pub fallback_answer: Option<String>,
}

impl PipelineFailure {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

/// Error kind a stage reports when it fails or times out
fn stage_error_kind(stage: PipelineStage) -> ErrorKind {
    match stage {
        PipelineStage::Received | PipelineStage::Done => ErrorKind::InputValidation,
        PipelineStage::Transcribing => ErrorKind::Transcription,
        PipelineStage::KeywordExtracted | PipelineStage::ContextResolved => ErrorKind::StoreUnavailable,
        PipelineStage::AnswerReady => ErrorKind::Generation,
        PipelineStage::Synthesizing => ErrorKind::Synthesis,
        PipelineStage::ArtifactStored => ErrorKind::ArtifactWrite,
    }
}

/// Re-label an error with the kind of the stage it surfaced in
fn at_stage(stage: PipelineStage, error: Error) -> Error {
    let kind = stage_error_kind(stage);
    if error.kind() == kind {
        error
    } else {
        Error::from_kind(kind, error.reason())
    }
}

/// Run `fut` with a deadline; expiry is a "timeout" failure of `stage`
async fn bounded<T>(stage: PipelineStage, limit: Duration, fut: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::from_kind(stage_error_kind(stage), "timeout")),
    }
}

// =============================================================================
// Stage tracking
// =============================================================================

struct StageTracker<'a> {
    request_id: Uuid,
    stage: PipelineStage,
    started: Instant,
    events: &'a broadcast::Sender<PipelineEvent>,
}

impl<'a> StageTracker<'a> {
    fn start(events: &'a broadcast::Sender<PipelineEvent>, voice: bool) -> Self {
        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, voice, "Query received");
        let _ = events.send(PipelineEvent::Started { request_id, voice });
        Self {
            request_id,
            stage: PipelineStage::Received,
            started: Instant::now(),
            events,
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn reach(&mut self, next: PipelineStage) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "stage {} cannot follow {}",
            next,
            self.stage
        );
        self.stage = next;

        let elapsed_ms = self.elapsed_ms();
        tracing::debug!(request_id = %self.request_id, stage = %next, elapsed_ms, "Stage reached");
        let _ = self.events.send(PipelineEvent::StageReached {
            request_id: self.request_id,
            stage: next,
            elapsed_ms,
        });
    }

    fn fail(&self, stage: PipelineStage, error: Error, fallback_answer: Option<String>) -> PipelineFailure {
        let error = at_stage(stage, error);
        tracing::warn!(
            request_id = %self.request_id,
            stage = %stage,
            kind = %error.kind(),
            reason = %error.reason(),
            elapsed_ms = self.elapsed_ms(),
            "Query failed"
        );
        let _ = self.events.send(PipelineEvent::Failed {
            request_id: self.request_id,
            stage,
            kind: error.kind(),
            reason: error.reason().to_string(),
        });
        PipelineFailure {
            request_id: self.request_id,
            stage,
            error,
            fallback_answer,
        }
    }

    fn finish(&mut self, source: AnswerSource) {
        self.reach(PipelineStage::Done);
        let elapsed_ms = self.elapsed_ms();
        tracing::info!(
            request_id = %self.request_id,
            source = source.as_str(),
            elapsed_ms,
            "Query answered"
        );
        let _ = self.events.send(PipelineEvent::Completed {
            request_id: self.request_id,
            source,
            elapsed_ms,
        });
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Query pipeline
pub struct QueryPipeline {
    extractor: KeywordExtractor,
    assembler: ContextAssembler,
    generator: AnswerGenerator,
    transcriber: TranscriptionAdapter,
    synthesizer: SpeechSynthesisAdapter,
    artifacts: Arc<AudioArtifactStore>,
    config: QueryPipelineConfig,
    event_tx: broadcast::Sender<PipelineEvent>,
}

impl QueryPipeline {
    pub fn new(capabilities: Capabilities, artifacts: Arc<AudioArtifactStore>, config: QueryPipelineConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);

        tracing::info!(
            llm = capabilities.model.model_name(),
            stt = capabilities.stt.model_name(),
            tts = capabilities.tts.model_name(),
            degrade_on_synthesis_failure = config.degrade_on_synthesis_failure,
            "Query pipeline ready"
        );

        Self {
            extractor: KeywordExtractor::new(),
            assembler: ContextAssembler::new(capabilities.store),
            generator: AnswerGenerator::new(capabilities.model, config.generator.clone()),
            transcriber: TranscriptionAdapter::new(capabilities.stt),
            synthesizer: SpeechSynthesisAdapter::new(capabilities.tts),
            artifacts,
            config,
            event_tx,
        }
    }

    /// Subscribe to stage events
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.event_tx.subscribe()
    }

    pub fn config(&self) -> &QueryPipelineConfig {
        &self.config
    }

    /// Answer a typed question
    pub async fn resolve_text_query(&self, question: &str) -> std::result::Result<Answer, PipelineFailure> {
        let mut tracker = StageTracker::start(&self.event_tx, false);

        let question = question.trim();
        if question.is_empty() {
            let error = Error::InputValidation("question is empty".to_string());
            return Err(tracker.fail(PipelineStage::Received, error, None));
        }

        let answer = self.answer(&mut tracker, question).await?;
        tracker.finish(answer.source);
        Ok(answer)
    }

    /// Answer a spoken question and store the spoken reply
    ///
    /// `format` is the container the caller declared; only `wav` is accepted.
    pub async fn resolve_voice_query(
        &self,
        audio: &[u8],
        format: &str,
    ) -> std::result::Result<VoiceAnswer, PipelineFailure> {
        let mut tracker = StageTracker::start(&self.event_tx, true);

        let info = validate_wav(audio, format, self.config.max_audio_bytes)
            .map_err(|e| tracker.fail(PipelineStage::Received, e, None))?;
        tracing::debug!(
            request_id = %tracker.request_id,
            sample_rate = info.sample_rate,
            channels = info.channels,
            duration_ms = info.duration_ms(),
            "Voice input accepted"
        );

        // Dropping the guard on cancellation also removes the file
        let scratch = ScratchAudio::write(audio, self.config.scratch_dir.as_deref())
            .map_err(|e| tracker.fail(PipelineStage::Transcribing, e, None))?;
        let transcript = bounded(
            PipelineStage::Transcribing,
            self.config.transcription_timeout,
            self.transcriber.transcribe(&scratch),
        )
        .await;
        scratch.close();
        let transcript = transcript.map_err(|e| tracker.fail(PipelineStage::Transcribing, e, None))?;

        let question = transcript.trim();
        if question.is_empty() {
            let error = Error::Transcription("transcript is empty".to_string());
            return Err(tracker.fail(PipelineStage::Transcribing, error, None));
        }
        tracker.reach(PipelineStage::Transcribing);

        let answer = self.answer(&mut tracker, question).await?;

        let artifact_id = match self.speak(&mut tracker, &answer.text).await {
            Ok(id) => Some(id),
            Err((stage, error)) if self.config.degrade_on_synthesis_failure => {
                tracing::warn!(
                    request_id = %tracker.request_id,
                    stage = %stage,
                    error = %error,
                    "Returning answer without audio"
                );
                None
            }
            Err((stage, error)) => return Err(tracker.fail(stage, error, None)),
        };

        tracker.finish(answer.source);
        Ok(VoiceAnswer {
            transcribed_text: question.to_string(),
            answer_text: answer.text,
            answer_source: answer.source,
            artifact_id,
        })
    }

    /// Keyword, context and answer stages shared by both entry points
    async fn answer(&self, tracker: &mut StageTracker<'_>, question: &str) -> std::result::Result<Answer, PipelineFailure> {
        let keyword = self.extractor.extract(question);
        tracing::debug!(request_id = %tracker.request_id, %keyword, "Keyword extracted");
        tracker.reach(PipelineStage::KeywordExtracted);

        let context = bounded(
            PipelineStage::ContextResolved,
            self.config.store_timeout,
            self.assembler.assemble(&keyword),
        )
        .await
        .map_err(|e| tracker.fail(PipelineStage::ContextResolved, e, None))?;
        tracing::debug!(
            request_id = %tracker.request_id,
            %keyword,
            matches = context.matched_records().len(),
            "Context resolved"
        );
        tracker.reach(PipelineStage::ContextResolved);

        let answer = bounded(
            PipelineStage::AnswerReady,
            self.config.generation_timeout,
            self.generator.generate(question, &context),
        )
        .await
        .map_err(|e| {
            let hint = context.fallback_sentence().map(str::to_string);
            tracker.fail(PipelineStage::AnswerReady, e, hint)
        })?;
        tracker.reach(PipelineStage::AnswerReady);

        Ok(answer)
    }

    /// Synthesis and artifact stages
    async fn speak(&self, tracker: &mut StageTracker<'_>, text: &str) -> std::result::Result<ArtifactId, (PipelineStage, Error)> {
        let audio = bounded(
            PipelineStage::Synthesizing,
            self.config.synthesis_timeout,
            self.synthesizer.synthesize(text),
        )
        .await
        .map_err(|e| (PipelineStage::Synthesizing, e))?;
        tracker.reach(PipelineStage::Synthesizing);

        let artifact = self
            .artifacts
            .create(audio)
            .await
            .map_err(|e| (PipelineStage::ArtifactStored, Error::from(e)))?;
        tracker.reach(PipelineStage::ArtifactStored);

        Ok(artifact.id)
    }

    // -------------------------------------------------------------------------
    // Direct lookups and artifacts
    // -------------------------------------------------------------------------

    /// Catalog lookup for a product name, skipping keyword extraction
    pub async fn locate(&self, product: &str) -> Result<ResolvedContext> {
        let keyword = product.trim().to_lowercase();
        bounded(
            PipelineStage::ContextResolved,
            self.config.store_timeout,
            self.assembler.assemble(&keyword),
        )
        .await
    }

    /// Bytes of a stored spoken answer. Ids that do not parse are `NotFound`.
    pub async fn get_artifact(&self, id: &str) -> Result<Vec<u8>> {
        let id = parse_artifact_id(id)?;
        Ok(self.artifacts.get(&id).await?)
    }

    /// Delete a stored spoken answer
    pub async fn delete_artifact(&self, id: &str) -> Result<ArtifactId> {
        let id = parse_artifact_id(id)?;
        self.artifacts.delete(&id).await?;
        Ok(id)
    }

    /// Delete artifacts older than `age`
    pub async fn purge_artifacts(&self, age: Duration) -> Result<usize> {
        Ok(self.artifacts.purge_older_than(age).await?)
    }
}

fn parse_artifact_id(raw: &str) -> Result<ArtifactId> {
    raw.parse::<ArtifactId>()
        .map_err(|_| Error::NotFound(format!("artifact {:?}", raw)))
}
