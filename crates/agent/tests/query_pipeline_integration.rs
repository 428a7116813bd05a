//! Integration tests for the query pipeline (text and voice entries)
//!
//! Capabilities are call-counting stubs; the catalog is in-memory and the
//! artifact store lives in a temp directory.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use store_assistant_agent::{Capabilities, PipelineEvent, QueryPipeline, QueryPipelineConfig};
use store_assistant_core::{
    AnswerSource, Error, ErrorKind, LanguageModel, PipelineStage, ProductRecord, ProductStore, Result,
    SpeechToText, TextToSpeech, VoucherRecord,
};
use store_assistant_persistence::{AudioArtifactStore, CatalogSeed, InMemoryCatalog};

// =============================================================================
// Stubs
// =============================================================================

struct StubModel {
    reply: Result<String>,
    delay: Duration,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
    /// Directory whose file count is sampled on each completion
    watched_dir: Mutex<Option<PathBuf>>,
    files_during_completion: Mutex<Vec<usize>>,
}

impl StubModel {
    fn replying(text: &str) -> Arc<Self> {
        Self::build(Ok(text.to_string()), Duration::ZERO)
    }

    fn build(reply: Result<String>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply,
            delay,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
            watched_dir: Mutex::new(None),
            files_during_completion: Mutex::new(Vec::new()),
        })
    }

    fn watch(&self, dir: &Path) {
        *self.watched_dir.lock().unwrap() = Some(dir.to_path_buf());
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn complete(&self, prompt: &str, _max_tokens: usize, _stop: &[String]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        if let Some(dir) = self.watched_dir.lock().unwrap().as_deref() {
            self.files_during_completion.lock().unwrap().push(file_count(dir));
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.clone()
    }

    fn model_name(&self) -> &str {
        "stub-llm"
    }
}

struct StubStt {
    reply: Result<String>,
    delay: Duration,
    calls: AtomicUsize,
}

impl StubStt {
    fn new(reply: Result<String>) -> Arc<Self> {
        Self::slow(reply, Duration::ZERO)
    }

    fn slow(reply: Result<String>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply,
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechToText for StubStt {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.clone()
    }

    fn model_name(&self) -> &str {
        "stub-stt"
    }
}

struct StubTts {
    reply: Result<Vec<u8>>,
    calls: AtomicUsize,
}

impl StubTts {
    fn new(reply: Result<Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextToSpeech for StubTts {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }

    fn model_name(&self) -> &str {
        "stub-tts"
    }
}

struct DownStore;

#[async_trait]
impl ProductStore for DownStore {
    async fn find_locations(&self, _query: &str) -> Result<Vec<ProductRecord>> {
        Err(Error::StoreUnavailable("database is locked".to_string()))
    }

    async fn find_vouchers(&self, _query: &str) -> Result<Vec<VoucherRecord>> {
        Err(Error::StoreUnavailable("database is locked".to_string()))
    }
}

// =============================================================================
// Fixture
// =============================================================================

const SPOKEN_REPLY: &[u8] = b"RIFF-spoken-reply";

struct Fixture {
    _dir: TempDir,
    scratch: PathBuf,
    audio: PathBuf,
    model: Arc<StubModel>,
    stt: Arc<StubStt>,
    tts: Arc<StubTts>,
    pipeline: QueryPipeline,
}

struct FixtureBuilder {
    store: Arc<dyn ProductStore>,
    model: Arc<StubModel>,
    stt: Arc<StubStt>,
    tts: Arc<StubTts>,
    config: QueryPipelineConfig,
}

impl FixtureBuilder {
    fn new() -> Self {
        Self {
            store: Arc::new(keyboard_catalog()),
            model: StubModel::replying("Bàn phím nằm ở Zone 2, tọa độ (3, 5)."),
            stt: StubStt::new(Ok("tôi cần tìm bàn phím ở đâu".to_string())),
            tts: StubTts::new(Ok(SPOKEN_REPLY.to_vec())),
            config: QueryPipelineConfig::default(),
        }
    }

    fn store(mut self, store: Arc<dyn ProductStore>) -> Self {
        self.store = store;
        self
    }

    fn model(mut self, model: Arc<StubModel>) -> Self {
        self.model = model;
        self
    }

    fn stt(mut self, stt: Arc<StubStt>) -> Self {
        self.stt = stt;
        self
    }

    fn tts(mut self, tts: Arc<StubTts>) -> Self {
        self.tts = tts;
        self
    }

    fn config(mut self, f: impl FnOnce(&mut QueryPipelineConfig)) -> Self {
        f(&mut self.config);
        self
    }

    fn build(mut self) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("scratch");
        let audio = dir.path().join("audio");
        std::fs::create_dir_all(&scratch).unwrap();

        self.config.scratch_dir = Some(scratch.clone());
        let artifacts = Arc::new(AudioArtifactStore::open(&audio).unwrap());

        let pipeline = QueryPipeline::new(
            Capabilities {
                store: self.store,
                model: self.model.clone(),
                stt: self.stt.clone(),
                tts: self.tts.clone(),
            },
            artifacts,
            self.config,
        );

        Fixture {
            _dir: dir,
            scratch,
            audio,
            model: self.model,
            stt: self.stt,
            tts: self.tts,
            pipeline,
        }
    }
}

fn keyboard_catalog() -> InMemoryCatalog {
    InMemoryCatalog::with_seed(CatalogSeed {
        locations: vec![
            ProductRecord::new("Bàn phím (Keyboard)", "Electronics", 3, 5, "Zone 2"),
            ProductRecord::new("Sữa tươi", "Dairy", 1, 4, "Zone 1"),
        ],
        vouchers: vec![],
    })
}

fn wav_bytes(samples: usize) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..samples {
            writer.write_sample(((i * 37) % 2000) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

// =============================================================================
// Text entry
// =============================================================================

#[tokio::test]
async fn test_text_query_with_match_is_generated() {
    let f = FixtureBuilder::new().build();

    let answer = f.pipeline.resolve_text_query("tôi cần tìm bàn phím ở đâu").await.unwrap();

    assert_eq!(answer.source, AnswerSource::Generated);
    assert_eq!(answer.text, "Bàn phím nằm ở Zone 2, tọa độ (3, 5).");
    assert_eq!(f.model.calls(), 1);

    let prompt = f.model.last_prompt.lock().unwrap().clone().unwrap();
    assert!(prompt.contains("Zone 2"));
    assert!(prompt.contains("Bàn phím (Keyboard)"));
    assert!(!prompt.contains("Sữa tươi"));
}

#[tokio::test]
async fn test_text_query_without_match_falls_back_without_model() {
    let f = FixtureBuilder::new().build();

    let answer = f.pipeline.resolve_text_query("tìm dao cắt bánh").await.unwrap();

    assert_eq!(answer.source, AnswerSource::Fallback);
    assert!(!answer.text.is_empty());
    assert_eq!(f.model.calls(), 0);
}

#[tokio::test]
async fn test_product_named_before_intent_marker_is_generated() {
    let f = FixtureBuilder::new()
        .model(StubModel::replying("Sữa tươi nằm ở Zone 1."))
        .build();

    let answer = f.pipeline.resolve_text_query("sữa tươi mua ở đâu").await.unwrap();

    assert_eq!(answer.source, AnswerSource::Generated);
    assert_eq!(f.model.calls(), 1);
    let prompt = f.model.last_prompt.lock().unwrap().clone().unwrap();
    assert!(prompt.contains("Zone 1"));
    assert!(!prompt.contains("Bàn phím"));
}

#[tokio::test]
async fn test_question_of_only_stop_words_falls_back() {
    let f = FixtureBuilder::new().build();
    let answer = f.pipeline.resolve_text_query("ở đâu vậy?").await.unwrap();
    assert_eq!(answer.source, AnswerSource::Fallback);
    assert_eq!(f.model.calls(), 0);
}

#[tokio::test]
async fn test_blank_question_rejected_at_received() {
    let f = FixtureBuilder::new().build();
    let failure = f.pipeline.resolve_text_query("   ").await.unwrap_err();
    assert_eq!(failure.stage, PipelineStage::Received);
    assert_eq!(failure.kind(), ErrorKind::InputValidation);
}

#[tokio::test]
async fn test_store_outage_is_not_a_fallback() {
    let f = FixtureBuilder::new().store(Arc::new(DownStore)).build();

    let failure = f.pipeline.resolve_text_query("tìm bàn phím").await.unwrap_err();

    assert_eq!(failure.stage, PipelineStage::ContextResolved);
    assert_eq!(failure.kind(), ErrorKind::StoreUnavailable);
    assert_eq!(f.model.calls(), 0);
}

#[tokio::test]
async fn test_generation_failure_carries_fallback_hint() {
    let model = StubModel::build(Err(Error::Generation("model crashed".to_string())), Duration::ZERO);
    let f = FixtureBuilder::new().model(model).build();

    let failure = f.pipeline.resolve_text_query("tìm bàn phím").await.unwrap_err();

    assert_eq!(failure.stage, PipelineStage::AnswerReady);
    assert_eq!(failure.error, Error::Generation("model crashed".to_string()));
    assert_eq!(
        failure.fallback_answer.as_deref(),
        Some("Bàn phím (Keyboard) nằm ở Zone 2, tọa độ (3, 5).")
    );
    assert_eq!(f.model.calls(), 1);
}

#[tokio::test]
async fn test_generation_timeout() {
    let model = StubModel::build(Ok("late".to_string()), Duration::from_secs(5));
    let f = FixtureBuilder::new()
        .model(model)
        .config(|c| c.generation_timeout = Duration::from_millis(50))
        .build();

    let failure = f.pipeline.resolve_text_query("tìm bàn phím").await.unwrap_err();

    assert_eq!(failure.stage, PipelineStage::AnswerReady);
    assert_eq!(failure.error, Error::Generation("timeout".to_string()));
}

#[tokio::test]
async fn test_text_events_follow_stage_order() {
    let f = FixtureBuilder::new().build();
    let mut events = f.pipeline.subscribe();

    f.pipeline.resolve_text_query("tìm bàn phím").await.unwrap();

    let mut stages = Vec::new();
    let mut completed = false;
    while let Ok(event) = events.try_recv() {
        match event {
            PipelineEvent::StageReached { stage, .. } => stages.push(stage),
            PipelineEvent::Completed { source, .. } => {
                assert_eq!(source, AnswerSource::Generated);
                completed = true;
            }
            PipelineEvent::Failed { .. } => panic!("unexpected failure event"),
            PipelineEvent::Started { voice, .. } => assert!(!voice),
        }
    }

    assert!(completed);
    assert_eq!(
        stages,
        vec![
            PipelineStage::KeywordExtracted,
            PipelineStage::ContextResolved,
            PipelineStage::AnswerReady,
            PipelineStage::Done,
        ]
    );
}

#[tokio::test]
async fn test_concurrent_text_queries() {
    let f = Arc::new(FixtureBuilder::new().build());

    let mut tasks = Vec::new();
    for i in 0..16 {
        let f = f.clone();
        tasks.push(tokio::spawn(async move {
            let question = if i % 2 == 0 { "tìm bàn phím" } else { "tìm dao cắt bánh" };
            f.pipeline.resolve_text_query(question).await
        }));
    }

    for (i, task) in tasks.into_iter().enumerate() {
        let answer = task.await.unwrap().unwrap();
        let expected = if i % 2 == 0 { AnswerSource::Generated } else { AnswerSource::Fallback };
        assert_eq!(answer.source, expected);
    }
    assert_eq!(f.model.calls(), 8);
}

// =============================================================================
// Voice entry
// =============================================================================

#[tokio::test]
async fn test_voice_query_end_to_end() {
    let f = FixtureBuilder::new().build();

    let answer = f.pipeline.resolve_voice_query(&wav_bytes(1600), "wav").await.unwrap();

    assert_eq!(answer.transcribed_text, "tôi cần tìm bàn phím ở đâu");
    assert_eq!(answer.answer_source, AnswerSource::Generated);
    let id = answer.artifact_id.expect("artifact stored");

    let audio = f.pipeline.get_artifact(&id.to_string()).await.unwrap();
    assert_eq!(audio, SPOKEN_REPLY);
    assert_eq!(file_count(&f.scratch), 0);
    assert_eq!(f.tts.calls(), 1);
}

#[tokio::test]
async fn test_fallback_answers_are_spoken_too() {
    let stt = StubStt::new(Ok("tìm dao cắt bánh".to_string()));
    let f = FixtureBuilder::new().stt(stt).build();

    let answer = f.pipeline.resolve_voice_query(&wav_bytes(800), "WAV").await.unwrap();

    assert_eq!(answer.answer_source, AnswerSource::Fallback);
    assert!(answer.artifact_id.is_some());
    assert_eq!(f.model.calls(), 0);
}

#[tokio::test]
async fn test_non_wav_rejected_before_transcription() {
    let f = FixtureBuilder::new().build();

    let failure = f.pipeline.resolve_voice_query(&wav_bytes(800), "mp3").await.unwrap_err();
    assert_eq!(failure.stage, PipelineStage::Received);
    assert_eq!(failure.kind(), ErrorKind::InputValidation);

    let failure = f
        .pipeline
        .resolve_voice_query(b"ID3\x03\x00 definitely not riff", "wav")
        .await
        .unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::InputValidation);

    let failure = f.pipeline.resolve_voice_query(&[], "wav").await.unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::InputValidation);

    assert_eq!(f.stt.calls(), 0);
    assert_eq!(file_count(&f.scratch), 0);
}

#[tokio::test]
async fn test_oversized_upload_rejected() {
    let f = FixtureBuilder::new().config(|c| c.max_audio_bytes = 256).build();
    let failure = f.pipeline.resolve_voice_query(&wav_bytes(1600), "wav").await.unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::InputValidation);
    assert_eq!(f.stt.calls(), 0);
}

#[tokio::test]
async fn test_transcription_failure_cleans_scratch_and_stores_nothing() {
    let stt = StubStt::new(Err(Error::Transcription("decoder crashed".to_string())));
    let f = FixtureBuilder::new().stt(stt).build();

    let failure = f.pipeline.resolve_voice_query(&wav_bytes(1600), "wav").await.unwrap_err();

    assert_eq!(failure.stage, PipelineStage::Transcribing);
    assert_eq!(failure.error, Error::Transcription("decoder crashed".to_string()));
    assert_eq!(f.stt.calls(), 1);
    assert_eq!(file_count(&f.scratch), 0);
    assert_eq!(file_count(&f.audio), 0);
    assert_eq!(f.model.calls(), 0);
    assert_eq!(f.tts.calls(), 0);
}

#[tokio::test]
async fn test_scratch_removed_before_generation() {
    let f = FixtureBuilder::new().build();
    f.model.watch(&f.scratch);

    let answer = f.pipeline.resolve_voice_query(&wav_bytes(1600), "wav").await.unwrap();

    assert_eq!(answer.answer_source, AnswerSource::Generated);
    assert_eq!(*f.model.files_during_completion.lock().unwrap(), vec![0]);
}

#[tokio::test]
async fn test_cancelled_voice_query_cleans_scratch() {
    let stt = StubStt::slow(Ok("tìm bàn phím".to_string()), Duration::from_secs(5));
    let f = FixtureBuilder::new().stt(stt).build();

    let audio = wav_bytes(1600);
    let outcome = tokio::time::timeout(
        Duration::from_millis(100),
        f.pipeline.resolve_voice_query(&audio, "wav"),
    )
    .await;

    assert!(outcome.is_err(), "request should still be transcribing");
    assert_eq!(f.stt.calls(), 1);
    assert_eq!(file_count(&f.scratch), 0);
    assert_eq!(file_count(&f.audio), 0);
    assert_eq!(f.model.calls(), 0);
}

#[tokio::test]
async fn test_empty_transcript_is_transcription_failure() {
    let stt = StubStt::new(Ok("  ".to_string()));
    let f = FixtureBuilder::new().stt(stt).build();

    let failure = f.pipeline.resolve_voice_query(&wav_bytes(1600), "wav").await.unwrap_err();

    assert_eq!(failure.stage, PipelineStage::Transcribing);
    assert_eq!(failure.kind(), ErrorKind::Transcription);
    assert_eq!(file_count(&f.scratch), 0);
}

#[tokio::test]
async fn test_synthesis_failure_is_strict_by_default() {
    let tts = StubTts::new(Err(Error::Synthesis("voice not found".to_string())));
    let f = FixtureBuilder::new().tts(tts).build();

    let failure = f.pipeline.resolve_voice_query(&wav_bytes(1600), "wav").await.unwrap_err();

    assert_eq!(failure.stage, PipelineStage::Synthesizing);
    assert_eq!(failure.kind(), ErrorKind::Synthesis);
    assert_eq!(file_count(&f.audio), 0);
    assert_eq!(file_count(&f.scratch), 0);
}

#[tokio::test]
async fn test_empty_synthesis_output_fails() {
    let f = FixtureBuilder::new().tts(StubTts::new(Ok(Vec::new()))).build();
    let failure = f.pipeline.resolve_voice_query(&wav_bytes(1600), "wav").await.unwrap_err();
    assert_eq!(failure.stage, PipelineStage::Synthesizing);
}

#[tokio::test]
async fn test_synthesis_failure_degrades_when_configured() {
    let tts = StubTts::new(Err(Error::Synthesis("voice not found".to_string())));
    let f = FixtureBuilder::new()
        .tts(tts)
        .config(|c| c.degrade_on_synthesis_failure = true)
        .build();

    let answer = f.pipeline.resolve_voice_query(&wav_bytes(1600), "wav").await.unwrap();

    assert_eq!(answer.answer_source, AnswerSource::Generated);
    assert!(answer.artifact_id.is_none());
    assert_eq!(file_count(&f.scratch), 0);
}

#[tokio::test]
async fn test_artifact_write_failure_is_strict_by_default() {
    let f = FixtureBuilder::new().build();
    std::fs::remove_dir_all(&f.audio).unwrap();

    let failure = f.pipeline.resolve_voice_query(&wav_bytes(1600), "wav").await.unwrap_err();

    assert_eq!(failure.stage, PipelineStage::ArtifactStored);
    assert_eq!(failure.kind(), ErrorKind::ArtifactWrite);
    assert_eq!(f.tts.calls(), 1);
    assert_eq!(file_count(&f.scratch), 0);
}

#[tokio::test]
async fn test_artifact_write_failure_degrades_when_configured() {
    let f = FixtureBuilder::new()
        .config(|c| c.degrade_on_synthesis_failure = true)
        .build();
    std::fs::remove_dir_all(&f.audio).unwrap();
    let mut events = f.pipeline.subscribe();

    let answer = f.pipeline.resolve_voice_query(&wav_bytes(1600), "wav").await.unwrap();

    assert_eq!(answer.answer_source, AnswerSource::Generated);
    assert_eq!(answer.answer_text, "Bàn phím nằm ở Zone 2, tọa độ (3, 5).");
    assert!(answer.artifact_id.is_none());
    assert_eq!(file_count(&f.scratch), 0);

    let mut stages = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let PipelineEvent::StageReached { stage, .. } = event {
            stages.push(stage);
        }
    }
    assert!(stages.contains(&PipelineStage::Synthesizing));
    assert!(!stages.contains(&PipelineStage::ArtifactStored));
    assert_eq!(stages.last(), Some(&PipelineStage::Done));
}

// =============================================================================
// Artifacts
// =============================================================================

#[tokio::test]
async fn test_delete_then_get_and_delete_again_not_found() {
    let f = FixtureBuilder::new().build();
    let id = f
        .pipeline
        .resolve_voice_query(&wav_bytes(1600), "wav")
        .await
        .unwrap()
        .artifact_id
        .unwrap()
        .to_string();

    assert_eq!(f.pipeline.delete_artifact(&id).await.unwrap().to_string(), id);
    assert!(matches!(f.pipeline.get_artifact(&id).await, Err(Error::NotFound(_))));
    assert!(matches!(f.pipeline.delete_artifact(&id).await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_malformed_artifact_ids_are_not_found() {
    let f = FixtureBuilder::new().build();
    for id in ["../etc/passwd", "output_x.wav", "", "not-a-uuid"] {
        assert!(matches!(f.pipeline.get_artifact(id).await, Err(Error::NotFound(_))), "{id:?}");
        assert!(matches!(f.pipeline.delete_artifact(id).await, Err(Error::NotFound(_))), "{id:?}");
    }
}

#[tokio::test]
async fn test_purge_removes_old_artifacts() {
    let f = FixtureBuilder::new().build();
    f.pipeline.resolve_voice_query(&wav_bytes(1600), "wav").await.unwrap();
    f.pipeline.resolve_voice_query(&wav_bytes(1600), "wav").await.unwrap();
    assert_eq!(file_count(&f.audio), 2);

    assert_eq!(f.pipeline.purge_artifacts(Duration::from_secs(3600)).await.unwrap(), 0);
    assert_eq!(f.pipeline.purge_artifacts(Duration::ZERO).await.unwrap(), 2);
    assert_eq!(file_count(&f.audio), 0);
}

#[tokio::test]
async fn test_locate_skips_keyword_extraction() {
    let f = FixtureBuilder::new().build();

    let context = f.pipeline.locate("Bàn Phím").await.unwrap();
    assert_eq!(context.matched_records().len(), 1);
    assert_eq!(context.matched_records()[0].zone, "Zone 2");

    assert!(f.pipeline.locate("dao cắt bánh").await.unwrap().is_empty());
    assert_eq!(f.model.calls(), 0);
}
