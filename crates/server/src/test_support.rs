//! Fixtures for handler and state tests

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use store_assistant_agent::{Capabilities, QueryPipeline, QueryPipelineConfig};
use store_assistant_config::Settings;
use store_assistant_core::{
    LanguageModel, ProductRecord, Result, SpeechToText, TextToSpeech, VoucherRecord,
};
use store_assistant_persistence::{AudioArtifactStore, CatalogSeed, InMemoryCatalog};

use crate::{AppState, CatalogHandle};

pub const SPOKEN_QUESTION: &str = "tôi cần tìm bàn phím ở đâu";
pub const MODEL_ANSWER: &str = "Bàn phím nằm ở Zone 2.";

#[derive(Default)]
pub struct StubModel {
    pub calls: AtomicUsize,
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn complete(&self, _prompt: &str, _max_tokens: usize, _stop: &[String]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(MODEL_ANSWER.to_string())
    }

    fn model_name(&self) -> &str {
        "stub-model"
    }
}

#[derive(Default)]
pub struct StubStt {
    pub calls: AtomicUsize,
}

#[async_trait]
impl SpeechToText for StubStt {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SPOKEN_QUESTION.to_string())
    }

    fn model_name(&self) -> &str {
        "stub-stt"
    }
}

pub struct StubTts;

#[async_trait]
impl TextToSpeech for StubTts {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        Ok(wav_bytes(160))
    }

    fn model_name(&self) -> &str {
        "stub-tts"
    }
}

pub fn wav_bytes(samples: usize) -> Vec<u8> {
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
            writer.write_sample((i % 128) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

pub fn sample_seed() -> CatalogSeed {
    CatalogSeed {
        locations: vec![
            ProductRecord::new("Bàn phím (Keyboard)", "Electronics", 3, 5, "Zone 2"),
            ProductRecord::new("Sữa tươi", "Dairy", 1, 4, "Zone 1"),
        ],
        vouchers: vec![
            VoucherRecord {
                id: 1,
                name: "Giảm giá sữa".to_string(),
                discount: 10.0,
                min_price: 50_000.0,
                expired_date: "2026-12-31".to_string(),
                category: Some("Dairy".to_string()),
            },
            VoucherRecord {
                id: 2,
                name: "Ưu đãi điện tử".to_string(),
                discount: 15.0,
                min_price: 200_000.0,
                expired_date: "2026-12-31".to_string(),
                category: Some("Electronics".to_string()),
            },
        ],
    }
}

/// Server state over stub capabilities, an in-memory catalog and a
/// temporary artifact directory
pub struct TestApp {
    pub state: AppState,
    pub catalog: Arc<InMemoryCatalog>,
    pub artifacts: Arc<AudioArtifactStore>,
    pub model: Arc<StubModel>,
    pub stt: Arc<StubStt>,
    _dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(Settings::default(), Some(sample_seed()))
    }

    pub fn unloaded() -> Self {
        Self::build(Settings::default(), None)
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self::build(settings, Some(sample_seed()))
    }

    fn build(settings: Settings, seed: Option<CatalogSeed>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(match seed {
            Some(seed) => InMemoryCatalog::with_seed(seed),
            None => InMemoryCatalog::new(),
        });
        let artifacts = Arc::new(AudioArtifactStore::open(dir.path().join("audio")).unwrap());
        let model = Arc::new(StubModel::default());
        let stt = Arc::new(StubStt::default());

        let handle = CatalogHandle::Memory(catalog.clone());
        let capabilities = Capabilities {
            store: handle.store(),
            model: model.clone(),
            stt: stt.clone(),
            tts: Arc::new(StubTts),
        };
        let mut config = QueryPipelineConfig::from_settings(&settings.pipeline, &settings.llm);
        config.scratch_dir = Some(dir.path().to_path_buf());

        let pipeline = Arc::new(QueryPipeline::new(capabilities, artifacts.clone(), config));

        Self {
            state: AppState::new(settings, pipeline, handle),
            catalog,
            artifacts,
            model,
            stt,
            _dir: dir,
        }
    }

    pub fn model_calls(&self) -> usize {
        self.model.calls.load(Ordering::SeqCst)
    }

    pub fn stt_calls(&self) -> usize {
        self.stt.calls.load(Ordering::SeqCst)
    }
}
