//! Shared fixtures: a keyword-count embedder standing in for the ONNX model
//! and scripted providers standing in for the network.
#![allow(dead_code)]

use faqrag::answer::{Assistant, Orchestrator};
use faqrag::config::Config;
use faqrag::embedding::{normalize, EmbeddingError, EmbeddingProvider, VectorIndex};
use faqrag::fallback::LexicalFallback;
use faqrag::llm::{LlmProvider, ProviderChain, ProviderError, ProviderRequest};
use faqrag::retrieval::{Passage, PassageMetadata, Retriever};
use faqrag::server::AppContext;
use faqrag::telemetry::{MetricsAggregator, RequestLog};
use std::path::Path;
use std::sync::{Arc, Mutex};

const TERMS: [&str; 6] = ["giá", "bảo", "hành", "cài", "đặt", "mitek"];

pub const CORPUS_CSV: &str = "url,title,body,tags
https://mitek.vn/bang-gia,Bảng giá phần mềm,Giá phần mềm kế toán từ 5 triệu đồng mỗi năm.,pricing
https://mitek.vn/bao-hanh,Chính sách bảo hành,Thiết bị được bảo hành 12 tháng tại trung tâm Mitek.,support
https://mitek.vn/cai-dat,Hướng dẫn cài đặt,Tải bộ cài và làm theo các bước cài đặt trên màn hình.,howto
";

/// Counts fixed keywords plus a constant bias so no vector is zero
pub struct KeywordEmbedder;

impl EmbeddingProvider for KeywordEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let lowered = text.to_lowercase();
        let mut vector: Vec<f32> = TERMS
            .iter()
            .map(|term| lowered.matches(term).count() as f32)
            .collect();
        vector.push(0.1);
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        TERMS.len() + 1
    }

    fn model_name(&self) -> &str {
        "keyword-stub"
    }
}

pub fn passages() -> Vec<Passage> {
    vec![
        Passage {
            url: "https://mitek.vn/bang-gia".into(),
            title: "Bảng giá phần mềm".into(),
            text: "Giá phần mềm kế toán từ 5 triệu đồng mỗi năm.".into(),
        },
        Passage {
            url: "https://mitek.vn/bao-hanh".into(),
            title: "Chính sách bảo hành".into(),
            text: "Thiết bị được bảo hành 12 tháng tại trung tâm Mitek.".into(),
        },
        Passage {
            url: "https://mitek.vn/cai-dat".into(),
            title: "Hướng dẫn cài đặt".into(),
            text: "Tải bộ cài và làm theo các bước cài đặt trên màn hình.".into(),
        },
    ]
}

/// Index rows for `passages`, embedded and normalized like the index builder
pub fn index_for(passages: &[Passage]) -> VectorIndex {
    let embedder = KeywordEmbedder;
    let rows: Vec<Vec<f32>> = passages
        .iter()
        .map(|p| {
            let mut v = embedder.embed(&format!("passage: {}", p.text)).unwrap();
            normalize(&mut v);
            v
        })
        .collect();
    VectorIndex::from_rows(embedder.dimension(), &rows).unwrap()
}

pub fn retriever() -> Retriever {
    let passages = passages();
    let index = index_for(&passages);
    Retriever::new(
        Arc::new(KeywordEmbedder),
        index,
        PassageMetadata {
            meta: passages,
            model: "keyword-stub".into(),
        },
    )
    .unwrap()
}

/// Provider that replays a fixed result and records every prompt
pub struct ScriptedProvider {
    name: &'static str,
    reply: Option<String>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn generate(&self, request: &ProviderRequest) -> Result<String, ProviderError> {
        self.prompts
            .lock()
            .unwrap()
            .push(request.prompt.to_string());
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => Err(ProviderError::Status {
                provider: self.name,
                status: 503,
                body: "overloaded".into(),
            }),
        }
    }
}

pub fn answering(text: &str) -> (Box<dyn LlmProvider>, Arc<Mutex<Vec<String>>>) {
    scripted("anthropic", Some(text.to_string()))
}

pub fn failing() -> (Box<dyn LlmProvider>, Arc<Mutex<Vec<String>>>) {
    scripted("anthropic", None)
}

fn scripted(
    name: &'static str,
    reply: Option<String>,
) -> (Box<dyn LlmProvider>, Arc<Mutex<Vec<String>>>) {
    let prompts = Arc::new(Mutex::new(Vec::new()));
    (
        Box::new(ScriptedProvider {
            name,
            reply,
            prompts: prompts.clone(),
        }),
        prompts,
    )
}

/// Test configuration rooted in `dir`, with the corpus written out
pub fn config_in(dir: &Path) -> Config {
    let corpus_path = dir.join("faq.csv");
    std::fs::write(&corpus_path, CORPUS_CSV).unwrap();

    let mut config = Config::default();
    config.fallback.corpus_path = corpus_path;
    config.storage.log_path = dir.join("storage").join("log.jsonl");
    config.storage.index_path = dir.join("storage").join("index.bin");
    config.storage.meta_path = dir.join("storage").join("meta.json");
    config.retrieval.top_k = 2;
    config
}

pub fn app_context(dir: &Path, providers: Vec<Box<dyn LlmProvider>>) -> AppContext {
    let config = config_in(dir);
    let chain = ProviderChain::new(providers, config.llm.temperature, config.llm.max_tokens);
    let fallback = LexicalFallback::new(&config.fallback).unwrap();
    let orchestrator = Orchestrator::new(retriever(), chain, fallback, &config.retrieval);

    AppContext::new(
        Assistant::new(orchestrator, RequestLog::new(config.storage.log_path.clone())),
        MetricsAggregator::new(config.storage.log_path.clone()),
    )
}
