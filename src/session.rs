//! The process-wide chat session: corpus, index and chat engine, built once.
//!
//! [`SessionHandle`] owns the lifecycle. Callers either wait for the session to be
//! built (`ensure_ready`) or only use it when it already exists (`get`).

use crate::chunking::TextChunker;
use crate::config::{Prompts, Settings};
use crate::corpus::{CorpusAssembler, CorpusSummary};
use crate::document::IngestFailure;
use crate::embedding::{create_embedder, Embedder};
use crate::error::{LegisError, Result};
use crate::extract::TextExtractor;
use crate::index::{IndexBuilder, IndexStats};
use crate::rag::{ChatEngine, ContextBuilder, LanguageModel, OpenAIChatModel};
use crate::vector_store::create_vector_store;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, instrument};

/// A ready-to-query session.
pub struct ChatSession {
    pub engine: ChatEngine,
    pub corpus: CorpusSummary,
    pub index: IndexStats,
    pub failures: Vec<IngestFailure>,
    pub built_at: DateTime<Utc>,
}

/// Builds sessions. A trait so builds can be substituted and counted.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn build(&self) -> Result<ChatSession>;
}

/// Lifecycle of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum IndexState {
    NotReady,
    Building,
    Ready,
    Failed(String),
}

impl std::fmt::Display for IndexState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexState::NotReady => write!(f, "not ready"),
            IndexState::Building => write!(f, "building"),
            IndexState::Ready => write!(f, "ready"),
            IndexState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Snapshot of the session for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    #[serde(flatten)]
    pub state: IndexState,
    pub corpus: Option<CorpusSummary>,
    pub chunks: Option<usize>,
    pub built_at: Option<DateTime<Utc>>,
    pub failures: Vec<IngestFailure>,
}

/// Owns the single session and serializes builds.
pub struct SessionHandle {
    factory: Arc<dyn SessionFactory>,
    current: RwLock<Option<Arc<ChatSession>>>,
    state: RwLock<IndexState>,
    build_lock: Mutex<()>,
}

impl SessionHandle {
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            factory,
            current: RwLock::new(None),
            state: RwLock::new(IndexState::NotReady),
            build_lock: Mutex::new(()),
        }
    }

    /// Return the session, building it first if nobody has yet.
    ///
    /// Concurrent callers wait for the same build. A failed build is retried by the
    /// next caller.
    pub async fn ensure_ready(&self) -> Result<Arc<ChatSession>> {
        if let Some(session) = self.current.read().await.clone() {
            return Ok(session);
        }

        let _guard = self.build_lock.lock().await;
        if let Some(session) = self.current.read().await.clone() {
            return Ok(session);
        }

        self.build_locked().await
    }

    /// Return the session if it has been built. Never starts a build.
    pub async fn get(&self) -> Result<Arc<ChatSession>> {
        self.current.read().await.clone().ok_or(LegisError::NotReady)
    }

    /// Build a new session and swap it in. The old session serves until the swap,
    /// and stays in place if the rebuild fails.
    pub async fn refresh(&self) -> Result<Arc<ChatSession>> {
        let _guard = self.build_lock.lock().await;
        self.build_locked().await
    }

    pub async fn state(&self) -> IndexState {
        self.state.read().await.clone()
    }

    pub async fn status(&self) -> SessionStatus {
        let state = self.state().await;
        match self.current.read().await.as_ref() {
            Some(session) => SessionStatus {
                state,
                corpus: Some(session.corpus.clone()),
                chunks: Some(session.index.chunks),
                built_at: Some(session.built_at),
                failures: session.failures.clone(),
            },
            None => SessionStatus {
                state,
                corpus: None,
                chunks: None,
                built_at: None,
                failures: Vec::new(),
            },
        }
    }

    /// Caller must hold `build_lock`.
    #[instrument(skip(self))]
    async fn build_locked(&self) -> Result<Arc<ChatSession>> {
        *self.state.write().await = IndexState::Building;
        let started = Instant::now();

        match self.factory.build().await {
            Ok(session) => {
                let session = Arc::new(session);
                *self.current.write().await = Some(session.clone());
                *self.state.write().await = IndexState::Ready;
                info!(
                    "Chat session ready in {:.1}s ({} chunks)",
                    started.elapsed().as_secs_f64(),
                    session.index.chunks
                );
                Ok(session)
            }
            Err(e) => {
                let e = LegisError::Build(e.to_string());
                error!("{}", e);
                let previous = self.current.read().await.is_some();
                *self.state.write().await = if previous {
                    IndexState::Ready
                } else {
                    IndexState::Failed(e.to_string())
                };
                Err(e)
            }
        }
    }
}

/// Builds sessions from settings: assemble, index, and wire the chat engine.
pub struct DefaultSessionFactory {
    settings: Settings,
    extractor: Option<Arc<dyn TextExtractor>>,
    embedder: Option<Arc<dyn Embedder>>,
    llm: Option<Arc<dyn LanguageModel>>,
}

impl DefaultSessionFactory {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            extractor: None,
            embedder: None,
            llm: None,
        }
    }

    /// Use a custom text extractor instead of the PDF parser.
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Use a custom embedder instead of the configured provider.
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Use a custom language model instead of OpenAI.
    pub fn with_language_model(mut self, llm: Arc<dyn LanguageModel>) -> Self {
        self.llm = Some(llm);
        self
    }
}

#[async_trait]
impl SessionFactory for DefaultSessionFactory {
    #[instrument(skip(self))]
    async fn build(&self) -> Result<ChatSession> {
        let settings = &self.settings;

        let assembler = match &self.extractor {
            Some(extractor) => CorpusAssembler::with_extractor(settings, extractor.clone())?,
            None => CorpusAssembler::from_settings(settings)?,
        };
        let assembled = assembler.assemble().await;
        let summary = assembled.summary();
        info!(
            "Corpus assembled: {} local, {} from PDFs, {} failures",
            summary.local_documents, summary.remote_documents, summary.failures
        );

        let embedder = match &self.embedder {
            Some(embedder) => embedder.clone(),
            None => create_embedder(settings)?,
        };
        let vector_store = create_vector_store(settings)?;

        let index = IndexBuilder::new(
            TextChunker::from_settings(&settings.chunking),
            embedder.clone(),
            vector_store.clone(),
        )
        .build(assembled.corpus.documents())
        .await?;

        let llm: Arc<dyn LanguageModel> = match &self.llm {
            Some(llm) => llm.clone(),
            None => Arc::new(OpenAIChatModel::from_settings(&settings.rag)?),
        };

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let context_builder = ContextBuilder::new(vector_store, embedder)
            .with_max_chunks(settings.rag.retrieval_top_k())
            .with_min_score(settings.rag.min_score);

        let engine = ChatEngine::new(llm, context_builder, settings.rag.chat_mode)
            .with_prompts(prompts)
            .with_max_history(settings.rag.max_history);

        Ok(ChatSession {
            engine,
            corpus: summary,
            index,
            failures: assembled.failures,
            built_at: Utc::now(),
        })
    }
}
