//! # Research Papers
//!
//! Question answering over arXiv papers. Runs beside the pipelines, not
//! through them: search and download, build an embedding index, answer
//! questions from the closest chunks.
//!
//! ## Modules
//!
//! - `arxiv` - arXiv search and PDF download
//! - `extract` - PDF to text
//! - `embed` - Embedding client
//! - `index` - SQLite-backed chunk index

pub mod arxiv;
pub mod embed;
pub mod extract;
pub mod index;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agents::Worker;
use crate::runtime::{AgentRuntime, ResolvedTask};

pub use arxiv::{sanitize_filename, ArxivClient, ArxivPaper};
pub use embed::{Embedder, OpenAiEmbedder};
pub use extract::{PdfToText, TextExtractor};
pub use index::{chunk_text, IndexedChunk, PaperIndex, ScoredChunk};

pub const DEFAULT_CHUNK_SIZE: usize = 3072;
pub const DEFAULT_CHUNK_OVERLAP: usize = 64;
const DEFAULT_TOP_K: usize = 4;

#[derive(Debug, Error)]
pub enum PaperError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not extract text from {path}: {reason}")]
    Extraction { path: String, reason: String },

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("index storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("index task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("No documents were successfully processed!")]
    NoDocuments,

    #[error("no paper index exists yet; process some papers first")]
    NoIndex,

    #[error("Error chatting with papers: {0}")]
    Chat(String),
}

/// A downloaded paper as reported to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperInfo {
    pub title: String,
    pub filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSummary {
    pub documents: usize,
    pub chunks: usize,
}

pub struct PaperLibrary {
    arxiv: ArxivClient,
    extractor: Arc<dyn TextExtractor>,
    embedder: Arc<dyn Embedder>,
    index: PaperIndex,
    runtime: Arc<dyn AgentRuntime>,
    assistant: Arc<Worker>,
    papers_dir: PathBuf,
    chunk_size: usize,
    chunk_overlap: usize,
    top_k: usize,
}

impl PaperLibrary {
    /// Papers under `<data_dir>/papers`, index at `<data_dir>/storage/index.db`
    pub fn new(
        data_dir: &Path,
        runtime: Arc<dyn AgentRuntime>,
        assistant: Arc<Worker>,
    ) -> Result<Self, PaperError> {
        Ok(Self {
            arxiv: ArxivClient::new()?,
            extractor: Arc::new(PdfToText::new()),
            embedder: Arc::new(OpenAiEmbedder::new()?),
            index: PaperIndex::new(data_dir.join("storage").join("index.db")),
            runtime,
            assistant,
            papers_dir: data_dir.join("papers"),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
        })
    }

    pub fn with_arxiv(mut self, arxiv: ArxivClient) -> Self {
        self.arxiv = arxiv;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn with_chunking(mut self, size: usize, overlap: usize) -> Self {
        self.chunk_size = size;
        self.chunk_overlap = overlap;
        self
    }

    pub fn papers_dir(&self) -> &Path {
        &self.papers_dir
    }

    /// Search arXiv and download every hit; failed downloads are skipped
    pub async fn search_and_download(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<PaperInfo>, PaperError> {
        tokio::fs::create_dir_all(&self.papers_dir).await?;
        let papers = self.arxiv.search(query, max_results).await?;

        let mut downloaded = Vec::with_capacity(papers.len());
        for paper in papers {
            match self.arxiv.download_pdf(&paper, &self.papers_dir).await {
                Ok(_) => downloaded.push(PaperInfo {
                    filename: paper.filename(),
                    title: paper.title,
                }),
                Err(e) => {
                    tracing::warn!(title = %paper.title, error = %e, "Failed to download paper");
                }
            }
        }
        Ok(downloaded)
    }

    /// Extract, chunk and embed the named papers, replacing the index
    pub async fn process(&self, filenames: &[String]) -> Result<ProcessSummary, PaperError> {
        let mut chunks: Vec<(String, usize, String)> = Vec::new();
        let mut documents = 0;

        for filename in filenames {
            let filename = sanitize_filename(filename);
            let path = self.papers_dir.join(&filename);
            let text = match self.extractor.extract(&path).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(file = %filename, error = %e, "Skipping paper");
                    continue;
                }
            };
            if text.trim().is_empty() {
                tracing::warn!(file = %filename, "Paper has no extractable text");
                continue;
            }
            documents += 1;
            for (ordinal, chunk) in chunk_text(&text, self.chunk_size, self.chunk_overlap)
                .into_iter()
                .enumerate()
            {
                chunks.push((filename.clone(), ordinal, chunk));
            }
        }

        if documents == 0 {
            return Err(PaperError::NoDocuments);
        }

        let texts: Vec<String> = chunks.iter().map(|(_, _, text)| text.clone()).collect();
        let embeddings = self.embedder.embed(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(PaperError::Embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let indexed: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|((document, ordinal, text), embedding)| IndexedChunk {
                document,
                ordinal,
                text,
                embedding,
            })
            .collect();
        let chunk_count = indexed.len();
        self.index.rebuild(indexed, self.embedder.model()).await?;

        Ok(ProcessSummary {
            documents,
            chunks: chunk_count,
        })
    }

    /// Answer `query` from the most relevant indexed chunks
    pub async fn chat(&self, query: &str) -> Result<String, PaperError> {
        if !self.index.exists().await {
            return Err(PaperError::NoIndex);
        }
        let query_embedding = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PaperError::Embedding("no embedding returned for query".into()))?;
        let hits = self.index.search(query_embedding, self.top_k).await?;

        let mut description = String::from(
            "Answer the question using the excerpts from the indexed papers below.\n",
        );
        for (i, hit) in hits.iter().enumerate() {
            description.push_str(&format!("\n[{}] {}\n{}\n", i + 1, hit.document, hit.text));
        }
        description.push_str(&format!("\nQuestion: {}", query));

        let task = ResolvedTask {
            stage: "paper_chat".to_string(),
            description,
            expected_output: String::new(),
        };
        self.runtime
            .invoke(&self.assistant, &task)
            .await
            .map_err(|e| PaperError::Chat(format!("{:#}", e)))
    }

    pub async fn index_exists(&self) -> bool {
        self.index.exists().await
    }
}
