//! # Paper Index
//!
//! Chunked paper text with embeddings, persisted in a single SQLite file.
//! A rebuild writes a fresh database next to the live one and renames it
//! into place, so searches see either the old index or the new one.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags};

use super::PaperError;

/// One chunk ready to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedChunk {
    pub document: String,
    pub ordinal: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub document: String,
    pub text: String,
    pub score: f32,
}

/// Split `text` into windows of `size` characters overlapping by `overlap`
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || size == 0 {
        return Vec::new();
    }
    let step = size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + size).min(chars.len());
        let chunk: String = chars[start..end].iter().collect();
        if !chunk.trim().is_empty() {
            chunks.push(chunk);
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

pub struct PaperIndex {
    path: PathBuf,
    /// Serializes rebuilds; searches do not take it
    rebuild_lock: tokio::sync::Mutex<()>,
}

impl PaperIndex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rebuild_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when a persisted index with at least one chunk is present
    pub async fn exists(&self) -> bool {
        self.chunk_count().await.map(|n| n > 0).unwrap_or(false)
    }

    pub async fn chunk_count(&self) -> Result<usize, PaperError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || count_chunks(&path)).await?
    }

    /// Replace the index with `chunks`
    ///
    /// The SQLite writes run on the blocking pool; the rebuild lock is held
    /// across the whole write and rename.
    pub async fn rebuild(&self, chunks: Vec<IndexedChunk>, embedding_model: &str) -> Result<(), PaperError> {
        let _guard = self.rebuild_lock.lock().await;
        let path = self.path.clone();
        let model = embedding_model.to_string();
        let count = chunks.len();

        tokio::task::spawn_blocking(move || write_index(&path, &chunks, &model)).await??;
        tracing::info!(path = %self.path.display(), chunks = count, "Paper index rebuilt");
        Ok(())
    }

    /// The `top_k` chunks most similar to `query`
    pub async fn search(&self, query: Vec<f32>, top_k: usize) -> Result<Vec<ScoredChunk>, PaperError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || rank_chunks(&path, &query, top_k)).await?
    }
}

fn count_chunks(path: &Path) -> Result<usize, PaperError> {
    if !path.exists() {
        return Ok(0);
    }
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
    Ok(count as usize)
}

/// Write a fresh database next to `path` and rename it into place
fn write_index(path: &Path, chunks: &[IndexedChunk], embedding_model: &str) -> Result<(), PaperError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let staging = path.with_extension("db.tmp");
    if staging.exists() {
        std::fs::remove_file(&staging)?;
    }

    {
        let mut conn = Connection::open(&staging)?;
        conn.execute_batch(
            r#"
            CREATE TABLE chunks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                document TEXT NOT NULL,
                ordinal INTEGER NOT NULL,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL
            );
            CREATE TABLE meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO chunks (document, ordinal, text, embedding) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for chunk in chunks {
                stmt.execute(params![
                    chunk.document,
                    chunk.ordinal as i64,
                    chunk.text,
                    encode_embedding(&chunk.embedding)
                ])?;
            }
        }
        tx.execute(
            "INSERT INTO meta (key, value) VALUES ('embedding_model', ?1), ('created_at', ?2)",
            params![embedding_model, chrono::Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
    }

    std::fs::rename(&staging, path)?;
    Ok(())
}

fn rank_chunks(path: &Path, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, PaperError> {
    if !path.exists() {
        return Err(PaperError::NoIndex);
    }
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let mut stmt = conn.prepare("SELECT document, text, embedding FROM chunks")?;
    let mut scored = stmt
        .query_map([], |row| {
            let embedding: Vec<u8> = row.get(2)?;
            Ok(ScoredChunk {
                document: row.get(0)?,
                text: row.get(1)?,
                score: cosine_similarity(query, &decode_embedding(&embedding)),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_k);
    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_text_overlap() {
        let chunks = chunk_text("abcdefghij", 4, 1);
        assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn test_chunk_text_short_and_empty() {
        assert_eq!(chunk_text("short", 3072, 64), vec!["short"]);
        assert!(chunk_text("", 3072, 64).is_empty());
        assert!(chunk_text("   \n  ", 3072, 64).is_empty());
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_embedding_blob_round_trip() {
        let v = vec![0.5f32, -1.25, 3.0];
        assert_eq!(decode_embedding(&encode_embedding(&v)), v);
    }

    #[tokio::test]
    async fn test_rebuild_replaces_and_search_ranks() {
        let dir = tempfile::tempdir().unwrap();
        let index = PaperIndex::new(dir.path().join("storage/index.db"));
        assert!(!index.exists().await);
        assert!(matches!(index.search(vec![1.0], 1).await, Err(PaperError::NoIndex)));

        let first = vec![IndexedChunk {
            document: "old.pdf".into(),
            ordinal: 0,
            text: "old".into(),
            embedding: vec![1.0, 0.0],
        }];
        index.rebuild(first, "test").await.unwrap();
        assert_eq!(index.chunk_count().await.unwrap(), 1);

        let second = vec![
            IndexedChunk {
                document: "a.pdf".into(),
                ordinal: 0,
                text: "about cats".into(),
                embedding: vec![1.0, 0.0],
            },
            IndexedChunk {
                document: "b.pdf".into(),
                ordinal: 0,
                text: "about dogs".into(),
                embedding: vec![0.0, 1.0],
            },
        ];
        index.rebuild(second, "test").await.unwrap();
        assert_eq!(index.chunk_count().await.unwrap(), 2);

        let hits = index.search(vec![0.1, 0.9], 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "about dogs");
        assert!(index.exists().await);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_rebuild_leaves_the_runtime_free() {
        let dir = tempfile::tempdir().unwrap();
        let index = std::sync::Arc::new(PaperIndex::new(dir.path().join("index.db")));
        let chunks: Vec<IndexedChunk> = (0..4000)
            .map(|i| IndexedChunk {
                document: format!("doc{}.pdf", i % 7),
                ordinal: i,
                text: "x".repeat(3072),
                embedding: vec![0.5; 1536],
            })
            .collect();

        let ticks = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let ticker = {
            let ticks = ticks.clone();
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(std::time::Duration::from_millis(1)).await;
                    ticks.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                }
            })
        };

        index.rebuild(chunks, "test").await.unwrap();
        ticker.abort();

        assert_eq!(index.chunk_count().await.unwrap(), 4000);
        assert!(ticks.load(std::sync::atomic::Ordering::SeqCst) > 0);
    }
}
