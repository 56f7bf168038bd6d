//! Vector store population.
//!
//! Reference tables (FAQ, campus map, locker and servery hours) and handbook
//! PDFs become documents tagged with the `tool` that retrieves them, get
//! split into chunks, embedded and written in batches.

pub mod pdf;
pub mod splitter;

use crate::schedules::time_range;
use pdf::HandbookChunking;
use splitter::RecursiveSplitter;
use std::sync::Arc;
use tracing::{error, info, warn};
use unibot_core::{
    config::IngestConfig,
    document::Document,
    error::UnibotError,
    traits::{Embedder, VectorStore},
};
use unibot_knowledge::{
    FaqEntry, HandbookCatalog, KnowledgeStore, Location, LockerRow, ServeryRow,
};

/// Reference tables as loaded from Postgres.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub faq: Vec<FaqEntry>,
    pub locations: Vec<Location>,
    pub lockers: Vec<LockerRow>,
    pub serveries: Vec<ServeryRow>,
}

impl ReferenceData {
    pub async fn load(store: &KnowledgeStore) -> Result<Self, UnibotError> {
        Ok(Self {
            faq: store.load_faq_answers().await?,
            locations: store.load_campus_map().await?,
            lockers: store.load_locker_rows().await?,
            serveries: store.load_servery_rows().await?,
        })
    }
}

fn or_unknown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("Unknown")
}

fn hours(start: &Option<String>, end: &Option<String>) -> String {
    time_range(start.as_deref(), end.as_deref())
}

/// One document per FAQ entry, location, locker slot and servery slot.
pub fn reference_documents(data: &ReferenceData) -> Vec<Document> {
    let mut documents = Vec::new();

    for entry in &data.faq {
        documents.push(
            Document::new(format!("Question: {}\nAnswer: {}", entry.question, entry.answer))
                .with_meta("type", "faq")
                .with_meta("question", entry.question.as_str())
                .with_meta("tool", "qa"),
        );
    }

    for loc in &data.locations {
        let mut content = format!("Location: {}\n", loc.name);
        if !loc.tags.is_empty() {
            content.push_str(&format!("Features: {}\n", loc.tags.join(", ")));
        }
        if !loc.aliases.is_empty() {
            content.push_str(&format!("Also known as: {}\n", loc.aliases.join(", ")));
        }
        content.push_str(&format!(
            "Address: {}",
            loc.address.as_deref().unwrap_or("Unknown")
        ));
        documents.push(
            Document::new(content)
                .with_meta("type", "location")
                .with_meta("name", loc.name.as_str())
                .with_meta("id", loc.id)
                .with_meta("tool", "location"),
        );
    }

    for row in &data.lockers {
        let (college, day, basement) = (
            or_unknown(&row.college),
            or_unknown(&row.day),
            or_unknown(&row.basement),
        );
        documents.push(
            Document::new(format!(
                "Locker access for {college}, {day}, Basement {basement}: {}",
                hours(&row.start_time, &row.end_time)
            ))
            .with_meta("type", "locker")
            .with_meta("college", college)
            .with_meta("day", day)
            .with_meta("basement", basement)
            .with_meta("tool", "locker"),
        );
    }

    for row in &data.serveries {
        let (college, day, meal) = (
            or_unknown(&row.college),
            or_unknown(&row.day),
            or_unknown(&row.meal_type),
        );
        documents.push(
            Document::new(format!(
                "Servery hours for {college}, {day}, {meal}: {}",
                hours(&row.start_time, &row.end_time)
            ))
            .with_meta("type", "servery")
            .with_meta("college", college)
            .with_meta("day", day)
            .with_meta("meal_type", meal)
            .with_meta("tool", "servery"),
        );
    }

    documents
}

/// Outcome of an ingest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub documents: usize,
    pub inserted: u64,
    pub failed_batches: usize,
}

/// Embeds documents and writes them to the vector store.
pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    handbooks: Option<Arc<dyn HandbookCatalog>>,
    config: IngestConfig,
}

impl Ingestor {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        handbooks: Option<Arc<dyn HandbookCatalog>>,
        config: IngestConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            handbooks,
            config,
        }
    }

    fn splitter(&self) -> RecursiveSplitter {
        RecursiveSplitter::new(self.config.chunk_size, self.config.chunk_overlap)
    }

    /// Documents from every handbook in the catalog. A handbook that fails to
    /// download or parse is logged and skipped.
    pub async fn handbook_documents(&self) -> Result<Vec<Document>, UnibotError> {
        let Some(catalog) = &self.handbooks else {
            warn!("handbook storage not configured, skipping handbooks");
            return Ok(Vec::new());
        };

        let handbooks = catalog.list_handbooks().await?;
        info!("Processing {} handbooks...", handbooks.len());

        let chunking = HandbookChunking {
            chunk_size: self.config.chunk_size,
            overlap: self.config.chunk_overlap,
            min_chars: self.config.min_chunk_chars,
        };
        let mut documents = Vec::new();
        for handbook in handbooks.iter().filter(|h| !h.url.is_empty()) {
            let text = match catalog.download(&handbook.url).await {
                Ok(bytes) => pdf::extract_text(&bytes),
                Err(e) => Err(e),
            };
            match text {
                Ok(text) => {
                    let docs = pdf::handbook_documents(handbook, &text, chunking);
                    info!("Processed {} into {} documents", handbook.file_name, docs.len());
                    documents.extend(docs);
                }
                Err(e) => error!("error processing {}: {e}", handbook.file_name),
            }
        }
        Ok(documents)
    }

    /// Every reference document plus the handbooks.
    pub async fn build_documents(&self, data: &ReferenceData) -> Vec<Document> {
        let mut documents = reference_documents(data);
        info!(
            "Loaded {} FAQ entries, {} locations, {} locker and {} servery records",
            data.faq.len(),
            data.locations.len(),
            data.lockers.len(),
            data.serveries.len()
        );
        match self.handbook_documents().await {
            Ok(handbook_docs) => {
                info!("Loaded {} handbook documents", handbook_docs.len());
                documents.extend(handbook_docs);
            }
            Err(e) => error!("error in handbook processing: {e}"),
        }
        documents
    }

    /// Rebuild the store from reference data and handbooks. `reset` empties it
    /// first; otherwise documents are appended.
    pub async fn ingest_all(
        &self,
        data: &ReferenceData,
        reset: bool,
    ) -> Result<IngestReport, UnibotError> {
        if reset {
            self.store.reset().await?;
        }
        let documents = self.build_documents(data).await;
        let chunks = self.splitter().split_documents(&documents);
        info!("Created {} document chunks", chunks.len());
        Ok(self.insert(&chunks, self.config.batch_size).await)
    }

    /// Replace only the handbook documents.
    pub async fn ingest_handbooks(&self) -> Result<IngestReport, UnibotError> {
        let documents = self.handbook_documents().await?;
        let removed = self.store.delete_by_tool("handbook").await?;
        info!("Removed {removed} existing handbook documents");
        let chunks = self.splitter().split_documents(&documents);
        Ok(self.insert(&chunks, self.config.handbook_batch_size).await)
    }

    async fn insert(&self, documents: &[Document], batch_size: usize) -> IngestReport {
        let batch_size = batch_size.max(1);
        let batches = documents.len().div_ceil(batch_size);
        let mut report = IngestReport {
            documents: documents.len(),
            ..Default::default()
        };
        info!(
            "Adding {} documents to vector store in batches of {batch_size}...",
            documents.len()
        );

        for (i, batch) in documents.chunks(batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|d| d.content.clone()).collect();
            let result = match self.embedder.embed_batch(&texts).await {
                Ok(embeddings) => self.store.add_documents(batch, &embeddings).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(n) => {
                    report.inserted += n;
                    info!("Added batch {}/{batches}", i + 1);
                }
                Err(e) => {
                    report.failed_batches += 1;
                    error!("error processing batch {}/{batches}: {e}", i + 1);
                }
            }
        }
        report
    }
}

/// Populate an empty store at startup. Failures are logged; the bot starts
/// regardless.
pub async fn ensure_initialized(ingestor: &Ingestor, data: &ReferenceData) {
    match ingestor.store.count().await {
        Ok(0) => {}
        Ok(n) => {
            info!("Vector store holds {n} documents");
            return;
        }
        Err(e) => {
            error!("cannot inspect vector store: {e}");
            return;
        }
    }

    info!("Vector store is empty, running initial ingest");
    match ingestor.ingest_all(data, false).await {
        Ok(report) => info!(
            "Initial ingest: {} of {} documents stored",
            report.inserted, report.documents
        ),
        Err(e) => error!("initial ingest failed: {e}"),
    }
}
