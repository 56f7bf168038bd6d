//! In-memory doubles for the provider, embedder, vector store and channel seams.

use crate::{
    faq::FaqIndex,
    handlers::Knowledge,
    rag::Chains,
    schedules::{LockerHours, ServeryHours},
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use unibot_core::{
    config::{RetrievalConfig, RoutingConfig},
    context::Context,
    document::{DocFilter, Document, ScoredDocument},
    error::UnibotError,
    message::{DocumentLink, IncomingMessage, OutgoingMessage, Venue},
    traits::{Channel, Embedder, Provider, VectorStore},
};
use unibot_knowledge::{FaqEntry, Handbook, HandbookCatalog, Location, LockerRow, ServeryRow};

/// Replies with queued answers in order, then with `fallback`. Records every prompt.
pub struct ScriptedProvider {
    name: String,
    replies: Mutex<VecDeque<Result<String, String>>>,
    fallback: String,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            replies: Mutex::new(VecDeque::new()),
            fallback: "I don't know.".to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, error: &str) -> Self {
        self.replies.lock().unwrap().push_back(Err(error.to_string()));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "test-model"
    }

    async fn complete(&self, context: &Context) -> Result<OutgoingMessage, UnibotError> {
        self.prompts
            .lock()
            .unwrap()
            .push(context.current_message.clone());
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(OutgoingMessage::plain(text)),
            Some(Err(e)) => Err(UnibotError::Provider(e)),
            None => Ok(OutgoingMessage::plain(self.fallback.clone())),
        }
    }

    async fn is_available(&self) -> bool {
        true
    }
}

/// Maps every text to a constant vector.
pub struct ConstEmbedder;

#[async_trait]
impl Embedder for ConstEmbedder {
    fn name(&self) -> &str {
        "const"
    }

    fn dimensions(&self) -> usize {
        3
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, UnibotError> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
    }
}

/// Documents with a fixed similarity each, filtered like the real store.
#[derive(Default)]
pub struct MemoryStore {
    pub docs: Mutex<Vec<(Document, f64)>>,
    pub searches: Mutex<Vec<DocFilter>>,
}

impl MemoryStore {
    pub fn with(docs: Vec<(Document, f64)>) -> Self {
        Self {
            docs: Mutex::new(docs),
            searches: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn similarity_search(
        &self,
        _embedding: &[f32],
        filter: &DocFilter,
        k: i64,
    ) -> Result<Vec<ScoredDocument>, UnibotError> {
        self.searches.lock().unwrap().push(filter.clone());
        let mut hits: Vec<ScoredDocument> = self
            .docs
            .lock()
            .unwrap()
            .iter()
            .filter(|(doc, _)| filter.matches(doc))
            .map(|(doc, similarity)| ScoredDocument {
                document: doc.clone(),
                similarity: *similarity,
            })
            .collect();
        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(k.max(0) as usize);
        Ok(hits)
    }

    async fn add_documents(
        &self,
        documents: &[Document],
        embeddings: &[Vec<f32>],
    ) -> Result<u64, UnibotError> {
        if documents.len() != embeddings.len() {
            return Err(UnibotError::Knowledge("length mismatch".into()));
        }
        let mut docs = self.docs.lock().unwrap();
        docs.extend(documents.iter().cloned().map(|d| (d, 1.0)));
        Ok(documents.len() as u64)
    }

    async fn delete_by_tool(&self, tool: &str) -> Result<u64, UnibotError> {
        let mut docs = self.docs.lock().unwrap();
        let before = docs.len();
        docs.retain(|(d, _)| d.meta_str("tool") != Some(tool));
        Ok((before - docs.len()) as u64)
    }

    async fn count(&self) -> Result<i64, UnibotError> {
        Ok(self.docs.lock().unwrap().len() as i64)
    }

    async fn reset(&self) -> Result<(), UnibotError> {
        self.docs.lock().unwrap().clear();
        Ok(())
    }
}

/// Something a [`RecordingChannel`] was asked to do.
#[derive(Debug, Clone)]
pub enum Sent {
    Message(OutgoingMessage),
    Typing(String),
    Venue(Venue),
    Document(DocumentLink),
    CallbackAnswer(String),
}

impl Sent {
    pub fn text(&self) -> Option<&str> {
        match self {
            Sent::Message(m) => Some(&m.text),
            _ => None,
        }
    }
}

/// Records everything sent through it.
#[derive(Default)]
pub struct RecordingChannel {
    pub sent: Mutex<Vec<Sent>>,
}

impl RecordingChannel {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts of sent messages, in order.
    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .iter()
            .filter_map(|s| s.text().map(str::to_string))
            .collect()
    }

    pub fn messages(&self) -> Vec<OutgoingMessage> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Message(m) => Some(m),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, UnibotError> {
        let (_tx, rx) = tokio::sync::mpsc::channel(1);
        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), UnibotError> {
        self.sent.lock().unwrap().push(Sent::Message(message));
        Ok(())
    }

    async fn send_typing(&self, target: &str) -> Result<(), UnibotError> {
        self.sent.lock().unwrap().push(Sent::Typing(target.to_string()));
        Ok(())
    }

    async fn send_venue(&self, _target: &str, venue: &Venue) -> Result<(), UnibotError> {
        self.sent.lock().unwrap().push(Sent::Venue(venue.clone()));
        Ok(())
    }

    async fn send_document(
        &self,
        _target: &str,
        document: &DocumentLink,
    ) -> Result<(), UnibotError> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Document(document.clone()));
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), UnibotError> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::CallbackAnswer(callback_id.to_string()));
        Ok(())
    }

    async fn stop(&self) -> Result<(), UnibotError> {
        Ok(())
    }
}

/// A fixed handbook list; `failing()` makes every call error.
pub struct StaticCatalog {
    handbooks: Vec<Handbook>,
    fail: bool,
}

impl StaticCatalog {
    pub fn new(majors: &[&str]) -> Self {
        Self {
            handbooks: majors
                .iter()
                .map(|major| {
                    let file_name = format!("{}_handbook.pdf", major.to_lowercase().replace(' ', "_"));
                    Handbook {
                        major: major.to_string(),
                        url: format!("https://storage.test/{file_name}"),
                        file_name,
                    }
                })
                .collect(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            handbooks: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl HandbookCatalog for StaticCatalog {
    async fn list_handbooks(&self) -> Result<Vec<Handbook>, UnibotError> {
        if self.fail {
            return Err(UnibotError::Storage("bucket unavailable".into()));
        }
        Ok(self.handbooks.clone())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, UnibotError> {
        if self.fail {
            return Err(UnibotError::Storage(format!("cannot fetch {url}")));
        }
        Ok(Vec::new())
    }
}

pub fn location(id: i64, name: &str, aliases: &[&str], tags: &[&str]) -> Location {
    Location {
        id,
        name: name.to_string(),
        aliases: aliases.iter().map(|s| s.to_string()).collect(),
        tags: tags.iter().map(|s| s.to_string()).collect(),
        latitude: Some(53.1677),
        longitude: Some(8.6520),
        address: None,
    }
}

/// A small campus with schedules, FAQ entries and the given store behind the chains.
pub fn knowledge(store: Arc<MemoryStore>, handbooks: Option<Arc<dyn HandbookCatalog>>) -> Knowledge {
    let locker = |day: &str, basement: &str, start: &str, end: &str| LockerRow {
        college: Some("Krupp College".into()),
        day: Some(day.into()),
        basement: Some(basement.into()),
        start_time: Some(start.into()),
        end_time: Some(end.into()),
    };
    let servery = |day: &str, meal: &str, start: &str, end: &str| ServeryRow {
        college: Some("Krupp College".into()),
        day: Some(day.into()),
        meal_type: Some(meal.into()),
        start_time: Some(start.into()),
        end_time: Some(end.into()),
    };

    Knowledge {
        locations: vec![
            location(1, "Information Resource Center", &["IRC", "library"], &["study", "printer"]),
            location(2, "Ocean Lab", &["oceanlab"], &["research"]),
            location(3, "Krupp College", &["krupp"], &["food", "printer"]),
            location(4, "Coffee Bar", &["cafe"], &["coffee", "food"]),
        ],
        faq: FaqIndex::new(vec![FaqEntry {
            question: "Laundry".into(),
            answer: "Washing machines are in the college basements.".into(),
        }]),
        lockers: LockerHours::from_rows(&[
            locker("Monday", "A", "18:00", "19:00"),
            locker("Thursday", "B", "18:30", "19:30"),
        ]),
        serveries: ServeryHours::from_rows(&[
            servery("Monday", "lunch", "12:00", "14:00"),
            servery("Monday", "dinner", "18:00", "20:00"),
        ]),
        chains: Chains::new(Arc::new(ConstEmbedder), store, &RetrievalConfig::default()),
        handbooks,
        routing: RoutingConfig::default(),
        default_address: "Campus Ring 1, 28759 Bremen".into(),
    }
}
