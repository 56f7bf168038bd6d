//! Retrieval-augmented answering.
//!
//! A chain embeds the question, pulls the nearest documents for its scope
//! from the vector store, stuffs them into a prompt template and asks the
//! chat provider. Chains do not own a provider: the caller passes the one
//! selected for the current user.

mod prompts;

pub use prompts::{fill, HANDBOOK_TEMPLATE, QA_TEMPLATE};

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};
use unibot_core::{
    config::RetrievalConfig,
    context::Context,
    document::{DocFilter, ScoredDocument},
    error::UnibotError,
    traits::{Embedder, Provider, VectorStore},
};

/// An LLM answer and the documents it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<ScoredDocument>,
    pub provider: String,
    pub elapsed_ms: u64,
}

impl Answer {
    /// The answer followed by a `*Sources:*` list of FAQ questions and
    /// locations, when any were used.
    pub fn with_sources(&self) -> String {
        match format_sources(&self.sources) {
            Some(sources) => format!("{}{sources}", self.text),
            None => self.text.clone(),
        }
    }

    /// The answer followed by the majors whose handbooks were used.
    pub fn with_handbook_sources(&self) -> String {
        let majors: BTreeSet<&str> = self
            .sources
            .iter()
            .filter_map(|s| s.document.meta_str("major"))
            .collect();
        if majors.is_empty() {
            return self.text.clone();
        }
        format!(
            "{}\n\n*Sources:* {}",
            self.text,
            majors.into_iter().collect::<Vec<_>>().join(", ")
        )
    }
}

/// `\n\n*Sources:*\n- FAQ: ...\n- Location: ...`, sorted and de-duplicated.
pub fn format_sources(sources: &[ScoredDocument]) -> Option<String> {
    let labels: BTreeSet<String> = sources
        .iter()
        .filter_map(|s| {
            let doc = &s.document;
            match doc.meta_str("type")? {
                "faq" => doc.meta_str("question").map(|q| format!("FAQ: {q}")),
                "location" => doc.meta_str("name").map(|n| format!("Location: {n}")),
                _ => None,
            }
        })
        .collect();

    if labels.is_empty() {
        return None;
    }
    Some(format!(
        "\n\n*Sources:*\n- {}",
        labels.into_iter().collect::<Vec<_>>().join("\n- ")
    ))
}

/// One retriever + template pair.
pub struct RetrievalChain {
    name: &'static str,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    scope: DocFilter,
    k: i64,
    score_threshold: Option<f64>,
    template: &'static str,
}

impl RetrievalChain {
    pub fn new(
        name: &'static str,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        scope: DocFilter,
        k: i64,
    ) -> Self {
        Self {
            name,
            embedder,
            store,
            scope,
            k,
            score_threshold: None,
            template: QA_TEMPLATE,
        }
    }

    /// Drop hits whose similarity is below `threshold`.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.score_threshold = Some(threshold);
        self
    }

    pub fn with_template(mut self, template: &'static str) -> Self {
        self.template = template;
        self
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// Nearest documents for a question within this chain's scope.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<ScoredDocument>, UnibotError> {
        let embedding = self.embedder.embed(question).await?;
        let mut hits = self
            .store
            .similarity_search(&embedding, &self.scope, self.k)
            .await?;
        if let Some(threshold) = self.score_threshold {
            hits.retain(|h| h.similarity >= threshold);
        }
        debug!("{} chain: {} documents retrieved", self.name, hits.len());
        Ok(hits)
    }

    /// The filled prompt for a question and its retrieved documents.
    pub fn prompt(&self, question: &str, hits: &[ScoredDocument]) -> String {
        let context = hits
            .iter()
            .map(|h| h.document.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        fill(self.template, &context, question)
    }

    /// Retrieve, prompt and complete.
    ///
    /// An empty retrieval still reaches the provider; the template tells the
    /// model to admit when it does not know.
    pub async fn invoke(
        &self,
        provider: &dyn Provider,
        question: &str,
    ) -> Result<Answer, UnibotError> {
        let started = Instant::now();
        let sources = self.retrieve(question).await?;
        self.answer(provider, question, sources, started).await
    }

    /// Complete a question over documents already retrieved.
    pub async fn answer(
        &self,
        provider: &dyn Provider,
        question: &str,
        sources: Vec<ScoredDocument>,
        started: Instant,
    ) -> Result<Answer, UnibotError> {
        let context = Context::new(&self.prompt(question, &sources));
        trace!("{} chain prompt:\n{}", self.name, context.to_prompt_string());

        let response = provider.complete(&context).await?;
        Ok(Answer {
            text: response.text.trim().to_string(),
            sources,
            provider: provider.name().to_string(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// The chains every handler draws from.
pub struct Chains {
    pub general: RetrievalChain,
    pub location: RetrievalChain,
    pub locker: RetrievalChain,
    pub servery: RetrievalChain,
    pub faq: RetrievalChain,
    pub handbook: RetrievalChain,
}

impl Chains {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        config: &RetrievalConfig,
    ) -> Self {
        let chain = |name, scope, k| {
            RetrievalChain::new(name, embedder.clone(), store.clone(), scope, k)
        };
        Self {
            general: chain("general", DocFilter::all(), config.general_k)
                .with_threshold(config.score_threshold),
            location: chain("location", DocFilter::tool("location"), config.scoped_k),
            locker: chain("locker", DocFilter::tool("locker"), config.scoped_k),
            servery: chain("servery", DocFilter::tool("servery"), config.scoped_k),
            faq: chain("faq", DocFilter::tool("qa"), config.scoped_k),
            handbook: chain("handbook", DocFilter::tool("handbook"), config.handbook_k)
                .with_template(HANDBOOK_TEMPLATE),
        }
    }
}

#[cfg(test)]
mod tests;
