//! pgvector similarity search over the `documents` table.

use super::KnowledgeStore;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use unibot_core::{
    document::{DocFilter, Document, ScoredDocument},
    error::UnibotError,
    traits::VectorStore,
};

/// Render an embedding as a pgvector text literal, e.g. `[0.1,0.2,0.3]`.
pub fn vector_literal(embedding: &[f32]) -> String {
    let mut out = String::with_capacity(embedding.len() * 10 + 2);
    out.push('[');
    for (i, v) in embedding.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&v.to_string());
    }
    out.push(']');
    out
}

/// Turn a stored row back into a document.
fn row_to_document(content: String, metadata: Option<Value>) -> Document {
    let metadata = match metadata {
        Some(Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };
    Document { content, metadata }
}

#[async_trait]
impl VectorStore for KnowledgeStore {
    async fn similarity_search(
        &self,
        embedding: &[f32],
        filter: &DocFilter,
        k: i64,
    ) -> Result<Vec<ScoredDocument>, UnibotError> {
        let rows: Vec<(String, Option<Value>, f64)> = sqlx::query_as(
            "SELECT content, metadata, 1 - (embedding <=> $1::vector) AS similarity \
             FROM documents \
             WHERE metadata @> $2::jsonb \
             ORDER BY embedding <=> $1::vector \
             LIMIT $3",
        )
        .bind(vector_literal(embedding))
        .bind(filter.to_json())
        .bind(k)
        .fetch_all(self.pool())
        .await
        .map_err(|e| UnibotError::Knowledge(format!("similarity search failed: {e}")))?;

        debug!("similarity search ({}) returned {} rows", filter.to_json(), rows.len());

        Ok(rows
            .into_iter()
            .map(|(content, metadata, similarity)| ScoredDocument {
                document: row_to_document(content, metadata),
                similarity,
            })
            .collect())
    }

    async fn add_documents(
        &self,
        documents: &[Document],
        embeddings: &[Vec<f32>],
    ) -> Result<u64, UnibotError> {
        if documents.len() != embeddings.len() {
            return Err(UnibotError::Knowledge(format!(
                "{} documents but {} embeddings",
                documents.len(),
                embeddings.len()
            )));
        }

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| UnibotError::Knowledge(format!("failed to begin transaction: {e}")))?;

        for (doc, embedding) in documents.iter().zip(embeddings) {
            sqlx::query(
                "INSERT INTO documents (content, metadata, embedding) \
                 VALUES ($1, $2, $3::vector)",
            )
            .bind(&doc.content)
            .bind(Value::Object(doc.metadata.clone()))
            .bind(vector_literal(embedding))
            .execute(&mut *tx)
            .await
            .map_err(|e| UnibotError::Knowledge(format!("document insert failed: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| UnibotError::Knowledge(format!("failed to commit documents: {e}")))?;

        Ok(documents.len() as u64)
    }

    async fn delete_by_tool(&self, tool: &str) -> Result<u64, UnibotError> {
        let result = sqlx::query("DELETE FROM documents WHERE metadata->>'tool' = $1")
            .bind(tool)
            .execute(self.pool())
            .await
            .map_err(|e| UnibotError::Knowledge(format!("delete by tool failed: {e}")))?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<i64, UnibotError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents")
            .fetch_one(self.pool())
            .await
            .map_err(|e| UnibotError::Knowledge(format!("count failed: {e}")))?;
        Ok(n)
    }

    async fn reset(&self) -> Result<(), UnibotError> {
        self.reset_documents().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_literal() {
        assert_eq!(vector_literal(&[0.5, -1.0, 0.25]), "[0.5,-1,0.25]");
        assert_eq!(vector_literal(&[]), "[]");
    }

    #[test]
    fn test_row_to_document_keeps_object_metadata() {
        let doc = row_to_document(
            "Location: IRC".into(),
            Some(serde_json::json!({"tool": "location", "id": 3})),
        );
        assert_eq!(doc.meta_str("tool"), Some("location"));
        assert_eq!(doc.metadata["id"], 3);
    }

    #[test]
    fn test_row_to_document_null_metadata() {
        let doc = row_to_document("x".into(), None);
        assert!(doc.metadata.is_empty());
        let doc = row_to_document("x".into(), Some(Value::Null));
        assert!(doc.metadata.is_empty());
    }
}
