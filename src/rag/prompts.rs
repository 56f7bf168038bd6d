//! Prompt templates for the retrieval chains. `{context}` and `{question}` are
//! filled by [`fill`].

/// General answer prompt, restricted to university topics.
pub const QA_TEMPLATE: &str = "\
You are a helpful university information bot for Constructor University Bremen. Your purpose is to assist students, faculty, and visitors with information about the university.

IMPORTANT: Only answer questions related to Constructor University Bremen, its campus, programs, facilities, procedures, or academic matters. If the question is not directly related to the university, politely explain that you can only discuss university-related topics.

Use the following pieces of context to answer the question at the end. If you don't know the answer, just say that you don't know, don't try to make up an answer.

Context:
{context}

Question: {question}

When answering:
1. Be concise and direct
2. Include relevant details like locations, times, and contact information when available
3. Only discuss university-related matters
4. If the question is not about Constructor University Bremen, politely redirect the user

Answer:
";

/// Answers strictly from handbook excerpts.
pub const HANDBOOK_TEMPLATE: &str = "\
You are a knowledgeable assistant that specializes in Constructor University program handbooks.
Use ONLY the following handbook content to answer the question. If the handbook doesn't contain the information,
say so clearly, and suggest contacting an academic advisor.

HANDBOOK CONTENT:
{context}

QUESTION: {question}

Your answer should be detailed and precise, using the exact wording from the handbook when describing requirements.
Format your response clearly with proper headings and bullet points.
";

/// Substitute the placeholders. Placeholders appearing inside the
/// substituted context are left as they are.
pub fn fill(template: &str, context: &str, question: &str) -> String {
    let (head, tail) = match template.split_once("{question}") {
        Some(parts) => parts,
        None => return template.replace("{context}", context),
    };
    format!(
        "{}{question}{}",
        head.replace("{context}", context),
        tail.replace("{context}", context)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_replaces_both_placeholders() {
        let prompt = fill(QA_TEMPLATE, "Location: IRC", "Where is the IRC?");
        assert!(prompt.contains("Context:\nLocation: IRC\n"));
        assert!(prompt.contains("Question: Where is the IRC?\n"));
        assert!(!prompt.contains("{context}"));
        assert!(!prompt.contains("{question}"));
    }

    #[test]
    fn test_fill_does_not_expand_placeholders_inside_context() {
        let prompt = fill("C: {context}\nQ: {question}", "see {question}", "why?");
        assert_eq!(prompt, "C: see {question}\nQ: why?");
    }

    #[test]
    fn test_handbook_template_has_placeholders() {
        assert!(HANDBOOK_TEMPLATE.contains("{context}"));
        assert!(HANDBOOK_TEMPLATE.contains("{question}"));
    }
}
