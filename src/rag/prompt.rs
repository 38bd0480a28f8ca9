use super::document::MetadataMode;
use super::index::RetrievedNode;

pub const QA_PROMPT_TEMPLATE: &str = "You are a strict Regulatory Assistant for the UK Gambling Commission.\n\
Context:\n\
{context_str}\n\
Instructions:\n\
1. Answer ONLY based on the context.\n\
2. Cite the specific Code/Condition numbers.\n\
Query: {query_str}\n\
Answer: ";

/// A question-answering template with `{context_str}` and `{query_str}` slots.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(QA_PROMPT_TEMPLATE)
    }
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn render(&self, context: &str, question: &str) -> String {
        // Context first: the question is user text and must not be rescanned for slots.
        let (before, after) = match self.template.split_once("{query_str}") {
            Some(parts) => parts,
            None => (self.template.as_str(), ""),
        };
        let mut prompt = before.replace("{context_str}", context);
        if self.template.contains("{query_str}") {
            prompt.push_str(question);
            prompt.push_str(&after.replace("{context_str}", context));
        }
        prompt
    }
}

/// LLM-facing text of the retrieved chunks, in retrieval order, separated by blank lines.
pub fn build_context(nodes: &[RetrievedNode]) -> String {
    nodes
        .iter()
        .map(|node| node.chunk.content_for(MetadataMode::Llm))
        .collect::<Vec<_>>()
        .join("\n\n")
}
