//! Query pipeline: retrieve, compose, stream.

use crate::error::QueryError;
use crate::keywords::synthesize_keywords;
use crate::languages::{self, LanguageDirective};
use crate::models::{ChatMessage, RetrievalOptions, SourceRef};
use crate::scoring::rank_chunks;
use crate::traits::{CompletionStream, RecordStore, TextGenerator};

/// Persona and grounding rules for the assistant. The language
/// directive is spliced in before the knowledge summary.
const PERSONA_HEADER: &str = "You are FundingIQ, an expert AI assistant specializing in Indian startup funding intelligence. Your role is to provide accurate, grounded insights about:

1. **Startup Funding**: Investment rounds, valuations, funding trends, deal sizes
2. **Investors**: VCs, angel investors, PE firms, their portfolios and investment patterns
3. **Government Policies**: Startup India schemes, tax benefits, grants, subsidies
4. **Ecosystem Trends**: Sector-wise analysis, emerging opportunities, market dynamics

Guidelines:
- Always provide specific, actionable information
- When discussing funding amounts, use appropriate units (₹Cr, $M, etc.)
- Cite sources when possible and mention if data might be outdated
- Be transparent about limitations of your knowledge
- For policy questions, mention eligibility criteria and deadlines when known";

const PERSONA_FOOTER: &str = "Current knowledge includes major Indian startup ecosystem data up to early 2024, including:
- Top funded startups like BYJU's, Swiggy, Razorpay, Zerodha, PhonePe
- Major investors: Sequoia Capital, Accel, Tiger Global, SoftBank, Peak XV
- Government schemes: Startup India Seed Fund, Fund of Funds, Credit Guarantee Scheme
- Key sectors: FinTech, EdTech, HealthTech, E-commerce, SaaS, DeepTech";

const CITE_CONTEXT: &str = "When the context above is relevant to the question, base your answer on it and mention which documents you drew from.";

pub struct QueryRequest {
    pub query: String,
    pub language: String,
    pub history: Vec<ChatMessage>,
    pub use_knowledge_base: bool,
}

/// Streamed answer plus out-of-band provenance. `sources` lists the
/// documents whose chunks entered the grounding context, in rank order.
pub struct QueryOutcome {
    pub stream: CompletionStream,
    pub sources: Vec<SourceRef>,
    pub language: String,
}

struct Retrieval {
    context: Option<String>,
    sources: Vec<SourceRef>,
}

pub struct QueryCoordinator<R, G> {
    records: R,
    generator: G,
    options: RetrievalOptions,
}

impl<R, G> QueryCoordinator<R, G>
where
    R: RecordStore,
    G: TextGenerator,
{
    pub fn new(records: R, generator: G, options: RetrievalOptions) -> Self {
        Self {
            records,
            generator,
            options,
        }
    }

    pub async fn run(&self, request: QueryRequest) -> Result<QueryOutcome, QueryError> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(QueryError::InvalidArgument("query is required".to_string()));
        }

        let directive = languages::resolve(&request.language);

        let retrieval = if request.use_knowledge_base {
            self.retrieve(query).await?
        } else {
            Retrieval {
                context: None,
                sources: Vec::new(),
            }
        };

        let system = compose_system_prompt(&directive, retrieval.context.as_deref());

        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(ChatMessage::system(system));
        let skip = request
            .history
            .len()
            .saturating_sub(self.options.history_limit);
        messages.extend(request.history.into_iter().skip(skip));
        messages.push(ChatMessage::user(query));

        tracing::info!(
            query = %truncate_for_log(query),
            language = directive.code,
            sources = retrieval.sources.len(),
            "running query"
        );

        let stream = self.generator.stream(&messages).await?;

        Ok(QueryOutcome {
            stream,
            sources: retrieval.sources,
            language: directive.name.to_string(),
        })
    }

    async fn retrieve(&self, query: &str) -> Result<Retrieval, QueryError> {
        let keywords = synthesize_keywords(&self.generator, query).await;
        let candidates = self.records.list_chunks(self.options.candidate_limit).await?;
        let ranked = rank_chunks(query, &keywords, candidates, self.options.top_k);

        if ranked.is_empty() {
            return Ok(Retrieval {
                context: None,
                sources: Vec::new(),
            });
        }

        let context = ranked
            .iter()
            .enumerate()
            .map(|(ordinal, retrieved)| format!("[{}] {}", ordinal + 1, retrieved.chunk.text))
            .collect::<Vec<_>>()
            .join("\n\n");

        // Distinct owning documents in rank order.
        let mut document_ids: Vec<String> = Vec::new();
        for retrieved in &ranked {
            if !document_ids.contains(&retrieved.chunk.document_id) {
                document_ids.push(retrieved.chunk.document_id.clone());
            }
        }

        let documents = self.records.documents_by_ids(&document_ids).await?;
        let sources = document_ids
            .iter()
            .filter_map(|id| documents.iter().find(|document| &document.id == id))
            .map(|document| SourceRef {
                name: document.file_name.clone(),
                category: document.category,
            })
            .collect();

        Ok(Retrieval {
            context: Some(context),
            sources,
        })
    }
}

fn compose_system_prompt(directive: &LanguageDirective, context: Option<&str>) -> String {
    let mut prompt = String::new();

    if let Some(context) = context {
        prompt.push_str("Context from the knowledge base:\n\n");
        prompt.push_str(context);
        prompt.push_str("\n\n");
        prompt.push_str(CITE_CONTEXT);
        prompt.push_str("\n\n");
    }

    prompt.push_str(PERSONA_HEADER);
    prompt.push_str("\n\n");
    prompt.push_str(directive.instruction);
    prompt.push_str("\n\n");
    prompt.push_str(PERSONA_FOOTER);
    prompt
}

fn truncate_for_log(query: &str) -> String {
    query.chars().take(100).collect()
}
