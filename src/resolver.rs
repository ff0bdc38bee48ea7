//! Query resolution: turns a free-text question into a grounded answer.
//!
//! Two modes, selected by [`QueryRequest`]:
//!
//! | Mode | Context | Template |
//! |------|---------|----------|
//! | [`Structured`](QueryRequest::Structured) | first `record_limit` notification records, or the one record whose address best matches | [`prompt::notification_prompt`] |
//! | [`Document`](QueryRequest::Document) | full building code text | [`prompt::building_code_prompt`] |
//!
//! Each mode is a free function over borrowed inputs ([`answer_structured`],
//! [`answer_document`]) so it can be exercised with a fake
//! [`LanguageModel`]. [`QueryResolver`] owns the loaded inputs and turns
//! every [`QueryError`] into advisory text; nothing escapes as an error.
//!
//! Queries are independent: no state is kept between calls.

use std::sync::Arc;

use crate::config::{Config, ResolverConfig};
use crate::document;
use crate::error::{DataSource, QueryError, ServiceError};
use crate::llm::{self, LanguageModel};
use crate::matcher;
use crate::models::{GeneratedAnswer, NotificationDataset, ReferenceDocument};
use crate::prompt;
use crate::records;
use crate::sources::SourceStatus;

/// A question about the notification records.
#[derive(Debug, Clone)]
pub struct StructuredQuery {
    pub query: String,
    /// When set, only the record whose address best matches is used.
    pub address: Option<String>,
}

/// A question about the building code.
#[derive(Debug, Clone)]
pub struct DocumentQuery {
    pub question: String,
}

#[derive(Debug, Clone)]
pub enum QueryRequest {
    Structured(StructuredQuery),
    Document(DocumentQuery),
}

impl QueryRequest {
    pub fn notifications(query: impl Into<String>) -> Self {
        QueryRequest::Structured(StructuredQuery {
            query: query.into(),
            address: None,
        })
    }

    pub fn notification_at(query: impl Into<String>, address: impl Into<String>) -> Self {
        QueryRequest::Structured(StructuredQuery {
            query: query.into(),
            address: Some(address.into()),
        })
    }

    pub fn building_code(question: impl Into<String>) -> Self {
        QueryRequest::Document(DocumentQuery {
            question: question.into(),
        })
    }

    fn mode(&self) -> &'static str {
        match self {
            QueryRequest::Structured(_) => "notifications",
            QueryRequest::Document(_) => "building_code",
        }
    }
}

fn require_text(text: &str) -> Result<&str, QueryError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(QueryError::EmptyQuery)
    } else {
        Ok(trimmed)
    }
}

fn records_unavailable() -> QueryError {
    QueryError::data_unavailable(DataSource::Spreadsheet, "notification data was not loaded")
}

/// Builds the notification prompt without calling a model.
///
/// # Errors
///
/// [`QueryError::EmptyQuery`], [`QueryError::DataUnavailable`] for a missing
/// or empty dataset, and [`QueryError::NoMatch`] when an address lookup
/// finds nothing at `settings.match_threshold`.
pub fn structured_prompt(
    dataset: Option<&NotificationDataset>,
    request: &StructuredQuery,
    settings: &ResolverConfig,
) -> Result<String, QueryError> {
    let query = require_text(&request.query)?;
    let dataset = dataset
        .filter(|d| !d.is_empty())
        .ok_or_else(records_unavailable)?;

    let context = match request.address.as_deref().map(str::trim) {
        Some(address) if !address.is_empty() => {
            let found = matcher::best_match(address, dataset.addresses(), settings.match_threshold)
                .ok_or_else(|| QueryError::NoMatch {
                    address: address.to_string(),
                    threshold: settings.match_threshold,
                })?;
            tracing::debug!(
                address,
                matched = found.candidate,
                score = found.score,
                "address lookup matched"
            );
            let record = &dataset.records()[found.index];
            prompt::records_context(std::iter::once(record))
        }
        _ => prompt::records_context(dataset.records().iter().take(settings.record_limit)),
    };

    Ok(prompt::notification_prompt(&context, query))
}

/// Builds the building code prompt without calling a model.
pub fn document_prompt(
    document: Option<&ReferenceDocument>,
    request: &DocumentQuery,
) -> Result<String, QueryError> {
    let question = require_text(&request.question)?;
    let document = document.ok_or_else(|| {
        QueryError::data_unavailable(DataSource::Document, "building code was not loaded")
    })?;
    Ok(prompt::building_code_prompt(&document.text, question))
}

/// Answers a question about the notification records.
pub async fn answer_structured(
    dataset: Option<&NotificationDataset>,
    model: Option<&dyn LanguageModel>,
    request: &StructuredQuery,
    settings: &ResolverConfig,
) -> Result<GeneratedAnswer, QueryError> {
    let prompt = structured_prompt(dataset, request, settings)?;
    let model = model.ok_or(ServiceError::NotConfigured)?;
    Ok(model.generate(&prompt).await?)
}

/// Answers a question about the building code.
pub async fn answer_document(
    document: Option<&ReferenceDocument>,
    model: Option<&dyn LanguageModel>,
    request: &DocumentQuery,
) -> Result<GeneratedAnswer, QueryError> {
    require_text(&request.question)?;
    let model = model.ok_or(ServiceError::NotConfigured)?;
    let prompt = document_prompt(document, request)?;
    Ok(model.generate(&prompt).await?)
}

/// Owns the loaded inputs and the model client for the life of a session.
pub struct QueryResolver {
    dataset: Option<NotificationDataset>,
    document: Option<ReferenceDocument>,
    model: Option<Arc<dyn LanguageModel>>,
    settings: ResolverConfig,
    sources: Vec<SourceStatus>,
}

impl QueryResolver {
    /// Assembles a resolver from already-loaded parts.
    ///
    /// `None` for any part means it is unavailable; queries that need it get
    /// the matching advisory message.
    pub fn new(
        dataset: Option<NotificationDataset>,
        document: Option<ReferenceDocument>,
        model: Option<Arc<dyn LanguageModel>>,
        settings: ResolverConfig,
    ) -> Self {
        let sources = vec![
            match &dataset {
                Some(d) => SourceStatus::ok("spreadsheet", format!("{} records", d.len())),
                None => SourceStatus::unavailable("spreadsheet", "not loaded"),
            },
            match &document {
                Some(d) => SourceStatus::ok("document", format!("{} pages", d.page_count)),
                None => SourceStatus::unavailable("document", "not loaded"),
            },
            match &model {
                Some(m) => SourceStatus::ok("model", m.model_name().to_string()),
                None => SourceStatus::unavailable("model", "not configured"),
            },
        ];
        Self::with_sources(dataset, document, model, settings, sources)
    }

    fn with_sources(
        dataset: Option<NotificationDataset>,
        document: Option<ReferenceDocument>,
        model: Option<Arc<dyn LanguageModel>>,
        settings: ResolverConfig,
        sources: Vec<SourceStatus>,
    ) -> Self {
        Self {
            dataset,
            document,
            model,
            settings,
            sources,
        }
    }

    /// Loads the spreadsheet, the document, and the model client described
    /// by `config`.
    ///
    /// Load failures are logged and recorded in [`sources`](Self::sources);
    /// they never abort construction.
    pub fn from_config(config: &Config) -> Self {
        let dataset = records::load(&config.data.spreadsheet, config.data.sheet.as_deref());
        let document = document::load(&config.data.document);
        let model = llm::create_client(&config.llm);

        let sources = vec![
            SourceStatus::from_result(
                "spreadsheet",
                &config.data.spreadsheet.display().to_string(),
                dataset.as_ref().map(|d| format!("{} records", d.len())),
            ),
            SourceStatus::from_result(
                "document",
                &config.data.document.display().to_string(),
                document.as_ref().map(|d| format!("{} pages", d.page_count)),
            ),
            SourceStatus::from_result(
                "model",
                &config.llm.provider,
                model.as_ref().map(|m| m.model_name().to_string()),
            ),
        ];

        for status in sources.iter().filter(|s| !s.healthy) {
            tracing::warn!(source = %status.name, detail = %status.detail, "source unavailable");
        }

        Self::with_sources(
            dataset.ok(),
            document.ok(),
            model.ok(),
            config.resolver.clone(),
            sources,
        )
    }

    /// Status of each input, as observed when the resolver was built.
    pub fn sources(&self) -> &[SourceStatus] {
        &self.sources
    }

    pub fn dataset(&self) -> Option<&NotificationDataset> {
        self.dataset.as_ref()
    }

    /// Resolves a request, keeping the error for callers that branch on it.
    pub async fn try_resolve(&self, request: &QueryRequest) -> Result<GeneratedAnswer, QueryError> {
        let model = self.model.as_deref();
        let result = match request {
            QueryRequest::Structured(q) => {
                answer_structured(self.dataset.as_ref(), model, q, &self.settings).await
            }
            QueryRequest::Document(q) => answer_document(self.document.as_ref(), model, q).await,
        };

        match &result {
            Ok(answer) => {
                tracing::info!(mode = request.mode(), chars = answer.text.len(), "query answered")
            }
            Err(e) => tracing::warn!(mode = request.mode(), error = %e, "query not answered"),
        }
        result
    }

    /// Resolves a request to displayable text. Errors become advisory messages.
    pub async fn resolve(&self, request: &QueryRequest) -> String {
        match self.try_resolve(request).await {
            Ok(answer) => answer.text,
            Err(e) => e.user_message(),
        }
    }
}
