//! The generation pipeline: classified document + base material in,
//! validated tailored application out.

use serde::Serialize;

use crate::document::parse;
use crate::error::AppError;
use crate::node::Node;
use crate::payload::encode;
use crate::reply::{ReplyFormat, parse_reply};
use crate::traits::Completer;

/// Instruction prompt for the tag-delimited reply sub-format.
pub const TAG_SYSTEM_PROMPT: &str = "You are a professional resume writer and career coach.
You will receive a job description as a JSON array of classified lines, a base resume, and optionally a base cover letter.

Your tasks:
1. Extract the company name and role title from the job description.
2. Rewrite the resume to align with the job. Keep experience truthful; sharpen bullets to mirror the job's language and priorities.
3. If a base cover letter is provided, draft a tailored cover letter for this role.
4. Rate how well the base resume matches the job requirements on a scale of 1-10 (1 = poor fit, 10 = perfect fit).

Respond using exactly these XML tags, in this order:
<company>company name</company>
<role>role title</role>
<score>integer 1-10</score>
<resume>
full tailored resume text
</resume>
<cover>
tailored cover letter (include ONLY if a base cover letter was provided)
</cover>";

/// Instruction prompt for the JSON-object reply sub-format.
pub const JSON_SYSTEM_PROMPT: &str = "You are a professional resume writer and career coach.
You will receive a job description as a JSON array of classified lines, a base resume, and optionally a base cover letter.

Your tasks:
1. Extract the company name and role title from the job description.
2. Rewrite the resume to align with the job. Keep experience truthful; sharpen bullets to mirror the job's language and priorities.
3. If a base cover letter is provided, draft a tailored cover letter for this role.
4. Rate how well the base resume matches the job requirements on a scale of 1-10 (1 = poor fit, 10 = perfect fit).

Respond ONLY with a JSON object with these keys:
{\"company\": string, \"role\": string, \"score\": integer 1-10, \"resume\": string, \"cover\": string (include ONLY if a base cover letter was provided)}";

/// Structured-output hint passed through to the chat API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    JsonObject,
}

/// One chat-completion request. Built once per process call; immutable.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_payload: String,
    pub response_format: Option<ResponseFormat>,
}

/// Raw reply content plus token usage, as returned by a [`Completer`].
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub total_tokens: i64,
}

/// A validated tailored application, ready for the caller to persist.
#[derive(Debug, Clone, Serialize)]
pub struct TailoredApplication {
    pub company: String,
    pub role: String,
    pub resume: String,
    pub cover: Option<String>,
    /// Advisory 1-10 fit score; 0 when the reply omitted it.
    pub score: i64,
    pub tokens_used: i64,
}

/// Drives one document through the full pipeline:
/// parse → encode → complete → validate.
///
/// Generic over the model client via [`Completer`], enabling dependency
/// injection and testability without real API calls. Stateless per call;
/// callers wanting concurrency run independent invocations.
pub struct TailorService<C: Completer> {
    completer: C,
    model: String,
    reply_format: ReplyFormat,
}

impl<C: Completer> TailorService<C> {
    pub fn new(completer: C, model: impl Into<String>) -> Self {
        Self {
            completer,
            model: model.into(),
            reply_format: ReplyFormat::default(),
        }
    }

    pub fn with_reply_format(mut self, format: ReplyFormat) -> Self {
        self.reply_format = format;
        self
    }

    /// Run the pipeline over one raw document.
    ///
    /// `base_cover` drives cover-letter generation: when absent, the reply's
    /// cover section is ignored even if the model volunteers one.
    pub async fn run(
        &self,
        raw_text: &str,
        base_resume: &str,
        base_cover: Option<&str>,
    ) -> Result<TailoredApplication, AppError> {
        let nodes = parse(raw_text);
        tracing::info!(
            "Classified document: {} nodes from {} bytes",
            nodes.len(),
            raw_text.len()
        );
        self.run_nodes(&nodes, base_resume, base_cover).await
    }

    /// Run the pipeline over an already-classified document. Callers that
    /// keep the node list around for other uses (naming the output folder,
    /// debug printing) classify once and come in here.
    pub async fn run_nodes(
        &self,
        nodes: &[Node],
        base_resume: &str,
        base_cover: Option<&str>,
    ) -> Result<TailoredApplication, AppError> {
        let user_payload = encode(nodes, base_resume, base_cover)?;

        let (system_prompt, response_format) = match self.reply_format {
            ReplyFormat::Tags => (TAG_SYSTEM_PROMPT, None),
            ReplyFormat::Json => (JSON_SYSTEM_PROMPT, Some(ResponseFormat::JsonObject)),
        };

        let request = ExtractionRequest {
            model: self.model.clone(),
            system_prompt: system_prompt.to_string(),
            user_payload,
            response_format,
        };

        tracing::info!("Requesting completion with model {}", self.model);
        let completion = self.completer.complete(&request).await?;
        tracing::info!(tokens = completion.total_tokens, "Completion received");

        let fields = parse_reply(&completion.content, self.reply_format, base_cover.is_some())?;
        tracing::info!(
            company = %fields.company,
            role = %fields.role,
            score = fields.score,
            "Reply validated"
        );

        Ok(TailoredApplication {
            company: fields.company,
            role: fields.role,
            resume: fields.resume,
            cover: fields.cover,
            score: fields.score,
            tokens_used: completion.total_tokens,
        })
    }
}
