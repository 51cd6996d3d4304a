//! Reply parsing and validation: pull the mandatory named fields out of the
//! model's structured reply, failing loudly when any is missing.
//!
//! Two wire sub-formats exist across deployments: tag-delimited sections
//! and a plain JSON object. Which one a given model speaks is
//! configuration, so both parsers live here behind [`ReplyFormat`].

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Which structured sub-format the model was instructed to reply in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyFormat {
    /// `<company>`/`<role>`/`<score>`/`<resume>`/`<cover>` delimited sections.
    #[default]
    Tags,
    /// A JSON object with the same field names.
    Json,
}

/// Fields recovered from one model reply, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyFields {
    pub company: String,
    pub role: String,
    pub resume: String,
    pub cover: Option<String>,
    /// Advisory 1-10 fit score; 0 when absent or unparseable.
    pub score: i64,
}

static COMPANY_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<company>(.*?)</company>").unwrap());
static ROLE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<role>(.*?)</role>").unwrap());
static SCORE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<score>\s*(\d+)\s*</score>").unwrap());
static RESUME_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<resume>(.*?)</resume>").unwrap());
static COVER_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<cover>(.*?)</cover>").unwrap());

fn extract_tag(re: &Regex, s: &str) -> String {
    re.captures(s)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// JSON-object reply shape. Score is taken as a raw value so a model
/// replying `"7"` instead of `7` still parses.
#[derive(Deserialize)]
struct JsonReply {
    #[serde(default)]
    company: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    resume: String,
    #[serde(default)]
    cover: Option<String>,
    #[serde(default)]
    score: Option<serde_json::Value>,
}

/// Parse and validate one reply body.
///
/// `cover_supplied` gates the cover field: it is populated only when the
/// caller fed a base cover letter in, regardless of what the reply
/// contains. Company, role, and resume must be non-empty after trimming;
/// an empty one fails with [`AppError::MalformedReply`] carrying each
/// field's extracted length, as does a JSON-mode reply that is not valid
/// JSON. Score is advisory and defaults to 0 instead of failing the whole
/// operation.
pub fn parse_reply(
    content: &str,
    format: ReplyFormat,
    cover_supplied: bool,
) -> Result<ReplyFields, AppError> {
    let (company, role, resume, cover, score) = match format {
        ReplyFormat::Tags => {
            let company = extract_tag(&COMPANY_TAG_RE, content);
            let role = extract_tag(&ROLE_TAG_RE, content);
            let resume = extract_tag(&RESUME_TAG_RE, content);
            let cover = extract_tag(&COVER_TAG_RE, content);
            let score = SCORE_TAG_RE
                .captures(content)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<i64>().ok())
                .unwrap_or(0);
            let cover = (!cover.is_empty()).then_some(cover);
            (company, role, resume, cover, score)
        }
        ReplyFormat::Json => {
            // A reply that is not JSON at all is the model misbehaving,
            // not an encoding bug on our side.
            let reply: JsonReply =
                serde_json::from_str(content).map_err(|_| AppError::MalformedReply {
                    company_len: 0,
                    role_len: 0,
                    resume_len: 0,
                })?;
            let score = reply
                .score
                .as_ref()
                .and_then(|v| match v {
                    serde_json::Value::Number(n) => n.as_i64(),
                    serde_json::Value::String(s) => s.trim().parse().ok(),
                    _ => None,
                })
                .unwrap_or(0);
            let cover = reply
                .cover
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty());
            (
                reply.company.trim().to_string(),
                reply.role.trim().to_string(),
                reply.resume.trim().to_string(),
                cover,
                score,
            )
        }
    };

    if company.is_empty() || role.is_empty() || resume.is_empty() {
        return Err(AppError::MalformedReply {
            company_len: company.len(),
            role_len: role.len(),
            resume_len: resume.len(),
        });
    }

    Ok(ReplyFields {
        company,
        role,
        resume,
        cover: if cover_supplied { cover } else { None },
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAGGED: &str = "<company>Felix</company>\n<role>Senior Copywriter</role>\n<score>7</score>\n<resume>\nTailored resume body\nacross several lines\n</resume>\n<cover>\nDear Hiring Manager,\n</cover>";

    #[test]
    fn test_tags_happy_path() {
        let fields = parse_reply(TAGGED, ReplyFormat::Tags, true).unwrap();
        assert_eq!(fields.company, "Felix");
        assert_eq!(fields.role, "Senior Copywriter");
        assert_eq!(fields.score, 7);
        assert_eq!(fields.resume, "Tailored resume body\nacross several lines");
        assert_eq!(fields.cover.as_deref(), Some("Dear Hiring Manager,"));
    }

    #[test]
    fn test_tags_cover_suppressed_when_not_supplied() {
        // The reply volunteers a cover letter, but no base cover was given.
        let fields = parse_reply(TAGGED, ReplyFormat::Tags, false).unwrap();
        assert_eq!(fields.cover, None);
    }

    #[test]
    fn test_tags_missing_resume_is_malformed() {
        let reply = "<company>Felix</company><role>Copywriter</role>";
        let err = parse_reply(reply, ReplyFormat::Tags, false).unwrap_err();
        match err {
            AppError::MalformedReply {
                company_len,
                role_len,
                resume_len,
            } => {
                assert_eq!(company_len, 5);
                assert_eq!(role_len, 10);
                assert_eq!(resume_len, 0);
            }
            other => panic!("expected MalformedReply, got {other:?}"),
        }
    }

    #[test]
    fn test_tags_whitespace_only_field_is_malformed() {
        let reply = "<company>   </company><role>R</role><resume>text</resume>";
        assert!(matches!(
            parse_reply(reply, ReplyFormat::Tags, false),
            Err(AppError::MalformedReply { company_len: 0, .. })
        ));
    }

    #[test]
    fn test_tags_score_defaults_to_zero() {
        let reply = "<company>C</company><role>R</role><resume>text</resume>";
        let fields = parse_reply(reply, ReplyFormat::Tags, false).unwrap();
        assert_eq!(fields.score, 0);

        let reply = "<company>C</company><role>R</role><score>high</score><resume>text</resume>";
        let fields = parse_reply(reply, ReplyFormat::Tags, false).unwrap();
        assert_eq!(fields.score, 0);
    }

    #[test]
    fn test_json_happy_path() {
        let reply = r#"{"company":" Felix ","role":"Senior Copywriter","score":7,"resume":"Tailored resume","cover":"Dear Hiring Manager,"}"#;
        let fields = parse_reply(reply, ReplyFormat::Json, true).unwrap();
        assert_eq!(fields.company, "Felix");
        assert_eq!(fields.score, 7);
        assert_eq!(fields.cover.as_deref(), Some("Dear Hiring Manager,"));
    }

    #[test]
    fn test_json_string_score_parses() {
        let reply = r#"{"company":"C","role":"R","score":"8","resume":"text"}"#;
        let fields = parse_reply(reply, ReplyFormat::Json, false).unwrap();
        assert_eq!(fields.score, 8);
    }

    #[test]
    fn test_json_missing_fields_is_malformed() {
        let reply = r#"{"company":"C","score":5}"#;
        assert!(matches!(
            parse_reply(reply, ReplyFormat::Json, false),
            Err(AppError::MalformedReply { .. })
        ));
    }

    #[test]
    fn test_json_unparseable_reply_is_malformed() {
        let err = parse_reply("not json at all", ReplyFormat::Json, false).unwrap_err();
        assert!(matches!(
            err,
            AppError::MalformedReply {
                company_len: 0,
                role_len: 0,
                resume_len: 0,
            }
        ));
    }

    #[test]
    fn test_json_cover_gated_on_supply() {
        let reply = r#"{"company":"C","role":"R","resume":"text","cover":"unrequested"}"#;
        let fields = parse_reply(reply, ReplyFormat::Json, false).unwrap();
        assert_eq!(fields.cover, None);
    }
}
