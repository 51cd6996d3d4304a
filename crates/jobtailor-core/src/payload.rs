//! Payload encoding: the filtered document plus the candidate's base
//! material, packed into one labelled prompt body.

use crate::error::AppError;
use crate::node::Node;

/// Serialize the classified document, the base resume, and (when present)
/// the base cover letter into a single prompt body.
///
/// Each block carries an explicit label so the model can tell document
/// evidence apart from the candidate's existing material. The node sequence
/// goes out as a JSON array, machine-parseable category included.
pub fn encode(
    nodes: &[Node],
    base_resume: &str,
    base_cover: Option<&str>,
) -> Result<String, AppError> {
    let document = serde_json::to_string(nodes)?;

    let mut payload = String::with_capacity(
        document.len() + base_resume.len() + base_cover.map_or(0, str::len) + 64,
    );
    payload.push_str("JOB DESCRIPTION:\n");
    payload.push_str(&document);
    payload.push_str("\n\nBASE RESUME:\n");
    payload.push_str(base_resume);
    if let Some(cover) = base_cover {
        payload.push_str("\n\nBASE COVER LETTER:\n");
        payload.push_str(cover);
    }
    Ok(payload)
}
