use serde::{Deserialize, Serialize};

/// Semantic category assigned to one line of a rendered job posting.
///
/// The taxonomy is closed: every non-blank line maps to exactly one
/// variant or is discarded outright by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// `Title: ...` header emitted by the reader proxy.
    JinaTitle,
    /// `URL Source: ...` header emitted by the reader proxy.
    JinaUrl,
    /// The literal `Markdown Content:` separator line.
    JinaMarker,
    /// A line of repeated `-` or `=` (a setext heading underline).
    SetextUnderline,
    /// A line consisting entirely of markdown links (navigation noise).
    NavLink,
    /// Contains a currency amount.
    Salary,
    /// Contains an `N+ years` or `N-M years` experience requirement.
    YearsExp,
    /// Bare line with a remote/hybrid/on-site cue or a "City, Region" token.
    Location,
    /// Heading whose text has a `Key: Value` shape.
    MetaField,
    /// Heading containing a known section word (about, benefits, ...).
    SectionHeader,
    /// Heading containing a seniority term (senior, staff, director, ...).
    JobTitle,
    /// Heading matching none of the more specific shapes.
    Heading,
    /// List item.
    Bullet,
    /// Short generic prose.
    Body,
    /// Reserved default for documents serialized by older revisions.
    /// Treated exactly like body.
    Unknown,
}

impl NodeType {
    /// Structural noise that never survives the full pipeline.
    pub const DROP_SET: [NodeType; 3] = [
        NodeType::JinaMarker,
        NodeType::SetextUnderline,
        NodeType::NavLink,
    ];

    pub fn is_dropped(self) -> bool {
        Self::DROP_SET.contains(&self)
    }
}

/// One input line plus its assigned category.
///
/// `content` is the original line verbatim, leading markdown markers
/// included. Nodes are immutable once built; a `Vec<Node>` in original
/// line order represents one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub content: String,
    pub node_type: NodeType,
}

impl Node {
    pub fn new(content: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            content: content.into(),
            node_type,
        }
    }
}
