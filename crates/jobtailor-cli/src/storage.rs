//! Application-root layout, first-run scaffolding, and per-application
//! folder storage.
//!
//! Layout under `~/.jobtailor/`:
//!
//! ```text
//! config.json
//! templates/resume.txt      base resume (example written on first run)
//! templates/cover.txt       base cover letter (optional)
//! jobs/<prefix>-<slug>/     one folder per generated application
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jobtailor_core::{Node, NodeType, TailoredApplication};
use serde::Serialize;

const EXAMPLE_RESUME: &str = "YOUR NAME
your.email@example.com | (555) 123-4567 | linkedin.com/in/yourprofile

PROFESSIONAL SUMMARY
Results-driven professional with X years of experience in [your field].
Proven track record of [key achievement].

EXPERIENCE

Job Title | Company Name | Month Year - Present
- Accomplishment-driven bullet with quantifiable results
- Key responsibility demonstrating relevant skills

EDUCATION
Degree Name | University Name | Year

SKILLS
- Technical: [skill1, skill2, skill3]
";

const EXAMPLE_COVER: &str = "YOUR NAME
your.email@example.com | (555) 123-4567

Dear Hiring Manager,

OPENING: state the position and a hook that demonstrates your fit.

BODY: connect 2-3 relevant achievements to the job requirements, with
specific examples and quantifiable results.

CLOSING: reiterate interest, summarize fit, request an interview.

Sincerely,
Your Name
";

/// Resolved filesystem layout for one application root.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub config_file: PathBuf,
    pub templates: PathBuf,
    pub jobs: PathBuf,
}

impl AppPaths {
    /// The default root: `~/.jobtailor`.
    pub fn resolve() -> Result<Self> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        Ok(Self::at(home.join(".jobtailor")))
    }

    pub fn at(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.json"),
            templates: root.join("templates"),
            jobs: root.join("jobs"),
            root,
        }
    }

    /// Create the directory tree and example templates if absent.
    /// Existing files are never overwritten.
    pub fn scaffold(&self) -> Result<()> {
        for dir in [&self.root, &self.templates, &self.jobs] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create {}", dir.display()))?;
        }
        for (name, content) in [("resume.txt", EXAMPLE_RESUME), ("cover.txt", EXAMPLE_COVER)] {
            let path = self.templates.join(name);
            if !path.exists() {
                std::fs::write(&path, content)
                    .with_context(|| format!("cannot write {}", path.display()))?;
            }
        }
        Ok(())
    }

    pub fn read_resume_template(&self) -> Result<String> {
        let path = self.templates.join("resume.txt");
        std::fs::read_to_string(&path)
            .with_context(|| format!("read resume template {}", path.display()))
    }

    /// The cover template is optional; absence means "no cover letter".
    pub fn read_cover_template(&self) -> Option<String> {
        std::fs::read_to_string(self.templates.join("cover.txt")).ok()
    }
}

/// Derive a folder slug from the classified document: the reader-proxy
/// title if present, else the first job-title heading. A random prefix
/// keeps repeat runs against the same posting from colliding.
pub fn slugify(nodes: &[Node]) -> String {
    let title = nodes
        .iter()
        .find_map(|node| match node.node_type {
            NodeType::JinaTitle => Some(node.content.trim_start_matches("Title:").to_string()),
            NodeType::JobTitle => Some(
                node.content
                    .trim_start_matches(['#', '*', ' ', '\t'])
                    .to_string(),
            ),
            _ => None,
        })
        .unwrap_or_default();

    let prefix: String = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();

    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_matches('-');

    if slug.is_empty() {
        prefix
    } else {
        format!("{prefix}-{slug}")
    }
}

#[derive(Serialize)]
struct ApplicationMeta<'a> {
    company: &'a str,
    role: &'a str,
    score: i64,
    tokens: i64,
    date: String,
}

/// Write one generated application into its own folder under `jobs/`:
/// `resume.txt`, `cover.txt` when present, and `meta.json`.
pub fn store_application(
    paths: &AppPaths,
    nodes: &[Node],
    app: &TailoredApplication,
) -> Result<PathBuf> {
    let dir = paths.jobs.join(slugify(nodes));
    std::fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;

    write_file(&dir.join("resume.txt"), &app.resume)?;
    if let Some(cover) = &app.cover {
        write_file(&dir.join("cover.txt"), cover)?;
    }

    let meta = ApplicationMeta {
        company: &app.company,
        role: &app.role,
        score: app.score,
        tokens: app.tokens_used,
        date: chrono::Local::now().format("%Y-%m-%d").to_string(),
    };
    write_file(&dir.join("meta.json"), &serde_json::to_string_pretty(&meta)?)?;

    Ok(dir)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("write {}", path.display()))
}
