use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const BUILTIN_CONTENT: &str = include_str!("../data/portfolio.json");

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub roles: Vec<String>,
    pub tagline: String,
    pub availability: String,
    pub email: String,
    pub phone: String,
    pub github: String,
    pub linkedin: String,
    pub location: String,
    pub resume_url: String,
    pub about: Vec<String>,
    pub highlights: Vec<Highlight>,
}

/// A headline figure shown next to the about text, e.g. `8.2` / `CGPA Score`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Highlight {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub duration: String,
    pub cgpa: String,
    pub location: String,
    pub coursework: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExperienceEntry {
    pub role: String,
    pub company: String,
    pub duration: String,
    pub location: String,
    pub bullets: Vec<String>,
    pub tech: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProjectEntry {
    pub title: String,
    pub description: String,
    pub long_description: Vec<String>,
    pub tech: Vec<String>,
    #[serde(default)]
    pub github: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RepoLink {
    pub name: String,
    pub description: String,
    pub language: String,
    #[serde(default)]
    pub stars: u32,
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SkillGroup {
    pub category: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Certification {
    pub title: String,
    pub issuer: String,
    pub year: String,
}

/// Read-only portfolio records backing every non-interactive section.
///
/// Loaded once at startup, either from the content embedded in the binary or
/// from a JSON file with the same shape. Nothing mutates it afterwards.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ContentStore {
    profile: Profile,
    education: Education,
    experiences: Vec<ExperienceEntry>,
    projects: Vec<ProjectEntry>,
    repos: Vec<RepoLink>,
    skill_groups: Vec<SkillGroup>,
    certifications: Vec<Certification>,
}

impl ContentStore {
    /// The portfolio content shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_CONTENT).context("Built-in portfolio content is invalid")
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let store: ContentStore = serde_json::from_str(json)?;
        Ok(store)
    }

    pub async fn load_from_json(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read content file {}", path.display()))?;
        let store = Self::from_json_str(&content)
            .with_context(|| format!("Failed to parse content file {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            experiences = store.experiences.len(),
            projects = store.projects.len(),
            repos = store.repos.len(),
            "Loaded portfolio content"
        );

        Ok(store)
    }

    /// Loads `path` when given, otherwise the built-in content.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_json(path).await,
            None => Self::builtin(),
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn education(&self) -> &Education {
        &self.education
    }

    pub fn experiences(&self) -> &[ExperienceEntry] {
        &self.experiences
    }

    pub fn projects(&self) -> &[ProjectEntry] {
        &self.projects
    }

    pub fn repos(&self) -> &[RepoLink] {
        &self.repos
    }

    pub fn skill_groups(&self) -> &[SkillGroup] {
        &self.skill_groups
    }

    pub fn certifications(&self) -> &[Certification] {
        &self.certifications
    }
}
