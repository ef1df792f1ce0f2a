//! Project records

use serde::{Deserialize, Serialize};

use super::{null_as_default, RecordId};

/// A portfolio project as returned by `/projects` and `/projects/featured`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    #[serde(alias = "_id")]
    pub id: Option<RecordId>,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    pub description: Option<String>,
    #[serde(alias = "techStack", deserialize_with = "null_as_default")]
    pub tech_stack: Vec<String>,
    #[serde(alias = "githubUrl")]
    pub github_url: Option<String>,
    #[serde(alias = "liveUrl")]
    pub live_url: Option<String>,
    pub image: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub featured: bool,
}

impl Project {
    /// Whether the project links to source or a live deployment.
    pub fn has_links(&self) -> bool {
        self.github_url.as_deref().is_some_and(|url| !url.is_empty())
            || self.live_url.as_deref().is_some_and(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_project() {
        let project: Project = serde_json::from_value(json!({
            "id": 12,
            "title": "Tide Watcher",
            "description": "Beach conditions in the terminal",
            "techStack": ["Rust", "ratatui"],
            "githubUrl": "https://github.com/example/tide",
            "featured": true
        }))
        .expect("project should parse");

        assert_eq!(project.id, Some(RecordId::Number(12)));
        assert_eq!(project.tech_stack, vec!["Rust", "ratatui"]);
        assert!(project.featured);
        assert!(project.live_url.is_none());
        assert!(project.has_links());
    }

    #[test]
    fn test_snake_case_and_nulls() {
        let project: Project = serde_json::from_value(json!({
            "title": "Notes",
            "tech_stack": null,
            "live_url": "",
            "featured": null
        }))
        .expect("project should parse");

        assert!(project.tech_stack.is_empty());
        assert!(!project.featured);
        assert!(!project.has_links());
    }
}
