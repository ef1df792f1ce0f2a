//! Plain-text rendering of portfolio records
//!
//! These are the terminal counterparts of the site's card templates: pure
//! functions from records to strings, plus the loading/empty/error
//! placeholders shown when there is nothing to render.

use std::fmt::Write;

use crate::data::{Blog, Project};

/// Longest excerpt shown on a card, in characters
const EXCERPT_LIMIT: usize = 160;

/// Placeholder states for a content area
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    Loading,
    Empty(Option<String>),
    Error(Option<String>),
}

impl Placeholder {
    pub fn render(&self) -> String {
        match self {
            Placeholder::Loading => "Loading...".to_string(),
            Placeholder::Empty(message) => message
                .clone()
                .unwrap_or_else(|| "Nothing here yet.".to_string()),
            Placeholder::Error(message) => format!(
                "Something went wrong: {}",
                message.as_deref().unwrap_or("please try again later.")
            ),
        }
    }
}

/// Shortens `text` to `limit` characters, ending on a word boundary.
pub fn truncate(text: &str, limit: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let cut: String = text.chars().take(limit).collect();
    let trimmed = match cut.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}...", trimmed.trim_end())
}

/// One blog entry for a list view
pub fn render_blog_card(blog: &Blog) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", heading(&blog.title, "Untitled post"));

    let mut meta = Vec::new();
    if let Some(date) = blog.display_date() {
        meta.push(date);
    }
    meta.push(format!("{} min read", blog.reading_time_minutes()));
    let _ = writeln!(out, "  {}", meta.join(" · "));

    if let Some(excerpt) = blog.excerpt.as_deref().filter(|e| !e.trim().is_empty()) {
        let _ = writeln!(out, "  {}", truncate(excerpt, EXCERPT_LIMIT));
    }
    if !blog.tags.is_empty() {
        let _ = writeln!(out, "  {}", format_tags(&blog.tags));
    }
    if !blog.slug.is_empty() {
        let _ = writeln!(out, "  -> folio blog {}", blog.slug);
    }
    out
}

/// Full blog post
pub fn render_blog_detail(blog: &Blog) -> String {
    let mut out = String::new();
    let title = heading(&blog.title, "Untitled post");
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "=".repeat(title.chars().count()));

    if let Some(date) = blog.display_date() {
        let _ = writeln!(out, "{} · {} min read", date, blog.reading_time_minutes());
    }
    if !blog.tags.is_empty() {
        let _ = writeln!(out, "{}", format_tags(&blog.tags));
    }
    let _ = writeln!(out);

    match blog.content.as_deref().or(blog.excerpt.as_deref()) {
        Some(body) if !body.trim().is_empty() => {
            let _ = writeln!(out, "{}", body.trim_end());
        }
        _ => {
            let empty = Placeholder::Empty(Some("This post has no content.".to_string()));
            let _ = writeln!(out, "{}", empty.render());
        }
    }
    out
}

/// One project entry for a list view
pub fn render_project_card(project: &Project) -> String {
    let mut out = String::new();
    let marker = if project.featured { " ★" } else { "" };
    let _ = writeln!(out, "{}{}", heading(&project.title, "Untitled project"), marker);

    if let Some(description) = project.description.as_deref().filter(|d| !d.trim().is_empty()) {
        let _ = writeln!(out, "  {}", truncate(description, EXCERPT_LIMIT));
    }
    if !project.tech_stack.is_empty() {
        let _ = writeln!(out, "  Built with: {}", project.tech_stack.join(", "));
    }
    if let Some(url) = project.github_url.as_deref().filter(|u| !u.is_empty()) {
        let _ = writeln!(out, "  Code: {}", url);
    }
    if let Some(url) = project.live_url.as_deref().filter(|u| !u.is_empty()) {
        let _ = writeln!(out, "  Live: {}", url);
    }
    out
}

/// Blog list, or the empty placeholder
pub fn render_blog_list(blogs: &[Blog]) -> String {
    if blogs.is_empty() {
        return Placeholder::Empty(Some("No blog posts yet.".to_string())).render();
    }
    blogs
        .iter()
        .map(render_blog_card)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Project list, or the empty placeholder
pub fn render_project_list(projects: &[Project]) -> String {
    if projects.is_empty() {
        return Placeholder::Empty(Some("No projects to show.".to_string())).render();
    }
    projects
        .iter()
        .map(render_project_card)
        .collect::<Vec<_>>()
        .join("\n")
}

fn heading<'a>(title: &'a str, fallback: &'a str) -> &'a str {
    let title = title.trim();
    if title.is_empty() {
        fallback
    } else {
        title
    }
}

fn format_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!("#{}", tag))
        .collect::<Vec<_>>()
        .join(" ")
}
