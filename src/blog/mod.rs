//! Blog reader over a static JSON dataset.
//!
//! The whole catalog is loaded once at startup, sorted newest first, and
//! served from memory. Nothing here writes.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::pagination::{Page, PageRequest, lenient_count, lenient_flag};

/// Serialized in snake_case like the rest of the API; the camelCase names
/// used by the data file are accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// `YYYY-MM-DD` or RFC 3339.
    #[serde(alias = "publishedAt", alias = "date")]
    pub published_at: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, alias = "readTimeMinutes", alias = "readTime")]
    pub read_time_minutes: u32,
}

/// A post without its body, for listings and navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub category: String,
    pub tags: Vec<String>,
    pub published_at: String,
    pub featured: bool,
    pub read_time_minutes: u32,
}

impl From<&Post> for PostSummary {
    fn from(p: &Post) -> Self {
        Self {
            slug: p.slug.clone(),
            title: p.title.clone(),
            excerpt: p.excerpt.clone(),
            author: p.author.clone(),
            category: p.category.clone(),
            tags: p.tags.clone(),
            published_at: p.published_at.clone(),
            featured: p.featured,
            read_time_minutes: p.read_time_minutes,
        }
    }
}

/// Listing filters. All present filters must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogQuery {
    #[serde(default, deserialize_with = "lenient_count")]
    pub page: Option<usize>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub limit: Option<usize>,
    pub tag: Option<String>,
    pub category: Option<String>,
    pub q: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Adjacent {
    /// The next older post.
    pub previous: Option<PostSummary>,
    /// The next newer post.
    pub next: Option<PostSummary>,
}

#[derive(Debug, Default)]
pub struct BlogCatalog {
    /// Newest first.
    posts: Vec<Post>,
    by_slug: HashMap<String, usize>,
    default_limit: usize,
}

fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

impl BlogCatalog {
    /// Read a JSON array of posts from `path`.
    pub fn load(path: &Path, default_limit: usize) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Blog(format!("cannot read {}: {e}", path.display())))?;
        let posts: Vec<Post> = serde_json::from_str(&raw)
            .map_err(|e| AppError::Blog(format!("invalid blog data in {}: {e}", path.display())))?;
        let catalog = Self::from_posts(posts, default_limit)?;
        info!(path = %path.display(), posts = catalog.len(), "blog catalog loaded");
        Ok(catalog)
    }

    pub fn from_posts(posts: Vec<Post>, default_limit: usize) -> Result<Self, AppError> {
        let mut dated = Vec::with_capacity(posts.len());
        for post in posts {
            let when = parse_published(&post.published_at).ok_or_else(|| {
                AppError::Blog(format!(
                    "post '{}' has an invalid published_at: {}",
                    post.slug, post.published_at
                ))
            })?;
            dated.push((when, post));
        }
        dated.sort_by(|(a, pa), (b, pb)| b.cmp(a).then_with(|| pa.slug.cmp(&pb.slug)));

        let posts: Vec<Post> = dated.into_iter().map(|(_, p)| p).collect();
        let mut by_slug = HashMap::with_capacity(posts.len());
        for (i, post) in posts.iter().enumerate() {
            if post.slug.trim().is_empty() {
                return Err(AppError::Blog(format!("post '{}' has an empty slug", post.title)));
            }
            if by_slug.insert(post.slug.clone(), i).is_some() {
                return Err(AppError::Blog(format!("duplicate slug: {}", post.slug)));
            }
        }

        Ok(Self { posts, by_slug, default_limit: default_limit.max(1) })
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn list(&self, query: &BlogQuery) -> Page<PostSummary> {
        let req = PageRequest::new(query.page, query.limit, self.default_limit);
        let needle = query
            .q
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());
        let tag = query.tag.as_deref().map(str::trim).filter(|t| !t.is_empty());
        let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());

        let matches: Vec<PostSummary> = self
            .posts
            .iter()
            .filter(|p| tag.is_none_or(|t| p.tags.iter().any(|pt| eq_ignore_case(pt, t))))
            .filter(|p| category.is_none_or(|c| eq_ignore_case(&p.category, c)))
            .filter(|p| query.featured.is_none_or(|f| p.featured == f))
            .filter(|p| {
                needle.as_deref().is_none_or(|n| {
                    p.title.to_lowercase().contains(n)
                        || p.excerpt.to_lowercase().contains(n)
                        || p.tags.iter().any(|t| t.to_lowercase().contains(n))
                })
            })
            .map(PostSummary::from)
            .collect();

        Page::from_slice(&matches, req)
    }

    pub fn get(&self, slug: &str) -> Option<&Post> {
        self.by_slug.get(slug).map(|&i| &self.posts[i])
    }

    /// Neighbours of `slug` in publication order. `None` for an unknown slug.
    pub fn adjacent(&self, slug: &str) -> Option<Adjacent> {
        let &i = self.by_slug.get(slug)?;
        Some(Adjacent {
            previous: self.posts.get(i + 1).map(PostSummary::from),
            next: i.checked_sub(1).and_then(|j| self.posts.get(j)).map(PostSummary::from),
        })
    }

    pub fn tags(&self) -> Vec<TermCount> {
        count_terms(self.posts.iter().flat_map(|p| p.tags.iter()))
    }

    pub fn categories(&self) -> Vec<TermCount> {
        count_terms(self.posts.iter().map(|p| &p.category))
    }
}

/// Case-insensitive tally; the first spelling seen is the one reported.
fn count_terms<'a>(terms: impl Iterator<Item = &'a String>) -> Vec<TermCount> {
    let mut counts: BTreeMap<String, TermCount> = BTreeMap::new();
    for term in terms {
        let term = term.trim();
        if term.is_empty() {
            continue;
        }
        counts
            .entry(term.to_lowercase())
            .or_insert_with(|| TermCount { name: term.to_string(), count: 0 })
            .count += 1;
    }
    let mut out: Vec<TermCount> = counts.into_values().collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    out
}
