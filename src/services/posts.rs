//! Input rules for posts and comments: trimming, limits, tag normalization,
//! search patterns and paging.

use crate::error::{AppError, AppResult};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_TAGS: usize = 10;
pub const MAX_TAG_LEN: usize = 30;
pub const MAX_COMMENT_LEN: usize = 1000;
pub const MAX_BIO_LEN: usize = 500;
const MAX_IMAGE_REF_LEN: usize = 2048;
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

pub fn normalize_title(title: &str) -> AppResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::Validation(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(title.to_string())
}

pub fn normalize_content(content: &str) -> AppResult<String> {
    if content.trim().is_empty() {
        return Err(AppError::Validation("Content is required".to_string()));
    }
    Ok(content.trim_end().to_string())
}

fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim().trim_start_matches('#').trim().to_lowercase();
    (!tag.is_empty()).then_some(tag)
}

/// Lowercased, `#`-stripped, deduplicated tags in first-seen order.
pub fn normalize_tags(raw: &[String]) -> AppResult<Vec<String>> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.iter().filter_map(|t| normalize_tag(t)) {
        if tag.chars().count() > MAX_TAG_LEN {
            return Err(AppError::Validation(format!(
                "Tags must be at most {} characters",
                MAX_TAG_LEN
            )));
        }
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    if tags.len() > MAX_TAGS {
        return Err(AppError::Validation(format!(
            "A post can have at most {} tags",
            MAX_TAGS
        )));
    }
    Ok(tags)
}

pub fn normalize_tag_filter(raw: Option<&str>) -> Option<String> {
    raw.and_then(normalize_tag)
}

/// Cover images and avatars: a site-relative path or an http(s) URL.
/// Blank clears the value.
pub fn normalize_image_ref(raw: &str) -> AppResult<Option<String>> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let acceptable = (value.starts_with('/') && !value.starts_with("//"))
        || value.starts_with("https://")
        || value.starts_with("http://");
    if !acceptable || value.len() > MAX_IMAGE_REF_LEN {
        return Err(AppError::Validation("Invalid image URL".to_string()));
    }
    Ok(Some(value.to_string()))
}

pub fn normalize_comment(content: &str) -> AppResult<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("Comment cannot be empty".to_string()));
    }
    if content.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::Validation(format!(
            "Comment must be at most {} characters",
            MAX_COMMENT_LEN
        )));
    }
    Ok(content.to_string())
}

pub fn normalize_bio(raw: &str) -> AppResult<Option<String>> {
    let bio = raw.trim();
    if bio.chars().count() > MAX_BIO_LEN {
        return Err(AppError::Validation(format!(
            "Bio must be at most {} characters",
            MAX_BIO_LEN
        )));
    }
    Ok((!bio.is_empty()).then(|| bio.to_string()))
}

/// Substring ILIKE pattern with `\`, `%` and `_` escaped.
pub fn search_pattern(q: Option<&str>) -> Option<String> {
    let q = q?.trim();
    if q.is_empty() {
        return None;
    }
    let mut pattern = String::with_capacity(q.len() + 2);
    pattern.push('%');
    for c in q.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}

pub fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}
