//! Search Module
//!
//! Filtering, sorting and pagination over directory listings.
//!
//! Listings are rebuilt from a directory scan on every call and never
//! cached. Filters run in a fixed order (name, size, created, modified,
//! lock status), then the result is sorted, counted, and paginated.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};

/// Default page size for listings
pub const DEFAULT_LIMIT: usize = 50;

/// A document found by a directory scan
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub locked: bool,
    pub record_type: String,

    /// `metadata.title`, when readable
    pub title: Option<String>,

    /// Length of the payload when it is an array (messages, entries)
    pub item_count: Option<usize>,
}

/// Field to sort listings by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Name,
    Size,
    Created,
    #[default]
    Modified,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Listing filters and paging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    /// Case-insensitive regular expression matched against file names
    pub name_pattern: Option<String>,

    pub min_size: Option<u64>,
    pub max_size: Option<u64>,

    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,

    pub modified_after: Option<DateTime<Utc>>,
    pub modified_before: Option<DateTime<Utc>>,

    /// Keep only locked (`true`) or unlocked (`false`) files
    pub locked: Option<bool>,

    pub sort_by: SortField,
    pub sort_order: SortOrder,

    pub offset: usize,
    pub limit: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            name_pattern: None,
            min_size: None,
            max_size: None,
            created_after: None,
            created_before: None,
            modified_after: None,
            modified_before: None,
            locked: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl SearchParams {
    /// Every match on one page
    pub fn unbounded() -> Self {
        Self {
            limit: usize::MAX,
            ..Default::default()
        }
    }

    /// Compile the name pattern, if any
    pub fn compile_pattern(&self) -> Result<Option<Regex>> {
        self.name_pattern
            .as_deref()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| VaultError::InvalidQuery(format!("bad name pattern: {}", e)))
            })
            .transpose()
    }

    fn matches(&self, pattern: Option<&Regex>, file: &FileInfo) -> bool {
        if let Some(regex) = pattern {
            if !regex.is_match(&file.name) {
                return false;
            }
        }
        if self.min_size.is_some_and(|min| file.size < min) {
            return false;
        }
        if self.max_size.is_some_and(|max| file.size > max) {
            return false;
        }
        if !in_range(file.created_at, self.created_after, self.created_before) {
            return false;
        }
        if !in_range(file.modified_at, self.modified_after, self.modified_before) {
            return false;
        }
        if self.locked.is_some_and(|locked| file.locked != locked) {
            return false;
        }
        true
    }
}

fn in_range(at: DateTime<Utc>, after: Option<DateTime<Utc>>, before: Option<DateTime<Utc>>) -> bool {
    after.map_or(true, |after| at >= after) && before.map_or(true, |before| at <= before)
}

/// Paging summary for a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,

    /// Matches before pagination
    pub total: usize,

    pub page_info: PageInfo,
}

/// Filter, sort and paginate scanned files
pub fn apply(mut files: Vec<FileInfo>, params: &SearchParams) -> Result<Page<FileInfo>> {
    let pattern = params.compile_pattern()?;

    files.retain(|file| params.matches(pattern.as_ref(), file));
    sort(&mut files, params.sort_by, params.sort_order);

    Ok(paginate(files, params.offset, params.limit))
}

/// Stable sort; ties are broken by name so pages are deterministic
pub fn sort(files: &mut [FileInfo], field: SortField, order: SortOrder) {
    files.sort_by(|a, b| {
        let primary = match field {
            SortField::Name => a.name.cmp(&b.name),
            SortField::Size => a.size.cmp(&b.size),
            SortField::Created => a.created_at.cmp(&b.created_at),
            SortField::Modified => a.modified_at.cmp(&b.modified_at),
        };
        let ordering = primary.then_with(|| a.name.cmp(&b.name));
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// Cut one page out of `items`; a zero limit is treated as one
pub fn paginate<T>(items: Vec<T>, offset: usize, limit: usize) -> Page<T> {
    let limit = limit.max(1);
    let total = items.len();

    let page_items: Vec<T> = items.into_iter().skip(offset).take(limit).collect();
    let shown_until = offset.saturating_add(page_items.len());

    Page {
        page_info: PageInfo {
            page: offset / limit + 1,
            page_size: limit,
            total_pages: total.div_ceil(limit),
            has_next: shown_until < total,
            has_previous: offset > 0,
        },
        items: page_items,
        total,
    }
}
