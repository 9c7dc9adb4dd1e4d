//! Data summary view
//!
//! Renders a `DataSummary` as per-entity cards plus paginated row tables. An absent
//! summary renders the empty state and blocks proceeding.

use rolemine_common::models::{DataSummary, EntityKind, Row};
use rolemine_common::{Error, Result};
use serde::Serialize;

/// Rows per table page
pub const PAGE_SIZE: usize = 10;

/// Message shown when no summary is available
pub const EMPTY_SUMMARY_MESSAGE: &str = "No data summary available. Please upload your files first.";

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    /// Total number of pages
    pub total_pages: usize,
    /// Offset of the first row on this page
    pub offset: usize,
}

/// Calculate pagination metadata from total results and requested page
///
/// The requested page is clamped into [1, total_pages].
///
/// # Examples
/// ```
/// use rolemine_wizard::summary_view::calculate_pagination;
///
/// let p = calculate_pagination(25, 2, 10);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 10);
///
/// // Requesting out-of-bounds page gets clamped
/// let p = calculate_pagination(25, 99, 10);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 20);
/// ```
pub fn calculate_pagination(total_results: usize, requested_page: usize, page_size: usize) -> Pagination {
    let page_size = page_size.max(1);
    let total_pages = total_results.div_ceil(page_size);
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * page_size;

    Pagination {
        page,
        total_pages,
        offset,
    }
}

/// One entity card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityCard {
    pub entity: EntityKind,
    pub label: &'static str,
    pub file_name: &'static str,
    pub count: usize,
    pub columns: Vec<String>,
}

/// Rendered summary view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SummaryView {
    Empty { message: &'static str },
    Ready { cards: Vec<EntityCard>, total_records: usize },
}

impl SummaryView {
    pub fn render(summary: Option<&DataSummary>) -> Self {
        let Some(summary) = summary else {
            return SummaryView::Empty {
                message: EMPTY_SUMMARY_MESSAGE,
            };
        };

        let cards: Vec<EntityCard> = EntityKind::ALL
            .iter()
            .filter_map(|kind| {
                summary.get(*kind).map(|entity| EntityCard {
                    entity: *kind,
                    label: kind.label(),
                    file_name: kind.file_name(),
                    count: entity.count,
                    columns: entity.columns.clone(),
                })
            })
            .collect();
        let total_records = cards.iter().map(|c| c.count).sum();

        SummaryView::Ready {
            cards,
            total_records,
        }
    }

    /// "Proceed" is only offered for a rendered summary
    pub fn can_proceed(&self) -> bool {
        matches!(self, SummaryView::Ready { .. })
    }
}

/// One page of rows for a single entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowPage {
    pub entity: EntityKind,
    pub pagination: Pagination,
    pub page_size: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Slice one entity's rows into a page
pub fn page_rows(summary: &DataSummary, kind: EntityKind, requested_page: usize) -> Result<RowPage> {
    let entity = summary
        .get(kind)
        .ok_or_else(|| Error::NotFound(format!("No rows for {}", kind)))?;

    let pagination = calculate_pagination(entity.data.len(), requested_page, PAGE_SIZE);
    let rows = entity
        .data
        .iter()
        .skip(pagination.offset)
        .take(PAGE_SIZE)
        .cloned()
        .collect();

    Ok(RowPage {
        entity: kind,
        pagination,
        page_size: PAGE_SIZE,
        columns: entity.columns.clone(),
        rows,
    })
}
