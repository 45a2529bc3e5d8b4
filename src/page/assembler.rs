//! Page assembly
//!
//! Shapes a raw storage fetch into a [`Page`]: trims the look-ahead
//! document, restores natural order after a reversed fetch, sets the
//! navigation flags and encodes boundary cursors.

use super::types::{Page, PageInfo};
use crate::cursor::{CursorCodec, CursorDirection, CursorToken, PaginationKey};
use crate::error::Result;
use crate::query::{FetchMode, QueryPlan};
use crate::value::Document;

/// Builds pages from fetched documents
#[derive(Debug, Clone, Copy, Default)]
pub struct PageAssembler {
    codec: CursorCodec,
}

impl PageAssembler {
    /// Create an assembler encoding cursors with `codec`
    pub fn new(codec: CursorCodec) -> Self {
        Self { codec }
    }

    /// Assemble a page from documents fetched for `plan`.
    ///
    /// `fetched` is in fetch order and may hold one document more than the
    /// page size; that extra document only signals that more exist.
    pub fn assemble<D: Document>(
        &self,
        plan: &QueryPlan,
        mut fetched: Vec<D>,
        total: Option<u64>,
    ) -> Result<Page<D>> {
        let has_more = fetched.len() > plan.limit;
        fetched.truncate(plan.limit);

        if plan.mode.is_reversed() {
            fetched.reverse();
        }

        let (has_next, has_previous) = match plan.mode {
            FetchMode::First => (has_more, false),
            FetchMode::After(_) => (has_more, true),
            FetchMode::Before(_) => (true, has_more),
        };

        let next_cursor = match fetched.last() {
            Some(doc) if has_next => Some(self.cursor(plan, doc, CursorDirection::Next)?),
            _ => None,
        };
        let previous_cursor = match fetched.first() {
            Some(doc) if has_previous => {
                Some(self.cursor(plan, doc, CursorDirection::Previous)?)
            }
            _ => None,
        };

        tracing::debug!(
            "Assembled page of {} documents (has_next={}, has_previous={})",
            fetched.len(),
            has_next,
            has_previous
        );

        Ok(Page {
            documents: fetched,
            info: PageInfo {
                next_cursor,
                previous_cursor,
                has_next,
                has_previous,
                total,
            },
        })
    }

    fn cursor<D: Document>(
        &self,
        plan: &QueryPlan,
        doc: &D,
        direction: CursorDirection,
    ) -> Result<String> {
        let key = PaginationKey::from_document(doc, &plan.paginated_field, &plan.id_field)?;
        let token = CursorToken::new(direction, plan.paginated_field.clone(), key);
        Ok(self.codec.encode(&token))
    }
}
