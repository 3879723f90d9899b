//! Scroll cursors.
//!
//! A scroll search returns an opaque cursor with every page. Feeding the
//! cursor back (see [`ScrollCursor::continuation`]) fetches the next page.
//! The scroll is exhausted once a page comes back without hits.

use tracing::debug;

use search_dsl_shared::Criteria;

use crate::connection::Connection;
use crate::errors::SearchError;
use crate::response::Response;

/// Continuation token plus keep-alive, both passed back verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollCursor {
    pub id: String,
    pub timeout: String,
}

impl ScrollCursor {
    pub fn new(id: impl Into<String>, timeout: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timeout: timeout.into(),
        }
    }

    /// The cursor for the page after `response`, if the engine returned one.
    pub fn from_response(response: &Response, timeout: &str) -> Option<Self> {
        response
            .scroll_id()
            .map(|id| Self::new(id, timeout))
    }

    /// A criteria requesting the next page. Executing it sends only the
    /// cursor, never the query body.
    pub fn continuation(&self, criteria: &Criteria) -> Criteria {
        criteria.scroll_continue(&self.id, &self.timeout)
    }
}

/// Where a [`Scroll`] currently stands.
#[derive(Debug, Clone)]
pub enum ScrollState {
    /// Not started yet; the first page opens the scroll context.
    Pending(Criteria),
    /// At least one page was read and the engine handed back a cursor.
    Active { criteria: Criteria, cursor: ScrollCursor },
    /// A page without hits was seen, or no cursor was returned.
    Exhausted,
}

/// Page-by-page iteration over a scroll search.
pub struct Scroll<'a> {
    connection: &'a Connection,
    timeout: String,
    state: ScrollState,
}

impl<'a> Scroll<'a> {
    pub fn new(connection: &'a Connection, criteria: Criteria, timeout: impl Into<String>) -> Self {
        Self {
            connection,
            timeout: timeout.into(),
            state: ScrollState::Pending(criteria),
        }
    }

    pub fn state(&self) -> &ScrollState {
        &self.state
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, ScrollState::Exhausted)
    }

    /// Fetch the next non-empty page, or `None` once the scroll is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Response>, SearchError> {
        let (criteria, request) = match &self.state {
            ScrollState::Exhausted => return Ok(None),
            ScrollState::Pending(criteria) => (criteria.clone(), criteria.scroll(&self.timeout)),
            ScrollState::Active { criteria, cursor } => {
                (criteria.clone(), cursor.continuation(criteria))
            }
        };

        let response = match self.connection.search(&request).await {
            Ok(response) => response,
            Err(err) => {
                self.state = ScrollState::Exhausted;
                return Err(err);
            }
        };

        if response.is_empty() {
            debug!("Scroll exhausted");
            self.state = ScrollState::Exhausted;
            return Ok(None);
        }

        self.state = match ScrollCursor::from_response(&response, &self.timeout) {
            Some(cursor) => ScrollState::Active { criteria, cursor },
            None => ScrollState::Exhausted,
        };
        Ok(Some(response))
    }
}
