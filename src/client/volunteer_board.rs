// src/client/volunteer_board.rs
use std::collections::HashSet;

use crate::{
    models::request::{AidRequest, Urgency},
    services::filter::RequestFilter,
};

/// What a volunteer sees: the open requests, the current filter, and the
/// requests they have accepted this session. Acceptance here is local; the
/// server is told through `POST /api/aid-requests/{id}/accept`.
#[derive(Debug, Clone, Default)]
pub struct VolunteerBoard {
    requests: Vec<AidRequest>,
    accepted: HashSet<String>,
    filter: RequestFilter,
}

impl VolunteerBoard {
    pub fn new(requests: Vec<AidRequest>) -> Self {
        Self {
            requests,
            ..Default::default()
        }
    }

    pub fn set_filter(&mut self, filter: RequestFilter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> &RequestFilter {
        &self.filter
    }

    /// Requests passing the current filter, in board order.
    pub fn visible(&self) -> Vec<AidRequest> {
        self.filter.apply(&self.requests)
    }

    /// Returns false if the request was already accepted.
    pub fn accept(&mut self, request_id: &str) -> bool {
        self.accepted.insert(request_id.to_string())
    }

    pub fn is_accepted(&self, request_id: &str) -> bool {
        self.accepted.contains(request_id)
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    pub fn urgent_count(&self) -> usize {
        self.requests.iter().filter(|r| r.urgency == Urgency::High).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::request::AidType;
    use crate::seed;

    #[test]
    fn test_accept_is_idempotent() {
        let mut board = VolunteerBoard::new(seed::volunteer_board_requests());
        assert!(board.accept("req-250612-vb001"));
        assert!(!board.accept("req-250612-vb001"));
        assert_eq!(board.accepted_count(), 1);
        assert!(board.is_accepted("req-250612-vb001"));
        assert!(!board.is_accepted("req-250612-vb002"));
    }

    #[test]
    fn test_visible_follows_filter() {
        let mut board = VolunteerBoard::new(seed::volunteer_board_requests());
        assert_eq!(board.visible().len(), 5);
        assert_eq!(board.urgent_count(), 2);

        board.set_filter(RequestFilter {
            aid_type: Some(AidType::Transportation),
            ..Default::default()
        });
        let visible = board.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "req-250611-vb004");

        board.set_filter(RequestFilter::default());
        assert!(board.filter().is_default());
        assert_eq!(board.visible().len(), 5);
    }
}
