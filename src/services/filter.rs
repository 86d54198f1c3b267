// src/services/filter.rs
use serde::{Deserialize, Serialize};

use crate::{
    errors::ResqResult,
    models::request::{AidRequest, AidType, RequestStatus, Urgency},
};

/// Listing criteria. Every `None` criterion is inactive; a request is kept
/// only if it satisfies all active ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestFilter {
    pub search: Option<String>,
    pub aid_type: Option<AidType>,
    pub urgency: Option<Urgency>,
    pub status: Option<RequestStatus>,
    pub contact: Option<String>,
}

impl RequestFilter {
    pub fn is_default(&self) -> bool {
        *self == RequestFilter::default()
    }

    pub fn matches(&self, request: &AidRequest) -> bool {
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let hit = request.details.to_lowercase().contains(&term)
                || request.aid_type.as_str().to_lowercase().contains(&term)
                || request
                    .location
                    .address()
                    .is_some_and(|address| address.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }
        if self.aid_type.is_some_and(|t| t != request.aid_type) {
            return false;
        }
        if self.urgency.is_some_and(|u| u != request.urgency) {
            return false;
        }
        if self.status.is_some_and(|s| s != request.status) {
            return false;
        }
        if let Some(contact) = &self.contact {
            if request.contact.as_deref() != Some(contact.as_str()) {
                return false;
            }
        }
        true
    }

    /// Keeps the input order.
    pub fn apply<'a>(&self, requests: impl IntoIterator<Item = &'a AidRequest>) -> Vec<AidRequest> {
        requests.into_iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

/// Query-string form of [`RequestFilter`]; `all` and empty values mean "no filter".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestQuery {
    #[serde(default, alias = "search")]
    pub q: Option<String>,
    #[serde(default, rename = "type")]
    pub aid_type: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
}

impl RequestQuery {
    pub fn into_filter(self) -> ResqResult<RequestFilter> {
        Ok(RequestFilter {
            search: active(self.q),
            aid_type: active(self.aid_type).map(|t| t.parse()).transpose()?,
            urgency: active(self.urgency).map(|u| u.parse()).transpose()?,
            status: active(self.status).map(|s| s.parse()).transpose()?,
            contact: active(self.contact),
        })
    }
}

fn active(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}
