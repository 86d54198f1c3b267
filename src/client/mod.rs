//! Client-side pieces of the relief app: the aid request form and the
//! volunteer board.

pub mod aid_request_form;
pub mod volunteer_board;

pub use aid_request_form::{AidRequestForm, AidRequestPayload, AidRequestTransport, HttpTransport, MapPin};
pub use volunteer_board::VolunteerBoard;
