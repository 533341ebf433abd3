//! Look up one employee's row in a published payroll sheet and turn it into
//! a salary slip.
//!
//! The pipeline is fetch → [`schema::infer`] → [`schema::detect_id_column`]
//! → [`resolve::resolve`] → [`render`], driven per search by
//! [`session::SearchSession`].

pub mod config;
pub mod error;
pub mod fetch;
pub mod render;
pub mod resolve;
pub mod schema;
pub mod session;

pub use config::Config;
pub use error::{Result, SearchError};
pub use session::{SearchOutcome, SearchRequest, SearchSession, SearchSlot, Ticket};
