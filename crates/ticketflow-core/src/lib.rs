pub mod clock;
pub mod dataset;
pub mod error;
pub mod graph;
pub mod policy;
pub mod report;
pub mod split;
pub mod status;
pub mod store;
pub mod ticket;
pub mod types;

pub use error::{Result, TicketflowError};
