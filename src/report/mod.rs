//! Assembly and delivery of session reports.

pub mod client;
pub mod payload;
