// Scoring — trait-based abstraction over the analysis backend, the two
// HTTP clients, and the request coordinator that feeds the widget.

pub mod client;
pub mod coordinator;
pub mod traits;
