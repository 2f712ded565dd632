// Litmus: animated toxicity indicator widget engine
//
// This is the library root. Each module corresponds to a major subsystem
// of the widget: animation primitives, gradient math, the state machine,
// and the scoring request pipeline.

pub mod animation;
pub mod config;
pub mod gradient;
pub mod output;
pub mod scoring;
pub mod session;
pub mod widget;
