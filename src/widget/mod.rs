// The widget state machine and its visual state.
//
// `machine` owns the actor; `state` holds the pure band rules and the
// VisualState type; `sequences` builds the timelines the machine plays;
// `events` is the host-visible event surface.

pub mod events;
pub mod machine;
pub mod sequences;
pub mod state;
