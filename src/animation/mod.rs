// Animation primitives — driver abstraction and timeline value types.
//
// The driver trait keeps the tweening engine swappable: the state machine
// submits timelines and reacts to boundary notices without ever owning a
// clock, so tests can run the whole widget against the instant driver.

pub mod driver;
pub mod timeline;
