//! Reactive plumbing: events, observable values, subscription guards.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`). There is no global
//! bus; every source hands out its own [`Subscription`] guards.

pub mod observable;
pub mod signal;

pub use observable::Observable;
pub use signal::{Signal, Subscription};
