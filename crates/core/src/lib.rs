//! Core types for the packet simulator.
//!
//! This crate defines the vocabulary shared by the simulator and the
//! applications it runs:
//!
//! - [`Event`]: work items in the simulator's event queue
//! - [`AppEvent`]: inputs delivered to an application
//! - [`AppAction`]: requests an application returns to the simulator
//! - [`Application`]: the trait every application implements

mod action;
mod event;
mod timer;
mod traits;

pub use action::AppAction;
pub use event::{AppEvent, Event};
pub use timer::TimerId;
pub use traits::Application;
