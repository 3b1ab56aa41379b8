//! Eventing - Events Flowing Into the Controller

pub mod ui_event;

pub use ui_event::*;
