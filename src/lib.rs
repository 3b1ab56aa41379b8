//! Air Markets Dashboard Library
//!
//! Filter-driven analytics over flight routes and air-travel markets: the
//! current selections drive a routes map layer, a markets map layer and a
//! set of ranked charts, all kept in sync through one controller.

pub mod constants;
pub mod domain;
pub mod error;
pub mod eventing;
pub mod features;
pub mod services;
pub mod state;
pub mod utils;

#[cfg(test)]
mod testing;
