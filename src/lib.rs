//! HOF Wizard - multi-step form wizard engine
//!
//! Drives linear and branching form journeys: each step is a controller
//! wrapped in guard middleware that enforces journey order, invalidates
//! abandoned branches, verifies CSRF tokens and computes back links. State
//! lives in a per-wizard slice of the HTTP session.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
