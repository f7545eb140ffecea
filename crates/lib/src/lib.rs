//! rigging-lib: a weighted, stage-based dependency-construction engine.
//!
//! This crate provides:
//! - `Unit`: the descriptor of something to build (an id plus optional token)
//! - `MatcherTree`: weighted rules matched against the stack of units that
//!   led to the current request
//! - `BuildAction`: the steps a rule runs, grouped into pipeline stages
//! - `Engine`: resolves units, including transitive dependencies, caching
//!   singletons safely across threads
//! - `Manifest`: a JSON description of an engine, used by the `rig` CLI

pub mod action;
pub mod cache;
pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod manifest;
pub mod matcher;
pub mod session;
pub mod unit;
pub mod value;
