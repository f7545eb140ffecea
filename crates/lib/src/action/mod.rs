//! Build actions and the stages they run in.
//!
//! An action is the primitive step of the construction pipeline. Matching a
//! unit against the matcher tree yields, per [`Stage`], a list of weighted
//! candidate actions; the session runs the winning action of each stage in
//! pipeline order until one of them produces a value.
//!
//! # Built-in Actions
//!
//! - [`Instance`] - always returns one fixed value
//! - [`Singleton`] - caches the value produced by later stages, per unit
//! - [`Redirect`] - builds a different unit and returns its value
//! - [`Factory`] - delegates to a host closure
//!
//! Hosts add their own by implementing [`BuildAction`].

pub mod actions;
mod types;

pub use actions::{Factory, Instance, Redirect, RedirectToken, Singleton};
pub use types::*;
