//! Individual action implementations.
//!
//! - [`instance`] - fixed value, the same instance on every resolution
//! - [`singleton`] - per-unit cache backed by the engine's [`CacheStore`](crate::cache::CacheStore)
//! - [`redirect`] - resolve another unit in place of the requested one
//! - [`factory`] - host closure producing the value

pub mod factory;
pub mod instance;
pub mod redirect;
pub mod singleton;

pub use factory::Factory;
pub use instance::Instance;
pub use redirect::{Redirect, RedirectToken};
pub use singleton::Singleton;
