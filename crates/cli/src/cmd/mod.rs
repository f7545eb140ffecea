mod check;
mod resolve;
mod tree;

pub use check::cmd_check;
pub use resolve::{ResolveRequest, cmd_resolve};
pub use tree::cmd_tree;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use rigging_lib::engine::Engine;
use rigging_lib::manifest::Manifest;

fn load_manifest(path: &Path) -> Result<Manifest> {
  let manifest =
    Manifest::from_path(path).with_context(|| format!("Failed to load manifest {}", path.display()))?;
  debug!(path = %path.display(), rules = manifest.rules.len(), "loaded manifest");
  Ok(manifest)
}

fn load_engine(path: &Path) -> Result<Engine> {
  load_manifest(path)?
    .into_engine()
    .with_context(|| format!("Failed to build engine from {}", path.display()))
}
