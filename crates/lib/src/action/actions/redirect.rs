use crate::action::{ActionState, BuildAction};
use crate::error::BuildError;
use crate::session::BuildSession;
use crate::unit::{Key, Unit};
use crate::value::BuildValue;

/// Which token the redirected unit carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectToken {
  /// Reuse the token of the unit being built.
  Inherit,
  /// Build the target without a token.
  None,
  /// Build the target with this token.
  Explicit(Key),
}

/// Builds another unit and returns its value as the value of this one.
///
/// This is how an abstract unit is bound to a concrete one ("treat `Repo` as
/// `SqlRepo`"). The target is a required unit: if nothing can build it the
/// resolution fails with the target and the full stack in the error.
#[derive(Debug, Clone)]
pub struct Redirect {
  id: Key,
  token: RedirectToken,
}

impl Redirect {
  pub fn new(id: impl Into<Key>, token: RedirectToken) -> Self {
    Self { id: id.into(), token }
  }

  /// Redirect to `id` without a token.
  pub fn to(id: impl Into<Key>) -> Self {
    Self::new(id, RedirectToken::None)
  }

  pub fn target(&self, unit: &Unit) -> Unit {
    let token = match &self.token {
      RedirectToken::Inherit => unit.token.clone(),
      RedirectToken::None => None,
      RedirectToken::Explicit(token) => Some(token.clone()),
    };
    Unit::new(self.id.clone(), token)
  }
}

impl BuildAction for Redirect {
  fn process(
    &self,
    session: &mut BuildSession<'_>,
    unit: &Unit,
    _state: &mut ActionState,
  ) -> Result<Option<BuildValue>, BuildError> {
    session.build(self.target(unit)).map(Some)
  }
}
