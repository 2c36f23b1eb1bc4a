//! Per-unit-of-work recording metadata.
//!
//! A [`RecordingContext`] travels with every entity operation. Deriving a new
//! context (`with_user`, `with_source`, `disable`) copies the value, so a
//! nested operation can override the actor or source without the parent or
//! any sibling observing the change.

use crate::identity::{Source, User};

/// Actor, provenance, and the disable switch for one unit of work.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingContext {
    user: Option<User>,
    source: Option<Source>,
    disabled: bool,
}

impl RecordingContext {
    /// A context with no actor, no source, and recording enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a context carrying `user`.
    #[must_use]
    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    /// Derive a context carrying `source`.
    #[must_use]
    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    /// Derive a context in which no history entries are produced.
    #[must_use]
    pub fn disable(mut self) -> Self {
        self.disabled = true;
        self
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }

    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.disabled
    }
}

/// Derive a child of `ctx` carrying `user`. `ctx` is left untouched.
#[must_use]
pub fn with_user(ctx: &RecordingContext, user: User) -> RecordingContext {
    ctx.clone().with_user(user)
}

/// Derive a child of `ctx` carrying `source`. `ctx` is left untouched.
#[must_use]
pub fn with_source(ctx: &RecordingContext, source: Source) -> RecordingContext {
    ctx.clone().with_source(source)
}

/// Derive a child of `ctx` with recording suppressed. `ctx` is left untouched.
#[must_use]
pub fn disable(ctx: &RecordingContext) -> RecordingContext {
    ctx.clone().disable()
}

#[must_use]
pub fn get_user(ctx: &RecordingContext) -> Option<&User> {
    ctx.user()
}

#[must_use]
pub fn get_source(ctx: &RecordingContext) -> Option<&Source> {
    ctx.source()
}

#[must_use]
pub const fn is_disabled(ctx: &RecordingContext) -> bool {
    ctx.is_disabled()
}
