//! Context passed to and between services as input.

mod state;

#[doc(inline)]
pub use std::convert::AsRef;

use crate::extensions::Extensions;
use crate::rt::Executor;
use std::fmt;

/// Context passed to and between services as input.
///
/// A [`Context`] carries the static `State` a service was built with,
/// together with a type map of dynamic [`Extensions`] that middleware can
/// use to pass data down the call chain without widening every service's
/// signature.
pub struct Context<S> {
    state: S,
    executor: Executor,
    extensions: Extensions,
}

impl<S: fmt::Debug> fmt::Debug for Context<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("state", &self.state)
            .field("extensions", &self.extensions)
            .finish()
    }
}

impl<S: Clone> Clone for Context<S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            executor: self.executor.clone(),
            extensions: self.extensions.clone(),
        }
    }
}

impl<S: Default> Default for Context<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> Context<S> {
    /// Create a new [`Context`] with the given state.
    pub fn new(state: S) -> Self {
        Self {
            state,
            executor: Executor::new(),
            extensions: Extensions::default(),
        }
    }

    /// Create a new [`Context`] with the given state and [`Executor`].
    pub fn with_executor(state: S, executor: Executor) -> Self {
        Self {
            state,
            executor,
            extensions: Extensions::default(),
        }
    }

    /// Get a reference to the state of this [`Context`].
    #[must_use]
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Get a mutable reference to the state of this [`Context`].
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Consume this [`Context`], returning its state.
    #[must_use]
    pub fn into_state(self) -> S {
        self.state
    }

    /// Get a reference to the [`Executor`] of this [`Context`].
    #[must_use]
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Swap the state of this [`Context`] for a new one, returning a
    /// [`Context`] with the new state but the same executor and extensions.
    pub fn map_state<T>(self, state: T) -> Context<T> {
        Context {
            state,
            executor: self.executor,
            extensions: self.extensions,
        }
    }

    /// Insert a value into the dynamic [`Extensions`] of this [`Context`].
    ///
    /// Returns the previous value of this type, if any.
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, val: T) -> Option<T> {
        self.extensions.insert(val)
    }

    /// Returns `true` if a value of type `T` is present in the [`Extensions`].
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains::<T>()
    }

    /// Get a reference to a value of type `T` from the [`Extensions`], if present.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    /// Get a mutable reference to a value of type `T` from the [`Extensions`], if present.
    pub fn get_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.extensions.get_mut::<T>()
    }

    /// Get a reference to a value of `T`, inserting `with()`'s result if absent.
    pub fn get_or_insert_with<T: Clone + Send + Sync + 'static>(
        &mut self,
        with: impl FnOnce() -> T,
    ) -> &T {
        if !self.contains::<T>() {
            self.insert(with());
        }
        self.get::<T>().expect("value was just inserted")
    }

    /// Get a reference to a value of `T`, inserting the value produced by
    /// `with(ctx)` (which may itself inspect the context) if absent.
    pub fn get_or_try_insert_with_ctx<T, E>(
        &mut self,
        with: impl FnOnce(&Self) -> Result<T, E>,
    ) -> Result<&T, E>
    where
        T: Clone + Send + Sync + 'static,
    {
        if !self.contains::<T>() {
            let val = with(self)?;
            self.insert(val);
        }
        Ok(self.get::<T>().expect("value was just inserted"))
    }

    /// Extend the [`Extensions`] of this [`Context`] with those of another.
    pub fn extend(&mut self, other: Extensions) {
        self.extensions.extend(other);
    }
}
