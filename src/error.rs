//! Error types for the waycache library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when cache geometry parameters are invalid
//!   (zero sets or zero entries per set).
//! - [`InvalidationError`]: Returned when a full set cannot shed an entry
//!   because its invalidator refused to pick a victim.
//! - [`UnwrapError`]: Returned when an entry downcast requests an
//!   incompatible concrete type.
//!
//! ## Example Usage
//!
//! ```
//! use waycache::cache::SetAssociativeCache;
//! use waycache::error::ConfigError;
//!
//! // Fallible constructor for user-configurable geometry
//! let cache: Result<SetAssociativeCache<String, i32>, ConfigError> =
//!     SetAssociativeCache::new(10, 5);
//! assert!(cache.is_ok());
//!
//! // Invalid geometry is caught without panicking
//! let bad = SetAssociativeCache::<String, i32>::new(0, 5);
//! assert!(bad.is_err());
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache geometry parameters are invalid.
///
/// Produced by the fallible constructors on
/// [`SetAssociativeCache`](crate::cache::SetAssociativeCache). Carries a
/// human-readable description of which parameter failed validation.
///
/// # Example
///
/// ```
/// use waycache::cache::SetAssociativeCache;
///
/// let err = SetAssociativeCache::<u64, u64>::new(4, 0).unwrap_err();
/// assert!(err.to_string().contains("one"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// InvalidationError
// ---------------------------------------------------------------------------

/// Error returned when a full set fails to shed an entry.
///
/// `insert` asks the set's invalidator for a victim before writing into a
/// full set. An invalidator that returns no victim while set slots exist has
/// broken its contract; the insert is abandoned and the cache is left
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationError(String);

impl InvalidationError {
    /// Creates a new `InvalidationError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvalidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvalidationError {}

// ---------------------------------------------------------------------------
// UnwrapError
// ---------------------------------------------------------------------------

/// Error returned when an entry downcast requests an incompatible type.
///
/// Produced by [`CacheEntry::unwrap_as`](crate::entry::CacheEntry::unwrap_as)
/// when the requested type is not the concrete entry type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnwrapError(String);

impl UnwrapError {
    /// Creates a new `UnwrapError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnwrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for UnwrapError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- ConfigError ------------------------------------------------------

    #[test]
    fn config_display_shows_message() {
        let err = ConfigError::new("sets must be > 0");
        assert_eq!(err.to_string(), "sets must be > 0");
    }

    #[test]
    fn config_debug_includes_message() {
        let err = ConfigError::new("bad geometry");
        let dbg = format!("{:?}", err);
        assert!(dbg.contains("bad geometry"));
    }

    #[test]
    fn config_message_accessor() {
        let err = ConfigError::new("test");
        assert_eq!(err.message(), "test");
    }

    #[test]
    fn config_clone_and_eq() {
        let a = ConfigError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn config_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<ConfigError>();
    }

    // -- InvalidationError ------------------------------------------------

    #[test]
    fn invalidation_display_shows_message() {
        let err = InvalidationError::new("no victim in full set");
        assert_eq!(err.to_string(), "no victim in full set");
    }

    #[test]
    fn invalidation_message_accessor() {
        let err = InvalidationError::new("test");
        assert_eq!(err.message(), "test");
    }

    #[test]
    fn invalidation_clone_and_eq() {
        let a = InvalidationError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn invalidation_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<InvalidationError>();
    }

    // -- UnwrapError ------------------------------------------------------

    #[test]
    fn unwrap_display_shows_message() {
        let err = UnwrapError::new("not the concrete entry type");
        assert_eq!(err.to_string(), "not the concrete entry type");
    }

    #[test]
    fn unwrap_clone_and_eq() {
        let a = UnwrapError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn unwrap_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<UnwrapError>();
    }
}
