pub use crate::cache::{ConcurrentSetAssociativeCache, SetAssociativeCache};
pub use crate::ds::{LazyMinHeap, UseOrderList};
pub use crate::entry::CacheEntry;
pub use crate::error::{ConfigError, InvalidationError, UnwrapError};
pub use crate::policy::{Invalidator, LruInvalidator, MruInvalidator, SmallestValueInvalidator};
