//! # veils
//!
//! Test-double wrappers around live objects.
//!
//! ## Architecture
//! - **Object**: the origin contract; members are looked up by name
//! - **Veil**: serves configured values until the first real access, then
//!   delegates everything to the origin
//! - **Unpiercable**: serves configured values forever
//! - **Memo**: caches real results per distinct argument set
//! - **VeilFactory**: builds a [`Veiled`] wrapper that also forwards the
//!   special operators (`op.len`, `op.eq`, ...) the origin implements
//!
//! Wrappers are single-threaded: they share state through `Rc` and are
//! neither `Send` nor `Sync`.
//!
//! ## Example
//! ```
//! use std::rc::Rc;
//! use veils::{unpiercable, Args, Object, Overrides, Value};
//!
//! # fn run(origin: Rc<dyn Object>) -> veils::Result<()> {
//! let fake = unpiercable(origin, Overrides::new().method("fetch", "cached"));
//! assert_eq!(fake.call("fetch", Args::new())?, Value::from("cached"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod factory;
mod key;
mod member;
mod memo;
mod object;
mod ops;
mod overrides;
mod router;
mod unpiercable;
mod value;
mod veil;

#[cfg(test)]
mod testing;

use std::rc::Rc;

pub use error::{Error, Result};
pub use factory::{implemented_ops, VeilFactory, Veiled};
pub use key::{canonical_key, CallKey, KeyFn};
pub use member::{resolve, AsyncCallable, AsyncStub, BoundMethod, Callable, Member, Stub};
pub use memo::{CacheFactory, Memo, MemoConfig, MemoizedAsyncMethod, MemoizedMethod};
pub use object::{deferred, is_instance, CallFuture, Deferred, MemberKind, Object, TypeTag};
pub use ops::{OpSet, SpecialOp};
pub use overrides::Overrides;
pub use router::{Router, Wrap};
pub use unpiercable::Unpiercable;
pub use value::{Args, Value};
pub use veil::{PiercingFlag, PiercingMethod, Veil, VeiledAsyncMethod, VeiledMethod};

pub use veilcache::{BoundedCache, CacheStats, LruCache};

/// Wrap `origin` in a [`Veil`] forwarding every operator it implements
pub fn veil(origin: Rc<dyn Object>, overrides: Overrides) -> Veiled<Veil> {
    VeilFactory::new().veil_of(origin, overrides)
}

/// Wrap `origin` in an [`Unpiercable`] forwarding every operator it implements
pub fn unpiercable(origin: Rc<dyn Object>, overrides: Overrides) -> Veiled<Unpiercable> {
    VeilFactory::new().veil_of(origin, overrides)
}

/// Wrap `origin` in a [`Memo`] forwarding every operator it implements
pub fn memo(origin: Rc<dyn Object>, config: MemoConfig) -> Veiled<Memo> {
    VeilFactory::new().veil_of(origin, config)
}
