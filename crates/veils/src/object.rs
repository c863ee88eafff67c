//! The origin contract
//!
//! Wrappers never reflect over arbitrary Rust types. Anything that can be
//! wrapped implements [`Object`], which names its members explicitly and
//! dispatches reads and calls by name.

use std::any::{Any, TypeId};
use std::fmt;
use std::future::{Future, Ready};
use std::pin::Pin;

use crate::error::Result;
use crate::value::{Args, Value};

/// Future returned by asynchronous member calls
pub type CallFuture<'a> = Pin<Box<dyn Future<Output = Result<Value>> + 'a>>;

/// An already-resolved asynchronous result.
///
/// Awaiting it follows the normal future protocol but completes on the
/// first poll.
pub type Deferred = Ready<Result<Value>>;

/// Wrap a value so it can be awaited like a real asynchronous call
pub fn deferred(value: Value) -> Deferred {
    std::future::ready(Ok(value))
}

/// What kind of member a name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Plain attribute, read without calling
    Property,
    /// Synchronous method
    Method,
    /// Method whose result must be awaited
    AsyncMethod,
}

impl MemberKind {
    /// Check if the member can be called
    pub fn is_callable(self) -> bool {
        !matches!(self, MemberKind::Property)
    }
}

/// Type identity an object reports to [`is_instance`]
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    /// Tag for type `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Type id
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name
    pub fn full_name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path
    pub fn name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        match base.rfind("::") {
            Some(pos) => &self.name[pos + 2..],
            None => self.name,
        }
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// An object whose members can be read and called by name.
///
/// `member_kind` is the single source of truth for which names exist: an
/// unknown name must fail there with the object's own error, and the other
/// methods may assume `member_kind` was consulted first.
pub trait Object: Any {
    /// Type identity reported to type checks
    fn reported_type(&self) -> TypeTag {
        TypeTag::of::<Self>()
    }

    /// Classify a member, failing if the object has no such member
    fn member_kind(&self, name: &str) -> Result<MemberKind>;

    /// Read a property's current value
    fn get_attr(&self, name: &str) -> Result<Value>;

    /// Call a synchronous method
    fn call(&self, name: &str, args: Args) -> Result<Value>;

    /// Call an asynchronous method
    fn call_async<'a>(&'a self, name: &'a str, args: Args) -> CallFuture<'a>;
}

/// Check whether `obj` reports itself as a `T`
pub fn is_instance<T: Object>(obj: &dyn Object) -> bool {
    obj.reported_type().id() == TypeId::of::<T>()
}
