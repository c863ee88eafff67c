//! Resolved members and the handles that stand in for them

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::object::{deferred, CallFuture, MemberKind, Object};
use crate::value::{Args, Value};

/// A synchronous call target
pub trait Callable {
    /// Invoke with `args`
    fn call(&self, args: Args) -> Result<Value>;
}

/// An asynchronous call target
pub trait AsyncCallable {
    /// Invoke with `args`; the returned future owns everything it needs
    fn call(&self, args: Args) -> CallFuture<'static>;
}

/// What a router hands back for a member name
#[derive(Clone)]
pub enum Member {
    /// A plain value
    Value(Value),
    /// A synchronous callable
    Method(Rc<dyn Callable>),
    /// An asynchronous callable
    AsyncMethod(Rc<dyn AsyncCallable>),
}

impl Member {
    /// Kind of member this resolved to
    pub fn kind(&self) -> MemberKind {
        match self {
            Member::Value(_) => MemberKind::Property,
            Member::Method(_) => MemberKind::Method,
            Member::AsyncMethod(_) => MemberKind::AsyncMethod,
        }
    }

    /// Call a synchronous member
    pub fn call(&self, args: Args) -> Result<Value> {
        match self {
            Member::Method(method) => method.call(args),
            Member::Value(value) => Err(Error::NotCallable {
                found: value.kind_name(),
            }),
            Member::AsyncMethod(_) => Err(Error::TypeMismatch {
                expected: "method",
                found: "async method",
            }),
        }
    }

    /// Call an asynchronous member
    pub fn call_async(&self, args: Args) -> CallFuture<'static> {
        match self {
            Member::AsyncMethod(method) => method.call(args),
            Member::Value(value) => Box::pin(std::future::ready(Err(Error::NotCallable {
                found: value.kind_name(),
            }))),
            Member::Method(_) => Box::pin(std::future::ready(Err(Error::TypeMismatch {
                expected: "async method",
                found: "method",
            }))),
        }
    }

    /// The plain value, if this member is one
    pub fn into_value(self) -> Result<Value> {
        match self {
            Member::Value(value) => Ok(value),
            other => Err(Error::TypeMismatch {
                expected: "property",
                found: match other.kind() {
                    MemberKind::AsyncMethod => "async method",
                    _ => "method",
                },
            }),
        }
    }
}

/// The real member: an origin plus the name to dispatch on
#[derive(Clone)]
pub struct BoundMethod {
    origin: Rc<dyn Object>,
    name: Rc<str>,
}

impl BoundMethod {
    /// Bind `name` on `origin`
    pub fn new(origin: &Rc<dyn Object>, name: &str) -> Self {
        Self {
            origin: Rc::clone(origin),
            name: Rc::from(name),
        }
    }

    /// Bound member name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Callable for BoundMethod {
    fn call(&self, args: Args) -> Result<Value> {
        self.origin.call(&self.name, args)
    }
}

impl AsyncCallable for BoundMethod {
    fn call(&self, args: Args) -> CallFuture<'static> {
        let origin = Rc::clone(&self.origin);
        let name = Rc::clone(&self.name);
        Box::pin(async move { origin.call_async(&name, args).await })
    }
}

/// Returns a fixed value, ignoring its arguments
pub struct Stub {
    pub(crate) real: BoundMethod,
    pub(crate) value: Value,
}

impl Callable for Stub {
    fn call(&self, _args: Args) -> Result<Value> {
        Ok(self.value.clone())
    }
}

/// Returns a fixed value as an already-resolved future
pub struct AsyncStub {
    pub(crate) real: BoundMethod,
    pub(crate) value: Value,
}

impl AsyncCallable for AsyncStub {
    fn call(&self, _args: Args) -> CallFuture<'static> {
        Box::pin(deferred(self.value.clone()))
    }
}

impl Stub {
    /// Name of the member this stub replaces
    pub fn name(&self) -> &str {
        self.real.name()
    }
}

impl AsyncStub {
    /// Name of the member this stub replaces
    pub fn name(&self) -> &str {
        self.real.name()
    }
}

/// Resolve `name` on `origin` with no interception.
///
/// Properties are read now; methods come back bound to the origin.
pub fn resolve(origin: &Rc<dyn Object>, name: &str) -> Result<Member> {
    resolve_kind(origin, name, origin.member_kind(name)?)
}

/// Like [`resolve`] for a caller that already classified the member
pub(crate) fn resolve_kind(origin: &Rc<dyn Object>, name: &str, kind: MemberKind) -> Result<Member> {
    Ok(match kind {
        MemberKind::Property => Member::Value(origin.get_attr(name)?),
        MemberKind::Method => Member::Method(Rc::new(BoundMethod::new(origin, name))),
        MemberKind::AsyncMethod => Member::AsyncMethod(Rc::new(BoundMethod::new(origin, name))),
    })
}
