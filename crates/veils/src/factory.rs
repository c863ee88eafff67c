//! Special-operator forwarding
//!
//! [`VeilFactory`] wraps an origin in a [`Veiled`] router. At wrap time it
//! probes which special operators the origin implements and records, per
//! operator, whether calls go through the router (proxied) or straight to
//! the origin (naked). Operators the origin lacks are not advertised.

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::member::Member;
use crate::object::{CallFuture, MemberKind, Object, TypeTag};
use crate::ops::{OpSet, SpecialOp};
use crate::router::{Router, Wrap};
use crate::value::{Args, Value};

/// Builds [`Veiled`] wrappers of one router kind.
///
/// Naked operators win over proxied ones when a set names both.
pub struct VeilFactory<R> {
    proxied: OpSet,
    naked: OpSet,
    _kind: PhantomData<fn() -> R>,
}

impl<R: Wrap> Default for VeilFactory<R> {
    fn default() -> Self {
        Self {
            proxied: OpSet::all(),
            naked: OpSet::empty(),
            _kind: PhantomData,
        }
    }
}

impl<R: Wrap> VeilFactory<R> {
    /// Factory proxying every operator, with none naked
    pub fn new() -> Self {
        Self::default()
    }

    /// Operators routed through the wrapper's router
    pub fn with_proxied(mut self, ops: OpSet) -> Self {
        self.proxied = ops;
        self
    }

    /// Operators forwarded straight to the origin
    pub fn with_naked(mut self, ops: OpSet) -> Self {
        self.naked = ops;
        self
    }

    /// Configured proxied operators
    pub fn proxied(&self) -> OpSet {
        self.proxied
    }

    /// Configured naked operators
    pub fn naked(&self) -> OpSet {
        self.naked
    }

    /// Wrap `origin`, forwarding exactly the operators it implements
    pub fn veil_of(&self, origin: Rc<dyn Object>, config: R::Config) -> Veiled<R> {
        let implemented = implemented_ops(origin.as_ref());
        let naked = implemented.intersection(self.naked);
        let proxied = implemented.intersection(self.proxied).difference(naked);
        let router = R::wrap(origin, config);

        debug!(
            "Built {} for {} forwarding {} operator(s) ({} naked)",
            router.kind(),
            router.origin().reported_type().name(),
            proxied.len() + naked.len(),
            naked.len()
        );

        Veiled {
            router,
            proxied,
            naked,
        }
    }
}

/// Operators `origin` exposes as callable members
pub fn implemented_ops(origin: &dyn Object) -> OpSet {
    SpecialOp::ALL
        .into_iter()
        .filter(|op| {
            origin
                .member_kind(op.member_name())
                .map_or(false, MemberKind::is_callable)
        })
        .collect()
}

/// A wrapper around an origin object.
///
/// Named members and proxied operators go through the router `R`; naked
/// operators go straight to the origin. Type checks see the origin's type.
pub struct Veiled<R> {
    router: R,
    proxied: OpSet,
    naked: OpSet,
}

impl<R: Router> Veiled<R> {
    /// The router deciding member access
    pub fn router(&self) -> &R {
        &self.router
    }

    /// The wrapped object
    pub fn origin(&self) -> &Rc<dyn Object> {
        self.router.origin()
    }

    /// Resolve a member through the router
    pub fn member(&self, name: &str) -> Result<Member> {
        self.router.route(name)
    }

    /// Read a property
    pub fn get(&self, name: &str) -> Result<Value> {
        self.member(name)?.into_value()
    }

    /// Call a synchronous method
    pub fn call(&self, name: &str, args: Args) -> Result<Value> {
        self.member(name)?.call(args)
    }

    /// Call an asynchronous method
    pub fn call_async(&self, name: &str, args: Args) -> CallFuture<'static> {
        match self.member(name) {
            Ok(member) => member.call_async(args),
            Err(e) => Box::pin(std::future::ready(Err(e))),
        }
    }

    /// Operators this wrapper forwards
    pub fn operators(&self) -> OpSet {
        self.proxied.union(self.naked)
    }

    /// Check if the wrapper forwards `op`
    pub fn supports(&self, op: SpecialOp) -> bool {
        self.operators().contains(op)
    }

    /// Apply a special operator
    pub fn op(&self, op: SpecialOp, args: Args) -> Result<Value> {
        let name = op.member_name();
        if self.naked.contains(op) {
            return self.origin().call(name, args);
        }
        if self.proxied.contains(op) {
            return self.router.route(name)?.call(args);
        }
        Err(Error::no_such_member(self.origin().reported_type().name(), name))
    }

    /// Invoke the object itself
    pub fn invoke(&self, args: Args) -> Result<Value> {
        self.op(SpecialOp::Call, args)
    }

    /// Human-readable text
    pub fn text(&self) -> Result<String> {
        Ok(match self.op(SpecialOp::Display, Args::new())? {
            Value::Str(s) => s,
            other => other.to_string(),
        })
    }

    /// Text rendered with a format spec
    pub fn format_with(&self, spec: &str) -> Result<String> {
        Ok(self
            .op(SpecialOp::Format, Args::new().arg(spec))?
            .as_str()?
            .to_string())
    }

    /// Byte representation
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.op(SpecialOp::Bytes, Args::new())?.into_bytes()
    }

    /// Compare against `other` with one of the ordering/equality operators
    pub fn compare(&self, op: SpecialOp, other: impl Into<Value>) -> Result<bool> {
        match op {
            SpecialOp::Lt
            | SpecialOp::Le
            | SpecialOp::Ge
            | SpecialOp::Gt
            | SpecialOp::Eq
            | SpecialOp::Ne => Ok(self.op(op, Args::new().arg(other))?.truthy()),
            _ => Err(Error::TypeMismatch {
                expected: "comparison operator",
                found: op.member_name(),
            }),
        }
    }

    /// Hash code
    pub fn hash_code(&self) -> Result<i64> {
        self.op(SpecialOp::Hash, Args::new())?.as_int()
    }

    /// Boolean conversion, falling back to a non-zero length, then to true
    pub fn truthy(&self) -> Result<bool> {
        if self.supports(SpecialOp::Bool) {
            self.op(SpecialOp::Bool, Args::new())?.as_bool()
        } else if self.supports(SpecialOp::Len) {
            Ok(self.len()? > 0)
        } else {
            Ok(true)
        }
    }

    /// Length
    pub fn len(&self) -> Result<usize> {
        let value = self.op(SpecialOp::Len, Args::new())?;
        usize::try_from(value.as_int()?).map_err(|_| Error::TypeMismatch {
            expected: "non-negative length",
            found: "negative int",
        })
    }

    /// Check for zero length
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Containment test
    pub fn contains(&self, item: impl Into<Value>) -> Result<bool> {
        Ok(self.op(SpecialOp::Contains, Args::new().arg(item))?.truthy())
    }

    /// Indexed read
    pub fn get_item(&self, key: impl Into<Value>) -> Result<Value> {
        self.op(SpecialOp::Index, Args::new().arg(key))
    }

    /// Fallback value for a key the object does not hold
    pub fn missing(&self, key: impl Into<Value>) -> Result<Value> {
        self.op(SpecialOp::Missing, Args::new().arg(key))
    }

    /// Indexed write
    pub fn set_item(&self, key: impl Into<Value>, value: impl Into<Value>) -> Result<()> {
        self.op(SpecialOp::IndexSet, Args::new().arg(key).arg(value))
            .map(|_| ())
    }

    /// Indexed delete
    pub fn del_item(&self, key: impl Into<Value>) -> Result<()> {
        self.op(SpecialOp::IndexDelete, Args::new().arg(key)).map(|_| ())
    }

    /// Iterate the object's items
    pub fn iter(&self) -> Result<std::vec::IntoIter<Value>> {
        Ok(self.op(SpecialOp::Iter, Args::new())?.into_list()?.into_iter())
    }

    /// Iterate the object's items in reverse
    pub fn rev(&self) -> Result<std::vec::IntoIter<Value>> {
        Ok(self
            .op(SpecialOp::Reversed, Args::new())?
            .into_list()?
            .into_iter())
    }

    /// Descriptor read on behalf of `instance`
    pub fn descriptor_get(&self, instance: impl Into<Value>) -> Result<Value> {
        self.op(SpecialOp::DescriptorGet, Args::new().arg(instance))
    }

    /// Descriptor write on behalf of `instance`
    pub fn descriptor_set(&self, instance: impl Into<Value>, value: impl Into<Value>) -> Result<()> {
        self.op(SpecialOp::DescriptorSet, Args::new().arg(instance).arg(value))
            .map(|_| ())
    }
}

impl<R: Router> fmt::Debug for Veiled<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{} at 0x{:x} for {} at 0x{:x}>",
            self.router.kind(),
            self as *const Self as usize,
            self.origin().reported_type().name(),
            Rc::as_ptr(self.origin()) as *const () as usize
        )
    }
}

impl<R: Router> fmt::Display for Veiled<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.supports(SpecialOp::Display) {
            return fmt::Debug::fmt(self, f);
        }
        let text = self.text().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl<R: Router> PartialEq<Value> for Veiled<R> {
    fn eq(&self, other: &Value) -> bool {
        self.supports(SpecialOp::Eq) && self.compare(SpecialOp::Eq, other.clone()).unwrap_or(false)
    }
}

impl<R: Router + 'static> Object for Veiled<R> {
    fn reported_type(&self) -> TypeTag {
        self.origin().reported_type()
    }

    fn member_kind(&self, name: &str) -> Result<MemberKind> {
        self.router.classify(name)
    }

    fn get_attr(&self, name: &str) -> Result<Value> {
        Veiled::get(self, name)
    }

    fn call(&self, name: &str, args: Args) -> Result<Value> {
        Veiled::call(self, name, args)
    }

    fn call_async<'a>(&'a self, name: &'a str, args: Args) -> CallFuture<'a> {
        Veiled::call_async(self, name, args)
    }
}
