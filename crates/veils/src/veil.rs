//! Piercing veil: overrides hold until the first uncontrolled access
//!
//! A [`Veil`] starts veiled. Configured members return their substitutes.
//! The first read or call of any member outside the configured tables pierces
//! it, and from then on every member, configured or not, goes straight to
//! the origin. Piercing is global and permanent.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ahash::AHashMap;
use tracing::debug;

use crate::error::Result;
use crate::member::{AsyncCallable, BoundMethod, Callable, Member};
use crate::object::{deferred, CallFuture, MemberKind, Object};
use crate::overrides::Overrides;
use crate::router::{Router, Wrap};
use crate::value::{Args, Value};

/// Shared "has an uncontrolled member been touched" bit.
///
/// Clones share one cell. The bit only ever goes from false to true.
/// The cell is `Rc`-backed, so a veil and its handles stay on one thread;
/// concurrent use of a single veil is not supported.
#[derive(Debug, Clone, Default)]
pub struct PiercingFlag(Rc<Cell<bool>>);

impl PiercingFlag {
    /// A fresh, unpierced flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the veil has been pierced
    pub fn is_pierced(&self) -> bool {
        self.0.get()
    }

    /// Pierce the veil on behalf of `member`; later calls are no-ops
    pub fn pierce(&self, member: &str) {
        if !self.0.replace(true) {
            debug!("Veil pierced by access to '{}'", member);
        }
    }
}

/// Substitutes a method's result until the veil is pierced
pub struct VeiledMethod {
    real: BoundMethod,
    value: Value,
    pierced: PiercingFlag,
}

impl Callable for VeiledMethod {
    fn call(&self, args: Args) -> Result<Value> {
        if self.pierced.is_pierced() {
            return Callable::call(&self.real, args);
        }
        Ok(self.value.clone())
    }
}

/// Substitutes an async method's result until the veil is pierced
pub struct VeiledAsyncMethod {
    real: BoundMethod,
    value: Value,
    pierced: PiercingFlag,
}

impl AsyncCallable for VeiledAsyncMethod {
    fn call(&self, args: Args) -> CallFuture<'static> {
        if self.pierced.is_pierced() {
            return AsyncCallable::call(&self.real, args);
        }
        Box::pin(deferred(self.value.clone()))
    }
}

/// Delegates to the origin, piercing the veil on every call
pub struct PiercingMethod {
    real: BoundMethod,
    pierced: PiercingFlag,
}

impl Callable for PiercingMethod {
    fn call(&self, args: Args) -> Result<Value> {
        self.pierced.pierce(self.real.name());
        Callable::call(&self.real, args)
    }
}

impl AsyncCallable for PiercingMethod {
    fn call(&self, args: Args) -> CallFuture<'static> {
        self.pierced.pierce(self.real.name());
        AsyncCallable::call(&self.real, args)
    }
}

/// Router for the piercing veil
pub struct Veil {
    origin: Rc<dyn Object>,
    overrides: Overrides,
    pierced: PiercingFlag,
    handles: RefCell<AHashMap<String, Member>>,
}

impl Veil {
    /// Check if the veil has been pierced
    pub fn is_pierced(&self) -> bool {
        self.pierced.is_pierced()
    }

    /// The configured overrides
    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    fn veiled(&self, name: &str) -> Result<Option<Member>> {
        if let Some(member) = self.handles.borrow().get(name) {
            return Ok(Some(member.clone()));
        }

        let member = if let Some(value) = self.overrides.methods.get(name) {
            self.origin.member_kind(name)?;
            Member::Method(Rc::new(VeiledMethod {
                real: BoundMethod::new(&self.origin, name),
                value: value.clone(),
                pierced: self.pierced.clone(),
            }))
        } else if let Some(value) = self.overrides.async_methods.get(name) {
            self.origin.member_kind(name)?;
            Member::AsyncMethod(Rc::new(VeiledAsyncMethod {
                real: BoundMethod::new(&self.origin, name),
                value: value.clone(),
                pierced: self.pierced.clone(),
            }))
        } else {
            return Ok(None);
        };

        self.handles
            .borrow_mut()
            .insert(name.to_string(), member.clone());
        Ok(Some(member))
    }
}

impl Router for Veil {
    fn kind(&self) -> &'static str {
        "Veil"
    }

    fn origin(&self) -> &Rc<dyn Object> {
        &self.origin
    }

    fn route(&self, name: &str) -> Result<Member> {
        if !self.pierced.is_pierced() {
            if let Some(value) = self.overrides.props.get(name) {
                return Ok(Member::Value(value.clone()));
            }
            if let Some(member) = self.veiled(name)? {
                return Ok(member);
            }
        }

        // Uncontrolled access: an unknown name fails before anything is pierced.
        let kind = self.origin.member_kind(name)?;
        self.pierced.pierce(name);
        Ok(match kind {
            MemberKind::Property => Member::Value(self.origin.get_attr(name)?),
            MemberKind::Method => Member::Method(Rc::new(PiercingMethod {
                real: BoundMethod::new(&self.origin, name),
                pierced: self.pierced.clone(),
            })),
            MemberKind::AsyncMethod => Member::AsyncMethod(Rc::new(PiercingMethod {
                real: BoundMethod::new(&self.origin, name),
                pierced: self.pierced.clone(),
            })),
        })
    }

    fn classify(&self, name: &str) -> Result<MemberKind> {
        if !self.pierced.is_pierced() {
            if self.overrides.props.contains_key(name) {
                return Ok(MemberKind::Property);
            }
            if self.overrides.methods.contains_key(name) {
                self.origin.member_kind(name)?;
                return Ok(MemberKind::Method);
            }
            if self.overrides.async_methods.contains_key(name) {
                self.origin.member_kind(name)?;
                return Ok(MemberKind::AsyncMethod);
            }
        }
        self.origin.member_kind(name)
    }
}

impl Wrap for Veil {
    type Config = Overrides;

    fn wrap(origin: Rc<dyn Object>, overrides: Overrides) -> Self {
        Self {
            origin,
            overrides,
            pierced: PiercingFlag::new(),
            handles: RefCell::new(AHashMap::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::{Accumulator, Foo};
    use crate::veil;

    fn foo() -> (Rc<Foo>, Rc<dyn Object>) {
        let foo = Rc::new(Foo::new());
        let origin: Rc<dyn Object> = foo.clone();
        (foo, origin)
    }

    #[test]
    fn test_flag_is_shared_and_monotonic() {
        let flag = PiercingFlag::new();
        let handle = flag.clone();

        assert!(!handle.is_pierced());
        flag.pierce("baz");
        flag.pierce("qux");
        assert!(handle.is_pierced());
    }

    #[test]
    fn test_piercing_by_unconfigured_call() {
        let (_, origin) = foo();
        let veiled = veil(origin, Overrides::new().method("bar", 69));

        for _ in 0..10 {
            assert_eq!(veiled.call("bar", Args::new()).unwrap(), Value::Int(69));
        }
        assert!(!veiled.router().is_pierced());

        assert_eq!(
            veiled.call("baz", Args::from(["Donald"])).unwrap(),
            Value::from("hello Donald")
        );
        assert_eq!(veiled.call("bar", Args::new()).unwrap(), Value::Int(42));
        assert!(veiled.router().is_pierced());
    }

    #[tokio::test]
    async fn test_piercing_by_unconfigured_async_call() {
        let (_, origin) = foo();
        let veiled = veil(origin, Overrides::new().method("bar", 69));

        assert_eq!(veiled.call("bar", Args::new()).unwrap(), Value::Int(69));
        let greeting = veiled
            .call_async("greet_async", Args::from(["Donald"]))
            .await
            .unwrap();
        assert_eq!(greeting, Value::from("Asynchronous hello to Donald!"));
        assert_eq!(veiled.call("bar", Args::new()).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_piercing_by_property_read() {
        let (_, origin) = foo();
        let veiled = veil(
            origin,
            Overrides::new()
                .method("bar", 69)
                .prop("prop1", "Cached prop1"),
        );

        assert_eq!(veiled.get("prop1").unwrap(), Value::from("Cached prop1"));
        assert_eq!(veiled.call("bar", Args::new()).unwrap(), Value::Int(69));
        assert_eq!(veiled.get("prop2").unwrap(), Value::from("Property 2"));
        assert_eq!(veiled.get("prop1").unwrap(), Value::from("Property 1"));
    }

    #[test]
    fn test_reading_a_method_without_calling_pierces() {
        let (foo, origin) = foo();
        let veiled = veil(origin, Overrides::new().method("bar", 69));

        let _baz = veiled.member("baz").unwrap();
        assert!(veiled.router().is_pierced());
        assert_eq!(foo.calls("baz"), 0);
        assert_eq!(veiled.call("bar", Args::new()).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_handle_taken_before_piercing_follows_the_flag() {
        let (_, origin) = foo();
        let veiled = veil(origin, Overrides::new().method("bar", 69));

        let bar = veiled.member("bar").unwrap();
        assert_eq!(bar.call(Args::new()).unwrap(), Value::Int(69));

        veiled.get("prop2").unwrap();
        assert_eq!(bar.call(Args::new()).unwrap(), Value::Int(42));
    }

    #[tokio::test]
    async fn test_async_override_lapses_after_piercing() {
        let (foo, origin) = foo();
        let veiled = veil(origin, Overrides::new().async_method("greet_async", "stub"));

        let greet = veiled.member("greet_async").unwrap();
        assert_eq!(greet.kind(), MemberKind::AsyncMethod);
        assert_eq!(greet.call_async(Args::from(["D"])).await.unwrap(), Value::from("stub"));
        assert_eq!(foo.calls("greet_async"), 0);

        veiled.call("baz", Args::from(["D"])).unwrap();
        assert!(veiled.router().is_pierced());

        let live = Value::from("Asynchronous hello to D!");
        assert_eq!(greet.call_async(Args::from(["D"])).await.unwrap(), live);
        assert_eq!(
            veiled.call_async("greet_async", Args::from(["D"])).await.unwrap(),
            live
        );
        assert_eq!(foo.calls("greet_async"), 2);
    }

    #[tokio::test]
    async fn test_overrides_with_arguments() {
        let (_, origin) = foo();
        let veiled = veil(
            origin,
            Overrides::new()
                .method("bar", 69)
                .method("baz", "Don't care! Veiled!")
                .async_method("greet_async", "Cached greet async")
                .prop("prop1", "Veiled prop1!")
                .prop("prop2", "Veiled prop2!"),
        );

        assert_eq!(veiled.call("bar", Args::new()).unwrap(), Value::Int(69));
        assert_eq!(
            veiled.call("baz", Args::from(["Donald"])).unwrap(),
            Value::from("Don't care! Veiled!")
        );
        assert_eq!(
            veiled
                .call_async("greet_async", Args::from(["Donald"]))
                .await
                .unwrap(),
            Value::from("Cached greet async")
        );
        let args = Args::new().arg("Some").arg("Args").kwarg("keyword_args", "Too");
        assert_eq!(
            veiled.call("foo", args).unwrap(),
            Value::from("Some, Args, {keyword_args: Too}")
        );
    }

    #[tokio::test]
    async fn test_overridden_members_never_reach_origin() {
        let (foo, origin) = foo();
        let veiled = veil(
            origin,
            Overrides::new()
                .method("bar", 69)
                .async_method("dummy_async", "Decorated dummy"),
        );

        assert_eq!(veiled.call("bar", Args::new()).unwrap(), Value::Int(69));
        assert_eq!(
            veiled.call_async("dummy_async", Args::new()).await.unwrap(),
            Value::from("Decorated dummy")
        );
        assert_eq!(foo.calls("bar"), 0);
        assert_eq!(foo.calls("dummy_async"), 0);
    }

    #[test]
    fn test_properties_win_over_methods() {
        let (_, origin) = foo();
        let veiled = veil(
            origin,
            Overrides::new().prop("bar", "as property").method("bar", 69),
        );

        assert_eq!(veiled.get("bar").unwrap(), Value::from("as property"));
    }

    #[test]
    fn test_unknown_member_fails_without_piercing() {
        let (_, origin) = foo();
        let veiled = veil(origin, Overrides::new().method("bar", 69));

        let err = veiled.call("nope", Args::new()).unwrap_err();
        assert_eq!(err, Error::no_such_member("Foo", "nope"));
        assert!(!veiled.router().is_pierced());
        assert_eq!(veiled.call("bar", Args::new()).unwrap(), Value::Int(69));
    }

    #[test]
    fn test_override_for_missing_origin_member_fails() {
        let (_, origin) = foo();
        let veiled = veil(origin, Overrides::new().method("ghost", 1));

        let err = veiled.call("ghost", Args::new()).unwrap_err();
        assert_eq!(err, Error::no_such_member("Foo", "ghost"));
    }

    #[test]
    fn test_accumulator_stub_then_pierce() {
        let acc = Rc::new(Accumulator::new());
        let origin: Rc<dyn Object> = acc.clone();
        let veiled = veil(origin, Overrides::new().method("add", 7));

        for _ in 0..10 {
            assert_eq!(veiled.call("add", Args::from([5])).unwrap(), Value::Int(7));
        }
        assert_eq!(acc.total(), 0);

        assert_eq!(veiled.call("sum", Args::from([40, 2])).unwrap(), Value::Int(42));
        assert_eq!(acc.total(), 42);

        assert_eq!(veiled.call("add", Args::from([5])).unwrap(), Value::Int(47));
        assert_eq!(acc.total(), 47);
    }
}
