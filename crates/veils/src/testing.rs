//! Origin objects for unit tests. Each counts the real invocations it serves.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::sync::{Arc, Mutex};

use ahash::AHashMap;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use crate::error::{Error, Result};
use crate::object::{CallFuture, MemberKind, Object};
use crate::value::{Args, Value};

/// Route library logs to the test harness; repeated calls are harmless
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Layer keeping the message of every WARN event
struct WarnCapture(Arc<Mutex<Vec<String>>>);

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}

impl<S: Subscriber> Layer<S> for WarnCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::WARN {
            return;
        }
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.0.lock().unwrap().push(visitor.0);
    }
}

/// Run `f` with a thread-local subscriber and return the warnings it logged
pub(crate) fn capture_warnings(f: impl FnOnce()) -> Vec<String> {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(WarnCapture(Arc::clone(&captured)));
    tracing::subscriber::with_default(subscriber, f);
    let warnings = captured.lock().unwrap().clone();
    warnings
}

#[derive(Default)]
struct CallLog(RefCell<AHashMap<String, u32>>);

impl CallLog {
    fn record(&self, name: &str) {
        *self.0.borrow_mut().entry(name.to_string()).or_insert(0) += 1;
    }

    fn count(&self, name: &str) -> u32 {
        self.0.borrow().get(name).copied().unwrap_or(0)
    }
}

/// The error an object raises when a member is used as the wrong kind
fn misuse(obj: &dyn Object, name: &str, wanted: MemberKind) -> Error {
    let type_name = obj.reported_type().name();
    match obj.member_kind(name) {
        Err(e) => e,
        Ok(MemberKind::Property) if wanted != MemberKind::Property => {
            match obj.get_attr(name) {
                Ok(value) => Error::NotCallable {
                    found: value.kind_name(),
                },
                Err(e) => e,
            }
        }
        Ok(MemberKind::Method) if wanted == MemberKind::AsyncMethod => {
            Error::not_awaitable(type_name, name)
        }
        Ok(MemberKind::Property) => Error::no_such_member(type_name, name),
        Ok(_) if wanted == MemberKind::Property => Error::not_a_property(type_name, name),
        Ok(_) => Error::TypeMismatch {
            expected: "method",
            found: "async method",
        },
    }
}

/// Plain object with two properties, three methods and two async methods
pub(crate) struct Foo {
    prop1: String,
    prop2: String,
    log: CallLog,
}

impl Foo {
    pub(crate) fn new() -> Self {
        init_tracing();
        Self {
            prop1: "Property 1".to_string(),
            prop2: "Property 2".to_string(),
            log: CallLog::default(),
        }
    }

    pub(crate) fn calls(&self, name: &str) -> u32 {
        self.log.count(name)
    }
}

impl Object for Foo {
    fn member_kind(&self, name: &str) -> Result<MemberKind> {
        match name {
            "prop1" | "prop2" => Ok(MemberKind::Property),
            "bar" | "baz" | "foo" => Ok(MemberKind::Method),
            "greet_async" | "dummy_async" => Ok(MemberKind::AsyncMethod),
            _ => Err(Error::no_such_member(self.reported_type().name(), name)),
        }
    }

    fn get_attr(&self, name: &str) -> Result<Value> {
        match name {
            "prop1" => Ok(self.prop1.clone().into()),
            "prop2" => Ok(self.prop2.clone().into()),
            _ => Err(misuse(self, name, MemberKind::Property)),
        }
    }

    fn call(&self, name: &str, args: Args) -> Result<Value> {
        let result = match name {
            "bar" => Value::Int(42),
            "baz" => format!("hello {}", args.str(0)?).into(),
            "foo" => {
                let mut parts: Vec<String> = args.positional.iter().map(Value::to_string).collect();
                parts.push(Value::Map(args.keywords.clone()).to_string());
                parts.join(", ").into()
            }
            _ => return Err(misuse(self, name, MemberKind::Method)),
        };
        self.log.record(name);
        Ok(result)
    }

    fn call_async<'a>(&'a self, name: &'a str, args: Args) -> CallFuture<'a> {
        Box::pin(async move {
            let result: Value = match name {
                "greet_async" => format!("Asynchronous hello to {}!", args.str(0)?).into(),
                "dummy_async" => "Dummy async method".into(),
                _ => return Err(misuse(self, name, MemberKind::AsyncMethod)),
            };
            self.log.record(name);
            Ok(result)
        })
    }
}

/// Stateful accumulator; `sub` and `mul` really suspend before mutating
pub(crate) struct Accumulator {
    total: Cell<i64>,
    log: CallLog,
}

impl Accumulator {
    pub(crate) fn new() -> Self {
        init_tracing();
        Self {
            total: Cell::new(0),
            log: CallLog::default(),
        }
    }

    pub(crate) fn total(&self) -> i64 {
        self.total.get()
    }

    pub(crate) fn calls(&self, name: &str) -> u32 {
        self.log.count(name)
    }

    fn apply(&self, name: &str, f: impl FnOnce(i64) -> i64) -> Value {
        self.log.record(name);
        self.total.set(f(self.total.get()));
        Value::Int(self.total.get())
    }
}

impl Object for Accumulator {
    fn member_kind(&self, name: &str) -> Result<MemberKind> {
        match name {
            "total" => Ok(MemberKind::Property),
            "sum" | "add" => Ok(MemberKind::Method),
            "sub" | "mul" => Ok(MemberKind::AsyncMethod),
            _ => Err(Error::no_such_member(self.reported_type().name(), name)),
        }
    }

    fn get_attr(&self, name: &str) -> Result<Value> {
        match name {
            "total" => Ok(Value::Int(self.total())),
            _ => Err(misuse(self, name, MemberKind::Property)),
        }
    }

    fn call(&self, name: &str, args: Args) -> Result<Value> {
        match name {
            "sum" => {
                let (a, b) = (args.int(0)?, args.int(1)?);
                Ok(self.apply(name, |t| t + a + b))
            }
            "add" => {
                let n = args.int(0)?;
                Ok(self.apply(name, |t| t + n))
            }
            _ => Err(misuse(self, name, MemberKind::Method)),
        }
    }

    fn call_async<'a>(&'a self, name: &'a str, args: Args) -> CallFuture<'a> {
        Box::pin(async move {
            let n = match name {
                "sub" | "mul" => args.int(0)?,
                _ => return Err(misuse(self, name, MemberKind::AsyncMethod)),
            };
            tokio::task::yield_now().await;
            Ok(match name {
                "sub" => self.apply(name, |t| t - n),
                _ => self.apply(name, |t| t * n),
            })
        })
    }
}

/// Sequence object implementing a subset of the special operators
pub(crate) struct Bag {
    items: RefCell<Vec<Value>>,
    log: CallLog,
}

impl Bag {
    pub(crate) fn new<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        init_tracing();
        Self {
            items: RefCell::new(items.into_iter().map(Into::into).collect()),
            log: CallLog::default(),
        }
    }

    pub(crate) fn calls(&self, name: &str) -> u32 {
        self.log.count(name)
    }

    fn position(&self, args: &Args) -> Result<usize> {
        let idx = args.int(0)?;
        let len = self.items.borrow().len();
        usize::try_from(idx)
            .ok()
            .filter(|i| *i < len)
            .ok_or_else(|| Error::Failed(format!("index {} out of range", idx)))
    }
}

const BAG_OPS: [&str; 12] = [
    "op.call",
    "op.display",
    "op.eq",
    "op.lt",
    "op.hash",
    "op.len",
    "op.contains",
    "op.iter",
    "op.reversed",
    "op.index",
    "op.index_set",
    "op.index_delete",
];

impl Object for Bag {
    fn member_kind(&self, name: &str) -> Result<MemberKind> {
        if name == "label" {
            return Ok(MemberKind::Property);
        }
        if BAG_OPS.contains(&name) {
            return Ok(MemberKind::Method);
        }
        Err(Error::no_such_member(self.reported_type().name(), name))
    }

    fn get_attr(&self, name: &str) -> Result<Value> {
        match name {
            "label" => Ok("bag".into()),
            _ => Err(misuse(self, name, MemberKind::Property)),
        }
    }

    fn call(&self, name: &str, args: Args) -> Result<Value> {
        let result = match name {
            "op.call" | "op.len" => Value::from(self.items.borrow().len()),
            "op.display" => {
                let items = self.items.borrow();
                let parts: Vec<String> = items.iter().map(Value::to_string).collect();
                format!("Bag[{}]", parts.join(", ")).into()
            }
            "op.eq" => Value::Bool(args.get(0) == Some(&Value::List(self.items.borrow().clone()))),
            "op.lt" => Value::Bool((self.items.borrow().len() as i64) < args.int(0)?),
            "op.hash" => {
                let items = self.items.borrow();
                let hash = items
                    .iter()
                    .fold(17i64, |h, v| h.wrapping_mul(31).wrapping_add(v.weight() as i64));
                Value::Int(hash)
            }
            "op.contains" => {
                let needle = args.get(0).cloned().unwrap_or_default();
                Value::Bool(self.items.borrow().contains(&needle))
            }
            "op.iter" => Value::List(self.items.borrow().clone()),
            "op.reversed" => Value::List(self.items.borrow().iter().rev().cloned().collect()),
            "op.index" => {
                let idx = self.position(&args)?;
                self.items.borrow()[idx].clone()
            }
            "op.index_set" => {
                let idx = self.position(&args)?;
                self.items.borrow_mut()[idx] = args.get(1).cloned().unwrap_or_default();
                Value::Nil
            }
            "op.index_delete" => {
                let idx = self.position(&args)?;
                self.items.borrow_mut().remove(idx);
                Value::Nil
            }
            _ => return Err(misuse(self, name, MemberKind::Method)),
        };
        self.log.record(name);
        Ok(result)
    }

    fn call_async<'a>(&'a self, name: &'a str, _args: Args) -> CallFuture<'a> {
        Box::pin(async move { Err(misuse(self, name, MemberKind::AsyncMethod)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_misuse_errors() {
        let foo = Foo::new();

        assert_eq!(
            foo.call("prop1", Args::new()).unwrap_err(),
            Error::NotCallable { found: "str" }
        );
        assert_eq!(
            foo.get_attr("bar").unwrap_err(),
            Error::not_a_property("Foo", "bar")
        );
        assert_eq!(
            foo.call("nope", Args::new()).unwrap_err(),
            Error::no_such_member("Foo", "nope")
        );
    }

    #[tokio::test]
    async fn test_awaiting_sync_method_fails() {
        let foo = Foo::new();
        assert_eq!(
            foo.call_async("bar", Args::new()).await.unwrap_err(),
            Error::not_awaitable("Foo", "bar")
        );
    }
}
