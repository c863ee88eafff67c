//! Permanent overrides that no access can lift

use std::rc::Rc;

use ahash::AHashMap;
use tracing::warn;

use crate::error::Result;
use crate::member::{resolve_kind, AsyncStub, BoundMethod, Member, Stub};
use crate::object::{MemberKind, Object};
use crate::overrides::Overrides;
use crate::router::{Router, Wrap};
use crate::value::Value;

/// Router whose overrides hold for the wrapper's whole life.
///
/// Method overrides live in one table. Whether a configured call resolves
/// immediately or as an awaitable is read from the origin's member each
/// time it is accessed.
pub struct Unpiercable {
    origin: Rc<dyn Object>,
    props: AHashMap<String, Value>,
    methods: AHashMap<String, Value>,
}

impl Unpiercable {
    /// Number of configured method overrides after merging
    pub fn method_overrides(&self) -> usize {
        self.methods.len()
    }
}

impl Router for Unpiercable {
    fn kind(&self) -> &'static str {
        "Unpiercable"
    }

    fn origin(&self) -> &Rc<dyn Object> {
        &self.origin
    }

    fn route(&self, name: &str) -> Result<Member> {
        if let Some(value) = self.props.get(name) {
            return Ok(Member::Value(value.clone()));
        }

        let kind = self.origin.member_kind(name)?;
        let Some(value) = self.methods.get(name) else {
            return resolve_kind(&self.origin, name, kind);
        };

        let real = BoundMethod::new(&self.origin, name);
        let value = value.clone();
        Ok(match kind {
            MemberKind::AsyncMethod => Member::AsyncMethod(Rc::new(AsyncStub { real, value })),
            MemberKind::Method | MemberKind::Property => Member::Method(Rc::new(Stub { real, value })),
        })
    }

    fn classify(&self, name: &str) -> Result<MemberKind> {
        if self.props.contains_key(name) {
            return Ok(MemberKind::Property);
        }
        match self.origin.member_kind(name)? {
            MemberKind::Property if self.methods.contains_key(name) => Ok(MemberKind::Method),
            kind => Ok(kind),
        }
    }
}

impl Wrap for Unpiercable {
    type Config = Overrides;

    fn wrap(origin: Rc<dyn Object>, overrides: Overrides) -> Self {
        let Overrides {
            props,
            mut methods,
            async_methods,
        } = overrides;

        if !async_methods.is_empty() {
            warn!(
                "Async method overrides are deprecated for Unpiercable; merging {} into method overrides",
                async_methods.len()
            );
            methods.extend(async_methods);
        }

        Self {
            origin,
            props,
            methods,
        }
    }
}
