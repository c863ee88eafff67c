//! The member router contract shared by every wrapper kind

use std::rc::Rc;

use crate::error::Result;
use crate::member::Member;
use crate::object::{MemberKind, Object};

/// Decides, per member name, whether to substitute, memoize or delegate.
///
/// Every public operation of a [`Veiled`](crate::Veiled) wrapper, including
/// proxied special operators, goes through [`Router::route`].
pub trait Router {
    /// Wrapper kind shown in the wrapper's repr
    fn kind(&self) -> &'static str;

    /// The wrapped object
    fn origin(&self) -> &Rc<dyn Object>;

    /// Resolve a member by name.
    ///
    /// Names the wrapper does not intercept must behave exactly like the
    /// origin, including failing with the origin's own error.
    fn route(&self, name: &str) -> Result<Member>;

    /// Classify what [`Router::route`] would return for `name`, without
    /// counting as an access
    fn classify(&self, name: &str) -> Result<MemberKind> {
        self.origin().member_kind(name)
    }
}

/// A router that can be built from an origin and its configuration
pub trait Wrap: Router + Sized {
    /// Construction-time configuration
    type Config;

    /// Build the router around `origin`
    fn wrap(origin: Rc<dyn Object>, config: Self::Config) -> Self;
}
