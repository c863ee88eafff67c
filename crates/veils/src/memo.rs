//! Memoizing wrapper: caches real results per distinct argument set

use std::cell::RefCell;
use std::rc::Rc;

use ahash::{AHashMap, AHashSet};
use tracing::trace;
use veilcache::{BoundedCache, CacheEntry, CacheStats, LruCache, DEFAULT_CAPACITY};

use crate::error::Result;
use crate::key::{canonical_key, CallKey, KeyFn};
use crate::member::{resolve, AsyncCallable, BoundMethod, Callable, Member};
use crate::object::{CallFuture, MemberKind, Object};
use crate::router::{Router, Wrap};
use crate::value::{Args, Value};

/// Builds a fresh cache for each memoized member
pub type CacheFactory = Rc<dyn Fn() -> Box<dyn BoundedCache<CallKey, Value>>>;

type SharedEntry = Rc<RefCell<CacheEntry<CallKey, Value>>>;

/// Configuration for [`Memo`]
#[derive(Clone)]
pub struct MemoConfig {
    cacheable: AHashSet<String>,
    cache: CacheFactory,
    key: KeyFn,
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            cacheable: AHashSet::new(),
            cache: Rc::new(|| -> Box<dyn BoundedCache<CallKey, Value>> {
                Box::new(LruCache::<CallKey, Value>::new(DEFAULT_CAPACITY))
            }),
            key: Rc::new(canonical_key),
        }
    }
}

impl MemoConfig {
    /// Nothing cacheable, LRU caches of 128 entries, canonical keys
    pub fn new() -> Self {
        Self::default()
    }

    /// Memoize member `name`
    pub fn cacheable(mut self, name: &str) -> Self {
        self.cacheable.insert(name.to_string());
        self
    }

    /// Memoize every member in `names`
    pub fn cacheable_all<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.cacheable.extend(names.into_iter().map(str::to_string));
        self
    }

    /// Use `factory` to build each member's cache
    pub fn cache<F, C>(mut self, factory: F) -> Self
    where
        F: Fn() -> C + 'static,
        C: BoundedCache<CallKey, Value> + 'static,
    {
        self.cache = Rc::new(move || -> Box<dyn BoundedCache<CallKey, Value>> { Box::new(factory()) });
        self
    }

    /// Derive cache keys with `key`
    pub fn key<F>(mut self, key: F) -> Self
    where
        F: Fn(&Args) -> Result<CallKey> + 'static,
    {
        self.key = Rc::new(key);
        self
    }
}

/// Caches a synchronous method's results
pub struct MemoizedMethod {
    real: BoundMethod,
    entry: SharedEntry,
    key: KeyFn,
}

impl Callable for MemoizedMethod {
    fn call(&self, args: Args) -> Result<Value> {
        let key = (self.key)(&args)?;
        let hit = self.entry.borrow_mut().lookup(&key);
        if let Some(value) = hit {
            trace!("Memo hit for '{}'", self.real.name());
            return Ok(value);
        }

        trace!("Memo miss for '{}'", self.real.name());
        // No borrow is held across the real call; it may re-enter the wrapper.
        let value = Callable::call(&self.real, args)?;
        self.entry.borrow_mut().store(key, value.clone());
        Ok(value)
    }
}

/// Caches an asynchronous method's results once they resolve
pub struct MemoizedAsyncMethod {
    real: BoundMethod,
    entry: SharedEntry,
    key: KeyFn,
}

impl AsyncCallable for MemoizedAsyncMethod {
    fn call(&self, args: Args) -> CallFuture<'static> {
        let real = self.real.clone();
        let entry = Rc::clone(&self.entry);
        let key_fn = Rc::clone(&self.key);

        Box::pin(async move {
            let key = key_fn(&args)?;
            let hit = entry.borrow_mut().lookup(&key);
            if let Some(value) = hit {
                trace!("Memo hit for '{}'", real.name());
                return Ok(value);
            }

            trace!("Memo miss for '{}'", real.name());
            let value = AsyncCallable::call(&real, args).await?;
            entry.borrow_mut().store(key, value.clone());
            Ok(value)
        })
    }
}

/// Router that memoizes a configured set of members.
///
/// Cacheable properties are read once and kept forever. Cacheable methods
/// get their own cache on first access. Every other name passes straight
/// through to the origin.
pub struct Memo {
    origin: Rc<dyn Object>,
    config: MemoConfig,
    members: RefCell<AHashMap<String, Member>>,
    entries: RefCell<AHashMap<String, SharedEntry>>,
}

impl Memo {
    /// Check if `name` is configured as cacheable
    pub fn is_cacheable(&self, name: &str) -> bool {
        self.config.cacheable.contains(name)
    }

    /// Statistics snapshot for a memoized method, once it has been accessed
    pub fn stats(&self, name: &str) -> Option<CacheStats> {
        self.entries
            .borrow()
            .get(name)
            .map(|entry| entry.borrow().stats().clone())
    }

    /// Number of results cached for `name`
    pub fn cached_len(&self, name: &str) -> usize {
        self.entries
            .borrow()
            .get(name)
            .map_or(0, |entry| entry.borrow().len())
    }

    fn memoize(&self, name: &str) -> Result<Member> {
        let member = match self.origin.member_kind(name)? {
            MemberKind::Property => Member::Value(self.origin.get_attr(name)?),
            kind => {
                let entry: SharedEntry = Rc::new(RefCell::new(CacheEntry::new((self.config.cache)())));
                self.entries
                    .borrow_mut()
                    .insert(name.to_string(), Rc::clone(&entry));

                let real = BoundMethod::new(&self.origin, name);
                let key = Rc::clone(&self.config.key);
                if kind == MemberKind::AsyncMethod {
                    Member::AsyncMethod(Rc::new(MemoizedAsyncMethod { real, entry, key }))
                } else {
                    Member::Method(Rc::new(MemoizedMethod { real, entry, key }))
                }
            }
        };

        self.members
            .borrow_mut()
            .insert(name.to_string(), member.clone());
        Ok(member)
    }
}

impl Router for Memo {
    fn kind(&self) -> &'static str {
        "Memo"
    }

    fn origin(&self) -> &Rc<dyn Object> {
        &self.origin
    }

    fn route(&self, name: &str) -> Result<Member> {
        if !self.is_cacheable(name) {
            return resolve(&self.origin, name);
        }
        if let Some(member) = self.members.borrow().get(name) {
            return Ok(member.clone());
        }
        self.memoize(name)
    }
}

impl Wrap for Memo {
    type Config = MemoConfig;

    fn wrap(origin: Rc<dyn Object>, config: MemoConfig) -> Self {
        Self {
            origin,
            config,
            members: RefCell::new(AHashMap::new()),
            entries: RefCell::new(AHashMap::new()),
        }
    }
}
