//! Cache keys derived from call arguments

use std::fmt::{self, Write};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::value::{Args, Value};

/// Hashable key identifying one distinct argument set
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallKey(String);

impl CallKey {
    /// Key from an already-canonical encoding
    pub fn new(encoded: impl Into<String>) -> Self {
        CallKey(encoded.into())
    }

    /// The encoded form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Turns call arguments into a cache key
pub type KeyFn = Rc<dyn Fn(&Args) -> Result<CallKey>>;

/// Default key function.
///
/// Positional arguments are encoded in order, keyword arguments by name, so
/// keyword order never changes the key. Every variable-length component is
/// length-prefixed. NaN has no canonical encoding and is rejected.
pub fn canonical_key(args: &Args) -> Result<CallKey> {
    let mut out = String::new();
    out.push('(');
    for value in &args.positional {
        encode(value, &mut out)?;
    }
    out.push(')');
    for (name, value) in &args.keywords {
        encode_text('k', name, &mut out);
        encode(value, &mut out)?;
    }
    Ok(CallKey(out))
}

fn put(out: &mut String, args: fmt::Arguments<'_>) {
    // Writing into a String cannot fail
    let _ = out.write_fmt(args);
}

fn encode_text(tag: char, text: &str, out: &mut String) {
    put(out, format_args!("{}{}:{}", tag, text.len(), text));
}

fn encode(value: &Value, out: &mut String) -> Result<()> {
    match value {
        Value::Nil => out.push('n'),
        Value::Bool(b) => out.push(if *b { 'T' } else { 'F' }),
        Value::Int(i) => put(out, format_args!("i{};", i)),
        Value::Float(x) => {
            if x.is_nan() {
                return Err(Error::KeyDerivation("NaN has no canonical encoding".to_string()));
            }
            // -0.0 == 0.0, so they must share a key
            let bits = if *x == 0.0 { 0 } else { x.to_bits() };
            put(out, format_args!("f{:x};", bits));
        }
        Value::Str(s) => encode_text('s', s, out),
        Value::Bytes(b) => {
            put(out, format_args!("b{}:", b.len()));
            for byte in b {
                put(out, format_args!("{:02x}", byte));
            }
        }
        Value::List(items) => {
            put(out, format_args!("l{}[", items.len()));
            for item in items {
                encode(item, out)?;
            }
            out.push(']');
        }
        Value::Map(map) => {
            put(out, format_args!("m{}{{", map.len()));
            for (k, v) in map {
                encode_text('k', k, out);
                encode(v, out)?;
            }
            out.push('}');
        }
    }
    Ok(())
}
