//! Special operators
//!
//! Operator-like behaviors are ordinary members under reserved `op.*` names.
//! An origin implements one by reporting that name as a method from
//! [`Object::member_kind`](crate::Object::member_kind); wrappers then route it
//! like any other member.

use std::fmt;

/// An operator-like behavior a wrapper can forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpecialOp {
    /// Invoke the object itself
    Call,
    /// Human-readable text
    Display,
    /// Byte representation
    Bytes,
    /// Text with a format spec
    Format,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `>`
    Gt,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// Boolean conversion
    Bool,
    /// Hash code
    Hash,
    /// Indexed read
    Index,
    /// Descriptor read
    DescriptorGet,
    /// Descriptor write
    DescriptorSet,
    /// Containment test
    Contains,
    /// Fallback for a missing key
    Missing,
    /// Indexed write
    IndexSet,
    /// Indexed delete
    IndexDelete,
    /// Iteration
    Iter,
    /// Length
    Len,
    /// Reverse iteration
    Reversed,
}

impl SpecialOp {
    /// Every operator, in forwarding order
    pub const ALL: [SpecialOp; 22] = [
        SpecialOp::Call,
        SpecialOp::Display,
        SpecialOp::Bytes,
        SpecialOp::Format,
        SpecialOp::Lt,
        SpecialOp::Le,
        SpecialOp::Ge,
        SpecialOp::Gt,
        SpecialOp::Eq,
        SpecialOp::Ne,
        SpecialOp::Bool,
        SpecialOp::Hash,
        SpecialOp::Index,
        SpecialOp::DescriptorGet,
        SpecialOp::DescriptorSet,
        SpecialOp::Contains,
        SpecialOp::Missing,
        SpecialOp::IndexSet,
        SpecialOp::IndexDelete,
        SpecialOp::Iter,
        SpecialOp::Len,
        SpecialOp::Reversed,
    ];

    /// Member name the operator is routed under
    pub fn member_name(self) -> &'static str {
        match self {
            SpecialOp::Call => "op.call",
            SpecialOp::Display => "op.display",
            SpecialOp::Bytes => "op.bytes",
            SpecialOp::Format => "op.format",
            SpecialOp::Lt => "op.lt",
            SpecialOp::Le => "op.le",
            SpecialOp::Ge => "op.ge",
            SpecialOp::Gt => "op.gt",
            SpecialOp::Eq => "op.eq",
            SpecialOp::Ne => "op.ne",
            SpecialOp::Bool => "op.bool",
            SpecialOp::Hash => "op.hash",
            SpecialOp::Index => "op.index",
            SpecialOp::DescriptorGet => "op.descriptor_get",
            SpecialOp::DescriptorSet => "op.descriptor_set",
            SpecialOp::Contains => "op.contains",
            SpecialOp::Missing => "op.missing",
            SpecialOp::IndexSet => "op.index_set",
            SpecialOp::IndexDelete => "op.index_delete",
            SpecialOp::Iter => "op.iter",
            SpecialOp::Len => "op.len",
            SpecialOp::Reversed => "op.reversed",
        }
    }

    /// Operator for a reserved member name
    pub fn from_member_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.member_name() == name)
    }

    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

impl fmt::Display for SpecialOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.member_name())
    }
}

/// A set of special operators
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct OpSet(u32);

impl OpSet {
    /// No operators
    pub const fn empty() -> Self {
        OpSet(0)
    }

    /// Every operator
    pub fn all() -> Self {
        Self::ALL_SET
    }

    const ALL_SET: OpSet = OpSet((1 << SpecialOp::ALL.len()) - 1);

    /// Add an operator
    pub fn with(mut self, op: SpecialOp) -> Self {
        self.insert(op);
        self
    }

    /// Add an operator in place
    pub fn insert(&mut self, op: SpecialOp) {
        self.0 |= op.bit();
    }

    /// Remove an operator in place
    pub fn remove(&mut self, op: SpecialOp) {
        self.0 &= !op.bit();
    }

    /// Check membership
    pub fn contains(self, op: SpecialOp) -> bool {
        self.0 & op.bit() != 0
    }

    /// Operators in both sets
    pub fn intersection(self, other: OpSet) -> OpSet {
        OpSet(self.0 & other.0)
    }

    /// Operators in either set
    pub fn union(self, other: OpSet) -> OpSet {
        OpSet(self.0 | other.0)
    }

    /// Operators in `self` but not `other`
    pub fn difference(self, other: OpSet) -> OpSet {
        OpSet(self.0 & !other.0)
    }

    /// Number of operators
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Check for no operators
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate operators in forwarding order
    pub fn iter(self) -> impl Iterator<Item = SpecialOp> {
        SpecialOp::ALL.into_iter().filter(move |op| self.contains(*op))
    }
}

impl FromIterator<SpecialOp> for OpSet {
    fn from_iter<I: IntoIterator<Item = SpecialOp>>(iter: I) -> Self {
        iter.into_iter().fold(OpSet::empty(), OpSet::with)
    }
}

impl fmt::Debug for OpSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
