//! Operator type tags using string interning
//!
//! Every graph node carries an operator type such as `Data`, `Conv2D` or
//! `NetOutput`. The same handful of type names repeats across thousands of
//! nodes, so they are interned once and compared as symbols. This module
//! provides the [`OpType`] tag and the distinguished type names the resolver
//! and validators care about.

use std::{
    fmt,
    sync::{Mutex, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Type name of the model's input placeholder nodes.
pub const DATA: &str = "Data";

/// Type name of the terminal aggregator node that collects the model outputs.
pub const NET_OUTPUT: &str = "NetOutput";

/// Global string interner for operator type names.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> &'static Mutex<DefaultStringInterner> {
    INTERNER.get_or_init(|| Mutex::new(DefaultStringInterner::new()))
}

/// Interned operator type tag.
///
/// # Examples
///
/// ```
/// use modelpin_core::op_type::OpType;
///
/// let conv = OpType::new("Conv2D");
/// assert_eq!(conv, OpType::new("Conv2D"));
/// assert_eq!(conv, "Conv2D");
/// assert!(OpType::new("Data").is_data());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpType(DefaultSymbol);

impl OpType {
    /// Creates an `OpType` from its type name.
    pub fn new(name: &str) -> Self {
        let mut interner = interner()
            .lock()
            .expect("Failed to acquire interner lock");
        Self(interner.get_or_intern(name))
    }

    /// Returns `true` for the input placeholder type ([`DATA`]).
    pub fn is_data(self) -> bool {
        self == DATA
    }

    /// Returns `true` for the terminal aggregator type ([`NET_OUTPUT`]).
    pub fn is_net_output(self) -> bool {
        self == NET_OUTPUT
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interner = interner()
            .lock()
            .expect("Failed to acquire interner lock");
        let name = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        write!(f, "{name}")
    }
}

impl From<&str> for OpType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for OpType {
    fn eq(&self, other: &str) -> bool {
        let interner = interner()
            .lock()
            .expect("Failed to acquire interner lock");
        interner.resolve(self.0) == Some(other)
    }
}

impl PartialEq<&str> for OpType {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}
