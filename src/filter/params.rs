//! Typed, named filter parameters.

use std::fmt;

use crate::error::{MeshError, Result};

/// The value of a filter parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    /// A floating-point value.
    Float(f64),
    /// An integer value.
    Int(i64),
    /// A boolean flag.
    Bool(bool),
}

impl ParameterValue {
    /// Name of the value's type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParameterValue::Float(_) => "float",
            ParameterValue::Int(_) => "int",
            ParameterValue::Bool(_) => "bool",
        }
    }

    fn same_type(&self, other: &ParameterValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Float(v) => write!(f, "{}", v),
            ParameterValue::Int(v) => write!(f, "{}", v),
            ParameterValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// Declaration of one parameter a filter accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDecl {
    /// Lookup key.
    pub name: String,
    /// Value used when the caller does not override it.
    pub default: ParameterValue,
    /// Short label for user interfaces.
    pub label: String,
    /// One-line help text.
    pub description: String,
}

impl ParameterDecl {
    /// A float parameter.
    pub fn float(name: &str, default: f64, label: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            default: ParameterValue::Float(default),
            label: label.to_string(),
            description: description.to_string(),
        }
    }

    /// An integer parameter.
    pub fn int(name: &str, default: i64, label: &str, description: &str) -> Self {
        Self {
            default: ParameterValue::Int(default),
            ..Self::float(name, 0.0, label, description)
        }
    }

    /// A boolean parameter.
    pub fn bool(name: &str, default: bool, label: &str, description: &str) -> Self {
        Self {
            default: ParameterValue::Bool(default),
            ..Self::float(name, 0.0, label, description)
        }
    }
}

/// An ordered collection of declared parameters and their current values.
///
/// ```
/// use mcflow::filter::{ParameterDecl, ParameterSet};
///
/// let mut params = ParameterSet::new();
/// params.add(ParameterDecl::float("Time", 0.01, "Step", "Step factor."));
/// assert_eq!(params.get_float("Time").unwrap(), 0.01);
///
/// params.set_float("Time", 0.5).unwrap();
/// assert_eq!(params.get_float("Time").unwrap(), 0.5);
/// assert!(params.get_float("Missing").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    entries: Vec<(ParameterDecl, ParameterValue)>,
}

impl ParameterSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding the defaults of `decls`.
    pub fn from_decls(decls: impl IntoIterator<Item = ParameterDecl>) -> Self {
        let mut set = Self::new();
        for decl in decls {
            set.add(decl);
        }
        set
    }

    /// Declare a parameter with its default value. Re-declaring a name
    /// replaces the earlier declaration in place.
    pub fn add(&mut self, decl: ParameterDecl) {
        let value = decl.default;
        match self.position(&decl.name) {
            Some(i) => self.entries[i] = (decl, value),
            None => self.entries.push((decl, value)),
        }
    }

    /// Number of declared parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no parameter is declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Declarations with their current values, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&ParameterDecl, &ParameterValue)> {
        self.entries.iter().map(|(d, v)| (d, v))
    }

    /// Current value of `name`, if declared.
    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.position(name).map(|i| &self.entries[i].1)
    }

    /// Overwrite the value of a declared parameter. The new value must have
    /// the declared type.
    pub fn set(&mut self, name: &str, value: ParameterValue) -> Result<()> {
        let i = self.position(name).ok_or_else(|| missing(name))?;
        let (decl, current) = &mut self.entries[i];
        if !decl.default.same_type(&value) {
            return Err(MeshError::ParameterType {
                name: name.to_string(),
                expected: decl.default.type_name(),
                found: value.type_name(),
            });
        }
        *current = value;
        Ok(())
    }

    /// Overwrite a float parameter.
    pub fn set_float(&mut self, name: &str, value: f64) -> Result<()> {
        self.set(name, ParameterValue::Float(value))
    }

    /// Read a float parameter.
    pub fn get_float(&self, name: &str) -> Result<f64> {
        match self.lookup(name)? {
            ParameterValue::Float(v) => Ok(*v),
            other => Err(wrong_type(name, "float", other)),
        }
    }

    /// Read an integer parameter.
    pub fn get_int(&self, name: &str) -> Result<i64> {
        match self.lookup(name)? {
            ParameterValue::Int(v) => Ok(*v),
            other => Err(wrong_type(name, "int", other)),
        }
    }

    /// Read a boolean parameter.
    pub fn get_bool(&self, name: &str) -> Result<bool> {
        match self.lookup(name)? {
            ParameterValue::Bool(v) => Ok(*v),
            other => Err(wrong_type(name, "bool", other)),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(d, _)| d.name == name)
    }

    fn lookup(&self, name: &str) -> Result<&ParameterValue> {
        self.get(name).ok_or_else(|| missing(name))
    }
}

fn missing(name: &str) -> MeshError {
    MeshError::ParameterMissing {
        name: name.to_string(),
    }
}

fn wrong_type(name: &str, expected: &'static str, found: &ParameterValue) -> MeshError {
    MeshError::ParameterType {
        name: name.to_string(),
        expected,
        found: found.type_name(),
    }
}
