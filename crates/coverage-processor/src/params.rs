//! Operation parameters: caller-supplied sets, schemas, and resolved
//! snapshots.
//!
//! Callers describe an invocation with a [`ParameterSet`], an ordered named
//! bag of values. The operation's schema ([`ParamDescriptor`] list) turns
//! that bag into a [`ResolvedParams`] snapshot: validated, defaulted, held
//! in schema order, and never aliasing the caller's set. The snapshot is
//! also what cache keys are derived from.

use std::fmt;
use std::sync::Arc;

use coverage_common::{Coverage, Crs, GridGeometry};

use crate::error::{ProcessingError, Result};
use crate::interpolation::InterpolationMethod;

/// A single parameter value.
#[derive(Debug, Clone)]
pub enum ParamValue {
    Float(f64),
    FloatList(Vec<f64>),
    Int(i64),
    Str(String),
    Interpolation(InterpolationMethod),
    Crs(Crs),
    GridGeometry(GridGeometry),
    Coverage(Arc<Coverage>),
}

impl ParamValue {
    /// The kind tag of this value.
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Float(_) => ParamKind::Float,
            ParamValue::FloatList(_) => ParamKind::FloatList,
            ParamValue::Int(_) => ParamKind::Int,
            ParamValue::Str(_) => ParamKind::Str,
            ParamValue::Interpolation(_) => ParamKind::Interpolation,
            ParamValue::Crs(_) => ParamKind::Crs,
            ParamValue::GridGeometry(_) => ParamKind::GridGeometry,
            ParamValue::Coverage(_) => ParamKind::Coverage,
        }
    }

    /// Stable token for cache keys.
    ///
    /// Floats are keyed by bit pattern so that logically equal inputs
    /// produce equal keys; coverages are keyed by identity, not content;
    /// structured values fall back to their canonical JSON form.
    fn cache_token(&self) -> String {
        match self {
            ParamValue::Float(v) => format!("f:{:016x}", v.to_bits()),
            ParamValue::FloatList(vs) => {
                let bits: Vec<String> = vs.iter().map(|v| format!("{:016x}", v.to_bits())).collect();
                format!("fl:[{}]", bits.join(","))
            }
            ParamValue::Int(v) => format!("i:{}", v),
            ParamValue::Str(s) => format!("s:{}", s),
            ParamValue::Interpolation(m) => format!("interp:{}", m),
            ParamValue::Crs(crs) => {
                format!("crs:{}", serde_json::to_string(crs).unwrap_or_default())
            }
            ParamValue::GridGeometry(geom) => {
                format!("geom:{}", serde_json::to_string(geom).unwrap_or_default())
            }
            ParamValue::Coverage(cov) => format!("cov:{}", cov.id()),
        }
    }
}

/// Kind tag for parameter values, used by schema validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Float,
    FloatList,
    Int,
    Str,
    Interpolation,
    Crs,
    GridGeometry,
    Coverage,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamKind::Float => "float",
            ParamKind::FloatList => "float list",
            ParamKind::Int => "int",
            ParamKind::Str => "string",
            ParamKind::Interpolation => "interpolation method",
            ParamKind::Crs => "CRS",
            ParamKind::GridGeometry => "grid geometry",
            ParamKind::Coverage => "coverage",
        };
        write!(f, "{}", name)
    }
}

/// One slot in an operation's parameter schema.
#[derive(Debug, Clone)]
pub struct ParamDescriptor {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<ParamValue>,
}

impl ParamDescriptor {
    /// A required parameter with no default.
    pub fn required(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default: None,
        }
    }

    /// An optional parameter with no default.
    pub fn optional(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
        }
    }

    /// An optional parameter that falls back to `default` when absent.
    pub fn with_default(name: impl Into<String>, default: ParamValue) -> Self {
        Self {
            name: name.into(),
            kind: default.kind(),
            required: false,
            default: Some(default),
        }
    }

    /// The source-coverage slot at the given index ("Source0", "Source1", …).
    pub fn source(index: usize) -> Self {
        Self::required(format!("Source{}", index), ParamKind::Coverage)
    }
}

/// An ordered, named bag of parameter values supplied by the caller.
///
/// Values are kept in insertion order; setting an existing name replaces
/// its value in place. The pipeline never mutates a caller's set; it
/// copies validated values into a [`ResolvedParams`] snapshot first.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    values: Vec<(String, ParamValue)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, replacing any existing value of the same name.
    pub fn with(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.set(name, value);
        self
    }

    /// Builder-style insert of the source-coverage slot at `index`.
    pub fn with_source(self, index: usize, coverage: Arc<Coverage>) -> Self {
        self.with(format!("Source{}", index), ParamValue::Coverage(coverage))
    }

    /// Insert or replace a value.
    pub fn set(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        if let Some(slot) = self.values.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.values.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A validated parameter snapshot in schema order.
///
/// Produced by `OperationDescriptor::resolve`; holds its own copies of the
/// caller's values plus any schema defaults that applied. Optional
/// parameters that were absent and have no default are simply not present.
#[derive(Debug, Clone)]
pub struct ResolvedParams {
    operation: String,
    values: Vec<(String, ParamValue)>,
}

impl ResolvedParams {
    pub(crate) fn new(operation: String, values: Vec<(String, ParamValue)>) -> Self {
        Self { operation, values }
    }

    /// Name of the operation this snapshot was resolved against.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Typed accessor failing with `InvalidParameter` on absence or kind
    /// mismatch.
    pub fn float(&self, name: &str) -> Result<f64> {
        match self.get(name) {
            Some(ParamValue::Float(v)) => Ok(*v),
            Some(other) => Err(self.kind_error(name, ParamKind::Float, other)),
            None => Err(self.missing_error(name)),
        }
    }

    pub fn float_list(&self, name: &str) -> Result<Vec<f64>> {
        match self.get(name) {
            Some(ParamValue::FloatList(vs)) => Ok(vs.clone()),
            Some(other) => Err(self.kind_error(name, ParamKind::FloatList, other)),
            None => Err(self.missing_error(name)),
        }
    }

    pub fn int(&self, name: &str) -> Result<i64> {
        match self.get(name) {
            Some(ParamValue::Int(v)) => Ok(*v),
            Some(other) => Err(self.kind_error(name, ParamKind::Int, other)),
            None => Err(self.missing_error(name)),
        }
    }

    pub fn str(&self, name: &str) -> Result<&str> {
        match self.get(name) {
            Some(ParamValue::Str(s)) => Ok(s.as_str()),
            Some(other) => Err(self.kind_error(name, ParamKind::Str, other)),
            None => Err(self.missing_error(name)),
        }
    }

    /// Optional accessors returning `None` when the slot is absent.
    pub fn interpolation(&self, name: &str) -> Option<InterpolationMethod> {
        match self.get(name) {
            Some(ParamValue::Interpolation(m)) => Some(*m),
            _ => None,
        }
    }

    pub fn crs(&self, name: &str) -> Option<&Crs> {
        match self.get(name) {
            Some(ParamValue::Crs(crs)) => Some(crs),
            _ => None,
        }
    }

    pub fn grid_geometry(&self, name: &str) -> Option<&GridGeometry> {
        match self.get(name) {
            Some(ParamValue::GridGeometry(geom)) => Some(geom),
            _ => None,
        }
    }

    pub fn coverage(&self, name: &str) -> Result<Arc<Coverage>> {
        match self.get(name) {
            Some(ParamValue::Coverage(cov)) => Ok(Arc::clone(cov)),
            Some(other) => Err(self.kind_error(name, ParamKind::Coverage, other)),
            None => Err(self.missing_error(name)),
        }
    }

    /// All source coverages in schema order.
    pub fn sources(&self) -> Vec<Arc<Coverage>> {
        self.values
            .iter()
            .filter_map(|(_, v)| match v {
                ParamValue::Coverage(cov) => Some(Arc::clone(cov)),
                _ => None,
            })
            .collect()
    }

    /// The memoization key for this invocation.
    ///
    /// Stable under repeated construction from equal logical inputs:
    /// values are tokenized in schema order, with coverages contributing
    /// their identity rather than their pixel data.
    pub fn cache_key(&self) -> CacheKey {
        let mut token = String::new();
        for (name, value) in &self.values {
            token.push_str(name);
            token.push('=');
            token.push_str(&value.cache_token());
            token.push(';');
        }
        CacheKey {
            operation: self.operation.clone(),
            token,
        }
    }

    fn kind_error(&self, name: &str, expected: ParamKind, got: &ParamValue) -> ProcessingError {
        ProcessingError::invalid_parameter(
            name,
            format!("expected {}, got {}", expected, got.kind()),
        )
    }

    fn missing_error(&self, name: &str) -> ProcessingError {
        ProcessingError::invalid_parameter(name, "missing required parameter")
    }
}

/// Memoization key: operation identity plus the resolved parameter
/// snapshot, excluding source pixel data but including source identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    operation: String,
    token: String,
}

impl CacheKey {
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.operation, self.token)
    }
}
