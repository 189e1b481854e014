//! Declarative manifest schemas.
//!
//! A schema is a tree of [`Field`]s whose shapes are [`Node`]s: scalars,
//! lists, and dicts. Conditional rules are [`Condition`] predicates over the
//! sibling mapping a field lives in. The tree is pure data; [`crate::validate`]
//! is the only thing that interprets it.

mod dialects;

use serde::Deserialize;
use serde::Serialize;
use serde_yaml::Mapping;
use serde_yaml::Value;
use std::fmt;

/// The manifest dialects understood by the compiler.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
  /// `parameters` + library-aware `benchmarks`; emits a launcher script.
  Launcher,
  /// `param-*` sections + `arguments`, with strict dependency checks.
  #[default]
  Voltmeter,
  /// Earlier upper-case `param-*` layout; unmet dependencies are ignored.
  VoltmeterLegacy,
}

impl Dialect {
  pub fn schema(self) -> Schema {
    match self {
      Dialect::Launcher => Schema {
        dialect: self,
        fields: dialects::launcher(),
        strict_dependencies: true,
      },
      Dialect::Voltmeter => Schema {
        dialect: self,
        fields: dialects::voltmeter(),
        strict_dependencies: true,
      },
      Dialect::VoltmeterLegacy => Schema {
        dialect: self,
        fields: dialects::voltmeter_legacy(),
        strict_dependencies: false,
      },
    }
  }

  /// Top-level section holding the voltmeter CLI arguments, if the dialect has one.
  /// Every other top-level dict is a parameter section.
  pub fn arguments_section(self) -> Option<&'static str> {
    match self {
      Dialect::Launcher => None,
      Dialect::Voltmeter | Dialect::VoltmeterLegacy => Some("arguments"),
    }
  }

  /// Whether benchmark `args` go through the comma re-encoding.
  pub fn encodes_arguments(self) -> bool {
    self.arguments_section().is_some()
  }

  /// Whether the dialect collects `libs` and emits a launcher script.
  pub fn is_launcher(self) -> bool {
    self == Dialect::Launcher
  }
}

impl fmt::Display for Dialect {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Dialect::Launcher => "launcher",
      Dialect::Voltmeter => "voltmeter",
      Dialect::VoltmeterLegacy => "voltmeter-legacy",
    };
    f.write_str(name)
  }
}

/// A complete schema: the root fields of one dialect.
#[derive(Debug, Clone)]
pub struct Schema {
  pub dialect: Dialect,
  pub fields: Vec<Field>,
  /// When false, a present field whose `depends_on` does not hold is ignored
  /// instead of reported.
  pub strict_dependencies: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
  String,
  Integer,
  Boolean,
  /// A string that the normalizer resolves to an absolute path.
  Path,
  /// Any scalar; stringified on output.
  Text,
  /// A string, integer, or boolean kept with its type.
  Value,
}

impl ScalarKind {
  pub fn matches(self, value: &Value) -> bool {
    match (self, value) {
      (ScalarKind::String | ScalarKind::Path, Value::String(_)) => true,
      (ScalarKind::Integer, Value::Number(n)) => n.as_i64().is_some(),
      (ScalarKind::Boolean, Value::Bool(_)) => true,
      (ScalarKind::Text, Value::String(_) | Value::Number(_) | Value::Bool(_)) => true,
      (ScalarKind::Value, Value::String(_) | Value::Bool(_)) => true,
      (ScalarKind::Value, Value::Number(n)) => n.as_i64().is_some(),
      _ => false,
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      ScalarKind::String => "string",
      ScalarKind::Integer => "integer",
      ScalarKind::Boolean => "boolean",
      ScalarKind::Path => "path string",
      ScalarKind::Text => "scalar",
      ScalarKind::Value => "string, integer or boolean",
    }
  }
}

#[derive(Debug, Clone)]
pub struct ScalarRule {
  pub kind: ScalarKind,
  pub allowed: Option<&'static [&'static str]>,
  pub min: Option<i64>,
}

/// The shape of a value.
#[derive(Debug, Clone)]
pub enum Node {
  Scalar(ScalarRule),
  List {
    item: Box<Node>,
    non_empty: bool,
  },
  /// A mapping with declared `fields`. When `values` is set, undeclared keys
  /// are accepted as long as their value matches it.
  Dict {
    fields: Vec<Field>,
    values: Option<Box<Node>>,
  },
}

impl Node {
  fn scalar(kind: ScalarKind) -> Self {
    Node::Scalar(ScalarRule {
      kind,
      allowed: None,
      min: None,
    })
  }

  pub fn string() -> Self {
    Node::scalar(ScalarKind::String)
  }

  pub fn integer() -> Self {
    Node::scalar(ScalarKind::Integer)
  }

  pub fn boolean() -> Self {
    Node::scalar(ScalarKind::Boolean)
  }

  pub fn path() -> Self {
    Node::scalar(ScalarKind::Path)
  }

  pub fn text() -> Self {
    Node::scalar(ScalarKind::Text)
  }

  pub fn value() -> Self {
    Node::scalar(ScalarKind::Value)
  }

  pub fn list(item: Node) -> Self {
    Node::List {
      item: Box::new(item),
      non_empty: false,
    }
  }

  pub fn dict(fields: Vec<Field>) -> Self {
    Node::Dict {
      fields,
      values: None,
    }
  }

  /// An open mapping whose every value must match `values`.
  pub fn map_of(values: Node) -> Self {
    Node::Dict {
      fields: Vec::new(),
      values: Some(Box::new(values)),
    }
  }

  pub fn allowed(mut self, literals: &'static [&'static str]) -> Self {
    if let Node::Scalar(rule) = &mut self {
      rule.allowed = Some(literals);
    }
    self
  }

  pub fn min(mut self, bound: i64) -> Self {
    if let Node::Scalar(rule) = &mut self {
      rule.min = Some(bound);
    }
    self
  }

  pub fn non_empty(mut self) -> Self {
    if let Node::List { non_empty, .. } = &mut self {
      *non_empty = true;
    }
    self
  }

  pub fn type_name(&self) -> &'static str {
    match self {
      Node::Scalar(rule) => rule.kind.name(),
      Node::List { .. } => "list",
      Node::Dict { .. } => "dict",
    }
  }
}

/// A named entry of a dict node.
#[derive(Debug, Clone)]
pub struct Field {
  pub name: &'static str,
  pub node: Node,
  pub required: bool,
  pub nullable: bool,
  pub default: Option<Literal>,
  /// The field is only meaningful (and only required) while this holds.
  pub depends_on: Option<Condition>,
  /// Must hold whenever the field is present.
  pub constraint: Option<Condition>,
  /// The field must be absent while this holds.
  pub forbidden_when: Option<Condition>,
}

impl Field {
  pub fn new(name: &'static str, node: Node) -> Self {
    Field {
      name,
      node,
      required: false,
      nullable: false,
      default: None,
      depends_on: None,
      constraint: None,
      forbidden_when: None,
    }
  }

  pub fn required(mut self) -> Self {
    self.required = true;
    self
  }

  pub fn nullable(mut self) -> Self {
    self.nullable = true;
    self
  }

  pub fn with_default(mut self, literal: Literal) -> Self {
    self.default = Some(literal);
    self
  }

  pub fn depends_on(mut self, condition: Condition) -> Self {
    self.depends_on = Some(condition);
    self
  }

  pub fn constraint(mut self, condition: Condition) -> Self {
    self.constraint = Some(condition);
    self
  }

  pub fn forbidden_when(mut self, condition: Condition) -> Self {
    self.forbidden_when = Some(condition);
    self
  }
}

/// A constant appearing in a schema table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
  Bool(bool),
  Int(i64),
  Str(&'static str),
}

impl Literal {
  pub fn matches(&self, value: &Value) -> bool {
    match (self, value) {
      (Literal::Bool(b), Value::Bool(v)) => b == v,
      (Literal::Int(i), Value::Number(n)) => n.as_i64() == Some(*i),
      (Literal::Str(s), Value::String(v)) => s == v,
      _ => false,
    }
  }

  pub fn to_value(self) -> Value {
    match self {
      Literal::Bool(b) => Value::Bool(b),
      Literal::Int(i) => Value::Number(i.into()),
      Literal::Str(s) => Value::String(s.to_string()),
    }
  }
}

impl fmt::Display for Literal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Literal::Bool(b) => write!(f, "{}", b),
      Literal::Int(i) => write!(f, "{}", i),
      Literal::Str(s) => write!(f, "'{}'", s),
    }
  }
}

/// A predicate over the sibling keys of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
  Equals(&'static str, Literal),
  /// The sibling is present and not null.
  Present(&'static str),
  All(Vec<Condition>),
  Any(Vec<Condition>),
  Not(Box<Condition>),
}

impl Condition {
  pub fn equals(key: &'static str, literal: Literal) -> Self {
    Condition::Equals(key, literal)
  }

  pub fn present(key: &'static str) -> Self {
    Condition::Present(key)
  }

  pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
    Condition::All(conditions.into_iter().collect())
  }

  pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
    Condition::Any(conditions.into_iter().collect())
  }

  pub fn not(condition: Condition) -> Self {
    Condition::Not(Box::new(condition))
  }

  pub fn holds(&self, siblings: &Mapping) -> bool {
    match self {
      Condition::Equals(key, literal) => siblings.get(*key).is_some_and(|v| literal.matches(v)),
      Condition::Present(key) => siblings.get(*key).is_some_and(|v| !v.is_null()),
      Condition::All(all) => all.iter().all(|c| c.holds(siblings)),
      Condition::Any(any) => any.iter().any(|c| c.holds(siblings)),
      Condition::Not(inner) => !inner.holds(siblings),
    }
  }
}

impl fmt::Display for Condition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fn join(f: &mut fmt::Formatter<'_>, parts: &[Condition], sep: &str) -> fmt::Result {
      f.write_str("(")?;
      for (i, c) in parts.iter().enumerate() {
        if i > 0 {
          f.write_str(sep)?;
        }
        write!(f, "{}", c)?;
      }
      f.write_str(")")
    }

    match self {
      Condition::Equals(key, literal) => write!(f, "{} == {}", key, literal),
      Condition::Present(key) => write!(f, "{} is set", key),
      Condition::All(all) => join(f, all, " and "),
      Condition::Any(any) => join(f, any, " or "),
      Condition::Not(inner) => write!(f, "not {}", inner),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn mapping(yaml: &str) -> Mapping {
    serde_yaml::from_str(yaml).unwrap()
  }

  #[test]
  fn test_condition_combinators() {
    let siblings = mapping("events: cli\ncli_cpu: [1, 2]\ncli_gpu: ~\n");

    assert!(Condition::equals("events", Literal::Str("cli")).holds(&siblings));
    assert!(!Condition::equals("events", Literal::Str("CLI")).holds(&siblings));
    assert!(Condition::present("cli_cpu").holds(&siblings));
    assert!(!Condition::present("cli_gpu").holds(&siblings));
    assert!(!Condition::present("config_cpu").holds(&siblings));

    let needs_events = Condition::all([
      Condition::equals("events", Literal::Str("cli")),
      Condition::any([Condition::present("cli_cpu"), Condition::present("cli_gpu")]),
    ]);
    assert!(needs_events.holds(&siblings));
    assert!(!Condition::not(needs_events).holds(&siblings));
  }

  #[test]
  fn test_condition_display() {
    let c = Condition::any([
      Condition::equals("profile_cpu", Literal::Bool(false)),
      Condition::present("frequencies_cpu"),
    ]);
    assert_eq!(
      c.to_string(),
      "(profile_cpu == false or frequencies_cpu is set)"
    );
  }

  #[test]
  fn test_scalar_kinds() {
    let int: Value = serde_yaml::from_str("3").unwrap();
    let float: Value = serde_yaml::from_str("3.5").unwrap();
    let text: Value = serde_yaml::from_str("hello").unwrap();

    assert!(ScalarKind::Integer.matches(&int));
    assert!(!ScalarKind::Integer.matches(&float));
    assert!(ScalarKind::Text.matches(&int));
    assert!(ScalarKind::Path.matches(&text));
    assert!(!ScalarKind::Value.matches(&float));
    assert!(!ScalarKind::Boolean.matches(&Value::Null));
  }

  #[test]
  fn test_every_dialect_declares_benchmarks() {
    for dialect in [
      Dialect::Launcher,
      Dialect::Voltmeter,
      Dialect::VoltmeterLegacy,
    ] {
      let schema = dialect.schema();
      let container = match dialect.arguments_section() {
        Some(section) => match &schema.fields.iter().find(|f| f.name == section).unwrap().node {
          Node::Dict { fields, .. } => fields.clone(),
          other => panic!("arguments section is a {}", other.type_name()),
        },
        None => schema.fields.clone(),
      };
      assert!(
        container.iter().any(|f| f.name == "benchmarks"),
        "{} has no benchmarks field",
        dialect
      );
    }
  }
}
