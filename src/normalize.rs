// Copyright 2025 Chisomo Makombo Sakala
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use crate::encode::EncodedArgs;
use crate::encode::encode_args;
use crate::error::NormalizeError;
use crate::schema::Dialect;
use crate::schema::Field;
use crate::schema::Node;
use crate::schema::ScalarKind;
use crate::validate::ValidDocument;
use crate::validate::join_path;
use crate::validate::with_defaults;
use serde::Serialize;
use serde_yaml::Mapping;
use serde_yaml::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// A scalar as it will be printed into the fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
  Bool(bool),
  Int(i64),
  Str(String),
}

impl Scalar {
  fn from_value(value: &Value) -> Option<Scalar> {
    match value {
      Value::Bool(b) => Some(Scalar::Bool(*b)),
      Value::Number(n) => Some(match n.as_i64() {
        Some(i) => Scalar::Int(i),
        None => Scalar::Str(n.to_string()),
      }),
      Value::String(s) => Some(Scalar::Str(s.clone())),
      _ => None,
    }
  }
}

/// Booleans render as `0`/`1` so make conditionals can test them.
impl fmt::Display for Scalar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Scalar::Bool(b) => write!(f, "{}", u8::from(*b)),
      Scalar::Int(i) => write!(f, "{}", i),
      Scalar::Str(s) => f.write_str(s),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Setting {
  Scalar(Scalar),
  Path(PathBuf),
  List(Vec<Scalar>),
}

/// One `key := value` (or `--key=value`) entry, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
  pub key: String,
  pub value: Setting,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Benchmark {
  pub name: Option<String>,
  pub path: PathBuf,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub libs: Vec<String>,
  /// The stringified `args` as written in the manifest.
  pub args: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub encoded_args: Option<EncodedArgs>,
}

/// The manifest after defaults, path resolution and argument encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedDocument {
  pub dialect: Dialect,
  pub parameters: Vec<Assignment>,
  pub arguments: Vec<Assignment>,
  /// `None` when the manifest legitimately has no benchmarks (`mode: num_passes`).
  pub benchmarks: Option<Vec<Benchmark>>,
  pub libraries: BTreeSet<String>,
}

/// Turns a [`ValidDocument`] into a [`NormalizedDocument`].
///
/// Relative paths are resolved against `working_dir`, which should itself be absolute.
#[derive(Debug, Clone)]
pub struct Normalizer {
  working_dir: PathBuf,
}

impl Normalizer {
  pub fn new(working_dir: impl Into<PathBuf>) -> Self {
    Normalizer {
      working_dir: working_dir.into(),
    }
  }

  pub fn normalize(&self, document: &ValidDocument) -> Result<NormalizedDocument, NormalizeError> {
    let schema = document.schema();
    let dialect = schema.dialect;
    let root = document.root();

    let mut normalized = NormalizedDocument {
      dialect,
      parameters: Vec::new(),
      arguments: Vec::new(),
      benchmarks: None,
      libraries: BTreeSet::new(),
    };

    match dialect.arguments_section() {
      None => {
        if let Some((map, field)) = section(root, &schema.fields, "parameters") {
          normalized.parameters = self.assignments(map, &field.node, "parameters", &[]);
        }
        if let Some(list) = root.get("benchmarks") {
          normalized.benchmarks = Some(self.benchmarks(list, "benchmarks", false)?);
        }
      }
      Some(arguments) => {
        for key in root.keys().filter_map(Value::as_str) {
          if key == arguments {
            continue;
          }
          if let Some((map, field)) = section(root, &schema.fields, key) {
            let assignments = self.assignments(map, &field.node, key, &[]);
            normalized.parameters.extend(assignments);
          }
        }

        if let Some((map, field)) = section(root, &schema.fields, arguments) {
          normalized.arguments = self.assignments(map, &field.node, arguments, &["benchmarks"]);
          if let Some(list) = map.get("benchmarks") {
            let path = join_path(arguments, "benchmarks");
            normalized.benchmarks = Some(self.benchmarks(list, &path, dialect.encodes_arguments())?);
          }
        }
      }
    }

    if dialect.is_launcher() {
      normalized.libraries = normalized
        .benchmarks
        .iter()
        .flatten()
        .flat_map(|b| b.libs.iter().cloned())
        .collect();
    }

    tracing::debug!(
      parameters = normalized.parameters.len(),
      arguments = normalized.arguments.len(),
      benchmarks = normalized.benchmarks.as_ref().map_or(0, Vec::len),
      "Normalized manifest"
    );

    Ok(normalized)
  }

  /// Flattens one dict section into assignments: present keys in document
  /// order, then defaults in schema order.
  fn assignments(&self, map: &Mapping, node: &Node, path: &str, skip: &[&str]) -> Vec<Assignment> {
    let Node::Dict { fields, values } = node else {
      return Vec::new();
    };
    let siblings = with_defaults(map, fields);
    let mut assignments = Vec::new();

    for (key, value) in map {
      let Some(name) = key.as_str() else {
        continue;
      };
      if skip.contains(&name) || value.is_null() {
        continue;
      }

      let field = fields.iter().find(|f| f.name == name);
      if let Some(condition) = field.and_then(|f| f.depends_on.as_ref()) {
        if !condition.holds(&siblings) {
          tracing::debug!(field = %join_path(path, name), "Dropping ignored field");
          continue;
        }
      }

      let Some(node) = field.map(|f| &f.node).or(values.as_deref()) else {
        continue;
      };
      if let Some(setting) = self.setting(value, node) {
        assignments.push(Assignment {
          key: name.to_string(),
          value: setting,
        });
      }
    }

    for field in fields.iter().filter(|f| !map.contains_key(f.name)) {
      if let Some(default) = field.default {
        if let Some(setting) = self.setting(&default.to_value(), &field.node) {
          assignments.push(Assignment {
            key: field.name.to_string(),
            value: setting,
          });
        }
      }
    }

    assignments
  }

  fn setting(&self, value: &Value, node: &Node) -> Option<Setting> {
    match node {
      Node::Scalar(rule) if rule.kind == ScalarKind::Path => {
        value.as_str().map(|raw| Setting::Path(self.absolutize(raw)))
      }
      Node::Scalar(_) => Scalar::from_value(value).map(Setting::Scalar),
      Node::List { .. } => value
        .as_sequence()
        .map(|items| Setting::List(items.iter().filter_map(Scalar::from_value).collect())),
      Node::Dict { .. } => None,
    }
  }

  fn benchmarks(&self, list: &Value, path: &str, encode: bool) -> Result<Vec<Benchmark>, NormalizeError> {
    let Some(entries) = list.as_sequence() else {
      return Ok(Vec::new());
    };

    entries
      .iter()
      .enumerate()
      .filter_map(|(i, entry)| entry.as_mapping().map(|map| (i, map)))
      .map(|(i, entry)| -> Result<Benchmark, NormalizeError> {
        let args = entry.get("args").and_then(raw_args);

        // The launcher script carries `args` verbatim, but it still has to be
        // encodable so the shell line stays well formed.
        let encoded_args = match &args {
          Some(raw) => {
            let encoded = encode_args(raw).map_err(|source| NormalizeError {
              field: format!("{}[{}].args", path, i),
              source,
            })?;
            Some(encoded).filter(|e| encode && !e.is_empty())
          }
          None => None,
        };

        Ok(Benchmark {
          name: entry.get("name").and_then(Value::as_str).map(String::from),
          path: self.absolutize(entry.get("path").and_then(Value::as_str).unwrap_or_default()),
          libs: entry
            .get("libs")
            .and_then(Value::as_str)
            .map(|libs| libs.split_whitespace().map(String::from).collect())
            .unwrap_or_default(),
          args,
          encoded_args,
        })
      })
      .collect()
  }

  /// Lexical `abspath`: joins onto the working directory and folds `.` and `..`
  /// without touching the file system.
  pub fn absolutize(&self, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    let joined = if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.working_dir.join(path)
    };

    let mut resolved = PathBuf::new();
    for component in joined.components() {
      match component {
        Component::CurDir => {}
        Component::ParentDir => {
          resolved.pop();
        }
        other => resolved.push(other.as_os_str()),
      }
    }
    resolved
  }
}

/// Stringifies `args`. Booleans print as `True`/`False` here, unlike
/// parameter values which print as `0`/`1`.
fn raw_args(value: &Value) -> Option<String> {
  match value {
    Value::Bool(true) => Some("True".to_string()),
    Value::Bool(false) => Some("False".to_string()),
    other => Scalar::from_value(other).map(|s| s.to_string()),
  }
}

fn section<'a>(root: &'a Mapping, fields: &'a [Field], key: &str) -> Option<(&'a Mapping, &'a Field)> {
  let map = root.get(key)?.as_mapping()?;
  let field = fields.iter().find(|f| f.name == key)?;
  Some((map, field))
}
