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
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error enum for the voltc library.
#[derive(Error, Debug)]
pub enum VoltcError {
  #[error("Required setting '{setting}' not supplied: set {env} or pass --{setting}")]
  ConfigSourceMissing {
    setting: &'static str,
    env: &'static str,
  },

  #[error("Failed to resolve settings: {0}")]
  Settings(#[from] Box<figment::Error>),

  #[error("Failed to determine the working directory")]
  WorkingDir(#[source] std::io::Error),

  #[error("Failed to read manifest file: {path}")]
  ReadManifest {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to parse manifest YAML: {path}")]
  ParseManifest {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("Invalid {path}:\n{violations}")]
  InvalidManifest { path: PathBuf, violations: Violations },

  #[error("Invalid {path}: field '{field}': {source}")]
  Encoding {
    path: PathBuf,
    field: String,
    #[source]
    source: ArgumentEncodingError,
  },

  #[error("Failed to write generated file: {path}")]
  WriteArtifact {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("JSON serialization error: {0}")]
  Json(#[from] serde_json::Error),
}

impl From<figment::Error> for VoltcError {
  fn from(err: figment::Error) -> Self {
    VoltcError::Settings(Box::new(err))
  }
}

/// Errors raised while re-encoding a benchmark argument string (src/encode.rs).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentEncodingError {
  #[error("invalid argument syntax, benchmark arguments must not contain ',': {args}")]
  InvalidArgumentSyntax { args: String },

  #[error("unbalanced quotes in benchmark arguments: {args}")]
  UnbalancedQuotes { args: String },
}

/// A benchmark argument string that could not be encoded, located by field path (src/normalize.rs).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("field '{field}': {source}")]
pub struct NormalizeError {
  pub field: String,
  #[source]
  pub source: ArgumentEncodingError,
}

/// The class of a single schema violation (src/validate.rs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
  MissingRequiredKey,
  WrongType,
  UnknownKey,
  DisallowedValue,
  UnmetDependency,
}

impl fmt::Display for ViolationKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      ViolationKind::MissingRequiredKey => "missing required key",
      ViolationKind::WrongType => "wrong type",
      ViolationKind::UnknownKey => "unknown key",
      ViolationKind::DisallowedValue => "disallowed value",
      ViolationKind::UnmetDependency => "unmet dependency",
    };
    f.write_str(label)
  }
}

/// A single schema violation, located by its dotted field path
/// (e.g. `arguments.benchmarks[1].path`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
  pub field: String,
  pub kind: ViolationKind,
  pub detail: String,
}

impl fmt::Display for Violation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let field = if self.field.is_empty() {
      "(root)"
    } else {
      &self.field
    };
    write!(f, "  {}: {}: {}", field, self.kind, self.detail)
  }
}

/// Every violation found in one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(pub Vec<Violation>);

impl Violations {
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
    self.0.iter()
  }

  /// Returns the first violation reported for `field`, if any.
  pub fn find(&self, field: &str) -> Option<&Violation> {
    self.0.iter().find(|v| v.field == field)
  }
}

impl fmt::Display for Violations {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, v) in self.0.iter().enumerate() {
      if i > 0 {
        writeln!(f)?;
      }
      write!(f, "{}", v)?;
    }
    Ok(())
  }
}

impl std::error::Error for Violations {}
