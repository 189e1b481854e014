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
use crate::error::Violation;
use crate::error::ViolationKind;
use crate::error::Violations;
use crate::schema::Field;
use crate::schema::Node;
use crate::schema::ScalarRule;
use crate::schema::Schema;
use serde_yaml::Mapping;
use serde_yaml::Value;

/// A manifest that passed validation, paired with the schema it was checked against.
///
/// Only [`validate`] constructs this, so the normalizer never sees an
/// unchecked document.
#[derive(Debug, Clone)]
pub struct ValidDocument {
  schema: Schema,
  root: Mapping,
}

impl ValidDocument {
  pub fn schema(&self) -> &Schema {
    &self.schema
  }

  pub fn root(&self) -> &Mapping {
    &self.root
  }
}

/// Checks `document` against `schema`, collecting every violation in one pass.
pub fn validate(document: &Value, schema: &Schema) -> Result<ValidDocument, Violations> {
  let mut validator = Validator {
    strict: schema.strict_dependencies,
    violations: Vec::new(),
  };

  let Value::Mapping(root) = document else {
    validator.report(
      "",
      ViolationKind::WrongType,
      format!("expected a mapping at the top level, found {}", describe(document)),
    );
    return Err(Violations(validator.violations));
  };

  validator.check_dict(root, &schema.fields, None, "");

  if validator.violations.is_empty() {
    Ok(ValidDocument {
      schema: schema.clone(),
      root: root.clone(),
    })
  } else {
    Err(Violations(validator.violations))
  }
}

/// Returns `map` with the defaults of every absent field filled in.
///
/// Conditions are evaluated against this view so that a defaulted sibling
/// counts as set.
pub(crate) fn with_defaults(map: &Mapping, fields: &[Field]) -> Mapping {
  let mut view = map.clone();
  for field in fields {
    if let Some(default) = field.default {
      if !view.contains_key(field.name) {
        view.insert(Value::String(field.name.to_string()), default.to_value());
      }
    }
  }
  view
}

pub(crate) fn join_path(parent: &str, key: &str) -> String {
  if parent.is_empty() {
    key.to_string()
  } else {
    format!("{}.{}", parent, key)
  }
}

struct Validator {
  strict: bool,
  violations: Vec<Violation>,
}

impl Validator {
  fn report(&mut self, field: &str, kind: ViolationKind, detail: impl Into<String>) {
    self.violations.push(Violation {
      field: field.to_string(),
      kind,
      detail: detail.into(),
    });
  }

  fn check_dict(&mut self, map: &Mapping, fields: &[Field], values: Option<&Node>, path: &str) {
    let siblings = with_defaults(map, fields);

    for field in fields {
      let field_path = join_path(path, field.name);
      let active = field
        .depends_on
        .as_ref()
        .is_none_or(|condition| condition.holds(&siblings));
      let forbidden = field
        .forbidden_when
        .as_ref()
        .filter(|condition| condition.holds(&siblings));

      let Some(value) = map.get(field.name) else {
        if field.required && field.default.is_none() && active && forbidden.is_none() {
          self.report(
            &field_path,
            ViolationKind::MissingRequiredKey,
            "required key not found",
          );
        }
        continue;
      };

      if let Some(condition) = forbidden {
        self.report(
          &field_path,
          ViolationKind::UnmetDependency,
          format!("must not be set while {}", condition),
        );
        continue;
      }

      if !active {
        if let Some(condition) = &field.depends_on {
          if self.strict {
            self.report(
              &field_path,
              ViolationKind::UnmetDependency,
              format!("only allowed while {}", condition),
            );
            continue;
          }
          tracing::warn!(field = %field_path, "Ignoring field, only meaningful while {}", condition);
        }
      }

      if value.is_null() {
        if !field.nullable {
          self.report(&field_path, ViolationKind::WrongType, "must not be null");
        }
        continue;
      }

      self.check_node(value, &field.node, &field_path);

      if let Some(condition) = &field.constraint {
        if !condition.holds(&siblings) {
          self.report(
            &field_path,
            ViolationKind::UnmetDependency,
            format!("requires {}", condition),
          );
        }
      }
    }

    for (key, value) in map {
      let Some(name) = key.as_str() else {
        self.report(
          path,
          ViolationKind::UnknownKey,
          format!("non-string key {:?}", key),
        );
        continue;
      };
      if fields.iter().any(|field| field.name == name) {
        continue;
      }

      let key_path = join_path(path, name);
      match values {
        Some(_) if value.is_null() => {
          self.report(&key_path, ViolationKind::WrongType, "must not be null");
        }
        Some(node) => self.check_node(value, node, &key_path),
        None => self.report(&key_path, ViolationKind::UnknownKey, "key not expected"),
      }
    }
  }

  fn check_node(&mut self, value: &Value, node: &Node, path: &str) {
    match (node, value) {
      (Node::Scalar(rule), _) => self.check_scalar(value, rule, path),
      (Node::List { item, non_empty }, Value::Sequence(items)) => {
        if *non_empty && items.is_empty() {
          self.report(path, ViolationKind::DisallowedValue, "list must not be empty");
        }
        for (i, element) in items.iter().enumerate() {
          let element_path = format!("{}[{}]", path, i);
          if element.is_null() {
            self.report(
              &element_path,
              ViolationKind::WrongType,
              "must not be null",
            );
          } else {
            self.check_node(element, item, &element_path);
          }
        }
      }
      (Node::Dict { fields, values }, Value::Mapping(map)) => {
        self.check_dict(map, fields, values.as_deref(), path)
      }
      _ => self.report(
        path,
        ViolationKind::WrongType,
        format!("expected {}, found {}", node.type_name(), describe(value)),
      ),
    }
  }

  fn check_scalar(&mut self, value: &Value, rule: &ScalarRule, path: &str) {
    if !rule.kind.matches(value) {
      self.report(
        path,
        ViolationKind::WrongType,
        format!("expected {}, found {}", rule.kind.name(), describe(value)),
      );
      return;
    }

    if let (Some(allowed), Some(text)) = (rule.allowed, value.as_str()) {
      if !allowed.contains(&text) {
        self.report(
          path,
          ViolationKind::DisallowedValue,
          format!("'{}' is not one of {:?}", text, allowed),
        );
      }
    }

    if let (Some(min), Some(number)) = (rule.min, value.as_i64()) {
      if number < min {
        self.report(
          path,
          ViolationKind::DisallowedValue,
          format!("{} is below the minimum of {}", number, min),
        );
      }
    }
  }
}

fn describe(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Sequence(_) => "list",
    Value::Mapping(_) => "mapping",
    Value::Tagged(_) => "tagged value",
  }
}
