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

//! Re-encoding of shell-style benchmark arguments into the comma-delimited
//! form passed to `voltmeter --benchmark_args`.
//!
//! `-a 1 -b "two words" -c` becomes `-a,1,-btwo words,-c`: quotes are dropped
//! and only decide which spaces are delimiters.

use crate::error::ArgumentEncodingError;
use serde::Serialize;
use std::fmt;

/// The delimiter between encoded tokens. It may not appear in the raw input.
pub const DELIMITER: char = ',';

/// A comma-delimited argument list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EncodedArgs(String);

impl EncodedArgs {
  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Splits back into the individual argument tokens.
  pub fn tokens(&self) -> Vec<&str> {
    if self.0.is_empty() {
      Vec::new()
    } else {
      self.0.split(DELIMITER).collect()
    }
  }
}

impl fmt::Display for EncodedArgs {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
  Outside,
  Inside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
  Copy,
  Delimit,
  Drop,
}

impl QuoteState {
  /// The transition table. `"` and `'` share one toggle.
  fn step(self, c: char) -> (QuoteState, Action) {
    match (self, c) {
      (QuoteState::Outside, '"' | '\'') => (QuoteState::Inside, Action::Drop),
      (QuoteState::Inside, '"' | '\'') => (QuoteState::Outside, Action::Drop),
      (QuoteState::Outside, ' ') => (QuoteState::Outside, Action::Delimit),
      (state, _) => (state, Action::Copy),
    }
  }
}

/// Tabs become spaces, whitespace runs collapse to one space, ends are trimmed.
fn collapse_whitespace(raw: &str) -> String {
  raw
    .replace('\t', " ")
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

/// Encodes a raw argument string.
pub fn encode_args(raw: &str) -> Result<EncodedArgs, ArgumentEncodingError> {
  if raw.contains(DELIMITER) {
    return Err(ArgumentEncodingError::InvalidArgumentSyntax {
      args: raw.to_string(),
    });
  }

  let collapsed = collapse_whitespace(raw);
  let mut state = QuoteState::Outside;
  let mut encoded = String::with_capacity(collapsed.len());

  for c in collapsed.chars() {
    let (next, action) = state.step(c);
    match action {
      Action::Copy => encoded.push(c),
      Action::Delimit => encoded.push(DELIMITER),
      Action::Drop => {}
    }
    state = next;
  }

  if state == QuoteState::Inside {
    return Err(ArgumentEncodingError::UnbalancedQuotes {
      args: raw.to_string(),
    });
  }

  Ok(EncodedArgs(encoded))
}
