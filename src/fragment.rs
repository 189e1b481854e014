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
use crate::normalize::Benchmark;
use crate::normalize::NormalizedDocument;
use crate::normalize::Setting;
use std::fmt;

pub const HEADER: &str = "# This file is automatically generated by voltc";

/// The generated text, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
  /// The make fragment.
  pub fragment: String,
  /// The launcher script, for dialects that have one.
  pub launcher: Option<String>,
}

/// Renders the fragment and, for the launcher dialect, the launcher script.
pub fn generate(document: &NormalizedDocument) -> Artifacts {
  let fragment = Fragment(document).to_string();
  let launcher = document
    .dialect
    .is_launcher()
    .then(|| Launcher(document).to_string());

  Artifacts { fragment, launcher }
}

fn render(setting: &Setting, separator: &str) -> String {
  match setting {
    Setting::Scalar(scalar) => scalar.to_string(),
    Setting::Path(path) => path.display().to_string(),
    Setting::List(items) => items
      .iter()
      .map(ToString::to_string)
      .collect::<Vec<_>>()
      .join(separator),
  }
}

struct Fragment<'a>(&'a NormalizedDocument);

impl fmt::Display for Fragment<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let document = self.0;
    let cli = document.dialect.arguments_section().is_some();

    writeln!(f, "{}", HEADER)?;
    writeln!(f)?;
    if cli {
      writeln!(f, "-include ./config.mk")?;
      writeln!(f)?;
      writeln!(f, "# Voltmeter compilation parameter")?;
    }

    // make lists are space separated
    for assignment in &document.parameters {
      writeln!(f, "{} := {}", assignment.key, render(&assignment.value, " "))?;
    }

    if document.dialect.is_launcher() {
      let libraries: Vec<&str> = document.libraries.iter().map(String::as_str).collect();
      writeln!(f, "BENCHMARK_LIBS := {}", libraries.join(" "))?;
    }

    if cli {
      writeln!(f)?;
      writeln!(f, "# Voltmeter CLI arguments")?;
      for assignment in &document.arguments {
        writeln!(
          f,
          "VOLTMETER_ARGS += --{}={}",
          assignment.key,
          render(&assignment.value, ",")
        )?;
      }
      if let Some(benchmarks) = document.benchmarks.as_deref().filter(|b| !b.is_empty()) {
        write_benchmarks(f, benchmarks)?;
      }
    }

    Ok(())
  }
}

/// Writes the `BENCHMARKS` shell string.
///
/// Each benchmark is one `\n`-terminated element inside `$'...'` so a shell
/// `for` loop over the variable sees one voltmeter call per element. The
/// trailing backslashes are make line continuations.
fn write_benchmarks(f: &mut fmt::Formatter<'_>, benchmarks: &[Benchmark]) -> fmt::Result {
  writeln!(f, "BENCHMARKS := $$' \\")?;
  for (i, benchmark) in benchmarks.iter().enumerate() {
    write!(f, "\t--benchmark={}", benchmark.path.display())?;
    if let Some(args) = &benchmark.encoded_args {
      write!(f, " --benchmark_args={}", args)?;
    }
    if i + 1 < benchmarks.len() {
      writeln!(f, "\\n \\")?;
    } else {
      writeln!(f, " \\")?;
      writeln!(f, "'")?;
    }
  }
  Ok(())
}

struct Launcher<'a>(&'a NormalizedDocument);

impl fmt::Display for Launcher<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "#!/bin/bash")?;
    for benchmark in self.0.benchmarks.iter().flatten() {
      writeln!(
        f,
        "{} {}",
        benchmark.path.display(),
        benchmark.args.as_deref().unwrap_or_default()
      )?;
    }
    Ok(())
  }
}
