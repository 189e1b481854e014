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
use assert_cmd::cargo;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;
use tempfile::tempdir;

use fs_extra::dir::CopyOptions;
use fs_extra::dir::copy;
use std::fs;

use serde_json::Value;

/// Copies ./tests/fixtures into a temp dir and returns (guard, canonical fixtures dir).
fn stage_fixtures() -> (TempDir, PathBuf) {
  let temp = tempdir().unwrap();
  let options = CopyOptions::new();
  copy("tests/fixtures", temp.path(), &options).unwrap();
  let dir = temp.path().join("fixtures").canonicalize().unwrap();
  (temp, dir)
}

/// A `voltc` command running in `dir` with none of its settings inherited.
fn voltc(dir: &Path) -> Command {
  let mut cmd = Command::new(cargo::cargo_bin!("voltc"));
  cmd
    .current_dir(dir)
    .env_remove("VOLTMETER_YML")
    .env_remove("VOLTMETER_MK")
    .env_remove("BENCHMARKS_SH")
    .env_remove("VOLTC_DIALECT")
    .env_remove("VOLTC_WORKING_DIR")
    .env_remove("VOLTC_SETTINGS")
    .env_remove("VOLTC_LOG_FILE")
    .env("CLICOLOR", "0");
  cmd
}

#[test]
fn test_generate_voltmeter_fragment() {
  let (_temp, dir) = stage_fixtures();

  voltc(&dir)
    .arg("generate")
    .arg("--manifest")
    .arg("voltmeter.yml")
    .arg("--makefrag")
    .arg("voltmeter.mk")
    .assert()
    .success()
    .stderr(predicate::str::contains("Compilation complete"));

  let fragment = fs::read_to_string(dir.join("voltmeter.mk")).unwrap();
  let d = dir.display();
  let expected = format!(
    "\
# This file is automatically generated by voltc

-include ./config.mk

# Voltmeter compilation parameter
platform := jetson_agx_xavier
profile_cpu := 1
frequencies_cpu := 1190400 2265600
profile_gpu := 0
num_run := 5
sample_period_us := 100000

# Voltmeter CLI arguments
VOLTMETER_ARGS += --events=cli
VOLTMETER_ARGS += --cli_cpu=0,3,17
VOLTMETER_ARGS += --mode=profile
VOLTMETER_ARGS += --trace_dir={d}/traces
BENCHMARKS := $$' \\
\t--benchmark={d}/bin/matmul --benchmark_args=-n,1024,-mtwo words\\n \\
\t--benchmark={d}/bin/idle \\
'
"
  );
  assert_eq!(fragment, expected);
}

#[test]
fn test_generate_launcher_from_environment() {
  let (_temp, dir) = stage_fixtures();

  voltc(&dir)
    .arg("generate")
    .env("VOLTMETER_YML", "launcher.yml")
    .env("VOLTMETER_MK", "voltmeter.mk")
    .env("BENCHMARKS_SH", "benchmarks.sh")
    .env("VOLTC_DIALECT", "launcher")
    .assert()
    .success();

  let fragment = fs::read_to_string(dir.join("voltmeter.mk")).unwrap();
  assert!(fragment.contains("PLATFORM := jetson_agx_xavier\n"));
  assert!(fragment.contains("PROFILE_CPU := 1\n"));
  assert!(fragment.contains("BENCHMARK_LIBS := libA libB libC\n"));

  let script = fs::read_to_string(dir.join("benchmarks.sh")).unwrap();
  assert_eq!(
    script,
    format!(
      "#!/bin/bash\n{d}/bin/first --size 64\n{d}/bin/second \n",
      d = dir.display()
    )
  );
}

#[test]
fn test_generate_legacy_ignores_unmet_dependencies() {
  let (_temp, dir) = stage_fixtures();

  voltc(&dir)
    .arg("generate")
    .arg("--manifest")
    .arg("legacy.yml")
    .arg("--makefrag")
    .arg("legacy.mk")
    .arg("--dialect")
    .arg("voltmeter-legacy")
    .assert()
    .success()
    .stderr(predicate::str::contains("Ignoring field"));

  let fragment = fs::read_to_string(dir.join("legacy.mk")).unwrap();
  assert!(fragment.contains("PROFILE_GPU := 1\n"));
  assert!(fragment.contains("PROFILE_CPU := 0\n"));
  assert!(fragment.contains(&format!(
    "VOLTMETER_ARGS += --config_gpu={}/cfg/gpu.cfg\n",
    dir.display()
  )));
  assert!(!fragment.contains("cli_cpu"));
  assert!(fragment.contains("--benchmark_args=-k,3,-s,a b \\\n"));
}

#[test]
fn test_settings_file_supplies_locations() {
  let (_temp, dir) = stage_fixtures();
  fs::write(
    dir.join("voltc.json"),
    r#"{ "manifest": "voltmeter.yml", "makefrag": "from-settings.mk" }"#,
  )
  .unwrap();

  voltc(&dir)
    .arg("generate")
    .arg("--settings")
    .arg("voltc.json")
    .assert()
    .success();

  assert!(dir.join("from-settings.mk").exists());
}

#[test]
fn test_invalid_manifest_reports_every_violation() {
  let (_temp, dir) = stage_fixtures();

  voltc(&dir)
    .arg("generate")
    .arg("--manifest")
    .arg("invalid_events.yml")
    .arg("--makefrag")
    .arg("voltmeter.mk")
    .assert()
    .failure()
    .stderr(predicate::str::contains("invalid_events.yml"))
    .stderr(predicate::str::contains("arguments.events: unmet dependency"))
    .stderr(predicate::str::contains("param-profiler.num_run: disallowed value"));

  assert!(!dir.join("voltmeter.mk").exists());
}

#[test]
fn test_unbalanced_quotes_abort_before_writing() {
  let (_temp, dir) = stage_fixtures();

  voltc(&dir)
    .arg("generate")
    .arg("--manifest")
    .arg("bad_args.yml")
    .arg("--makefrag")
    .arg("voltmeter.mk")
    .assert()
    .failure()
    .stderr(predicate::str::contains("arguments.benchmarks[0].args"))
    .stderr(predicate::str::contains("unbalanced quotes"));

  assert!(!dir.join("voltmeter.mk").exists());
}

#[test]
fn test_missing_manifest_location() {
  let (_temp, dir) = stage_fixtures();

  voltc(&dir)
    .arg("generate")
    .arg("--makefrag")
    .arg("voltmeter.mk")
    .assert()
    .failure()
    .stderr(predicate::str::contains("VOLTMETER_YML"));
}

#[test]
fn test_check_prints_normalized_json() {
  let (_temp, dir) = stage_fixtures();

  let output = voltc(&dir)
    .arg("check")
    .arg("--manifest")
    .arg("voltmeter.yml")
    .arg("--json")
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["dialect"], "voltmeter");
  assert_eq!(json["benchmarks"][0]["name"], "matmul");
  assert_eq!(json["benchmarks"][0]["encoded_args"], "-n,1024,-mtwo words");
  assert_eq!(
    json["benchmarks"][1]["path"],
    dir.join("bin/idle").display().to_string()
  );

  let entries = fs::read_dir(&dir).unwrap().count();
  assert_eq!(entries, 5, "check must not write any file");
}

#[test]
fn test_encode_args() {
  let (_temp, dir) = stage_fixtures();

  voltc(&dir)
    .arg("encode-args")
    .arg(r#"-a 1 -b "two words" -c"#)
    .assert()
    .success()
    .stdout("-a,1,-btwo words,-c\n");

  voltc(&dir)
    .arg("encode-args")
    .arg("foo,bar")
    .assert()
    .failure()
    .stderr(predicate::str::contains("must not contain ','"));
}
