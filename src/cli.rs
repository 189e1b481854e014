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
use crate::schema::Dialect;
use crate::settings::Settings;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
  version,
  about = "Compiles Voltmeter profiling manifests into make fragments"
)]
pub struct Cli {
  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
  /// Validate the manifest and write the make fragment (and launcher script).
  Generate(GenerateArgs),

  /// Validate and normalize the manifest without writing anything.
  Check(CheckArgs),

  /// Print the comma-encoded form of one benchmark argument string.
  EncodeArgs {
    /// Raw arguments, e.g. '-a 1 -b "two words"'.
    #[arg(allow_hyphen_values = true)]
    args: String,
  },
}

/// Options shared by every command that reads a manifest.
#[derive(Debug, Args)]
pub struct SourceArgs {
  /// The YAML manifest. Falls back to $VOLTMETER_YML.
  #[arg(long)]
  pub manifest: Option<PathBuf>,

  /// Manifest dialect. Falls back to $VOLTC_DIALECT, then `voltmeter`.
  #[arg(long, value_enum)]
  pub dialect: Option<Dialect>,

  /// Directory that relative paths in the manifest resolve against.
  /// Defaults to the current directory.
  #[arg(long)]
  pub working_dir: Option<PathBuf>,

  /// JSON settings file, layered below the environment and flags.
  #[arg(long, env = "VOLTC_SETTINGS")]
  pub settings: Option<PathBuf>,
}

impl SourceArgs {
  fn overrides(&self) -> Settings {
    Settings {
      manifest: self.manifest.clone(),
      dialect: self.dialect,
      working_dir: self.working_dir.clone(),
      ..Settings::default()
    }
  }
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
  #[command(flatten)]
  pub source: SourceArgs,

  /// Output make fragment. Falls back to $VOLTMETER_MK.
  #[arg(long)]
  pub makefrag: Option<PathBuf>,

  /// Output launcher script (launcher dialect only). Falls back to $BENCHMARKS_SH.
  #[arg(long)]
  pub launcher: Option<PathBuf>,
}

impl GenerateArgs {
  /// The command-line layer of the settings.
  pub fn overrides(&self) -> Settings {
    Settings {
      makefrag: self.makefrag.clone(),
      launcher: self.launcher.clone(),
      ..self.source.overrides()
    }
  }
}

#[derive(Debug, Args)]
pub struct CheckArgs {
  #[command(flatten)]
  pub source: SourceArgs,

  /// Print the normalized manifest as JSON.
  #[arg(long)]
  pub json: bool,
}

impl CheckArgs {
  /// The command-line layer of the settings.
  pub fn overrides(&self) -> Settings {
    self.source.overrides()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::CommandFactory;

  #[test]
  fn test_cli_is_well_formed() {
    Cli::command().debug_assert();
  }

  #[test]
  fn test_generate_flags_become_overrides() {
    let cli = Cli::parse_from([
      "voltc",
      "generate",
      "--manifest",
      "voltmeter.yml",
      "--makefrag",
      "build/voltmeter.mk",
      "--dialect",
      "voltmeter-legacy",
    ]);
    let Commands::Generate(args) = cli.command else {
      panic!("expected generate");
    };
    let overrides = args.overrides();
    assert_eq!(overrides.manifest, Some(PathBuf::from("voltmeter.yml")));
    assert_eq!(overrides.makefrag, Some(PathBuf::from("build/voltmeter.mk")));
    assert_eq!(overrides.dialect, Some(Dialect::VoltmeterLegacy));
    assert_eq!(overrides.launcher, None);
  }

  #[test]
  fn test_encode_args_accepts_leading_hyphen() {
    let cli = Cli::parse_from(["voltc", "encode-args", "-a 1 -b"]);
    assert!(matches!(cli.command, Commands::EncodeArgs { args } if args == "-a 1 -b"));
  }
}
