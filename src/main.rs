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
use Commands::Check;
use Commands::EncodeArgs;
use Commands::Generate;
use anyhow::Result;
use clap::Parser;
use voltc::cli::Cli;
use voltc::cli::Commands;
use voltc::compiler::check;
use voltc::compiler::compile;
use voltc::encode::encode_args;
use voltc::logging::setup_tracing;
use voltc::settings::CompileConfig;
use voltc::settings::ManifestSource;
use voltc::settings::Settings;

fn main() -> Result<()> {
  let _guard = setup_tracing()?;

  let Cli { command } = Cli::parse();
  let main_span = tracing::info_span!("voltc");
  let _enter = main_span.enter();

  match command {
    Generate(args) => {
      tracing::info!("Starting manifest compilation...");

      let settings = Settings::load(args.source.settings.as_deref(), args.overrides())?;
      let config = CompileConfig::try_from(settings)?;
      compile(&config)?;

      tracing::info!("Compilation complete.");
    }
    Check(args) => {
      let settings = Settings::load(args.source.settings.as_deref(), args.overrides())?;
      let source = ManifestSource::try_from(&settings)?;
      let document = check(&source)?;

      if args.json {
        println!("{}", serde_json::to_string_pretty(&document)?);
      } else {
        println!(
          "{}: valid {} manifest ({} parameters, {} arguments, {} benchmarks)",
          source.path.display(),
          document.dialect,
          document.parameters.len(),
          document.arguments.len(),
          document.benchmarks.as_ref().map_or(0, Vec::len)
        );
      }
    }
    EncodeArgs { args } => {
      println!("{}", encode_args(&args)?);
    }
  }

  Ok(())
}
