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

//! # Voltc
//!
//! `voltc` compiles a Voltmeter benchmark-profiling manifest (YAML) into the
//! files a make-based build consumes: a make fragment with the profiler's
//! build variables and CLI arguments and, for the simple launcher dialect, a
//! `benchmarks.sh` launcher script.
//!
//! This crate contains the main library logic for the `voltc` CLI, but its
//! core modules (`schema`, `validate`, `normalize`, `fragment`) are pure and
//! could be used independently.
//!
//! ## Core Modules
//!
//! * [`schema`]: Declarative schema trees for the `launcher`, `voltmeter` and
//!   `voltmeter-legacy` dialects.
//! * [`validate`]: The recursive validator. Reports every violation with its
//!   field path in one pass.
//! * [`encode`]: The quote-aware re-encoding of benchmark arguments into the
//!   comma-delimited `--benchmark_args` form.
//! * [`normalize`]: Applies defaults, resolves paths, and encodes arguments.
//! * [`fragment`]: Renders the make fragment and launcher script.
//! * [`compiler`]: Reads the manifest, runs the pipeline, and writes the
//!   artifacts only once everything succeeded.
//! * [`settings`]: Resolves manifest and output locations with `figment`.
//! * [`cli`]: Defines the `clap`-based command-line interface.
//! * [`error`]: Defines the custom error types for the library.
//! * [`logging`]: Provides the `setup_tracing` utility.

pub mod cli;
pub mod compiler;
pub mod encode;
pub mod error;
pub mod fragment;
pub mod logging;
pub mod normalize;
pub mod schema;
pub mod settings;
pub mod validate;
