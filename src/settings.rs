use crate::error::VoltcError;
use crate::schema::Dialect;
use figment::Figment;
use figment::providers::Env;
use figment::providers::Format;
use figment::providers::Json;
use figment::providers::Serialized;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;

// --- Environment Variables ---
pub const MANIFEST_ENV: &str = "VOLTMETER_YML";
pub const FRAGMENT_ENV: &str = "VOLTMETER_MK";
pub const LAUNCHER_ENV: &str = "BENCHMARKS_SH";
pub const ENV_PREFIX: &str = "VOLTC_";

/// Unresolved settings, merged from (lowest first) a JSON settings file,
/// the environment, and command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub manifest: Option<PathBuf>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub makefrag: Option<PathBuf>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub launcher: Option<PathBuf>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub dialect: Option<Dialect>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub working_dir: Option<PathBuf>,
}

impl Settings {
  /// Layers the settings file, the environment, and `overrides` (command-line flags).
  pub fn load(settings_file: Option<&Path>, overrides: Settings) -> Result<Settings, VoltcError> {
    let mut figment = Figment::new();

    if let Some(file) = settings_file {
      if !file.exists() {
        tracing::warn!(path = %file.display(), "Settings file not found. Ignoring.");
      }
      figment = figment.merge(Json::file(file));
    }

    let settings = figment
      .merge(
        Env::raw()
          .only(&[MANIFEST_ENV, FRAGMENT_ENV, LAUNCHER_ENV])
          .map(|key| {
            let key = key.as_str();
            if key.eq_ignore_ascii_case(MANIFEST_ENV) {
              "manifest".into()
            } else if key.eq_ignore_ascii_case(FRAGMENT_ENV) {
              "makefrag".into()
            } else {
              "launcher".into()
            }
          }),
      )
      .merge(Env::prefixed(ENV_PREFIX).only(&["dialect", "working_dir"]))
      .merge(Serialized::defaults(overrides))
      .extract::<Settings>()?;

    tracing::debug!(?settings, "Resolved settings");
    Ok(settings)
  }

  fn working_dir(&self) -> Result<PathBuf, VoltcError> {
    let cwd = std::env::current_dir().map_err(VoltcError::WorkingDir)?;
    Ok(match &self.working_dir {
      Some(dir) => cwd.join(dir),
      None => cwd,
    })
  }
}

/// Where the manifest comes from and how to read it.
#[derive(Debug, Clone)]
pub struct ManifestSource {
  pub path: PathBuf,
  pub dialect: Dialect,
  /// Absolute directory that relative manifest paths resolve against.
  pub working_dir: PathBuf,
}

impl TryFrom<&Settings> for ManifestSource {
  type Error = VoltcError;

  fn try_from(settings: &Settings) -> Result<Self, Self::Error> {
    let path = settings
      .manifest
      .clone()
      .ok_or(VoltcError::ConfigSourceMissing {
        setting: "manifest",
        env: MANIFEST_ENV,
      })?;

    Ok(ManifestSource {
      path,
      dialect: settings.dialect.unwrap_or_default(),
      working_dir: settings.working_dir()?,
    })
  }
}

/// Fully resolved configuration for a `generate` run.
#[derive(Debug, Clone)]
pub struct CompileConfig {
  pub source: ManifestSource,
  pub makefrag: PathBuf,
  /// Only set for the launcher dialect.
  pub launcher: Option<PathBuf>,
}

impl TryFrom<Settings> for CompileConfig {
  type Error = VoltcError;

  fn try_from(settings: Settings) -> Result<Self, Self::Error> {
    let source = ManifestSource::try_from(&settings)?;

    let makefrag = settings.makefrag.ok_or(VoltcError::ConfigSourceMissing {
      setting: "makefrag",
      env: FRAGMENT_ENV,
    })?;

    let launcher = if source.dialect.is_launcher() {
      Some(settings.launcher.ok_or(VoltcError::ConfigSourceMissing {
        setting: "launcher",
        env: LAUNCHER_ENV,
      })?)
    } else {
      if settings.launcher.is_some() {
        tracing::warn!(dialect = %source.dialect, "Launcher path given but the dialect has no launcher script. Ignoring.");
      }
      None
    };

    Ok(CompileConfig {
      source,
      makefrag,
      launcher,
    })
  }
}
