use crate::error::VoltcError;
use crate::fragment::Artifacts;
use crate::fragment::generate;
use crate::normalize::NormalizedDocument;
use crate::normalize::Normalizer;
use crate::settings::CompileConfig;
use crate::settings::ManifestSource;
use crate::validate::validate;
use serde_yaml::Value;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Reads and parses the manifest YAML.
pub fn load_manifest(path: &Path) -> Result<Value, VoltcError> {
  let content = fs::read_to_string(path).map_err(|source| VoltcError::ReadManifest {
    path: path.to_path_buf(),
    source,
  })?;

  serde_yaml::from_str(&content).map_err(|source| VoltcError::ParseManifest {
    path: path.to_path_buf(),
    source,
  })
}

/// Validates and normalizes the manifest. Writes nothing.
pub fn check(source: &ManifestSource) -> Result<NormalizedDocument, VoltcError> {
  tracing::info!(
    "Validating {} as a {} manifest",
    source.path.display(),
    source.dialect
  );

  let document = load_manifest(&source.path)?;
  let valid = validate(&document, &source.dialect.schema()).map_err(|violations| {
    tracing::error!(count = violations.len(), "Manifest failed validation");
    VoltcError::InvalidManifest {
      path: source.path.clone(),
      violations,
    }
  })?;

  Normalizer::new(&source.working_dir)
    .normalize(&valid)
    .map_err(|err| VoltcError::Encoding {
      path: source.path.clone(),
      field: err.field,
      source: err.source,
    })
}

/// Runs the whole pipeline and writes the artifacts.
///
/// Every artifact is staged in a temporary file before the first one is
/// renamed into place, so a failure leaves no fragment without its launcher.
pub fn compile(config: &CompileConfig) -> Result<Artifacts, VoltcError> {
  let document = check(&config.source)?;
  let artifacts = generate(&document);

  let mut staged = vec![stage_artifact(&config.makefrag, &artifacts.fragment, false)?];
  if let (Some(path), Some(script)) = (&config.launcher, &artifacts.launcher) {
    staged.push(stage_artifact(path, script, true)?);
  }

  for (path, file) in staged {
    file.persist(path).map_err(|err| VoltcError::WriteArtifact {
      path: path.to_path_buf(),
      source: err.error,
    })?;
    tracing::info!("Wrote {}", path.display());
  }

  Ok(artifacts)
}

/// Writes `contents` to a temporary file in the destination directory, ready
/// to be persisted over `path`.
fn stage_artifact<'a>(
  path: &'a Path,
  contents: &str,
  executable: bool,
) -> Result<(&'a Path, NamedTempFile), VoltcError> {
  let write_error = |source| VoltcError::WriteArtifact {
    path: path.to_path_buf(),
    source,
  };

  let dir = path
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .unwrap_or(Path::new("."));

  let mut file = NamedTempFile::new_in(dir).map_err(write_error)?;
  file.write_all(contents.as_bytes()).map_err(write_error)?;

  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    let mode = if executable { 0o755 } else { 0o644 };
    file
      .as_file()
      .set_permissions(fs::Permissions::from_mode(mode))
      .map_err(write_error)?;
  }
  #[cfg(not(unix))]
  let _ = executable;

  Ok((path, file))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ViolationKind;
  use crate::schema::Dialect;
  use std::path::PathBuf;
  use tempfile::tempdir;

  const LAUNCHER: &str = r#"
parameters:
  PLATFORM: jetson_agx_xavier
  PROFILE_CPU: true
benchmarks:
  - name: first
    path: bin/first
    libs: libA libB
    args: -n 4
"#;

  fn config(dir: &Path, manifest: &str, dialect: Dialect) -> CompileConfig {
    let path = dir.join("voltmeter.yml");
    fs::write(&path, manifest).unwrap();
    CompileConfig {
      source: ManifestSource {
        path,
        dialect,
        working_dir: dir.to_path_buf(),
      },
      makefrag: dir.join("out").join("voltmeter.mk"),
      launcher: Some(dir.join("out").join("benchmarks.sh")),
    }
  }

  #[test]
  fn test_compile_writes_both_artifacts() {
    let temp = tempdir().unwrap();
    fs::create_dir(temp.path().join("out")).unwrap();
    let config = config(temp.path(), LAUNCHER, Dialect::Launcher);

    let artifacts = compile(&config).unwrap();

    let fragment = fs::read_to_string(&config.makefrag).unwrap();
    assert_eq!(fragment, artifacts.fragment);
    assert!(fragment.contains("PLATFORM := jetson_agx_xavier\n"));
    assert!(fragment.contains("PROFILE_CPU := 1\n"));

    let launcher_path = config.launcher.as_ref().unwrap();
    let script = fs::read_to_string(launcher_path).unwrap();
    let expected = format!("#!/bin/bash\n{} -n 4\n", temp.path().join("bin/first").display());
    assert_eq!(script, expected);

    #[cfg(unix)]
    {
      use std::os::unix::fs::PermissionsExt;
      let mode = fs::metadata(launcher_path).unwrap().permissions().mode();
      assert_eq!(mode & 0o777, 0o755);
    }
  }

  #[test]
  fn test_invalid_manifest_writes_nothing() {
    let temp = tempdir().unwrap();
    fs::create_dir(temp.path().join("out")).unwrap();
    let config = config(temp.path(), "parameters: {}\n", Dialect::Launcher);

    let err = compile(&config).unwrap_err();
    match &err {
      VoltcError::InvalidManifest { violations, .. } => {
        assert_eq!(
          violations.find("benchmarks").map(|v| v.kind),
          Some(ViolationKind::MissingRequiredKey)
        );
      }
      other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("benchmarks: missing required key"));
    assert!(!config.makefrag.exists());
    assert!(!config.launcher.unwrap().exists());
  }

  #[test]
  fn test_encoding_error_writes_nothing() {
    let temp = tempdir().unwrap();
    fs::create_dir(temp.path().join("out")).unwrap();
    let manifest = r#"
param-platform: {platform: jetson_agx_xavier}
param-profiler: {}
arguments:
  events: all_events
  mode: profile
  trace_dir: traces
  benchmarks:
    - path: bin/a
      args: foo,bar
"#;
    let config = config(temp.path(), manifest, Dialect::Voltmeter);

    let err = compile(&config).unwrap_err();
    assert!(matches!(&err, VoltcError::Encoding { field, .. } if field == "arguments.benchmarks[0].args"));
    assert!(!config.makefrag.exists());
  }

  #[test]
  fn test_unwritable_launcher_leaves_no_fragment() {
    let temp = tempdir().unwrap();
    fs::create_dir(temp.path().join("out")).unwrap();
    let mut config = config(temp.path(), LAUNCHER, Dialect::Launcher);
    config.launcher = Some(temp.path().join("missing-dir").join("benchmarks.sh"));

    let err = compile(&config).unwrap_err();
    assert!(matches!(&err, VoltcError::WriteArtifact { path, .. } if path.ends_with("missing-dir/benchmarks.sh")));
    assert!(!config.makefrag.exists());
    assert_eq!(fs::read_dir(temp.path().join("out")).unwrap().count(), 0);
  }

  #[test]
  fn test_existing_fragment_is_overwritten() {
    let temp = tempdir().unwrap();
    fs::create_dir(temp.path().join("out")).unwrap();
    let config = config(temp.path(), LAUNCHER, Dialect::Launcher);
    fs::write(&config.makefrag, "stale").unwrap();

    compile(&config).unwrap();
    let fragment = fs::read_to_string(&config.makefrag).unwrap();
    assert!(!fragment.contains("stale"));
  }

  #[test]
  fn test_unreadable_and_malformed_manifests() {
    let missing = load_manifest(&PathBuf::from("/nonexistent/voltmeter.yml")).unwrap_err();
    assert!(matches!(missing, VoltcError::ReadManifest { .. }));

    let temp = tempdir().unwrap();
    let path = temp.path().join("broken.yml");
    fs::write(&path, "arguments: [unterminated\n").unwrap();
    assert!(matches!(
      load_manifest(&path).unwrap_err(),
      VoltcError::ParseManifest { .. }
    ));
  }
}
