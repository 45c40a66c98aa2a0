//! Schema linting - per-file import reports.
//!
//! Each file is imported into its own fresh store and reported on:
//! - E001 unreadable file or invalid JSON
//! - E002 document does not match the registry shape
//! - E003 `$ref` that does not resolve
//! - E004 other fatal import errors
//! - W001/W002/W003 unsupported shapes, name collisions, unresolved paths

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::db::MemoryDatabase;
use crate::error::{ImportError, LoadError};
use crate::import::import_resource;
use crate::loader::{collect_schema_files, load_schema};
use crate::problems::{ProblemKind, ProblemLog};
use crate::types::ImportOptions;
use crate::validator::validate_document;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON path to the issue (e.g., "#/properties/Config")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .json files.
/// With `options.strict`, files with warnings count as failed.
pub fn lint(path: &Path, options: &ImportOptions) -> LintResult {
    let files = collect_schema_files(path);
    let results: Vec<FileResult> = files
        .iter()
        .map(|file| lint_file(file, path, options))
        .collect();

    let count = |severity: Severity| {
        results
            .iter()
            .flat_map(|r| &r.diagnostics)
            .filter(|d| d.severity == severity)
            .count()
    };
    let errors = count(Severity::Error);
    let warnings = count(Severity::Warning);

    let failed = results
        .iter()
        .filter(|r| {
            if options.strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors,
        warnings,
        results,
    }
}

/// Lint a single schema file.
pub fn lint_file(file: &Path, base_path: &Path, options: &ImportOptions) -> FileResult {
    let mut diagnostics = Vec::new();
    let error = |code: &str, path: &str, message: String| Diagnostic {
        severity: Severity::Error,
        code: code.to_string(),
        file: file.to_path_buf(),
        path: path.to_string(),
        message,
    };

    match load_schema(file) {
        Err(e) => diagnostics.push(error("E001", "/", format!("cannot load: {}", e))),
        Ok(document) => {
            let valid = match options.validate.then(|| validate_document(&document)) {
                Some(Err(LoadError::MetaSchema { errors })) => {
                    for e in errors {
                        diagnostics.push(error("E002", &e.path, e.message));
                    }
                    false
                }
                Some(Err(e)) => {
                    diagnostics.push(error("E002", "/", e.to_string()));
                    false
                }
                _ => true,
            };

            if valid {
                let mut db = MemoryDatabase::new();
                let mut problems = ProblemLog::new();
                if let Err(e) = import_resource(&mut db, &document, options, &mut problems) {
                    let code = match e {
                        ImportError::RefNotFound { .. } => "E003",
                        _ => "E004",
                    };
                    diagnostics.push(error(code, "/", e.to_string()));
                }
                for problem in problems.into_vec() {
                    let code = match problem.kind {
                        ProblemKind::UnsupportedShape => "W001",
                        ProblemKind::NameCollision => "W002",
                        ProblemKind::UnresolvedPath => "W003",
                    };
                    diagnostics.push(Diagnostic {
                        severity: Severity::Warning,
                        code: code.to_string(),
                        file: file.to_path_buf(),
                        path: problem.path,
                        message: problem.message,
                    });
                }
            }
        }
    }

    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    let has_warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);

    let status = if has_errors {
        FileStatus::Error
    } else if has_warnings {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    };

    FileResult {
        file: file.strip_prefix(base_path).unwrap_or(file).to_path_buf(),
        status,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn codes(result: &FileResult) -> Vec<&str> {
        result.diagnostics.iter().map(|d| d.code.as_str()).collect()
    }

    #[test]
    fn clean_file_passes() {
        let dir = TempDir::new().unwrap();
        let file = write(
            &dir,
            "ok.json",
            r#"{"typeName":"A::B::C","properties":{"Name":{"type":"string"}}}"#,
        );
        let result = lint_file(&file, dir.path(), &ImportOptions::new());
        assert_eq!(result.status, FileStatus::Ok);
        assert_eq!(result.file, PathBuf::from("ok.json"));
    }

    #[test]
    fn syntax_error() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "bad.json", "{ nope");
        let result = lint_file(&file, dir.path(), &ImportOptions::new());
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(codes(&result), vec!["E001"]);
    }

    #[test]
    fn shape_error_skips_import() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "shape.json", r#"{"typeName":"nope","properties":{}}"#);
        let result = lint_file(&file, dir.path(), &ImportOptions::new());
        assert_eq!(codes(&result), vec!["E002"]);
    }

    #[test]
    fn broken_ref_and_warnings() {
        let dir = TempDir::new().unwrap();
        let broken = write(
            &dir,
            "broken.json",
            r##"{"typeName":"A::B::C","properties":{"X":{"$ref":"#/definitions/Nope"}}}"##,
        );
        let warned = write(
            &dir,
            "warned.json",
            r#"{"typeName":"A::B::D","properties":{"X":{"type":["string","number"]}},
                "readOnlyProperties":["/properties/Gone"]}"#,
        );
        let options = ImportOptions::new();

        let result = lint_file(&broken, dir.path(), &options);
        assert_eq!(codes(&result), vec!["E003"]);

        let result = lint_file(&warned, dir.path(), &options);
        assert_eq!(result.status, FileStatus::Warning);
        assert_eq!(codes(&result), vec!["W001", "W003"]);
    }

    #[test]
    fn strict_counts_warnings_as_failures() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "warned.json",
            r#"{"typeName":"A::B::D","properties":{"X":{"type":["string","number"]}}}"#,
        );

        let relaxed = lint(dir.path(), &ImportOptions::new());
        assert!(relaxed.is_ok());
        assert_eq!(relaxed.failed, 0);
        assert_eq!(relaxed.warnings, 1);

        let strict = lint(dir.path(), &ImportOptions::new().strict(true));
        assert_eq!(strict.failed, 1);
    }
}
