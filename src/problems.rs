//! Non-fatal problems found while importing.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProblemKind {
    /// A schema construct that is modeled as `json` instead of structurally.
    UnsupportedShape,
    /// Two schema locations would have received the same type name.
    NameCollision,
    /// A `readOnlyProperties`/`createOnlyProperties`/`primaryIdentifier`
    /// entry that does not lead to a declared property.
    UnresolvedPath,
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProblemKind::UnsupportedShape => "unsupported shape",
            ProblemKind::NameCollision => "name collision",
            ProblemKind::UnresolvedPath => "unresolved path",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    /// Type name of the resource being imported.
    pub resource: String,
    pub kind: ProblemKind,
    /// JSON pointer of the schema node concerned.
    pub path: String,
    pub message: String,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}): {}",
            self.resource, self.path, self.kind, self.message
        )
    }
}

/// Receives problems as imports report them.
pub trait ProblemReport {
    fn report(&mut self, problem: Problem);
}

impl ProblemReport for Vec<Problem> {
    fn report(&mut self, problem: Problem) {
        self.push(problem);
    }
}

/// Collects problems across a batch of imports.
#[derive(Debug, Default, Clone)]
pub struct ProblemLog {
    problems: Vec<Problem>,
}

impl ProblemLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter()
    }

    /// Problems reported for one resource.
    pub fn for_resource<'a>(&'a self, resource: &'a str) -> impl Iterator<Item = &'a Problem> {
        self.problems.iter().filter(move |p| p.resource == resource)
    }

    pub fn into_vec(self) -> Vec<Problem> {
        self.problems
    }
}

impl ProblemReport for ProblemLog {
    fn report(&mut self, problem: Problem) {
        self.problems.push(problem);
    }
}

/// Problems of one import, held until the import finishes.
#[derive(Debug)]
pub(crate) struct ProblemSink {
    resource: String,
    problems: Vec<Problem>,
}

impl ProblemSink {
    pub(crate) fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            problems: Vec::new(),
        }
    }

    pub(crate) fn report(
        &mut self,
        kind: ProblemKind,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        let problem = Problem {
            resource: self.resource.clone(),
            kind,
            path: path.into(),
            message: message.into(),
        };
        tracing::debug!(
            resource = %problem.resource,
            kind = %problem.kind,
            path = %problem.path,
            "{}",
            problem.message
        );
        self.problems.push(problem);
    }

    pub(crate) fn len(&self) -> usize {
        self.problems.len()
    }

    pub(crate) fn flush(self, report: &mut dyn ProblemReport) {
        for problem in self.problems {
            report.report(problem);
        }
    }
}
