//! Value-plus-diagnostics results for work that continues past failures

use crate::error::{SourceDiagnostic, SourceErrors};

/// A result that always carries a value, plus the non-fatal failures met producing it
#[derive(Debug)]
pub struct Partial<T> {
    /// Whatever was produced
    pub value: T,
    /// Failures that reduced `value` without stopping the work
    pub diagnostics: Vec<SourceDiagnostic>,
}

impl<T> Partial<T> {
    /// A value with no diagnostics
    pub fn ok(value: T) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
        }
    }

    /// Record a failure
    pub fn push_diagnostic(&mut self, diagnostic: SourceDiagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Pair this value with another, keeping this result's diagnostics first
    pub fn zip<U>(mut self, other: Partial<U>) -> Partial<(T, U)> {
        self.diagnostics.extend(other.diagnostics);
        Partial {
            value: (self.value, other.value),
            diagnostics: self.diagnostics,
        }
    }

    /// Merge another partial result into this one, appending its value and diagnostics
    pub fn absorb<I>(&mut self, other: Partial<I>)
    where
        I: IntoIterator,
        T: Extend<I::Item>,
    {
        self.value.extend(other.value);
        self.diagnostics.extend(other.diagnostics);
    }

    /// Split into the value and the combined diagnostic, if any
    pub fn into_parts(self) -> (T, Option<SourceErrors>) {
        (self.value, SourceErrors::from_diagnostics(self.diagnostics))
    }
}

impl<T: Default> Default for Partial<T> {
    fn default() -> Self {
        Self::ok(T::default())
    }
}
