//! Converting analysis findings into protocol diagnostics.
//!
//! The analyzer reports everything it sees; which findings reach the
//! editor is a settings decision made here, per publish.

#![deny(unsafe_code)]

use hledger_analysis::{AnalysisDiagnostic, DiagnosticCode, DiagnosticSeverity};
use hledger_navigation::span_to_range;
use lsp_types::{Diagnostic, NumberOrString};
use std::path::Path;

/// The diagnostics source name shown by editors.
pub const SOURCE: &str = "hledger-lsp";

/// Which diagnostic families to publish (`diagnostics.*` settings).
#[derive(Debug, Clone)]
pub struct DiagnosticFilter {
    /// Publish `UNDECLARED_ACCOUNT`
    pub undeclared_accounts: bool,
    /// Publish `UNDECLARED_COMMODITY`
    pub undeclared_commodities: bool,
    /// Publish `UNBALANCED` and `MULTIPLE_INFERRED`
    pub unbalanced_transactions: bool,
}

impl Default for DiagnosticFilter {
    fn default() -> Self {
        DiagnosticFilter {
            undeclared_accounts: true,
            undeclared_commodities: true,
            unbalanced_transactions: true,
        }
    }
}

impl DiagnosticFilter {
    fn allows(&self, code: DiagnosticCode) -> bool {
        match code {
            DiagnosticCode::UndeclaredAccount => self.undeclared_accounts,
            DiagnosticCode::UndeclaredCommodity => self.undeclared_commodities,
            DiagnosticCode::Unbalanced | DiagnosticCode::MultipleInferred => {
                self.unbalanced_transactions
            }
            _ => true,
        }
    }
}

/// The diagnostics to publish for one file.
pub fn diagnostics_for_file(
    all: &[AnalysisDiagnostic],
    path: &Path,
    filter: &DiagnosticFilter,
) -> Vec<Diagnostic> {
    all.iter()
        .filter(|d| d.path == path)
        .filter(|d| filter.allows(d.code))
        .map(to_lsp)
        .collect()
}

fn to_lsp(diagnostic: &AnalysisDiagnostic) -> Diagnostic {
    Diagnostic {
        range: span_to_range(diagnostic.span),
        severity: Some(match diagnostic.severity {
            DiagnosticSeverity::Error => lsp_types::DiagnosticSeverity::ERROR,
            DiagnosticSeverity::Warning => lsp_types::DiagnosticSeverity::WARNING,
            DiagnosticSeverity::Hint => lsp_types::DiagnosticSeverity::HINT,
        }),
        code: Some(NumberOrString::String(diagnostic.code.as_str().to_string())),
        source: Some(SOURCE.to_string()),
        message: diagnostic.message.clone(),
        ..Default::default()
    }
}
