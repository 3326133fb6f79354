use crate::{
    config::ConfigError,
    lint::{Diagnostics, SetterDiagnostic},
};
use miette::Report;

pub fn emit_diagnostics(diagnostics: Diagnostics) {
    for diagnostic in diagnostics {
        emit_diagnostic(diagnostic);
    }
}

pub fn emit_diagnostic(diagnostic: SetterDiagnostic) {
    eprintln!("{:?}", Report::new(diagnostic));
}

/// One line per finding, in the plain `path:line - message` form.
pub fn render_plain(diagnostics: &Diagnostics) -> String {
    diagnostics
        .iter()
        .map(|diagnostic| format!("{diagnostic}\n"))
        .collect()
}

pub fn report_config_error(error: &ConfigError) {
    eprintln!("Invalid lint configuration: {}", error);
}
