// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Dependency-name introspection for module declarations.
//!
//! The source ecosystem derived dependency names from an init routine's
//! formal parameter names, with a reserved trailing name marking the async
//! completion signal. Rust has no parameter-name reflection, so modules
//! declare their dependency list explicitly and the protocol is chosen by
//! the `InitRoutine` variant. These helpers preserve the original contract
//! over such declared lists: a trailing completion name is tolerated and
//! stripped (so declarations ported verbatim keep working), while the
//! reserved name anywhere else is rejected because it can never resolve to
//! a module.

use crate::errors::DeclarationError;

/// Reserved name of the async completion-signal parameter. Never a valid
/// dependency id.
pub const COMPLETION_PARAM: &str = "callback";

/// True iff the last declared parameter is the reserved completion-signal
/// name.
pub fn has_completion_parameter(params: &[String]) -> bool {
    params.last().map(String::as_str) == Some(COMPLETION_PARAM)
}

/// The declared dependency ids: the parameter list with a trailing
/// completion-signal entry removed.
///
/// # Errors
///
/// [`DeclarationError::ReservedDependencyName`] if the reserved name
/// appears anywhere but the trailing position.
pub fn declared_dependencies(params: &[String]) -> Result<Vec<String>, DeclarationError> {
    let mut names = params.to_vec();
    if has_completion_parameter(&names) {
        names.pop();
    }

    if names.iter().any(|name| name == COMPLETION_PARAM) {
        return Err(DeclarationError::ReservedDependencyName {
            name: COMPLETION_PARAM.to_string(),
        });
    }

    Ok(names)
}
