//! Renderer subprocess management.
//!
//! [`executor`] defines the execution seam, [`subprocess`] the shared
//! spawn, capture and timeout logic, and [`renderer`] the concrete
//! executor that invokes the animation renderer.

pub mod executor;
pub mod renderer;
pub mod subprocess;

/// Shared test helpers for executor tests.
#[cfg(test)]
pub(crate) mod test_helpers {
    use std::time::Duration;

    use super::executor::ScriptInput;

    /// Build a default [`ScriptInput`] for tests: no arguments, no env vars,
    /// no working directory, and a 5-second timeout.
    pub fn default_input() -> ScriptInput {
        ScriptInput {
            args: vec![],
            env_vars: vec![],
            working_directory: None,
            timeout: Duration::from_secs(5),
        }
    }
}
