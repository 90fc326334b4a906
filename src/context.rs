//! Execution context carried by every channel's context slot.

use serde::{Deserialize, Serialize};

/// Per-evaluation context: the argument vector and whether the filter runs as
/// the top-level module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterContext {
    pub argv: Vec<String>,
    pub is_main: bool,
}

impl FilterContext {
    /// Context for a filter started from the command line.
    pub fn command_line(argv: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            is_main: true,
        }
    }
}

impl Default for FilterContext {
    fn default() -> Self {
        Self {
            argv: Vec::new(),
            is_main: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_context() {
        let ctx = FilterContext::command_line(["a", "b"]);
        assert_eq!(ctx.argv, vec!["a".to_string(), "b".to_string()]);
        assert!(ctx.is_main);
        assert_eq!(ctx, FilterContext { argv: ctx.argv.clone(), ..Default::default() });
    }
}
