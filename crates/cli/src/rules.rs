//! `routerecon rules`: rule set tooling.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use routerecon_engine::RuleDefinitionError;

use crate::compare::load_rules;
use crate::{CliError, Ctx};

#[derive(Subcommand)]
pub(crate) enum RulesCommands {
    /// Check a rule set and list every problem found
    #[command(after_help = "\
Examples:
  routerecon rules validate routing.rules.json
  routerecon rules validate routing.rules.json && routerecon extract routing.xlsx --rules routing.rules.json")]
    Validate {
        /// Rule set JSON (path, or name inside the configured rules directory)
        file: PathBuf,
    },
}

pub(crate) fn cmd_rules(ctx: &Ctx, cmd: RulesCommands) -> Result<(), CliError> {
    match cmd {
        RulesCommands::Validate { file } => cmd_validate(ctx, &file),
    }
}

fn cmd_validate(ctx: &Ctx, file: &Path) -> Result<(), CliError> {
    let rules = load_rules(ctx, file)?;
    let enabled = rules.enabled().count();
    println!("ok: {} rule(s), {} enabled", rules.rules.len(), enabled);
    for rule in &rules.rules {
        if !rule.enabled {
            eprintln!("note: rule '{}' is disabled", rule.name);
        }
    }
    Ok(())
}

/// One line per issue, so a failed validation reads as a checklist.
pub(crate) fn describe(err: &RuleDefinitionError) -> String {
    match err {
        RuleDefinitionError::Json(message) => format!("rule set is not valid JSON: {message}"),
        RuleDefinitionError::Invalid(issues) => {
            let mut out = format!("{} invalid rule(s)", issues.len());
            for issue in issues {
                out.push_str("\n  - ");
                out.push_str(&issue.to_string());
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routerecon_engine::RuleIssue;

    #[test]
    fn describe_lists_each_issue() {
        let err = RuleDefinitionError::Invalid(vec![
            RuleIssue { index: 0, rule: Some("VQ".into()), message: "missing Identifier".into() },
            RuleIssue { index: 2, rule: None, message: "Name must be a string".into() },
        ]);
        let text = describe(&err);
        assert!(text.starts_with("2 invalid rule(s)"));
        assert!(text.contains("\n  - rule #0 'VQ': missing Identifier"));
        assert!(text.contains("\n  - rule #2: Name must be a string"));
    }
}
