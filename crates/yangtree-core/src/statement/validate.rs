//! Argument validation of freshly built statements

use super::builder::BuildContext;
use super::kind::{ArgumentRule, CoreKind};
use super::node::{NodeId, Status};
use crate::diagnostics::FindingKind;
use crate::registry::if_feature;
use crate::result::Result;
use regex::Regex;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").unwrap());

static IDENTIFIER_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_.\-]*:)?[A-Za-z_][A-Za-z0-9_.\-]*$").unwrap()
});

static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])$").unwrap());

/// Whether `value` is a YANG identifier
pub fn is_identifier(value: &str) -> bool {
    IDENTIFIER.is_match(value)
}

/// Whether `value` is an identifier with an optional `prefix:`
pub fn is_identifier_ref(value: &str) -> bool {
    IDENTIFIER_REF.is_match(value)
}

impl BuildContext<'_> {
    /// Report a missing or blank argument; returns whether one is present
    pub fn check_argument_not_empty(&mut self, node: NodeId) -> Result<bool> {
        let statement = self.arena().node(node)?;
        if !statement.trimmed_argument().is_empty() {
            return Ok(true);
        }
        let message = format!("statement '{}' requires an argument.", statement.statement_name());
        self.report_on(node, FindingKind::InvalidSyntax, message)?;
        Ok(false)
    }

    /// Report an argument that is not a YANG identifier
    pub fn check_identifier(&mut self, node: NodeId) -> Result<bool> {
        let argument = self.arena().node(node)?.trimmed_argument().to_string();
        if is_identifier(&argument) {
            return Ok(true);
        }
        self.report_on(
            node,
            FindingKind::InvalidIdentifier,
            format!("'{argument}' is not a valid YANG identifier."),
        )?;
        Ok(false)
    }

    pub(crate) fn validate_core(&mut self, node: NodeId, kind: CoreKind) -> Result<()> {
        let statement = self.arena().node(node)?;
        let name = statement.statement_name().to_string();
        let raw = statement.argument().map(str::to_string);
        let argument = statement.trimmed_argument().to_string();

        match kind.argument_rule() {
            ArgumentRule::Required => {
                self.check_argument_not_empty(node)?;
            }
            ArgumentRule::Present => {
                if raw.is_none() {
                    self.report_on(
                        node,
                        FindingKind::InvalidSyntax,
                        format!("statement '{name}' requires an argument."),
                    )?;
                }
            }
            ArgumentRule::None => {
                if raw.is_some() {
                    self.report_on(
                        node,
                        FindingKind::InvalidSyntax,
                        format!("statement '{name}' does not take an argument."),
                    )?;
                }
            }
            ArgumentRule::Boolean => {
                if self.check_argument_not_empty(node)? && argument != "true" && argument != "false" {
                    self.report_on(
                        node,
                        FindingKind::InvalidValue,
                        format!("statement '{name}' requires 'true' or 'false' as argument."),
                    )?;
                }
            }
            ArgumentRule::Identifier => {
                if self.check_argument_not_empty(node)? {
                    self.check_identifier(node)?;
                }
            }
            ArgumentRule::IdentifierRef => {
                if self.check_argument_not_empty(node)? && !is_identifier_ref(&argument) {
                    self.report_on(
                        node,
                        FindingKind::InvalidIdentifier,
                        format!("'{argument}' is not a valid YANG identifier."),
                    )?;
                }
            }
            ArgumentRule::Keyword(allowed) => {
                if self.check_argument_not_empty(node)? && !allowed.contains(&argument.as_str()) {
                    self.report_on(
                        node,
                        FindingKind::InvalidValue,
                        format!(
                            "'{}' is not a valid argument for '{}'; expected one of: {}.",
                            argument,
                            name,
                            allowed.join(", ")
                        ),
                    )?;
                }
            }
            ArgumentRule::Status => {
                if self.check_argument_not_empty(node)? && Status::from_keyword(&argument).is_none() {
                    self.report_on(
                        node,
                        FindingKind::InvalidStatus,
                        format!(
                            "'{argument}' is not a valid status; expected one of: current, deprecated, obsolete."
                        ),
                    )?;
                }
            }
            ArgumentRule::Date => {
                if self.check_argument_not_empty(node)? && !DATE.is_match(&argument) {
                    self.report_on(
                        node,
                        FindingKind::InvalidValue,
                        format!("'{argument}' is not a valid date (expected YYYY-MM-DD)."),
                    )?;
                }
            }
            ArgumentRule::Integer { min, max } => {
                if self.check_argument_not_empty(node)?
                    && !argument.parse::<i64>().is_ok_and(|v| (min..=max).contains(&v))
                {
                    self.report_on(
                        node,
                        FindingKind::InvalidValue,
                        format!("'{argument}' is not a valid value for '{name}' (allowed: {min}..{max})."),
                    )?;
                }
            }
            ArgumentRule::MaxElements => {
                if self.check_argument_not_empty(node)?
                    && argument != "unbounded"
                    && !argument.parse::<u64>().is_ok_and(|v| v >= 1)
                {
                    self.report_on(
                        node,
                        FindingKind::InvalidValue,
                        format!("'{argument}' is not a valid value for '{name}' (positive integer or 'unbounded')."),
                    )?;
                }
            }
            ArgumentRule::Documentation => match raw {
                None => {
                    self.report_on(
                        node,
                        FindingKind::InvalidSyntax,
                        format!("statement '{name}' requires an argument."),
                    )?;
                }
                Some(_) if argument.is_empty() => {
                    self.report_on(
                        node,
                        FindingKind::EmptyDocumentation,
                        format!("statement '{name}' has empty text."),
                    )?;
                }
                Some(_) => {}
            },
            ArgumentRule::IfFeature => {
                if self.check_argument_not_empty(node)?
                    && let Err(problem) = if_feature::check_syntax(&argument)
                {
                    self.report_on(
                        node,
                        FindingKind::IllegalIfFeatureSyntax,
                        format!("Invalid if-feature expression '{argument}': {problem}"),
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Checks that need the fully built subtree of a statement
    pub(crate) fn post_process_core(&mut self, node: NodeId, kind: CoreKind) -> Result<()> {
        match kind {
            CoreKind::Deviate => self.post_process_deviate(node),
            CoreKind::Enum => {
                self.require_child(node, CoreKind::Value, FindingKind::EnumWithoutValue, "value")
            }
            CoreKind::Bit => self.require_child(
                node,
                CoreKind::Position,
                FindingKind::BitWithoutPosition,
                "position",
            ),
            _ => Ok(()),
        }
    }

    fn require_child(
        &mut self,
        node: NodeId,
        child: CoreKind,
        kind: FindingKind,
        what: &str,
    ) -> Result<()> {
        if self.arena().first_child_of_kind(node, child)?.is_some() {
            return Ok(());
        }
        let statement = self.arena().node(node)?;
        let message = format!(
            "{} '{}' does not have a {} (bad practice).",
            statement.statement_name(),
            statement.trimmed_argument(),
            what
        );
        self.report_on(node, kind, message)
    }

    fn post_process_deviate(&mut self, node: NodeId) -> Result<()> {
        let operation = self.arena().node(node)?.trimmed_argument().to_string();
        let children = self.arena().children_of(node)?.to_vec();

        match operation.as_str() {
            "not-supported" => {
                for child in children {
                    let statement = self.arena().node(child)?;
                    if statement.is_extension() {
                        continue;
                    }
                    let message = format!(
                        "Statement '{}' cannot occur under 'deviate not-supported'.",
                        statement.statement_name()
                    );
                    self.report_on(child, FindingKind::IllegalChildStatement, message)?;
                }
            }
            "add" | "replace" | "delete" if children.is_empty() => {
                self.report_on(
                    node,
                    FindingKind::MissingRequiredChild,
                    format!("Statements are required under 'deviate {operation}'."),
                )?;
            }
            "add" | "delete" => {
                for child in children {
                    let always_present = self.arena().node(child)?.core_kind().is_some_and(|k| {
                        matches!(
                            k,
                            CoreKind::Config
                                | CoreKind::Mandatory
                                | CoreKind::Type
                                | CoreKind::MinElements
                                | CoreKind::MaxElements
                        )
                    });
                    if always_present {
                        self.report_on(
                            child,
                            FindingKind::InvalidDeviateProperty,
                            "This statement cannot be used under 'deviate add/delete' as it \
                             refers to a property that always exists. Use a 'deviate replace' \
                             instead.",
                        )?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("leaf-1"));
        assert!(is_identifier("_x.y"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("a b"));
        assert!(!is_identifier(""));
        assert!(is_identifier_ref("ietf:interface-type"));
        assert!(!is_identifier_ref("a:b:c"));
    }

    #[test]
    fn test_dates() {
        assert!(DATE.is_match("2024-02-29"));
        assert!(!DATE.is_match("2024-13-01"));
        assert!(!DATE.is_match("24-01-01"));
    }
}
