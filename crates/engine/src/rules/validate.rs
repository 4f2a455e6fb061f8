use std::collections::HashSet;

use regex::Regex;

use super::wire::{
    AdditionalColumnDoc, ConstructFieldDoc, EntityRuleDoc, IdentifierDoc, RuleSetDoc, SubEntityDoc,
};
use super::{
    AdditionalColumn, ConstructField, EntityRule, GlobalSettings, Identifier, IdentifierPattern,
    Literal, OnMissingSource, RuleSet, SearchLocation, SubEntityRule, SubEntitySource,
};
use crate::cell_id::{letters_to_col, CellRef};
use crate::construct::parse_format;
use crate::error::{RuleDefinitionError, RuleIssue};
use crate::replace::{ReplaceRule, ReplaceRules};

/// Validate a parsed document, collecting every issue across every rule.
pub fn validate_doc(doc: &RuleSetDoc) -> Result<RuleSet, RuleDefinitionError> {
    let settings = GlobalSettings {
        default_skip_sheets: doc.global_settings.default_skip_sheets.clone(),
        default_check_for_strikethrough: doc.global_settings.default_check_for_strikethrough,
    };

    let mut issues: Vec<RuleIssue> = Vec::new();
    let mut rules = Vec::with_capacity(doc.entities.len());
    let mut seen_names: HashSet<String> = HashSet::new();

    for (index, raw) in doc.entities.iter().enumerate() {
        let raw_name = raw.get("name").and_then(|v| v.as_str()).map(str::to_string);

        let rule_doc: EntityRuleDoc = match serde_json::from_value(raw.clone()) {
            Ok(r) => r,
            Err(e) => {
                issues.push(RuleIssue { index, rule: raw_name, message: e.to_string() });
                continue;
            }
        };

        let mut ctx = RuleCtx { index, name: rule_doc.name.clone(), issues: Vec::new() };

        if rule_doc.name.trim().is_empty() {
            ctx.issue("name must not be empty");
        } else if !seen_names.insert(rule_doc.name.clone()) {
            ctx.issue(format!("duplicate rule name '{}'", rule_doc.name));
        }

        if let Some(rule) = build_rule(&rule_doc, &settings, &mut ctx) {
            if ctx.issues.is_empty() {
                rules.push(rule);
            }
        }
        issues.append(&mut ctx.issues);
    }

    if !issues.is_empty() {
        log::warn!("rule set rejected: {} issue(s)", issues.len());
        return Err(RuleDefinitionError::Invalid(issues));
    }

    log::debug!("loaded {} rule(s)", rules.len());
    Ok(RuleSet { rules, settings })
}

struct RuleCtx {
    index: usize,
    name: String,
    issues: Vec<RuleIssue>,
}

impl RuleCtx {
    fn issue(&mut self, message: impl Into<String>) {
        let rule = if self.name.is_empty() { None } else { Some(self.name.clone()) };
        self.issues.push(RuleIssue { index: self.index, rule, message: message.into() });
    }
}

fn build_rule(doc: &EntityRuleDoc, settings: &GlobalSettings, ctx: &mut RuleCtx) -> Option<EntityRule> {
    let primary_field_key = match &doc.primary_field_key {
        Some(key) if key.trim().is_empty() => {
            ctx.issue("primaryFieldKey must not be empty");
            None
        }
        Some(key) => Some(key.clone()),
        None => Some(doc.name.clone()),
    };

    let identifier = build_identifier(&doc.identifier, settings, ctx);
    let replace_rules = build_replace_rules(&doc.replace_rules, "replaceRules", ctx);

    let additional_column = doc
        .fetch_additional_column
        .as_ref()
        .map(|block| build_additional(block, ctx));
    let sub_entities = doc
        .extract_sub_entities
        .as_ref()
        .map(|block| build_sub_entities(block, doc.fetch_additional_column.as_ref(), ctx));

    let construct_fields = doc
        .construct_fields
        .iter()
        .map(|f| build_construct_field(f, ctx))
        .collect::<Vec<_>>();

    Some(EntityRule {
        name: doc.name.clone(),
        enabled: doc.enabled,
        sheets: doc.sheets.clone(),
        identifier: identifier?,
        primary_field_key: primary_field_key?,
        replace_rules,
        additional_column: settle(additional_column)?,
        sub_entities: settle(sub_entities)?,
        construct_fields: construct_fields.into_iter().collect::<Option<Vec<_>>>()?,
    })
}

/// An absent block is fine; a present block that failed to build is not.
fn settle<T>(block: Option<Option<T>>) -> Option<Option<T>> {
    match block {
        None => Some(None),
        Some(built) => built.map(Some),
    }
}

fn build_identifier(doc: &IdentifierDoc, settings: &GlobalSettings, ctx: &mut RuleCtx) -> Option<Identifier> {
    if doc.value.is_empty() {
        ctx.issue("identifier.value must not be empty");
        return None;
    }

    let pattern = match doc.kind.to_ascii_lowercase().as_str() {
        "startswith" => IdentifierPattern::StartsWith(Literal::new(&doc.value, doc.case_sensitive)),
        "contains" => IdentifierPattern::Contains(Literal::new(&doc.value, doc.case_sensitive)),
        "exactmatch" => IdentifierPattern::ExactMatch(Literal::new(&doc.value, doc.case_sensitive)),
        "regex" => match Regex::new(&doc.value) {
            Ok(re) => IdentifierPattern::Regex(re),
            Err(e) => {
                ctx.issue(format!("identifier regex does not compile: {e}"));
                return None;
            }
        },
        other => {
            ctx.issue(format!(
                "unknown identifier type '{other}' (expected startsWith, contains, exactMatch or regex)"
            ));
            return None;
        }
    };

    Some(Identifier {
        pattern,
        check_for_strikethrough: doc
            .check_for_strikethrough
            .unwrap_or(settings.default_check_for_strikethrough),
    })
}

fn build_replace_rules(rules: &[ReplaceRule], field: &str, ctx: &mut RuleCtx) -> ReplaceRules {
    for (i, rule) in rules.iter().enumerate() {
        if rule.find.is_empty() {
            ctx.issue(format!("{field}[{i}].find must not be empty"));
        }
    }
    ReplaceRules::new(rules.to_vec())
}

fn parse_location(loc: &str) -> Option<SearchLocation> {
    let loc = loc.trim();
    if let Some(col) = letters_to_col(loc) {
        return Some(SearchLocation::Column(col));
    }
    loc.parse::<CellRef>().ok().map(SearchLocation::HeaderCell)
}

fn build_additional(doc: &AdditionalColumnDoc, ctx: &mut RuleCtx) -> Option<AdditionalColumn> {
    let mut ok = true;
    if doc.target_key_name.trim().is_empty() {
        ctx.issue("fetchAdditionalColumn.targetKeyName must not be empty");
        ok = false;
    }
    if doc.search_header_name.trim().is_empty() {
        ctx.issue("fetchAdditionalColumn.searchHeaderName must not be empty");
        ok = false;
    }
    if doc.search_in.is_empty() {
        ctx.issue("fetchAdditionalColumn.searchIn must list at least one location");
        ok = false;
    }

    let mut search_in = Vec::with_capacity(doc.search_in.len());
    for loc in &doc.search_in {
        match parse_location(loc) {
            Some(parsed) => search_in.push(parsed),
            None => {
                ctx.issue(format!(
                    "fetchAdditionalColumn.searchIn: '{loc}' is neither a column letter nor a cell address"
                ));
                ok = false;
            }
        }
    }

    let replace_rules = build_replace_rules(&doc.replace_rules, "fetchAdditionalColumn.replaceRules", ctx);

    ok.then(|| AdditionalColumn {
        target_key: doc.target_key_name.clone(),
        search_header: doc.search_header_name.trim().to_string(),
        search_in,
        replace_rules,
        row_offset: doc.value_from_row_offset,
    })
}

fn build_sub_entities(
    doc: &SubEntityDoc,
    additional: Option<&AdditionalColumnDoc>,
    ctx: &mut RuleCtx,
) -> Option<SubEntityRule> {
    let mut ok = true;
    if doc.sub_entity_name.trim().is_empty() {
        ctx.issue("extractSubEntities.subEntityName must not be empty");
        ok = false;
    }

    let source = match doc.source_value_from.as_str() {
        "primaryFieldKey" | "primary" => Some(SubEntitySource::Primary),
        other => {
            let key = other.strip_prefix("additional").and_then(|rest| {
                if rest.is_empty() {
                    Some(None)
                } else {
                    rest.strip_prefix('.').map(Some)
                }
            });
            match (key, additional) {
                (None, _) => {
                    ctx.issue(format!(
                        "extractSubEntities.sourceValueFrom '{other}' must be 'primaryFieldKey' or 'additional.<key>'"
                    ));
                    None
                }
                (Some(_), None) => {
                    ctx.issue("extractSubEntities reads the additional value but the rule has no fetchAdditionalColumn");
                    None
                }
                (Some(Some(k)), Some(add)) if k != add.target_key_name => {
                    ctx.issue(format!(
                        "extractSubEntities.sourceValueFrom names '{k}' but the additional column is '{}'",
                        add.target_key_name
                    ));
                    None
                }
                (Some(_), Some(_)) => Some(SubEntitySource::Additional),
            }
        }
    };

    let regex = match Regex::new(&doc.regex) {
        Ok(re) if re.captures_len() == 2 => Some(re),
        Ok(re) => {
            ctx.issue(format!(
                "extractSubEntities.regex must have exactly one capture group, found {}",
                re.captures_len() - 1
            ));
            None
        }
        Err(e) => {
            ctx.issue(format!("extractSubEntities.regex does not compile: {e}"));
            None
        }
    };

    let replace_rules = build_replace_rules(&doc.replace_rules, "extractSubEntities.replaceRules", ctx);

    if !ok {
        return None;
    }
    Some(SubEntityRule {
        name: doc.sub_entity_name.clone(),
        source: source?,
        regex: regex?,
        check_for_strikethrough: doc.check_for_strikethrough,
        replace_rules,
    })
}

fn build_construct_field(doc: &ConstructFieldDoc, ctx: &mut RuleCtx) -> Option<ConstructField> {
    let on_missing = match doc.on_missing_source.as_str() {
        "skip_field" => Some(OnMissingSource::SkipField),
        "empty_string" => Some(OnMissingSource::EmptyString),
        "error" => Some(OnMissingSource::Error),
        other => {
            ctx.issue(format!(
                "constructFields '{}': onMissingSource '{other}' must be skip_field, empty_string or error",
                doc.target_key_name
            ));
            None
        }
    };

    if doc.target_key_name.trim().is_empty() {
        ctx.issue("constructFields.targetKeyName must not be empty");
        return None;
    }

    let segments = match parse_format(&doc.format_string) {
        Ok(segments) => Some(segments),
        Err(e) => {
            ctx.issue(format!("constructFields '{}': {e}", doc.target_key_name));
            None
        }
    };

    Some(ConstructField {
        target_key: doc.target_key_name.clone(),
        segments: segments?,
        on_missing: on_missing?,
    })
}
