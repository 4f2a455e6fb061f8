//! On-disk JSON shape of a rule set.
//!
//! These structs mirror the document exactly and carry no invariants;
//! `validate` turns them into the typed model.

use serde::{Deserialize, Serialize};

use crate::replace::ReplaceRule;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSetDoc {
    #[serde(rename = "Entities", default)]
    pub entities: Vec<serde_json::Value>,
    #[serde(rename = "GlobalSettings", default)]
    pub global_settings: GlobalSettingsDoc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettingsDoc {
    #[serde(default = "default_skip_sheets")]
    pub default_skip_sheets: Vec<String>,
    #[serde(default)]
    pub default_check_for_strikethrough: bool,
}

impl Default for GlobalSettingsDoc {
    fn default() -> Self {
        Self {
            default_skip_sheets: default_skip_sheets(),
            default_check_for_strikethrough: false,
        }
    }
}

pub fn default_skip_sheets() -> Vec<String> {
    vec!["Metadata".into(), "Instructions".into(), "Summary".into()]
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRuleDoc {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub sheets: Option<Vec<String>>,
    pub identifier: IdentifierDoc,
    #[serde(default)]
    pub primary_field_key: Option<String>,
    #[serde(default)]
    pub replace_rules: Vec<ReplaceRule>,
    #[serde(default)]
    pub fetch_additional_column: Option<AdditionalColumnDoc>,
    #[serde(default)]
    pub extract_sub_entities: Option<SubEntityDoc>,
    #[serde(default)]
    pub construct_fields: Vec<ConstructFieldDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierDoc {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(default)]
    pub check_for_strikethrough: Option<bool>,
    #[serde(default = "default_true")]
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalColumnDoc {
    pub target_key_name: String,
    pub search_header_name: String,
    #[serde(alias = "searchInLocations")]
    pub search_in: Vec<String>,
    #[serde(default)]
    pub replace_rules: Vec<ReplaceRule>,
    #[serde(default)]
    pub value_from_row_offset: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubEntityDoc {
    pub sub_entity_name: String,
    #[serde(default = "default_source", alias = "sourceValue")]
    pub source_value_from: String,
    pub regex: String,
    #[serde(default)]
    pub check_for_strikethrough: bool,
    #[serde(default)]
    pub replace_rules: Vec<ReplaceRule>,
}

fn default_source() -> String {
    "primaryFieldKey".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructFieldDoc {
    pub target_key_name: String,
    pub format_string: String,
    #[serde(default = "default_on_missing")]
    pub on_missing_source: String,
}

fn default_on_missing() -> String {
    "skip_field".into()
}
