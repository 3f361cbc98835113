// SPDX-License-Identifier: PMPL-1.0-or-later
//! Lookup tables: fields, operators by semantic type, static value sets,
//! functions and the set of API-backed fields.
//!
//! A [`Catalog`] is immutable once built and is shared as `Arc<Catalog>`
//! between the resolver and the session. [`Catalog::default`] is the
//! built-in JQL schema; alternative grammars load from JSON.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AssistError;
use crate::{Candidate, SemanticType};

/// A queryable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: String,
    pub display_name: String,
    pub semantic_type: SemanticType,
    /// Whether the field has a finite set of values worth suggesting.
    pub has_enumerable_values: bool,
}

impl FieldDescriptor {
    pub fn new(id: &str, display_name: &str, semantic_type: SemanticType, enumerable: bool) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            semantic_type,
            has_enumerable_values: enumerable,
        }
    }

    /// The identifier is what gets spliced; the display name describes it.
    pub fn to_candidate(&self) -> Candidate {
        Candidate {
            id: self.id.clone(),
            display_text: self.id.clone(),
            description: Some(self.display_name.clone()),
            semantic_type: Some(self.semantic_type),
        }
    }
}

/// A value that can follow an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueEntry {
    pub id: String,
    /// Query-ready form, quoted when the raw value contains whitespace.
    pub display_name: String,
    pub description: String,
}

impl ValueEntry {
    pub fn new(id: &str, description: &str) -> Self {
        let display_name = if id.chars().any(char::is_whitespace) {
            format!("\"{id}\"")
        } else {
            id.to_string()
        };
        Self {
            id: id.to_string(),
            display_name,
            description: description.to_string(),
        }
    }

    pub fn to_candidate(&self) -> Candidate {
        Candidate {
            id: self.id.clone(),
            display_text: self.display_name.clone(),
            description: Some(self.description.clone()),
            semantic_type: None,
        }
    }

    /// Case-insensitive containment on display name or description.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.display_name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
    }
}

/// A JQL function such as `currentUser()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub id: String,
    pub display_name: String,
    pub description: String,
}

impl FunctionDescriptor {
    fn new(id: &str, display_name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            description: description.to_string(),
        }
    }

    pub fn to_candidate(&self) -> Candidate {
        Candidate {
            id: self.id.clone(),
            display_text: self.display_name.clone(),
            description: Some(self.description.clone()),
            semantic_type: None,
        }
    }
}

/// The complete schema of one query grammar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub fields: Vec<FieldDescriptor>,
    /// Operator vocabulary per semantic type. Must contain `text`.
    pub operators: HashMap<SemanticType, Vec<String>>,
    /// Value sets shared by every field of a semantic type.
    #[serde(default)]
    pub type_values: HashMap<SemanticType, Vec<ValueEntry>>,
    /// Value sets specific to one field id.
    #[serde(default)]
    pub field_values: HashMap<String, Vec<ValueEntry>>,
    #[serde(default)]
    pub functions: Vec<FunctionDescriptor>,
    /// Field ids whose values come from the asynchronous fetcher.
    #[serde(default)]
    pub api_backed: Vec<String>,
}

impl Catalog {
    pub fn from_json_str(raw: &str) -> Result<Self, AssistError> {
        let catalog: Catalog = serde_json::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AssistError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// A catalog must carry a non-empty `text` operator set, the fail-open
    /// default for unknown fields.
    pub fn validate(&self) -> Result<(), AssistError> {
        match self.operators.get(&SemanticType::Text) {
            Some(ops) if !ops.is_empty() => Ok(()),
            _ => Err(AssistError::InvalidConfig(
                "catalog has no text operator set".to_string(),
            )),
        }
    }

    /// Look a field up by id, ignoring ASCII case.
    pub fn field(&self, id: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.id.eq_ignore_ascii_case(id))
    }

    /// Operators for a semantic type, falling back to the `text` set.
    pub fn operators_for(&self, semantic_type: Option<SemanticType>) -> &[String] {
        semantic_type
            .and_then(|t| self.operators.get(&t))
            .or_else(|| self.operators.get(&SemanticType::Text))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Static values for a field: the semantic-type-shared set if one
    /// exists, else the field-specific set, else nothing.
    pub fn static_values(&self, field: &FieldDescriptor) -> &[ValueEntry] {
        self.type_values
            .get(&field.semantic_type)
            .or_else(|| self.field_values.get(&field.id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_api_backed(&self, field_id: &str) -> bool {
        self.api_backed.iter().any(|f| f.eq_ignore_ascii_case(field_id))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        use SemanticType::*;

        let fields = vec![
            FieldDescriptor::new("project", "Project", Project, true),
            FieldDescriptor::new("status", "Status", Status, true),
            FieldDescriptor::new("assignee", "Assignee", User, true),
            FieldDescriptor::new("summary", "Summary", Text, false),
            FieldDescriptor::new("created", "Created", Date, false),
            FieldDescriptor::new("priority", "Priority", Priority, true),
            FieldDescriptor::new("reporter", "Reporter", User, true),
            FieldDescriptor::new("duedate", "Due Date", Date, false),
        ];

        let ops = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let mut operators = HashMap::new();
        operators.insert(
            Text,
            ops(&["=", "!=", "~", "!~", "IS", "IS NOT", "IN", "NOT IN", "CONTAINS"]),
        );
        operators.insert(
            Date,
            ops(&["=", "!=", ">", ">=", "<", "<=", "IS", "IS NOT", "IN", "NOT IN"]),
        );
        operators.insert(
            User,
            ops(&["=", "!=", "IS", "IS NOT", "IN", "NOT IN", "WAS", "WAS NOT", "CHANGED"]),
        );
        operators.insert(Project, ops(&["=", "!=", "IS", "IS NOT", "IN", "NOT IN"]));
        operators.insert(
            Status,
            ops(&["=", "!=", "IS", "IS NOT", "IN", "NOT IN", "WAS", "WAS NOT", "CHANGED"]),
        );
        operators.insert(
            Priority,
            ops(&["=", "!=", "IS", "IS NOT", "IN", "NOT IN", "WAS", "WAS NOT"]),
        );

        let mut type_values = HashMap::new();
        type_values.insert(
            User,
            vec![
                ValueEntry::new("currentUser()", "Current user"),
                ValueEntry::new("john.doe", "John Doe"),
                ValueEntry::new("jane.smith", "Jane Smith"),
                ValueEntry::new("admin", "Administrator"),
            ],
        );

        let mut field_values = HashMap::new();
        field_values.insert(
            "project".to_string(),
            vec![
                ValueEntry::new("PROJECTA", "Project A"),
                ValueEntry::new("PROJECTB", "Project B"),
                ValueEntry::new("PROJECT C WITH SPACES", "Project with spaces"),
            ],
        );

        let functions = vec![
            FunctionDescriptor::new("currentUser", "currentUser()", "Returns the current user"),
            FunctionDescriptor::new("now", "now()", "Returns the current date and time"),
            FunctionDescriptor::new(
                "membersOf",
                "membersOf(\"group\")",
                "Returns members of the specified group",
            ),
            FunctionDescriptor::new("endOfDay", "endOfDay()", "Returns the end of the current day"),
            FunctionDescriptor::new(
                "startOfDay",
                "startOfDay()",
                "Returns the start of the current day",
            ),
            FunctionDescriptor::new(
                "endOfWeek",
                "endOfWeek()",
                "Returns the end of the current week",
            ),
        ];

        Self {
            fields,
            operators,
            type_values,
            field_values,
            functions,
            api_backed: vec!["status".to_string(), "priority".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = Catalog::default();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.fields.len(), 8);
        for t in SemanticType::ALL {
            assert!(!catalog.operators_for(Some(t)).is_empty(), "{t} has operators");
        }
    }

    #[test]
    fn test_field_lookup_ignores_case() {
        let catalog = Catalog::default();
        assert_eq!(catalog.field("Status").map(|f| f.id.as_str()), Some("status"));
        assert!(catalog.field("sprint").is_none());
    }

    #[test]
    fn test_operators_fall_back_to_text() {
        let mut catalog = Catalog::default();
        catalog.operators.remove(&SemanticType::Date);
        let text = catalog.operators_for(Some(SemanticType::Text)).to_vec();
        assert_eq!(catalog.operators_for(Some(SemanticType::Date)), text.as_slice());
        assert_eq!(catalog.operators_for(None), text.as_slice());
    }

    #[test]
    fn test_user_fields_share_values() {
        let catalog = Catalog::default();
        let assignee = catalog.field("assignee").unwrap();
        let reporter = catalog.field("reporter").unwrap();
        assert_eq!(catalog.static_values(assignee), catalog.static_values(reporter));
        assert_eq!(catalog.static_values(assignee).len(), 4);
    }

    #[test]
    fn test_value_with_spaces_is_quoted() {
        let entry = ValueEntry::new("PROJECT C WITH SPACES", "Project with spaces");
        assert_eq!(entry.display_name, "\"PROJECT C WITH SPACES\"");
        assert_eq!(entry.to_candidate().id, "PROJECT C WITH SPACES");
    }

    #[test]
    fn test_field_candidate_splices_identifier() {
        let catalog = Catalog::default();
        let c = catalog.field("duedate").unwrap().to_candidate();
        assert_eq!(c.display_text, "duedate");
        assert_eq!(c.description.as_deref(), Some("Due Date"));
        assert_eq!(c.semantic_type, Some(SemanticType::Date));
    }

    #[test]
    fn test_load_alternative_grammar() {
        let raw = r#"{
            "fields": [
                {"id": "team", "display_name": "Team", "semantic_type": "project", "has_enumerable_values": true}
            ],
            "operators": {"text": ["=", "!="]},
            "field_values": {"team": [{"id": "core", "display_name": "core", "description": "Core team"}]}
        }"#;
        let catalog = Catalog::from_json_str(raw).unwrap();
        let team = catalog.field("team").unwrap();
        assert_eq!(catalog.operators_for(Some(team.semantic_type)), ["=", "!="]);
        assert_eq!(catalog.static_values(team).len(), 1);
        assert!(!catalog.is_api_backed("team"));
    }

    #[test]
    fn test_catalog_without_text_operators_rejected() {
        let raw = r#"{"fields": [], "operators": {"date": ["="]}}"#;
        assert!(matches!(
            Catalog::from_json_str(raw),
            Err(AssistError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_unknown_semantic_type_rejected() {
        let raw = r#"{
            "fields": [{"id": "x", "display_name": "X", "semantic_type": "money", "has_enumerable_values": false}],
            "operators": {"text": ["="]}
        }"#;
        assert!(matches!(
            Catalog::from_json_str(raw),
            Err(AssistError::Serialization(_))
        ));
    }
}
