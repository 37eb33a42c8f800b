use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Closed set of input kinds a template field can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Text,
    Textarea,
    Richtext,
    Select,
    Multiselect,
    Tags,
    Date,
    Number,
    Checkbox,
    Checklist,
    ImageUpload,
    FileUpload,
    Links,
}

impl FieldType {
    pub const ALL: [FieldType; 13] = [
        FieldType::Text,
        FieldType::Textarea,
        FieldType::Richtext,
        FieldType::Select,
        FieldType::Multiselect,
        FieldType::Tags,
        FieldType::Date,
        FieldType::Number,
        FieldType::Checkbox,
        FieldType::Checklist,
        FieldType::ImageUpload,
        FieldType::FileUpload,
        FieldType::Links,
    ];

    /// Wire label, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Richtext => "richtext",
            FieldType::Select => "select",
            FieldType::Multiselect => "multiselect",
            FieldType::Tags => "tags",
            FieldType::Date => "date",
            FieldType::Number => "number",
            FieldType::Checkbox => "checkbox",
            FieldType::Checklist => "checklist",
            FieldType::ImageUpload => "imageUpload",
            FieldType::FileUpload => "fileUpload",
            FieldType::Links => "links",
        }
    }

    /// Whether `options` carries meaning for this type.
    pub fn is_choice(&self) -> bool {
        matches!(self, FieldType::Select | FieldType::Multiselect)
    }

    /// Whether values of this type are ordered sequences.
    pub fn is_sequence(&self) -> bool {
        matches!(
            self,
            FieldType::Multiselect
                | FieldType::Tags
                | FieldType::ImageUpload
                | FieldType::FileUpload
                | FieldType::Links
                | FieldType::Checklist
        )
    }
}

/// One input slot within a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    /// `Some(Value::Null)` when the template spells out `"defaultValue": null`.
    #[serde(
        default,
        deserialize_with = "explicit_value",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<Value>")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

fn explicit_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl FieldSpec {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FieldType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
            required: false,
            help_text: None,
            default_value: None,
            options: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Parsed `options`, in declaration order.
    pub fn parsed_options(&self) -> Vec<FieldOption> {
        self.options
            .iter()
            .map(|raw| FieldOption::parse(raw))
            .collect()
    }
}

/// A single choice presented by select-like editors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

impl FieldOption {
    /// Parses `"value:label"` (split at the first colon) or a bare string used as both.
    ///
    /// An empty label after the colon falls back to the value.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((value, label)) => {
                let label = if label.is_empty() { value } else { label };
                Self {
                    value: value.to_string(),
                    label: label.to_string(),
                }
            }
            None => Self {
                value: raw.to_string(),
                label: raw.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_splits_at_first_colon() {
        let option = FieldOption::parse("url:https://example.com");
        assert_eq!(option.value, "url");
        assert_eq!(option.label, "https://example.com");
    }

    #[test]
    fn bare_option_is_value_and_label() {
        let option = FieldOption::parse("DRAFT");
        assert_eq!(option.value, "DRAFT");
        assert_eq!(option.label, "DRAFT");
    }

    #[test]
    fn empty_label_falls_back_to_value() {
        let option = FieldOption::parse("HIGH:");
        assert_eq!(option.label, "HIGH");
    }

    #[test]
    fn explicit_null_default_is_kept() {
        let field: FieldSpec = serde_json::from_value(serde_json::json!({
            "key": "n", "label": "N", "type": "number", "defaultValue": null
        }))
        .expect("field");
        assert_eq!(field.default_value, Some(Value::Null));
        let encoded = serde_json::to_value(&field).expect("encode");
        assert_eq!(encoded.get("defaultValue"), Some(&Value::Null));

        let field: FieldSpec = serde_json::from_value(serde_json::json!({
            "key": "n", "label": "N", "type": "number"
        }))
        .expect("field");
        assert_eq!(field.default_value, None);
    }

    #[test]
    fn field_type_labels_round_trip_through_serde() {
        for kind in FieldType::ALL {
            let encoded = serde_json::to_value(kind).expect("encode");
            assert_eq!(encoded, Value::String(kind.as_str().to_string()));
        }
    }
}
