//! Form and field definitions.

use crate::errors::UnknownFieldKind;
use crate::types::Value;
use std::fmt;
use std::str::FromStr;

/// A form: an ordered list of fields plus the metadata used on submit.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Form {
    pub title: String,
    /// Document-path prefix submitted entries are written under.
    pub path: String,
    pub submit_label: String,
    #[cfg_attr(feature = "serde", serde(default, rename = "formFields"))]
    pub fields: Vec<Field>,
}

impl Form {
    pub fn new(title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            path: path.into(),
            submit_label: "Submit".to_string(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a field by class name.
    pub fn field(&self, class_name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.class_name == class_name)
    }

    /// Position of a field by class name.
    pub fn position(&self, class_name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.class_name == class_name)
    }
}

/// A single form field.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Field {
    pub name: String,
    /// Stable identifier, unique within the form. Used as the reference key.
    pub class_name: String,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: FieldKind,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub placeholder: Option<String>,
    /// Templated string; the field is hidden when it evaluates truthy.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub hide_expression: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub required: Required,
    /// Show the content expression as literal text instead of evaluating it.
    #[cfg_attr(feature = "serde", serde(default, rename = "bypassValueExpressionEvaluation"))]
    pub bypass_evaluation: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub content: FieldContent,
}

impl Field {
    pub fn new(name: impl Into<String>, class_name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            kind,
            description: None,
            placeholder: None,
            hide_expression: None,
            required: Required::default(),
            bypass_evaluation: false,
            content: FieldContent::default(),
        }
    }

    pub fn text(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self::new(name, class_name, FieldKind::Text)
    }

    pub fn dropdown(
        name: impl Into<String>,
        class_name: impl Into<String>,
        options: DropdownOptions,
    ) -> Self {
        Self::new(name, class_name, FieldKind::Dropdown { options })
    }

    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.content.expression = Some(expression.into());
        self
    }

    pub fn with_hide_expression(mut self, expression: impl Into<String>) -> Self {
        self.hide_expression = Some(expression.into());
        self
    }

    pub fn with_required(mut self, required: Required) -> Self {
        self.required = required;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn bypassing_evaluation(mut self) -> Self {
        self.bypass_evaluation = true;
        self
    }

    /// Dropdown options, if this is a dropdown.
    pub fn options(&self) -> Option<&DropdownOptions> {
        match &self.kind {
            FieldKind::Dropdown { options } => Some(options),
            _ => None,
        }
    }

    /// Every templated string attached to this field, in evaluation order.
    pub fn templated_strings(&self) -> Vec<&str> {
        let mut strings = Vec::new();
        if !self.bypass_evaluation {
            if let Some(expr) = &self.content.expression {
                strings.push(expr.as_str());
            }
        }
        if let Some(expr) = &self.hide_expression {
            strings.push(expr.as_str());
        }
        if let Required::Expression(expr) = &self.required {
            strings.push(expr.as_str());
        }
        if let Some(expr) = self.options().and_then(|o| o.expression.as_deref()) {
            strings.push(expr);
        }
        strings
    }
}

/// Field element kind.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "lowercase"))]
pub enum FieldKind {
    Text,
    Date,
    Time,
    Dropdown {
        #[cfg_attr(feature = "serde", serde(default))]
        options: DropdownOptions,
    },
    Toggle,
    Number {
        #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
        min: Option<f64>,
        #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
        max: Option<f64>,
    },
}

impl FieldKind {
    /// The element-kind tag.
    pub fn tag(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Date => "date",
            FieldKind::Time => "time",
            FieldKind::Dropdown { .. } => "dropdown",
            FieldKind::Toggle => "toggle",
            FieldKind::Number { .. } => "number",
        }
    }

    /// All element-kind tags, in authoring order.
    pub fn tags() -> [&'static str; 6] {
        ["text", "date", "time", "dropdown", "toggle", "number"]
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for FieldKind {
    type Err = UnknownFieldKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(FieldKind::Text),
            "date" => Ok(FieldKind::Date),
            "time" => Ok(FieldKind::Time),
            "dropdown" => Ok(FieldKind::Dropdown {
                options: DropdownOptions::default(),
            }),
            "toggle" => Ok(FieldKind::Toggle),
            "number" => Ok(FieldKind::Number {
                min: None,
                max: None,
            }),
            other => Err(UnknownFieldKind(other.to_string())),
        }
    }
}

/// A field's content: authored expression plus the last computed value.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldContent {
    /// Source of truth when present.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub expression: Option<String>,
    /// Recomputed on every render; never persisted.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub value: Option<Value>,
}

/// Dropdown option source: a literal list or an expression producing one.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DropdownOptions {
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub value: Option<Vec<String>>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub expression: Option<String>,
}

impl DropdownOptions {
    pub fn literal<S: Into<String>>(options: impl IntoIterator<Item = S>) -> Self {
        Self {
            value: Some(options.into_iter().map(Into::into).collect()),
            expression: None,
        }
    }

    pub fn expression(expression: impl Into<String>) -> Self {
        Self {
            value: None,
            expression: Some(expression.into()),
        }
    }
}

/// Whether a field must be filled: a fixed flag or a templated expression.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Required {
    Flag(bool),
    Expression(String),
}

impl Default for Required {
    fn default() -> Self {
        Required::Flag(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_kind_round_trips_through_tag() {
        for tag in FieldKind::tags() {
            let kind: FieldKind = tag.parse().unwrap();
            assert_eq!(kind.tag(), tag);
        }
        assert!("range".parse::<FieldKind>().is_err());
    }

    #[test]
    fn test_templated_strings_respect_bypass() {
        let field = Field::text("Hide", "field-hide")
            .with_expression("{{$$.a}}")
            .with_hide_expression("{{false}}")
            .bypassing_evaluation();
        assert_eq!(field.templated_strings(), vec!["{{false}}"]);
    }

    #[test]
    fn test_form_lookup() {
        let form = Form::new("Expenses", "expenses/")
            .with_field(Field::text("A", "field-a"))
            .with_field(Field::text("B", "field-b"));
        assert_eq!(form.position("field-b"), Some(1));
        assert!(form.field("missing").is_none());
    }
}
