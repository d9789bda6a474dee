//! The built-in form for authoring a field, and conversion of its
//! submission into a [`Field`].

use formwork_core::{DropdownOptions, Field, FieldKind, Form, Required, ResolvedFields, Value};

use crate::error::{Result, SettingsError};

pub const FIELD_TYPE: &str = "field-type";
pub const FIELD_NAME: &str = "field-name";
pub const FIELD_CLASS_NAME: &str = "field-class-name";
pub const FIELD_DESCRIPTION: &str = "field-description";
pub const FIELD_PLACEHOLDER: &str = "field-placeholder";
pub const FIELD_HIDE_EXPRESSION: &str = "field-hide-expression";
pub const FIELD_REQUIRED: &str = "field-required";
pub const FIELD_MIN: &str = "field-min";
pub const FIELD_MAX: &str = "field-max";
pub const FIELD_DEFAULT_VALUE: &str = "field-default-value";
pub const FIELD_DROPDOWN_OPTIONS: &str = "field-dropdown-options";

fn number(name: &str, class_name: &str) -> Field {
    Field::new(name, class_name, FieldKind::Number { min: None, max: None })
}

/// The form used to author a single field.
///
/// Later fields react to the chosen type: placeholders are hidden for
/// dropdowns and toggles, min/max only show for numbers, options only for
/// dropdowns.
pub fn field_editor_form() -> Form {
    Form::new("Field", "")
        .with_field(Field::dropdown(
            "Type",
            FIELD_TYPE,
            DropdownOptions::literal(FieldKind::tags()),
        ))
        .with_field(
            Field::text("Name", FIELD_NAME)
                .with_description("Enter the field name")
                .with_required(Required::Flag(true)),
        )
        .with_field(
            Field::text("Class name", FIELD_CLASS_NAME)
                .with_expression("field-{{$$.field-name.toLowerCase().replaceAll(' ', '-')}}"),
        )
        .with_field(Field::text("Description", FIELD_DESCRIPTION))
        .with_field(
            Field::text("Placeholder", FIELD_PLACEHOLDER)
                .with_hide_expression("{{['dropdown', 'toggle'].includes($$.field-type)}}"),
        )
        .with_field(
            Field::text("Hide Expression", FIELD_HIDE_EXPRESSION)
                .with_placeholder("{{$$.field-foo === 'bar'}}")
                .bypassing_evaluation(),
        )
        .with_field(
            Field::new("Required", FIELD_REQUIRED, FieldKind::Toggle)
                .with_hide_expression("{{$$.field-type === 'toggle'}}")
                .with_expression("{{$$.field-type === 'toggle' ? 'false' : 'true'}}"),
        )
        .with_field(
            number("Min", FIELD_MIN)
                .with_placeholder("1")
                .with_hide_expression("{{$$.field-type !== 'number'}}"),
        )
        .with_field(
            number("Max", FIELD_MAX)
                .with_placeholder("10")
                .with_hide_expression("{{$$.field-type !== 'number'}}"),
        )
        .with_field(Field::text("Default Value", FIELD_DEFAULT_VALUE).bypassing_evaluation())
        .with_field(
            Field::text("Options", FIELD_DROPDOWN_OPTIONS)
                .with_placeholder("{{['itemA', 'itemB']}}")
                .with_hide_expression("{{$$.field-type !== 'dropdown'}}"),
        )
}

/// Trimmed display text of a submitted value, if any.
fn text(values: &ResolvedFields, class_name: &str) -> Option<String> {
    let value = values.get(class_name)?;
    if value.is_nullish() {
        return None;
    }
    let text = value.to_display_string();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn is_expression(text: &str) -> bool {
    text.contains("{{") && text.contains("}}")
}

fn bound(values: &ResolvedFields, class_name: &str) -> Option<f64> {
    let n = match values.get(class_name)? {
        Value::Number(n) => *n,
        other => text(values, class_name)?.parse().unwrap_or_else(|_| other.to_number()),
    };
    n.is_finite().then_some(n)
}

fn required(values: &ResolvedFields) -> Required {
    match values.get(FIELD_REQUIRED) {
        Some(Value::Bool(flag)) => Required::Flag(*flag),
        _ => match text(values, FIELD_REQUIRED) {
            Some(text) if is_expression(&text) => Required::Expression(text),
            Some(text) => Required::Flag(!matches!(text.as_str(), "false" | "0")),
            None => Required::Flag(false),
        },
    }
}

fn options(values: &ResolvedFields) -> DropdownOptions {
    if let Some(Value::Array(items)) = values.get(FIELD_DROPDOWN_OPTIONS) {
        return DropdownOptions::literal(items.iter().map(Value::to_display_string));
    }
    match text(values, FIELD_DROPDOWN_OPTIONS) {
        Some(text) if is_expression(&text) => DropdownOptions::expression(text),
        Some(text) => DropdownOptions::literal(
            text.split(',')
                .map(str::trim)
                .filter(|option| !option.is_empty()),
        ),
        None => DropdownOptions::default(),
    }
}

/// Build a field from a submission of [`field_editor_form`].
pub fn field_from_values(values: &ResolvedFields) -> Result<Field> {
    let tag = text(values, FIELD_TYPE).unwrap_or_else(|| FieldKind::Text.tag().to_string());
    let kind = match tag.parse::<FieldKind>()? {
        FieldKind::Dropdown { .. } => FieldKind::Dropdown {
            options: options(values),
        },
        FieldKind::Number { .. } => FieldKind::Number {
            min: bound(values, FIELD_MIN),
            max: bound(values, FIELD_MAX),
        },
        other => other,
    };

    let name = text(values, FIELD_NAME)
        .ok_or_else(|| SettingsError::InvalidField("a field name is required".to_string()))?;
    let class_name = text(values, FIELD_CLASS_NAME)
        .filter(|class_name| class_name != "field-")
        .unwrap_or_else(|| format!("field-{}", name.to_lowercase().replace(' ', "-")));

    let mut field = Field::new(name, class_name, kind).with_required(required(values));
    field.description = text(values, FIELD_DESCRIPTION);
    field.placeholder = text(values, FIELD_PLACEHOLDER);
    field.hide_expression = text(values, FIELD_HIDE_EXPRESSION);
    field.content.expression = text(values, FIELD_DEFAULT_VALUE);

    tracing::debug!(class_name = %field.class_name, kind = %field.kind, "authored field");
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_core::CollectedNotices;
    use formwork_eval::{ExpressionEvaluator, FormRenderer, FormSession};
    use formwork_resolver::validate_form;
    use formwork_store::MemoryStore;
    use futures::executor::block_on;

    #[test]
    fn test_editor_form_is_valid() {
        assert!(validate_form(&field_editor_form()).is_ok());
    }

    #[test]
    fn test_editor_initial_state() {
        let store = MemoryStore::new();
        let notices = CollectedNotices::new();
        let renderer = FormRenderer::new(ExpressionEvaluator::new(&store, &notices));
        let rendered = block_on(renderer.render(&field_editor_form()));

        assert_eq!(rendered.field(FIELD_TYPE).unwrap().options.len(), 6);
        assert_eq!(rendered.field(FIELD_CLASS_NAME).unwrap().value(), &Value::from("field-"));
        assert!(!rendered.field(FIELD_PLACEHOLDER).unwrap().hidden);
        assert_eq!(rendered.field(FIELD_REQUIRED).unwrap().value(), &Value::from("true"));
        assert!(rendered.field(FIELD_MIN).unwrap().hidden);
        assert!(rendered.field(FIELD_DROPDOWN_OPTIONS).unwrap().hidden);
        assert_eq!(rendered.missing_required(), vec![FIELD_NAME]);
        assert!(notices.is_empty());
    }

    #[test]
    fn test_author_dropdown_field() {
        let store = MemoryStore::new();
        let notices = CollectedNotices::new();
        let renderer = FormRenderer::new(ExpressionEvaluator::new(&store, &notices));
        let mut session = block_on(FormSession::start(renderer, &field_editor_form()));

        block_on(session.set_value(FIELD_TYPE, Value::from("dropdown")));
        block_on(session.set_value(FIELD_NAME, Value::from("Expense Category")));
        block_on(session.set_value(FIELD_DROPDOWN_OPTIONS, Value::from("food, rent,")));

        assert!(session.field(FIELD_PLACEHOLDER).unwrap().hidden);
        assert!(!session.field(FIELD_DROPDOWN_OPTIONS).unwrap().hidden);

        let field = field_from_values(&session.values()).unwrap();
        assert_eq!(field.name, "Expense Category");
        assert_eq!(field.class_name, "field-expense-category");
        assert_eq!(field.required, Required::Flag(true));
        assert_eq!(
            field.options().unwrap(),
            &DropdownOptions::literal(["food", "rent"])
        );
    }

    #[test]
    fn test_author_number_field() {
        let store = MemoryStore::new();
        let notices = CollectedNotices::new();
        let renderer = FormRenderer::new(ExpressionEvaluator::new(&store, &notices));
        let mut session = block_on(FormSession::start(renderer, &field_editor_form()));

        block_on(session.set_value(FIELD_TYPE, Value::from("number")));
        block_on(session.set_value(FIELD_NAME, Value::from("Amount")));
        assert!(!session.field(FIELD_MIN).unwrap().hidden);
        block_on(session.set_value(FIELD_MIN, Value::from("1")));
        block_on(session.set_value(FIELD_MAX, Value::Number(10.0)));
        block_on(session.set_value(FIELD_DEFAULT_VALUE, Value::from("{{$$.field-base * 2}}")));

        let field = field_from_values(&session.values()).unwrap();
        assert_eq!(
            field.kind,
            FieldKind::Number {
                min: Some(1.0),
                max: Some(10.0)
            }
        );
        assert_eq!(field.content.expression.as_deref(), Some("{{$$.field-base * 2}}"));
    }

    #[test]
    fn test_toggle_field_is_not_required() {
        let values: ResolvedFields = [
            (FIELD_TYPE, Value::from("toggle")),
            (FIELD_NAME, Value::from("Paid")),
        ]
        .into_iter()
        .collect();
        let field = field_from_values(&values).unwrap();
        assert_eq!(field.kind, FieldKind::Toggle);
        assert_eq!(field.class_name, "field-paid");
        assert_eq!(field.required, Required::Flag(false));
    }

    #[test]
    fn test_options_expression_and_required_expression() {
        let values: ResolvedFields = [
            (FIELD_TYPE, Value::from("dropdown")),
            (FIELD_NAME, Value::from("Category")),
            (FIELD_CLASS_NAME, Value::from("field-category")),
            (FIELD_REQUIRED, Value::from("{{$$.field-kind === 'a'}}")),
            (FIELD_DROPDOWN_OPTIONS, Value::from("{{%%categories/%%}}")),
        ]
        .into_iter()
        .collect();
        let field = field_from_values(&values).unwrap();
        assert_eq!(
            field.required,
            Required::Expression("{{$$.field-kind === 'a'}}".to_string())
        );
        assert_eq!(
            field.options().unwrap(),
            &DropdownOptions::expression("{{%%categories/%%}}")
        );
    }

    #[test]
    fn test_invalid_submissions() {
        let missing_name: ResolvedFields = [(FIELD_TYPE, Value::from("text"))].into_iter().collect();
        assert!(matches!(
            field_from_values(&missing_name),
            Err(SettingsError::InvalidField(_))
        ));

        let unknown_type: ResolvedFields = [
            (FIELD_TYPE, Value::from("range")),
            (FIELD_NAME, Value::from("Level")),
        ]
        .into_iter()
        .collect();
        match field_from_values(&unknown_type) {
            Err(SettingsError::UnknownFieldKind(kind)) => assert_eq!(kind.0, "range"),
            other => panic!("Expected unknown field kind, got {:?}", other),
        }
    }
}
