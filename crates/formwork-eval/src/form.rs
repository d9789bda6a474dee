//! Sequential rendering of a whole form.
//!
//! Fields are evaluated strictly in definition order. Each field sees the
//! values of the fields before it; its own value is recorded only after its
//! evaluation completes.

use formwork_core::{Field, FieldKind, Form, Notice, Required, ResolvedFields, Value};

use crate::evaluator::ExpressionEvaluator;

static UNDEFINED: Value = Value::Undefined;

/// Computed state of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedField {
    /// The field definition, with `content.value` filled in.
    pub field: Field,
    pub hidden: bool,
    pub required: bool,
    /// Dropdown options; empty for other kinds.
    pub options: Vec<String>,
}

impl RenderedField {
    pub fn class_name(&self) -> &str {
        &self.field.class_name
    }

    pub fn value(&self) -> &Value {
        self.field.content.value.as_ref().unwrap_or(&UNDEFINED)
    }

    /// Whether the value counts as filled in.
    pub fn is_filled(&self) -> bool {
        match self.value() {
            Value::Undefined | Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            Value::Array(items) => !items.is_empty(),
            _ => true,
        }
    }
}

/// A form with every field evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedForm {
    pub title: String,
    pub path: String,
    pub submit_label: String,
    pub fields: Vec<RenderedField>,
}

impl RenderedForm {
    pub fn field(&self, class_name: &str) -> Option<&RenderedField> {
        self.fields.iter().find(|f| f.class_name() == class_name)
    }

    /// Submission payload: class name to value, for visible fields.
    pub fn values(&self) -> ResolvedFields {
        self.fields
            .iter()
            .filter(|f| !f.hidden)
            .map(|f| (f.class_name(), f.value().clone()))
            .collect()
    }

    /// Visible required fields that have no value.
    pub fn missing_required(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| !f.hidden && f.required && !f.is_filled())
            .map(RenderedField::class_name)
            .collect()
    }

    /// Values in scope for the field at `index`: everything before it.
    fn scope(&self, index: usize) -> ResolvedFields {
        scope_of(&self.fields[..index])
    }
}

fn scope_of(fields: &[RenderedField]) -> ResolvedFields {
    fields
        .iter()
        .filter(|f| !matches!(f.value(), Value::Undefined))
        .map(|f| (f.class_name(), f.value().clone()))
        .collect()
}

/// Interprets a hide or required result as a flag. The strings `"false"`
/// and `"0"` count as unset, since templated strings often produce them.
fn flag(value: &Value) -> bool {
    match value {
        Value::String(s) => !matches!(s.trim(), "" | "false" | "0"),
        other => other.is_truthy(),
    }
}

/// Evaluates every field of a form in order.
#[derive(Clone, Copy)]
pub struct FormRenderer<'a> {
    evaluator: ExpressionEvaluator<'a>,
}

impl<'a> FormRenderer<'a> {
    pub fn new(evaluator: ExpressionEvaluator<'a>) -> Self {
        Self { evaluator }
    }

    pub async fn render(&self, form: &Form) -> RenderedForm {
        tracing::debug!(form = %form.title, fields = form.fields.len(), "rendering form");

        let mut rendered = RenderedForm {
            title: form.title.clone(),
            path: form.path.clone(),
            submit_label: form.submit_label.clone(),
            fields: Vec::with_capacity(form.fields.len()),
        };

        let mut scope = ResolvedFields::new();
        for field in &form.fields {
            let value = self.content(field, &scope).await;
            let field = self.state(field.clone(), value, &scope).await;
            if !matches!(field.value(), Value::Undefined) {
                scope.insert(field.class_name(), field.value().clone());
            }
            rendered.fields.push(field);
        }

        rendered
    }

    /// The field's value: its evaluated expression, the expression text
    /// itself when evaluation is bypassed, or the value it already had.
    async fn content(&self, field: &Field, scope: &ResolvedFields) -> Value {
        match &field.content.expression {
            Some(expression) if field.bypass_evaluation => Value::string(expression.as_str()),
            Some(expression) => self.evaluator.evaluate(expression, scope).await,
            None => field.content.value.clone().unwrap_or_default(),
        }
    }

    /// Evaluate hide, required and options with `value` recorded.
    async fn state(&self, mut field: Field, value: Value, scope: &ResolvedFields) -> RenderedField {
        field.content.value = Some(value.clone());
        let mut scope = scope.clone();
        if !matches!(value, Value::Undefined) {
            scope.insert(&field.class_name, value);
        }

        let hidden = match &field.hide_expression {
            Some(expression) => flag(&self.evaluator.evaluate(expression, &scope).await),
            None => false,
        };

        let required = match &field.required {
            Required::Flag(required) => *required,
            Required::Expression(expression) => {
                flag(&self.evaluator.evaluate(expression, &scope).await)
            }
        };

        let options = match &field.kind {
            FieldKind::Dropdown { options } => match (&options.value, &options.expression) {
                (_, Some(expression)) => self.options(&field.class_name, expression, &scope).await,
                (Some(literal), None) => literal.clone(),
                (None, None) => Vec::new(),
            },
            _ => Vec::new(),
        };

        RenderedField {
            field,
            hidden,
            required,
            options,
        }
    }

    async fn options(&self, class_name: &str, expression: &str, scope: &ResolvedFields) -> Vec<String> {
        match self.evaluator.evaluate(expression, scope).await {
            Value::Array(items) => items.iter().map(Value::to_display_string).collect(),
            other => {
                self.evaluator.notices().notify(Notice::InvalidOptions {
                    class_name: class_name.to_string(),
                    reason: format!("expected a list, got {}", other.type_name()),
                });
                Vec::new()
            }
        }
    }
}

/// Interactive editing of a rendered form.
///
/// Setting a value re-evaluates every later field, so dependents refresh
/// as the user types.
pub struct FormSession<'a> {
    renderer: FormRenderer<'a>,
    form: RenderedForm,
}

impl<'a> FormSession<'a> {
    pub async fn start(renderer: FormRenderer<'a>, form: &Form) -> FormSession<'a> {
        let rendered = renderer.render(form).await;
        Self {
            renderer,
            form: rendered,
        }
    }

    pub fn form(&self) -> &RenderedForm {
        &self.form
    }

    pub fn field(&self, class_name: &str) -> Option<&RenderedField> {
        self.form.field(class_name)
    }

    pub fn values(&self) -> ResolvedFields {
        self.form.values()
    }

    /// Store user input for a field and refresh the fields after it.
    ///
    /// Returns `None` when the form has no such field.
    pub async fn set_value(&mut self, class_name: &str, value: Value) -> Option<&RenderedField> {
        let index = self
            .form
            .fields
            .iter()
            .position(|f| f.class_name() == class_name)?;
        tracing::debug!(class_name, "field value changed");

        let scope = self.form.scope(index);
        let field = self.form.fields[index].field.clone();
        self.form.fields[index] = self.renderer.state(field, value, &scope).await;

        for later in index + 1..self.form.fields.len() {
            let field = self.form.fields[later].field.clone();
            if field.templated_strings().is_empty() {
                continue;
            }
            let scope = self.form.scope(later);
            let value = match &field.content.expression {
                Some(_) => self.renderer.content(&field, &scope).await,
                None => self.form.fields[later].value().clone(),
            };
            self.form.fields[later] = self.renderer.state(field, value, &scope).await;
        }

        self.form.fields.get(index)
    }
}
