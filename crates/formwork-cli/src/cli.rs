use std::path::PathBuf;

use clap::{Parser, Subcommand};
use formwork_core::Value;

#[derive(Parser)]
#[command(name = "formwork", version, about = "Evaluate templated strings and render forms against a vault")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Evaluate one templated string and print the result as JSON
    Eval {
        /// Vault root documents and folders are read from
        #[arg(long)]
        vault: PathBuf,
        /// Sibling field value, as class=value (value may be JSON)
        #[arg(long = "field", value_name = "CLASS=VALUE", value_parser = parse_assignment)]
        fields: Vec<(String, Value)>,
        template: String,
    },
    /// Render a stored form and print every field's state
    Render {
        #[arg(long)]
        vault: PathBuf,
        #[arg(long)]
        settings: PathBuf,
        /// Set a field as a user would, in order, after the first render
        #[arg(long = "set", value_name = "CLASS=VALUE", value_parser = parse_assignment)]
        sets: Vec<(String, Value)>,
        form_id: String,
    },
    /// List stored forms
    Forms {
        #[arg(long)]
        settings: PathBuf,
    },
    /// Flip a form's active flag
    Toggle {
        #[arg(long)]
        settings: PathBuf,
        form_id: String,
    },
    /// Remove a form
    Delete {
        #[arg(long)]
        settings: PathBuf,
        form_id: String,
    },
}

/// Parse `class=value`. The value is read as JSON when it parses, else as a
/// plain string.
pub fn parse_assignment(arg: &str) -> Result<(String, Value), String> {
    let (class_name, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected CLASS=VALUE, got `{}`", arg))?;
    let class_name = class_name.trim();
    if class_name.is_empty() {
        return Err(format!("missing class name in `{}`", arg));
    }
    let value = serde_json::from_str::<serde_json::Value>(raw)
        .map(Value::from)
        .unwrap_or_else(|_| Value::string(raw));
    Ok((class_name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("field-a=hello world").unwrap(),
            ("field-a".to_string(), Value::from("hello world"))
        );
        assert_eq!(
            parse_assignment("amount=12").unwrap(),
            ("amount".to_string(), Value::Number(12.0))
        );
        assert_eq!(
            parse_assignment("tags=[\"a\"]").unwrap(),
            ("tags".to_string(), Value::from(vec![Value::from("a")]))
        );
        assert_eq!(
            parse_assignment("expr=a=b").unwrap(),
            ("expr".to_string(), Value::from("a=b"))
        );
    }

    #[test]
    fn test_parse_assignment_rejects_malformed() {
        assert!(parse_assignment("no-separator").is_err());
        assert!(parse_assignment("=value").is_err());
    }

    #[test]
    fn test_cli_parses_eval() {
        let cli = Cli::try_parse_from([
            "formwork",
            "eval",
            "--vault",
            "/tmp/vault",
            "--field",
            "field-a=x",
            "{{$$.field-a}}",
        ])
        .unwrap();
        match cli.cmd {
            Cmd::Eval { fields, template, .. } => {
                assert_eq!(fields.len(), 1);
                assert_eq!(template, "{{$$.field-a}}");
            }
            _ => panic!("Expected eval command"),
        }
    }
}
