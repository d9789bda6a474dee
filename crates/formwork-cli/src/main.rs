//! `formwork` command-line tool.

mod cli;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use formwork_core::{Notice, NoticeSink, ResolvedFields, Value};
use formwork_eval::{ExpressionEvaluator, FormRenderer, FormSession, RenderedForm};
use formwork_settings::{SettingsError, SettingsStore};
use formwork_store::VaultStore;
use futures::executor::block_on;
use serde_json::json;
use thiserror::Error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::cli::{Cli, Cmd};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("vault not found: {0}")]
    VaultNotFound(String),

    #[error("output error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Prints notices to stderr and logs them.
struct StderrNotices;

impl NoticeSink for StderrNotices {
    fn notify(&self, notice: Notice) {
        tracing::info!(kind = notice.kind(), "{}", notice);
        eprintln!("notice: {}", notice);
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    match run(cli.cmd) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "command failed");
            eprintln!("error: {}", error);
            ExitCode::FAILURE
        }
    }
}

fn run(cmd: Cmd) -> Result<(), CliError> {
    match cmd {
        Cmd::Eval {
            vault,
            fields,
            template,
        } => {
            let store = open_vault(&vault)?;
            let fields: ResolvedFields = fields.into_iter().collect();
            let evaluator = ExpressionEvaluator::new(&store, &StderrNotices);
            let value = block_on(evaluator.evaluate(&template, &fields));
            println!("{}", serde_json::to_string_pretty(&value.to_json())?);
        }
        Cmd::Render {
            vault,
            settings,
            sets,
            form_id,
        } => {
            let store = open_vault(&vault)?;
            let settings = SettingsStore::load(settings)?;
            let record = settings.get(&form_id)?;

            let renderer = FormRenderer::new(ExpressionEvaluator::new(&store, &StderrNotices));
            let mut session = block_on(FormSession::start(renderer, &record.form));
            for (class_name, value) in sets {
                if block_on(session.set_value(&class_name, value)).is_none() {
                    tracing::warn!(class_name = %class_name, "no such field in form");
                }
            }
            println!("{}", serde_json::to_string_pretty(&describe(session.form()))?);
        }
        Cmd::Forms { settings } => {
            let settings = SettingsStore::load(settings)?;
            for record in settings.forms() {
                let marker = if record.active { "*" } else { " " };
                println!(
                    "{} {}  {} ({} fields)",
                    marker,
                    record.id,
                    record.form.title,
                    record.form.fields.len()
                );
            }
        }
        Cmd::Toggle { settings, form_id } => {
            let mut settings = SettingsStore::load(settings)?;
            let active = settings.toggle(&form_id)?;
            settings.save()?;
            println!("{} is now {}", form_id, if active { "active" } else { "inactive" });
        }
        Cmd::Delete { settings, form_id } => {
            let mut settings = SettingsStore::load(settings)?;
            let removed = settings.delete(&form_id)?;
            settings.save()?;
            println!("deleted {} ({})", removed.id, removed.form.title);
        }
    }
    Ok(())
}

fn open_vault(path: &Path) -> Result<VaultStore, CliError> {
    if !path.is_dir() {
        return Err(CliError::VaultNotFound(path.display().to_string()));
    }
    Ok(VaultStore::new(path))
}

fn describe(form: &RenderedForm) -> serde_json::Value {
    let fields: Vec<_> = form
        .fields
        .iter()
        .map(|field| {
            json!({
                "className": field.class_name(),
                "type": field.field.kind.tag(),
                "hidden": field.hidden,
                "required": field.required,
                "value": field.value().to_json(),
                "options": field.options,
            })
        })
        .collect();

    json!({
        "title": form.title,
        "path": form.path,
        "submitLabel": form.submit_label,
        "fields": fields,
        "values": Value::Object(
            form.values()
                .iter()
                .map(|(class_name, value)| (class_name.clone(), value.clone()))
                .collect()
        )
        .to_json(),
        "missingRequired": form.missing_required(),
    })
}
