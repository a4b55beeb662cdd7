//! `azkit list`: templates usable by the project.

use std::sync::Arc;

use azkit_adapters::{BuiltinTemplateStore, LocalFilesystem};
use azkit_core::{application::AddFunctionService, domain::FunctionTemplate};
use serde::Serialize;

use crate::{
    cli::{ListArgs, ListFormat},
    error::CliResult,
    output::OutputManager,
    prompt::StdinPrompter,
};

#[derive(Debug, Serialize)]
struct TemplateRow {
    name: String,
    description: String,
    category: Vec<String>,
    trigger: Option<String>,
}

impl From<&FunctionTemplate> for TemplateRow {
    fn from(template: &FunctionTemplate) -> Self {
        Self {
            name: template.name().to_string(),
            description: template.metadata.description.clone(),
            category: template.metadata.category.clone(),
            trigger: template.binding.as_ref().map(|b| b.binding_type.clone()),
        }
    }
}

pub fn execute(args: ListArgs, output: Arc<OutputManager>) -> CliResult<()> {
    let service = AddFunctionService::new(
        Box::new(BuiltinTemplateStore::load()?),
        Box::new(LocalFilesystem::new()),
        Box::new(StdinPrompter::new()),
        output.clone(),
    );
    let rows: Vec<TemplateRow> = service
        .available_templates(&args.base_dir.join("host.json"))?
        .iter()
        .map(TemplateRow::from)
        .collect();

    match args.format {
        ListFormat::Table => {
            output.header("Available templates:")?;
            let width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0);
            for row in &rows {
                output.data(&format!(
                    "  {:<width$}  {}",
                    row.name,
                    row.trigger.as_deref().unwrap_or("-"),
                ))?;
            }
        }
        ListFormat::List => {
            for row in &rows {
                output.data(&row.name)?;
            }
        }
        ListFormat::Json => output.json(&rows)?,
        ListFormat::Csv => {
            output.data("name,trigger,category")?;
            for row in &rows {
                output.data(&format!(
                    "{},{},{}",
                    row.name,
                    row.trigger.as_deref().unwrap_or(""),
                    row.category.join(";")
                ))?;
            }
        }
    }

    Ok(())
}
