//! `azkit add`: scaffold a function class from a template.

use std::sync::Arc;

use azkit_adapters::{BuiltinTemplateStore, LocalFilesystem};
use azkit_core::application::{AddFunctionRequest, AddFunctionService, AddedFunction, InputMode};
use serde_json::json;
use tracing::instrument;

use crate::{
    cli::{AddArgs, OutputFormat},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
    prompt::terminal_prompter,
};

#[instrument(skip_all, fields(batch = args.batch))]
pub fn execute(args: AddArgs, config: &AppConfig, output: Arc<OutputManager>) -> CliResult<()> {
    let request = build_request(args, config);

    let service = AddFunctionService::new(
        Box::new(BuiltinTemplateStore::load()?),
        Box::new(LocalFilesystem::new()),
        terminal_prompter(),
        output.clone(),
    );
    let added = service.add(&request)?;

    report(&added, &output)
}

/// Merge flags with configured defaults; flags win.
fn build_request(args: AddArgs, config: &AppConfig) -> AddFunctionRequest {
    let source_root = args.source_root.or_else(|| {
        config
            .defaults
            .source_root
            .as_deref()
            .map(|root| args.base_dir.join(root))
    });

    AddFunctionRequest {
        source_root,
        host_json: None,
        function_name: args.function_name,
        package_name: args.package_name.or_else(|| config.defaults.package_name.clone()),
        template: args.template.or_else(|| config.defaults.template.clone()),
        properties: args.properties.into_iter().collect(),
        mode: if args.batch {
            InputMode::Batch
        } else {
            InputMode::Interactive
        },
        base_dir: args.base_dir,
    }
}

fn report(added: &AddedFunction, output: &OutputManager) -> CliResult<()> {
    if output.format() == OutputFormat::Json {
        let parameters: serde_json::Map<_, _> = added
            .parameters
            .iter()
            .map(|(k, v)| (k.clone(), json!(v)))
            .collect();
        output.json(&json!({
            "path": added.path,
            "template": added.template,
            "parameters": parameters,
        }))?;
    }
    Ok(())
}
