//! Add goal - scaffold a new Java function class from a template.
//!
//! Four steps:
//! 1. Load templates, filtered by the project's extension bundle
//! 2. Select a template
//! 3. Collect `functionName`, `className`, `packageName` and the
//!    template's trigger-specific parameters
//! 4. Substitute and save under the source root, refusing to overwrite

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, info, instrument};

use crate::{
    application::{
        ApplicationError,
        ports::{Filesystem, FunctionTemplateStore, Messager, Prompter},
        services::parameters::{
            DEFAULT_INPUT_ERROR, InputMode, ParameterCollector, Rule, TextInput, find_option,
            prompt_for,
        },
    },
    domain::{
        BindingTemplate, DomainError, ExtensionVersion, FunctionTemplate, capitalize,
        options_for_prompt, substitute_parameters,
    },
    error::AzkitResult,
};

const FUNCTION_NAME_ERROR: &str =
    "Function name must start with a letter and can contain letters, digits, '_' and '-'";
const PACKAGE_NAME_ERROR: &str = "Input should be a valid Java package name.";

/// Everything the add goal needs besides its adapters.
#[derive(Debug, Clone, Default)]
pub struct AddFunctionRequest {
    /// Project root.
    pub base_dir: PathBuf,
    /// Java source root; defaults to `<base_dir>/src/main/java`.
    pub source_root: Option<PathBuf>,
    /// Project `host.json`; defaults to `<base_dir>/host.json`.
    pub host_json: Option<PathBuf>,
    pub function_name: Option<String>,
    pub package_name: Option<String>,
    pub template: Option<String>,
    /// Initial answers for trigger-specific prompts.
    pub properties: BTreeMap<String, String>,
    pub mode: InputMode,
}

impl AddFunctionRequest {
    pub fn source_root(&self) -> PathBuf {
        self.source_root
            .clone()
            .unwrap_or_else(|| self.base_dir.join("src").join("main").join("java"))
    }

    pub fn host_json(&self) -> PathBuf {
        self.host_json
            .clone()
            .unwrap_or_else(|| self.base_dir.join("host.json"))
    }
}

/// Result of a successful add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedFunction {
    pub path: PathBuf,
    pub template: String,
    /// Substituted placeholders, in substitution order.
    pub parameters: Vec<(String, String)>,
}

/// Scaffolds new function classes.
pub struct AddFunctionService {
    templates: Box<dyn FunctionTemplateStore>,
    filesystem: Box<dyn Filesystem>,
    prompter: Box<dyn Prompter>,
    messager: Arc<dyn Messager>,
}

impl AddFunctionService {
    pub fn new(
        templates: Box<dyn FunctionTemplateStore>,
        filesystem: Box<dyn Filesystem>,
        prompter: Box<dyn Prompter>,
        messager: Arc<dyn Messager>,
    ) -> Self {
        Self {
            templates,
            filesystem,
            prompter,
            messager,
        }
    }

    #[instrument(skip_all, fields(base_dir = %request.base_dir.display(), mode = ?request.mode))]
    pub fn add(&self, request: &AddFunctionRequest) -> AzkitResult<AddedFunction> {
        let collector =
            ParameterCollector::new(request.mode, self.prompter.as_ref(), self.messager.as_ref());

        let bundle = self.bundle_version(&request.host_json());
        let templates = self.load_templates(bundle)?;
        let template = self.select_template(&collector, &templates, request.template.as_deref())?;

        let binding_template = match &template.binding {
            Some(binding) => self.templates.binding_template(&binding.binding_type)?,
            None => None,
        };
        let parameters = self.prepare_parameters(&collector, request, template, binding_template)?;

        let body = substitute_parameters(
            template.java_body()?,
            parameters.iter().map(|(k, v)| (k, v)),
        );

        let path = self.save(request, &parameters, &body)?;
        Ok(AddedFunction {
            path,
            template: template.name().to_string(),
            parameters,
        })
    }

    /// Templates the project can use, listed by name.
    pub fn available_templates(&self, host_json: &Path) -> AzkitResult<Vec<FunctionTemplate>> {
        let bundle = self.bundle_version(host_json);
        Ok(self
            .templates
            .list()?
            .into_iter()
            .filter(|t| t.supports(bundle))
            .collect())
    }

    // -------------------------------------------------------------------------
    // Steps
    // -------------------------------------------------------------------------

    fn load_templates(&self, bundle: Option<ExtensionVersion>) -> AzkitResult<Vec<FunctionTemplate>> {
        self.messager.info("Step 1 of 4: Load all function templates");
        let templates: Vec<_> = self
            .templates
            .list()?
            .into_iter()
            .filter(|t| t.supports(bundle))
            .collect();
        debug!(count = templates.len(), bundle = ?bundle, "Templates loaded");
        self.messager
            .info("Successfully loaded all function templates");
        Ok(templates)
    }

    fn select_template<'t>(
        &self,
        collector: &ParameterCollector<'_>,
        templates: &'t [FunctionTemplate],
        requested: Option<&str>,
    ) -> AzkitResult<&'t FunctionTemplate> {
        self.messager.info("Step 2 of 4: Select function template");
        let names: Vec<String> = templates.iter().map(|t| t.name().to_string()).collect();

        let name = match collector.mode() {
            InputMode::Batch => match (find_option(&names, requested), requested) {
                (Some(found), _) => found.to_string(),
                (None, Some(requested)) => {
                    return Err(DomainError::TemplateNotFound(requested.to_string()).into());
                }
                (None, None) => {
                    return Err(DomainError::InvalidInput {
                        input: "null".into(),
                    }
                    .into());
                }
            },
            InputMode::Interactive => {
                collector.choose("template for new function", requested, &names)?
            }
        };

        info!(template = %name, "Selected function template");
        let template = templates
            .iter()
            .find(|t| t.name().eq_ignore_ascii_case(&name))
            .ok_or_else(|| DomainError::TemplateNotFound(name.clone()))?;
        self.messager
            .info(&format!("Successfully found function template: {name}"));
        Ok(template)
    }

    fn prepare_parameters(
        &self,
        collector: &ParameterCollector<'_>,
        request: &AddFunctionRequest,
        template: &FunctionTemplate,
        binding_template: Option<BindingTemplate>,
    ) -> AzkitResult<Vec<(String, String)>> {
        self.messager.info("Step 3 of 4: Prepare required parameters");

        self.messager.info(
            "Common parameter [Function Name]: name for both the new function and Java class",
        );
        let function_name = capitalize(&match collector.mode() {
            InputMode::Batch => {
                collector.batch(request.function_name.as_deref(), &Rule::FunctionName, true)?
            }
            InputMode::Interactive => collector.text(&TextInput {
                prompt: "Enter value for Function Name: ".into(),
                initial: request.function_name.as_deref(),
                rule: Rule::FunctionName,
                default: None,
                error_message: FUNCTION_NAME_ERROR,
            })?,
        });

        self.messager
            .info("Common parameter [Package Name]: package name of the new Java class");
        let package_name = match collector.mode() {
            InputMode::Batch => {
                collector.batch(request.package_name.as_deref(), &Rule::PackageName, true)?
            }
            InputMode::Interactive => collector.text(&TextInput {
                prompt: "Enter value for Package Name: ".into(),
                initial: request.package_name.as_deref(),
                rule: Rule::PackageName,
                default: None,
                error_message: PACKAGE_NAME_ERROR,
            })?,
        }
        .to_lowercase();

        let class_name = function_name.replace('-', "_");
        let mut parameters = vec![
            ("functionName".to_string(), function_name),
            ("className".to_string(), class_name),
            ("packageName".to_string(), package_name),
        ];

        for prompt in &template.metadata.user_prompt {
            let value = self.prepare_template_parameter(
                collector,
                prompt,
                request.properties.get(prompt).map(String::as_str),
                binding_template.as_ref(),
            )?;
            parameters.push((prompt.clone(), value));
        }

        self.messager
            .info("Summary of parameters for function template:");
        for (key, value) in &parameters {
            self.messager.info(&format!("{key}: {value}"));
        }

        Ok(parameters)
    }

    fn prepare_template_parameter(
        &self,
        collector: &ParameterCollector<'_>,
        prompt: &str,
        initial: Option<&str>,
        binding_template: Option<&BindingTemplate>,
    ) -> AzkitResult<String> {
        let options: Option<Vec<String>> =
            options_for_prompt(prompt).map(|opts| opts.iter().map(|o| o.to_string()).collect());
        let setting = binding_template.and_then(|b| b.setting(prompt));
        let help = setting.and_then(|s| s.help.as_deref()).unwrap_or_default();
        self.messager
            .info(&format!("Trigger specific parameter [{prompt}]:{help}"));

        match (collector.mode(), options) {
            (InputMode::Batch, Some(options)) => {
                let chosen = find_option(&options, initial)
                    .or(options.first().map(String::as_str));
                collector.batch(chosen, &Rule::NonEmpty, false)
            }
            (InputMode::Batch, None) => collector.batch(initial, &Rule::NonEmpty, false),
            (InputMode::Interactive, Some(options)) => {
                collector.choose(&format!("the value for {prompt}: "), initial, &options)
            }
            (InputMode::Interactive, None) => {
                let default = setting.and_then(|s| s.default_value.as_deref());
                collector.text(&TextInput {
                    prompt: prompt_for(prompt, default),
                    initial,
                    rule: Rule::from_pattern(setting.and_then(|s| s.regex.as_deref())),
                    default,
                    error_message: setting
                        .and_then(|s| s.error_text.as_deref())
                        .unwrap_or(DEFAULT_INPUT_ERROR),
                })
            }
        }
    }

    fn save(
        &self,
        request: &AddFunctionRequest,
        parameters: &[(String, String)],
        body: &str,
    ) -> AzkitResult<PathBuf> {
        self.messager.info("Step 4 of 4: Saving function to file");

        let lookup = |key: &str| {
            parameters
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .unwrap_or_default()
        };

        let package_dir = lookup("packageName")
            .split('.')
            .fold(request.source_root(), |dir, segment| dir.join(segment));
        let target = package_dir.join(format!("{}.java", lookup("className")));

        if self.filesystem.exists(&target) {
            return Err(ApplicationError::FunctionExists { path: target }.into());
        }

        self.filesystem.create_dir_all(&package_dir)?;
        self.filesystem.write_file(&target, body)?;

        self.messager.success(&format!(
            "Successfully saved new function at {}",
            target.display()
        ));
        Ok(target)
    }

    /// Host generation declared by `host.json`, if it can be read.
    fn bundle_version(&self, host_json: &Path) -> Option<ExtensionVersion> {
        if !self.filesystem.exists(host_json) {
            return None;
        }
        let content = match self.filesystem.read_to_string(host_json) {
            Ok(content) => content,
            Err(e) => {
                debug!(error = %e, "Cannot read host.json, templates are not filtered");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(host) => ExtensionVersion::from_host_json(&host),
            Err(e) => {
                debug!(error = %e, "Cannot parse host.json, templates are not filtered");
                None
            }
        }
    }
}
