//! Package goal - turn a built Java project into a deployable staging folder.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{AnnotatedFunction, ExtensionInstaller, Filesystem, FunctionScanner, Messager},
    },
    domain::{
        Binding, BindingEnum, ExtensionDecision, FunctionConfiguration, extension_install_decision,
    },
    error::AzkitResult,
};

/// Written when the project has no `host.json`.
pub const DEFAULT_HOST_JSON: &str = r#"{"version":"2.0","extensionBundle":{"id":"Microsoft.Azure.Functions.ExtensionBundle","version":"[4.*, 5.0.0)"}}"#;

/// Written when the project has no `local.settings.json`.
pub const DEFAULT_LOCAL_SETTINGS_JSON: &str =
    r#"{ "IsEncrypted": false, "Values": { "FUNCTIONS_WORKER_RUNTIME": "java" } }"#;

const CORE_LIBRARY: &str = "azure-functions-java-core-library";
const JAVA_LIBRARY: &str = "azure-functions-java-library";
const FUNCTION_JSON: &str = "function.json";
const LIB_DIR: &str = "lib";

#[derive(Debug, Clone)]
pub struct PackageRequest {
    pub base_dir: PathBuf,
    /// Root scanned for `@FunctionName` methods.
    pub source_dir: PathBuf,
    pub staging_dir: PathBuf,
    /// Jar name without extension; referenced from every `function.json`.
    pub final_name: String,
    /// The project jar produced by the build.
    pub artifact: PathBuf,
    /// Runtime dependency jars to ship in `lib/`.
    pub dependency_dir: Option<PathBuf>,
    pub host_json: PathBuf,
    pub local_settings_json: PathBuf,
    pub skip_install_extensions: bool,
}

impl PackageRequest {
    /// Conventional Maven layout under `base_dir` for `app_name`.
    pub fn for_project(base_dir: impl Into<PathBuf>, app_name: &str, final_name: &str) -> Self {
        let base_dir = base_dir.into();
        let target = base_dir.join("target");
        Self {
            source_dir: base_dir.join("src").join("main").join("java"),
            staging_dir: target.join("azure-functions").join(app_name),
            final_name: final_name.to_string(),
            artifact: target.join(format!("{final_name}.jar")),
            dependency_dir: Some(target.join("dependency")),
            host_json: base_dir.join("host.json"),
            local_settings_json: base_dir.join("local.settings.json"),
            skip_install_extensions: false,
            base_dir,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageReport {
    pub staging_dir: PathBuf,
    /// Function names, in discovery order.
    pub functions: Vec<String>,
    /// Jars copied into `lib/`.
    pub libraries: Vec<PathBuf>,
    pub extensions: ExtensionDecision,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PackageOutcome {
    /// Nothing to package; not an error.
    NoFunctions,
    Packaged(PackageReport),
}

pub struct PackageService {
    scanner: Box<dyn FunctionScanner>,
    filesystem: Box<dyn Filesystem>,
    installer: Box<dyn ExtensionInstaller>,
    messager: Arc<dyn Messager>,
}

impl PackageService {
    pub fn new(
        scanner: Box<dyn FunctionScanner>,
        filesystem: Box<dyn Filesystem>,
        installer: Box<dyn ExtensionInstaller>,
        messager: Arc<dyn Messager>,
    ) -> Self {
        Self {
            scanner,
            filesystem,
            installer,
            messager,
        }
    }

    #[instrument(skip_all, fields(staging = %request.staging_dir.display()))]
    pub fn package(&self, request: &PackageRequest) -> AzkitResult<PackageOutcome> {
        self.messager
            .info("Step 1 of 8: Searching for Azure Functions entry points");
        let functions = self.scanner.find_functions(&request.source_dir)?;
        self.messager.info(&format!(
            "{} Azure Functions entry point(s) found.",
            functions.len()
        ));
        if functions.is_empty() {
            self.messager
                .info("Azure Functions entry point not found, plugin will exit.");
            return Ok(PackageOutcome::NoFunctions);
        }

        self.messager
            .info("Step 2 of 8: Generating Azure Functions configurations");
        let configs: Vec<(String, FunctionConfiguration)> = functions
            .iter()
            .map(|f| (f.name.clone(), generate_configuration(f, &request.final_name)))
            .collect();
        self.messager.info("Generation done.");

        self.messager
            .info("Step 3 of 8: Validating generated configurations");
        for (name, config) in &configs {
            config.validate(name)?;
        }
        self.messager.info("Validation done.");

        self.filesystem.create_dir_all(&request.staging_dir)?;

        self.messager.info("Step 4 of 8: Copying/creating host.json");
        let staged_host = request.staging_dir.join("host.json");
        self.copy_or_create(&request.host_json, &staged_host, DEFAULT_HOST_JSON)?;

        self.messager
            .info("Step 5 of 8: Copying/creating local.settings.json");
        self.copy_or_create(
            &request.local_settings_json,
            &request.staging_dir.join("local.settings.json"),
            DEFAULT_LOCAL_SETTINGS_JSON,
        )?;

        self.messager
            .info("Step 6 of 8: Saving configurations to function.json");
        for (name, config) in &configs {
            self.write_function_json(&request.staging_dir, name, config)?;
        }

        self.messager.info(&format!(
            "Step 7 of 8: Copying JARs to staging directory {}",
            request.staging_dir.display()
        ));
        let libraries = self.copy_jars(request)?;
        self.messager.info("Copied successfully.");

        self.messager
            .info("Step 8 of 8: Installing function extensions if needed");
        let bindings: BTreeSet<BindingEnum> = configs
            .iter()
            .flat_map(|(_, c)| c.binding_kinds())
            .collect();
        let host = self.read_json(&staged_host);
        let extensions =
            extension_install_decision(request.skip_install_extensions, host.as_ref(), &bindings);
        match extensions {
            ExtensionDecision::Skip(reason) => self.messager.info(&reason.to_string()),
            ExtensionDecision::Install => {
                info!("Installing binding extensions");
                self.installer
                    .install(&request.staging_dir, &request.base_dir)?;
            }
        }
        self.messager.info("Function extension installation done.");

        self.messager.success("Successfully built Azure Functions.");
        Ok(PackageOutcome::Packaged(PackageReport {
            staging_dir: request.staging_dir.clone(),
            functions: configs.into_iter().map(|(name, _)| name).collect(),
            libraries,
            extensions,
        }))
    }

    fn copy_or_create(&self, source: &Path, target: &Path, default: &str) -> AzkitResult<()> {
        if self.filesystem.exists(source) {
            debug!(from = %source.display(), "Copying project file");
            self.filesystem.copy_file(source, target)
        } else {
            debug!(to = %target.display(), "Creating default file");
            self.filesystem.write_file(target, default)
        }
    }

    fn write_function_json(
        &self,
        staging: &Path,
        name: &str,
        config: &FunctionConfiguration,
    ) -> AzkitResult<()> {
        self.messager
            .info(&format!("Starting processing function: {name}"));
        let dir = staging.join(name);
        let path = dir.join(FUNCTION_JSON);
        let json = config
            .to_pretty_json()
            .map_err(|e| ApplicationError::Serialization {
                file: path.display().to_string(),
                reason: e.to_string(),
            })?;
        self.filesystem.create_dir_all(&dir)?;
        self.filesystem.write_file(&path, &json)?;
        self.messager
            .info(&format!("Successfully saved to {}", path.display()));
        Ok(())
    }

    fn copy_jars(&self, request: &PackageRequest) -> AzkitResult<Vec<PathBuf>> {
        let lib = request.staging_dir.join(LIB_DIR);
        if self.filesystem.exists(&lib) {
            self.filesystem.clean_dir(&lib)?;
        } else {
            self.filesystem.create_dir_all(&lib)?;
        }

        let jars = match &request.dependency_dir {
            Some(dir) if self.filesystem.exists(dir) => self
                .filesystem
                .list_files(dir)?
                .into_iter()
                .filter(|p| p.extension().is_some_and(|e| e == "jar"))
                .collect(),
            _ => Vec::new(),
        };

        let ids: Vec<&str> = jars.iter().filter_map(|p| jar_artifact_id(p)).collect();
        let excluded = if ids.contains(&CORE_LIBRARY) {
            CORE_LIBRARY
        } else {
            JAVA_LIBRARY
        };

        let mut copied = Vec::new();
        for jar in &jars {
            if jar_artifact_id(jar) == Some(excluded) {
                debug!(jar = %jar.display(), "Skipping functions runtime library");
                continue;
            }
            let Some(file_name) = jar.file_name() else {
                continue;
            };
            let target = lib.join(file_name);
            self.filesystem.copy_file(jar, &target)?;
            copied.push(target);
        }

        if !self.filesystem.exists(&request.artifact) {
            return Err(ApplicationError::ArtifactNotFound {
                path: request.artifact.clone(),
            }
            .into());
        }
        self.filesystem.copy_file(
            &request.artifact,
            &request.staging_dir.join(format!("{}.jar", request.final_name)),
        )?;

        Ok(copied)
    }

    fn read_json(&self, path: &Path) -> Option<Value> {
        let content = self.filesystem.read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Staged host.json is not valid JSON");
                None
            }
        }
    }
}

/// Build the `function.json` model for one discovered function.
pub fn generate_configuration(function: &AnnotatedFunction, final_name: &str) -> FunctionConfiguration {
    let mut config = FunctionConfiguration::new(&function.entry_point);
    config.script_file = Some(format!("../{final_name}.jar"));
    config.bindings = function.bindings.clone();

    let kinds: BTreeSet<BindingEnum> = config.binding_kinds().collect();
    if function.returns_value
        && kinds.contains(&BindingEnum::HttpTrigger)
        && !kinds.contains(&BindingEnum::HttpOutput)
    {
        config
            .bindings
            .push(Binding::new(BindingEnum::HttpOutput, "$return"));
    }
    config
}

/// Maven artifact id of a dependency jar named `<artifactId>-<version>.jar`.
pub fn jar_artifact_id(path: &Path) -> Option<&str> {
    let stem = path.file_stem()?.to_str()?;
    let version_start = stem
        .char_indices()
        .zip(stem.chars().skip(1))
        .find(|((_, c), next)| *c == '-' && next.is_ascii_digit())
        .map(|((i, _), _)| i);
    Some(match version_start {
        Some(i) => &stem[..i],
        None => stem,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::output::{
        MessageLevel, MockExtensionInstaller, MockFilesystem, MockFunctionScanner,
    };
    use std::sync::Mutex;

    /// Every message, plus the warnings on their own.
    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>, Mutex<Vec<String>>);

    impl Messager for Recorder {
        fn show(&self, level: MessageLevel, message: &str) {
            if matches!(level, MessageLevel::Warning) {
                self.1.lock().unwrap().push(message.to_string());
            }
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    fn http_function() -> AnnotatedFunction {
        AnnotatedFunction {
            name: "HttpExample".into(),
            entry_point: "com.example.Function.run".into(),
            bindings: vec![
                Binding::new(BindingEnum::HttpTrigger, "req").with_attribute("authLevel", "ANONYMOUS"),
            ],
            returns_value: true,
        }
    }

    #[test]
    fn jar_names_lose_their_version() {
        assert_eq!(
            jar_artifact_id(Path::new("lib/azure-functions-java-library-3.1.0.jar")),
            Some("azure-functions-java-library")
        );
        assert_eq!(jar_artifact_id(Path::new("gson-2.10.jar")), Some("gson"));
        assert_eq!(jar_artifact_id(Path::new("plain.jar")), Some("plain"));
    }

    #[test]
    fn http_function_gets_return_binding() {
        let config = generate_configuration(&http_function(), "app-1.0");
        assert_eq!(config.script_file.as_deref(), Some("../app-1.0.jar"));
        assert_eq!(config.bindings.len(), 2);
        assert_eq!(config.bindings[1].name, "$return");
    }

    #[test]
    fn void_http_function_has_no_return_binding() {
        let function = AnnotatedFunction {
            returns_value: false,
            ..http_function()
        };
        assert_eq!(generate_configuration(&function, "app").bindings.len(), 1);
    }

    #[test]
    fn no_functions_exits_early() {
        let mut scanner = MockFunctionScanner::new();
        scanner.expect_find_functions().returning(|_| Ok(vec![]));
        let mut fs = MockFilesystem::new();
        fs.expect_create_dir_all().never();

        let recorder = Arc::new(Recorder::default());
        let service = PackageService::new(
            Box::new(scanner),
            Box::new(fs),
            Box::new(MockExtensionInstaller::new()),
            recorder.clone(),
        );
        let outcome = service
            .package(&PackageRequest::for_project("/proj", "app", "app-1.0"))
            .unwrap();
        assert_eq!(outcome, PackageOutcome::NoFunctions);
        assert!(
            recorder
                .0
                .lock()
                .unwrap()
                .iter()
                .any(|m| m == "Azure Functions entry point not found, plugin will exit.")
        );
        assert!(recorder.1.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_project_files_get_default_content_verbatim() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().returning(|_| false);
        fs.expect_write_file()
            .withf(|path, content| {
                path == Path::new("/stage/host.json") && content == DEFAULT_HOST_JSON
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let service = PackageService::new(
            Box::new(MockFunctionScanner::new()),
            Box::new(fs),
            Box::new(MockExtensionInstaller::new()),
            Arc::new(Recorder::default()),
        );
        service
            .copy_or_create(
                Path::new("/proj/host.json"),
                Path::new("/stage/host.json"),
                DEFAULT_HOST_JSON,
            )
            .unwrap();
    }

    #[test]
    fn invalid_configuration_stops_before_writing() {
        let mut scanner = MockFunctionScanner::new();
        scanner.expect_find_functions().returning(|_| {
            Ok(vec![AnnotatedFunction {
                name: "NoTrigger".into(),
                entry_point: "a.B.c".into(),
                bindings: vec![Binding::new(BindingEnum::QueueOutput, "msg")],
                returns_value: false,
            }])
        });
        let mut fs = MockFilesystem::new();
        fs.expect_write_file().never();

        let service = PackageService::new(
            Box::new(scanner),
            Box::new(fs),
            Box::new(MockExtensionInstaller::new()),
            Arc::new(Recorder::default()),
        );
        let err = service
            .package(&PackageRequest::for_project("/proj", "app", "app-1.0"))
            .unwrap_err();
        assert!(err.to_string().contains("missing required trigger"));
    }
}
