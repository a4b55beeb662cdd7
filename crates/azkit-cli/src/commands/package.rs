//! `azkit package`: stage a built project for deployment.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use azkit_adapters::{FuncCoreToolsInstaller, JavaSourceScanner, LocalFilesystem};
use azkit_core::{
    application::{ExtensionInstaller, PackageOutcome, PackageRequest, PackageService},
    domain::ExtensionDecision,
    error::AzkitResult,
};
use serde_json::json;
use tracing::instrument;

use crate::{
    cli::{OutputFormat, PackageArgs},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

#[instrument(skip_all, fields(base_dir = %args.base_dir.display()))]
pub fn execute(
    args: PackageArgs,
    config: &AppConfig,
    output: Arc<OutputManager>,
) -> CliResult<()> {
    let request = build_request(args, config)?;

    let service = PackageService::new(
        Box::new(JavaSourceScanner::new()),
        Box::new(LocalFilesystem::new()),
        Box::new(SpinnerInstaller {
            inner: FuncCoreToolsInstaller::new(),
            output: output.clone(),
        }),
        output.clone(),
    );
    let outcome = service.package(&request)?;

    if output.format() == OutputFormat::Json {
        output.json(&outcome_json(&outcome))?;
    }
    Ok(())
}

/// Resolve names and directories: flags, then config, then conventions.
fn build_request(args: PackageArgs, config: &AppConfig) -> CliResult<PackageRequest> {
    let app_name = match args.app_name {
        Some(name) => name,
        None => project_name(&args.base_dir)?,
    };
    let final_name = args
        .final_name
        .or_else(|| config.package.final_name.clone())
        .unwrap_or_else(|| app_name.clone());

    let mut request = PackageRequest::for_project(&args.base_dir, &app_name, &final_name);
    request.staging_dir = args.staging_dir.unwrap_or_else(|| {
        args.base_dir
            .join(&config.defaults.staging_directory)
            .join(&app_name)
    });
    if let Some(source_dir) = args.source_dir.or_else(|| {
        config
            .defaults
            .source_root
            .as_deref()
            .map(|root| args.base_dir.join(root))
    }) {
        request.source_dir = source_dir;
    }
    request.skip_install_extensions =
        args.skip_install_extensions || config.package.skip_install_extensions;
    Ok(request)
}

/// Directory name of the project, resolving `.` and friends.
fn project_name(base_dir: &Path) -> CliResult<String> {
    let resolved: PathBuf = std::fs::canonicalize(base_dir)?;
    resolved
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| CliError::InvalidInput {
            message: format!(
                "cannot derive an app name from {}, pass --app-name",
                base_dir.display()
            ),
            source: None,
        })
}

fn outcome_json(outcome: &PackageOutcome) -> serde_json::Value {
    match outcome {
        PackageOutcome::NoFunctions => json!({ "status": "no-functions" }),
        PackageOutcome::Packaged(report) => json!({
            "status": "packaged",
            "stagingDirectory": report.staging_dir,
            "functions": report.functions,
            "libraries": report.libraries,
            "extensions": match report.extensions {
                ExtensionDecision::Install => "installed".to_string(),
                ExtensionDecision::Skip(reason) => reason.to_string(),
            },
        }),
    }
}

/// Shows a spinner while Core Tools installs binding extensions.
struct SpinnerInstaller {
    inner: FuncCoreToolsInstaller,
    output: Arc<OutputManager>,
}

impl ExtensionInstaller for SpinnerInstaller {
    fn install(&self, staging_dir: &Path, base_dir: &Path) -> AzkitResult<()> {
        let spinner = self.output.spinner("Installing function extensions");
        let result = self.inner.install(staging_dir, base_dir);
        spinner.finish_and_clear();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use azkit_core::domain::SkipReason;
    use clap::Parser;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> PackageArgs {
        let mut argv = vec!["azkit", "package"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Commands::Package(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn app_name_defaults_to_the_project_directory() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("orders-api");
        std::fs::create_dir(&project).unwrap();

        let request = build_request(
            parse(&["--base-dir", project.to_str().unwrap()]),
            &AppConfig::default(),
        )
        .unwrap();

        assert_eq!(request.final_name, "orders-api");
        assert_eq!(request.artifact, project.join("target/orders-api.jar"));
        assert_eq!(
            request.staging_dir,
            project.join("target/azure-functions/orders-api")
        );
        assert!(!request.skip_install_extensions);
    }

    #[test]
    fn config_supplies_final_name_and_skip_flag() {
        let mut config = AppConfig::default();
        config.package.final_name = Some("orders-1.2".into());
        config.package.skip_install_extensions = true;
        config.defaults.staging_directory = PathBuf::from("out");

        let request =
            build_request(parse(&["-b", "/work/orders", "-a", "orders"]), &config).unwrap();

        assert_eq!(request.final_name, "orders-1.2");
        assert_eq!(request.staging_dir, PathBuf::from("/work/orders/out/orders"));
        assert!(request.skip_install_extensions);
    }

    #[test]
    fn explicit_flags_win() {
        let mut config = AppConfig::default();
        config.package.final_name = Some("ignored".into());

        let request = build_request(
            parse(&[
                "-b",
                "/work/orders",
                "-a",
                "orders",
                "-f",
                "orders-2.0",
                "--staging-dir",
                "/tmp/stage",
                "--source-dir",
                "/work/orders/java",
            ]),
            &config,
        )
        .unwrap();

        assert_eq!(request.final_name, "orders-2.0");
        assert_eq!(request.staging_dir, PathBuf::from("/tmp/stage"));
        assert_eq!(request.source_dir, PathBuf::from("/work/orders/java"));
    }

    #[test]
    fn json_outcome_names_the_skip_reason() {
        let value = outcome_json(&PackageOutcome::NoFunctions);
        assert_eq!(value["status"], "no-functions");

        let report = azkit_core::application::PackageReport {
            staging_dir: PathBuf::from("/stage"),
            functions: vec!["HttpExample".into()],
            libraries: vec![],
            extensions: ExtensionDecision::Skip(SkipReason::HttpOnly),
        };
        let value = outcome_json(&PackageOutcome::Packaged(report));
        assert_eq!(value["functions"][0], "HttpExample");
        assert_eq!(
            value["extensions"],
            "Skip install Function extension for HTTP Trigger Functions"
        );
    }
}
