//! Onboarding command line front end
//!
//! Wires the HTTP adapters and the file repository into the orchestrator and
//! exposes each workflow operation as a subcommand printing JSON.

mod cli;

use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use onboarding_core::{
    clients::{BackgroundCheckProviders, DocSearchClient, DocuSignClient, HttpEmployeeDirectory},
    types::{BackgroundCheckParams, DocSearchParams, DocuSignParams},
    workflow::templates,
    FileRepository, IntegrationAdapters, OnboardingConfig, OnboardingOrchestrator, RaiseExceptionRequest,
    WorkflowFilter,
};
use onboarding_types::*;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with INFO as default if RUST_LOG not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = cli::build_cli().get_matches();
    let (command, args) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("No command given. Use --help for options."))?;

    // Templates are code-defined and need no configuration
    if command == "templates" {
        return print_json(&list_templates());
    }

    let config_path = required(&matches, "config")?;
    let config = OnboardingConfig::load(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;
    log::info!("Loaded configuration from {}", config_path);

    let data_dir = matches
        .get_one::<String>("data-dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.storage.data_dir.clone());

    let orchestrator = build_orchestrator(&config, data_dir)?;
    let output = run_command(&orchestrator, command, args).await?;
    print_json(&output)
}

fn build_orchestrator(config: &OnboardingConfig, data_dir: PathBuf) -> Result<OnboardingOrchestrator> {
    let http_timeout = config.workflow.http_timeout_secs;

    let repository = Arc::new(FileRepository::new(&data_dir)?);
    log::info!("Using data directory: {}", data_dir.display());

    let employees = Arc::new(HttpEmployeeDirectory::new(config.employee_directory.clone(), http_timeout)?);
    let adapters = IntegrationAdapters {
        docusign: Arc::new(DocuSignClient::new(config.docusign.clone(), http_timeout)?),
        background_checks: BackgroundCheckProviders::from_config(&config.background_check, http_timeout)?,
        doc_search: Arc::new(DocSearchClient::new(config.doc_search.clone(), http_timeout)?),
    };

    let orchestrator = OnboardingOrchestrator::new(repository, employees, adapters)
        .with_integration_timeout(Duration::from_secs(config.workflow.integration_timeout_secs))
        .with_doc_search_limit(config.doc_search.default_limit);

    log::info!(
        "Initialized orchestrator with background-check providers: {}",
        orchestrator.background_check_providers().join(", ")
    );
    Ok(orchestrator)
}

async fn run_command(orchestrator: &OnboardingOrchestrator, command: &str, args: &ArgMatches) -> Result<Value> {
    let value = match command {
        "initiate" => {
            let employee_id = EmployeeId::new(required(args, "employee")?);
            let details = orchestrator
                .initiate_workflow(&employee_id, required(args, "template")?, actor(args)?)
                .await?;
            serde_json::to_value(details)?
        }
        "show" => serde_json::to_value(orchestrator.get_workflow(&workflow_id(args)?).await?)?,
        "list" => {
            let filter = WorkflowFilter {
                status: args
                    .get_one::<String>("status")
                    .map(|s| s.parse::<WorkflowStatus>())
                    .transpose()?,
                employee_id: args.get_one::<String>("employee").map(EmployeeId::new),
            };
            serde_json::to_value(orchestrator.list_workflows(&filter).await?)?
        }
        "cancel" => serde_json::to_value(orchestrator.cancel_workflow(&workflow_id(args)?).await?)?,
        "start-step" => serde_json::to_value(orchestrator.start_step(&step_id(args)?).await?)?,
        "complete-step" => {
            serde_json::to_value(orchestrator.complete_step(&step_id(args)?, actor(args)?).await?)?
        }
        "skip-step" => {
            let step = orchestrator
                .skip_step(&step_id(args)?, actor(args)?, required(args, "reason")?)
                .await?;
            serde_json::to_value(step)?
        }
        "trigger-docusign" => {
            let params = DocuSignParams {
                document_type: required(args, "document-type")?.to_string(),
            };
            serde_json::to_value(orchestrator.trigger_docusign(&step_id(args)?, params).await?)?
        }
        "trigger-background-check" => {
            let params = BackgroundCheckParams {
                check_types: args
                    .get_many::<String>("check-type")
                    .map(|values| values.cloned().collect())
                    .unwrap_or_default(),
                provider: args.get_one::<String>("provider").cloned(),
            };
            serde_json::to_value(orchestrator.trigger_background_check(&step_id(args)?, params).await?)?
        }
        "trigger-doc-search" => {
            let params = DocSearchParams {
                query: required(args, "query")?.to_string(),
                limit: args.get_one::<u32>("limit").copied(),
            };
            serde_json::to_value(orchestrator.trigger_doc_search(&step_id(args)?, params).await?)?
        }
        "retry-integration" => {
            let id = IntegrationId::from_string(required(args, "integration")?)?;
            serde_json::to_value(orchestrator.retry_integration(&id).await?)?
        }
        "integrations" => {
            if args.get_flag("retryable") {
                serde_json::to_value(orchestrator.retryable_integrations().await?)?
            } else {
                serde_json::to_value(orchestrator.list_integrations(&workflow_id(args)?).await?)?
            }
        }
        "documents" => serde_json::to_value(orchestrator.list_documents(&workflow_id(args)?).await?)?,
        "raise-exception" => {
            let request = RaiseExceptionRequest {
                workflow_id: workflow_id(args)?,
                step_id: args
                    .get_one::<String>("step")
                    .map(|s| StepId::from_string(s))
                    .transpose()?,
                exception_type: required(args, "type")?.parse()?,
                severity: required(args, "severity")?.parse()?,
                title: required(args, "title")?.to_string(),
                description: required(args, "description")?.to_string(),
            };
            serde_json::to_value(orchestrator.raise_exception(request).await?)?
        }
        "resolve-exception" => {
            let id = ExceptionId::from_string(required(args, "exception")?)?;
            let exception = orchestrator
                .resolve_exception(&id, actor(args)?, required(args, "notes")?)
                .await?;
            serde_json::to_value(exception)?
        }
        "exceptions" => {
            let exceptions = orchestrator
                .list_exceptions(&workflow_id(args)?, args.get_flag("open"))
                .await?;
            serde_json::to_value(exceptions)?
        }
        "progress" => serde_json::to_value(orchestrator.check_workflow_progress(&workflow_id(args)?).await?)?,
        "advance" => serde_json::to_value(orchestrator.advance_stage(&workflow_id(args)?).await?)?,
        other => return Err(anyhow!("Unknown command '{}'", other)),
    };
    Ok(value)
}

fn list_templates() -> Value {
    let templates: Vec<Value> = templates::template_names()
        .into_iter()
        .map(templates::template_for)
        .map(|template| {
            json!({
                "name": template.name,
                "expected_duration_days": template.expected_duration_days,
                "steps": template.steps.iter().map(|step| json!({
                    "name": step.name,
                    "stage": step.stage,
                    "step_type": step.step_type,
                    "integration_type": step.integration_type,
                    "depends_on": step.depends_on,
                })).collect::<Vec<_>>(),
            })
        })
        .collect();
    Value::Array(templates)
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Missing argument '{}'", name))
}

fn actor(args: &ArgMatches) -> Result<UserId> {
    Ok(UserId::new(required(args, "by")?))
}

fn workflow_id(args: &ArgMatches) -> Result<WorkflowId> {
    Ok(WorkflowId::from_string(required(args, "workflow")?)?)
}

fn step_id(args: &ArgMatches) -> Result<StepId> {
    Ok(StepId::from_string(required(args, "step")?)?)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
