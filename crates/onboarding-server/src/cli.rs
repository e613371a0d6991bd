//! Command line definition

use clap::{Arg, ArgAction, Command};

fn id_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).value_name("ID").help(help).required(true)
}

fn actor_arg() -> Arg {
    Arg::new("by")
        .long("by")
        .value_name("USER")
        .help("Acting user")
        .env("ONBOARDING_USER")
        .default_value("system")
}

pub fn build_cli() -> Command {
    Command::new("onboarding")
        .version(env!("CARGO_PKG_VERSION"))
        .about("HR onboarding workflow engine")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("Configuration file path")
                .global(true)
                .default_value("/app/config/onboarding.json"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .help("Data directory for workflow files (overrides storage.data_dir)")
                .global(true),
        )
        .subcommand(
            Command::new("initiate")
                .about("Start onboarding for an employee")
                .arg(
                    Arg::new("employee")
                        .long("employee")
                        .value_name("ID")
                        .help("Employee ID")
                        .required(true),
                )
                .arg(
                    Arg::new("template")
                        .long("template")
                        .value_name("NAME")
                        .help("Template name")
                        .default_value("generic"),
                )
                .arg(actor_arg()),
        )
        .subcommand(Command::new("show").about("Show a workflow with its steps").arg(id_arg("workflow", "Workflow ID")))
        .subcommand(
            Command::new("list")
                .about("List workflows")
                .arg(Arg::new("status").long("status").value_name("STATUS").help("Filter by workflow status"))
                .arg(Arg::new("employee").long("employee").value_name("ID").help("Filter by employee")),
        )
        .subcommand(Command::new("cancel").about("Cancel a workflow").arg(id_arg("workflow", "Workflow ID")))
        .subcommand(Command::new("start-step").about("Start a step").arg(id_arg("step", "Step ID")))
        .subcommand(
            Command::new("complete-step")
                .about("Complete a step")
                .arg(id_arg("step", "Step ID"))
                .arg(actor_arg()),
        )
        .subcommand(
            Command::new("skip-step")
                .about("Skip a step")
                .arg(id_arg("step", "Step ID"))
                .arg(actor_arg())
                .arg(
                    Arg::new("reason")
                        .long("reason")
                        .value_name("TEXT")
                        .help("Why the step is skipped")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("trigger-docusign")
                .about("Send a document for signature")
                .arg(id_arg("step", "Step ID"))
                .arg(
                    Arg::new("document-type")
                        .long("document-type")
                        .value_name("TYPE")
                        .help("Document to sign")
                        .default_value("offer_letter"),
                ),
        )
        .subcommand(
            Command::new("trigger-background-check")
                .about("Start a background check")
                .arg(id_arg("step", "Step ID"))
                .arg(
                    Arg::new("check-type")
                        .long("check-type")
                        .value_name("TYPE")
                        .help("Check to run (repeatable)")
                        .action(ArgAction::Append)
                        .required(true),
                )
                .arg(
                    Arg::new("provider")
                        .long("provider")
                        .value_name("NAME")
                        .help("Provider name (default provider when omitted)"),
                ),
        )
        .subcommand(
            Command::new("trigger-doc-search")
                .about("Search for documents and link them to a step")
                .arg(id_arg("step", "Step ID"))
                .arg(
                    Arg::new("query")
                        .long("query")
                        .value_name("TEXT")
                        .help("Search query")
                        .required(true),
                )
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_name("N")
                        .help("Maximum number of documents")
                        .value_parser(clap::value_parser!(u32)),
                ),
        )
        .subcommand(
            Command::new("retry-integration")
                .about("Retry a failed integration")
                .arg(id_arg("integration", "Integration ID")),
        )
        .subcommand(
            Command::new("integrations")
                .about("List integration records of a workflow, or every retryable one")
                .arg(Arg::new("workflow").value_name("ID").help("Workflow ID"))
                .arg(
                    Arg::new("retryable")
                        .long("retryable")
                        .help("List failed integrations that may be retried")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("workflow"),
                ),
        )
        .subcommand(
            Command::new("documents")
                .about("List documents linked to a workflow")
                .arg(id_arg("workflow", "Workflow ID")),
        )
        .subcommand(
            Command::new("raise-exception")
                .about("Flag a workflow for attention")
                .arg(id_arg("workflow", "Workflow ID"))
                .arg(Arg::new("step").long("step").value_name("ID").help("Step ID"))
                .arg(
                    Arg::new("type")
                        .long("type")
                        .value_name("TYPE")
                        .help("Exception type")
                        .default_value("manual"),
                )
                .arg(
                    Arg::new("severity")
                        .long("severity")
                        .value_name("LEVEL")
                        .help("Severity")
                        .default_value("medium"),
                )
                .arg(
                    Arg::new("title")
                        .long("title")
                        .value_name("TEXT")
                        .help("Short title")
                        .required(true),
                )
                .arg(
                    Arg::new("description")
                        .long("description")
                        .value_name("TEXT")
                        .help("Details")
                        .default_value(""),
                ),
        )
        .subcommand(
            Command::new("resolve-exception")
                .about("Resolve an exception")
                .arg(id_arg("exception", "Exception ID"))
                .arg(actor_arg())
                .arg(
                    Arg::new("notes")
                        .long("notes")
                        .value_name("TEXT")
                        .help("Resolution notes")
                        .default_value(""),
                ),
        )
        .subcommand(
            Command::new("exceptions")
                .about("List exceptions of a workflow")
                .arg(id_arg("workflow", "Workflow ID"))
                .arg(
                    Arg::new("open")
                        .long("open")
                        .help("Only unresolved exceptions")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("progress").about("Show workflow progress").arg(id_arg("workflow", "Workflow ID")))
        .subcommand(
            Command::new("advance")
                .about("Move a workflow to its next stage")
                .arg(id_arg("workflow", "Workflow ID")),
        )
        .subcommand(Command::new("templates").about("List onboarding templates"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_parse_initiate_defaults() {
        let matches = build_cli()
            .try_get_matches_from(["onboarding", "initiate", "--employee", "emp-1"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();

        assert_eq!(name, "initiate");
        assert_eq!(sub.get_one::<String>("template").map(String::as_str), Some("generic"));
        assert_eq!(
            matches.get_one::<String>("config").map(String::as_str),
            Some("/app/config/onboarding.json")
        );
    }

    #[test]
    fn test_parse_repeated_check_types() {
        let matches = build_cli()
            .try_get_matches_from([
                "onboarding",
                "--data-dir",
                "/tmp/onboarding",
                "trigger-background-check",
                "step-1",
                "--check-type",
                "criminal",
                "--check-type",
                "employment",
            ])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();

        let checks: Vec<&String> = sub.get_many::<String>("check-type").unwrap().collect();
        assert_eq!(checks, ["criminal", "employment"]);
        assert_eq!(
            matches.get_one::<String>("data-dir").map(String::as_str),
            Some("/tmp/onboarding")
        );
    }

    #[test]
    fn test_skip_requires_reason() {
        let result = build_cli().try_get_matches_from(["onboarding", "skip-step", "step-1"]);
        assert!(result.is_err());
    }
}
