//! `strata` command line
//!
//! Loads a group tree (YAML) and an optional dispatch configuration (TOML),
//! then runs stack commands against a dry-run provider, prints dependency
//! order, resolves tagged deferred values, or renders external names.

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strata_dispatch::{
    AggregateResult, DependencyGraph, DispatchConfig, DryRunProvider, FanoutDispatcher,
    StackCommands, StackGroup,
};
use strata_group::naming::external_stack_name;
use strata_group::{GroupPath, GroupSpec, GroupTree};
use strata_walk::{resolve_tagged, StaticResolver};
use tracing_subscriber::EnvFilter;

const DEFAULT_TAG: &str = "stack_output";

fn cli() -> Command {
    let tree_arg = Arg::new("tree")
        .long("tree")
        .global(true)
        .value_parser(value_parser!(PathBuf))
        .help("Group tree document (YAML)");
    let config_arg = Arg::new("config")
        .long("config")
        .global(true)
        .value_parser(value_parser!(PathBuf))
        .help("Dispatch configuration (TOML)");
    let group_arg = Arg::new("group")
        .long("group")
        .value_parser(value_parser!(GroupPath))
        .help("Only dispatch over this group and its descendants");

    Command::new("strata")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Dispatch stack commands over hierarchical stack groups")
        .subcommand_required(true)
        .arg(tree_arg)
        .arg(config_arg)
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("describe")
                .about("Report the status of every stack")
                .arg(group_arg.clone()),
        )
        .subcommand(
            Command::new("launch")
                .about("Launch every stack (dry run)")
                .arg(group_arg.clone()),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete every stack (dry run)")
                .arg(group_arg),
        )
        .subcommand(
            Command::new("order")
                .about("Print dependency-respecting launch order")
                .arg(
                    Arg::new("depends")
                        .long("depends")
                        .action(ArgAction::Append)
                        .help("Stack dependencies as `stack=dep1,dep2`"),
                ),
        )
        .subcommand(
            Command::new("resolve")
                .about("Replace tagged deferred values in a YAML document")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("YAML document to resolve"),
                )
                .arg(
                    Arg::new("value")
                        .long("value")
                        .action(ArgAction::Append)
                        .help("Known value as `stack::Key=value`"),
                )
                .arg(
                    Arg::new("tag")
                        .long("tag")
                        .default_value(DEFAULT_TAG)
                        .help("Tag of deferred values"),
                ),
        )
        .subcommand(
            Command::new("external-name")
                .about("Render the provider-side name of a stack")
                .arg(Arg::new("project").required(true))
                .arg(Arg::new("stack").required(true)),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("failed to install tracing subscriber: {e}");
    }
}

fn load_tree(matches: &ArgMatches) -> anyhow::Result<GroupTree> {
    let Some(path) = matches.get_one::<PathBuf>("tree") else {
        bail!("--tree is required for this command");
    };
    let source = read(path)?;
    GroupSpec::from_yaml_str(&source)
        .and_then(GroupSpec::into_tree)
        .with_context(|| format!("invalid group tree in {}", path.display()))
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<DispatchConfig> {
    match matches.get_one::<PathBuf>("config") {
        None => Ok(DispatchConfig::default()),
        Some(path) => DispatchConfig::from_toml_str(&read(path)?)
            .with_context(|| format!("invalid dispatch configuration in {}", path.display())),
    }
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

fn bind(
    tree: &GroupTree,
    scope: Option<&GroupPath>,
    provider: Arc<DryRunProvider>,
    dispatcher: FanoutDispatcher,
) -> anyhow::Result<StackGroup<DryRunProvider>> {
    match scope {
        None => Ok(StackGroup::new(tree, provider, dispatcher)),
        Some(path) => StackGroup::scoped(tree, path, provider, dispatcher)
            .with_context(|| format!("no group `{path}` in tree")),
    }
}

fn print_aggregate<T: serde::Serialize>(result: &AggregateResult<T>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&result.sorted())?);
    Ok(())
}

/// Split `stack::Key=value` into key and value
fn parse_value(raw: &str) -> anyhow::Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => bail!("expected `key=value`, got `{raw}`"),
    }
}

async fn run(matches: ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some((command @ ("describe" | "launch" | "delete"), args)) => {
            let tree = load_tree(&matches)?;
            let dispatcher = FanoutDispatcher::new(load_config(&matches)?);
            let provider = Arc::new(DryRunProvider::new());
            let group = bind(&tree, args.get_one::<GroupPath>("group"), provider, dispatcher)?;
            tracing::info!("Running {} on `{}`", command, group.target().path());

            let result = match command {
                "launch" => group.launch().await?,
                "delete" => group.delete().await?,
                _ => group.describe().await?,
            };
            print_aggregate(&result)
        }
        Some(("order", args)) => {
            let tree = load_tree(&matches)?;
            let dispatcher = FanoutDispatcher::new(load_config(&matches)?);
            let mut provider = DryRunProvider::new();
            for raw in args.get_many::<String>("depends").into_iter().flatten() {
                let (stack, on) = parse_value(raw)?;
                provider = provider.with_dependencies(stack, on.split(',').filter(|d| !d.is_empty()));
            }
            let group = StackGroup::new(&tree, Arc::new(provider), dispatcher);

            let dependencies = group.dependencies().await?;
            let graph = DependencyGraph::from_aggregate(&dependencies)?;
            for stack in graph.launch_order() {
                println!("{stack}");
            }
            Ok(())
        }
        Some(("resolve", args)) => {
            let Some(file) = args.get_one::<PathBuf>("file") else {
                bail!("missing document");
            };
            let tag = args
                .get_one::<String>("tag")
                .map_or(DEFAULT_TAG, String::as_str);

            let mut resolver = StaticResolver::new(tag);
            for raw in args.get_many::<String>("value").into_iter().flatten() {
                let (key, value) = parse_value(raw)?;
                resolver.insert(key, value);
            }

            let mut document: serde_yaml::Value = serde_yaml::from_str(&read(file)?)
                .with_context(|| format!("invalid YAML in {}", file.display()))?;
            let resolved = resolve_tagged(&mut document, &resolver)?;
            tracing::info!("Resolved {} deferred values in {}", resolved, file.display());

            print!("{}", serde_yaml::to_string(&document)?);
            Ok(())
        }
        Some(("external-name", args)) => {
            let project = args.get_one::<String>("project").map_or("", String::as_str);
            let stack = args.get_one::<String>("stack").map_or("", String::as_str);
            println!("{}", external_stack_name(project, stack));
            Ok(())
        }
        _ => bail!("unknown command"),
    }
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json-logs"));

    if let Err(e) = run(matches).await {
        tracing::error!("{:#}", e);
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn parses_scoped_launch() {
        let matches = cli()
            .try_get_matches_from(["strata", "--tree", "groups.yaml", "launch", "--group", "dev/ew1"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "launch");
        assert_eq!(
            args.get_one::<GroupPath>("group").map(ToString::to_string),
            Some("dev/ew1".to_string())
        );
    }

    #[test]
    fn resolve_collects_values() {
        let matches = cli()
            .try_get_matches_from([
                "strata", "resolve", "doc.yaml", "--value", "vpc::VpcId=vpc-1", "--value", "db::Port=5432",
            ])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        let values: Vec<&String> = args.get_many::<String>("value").unwrap().collect();
        assert_eq!(values.len(), 2);
        assert_eq!(args.get_one::<String>("tag").unwrap(), DEFAULT_TAG);
    }

    #[test]
    fn value_pairs() {
        assert_eq!(parse_value("vpc::VpcId=vpc-1").unwrap(), ("vpc::VpcId", "vpc-1"));
        assert_eq!(parse_value("k=a=b").unwrap(), ("k", "a=b"));
        assert!(parse_value("novalue").is_err());
        assert!(parse_value("=x").is_err());
    }

    #[test]
    fn loads_tree_and_config_files() {
        let dir = tempfile::tempdir().unwrap();
        let tree_path = dir.path().join("groups.yaml");
        let config_path = dir.path().join("dispatch.toml");
        std::fs::write(&tree_path, "name: dev\ngroups:\n  - name: ew1\n    stacks: [vpc]\n").unwrap();
        std::fs::write(&config_path, "failure_policy = \"cancel_siblings\"\n").unwrap();

        let matches = cli()
            .try_get_matches_from([
                "strata",
                "--tree",
                tree_path.to_str().unwrap(),
                "--config",
                config_path.to_str().unwrap(),
                "describe",
            ])
            .unwrap();
        let tree = load_tree(&matches).unwrap();
        assert_eq!(tree.stack_count(), 1);
        assert_eq!(
            load_config(&matches).unwrap().failure_policy,
            strata_dispatch::FailurePolicy::CancelSiblings
        );
    }

    #[test]
    fn config_defaults_without_flag() {
        let matches = cli().try_get_matches_from(["strata", "order"]).unwrap();
        assert_eq!(load_config(&matches).unwrap(), DispatchConfig::default());
        assert!(load_tree(&matches).is_err());
    }
}
