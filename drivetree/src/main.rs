use std::path::PathBuf;

use anyhow::Context;
use drivetree::bootstrap::{build_orchestrator, open_index};
use drivetree::category::Category;
use drivetree::config::ServiceConfig;
use drivetree::index::FileQuery;
use drivetree::local::collect_batch;
use drivetree::logging;

const USAGE: &str = "\
Usage:
  drivetree upload <dir> --user <id>
  drivetree list --user <id> [--category <name>] [--search <text>] [--folder <id>]

Commands:
  upload   Mirror a local directory tree onto the remote drive
  list     Print uploaded file records as JSON";

#[derive(Debug, Clone, PartialEq, Eq)]
enum CliMode {
    Upload { dir: PathBuf, user: String },
    List(ListArgs),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ListArgs {
    user: String,
    category: Option<Category>,
    search: Option<String>,
    folder: Option<String>,
}

fn parse_cli_mode<I>(args: I) -> anyhow::Result<CliMode>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter().skip(1);
    let Some(command) = args.next() else {
        return Ok(CliMode::Help);
    };

    let mut positional = Vec::new();
    let mut list = ListArgs::default();
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .with_context(|| format!("{flag} requires a value"))
        };
        match arg.as_str() {
            "--user" => list.user = value("--user")?,
            "--category" => {
                let raw = value("--category")?;
                list.category = Some(
                    Category::parse(&raw).with_context(|| format!("unknown category: {raw}"))?,
                );
            }
            "--search" => list.search = Some(value("--search")?),
            "--folder" => list.folder = Some(value("--folder")?),
            "--help" | "-h" => return Ok(CliMode::Help),
            other if other.starts_with("--") => anyhow::bail!("unknown argument: {other}"),
            other => positional.push(other.to_string()),
        }
    }

    match command.as_str() {
        "--help" | "-h" | "help" => Ok(CliMode::Help),
        "upload" => {
            let [dir] = positional.as_slice() else {
                anyhow::bail!("upload expects exactly one directory");
            };
            anyhow::ensure!(!list.user.is_empty(), "--user is required");
            Ok(CliMode::Upload {
                dir: PathBuf::from(dir),
                user: list.user,
            })
        }
        "list" => {
            anyhow::ensure!(positional.is_empty(), "list takes no positional arguments");
            anyhow::ensure!(!list.user.is_empty(), "--user is required");
            Ok(CliMode::List(list))
        }
        other => anyhow::bail!("unknown command: {other}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let mode = parse_cli_mode(std::env::args())?;
    if mode == CliMode::Help {
        println!("{USAGE}");
        return Ok(());
    }

    let config = ServiceConfig::from_env();
    logging::init(&config.log_level);

    match mode {
        CliMode::Upload { dir, user } => {
            let (files, structure) = collect_batch(&dir)
                .await
                .with_context(|| format!("failed to read {}", dir.display()))?;
            let orchestrator = build_orchestrator(&config).await?;
            let results = orchestrator.upload_batch(&user, &files, &structure).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        CliMode::List(args) => {
            let index = open_index(&config)
                .await
                .context("failed to initialize index store")?;
            let files = index
                .list_files(&FileQuery {
                    user_id: args.user,
                    category: args.category,
                    search: args.search,
                    folder_id: args.folder,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&files)?);
        }
        CliMode::Help => {}
    }
    Ok(())
}
