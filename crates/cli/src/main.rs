#![forbid(unsafe_code)]

mod config_loader;
mod report;

use std::path::PathBuf;

use config_loader::FlagOverride;
use lore_core::Config;
use lore_store::{Archive, DeltaQueue, InsightStore, KnowledgeStore, TraceStore};

const EXIT_OK: i32 = 0;
const EXIT_USAGE: i32 = 2;
const EXIT_RUNTIME: i32 = 3;
const EXIT_NOT_FOUND: i32 = 4;
const EXIT_PARSE: i32 = 7;

fn usage() -> &'static str {
    "lore — self-improving context engine pipeline wrapper\n\n\
USAGE:\n\
  lore cycle [--root DIR] [--config PATH] [--json] [--set KEY=VALUE]...\n\n\
  cycle   run one learning cycle (reflect -> curate -> merge -> evaluate)\n\n\
OPTIONS:\n\
  --root DIR          working directory artifact paths resolve against (default: cwd)\n\
  --config PATH        project-local config file (default: <root>/lore.toml)\n\
  --json                emit a single JSON object instead of human-readable lines\n\
  --set KEY=VALUE       override a config key (dotted path, e.g. learning.confidence_min=0.9)\n"
}

struct Invocation {
    root: PathBuf,
    config_path: Option<PathBuf>,
    json: bool,
    overrides: Vec<FlagOverride>,
}

fn parse_args() -> Result<(String, Invocation), String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print!("{}", usage());
        std::process::exit(EXIT_OK);
    }
    let command = args.first().cloned().ok_or_else(|| format!("missing command\n\n{}", usage()))?;

    let mut root: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut json = false;
    let mut overrides = Vec::new();

    let mut i = 1usize;
    while i < args.len() {
        match args[i].as_str() {
            "--root" => {
                i += 1;
                let v = args.get(i).ok_or("--root requires DIR")?;
                root = Some(PathBuf::from(v));
            }
            "--config" => {
                i += 1;
                let v = args.get(i).ok_or("--config requires PATH")?;
                config_path = Some(PathBuf::from(v));
            }
            "--json" => json = true,
            "--set" => {
                i += 1;
                let v = args.get(i).ok_or("--set requires KEY=VALUE")?;
                let (key, value) = v.split_once('=').ok_or("--set requires KEY=VALUE")?;
                overrides.push(FlagOverride {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
            other => return Err(format!("unknown arg: {other}\n\n{}", usage())),
        }
        i += 1;
    }

    let root = root.unwrap_or_else(|| PathBuf::from("."));
    Ok((
        command,
        Invocation {
            root,
            config_path,
            json,
            overrides,
        },
    ))
}

fn resolve(root: &std::path::Path, relative: &str) -> PathBuf {
    let candidate = PathBuf::from(relative);
    if candidate.is_absolute() {
        candidate
    } else {
        root.join(candidate)
    }
}

fn exit_code_for(code: &str) -> i32 {
    match code {
        "NOT_FOUND" => EXIT_NOT_FOUND,
        "PARSE_ERROR" => EXIT_PARSE,
        _ => EXIT_RUNTIME,
    }
}

fn run_cycle_command(invocation: &Invocation) -> Result<report::CycleReport, (String, &'static str)> {
    let config_path = invocation
        .config_path
        .clone()
        .unwrap_or_else(|| invocation.root.join("lore.toml"));
    let config: Config = config_loader::load_config(&config_path, &invocation.overrides)
        .map_err(|err| (err.to_string(), "PARSE_ERROR"))?;

    let agents_path = resolve(&invocation.root, &config.agents_path);
    let insights_path = resolve(&invocation.root, &config.insights_path);
    let traces_path = resolve(&invocation.root, &config.traces_path);
    let delta_queue_path = resolve(&invocation.root, &config.delta_queue_path);
    let archive_path = resolve(&invocation.root, &config.trace_retention.archive_path);

    let store = KnowledgeStore::new(&invocation.root, agents_path);
    let queue = DeltaQueue::new(delta_queue_path);
    let insights = InsightStore::new(insights_path);
    let traces = TraceStore::new(traces_path, &archive_path);
    let archive = Archive::new(archive_path);

    let ctx = lore_engine::CycleContext {
        store: &store,
        queue: &queue,
        insights: &insights,
        traces: &traces,
        archive: &archive,
        config: &config,
        harmful_archive_threshold: config.learning.harmful_archive_threshold,
    };

    let now = lore_core::time::now_rfc3339();
    let summary = lore_engine::run_cycle(&ctx, &now).map_err(|err| (err.to_string(), err.code()))?;
    Ok(report::CycleReport::from(summary))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (command, invocation) = match parse_args() {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(EXIT_USAGE);
        }
    };

    let json = invocation.json;
    let result = match command.as_str() {
        "cycle" => run_cycle_command(&invocation),
        other => {
            eprintln!("unknown command: {other}\n\n{}", usage());
            std::process::exit(EXIT_USAGE);
        }
    };

    match result {
        Ok(report) => {
            if json {
                println!("{}", serde_json::to_string(&report).unwrap());
            } else {
                report.print_human();
            }
            std::process::exit(EXIT_OK);
        }
        Err((message, code)) => {
            if json {
                println!("{}", serde_json::json!({ "error": { "code": code, "message": message } }));
            } else {
                eprintln!("error [{code}]: {message}");
            }
            std::process::exit(exit_code_for(code));
        }
    }
}
