use clap::{Parser, Subcommand};
use pipeline_preview::cycle::is_circular_reference;
use pipeline_preview::prelude::*;
use pipeline_preview::preview::{excluded_by_appoint, excluded_by_schemes};
use pipeline_preview::store::{MemorySchemeStore, MemoryTemplateStore, SchemeId, SpaceId};
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Pipeline tree preview and subprocess reference checking CLI
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Preview a pipeline tree with some task nodes skipped
    Preview(PreviewArgs),
    /// Check the subprocesses of a pipeline tree for reference cycles
    Cycle(CycleArgs),
}

#[derive(clap::Args, Debug)]
struct PreviewArgs {
    /// Path to the pipeline tree JSON file
    tree_path: String,

    /// Node ids to skip
    #[arg(short, long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Node ids to run; every other optional node is skipped
    #[arg(short, long, value_delimiter = ',', conflicts_with_all = ["exclude", "scheme_id"])]
    appoint: Option<Vec<String>>,

    /// Path to a JSON file mapping scheme ids to node id lists
    #[arg(long, requires = "scheme_id")]
    schemes: Option<String>,

    /// Execution schemes to run; nodes outside all of them are skipped
    #[arg(long, value_delimiter = ',', requires = "schemes", conflicts_with = "exclude")]
    scheme_id: Vec<SchemeId>,

    /// Fail when a requested scheme does not exist
    #[arg(long)]
    check_schemes: bool,

    /// Path to a JSON file with preview options
    #[arg(long)]
    options: Option<String>,

    /// Keep output variables even when nothing references them
    #[arg(long)]
    keep_outputs: bool,

    /// Apply the template preview hooks and print the dropped constants
    #[arg(long)]
    template: bool,

    /// Where to write the previewed tree; stdout when absent
    #[arg(short, long)]
    output: Option<String>,
}

#[derive(clap::Args, Debug)]
struct CycleArgs {
    /// Path to the pipeline tree JSON file
    tree_path: String,

    /// Path to a JSON file with `templates` and `references` lists
    #[arg(short, long)]
    references: String,

    /// Id of the template being edited
    #[arg(short, long)]
    template_id: Option<String>,

    #[arg(long)]
    space_id: SpaceId,

    #[arg(long)]
    scope_type: Option<String>,

    #[arg(long)]
    scope_value: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Preview(args) => run_preview(args),
        Command::Cycle(args) => run_cycle(args),
    }
}

fn load_tree(path: &str) -> PipelineTree {
    let document = fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read tree file '{}': {}", path, e))
    });
    document
        .as_str()
        .into_pipeline_tree()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load pipeline tree: {}", e)))
}

fn load_options(path: Option<&str>) -> PreviewOptions {
    let Some(path) = path else {
        return PreviewOptions::default();
    };
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read options file '{}': {}", path, e))
    });
    serde_json::from_str(&content)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse options JSON: {}", e)))
}

fn run_preview(args: PreviewArgs) {
    let total_start = Instant::now();
    let mut tree = load_tree(&args.tree_path);
    let activities_before = tree.activity_count();
    let gateways_before = tree.gateway_count();
    let constants_before = tree.constants.len();

    let exclude = if let Some(appoint) = &args.appoint {
        excluded_by_appoint(&tree, appoint)
    } else if let Some(schemes_path) = &args.schemes {
        let store = MemorySchemeStore::from_file(schemes_path)
            .unwrap_or_else(|e| exit_with_error(&e.to_string()));
        excluded_by_schemes(&tree, &args.scheme_id, args.check_schemes, &store)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to resolve schemes: {}", e)))
    } else {
        args.exclude.clone()
    };

    let mut options = load_options(args.options.as_deref());
    if args.keep_outputs {
        options.remove_outputs_without_refs = false;
    }
    let previewer = Previewer::builder().with_options(options).build();

    let preview_start = Instant::now();
    let report = if args.template {
        let report = previewer
            .preview_template_tree(&mut tree, &exclude)
            .unwrap_or_else(|e| exit_with_error(&format!("Preview failed: {}", e)));
        Some(report)
    } else {
        previewer
            .preview(&mut tree, &exclude)
            .unwrap_or_else(|e| exit_with_error(&format!("Preview failed: {}", e)));
        None
    };
    let preview_duration = preview_start.elapsed();

    let document = tree
        .to_json()
        .and_then(|value| {
            serde_json::to_string_pretty(&value)
                .map_err(|e| TreeConversionError::JsonParseError(e.to_string()))
        })
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize tree: {}", e)));
    match &args.output {
        Some(path) => fs::write(path, document).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to write output file '{}': {}", path, e))
        }),
        None => println!("{}", document),
    }

    eprintln!("\n--- Preview Summary ---");
    eprintln!("Excluded Nodes:       {}", exclude.len());
    eprintln!(
        "Activities:           {} -> {}",
        activities_before,
        tree.activity_count()
    );
    eprintln!(
        "Gateways:             {} -> {}",
        gateways_before,
        tree.gateway_count()
    );
    eprintln!(
        "Constants:            {} -> {}",
        constants_before,
        tree.constants.len()
    );
    if let Some(report) = report {
        let dropped: Vec<&str> = report
            .constants_not_referred
            .keys()
            .map(String::as_str)
            .collect();
        eprintln!("Not Referred:         {}", dropped.join(", "));
    }
    eprintln!("-----------------------------");
    eprintln!("Preview:              {:?}", preview_duration);
    eprintln!("Total Execution:      {:?}", total_start.elapsed());
}

fn run_cycle(args: CycleArgs) {
    let tree = load_tree(&args.tree_path);
    let store = MemoryTemplateStore::from_file(&args.references)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));

    let report = is_circular_reference(
        &tree,
        args.template_id.as_deref(),
        args.space_id,
        args.scope_type.as_deref(),
        args.scope_value.as_deref(),
        &store,
    )
    .unwrap_or_else(|e| exit_with_error(&format!("Cycle check failed: {}", e)));

    let output = serde_json::to_string_pretty(&report)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize report: {}", e)));
    println!("{}", output);
    if report.has_cycle {
        std::process::exit(2);
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
