//! `storegraph graph` command handler

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use storegraph_core::config::StoreGraphConfig;
use storegraph_engine::{
    ClosureBuilder, CsvWriter, DependencyGraph, DependencyKind, DotWriter, GraphEngineConfig,
    GraphSink, NixStore, OutputKind, StoreQuery, TableSink, Traversal, TraversalOptions,
};

use crate::cli::GraphArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `graph` command against the system store.
pub fn execute(
    args: GraphArgs,
    config: &StoreGraphConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let store = NixStore::from_core(&config.store);
    let report = {
        let mut stdout = std::io::stdout().lock();
        draw(&store, &args, config, &mut stdout)?
    };
    if let Some(report) = report {
        writer.render(&report)?;
    }
    Ok(())
}

/// Build the closure, traverse it and write the result.
///
/// DOT without `--out` goes to `stdout`. A summary report is returned only
/// when a file was written, so stdout stays a pure DOT stream otherwise.
pub fn draw<S: StoreQuery + ?Sized>(
    store: &S,
    args: &GraphArgs,
    config: &StoreGraphConfig,
    stdout: &mut dyn Write,
) -> Result<Option<GraphReport>, CliError> {
    let mut engine_config = GraphEngineConfig::from_core(config);
    if let Some(depth) = args.depth {
        engine_config.default_depth = depth;
    }
    engine_config.pathnames |= args.pathnames;
    engine_config.validate()?;

    let output = output_kind(args.out.as_deref())?;
    let options = traversal_options(args, &engine_config, output)?;
    let kind = DependencyKind::from_buildtime(args.buildtime);
    let target = super::resolve_target(&args.target);

    let closure = ClosureBuilder::new(store)
        .force_realise(engine_config.force_realise)
        .build(&target, kind)?;
    let graph = DependencyGraph::new(closure.edge_list());
    let traversal = graph.traverse(&closure.start_path, &options);

    if traversal.is_empty() {
        warn!(target_path = %target, "nothing to draw");
        return Ok(None);
    }

    let drawn = match &traversal {
        Traversal::Graph(g) => g.edges.len(),
        Traversal::Table(rows) => rows.len(),
    };

    match &args.out {
        None => {
            write_traversal(&traversal, stdout)?;
            Ok(None)
        }
        Some(path) => {
            let file = File::create(path)?;
            let mut out = BufWriter::new(file);
            write_traversal(&traversal, &mut out)?;
            out.flush()?;
            info!(path = %path.display(), "wrote {}", format_name(output));
            Ok(Some(GraphReport {
                target,
                kind,
                start_path: closure.start_path,
                max_depth: options.max_depth,
                format: format_name(output).to_owned(),
                out: path.clone(),
                drawn,
            }))
        }
    }
}

fn write_traversal(traversal: &Traversal, out: &mut dyn Write) -> Result<(), CliError> {
    match traversal {
        Traversal::Graph(graph) => DotWriter::new(out).render_graph(graph)?,
        Traversal::Table(rows) => {
            let mut sink = CsvWriter::new(out);
            sink.export_table(rows)?;
            sink.into_inner()?;
        }
    }
    Ok(())
}

/// Select the output kind from the `--out` extension.
fn output_kind(out: Option<&Path>) -> Result<OutputKind, CliError> {
    let Some(path) = out else {
        return Ok(OutputKind::Graph);
    };
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("dot") => Ok(OutputKind::Graph),
        Some(ext) if ext.eq_ignore_ascii_case("csv") => Ok(OutputKind::Table),
        _ => Err(CliError::Command(format!(
            "unsupported output file: {} (expected .dot or .csv)",
            path.display()
        ))),
    }
}

fn traversal_options(
    args: &GraphArgs,
    engine_config: &GraphEngineConfig,
    output: OutputKind,
) -> Result<TraversalOptions, CliError> {
    let mut options = TraversalOptions::with_depth(engine_config.default_depth)
        .output(output)
        .pathnames(engine_config.pathnames)
        .max_iterations(engine_config.max_iterations);
    if let Some(pattern) = &args.until {
        options = options.until(pattern)?;
    }
    if let Some(pattern) = &args.inverse {
        options = options.inverse(pattern)?;
    }
    if let Some(pattern) = &args.colorize {
        options = options.colorize(pattern)?;
    }
    Ok(options)
}

fn format_name(output: OutputKind) -> &'static str {
    match output {
        OutputKind::Graph => "dot",
        OutputKind::Table => "csv",
    }
}

/// Summary of a written graph or table.
#[derive(Serialize)]
pub struct GraphReport {
    pub target: String,
    pub kind: DependencyKind,
    pub start_path: String,
    pub max_depth: u32,
    pub format: String,
    pub out: PathBuf,
    /// Drawn edges (dot) or rows (csv)
    pub drawn: usize,
}

impl Render for GraphReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Target: {}", self.target.bold())?;
        writeln!(w, "Dependencies: {} (depth {})", self.kind, self.max_depth)?;
        writeln!(w, "Start: {}", self.start_path)?;
        let unit = if self.format == "csv" { "rows" } else { "edges" };
        writeln!(
            w,
            "Wrote {} {} to {}",
            self.drawn.to_string().green().bold(),
            unit,
            self.out.display()
        )?;
        Ok(())
    }
}
