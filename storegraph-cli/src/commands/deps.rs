//! `storegraph deps` command handler

use std::collections::BTreeSet;
use std::io::Write;

use serde::Serialize;
use tracing::info;

use storegraph_core::config::StoreGraphConfig;
use storegraph_engine::{
    ComponentInventory, DependencyKind, GraphEngineConfig, NixStore, StoreQuery,
};

use crate::cli::DepsArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `deps` command against the system store.
pub fn execute(
    args: DepsArgs,
    config: &StoreGraphConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let store = NixStore::from_core(&config.store);
    let report = inventory(&store, &args, config)?;
    writer.render(&report)?;
    Ok(())
}

/// Build the component inventory and convert it to a report.
pub fn inventory<S: StoreQuery + ?Sized>(
    store: &S,
    args: &DepsArgs,
    config: &StoreGraphConfig,
) -> Result<DepsReport, CliError> {
    let engine_config = GraphEngineConfig::from_core(config);
    engine_config.validate()?;
    if args.depth == Some(0) {
        return Err(CliError::Command("--depth must be greater than 0".to_owned()));
    }

    let target = super::resolve_target(&args.target);
    let inv = if args.combined {
        ComponentInventory::build_combined(store, &target, args.depth, engine_config.force_realise)?
    } else {
        ComponentInventory::build(
            store,
            &target,
            DependencyKind::from_buildtime(args.buildtime),
            args.depth,
            engine_config.force_realise,
        )?
    };
    info!(
        target_path = %target,
        components = inv.len(),
        edges = inv.edges.len(),
        "built component inventory"
    );
    Ok(DepsReport::from(&inv))
}

/// Component inventory report.
#[derive(Serialize)]
pub struct DepsReport {
    pub target: String,
    pub target_deriver: String,
    pub kinds: BTreeSet<DependencyKind>,
    pub edges: usize,
    pub components: Vec<ComponentEntry>,
}

/// One component with its direct dependencies.
#[derive(Serialize)]
pub struct ComponentEntry {
    pub name: String,
    pub version: String,
    /// Package identity; absent for raw sources
    pub identity: Option<String>,
    pub store_path: String,
    pub outputs: Vec<String>,
    pub depends_on: Vec<String>,
}

impl From<&ComponentInventory> for DepsReport {
    fn from(inv: &ComponentInventory) -> Self {
        let components = inv
            .components
            .iter()
            .map(|c| ComponentEntry {
                name: c.name.clone(),
                version: c.version.clone(),
                identity: c.identity.as_ref().map(|i| i.to_string()),
                store_path: c.store_path.clone(),
                outputs: c.outputs.iter().cloned().collect(),
                depends_on: c
                    .identity
                    .as_ref()
                    .map(|i| inv.dependencies_of(i).iter().map(|d| d.to_string()).collect())
                    .unwrap_or_default(),
            })
            .collect();
        Self {
            target: inv.target.clone(),
            target_deriver: inv.target_deriver.clone(),
            kinds: inv.kinds.clone(),
            edges: inv.edges.len(),
            components,
        }
    }
}

impl Render for DepsReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let kinds: Vec<String> = self.kinds.iter().map(|k| k.to_string()).collect();
        writeln!(w, "Target: {}", self.target.bold())?;
        writeln!(w, "Deriver: {}", self.target_deriver)?;
        writeln!(
            w,
            "Dependencies: {} ({} components, {} edges)",
            kinds.join(" + "),
            self.components.len(),
            self.edges
        )?;
        writeln!(w)?;

        writeln!(w, "{:<40} {:<40} Depends on", "Component", "Identity")?;
        writeln!(w, "{}", "-".repeat(100))?;
        for c in &self.components {
            let identity = c.identity.as_deref().unwrap_or("-");
            let deps = if c.depends_on.is_empty() {
                "-".dimmed().to_string()
            } else {
                c.depends_on.join(", ")
            };
            writeln!(w, "{:<40} {:<40} {}", c.name, identity, deps)?;
        }
        Ok(())
    }
}
