use clap::{Parser, ValueEnum};
use keiro::prelude::*;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Instant;

// --- Document Deserialization Structs (Input Format Specific) ---
// These structs match the editor's saved flow document and are only used here for conversion.

#[derive(Deserialize)]
struct RawFlow {
    id: String,
    nodes: Vec<RawNode>,
    edges: Vec<RawEdge>,
}

#[derive(Deserialize)]
struct RawNode {
    id: String,
    data: RawNodeWrapper,
}

#[derive(Deserialize)]
struct RawNodeWrapper {
    #[serde(alias = "nodeData")]
    node_data: RawNodeData,
}

#[derive(Deserialize)]
struct RawNodeData {
    #[serde(alias = "componentId")]
    component_id: String,
    #[serde(default)]
    parameters: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    branches: Vec<RawBranch>,
}

#[derive(Deserialize)]
struct RawBranch {
    id: String,
    #[serde(default)]
    condition: Option<String>,
}

#[derive(Deserialize)]
struct RawEdge {
    source: String,
    #[serde(default, alias = "sourceHandle")]
    source_handle: Option<String>,
    target: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DocumentFormat {
    Json,
    Yaml,
}

// --- Converter Implementation ---
// This implements the conversion from the editor document to Keiro's canonical FlowDefinition.

impl IntoFlow for RawFlow {
    fn into_flow(self) -> std::result::Result<FlowDefinition, FlowConversionError> {
        if self.id.trim().is_empty() {
            return Err(FlowConversionError::ValidationError(
                "flow document has no id".to_string(),
            ));
        }

        let nodes = self
            .nodes
            .into_iter()
            .map(|raw_node| FlowNodeDefinition {
                id: raw_node.id,
                component_id: raw_node.data.node_data.component_id,
                parameters: raw_node.data.node_data.parameters,
                children: raw_node
                    .data
                    .node_data
                    .branches
                    .into_iter()
                    .map(|b| BranchDefinition {
                        id: b.id,
                        condition: b.condition,
                    })
                    .collect(),
            })
            .collect();

        let edges = self
            .edges
            .into_iter()
            .map(|raw_edge| FlowEdgeDefinition {
                source: raw_edge.source,
                source_output: raw_edge.source_handle,
                target: raw_edge.target,
            })
            .collect();

        Ok(FlowDefinition {
            id: self.id,
            nodes,
            edges,
        })
    }
}

/// Compiles a workflow flow document into a nested execution plan
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the flow document
    flow_path: String,

    /// Document format. Detected from the file extension when omitted
    #[arg(short, long, value_enum)]
    format: Option<DocumentFormat>,

    /// Write the compiled flow artifact to this path
    #[arg(short, long)]
    output: Option<String>,

    /// Maximum branch nesting before compilation fails
    #[arg(long)]
    max_depth: Option<usize>,

    /// Print the compiled route as JSON instead of a tree
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let total_start = Instant::now();

    // --- 1. File Loading ---
    let document = fs::read_to_string(&cli.flow_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read flow file '{}': {}",
            &cli.flow_path, e
        ))
    });

    // --- 2. Parsing and Conversion ---
    let format = cli
        .format
        .unwrap_or_else(|| detect_format(&cli.flow_path));
    let raw_flow: RawFlow = match format {
        DocumentFormat::Json => serde_json::from_str(&document)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse flow JSON: {}", e))),
        DocumentFormat::Yaml => serde_yaml::from_str(&document)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse flow YAML: {}", e))),
    };
    let flow = raw_flow
        .into_flow()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to convert document to flow: {}", e)));
    log::info!(
        "Loaded flow '{}' with {} nodes and {} edges",
        flow.id,
        flow.nodes.len(),
        flow.edges.len()
    );

    // --- 3. Compilation ---
    let mut builder = Compiler::builder();
    if let Some(depth) = cli.max_depth {
        builder = builder.with_max_depth(depth);
    }
    let compiler = builder.build();

    let compile_start = Instant::now();
    let route = compiler
        .compile(&flow)
        .unwrap_or_else(|e| exit_with_error(&format!("Compilation failed: {}", e)));
    let compile_duration = compile_start.elapsed();

    // --- 4. Output ---
    if cli.json {
        let json = serde_json::to_string_pretty(&route)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize route: {}", e)));
        println!("{}", json);
    } else {
        println!("{}", DisplayRoute { route: &route });
        println!("Chain: {}", route.chain());
    }

    if let Some(path) = &cli.output {
        CompiledFlow::new(route)
            .save(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to save artifact: {}", e)));
        println!("Saved compiled flow to '{}'", path);
    }

    println!("\n--- Performance Summary ---");
    println!("Compilation:      {:?}", compile_duration);
    println!("Total Execution:  {:?}", total_start.elapsed());
}

fn detect_format(path: &str) -> DocumentFormat {
    match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => DocumentFormat::Yaml,
        _ => DocumentFormat::Json,
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
