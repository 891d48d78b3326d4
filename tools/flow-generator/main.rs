use clap::Parser;
use keiro::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::fs;

/// Plain components the generator picks from.
const PLAIN_COMPONENTS: [&str; 6] = ["script", "transform", "filter", "delay", "log", "http-request"];

/// A CLI tool to generate random nested flow documents for the Keiro compiler
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_flow.json")]
    output: String,

    /// Seed for reproducible output. A random seed is used when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum nesting of choice and parallel structures
    #[arg(long, default_value_t = 3)]
    depth: usize,

    /// Maximum number of branches per structure
    #[arg(long, default_value_t = 3)]
    width: usize,

    /// Number of top-level stages between the start and end nodes
    #[arg(long, default_value_t = 4)]
    stages: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.width < 2 {
        eprintln!("Error: --width ({}) must be at least 2", cli.width);
        std::process::exit(1);
    }

    let seed = cli.seed.unwrap_or_else(rand::random);
    println!(
        "Generating flow (seed {}, depth {}, width {}, stages {})...",
        seed, cli.depth, cli.width, cli.stages
    );

    let mut generator = FlowGenerator::new(seed, cli.width);
    let flow = generator.generate(&format!("generated-{}", seed), cli.depth, cli.stages);

    println!(
        "-> Generated {} nodes and {} edges.",
        flow.nodes.len(),
        flow.edges.len()
    );

    // Compile once so a broken generator is caught here, not downstream.
    match Compiler::default().compile(&flow) {
        Ok(route) => println!("-> Compiles to {} top-level steps.", route.steps.len()),
        Err(e) => println!("-> Warning: generated flow does not compile: {}", e),
    }

    let json_output = serde_json::to_string_pretty(&flow)?;
    fs::write(&cli.output, json_output)?;

    println!("Successfully generated and saved flow to '{}'", cli.output);

    Ok(())
}

struct FlowGenerator {
    rng: StdRng,
    width: usize,
    nodes: Vec<FlowNodeDefinition>,
    edges: Vec<FlowEdgeDefinition>,
    counter: usize,
}

impl FlowGenerator {
    fn new(seed: u64, width: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            width,
            nodes: Vec::new(),
            edges: Vec::new(),
            counter: 0,
        }
    }

    fn generate(&mut self, id: &str, depth: usize, stages: usize) -> FlowDefinition {
        let mut tail = self.node("start", Vec::new());
        for _ in 0..stages {
            tail = self.segment(&tail, depth);
        }
        let end = self.node("end", Vec::new());
        self.link(&tail, &end);

        FlowDefinition {
            id: id.to_string(),
            nodes: std::mem::take(&mut self.nodes),
            edges: std::mem::take(&mut self.edges),
        }
    }

    /// Appends a segment after `from` and returns the id of its last node.
    fn segment(&mut self, from: &str, depth: usize) -> String {
        if depth == 0 || self.rng.random_bool(0.3) {
            return self.sequence(from);
        }
        if self.rng.random_bool(0.5) {
            self.parallel(from, depth)
        } else {
            self.choice(from, depth)
        }
    }

    fn sequence(&mut self, from: &str) -> String {
        let length = self.rng.random_range(1..=3);
        let mut tail = from.to_string();
        for _ in 0..length {
            let next = self.plain();
            self.link(&tail, &next);
            tail = next;
        }
        tail
    }

    fn parallel(&mut self, from: &str, depth: usize) -> String {
        let width = self.rng.random_range(2..=self.width);
        let mut tails = Vec::with_capacity(width);
        for _ in 0..width {
            let head = self.plain();
            self.link(from, &head);
            tails.push(self.segment(&head, depth - 1));
        }
        self.merge(&tails)
    }

    fn choice(&mut self, from: &str, depth: usize) -> String {
        let width = self.rng.random_range(2..=self.width);
        let id = self.next_id();
        let with_otherwise = self.rng.random_bool(0.7);

        let children: Vec<BranchDefinition> = (0..width)
            .map(|i| {
                let branch_id = format!("{}-b{}", id, i);
                if with_otherwise && i + 1 == width {
                    BranchDefinition::otherwise(&branch_id)
                } else {
                    BranchDefinition::when(&branch_id, &format!("input.value > {}", i * 10))
                }
            })
            .collect();
        let branch_ids: Vec<String> = children.iter().map(|c| c.id.clone()).collect();

        self.nodes.push(FlowNodeDefinition {
            id: id.clone(),
            component_id: "choice".to_string(),
            children,
            ..Default::default()
        });
        self.link(from, &id);

        let mut tails = Vec::with_capacity(width);
        for branch in branch_ids {
            let head = self.plain();
            self.edges
                .push(FlowEdgeDefinition::from_output(&id, &branch, &head));
            tails.push(self.segment(&head, depth - 1));
        }
        self.merge(&tails)
    }

    fn merge(&mut self, tails: &[String]) -> String {
        let merge = self.node("transform", Vec::new());
        for tail in tails {
            self.link(tail, &merge);
        }
        merge
    }

    fn plain(&mut self) -> String {
        let component = PLAIN_COMPONENTS[self.rng.random_range(0..PLAIN_COMPONENTS.len())];
        let parameters = vec![("weight", json!(self.rng.random_range(1u32..=100)))];
        self.node(component, parameters)
    }

    fn node(&mut self, component_id: &str, parameters: Vec<(&str, serde_json::Value)>) -> String {
        let id = self.next_id();
        self.nodes.push(FlowNodeDefinition {
            id: id.clone(),
            component_id: component_id.to_string(),
            parameters: parameters
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
            children: Vec::new(),
        });
        id
    }

    fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("n{:04}", self.counter)
    }

    fn link(&mut self, source: &str, target: &str) {
        self.edges.push(FlowEdgeDefinition::new(source, target));
    }
}
