use clap::Parser;
use pipeline_preview::tree::IntoPipelineTree;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value, json};
use std::fs;

/// A CLI tool to generate random pipeline trees for the preview engine
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_tree.json")]
    output: String,

    /// Number of sequential segments between the start and end events
    #[arg(long, default_value_t = 10)]
    segments: usize,

    /// Maximum number of branches of a parallel segment
    #[arg(long, default_value_t = 3)]
    branches: usize,

    /// Share of activities marked optional, between 0 and 1
    #[arg(long, default_value_t = 0.7)]
    optional_ratio: f64,

    /// Number of global variables to declare
    #[arg(long, default_value_t = 8)]
    constants: usize,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if !(0.0..=1.0).contains(&cli.optional_ratio) {
        eprintln!(
            "Error: --optional-ratio ({}) must be between 0 and 1",
            cli.optional_ratio
        );
        std::process::exit(1);
    }
    if cli.branches < 1 {
        eprintln!("Error: --branches must be at least 1");
        std::process::exit(1);
    }

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    println!(
        "Generating pipeline tree ({} segments, up to {} branches)...",
        cli.segments, cli.branches
    );

    let mut generator = TreeGenerator::new(&mut rng, &cli);
    let document = generator.generate();

    // Round trip through the loader so only trees the engine accepts are written.
    let tree = document.clone().into_pipeline_tree()?;
    println!(
        "-> {} activities, {} gateways, {} flows, {} constants",
        tree.activity_count(),
        tree.gateway_count(),
        tree.flows.len(),
        tree.constants.len()
    );

    let json_output = serde_json::to_string_pretty(&document)?;
    fs::write(&cli.output, json_output)?;

    println!(
        "Successfully generated and saved pipeline tree to '{}'",
        cli.output
    );

    Ok(())
}

struct TreeGenerator<'a> {
    rng: &'a mut StdRng,
    cli: &'a Cli,
    activities: Map<String, Value>,
    gateways: Map<String, Value>,
    flows: Map<String, Value>,
    locations: Vec<Value>,
    lines: Vec<Value>,
    /// Incoming flow ids per node, filled as flows are added.
    incoming: Map<String, Value>,
    next_id: usize,
}

impl<'a> TreeGenerator<'a> {
    fn new(rng: &'a mut StdRng, cli: &'a Cli) -> Self {
        Self {
            rng,
            cli,
            activities: Map::new(),
            gateways: Map::new(),
            flows: Map::new(),
            locations: Vec::new(),
            lines: Vec::new(),
            incoming: Map::new(),
            next_id: 0,
        }
    }

    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{:04}", prefix, self.next_id)
    }

    fn generate(&mut self) -> Value {
        let start_id = self.fresh_id("start");
        let end_id = self.fresh_id("end");
        self.locate(&start_id, "startpoint");
        self.locate(&end_id, "endpoint");

        let mut tail = start_id.clone();
        for _ in 0..self.cli.segments {
            tail = if self.cli.branches > 1 && self.rng.random_bool(0.3) {
                self.parallel_segment(&tail)
            } else {
                self.activity_after(&tail)
            };
        }
        let last_flow = self.connect(&tail, &end_id);
        self.set_outgoing(&tail, &last_flow);

        let start_outgoing = self.outgoing_of(&start_id);
        let end_incoming = self.incoming_of(&end_id);
        self.apply_incoming();

        json!({
            "start_event": {"id": start_id, "type": "EmptyStartEvent", "name": "", "incoming": "", "outgoing": start_outgoing},
            "end_event": {"id": end_id, "type": "EmptyEndEvent", "name": "", "incoming": end_incoming, "outgoing": ""},
            "activities": self.activities,
            "gateways": self.gateways,
            "flows": self.flows,
            "constants": self.constants(),
            "outputs": [],
            "location": self.locations,
            "line": self.lines,
        })
    }

    /// Appends one activity after `source` and returns its id.
    fn activity_after(&mut self, source: &str) -> String {
        let id = self.fresh_id("act");
        let flow = self.connect(source, &id);
        self.set_outgoing(source, &flow);

        let optional = self.rng.random_bool(self.cli.optional_ratio);
        let data = self.component_data();
        self.activities.insert(
            id.clone(),
            json!({
                "id": id,
                "type": "ServiceActivity",
                "name": format!("task {}", id),
                "incoming": [],
                "outgoing": "",
                "optional": optional,
                "component": {"code": "job_execute", "data": data},
            }),
        );
        self.locate(&id, "tasknode");
        id
    }

    /// Appends a parallel/converge block after `source` and returns the converge id.
    fn parallel_segment(&mut self, source: &str) -> String {
        let parallel_id = self.fresh_id("pg");
        let converge_id = self.fresh_id("cg");
        let flow = self.connect(source, &parallel_id);
        self.set_outgoing(source, &flow);

        let branch_count = self.rng.random_range(2..=self.cli.branches);
        let mut parallel_outgoing = Vec::with_capacity(branch_count);
        for _ in 0..branch_count {
            let length = self.rng.random_range(1..=2);
            let first = self.activity_after(&parallel_id);
            if let Value::Array(flows) = self.incoming_of(&first) {
                parallel_outgoing.extend(flows);
            }
            let mut tail = first;
            for _ in 1..length {
                tail = self.activity_after(&tail);
            }
            let flow = self.connect(&tail, &converge_id);
            self.set_outgoing(&tail, &flow);
        }

        self.gateways.insert(
            parallel_id.clone(),
            json!({"id": parallel_id, "type": "ParallelGateway", "name": "", "incoming": [], "outgoing": parallel_outgoing}),
        );
        self.gateways.insert(
            converge_id.clone(),
            json!({"id": converge_id, "type": "ConvergeGateway", "name": "", "incoming": [], "outgoing": ""}),
        );
        self.locate(&parallel_id, "parallelgateway");
        self.locate(&converge_id, "convergegateway");
        converge_id
    }

    fn connect(&mut self, source: &str, target: &str) -> String {
        let id = self.fresh_id("line");
        self.flows.insert(
            id.clone(),
            json!({"id": id, "source": source, "target": target, "is_default": false}),
        );
        self.lines.push(json!({
            "id": id,
            "source": {"arrow": "Right", "id": source},
            "target": {"arrow": "Left", "id": target},
        }));
        if let Value::Array(ids) = self.incoming.entry(target).or_insert_with(|| json!([])) {
            ids.push(json!(id));
        }
        id
    }

    /// Records `flow` as the outgoing flow of an activity or converge gateway. Parallel
    /// gateways and the start event collect theirs from `incoming` of their targets.
    fn set_outgoing(&mut self, node_id: &str, flow: &str) {
        if let Some(activity) = self.activities.get_mut(node_id) {
            activity["outgoing"] = json!(flow);
        } else if let Some(gateway) = self.gateways.get_mut(node_id) {
            if gateway["type"] == "ConvergeGateway" {
                gateway["outgoing"] = json!(flow);
            }
        }
    }

    fn outgoing_of(&self, node_id: &str) -> Value {
        self.flows
            .values()
            .find(|flow| flow["source"] == node_id)
            .map(|flow| flow["id"].clone())
            .unwrap_or_else(|| json!(""))
    }

    fn incoming_of(&self, node_id: &str) -> Value {
        self.incoming.get(node_id).cloned().unwrap_or_else(|| json!([]))
    }

    fn apply_incoming(&mut self) {
        for (node_id, ids) in &self.incoming {
            if let Some(node) = self
                .activities
                .get_mut(node_id)
                .or_else(|| self.gateways.get_mut(node_id))
            {
                node["incoming"] = ids.clone();
            }
        }
    }

    fn locate(&mut self, node_id: &str, kind: &str) {
        let x = self.rng.random_range(0..2000);
        let y = self.rng.random_range(0..800);
        self.locations
            .push(json!({"id": node_id, "type": kind, "x": x, "y": y}));
    }

    /// Component data of one activity, referencing a random global variable.
    fn component_data(&mut self) -> Value {
        if self.cli.constants == 0 {
            return json!({"job_content": {"hook": false, "value": "echo done"}});
        }
        let var = self.rng.random_range(0..self.cli.constants);
        json!({"job_content": {"hook": false, "value": format!("echo ${{var_{}}}", var)}})
    }

    fn constants(&mut self) -> Value {
        let mut constants = Map::new();
        for index in 0..self.cli.constants {
            let key = format!("${{var_{}}}", index);
            // Some variables chain to another one to exercise transitive references.
            let value = if index > 0 && self.rng.random_bool(0.2) {
                json!(format!("prefix-${{var_{}}}", self.rng.random_range(0..index)))
            } else {
                json!(format!("value-{}", index))
            };
            constants.insert(
                key.clone(),
                json!({
                    "key": key,
                    "name": format!("var {}", index),
                    "value": value,
                    "index": index,
                    "source_type": "custom",
                    "source_info": {},
                    "show_type": "show",
                }),
            );
        }
        Value::Object(constants)
    }
}
