use clap::Parser;
use std::path::PathBuf;

use sgc::codegen::{self, CodegenOptions};
use sgc::dot;
use sgc::graph::{BinOp, ExprGraph, NodeId};

#[derive(Debug, Clone, clap::ValueEnum)]
enum EmitStage {
    Cpp,
    Dot,
    Graph,
    BuildInfo,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Demo {
    /// A constant fed through a one-sample delay
    Delay,
    /// (frequency + sin(offset)) * frequency, sharing `frequency`
    Mix,
    /// (input + z^-1(input)) / two, a two-tap moving average
    Average,
}

#[derive(Parser, Debug)]
#[command(
    name = "sgc",
    version,
    about = "Signal Graph Compiler — lowers DSP expression graphs to per-sample C++ processing routines"
)]
struct Cli {
    /// Example graph to lower
    #[arg(value_enum, default_value_t = Demo::Delay)]
    demo: Demo,

    /// Output file path (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::Cpp)]
    emit: EmitStage,

    /// Pre-declare every issued name, not only delay state slots
    #[arg(long)]
    globals: bool,

    /// Print lowering phases on stderr
    #[arg(long)]
    verbose: bool,
}

/// Wire up one of the bundled example graphs and return its root.
fn build_demo(demo: Demo) -> (ExprGraph, NodeId) {
    let mut graph = ExprGraph::new();
    let root = match demo {
        Demo::Delay => {
            let frequency = graph.constant("frequency", 440.0);
            graph.delay(frequency)
        }
        Demo::Mix => {
            let frequency = graph.constant("frequency", 440.0);
            let offset = graph.constant("offset", 10.0);
            let sine = graph.call("sin", offset);
            let sum = graph.binary(BinOp::Add, frequency, sine);
            graph.binary(BinOp::Mul, sum, frequency)
        }
        Demo::Average => {
            let input = graph.constant("input", 0.5);
            let previous = graph.delay(input);
            let sum = graph.binary(BinOp::Add, input, previous);
            let two = graph.constant("two", 2.0);
            graph.binary(BinOp::Div, sum, two)
        }
    };
    (graph, root)
}

fn main() {
    let cli = Cli::parse();

    let (mut graph, root) = build_demo(cli.demo);
    if cli.verbose {
        eprintln!("sgc: demo  = {:?}", cli.demo);
        eprintln!("sgc: graph = {} nodes", graph.len());
        eprintln!("sgc: emit  = {:?}", cli.emit);
    }

    let text = match cli.emit {
        EmitStage::Cpp => {
            let options = CodegenOptions {
                emit_globals: cli.globals,
            };
            codegen::emit_program(&mut graph, root, &options).cpp_source
        }
        EmitStage::Dot => dot::emit_dot(&graph),
        EmitStage::Graph => graph.to_string(),
        EmitStage::BuildInfo => codegen::compute_provenance(&graph).to_json(),
    };

    match &cli.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &text) {
                eprintln!("sgc: error: {}: {}", path.display(), e);
                std::process::exit(2);
            }
            if cli.verbose {
                eprintln!("sgc: wrote {}", path.display());
            }
        }
        None => print!("{}", text),
    }
}
