use clap::{Parser, ValueEnum};
use colored::Colorize;
use kinetic_codegen::document::ModelDocument;
use kinetic_codegen::{generate_with, EmitOptions, Target};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TargetArg {
    /// Rust source rebuilding the model through the builder API
    Native,
    /// Standalone Rust right-hand-side function
    Function,
    /// LaTeX equations
    Latex,
}

impl From<TargetArg> for Target {
    fn from(target: TargetArg) -> Self {
        match target {
            TargetArg::Native => Target::NativeSource,
            TargetArg::Function => Target::GenericFunction,
            TargetArg::Latex => Target::Latex,
        }
    }
}

#[derive(Parser)]
#[command(name = "kinetic-codegen")]
#[command(about = "Generate code and equations from a JSON reaction-network model")]
#[command(version)]
struct Args {
    /// Path to the JSON model document
    model: PathBuf,

    /// Artifact to generate
    #[arg(short, long, value_enum, default_value = "function")]
    target: TargetArg,

    /// Write the artifact to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Name of the generated right-hand-side function
    #[arg(long, default_value = "rhs")]
    function_name: String,

    /// Name of the generated model-building function
    #[arg(long, default_value = "build_model")]
    builder_name: String,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kinetic_codegen=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("{} {}", "error:".red().bold(), e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(&args.model)
        .map_err(|e| format!("cannot read {}: {e}", args.model.display()))?;
    let model = ModelDocument::from_str(&json)?.to_model()?;

    let options = EmitOptions {
        function_name: args.function_name.clone(),
        builder_name: args.builder_name.clone(),
    };
    let artifact = generate_with(&model, args.target.into(), &options)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &artifact)?;
            eprintln!(
                "{} {} ({} bytes)",
                "wrote".green().bold(),
                path.display(),
                artifact.len()
            );
        }
        None => print!("{artifact}"),
    }
    Ok(())
}
