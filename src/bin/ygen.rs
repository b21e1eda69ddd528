//! IR Generator CLI
//!
//! Loads schema modules, runs the mapping passes and writes the IR as JSON.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use familiar_ygen::{
    generate_from_files, CompressBehaviour, IrChecksum, OutputFormat, YgenConfig, YgenError,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ygen")]
#[command(about = "Map schema modules to a directory/enum IR")]
struct Cli {
    /// Config file layered over ygen.toml and the user config
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the IR and write it as JSON
    Generate {
        #[command(flatten)]
        input: InputArgs,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Run the pipeline and report diagnostics only
    Check {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Write the effective configuration to a file
    InitConfig {
        #[arg(default_value = "ygen.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Module files (JSON)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Directories searched for imported modules
    #[arg(short = 'I', long = "search-path")]
    search_paths: Vec<PathBuf>,

    /// Compression behaviour
    #[arg(long)]
    compress: Option<CompressBehaviour>,

    /// Synthesize a root directory over all top-level entities
    #[arg(long)]
    fake_root: bool,

    /// Name of the synthesized root
    #[arg(long)]
    fake_root_name: Option<String>,

    /// Keep inline enumerations at distinct paths apart
    #[arg(long)]
    skip_enum_dedup: bool,

    /// Skip nodes defined by this module (repeatable)
    #[arg(long = "exclude-module")]
    exclude_modules: Vec<String>,
}

impl InputArgs {
    /// CLI flags override the loaded configuration
    fn apply(&self, config: &mut YgenConfig) {
        config.parser.search_paths.extend(self.search_paths.iter().cloned());
        let generate = &mut config.generate;
        if let Some(behaviour) = self.compress {
            generate.compress_behaviour = behaviour;
        }
        if self.fake_root {
            generate.generate_fake_root = true;
        }
        if let Some(name) = &self.fake_root_name {
            generate.fake_root_name = name.clone();
        }
        if self.skip_enum_dedup {
            generate.skip_enum_dedup = true;
        }
        generate.exclude_modules.extend(self.exclude_modules.iter().cloned());
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = YgenConfig::load_from(cli.config.as_ref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Generate { input, output, compact } => {
            input.apply(&mut config);
            if compact {
                config.output.format = OutputFormat::Compact;
            }
            let ir = generate(&input, &config)?;

            for note in ir.diagnostics.notes() {
                tracing::info!("{}", note);
            }

            let body = if config.output.include_checksum {
                let checksum = IrChecksum::of(&ir)?;
                serde_json::json!({ "checksum": checksum, "ir": ir })
            } else {
                serde_json::to_value(&ir)?
            };
            let rendered = match config.output.format {
                OutputFormat::Pretty => serde_json::to_string_pretty(&body)?,
                OutputFormat::Compact => serde_json::to_string(&body)?,
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!(
                        "wrote {} directories and {} enums to {}",
                        ir.directories.len(),
                        ir.enums.len(),
                        path.display()
                    );
                }
                None => println!("{}", rendered),
            }
        }
        Commands::Check { input } => {
            input.apply(&mut config);
            let ir = generate(&input, &config)?;
            print!("{}", ir.diagnostics.format_all());
            println!(
                "ok: {} directories, {} enums ({})",
                ir.directories.len(),
                ir.enums.len(),
                config.generate.compress_behaviour
            );
        }
        Commands::InitConfig { path, force } => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            config
                .save(&path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("wrote configuration to {}", path.display());
        }
    }

    Ok(())
}

fn generate(input: &InputArgs, config: &YgenConfig) -> anyhow::Result<familiar_ygen::Ir> {
    match generate_from_files(&input.files, config) {
        Ok(ir) => Ok(ir),
        Err(YgenError::Generation(diagnostics)) => {
            eprint!("{}", diagnostics.format_all());
            anyhow::bail!("generation failed with {} error(s)", diagnostics.error_count())
        }
        Err(e) => Err(e.into()),
    }
}
