use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "materialc", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate one material into HLSL.
    Translate(TranslateArgs),
    /// Translate every material JSON in a directory in parallel.
    Batch(BatchArgs),
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input material JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output shader path.
    #[arg(long)]
    out: PathBuf,

    /// Translator options JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Shader template to fill instead of the built-in one.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Also write the compilation output and shader environment as JSON.
    #[arg(long)]
    output_json: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Directory of material JSON files.
    #[arg(long = "in")]
    in_dir: PathBuf,

    /// Directory the shaders are written to.
    #[arg(long)]
    out: PathBuf,

    /// Translator options JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Shader template to fill instead of the built-in one.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Worker threads (defaults to one per core).
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Translate(args) => cmd_translate(args),
        Command::Batch(args) => cmd_batch(args),
    }
}

fn load_options(path: Option<&Path>) -> anyhow::Result<materialc::TranslatorOptions> {
    match path {
        Some(p) => Ok(materialc::TranslatorOptions::from_path(p)?),
        None => Ok(materialc::TranslatorOptions::default()),
    }
}

fn load_template(path: Option<&Path>) -> anyhow::Result<materialc::MaterialTemplate> {
    match path {
        Some(p) => Ok(materialc::MaterialTemplate::from_path(p)?),
        None => Ok(materialc::MaterialTemplate::builtin()?),
    }
}

fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("write '{}'", path.display()))
}

fn cmd_translate(args: TranslateArgs) -> anyhow::Result<()> {
    let options = load_options(args.config.as_deref())?;
    let template = load_template(args.template.as_deref())?;
    let def = materialc::MaterialDef::from_path(&args.in_path)?;
    let graph = materialc::MaterialGraph::new(def)?;

    let mut translator = materialc::HlslTranslator::new(&graph, &options);
    if !translator.translate() {
        for error in translator.errors() {
            eprintln!("error: {error}");
        }
        anyhow::bail!(
            "translation of '{}' failed with {} error(s)",
            args.in_path.display(),
            translator.errors().len()
        );
    }

    let shader = translator.material_shader_code(&template)?;
    write_file(&args.out, &shader)?;
    eprintln!("wrote {}", args.out.display());

    if let Some(path) = &args.output_json {
        let report = serde_json::json!({
            "environment": translator.shader_environment(),
            "output": translator.compilation_output(),
        });
        let text = serde_json::to_string_pretty(&report).context("serialize output JSON")?;
        write_file(path, &text)?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let options = load_options(args.config.as_deref())?;
    let template = load_template(args.template.as_deref())?;

    let mut paths = std::fs::read_dir(&args.in_dir)
        .with_context(|| format!("read dir '{}'", args.in_dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("list '{}'", args.in_dir.display()))?;
    paths.retain(|p| p.extension().is_some_and(|e| e == "json"));
    paths.sort();

    let mut failures = 0usize;
    let mut defs = Vec::with_capacity(paths.len());
    for path in &paths {
        match materialc::MaterialDef::from_path(path) {
            Ok(def) => defs.push(def),
            Err(e) => {
                failures += 1;
                eprintln!("FAILED {}: {e}", path.display());
            }
        }
    }

    let outcomes = materialc::translate_many(defs, &options, &template, args.threads)?;
    for outcome in outcomes {
        match outcome.result {
            Ok(translated) => {
                let out = args.out.join(format!("{}.ush", translated.name));
                write_file(&out, &translated.shader_code)?;
                println!("ok {} {}", outcome.name, outcome.key);
            }
            Err(e) => {
                failures += 1;
                eprintln!("FAILED {}: {e}", outcome.name);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} material(s) failed to translate");
    }
    Ok(())
}
