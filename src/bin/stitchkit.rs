use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use stitchkit::{
    BatchChoice, Config, FixedMemory, HttpSource, MemoryProbe, Prompter, SystemMemory,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stitchkit", version)]
struct Cli {
    /// JSON config file; flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download placeholder images into numbered files.
    Fetch(FetchArgs),
    /// Stitch a folder of images vertically into one image.
    Stitch(StitchArgs),
}

#[derive(Parser, Debug)]
struct FetchArgs {
    /// Endpoint to GET once per image.
    #[arg(long)]
    url: Option<String>,

    /// Number of requests to issue.
    #[arg(long)]
    count: Option<u32>,

    /// Folder the images are written to.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct StitchArgs {
    /// Source image folder.
    #[arg(long)]
    src: Option<PathBuf>,

    /// Destination folder.
    #[arg(long)]
    dest: Option<PathBuf>,

    /// Output file name inside the destination folder; the extension picks the format.
    #[arg(long)]
    output: Option<String>,

    /// Batch size mode.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Upper bound for the automatic batch size.
    #[arg(long)]
    max_images: Option<usize>,

    /// Batch size for manual mode (implies `--mode manual`).
    #[arg(long)]
    batch_size: Option<usize>,

    /// Use this many bytes as available memory instead of asking the OS.
    #[arg(long)]
    available_memory: Option<u64>,

    /// Skip the confirmation question.
    #[arg(long, short = 'y')]
    yes: bool,

    /// Never read stdin; unset values come from the config file or defaults.
    #[arg(long)]
    no_prompt: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    #[value(alias = "a")]
    Auto,
    #[value(alias = "m")]
    Manual,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };

    match cli.cmd {
        Command::Fetch(args) => cmd_fetch(cfg, args),
        Command::Stitch(args) => {
            let stdin = std::io::stdin().lock();
            let stdout = std::io::stdout().lock();
            cmd_stitch(cfg, args, &mut Prompter::new(stdin, stdout))
        }
    }
}

fn cmd_fetch(mut cfg: Config, args: FetchArgs) -> anyhow::Result<()> {
    if let Some(url) = args.url {
        cfg.fetch.url = url;
    }
    if let Some(count) = args.count {
        cfg.fetch.count = count;
    }
    if let Some(out_dir) = args.out_dir {
        cfg.fetch.out_dir = out_dir;
    }

    let fetcher = stitchkit::Fetcher::new(HttpSource::new(), cfg.fetch)?;
    let report = fetcher.run()?;

    println!(
        "Finished downloading images. ({} written, {} skipped)",
        report.written.len(),
        report.skipped.len()
    );
    Ok(())
}

fn cmd_stitch<R: BufRead, W: Write>(
    mut cfg: Config,
    args: StitchArgs,
    p: &mut Prompter<R, W>,
) -> anyhow::Result<()> {
    let interactive = !args.no_prompt;
    let defaults = cfg.stitch.clone();

    cfg.stitch.source_dir = match args.src {
        Some(src) => src,
        None if interactive => p
            .ask(
                "Please enter the path to the source image folder",
                &defaults.source_dir.to_string_lossy(),
            )?
            .into(),
        None => defaults.source_dir.clone(),
    };
    cfg.stitch.dest_dir = match args.dest {
        Some(dest) => dest,
        None if interactive => p
            .ask(
                "Please enter the path to the destination folder",
                &defaults.dest_dir.to_string_lossy(),
            )?
            .into(),
        None => defaults.dest_dir.clone(),
    };
    cfg.stitch.output_file = match args.output {
        Some(output) => output,
        None if interactive => p.ask("Please enter the output filename", &defaults.output_file)?,
        None => defaults.output_file.clone(),
    };
    cfg.stitch.validate()?;

    let choice = match (args.mode, args.batch_size) {
        (Some(ModeArg::Auto), _) => BatchChoice::Automatic,
        (Some(ModeArg::Manual), _) | (None, Some(_)) => BatchChoice::Manual,
        (None, None) if interactive => p.ask_batch_choice()?,
        (None, None) => BatchChoice::Automatic,
    };

    let stitch = &cfg.stitch;
    let batch_size = match choice {
        BatchChoice::Manual => match args.batch_size {
            Some(n) => n,
            None if interactive => p.ask_number("Enter the batch size")?,
            None => anyhow::bail!("--batch-size is required in manual mode with --no-prompt"),
        },
        BatchChoice::Automatic | BatchChoice::Invalid => {
            if choice == BatchChoice::Invalid {
                tracing::warn!("invalid batch size choice, falling back to automatic");
                p.say("Invalid choice. Using automatic batch size calculation.")?;
            }

            let max_images = match args.max_images {
                Some(n) => n,
                None if interactive => p.ask_number("Enter the maximum number of images to use")?,
                None => stitchkit::require_images(&stitch.source_dir, &stitch.extensions)?.len(),
            };

            let est =
                stitchkit::estimate_output_size(&stitch.source_dir, max_images, &stitch.extensions)?;
            p.say("\nEstimated Image Size:")?;
            p.say(&format!("Width: {}px, Height: {}px", est.width, est.height))?;
            p.say(&format!("Total Size: {}KB", est.total_kib))?;

            if interactive && !args.yes && !p.confirm("\nDo you want to continue?")? {
                p.say("Process aborted.")?;
                return Ok(());
            }

            let probe: Box<dyn MemoryProbe> = match args.available_memory {
                Some(bytes) => Box::new(FixedMemory(bytes)),
                None => Box::new(SystemMemory),
            };
            let batch = stitchkit::calculate_batch_size(
                &stitch.source_dir,
                probe.as_ref(),
                stitch.memory_fraction,
                max_images,
                &stitch.extensions,
            )?;
            p.say(&format!("Batch size calculated: {batch}"))?;
            batch
        }
    };

    let out_path = stitch.output_path();
    let report = stitchkit::stitch_images(
        &stitch.source_dir,
        &out_path,
        batch_size,
        &stitch.extensions,
    )
    .with_context(|| format!("stitch '{}'", stitch.source_dir.display()))?;

    p.say(&format!(
        "wrote {} ({}x{}, {} images, {} batches)",
        out_path.display(),
        report.width,
        report.height,
        report.images,
        report.batches
    ))?;
    Ok(())
}
