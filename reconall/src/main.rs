//! `reconall` CLI.
//!
//! Composes `recon-all` / `mri_ca_label` command lines, adds resume flags for
//! subjects that were already processed, and either prints or runs them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};

use reconall::ca_label::{CaLabel, CaLabelInputs};
use reconall::core::directive::{Directive, Hemisphere, Stage};
use reconall::exit_codes;
use reconall::io::config::{DEFAULT_CONFIG_PATH, ReconallConfig, load_config, write_config};
use reconall::io::runner::{SubprocessRunner, ToolStatus, run_tool};
use reconall::logging;
use reconall::recon_all::{DEFAULT_SUBJECT_ID, ReconAll, ReconAllInputs, XoptsMode};

#[derive(Parser)]
#[command(
    name = "reconall",
    version,
    about = "Resumable FreeSurfer recon-all and mri_ca_label wrappers"
)]
struct Cli {
    /// TOML config with defaults (subjects dir, timeout, log dir).
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build (and run) a recon-all invocation, skipping up-to-date steps.
    #[command(name = "recon-all")]
    ReconAll(ReconAllArgs),
    /// Build (and run) an mri_ca_label invocation and list its outputs.
    #[command(name = "ca-label")]
    CaLabel(CaLabelArgs),
    /// Write a config file with default values.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
struct ReconAllArgs {
    #[arg(long, default_value = DEFAULT_SUBJECT_ID)]
    subject_id: String,
    #[arg(long)]
    subjects_dir: Option<PathBuf>,
    /// Process directive, e.g. all, autorecon1, autorecon2-perhemi.
    #[arg(long, conflicts_with = "steps")]
    directive: Option<Directive>,
    /// Individual step to run instead of a directive (repeatable).
    #[arg(long = "step", value_name = "STEP")]
    steps: Vec<String>,
    #[arg(long)]
    hemi: Option<Hemisphere>,
    /// Input T1 volume (repeatable).
    #[arg(long = "t1", value_name = "PATH")]
    t1_files: Vec<PathBuf>,
    #[arg(long = "t2", value_name = "PATH")]
    t2_file: Option<PathBuf>,
    /// Use the T2 volume to refine the pial surface.
    #[arg(long)]
    use_t2: bool,
    #[arg(long = "flair", value_name = "PATH")]
    flair_file: Option<PathBuf>,
    /// Use the FLAIR volume to refine the pial surface.
    #[arg(long)]
    use_flair: bool,
    /// Extra recon-all flag passed through verbatim (repeatable).
    #[arg(long = "flag", value_name = "FLAG", allow_hyphen_values = true)]
    flags: Vec<String>,
    #[arg(long, value_name = "THREADS")]
    openmp: Option<u32>,
    #[arg(long)]
    parallel: bool,
    #[arg(long)]
    hires: bool,
    #[arg(long)]
    mprage: bool,
    #[arg(long)]
    big_ventricles: bool,
    #[arg(long)]
    brainstem: bool,
    #[arg(long)]
    hippocampal_subfields_t1: bool,
    /// Existing expert-options file.
    #[arg(long, conflicts_with = "expert_options")]
    expert: Option<PathBuf>,
    /// How recon-all treats a previous expert-options file: use, clean, overwrite.
    #[arg(long)]
    xopts: Option<XoptsMode>,
    /// Expert options for one binary (repeatable).
    #[arg(
        long = "expert-opt",
        value_name = "BINARY=ARGS",
        value_parser = parse_expert_opt,
        allow_hyphen_values = true
    )]
    expert_options: Vec<(String, String)>,
    /// Run even if every step is up to date.
    #[arg(long)]
    force_run: bool,
    /// Print the final command line instead of running it.
    #[arg(long)]
    dry_run: bool,
}

impl ReconAllArgs {
    fn into_inputs(self, cfg: &ReconallConfig) -> Result<ReconAllInputs> {
        Ok(ReconAllInputs {
            subject_id: self.subject_id,
            subjects_dir: self.subjects_dir.or_else(|| cfg.subjects_dir.clone()),
            stage: Stage::from_parts(self.directive, self.steps)?,
            hemi: self.hemi,
            t1_files: self.t1_files,
            t2_file: self.t2_file,
            use_t2: self.use_t2,
            flair_file: self.flair_file,
            use_flair: self.use_flair,
            flags: self.flags,
            openmp: self.openmp,
            parallel: self.parallel,
            hires: self.hires,
            mprage: self.mprage,
            big_ventricles: self.big_ventricles,
            brainstem: self.brainstem,
            hippocampal_subfields_t1: self.hippocampal_subfields_t1,
            expert: self.expert,
            xopts: self.xopts,
            expert_options: self.expert_options,
            force_run: self.force_run,
        })
    }
}

#[derive(Args, Debug)]
struct CaLabelArgs {
    in_file: PathBuf,
    transform: PathBuf,
    template: PathBuf,
    out_file: PathBuf,
    #[arg(long)]
    align: bool,
    #[arg(long)]
    prior: Option<f64>,
    /// Relabel unlikely voxels: label id and threshold.
    #[arg(long, num_args = 2, value_names = ["LABEL", "THRESHOLD"])]
    relabel_unlikely: Option<Vec<String>>,
    #[arg(long)]
    no_big_ventricles: bool,
    #[arg(long)]
    label: Option<PathBuf>,
    #[arg(long)]
    aseg: Option<PathBuf>,
    #[arg(long)]
    intensities: Option<PathBuf>,
    /// Prefix for posterior probability maps (<prefix>000.mgz ... <prefix>002.mgz).
    #[arg(long, value_name = "PREFIX")]
    write_probs: Option<String>,
    #[arg(long)]
    num_threads: Option<u32>,
    /// Print the command line and output listing instead of running.
    #[arg(long)]
    dry_run: bool,
}

impl CaLabelArgs {
    fn into_inputs(self) -> Result<CaLabelInputs> {
        let relabel_unlikely = match self.relabel_unlikely.as_deref() {
            None => None,
            Some([label, threshold]) => Some((
                label
                    .parse::<u32>()
                    .with_context(|| format!("parse relabel label '{label}'"))?,
                threshold
                    .parse::<f64>()
                    .with_context(|| format!("parse relabel threshold '{threshold}'"))?,
            )),
            Some(_) => bail!("--relabel-unlikely takes a label and a threshold"),
        };
        Ok(CaLabelInputs {
            in_file: self.in_file,
            transform: self.transform,
            template: self.template,
            out_file: self.out_file,
            align: self.align,
            prior: self.prior,
            relabel_unlikely,
            no_big_ventricles: self.no_big_ventricles,
            label: self.label,
            aseg: self.aseg,
            intensities: self.intensities,
            write_probs: self.write_probs,
            num_threads: self.num_threads,
        })
    }
}

fn parse_expert_opt(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((binary, args)) if !binary.trim().is_empty() => {
            Ok((binary.trim().to_string(), args.trim().to_string()))
        }
        _ => Err(format!("expected BINARY=ARGS, got '{raw}'")),
    }
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let workdir = std::env::current_dir().context("resolve working directory")?;
    match cli.command {
        Command::ReconAll(args) => {
            let cfg = load_config(&cli.config)?;
            cmd_recon_all(args, &cfg, &workdir)
        }
        Command::CaLabel(args) => {
            let cfg = load_config(&cli.config)?;
            cmd_ca_label(args, &cfg, &workdir)
        }
        Command::InitConfig { force } => cmd_init_config(&cli.config, force),
    }
}

fn cmd_recon_all(args: ReconAllArgs, cfg: &ReconallConfig, workdir: &Path) -> Result<i32> {
    let dry_run = args.dry_run;
    let recon = ReconAll::new(args.into_inputs(cfg)?, workdir)?;
    if dry_run {
        println!("{}", recon.cmdline()?);
        return Ok(exit_codes::OK);
    }

    let request = recon.run_request(cfg)?;
    let status = run_tool(&SubprocessRunner, &request)?;
    if status == ToolStatus::NothingToDo {
        println!("recon-all: nothing to do");
    }
    Ok(report_status("recon-all", status, &request.log_path))
}

fn cmd_ca_label(args: CaLabelArgs, cfg: &ReconallConfig, workdir: &Path) -> Result<i32> {
    let dry_run = args.dry_run;
    let ca_label = CaLabel::new(args.into_inputs()?, workdir)?;
    let listing = serde_json::to_string_pretty(&ca_label.list_outputs())
        .context("serialize output listing")?;
    if dry_run {
        println!("{}", ca_label.cmdline());
        println!("{listing}");
        return Ok(exit_codes::OK);
    }

    let request = ca_label.run_request(cfg);
    let status = run_tool(&SubprocessRunner, &request)?;
    if status.is_success() {
        println!("{listing}");
    }
    Ok(report_status("mri_ca_label", status, &request.log_path))
}

fn cmd_init_config(path: &Path, force: bool) -> Result<i32> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    write_config(path, &ReconallConfig::default())?;
    println!("wrote {}", path.display());
    Ok(exit_codes::OK)
}

fn report_status(tool: &str, status: ToolStatus, log_path: &Path) -> i32 {
    match status {
        ToolStatus::Succeeded | ToolStatus::NothingToDo => exit_codes::OK,
        ToolStatus::Failed(code) => {
            eprintln!(
                "{tool} failed with status {code:?} (log: {})",
                log_path.display()
            );
            exit_codes::TOOL_FAILED
        }
        ToolStatus::TimedOut => {
            eprintln!("{tool} timed out (log: {})", log_path.display());
            exit_codes::TOOL_FAILED
        }
    }
}
