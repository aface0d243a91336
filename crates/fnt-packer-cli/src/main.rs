use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use fnt_packer_core::prelude::*;
use fnt_packer_core::{OutputPage, run_trials};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "fnt-packer",
    about = "Pack a folder of glyph images into bitmap-font atlas pages and a .fnt descriptor",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack glyph images into atlas pages and write the font descriptor
    Pack(PackArgs),
    /// Report per-heuristic occupancy of the first page and time a full layout
    Bench(BenchArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// Glyphs directory (searched recursively)
    #[arg(long, required_unless_present = "config", help_heading = "Input/Output")]
    dir: Option<PathBuf>,
    /// Path to output files without extension (pages: <output>_N.png, descriptor: <output>.fnt)
    #[arg(long, required_unless_present = "config", help_heading = "Input/Output")]
    output: Option<PathBuf>,
    /// YAML config file; command-line flags override its values
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    // Layout
    /// Texture (page) width
    #[arg(long, required_unless_present = "config", help_heading = "Layout")]
    width: Option<u32>,
    /// Texture (page) height
    #[arg(long, required_unless_present = "config", help_heading = "Layout")]
    height: Option<u32>,
    /// Heuristic: auto|bssf|blsf|baf|bl|cp
    #[arg(long, help_heading = "Layout")]
    heuristic: Option<String>,
    /// Evaluate heuristic trials in parallel (requires core feature `parallel`)
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    parallel: bool,

    // Export
    /// Glyph id rule: strip-prefix (drop first character of stems longer than one) | stem
    #[arg(long, help_heading = "Export")]
    id_strategy: Option<String>,
    /// Descriptor format: xml (.fnt) | json
    #[arg(long, help_heading = "Export")]
    format: Option<String>,
    /// Export packing stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute layout and stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct BenchArgs {
    /// Glyphs directory
    dir: PathBuf,
    /// Texture (page) width
    #[arg(long)]
    width: u32,
    /// Texture (page) height
    #[arg(long)]
    height: u32,
    /// Glyph id rule: strip-prefix | stem
    #[arg(long, default_value = "strip-prefix")]
    id_strategy: String,
}

/// Settings file accepted by `--config`.
#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    dir: Option<PathBuf>,
    output: Option<PathBuf>,
    width: Option<u32>,
    height: Option<u32>,
    heuristic: Option<String>,
    parallel: Option<bool>,
    id_strategy: Option<String>,
    format: Option<String>,
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
}

/// Fully resolved settings for one `pack` run.
#[derive(Debug, Clone, Serialize)]
struct RunConfig {
    dir: PathBuf,
    output: PathBuf,
    id_strategy: GlyphIdStrategy,
    format: DescriptorFormat,
    include: Vec<String>,
    exclude: Vec<String>,
    packer: PackerConfig,
}

fn main() -> ExitCode {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("Unknown error! {info}");
    }));
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);
    let result = match &cli.command {
        Commands::Pack(args) => run_pack(args, cli.progress && !cli.quiet),
        Commands::Bench(b) => run_bench(b),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_pack(args: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let yaml = match &args.config {
        Some(path) => {
            let file = fs::read_to_string(path)
                .with_context(|| format!("read config {}", path.display()))?;
            serde_yaml::from_str(&file)
                .with_context(|| format!("parse config {}", path.display()))?
        }
        None => YamlConfig::default(),
    };
    let cfg = resolve_config(args, yaml)?;

    if args.print_config {
        match args.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    if !cfg.dir.is_dir() {
        anyhow::bail!("specified dir path is not a directory: {}", cfg.dir.display());
    }
    cfg.packer.validate()?;
    let mut page_sink = PngPageSink::new(&cfg.output)?;

    let paths = gather_paths(&cfg.dir, &cfg.include, &cfg.exclude)?;
    let sources = load_glyphs_with_progress(&paths, &cfg.id_strategy, show_progress)?;
    info!(count = sources.len(), "loaded glyph images");

    let out = if args.dry_run {
        let mut sink = DryRunSink(page_sink);
        pack_glyphs(&sources, &cfg.packer, &mut sink)?
    } else {
        if let Some(parent) = cfg.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create output dir {}", parent.display()))?;
        }
        let out = pack_glyphs(&sources, &cfg.packer, &mut page_sink)?;
        write_descriptor(&out.descriptor, &cfg.output, cfg.format)?;
        out
    };

    let stats = out.stats();
    info!(
        pages = stats.num_pages,
        glyphs = stats.num_glyphs,
        used_area = stats.used_area,
        total_area = stats.total_page_area,
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        "stats"
    );

    if let Some(stats_path) = &args.export_stats {
        if args.dry_run {
            println!("{}", stats.summary());
        } else {
            fs::write(stats_path, serde_json::to_string_pretty(&stats)?)
                .with_context(|| format!("write {}", stats_path.display()))?;
            info!(?stats_path, "stats exported");
        }
    }
    Ok(())
}

/// Layers YAML values over defaults, then explicit command-line flags over both.
fn resolve_config(args: &PackArgs, yaml: YamlConfig) -> anyhow::Result<RunConfig> {
    let dir = args
        .dir
        .clone()
        .or(yaml.dir)
        .context("missing required parameter --dir (command line or config file)")?;
    let output = args
        .output
        .clone()
        .or(yaml.output)
        .context("missing required parameter --output (command line or config file)")?;
    let width = args
        .width
        .or(yaml.width)
        .context("missing required parameter --width (command line or config file)")?;
    let height = args
        .height
        .or(yaml.height)
        .context("missing required parameter --height (command line or config file)")?;

    let heuristic = match args.heuristic.as_ref().or(yaml.heuristic.as_ref()) {
        Some(s) => s.parse::<HeuristicSelection>().map_err(anyhow::Error::msg)?,
        None => HeuristicSelection::Auto,
    };
    let id_strategy = match args.id_strategy.as_ref().or(yaml.id_strategy.as_ref()) {
        Some(s) => parse_id_strategy(s)?,
        None => GlyphIdStrategy::default(),
    };
    let format = match args.format.as_ref().or(yaml.format.as_ref()) {
        Some(s) => s
            .parse::<DescriptorFormat>()
            .map_err(|_| anyhow::anyhow!("unknown descriptor format: {}", s))?,
        None => DescriptorFormat::default(),
    };
    let include = if args.include.is_empty() {
        yaml.include.unwrap_or_default()
    } else {
        args.include.clone()
    };
    let exclude = if args.exclude.is_empty() {
        yaml.exclude.unwrap_or_default()
    } else {
        args.exclude.clone()
    };

    let packer = PackerConfig::builder()
        .with_page_size(width, height)
        .heuristic(heuristic)
        .parallel(args.parallel || yaml.parallel.unwrap_or(false))
        .build();
    Ok(RunConfig {
        dir,
        output,
        id_strategy,
        format,
        include,
        exclude,
        packer,
    })
}

fn parse_id_strategy(s: &str) -> anyhow::Result<GlyphIdStrategy> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown id strategy: {} (expected strip-prefix|stem)", s))
}

/// Computes placements only; page files are named but never written.
struct DryRunSink(PngPageSink);

impl PageSink for DryRunSink {
    fn write_page(&mut self, page: OutputPage) -> fnt_packer_core::Result<String> {
        Ok(self.0.page_file_name(page.layout.id))
    }
}

fn run_bench(b: &BenchArgs) -> anyhow::Result<()> {
    let ids = parse_id_strategy(&b.id_strategy)?;
    let paths = gather_paths(&b.dir, &[], &[])?;
    let sources = load_glyphs_with_progress(&paths, &ids, false)?;
    let requests: Vec<PlacementRequest<usize>> = sources
        .iter()
        .enumerate()
        .map(|(i, s)| PlacementRequest::new(i, s.width(), s.height()))
        .collect();
    let cfg = PackerConfig::builder()
        .with_page_size(b.width, b.height)
        .build();
    cfg.validate()?;

    for trial in run_trials(&requests, &cfg) {
        println!(
            "{:>4}: placed={} occupancy={:.2}%",
            trial.heuristic,
            trial.insertion.placed.len(),
            trial.occupancy * 100.0
        );
    }

    let start = Instant::now();
    let pages = pack_layout(requests, &cfg)?;
    let dur = start.elapsed();
    let stats = PackStats::from_layouts(&pages);
    println!(
        "pages={} occupancy={:.2}% time={}",
        stats.num_pages,
        stats.occupancy * 100.0,
        fmt_elapsed(dur)
    );
    Ok(())
}

fn fmt_elapsed(d: Duration) -> String {
    match d.as_micros() {
        us if us < 1_000 => format!("{us}us"),
        us if us < 1_000_000 => format!("{:.1}ms", us as f64 / 1e3),
        _ => format!("{:.2}s", d.as_secs_f64()),
    }
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("bad glob pattern {pat}"))?);
    }
    Ok(Some(b.build()?))
}

const GLYPH_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tga", "gif"];

/// Decides which walked files are glyph images.
struct GlyphFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl GlyphFilter {
    fn new(include: &[String], exclude: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            include: build_globset(include)?,
            exclude: build_globset(exclude)?,
        })
    }

    fn accepts(&self, p: &Path) -> bool {
        let is_glyph_image = p
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| GLYPH_EXTENSIONS.iter().any(|g| e.eq_ignore_ascii_case(g)));
        if !is_glyph_image {
            return false;
        }
        // globs are written with forward slashes on every platform
        let s = p.to_string_lossy().replace('\\', "/");
        !self.exclude.as_ref().is_some_and(|g| g.is_match(&s))
            && self.include.as_ref().is_none_or(|g| g.is_match(&s))
    }
}

/// Glyph images under `dir`, sorted by file name at every directory level.
fn gather_paths(dir: &Path, include: &[String], exclude: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let filter = GlyphFilter::new(include, exclude)?;
    let mut list = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("scan {}", dir.display()))?;
        if entry.file_type().is_file() && filter.accepts(entry.path()) {
            list.push(entry.into_path());
        }
    }
    Ok(list)
}

fn load_glyphs_with_progress(
    paths: &[PathBuf],
    ids: &GlyphIdStrategy,
    progress: bool,
) -> anyhow::Result<Vec<SourceGlyph>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        if let Some(b) = &bar {
            let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
            b.set_message(msg.to_string());
        }
        // a glyph that fails to decode aborts the run
        list.push(SourceGlyph::open(p, ids)?);
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

/// `-q`/`-v` pick the level; without either, `RUST_LOG` may refine the default `info`.
fn init_tracing(quiet: bool, verbose: u8) {
    let filter = match (quiet, verbose) {
        (true, _) => EnvFilter::new("error"),
        (false, 0) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        (false, 1) => EnvFilter::new("debug"),
        (false, _) => EnvFilter::new("trace"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn pack_args(argv: &[&str]) -> PackArgs {
        let mut full = vec!["fnt-packer", "pack"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).expect("parse").command {
            Commands::Pack(a) => a,
            other => panic!("expected pack, got {other:?}"),
        }
    }

    #[test]
    fn missing_required_parameters_is_a_usage_error() {
        let err = Cli::try_parse_from(["fnt-packer", "pack", "--dir", "glyphs"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn command_line_overrides_yaml() {
        let args = pack_args(&["--config", "font.yaml", "--width", "64", "--heuristic", "bl"]);
        let yaml: YamlConfig = serde_yaml::from_str(
            "dir: glyphs\noutput: out/font\nwidth: 512\nheight: 256\nheuristic: cp\nformat: json\n",
        )
        .expect("yaml");
        let cfg = resolve_config(&args, yaml).expect("resolve");
        assert_eq!(cfg.dir, PathBuf::from("glyphs"));
        assert_eq!((cfg.packer.page_width, cfg.packer.page_height), (64, 256));
        assert_eq!(
            cfg.packer.heuristic,
            HeuristicSelection::Fixed(MaxRectsHeuristic::BottomLeft)
        );
        assert_eq!(cfg.format, DescriptorFormat::Json);
        assert_eq!(cfg.id_strategy, GlyphIdStrategy::StripPrefix);
    }

    #[test]
    fn config_without_size_is_rejected() {
        let args = pack_args(&["--config", "font.yaml"]);
        let yaml: YamlConfig = serde_yaml::from_str("dir: glyphs\noutput: out/font\n").expect("yaml");
        let err = resolve_config(&args, yaml).unwrap_err();
        assert!(err.to_string().contains("--width"));
    }

    #[test]
    fn unknown_heuristic_is_rejected() {
        let args = pack_args(&[
            "--dir", "g", "--output", "o", "--width", "8", "--height", "8", "--heuristic", "skyline",
        ]);
        assert!(resolve_config(&args, YamlConfig::default()).is_err());
    }

    #[test]
    fn gather_paths_is_sorted_recursive_and_filtered() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("sub")).expect("mkdir");
        for name in ["_b.png", "_a.png", "sub/_c.png", "notes.txt", "skip_me.png"] {
            fs::write(dir.path().join(name), b"").expect("touch");
        }
        let paths = gather_paths(dir.path(), &[], &["**/skip_*".to_string()]).expect("gather");
        let names: Vec<String> = paths
            .iter()
            .map(|p| {
                p.strip_prefix(dir.path())
                    .expect("under dir")
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(names, vec!["_a.png", "_b.png", "sub/_c.png"]);
    }

    #[test]
    fn pack_run_writes_pages_and_descriptor() {
        let dir = tempfile::tempdir().expect("tempdir");
        let glyphs = dir.path().join("glyphs");
        fs::create_dir(&glyphs).expect("mkdir");
        for (name, w, h) in [("_A.png", 10, 10), ("_B.png", 20, 20), ("_C.png", 15, 15)] {
            RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
                .save(glyphs.join(name))
                .expect("save");
        }
        let output = dir.path().join("out").join("font");
        let args = pack_args(&[
            "--dir",
            glyphs.to_str().expect("utf8"),
            "--output",
            output.to_str().expect("utf8"),
            "--width",
            "35",
            "--height",
            "35",
        ]);
        run_pack(&args, false).expect("pack");

        assert!(dir.path().join("out").join("font_0.png").is_file());
        assert!(!dir.path().join("out").join("font_1.png").exists());
        let xml = fs::read_to_string(dir.path().join("out").join("font.fnt")).expect("fnt");
        assert!(xml.contains("<chars count=\"3\">"));
        assert!(xml.contains("file=\"font_0.png\""));
        for id in ["A", "B", "C"] {
            assert!(xml.contains(&format!("<char id=\"{id}\"")), "missing {id}");
        }
    }

    #[test]
    fn empty_glyph_dir_fails_without_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let glyphs = dir.path().join("glyphs");
        fs::create_dir(&glyphs).expect("mkdir");
        let output = dir.path().join("font");
        let args = pack_args(&[
            "--dir",
            glyphs.to_str().expect("utf8"),
            "--output",
            output.to_str().expect("utf8"),
            "--width",
            "32",
            "--height",
            "32",
        ]);
        let err = run_pack(&args, false).unwrap_err();
        assert!(err.to_string().contains("no source images"));
        assert!(!dir.path().join("font.fnt").exists());
    }

    #[test]
    fn output_dir_with_trailing_separator_is_rejected_before_writing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let glyphs = dir.path().join("glyphs");
        fs::create_dir(&glyphs).expect("mkdir");
        RgbaImage::new(4, 4).save(glyphs.join("_A.png")).expect("save");
        let output = format!("{}/out/", dir.path().display());
        let args = pack_args(&[
            "--dir",
            glyphs.to_str().expect("utf8"),
            "--output",
            &output,
            "--width",
            "8",
            "--height",
            "8",
        ]);
        let err = run_pack(&args, false).unwrap_err();
        assert!(format!("{err:#}").contains("must end in a file name"), "{err:#}");
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn include_globs_and_extension_case() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["_A.PNG", "_b.png", "_c.jpg", "_d.webp"] {
            fs::write(dir.path().join(name), b"").expect("touch");
        }
        let all = gather_paths(dir.path(), &[], &[]).expect("gather");
        let names: Vec<_> = all
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["_A.PNG", "_b.png", "_c.jpg"]);

        let only_png = gather_paths(dir.path(), &["**/*.png".to_string()], &[]).expect("gather");
        assert_eq!(only_png.len(), 1);
        assert!(only_png[0].ends_with("_b.png"));
        assert!(gather_paths(dir.path(), &["[".to_string()], &[]).is_err());
    }

    #[test]
    fn elapsed_time_picks_a_readable_unit() {
        assert_eq!(fmt_elapsed(Duration::from_micros(250)), "250us");
        assert_eq!(fmt_elapsed(Duration::from_micros(12_340)), "12.3ms");
        assert_eq!(fmt_elapsed(Duration::from_millis(2_500)), "2.50s");
    }
}
