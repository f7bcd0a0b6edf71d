// ============================================================================
// rasterpad CLI - headless batch editing via command-line arguments
// ============================================================================
//
// Usage examples:
//   rasterpad --input photo.png --script frame.rhai --output result.png
//   rasterpad -i *.jpg --script stamp.rhai --output-dir processed/
//   rasterpad --new 800x600 --script sketch.rhai -o sketch.png
//   rasterpad -i a.png b.png --output-dir out/ --serve 8080
//
// Each input is loaded into its own Editor, the script drives that editor,
// and the result is saved. With --serve the results stay published on the
// export server until the process is interrupted.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, bail};
use clap::Parser;
use image::RgbaImage;

use crate::editor::{Editor, EditorConfig};
use crate::export::{self, SharedCanvases};
use crate::io::{load_bitmap, save_bitmap};
use crate::ops::scripting::{compile_script, run_script};
use crate::ops::text::TextRenderer;
use crate::settings::Settings;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// rasterpad headless image editor.
#[derive(Parser, Debug)]
#[command(
    name = "rasterpad",
    about = "rasterpad headless raster editor",
    long_about = "Drive the editor with Rhai scripts on image files or fresh canvases,\n\
                  save the results as PNG, JPEG or BMP, and optionally share them\n\
                  over HTTP.\n\n\
                  Example:\n  \
                  rasterpad --input photo.png --script frame.rhai --output result.png\n  \
                  rasterpad --new 800x600 -s sketch.rhai -o sketch.png --serve 8080"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, num_args = 1.., conflicts_with = "new", required_unless_present = "new")]
    pub input: Vec<String>,

    /// Start from a blank canvas of the given size instead of an input file.
    #[arg(long, value_name = "WxH")]
    pub new: Option<String>,

    /// Rhai script file to run against each canvas.
    /// If omitted, images are only loaded and re-saved.
    #[arg(short, long, value_name = "SCRIPT.rhai")]
    pub script: Option<PathBuf>,

    /// Output file path. Only valid for a single canvas.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing. Files keep their stem and
    /// are written as PNG.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Publish the results on the HTTP export server and keep serving.
    /// Without a value the configured `export_port` is used.
    #[arg(long, value_name = "PORT", num_args = 0..=1)]
    pub serve: Option<Option<u16>>,

    /// Address the export server binds to.
    #[arg(long, default_value = "127.0.0.1", value_name = "ADDR")]
    pub bind: IpAddr,

    /// Print script output and per-file timing; debug-level logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Where one run's canvas comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Source {
    File(PathBuf),
    Blank { width: i64, height: i64 },
}

impl Source {
    fn label(&self) -> String {
        match self {
            Source::File(p) => p.display().to_string(),
            Source::Blank { width, height } => format!("new {}x{} canvas", width, height),
        }
    }

    /// Name under which the result is published.
    fn stem(&self) -> String {
        match self {
            Source::File(p) => p
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "canvas".to_string()),
            Source::Blank { .. } => "canvas".to_string(),
        }
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = everything succeeded, `1` = at least one canvas failed.
pub fn run(args: CliArgs, settings: &Settings) -> ExitCode {
    let sources = match resolve_sources(&args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if sources.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} inputs given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            sources.len()
        );
        return ExitCode::FAILURE;
    }

    let script_source = match load_script(args.script.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(dir) = &args.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("error: could not create output directory '{}': {}", dir.display(), e);
            return ExitCode::FAILURE;
        }
    }

    let text = TextRenderer::from_config(settings.font_path(), &settings.font_family);
    let total = sources.len();
    let multi = total > 1;
    let mut any_failure = false;
    let mut results: Vec<(String, RgbaImage)> = Vec::new();

    for (idx, source) in sources.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, source.label());
        }
        let file_start = Instant::now();

        let output_path = build_output_path(source, args.output.as_deref(), args.output_dir.as_deref());
        match run_one(source, &output_path, script_source.as_deref(), settings, &text, args.verbose) {
            Ok((written, image)) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        written.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
                results.push((source.stem(), image));
            }
            Err(e) => {
                log::error!("{}: {:#}", source.label(), e);
                eprintln!("  error: {:#}", e);
                any_failure = true;
            }
        }
    }

    if let Some(port) = args.serve {
        let port = port.unwrap_or(settings.export_port);
        if let Err(e) = serve_results(results, SocketAddr::new(args.bind, port)) {
            eprintln!("error: {:#}", e);
            return ExitCode::FAILURE;
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-canvas processing pipeline
// ============================================================================

fn run_one(
    source: &Source,
    output: &Path,
    script: Option<&str>,
    settings: &Settings,
    text: &TextRenderer,
    verbose: bool,
) -> anyhow::Result<(PathBuf, RgbaImage)> {
    // -- Step 1: Load ----------------------------------------------------
    let mut editor = Editor::new(EditorConfig::from(settings));
    editor.set_text_renderer(text.clone());
    editor.options_mut().set_stroke_width(settings.default_stroke_width);
    match source {
        Source::File(path) => {
            let image = load_bitmap(path)?;
            editor.set_image(image).context("loaded image is unusable")?;
        }
        Source::Blank { width, height } => {
            editor.resize(*width, *height)?;
        }
    }

    // -- Step 2: Run script (optional) -----------------------------------
    if let Some(src) = script {
        let output_lines = run_script(src, &mut editor).map_err(|e| anyhow::anyhow!("script error: {}", e))?;
        if verbose {
            for line in &output_lines {
                println!("  [script] {}", line);
            }
        }
    }

    // -- Step 3: Save ----------------------------------------------------
    let image = editor
        .snapshot_image()
        .context("script left no canvas to save")?;
    let written = save_bitmap(&image, output)?;
    editor.clear_dirty();
    Ok((written, image))
}

fn serve_results(results: Vec<(String, RgbaImage)>, addr: SocketAddr) -> anyhow::Result<()> {
    let shared = Arc::new(SharedCanvases::new());
    shared.publish(results);
    println!("serving {} canvas(es) on http://{}/ (Ctrl+C to stop)", shared.len(), addr);

    let runtime = tokio::runtime::Runtime::new().context("could not start async runtime")?;
    runtime.block_on(async move {
        tokio::select! {
            res = export::serve(shared, addr) => res.map_err(anyhow::Error::from),
            _ = tokio::signal::ctrl_c() => {
                log::info!("export server stopped");
                Ok(())
            }
        }
    })
}

// ============================================================================
// Helpers
// ============================================================================

fn resolve_sources(args: &CliArgs) -> anyhow::Result<Vec<Source>> {
    if let Some(size) = &args.new {
        let (width, height) = parse_size(size)?;
        return Ok(vec![Source::Blank { width, height }]);
    }
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        bail!("no input files matched the given pattern(s).");
    }
    Ok(inputs.into_iter().map(Source::File).collect())
}

fn load_script(path: Option<&Path>) -> anyhow::Result<Option<String>> {
    let Some(path) = path else { return Ok(None) };
    let src = std::fs::read_to_string(path)
        .with_context(|| format!("could not read script '{}'", path.display()))?;
    compile_script(&src).map_err(|e| anyhow::anyhow!("script '{}' does not compile: {}", path.display(), e))?;
    Ok(Some(src))
}

/// Parse `WxH` (also `W,H` or `W H`) into raw dimensions; range checks are
/// left to [`Editor::resize`].
fn parse_size(size: &str) -> anyhow::Result<(i64, i64)> {
    let parts: Vec<&str> = size
        .split(|c: char| c == 'x' || c == 'X' || c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();
    let [w, h] = parts.as_slice() else {
        bail!("invalid size '{}', expected WIDTHxHEIGHT", size);
    };
    let w: i64 = w.parse().with_context(|| format!("invalid width '{}'", w))?;
    let h: i64 = h.parse().with_context(|| format!("invalid height '{}'", h))?;
    Ok((w, h))
}

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Compute the output path for one canvas.
///
/// Priority:
/// 1. `--output` (explicit path)
/// 2. `--output-dir` (stem + `.png`)
/// 3. Next to the input as `<stem>.png`, with `_out` appended to the stem
///    when that would overwrite the input; `canvas.png` for blank canvases
fn build_output_path(source: &Source, output: Option<&Path>, output_dir: Option<&Path>) -> PathBuf {
    if let Some(out) = output {
        return out.to_path_buf();
    }

    let stem = source.stem();
    if let Some(dir) = output_dir {
        return dir.join(format!("{}.png", stem));
    }

    match source {
        Source::File(input) => {
            let parent = input.parent().unwrap_or(Path::new("."));
            let candidate = parent.join(format!("{}.png", stem));
            if candidate == *input {
                parent.join(format!("{}_out.png", stem))
            } else {
                candidate
            }
        }
        Source::Blank { .. } => PathBuf::from(format!("{}.png", stem)),
    }
}
