use ansi_term::{Colour, Style};
use basic::error;
use basic::lang::{Error, FileLoader, Source};
use basic::mach::{compile_stamped, CollectDiagnostics, Options};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Result<T> = std::result::Result<T, Error>;

#[derive(Parser, Debug)]
#[command(
    name = "basic-z80",
    version,
    about = "Compiles BASIC programs to Z80 assembler source"
)]
struct Args {
    /// BASIC source files. Each one is written next to itself as `.asm`.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output file. Only valid with a single input.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Target machine: z1013, z9001, kc87, kc85.
    #[arg(long)]
    target: Option<String>,

    /// Begin address, decimal or hex with an H suffix.
    #[arg(long)]
    org: Option<String>,

    /// Stack size in bytes.
    #[arg(long)]
    stack: Option<String>,

    /// Heap size in bytes.
    #[arg(long)]
    heap: Option<String>,

    #[arg(long)]
    no_bounds_check: bool,

    #[arg(long)]
    no_stack_check: bool,

    #[arg(long)]
    no_optimize: bool,

    /// Keep the current BASIC line number in memory for error messages.
    #[arg(long)]
    trace_lines: bool,

    /// Any compiler option as `name=value`, may repeat.
    #[arg(short = 'O', value_name = "NAME=VALUE")]
    option: Vec<String>,

    /// More logging. RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

pub fn main() -> i32 {
    let args = Args::parse();
    configure_logger(args.verbose);

    let interrupted = Arc::new(AtomicBool::new(false));
    let int_moved = interrupted.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        int_moved.store(true, Ordering::SeqCst);
    }) {
        log::warn!("no Ctrl-C handler: {}", e);
    }

    if args.output.is_some() && args.files.len() > 1 {
        report(&error!(SyntaxError; "-o WANTS A SINGLE INPUT FILE"));
        return 2;
    }
    let opts = match options(&args) {
        Ok(opts) => opts,
        Err(e) => {
            report(&e);
            return 2;
        }
    };
    let named = args.option.iter().any(|o| o.trim_start().starts_with("app_name"));

    let mut failed = false;
    for file in &args.files {
        if interrupted.load(Ordering::SeqCst) {
            report(&error!(InternalError; "INTERRUPTED"));
            return 1;
        }
        let mut file_opts = opts.clone();
        if !named {
            file_opts.app_name = app_name(file);
        }
        let out = match &args.output {
            Some(o) => o.clone(),
            None => file.with_extension("asm"),
        };
        match compile_file(file, &out, &file_opts) {
            Ok(true) => log::info!("{} -> {}", file.display(), out.display()),
            Ok(false) => failed = true,
            Err(e) => {
                report(&e);
                failed = true;
            }
        }
    }
    if failed {
        1
    } else {
        0
    }
}

fn configure_logger(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn options(args: &Args) -> Result<Options> {
    let mut opts = Options::new();
    let named = [
        ("target", &args.target),
        ("begin_addr", &args.org),
        ("stack_size", &args.stack),
        ("heap_size", &args.heap),
    ];
    for (name, value) in named.iter() {
        if let Some(v) = value {
            opts.apply(&format!("{}={}", name, v))?;
        }
    }
    if args.no_bounds_check {
        opts.check_bounds = false;
    }
    if args.no_stack_check {
        opts.check_stack = false;
    }
    if args.no_optimize {
        opts.optimize = false;
    }
    if args.trace_lines {
        opts.trace_line_numbers = true;
    }
    for setting in &args.option {
        opts.apply(setting)?;
    }
    Ok(opts)
}

fn app_name(file: &Path) -> String {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_default();
    let name: String = stem.chars().filter(|c| c.is_ascii_alphanumeric()).take(8).collect();
    if name.is_empty() {
        Options::default().app_name
    } else {
        name
    }
}

/// Compiles one file. Ok(false) when the program had errors.
fn compile_file(path: &Path, out: &Path, opts: &Options) -> Result<bool> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            log::debug!("{}: {}", path.display(), e);
            return Err(match e.kind() {
                std::io::ErrorKind::NotFound => error!(FileNotFound; &path.display().to_string()),
                _ => error!(InternalError; &format!("{}: {}", path.display(), e)),
            });
        }
    };
    let dir = match path.parent() {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from("."),
    };
    let name = path.display().to_string();
    let mut source = Source::new(&name, &text, Box::new(FileLoader::new(dir)));
    let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let mut diag = CollectDiagnostics::new();
    let asm = compile_stamped(&mut source, opts, &mut diag, Some(stamp));
    for warning in &diag.warnings {
        eprintln!("{}", Colour::Yellow.paint(format!("WARNING {}", warning)));
    }
    for error in &diag.errors {
        eprintln!("{}", Style::new().bold().paint(error.as_str()));
    }
    match asm {
        Some(asm) => {
            if let Err(e) = std::fs::write(out, asm) {
                return Err(error!(InternalError; &format!("{}: {}", out.display(), e)));
            }
            Ok(true)
        }
        None => Ok(false),
    }
}

fn report(error: &Error) {
    eprintln!("{}", Style::new().bold().paint(error.to_string()));
}
