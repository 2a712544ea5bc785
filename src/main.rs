use hdlsim::*;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use log::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The .hdl file holding the chip under test.
    filename: String,

    /// Test vectors to run. Defaults to the .tst file next to the chip.
    #[arg(long)]
    test: Option<String>,

    /// Extra directories searched for chip files.
    #[arg(long)]
    lib: Vec<String>,

    /// The chip to test, if not the first one in the file.
    #[arg(long)]
    top: Option<String>,

    /// Print the report as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Only check the chips for errors.
    #[arg(long, default_value_t = false)]
    check: bool,

    #[arg(short, long, default_value_t = false)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug)?;

    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = cancelled.clone();
        ctrlc::set_handler(move || {
            cancelled.store(true, Ordering::SeqCst);
        })?;
    }

    let library = Library::new(args.lib.iter().map(PathBuf::from).collect());
    let (registry, first_chip) = match library.load(&args.filename) {
        Ok(loaded) => loaded,
        Err(errors) => {
            print_errors(&errors);
            std::process::exit(2);
        },
    };
    let top = args.top.unwrap_or(first_chip);

    if let Err(errors) = registry.check_all() {
        print_errors(&errors);
        std::process::exit(2);
    }
    let interface = match registry.interface(&top) {
        Ok(interface) => interface,
        Err(error) => {
            print_errors(&[error]);
            std::process::exit(2);
        },
    };

    let test_filename = args.test.or_else(|| testbench_for(&args.filename));
    let test_filename = match test_filename {
        Some(test_filename) if !args.check => test_filename,
        _ => {
            println!("{top}: OK");
            return Ok(());
        },
    };

    info!("Using test file: {test_filename}");
    let vectors = match load_test_vectors(&test_filename).and_then(|vectors| {
        vectors.validate_for(&top, &interface)?;
        Ok(vectors)
    }) {
        Ok(vectors) => vectors,
        Err(error) => {
            eprintln!("{test_filename}: {error}");
            std::process::exit(2);
        },
    };

    let runner = TestRunner::new(&registry);
    let mut results = vec![];
    for result in runner.run(&top, &vectors) {
        results.push(result);
        if cancelled.load(Ordering::SeqCst) {
            warn!("Cancelled after {} of {} rows", results.len(), vectors.rows().len());
            break;
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&json_report(&top, &results))?);
    } else {
        print!("{}", text_report(&top, &results));
    }

    let summary = Summary::from_results(&results);
    if summary.all_passed() && !cancelled.load(Ordering::SeqCst) {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn print_errors(errors: &[HdlError]) {
    for error in errors {
        let loc = error.loc();
        if loc.is_unknown() {
            eprintln!("{error}");
        } else {
            eprintln!("{loc}: {error}");
        }
    }
    eprintln!("Found {} error(s).", errors.len());
}

fn testbench_for(filename: &str) -> Option<String> {
    let path = std::path::Path::new(filename);
    let stem = path.file_stem()?.to_str()?;
    let tst_filename = path.with_file_name(format!("{stem}.tst"));
    let exists = std::fs::metadata(&tst_filename).map(|metadata| metadata.is_file()).unwrap_or(false);

    if exists {
        tst_filename.into_os_string().into_string().ok()
    } else {
        None
    }
}

fn init_logging(debug: bool) -> anyhow::Result<()> {
    use chrono::{DateTime, Utc};

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            let now: DateTime<Utc> = Utc::now();
            out.finish(format_args!(
                "[{} {} {}] {}",
                now.format("%Y-%m-%dT%H:%M:%S%.fZ"),
                record.level(),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr());

    let level = std::env::var("LEVEL").unwrap_or_default().to_string();

    if debug || level == "DEBUG" {
        dispatch = dispatch.level(log::LevelFilter::Debug);
    } else if level == "TRACE" {
        dispatch = dispatch.level(log::LevelFilter::Trace);
    } else if level == "INFO" {
        dispatch = dispatch.level(log::LevelFilter::Info);
    } else {
        dispatch = dispatch.level(log::LevelFilter::Warn);
    }

    dispatch.apply()?;
    Ok(())
}
