use std::io::{self, BufRead, IsTerminal};

use at_core::batch::{run_batch, LineFormat};
use at_core::config::Config;
use at_core::logging::init_tracing;
use at_core::repl::run_repl;

const FAST_TIME_SCALE: f64 = 0.1;

fn print_help() {
    println!("asyncterm: simulated async operations terminal");
    println!();
    println!("Usage:");
    println!("  asyncterm                        Interactive terminal");
    println!("  asyncterm \"cmd\" [\"cmd\" ...]      Batch mode (non-interactive)");
    println!("  printf 'servidor\\n' | asyncterm  Batch mode via stdin pipe, one command per line");
    println!();
    println!("Options:");
    println!("  --json     Batch mode: print log lines as JSON, one object per line");
    println!("  --fast     Play every scenario ten times faster");
    println!("  --version  Print version");
    println!("  --help     Print this help");
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return;
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("asyncterm {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if let Some(unknown) = args
        .iter()
        .find(|a| a.starts_with('-') && !matches!(a.as_str(), "--json" | "--fast"))
    {
        eprintln!("error: unknown option '{unknown}'");
        eprintln!("hint: run 'asyncterm --help'");
        std::process::exit(2);
    }

    let json = args.iter().any(|a| a == "--json");
    let fast = args.iter().any(|a| a == "--fast");

    let mut config = Config::load_or_default();
    if fast {
        config.scenarios.speed_up(FAST_TIME_SCALE);
    }
    init_tracing(&config.log);

    // Detect batch mode: positional args or piped stdin
    let positional: Vec<String> = args.iter().filter(|a| !a.starts_with('-')).cloned().collect();
    let commands = if !positional.is_empty() {
        Some(positional)
    } else if !io::stdin().is_terminal() {
        let lines: Vec<String> = io::stdin()
            .lock()
            .lines()
            .map_while(Result::ok)
            .filter(|l| !l.trim().is_empty())
            .collect();
        if lines.is_empty() {
            None
        } else {
            Some(lines)
        }
    } else {
        None
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create async runtime: {e}");
            std::process::exit(1);
        }
    };

    // Batch mode
    if let Some(commands) = commands {
        let format = if json {
            LineFormat::Json
        } else {
            LineFormat::Text
        };
        let code = runtime.block_on(run_batch(&config, &commands, format));
        std::process::exit(code);
    }

    if json {
        eprintln!("warning: --json only applies to batch mode");
    }

    // REPL mode
    if let Err(e) = runtime.block_on(run_repl(&config)) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
