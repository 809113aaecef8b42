use clap::Parser;
use colored::*;
use scopeconf::cli::{CheckArgs, Cli, CliError, Commands, DumpArgs};
use scopeconf::diagnostics::SourceContext;
use scopeconf::emitter::{EmitterOptions, JsonEmitter, TextEmitter};
use scopeconf::{ConfigParser, ErrorKind, ServerConfig};
use std::process;
use tracing::{debug, warn, Level};

fn main() {
    let cli = Cli::parse();
    cli.color.apply();
    init_tracing(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Check(args) => run_check(args, cli.quiet),
        Commands::Dump(args) => run_dump(args),
    };

    match result {
        Ok(()) => {}
        Err(CliError::Parse(e)) => {
            eprint!("{}", e.render());
            process::exit(1);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

/// Log to stderr; `-v` raises the level from warn up to trace
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, 2) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(colored::control::SHOULD_COLORIZE.should_colorize())
        .with_target(false)
        .init();
}

fn run_check(args: CheckArgs, quiet: bool) -> Result<(), CliError> {
    let mut parser = ConfigParser::with_options(args.source.parse_options());
    let mut failed = 0;

    for file in &args.files {
        let root = match parser.parse_file(file) {
            Ok(root) => root,
            Err(e) if e.kind() == ErrorKind::AlreadyLoaded => {
                warn!(file = file.as_str(), "already loaded through an include, skipping");
                continue;
            }
            Err(e) => {
                eprint!("{}", e.render());
                eprintln!();
                failed += 1;
                continue;
            }
        };

        let servers = match ServerConfig::from_document(parser.arena(), root) {
            Ok(servers) => servers,
            Err(e) => {
                eprint!("{}", e.render());
                eprintln!();
                failed += 1;
                continue;
            }
        };

        if args.warn_unused {
            print_unused(&parser, root);
        }
        if !quiet {
            print_summary(file, &servers);
        }
    }

    debug!(files = args.files.len(), failed, "check finished");
    if failed > 0 {
        return Err(CliError::CheckFailed {
            failed,
            total: args.files.len(),
        });
    }
    Ok(())
}

fn print_unused(parser: &ConfigParser, root: scopeconf::ObjectId) {
    let arena = parser.arena();
    for rule in parser.unused_rules(root) {
        let ctx = SourceContext::of_rule(arena, rule);
        eprintln!(
            "{}: `{}` directive is never used",
            "warning".yellow().bold(),
            arena[rule].key
        );
        eprintln!("  {} {}", "-->".blue().bold(), ctx);
    }
}

fn print_summary(file: &str, servers: &[ServerConfig]) {
    println!("{} {}", "ok".green().bold(), file);
    for server in servers {
        let default = if server.listen.is_default { " (default)" } else { "" };
        println!(
            "  server {} on port {}{}, {} location(s)",
            server.name.bold(),
            server.listen.port,
            default,
            server.locations().len()
        );
        for location in server.locations() {
            println!("    location {} [{}]", location.prefix, location.methods);
        }
    }
}

fn run_dump(args: DumpArgs) -> Result<(), CliError> {
    let mut parser = ConfigParser::with_options(args.source.parse_options());
    let root = parser.parse_file(&args.file)?;

    let options = EmitterOptions {
        provenance: !args.no_provenance,
        ..EmitterOptions::default()
    };
    if args.json {
        println!("{}", JsonEmitter::new(options).emit(parser.arena(), root)?);
    } else {
        print!("{}", TextEmitter::new(options).emit(parser.arena(), root));
    }
    Ok(())
}
