use std::{
    io::{self, BufRead, Read, Write},
    process::ExitCode,
};

use annotate_snippets::Renderer;
use clap::{Parser, Subcommand};
use clio::Input;

use system_f::{error::CompilationError, parsing, pipeline::Session};

#[derive(Parser)]
#[command(
    version,
    about, long_about = None,
    disable_help_subcommand = true
)]
struct Cli {
    /// Render diagnostics without colours.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    subcommands: Subcommands,
}

#[derive(Subcommand)]
enum Subcommands {
    /// Parse source, displaying a representation on stdout
    Parse {
        /// Source file to use.
        #[arg(default_value = "-")]
        source_file: Input,
    },
    /// Execute every statement of the source, displaying each outcome on stdout
    Run {
        /// Source file to use.
        #[arg(default_value = "-")]
        source_file: Input,
    },
    /// Read statements from stdin interactively, executing each once terminated by `;`
    Repl,
}

fn read_source(source_file: &mut Input) -> Result<(String, String), String> {
    let mut input = String::new();
    source_file
        .read_to_string(&mut input)
        .map_err(|e| format!("failed to read input:\n{e}"))?;
    Ok((input, source_file.to_string()))
}

fn parse(input: &str) -> Result<String, CompilationError> {
    let parser = parsing::Parser::default();
    let statements = parser.parse_program(input)?;
    Ok(format!("{statements:#?}"))
}

fn repl(renderer: &Renderer) -> Result<(), String> {
    let mut session = Session::new();
    let mut lines = io::stdin().lock().lines();
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() { "> " } else { "| " };
        print!("{prompt}");
        io::stdout()
            .flush()
            .map_err(|e| format!("failed to write prompt:\n{e}"))?;

        let Some(line) = lines.next() else {
            println!();
            return Ok(());
        };
        let line = line.map_err(|e| format!("failed to read input:\n{e}"))?;
        buffer.push_str(&line);
        buffer.push('\n');

        if parsing::has_terminator(&buffer) {
            for output in session.run_rendered(&buffer, "<repl>", renderer) {
                println!("{output}");
            }
            buffer.clear();
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    // Only initialize if RUST_LOG is set
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn program() -> Result<(), String> {
    let cli = Cli::parse();
    init_tracing();

    let renderer = if cli.plain {
        Renderer::plain()
    } else {
        Renderer::styled()
    };

    match cli.subcommands {
        Subcommands::Parse { mut source_file } => {
            let (input, origin) = read_source(&mut source_file)?;
            match parse(&input) {
                Ok(res) => println!("{res}"),
                Err(err) => println!("{}", err.render(&input, &origin, &renderer)),
            }
        }
        Subcommands::Run { mut source_file } => {
            let (input, origin) = read_source(&mut source_file)?;
            for output in Session::new().run_rendered(&input, &origin, &renderer) {
                println!("{output}");
            }
        }
        Subcommands::Repl => repl(&renderer)?,
    }

    Ok(())
}

fn main() -> ExitCode {
    match program() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
