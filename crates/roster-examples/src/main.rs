use facet::Facet;
use figue as args;
use roster_examples::{Options, call_count, dynamic, factory, simple};
use std::io::{self, Write};
use tracing::info;

type AnyResult<T> = Result<T, String>;
type Scenario = fn(&mut dyn Write, Options) -> io::Result<()>;

static SCENARIOS: [(&str, Scenario); 4] = [
    ("simple", simple::run),
    ("dynamic", dynamic::run),
    ("call-count", call_count::run),
    ("factory", factory::run),
];

#[derive(Facet, Debug)]
struct Cli {
    #[facet(flatten)]
    builtins: args::FigueBuiltins,
    /// Print a JSON snapshot of each scenario's chain.
    #[facet(args::named, default)]
    dump: bool,
    #[facet(args::subcommand)]
    command: CommandKind,
}

#[derive(Facet, Debug)]
#[repr(u8)]
enum CommandKind {
    All,
    Simple,
    Dynamic,
    CallCount,
    Factory,
}

struct Config {
    dump: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> AnyResult<()> {
    let cli = parse_cli()?;
    let config = config_from_cli(&cli);
    let options = Options { dump: config.dump };

    dispatch_command(&cli.command, options)
}

fn selected_scenarios(command: &CommandKind) -> &'static [(&'static str, Scenario)] {
    match command {
        CommandKind::All => &SCENARIOS,
        CommandKind::Simple => &SCENARIOS[0..1],
        CommandKind::Dynamic => &SCENARIOS[1..2],
        CommandKind::CallCount => &SCENARIOS[2..3],
        CommandKind::Factory => &SCENARIOS[3..4],
    }
}

fn dispatch_command(command: &CommandKind, options: Options) -> AnyResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for &(name, scenario) in selected_scenarios(command) {
        info!(scenario = name, dump = options.dump, "running scenario");
        writeln!(out, "== {name} ==").map_err(|e| format!("write to stdout: {e}"))?;
        scenario(&mut out, options).map_err(|e| format!("scenario {name} failed: {e}"))?;
    }
    out.flush().map_err(|e| format!("flush stdout: {e}"))
}

fn parse_cli() -> AnyResult<Cli> {
    let figue_config = args::builder::<Cli>()
        .map_err(|e| format!("failed to build CLI schema: {e}"))?
        .cli(|cli| cli.strict())
        .help(|h| {
            h.program_name("roster-examples")
                .description("Run roster scenarios as subcommands")
                .version(option_env!("CARGO_PKG_VERSION").unwrap_or("dev"))
        })
        .build();

    args::Driver::new(figue_config)
        .run()
        .into_result()
        .map(|parsed| parsed.value)
        .map_err(|e| e.to_string())
}

fn config_from_cli(cli: &Cli) -> Config {
    let dump = cli.dump
        || std::env::var("ROSTER_DUMP")
            .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);
    Config { dump }
}
