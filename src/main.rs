use clap::{ArgAction, Parser};
use log::LevelFilter;
use std::path::PathBuf;
use std::process::exit;
use std::str::FromStr;
use tlsinfo::report::{output, report, Field, FieldSet, OutputFormat};
use tlsinfo::time::SystemClock;
use tlsinfo::{CheckConfig, Connector, TLSCheckError, Target};

#[derive(Parser, Debug)]
#[command(name = "tlsinfo", version, author, about, long_about = None)]
struct Cli {
    /// Hostname of the server to check
    hostname: String,

    /// Port number of the server to check
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Print all information (default when no field is selected)
    #[arg(long)]
    all: bool,

    /// Print certificate expiry date
    #[arg(long)]
    expiry: bool,

    /// Print certificate issuance date
    #[arg(long)]
    issue: bool,

    /// Print days until certificate expiry date
    #[arg(long)]
    days: bool,

    /// Print negotiated TLS version
    #[arg(long)]
    tls: bool,

    /// Print negotiated cipher suite
    #[arg(long)]
    ciphers: bool,

    /// Print certificate issuer information
    #[arg(long)]
    issuer: bool,

    /// Connect and handshake timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = tlsinfo::config::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// PEM file with the only root certificates to trust
    #[arg(long, value_name = "PATH")]
    ca_file: Option<PathBuf>,

    /// Output format: text, json, table
    #[arg(short, long, default_value = "text", value_parser = OutputFormat::from_str)]
    output: OutputFormat,

    /// Increase log verbosity on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn fields(&self) -> FieldSet {
        let flags = [
            (self.expiry, Field::Expiry),
            (self.issue, Field::Issue),
            (self.days, Field::Days),
            (self.tls, Field::Tls),
            (self.ciphers, Field::Ciphers),
            (self.issuer, Field::Issuer),
        ];
        let selected = flags
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, field)| *field);
        FieldSet::from_selection(self.all, selected)
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();
}

fn run(cli: &Cli) -> Result<String, TLSCheckError> {
    let target = Target::new(cli.hostname.as_str(), cli.port)?;
    let config = CheckConfig::from_cli_args(Some(cli.timeout), cli.ca_file.as_deref())?;
    let fields = cli.fields();
    log::debug!("checking {} for {:?} with {:?}", target, fields, config);

    let session = Connector::new(config).connect(&target)?;
    let report = report(&session, fields, &SystemClock)?;
    output::render(&report, cli.output)
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match run(&cli) {
        Ok(rendered) => {
            println!("{}", rendered);
            exit(0);
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            exit(err.exit_code());
        }
    }
}
