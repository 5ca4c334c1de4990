use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{LevelFilter, debug};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use yang_json::json::{Parsed, parse_reader};
use yang_json::xml_input::parse_xml_reader;
use yang_json::xml_output::to_xml_string;
use yang_json::{BindingMode, CodecSettings, Outcome, Schema, render_many};

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::exit;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Xml,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum LogTarget {
    Stderr,
    Stdout,
    Syslog,
}

struct YangJsonDump {
    settings: CodecSettings,
    input: Option<PathBuf>,
    schema: Option<PathBuf>,
    xml_input: bool,
    output_format: OutputFormat,
    log_level: LevelFilter,
    log_target: LogTarget,
}

impl YangJsonDump {
    pub fn from_cli_matches(matches: &ArgMatches) -> Result<Self> {
        let input = matches
            .get_one::<String>("INPUT")
            .filter(|path| path.as_str() != "-")
            .map(PathBuf::from);

        let binding = match matches.get_one::<String>("binding") {
            Some(mode) => mode.parse::<BindingMode>().map_err(anyhow::Error::msg)?,
            None => BindingMode::default(),
        };

        let log_level = match matches.get_one::<u8>("debug").copied().unwrap_or(0) {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        let log_target = match matches.get_one::<String>("log").map(String::as_str) {
            Some("o") => LogTarget::Stdout,
            Some("s") => LogTarget::Syslog,
            _ => LogTarget::Stderr,
        };

        let output_format = if matches.get_flag("json") {
            OutputFormat::Json
        } else {
            OutputFormat::Xml
        };

        Ok(YangJsonDump {
            settings: CodecSettings::new()
                .pretty(!matches.get_flag("no-indent"))
                .binding(binding)
                .strict_identityref_namespaces(matches.get_flag("strict-identityref")),
            input,
            schema: matches.get_one::<String>("schema").map(PathBuf::from),
            xml_input: matches.get_flag("xml-input"),
            output_format,
            log_level,
            log_target,
        })
    }

    /// Main entry point for `YangJsonDump`. Returns false if the input was
    /// rejected by the schema.
    pub fn run(&self) -> Result<bool> {
        self.try_to_initialize_logging();

        let schema = match &self.schema {
            Some(path) => Some(
                Schema::from_path(path)
                    .with_context(|| format!("Failed to load schema from `{}`", path.display()))?,
            ),
            None => None,
        };

        let reader: Box<dyn Read> = match &self.input {
            Some(path) => Box::new(
                File::open(path).with_context(|| format!("Failed to open file {}", path.display()))?,
            ),
            None => Box::new(io::stdin().lock()),
        };

        let parsed: Parsed = if self.xml_input {
            parse_xml_reader(reader, schema.as_ref(), &self.settings)?
        } else {
            parse_reader(reader, schema.as_ref(), &self.settings)?
        };
        debug!("decoded {} top-level elements", parsed.top.len());

        if let Outcome::Invalid(report) = &parsed.outcome {
            let errors = report.to_document();
            let xml = to_xml_string(&errors, &[errors.root()], &self.settings)?;
            eprint!("{xml}");
            return Ok(false);
        }

        let text = match self.output_format {
            OutputFormat::Json => render_many(&parsed.tree, schema.as_ref(), &parsed.top, &self.settings),
            OutputFormat::Xml => to_xml_string(&parsed.tree, &parsed.top, &self.settings)?,
        };
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        Ok(true)
    }

    fn try_to_initialize_logging(&self) {
        let mode = match self.log_target {
            LogTarget::Stdout => TerminalMode::Stdout,
            LogTarget::Stderr => TerminalMode::Stderr,
            LogTarget::Syslog => {
                eprintln!("syslog logging is not available, logging to stderr");
                TerminalMode::Stderr
            }
        };
        if let Err(e) = TermLogger::init(self.log_level, Config::default(), mode, ColorChoice::Auto) {
            eprintln!("Failed to initialize logging: {e}");
        }
    }
}

fn cli() -> Command {
    Command::new("yang_json_dump")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Translates RFC 7951 JSON into XML, or XML into RFC 7951 JSON")
        .arg(Arg::new("INPUT").help("Input file, standard input if absent or `-`"))
        .arg(
            Arg::new("debug")
                .short('D')
                .value_name("LEVEL")
                .value_parser(clap::value_parser!(u8))
                .help("Debug level: 0 - info, 1 - debug, 2 - trace"),
        )
        .arg(
            Arg::new("log")
                .short('l')
                .value_name("s|e|o")
                .value_parser(["s", "e", "o"])
                .help("Log to syslog (s), stderr (e) or stdout (o)"),
        )
        .arg(
            Arg::new("json")
                .short('j')
                .action(ArgAction::SetTrue)
                .help("Write JSON instead of XML"),
        )
        .arg(
            Arg::new("schema")
                .short('y')
                .long("schema")
                .value_name("FILE")
                .help("Schema description (JSON) to validate and bind against"),
        )
        .arg(
            Arg::new("binding")
                .short('b')
                .long("binding")
                .value_parser(["none", "parent", "top", "rpc"])
                .help("How decoded elements are bound to the schema, `top` by default"),
        )
        .arg(
            Arg::new("xml-input")
                .long("xml-input")
                .action(ArgAction::SetTrue)
                .help("Read XML instead of JSON"),
        )
        .arg(
            Arg::new("no-indent")
                .long("no-indent")
                .action(ArgAction::SetTrue)
                .help("When set, output will not be indented."),
        )
        .arg(
            Arg::new("strict-identityref")
                .long("strict-identityref")
                .action(ArgAction::SetTrue)
                .help("Reject identityref values whose module is not imported"),
        )
}

fn main() {
    let matches = cli().get_matches();
    let outcome = YangJsonDump::from_cli_matches(&matches).and_then(|app| app.run());
    match outcome {
        Ok(true) => {}
        Ok(false) => exit(1),
        Err(e) => {
            eprintln!("{e:?}");
            exit(1)
        }
    }
}
