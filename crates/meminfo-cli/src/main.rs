//! `meminfo`: decode smaps region statistics into JSON lines.
//!
//! Each input stream is a `/proc/<pid>/smaps` file (`--pid`) or any file in
//! the same format (`--file`). Records go to stdout, one JSON object per
//! line; logs go to stderr, filtered by `MEMINFO_LOG` (default `warn`).

use std::ffi::OsString;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use meminfo_decoder::{
    DecoderConfig, FieldCatalog, FieldValue, FnSink, RegionHeader, RegionRecord, RegionSummary,
    ScanDriver, ScanReport, SmapsField, StreamId, SummarySink, smaps_path,
};
use meminfo_error::{MeminfoError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::error;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "MEMINFO_LOG";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let exit_code = run_cli(std::env::args_os());
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// One input stream and the identity its records carry.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Input {
    identity: StreamId,
    path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Options {
    inputs: Vec<Input>,
    summary: bool,
    config_path: Option<PathBuf>,
    terminator: Option<String>,
    capacity: Option<usize>,
    max_lines: Option<u64>,
}

impl Options {
    /// Config file first, then flag overrides.
    fn decoder_config(&self) -> Result<DecoderConfig> {
        let mut config = match &self.config_path {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|err| {
                    MeminfoError::config(format!("cannot read {}: {err}", path.display()))
                })?;
                DecoderConfig::from_json_str(&text)?
            }
            None => DecoderConfig::default(),
        };
        if let Some(terminator) = &self.terminator {
            config.terminator_key.clone_from(terminator);
        }
        if let Some(capacity) = self.capacity {
            config.table_capacity = capacity;
        }
        if self.max_lines.is_some() {
            config.max_lines_per_stream = self.max_lines;
        }
        config.validate()?;
        Ok(config)
    }
}

fn run_cli<I>(os_args: I) -> i32
where
    I: IntoIterator<Item = OsString>,
{
    let raw: Vec<String> = os_args
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    let tail = if raw.len() > 1 { &raw[1..] } else { &[] };

    if tail.is_empty() || tail.iter().any(|a| a == "-h" || a == "--help") {
        print_help();
        return 0;
    }

    let options = match parse_args(tail) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("error: {message}");
            return 2;
        }
    };

    let config = match options.decoder_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return 2;
        }
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let result = run(&options, &config, &mut out).and_then(|report| {
        out.flush()?;
        Ok(report)
    });
    match result {
        Ok(_) => 0,
        Err(err) => {
            error!(error = %err, "run aborted");
            eprintln!("error: {err}");
            1
        }
    }
}

fn parse_args(tail: &[String]) -> std::result::Result<Options, String> {
    let mut options = Options::default();
    let mut file_ordinal = 0u64;

    let mut i = 0;
    while i < tail.len() {
        let flag = tail[i].as_str();
        match flag {
            "--summary" => options.summary = true,
            "--pid" | "--file" | "--config" | "--terminator" | "--capacity" | "--max-lines" => {
                i += 1;
                let Some(value) = tail.get(i) else {
                    return Err(format!("{flag} requires a value"));
                };
                match flag {
                    "--pid" => {
                        let pid: u32 = value
                            .parse()
                            .map_err(|_| format!("--pid expects a process id, got `{value}`"))?;
                        options.inputs.push(Input {
                            identity: StreamId(u64::from(pid)),
                            path: smaps_path(pid),
                        });
                    }
                    "--file" => {
                        file_ordinal += 1;
                        options.inputs.push(Input {
                            identity: StreamId(file_ordinal),
                            path: PathBuf::from(value),
                        });
                    }
                    "--config" => options.config_path = Some(PathBuf::from(value)),
                    "--terminator" => options.terminator = Some(value.clone()),
                    "--capacity" => {
                        let capacity = value
                            .parse()
                            .map_err(|_| format!("--capacity expects a number, got `{value}`"))?;
                        options.capacity = Some(capacity);
                    }
                    _ => {
                        let limit = value
                            .parse()
                            .map_err(|_| format!("--max-lines expects a number, got `{value}`"))?;
                        options.max_lines = Some(limit);
                    }
                }
            }
            other => return Err(format!("unknown option `{other}`")),
        }
        i += 1;
    }

    if options.inputs.is_empty() {
        return Err("no input streams; pass --pid or --file".to_owned());
    }
    Ok(options)
}

fn run<W: Write>(options: &Options, config: &DecoderConfig, out: &mut W) -> Result<ScanReport> {
    let catalog = SmapsField::catalog(config)?;
    let driver = ScanDriver::new(&catalog, config);
    let files = options
        .inputs
        .iter()
        .map(|input| (input.identity, input.path.as_path()));

    if options.summary {
        let mut sink = SummarySink::new(catalog.slot_count());
        let report = driver.scan_files(files, &mut sink)?;
        for summary in sink.into_summaries() {
            write_json_line(&mut *out, &summary_line(&catalog, &summary))?;
        }
        Ok(report)
    } else {
        let mut sink = FnSink(|record: RegionRecord| {
            write_json_line(&mut *out, &RecordLine::new(&catalog, &record))
        });
        driver.scan_files(files, &mut sink)
    }
}

fn write_json_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value)
        .map_err(|err| MeminfoError::internal(format!("JSON encoding: {err}")))?;
    out.write_all(b"\n")?;
    Ok(())
}

#[derive(Serialize)]
struct RecordLine<'a> {
    identity: StreamId,
    #[serde(flatten)]
    header: &'a RegionHeader,
    #[serde(flatten)]
    values: Map<String, Value>,
}

impl<'a> RecordLine<'a> {
    /// Every catalog slot gets a column; absent slots read as 0.
    fn new(catalog: &FieldCatalog, record: &'a RegionRecord) -> Self {
        let values = catalog
            .fields()
            .map(|(slot, name)| {
                let column = SmapsField::from_slot(slot)
                    .map_or_else(|| name.to_owned(), |field| field.column_name().to_owned());
                let value = match record.value(slot) {
                    Some(FieldValue::Integer(value)) => Value::from(*value),
                    Some(FieldValue::Text(text)) => Value::from(text.as_str()),
                    None => Value::from(0),
                };
                (column, value)
            })
            .collect();
        Self {
            identity: record.identity(),
            header: record.header(),
            values,
        }
    }
}

fn summary_line(catalog: &FieldCatalog, summary: &RegionSummary) -> Map<String, Value> {
    let mut line = Map::new();
    line.insert("identity".to_owned(), Value::from(summary.identity.0));
    line.insert("regions".to_owned(), Value::from(summary.regions));
    for (slot, _) in catalog.fields() {
        match SmapsField::from_slot(slot) {
            Some(SmapsField::VmFlags) | None => {}
            Some(field) => {
                line.insert(
                    field.column_name().to_owned(),
                    Value::from(summary.total(slot)),
                );
            }
        }
    }
    line
}

fn print_help() {
    let text = "\
meminfo - Decode smaps region statistics into JSON lines

USAGE:
    meminfo [OPTIONS] (--pid <PID> | --file <PATH>)...

OPTIONS:
    --pid <PID>           Read /proc/<PID>/smaps (repeatable)
    --file <PATH>         Read an smaps-format file (repeatable; numbered 1, 2, ...)
    --summary             One total per stream instead of one line per region
    --config <JSON>       Load decoder settings from a JSON file
    --terminator <KEY>    Field key that closes a region (default: VmFlags)
    --capacity <N>        Symbol table bucket count (default: 64)
    --max-lines <N>       Stop each stream after N lines
    -h, --help            Show this help message

ENVIRONMENT:
    MEMINFO_LOG           Log filter for stderr (default: warn)

EXAMPLES:
    meminfo --pid 1
    meminfo --summary --pid 1 --pid 4242
    meminfo --file smaps.txt --max-lines 100000
";
    let _ = io::stdout().write_all(text.as_bytes());
}
