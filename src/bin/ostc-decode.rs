//! ostc-decode - decode an OSTC memory dump into a dive logbook
//!
//! Usage:
//!   ostc-decode <dump>                    - Print the device status and a summary per dive
//!   ostc-decode <dump> --model mk2        - Decode a dump with extended profile memory
//!   ostc-decode <dump> --json             - Print the decoded logbook as JSON
//!
//! Log verbosity follows `RUST_LOG`, e.g. `RUST_LOG=ostc_decode=debug`.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use ostc_dump::avec::{DecodedDive, SkippedDive};
use ostc_dump::sans::status::{DeviceInfo, PROFILE_LEN_MK1, PROFILE_LEN_MK2, STATUS_LEN};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ostc-decode")]
#[command(about = "Decode an OSTC dive computer memory dump")]
#[command(version)]
struct Args {
    /// Path to the memory dump
    dump: PathBuf,

    /// Device generation, selecting the profile memory size
    #[arg(short, long, value_enum, env = "OSTC_MODEL", default_value = "mk1")]
    model: Model,

    /// Profile memory size in bytes (overrides --model)
    #[arg(long, env = "OSTC_PROFILE_LEN")]
    profile_len: Option<usize>,

    /// Print a JSON document instead of a summary table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Model {
    /// 32 KiB profile memory
    Mk1,
    /// 64 KiB profile memory
    Mk2,
}

impl Model {
    fn profile_len(self) -> usize {
        match self {
            Model::Mk1 => PROFILE_LEN_MK1,
            Model::Mk2 => PROFILE_LEN_MK2,
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    device: DeviceInfo,
    dives: Vec<&'a DecodedDive>,
    skipped: Vec<SkippedReport>,
}

#[derive(Serialize)]
struct SkippedReport {
    index: usize,
    offset: usize,
    error: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ostc_decode=info".parse()?))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let profile_len = args.profile_len.unwrap_or(args.model.profile_len());
    let expected = STATUS_LEN
        .checked_add(profile_len)
        .with_context(|| format!("Profile length of {profile_len} bytes is too large"))?;

    let data = std::fs::read(&args.dump)
        .with_context(|| format!("Failed to read {}", args.dump.display()))?;

    let (status, dives) = ostc_dump::decode_dump(&data, profile_len)
        .with_context(|| format!("Failed to decode {}", args.dump.display()))?;

    if !status.has_preamble() {
        warn!(preamble = ?status.preamble, "Dump does not open with the expected preamble");
    }
    if data.len() < expected {
        warn!(
            len = data.len(),
            expected,
            "Dump is shorter than the profile memory"
        );
    }

    let device = status.info();
    info!(
        serial = device.serial,
        dive_count = device.dive_count,
        voltage = device.voltage,
        firmware = ?device.firmware,
        "Decoded status block"
    );

    for (index, dive) in dives.iter().enumerate() {
        match dive {
            Ok(dive) => debug!(
                index,
                offset = dive.offset,
                start = %dive.start_time,
                samples = dive.samples.len(),
                "Decoded dive"
            ),
            Err(skipped) => log_skipped(index, skipped),
        }
    }

    let decoded = dives.iter().filter(|d| d.is_ok()).count();
    info!(decoded, skipped = dives.len() - decoded, "Decoded profile memory");

    let mut out = io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &report(device, &dives))?;
        writeln!(out)?;
    } else {
        write_summary(&mut out, &device, &dives)?;
    }

    Ok(())
}

fn log_skipped(index: usize, skipped: &SkippedDive) {
    let (date, max_depth) = match &skipped.header {
        Some(header) => (header.end_time(), Some(header.max_depth_m())),
        None => (None, None),
    };

    warn!(
        index,
        offset = skipped.offset,
        date = ?date,
        max_depth = ?max_depth,
        error = %skipped.error,
        "Skipped dive"
    );
}

fn report(device: DeviceInfo, dives: &[Result<DecodedDive, SkippedDive>]) -> Report<'_> {
    Report {
        device,
        dives: dives.iter().filter_map(|d| d.as_ref().ok()).collect(),
        skipped: dives
            .iter()
            .enumerate()
            .filter_map(|(index, d)| d.as_ref().err().map(|s| (index, s)))
            .map(|(index, s)| SkippedReport {
                index,
                offset: s.offset,
                error: s.error.to_string(),
            })
            .collect(),
    }
}

fn write_summary(
    out: &mut impl Write,
    device: &DeviceInfo,
    dives: &[Result<DecodedDive, SkippedDive>],
) -> io::Result<()> {
    writeln!(
        out,
        "Serial {}, {} dives, battery {} mV, firmware {}.{}",
        device.serial, device.dive_count, device.voltage, device.firmware.0, device.firmware.1
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "{:>3}  {:<19}  {:>7}  {:>8}  {:>6}  {:>7}  {:>4}",
        "#", "Start", "Depth", "Duration", "Temp", "Samples", "Deco"
    )?;

    for (index, dive) in dives.iter().enumerate() {
        match dive {
            Ok(dive) => writeln!(
                out,
                "{:>3}  {}  {:>5.1} m  {:>5}:{:02}  {:>4.1} C  {:>7}  {:>4}",
                index,
                dive.start_time,
                dive.max_depth,
                dive.duration / 60,
                dive.duration % 60,
                dive.min_temperature,
                dive.samples.len(),
                dive.samples.iter().filter(|s| s.deco_alarm).count(),
            )?,
            Err(skipped) => writeln!(
                out,
                "{:>3}  Skipped at offset {}: {}",
                index, skipped.offset, skipped.error
            )?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(path: &str) -> (DeviceInfo, Vec<Result<DecodedDive, SkippedDive>>) {
        let data = std::fs::read(path).unwrap();
        let (status, dives) = ostc_dump::decode_dump(&data, PROFILE_LEN_MK1).unwrap();
        (status.info(), dives)
    }

    #[test]
    fn args_select_profile_len() {
        let args = Args::try_parse_from(["ostc-decode", "dump.bin", "--model", "mk2"]).unwrap();
        assert_eq!(args.model.profile_len(), PROFILE_LEN_MK2);
        assert_eq!(args.profile_len, None);
        assert!(!args.json);

        let args =
            Args::try_parse_from(["ostc-decode", "dump.bin", "--profile-len", "1024", "--json"])
                .unwrap();
        assert_eq!(args.profile_len, Some(1024));
        assert!(args.json);

        assert!(Args::try_parse_from(["ostc-decode", "dump.bin", "--model", "mk3"]).is_err());
    }

    #[test]
    fn summary_table() {
        let (device, dives) = decode("fixtures/ostc-mk1.dump");

        let mut out = Vec::new();
        write_summary(&mut out, &device, &dives).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<_> = out.lines().collect();

        assert_eq!(
            lines[0],
            "Serial 155, 23 dives, battery 4142 mV, firmware 1.26"
        );
        assert_eq!(lines.len(), 3 + 5);
        assert_eq!(
            lines[3],
            "  0  2009-01-31 23:08:51   75.0 m     32:09  27.5 C      193    24"
        );
    }

    #[test]
    fn summary_table_skipped_dive() {
        let (device, dives) = decode("fixtures/ostc-mk1-broken.dump");

        let mut out = Vec::new();
        write_summary(&mut out, &device, &dives).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert_eq!(out.lines().count(), 3 + 32);
        assert!(out.lines().any(|l| l
            == " 30  Skipped at offset 30081: Invalid sample 99: announced 122 extra bytes, consumed 4."));
    }

    #[test]
    fn json_report() {
        let (device, dives) = decode("fixtures/ostc-mk1-broken.dump");

        let json = serde_json::to_value(report(device, &dives)).unwrap();

        assert_eq!(json["device"]["serial"], device.serial);
        assert_eq!(json["dives"].as_array().unwrap().len(), 31);
        assert_eq!(json["skipped"].as_array().unwrap().len(), 1);
        assert_eq!(json["skipped"][0]["index"], 30);
        assert_eq!(json["skipped"][0]["offset"], 30081);

        let first = &json["dives"][0];
        assert_eq!(first["offset"], dives[0].as_ref().unwrap().offset);
        assert_eq!(
            first["samples"].as_array().unwrap().len(),
            dives[0].as_ref().unwrap().samples.len()
        );
    }
}
