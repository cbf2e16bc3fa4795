use std::fs::File;
use std::io::{Read, Write, stdin, stdout};
use std::path::Path;

use anyhow::Context;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use psglog::chip::Channel;
use psglog::convert::version_string;
use psglog::{ConvertConfig, ConvertReport, Converter, StreamStats, VgmDocument};
use unicode_width::UnicodeWidthStr;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Pad `s` on the right to `width` terminal columns (fullwidth aware).
fn pad_to_width(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    if w >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - w))
    }
}

fn is_stdio(path: &Path) -> bool {
    path == Path::new("-")
}

fn gunzip(bytes: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .context("failed to decompress gzip data")?;
    Ok(out)
}

/// Read VGM bytes from a path or stdin ('-').
///
/// Gzipped input (`.vgz`, or any input starting with the gzip magic) is
/// decompressed.
pub fn read_vgm_as_vec(path: &Path) -> anyhow::Result<Vec<u8>> {
    let mut raw = Vec::new();
    if is_stdio(path) {
        stdin()
            .read_to_end(&mut raw)
            .context("failed to read from stdin")?;
    } else {
        File::open(path)
            .with_context(|| format!("failed to open input file: {}", path.display()))?
            .read_to_end(&mut raw)
            .with_context(|| format!("failed to read input file: {}", path.display()))?;
    }

    let is_vgz = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("vgz"))
        .unwrap_or(false);

    if is_vgz || raw.starts_with(&GZIP_MAGIC) {
        log::debug!("{}: gzip input", path.display());
        gunzip(&raw)
    } else {
        Ok(raw)
    }
}

/// Write `bytes` to a path or stdout ('-'), gzipping when asked.
fn write_output(path: &Path, bytes: &[u8], gzip: bool) -> anyhow::Result<()> {
    let data = if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(bytes)?;
        encoder.finish().context("failed to compress output")?
    } else {
        bytes.to_vec()
    };

    if is_stdio(path) {
        let mut out = stdout().lock();
        out.write_all(&data).context("failed to write to stdout")?;
        out.flush()?;
    } else {
        std::fs::write(path, &data)
            .with_context(|| format!("failed to write output file: {}", path.display()))?;
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    match path.canonicalize() {
        Ok(p) => p.to_string_lossy().into_owned(),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}

/// Convert command: read, convert, write, and print the report to stderr.
pub fn convert(
    input: &Path,
    data: Vec<u8>,
    output: &Path,
    config: ConvertConfig,
    gzip: bool,
) -> anyhow::Result<()> {
    let converter = Converter::new(config)?;
    let result = converter
        .convert_vgm(&data)
        .with_context(|| format!("\"{}\": conversion failed", display_name(input)))?;

    write_output(output, &result.bytes, gzip)?;

    log::info!(
        "{} -> {}: {} -> {} bytes",
        input.display(),
        output.display(),
        data.len(),
        result.bytes.len()
    );
    eprintln!("{}", report_table(&result.report, data.len(), result.bytes.len()));
    Ok(())
}

fn report_table(report: &ConvertReport, file_in: usize, file_out: usize) -> Table {
    let rows: Vec<(&str, String)> = vec![
        ("File size", format!("{} -> {} bytes", file_in, file_out)),
        ("Commands", format!("{} -> {}", report.input_operations, report.output_operations)),
        ("Tick", format!("{} samples", report.tick_samples)),
        ("Ticks with writes", report.ticks_emitted.to_string()),
        ("Redundant writes removed", report.redundant_writes_removed.to_string()),
        ("Filtered writes", report.filtered_writes.to_string()),
        ("Foreign commands dropped", report.dropped_foreign.to_string()),
        ("Second chip writes dropped", report.dropped_secondary.to_string()),
        ("Data blocks dropped", report.dropped_data_blocks.to_string()),
        ("Tones retuned", report.retuned_tones.to_string()),
        ("Tones clamped", report.clamped_tones.to_string()),
        ("Zero tones", report.degenerate_tones.to_string()),
        ("Unpaired tone data", report.unpaired_tone_data.to_string()),
    ];

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    for (k, v) in rows {
        table.add_row(vec![Cell::new(k), Cell::new(v).set_alignment(CellAlignment::Right)]);
    }
    table
}

/// Header and tag fields for display, in file order.
fn summarize_doc(doc: &VgmDocument) -> Vec<(String, String)> {
    let h = &doc.header;
    let seconds = h.total_samples as f64 / 44100.0;
    let mut rows = vec![
        ("Version".to_string(), version_string(h.version)),
        (
            "SN76489 clock".to_string(),
            format!(
                "{} Hz{}",
                h.sn76489_clock_hz(),
                if h.is_dual_chip() { " (dual chip)" } else { "" }
            ),
        ),
        (
            "Noise".to_string(),
            format!("feedback 0x{:04X}, width {}", h.sn_fb, h.snw),
        ),
        (
            "Total samples".to_string(),
            format!("{} ({:.3} s @ 44100Hz)", h.total_samples, seconds),
        ),
        (
            "Loop".to_string(),
            if h.loop_offset == 0 {
                "(none)".to_string()
            } else {
                format!("0x{:08X}, {} samples", h.loop_offset, h.loop_samples)
            },
        ),
        ("Data start".to_string(), format!("0x{:X}", h.data_start())),
        (
            "Data blocks".to_string(),
            format!(
                "{} ({} bytes)",
                doc.commands.data_blocks.len(),
                doc.commands
                    .data_blocks
                    .iter()
                    .map(|b| b.data.len())
                    .sum::<usize>()
            ),
        ),
    ];
    if let Some(gd3) = &doc.gd3 {
        for (field, value) in gd3.iter() {
            rows.push((field.label().to_string(), value.to_string()));
        }
    }
    rows
}

fn print_fields(rows: &[(String, String)]) {
    let col0 = rows
        .iter()
        .map(|(k, _)| UnicodeWidthStr::width(k.as_str()))
        .chain([UnicodeWidthStr::width("Field")])
        .max()
        .unwrap_or(0);

    for (k, v) in rows {
        for (i, line) in v.split('\n').enumerate() {
            let key = if i == 0 { k.as_str() } else { "" };
            println!("{}  {}", pad_to_width(key, col0), line);
        }
    }
}

fn stats_rows(stats: &StreamStats) -> Vec<(String, String)> {
    let mut rows = vec![
        ("Commands".to_string(), stats.commands.to_string()),
        ("Register writes".to_string(), stats.writes.to_string()),
        ("Tone latches".to_string(), stats.tone_latches.to_string()),
        ("Volume latches".to_string(), stats.volume_latches.to_string()),
        ("Data writes".to_string(), stats.data_writes.to_string()),
        ("Wait commands".to_string(), stats.waits.to_string()),
        ("Other chip commands".to_string(), stats.foreign.to_string()),
        ("Longest write run".to_string(), stats.longest_write_run.to_string()),
        ("Unique writes".to_string(), stats.unique_writes.len().to_string()),
        ("Unique waits".to_string(), stats.unique_waits.len().to_string()),
        ("Unique tones".to_string(), stats.unique_tones.len().to_string()),
        (
            "Shortest wait".to_string(),
            stats
                .shortest_wait
                .map_or("-".to_string(), |w| format!("{} samples", w)),
        ),
        (
            "Largest data byte".to_string(),
            stats
                .largest_data
                .map_or("-".to_string(), |d| format!("0x{:02X}", d)),
        ),
        ("Wait samples".to_string(), stats.total_wait_samples.to_string()),
    ];
    for ch in Channel::ALL {
        rows.push((
            format!("{} tone/volume events", ch),
            format!("{} / {}", stats.tone_events(ch), stats.volume_events(ch)),
        ));
    }
    rows.push(("Encoded size".to_string(), format!("{} bytes", stats.encoded_bytes)));
    rows.push((
        "One byte per command".to_string(),
        format!("{} bytes", stats.one_byte_per_command_size()),
    ));
    rows.push((
        "Packed events".to_string(),
        format!(
            "{} tone + {} volume bytes",
            stats.packed_tone_bytes(),
            stats.packed_volume_bytes()
        ),
    ));
    rows
}

/// Info command: header, tags and statistics, optionally side by side with
/// the converted stream.
pub fn info(path: &Path, data: Vec<u8>, convert: Option<ConvertConfig>) -> anyhow::Result<()> {
    let file_str = display_name(path);

    let doc = match VgmDocument::try_from(&data[..]) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("\"{}\": parse error: {}", file_str, e);
            return Ok(());
        }
    };

    println!("\"{}\"", file_str);
    print_fields(&summarize_doc(&doc));
    println!();

    let source = stats_rows(&StreamStats::from_operations(doc.operations()));
    let converted = match convert {
        Some(config) => {
            let output = Converter::new(config)?
                .convert_vgm(&data)
                .with_context(|| format!("\"{}\": conversion failed", file_str))?;
            Some(stats_rows(&StreamStats::from_operations(&output.operations)))
        }
        None => None,
    };

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    let mut header = vec![Cell::new("Statistic"), Cell::new("Source")];
    if converted.is_some() {
        header.push(Cell::new("Converted"));
    }
    table.set_header(header);

    for (i, (k, v)) in source.iter().enumerate() {
        let mut row = vec![Cell::new(k), Cell::new(v).set_alignment(CellAlignment::Right)];
        if let Some(conv) = &converted {
            let cv = conv.get(i).map(|(_, v)| v.as_str()).unwrap_or("");
            row.push(Cell::new(cv).set_alignment(CellAlignment::Right));
        }
        table.add_row(row);
    }
    println!("{}", table);

    Ok(())
}
