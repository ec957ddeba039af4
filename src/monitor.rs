// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Phase timing and the HTML memory/usage reports.
//!
//! Every long-running stage of a run is wrapped in
//! [`RunMonitor::phase`], which prints the familiar
//! `<description>… finished in N ms.` line to stderr and records the
//! measurement. With `--output-memory-usage` the collected phases and
//! byte figures are written as a small self-contained HTML page with the
//! raw data embedded as JSON, so the numbers stay scriptable.

use std::io::{self, Write};
use std::time::Instant;

use serde::Serialize;

use crate::index::SizeTree;

#[derive(Debug, Clone, Serialize)]
struct PhaseRecord {
    name: String,
    start_ms: u64,
    duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
struct ByteRecord {
    label: String,
    bytes: u64,
}

/// Collects phase timings and byte accounting for one process run.
pub struct RunMonitor {
    started: Instant,
    phases: Vec<PhaseRecord>,
    bytes: Vec<ByteRecord>,
    log: bool,
}

impl Default for RunMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl RunMonitor {
    pub fn new() -> Self {
        RunMonitor {
            started: Instant::now(),
            phases: Vec::new(),
            bytes: Vec::new(),
            log: true,
        }
    }

    /// A monitor that records but stays off stderr; for tests and
    /// benchmarks.
    pub fn quiet() -> Self {
        RunMonitor { log: false, ..Self::new() }
    }

    /// Run `f` as a named phase, reporting its wall time on stderr.
    pub fn phase<T>(&mut self, name: &str, f: impl FnOnce() -> T) -> T {
        if self.log {
            eprint!("{}…", name);
            io::stderr().flush().ok();
        }
        let start = Instant::now();
        let result = f();
        let duration = start.elapsed();
        if self.log {
            eprintln!(" finished in {} ms.", duration.as_millis());
        }
        self.phases.push(PhaseRecord {
            name: name.to_string(),
            start_ms: start.duration_since(self.started).as_millis() as u64,
            duration_ms: duration.as_millis() as u64,
        });
        result
    }

    /// Attach a byte figure (structure size, file size) to the report.
    pub fn note_bytes(&mut self, label: &str, bytes: u64) {
        self.bytes.push(ByteRecord {
            label: label.to_string(),
            bytes,
        });
    }

    pub fn total_elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    /// Self-contained HTML report of the run.
    pub fn write_html<W: Write>(&self, out: &mut W) -> io::Result<()> {
        #[derive(Serialize)]
        struct Report<'a> {
            phases: &'a [PhaseRecord],
            bytes: &'a [ByteRecord],
            total_ms: u64,
        }
        let report = Report {
            phases: &self.phases,
            bytes: &self.bytes,
            total_ms: self.total_elapsed_ms() as u64,
        };
        let data = serde_json::to_string(&report).expect("report serialisation cannot fail");

        let longest = self.phases.iter().map(|p| p.duration_ms).max().unwrap_or(1).max(1);
        writeln!(out, "<!DOCTYPE html>")?;
        writeln!(out, "<html><head><meta charset=\"utf-8\">")?;
        writeln!(out, "<title>stitch run report</title>")?;
        writeln!(
            out,
            "<style>body{{font-family:monospace}}.bar{{background:#4a7;height:1em;display:inline-block}}td{{padding:0 .6em}}</style>"
        )?;
        writeln!(out, "</head><body>")?;
        writeln!(out, "<h1>stitch run report</h1>")?;
        writeln!(out, "<h2>Phases</h2><table>")?;
        for p in &self.phases {
            let width = (p.duration_ms * 300 / longest).max(1);
            writeln!(
                out,
                "<tr><td>{}</td><td>{} ms</td><td><span class=\"bar\" style=\"width:{}px\"></span></td></tr>",
                escape(&p.name),
                p.duration_ms,
                width
            )?;
        }
        writeln!(out, "</table>")?;
        if !self.bytes.is_empty() {
            writeln!(out, "<h2>Sizes</h2><table>")?;
            for b in &self.bytes {
                writeln!(
                    out,
                    "<tr><td>{}</td><td>{}</td></tr>",
                    escape(&b.label),
                    format_bytes(b.bytes)
                )?;
            }
            writeln!(out, "</table>")?;
        }
        writeln!(out, "<p>Total time elapsed: {} ms.</p>", report.total_ms)?;
        writeln!(out, "<script type=\"application/json\" id=\"report\">{}</script>", data)?;
        writeln!(out, "</body></html>")
    }
}

/// HTML bar chart of an index file's section sizes.
pub fn write_size_chart<W: Write>(tree: &SizeTree, out: &mut W) -> io::Result<()> {
    let total = tree.total().max(1);
    let data = serde_json::to_string(tree).expect("size tree serialisation cannot fail");

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html><head><meta charset=\"utf-8\">")?;
    writeln!(out, "<title>{} memory chart</title>", escape(&tree.name))?;
    writeln!(
        out,
        "<style>body{{font-family:monospace}}.bar{{background:#47a;height:1em;display:inline-block}}td{{padding:0 .6em}}</style>"
    )?;
    writeln!(out, "</head><body>")?;
    writeln!(out, "<h1>{}</h1>", escape(&tree.name))?;
    writeln!(out, "<p>Total: {}</p>", format_bytes(total))?;
    writeln!(out, "<table>")?;
    for child in &tree.children {
        let bytes = child.total();
        let width = (bytes * 300 / total).max(1);
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{:.1}%</td><td><span class=\"bar\" style=\"width:{}px\"></span></td></tr>",
            escape(&child.name),
            format_bytes(bytes),
            bytes as f64 * 100.0 / total as f64,
            width
        )?;
    }
    writeln!(out, "</table>")?;
    writeln!(out, "<script type=\"application/json\" id=\"sizes\">{}</script>", data)?;
    writeln!(out, "</body></html>")
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_are_recorded_and_reported() {
        let mut monitor = RunMonitor::new();
        let value = monitor.phase("Doing nothing", || 42);
        assert_eq!(value, 42);
        monitor.note_bytes("index file", 2048);

        let mut html = Vec::new();
        monitor.write_html(&mut html).unwrap();
        let html = String::from_utf8(html).unwrap();
        assert!(html.contains("Doing nothing"));
        assert!(html.contains("2.00 KiB"));
        assert!(html.contains("application/json"));
    }

    #[test]
    fn byte_formatting_picks_sane_units() {
        assert_eq!(format_bytes(12), "12 B");
        assert_eq!(format_bytes(1536), "1.50 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MiB");
    }
}
