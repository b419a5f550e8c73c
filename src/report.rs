//! Observational output: digests, verification results and search costs.
//!
//! Nothing written to a sink flows back into the core.
use crate::digest::{Digest, HashVariant};
use crate::error::Result;
use crate::puzzle::SweepRow;
use crate::search::SearchResult;
use serde::Serialize;
use std::io::Write;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Report {
    Digest {
        label: String,
        variant: HashVariant,
        hex: String,
    },
    Verification {
        label: String,
        variant: Option<HashVariant>,
        ok: bool,
    },
    Search {
        label: String,
        variant: Option<HashVariant>,
        attempts: u64,
        elapsed_ms: f64,
        found: bool,
        expected_attempts: Option<f64>,
        /// Seconds the expected attempts would take at the observed rate.
        projected_secs: Option<f64>,
        detail: Option<String>,
    },
    Sweep {
        label: String,
        difficulty: u32,
        trials: usize,
        solved: usize,
        mean_attempts: f64,
        expected_attempts: f64,
        mean_elapsed_ms: f64,
    },
}

impl Report {
    pub fn digest(label: impl Into<String>, variant: HashVariant, digest: &Digest) -> Self {
        Report::Digest {
            label: label.into(),
            variant,
            hex: digest.to_hex(),
        }
    }

    pub fn verification(label: impl Into<String>, variant: Option<HashVariant>, ok: bool) -> Self {
        Report::Verification {
            label: label.into(),
            variant,
            ok,
        }
    }

    /// Summarise a search; `detail` renders the found value, if any.
    pub fn search<T>(
        label: impl Into<String>,
        variant: Option<HashVariant>,
        result: &SearchResult<T>,
        expected_attempts: Option<f64>,
        detail: impl FnOnce(&T) -> String,
    ) -> Self {
        Report::Search {
            label: label.into(),
            variant,
            attempts: result.attempts,
            elapsed_ms: result.elapsed.as_secs_f64() * 1e3,
            found: result.is_found(),
            expected_attempts,
            projected_secs: expected_attempts.and_then(|e| result.projected_secs(e)),
            detail: result.found().map(detail),
        }
    }

    pub fn sweep(label: impl Into<String>, row: &SweepRow) -> Self {
        Report::Sweep {
            label: label.into(),
            difficulty: row.difficulty.bits(),
            trials: row.trials,
            solved: row.solved,
            mean_attempts: row.mean_attempts,
            expected_attempts: row.expected_attempts,
            mean_elapsed_ms: row.mean_elapsed.as_secs_f64() * 1e3,
        }
    }
}

pub trait ReportSink {
    fn record(&mut self, report: Report) -> Result<()>;
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn record(&mut self, report: Report) -> Result<()> {
        (**self).record(report)
    }
}

impl<S: ReportSink + ?Sized> ReportSink for Box<S> {
    fn record(&mut self, report: Report) -> Result<()> {
        (**self).record(report)
    }
}

/// Emits each report as an `info` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn record(&mut self, report: Report) -> Result<()> {
        match report {
            Report::Digest {
                label,
                variant,
                hex,
            } => info!(%label, %variant, digest = %hex, "digest"),
            Report::Verification { label, variant, ok } => {
                info!(%label, variant = ?variant, ok, "verify")
            }
            Report::Search {
                label,
                variant,
                attempts,
                elapsed_ms,
                found,
                expected_attempts,
                projected_secs,
                detail,
            } => info!(
                %label,
                variant = ?variant,
                attempts,
                elapsed_ms,
                found,
                expected_attempts = ?expected_attempts,
                projected_secs = ?projected_secs,
                detail = detail.as_deref().unwrap_or("-"),
                "search"
            ),
            Report::Sweep {
                label,
                difficulty,
                trials,
                solved,
                mean_attempts,
                expected_attempts,
                mean_elapsed_ms,
            } => info!(
                %label,
                difficulty,
                trials,
                solved,
                mean_attempts,
                expected_attempts,
                mean_elapsed_ms,
                "sweep"
            ),
        }
        Ok(())
    }
}

/// One JSON object per line.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for JsonLinesSink<W> {
    fn record(&mut self, report: Report) -> Result<()> {
        serde_json::to_writer(&mut self.out, &report)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }
}

/// Keeps reports in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    reports: Vec<Report>,
}

impl MemorySink {
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }
}

impl ReportSink for MemorySink {
    fn record(&mut self, report: Report) -> Result<()> {
        self.reports.push(report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::HashEngine;
    use crate::search::Outcome;
    use serde_json::Value;
    use std::time::Duration;

    fn sample_search(found: bool) -> SearchResult<u32> {
        SearchResult {
            attempts: 20,
            elapsed: Duration::from_millis(4),
            outcome: if found {
                Outcome::Found(7)
            } else {
                Outcome::NotFound
            },
        }
    }

    #[test]
    fn json_lines_are_tagged_objects() {
        let engine = HashEngine::<crate::core::Sha256Primitive>::default();
        let digest = engine.digest(b"hello", HashVariant::Truncated16);
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.record(Report::digest("hello", HashVariant::Truncated16, &digest))
            .unwrap();
        sink.record(Report::verification("hello", Some(HashVariant::Truncated16), true))
            .unwrap();
        sink.record(Report::search(
            "collide",
            Some(HashVariant::Truncated8),
            &sample_search(true),
            Some(28.4),
            |v| format!("value {v}"),
        ))
        .unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<Value> = out
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["kind"], "digest");
        assert_eq!(lines[0]["hex"], "2cf2");
        assert_eq!(lines[0]["variant"], "trunc16");
        assert_eq!(lines[1]["ok"], true);
        assert_eq!(lines[2]["kind"], "search");
        assert_eq!(lines[2]["attempts"], 20);
        assert_eq!(lines[2]["detail"], "value 7");
    }

    #[test]
    fn search_report_projects_expected_cost() {
        let report = Report::search("x", None, &sample_search(false), Some(10_000.0), |v| {
            v.to_string()
        });
        match report {
            Report::Search {
                found,
                detail,
                projected_secs,
                ..
            } => {
                assert!(!found);
                assert!(detail.is_none());
                // 20 attempts in 4ms -> 5000/s
                let secs = projected_secs.unwrap();
                assert!((secs - 2.0).abs() < 1e-9);
            }
            other => panic!("unexpected report {other:?}"),
        }
    }

    #[test]
    fn memory_and_tracing_sinks_accept_reports() {
        let mut memory = MemorySink::default();
        let mut tracing_sink = TracingSink;
        let report = Report::verification("v", None, false);
        memory.record(report.clone()).unwrap();
        tracing_sink.record(report.clone()).unwrap();
        {
            let by_ref: &mut dyn ReportSink = &mut memory;
            by_ref.record(report.clone()).unwrap();
        }
        assert_eq!(memory.reports(), &[report.clone(), report]);
    }
}
