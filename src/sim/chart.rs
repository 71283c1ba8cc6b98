//! Beat chart loading
//!
//! A chart is line-oriented text, one `<time>,<lane>` record per line.
//! Loading never fails on content: bad lines are skipped with a warning and
//! whatever parsed successfully becomes the timeline.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single scheduled beat
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeatEvent {
    /// Chart time in seconds (finite, >= 0)
    pub time: f64,
    /// Lane index
    pub lane: usize,
}

impl BeatEvent {
    pub fn new(time: f64, lane: usize) -> Self {
        Self { time, lane }
    }
}

/// What to do with a chart whose events are not time-ascending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartOrder {
    /// Keep file order; the scheduler emits out-of-order events late
    #[default]
    Preserve,
    /// Stable-sort by time after loading
    Sort,
}

/// Why a chart line was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartWarningKind {
    MissingField,
    InvalidTime(String),
    InvalidLane(String),
}

impl fmt::Display for ChartWarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartWarningKind::MissingField => write!(f, "expected `<time>,<lane>`"),
            ChartWarningKind::InvalidTime(s) => write!(f, "invalid time `{}`", s),
            ChartWarningKind::InvalidLane(s) => write!(f, "invalid lane `{}`", s),
        }
    }
}

/// A skipped chart line (non-fatal)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("chart line {line}: {kind}: {text:?}")]
pub struct ChartWarning {
    /// 1-based line number
    pub line: usize,
    pub kind: ChartWarningKind,
    /// The trimmed line as read
    pub text: String,
}

/// Chart file could not be read at all
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("failed to read chart {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result of parsing a chart, with diagnostics
#[derive(Debug, Clone, Default)]
pub struct ChartReport {
    pub timeline: BeatTimeline,
    pub warnings: Vec<ChartWarning>,
    /// Lines skipped as headers
    pub headers: usize,
}

/// Immutable, ordered sequence of beat events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeatTimeline {
    events: Vec<BeatEvent>,
}

impl BeatTimeline {
    /// Build a timeline from already-validated events (file order kept)
    pub fn from_events(events: Vec<BeatEvent>) -> Self {
        Self { events }
    }

    /// Parse chart text, keeping file order
    pub fn parse(text: &str) -> Self {
        Self::parse_report(text, ChartOrder::Preserve).timeline
    }

    /// Parse chart text and return the skipped-line diagnostics alongside
    pub fn parse_report(text: &str, order: ChartOrder) -> ChartReport {
        let mut events = Vec::new();
        let mut warnings = Vec::new();
        let mut headers = 0;

        for (idx, raw) in text.split('\n').enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if line.to_lowercase().contains("time") {
                headers += 1;
                continue;
            }

            match parse_line(line) {
                Ok(event) => events.push(event),
                Err(kind) => {
                    let warning = ChartWarning {
                        line: idx + 1,
                        kind,
                        text: line.to_string(),
                    };
                    log::warn!("Skipping {}", warning);
                    warnings.push(warning);
                }
            }
        }

        let mut timeline = Self { events };
        timeline.apply_order(order);
        log::info!("Loaded {} beat events", timeline.len());

        ChartReport {
            timeline,
            warnings,
            headers,
        }
    }

    /// Read and parse a chart file
    pub fn load(path: impl AsRef<Path>, order: ChartOrder) -> Result<ChartReport, ChartError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ChartError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::parse_report(&text, order))
    }

    fn apply_order(&mut self, order: ChartOrder) {
        let descents = self.descents();
        if descents == 0 {
            return;
        }
        match order {
            ChartOrder::Preserve => {
                log::warn!(
                    "Chart not time-ascending ({} descents); late events spawn out of order",
                    descents
                );
            }
            ChartOrder::Sort => {
                self.events.sort_by(|a, b| a.time.total_cmp(&b.time));
                log::warn!("Chart was not time-ascending ({} descents); sorted by time", descents);
            }
        }
    }

    /// Number of adjacent pairs where time goes backwards
    fn descents(&self) -> usize {
        self.events
            .windows(2)
            .filter(|w| w[1].time < w[0].time)
            .count()
    }

    pub fn is_ascending(&self) -> bool {
        self.descents() == 0
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BeatEvent> {
        self.events.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BeatEvent> {
        self.events.iter()
    }

    pub fn events(&self) -> &[BeatEvent] {
        &self.events
    }

    /// Latest event time in the chart (not necessarily the last entry)
    pub fn last_time(&self) -> Option<f64> {
        self.events.iter().map(|e| e.time).reduce(f64::max)
    }
}

impl<'a> IntoIterator for &'a BeatTimeline {
    type Item = &'a BeatEvent;
    type IntoIter = std::slice::Iter<'a, BeatEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

fn parse_line(line: &str) -> Result<BeatEvent, ChartWarningKind> {
    let mut fields = line.split(',').map(str::trim);
    let (Some(time_field), Some(lane_field)) = (fields.next(), fields.next()) else {
        return Err(ChartWarningKind::MissingField);
    };

    // Rust float parsing is locale-independent: '.' is always the separator
    let time = time_field
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite() && *t >= 0.0)
        .ok_or_else(|| ChartWarningKind::InvalidTime(time_field.to_string()))?;
    let lane = lane_field
        .parse::<usize>()
        .map_err(|_| ChartWarningKind::InvalidLane(lane_field.to_string()))?;

    Ok(BeatEvent { time, lane })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_malformed_line() {
        let report =
            BeatTimeline::parse_report("0.5,0\n1.0,1\nbad,line\n1.5,0\n", ChartOrder::Preserve);
        let events = report.timeline.events();
        assert_eq!(
            events,
            &[BeatEvent::new(0.5, 0), BeatEvent::new(1.0, 1), BeatEvent::new(1.5, 0)]
        );
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].line, 3);
        assert_eq!(
            report.warnings[0].kind,
            ChartWarningKind::InvalidTime("bad".to_string())
        );
    }

    #[test]
    fn test_header_and_blank_lines() {
        let report = BeatTimeline::parse_report(
            "Time,Button\r\n\r\n  0.25 , 2 ,extra\r\n\n",
            ChartOrder::Preserve,
        );
        assert_eq!(report.headers, 1);
        assert!(report.warnings.is_empty());
        assert_eq!(report.timeline.events(), &[BeatEvent::new(0.25, 2)]);
    }

    #[test]
    fn test_header_detection_is_case_insensitive_anywhere() {
        let timeline = BeatTimeline::parse("beat_TIME,lane\n1,0\n");
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn test_rejects_bad_fields() {
        let report = BeatTimeline::parse_report(
            "1.0\n-1.0,0\nNaN,0\ninf,1\n1.0,-1\n1.0,x\n2,3",
            ChartOrder::Preserve,
        );
        assert_eq!(report.timeline.events(), &[BeatEvent::new(2.0, 3)]);
        let kinds: Vec<_> = report.warnings.iter().map(|w| w.kind.clone()).collect();
        assert_eq!(kinds[0], ChartWarningKind::MissingField);
        assert!(matches!(kinds[1], ChartWarningKind::InvalidTime(_)));
        assert!(matches!(kinds[2], ChartWarningKind::InvalidTime(_)));
        assert!(matches!(kinds[3], ChartWarningKind::InvalidTime(_)));
        assert!(matches!(kinds[4], ChartWarningKind::InvalidLane(_)));
        assert!(matches!(kinds[5], ChartWarningKind::InvalidLane(_)));
    }

    #[test]
    fn test_comma_decimal_is_not_accepted() {
        // "1,5,0" reads as time 1 lane 5, extra field ignored
        let timeline = BeatTimeline::parse("1,5,0\n");
        assert_eq!(timeline.events(), &[BeatEvent::new(1.0, 5)]);
    }

    #[test]
    fn test_preserve_keeps_file_order() {
        let report = BeatTimeline::parse_report("2.0,0\n1.0,1\n3.0,0", ChartOrder::Preserve);
        assert!(!report.timeline.is_ascending());
        assert_eq!(report.timeline.get(0), Some(&BeatEvent::new(2.0, 0)));
        assert_eq!(report.timeline.last_time(), Some(3.0));
    }

    #[test]
    fn test_sort_is_stable() {
        let report = BeatTimeline::parse_report("2.0,0\n1.0,1\n1.0,2\n", ChartOrder::Sort);
        assert!(report.timeline.is_ascending());
        let lanes: Vec<_> = report.timeline.iter().map(|e| e.lane).collect();
        assert_eq!(lanes, vec![1, 2, 0]);
    }

    #[test]
    fn test_empty_chart() {
        let timeline = BeatTimeline::parse("");
        assert!(timeline.is_empty());
        assert_eq!(timeline.last_time(), None);
    }

    #[test]
    fn test_load_missing_file() {
        let err = BeatTimeline::load("/definitely/not/here.csv", ChartOrder::Preserve).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.csv"));
    }

    #[test]
    fn test_warning_display() {
        let report = BeatTimeline::parse_report("x,1", ChartOrder::Preserve);
        let msg = report.warnings[0].to_string();
        assert!(msg.starts_with("chart line 1: invalid time `x`"));
    }
}
