use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use crate::board::models::LeaderboardRecord;
use crate::constants::{HEADER_CREW, HEADER_LEVEL, HEADER_POINT};

/// `<rank> [<TAG>] <name...>`, anchored at the start of the line only
static CREW_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\s+\[(\w+)\]\s+(.+)").expect("crew line pattern compiles"));

/// Every character that ends a line in a pasted board, bare `\r` and Unicode separators included
const LINE_BREAKS: [char; 10] = [
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}',
    '\u{2029}',
];

/// Which column of the posted board the scanner is currently reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Idle,
    SeekCrew,
    SeekLevel,
    SeekPoint,
}

/// Checked in order; the first header found in a line wins.
const TRANSITIONS: [(&str, Section); 3] = [
    (HEADER_CREW, Section::SeekCrew),
    (HEADER_LEVEL, Section::SeekLevel),
    (HEADER_POINT, Section::SeekPoint),
];

/// Raw column values in order of appearance. Position is the only thing tying a crew line to
/// its level and point.
#[derive(Debug, Default)]
struct Columns<'a> {
    crews: Vec<&'a str>,
    levels: Vec<u64>,
    points: Vec<u64>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LeaderboardParser;

impl LeaderboardParser {
    pub fn new() -> Self {
        Self
    }

    /// Turns a posted leaderboard into records, in board order.
    ///
    /// Crew lines that don't look like `1 [TAG] Name` are dropped but still use up their slot,
    /// so the level/point at that position are dropped with them and later rows keep their
    /// positional pairing.
    #[instrument(skip(self, raw), fields(len = raw.len()))]
    pub fn parse(&self, raw: &str) -> Vec<LeaderboardRecord> {
        let columns = self.scan(raw);
        let rows = columns.crews.len().min(columns.points.len());

        debug!(
            crews = columns.crews.len(),
            levels = columns.levels.len(),
            points = columns.points.len(),
            "scanned leaderboard columns"
        );

        let mut records = Vec::with_capacity(rows);
        for i in 0..rows {
            let Some(caps) = CREW_LINE.captures(columns.crews[i]) else {
                debug!(index = i, line = columns.crews[i], "skipping unrecognised crew line");
                continue;
            };

            records.push(LeaderboardRecord {
                tag: caps[1].to_string(),
                name: caps[2].to_string(),
                level: columns.levels.get(i).copied().unwrap_or(0),
                point: columns.points[i],
            });
        }

        records
    }

    fn scan<'a>(&self, raw: &'a str) -> Columns<'a> {
        let mut columns = Columns::default();
        let mut section = Section::Idle;

        for line in raw.split(&LINE_BREAKS[..]).map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(next) = header_transition(line) {
                section = next;
                continue;
            }

            match section {
                Section::SeekCrew if line.contains('[') => columns.crews.push(line),
                Section::SeekLevel => {
                    if let Some(level) = parse_digits(line) {
                        columns.levels.push(level);
                    }
                }
                Section::SeekPoint => {
                    if let Some(point) = parse_digits(line) {
                        columns.points.push(point);
                    }
                }
                _ => (),
            }
        }

        columns
    }
}

fn header_transition(line: &str) -> Option<Section> {
    TRANSITIONS
        .iter()
        .find(|(header, _)| line.contains(header))
        .map(|(_, section)| *section)
}

/// Accepts lines made only of ASCII digits; values too large for a `u64` are not values.
fn parse_digits(line: &str) -> Option<u64> {
    if !line.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    line.parse().ok()
}
