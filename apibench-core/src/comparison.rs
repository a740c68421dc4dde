use std::fmt;

use serde::{Deserialize, Serialize};

use crate::endpoint::{Method, Phase};
use crate::result::BenchmarkResult;

/// Label used wherever a row or category has no winner.
pub const NO_WINNER: &str = "none";

/// `numerator / denominator`, or `None` when the denominator is not positive.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}

/// One target's figures within a [`ComparisonRow`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetMeasure {
    pub target: String,
    pub requests_per_second: f64,
    pub avg_response_time_ms: f64,
    /// Throughput relative to the row's baseline (first measure)
    pub throughput_ratio: Option<f64>,
    /// Baseline latency over this target's latency; above 1 means faster
    pub latency_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub endpoint: String,
    pub method: Method,
    pub phase: Phase,
    pub measures: Vec<TargetMeasure>,
    pub winner: Option<String>,
}

impl ComparisonRow {
    /// Builds a row from per-target results for the same endpoint, in caller order.
    /// Needs at least two results.
    pub fn from_results<'a, I>(results: I) -> Option<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a BenchmarkResult)>,
    {
        let results: Vec<(&str, &BenchmarkResult)> = results.into_iter().collect();
        if results.len() < 2 {
            return None;
        }

        let (_, baseline) = results[0];
        let measures: Vec<TargetMeasure> = results
            .iter()
            .map(|(target, result)| TargetMeasure {
                target: target.to_string(),
                requests_per_second: result.requests_per_second,
                avg_response_time_ms: result.avg_response_time_ms,
                throughput_ratio: ratio(result.requests_per_second, baseline.requests_per_second),
                latency_ratio: ratio(baseline.avg_response_time_ms, result.avg_response_time_ms),
            })
            .collect();

        Some(Self {
            endpoint: baseline.endpoint.clone(),
            method: baseline.method,
            phase: baseline.phase,
            winner: pick_winner(&measures),
            measures,
        })
    }

    pub fn measure(&self, target: &str) -> Option<&TargetMeasure> {
        self.measures.iter().find(|m| m.target == target)
    }

    /// Throughput of `a` over throughput of `b`.
    pub fn throughput_ratio(&self, a: &str, b: &str) -> Option<f64> {
        ratio(self.measure(a)?.requests_per_second, self.measure(b)?.requests_per_second)
    }

    /// Latency of `b` over latency of `a`; above 1 means `a` answers faster.
    pub fn latency_ratio(&self, a: &str, b: &str) -> Option<f64> {
        ratio(self.measure(b)?.avg_response_time_ms, self.measure(a)?.avg_response_time_ms)
    }

    pub fn winner_label(&self) -> &str {
        self.winner.as_deref().unwrap_or(NO_WINNER)
    }
}

// Strictly greater keeps the earliest target on ties.
fn pick_winner(measures: &[TargetMeasure]) -> Option<String> {
    let mut best: Option<&TargetMeasure> = None;
    for measure in measures {
        if measure.requests_per_second <= 0.0 {
            continue;
        }
        match best {
            Some(current) if measure.requests_per_second <= current.requests_per_second => {}
            _ => best = Some(measure),
        }
    }
    best.map(|m| m.target.clone())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advantage {
    Significant,
    Notable,
    Moderate,
    Comparable,
}

impl Advantage {
    pub fn classify(ratio: f64) -> Self {
        if ratio > 2.0 {
            Advantage::Significant
        } else if ratio > 1.5 {
            Advantage::Notable
        } else if ratio > 1.1 {
            Advantage::Moderate
        } else {
            Advantage::Comparable
        }
    }
}

impl fmt::Display for Advantage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advantage::Significant => write!(f, "significant"),
            Advantage::Notable => write!(f, "notable"),
            Advantage::Moderate => write!(f, "moderate"),
            Advantage::Comparable => write!(f, "comparable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetTally {
    pub target: String,
    pub wins: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub phase: Phase,
    pub rows: usize,
    pub wins: Vec<TargetTally>,
    pub winner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetAverages {
    pub target: String,
    pub rows: usize,
    pub requests_per_second: f64,
    pub avg_response_time_ms: f64,
}

/// A target's averaged figures against the baseline target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineAdvantage {
    pub target: String,
    pub baseline: String,
    pub throughput_ratio: Option<f64>,
    pub throughput_class: Option<Advantage>,
    pub latency_ratio: Option<f64>,
    pub latency_class: Option<Advantage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallScore {
    pub rows: usize,
    pub wins: Vec<TargetTally>,
    pub winner: Option<String>,
    pub averages: Vec<TargetAverages>,
    pub advantages: Vec<BaselineAdvantage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub categories: Vec<CategoryScore>,
    pub overall: OverallScore,
}

/// Tallies wins per phase and overall. `targets` fixes both the tally order and the
/// tie-break order. Phases without rows are left out.
pub fn score(targets: &[String], rows: &[ComparisonRow]) -> Scoreboard {
    let categories: Vec<CategoryScore> = Phase::ALL
        .iter()
        .filter_map(|phase| {
            let phase_rows: Vec<&ComparisonRow> =
                rows.iter().filter(|row| row.phase == *phase).collect();
            if phase_rows.is_empty() {
                return None;
            }
            let wins = tally(targets, phase_rows.iter().copied());
            Some(CategoryScore {
                phase: *phase,
                rows: phase_rows.len(),
                winner: leader(&wins),
                wins,
            })
        })
        .collect();

    let mut wins: Vec<TargetTally> = targets
        .iter()
        .map(|target| TargetTally {
            target: target.clone(),
            wins: 0,
        })
        .collect();
    for category in &categories {
        for (total, tally) in wins.iter_mut().zip(&category.wins) {
            total.wins += tally.wins;
        }
    }

    let averages = averages(targets, rows);
    let advantages = baseline_advantages(&averages);

    Scoreboard {
        categories,
        overall: OverallScore {
            rows: rows.len(),
            winner: leader(&wins),
            wins,
            averages,
            advantages,
        },
    }
}

fn tally<'a>(targets: &[String], rows: impl Iterator<Item = &'a ComparisonRow>) -> Vec<TargetTally> {
    let mut wins: Vec<TargetTally> = targets
        .iter()
        .map(|target| TargetTally {
            target: target.clone(),
            wins: 0,
        })
        .collect();
    for row in rows {
        if let Some(winner) = &row.winner
            && let Some(entry) = wins.iter_mut().find(|t| &t.target == winner)
        {
            entry.wins += 1;
        }
    }
    wins
}

fn leader(wins: &[TargetTally]) -> Option<String> {
    let mut best: Option<&TargetTally> = None;
    for tally in wins {
        if tally.wins == 0 {
            continue;
        }
        match best {
            Some(current) if tally.wins <= current.wins => {}
            _ => best = Some(tally),
        }
    }
    best.map(|t| t.target.clone())
}

fn averages(targets: &[String], rows: &[ComparisonRow]) -> Vec<TargetAverages> {
    targets
        .iter()
        .filter_map(|target| {
            let measures: Vec<&TargetMeasure> =
                rows.iter().filter_map(|row| row.measure(target)).collect();
            if measures.is_empty() {
                return None;
            }
            let count = measures.len() as f64;
            Some(TargetAverages {
                target: target.clone(),
                rows: measures.len(),
                requests_per_second: measures.iter().map(|m| m.requests_per_second).sum::<f64>()
                    / count,
                avg_response_time_ms: measures.iter().map(|m| m.avg_response_time_ms).sum::<f64>()
                    / count,
            })
        })
        .collect()
}

fn baseline_advantages(averages: &[TargetAverages]) -> Vec<BaselineAdvantage> {
    let Some((baseline, others)) = averages.split_first() else {
        return Vec::new();
    };
    others
        .iter()
        .map(|other| {
            let throughput_ratio = ratio(other.requests_per_second, baseline.requests_per_second);
            let latency_ratio = ratio(baseline.avg_response_time_ms, other.avg_response_time_ms);
            BaselineAdvantage {
                target: other.target.clone(),
                baseline: baseline.target.clone(),
                throughput_ratio,
                throughput_class: throughput_ratio.map(Advantage::classify),
                latency_ratio,
                latency_class: latency_ratio.map(Advantage::classify),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::EndpointSpec;
    use std::collections::BTreeMap;

    fn result(path: &str, phase: Phase, rps: f64, avg_ms: f64) -> BenchmarkResult {
        let spec = EndpointSpec::new(Method::Get, path, phase);
        BenchmarkResult {
            endpoint: spec.path,
            method: spec.method,
            phase,
            description: String::new(),
            total_requests: 100,
            successful_requests: 100,
            failed_requests: 0,
            avg_response_time_ms: avg_ms,
            min_response_time_ms: avg_ms,
            max_response_time_ms: avg_ms,
            median_response_time_ms: avg_ms,
            p95_response_time_ms: avg_ms,
            requests_per_second: rps,
            total_time_secs: 1.0,
            success_rate: 1.0,
            bytes_received: 0,
            status_counts: BTreeMap::new(),
        }
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn faster_target_wins_with_ratio() {
        let a = result("/health", Phase::Basic, 100.0, 10.0);
        let b = result("/health", Phase::Basic, 50.0, 20.0);
        let row = ComparisonRow::from_results([("A", &a), ("B", &b)]).unwrap();

        assert_eq!(row.winner.as_deref(), Some("A"));
        assert_eq!(row.throughput_ratio("A", "B"), Some(2.0));
        assert_eq!(row.latency_ratio("A", "B"), Some(2.0));
        assert_eq!(row.measure("B").unwrap().throughput_ratio, Some(0.5));
    }

    #[test]
    fn single_result_makes_no_row() {
        let a = result("/health", Phase::Basic, 100.0, 10.0);
        assert!(ComparisonRow::from_results([("A", &a)]).is_none());
    }

    #[test]
    fn ties_go_to_first_target() {
        let a = result("/", Phase::Basic, 80.0, 10.0);
        let b = result("/", Phase::Basic, 80.0, 10.0);
        let row = ComparisonRow::from_results([("B", &b), ("A", &a)]).unwrap();
        assert_eq!(row.winner.as_deref(), Some("B"));
    }

    #[test]
    fn zero_throughput_has_no_winner() {
        let a = result("/", Phase::Basic, 0.0, 0.0);
        let b = result("/", Phase::Basic, 0.0, 0.0);
        let row = ComparisonRow::from_results([("A", &a), ("B", &b)]).unwrap();
        assert_eq!(row.winner, None);
        assert_eq!(row.winner_label(), "none");
        assert_eq!(row.measure("B").unwrap().throughput_ratio, None);
    }

    #[test]
    fn comparison_is_deterministic() {
        let a = result("/db/items", Phase::Read, 321.5, 3.1);
        let b = result("/db/items", Phase::Read, 321.4, 3.2);
        let first = ComparisonRow::from_results([("A", &a), ("B", &b)]).unwrap();
        let second = ComparisonRow::from_results([("A", &a), ("B", &b)]).unwrap();
        assert_eq!(first, second);

        let targets = names(&["A", "B"]);
        assert_eq!(score(&targets, &[first.clone()]), score(&targets, &[second]));
    }

    #[test]
    fn scores_by_category_and_overall() {
        let targets = names(&["A", "B"]);
        let rows = vec![
            ComparisonRow::from_results([
                ("A", &result("/", Phase::Basic, 100.0, 10.0)),
                ("B", &result("/", Phase::Basic, 300.0, 5.0)),
            ])
            .unwrap(),
            ComparisonRow::from_results([
                ("A", &result("/health", Phase::Basic, 100.0, 10.0)),
                ("B", &result("/health", Phase::Basic, 300.0, 5.0)),
            ])
            .unwrap(),
            ComparisonRow::from_results([
                ("A", &result("/db/items", Phase::Read, 200.0, 4.0)),
                ("B", &result("/db/items", Phase::Read, 100.0, 8.0)),
            ])
            .unwrap(),
        ];

        let board = score(&targets, &rows);
        assert_eq!(board.categories.len(), 2);
        assert_eq!(board.categories[0].phase, Phase::Basic);
        assert_eq!(board.categories[0].winner.as_deref(), Some("B"));
        assert_eq!(board.categories[1].phase, Phase::Read);
        assert_eq!(board.categories[1].winner.as_deref(), Some("A"));

        let overall = &board.overall;
        assert_eq!(overall.rows, 3);
        assert_eq!(overall.wins[0], TargetTally { target: "A".into(), wins: 1 });
        assert_eq!(overall.wins[1], TargetTally { target: "B".into(), wins: 2 });
        assert_eq!(overall.winner.as_deref(), Some("B"));

        assert_eq!(overall.averages[1].requests_per_second, 700.0 / 3.0);
        let advantage = &overall.advantages[0];
        assert_eq!(advantage.target, "B");
        assert_eq!(advantage.baseline, "A");
        assert_eq!(advantage.throughput_class, Some(Advantage::Notable));
    }

    #[test]
    fn tied_overall_goes_to_first_target() {
        let targets = names(&["A", "B"]);
        let rows = vec![
            ComparisonRow::from_results([
                ("A", &result("/", Phase::Basic, 100.0, 10.0)),
                ("B", &result("/", Phase::Basic, 50.0, 5.0)),
            ])
            .unwrap(),
            ComparisonRow::from_results([
                ("A", &result("/x", Phase::Stress, 50.0, 10.0)),
                ("B", &result("/x", Phase::Stress, 100.0, 5.0)),
            ])
            .unwrap(),
        ];
        assert_eq!(score(&targets, &rows).overall.winner.as_deref(), Some("A"));
        assert_eq!(score(&targets, &[]).overall.winner, None);
    }

    #[test]
    fn classifies_advantage_thresholds() {
        assert_eq!(Advantage::classify(2.5), Advantage::Significant);
        assert_eq!(Advantage::classify(2.0), Advantage::Notable);
        assert_eq!(Advantage::classify(1.2), Advantage::Moderate);
        assert_eq!(Advantage::classify(1.1), Advantage::Comparable);
        assert_eq!(Advantage::classify(0.3), Advantage::Comparable);
    }
}
