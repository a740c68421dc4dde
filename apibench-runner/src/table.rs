use std::io::{self, Write};

use apibench_core::{BenchmarkResult, ComparisonRow, NO_WINNER, Phase, Scoreboard};
use apibench_storage::Report;
use console::style;
use humanize_bytes::humanize_bytes_binary;

const RULE_WIDTH: usize = 80;

fn rule(out: &mut impl Write, ch: char, width: usize) -> io::Result<()> {
    writeln!(out, "{}", ch.to_string().repeat(width))
}

fn heading(out: &mut impl Write, title: &str) -> io::Result<()> {
    writeln!(out)?;
    rule(out, '=', RULE_WIDTH)?;
    writeln!(out, "{}", style(title).bold())?;
    rule(out, '=', RULE_WIDTH)
}

fn failure_breakdown(result: &BenchmarkResult) -> Option<String> {
    let mut parts: Vec<String> = result
        .http_failures()
        .map(|(status, count)| format!("{} x{}", status, count))
        .collect();
    let transport = result.transport_failures();
    if transport > 0 {
        parts.push(format!("transport x{}", transport));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// Per-endpoint figures for one target. Numbers are truncated for display only.
pub fn write_target_results(
    out: &mut impl Write,
    target: &str,
    results: &[BenchmarkResult],
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", style(format!("{} results", target)).cyan().bold())?;
    let header = format!(
        "{:<30} {:<8} {:<10} {:<10} {:<10} {:<10} {:<10} {:<12} {:<10}",
        "Endpoint", "Method", "RPS", "Avg(ms)", "Min(ms)", "Max(ms)", "P95(ms)", "Success", "Received"
    );
    writeln!(out, "{}", header)?;
    rule(out, '-', header.len())?;

    for result in results {
        let success = format!("{}/{}", result.successful_requests, result.total_requests);
        writeln!(
            out,
            "{:<30} {:<8} {:<10.1} {:<10.2} {:<10.2} {:<10.2} {:<10.2} {:<12} {:<10}",
            result.endpoint,
            result.method,
            result.requests_per_second,
            result.avg_response_time_ms,
            result.min_response_time_ms,
            result.max_response_time_ms,
            result.p95_response_time_ms,
            success,
            humanize_bytes_binary!(result.bytes_received)
        )?;
        if let Some(breakdown) = failure_breakdown(result) {
            writeln!(out, "    failures: {}", breakdown)?;
        }
    }
    Ok(())
}

/// One table per phase with each target's RPS and mean latency side by side.
pub fn write_comparisons(
    out: &mut impl Write,
    targets: &[String],
    rows: &[ComparisonRow],
) -> io::Result<()> {
    if rows.is_empty() {
        writeln!(out)?;
        writeln!(out, "No comparison data available.")?;
        return Ok(());
    }

    for phase in Phase::ALL {
        let phase_rows: Vec<&ComparisonRow> = rows.iter().filter(|r| r.phase == phase).collect();
        if phase_rows.is_empty() {
            continue;
        }

        writeln!(out)?;
        writeln!(out, "{}", style(format!("[{}]", phase)).yellow().bold())?;
        let mut header = format!("{:<30} {:<8}", "Endpoint", "Method");
        for target in targets {
            header.push_str(&format!(" {:>14} {:>10}", format!("{} RPS", target), "Avg(ms)"));
        }
        header.push_str(&format!(" {:<12}", "Winner"));
        writeln!(out, "{}", header)?;
        rule(out, '-', header.len())?;

        for row in phase_rows {
            let mut line = format!("{:<30} {:<8}", row.endpoint, row.method.as_str());
            for target in targets {
                match row.measure(target) {
                    Some(m) => line.push_str(&format!(
                        " {:>14.1} {:>10.2}",
                        m.requests_per_second, m.avg_response_time_ms
                    )),
                    None => line.push_str(&format!(" {:>14} {:>10}", "-", "-")),
                }
            }
            line.push_str(&format!(" {:<12}", row.winner_label()));
            writeln!(out, "{}", line)?;
        }
    }
    Ok(())
}

pub fn write_scoreboard(out: &mut impl Write, board: &Scoreboard) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", style("Category winners").bold())?;
    for category in &board.categories {
        let tallies: Vec<String> = category
            .wins
            .iter()
            .map(|t| format!("{} {}", t.target, t.wins))
            .collect();
        writeln!(
            out,
            "  {:<8} {:<40} winner: {}",
            category.phase.to_string(),
            tallies.join(", "),
            category.winner.as_deref().unwrap_or(NO_WINNER)
        )?;
    }

    let overall = &board.overall;
    writeln!(out)?;
    writeln!(out, "{}", style("Overall").bold())?;
    for average in &overall.averages {
        writeln!(
            out,
            "  {:<20} avg RPS {:>10.1}   avg latency {:>8.2}ms",
            average.target, average.requests_per_second, average.avg_response_time_ms
        )?;
    }
    for tally in &overall.wins {
        writeln!(out, "  {} wins in {}/{} endpoints", tally.target, tally.wins, overall.rows)?;
    }
    for advantage in &overall.advantages {
        if let Some(ratio) = advantage.throughput_ratio {
            writeln!(
                out,
                "  {} vs {}: {:.1}x throughput ({})",
                advantage.target,
                advantage.baseline,
                ratio,
                advantage.throughput_class.map(|c| c.to_string()).unwrap_or_default()
            )?;
        }
        if let Some(ratio) = advantage.latency_ratio {
            writeln!(
                out,
                "  {} vs {}: {:.1}x latency advantage ({})",
                advantage.target,
                advantage.baseline,
                ratio,
                advantage.latency_class.map(|c| c.to_string()).unwrap_or_default()
            )?;
        }
    }
    writeln!(
        out,
        "  Overall winner: {}",
        style(overall.winner.as_deref().unwrap_or(NO_WINNER)).green().bold()
    )
}

/// Everything a run printed, rebuilt from a report.
pub fn write_report(out: &mut impl Write, report: &Report) -> io::Result<()> {
    heading(out, "DETAILED BENCHMARK RESULTS")?;
    for target in &report.targets {
        write_target_results(out, target, report.results_for(target))?;
    }
    if !report.unavailable.is_empty() {
        writeln!(out)?;
        writeln!(
            out,
            "{} not reachable: {}",
            style("!").yellow(),
            report.unavailable.join(", ")
        )?;
    }

    heading(out, "PERFORMANCE COMPARISON")?;
    write_comparisons(out, &report.targets, &report.comparisons)?;
    write_scoreboard(out, &report.scores)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use apibench_core::{EndpointSpec, Method, RequestSample, score};
    use std::time::Duration;

    fn result(path: &str, phase: Phase, statuses: &[u16], span_ms: u64) -> BenchmarkResult {
        let spec = EndpointSpec::new(Method::Get, path, phase);
        let samples: Vec<_> = statuses
            .iter()
            .map(|status| RequestSample {
                elapsed: Duration::from_millis(2),
                status: *status,
                bytes_received: 2048,
            })
            .collect();
        BenchmarkResult::from_samples(&spec, samples.len() as u64, &samples, Duration::from_millis(span_ms))
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        console::set_colors_enabled(false);
        let mut buffer = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn target_table_shows_fixed_precision_and_failures() {
        let results = vec![result("/db/items/999", Phase::Read, &[200, 404, 404, 0], 100)];
        let text = render(|out| write_target_results(out, "axum", &results));

        assert!(text.contains("axum results"));
        assert!(text.contains("/db/items/999"));
        assert!(text.contains("40.0"));
        assert!(text.contains("2.00"));
        assert!(text.contains("1/4"));
        assert!(text.contains("failures: 404 x2, transport x1"));
    }

    #[test]
    fn comparison_table_marks_missing_and_winner() {
        let targets = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let a = result("/", Phase::Basic, &[200; 4], 100);
        let b = result("/", Phase::Basic, &[200; 4], 50);
        let rows = vec![ComparisonRow::from_results([("a", &a), ("b", &b)]).unwrap()];

        let text = render(|out| write_comparisons(out, &targets, &rows));
        assert!(text.contains("[basic]"));
        assert!(text.contains("c RPS"));
        let line = text.lines().find(|l| l.starts_with("/ ")).unwrap();
        assert!(line.contains("40.0"));
        assert!(line.contains("80.0"));
        assert!(line.contains(" - "));
        assert!(line.trim_end().ends_with('b'));
    }

    #[test]
    fn empty_comparisons_are_reported() {
        let text = render(|out| write_comparisons(out, &[], &[]));
        assert!(text.contains("No comparison data available."));
    }

    #[test]
    fn scoreboard_names_overall_winner() {
        let targets = vec!["a".to_string(), "b".to_string()];
        let a = result("/", Phase::Basic, &[200; 4], 100);
        let b = result("/", Phase::Basic, &[200; 4], 20);
        let rows = vec![ComparisonRow::from_results([("a", &a), ("b", &b)]).unwrap()];
        let board = score(&targets, &rows);

        let text = render(|out| write_scoreboard(out, &board));
        assert!(text.contains("b wins in 1/1 endpoints"));
        assert!(text.contains("5.0x throughput (significant)"));
        assert!(text.contains("Overall winner: b"));
    }
}
