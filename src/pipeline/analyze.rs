// src/pipeline/analyze.rs

//! Report aggregation pipeline.
//!
//! Scans the archive, classifies every failed run's log, and renders a
//! ranked Markdown-style report. The accumulator is built fresh on every
//! invocation; nothing is cached between runs.

use std::cmp::Reverse;
use std::io::{self, Write};

use crate::error::{AppError, Result};
use crate::services::{RuleSet, UNRECOGNIZED};
use crate::storage::ArchiveStore;

/// Counts and console-log links for one category.
#[derive(Debug, Default, Clone)]
pub struct CategoryAggregate {
    /// Number of runs classified into this category
    pub counter: usize,
    /// Console-log URLs, in processing order
    pub links: Vec<String>,
}

impl CategoryAggregate {
    fn push(&mut self, link: String) {
        self.counter += 1;
        self.links.push(link);
    }
}

/// Aggregated classification results for one archive scan.
#[derive(Debug, Default)]
pub struct Report {
    /// Runs whose result was SUCCESS
    pub success: usize,
    /// Runs with any other result
    pub failure: usize,
    /// Failed runs whose log was missing; warned about but not classified
    pub missing_logs: usize,
    /// Failures no rule matched
    pub unrecognized: CategoryAggregate,
    /// Per-category aggregates, in declared rule order
    pub categories: Vec<(String, CategoryAggregate)>,
}

/// Scan the archive and classify every failed run.
///
/// An archive with no build directories at all is a fatal error; everything
/// below that is warn-and-continue.
pub async fn aggregate(store: &dyn ArchiveStore, rules: &RuleSet) -> Result<Report> {
    let builds = store.list_builds().await?;
    if builds.is_empty() {
        return Err(AppError::archive("no build directories found"));
    }

    let mut report = Report {
        categories: rules
            .iter()
            .map(|rule| (rule.name().to_string(), CategoryAggregate::default()))
            .collect(),
        ..Report::default()
    };

    for build in builds {
        let runs = match store.list_runs(build).await {
            Ok(runs) => runs,
            Err(error) => {
                log::warn!("Skipping build {build}: {error}");
                continue;
            }
        };

        for run in runs {
            let metadata = match store.read_metadata(build, &run).await {
                Ok(Some(metadata)) => metadata,
                Ok(None) => {
                    log::warn!("Build {build} run '{run}': metadata.json not found");
                    continue;
                }
                Err(error) => {
                    log::warn!("Build {build} run '{run}': {error}");
                    continue;
                }
            };

            if metadata.is_success() {
                report.success += 1;
                continue;
            }
            report.failure += 1;

            let log_text = match store.read_log(build, &run).await {
                Ok(Some(text)) => text,
                Ok(None) => {
                    log::warn!("Build {build} run '{run}': build.log not found");
                    report.missing_logs += 1;
                    continue;
                }
                Err(error) => {
                    log::warn!("Build {build} run '{run}': {error}");
                    report.missing_logs += 1;
                    continue;
                }
            };

            let link = metadata.console_url();
            match rules.classify(&log_text) {
                UNRECOGNIZED => report.unrecognized.push(link),
                name => {
                    // categories is parallel to the rule set, so the name is
                    // always present.
                    if let Some((_, aggregate)) =
                        report.categories.iter_mut().find(|(n, _)| n == name)
                    {
                        aggregate.push(link);
                    }
                }
            }
        }
    }

    Ok(report)
}

/// Render the report.
///
/// The unrecognized section always comes first, even at zero count; the
/// remaining categories follow in descending count order, ties broken by
/// declared rule order. Categories with no failures are omitted.
pub fn render(report: &Report, rules: &RuleSet, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "# Summary")?;
    writeln!(out)?;
    writeln!(
        out,
        "Successes: {} Failures: {}",
        report.success, report.failure
    )?;

    writeln!(out)?;
    writeln!(out, "# Uncategorized Failures")?;
    writeln!(out)?;
    writeln!(
        out,
        "* Number of failures: {}",
        report.unrecognized.counter
    )?;
    writeln!(out)?;
    writeln!(out, "## Builds")?;
    for link in &report.unrecognized.links {
        writeln!(out, "* <{link}>")?;
    }

    // Stable sort keeps declared order among equal counts.
    let mut order: Vec<usize> = (0..report.categories.len())
        .filter(|&i| report.categories[i].1.counter > 0)
        .collect();
    order.sort_by_key(|&i| Reverse(report.categories[i].1.counter));

    let rule_list: Vec<_> = rules.iter().collect();
    for i in order {
        let (name, aggregate) = &report.categories[i];

        writeln!(out)?;
        writeln!(out, "# Failures with reason \"{name}\"")?;
        writeln!(out)?;
        writeln!(out, "* Number of failures: {}", aggregate.counter)?;
        // Pattern documentation is available only when the report was built
        // from this rule set; a shorter rule set just omits the block.
        if let Some(rule) = rule_list.get(i) {
            writeln!(out, "## Regular Expressions")?;
            writeln!(
                out,
                "When one of these regular expressions has a match in the build log, the failure falls into this category."
            )?;
            writeln!(out)?;
            for pattern in rule.pattern_sources() {
                writeln!(out, "* `{pattern}`")?;
            }
        }
        writeln!(out)?;
        writeln!(out, "## Builds")?;
        writeln!(out)?;
        writeln!(out, "Links to the build logs:")?;
        writeln!(out)?;
        for link in &aggregate.links {
            writeln!(out, "* <{link}>")?;
        }
    }

    Ok(())
}

/// Aggregate the archive and print the report to stdout.
pub async fn run_analyze(store: &dyn ArchiveStore, rules: &RuleSet) -> Result<()> {
    let report = aggregate(store, rules).await?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    render(&report, rules, &mut out)?;

    if report.missing_logs > 0 {
        log::warn!(
            "{} failed runs had no readable log and were not classified",
            report.missing_logs
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryConfig, RunMetadata};
    use crate::storage::{ArchiveStore, LocalArchive};
    use tempfile::TempDir;

    fn rules(pairs: &[(&str, &[&str])]) -> RuleSet {
        let configs: Vec<CategoryConfig> = pairs
            .iter()
            .map(|(name, patterns)| CategoryConfig {
                name: name.to_string(),
                patterns: patterns.iter().map(|p| p.to_string()).collect(),
            })
            .collect();
        RuleSet::compile(&configs).unwrap()
    }

    fn metadata(number: i64, name: &str, result: &str) -> RunMetadata {
        RunMetadata {
            number,
            full_display_name: name.to_string(),
            result: Some(result.to_string()),
            url: format!("https://ci.example.org/job/x/{name}/{number}/"),
        }
    }

    async fn put(archive: &LocalArchive, number: i64, name: &str, result: &str, log: &str) {
        archive
            .put_run(number, name, &metadata(number, name, result), log)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_archive_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let archive = LocalArchive::new(tmp.path());
        let rules = rules(&[("network", &["reset"])]);
        assert!(aggregate(&archive, &rules).await.is_err());
    }

    #[tokio::test]
    async fn one_success_one_network_failure() {
        let tmp = TempDir::new().unwrap();
        let archive = LocalArchive::new(tmp.path());
        put(&archive, 1, "run-a", "SUCCESS", "all fine").await;
        put(
            &archive,
            2,
            "run-b",
            "FAILURE",
            "fatal: read error: Connection reset by peer",
        )
        .await;

        let rules = rules(&[("network", &["Connection reset by peer"])]);
        let report = aggregate(&archive, &rules).await.unwrap();

        assert_eq!(report.success, 1);
        assert_eq!(report.failure, 1);
        assert_eq!(report.unrecognized.counter, 0);
        assert_eq!(report.categories[0].0, "network");
        assert_eq!(report.categories[0].1.counter, 1);
        assert_eq!(report.categories[0].1.links.len(), 1);
        assert!(report.categories[0].1.links[0].ends_with("consoleText"));
    }

    #[tokio::test]
    async fn every_failure_lands_in_exactly_one_bucket() {
        let tmp = TempDir::new().unwrap();
        let archive = LocalArchive::new(tmp.path());
        put(&archive, 1, "r1", "FAILURE", "Build was aborted").await;
        put(&archive, 1, "r2", "FAILURE", "nothing known here").await;
        put(&archive, 2, "r3", "ABORTED", "Build was aborted").await;
        put(&archive, 2, "r4", "UNSTABLE", "flaky output").await;
        put(&archive, 3, "r5", "SUCCESS", "").await;

        let rules = rules(&[("aborted", &["Build was aborted"])]);
        let report = aggregate(&archive, &rules).await.unwrap();

        assert_eq!(report.success, 1);
        assert_eq!(report.failure, 4);
        let categorized: usize = report.categories.iter().map(|(_, a)| a.counter).sum();
        assert_eq!(
            categorized + report.unrecognized.counter + report.missing_logs,
            report.failure
        );
        assert_eq!(report.unrecognized.counter, 2);
    }

    #[tokio::test]
    async fn missing_log_is_skipped_not_classified() {
        let tmp = TempDir::new().unwrap();
        let archive = LocalArchive::new(tmp.path());
        put(&archive, 5, "with-log", "FAILURE", "Build was aborted").await;

        // Metadata only, no build.log.
        let meta = metadata(5, "log-less", "FAILURE");
        let dir = tmp.path().join("5").join("log-less");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("metadata.json"),
            serde_json::to_vec(&meta).unwrap(),
        )
        .unwrap();

        let rules = rules(&[("aborted", &["Build was aborted"])]);
        let report = aggregate(&archive, &rules).await.unwrap();

        assert_eq!(report.failure, 2);
        assert_eq!(report.missing_logs, 1);
        assert_eq!(report.unrecognized.counter, 0);
        assert_eq!(report.categories[0].1.counter, 1);
    }

    #[tokio::test]
    async fn run_without_metadata_is_skipped_entirely() {
        let tmp = TempDir::new().unwrap();
        let archive = LocalArchive::new(tmp.path());
        put(&archive, 1, "good", "SUCCESS", "").await;
        std::fs::create_dir_all(tmp.path().join("1").join("broken")).unwrap();

        let rules = rules(&[("aborted", &["Build was aborted"])]);
        let report = aggregate(&archive, &rules).await.unwrap();

        assert_eq!(report.success, 1);
        assert_eq!(report.failure, 0);
    }

    #[tokio::test]
    async fn links_preserve_processing_order() {
        let tmp = TempDir::new().unwrap();
        let archive = LocalArchive::new(tmp.path());
        put(&archive, 1, "a", "FAILURE", "Build was aborted").await;
        put(&archive, 2, "b", "FAILURE", "Build was aborted").await;
        put(&archive, 10, "c", "FAILURE", "Build was aborted").await;

        let rules = rules(&[("aborted", &["Build was aborted"])]);
        let report = aggregate(&archive, &rules).await.unwrap();

        let links = &report.categories[0].1.links;
        assert_eq!(links.len(), 3);
        // Builds ascend numerically, so 10 comes after 2.
        assert!(links[0].contains("/a/"));
        assert!(links[1].contains("/b/"));
        assert!(links[2].contains("/c/"));
    }

    fn report_with_counts(names_and_counts: &[(&str, usize)]) -> Report {
        Report {
            failure: names_and_counts.iter().map(|(_, c)| c).sum(),
            categories: names_and_counts
                .iter()
                .map(|(name, count)| {
                    (
                        name.to_string(),
                        CategoryAggregate {
                            counter: *count,
                            links: (0..*count)
                                .map(|i| format!("https://ci.example.org/{name}/{i}/consoleText"))
                                .collect(),
                        },
                    )
                })
                .collect(),
            ..Report::default()
        }
    }

    #[test]
    fn render_puts_unrecognized_first_even_at_zero() {
        let rules = rules(&[("aborted", &["Build was aborted"])]);
        let report = report_with_counts(&[("aborted", 1)]);

        let mut buffer = Vec::new();
        render(&report, &rules, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let uncategorized = text.find("# Uncategorized Failures").unwrap();
        let aborted = text.find("# Failures with reason \"aborted\"").unwrap();
        assert!(uncategorized < aborted);
        assert!(text.contains("* Number of failures: 0"));
        assert!(text.contains("* `Build was aborted`"));
    }

    #[test]
    fn render_sorts_descending_with_stable_ties() {
        let rules = rules(&[
            ("first_small", &["a"]),
            ("tied_one", &["b"]),
            ("tied_two", &["c"]),
            ("biggest", &["d"]),
        ]);
        let report = report_with_counts(&[
            ("first_small", 1),
            ("tied_one", 2),
            ("tied_two", 2),
            ("biggest", 5),
        ]);

        let mut buffer = Vec::new();
        render(&report, &rules, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let pos = |name: &str| {
            text.find(&format!("# Failures with reason \"{name}\""))
                .unwrap()
        };
        assert!(pos("biggest") < pos("tied_one"));
        assert!(pos("tied_one") < pos("tied_two"));
        assert!(pos("tied_two") < pos("first_small"));
    }

    #[test]
    fn render_tolerates_rule_set_shorter_than_report() {
        // A report carrying more categories than the rule set it is rendered
        // with must not panic; the extra category just loses its pattern
        // documentation.
        let rules = RuleSet::compile(&[]).unwrap();
        let report = report_with_counts(&[("orphaned", 2)]);

        let mut buffer = Vec::new();
        render(&report, &rules, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("# Failures with reason \"orphaned\""));
        assert!(text.contains("* Number of failures: 2"));
        assert!(!text.contains("## Regular Expressions"));
    }

    #[test]
    fn render_omits_empty_categories() {
        let rules = rules(&[("seen", &["x"]), ("never_hit", &["y"])]);
        let report = report_with_counts(&[("seen", 1), ("never_hit", 0)]);

        let mut buffer = Vec::new();
        render(&report, &rules, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("\"seen\""));
        assert!(!text.contains("\"never_hit\""));
    }
}
