// Colored terminal output for classifications, extraction reports, and
// stored posts. main.rs display paths delegate here.

use std::collections::BTreeMap;

use colored::Colorize;

use crate::classify::{ClassificationResult, RuleTable, SentimentResult, Urgency};
use crate::db::models::{ExtractionRun, LabelCount, StoredPost};
use crate::pipeline::extract::{ClassifiedPost, ExtractionReport};
use crate::pipeline::store::StorageSummary;

/// Display a single classification with its sentiment.
pub fn display_classification(
    text: &str,
    profile: &str,
    result: &ClassificationResult,
    sentiment: &SentimentResult,
) {
    println!("\n{}", format!("=== Classification ({profile}) ===").bold());
    println!("  Text: {}", super::truncate_chars(text, 140).dimmed());
    println!("  Category: {}", colorize_category(result));
    println!("  Confidence: {:.2}", result.confidence);
    println!("  Urgency: {}", colorize_urgency(result.urgency));
    if !result.is_general() {
        println!(
            "  Matches: {} keyword, {} urgency",
            result.keyword_matches, result.urgency_matches
        );
    }
    println!(
        "  Sentiment: {:+.2} ({})",
        sentiment.score,
        sentiment.label()
    );
}

/// Display a sentiment score on its own.
pub fn display_sentiment(text: &str, sentiment: &SentimentResult) {
    println!("\n{}", "=== Sentiment ===".bold());
    println!("  Text: {}", super::truncate_chars(text, 140).dimmed());
    let label = sentiment.label().to_string();
    let colored_label = match label.as_str() {
        "positive" => label.green(),
        "negative" => label.red(),
        _ => label.normal(),
    };
    println!("  Score: {:+.2} ({})", sentiment.score, colored_label);
}

/// Display an extraction batch: one line per post, then the summary.
pub fn display_extraction(report: &ExtractionReport) {
    if report.posts.is_empty() {
        println!("No posts in input.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Extraction ({} posts) ===", report.posts.len()).bold()
    );
    println!();
    println!(
        "  {:<24} {:<10} {:<16} {:>5}  {:<7}  {:<3}  {}",
        "ID".dimmed(),
        "Platform".dimmed(),
        "Category".dimmed(),
        "Conf".dimmed(),
        "Urgency".dimmed(),
        "Ver".dimmed(),
        "Text".dimmed(),
    );
    println!("  {}", "-".repeat(100).dimmed());

    for post in &report.posts {
        display_post_line(post);
    }

    let stats = &report.stats;
    println!();
    println!(
        "  {} hazard-related, {} high confidence, {} verified, {} geotagged (avg confidence {:.2})",
        stats.hazard_posts, stats.high_confidence, stats.verified, stats.geotagged, stats.average_confidence
    );
    println!("  By category:  {}", join_counts(&stats.by_category));
    println!("  By platform:  {}", join_counts(&stats.by_platform));
    println!("  By sentiment: {}", join_counts(&stats.by_sentiment));
    println!("  Avg virality: {:.2}", stats.average_virality);

    let high = stats.by_urgency.get("high").copied().unwrap_or(0);
    if high > 0 {
        println!(
            "  {} {} high-urgency posts, {} high priority",
            "!!".red().bold(),
            high,
            stats.high_priority
        );
    }
}

fn join_counts(counts: &BTreeMap<String, usize>) -> String {
    counts
        .iter()
        .map(|(name, count)| format!("{name}: {count}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_post_line(post: &ClassifiedPost) {
    let verified = if post.verified {
        "yes".green()
    } else {
        "no".dimmed()
    };
    println!(
        "  {:<24} {:<10} {:<16} {:>5.2}  {:<7}  {:<3}  {}",
        super::truncate_chars(&post.post.id, 21),
        post.post.platform.as_str(),
        colorize_category(&post.classification),
        post.classification.confidence,
        colorize_urgency(post.classification.urgency),
        verified,
        super::truncate_chars(&post.cleaned_text, 60).dimmed(),
    );
}

/// Display the outcome of best-effort storage.
pub fn display_storage(summary: &StorageSummary) {
    if summary.failed == 0 {
        println!(
            "  Stored {}/{} posts",
            summary.successful, summary.attempted
        );
    } else {
        println!(
            "  Stored {}/{} posts ({} failed, see log)",
            summary.successful,
            summary.attempted,
            summary.failed.to_string().yellow()
        );
    }
}

/// Display stored posts, highest confidence first.
pub fn display_stored_posts(posts: &[StoredPost]) {
    if posts.is_empty() {
        println!("No stored posts match. Run `coastwatch extract <FILE> --store` first.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Hazard Report ({} posts) ===", posts.len()).bold()
    );
    println!();
    println!(
        "  {:>4}  {:<16} {:>5}  {:<7}  {:<10} {}",
        "Rank".dimmed(),
        "Category".dimmed(),
        "Conf".dimmed(),
        "Urgency".dimmed(),
        "Platform".dimmed(),
        "Text".dimmed(),
    );
    println!("  {}", "-".repeat(90).dimmed());

    for (i, post) in posts.iter().enumerate() {
        let urgency = Urgency::parse(&post.urgency).unwrap_or(Urgency::Low);
        println!(
            "  {:>4}. {:<16} {:>5.2}  {:<7}  {:<10} {}",
            i + 1,
            post.category,
            post.confidence,
            colorize_urgency(urgency),
            post.platform,
            super::truncate_chars(&post.cleaned_text, 60).dimmed(),
        );
    }
    println!();
}

/// Display per-label counts as a small bar chart.
pub fn display_label_counts(title: &str, counts: &[LabelCount]) {
    println!("\n{}", format!("=== {title} ===").bold());
    if counts.is_empty() {
        println!("  (none)");
        return;
    }
    let max = counts.iter().map(|c| c.count).max().unwrap_or(1).max(1);
    for entry in counts {
        let width = ((entry.count as f64 / max as f64) * 30.0).round() as usize;
        println!(
            "  {:<16} {:>5}  {}",
            entry.label,
            entry.count,
            "#".repeat(width.max(1)).cyan()
        );
    }
}

/// Display recent extraction runs.
pub fn display_runs(runs: &[ExtractionRun]) {
    if runs.is_empty() {
        println!("Extraction runs: none recorded yet");
        return;
    }
    println!("Extraction runs: {} most recent:", runs.len());
    for run in runs {
        println!(
            "  #{} {} posts, {} hazard, {} verified, stored {}/{} ({}, profile {})",
            run.id,
            run.total_posts,
            run.hazard_posts,
            run.verified,
            run.stored,
            run.stored + run.failed,
            run.created_at,
            run.profile.as_deref().unwrap_or("per-platform"),
        );
    }
}

/// Display the rule table as seen by one profile.
pub fn display_rules(table: &RuleTable, profile: &str) -> anyhow::Result<()> {
    let constants = table.profile(profile)?;
    println!("\n{}", format!("=== Rule table ({profile}) ===").bold());
    println!(
        "  keyword weight {:.2}, urgency weight {:.2}, high urgency above {} matches, verify above {:.2}",
        constants.keyword_weight,
        constants.urgency_weight,
        constants.high_urgency_threshold,
        constants.verify_threshold,
    );
    println!(
        "  Emergency markers: {}",
        constants.emergency_markers.join(", ")
    );
    if constants.context_weight > 0.0 {
        println!(
            "  Source-context priors (weight {:.2}, default {:.2}): {} entries",
            constants.context_weight,
            constants.default_context_prior,
            constants.context_priors.len()
        );
    }
    println!();

    for rule in table.rules_for(constants) {
        println!("  {} (weight {:.1})", rule.name.bold(), rule.weight);
        println!("    keywords: {}", rule.keywords.join(", ").dimmed());
        if !rule.urgency_keywords.is_empty() {
            println!("    urgency:  {}", rule.urgency_keywords.join(", ").dimmed());
        }
    }
    println!(
        "\n  Profiles: {}",
        table.profile_names().join(", ")
    );
    Ok(())
}

/// Colorize an urgency level.
fn colorize_urgency(urgency: Urgency) -> colored::ColoredString {
    match urgency {
        Urgency::High => urgency.as_str().red().bold(),
        Urgency::Medium => urgency.as_str().yellow(),
        Urgency::Low => urgency.as_str().green(),
    }
}

/// General (unmatched) results are dimmed so hazards stand out.
fn colorize_category(result: &ClassificationResult) -> colored::ColoredString {
    if result.is_general() {
        result.category.as_str().dimmed()
    } else {
        result.category.as_str().bold()
    }
}
