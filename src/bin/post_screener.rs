//! post-screener: 按查询收集帖子并用补全模型筛选，输出 CSV
//!
//! Usage:
//!   post-screener --query-file queries.txt --output-file accepted.csv
//!   post-screener --input-jsonl posts.jsonl --output-file accepted.csv

use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::Parser;
use post_screener::config::ScreenerConfig;
use post_screener::runner::Screener;
use post_screener::sink::{CsvSink, JsonlSink};
use post_screener::source::{JsonlSource, PostSource, RecentSearchSource, SearchParams};
use post_screener::transport::HttpCompletionService;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "post-screener",
    version,
    about = "Collect posts for a list of queries and keep the ones a completion model accepts"
)]
struct Cli {
    /// File with one search query per line
    #[arg(long, required_unless_present = "input_jsonl")]
    query_file: Option<PathBuf>,

    /// Screen records from a JSONL file instead of searching
    #[arg(long, conflicts_with = "query_file")]
    input_jsonl: Option<PathBuf>,

    /// CSV output; a JSONL archive is written next to it
    #[arg(long)]
    output_file: PathBuf,

    /// Start of the search window (ISO 8601, UTC when no offset is given)
    #[arg(long, value_parser = parse_time)]
    start_time: Option<DateTime<Utc>>,

    /// End of the search window (ISO 8601, UTC when no offset is given)
    #[arg(long, value_parser = parse_time)]
    end_time: Option<DateTime<Utc>>,

    /// Maximum posts kept per query
    #[arg(long)]
    max_results: Option<usize>,

    /// YAML configuration file
    #[arg(long, env = "POST_SCREENER_CONFIG")]
    config: Option<PathBuf>,

    /// Requests-per-minute ceiling for the completion service
    #[arg(long)]
    rpm: Option<u32>,

    /// Estimated tokens allowed per minute
    #[arg(long)]
    token_budget: Option<usize>,

    /// Rewrite the output every N accepted posts
    #[arg(long)]
    flush_every: Option<usize>,
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(t.and_utc());
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(t) = d.and_hms_opt(0, 0, 0) {
            return Ok(t.and_utc());
        }
    }
    Err(format!("not an ISO 8601 timestamp: {raw}"))
}

impl Cli {
    fn apply(&self, config: &mut ScreenerConfig) {
        if let Some(v) = self.max_results {
            config.search.max_results_per_query = v;
        }
        if let Some(v) = self.rpm {
            config.scheduler.requests_per_minute = v;
        }
        if let Some(v) = self.token_budget {
            config.scheduler.token_budget = v;
        }
        if let Some(v) = self.flush_every {
            config.output.flush_every = v;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let (Some(start), Some(end)) = (cli.start_time, cli.end_time) {
        if start >= end {
            bail!("--start-time must be before --end-time");
        }
    }

    let mut config = ScreenerConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    let service = HttpCompletionService::new(
        config.classifier.base_url.clone(),
        config.classifier.api_key.as_deref(),
    )?;
    let scheduler = config.build_scheduler(Arc::new(service))?;

    let mut screener = Screener::new(scheduler)
        .with_flush_every(config.output.flush_every)
        .with_text_field(config.output.text_field.clone())
        .with_sink(Box::new(CsvSink::new(&cli.output_file)));
    let archive = cli.output_file.with_extension("jsonl");
    if archive != cli.output_file {
        screener = screener.with_sink(Box::new(JsonlSink::new(&archive)));
    }

    let mut source: Box<dyn PostSource> = match (&cli.input_jsonl, &cli.query_file) {
        (Some(path), _) => Box::new(
            JsonlSource::open(path, config.scheduler.max_prompts_per_request.max(1) * 5)
                .await
                .with_context(|| format!("opening {}", path.display()))?,
        ),
        (None, Some(path)) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading query file {}", path.display()))?;
            let params = SearchParams::new(raw.lines())
                .with_time_range(cli.start_time, cli.end_time)
                .with_max_results_per_query(config.search.max_results_per_query);
            if params.queries.is_empty() {
                bail!("query file {} contains no queries", path.display());
            }
            Box::new(
                RecentSearchSource::new(
                    config.search.base_url.clone(),
                    config.search.bearer_token.as_deref(),
                    params,
                )?
                .with_rate_limit_cooldown(config.recovery_config().cooldown),
            )
        }
        (None, None) => bail!("either --query-file or --input-jsonl is required"),
    };

    let summary = screener.run(source.as_mut()).await?;
    println!(
        "Screened {} posts from {} pages: {} accepted, {} skipped. Output: {}",
        summary.candidates,
        summary.pages,
        summary.accepted,
        summary.skipped,
        cli.output_file.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_forms() {
        let utc = parse_time("2023-01-05T10:00:00Z").unwrap();
        assert_eq!(utc.to_rfc3339(), "2023-01-05T10:00:00+00:00");
        let offset = parse_time("2023-01-05T12:00:00+02:00").unwrap();
        assert_eq!(offset, utc);
        assert_eq!(parse_time("2023-01-05T10:00:00").unwrap(), utc);
        assert_eq!(
            parse_time("2023-01-05").unwrap().to_rfc3339(),
            "2023-01-05T00:00:00+00:00"
        );
        assert!(parse_time("yesterday").is_err());
    }

    #[test]
    fn test_cli_requires_a_source() {
        assert!(Cli::try_parse_from(["post-screener", "--output-file", "o.csv"]).is_err());
        let cli = Cli::try_parse_from([
            "post-screener",
            "--input-jsonl",
            "in.jsonl",
            "--output-file",
            "o.csv",
            "--rpm",
            "10",
        ])
        .unwrap();
        let mut config = ScreenerConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.scheduler.requests_per_minute, 10);
    }
}
