// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (tracing) on stderr
// 2. Parse command-line arguments using clap
// 3. Validate them into a CrawlConfiguration
// 4. Crawl the site and write the markdown report
// 5. Exit with proper code (0 = no broken links, 1 = broken links, 2 = error)
//
// Logs go to stderr so that stdout only carries the summary (or the JSON
// output with --json). Set RUST_LOG to change the log level, e.g.
//   RUST_LOG=site_crawler=debug site-crawler https://example.com 1 example.com
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli;           // src/cli.rs - command-line parsing
mod config;        // src/config.rs - validated crawl configuration
mod crawl;         // src/crawl/ - concurrent crawl engine
mod fetch;         // src/fetch/ - HTTP fetching and HTML parsing
mod report;        // src/report/ - markdown report

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use config::{parse_domain_list, ConfigurationError, CrawlConfiguration, DepthLimit};
use crawl::{normalize_url, CrawlResult, PageAnalyzer, WebCrawler};
use fetch::HttpPageLoader;
use report::{count_broken, ReportWriter};

const USAGE: &str = "Usage: site-crawler <START_URL> <MAX_DEPTH> <DOMAINS> [OPTIONS]\n\
                     Run site-crawler --help for the list of options";

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "site_crawler=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = no broken links
//   Ok(1) = broken links found
//   Ok(2) = invalid arguments
//   Err = unexpected error (also exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(error = %error, "invalid configuration");
            eprintln!("Error: {}", error);
            eprintln!("{}", USAGE);
            return Ok(2);
        }
    };

    if !cli.json {
        println!("🔍 Crawling website: {}", config.root_url());
        println!("📊 Max crawl depth: {}", config.max_depth());
    }

    let loader = HttpPageLoader::new(Duration::from_secs(cli.timeout))
        .context("failed to build HTTP client")?;
    let analyzer = PageAnalyzer::new(Arc::new(loader));

    let roots = collect_roots(config.root_url().as_str(), &cli.extra_roots);

    let crawler = WebCrawler::new(config, analyzer, cli.threads);
    let results = if roots.len() == 1 {
        crawler.crawl().await
    } else {
        crawler.crawl_roots(roots.clone()).await
    };

    ReportWriter::new(&cli.output).write(&results, &roots)?;
    print_results(&results, &cli.output, cli.json)?;

    if count_broken(&results) > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}

fn build_config(cli: &Cli) -> Result<CrawlConfiguration, ConfigurationError> {
    let max_depth = match cli.max_depth.trim() {
        "" => None,
        raw => Some(raw.parse::<DepthLimit>()?),
    };

    CrawlConfiguration::new(&cli.start_url, max_depth, parse_domain_list(&cli.domains))
}

// The start URL followed by the extra roots, which get the same cleanup as
// the start URL. Roots that normalize to the same page are kept once.
fn collect_roots(start_url: &str, extra_roots: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let extra = extra_roots
        .iter()
        .map(|root| root.trim().to_lowercase())
        .filter(|root| !root.is_empty());

    std::iter::once(start_url.to_string())
        .chain(extra)
        .filter(|root| seen.insert(normalize_url(root).unwrap_or_else(|| root.clone())))
        .collect()
}

fn print_results(results: &[CrawlResult], report_path: &Path, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(results)?;
        println!("{}", json_output);
        return Ok(());
    }

    let broken: Vec<&CrawlResult> = results.iter().filter(|r| r.is_fetch_failed()).collect();

    println!("📄 Crawled {} page(s)", results.len());
    if !broken.is_empty() {
        println!("\n❌ Broken links:");
        for page in &broken {
            let reason = page.failure().map(|f| f.to_string()).unwrap_or_default();
            println!("   {} (depth {}): {}", page.page_url(), page.depth(), reason);
        }
        println!();
    }

    println!("📊 Summary:");
    println!("   ✅ OK: {}", results.len() - broken.len());
    println!("   ❌ Broken: {}", broken.len());
    println!("   📝 Report: {}", report_path.display());
    Ok(())
}
