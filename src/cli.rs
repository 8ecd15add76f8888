// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use clap's "derive" API: the struct below is the whole CLI, and the
// #[arg(...)] attributes describe how each field is read from the command line.
//
// Usage:
//   site-crawler <START_URL> <MAX_DEPTH> <DOMAINS> [OPTIONS]
//
// The three positional arguments are kept as raw strings on purpose. They are
// validated by CrawlConfiguration so that bad input produces our own error
// messages (and exit code 2) instead of clap's.
// =============================================================================

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "site-crawler",
    version = "0.1.0",
    about = "Crawls a website and writes a markdown report of its pages and headings",
    long_about = "site-crawler follows links from a start URL up to a maximum depth, \
                  staying inside the allowed domains. It writes every visited page with \
                  its headings to a markdown report and flags links that could not be fetched."
)]
pub struct Cli {
    /// URL to start crawling from (e.g., https://example.com)
    pub start_url: String,

    /// Maximum crawl depth: 0 = only the start page, "unlimited" = no limit
    ///
    /// allow_hyphen_values lets a negative number through so that it is
    /// reported as a negative depth rather than an unknown flag.
    #[arg(allow_hyphen_values = true)]
    pub max_depth: String,

    /// Comma separated list of domains the crawler may visit
    ///
    /// Example: "example.com,docs.example.com"
    pub domains: String,

    /// Number of pages fetched concurrently
    #[arg(long, default_value_t = 20)]
    pub threads: usize,

    /// Where to write the markdown report
    #[arg(short, long, default_value = "report.md")]
    pub output: PathBuf,

    /// Also print the results as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Timeout in seconds for each page request
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Additional root URL to crawl from (can be repeated)
    ///
    /// Every root gets its own section in the report.
    #[arg(long = "extra-root", value_name = "URL")]
    pub extra_roots: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    // Parses the arguments that follow the program name
    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("site-crawler").chain(args.iter().copied()))
    }

    #[test]
    fn test_positional_arguments_and_defaults() {
        let cli = parse(&["https://example.com", "2", "example.com"]).unwrap();

        assert_eq!(cli.start_url, "https://example.com");
        assert_eq!(cli.max_depth, "2");
        assert_eq!(cli.domains, "example.com");
        assert_eq!(cli.threads, 20);
        assert_eq!(cli.output, PathBuf::from("report.md"));
        assert!(!cli.json);
        assert_eq!(cli.timeout, 10);
        assert!(cli.extra_roots.is_empty());
    }

    #[test]
    fn test_all_options() {
        let cli = parse(&[
            "https://example.com",
            "unlimited",
            "example.com,docs.example.com",
            "--threads",
            "4",
            "-o",
            "out/site.md",
            "--json",
            "--timeout",
            "3",
            "--extra-root",
            "https://example.com/a",
            "--extra-root",
            "https://example.com/b",
        ])
        .unwrap();

        assert_eq!(cli.threads, 4);
        assert_eq!(cli.output, PathBuf::from("out/site.md"));
        assert!(cli.json);
        assert_eq!(cli.timeout, 3);
        assert_eq!(
            cli.extra_roots,
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }

    #[test]
    fn test_negative_depth_reaches_validation() {
        let cli = parse(&["https://example.com", "-1", "example.com"]).unwrap();
        assert_eq!(cli.max_depth, "-1");
    }

    #[test]
    fn test_missing_arguments_are_rejected() {
        assert!(parse(&["https://example.com"]).is_err());
        assert!(parse(&["https://example.com", "1", "a.com", "--threads", "many"]).is_err());
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Positional vs. flag arguments
//    - Fields without #[arg(long)] or #[arg(short)] are positional
//    - Their order in the struct is the order on the command line
//
// 2. Why Vec<String> for --extra-root?
//    - clap collects every occurrence of a repeated flag into the Vec
//    - No occurrence means an empty Vec, so the flag is optional
//
// 3. What does try_parse_from do?
//    - Same as parse(), but takes the arguments from an iterator and returns
//      a Result instead of exiting the process
//    - Handy in tests: the first item plays the role of the program name
// -----------------------------------------------------------------------------
