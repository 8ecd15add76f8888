// src/crawl/crawler.rs
// =============================================================================
// The crawl orchestrator.
//
// How it works:
// 1. Submit one task per root URL at depth 0
// 2. Each task:
//    - drops the URL if it doesn't normalize, is too deep, or is on a domain
//      we may not visit
//    - claims the URL in the visited map; if someone else already claimed
//      it, only records where we came from. When that origin is new to an
//      already fetched page, its links are submitted again for the origin.
//    - otherwise fetches the page, stores the result, and submits one task
//      per outbound link at depth + 1 for every origin that reached the page
//      (unless the fetch failed)
// 3. Drain the executor until no task is left, shut it down, and hand back
//    the results sorted by depth
//
// There is no queue of our own: the crawl is the seed tasks plus whatever
// the tasks submit themselves.
// =============================================================================

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{
    is_allowed, normalize_url, CrawlResult, ExecutorError, PageAnalyzer, ShutdownOutcome,
    TaskExecutor,
};
use crate::config::CrawlConfiguration;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(60);

// What the crawl knows about one claimed page. Every task that finds the
// page shares it.
struct PageState {
    depth: usize,
    // root URLs that reached this page
    parents: BTreeSet<String>,
    // links to follow, None until the page has been fetched
    links: Option<Vec<String>>,
}

type SharedPage = Arc<Mutex<PageState>>;

enum Claim {
    New(SharedPage),
    // Fetched before, but not for this origin: its links have to be
    // followed again so the origin reaches the pages below
    NewOrigin { depth: usize, links: Vec<String> },
    AlreadyVisited,
}

struct StoredPage {
    result: CrawlResult,
    page: SharedPage,
}

#[derive(Default)]
struct CrawlState {
    // normalized URL -> the page claimed under that key
    visited: DashMap<String, SharedPage>,
    results: Mutex<Vec<StoredPage>>,
}

impl CrawlState {
    // Check-and-insert in one step: the entry holds the shard lock, so two
    // tasks racing for the same key can't both see it as new
    fn claim(&self, key: &str, origin: &str, depth: usize) -> Claim {
        let page = match self.visited.entry(key.to_string()) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                let page = Arc::new(Mutex::new(PageState {
                    depth,
                    parents: BTreeSet::from([origin.to_string()]),
                    links: None,
                }));
                entry.insert(Arc::clone(&page));
                return Claim::New(page);
            }
        };

        let mut state = lock(&page);
        if !state.parents.insert(origin.to_string()) {
            return Claim::AlreadyVisited;
        }
        // Still being fetched: the fetching task passes the origin on
        match &state.links {
            Some(links) => Claim::NewOrigin {
                depth: state.depth,
                links: links.clone(),
            },
            None => Claim::AlreadyVisited,
        }
    }

    // Records the links of a fetched page and returns every origin that
    // reached it so far. Origins arriving later see the links in claim().
    fn finish(&self, page: &SharedPage, links: Vec<String>) -> Vec<String> {
        let mut state = lock(page);
        state.links = Some(links);
        state.parents.iter().cloned().collect()
    }

    fn store(&self, result: CrawlResult, page: SharedPage) {
        lock(&self.results).push(StoredPage { result, page });
    }

    // Only called after the drain, when no task can add parents any more
    fn snapshot(&self) -> Vec<CrawlResult> {
        let pages = std::mem::take(&mut *lock(&self.results));

        let mut results: Vec<CrawlResult> = pages
            .into_iter()
            .map(|stored| {
                let parents = lock(&stored.page).parents.clone();
                stored.result.with_parent_origins(parents)
            })
            .collect();
        results.sort_by_key(CrawlResult::depth);
        results
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// Everything a crawl task needs, shared through one Arc
struct CrawlContext {
    config: CrawlConfiguration,
    analyzer: PageAnalyzer,
    executor: TaskExecutor,
    state: CrawlState,
}

impl CrawlContext {
    // Returns the normalized key if the URL may be crawled at this depth
    fn admit(&self, url: &str, depth: usize) -> Option<String> {
        let Some(key) = normalize_url(url) else {
            tracing::trace!(url = %url, "dropping link that is not an absolute URL");
            return None;
        };
        if !self.config.allows_depth(depth) {
            tracing::trace!(url = %url, depth, "dropping link beyond max depth");
            return None;
        }
        if !is_allowed(url, self.config.allowed_domains()) {
            tracing::trace!(url = %url, "dropping link to a domain that is not allowed");
            return None;
        }
        Some(key)
    }
}

pub struct WebCrawler {
    context: Arc<CrawlContext>,
}

impl WebCrawler {
    /// Creates the crawler and starts its worker pool (needs a tokio runtime)
    pub fn new(config: CrawlConfiguration, analyzer: PageAnalyzer, pool_size: usize) -> Self {
        Self {
            context: Arc::new(CrawlContext {
                config,
                analyzer,
                executor: TaskExecutor::new(pool_size),
                state: CrawlState::default(),
            }),
        }
    }

    /// Crawls from the configured root URL
    pub async fn crawl(self) -> Vec<CrawlResult> {
        let root = self.context.config.root_url().to_string();
        self.crawl_roots(vec![root]).await
    }

    /// Crawls from several roots at once. A page reachable from more than
    /// one root is fetched once and lists every root in its parent origins.
    pub async fn crawl_roots(self, roots: Vec<String>) -> Vec<CrawlResult> {
        let context = self.context;
        tracing::info!(roots = ?roots, "starting crawl\n{}", context.config);

        for root in roots {
            let origin: Arc<str> = Arc::from(root.as_str());
            if let Err(error) = submit_crawl_task(&context, root, 0, origin) {
                tracing::error!(error = %error, "could not submit root URL");
            }
        }

        let summary = context.executor.drain().await;
        tracing::info!(
            tasks = summary.submitted,
            failed_tasks = summary.failed,
            pages = context.state.visited.len(),
            "crawl finished"
        );

        match context.executor.shutdown(SHUTDOWN_GRACE).await {
            ShutdownOutcome::Graceful => {}
            outcome => tracing::warn!(outcome = ?outcome, "worker pool did not stop cleanly"),
        }

        context.state.snapshot()
    }
}

fn submit_crawl_task(
    context: &Arc<CrawlContext>,
    url: String,
    depth: usize,
    origin: Arc<str>,
) -> Result<(), ExecutorError> {
    let task_context = Arc::clone(context);
    let name = format!("crawl {} (depth {})", url, depth);
    context
        .executor
        .submit(name, crawl_page(task_context, url, depth, origin))
}

fn submit_links(
    context: &Arc<CrawlContext>,
    page_url: &str,
    links: &[String],
    depth: usize,
    origin: &Arc<str>,
) -> Result<()> {
    for link in links {
        submit_crawl_task(context, link.clone(), depth, Arc::clone(origin))
            .with_context(|| format!("failed to submit links found on {}", page_url))?;
    }
    Ok(())
}

async fn crawl_page(
    context: Arc<CrawlContext>,
    url: String,
    depth: usize,
    origin: Arc<str>,
) -> Result<()> {
    let Some(key) = context.admit(&url, depth) else {
        return Ok(());
    };

    let page = match context.state.claim(&key, &origin, depth) {
        Claim::New(page) => page,
        Claim::NewOrigin {
            depth: page_depth,
            links,
        } => {
            tracing::debug!(url = %url, origin = %origin, "new origin for a visited page");
            return submit_links(&context, &url, &links, page_depth + 1, &origin);
        }
        Claim::AlreadyVisited => {
            tracing::debug!(url = %url, origin = %origin, "already visited");
            return Ok(());
        }
    };

    tracing::info!(url = %url, depth, "crawling page");
    let result = context.analyzer.process_page(&url, depth).await;

    let links = if result.is_fetch_failed() {
        Vec::new()
    } else {
        result.child_links().to_vec()
    };
    context.state.store(result, Arc::clone(&page));

    for parent in context.state.finish(&page, links.clone()) {
        let parent: Arc<str> = Arc::from(parent);
        submit_links(&context, &url, &links, depth + 1, &parent)?;
    }
    Ok(())
}
