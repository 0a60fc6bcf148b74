use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::signal;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};
use url::Url;

use webscout_client::renderer::SETTLE_DELAY;
use webscout_client::{Fetcher, JsRenderer, ProxyRotator, RobotsCache, DEFAULT_TIMEOUT_SECS};
use webscout_core::{
    CrawlConfig, CrawlError, CrawlJob, CrawlerPlugin, PageRecord, UrlPolicy,
};
use webscout_frontier::{CrawlState, Frontier, Snapshot, DEFAULT_STATE_FILE};
use webscout_notify::Notifier;
use webscout_storage::{open_sink, Sink};

use crate::plugins::PluginRegistry;

/// Name of the end-of-run broken-links report, written next to the output.
const BROKEN_LINKS_FILE: &str = "broken_links.txt";

/// Everything a pipeline worker needs, passed explicitly instead of through
/// globals: policy, clients, shared state and the sink.
struct CrawlContext {
    config: CrawlConfig,
    policy: UrlPolicy,
    fetcher: Fetcher,
    robots: RobotsCache,
    proxies: ProxyRotator,
    renderer: Option<JsRenderer>,
    frontier: Frontier,
    state: CrawlState,
    sink: Mutex<Box<dyn Sink>>,
    notifier: Option<Arc<Notifier>>,
    plugins: Vec<Box<dyn CrawlerPlugin>>,
}

/// Run-scoped files (state snapshot, broken-links report) live next to the
/// sink target.
fn sibling(output: &str, name: &str) -> PathBuf {
    match Path::new(output).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(name),
        _ => PathBuf::from(name),
    }
}

pub async fn run_crawl(config: CrawlConfig, resume: bool) -> Result<()> {
    let seed_str = config.url.clone().ok_or_else(|| {
        CrawlError::Config("no seed URL given (positional argument or `url` config key)".into())
    })?;
    let seed =
        Url::parse(&seed_str).map_err(|e| CrawlError::InvalidUrl(format!("{seed_str}: {e}")))?;
    if seed.scheme() != "http" && seed.scheme() != "https" {
        return Err(CrawlError::InvalidUrl(format!(
            "{seed_str}: only http and https seeds are supported"
        ))
        .into());
    }

    let timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
    let policy = UrlPolicy::new(
        config.exclude_patterns.clone(),
        config.content_types.clone(),
    );

    let proxies = match &config.proxy_list {
        Some(path) => ProxyRotator::from_file(Path::new(path))?,
        None => ProxyRotator::new(Vec::new()),
    };
    if !proxies.is_empty() {
        info!(count = proxies.endpoints().len(), "proxy rotation enabled");
    }

    let fetcher = Fetcher::new(&config.user_agent, timeout, proxies.endpoints())?;
    let robots = RobotsCache::new(&config.user_agent, timeout)?;

    let renderer = if config.render_js {
        let renderer = JsRenderer::launch(SETTLE_DELAY)
            .await
            .map_err(|e| CrawlError::Config(format!("cannot launch JS renderer: {e}")))?;
        info!("JS rendering enabled");
        Some(renderer)
    } else {
        None
    };

    let frontier = Frontier::new(config.crawl_pattern);
    let state = CrawlState::new();

    let state_path = sibling(&config.output, DEFAULT_STATE_FILE);
    let mut resumed = false;
    if resume && state_path.exists() {
        Snapshot::load(&state_path)?
            .restore(&frontier, &state)
            .await?;
        info!(
            frontier = frontier.len().await,
            visited = state.visited.len(),
            "resumed from saved state"
        );
        resumed = true;
    }
    if !resumed {
        frontier.push(CrawlJob::new(seed.clone(), 0)).await;
    }

    let plugins = PluginRegistry::builtin().discover(Path::new(&config.plugin_dir));

    let notifier = match &config.notification_email {
        Some(addr) => Some(Arc::new(Notifier::new(addr)?)),
        None => None,
    };

    // Opened once, after every other fallible startup step; closed once
    // after the workers join.
    let sink = open_sink(config.output_format, &config.output)?;

    let workers = config.threads.max(1);
    let ctx = Arc::new(CrawlContext {
        config,
        policy,
        fetcher,
        robots,
        proxies,
        renderer,
        frontier,
        state,
        sink: Mutex::new(sink),
        notifier,
        plugins,
    });

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let ctrlc = tokio::spawn({
        let tx = shutdown_tx.clone();
        async move {
            if signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
                let _ = tx.send(());
            }
        }
    });

    info!(workers, seed = %seed, "spawning crawl workers");
    let mut handles = Vec::new();
    for worker_id in 0..workers {
        let ctx = Arc::clone(&ctx);
        let mut shutdown = shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move {
            debug!(worker_id, "worker started");
            loop {
                tokio::select! {
                    _ = shutdown.recv() => {
                        info!(worker_id, "worker shutting down");
                        break;
                    }
                    finished = work_once(&ctx, worker_id) => {
                        if finished {
                            break;
                        }
                    }
                }
            }
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }
    ctrlc.abort();

    // The sink is closed exactly once, here, even when the run was interrupted.
    if let Err(e) = ctx.sink.lock().await.close() {
        error!("sink close failed: {e}");
    }

    write_broken_report(&ctx.state, &sibling(&ctx.config.output, BROKEN_LINKS_FILE));

    Snapshot::capture(&ctx.frontier, &ctx.state)
        .await
        .save(&state_path)?;

    if let Some(renderer) = &ctx.renderer {
        renderer.shutdown().await;
    }

    info!(
        pages = ctx.state.visited.len(),
        broken = ctx.state.broken_links().len(),
        "crawl finished"
    );
    Ok(())
}

/// One scheduling turn of a worker: pop a job and run the pipeline, or
/// decide whether the crawl is over. Returns true when the worker should
/// exit.
async fn work_once(ctx: &CrawlContext, worker_id: usize) -> bool {
    let Some(job) = ctx.frontier.pop().await else {
        if ctx.frontier.is_done().await {
            debug!(worker_id, "frontier drained, worker exiting");
            return true;
        }
        // Another worker is mid-pipeline and may repopulate the frontier.
        tokio::time::sleep(Duration::from_millis(100)).await;
        return false;
    };

    let links = process_job(ctx, worker_id, &job).await;
    if !links.is_empty() {
        let enqueued = ctx.frontier.push_links(links).await;
        debug!(worker_id, url = %job.url, enqueued, "links enqueued");
    }
    ctx.frontier.finish_job();
    false
}

/// The per-URL pipeline. Returns the accepted outbound links, capped at the
/// configured breadth, ready to enqueue at depth + 1.
async fn process_job(ctx: &CrawlContext, worker_id: usize, job: &CrawlJob) -> Vec<CrawlJob> {
    let url = &job.url;

    if job.depth > ctx.config.depth {
        debug!(worker_id, url = %url, depth = job.depth, "beyond depth limit, discarded");
        return Vec::new();
    }
    if ctx.state.visited.contains(url.as_str()) {
        return Vec::new();
    }
    if !ctx.robots.can_fetch(url).await {
        info!(worker_id, url = %url, "disallowed by robots.txt");
        return Vec::new();
    }
    // Exclusions are enforced at enqueue; the recheck is cheap.
    if let Some(pattern) = ctx.policy.excluded_pattern(url.as_str()) {
        debug!(worker_id, url = %url, pattern, "matches exclude pattern, discarded");
        return Vec::new();
    }

    // Rotation advances even when rendering bypasses the proxy.
    let proxy = ctx.proxies.next();

    info!(worker_id, url = %url, depth = job.depth, "fetching");
    let (final_url, body, content_type, rendered_title) = match &ctx.renderer {
        Some(renderer) => match renderer.render(url).await {
            Ok((body, title)) => (url.clone(), body.into_bytes(), None, title),
            Err(e) => {
                warn!(worker_id, url = %url, "fetch failed: {e}");
                ctx.state.record_broken(url.as_str(), &e.to_string());
                return Vec::new();
            }
        },
        None => match ctx.fetcher.fetch(url, proxy).await {
            Ok(resp) => (resp.final_url, resp.body, resp.content_type, None),
            Err(e) => {
                warn!(worker_id, url = %url, "fetch failed: {e}");
                ctx.state.record_broken(url.as_str(), &e.to_string());
                return Vec::new();
            }
        },
    };

    if ctx.renderer.is_none() {
        let ct = content_type.unwrap_or_default();
        if !ctx.policy.allows_content_type(&ct) {
            info!(worker_id, url = %url, content_type = %ct, "content type rejected");
            return Vec::new();
        }
    }

    let body_text = String::from_utf8_lossy(&body).into_owned();
    let mut page = webscout_parser::extract(&body_text);
    if let Some(title) = rendered_title {
        if !title.is_empty() {
            page.title = title;
        }
    }

    let category = webscout_parser::classify(&page.text);

    if ctx.state.changes.observe(url.as_str(), &body) {
        info!(worker_id, url = %url, "content changed since last visit");
        if let Some(notifier) = &ctx.notifier {
            let notifier = Arc::clone(notifier);
            let subject = format!("Content change detected: {url}");
            let text = format!("The page at {url} has changed since it was last crawled.");
            tokio::spawn(async move { notifier.notify(&subject, &text).await });
        }
    }

    for plugin in &ctx.plugins {
        if let Err(e) = plugin.process(final_url.as_str(), &body_text, &page.metadata, &category) {
            warn!(worker_id, plugin = plugin.name(), url = %url, "plugin error: {e}");
        }
    }

    let record = PageRecord {
        url: final_url.to_string(),
        title: page.title,
        metadata: page.metadata,
        content: body_text,
        category,
    };

    {
        let mut sink = ctx.sink.lock().await;
        if let Err(e) = sink.write(&record) {
            warn!(worker_id, url = %url, "sink write failed, retrying once: {e}");
            if let Err(e) = sink.write(&record) {
                error!(worker_id, url = %url, "sink write failed twice, record dropped: {e}");
            }
        }
    }
    // The originating URL counts as visited; after a redirect the final URL
    // does too, so it is never fetched separately.
    ctx.state.visited.insert(url.to_string());
    if final_url != *url {
        ctx.state.visited.insert(final_url.to_string());
        ctx.frontier.mark_seen(final_url.as_str());
    }
    info!(worker_id, url = %url, title = %record.title, category = %record.category, "crawled");

    if ctx.config.delay > 0.0 {
        tokio::time::sleep(Duration::from_secs_f64(ctx.config.delay)).await;
    }

    // Normalize raw links, drop visited and in-page duplicates, cap at the
    // configured breadth.
    let mut seen_this_page = HashSet::with_capacity(page.links.len());
    let mut accepted = Vec::new();
    for href in &page.links {
        let link = match ctx.policy.accept_href(&final_url, href) {
            Ok(link) => link,
            Err(reason) => {
                debug!(worker_id, %href, ?reason, "link rejected");
                continue;
            }
        };
        if ctx.state.visited.contains(link.as_str()) {
            continue;
        }
        if !seen_this_page.insert(link.to_string()) {
            continue;
        }
        accepted.push(CrawlJob::new(link, job.depth + 1));
        if accepted.len() >= ctx.config.breadth {
            break;
        }
    }
    accepted
}

fn write_broken_report(state: &CrawlState, path: &Path) {
    let broken = state.broken_links();
    if broken.is_empty() {
        return;
    }
    let mut report = String::new();
    for link in &broken {
        warn!(url = %link.url, "broken link: {}", link.error);
        report.push_str(&format!("{}\t{}\n", link.url, link.error));
    }
    if let Err(e) = std::fs::write(path, report) {
        error!(path = %path.display(), "cannot write broken-links report: {e}");
    } else {
        info!(count = broken.len(), path = %path.display(), "broken-links report written");
    }
}
