//! The crawl pipeline: search once, then scan, process, persist, paginate.

pub mod classify;
pub mod detail;
pub mod navigate;
pub mod pagination;
pub mod rows;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::browser::BrowserSession;
use crate::config::CrawlConfig;
use crate::crawl::detail::DetailPageProcessor;
use crate::crawl::navigate::NavigationController;
use crate::crawl::pagination::Paginator;
use crate::crawl::rows::collect_rows;
use crate::error::Result;
use crate::models::{CrawlState, PageOutcome, PageSignature, ResultRow};
use crate::output::JsonlWriter;
use crate::utils::jitter_sleep;

/// Final tally of one run.
#[derive(Debug)]
pub struct CrawlSummary {
    pub pages_visited: u32,
    pub written: usize,
    pub skipped_seen: usize,
    pub failed_rows: usize,
}

/// Drives the whole crawl over a single browser session.
///
/// One logical worker: rows are processed strictly in encounter order, one
/// ephemeral detail tab at a time, and every appended record is already
/// durable when the next row starts. Interrupting the process at any point
/// therefore loses nothing that was reported as written.
pub struct Crawler {
    config: CrawlConfig,
    writer: JsonlWriter,
    state: CrawlState,
    processor: DetailPageProcessor,
    paginator: Paginator,
}

impl Crawler {
    /// Set up the writer (rebuilding the resume set unless disabled) and
    /// the pipeline components.
    pub fn new(config: CrawlConfig) -> Result<Self> {
        let (writer, seen) = JsonlWriter::open(&config.out_path)?;
        let seen = if config.resume {
            seen
        } else {
            info!("Resume disabled; reprocessing everything");
            Default::default()
        };

        let state = CrawlState::new(seen, config.empty_page_limit);
        let processor = DetailPageProcessor::new(&config);
        let paginator = Paginator::new(config.page_step);

        Ok(Self {
            config,
            writer,
            state,
            processor,
            paginator,
        })
    }

    /// Run the crawl to completion. Only a setup failure (search UI never
    /// appeared, browser would not launch) is an error; every other
    /// failure is absorbed at the row or fetch level.
    pub async fn run(mut self) -> Result<CrawlSummary> {
        let session = BrowserSession::launch(self.config.headless).await?;
        let outcome = self.crawl(&session).await;
        session.close().await;
        outcome
    }

    async fn crawl(&mut self, session: &BrowserSession) -> Result<CrawlSummary> {
        NavigationController::new(&self.config)
            .initialize(session)
            .await?;

        let mut skipped_seen = 0usize;
        let mut failed_rows = 0usize;

        // First page comes from the search itself; later ones from the
        // paginator, which returns the rows it verified.
        let mut rows = {
            let url = session.current_url().await?;
            let html = session.content().await?;
            collect_rows(&html, &url)
        };

        loop {
            let page = self.state.page();
            info!(
                "Page {} of '{}': {} rows",
                page,
                self.config.query,
                rows.len()
            );

            if self.state.record_page(rows.len()) == PageOutcome::EmptyLimitReached {
                info!(
                    "{} consecutive empty pages; assuming end of results",
                    self.state.consecutive_empty()
                );
                break;
            }

            if !rows.is_empty() {
                let (skipped, failed) = self.process_page(session, &rows).await;
                skipped_seen += skipped;
                failed_rows += failed;
            }

            if self.config.max_pages > 0 && page >= self.config.max_pages {
                info!("Reached configured page limit ({})", self.config.max_pages);
                break;
            }

            // Politeness pause between page transitions
            jitter_sleep(1.8, 2.8).await;

            let signature = PageSignature::of(&rows);
            let advance = self.paginator.advance(session, &signature).await;
            if !advance.advanced {
                info!("Pagination exhausted after page {}", page);
                break;
            }
            rows = advance.rows;
            self.state.advance_page();
        }

        Ok(CrawlSummary {
            pages_visited: self.state.page(),
            written: self.state.written(),
            skipped_seen,
            failed_rows,
        })
    }

    /// Process every row of one page in encounter order. Returns
    /// (skipped-as-seen, failed) counts; failures never propagate.
    async fn process_page(
        &mut self,
        session: &BrowserSession,
        rows: &[ResultRow],
    ) -> (usize, usize) {
        let progress = ProgressBar::new(rows.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
                .unwrap()
                .progress_chars("█▓░"),
        );

        let mut skipped = 0usize;
        let mut failed = 0usize;

        for row in rows {
            progress.set_message(row.identifier.clone());

            if self.config.resume && self.state.already_seen(&row.identifier) {
                info!("{} already written; skipping", row.identifier);
                skipped += 1;
                progress.inc(1);
                continue;
            }

            match self.processor.process(session, row).await {
                Ok(record) => {
                    if self.state.already_seen(&record.k_number) {
                        // The corrected identifier can collide with an
                        // earlier record even when the listing text didn't
                        info!("{} already written under corrected id; skipping", record.k_number);
                        skipped += 1;
                    } else {
                        match self.writer.append(&record) {
                            Ok(()) => {
                                self.state.mark_written(&row.identifier, &record.k_number);
                                let text_len =
                                    record.summary_text.as_deref().map(str::len).unwrap_or(0);
                                info!(
                                    "{}: pdf_type={} text_len={}",
                                    record.k_number, record.pdf_type, text_len
                                );
                            }
                            Err(e) => {
                                warn!("Failed to persist {}: {}", record.k_number, e);
                                failed += 1;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!("{}", e);
                    failed += 1;
                }
            }

            progress.inc(1);

            // Politeness pause between detail rows
            jitter_sleep(self.config.throttle, self.config.throttle + 0.9).await;
        }

        progress.finish_and_clear();
        (skipped, failed)
    }
}
