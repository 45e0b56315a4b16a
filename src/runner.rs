//! End-to-end screening run: source pages → scheduler → reducer → sinks.

use crate::reducer::reduce;
use crate::scheduler::Scheduler;
use crate::sink::RecordSink;
use crate::source::PostSource;
use crate::types::{AcceptedRecord, CandidateText, TEXT_FIELD};
use crate::Result;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub pages: usize,
    pub candidates: usize,
    /// Records dropped for lacking a string text field.
    pub skipped: usize,
    pub accepted: usize,
    pub flushes: usize,
}

pub struct Screener {
    scheduler: Scheduler,
    sinks: Vec<Box<dyn RecordSink>>,
    flush_every: usize,
    text_field: String,
}

impl Screener {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            sinks: Vec::new(),
            flush_every: 100,
            text_field: TEXT_FIELD.to_string(),
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn RecordSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// `0` disables periodic flushing; the final flush always happens.
    pub fn with_flush_every(mut self, n: usize) -> Self {
        self.flush_every = n;
        self
    }

    pub fn with_text_field(mut self, field: impl Into<String>) -> Self {
        self.text_field = field.into();
        self
    }

    /// Screen every record `source` yields.
    ///
    /// On error the run stops without a final flush, so the sinks hold
    /// whatever the last periodic flush wrote.
    pub async fn run<S>(&mut self, source: &mut S) -> Result<RunSummary>
    where
        S: PostSource + ?Sized,
    {
        let mut summary = RunSummary::default();
        let mut buffer: Vec<AcceptedRecord> = Vec::new();
        let mut flushed_len = 0usize;
        let mut submitted = false;
        let delay = self.scheduler.config().inter_batch_delay();

        while let Some(page) = source.next_page().await? {
            summary.pages += 1;
            let page_len = page.len();
            let candidates: Vec<CandidateText> = page
                .into_iter()
                .filter_map(|r| CandidateText::from_record(r, &self.text_field))
                .collect();
            let skipped = page_len - candidates.len();
            if skipped > 0 {
                warn!(
                    skipped,
                    field = self.text_field.as_str(),
                    "dropping records without a text field"
                );
                summary.skipped += skipped;
            }
            if candidates.is_empty() {
                continue;
            }

            // keep the request ceiling across pages, not just within one
            if submitted {
                tokio::time::sleep(delay).await;
            }
            let verdicts = self.scheduler.run_all(&candidates).await?;
            submitted = true;

            summary.candidates += candidates.len();
            let accepted = reduce(
                candidates.into_iter().map(CandidateText::into_record),
                &verdicts,
            )?;
            debug!(
                page = summary.pages,
                accepted = accepted.len(),
                "page screened"
            );
            summary.accepted += accepted.len();
            buffer.extend(accepted);

            if self.flush_every > 0 && buffer.len() - flushed_len >= self.flush_every {
                self.flush(&buffer)?;
                flushed_len = buffer.len();
                summary.flushes += 1;
            }
        }

        self.flush(&buffer)?;
        summary.flushes += 1;

        info!(
            pages = summary.pages,
            candidates = summary.candidates,
            skipped = summary.skipped,
            accepted = summary.accepted,
            "screening finished"
        );
        Ok(summary)
    }

    fn flush(&mut self, records: &[AcceptedRecord]) -> Result<()> {
        for sink in self.sinks.iter_mut() {
            sink.write_all(records)?;
            debug!(sink = sink.name(), records = records.len(), "sink flushed");
        }
        Ok(())
    }
}
