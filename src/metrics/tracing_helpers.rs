//! Span constructors and a span timing layer.
//!
//! Call sites enter spans with `tracing_helpers::xxx_span().entered()`, so the crate only
//! depends on `tracing` when the feature is on.

use chrono::NaiveDate;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::span::{Attributes, Id};
use tracing::{Span, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

const MAX_STATEMENT_LEN: usize = 120;

fn statement_preview(query: &str) -> &str {
    match query.char_indices().nth(MAX_STATEMENT_LEN) {
        Some((idx, _)) => &query[..idx],
        None => query,
    }
}

pub fn execute_query_span(query: &str) -> Span {
    tracing::debug_span!("ledgerguard.query", db.statement = statement_preview(query))
}

pub fn acquire_connection_span() -> Span {
    tracing::debug_span!("ledgerguard.connect")
}

pub fn begin_transaction_span() -> Span {
    tracing::debug_span!("ledgerguard.transaction.begin")
}

pub fn commit_transaction_span() -> Span {
    tracing::debug_span!("ledgerguard.transaction.commit")
}

pub fn rollback_transaction_span() -> Span {
    tracing::debug_span!("ledgerguard.transaction.rollback")
}

pub fn post_journal_entry_span(doc_num: &str) -> Span {
    tracing::info_span!("ledgerguard.post_journal_entry", doc_num = doc_num)
}

pub fn reconcile_sales_order_span(document_no: &str) -> Span {
    tracing::info_span!("ledgerguard.reconcile_sales_order", document_no = document_no)
}

pub fn report_span(report: &'static str) -> Span {
    tracing::info_span!("ledgerguard.report", report = report)
}

pub fn device_sync_span(devices: usize) -> Span {
    tracing::info_span!("ledgerguard.device_sync", devices = devices)
}

pub fn payroll_span(year: i32, month: u32) -> Span {
    tracing::info_span!("ledgerguard.payroll", year = year, month = month)
}

pub fn attendance_span(from: NaiveDate, to: NaiveDate) -> Span {
    tracing::info_span!("ledgerguard.attendance", from = %from, to = %to)
}

struct SpanStart(Instant);

/// Logs the duration of every closed span slower than `threshold` through the `log` facade
pub struct SpanTimingLayer {
    threshold: Duration,
    completed: Arc<AtomicU64>,
}

impl SpanTimingLayer {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            completed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Counter of spans closed so far, shared with the layer
    pub fn completed_handle(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.completed)
    }
}

impl<S> Layer<S> for SpanTimingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, _attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanStart(Instant::now()));
        }
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else {
            return;
        };
        self.completed.fetch_add(1, Ordering::Relaxed);
        let extensions = span.extensions();
        if let Some(start) = extensions.get::<SpanStart>() {
            let elapsed = start.0.elapsed();
            if elapsed >= self.threshold {
                log::debug!(target: "ledgerguard::spans", "{} took {:?}", span.name(), elapsed);
            }
        }
    }
}

/// Installs a registry with [`SpanTimingLayer`] as the global default subscriber.
///
/// Returns `false` when another subscriber is already installed.
pub fn init_span_timing(threshold: Duration) -> bool {
    tracing_subscriber::registry()
        .with(SpanTimingLayer::new(threshold))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_preview_truncates_long_sql() {
        let long = "SELECT ".repeat(100);
        assert_eq!(statement_preview(&long).chars().count(), MAX_STATEMENT_LEN);
        assert_eq!(statement_preview("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_span_timing_layer_counts_closed_spans() {
        let layer = SpanTimingLayer::new(Duration::ZERO);
        let completed = layer.completed_handle();
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            let _outer = post_journal_entry_span("JE-000001").entered();
            drop(report_span("trial_balance").entered());
        });

        assert_eq!(completed.load(Ordering::Relaxed), 2);
    }
}
