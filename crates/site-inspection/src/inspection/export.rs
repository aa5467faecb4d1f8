//! Save and export actions over a finished (or in-progress) audit.

use super::bank::{InspectionCatalog, DEFAULT_ACCENT_COLOR};
use super::domain::PumpStatus;
use super::notice::Notice;
use super::score::ScoreTotals;
use super::state::AuditState;
use crate::report::{
    build_report, render_pump_grid, RenderedReport, ReportError, ReportHeader, ReportRequest, Rgb,
    SnapshotError,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

/// Produces the PNG embedded as the pump compliance block.
pub trait SnapshotRenderer: Send + Sync {
    fn render(&self, statuses: &[PumpStatus]) -> Result<Vec<u8>, SnapshotError>;
}

/// Draws the grid from the audit's pump statuses.
#[derive(Debug, Clone, Copy, Default)]
pub struct PumpGridRenderer;

impl SnapshotRenderer for PumpGridRenderer {
    fn render(&self, statuses: &[PumpStatus]) -> Result<Vec<u8>, SnapshotError> {
        render_pump_grid(statuses)
    }
}

/// A snapshot captured elsewhere, e.g. from a browser.
#[derive(Debug, Clone)]
pub struct ProvidedSnapshot(pub Vec<u8>);

impl SnapshotRenderer for ProvidedSnapshot {
    fn render(&self, _statuses: &[PumpStatus]) -> Result<Vec<u8>, SnapshotError> {
        if self.0.is_empty() {
            return Err(SnapshotError::Empty);
        }
        Ok(self.0.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("an export is already in progress")]
    AlreadyRunning,
    #[error(transparent)]
    Report(#[from] ReportError),
}

impl ExportError {
    pub fn notice(&self) -> Notice {
        Notice::error(format!("PDF Generation Failed: {self}"))
    }
}

/// Allows one export at a time.
#[derive(Debug, Default)]
pub struct ExportCoordinator {
    running: AtomicBool,
}

/// Clears the in-progress flag when dropped.
#[derive(Debug)]
pub struct ExportGuard<'a> {
    running: &'a AtomicBool,
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

impl ExportCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn begin(&self) -> Result<ExportGuard<'_>, ExportError> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ExportError::AlreadyRunning)?;
        Ok(ExportGuard {
            running: &self.running,
        })
    }

    /// Captures the snapshot, then builds the document. A snapshot failure
    /// only drops the pump block; a document failure aborts the export.
    pub fn export(
        &self,
        catalog: &InspectionCatalog,
        state: &AuditState,
        snapshots: Option<&dyn SnapshotRenderer>,
    ) -> Result<RenderedReport, ExportError> {
        let _guard = self.begin()?;

        let snapshot = match snapshots.map(|renderer| renderer.render(state.pump_statuses())) {
            Some(Ok(png)) => Some(png),
            Some(Err(err)) => {
                warn!(error = %err, "pump snapshot failed; exporting without it");
                None
            }
            None => None,
        };

        let totals = state.totals(catalog.bank());
        let request = ReportRequest {
            header: ReportHeader {
                location: state.location().to_string(),
                inspector_name: state.inspector_name().to_string(),
                inspection_date: state.inspection_date(),
                live_score: totals.live_score,
                total_possible_score: totals.total_possible_score,
            },
            snapshot: snapshot.as_deref(),
            sections: catalog.bank().sections(),
            answers: state.answers(),
            comments: state.comments(),
            photos: state.photos(),
            accent: accent_rgb(catalog),
        };

        match build_report(&request) {
            Ok(report) => {
                info!(
                    location = state.location(),
                    file = %report.file_name,
                    pages = report.page_count,
                    failed_images = report.failed_images,
                    "audit exported"
                );
                Ok(report)
            }
            Err(err) => {
                error!(location = state.location(), error = %err, "audit export aborted");
                Err(err.into())
            }
        }
    }
}

/// Falls back to the bundled accent when the configured one does not parse.
pub fn accent_rgb(catalog: &InspectionCatalog) -> Rgb {
    Rgb::from_hex(&catalog.accent_color)
        .or_else(|| Rgb::from_hex(DEFAULT_ACCENT_COLOR))
        .unwrap_or(Rgb::BLACK)
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveReceipt {
    pub message: String,
    pub notice: Notice,
    pub totals: ScoreTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveError {
    #[error("audit is incomplete: {answered} of {total} questions answered")]
    Incomplete { answered: usize, total: usize },
}

/// Acknowledges a completed audit. Nothing is persisted.
pub fn save_audit(catalog: &InspectionCatalog, state: &AuditState) -> Result<SaveReceipt, SaveError> {
    let totals = state.totals(catalog.bank());
    if !totals.is_form_complete() {
        return Err(SaveError::Incomplete {
            answered: totals.answered_questions,
            total: totals.total_questions,
        });
    }

    let message = format!(
        "Audit for {} Saved! Score: {} / {}",
        state.location(),
        totals.live_score,
        totals.total_possible_score
    );
    info!(location = state.location(), score = totals.live_score, "audit saved");

    Ok(SaveReceipt {
        notice: Notice::success(message.clone()),
        message,
        totals,
    })
}
