use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Local, NaiveDate};
use serde::Serialize;

use super::bank::InspectionCatalog;
use super::export::{
    save_audit, ExportCoordinator, ExportError, PumpGridRenderer, SaveError, SaveReceipt,
    SnapshotRenderer,
};
use super::score::ScoreTotals;
use super::state::{AuditAction, AuditState, InspectionError};
use crate::report::RenderedReport;

/// Snapshot of the audit returned to clients after every read or action.
#[derive(Debug, Clone, Serialize)]
pub struct AuditView {
    pub state: AuditState,
    pub totals: ScoreTotals,
    pub is_form_complete: bool,
    pub progress_pct: f32,
    /// Questions whose numeric sub-answer field is currently shown.
    pub visible_numeric_inputs: Vec<String>,
}

/// Single in-memory audit guarded for one writer at a time.
pub struct InspectionService {
    catalog: Arc<InspectionCatalog>,
    state: Mutex<AuditState>,
    exports: ExportCoordinator,
    snapshots: Box<dyn SnapshotRenderer>,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl InspectionService {
    pub fn new(catalog: Arc<InspectionCatalog>) -> Self {
        Self::with_clock(catalog, local_today)
    }

    pub fn with_clock(catalog: Arc<InspectionCatalog>, today: fn() -> NaiveDate) -> Self {
        let state = AuditState::for_catalog(&catalog, today());
        Self {
            catalog,
            state: Mutex::new(state),
            exports: ExportCoordinator::new(),
            snapshots: Box::new(PumpGridRenderer),
            today,
        }
    }

    pub fn with_snapshot_renderer(mut self, renderer: impl SnapshotRenderer + 'static) -> Self {
        self.snapshots = Box::new(renderer);
        self
    }

    pub fn catalog(&self) -> &InspectionCatalog {
        &self.catalog
    }

    fn lock(&self) -> MutexGuard<'_, AuditState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn view_of(&self, state: &AuditState) -> AuditView {
        let bank = self.catalog.bank();
        let totals = state.totals(bank);
        let visible_numeric_inputs = bank
            .questions()
            .filter(|question| state.numeric_input_visible(bank, &question.id))
            .map(|question| question.id.clone())
            .collect();

        AuditView {
            state: state.clone(),
            is_form_complete: totals.is_form_complete(),
            progress_pct: totals.progress_pct(),
            totals,
            visible_numeric_inputs,
        }
    }

    pub fn view(&self) -> AuditView {
        let state = self.lock();
        self.view_of(&state)
    }

    /// Applies one action; a rejected action leaves the audit untouched.
    pub fn apply(&self, action: AuditAction) -> Result<AuditView, InspectionError> {
        let mut state = self.lock();
        state.apply(&self.catalog, action, (self.today)())?;
        Ok(self.view_of(&state))
    }

    /// Swaps in a whole audit, as read back from `GET /api/v1/audit`, after
    /// validating it.
    pub fn replace(&self, audit: AuditState) -> Result<AuditView, InspectionError> {
        audit.validate(&self.catalog)?;
        let mut state = self.lock();
        *state = audit;
        Ok(self.view_of(&state))
    }

    pub fn save(&self) -> Result<SaveReceipt, SaveError> {
        let state = self.lock();
        save_audit(&self.catalog, &state)
    }

    /// Renders from a copy so the audit stays writable during layout.
    pub fn export(&self) -> Result<RenderedReport, ExportError> {
        let state = self.lock().clone();
        self.exports
            .export(&self.catalog, &state, Some(self.snapshots.as_ref()))
    }

    pub fn is_exporting(&self) -> bool {
        self.exports.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspection::bank::QuestionBank;
    use crate::inspection::export::ProvidedSnapshot;

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date")
    }

    fn service() -> InspectionService {
        InspectionService::with_clock(Arc::new(InspectionCatalog::standard()), fixed_today)
    }

    #[test]
    fn starts_at_default_location_with_today() {
        let view = service().view();
        assert_eq!(view.state.location(), InspectionCatalog::standard().default_location());
        assert_eq!(view.state.inspection_date(), fixed_today());
        assert_eq!(view.totals.total_possible_score, 100);
        assert!(!view.is_form_complete);
    }

    #[test]
    fn rejected_action_leaves_state_unchanged() {
        let service = service();
        let before = service.view().state;

        let err = service
            .apply(AuditAction::TogglePump { index: 99 })
            .expect_err("out of range");

        assert!(matches!(err, InspectionError::PumpIndexOutOfRange { .. }));
        assert_eq!(service.view().state, before);
    }

    #[test]
    fn numeric_inputs_follow_trigger_answers() {
        let bank = QuestionBank::from_reader(
            r#"[{"id": "canopy", "title": "Canopy", "questions": [
                {"id": "Q1", "text": "How many canopy lights are out?", "type": "numericInput",
                 "options": [{"text": "None", "points": 2}, {"text": "Some", "points": 0}],
                 "maxPoints": 2, "conditionalNumericInputTriggers": ["Some"]}
            ]}]"#
                .as_bytes(),
        )
        .expect("bank parses");
        let catalog = InspectionCatalog::new(bank, vec!["Depot".to_string()], "#009639")
            .expect("catalog builds");
        let service = InspectionService::with_clock(Arc::new(catalog), fixed_today);

        let select = |answer: &str| {
            service
                .apply(AuditAction::SelectAnswer {
                    question_id: "Q1".to_string(),
                    answer: answer.to_string(),
                })
                .expect("answer applies")
        };

        assert_eq!(select("Some").visible_numeric_inputs, vec!["Q1".to_string()]);
        assert!(select("None").visible_numeric_inputs.is_empty());
    }

    #[test]
    fn replace_rejects_audits_for_unknown_questions() {
        let service = service();
        let foreign: AuditState = serde_json::from_value(serde_json::json!({
            "location": service.catalog().default_location(),
            "inspectionDate": "2025-03-14",
            "answers": { "Q999": "Yes" },
            "pumpCount": 10,
            "pumpStatuses": vec!["compliant"; 10],
        }))
        .expect("deserializes");

        assert!(matches!(
            service.replace(foreign),
            Err(InspectionError::UnknownQuestion(_))
        ));
    }

    #[test]
    fn export_renders_current_audit() {
        let service = service();
        service
            .apply(AuditAction::SelectAnswer {
                question_id: "Q1".to_string(),
                answer: "Yes".to_string(),
            })
            .expect("answer applies");

        let report = service.export().expect("export succeeds");
        assert_eq!(report.entries.len(), 1);
        assert!(!service.is_exporting());
    }

    #[test]
    fn provided_snapshot_replaces_rendered_grid() {
        let service = service().with_snapshot_renderer(ProvidedSnapshot(b"not a png".to_vec()));

        let report = service.export().expect("export continues");
        assert_eq!(report.failed_images, 1);
    }
}
