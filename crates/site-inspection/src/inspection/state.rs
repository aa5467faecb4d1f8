use super::bank::{InspectionCatalog, QuestionBank};
use super::domain::PumpStatus;
use super::score::{compute_totals, ScoreTotals};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

pub const DEFAULT_PUMP_COUNT: usize = 10;
pub const MIN_PUMP_COUNT: usize = 1;
pub const MAX_PUMP_COUNT: usize = 20;

/// The in-progress audit for the currently selected location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditState {
    location: String,
    #[serde(default)]
    inspector_name: String,
    inspection_date: NaiveDate,
    #[serde(default)]
    answers: BTreeMap<String, String>,
    #[serde(default)]
    numeric_input_values: BTreeMap<String, String>,
    #[serde(default)]
    comments: BTreeMap<String, String>,
    #[serde(default)]
    photos: BTreeMap<String, Vec<String>>,
    pump_count: usize,
    pump_statuses: Vec<PumpStatus>,
}

/// One discrete user action against the audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AuditAction {
    ChangeLocation { location: String },
    SetInspectorName { name: String },
    SetInspectionDate { date: NaiveDate },
    SelectAnswer { question_id: String, answer: String },
    SetNumericInput { question_id: String, value: String },
    SetComment { question_id: String, comment: String },
    AddPhoto { question_id: String, payload: String },
    RemovePhoto { question_id: String, index: usize },
    SetPumpCount { count: usize },
    TogglePump { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InspectionError {
    #[error("question '{0}' is not part of the question bank")]
    UnknownQuestion(String),
    #[error("location '{0}' is not a configured inspection location")]
    UnknownLocation(String),
    #[error("question '{question_id}' has no photo at index {index}")]
    PhotoIndexOutOfRange { question_id: String, index: usize },
    #[error("pump index {index} is out of range for {count} pumps")]
    PumpIndexOutOfRange { index: usize, count: usize },
    #[error("pump count {0} must be between 1 and 20")]
    PumpCountOutOfRange(usize),
    #[error("pump count {count} does not match {statuses} recorded statuses")]
    PumpCountMismatch { count: usize, statuses: usize },
}

impl AuditState {
    pub fn new(location: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            location: location.into(),
            inspector_name: String::new(),
            inspection_date: today,
            answers: BTreeMap::new(),
            numeric_input_values: BTreeMap::new(),
            comments: BTreeMap::new(),
            photos: BTreeMap::new(),
            pump_count: DEFAULT_PUMP_COUNT,
            pump_statuses: vec![PumpStatus::Compliant; DEFAULT_PUMP_COUNT],
        }
    }

    pub fn for_catalog(catalog: &InspectionCatalog, today: NaiveDate) -> Self {
        Self::new(catalog.default_location(), today)
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn inspector_name(&self) -> &str {
        &self.inspector_name
    }

    pub fn inspection_date(&self) -> NaiveDate {
        self.inspection_date
    }

    pub fn answers(&self) -> &BTreeMap<String, String> {
        &self.answers
    }

    pub fn answer(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }

    pub fn numeric_input_values(&self) -> &BTreeMap<String, String> {
        &self.numeric_input_values
    }

    pub fn comments(&self) -> &BTreeMap<String, String> {
        &self.comments
    }

    pub fn photos(&self) -> &BTreeMap<String, Vec<String>> {
        &self.photos
    }

    pub fn pump_count(&self) -> usize {
        self.pump_count
    }

    pub fn pump_statuses(&self) -> &[PumpStatus] {
        &self.pump_statuses
    }

    pub fn totals(&self, bank: &QuestionBank) -> ScoreTotals {
        compute_totals(bank, &self.answers)
    }

    /// Switching to a different location starts a fresh audit; re-selecting
    /// the current one keeps everything. Returns whether a reset happened.
    pub fn change_location(
        &mut self,
        catalog: &InspectionCatalog,
        location: &str,
        today: NaiveDate,
    ) -> Result<bool, InspectionError> {
        if !catalog.is_known_location(location) {
            return Err(InspectionError::UnknownLocation(location.to_string()));
        }
        if location == self.location {
            return Ok(false);
        }

        info!(from = %self.location, to = %location, "location changed, audit reset");
        *self = Self::new(location, today);
        Ok(true)
    }

    pub fn set_inspector_name(&mut self, name: impl Into<String>) {
        self.inspector_name = name.into();
    }

    pub fn set_inspection_date(&mut self, date: NaiveDate) {
        self.inspection_date = date;
    }

    /// An empty answer clears the selection.
    pub fn select_answer(
        &mut self,
        bank: &QuestionBank,
        question_id: &str,
        answer: impl Into<String>,
    ) -> Result<(), InspectionError> {
        let question = bank
            .question(question_id)
            .ok_or_else(|| InspectionError::UnknownQuestion(question_id.to_string()))?;
        let answer = answer.into();

        if answer.is_empty() {
            self.answers.remove(question_id);
            return Ok(());
        }
        if question.option(&answer).is_none() {
            warn!(question_id, answer = %answer, "answer matches no option and will not score");
        }

        debug!(question_id, answer = %answer, "answer selected");
        self.answers.insert(question_id.to_string(), answer);
        Ok(())
    }

    pub fn set_numeric_input(
        &mut self,
        bank: &QuestionBank,
        question_id: &str,
        value: impl Into<String>,
    ) -> Result<(), InspectionError> {
        ensure_question(bank, question_id)?;
        self.numeric_input_values
            .insert(question_id.to_string(), value.into());
        Ok(())
    }

    /// Whether the numeric sub-answer field applies to the current answer.
    pub fn numeric_input_visible(&self, bank: &QuestionBank, question_id: &str) -> bool {
        bank.question(question_id)
            .is_some_and(|question| question.shows_numeric_input(self.answer(question_id)))
    }

    /// A blank comment removes the entry.
    pub fn set_comment(
        &mut self,
        bank: &QuestionBank,
        question_id: &str,
        comment: impl Into<String>,
    ) -> Result<(), InspectionError> {
        ensure_question(bank, question_id)?;
        let comment = comment.into();
        if comment.trim().is_empty() {
            self.comments.remove(question_id);
        } else {
            self.comments.insert(question_id.to_string(), comment);
        }
        Ok(())
    }

    pub fn add_photo(
        &mut self,
        bank: &QuestionBank,
        question_id: &str,
        payload: impl Into<String>,
    ) -> Result<usize, InspectionError> {
        ensure_question(bank, question_id)?;
        let photos = self.photos.entry(question_id.to_string()).or_default();
        photos.push(payload.into());
        debug!(question_id, count = photos.len(), "photo attached");
        Ok(photos.len())
    }

    pub fn remove_photo(&mut self, question_id: &str, index: usize) -> Result<(), InspectionError> {
        let out_of_range = || InspectionError::PhotoIndexOutOfRange {
            question_id: question_id.to_string(),
            index,
        };
        let photos = self.photos.get_mut(question_id).ok_or_else(out_of_range)?;
        if index >= photos.len() {
            return Err(out_of_range());
        }

        photos.remove(index);
        if photos.is_empty() {
            self.photos.remove(question_id);
        }
        Ok(())
    }

    /// Clamps to 1..=20, keeps existing statuses by position and pads new
    /// slots as compliant. Returns the count actually applied.
    pub fn set_pump_count(&mut self, requested: usize) -> usize {
        let count = requested.clamp(MIN_PUMP_COUNT, MAX_PUMP_COUNT);
        self.pump_statuses.resize(count, PumpStatus::Compliant);
        self.pump_count = count;
        count
    }

    pub fn toggle_pump(&mut self, index: usize) -> Result<PumpStatus, InspectionError> {
        let count = self.pump_count;
        let status = self
            .pump_statuses
            .get_mut(index)
            .ok_or(InspectionError::PumpIndexOutOfRange { index, count })?;
        *status = status.toggled();
        Ok(*status)
    }

    pub fn apply(
        &mut self,
        catalog: &InspectionCatalog,
        action: AuditAction,
        today: NaiveDate,
    ) -> Result<(), InspectionError> {
        let bank = catalog.bank();
        match action {
            AuditAction::ChangeLocation { location } => {
                self.change_location(catalog, &location, today)?;
            }
            AuditAction::SetInspectorName { name } => self.set_inspector_name(name),
            AuditAction::SetInspectionDate { date } => self.set_inspection_date(date),
            AuditAction::SelectAnswer {
                question_id,
                answer,
            } => self.select_answer(bank, &question_id, answer)?,
            AuditAction::SetNumericInput { question_id, value } => {
                self.set_numeric_input(bank, &question_id, value)?
            }
            AuditAction::SetComment {
                question_id,
                comment,
            } => self.set_comment(bank, &question_id, comment)?,
            AuditAction::AddPhoto {
                question_id,
                payload,
            } => {
                self.add_photo(bank, &question_id, payload)?;
            }
            AuditAction::RemovePhoto { question_id, index } => {
                self.remove_photo(&question_id, index)?
            }
            AuditAction::SetPumpCount { count } => {
                self.set_pump_count(count);
            }
            AuditAction::TogglePump { index } => {
                self.toggle_pump(index)?;
            }
        }
        Ok(())
    }

    /// Checks a state that did not come through the setters, e.g. one read
    /// from an audit file.
    pub fn validate(&self, catalog: &InspectionCatalog) -> Result<(), InspectionError> {
        if !catalog.is_known_location(&self.location) {
            return Err(InspectionError::UnknownLocation(self.location.clone()));
        }

        let bank = catalog.bank();
        let keys = self
            .answers
            .keys()
            .chain(self.numeric_input_values.keys())
            .chain(self.comments.keys())
            .chain(self.photos.keys());
        for key in keys {
            ensure_question(bank, key)?;
        }

        if !(MIN_PUMP_COUNT..=MAX_PUMP_COUNT).contains(&self.pump_count) {
            return Err(InspectionError::PumpCountOutOfRange(self.pump_count));
        }
        if self.pump_statuses.len() != self.pump_count {
            return Err(InspectionError::PumpCountMismatch {
                count: self.pump_count,
                statuses: self.pump_statuses.len(),
            });
        }

        Ok(())
    }
}

fn ensure_question(bank: &QuestionBank, question_id: &str) -> Result<(), InspectionError> {
    if bank.contains_question(question_id) {
        Ok(())
    } else {
        Err(InspectionError::UnknownQuestion(question_id.to_string()))
    }
}
