//! Question bank, audit state, scoring and the actions that drive them.

pub mod bank;
pub mod capture;
pub mod domain;
pub mod export;
pub mod notice;
pub mod router;
pub mod score;
pub mod service;
pub mod state;

pub use bank::{BankError, InspectionCatalog, QuestionBank, PUMP_COMPLIANCE_SECTION_ID};
pub use capture::{CameraFacing, CaptureDevice, CaptureError, CaptureSession, CaptureStream};
pub use domain::{AnswerOption, Points, PumpStatus, Question, QuestionKind, Section};
pub use export::{
    save_audit, ExportCoordinator, ExportError, ProvidedSnapshot, PumpGridRenderer, SaveError,
    SaveReceipt, SnapshotRenderer,
};
pub use notice::{Notice, NoticeKind};
pub use router::inspection_router;
pub use score::{compute_totals, ScoreTotals};
pub use service::{AuditView, InspectionService};
pub use state::{AuditAction, AuditState, InspectionError};
