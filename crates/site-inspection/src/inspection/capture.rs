//! Camera capture as a scoped device acquisition.
//!
//! A [`CaptureSession`] owns the device stream for as long as the capture
//! dialog is open. Dropping the session releases the stream on every path:
//! a captured photo, the user closing the dialog, or an error.

use super::bank::QuestionBank;
use super::state::{AuditState, InspectionError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraFacing {
    #[default]
    Environment,
    User,
}

impl CameraFacing {
    pub const fn switched(self) -> Self {
        match self {
            Self::Environment => Self::User,
            Self::User => Self::Environment,
        }
    }
}

/// Source of video streams, e.g. a platform camera binding.
pub trait CaptureDevice {
    type Stream: CaptureStream;

    fn acquire(&mut self, facing: CameraFacing) -> Result<Self::Stream, CaptureError>;
}

pub trait CaptureStream {
    /// Grab the current frame as an encoded image payload.
    fn grab_frame(&mut self) -> Result<String, CaptureError>;

    /// Stop every track on the stream.
    fn release(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("Camera permission was denied. Please enable it in your browser settings.")]
    PermissionDenied,
    #[error("No camera found on this device.")]
    NotFound,
    #[error("Could not access the camera.")]
    Unavailable(String),
    #[error("capture session has no active stream")]
    NoStream,
    #[error(transparent)]
    Inspection(#[from] InspectionError),
}

pub struct CaptureSession<'d, D: CaptureDevice> {
    device: &'d mut D,
    facing: CameraFacing,
    stream: Option<D::Stream>,
    last_error: Option<CaptureError>,
}

impl<'d, D: CaptureDevice> CaptureSession<'d, D> {
    /// Opens the session. A device failure does not abort: the session stays
    /// open without a stream and exposes the message for inline display.
    pub fn open(device: &'d mut D, facing: CameraFacing) -> Self {
        let mut session = Self {
            device,
            facing,
            stream: None,
            last_error: None,
        };
        session.start();
        session
    }

    fn start(&mut self) {
        self.stop();
        match self.device.acquire(self.facing) {
            Ok(stream) => {
                debug!(facing = ?self.facing, "camera stream acquired");
                self.stream = Some(stream);
                self.last_error = None;
            }
            Err(err) => {
                warn!(error = %err, "camera unavailable");
                self.last_error = Some(err);
            }
        }
    }

    fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
            debug!("camera stream released");
        }
    }

    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    /// User-facing message for the last device failure, if any.
    pub fn error_message(&self) -> Option<String> {
        self.last_error.as_ref().map(ToString::to_string)
    }

    /// Releases the current stream before acquiring one facing the other way.
    pub fn switch_camera(&mut self) {
        self.facing = self.facing.switched();
        self.start();
    }

    /// Attaches the current frame to `question_id` and closes the session.
    pub fn capture_into(
        mut self,
        state: &mut AuditState,
        bank: &QuestionBank,
        question_id: &str,
    ) -> Result<usize, CaptureError> {
        let stream = self.stream.as_mut().ok_or(CaptureError::NoStream)?;
        let payload = stream.grab_frame()?;
        let count = state.add_photo(bank, question_id, payload)?;
        Ok(count)
    }
}

impl<D: CaptureDevice> Drop for CaptureSession<'_, D> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspection::bank::InspectionCatalog;
    use chrono::NaiveDate;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeCamera {
        live: Rc<Cell<usize>>,
        acquired: Vec<CameraFacing>,
        fail_with: Option<CaptureError>,
    }

    struct FakeStream {
        live: Rc<Cell<usize>>,
        released: bool,
    }

    impl CaptureDevice for FakeCamera {
        type Stream = FakeStream;

        fn acquire(&mut self, facing: CameraFacing) -> Result<FakeStream, CaptureError> {
            if let Some(err) = self.fail_with.clone() {
                return Err(err);
            }
            self.acquired.push(facing);
            self.live.set(self.live.get() + 1);
            Ok(FakeStream {
                live: self.live.clone(),
                released: false,
            })
        }
    }

    impl CaptureStream for FakeStream {
        fn grab_frame(&mut self) -> Result<String, CaptureError> {
            Ok("data:image/jpeg;base64,/9j/".to_string())
        }

        fn release(&mut self) {
            assert!(!self.released, "stream released twice");
            self.released = true;
            self.live.set(self.live.get() - 1);
        }
    }

    fn audit() -> (InspectionCatalog, AuditState) {
        let catalog = InspectionCatalog::standard();
        let today = NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date");
        let state = AuditState::for_catalog(&catalog, today);
        (catalog, state)
    }

    #[test]
    fn closing_without_capture_releases_stream() {
        let mut camera = FakeCamera::default();
        let live = camera.live.clone();
        {
            let session = CaptureSession::open(&mut camera, CameraFacing::default());
            assert!(session.is_streaming());
            assert_eq!(live.get(), 1);
        }
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn capture_attaches_photo_and_releases_stream() {
        let (catalog, mut state) = audit();
        let mut camera = FakeCamera::default();
        let live = camera.live.clone();

        let session = CaptureSession::open(&mut camera, CameraFacing::Environment);
        let count = session
            .capture_into(&mut state, catalog.bank(), "Q7")
            .expect("capture succeeds");

        assert_eq!(count, 1);
        assert_eq!(state.photos()["Q7"].len(), 1);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn failed_capture_still_releases_stream() {
        let (catalog, mut state) = audit();
        let mut camera = FakeCamera::default();
        let live = camera.live.clone();

        let session = CaptureSession::open(&mut camera, CameraFacing::Environment);
        let err = session
            .capture_into(&mut state, catalog.bank(), "Q404")
            .expect_err("unknown question");

        assert!(matches!(err, CaptureError::Inspection(_)));
        assert_eq!(live.get(), 0);
        assert!(state.photos().is_empty());
    }

    #[test]
    fn switching_camera_releases_before_reacquiring() {
        let mut camera = FakeCamera::default();
        let live = camera.live.clone();
        {
            let mut session = CaptureSession::open(&mut camera, CameraFacing::Environment);
            session.switch_camera();
            assert_eq!(session.facing(), CameraFacing::User);
            assert_eq!(live.get(), 1);
        }
        assert_eq!(live.get(), 0);
        assert_eq!(
            camera.acquired,
            vec![CameraFacing::Environment, CameraFacing::User]
        );
    }

    #[test]
    fn device_failure_is_reported_inline() {
        let mut camera = FakeCamera {
            fail_with: Some(CaptureError::PermissionDenied),
            ..FakeCamera::default()
        };
        let (catalog, mut state) = audit();

        let session = CaptureSession::open(&mut camera, CameraFacing::Environment);
        assert!(!session.is_streaming());
        assert_eq!(
            session.error_message().as_deref(),
            Some("Camera permission was denied. Please enable it in your browser settings.")
        );

        let err = session
            .capture_into(&mut state, catalog.bank(), "Q1")
            .expect_err("no stream to capture from");
        assert_eq!(err, CaptureError::NoStream);
    }
}
