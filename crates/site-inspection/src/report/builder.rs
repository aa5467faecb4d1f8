//! Single-pass report layout. The cursor only moves down; a block that would
//! cross the bottom margin is moved to a fresh page before it is drawn.

use super::canvas::{CanvasError, FontStyle, PdfCanvas, Rgb, TextAlign, TextStyle};
use super::images::RasterImage;
use super::layout::{wrap_text, PageCursor, PageGeometry};
use crate::inspection::domain::{Question, Section};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const REPORT_TITLE: &str = "Site Inspection Report";
pub const PUMP_BLOCK_TITLE: &str = "Pump Compliance Status";
pub const SNAPSHOT_PLACEHOLDER: &str = "Failed to render pump compliance graphic.";
pub const PHOTO_PLACEHOLDER: &str = "Image failed to load";

const PHOTOS_PER_ROW: usize = 3;
const PHOTO_GAP: f32 = 10.0;

const QUESTION_STYLE: TextStyle = TextStyle::new(11.0, FontStyle::Bold, Rgb::gray(30));
const ANSWER_STYLE: TextStyle = TextStyle::new(10.0, FontStyle::Regular, Rgb::gray(80));
const COMMENT_STYLE: TextStyle = TextStyle::new(10.0, FontStyle::Italic, Rgb::gray(100));
const PHOTO_PLACEHOLDER_STYLE: TextStyle = TextStyle::new(10.0, FontStyle::Regular, Rgb::RED);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportHeader {
    pub location: String,
    pub inspector_name: String,
    pub inspection_date: NaiveDate,
    pub live_score: u32,
    pub total_possible_score: u32,
}

/// Everything the report is built from, borrowed from the audit.
#[derive(Debug, Clone)]
pub struct ReportRequest<'a> {
    pub header: ReportHeader,
    /// PNG bytes of the pump compliance grid.
    pub snapshot: Option<&'a [u8]>,
    pub sections: &'a [Section],
    pub answers: &'a BTreeMap<String, String>,
    pub comments: &'a BTreeMap<String, String>,
    pub photos: &'a BTreeMap<String, Vec<String>>,
    pub accent: Rgb,
}

/// Where a rendered question landed (1-based page).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub section_id: String,
    pub question_id: String,
    pub page: usize,
}

#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub entries: Vec<ReportEntry>,
    pub failed_images: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

/// `site-inspection-<location>.pdf` with every non-alphanumeric ASCII
/// character replaced by `_`.
pub fn report_file_name(location: &str) -> String {
    let safe: String = location
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect();
    format!("site-inspection-{safe}.pdf")
}

pub fn build_report(request: &ReportRequest<'_>) -> Result<RenderedReport, ReportError> {
    let mut builder = InspectionReportBuilder::new(PageGeometry::a4(), request.accent);
    builder.add_header(&request.header);

    if let Some(snapshot) = request.snapshot {
        builder.add_pump_compliance(snapshot);
    }

    for section in request.sections.iter().filter(|section| !section.is_visual_block()) {
        builder.add_section(section, request.answers, request.comments, request.photos);
    }

    builder.finish(&request.header.location)
}

pub struct InspectionReportBuilder {
    canvas: PdfCanvas,
    cursor: PageCursor,
    accent: Rgb,
    entries: Vec<ReportEntry>,
    failed_images: usize,
}

impl InspectionReportBuilder {
    pub fn new(geometry: PageGeometry, accent: Rgb) -> Self {
        Self {
            canvas: PdfCanvas::new(geometry),
            cursor: PageCursor::new(geometry),
            accent,
            entries: Vec::new(),
            failed_images: 0,
        }
    }

    fn geometry(&self) -> PageGeometry {
        self.canvas.geometry()
    }

    fn ensure_space(&mut self, height: f32) {
        if self.cursor.break_if_needed(height) {
            self.canvas.add_page();
            debug!(page = self.cursor.page() + 1, "report page break");
        }
    }

    pub fn add_header(&mut self, header: &ReportHeader) {
        let geometry = self.geometry();
        self.cursor.reset_to_top();

        self.canvas.text(
            REPORT_TITLE,
            geometry.center_x(),
            self.cursor.y(),
            TextStyle::new(20.0, FontStyle::Bold, self.accent),
            TextAlign::Center,
        );
        self.cursor.advance(25.0);

        self.canvas.text(
            &header.location,
            geometry.center_x(),
            self.cursor.y(),
            TextStyle::new(16.0, FontStyle::Regular, Rgb::gray(50)),
            TextAlign::Center,
        );
        self.cursor.advance(20.0);

        let meta = TextStyle::new(12.0, FontStyle::Regular, Rgb::gray(50));
        let inspector = match header.inspector_name.trim() {
            "" => "N/A",
            name => name,
        };
        self.canvas.text(
            &format!("Inspector: {inspector}"),
            geometry.margin,
            self.cursor.y(),
            meta,
            TextAlign::Left,
        );
        self.canvas.text(
            &format!("Date: {}", header.inspection_date.format("%Y-%m-%d")),
            geometry.width - geometry.margin,
            self.cursor.y(),
            meta,
            TextAlign::Right,
        );
        self.cursor.advance(20.0);

        self.canvas.text(
            &format!(
                "Final Score: {} / {}",
                header.live_score, header.total_possible_score
            ),
            geometry.center_x(),
            self.cursor.y(),
            TextStyle::new(14.0, FontStyle::Bold, Rgb::gray(50)),
            TextAlign::Center,
        );
        self.cursor.advance(30.0);
    }

    fn block_title(&mut self, title: &str) {
        let geometry = self.geometry();
        self.canvas.text(
            title,
            geometry.margin,
            self.cursor.y(),
            TextStyle::new(16.0, FontStyle::Bold, self.accent),
            TextAlign::Left,
        );
        self.cursor.advance(5.0);
        self.canvas.horizontal_rule(
            geometry.margin,
            geometry.margin + geometry.content_width(),
            self.cursor.y(),
            self.accent,
            1.0,
        );
        self.cursor.advance(20.0);
    }

    /// Title, divider, then the snapshot at full content width. A snapshot
    /// that cannot be decoded or embedded becomes a red placeholder line.
    pub fn add_pump_compliance(&mut self, png: &[u8]) {
        self.ensure_space(40.0);
        self.block_title(PUMP_BLOCK_TITLE);

        let geometry = self.geometry();
        let placed = RasterImage::decode(png)
            .map_err(|err| err.to_string())
            .and_then(|image| {
                let width = geometry.content_width();
                let height = image.scaled_height(width);
                self.ensure_space(height + 20.0);
                let handle = self.canvas.embed_image(&image).map_err(|err| err.to_string())?;
                self.canvas
                    .draw_image(&handle, geometry.margin, self.cursor.y(), width, height);
                Ok(height)
            });

        match placed {
            Ok(height) => self.cursor.advance(height + 20.0),
            Err(reason) => {
                warn!(error = %reason, "failed to add pump compliance image to report");
                self.failed_images += 1;
                self.ensure_space(20.0);
                self.canvas.text(
                    SNAPSHOT_PLACEHOLDER,
                    geometry.margin,
                    self.cursor.y(),
                    TextStyle::new(16.0, FontStyle::Bold, Rgb::RED),
                    TextAlign::Left,
                );
                self.cursor.advance(20.0);
            }
        }
    }

    /// Renders the section heading and every answered question in bank order.
    pub fn add_section(
        &mut self,
        section: &Section,
        answers: &BTreeMap<String, String>,
        comments: &BTreeMap<String, String>,
        photos: &BTreeMap<String, Vec<String>>,
    ) {
        self.ensure_space(40.0);
        self.cursor.advance(10.0);
        self.block_title(&section.title);

        for question in &section.questions {
            let Some(answer) = answers.get(&question.id).filter(|answer| !answer.is_empty())
            else {
                continue;
            };
            let comment = comments
                .get(&question.id)
                .map(String::as_str)
                .filter(|comment| !comment.trim().is_empty());
            let attached = photos.get(&question.id).map(Vec::as_slice).unwrap_or_default();

            self.add_question(section, question, answer, comment, attached);
        }
    }

    fn add_question(
        &mut self,
        section: &Section,
        question: &Question,
        answer: &str,
        comment: Option<&str>,
        photos: &[String],
    ) {
        let geometry = self.geometry();
        let content_width = geometry.content_width();

        let mut block_height = 30.0;
        if comment.is_some() {
            block_height += 30.0;
        }
        block_height += 80.0 * photos.len().div_ceil(PHOTOS_PER_ROW) as f32;
        self.ensure_space(block_height);

        self.entries.push(ReportEntry {
            section_id: section.id.clone(),
            question_id: question.id.clone(),
            page: self.cursor.page() + 1,
        });

        let question_lines = wrap_text(
            &format!("{}: {}", question.id, question.text),
            QUESTION_STYLE.size,
            content_width,
        );
        self.canvas
            .text_lines(&question_lines, geometry.margin, self.cursor.y(), QUESTION_STYLE);
        self.cursor
            .advance(question_lines.len() as f32 * QUESTION_STYLE.leading() + 5.0);

        let points = question
            .option(answer)
            .map(|option| option.points.to_string())
            .unwrap_or_else(|| "-".to_string());
        let answer_lines = wrap_text(
            &format!("Answer: {answer} ({points} pts)"),
            ANSWER_STYLE.size,
            content_width,
        );
        self.canvas.text_lines(
            &answer_lines,
            geometry.margin + 10.0,
            self.cursor.y(),
            ANSWER_STYLE,
        );
        self.cursor
            .advance(answer_lines.len() as f32 * ANSWER_STYLE.leading() + 10.0);

        if let Some(comment) = comment {
            self.ensure_space(30.0 + comment.chars().count() as f32 / 80.0 * 10.0);
            let comment_lines = wrap_text(
                &format!("Comment: {comment}"),
                COMMENT_STYLE.size,
                content_width - 10.0,
            );
            self.canvas.text_lines(
                &comment_lines,
                geometry.margin + 10.0,
                self.cursor.y(),
                COMMENT_STYLE,
            );
            self.cursor
                .advance(comment_lines.len() as f32 * COMMENT_STYLE.leading() + 10.0);
        }

        if !photos.is_empty() {
            self.add_photo_grid(&question.id, photos);
        }

        self.cursor.advance(15.0);
    }

    fn add_photo_grid(&mut self, question_id: &str, photos: &[String]) {
        let geometry = self.geometry();
        let cell = (geometry.content_width() - 2.0 * PHOTO_GAP) / PHOTOS_PER_ROW as f32;
        self.cursor.advance(5.0);

        for row in photos.chunks(PHOTOS_PER_ROW) {
            self.ensure_space(cell + PHOTO_GAP);
            for (column, payload) in row.iter().enumerate() {
                let x = geometry.margin + column as f32 * (cell + PHOTO_GAP);
                let y = self.cursor.y();
                let placed = RasterImage::from_payload(payload)
                    .map_err(|err| err.to_string())
                    .and_then(|image| {
                        self.canvas.embed_image(&image).map_err(|err| err.to_string())
                    });

                match placed {
                    Ok(handle) => self.canvas.draw_image(&handle, x, y, cell, cell),
                    Err(reason) => {
                        warn!(question_id, error = %reason, "failed to add photo to report");
                        self.failed_images += 1;
                        self.canvas.text(
                            PHOTO_PLACEHOLDER,
                            x + 5.0,
                            y + cell / 2.0,
                            PHOTO_PLACEHOLDER_STYLE,
                            TextAlign::Left,
                        );
                    }
                }
            }
            self.cursor.advance(cell + PHOTO_GAP);
        }
    }

    pub fn finish(self, location: &str) -> Result<RenderedReport, ReportError> {
        let page_count = self.canvas.page_count();
        let bytes = self.canvas.finish()?;
        Ok(RenderedReport {
            file_name: report_file_name(location),
            bytes,
            page_count,
            entries: self.entries,
            failed_images: self.failed_images,
        })
    }
}
