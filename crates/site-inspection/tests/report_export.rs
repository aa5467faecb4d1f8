use chrono::NaiveDate;
use lopdf::Document;
use site_inspection::inspection::{
    AuditState, ExportCoordinator, InspectionCatalog, ProvidedSnapshot, PumpGridRenderer,
    PumpStatus,
};
use site_inspection::report::{render_pump_grid, to_data_url};

fn inspection_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid inspection date")
}

fn audit() -> (InspectionCatalog, AuditState) {
    let catalog = InspectionCatalog::standard();
    let state = AuditState::for_catalog(&catalog, inspection_day());
    (catalog, state)
}

fn photo() -> String {
    let png = render_pump_grid(&[PumpStatus::Compliant]).expect("grid renders");
    to_data_url("image/png", &png)
}

fn page_contents(bytes: &[u8]) -> Vec<String> {
    let document = Document::load_mem(bytes).expect("report is a valid pdf");
    document
        .get_pages()
        .values()
        .map(|page_id| {
            let content = document.get_page_content(*page_id).expect("page content");
            String::from_utf8_lossy(&content).into_owned()
        })
        .collect()
}

#[test]
fn export_keeps_bank_order_and_omits_unanswered_questions() {
    let (catalog, mut state) = audit();
    let bank = catalog.bank();
    for (question, answer) in [("Q30", "Yes"), ("Q2", "No"), ("Q15", "Yes")] {
        state
            .select_answer(bank, question, answer)
            .expect("answer applies");
    }

    let report = ExportCoordinator::new()
        .export(&catalog, &state, Some(&PumpGridRenderer))
        .expect("export succeeds");

    let order: Vec<&str> = report
        .entries
        .iter()
        .map(|entry| entry.question_id.as_str())
        .collect();
    assert_eq!(order, vec!["Q2", "Q15", "Q30"]);

    let text = page_contents(&report.bytes).concat();
    assert!(text.contains("(Q2: "));
    assert!(!text.contains("(Q1: "));
    assert!(text.contains("(Pump Compliance Status)"));
}

#[test]
fn complete_audit_spans_pages_that_match_the_document() {
    let (catalog, mut state) = audit();
    let bank = catalog.bank();
    let picks: Vec<(String, String)> = bank
        .questions()
        .map(|question| (question.id.clone(), question.options[0].text.clone()))
        .collect();
    for (question, answer) in picks {
        state
            .select_answer(bank, &question, answer)
            .expect("answer applies");
        state
            .set_comment(bank, &question, "Inspected and recorded on site.")
            .expect("comment applies");
    }
    for _ in 0..4 {
        state.add_photo(bank, "Q5", photo()).expect("photo attaches");
    }

    let report = ExportCoordinator::new()
        .export(&catalog, &state, Some(&PumpGridRenderer))
        .expect("export succeeds");

    assert_eq!(report.entries.len(), 37);
    assert!(report.page_count > 1);
    assert_eq!(page_contents(&report.bytes).len(), report.page_count);
    assert_eq!(report.entries.first().map(|entry| entry.page), Some(1));
    assert!(report
        .entries
        .windows(2)
        .all(|pair| pair[0].page <= pair[1].page));
    assert_eq!(report.failed_images, 0);
}

#[test]
fn unreadable_images_become_placeholders() {
    let (catalog, mut state) = audit();
    let bank = catalog.bank();
    state.select_answer(bank, "Q1", "Yes").expect("answer applies");
    state
        .add_photo(bank, "Q1", "data:image/png;base64,bm90IGEgcG5n")
        .expect("photo attaches");
    state.add_photo(bank, "Q1", photo()).expect("photo attaches");

    let report = ExportCoordinator::new()
        .export(
            &catalog,
            &state,
            Some(&ProvidedSnapshot(b"not a png".to_vec())),
        )
        .expect("export continues past broken images");

    assert_eq!(report.failed_images, 2);
    let text = page_contents(&report.bytes).concat();
    assert!(text.contains("(Image failed to load)"));
    assert!(text.contains("(Failed to render pump compliance graphic.)"));
}

#[test]
fn skipped_snapshot_leaves_out_pump_block() {
    let (catalog, state) = audit();
    let report = ExportCoordinator::new()
        .export(&catalog, &state, None)
        .expect("export succeeds");

    assert_eq!(report.page_count, 1);
    assert!(!page_contents(&report.bytes)
        .concat()
        .contains("Pump Compliance Status"));
}

#[test]
fn file_name_follows_location() {
    let catalog = InspectionCatalog::new(
        site_inspection::inspection::QuestionBank::standard(),
        vec!["Route 9 / Exit 12".to_string()],
        "#009639",
    )
    .expect("catalog builds");
    let state = AuditState::for_catalog(&catalog, inspection_day());

    let report = ExportCoordinator::new()
        .export(&catalog, &state, None)
        .expect("export succeeds");

    assert_eq!(report.file_name, "site-inspection-Route_9___Exit_12.pdf");
}
