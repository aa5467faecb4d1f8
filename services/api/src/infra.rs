use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use site_inspection::config::AppConfig;
use site_inspection::error::AppError;
use site_inspection::inspection::{AuditState, InspectionCatalog};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Catalog for one-shot CLI commands, built from the same settings as the server.
pub(crate) fn load_catalog() -> Result<InspectionCatalog, AppError> {
    let config = AppConfig::load()?;
    Ok(config.inspection.catalog()?)
}

/// Reads an audit file and checks it against the catalog.
pub(crate) fn read_audit(path: &Path, catalog: &InspectionCatalog) -> Result<AuditState, AppError> {
    let raw = fs::read_to_string(path)?;
    let audit: AuditState = serde_json::from_str(&raw)?;
    audit.validate(catalog)?;
    debug!(path = %path.display(), location = audit.location(), "audit file loaded");
    Ok(audit)
}

pub(crate) fn write_report(output_dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, AppError> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(file_name);
    fs::write(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_dates() {
        assert_eq!(
            parse_date(" 2025-03-14 "),
            Ok(NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date"))
        );
        assert!(parse_date("14/03/2025").is_err());
    }

    #[test]
    fn read_audit_rejects_unknown_location() {
        let catalog = InspectionCatalog::standard();
        let path = std::env::temp_dir().join(format!(
            "site-inspection-audit-{}.json",
            std::process::id()
        ));
        fs::write(
            &path,
            r#"{"location": "Atlantis", "inspectionDate": "2025-03-14",
                "pumpCount": 1, "pumpStatuses": ["compliant"]}"#,
        )
        .expect("fixture written");

        let result = read_audit(&path, &catalog);
        fs::remove_file(&path).ok();

        assert!(matches!(result, Err(AppError::Inspection(_))));
    }
}
