use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// What an uploaded file is. Stored as TEXT in `uploaded_documents.kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Cv,
    ProjectReport,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Cv => "cv",
            DocumentKind::ProjectReport => "project_report",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UploadedDocumentRow {
    pub id: Uuid,
    pub kind: String,
    pub original_filename: String,
    pub s3_key: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_kind_strings() {
        assert_eq!(DocumentKind::Cv.as_str(), "cv");
        assert_eq!(DocumentKind::ProjectReport.as_str(), "project_report");
    }

    #[test]
    fn test_document_kind_serde_is_snake_case() {
        let json = serde_json::to_string(&DocumentKind::ProjectReport).unwrap();
        assert_eq!(json, r#""project_report""#);
    }
}
