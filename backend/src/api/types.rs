//! REST API types.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::transform::pipeline::PipelineOutput;

/// Response to `POST /api/preview`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub job_id: String,

    /// "ready", or "warning" when the preview could not be rendered
    pub status: String,

    /// Self-contained preview markup; empty when rendering failed
    pub html: String,

    pub render_error: Option<String>,

    /// Final table, cells as displayed
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,

    /// Indices of group/separator rows in `rows`
    pub group_rows: Vec<usize>,

    pub metadata: SheetMetadata,
}

/// Upload metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    /// Header as extracted, for column pickers
    pub extracted_columns: Vec<String>,
}

impl From<PipelineOutput> for PreviewResponse {
    fn from(output: PipelineOutput) -> Self {
        let group_rows = output
            .table
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.separator)
            .map(|(i, _)| i)
            .collect();

        PreviewResponse {
            job_id: Uuid::new_v4().to_string(),
            status: if output.rendered.is_ok() { "ready" } else { "warning" }.to_string(),
            html: output.rendered.html,
            render_error: output.rendered.error,
            columns: output.table.header.clone(),
            rows: output.table.texts(),
            group_rows,
            metadata: SheetMetadata {
                encoding: output.info.encoding,
                delimiter: output.info.delimiter.to_string(),
                row_count: output.table.rows.len(),
                extracted_columns: output.extracted_columns,
            },
        }
    }
}

/// Error body shared by every endpoint.
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "html": "",
        "columns": [],
        "rows": []
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CleanTable, PipelineOptions, Row};
    use crate::transform::pipeline::format_table;

    #[test]
    fn test_preview_response() {
        let mut table = CleanTable::from_texts(
            &["Characteristic Name", "Before: Mean"],
            &[vec!["Age", "45.123"], vec!["BMI", "27"]],
        );
        table.rows.insert(1, Row::separator(2, 0, "Labs"));

        let output = format_table(&table, &PipelineOptions::default()).unwrap();
        let response = PreviewResponse::from(output);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "ready");
        assert_eq!(json["columns"][0], "Characteristic Name");
        assert_eq!(json["rows"][0][1], "45.12");
        assert_eq!(json["groupRows"][0], 1);
        assert_eq!(json["metadata"]["delimiter"], ",");
        assert!(json["html"].as_str().unwrap().contains("psm-table"));
    }

    #[test]
    fn test_error_response() {
        let body = error_response("Could not parse file");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "Could not parse file");
        assert!(Uuid::parse_str(body["jobId"].as_str().unwrap()).is_ok());
    }
}
