use crate::auth::TokenSource;
use crate::errors::SheetsError;
use crate::metrics_defs::{SHEETS_APPEND_DURATION, SHEETS_APPEND_FAILURES};
use crate::row::Row;
use async_trait::async_trait;
use serde::Deserialize;
use shared::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Appends rows to a named sheet of some backing document.
#[async_trait]
pub trait RowAppender: Send + Sync {
    async fn add_row(&self, sheet_title: &str, row: &Row) -> Result<(), SheetsError>;
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    #[serde(default)]
    pub sheet_id: u64,
    pub title: String,
    #[serde(default)]
    pub index: u32,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize, Default)]
struct DocumentProperties {
    #[serde(default)]
    title: String,
}

#[derive(Deserialize)]
struct DocumentResponse {
    #[serde(default)]
    properties: DocumentProperties,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

/// Spreadsheet metadata: document title and the sheets it contains.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInfo {
    pub title: String,
    pub sheets: Vec<SheetProperties>,
}

impl DocumentInfo {
    pub fn sheet_by_title(&self, title: &str) -> Result<&SheetProperties, SheetsError> {
        self.sheets
            .iter()
            .find(|s| s.title == title)
            .ok_or_else(|| SheetsError::SheetNotFound(title.to_string()))
    }
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

/// A1 notation for a whole sheet. Quotes inside the title are doubled.
fn sheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SheetsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or(body);

    Err(SheetsError::Api { status, message })
}

/// Client for a single spreadsheet document.
#[derive(Clone)]
pub struct SpreadsheetClient {
    client: reqwest::Client,
    api_url: Url,
    spreadsheet_id: String,
    tokens: Arc<dyn TokenSource>,
}

impl SpreadsheetClient {
    pub fn new(api_url: Url, spreadsheet_id: impl Into<String>, tokens: Arc<dyn TokenSource>) -> Self {
        SpreadsheetClient {
            client: reqwest::Client::new(),
            api_url,
            spreadsheet_id: spreadsheet_id.into(),
            tokens,
        }
    }

    fn endpoint(&self, extra: &[&str]) -> Result<Url, SheetsError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidUrl(self.api_url.to_string()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str()])
            .extend(extra);
        Ok(url)
    }

    /// Loads the document title and its sheet list.
    pub async fn load_info(&self, token: &str) -> Result<DocumentInfo, SheetsError> {
        let mut url = self.endpoint(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "properties.title,sheets.properties");

        let response = self.client.get(url).bearer_auth(token).send().await?;
        let document = check_status(response)
            .await?
            .json::<DocumentResponse>()
            .await?;

        Ok(DocumentInfo {
            title: document.properties.title,
            sheets: document.sheets.into_iter().map(|s| s.properties).collect(),
        })
    }

    /// Reads the first row of the sheet, which names its columns.
    pub async fn header_row(&self, token: &str, sheet_title: &str) -> Result<Vec<String>, SheetsError> {
        let range = format!("{}!1:1", sheet_range(sheet_title));
        let url = self.endpoint(&["values", &range])?;

        let response = self.client.get(url).bearer_auth(token).send().await?;
        let values = check_status(response).await?.json::<ValueRange>().await?;

        let header = values.values.into_iter().next().unwrap_or_default();
        if header.iter().all(|h| h.trim().is_empty()) {
            return Err(SheetsError::MissingHeaderRow(sheet_title.to_string()));
        }
        Ok(header)
    }

    /// Appends one row of raw values after the last row of the sheet's table.
    pub async fn append_values(
        &self,
        token: &str,
        sheet_title: &str,
        values: Vec<String>,
    ) -> Result<(), SheetsError> {
        let range = format!("{}:append", sheet_range(sheet_title));
        let mut url = self.endpoint(&["values", &range])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let body = serde_json::json!({
            "majorDimension": "ROWS",
            "values": [values],
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn append(&self, sheet_title: &str, row: &Row) -> Result<(), SheetsError> {
        let token = self.tokens.access_token().await?;

        let info = self.load_info(&token).await?;
        let sheet = info.sheet_by_title(sheet_title)?;

        let header = self.header_row(&token, &sheet.title).await?;
        let unmatched = row.unmatched_columns(&header);
        if !unmatched.is_empty() {
            tracing::debug!(sheet = %sheet.title, columns = ?unmatched, "dropping columns missing from header row");
        }

        self.append_values(&token, &sheet.title, row.values_for(&header))
            .await
    }
}

#[async_trait]
impl RowAppender for SpreadsheetClient {
    async fn add_row(&self, sheet_title: &str, row: &Row) -> Result<(), SheetsError> {
        let started = Instant::now();
        let result = self.append(sheet_title, row).await;

        histogram!(SHEETS_APPEND_DURATION, "sheet" => sheet_title.to_string())
            .record(started.elapsed().as_secs_f64());
        if result.is_err() {
            counter!(SHEETS_APPEND_FAILURES, "sheet" => sheet_title.to_string()).increment(1);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenSource;
    use crate::testutils::{MOCK_TOKEN, MockSheets};
    use http::StatusCode;

    fn client(api_url: Url, token: &str) -> SpreadsheetClient {
        SpreadsheetClient::new(
            api_url,
            "doc-1",
            Arc::new(StaticTokenSource(token.to_string())),
        )
    }

    #[test]
    fn test_sheet_range() {
        assert_eq!(sheet_range("Analytics"), "'Analytics'");
        assert_eq!(sheet_range("Bob's form"), "'Bob''s form'");
    }

    #[test]
    fn test_endpoint() {
        let c = client(Url::parse("https://sheets.example.com").unwrap(), "t");
        let url = c.endpoint(&["values", "'My Sheet'!1:1"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.example.com/v4/spreadsheets/doc-1/values/'My%20Sheet'!1:1"
        );
    }

    #[tokio::test]
    async fn test_add_row() {
        let mock = MockSheets::new("Site")
            .with_sheet("Analytics", &["timestamp", "page", "ua"])
            .with_sheet("Forms", &["timestamp", "formName"]);
        let url = mock.spawn().await;
        let c = client(url, MOCK_TOKEN);

        let info = c.load_info(MOCK_TOKEN).await.unwrap();
        assert_eq!(info.title, "Site");
        assert_eq!(info.sheets.len(), 2);
        assert_eq!(info.sheet_by_title("Forms").unwrap().index, 1);

        let row: Row = [("page", "/about"), ("timestamp", "t1"), ("extra", "x")]
            .into_iter()
            .collect();
        c.add_row("Analytics", &row).await.unwrap();

        assert_eq!(
            mock.appended(),
            vec![(
                "Analytics".to_string(),
                vec!["t1".to_string(), "/about".to_string(), "".to_string()]
            )]
        );
    }

    #[tokio::test]
    async fn test_repeated_rows_are_not_deduplicated() {
        let mock = MockSheets::new("Site").with_sheet("Forms", &["timestamp", "formName"]);
        let c = client(mock.spawn().await, MOCK_TOKEN);

        let row: Row = [("timestamp", "t"), ("formName", "Contact")]
            .into_iter()
            .collect();
        c.add_row("Forms", &row).await.unwrap();
        c.add_row("Forms", &row).await.unwrap();

        assert_eq!(mock.appended().len(), 2);
    }

    #[tokio::test]
    async fn test_sheet_not_found() {
        let mock = MockSheets::new("Site").with_sheet("Analytics", &["timestamp"]);
        let c = client(mock.spawn().await, MOCK_TOKEN);

        let err = c.add_row("Nope", &Row::new()).await.unwrap_err();
        assert!(matches!(err, SheetsError::SheetNotFound(title) if title == "Nope"));
        assert!(mock.appended().is_empty());
    }

    #[tokio::test]
    async fn test_missing_header_row() {
        let mock = MockSheets::new("Site").with_sheet("Empty", &[]);
        let c = client(mock.spawn().await, MOCK_TOKEN);

        let err = c.add_row("Empty", &Row::new()).await.unwrap_err();
        assert!(matches!(err, SheetsError::MissingHeaderRow(_)));
    }

    #[tokio::test]
    async fn test_api_error_exposes_status() {
        let mock = MockSheets::new("Site").with_sheet("Analytics", &["timestamp"]);
        let c = client(mock.spawn().await, "wrong-token");

        let err = c.add_row("Analytics", &Row::new()).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert!(err.to_string().contains("invalid authentication credentials"));

        let mock = MockSheets::new("Site").with_sheet("Analytics", &["timestamp"]);
        mock.fail_appends_with(StatusCode::TOO_MANY_REQUESTS);
        let c = client(mock.spawn().await, MOCK_TOKEN);
        let err = c.add_row("Analytics", &Row::new()).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::TOO_MANY_REQUESTS));
    }
}
