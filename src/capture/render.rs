//! Output formats for captured requests.

use std::fmt::Write as _;
use std::io::{self, Write};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::capture::CapturedRequest;

/// Error produced while rendering one record.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("write failed: {0}")]
    Io(#[from] io::Error),

    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes captured requests to an output sink.
pub trait Render: Send {
    /// Render a single record and flush it to the sink.
    fn render(&mut self, record: &CapturedRequest) -> Result<(), RenderError>;
}

impl<R: Render + ?Sized> Render for Box<R> {
    fn render(&mut self, record: &CapturedRequest) -> Result<(), RenderError> {
        (**self).render(record)
    }
}

/// Output format for captured requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human readable blocks.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Build the renderer for `format` writing to `out`.
pub fn renderer_for<W>(format: LogFormat, out: W) -> Box<dyn Render>
where
    W: Write + Send + 'static,
{
    match format {
        LogFormat::Text => Box::new(TextRenderer::new(out)),
        LogFormat::Json => Box::new(JsonRenderer::new(out)),
    }
}

/// JSON-lines renderer.
pub struct JsonRenderer<W> {
    out: W,
}

impl<W: Write + Send> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Render for JsonRenderer<W> {
    fn render(&mut self, record: &CapturedRequest) -> Result<(), RenderError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.out.write_all(&line)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Human readable renderer.
///
/// ```text
///
/// 15:04:05.000:
/// Method: POST  Path: /hooks  Host: localhost:8080  Proto: HTTP/1.1
/// Headers:
///   Content-Type: application/json
/// Body:
///   {"ok":true}
/// ```
pub struct TextRenderer<W> {
    out: W,
}

impl<W: Write + Send> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Render for TextRenderer<W> {
    fn render(&mut self, record: &CapturedRequest) -> Result<(), RenderError> {
        let block = format_text(record);
        self.out.write_all(block.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

fn format_text(record: &CapturedRequest) -> String {
    let mut block = String::new();

    // Writing to a String cannot fail.
    let _ = write!(
        block,
        "\n{}:\nMethod: {}  Path: {}  Host: {}  Proto: {}\n",
        record.at.with_timezone(&Local).format("%H:%M:%S%.3f"),
        record.method,
        record.path,
        record.host,
        record.proto,
    );

    if !record.query.is_empty() {
        block.push_str("Query:\n");
        for (name, values) in &record.query {
            let _ = writeln!(block, "  {}: {}", name, values.join(","));
        }
    }

    if !record.headers.is_empty() {
        block.push_str("Headers:\n");
        for (name, values) in &record.headers {
            let _ = writeln!(block, "  {}: {}", name, values.join(","));
        }
    }

    if let Some(body) = &record.body {
        let _ = writeln!(block, "Body:\n  {}", body);
    }

    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> CapturedRequest {
        let mut record = CapturedRequest {
            method: "POST".into(),
            path: "/hooks".into(),
            query: Default::default(),
            proto: "HTTP/1.1".into(),
            host: "localhost:8080".into(),
            headers: Default::default(),
            body: Some(r#"{"ok":true}"#.into()),
            at: chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        };
        record.query.insert("id".into(), vec!["1".into(), "2".into()]);
        record
            .headers
            .insert("Content-Type".into(), vec!["application/json".into()]);
        record
    }

    #[test]
    fn json_renderer_writes_one_line_per_record() {
        let mut renderer = JsonRenderer::new(Vec::new());
        renderer.render(&sample()).unwrap();
        renderer.render(&sample()).unwrap();

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["method"], "POST");
        assert_eq!(value["path"], "/hooks");
        assert_eq!(value["proto"], "HTTP/1.1");
        assert_eq!(value["host"], "localhost:8080");
        assert_eq!(value["query"]["id"], serde_json::json!(["1", "2"]));
        assert_eq!(value["headers"]["Content-Type"], serde_json::json!(["application/json"]));
        assert_eq!(value["body"], r#"{"ok":true}"#);
        assert_eq!(value["at"], "2024-05-01T12:30:00Z");
    }

    #[test]
    fn json_renderer_omits_empty_fields() {
        let mut record = sample();
        record.query.clear();
        record.headers.clear();
        record.body = None;

        let mut renderer = JsonRenderer::new(Vec::new());
        renderer.render(&record).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&renderer.into_inner()).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("query"));
        assert!(!object.contains_key("headers"));
        assert!(!object.contains_key("body"));
    }

    #[test]
    fn text_renderer_lays_out_sections() {
        let mut renderer = TextRenderer::new(Vec::new());
        renderer.render(&sample()).unwrap();

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "");
        assert!(lines[1].ends_with(':'));
        assert_eq!(lines[2], "Method: POST  Path: /hooks  Host: localhost:8080  Proto: HTTP/1.1");
        assert_eq!(lines[3], "Query:");
        assert_eq!(lines[4], "  id: 1,2");
        assert_eq!(lines[5], "Headers:");
        assert_eq!(lines[6], "  Content-Type: application/json");
        assert_eq!(lines[7], "Body:");
        assert_eq!(lines[8], r#"  {"ok":true}"#);
        assert_eq!(lines.len(), 9);
    }

    #[test]
    fn text_renderer_skips_empty_sections() {
        let mut record = sample();
        record.query.clear();
        record.headers.clear();
        record.body = None;

        let mut renderer = TextRenderer::new(Vec::new());
        renderer.render(&record).unwrap();

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(!output.contains("Query:"));
        assert!(!output.contains("Headers:"));
        assert!(!output.contains("Body:"));
        assert_eq!(output.lines().count(), 3);
    }
}
