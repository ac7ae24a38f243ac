//! Default renderer with text and JSON output
//!
//! - Text: `[2025-01-08T10:30:45.123Z] [INFO ] [core/app.rs:12] Request processed user=42`
//! - Json: `{"timestamp":"2025-01-08T10:30:45.123Z","level":"INFO","message":"Request processed"}`

use super::renderer::{Record, Renderer};
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};

/// Output format for rendered records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    #[default]
    Text,

    /// Single-line JSON object per record
    Json,
}

/// Renderer driven by an [`OutputFormat`]
#[derive(Debug, Clone)]
pub struct FormatRenderer {
    format: OutputFormat,
    timestamp_format: Option<TimestampFormat>,
    use_colors: bool,
}

impl Default for FormatRenderer {
    fn default() -> Self {
        Self::new(OutputFormat::Text)
    }
}

impl FormatRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            timestamp_format: Some(TimestampFormat::default()),
            use_colors: false,
        }
    }

    /// Set the timestamp format, or `None` to omit timestamps
    #[must_use]
    pub fn with_timestamp(mut self, format: Option<TimestampFormat>) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Colorize the level tag in text output
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn render_text(&self, record: &Record<'_>) -> String {
        let mut out = String::with_capacity(record.message.len() + 64);

        if let Some(ref ts) = self.timestamp_format {
            out.push('[');
            out.push_str(&ts.format(&record.timestamp));
            out.push_str("] ");
        }

        out.push('[');
        out.push_str(&self.level_tag(record));
        out.push_str("] ");

        if let Some(caller) = record.caller.filter(|c| !c.is_empty()) {
            out.push('[');
            out.push_str(caller);
            out.push_str("] ");
        }

        out.push_str(record.message);

        if let Some(fields) = record.fields.filter(|f| !f.is_empty()) {
            out.push(' ');
            out.push_str(&fields.format_fields());
        }

        out
    }

    #[cfg(feature = "console")]
    fn level_tag(&self, record: &Record<'_>) -> String {
        use colored::Colorize;
        let tag = format!("{:5}", record.level.to_str());
        if self.use_colors {
            tag.color(record.level.color_code()).to_string()
        } else {
            tag
        }
    }

    #[cfg(not(feature = "console"))]
    fn level_tag(&self, record: &Record<'_>) -> String {
        format!("{:5}", record.level.to_str())
    }

    fn render_json(&self, record: &Record<'_>) -> String {
        let mut json_obj = serde_json::Map::new();

        if let Some(ref ts) = self.timestamp_format {
            let value = if ts.is_numeric() {
                serde_json::Value::Number(record.timestamp.timestamp_millis().into())
            } else {
                serde_json::Value::String(ts.format(&record.timestamp))
            };
            json_obj.insert("timestamp".to_string(), value);
        }

        json_obj.insert(
            "level".to_string(),
            serde_json::Value::String(record.level.to_str().to_string()),
        );

        if let Some(caller) = record.caller.filter(|c| !c.is_empty()) {
            json_obj.insert(
                "caller".to_string(),
                serde_json::Value::String(caller.to_string()),
            );
        }

        json_obj.insert(
            "message".to_string(),
            serde_json::Value::String(record.message.to_string()),
        );

        // Nested so user keys never shadow the fixed ones above
        if let Some(fields) = record.fields.filter(|f| !f.is_empty()) {
            let nested = fields
                .fields()
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json_value()))
                .collect::<serde_json::Map<_, _>>();
            json_obj.insert("fields".to_string(), serde_json::Value::Object(nested));
        }

        // Display on Value cannot fail
        serde_json::Value::Object(json_obj).to_string()
    }
}

impl Renderer for FormatRenderer {
    fn render(&self, record: &Record<'_>) -> String {
        match self.format {
            OutputFormat::Text => self.render_text(record),
            OutputFormat::Json => self.render_json(record),
        }
    }
}
