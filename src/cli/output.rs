use std::fmt::Write as FmtWrite;

use console::style;

use crate::models::{ChatMessage, OutputFormat, Role};
use crate::services::IndexStats;

pub trait Formatter {
    fn format_transcript(&self, history: &[ChatMessage]) -> String;
    fn format_index_stats(&self, stats: &IndexStats) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

pub struct TextFormatter {
    pub colored: bool,
}

impl TextFormatter {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    fn label(&self, role: Role) -> String {
        let label = match role {
            Role::Human => "You",
            Role::Ai => "Bot",
        };
        if !self.colored {
            return format!("{label}:");
        }
        match role {
            Role::Human => style(format!("{label}:")).cyan().bold().to_string(),
            Role::Ai => style(format!("{label}:")).green().bold().to_string(),
        }
    }
}

impl Formatter for TextFormatter {
    fn format_transcript(&self, history: &[ChatMessage]) -> String {
        if history.is_empty() {
            return "No conversation yet.\n".to_string();
        }

        let mut output = String::new();
        for message in history {
            writeln!(output, "{}", self.label(message.role)).unwrap();
            for line in message.content.lines() {
                writeln!(output, "  {line}").unwrap();
            }
            writeln!(output).unwrap();
        }
        output
    }

    fn format_index_stats(&self, stats: &IndexStats) -> String {
        let mut output = String::new();
        writeln!(output, "Indexing Complete").unwrap();
        writeln!(output, "-----------------").unwrap();
        writeln!(output, "Documents:      {}", stats.files.len()).unwrap();
        for file in &stats.files {
            writeln!(output, "  {}", file.display()).unwrap();
        }
        writeln!(output, "Characters:     {}", stats.text_chars).unwrap();
        writeln!(output, "Chunks created: {}", stats.chunks_created).unwrap();
        writeln!(output, "Longest chunk:  {}", stats.longest_chunk).unwrap();
        if let Some(dimension) = stats.dimension {
            writeln!(output, "Dimension:      {dimension}").unwrap();
        }
        writeln!(output, "Duration:       {}ms", stats.duration_ms).unwrap();
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{message}\n")
    }

    fn format_error(&self, error: &str) -> String {
        if self.colored {
            format!("{} {error}\n", style("Error:").red().bold())
        } else {
            format!("Error: {error}\n")
        }
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render(&self, value: &serde_json::Value) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}

impl Formatter for JsonFormatter {
    fn format_transcript(&self, history: &[ChatMessage]) -> String {
        let messages: Vec<serde_json::Value> = history
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": m.role.to_string(),
                    "content": m.content,
                    "created_at": m.created_at,
                })
            })
            .collect();
        self.render(&serde_json::json!({ "messages": messages }))
    }

    fn format_index_stats(&self, stats: &IndexStats) -> String {
        match serde_json::to_value(stats) {
            Ok(value) => self.render(&value),
            Err(e) => format!("{{\"error\": \"{e}\"}}"),
        }
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_transcript(&self, history: &[ChatMessage]) -> String {
        if history.is_empty() {
            return "*No conversation yet.*\n".to_string();
        }

        let mut output = String::new();
        for message in history {
            match message.role {
                Role::Human => writeln!(output, "**You:** {}\n", message.content).unwrap(),
                Role::Ai => {
                    writeln!(output, "**Bot:**\n").unwrap();
                    for line in message.content.lines() {
                        writeln!(output, "> {line}").unwrap();
                    }
                    writeln!(output).unwrap();
                }
            }
        }
        output
    }

    fn format_index_stats(&self, stats: &IndexStats) -> String {
        let mut output = String::new();
        writeln!(output, "## Indexing Complete\n").unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Documents | {} |", stats.files.len()).unwrap();
        writeln!(output, "| Characters | {} |", stats.text_chars).unwrap();
        writeln!(output, "| Chunks created | {} |", stats.chunks_created).unwrap();
        writeln!(output, "| Longest chunk | {} |", stats.longest_chunk).unwrap();
        if let Some(dimension) = stats.dimension {
            writeln!(output, "| Dimension | {dimension} |").unwrap();
        }
        writeln!(output, "| Duration | {}ms |", stats.duration_ms).unwrap();
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {message}\n")
    }

    fn format_error(&self, error: &str) -> String {
        format!("> **Error:** {error}\n")
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(console::colors_enabled())),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}
