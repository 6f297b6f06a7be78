use anyhow::{anyhow, Context, Result};

use crate::api::models::DetectionResult;

const CSV_HEADERS: [&str; 2] = ["website", "platforms"];

/// Renders results as a two-column `website,platforms` table.
///
/// One row per result, in the given order. The platforms column holds the
/// canonical names sorted lexically and joined with `|`, and is empty for
/// failed results. A field is quoted, with inner quotes doubled, only when
/// it contains a comma, a double quote, CR or LF.
pub fn render_csv(results: &[DetectionResult]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS).context("Failed to write CSV header")?;
    for result in results {
        writer
            .write_record([result.url(), platforms_column(result).as_str()])
            .with_context(|| format!("Failed to write CSV row for {}", result.url()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV output: {}", e))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

fn platforms_column(result: &DetectionResult) -> String {
    if !result.is_ok() {
        return String::new();
    }

    let mut names: Vec<&str> = result.platforms().iter().map(|p| p.as_str()).collect();
    names.sort_unstable();
    names.join("|")
}
