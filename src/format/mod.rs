//! Output formatting for item summaries and link resolutions (table, JSON, markdown, CSV).

use crate::amazon::{ItemSummary, Resolution};
use crate::config::OutputFormat;
use serde::Serialize;

/// A resolved link paired with the URL it came from.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedLink {
    pub input: String,
    #[serde(flatten)]
    pub resolution: Resolution,
}

/// Formats results for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats item summaries, in the order given.
    pub fn format_summaries(&self, items: &[ItemSummary]) -> String {
        if items.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => Self::summary_csv_header(),
                _ => "No items found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Table => self.table_summaries(items),
            OutputFormat::Markdown => self.markdown_summaries(items),
            OutputFormat::Csv => self.csv_summaries(items),
        }
    }

    /// Formats link resolutions.
    pub fn format_resolutions(&self, links: &[ResolvedLink]) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(links).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Table => {
                let mut lines = vec![
                    format!("{:<10}  {}", "ASIN", "URL"),
                    format!("{:-<10}  {:-<50}", "", ""),
                ];
                for link in links {
                    lines.push(format!(
                        "{:<10}  {}",
                        link.resolution.id.as_deref().unwrap_or("-"),
                        link.resolution.final_url
                    ));
                }
                lines.join("\n")
            }
            OutputFormat::Markdown => {
                let mut lines = vec![
                    "| Input | ASIN | Final URL |".to_string(),
                    "|-------|------|-----------|".to_string(),
                ];
                for link in links {
                    lines.push(format!(
                        "| {} | {} | {} |",
                        link.input,
                        link.resolution.id.as_deref().unwrap_or(""),
                        link.resolution.final_url
                    ));
                }
                lines.join("\n")
            }
            OutputFormat::Csv => {
                let mut lines = vec!["input,asin,final_url".to_string()];
                for link in links {
                    lines.push(format!(
                        "{},{},{}",
                        Self::csv_escape(&link.input),
                        link.resolution.id.as_deref().unwrap_or_default(),
                        Self::csv_escape(&link.resolution.final_url)
                    ));
                }
                lines.join("\n")
            }
        }
    }

    fn price_str(item: &ItemSummary) -> String {
        match &item.price {
            Some(p) => match (&p.display, p.amount) {
                (Some(display), _) => display.clone(),
                (None, Some(amount)) => format!("{:.2}", amount),
                (None, None) => "N/A".to_string(),
            },
            None => "N/A".to_string(),
        }
    }

    fn truncate(s: &str, max: usize) -> String {
        if s.chars().count() > max {
            format!("{}...", s.chars().take(max - 3).collect::<String>())
        } else {
            s.to_string()
        }
    }

    fn table_summaries(&self, items: &[ItemSummary]) -> String {
        let asin_width = 10;
        let price_width = 12;
        let rating_width = 8;
        let reviews_width = 8;
        let title_width = 50;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:<asin_width$}  {:<price_width$}  {:<rating_width$}  {:<reviews_width$}  {}",
            "ASIN", "Price", "Rating", "Reviews", "Title"
        ));
        lines.push(format!(
            "{:-<asin_width$}  {:-<price_width$}  {:-<rating_width$}  {:-<reviews_width$}  {:-<title_width$}",
            "", "", "", "", ""
        ));

        for item in items {
            let rating =
                item.rating.map(|r| format!("{:.1}", r)).unwrap_or_else(|| "N/A".to_string());
            let reviews =
                item.review_count.map(|c| c.to_string()).unwrap_or_else(|| "N/A".to_string());
            let title = Self::truncate(item.title.as_deref().unwrap_or(""), title_width);

            lines.push(format!(
                "{:<asin_width$}  {:>price_width$}  {:>rating_width$}  {:>reviews_width$}  {}",
                item.asin,
                Self::price_str(item),
                rating,
                reviews,
                title
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} items", items.len()));

        lines.join("\n")
    }

    fn markdown_summaries(&self, items: &[ItemSummary]) -> String {
        let mut lines = Vec::new();

        lines.push("| ASIN | Price | Rating | Title |".to_string());
        lines.push("|------|-------|--------|-------|".to_string());

        for item in items {
            let rating =
                item.rating.map(|r| format!("{:.1}", r)).unwrap_or_else(|| "N/A".to_string());
            let title = Self::truncate(item.title.as_deref().unwrap_or(&item.asin), 40);
            let title = match &item.detail_page_url {
                Some(url) => format!("[{}]({})", title, url),
                None => title,
            };

            lines.push(format!(
                "| {} | {} | {} | {} |",
                item.asin,
                Self::price_str(item),
                rating,
                title
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} items found*", items.len()));

        lines.join("\n")
    }

    fn summary_csv_header() -> String {
        "asin,title,price,amount,currency,rating,reviews,image_url,url".to_string()
    }

    fn csv_summaries(&self, items: &[ItemSummary]) -> String {
        let mut lines = vec![Self::summary_csv_header()];

        for item in items {
            let price = item.price.as_ref();
            lines.push(format!(
                "{},{},{},{},{},{},{},{},{}",
                item.asin,
                item.title.as_deref().map(Self::csv_escape).unwrap_or_default(),
                price.and_then(|p| p.display.as_deref()).map(Self::csv_escape).unwrap_or_default(),
                price.and_then(|p| p.amount).map(|a| a.to_string()).unwrap_or_default(),
                price.and_then(|p| p.currency.clone()).unwrap_or_default(),
                item.rating.map(|r| r.to_string()).unwrap_or_default(),
                item.review_count.map(|c| c.to_string()).unwrap_or_default(),
                item.image_url.as_deref().unwrap_or_default(),
                item.detail_page_url.as_deref().unwrap_or_default(),
            ));
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}
