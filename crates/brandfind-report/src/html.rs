//! Standalone HTML rendering of the comparison table.

use crate::report::{BrandRow, ReportRow, RunSummaryRow};

pub(crate) fn render_report(rows: &[ReportRow], generated_at: &str) -> String {
    let mut body = String::new();
    for row in rows {
        match row {
            ReportRow::Brand(brand) => push_brand_row(&mut body, brand),
            ReportRow::Summary(summary) => push_summary_row(&mut body, summary),
        }
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Brand website comparison</title>
<style>
body{{font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",sans-serif;margin:24px;color:#222;}}
h1{{font-size:20px;}}
.generated{{color:#888;font-size:12px;margin-bottom:16px;}}
table{{border-collapse:collapse;width:100%;font-size:13px;}}
th,td{{border:1px solid #ddd;padding:6px 8px;text-align:left;vertical-align:top;}}
th{{background:#f4f4f4;position:sticky;top:0;}}
.confidence-high td.confidence{{color:#2e7d32;font-weight:600;}}
.confidence-medium td.confidence{{color:#e65100;font-weight:600;}}
.confidence-low td.confidence{{color:#c62828;}}
.url-found td.website a{{color:#0066cc;}}
.url-missing td.website{{color:#999;font-style:italic;}}
tr.run-summary{{background:#eef3fb;font-weight:600;}}
.error{{color:#c62828;font-size:11px;}}
</style>
</head>
<body>
<h1>Brand website comparison</h1>
<div class="generated">Generated {generated}</div>
<table>
<thead>
<tr><th>Model</th><th>Brand</th><th>Website</th><th>Confidence</th><th>Description</th><th>Founded</th><th>Location</th><th>Specialties</th><th>Notes</th><th>Tokens</th><th>Cost</th><th>Source file</th></tr>
</thead>
<tbody>
{body}</tbody>
</table>
</body>
</html>
"#,
        generated = html_escape(generated_at),
    )
}

fn push_brand_row(out: &mut String, row: &BrandRow) {
    let url_class = if row.website.is_some() {
        "url-found"
    } else {
        "url-missing"
    };
    let website = match &row.website {
        Some(url) if is_web_url(url) => format!(
            r#"<a href="{href}" target="_blank" rel="noopener">{text}</a>"#,
            href = html_escape(url),
            text = html_escape(url)
        ),
        Some(url) => html_escape(url),
        None => "not found".to_owned(),
    };
    let notes = match row.error_type {
        Some(error_type) => format!(
            r#"<span class="error">{}</span> {}"#,
            error_type,
            escape_opt(row.notes.as_deref())
        ),
        None => escape_opt(row.notes.as_deref()),
    };

    out.push_str(&format!(
        r#"<tr class="confidence-{confidence} {url_class}"><td>{model}</td><td>{brand}</td><td class="website">{website}</td><td class="confidence">{confidence}</td><td>{description}</td><td>{founded}</td><td>{location}</td><td>{specialties}</td><td>{notes}</td><td>{tokens}</td><td>${cost:.4}</td><td>{file}</td></tr>
"#,
        confidence = row.confidence.as_str(),
        model = html_escape(&row.model_name),
        brand = html_escape(&row.brand),
        description = escape_opt(row.description.as_deref()),
        founded = escape_opt(row.founded.as_deref()),
        location = escape_opt(row.location.as_deref()),
        specialties = escape_opt(row.specialties.as_deref()),
        tokens = row.tokens,
        cost = row.cost,
        file = html_escape(&row.file),
    ));
}

fn push_summary_row(out: &mut String, row: &RunSummaryRow) {
    let status = if row.partial { " (partial)" } else { "" };
    out.push_str(&format!(
        r#"<tr class="run-summary"><td>{model}</td><td colspan="8">Run summary{status}: {found}/{brands} websites found, success rate {rate}</td><td>{tokens}</td><td>${cost:.4}</td><td>{file}</td></tr>
"#,
        model = html_escape(&row.model_name),
        found = row.found,
        brands = row.brands,
        rate = html_escape(&row.success_rate),
        tokens = row.total_tokens,
        cost = row.total_cost,
        file = html_escape(&row.file),
    ));
}

/// Only plain web addresses become links; anything else is shown as text.
fn is_web_url(url: &str) -> bool {
    let url = url.trim_start().to_ascii_lowercase();
    url.starts_with("http://") || url.starts_with("https://")
}

fn escape_opt(value: Option<&str>) -> String {
    value.map(html_escape).unwrap_or_default()
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use brandfind_core::{ErrorType, SearchConfidence};

    use super::*;

    fn brand_row(website: Option<&str>, confidence: SearchConfidence) -> BrandRow {
        BrandRow {
            model_id: "perplexity/sonar".to_owned(),
            model_name: "Perplexity Sonar".to_owned(),
            file: "brand_websites_perplexity_sonar_2025-01-15T10-30-45-123Z.json".to_owned(),
            brand: "Acme <Blades> & Co".to_owned(),
            website: website.map(str::to_owned),
            confidence,
            description: Some("Knives \"forged\"".to_owned()),
            founded: Some("1998".to_owned()),
            location: None,
            specialties: None,
            notes: None,
            error_type: None,
            tokens: 150,
            cost: 0.0021,
        }
    }

    #[test]
    fn escapes_special_characters() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom's & Co</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom&#39;s &amp; Co&lt;/a&gt;"
        );
    }

    #[test]
    fn brand_rows_carry_confidence_and_url_classes() {
        let rows = vec![
            ReportRow::Brand(brand_row(Some("https://acme.example"), SearchConfidence::High)),
            ReportRow::Brand(brand_row(None, SearchConfidence::Low)),
        ];
        let html = render_report(&rows, "2025-01-15 10:30 UTC");

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"<tr class="confidence-high url-found">"#));
        assert!(html.contains(r#"<tr class="confidence-low url-missing">"#));
        assert!(html.contains(r#"href="https://acme.example""#));
        assert!(html.contains("Acme &lt;Blades&gt; &amp; Co"));
        assert!(html.contains("Knives &quot;forged&quot;"));
        assert!(!html.contains("<Blades>"));
        assert_eq!(html.matches("<table>").count(), 1);
    }

    #[test]
    fn non_web_urls_are_not_linked() {
        let rows = vec![
            ReportRow::Brand(brand_row(Some("javascript:alert(1)"), SearchConfidence::Low)),
            ReportRow::Brand(brand_row(Some("HTTP://acme.example"), SearchConfidence::High)),
        ];
        let html = render_report(&rows, "now");

        assert!(!html.contains("href=\"javascript"));
        assert!(html.contains(r#"<td class="website">javascript:alert(1)</td>"#));
        assert!(html.contains(r#"href="HTTP://acme.example""#));
    }

    #[test]
    fn failed_rows_show_error_type() {
        let mut row = brand_row(None, SearchConfidence::Low);
        row.error_type = Some(ErrorType::ParseError);
        row.notes = Some("Failed to parse JSON response: no JSON object".to_owned());

        let html = render_report(&[ReportRow::Brand(row)], "now");
        assert!(html.contains(r#"<span class="error">parse_error</span>"#));
    }

    #[test]
    fn summary_rows_mark_partial_runs() {
        let summary = RunSummaryRow {
            model_id: "perplexity/sonar".to_owned(),
            model_name: "Perplexity Sonar".to_owned(),
            file: "f.json".to_owned(),
            brands: 4,
            found: 3,
            success_rate: "75.0%".to_owned(),
            total_tokens: 600,
            total_cost: 0.0123,
            partial: true,
        };
        let html = render_report(&[ReportRow::Summary(summary)], "now");
        assert!(html.contains(r#"<tr class="run-summary">"#));
        assert!(html.contains("Run summary (partial): 3/4 websites found, success rate 75.0%"));
        assert!(html.contains("$0.0123"));
    }
}
