//! HTML report with one row and one QR code per account.

use std::path::Path;

use anyhow::{Context, Result};

use crate::export::ExportRecord;
use crate::qr::qr_data_uri;

const STYLE: &str = "
    body { font-family: sans-serif; margin: 2rem; }
    table { border-collapse: collapse; }
    th, td { border: 1px solid #ccc; padding: 0.4rem 0.6rem; }
    th, td { text-align: left; vertical-align: middle; }
    th { background: #f0f0f0; }
    td.mono { font-family: monospace; word-break: break-all; }
";

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub fn render_html(records: &[ExportRecord], generated_at: &str, module_px: u32) -> Result<String> {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n<title>OTP accounts</title>\n");
    html.push_str(&format!("<style>{STYLE}</style>\n"));
    html.push_str("</head>\n<body>\n<h1>OTP accounts</h1>\n");
    html.push_str(&format!("<p>Generated {}</p>\n", html_escape(generated_at)));

    html.push_str("<table>\n<tr><th>Name</th><th>Issuer</th><th>Secret (hex)</th><th>Type</th>");
    html.push_str("<th>Algorithm</th><th>Digits</th><th>URI</th><th>QR code</th></tr>\n");

    for record in records {
        let qr = qr_data_uri(&record.uri, module_px)
            .with_context(|| format!("cannot render QR code for '{}'", record.name))?;
        let uri = html_escape(&record.uri);
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td class=\"mono\">{}</td>\
             <td>{}</td><td>{}</td><td>{}</td>\
             <td class=\"mono\"><a href=\"{uri}\">{uri}</a></td>\
             <td><img src=\"{qr}\" alt=\"QR code\"></td></tr>\n",
            html_escape(&record.name),
            html_escape(&record.issuer),
            record.secret_hex,
            record.kind,
            record.algorithm,
            record.digits,
        ));
    }

    html.push_str("</table>\n");
    html.push_str(&format!("<p>Total: {} account(s)</p>\n", records.len()));
    html.push_str("</body>\n</html>\n");
    Ok(html)
}

pub fn write_report(path: &Path, html: &str) -> Result<()> {
    std::fs::write(path, html)
        .with_context(|| format!("cannot write report {}", path.display()))
}
