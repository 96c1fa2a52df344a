//! Plain-text rendering of engine data for the terminal.

use std::fmt::Write as _;

use harmatch_domain::{
    ColumnKey, ColumnWidths, ExecutionResult, ItemDetails, Job, JobItem, MatchResult,
};

/// Pixels per terminal cell when mapping column widths to text.
const PX_PER_CELL: u32 = 8;

pub fn job(job: &Job) -> String {
    let mut out = format!(
        "{}  {}  {} requests  {}",
        job.id, job.status, job.total_requests, job.file_name
    );
    if let Some(at) = job.uploaded_at {
        let _ = write!(out, "  (uploaded {})", at.format("%Y-%m-%d %H:%M:%S"));
    }
    out
}

fn column_value(item: &JobItem, column: ColumnKey) -> String {
    match column {
        ColumnKey::Method => item.method.clone(),
        ColumnKey::Status => item
            .status_code
            .map_or_else(|| "-".to_string(), |code| code.to_string()),
        ColumnKey::Domain => item.domain.clone(),
        ColumnKey::Path => item.path.clone(),
        ColumnKey::ContentType => item.content_type.clone().unwrap_or_else(|| "-".to_string()),
        ColumnKey::Duration => item
            .duration_ms
            .map_or_else(|| "-".to_string(), |ms| format!("{ms} ms")),
    }
}

/// Fits `value` into `cells`, cutting with `~` when it does not.
fn fit(value: &str, cells: usize) -> String {
    if value.chars().count() <= cells {
        return format!("{value:<cells$}");
    }
    let mut cut: String = value.chars().take(cells.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

pub fn items_table(items: &[JobItem], widths: &ColumnWidths) -> String {
    let cells: Vec<(ColumnKey, usize)> = ColumnKey::ALL
        .iter()
        .map(|&column| {
            let cells = widths.get(column) / PX_PER_CELL;
            (column, usize::try_from(cells).unwrap_or(usize::MAX))
        })
        .collect();

    let mut out = format!("{:>6} ", "ID");
    for &(column, width) in &cells {
        let _ = write!(out, " {}", fit(&column.as_str().to_uppercase(), width));
    }
    out.push('\n');

    for item in items {
        let _ = write!(out, "{:>6} ", item.id);
        for &(column, width) in &cells {
            let _ = write!(out, " {}", fit(&column_value(item, column), width));
        }
        out.push('\n');
    }
    let _ = write!(out, "{} requests", items.len());
    out
}

pub fn match_result(result: &MatchResult) -> String {
    let request = &result.matched_request;
    format!(
        "#{} {} {} ({})\nmodel: {}\n\n{}",
        result.selected_request_id,
        request.method,
        request.url,
        request
            .status_code
            .map_or_else(|| "no status".to_string(), |code| code.to_string()),
        result.model_used,
        result.curl_command,
    )
}

pub fn details(details: &ItemDetails) -> String {
    let mut out = format!(
        "#{} {} {}\n",
        details.request_id, details.method, details.url
    );

    let auth = &details.authentication;
    if auth.detected {
        let _ = writeln!(
            out,
            "auth: {} via {}",
            auth.scheme.as_deref().unwrap_or("unknown"),
            auth.header_name.as_deref().unwrap_or("-")
        );
    } else {
        out.push_str("auth: none detected\n");
    }

    let params = &details.parameters;
    if !params.query.is_empty() {
        out.push_str("query:\n");
        for q in &params.query {
            for value in q.value.values() {
                let _ = writeln!(out, "  {}={value}", q.name);
            }
        }
    }
    if !params.headers.is_empty() {
        out.push_str("headers:\n");
        for h in &params.headers {
            let marker = if h.is_auth { " [auth]" } else { "" };
            let _ = writeln!(out, "  {}: {}{marker}", h.name, h.value);
        }
    }
    if let Some(body) = &params.body {
        let _ = writeln!(
            out,
            "body ({}):\n  {body}",
            params.body_type.as_deref().unwrap_or("unknown")
        );
    }

    let response = &details.response_info;
    if let Some(code) = response.status_code {
        let _ = writeln!(
            out,
            "response: {code} {}{}",
            response.content_type.as_deref().unwrap_or(""),
            response
                .size_bytes
                .map(|b| format!(", {b} bytes"))
                .unwrap_or_default()
        );
    }
    if let Some(total) = details.timing.total_ms {
        let _ = writeln!(out, "timing: {total} ms");
    }
    out
}

pub fn execution(result: &ExecutionResult) -> String {
    let request = result.request();
    let mut out = format!(
        "{} {}  ({} ms)\n",
        request.method,
        request.url,
        result.timing().execution_time_ms
    );

    if let Some(error) = result.error() {
        let _ = writeln!(out, "{}: {}", error.kind.title(), error.message);
        if let Some(details) = &error.details {
            let _ = writeln!(out, "{details}");
        }
        if !error.suggestions.is_empty() {
            out.push_str("suggestions:\n");
            for suggestion in &error.suggestions {
                let _ = writeln!(out, "  - {suggestion}");
            }
        }
    }

    if let Some(response) = result.response() {
        let _ = writeln!(out, "{} {}", response.status_code, response.status_text);
        for (name, value) in &response.headers {
            let _ = writeln!(out, "{name}: {value}");
        }
        if !response.body.is_empty() {
            let _ = writeln!(out, "\n{}", response.body);
        }
    }
    out
}
