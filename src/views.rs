// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-rendered HTML pages.

use crate::models::CaseTable;
use crate::services::covid::Figure;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:2rem auto;max-width:60rem;\
padding:0 1rem;color:#222}a{color:#0a58ca}label{margin-right:.5rem}\
select,input{margin-right:1rem}#chart{width:100%;height:32rem}";

/// Escape text for HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, head_extra: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>{}</title>\n<style>{}</style>\n{}</head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        STYLE,
        head_extra,
        body
    )
}

pub fn landing_page() -> String {
    page(
        "Portfolio",
        "",
        r#"<h1>Portfolio</h1>
<ul>
<li><a href="/covid-by-county/">COVID-19 cases by county</a></li>
<li><a href="/sample_data/">Sample data OData feed</a></li>
<li><a href="/garmin_activities/">Garmin Connect activities OData feed</a></li>
</ul>"#,
    )
}

/// County selector, with a chart when `figure` is given.
pub fn covid_page(table: &CaseTable, figure: Option<&Figure>) -> String {
    let states: String = table
        .states()
        .into_iter()
        .map(|s| format!("<option value=\"{0}\">{0}</option>", escape(s)))
        .collect();

    let locations: String = table
        .locations()
        .into_iter()
        .map(|l| format!("<option value=\"{}\"></option>", escape(l)))
        .collect();

    let mut body = format!(
        r#"<h1>COVID-19 new cases by county</h1>
<form method="get" action="/covid-by-county/graph">
<label for="county">County</label><input id="county" name="county" list="locations" required>
<datalist id="locations">{locations}</datalist>
<label for="state">State</label><select id="state" name="state">{states}</select>
<button type="submit">Graph</button>
</form>
"#
    );

    let mut head = String::new();
    if let Some(figure) = figure {
        head = format!("<script src=\"{PLOTLY_CDN}\" charset=\"utf-8\"></script>\n");
        body.push_str(&format!(
            "<div id=\"chart\"></div>\n<script>\nvar graph = {};\n\
Plotly.newPlot('chart', graph.data, graph.layout);\n</script>",
            script_json(figure)
        ));
    }

    page("COVID-19 by County", &head, &body)
}

/// Figure JSON safe to embed in a `<script>` element.
fn script_json(figure: &Figure) -> String {
    serde_json::to_string(figure)
        .unwrap_or_else(|_| "{\"data\":[],\"layout\":{}}".to_string())
        .replace("</", "<\\/")
}
