//! HTML rendering for the prediction page

use crate::error::FieldError;
use crate::types::features::{Feature, FEATURE_COUNT};
use crate::types::prediction::{format_value, PredictionReport};
use std::collections::HashMap;
use std::fmt::Write;
use std::path::Path;

const TITLE: &str = "Well Log DT Prediction App";

const STYLE: &str = "body{font-family:sans-serif;max-width:960px;margin:2rem auto;padding:0 1rem}\
.columns{display:flex;gap:2rem}.columns>div{flex:1}\
label{display:block;margin-top:1rem}input{width:100%;padding:.3rem}\
button{margin-top:1.5rem;padding:.5rem 1.5rem}\
.success{background:#e6f4ea;color:#137333;padding:1rem;margin-top:1.5rem}\
.error{background:#fce8e6;color:#a50e0e;padding:1rem;margin-top:1.5rem}\
.field-error{color:#a50e0e;margin:.2rem 0}\
table{border-collapse:collapse;margin-top:1rem}th,td{border:1px solid #ccc;padding:.4rem .8rem}";

/// Text shown in each form input
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    values: [String; FEATURE_COUNT],
}

impl FormState {
    /// Form pre-filled with the default well log values
    pub fn defaults() -> Self {
        Self {
            values: Feature::ALL.map(|f| format_value(f.default_value())),
        }
    }

    /// Form echoing what the user submitted
    pub fn from_submission(fields: &HashMap<String, String>) -> Self {
        Self {
            values: Feature::ALL.map(|feature| {
                fields
                    .get(feature.name())
                    .map(|value| value.trim().to_string())
                    .unwrap_or_default()
            }),
        }
    }

    pub fn value(&self, feature: Feature) -> &str {
        &self.values[feature.index()]
    }
}

/// Outcome banner shown under the form
pub enum Notice<'a> {
    Success(&'a PredictionReport),
    Failure(&'a str),
}

/// Escape text for HTML element and attribute content
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn document(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{style}</style>\n</head>\n<body>\n\
         <h1>{title}</h1>\n{body}</body>\n</html>\n",
        title = TITLE,
        style = STYLE,
        body = body
    )
}

fn intro() -> &'static str {
    "<p>This application predicts the sonic log (DT) value based on well log measurements: \
     Density (RHOB), Gamma Ray (GR), Neutron Porosity (NPHI), and Photoelectric Factor (PEF). \
     Enter the values below and click 'Predict DT' to get the prediction.</p>\n"
}

fn input_field(out: &mut String, form: &FormState, errors: &[FieldError], feature: Feature) {
    let (min, max) = feature.range();
    let _ = write!(
        out,
        "<label for=\"{name}\">{label}</label>\n\
         <input type=\"number\" id=\"{name}\" name=\"{name}\" min=\"{min}\" max=\"{max}\" \
         step=\"{step}\" value=\"{value}\" required>\n",
        name = feature.name(),
        label = escape(feature.label()),
        min = format_value(min),
        max = format_value(max),
        step = feature.step(),
        value = escape(form.value(feature)),
    );
    for err in errors.iter().filter(|e| e.feature() == feature) {
        let _ = writeln!(out, "<p class=\"field-error\">{}</p>", escape(&err.to_string()));
    }
}

fn result_table(report: &PredictionReport) -> String {
    let mut table = String::from("<table>\n<thead><tr>");
    for column in PredictionReport::columns() {
        let _ = write!(table, "<th>{}</th>", escape(column));
    }
    table.push_str("</tr></thead>\n<tbody><tr>");
    for cell in report.cells() {
        let _ = write!(table, "<td>{}</td>", escape(&cell));
    }
    table.push_str("</tr></tbody>\n</table>\n");
    table
}

/// The prediction form, with per-field errors and an optional outcome banner
pub fn form_page(form: &FormState, errors: &[FieldError], notice: Option<Notice<'_>>) -> String {
    let mut body = String::from(intro());
    body.push_str("<h2>Input Well Log Parameters</h2>\n");
    body.push_str("<form method=\"post\" action=\"/predict\">\n<div class=\"columns\">\n<div>\n");
    input_field(&mut body, form, errors, Feature::Rhob);
    input_field(&mut body, form, errors, Feature::Gr);
    body.push_str("</div>\n<div>\n");
    input_field(&mut body, form, errors, Feature::Nphi);
    input_field(&mut body, form, errors, Feature::Pef);
    body.push_str("</div>\n</div>\n<button type=\"submit\">Predict DT</button>\n</form>\n");

    match notice {
        Some(Notice::Success(report)) => {
            let _ = writeln!(body, "<div class=\"success\">{}</div>", escape(&report.message()));
            body.push_str(&result_table(report));
        }
        Some(Notice::Failure(message)) => {
            let _ = writeln!(body, "<div class=\"error\">{}</div>", escape(message));
        }
        None => {}
    }

    document(&body)
}

/// Message shown when the model could not be loaded
pub fn unavailable_message(model_location: &Path) -> String {
    let file = model_location
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| model_location.display().to_string());
    let directory = model_location
        .parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string());

    format!(
        "Failed to load the model. Please check the logs and ensure '{}' is available in the '{}' directory.",
        file, directory
    )
}

/// Blocking page shown instead of the form when no model is available
pub fn unavailable_page(model_location: &Path) -> String {
    document(&format!(
        "<div class=\"error\">{}</div>\n",
        escape(&unavailable_message(model_location))
    ))
}
