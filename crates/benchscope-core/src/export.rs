//! CSV and LaTeX rendering of result tables.

use serde::{Deserialize, Serialize};

use crate::table::{TableColumn, TableRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Latex,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Latex => "tex",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Latex => "application/x-tex",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Latex => "latex",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "latex" | "tex" => Ok(ExportFormat::Latex),
            other => Err(format!("unsupported export format '{}'", other)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RFC 4180 quoting: fields holding a comma, quote or line break are quoted
/// and inner quotes doubled.
pub fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

pub fn to_csv<R: TableRow>(rows: &[R], columns: &[R::Column]) -> String {
    let mut out = String::new();
    let header: Vec<String> = columns.iter().map(|c| csv_field(c.header())).collect();
    out.push_str(&header.join(","));
    out.push_str("\r\n");
    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| csv_field(&row.cell(*c).export()))
            .collect();
        out.push_str(&cells.join(","));
        out.push_str("\r\n");
    }
    out
}

pub fn latex_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(ch);
            }
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            _ => out.push(ch),
        }
    }
    out
}

/// A `table` environment wrapping a `tabular`; numeric columns are
/// right-aligned, text columns left-aligned.
pub fn to_latex<R: TableRow>(rows: &[R], columns: &[R::Column], caption: Option<&str>) -> String {
    let align: String = columns
        .iter()
        .map(|c| if c.is_numeric() { 'r' } else { 'l' })
        .collect();

    let mut out = String::new();
    out.push_str("\\begin{table}[ht]\n\\centering\n");
    out.push_str(&format!("\\begin{{tabular}}{{{}}}\n\\hline\n", align));
    let header: Vec<String> = columns.iter().map(|c| latex_escape(c.header())).collect();
    out.push_str(&header.join(" & "));
    out.push_str(" \\\\\n\\hline\n");
    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| latex_escape(&row.cell(*c).export()))
            .collect();
        out.push_str(&cells.join(" & "));
        out.push_str(" \\\\\n");
    }
    out.push_str("\\hline\n\\end{tabular}\n");
    if let Some(caption) = caption {
        out.push_str(&format!("\\caption{{{}}}\n", latex_escape(caption)));
    }
    out.push_str("\\end{table}\n");
    out
}

pub fn render<R: TableRow>(format: ExportFormat, rows: &[R], columns: &[R::Column], caption: Option<&str>) -> String {
    match format {
        ExportFormat::Csv => to_csv(rows, columns),
        ExportFormat::Latex => to_latex(rows, columns, caption),
    }
}

/// File name for a downloaded table, e.g. `run-7_deltas_gender.csv`.
pub fn file_name(run_id: &str, table: &str, qualifier: Option<&str>, format: ExportFormat) -> String {
    let clean = |s: &str| -> String {
        s.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect()
    };
    let mut name = format!("run-{}_{}", clean(run_id), clean(table));
    if let Some(q) = qualifier.filter(|q| !q.is_empty()) {
        name.push('_');
        name.push_str(&clean(q));
    }
    format!("{}.{}", name, format.extension())
}
