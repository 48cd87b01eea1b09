//! Column definitions, visibility, sorting and filtering for result tables.

use std::cmp::Ordering;

use crate::format;
use crate::models::{DeltaRow, KruskalRow};

/// One table cell, typed so display and export can format it differently.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Num(Option<f64>),
    Signed(Option<f64>),
    PValue(Option<f64>),
    Count(Option<u64>),
    Flag(Option<bool>),
}

impl Cell {
    /// Human-facing rendering, with the display gap for missing values.
    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Num(v) => format::num(*v, 3),
            Cell::Signed(v) => format::signed(*v, 3),
            Cell::PValue(v) => format::p_value(*v),
            Cell::Count(v) => format::count(*v),
            Cell::Flag(v) => format::flag(*v),
        }
    }

    /// Machine-facing rendering: full-ish precision, empty when missing.
    pub fn export(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Num(v) | Cell::Signed(v) | Cell::PValue(v) => match format::finite(*v) {
                Some(x) if x != 0.0 && x.abs() < 1e-3 => format!("{:.3e}", x),
                Some(x) => format!("{:.4}", x),
                None => String::new(),
            },
            Cell::Count(v) => v.map(|n| n.to_string()).unwrap_or_default(),
            Cell::Flag(v) => v.map(|b| b.to_string()).unwrap_or_default(),
        }
    }

    fn number(&self) -> Option<f64> {
        match self {
            Cell::Num(v) | Cell::Signed(v) | Cell::PValue(v) => format::finite(*v),
            Cell::Count(v) => v.map(|n| n as f64),
            Cell::Flag(v) => v.map(|b| if b { 1.0 } else { 0.0 }),
            Cell::Text(_) => None,
        }
    }

    fn is_missing(&self) -> bool {
        match self {
            Cell::Text(s) => s.is_empty(),
            _ => self.number().is_none(),
        }
    }

    /// Ascending order; callers put missing cells last separately.
    fn compare(&self, other: &Cell) -> Ordering {
        match (self, other) {
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            _ => match (self.number(), other.number()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => Ordering::Equal,
            },
        }
    }
}

pub trait TableColumn: Copy + PartialEq + std::fmt::Debug + 'static {
    /// Every column in canonical order.
    fn all() -> &'static [Self];
    fn header(self) -> &'static str;
    /// Stable identifier used on the command line.
    fn key(self) -> &'static str;
    fn is_numeric(self) -> bool;
    fn default_visible(self) -> bool {
        true
    }

    fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::all()
            .iter()
            .copied()
            .find(|c| c.key().eq_ignore_ascii_case(key))
    }
}

pub trait TableRow {
    type Column: TableColumn;
    fn cell(&self, column: Self::Column) -> Cell;
    fn is_significant(&self) -> bool;
}

// ─── Delta table ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeltaColumn {
    Category,
    Delta,
    CiLow,
    CiHigh,
    PValue,
    QValue,
    CliffsDelta,
    Significant,
    NBase,
    NCategory,
    SdBase,
    SdCategory,
    MeanBase,
    MeanCategory,
}

impl TableColumn for DeltaColumn {
    fn all() -> &'static [Self] {
        use DeltaColumn::*;
        &[
            Category, Delta, CiLow, CiHigh, PValue, QValue, CliffsDelta, Significant, NBase,
            NCategory, SdBase, SdCategory, MeanBase, MeanCategory,
        ]
    }

    fn header(self) -> &'static str {
        match self {
            DeltaColumn::Category => "Category",
            DeltaColumn::Delta => "Delta",
            DeltaColumn::CiLow => "CI low",
            DeltaColumn::CiHigh => "CI high",
            DeltaColumn::PValue => "p",
            DeltaColumn::QValue => "q (FDR)",
            DeltaColumn::CliffsDelta => "Cliff's delta",
            DeltaColumn::Significant => "Significant",
            DeltaColumn::NBase => "n base",
            DeltaColumn::NCategory => "n category",
            DeltaColumn::SdBase => "sd base",
            DeltaColumn::SdCategory => "sd category",
            DeltaColumn::MeanBase => "mean base",
            DeltaColumn::MeanCategory => "mean category",
        }
    }

    fn key(self) -> &'static str {
        match self {
            DeltaColumn::Category => "category",
            DeltaColumn::Delta => "delta",
            DeltaColumn::CiLow => "ci_low",
            DeltaColumn::CiHigh => "ci_high",
            DeltaColumn::PValue => "p",
            DeltaColumn::QValue => "q",
            DeltaColumn::CliffsDelta => "cliffs_delta",
            DeltaColumn::Significant => "significant",
            DeltaColumn::NBase => "n_base",
            DeltaColumn::NCategory => "n_category",
            DeltaColumn::SdBase => "sd_base",
            DeltaColumn::SdCategory => "sd_category",
            DeltaColumn::MeanBase => "mean_base",
            DeltaColumn::MeanCategory => "mean_category",
        }
    }

    fn is_numeric(self) -> bool {
        !matches!(self, DeltaColumn::Category | DeltaColumn::Significant)
    }

    fn default_visible(self) -> bool {
        !matches!(
            self,
            DeltaColumn::SdBase | DeltaColumn::SdCategory | DeltaColumn::MeanBase | DeltaColumn::MeanCategory
        )
    }
}

impl TableRow for DeltaRow {
    type Column = DeltaColumn;

    fn cell(&self, column: DeltaColumn) -> Cell {
        match column {
            DeltaColumn::Category => Cell::Text(self.category.clone()),
            DeltaColumn::Delta => Cell::Signed(self.delta),
            DeltaColumn::CiLow => Cell::Num(self.ci_low),
            DeltaColumn::CiHigh => Cell::Num(self.ci_high),
            DeltaColumn::PValue => Cell::PValue(self.p_value),
            DeltaColumn::QValue => Cell::PValue(self.q_value),
            DeltaColumn::CliffsDelta => Cell::Num(self.cliffs_delta),
            DeltaColumn::Significant => Cell::Flag(self.significant),
            DeltaColumn::NBase => Cell::Count(self.n_base),
            DeltaColumn::NCategory => Cell::Count(self.n_category),
            DeltaColumn::SdBase => Cell::Num(self.sd_base),
            DeltaColumn::SdCategory => Cell::Num(self.sd_category),
            DeltaColumn::MeanBase => Cell::Num(self.mean_base),
            DeltaColumn::MeanCategory => Cell::Num(self.mean_category),
        }
    }

    fn is_significant(&self) -> bool {
        self.significant.unwrap_or(false)
    }
}

// ─── Kruskal-Wallis table ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KruskalColumn {
    Attribute,
    H,
    PValue,
    EtaSquared,
    Groups,
    N,
    Significant,
    EffectSize,
}

impl TableColumn for KruskalColumn {
    fn all() -> &'static [Self] {
        use KruskalColumn::*;
        &[Attribute, H, PValue, EtaSquared, Groups, N, Significant, EffectSize]
    }

    fn header(self) -> &'static str {
        match self {
            KruskalColumn::Attribute => "Attribute",
            KruskalColumn::H => "H",
            KruskalColumn::PValue => "p",
            KruskalColumn::EtaSquared => "eta²",
            KruskalColumn::Groups => "Groups",
            KruskalColumn::N => "N",
            KruskalColumn::Significant => "Significant",
            KruskalColumn::EffectSize => "Effect size",
        }
    }

    fn key(self) -> &'static str {
        match self {
            KruskalColumn::Attribute => "attribute",
            KruskalColumn::H => "h",
            KruskalColumn::PValue => "p",
            KruskalColumn::EtaSquared => "eta_squared",
            KruskalColumn::Groups => "groups",
            KruskalColumn::N => "n",
            KruskalColumn::Significant => "significant",
            KruskalColumn::EffectSize => "effect_size",
        }
    }

    fn is_numeric(self) -> bool {
        !matches!(
            self,
            KruskalColumn::Attribute | KruskalColumn::Significant | KruskalColumn::EffectSize
        )
    }
}

impl TableRow for KruskalRow {
    type Column = KruskalColumn;

    fn cell(&self, column: KruskalColumn) -> Cell {
        match column {
            KruskalColumn::Attribute => Cell::Text(self.attribute.clone()),
            KruskalColumn::H => Cell::Num(self.h),
            KruskalColumn::PValue => Cell::PValue(self.p_value),
            KruskalColumn::EtaSquared => Cell::Num(self.eta_squared),
            KruskalColumn::Groups => Cell::Count(self.groups),
            KruskalColumn::N => Cell::Count(self.n),
            KruskalColumn::Significant => Cell::Flag(self.significant),
            KruskalColumn::EffectSize => Cell::Text(self.effect_size.clone().unwrap_or_else(|| {
                crate::grading::EffectSize::from_eta_squared(self.eta_squared)
                    .map(|e| e.label().to_string())
                    .unwrap_or_default()
            })),
        }
    }

    fn is_significant(&self) -> bool {
        self.significant.unwrap_or(false)
    }
}

// ─── Column visibility ───────────────────────────────────────────────────────

/// User-toggleable visible columns, always kept in canonical order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSelection<C: TableColumn> {
    visible: Vec<C>,
}

impl<C: TableColumn> ColumnSelection<C> {
    pub fn defaults() -> Self {
        Self {
            visible: C::all().iter().copied().filter(|c| c.default_visible()).collect(),
        }
    }

    pub fn everything() -> Self {
        Self {
            visible: C::all().to_vec(),
        }
    }

    /// Parses a comma-separated key list; unknown keys are reported back.
    pub fn parse(list: &str) -> Result<Self, String> {
        let mut chosen = Vec::new();
        for key in list.split(',').map(str::trim).filter(|k| !k.is_empty()) {
            match C::from_key(key) {
                Some(c) => chosen.push(c),
                None => {
                    let known: Vec<&str> = C::all().iter().map(|c| c.key()).collect();
                    return Err(format!("unknown column '{}' (expected one of: {})", key, known.join(", ")));
                }
            }
        }
        Ok(Self {
            visible: C::all().iter().copied().filter(|c| chosen.contains(c)).collect(),
        })
    }

    pub fn toggle(&mut self, column: C) {
        if self.visible.contains(&column) {
            self.visible.retain(|c| *c != column);
        } else {
            self.visible = C::all()
                .iter()
                .copied()
                .filter(|c| *c == column || self.visible.contains(c))
                .collect();
        }
    }

    pub fn is_visible(&self, column: C) -> bool {
        self.visible.contains(&column)
    }

    pub fn columns(&self) -> &[C] {
        &self.visible
    }
}

// ─── Sorting & filtering ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Stable sort on one column; rows with a missing cell always go last.
pub fn sort_rows<R: TableRow>(rows: &mut [R], column: R::Column, direction: SortDirection) {
    rows.sort_by(|a, b| {
        let (ca, cb) = (a.cell(column), b.cell(column));
        match (ca.is_missing(), cb.is_missing()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ord = ca.compare(&cb);
                match direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            }
        }
    });
}

pub fn significant_only<R: TableRow + Clone>(rows: &[R]) -> Vec<R> {
    rows.iter().filter(|r| r.is_significant()).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: &str, delta: Option<f64>, significant: Option<bool>) -> DeltaRow {
        DeltaRow {
            category: category.into(),
            delta,
            significant,
            ..Default::default()
        }
    }

    #[test]
    fn test_sort_puts_missing_last_both_directions() {
        let mut rows = vec![
            row("a", Some(0.2), None),
            row("b", None, None),
            row("c", Some(-0.1), None),
            row("d", Some(0.5), None),
        ];
        sort_rows(&mut rows, DeltaColumn::Delta, SortDirection::Ascending);
        let order: Vec<_> = rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "d", "b"]);

        sort_rows(&mut rows, DeltaColumn::Delta, SortDirection::Descending);
        let order: Vec<_> = rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(order, vec!["d", "a", "c", "b"]);

        sort_rows(&mut rows, DeltaColumn::Category, SortDirection::Ascending);
        let order: Vec<_> = rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_significant_filter() {
        let rows = vec![
            row("a", Some(0.2), Some(true)),
            row("b", None, None),
            row("c", Some(0.1), Some(false)),
        ];
        let sig = significant_only(&rows);
        assert_eq!(sig.len(), 1);
        assert_eq!(sig[0].category, "a");
    }

    #[test]
    fn test_column_selection_keeps_canonical_order() {
        let mut cols = ColumnSelection::<DeltaColumn>::parse("p, category,delta").unwrap();
        assert_eq!(
            cols.columns(),
            &[DeltaColumn::Category, DeltaColumn::Delta, DeltaColumn::PValue]
        );
        cols.toggle(DeltaColumn::CiLow);
        assert_eq!(
            cols.columns(),
            &[DeltaColumn::Category, DeltaColumn::Delta, DeltaColumn::CiLow, DeltaColumn::PValue]
        );
        cols.toggle(DeltaColumn::Delta);
        assert!(!cols.is_visible(DeltaColumn::Delta));
        assert!(ColumnSelection::<DeltaColumn>::parse("nope").is_err());
    }

    #[test]
    fn test_default_columns_hide_sample_details() {
        let cols = ColumnSelection::<DeltaColumn>::defaults();
        assert!(cols.is_visible(DeltaColumn::QValue));
        assert!(!cols.is_visible(DeltaColumn::SdBase));
        assert_eq!(ColumnSelection::<KruskalColumn>::everything().columns().len(), 8);
    }

    #[test]
    fn test_cell_rendering() {
        assert_eq!(Cell::PValue(Some(0.00002)).export(), "2.000e-5");
        assert_eq!(Cell::PValue(Some(0.00002)).display(), "<0.001");
        assert_eq!(Cell::Num(None).export(), "");
        assert_eq!(Cell::Num(None).display(), format::GAP);
        assert_eq!(Cell::Signed(Some(0.25)).display(), "+0.250");
        assert_eq!(Cell::Count(Some(12)).export(), "12");
    }

    #[test]
    fn test_kruskal_effect_size_falls_back_to_eta() {
        let row = KruskalRow {
            attribute: "gender".into(),
            eta_squared: Some(0.2),
            ..Default::default()
        };
        assert_eq!(row.cell(KruskalColumn::EffectSize), Cell::Text("large".into()));
    }
}
