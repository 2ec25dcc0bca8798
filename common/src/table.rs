//! 汎用テーブルエンジン
//!
//! 行とカラム定義から、ソート・ページングされた表示用ビューを導出する。
//! - ソートは 昇順 → 降順 → なし の3状態を巡回
//! - 空値（`CellValue::Null`）は方向に関係なく常に末尾
//! - サーバページングでは渡された行をそのまま並べ、ページ移動は呼び出し側に任せる
//! - 固定行・固定列はレイアウト情報のみで、並び順には影響しない

use crate::models::EntityId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// ============================================
// ソート
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
    #[default]
    None,
}

impl SortDirection {
    /// 同じカラムを再度選択したときの次の状態
    pub fn next(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::None,
            SortDirection::None => SortDirection::Ascending,
        }
    }

    pub fn indicator(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
            SortDirection::None => "",
        }
    }
}

/// アクティブなソートキーは常に高々1つ
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: String,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn new(key: &str, direction: SortDirection) -> Self {
        Self {
            key: key.to_string(),
            direction,
        }
    }

    /// カラムヘッダのクリック
    pub fn toggle(&mut self, key: &str) {
        if self.key == key {
            self.direction = self.direction.next();
        } else {
            self.key = key.to_string();
            self.direction = SortDirection::Ascending;
        }
    }

    pub fn is_active(&self) -> bool {
        !self.key.is_empty() && self.direction != SortDirection::None
    }

    pub fn direction_for(&self, key: &str) -> SortDirection {
        if self.key == key {
            self.direction
        } else {
            SortDirection::None
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ============================================
// セル値
// ============================================

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    Status { code: String, label: String },
    Contact { email: String, phone: String },
    List(Vec<String>),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn opt_text(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => CellValue::Text(v.to_string()),
            _ => CellValue::Null,
        }
    }

    pub fn opt_number<N: Into<f64>>(value: Option<N>) -> Self {
        value.map_or(CellValue::Null, |n| CellValue::Number(n.into()))
    }

    pub fn opt_date(value: Option<NaiveDate>) -> Self {
        value.map_or(CellValue::Null, CellValue::Date)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// プレーンテキスト表示
    pub fn display(&self) -> String {
        match self {
            CellValue::Null => "-".into(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            CellValue::Number(n) => format!("{:.2}", n),
            CellValue::Bool(true) => "✔".into(),
            CellValue::Bool(false) => "-".into(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::Status { label, .. } => label.clone(),
            CellValue::Contact { email, phone } => match (email.is_empty(), phone.is_empty()) {
                (false, false) => format!("{} / {}", email, phone),
                (false, true) => email.clone(),
                (true, false) => phone.clone(),
                (true, true) => "-".into(),
            },
            CellValue::List(items) if items.is_empty() => "-".into(),
            CellValue::List(items) => items.join(", "),
        }
    }

    fn sort_text(&self) -> String {
        match self {
            CellValue::Status { code, .. } => code.to_lowercase(),
            CellValue::Contact { email, phone } => format!("{} {}", email, phone).to_lowercase(),
            CellValue::List(items) => items.join(" ").to_lowercase(),
            other => other.display().to_lowercase(),
        }
    }

    /// 非空値同士の比較（文字列は大文字小文字を区別しない）
    fn compare(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Number(a), CellValue::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (CellValue::Date(a), CellValue::Date(b)) => a.cmp(b),
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (a, b) => a.sort_text().cmp(&b.sort_text()),
        }
    }
}

/// テーブルに表示できる行
pub trait TableRow {
    fn row_id(&self) -> EntityId;
    fn cell(&self, key: &str) -> CellValue;
}

/// 行の並べ替え（安定ソート、方向なしなら元の順序）
pub fn sort_rows<'a, R: TableRow>(rows: &'a [R], sort: &SortConfig) -> Vec<&'a R> {
    let mut sorted: Vec<&R> = rows.iter().collect();
    if !sort.is_active() {
        return sorted;
    }

    let descending = sort.direction == SortDirection::Descending;
    sorted.sort_by(|a, b| {
        let (va, vb) = (a.cell(&sort.key), b.cell(&sort.key));
        match (va.is_null(), vb.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) if descending => vb.compare(&va),
            (false, false) => va.compare(&vb),
        }
    });
    sorted
}

// ============================================
// カラム
// ============================================

/// セル描画の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renderer {
    Text,
    StatusTag,
    ContactTuple,
    ActionCluster,
    NestedList,
}

impl Renderer {
    /// カラムキーの命名規約から描画方法を決める
    pub fn for_key(key: &str) -> Self {
        match key {
            "status" => Renderer::StatusTag,
            "contact" => Renderer::ContactTuple,
            "actions" => Renderer::ActionCluster,
            "vaccinations" => Renderer::NestedList,
            k if k.ends_with("_list") => Renderer::NestedList,
            _ => Renderer::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub key: String,
    pub label: String,
    pub renderer: Renderer,
    pub sortable: bool,
}

impl Column {
    pub fn new(key: &str, label: &str) -> Self {
        let renderer = Renderer::for_key(key);
        Self {
            key: key.to_string(),
            label: label.to_string(),
            renderer,
            sortable: renderer != Renderer::ActionCluster,
        }
    }

    pub fn actions(label: &str) -> Self {
        Self::new("actions", label)
    }
}

/// 行ごとの操作ボタン
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowAction {
    View,
    Edit,
    Delete,
}

impl RowAction {
    pub const ALL: [RowAction; 3] = [RowAction::View, RowAction::Edit, RowAction::Delete];

    pub fn label(&self) -> &'static str {
        match self {
            RowAction::View => "詳細",
            RowAction::Edit => "編集",
            RowAction::Delete => "削除",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            RowAction::View => "action-view",
            RowAction::Edit => "action-edit",
            RowAction::Delete => "action-delete",
        }
    }
}

// ============================================
// ページング
// ============================================

#[derive(Debug, Clone, PartialEq)]
pub enum Pagination {
    /// 現在ページの行だけを持っている（totalはサーバが権威）
    Server {
        total: Option<u64>,
        page: u32,
        page_size: u32,
    },
    /// 全行がメモリ上にある
    Client { page: u32, page_size: u32 },
}

/// 表示用ビュー
#[derive(Debug)]
pub struct TableView<'a, R> {
    pub rows: Vec<&'a R>,
    pub page: u32,
    pub page_count: u32,
    pub total: u64,
}

pub fn page_count(total: u64, page_size: u32) -> u32 {
    let size = u64::from(page_size.max(1));
    (total.div_ceil(size)).max(1) as u32
}

/// 1始まりのページで切り出す
pub fn paginate<T>(items: Vec<T>, page: u32, page_size: u32) -> Vec<T> {
    let size = page_size.max(1) as usize;
    let start = (page.max(1) as usize - 1).saturating_mul(size);
    items.into_iter().skip(start).take(size).collect()
}

pub fn build_view<'a, R: TableRow>(
    rows: &'a [R],
    sort: &SortConfig,
    pagination: &Pagination,
) -> TableView<'a, R> {
    let sorted = sort_rows(rows, sort);
    match *pagination {
        Pagination::Server { total, page, page_size } => {
            let total = total.unwrap_or(rows.len() as u64);
            TableView {
                rows: sorted,
                page: page.max(1),
                page_count: page_count(total, page_size),
                total,
            }
        }
        Pagination::Client { page, page_size } => {
            let total = rows.len() as u64;
            let count = page_count(total, page_size);
            let page = page.clamp(1, count);
            TableView {
                rows: paginate(sorted, page, page_size),
                page,
                page_count: count,
                total,
            }
        }
    }
}

// ============================================
// 固定行・固定列
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEdge {
    Leading,
    Trailing,
}

/// 固定行・固定列の配置
#[derive(Debug, Clone, Default)]
pub struct PinnedLayout {
    column_count: usize,
    fixed_columns: Vec<usize>,
    fixed_rows: Vec<usize>,
}

impl PinnedLayout {
    pub fn new(column_count: usize) -> Self {
        Self {
            column_count,
            ..Default::default()
        }
    }

    pub fn with_fixed_columns(mut self, columns: &[usize]) -> Self {
        self.fixed_columns = columns
            .iter()
            .copied()
            .filter(|&c| c < self.column_count)
            .collect();
        self
    }

    pub fn with_fixed_rows(mut self, rows: &[usize]) -> Self {
        self.fixed_rows = rows.to_vec();
        self
    }

    /// 前半の固定列は先頭側、後半の固定列は末尾側に張り付く
    pub fn column_pin(&self, index: usize) -> Option<PinEdge> {
        if !self.fixed_columns.contains(&index) {
            return None;
        }
        if index * 2 < self.column_count {
            Some(PinEdge::Leading)
        } else {
            Some(PinEdge::Trailing)
        }
    }

    pub fn is_row_pinned(&self, index: usize) -> bool {
        self.fixed_rows.contains(&index)
    }

    /// 同じ端に固定された手前の列幅の合計（sticky の offset 用）
    pub fn column_offset(&self, index: usize, widths: &[u32]) -> u32 {
        let Some(edge) = self.column_pin(index) else {
            return 0;
        };
        let width = |i: usize| widths.get(i).copied().unwrap_or(0);
        match edge {
            PinEdge::Leading => (0..index)
                .filter(|&i| self.column_pin(i) == Some(PinEdge::Leading))
                .map(width)
                .sum(),
            PinEdge::Trailing => (index + 1..self.column_count)
                .filter(|&i| self.column_pin(i) == Some(PinEdge::Trailing))
                .map(width)
                .sum(),
        }
    }

    /// CSS の sticky 指定
    pub fn column_style(&self, index: usize, widths: &[u32]) -> Option<String> {
        let offset = self.column_offset(index, widths);
        self.column_pin(index).map(|edge| match edge {
            PinEdge::Leading => format!("position: sticky; left: {}px; z-index: 2;", offset),
            PinEdge::Trailing => format!("position: sticky; right: {}px; z-index: 2;", offset),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Row {
        id: EntityId,
        name: &'static str,
        weight: Option<f64>,
    }

    impl TableRow for Row {
        fn row_id(&self) -> EntityId {
            self.id
        }

        fn cell(&self, key: &str) -> CellValue {
            match key {
                "name" => CellValue::text(self.name),
                "weight" => CellValue::opt_number(self.weight),
                _ => CellValue::Null,
            }
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { id: 1, name: "pochi", weight: Some(8.5) },
            Row { id: 2, name: "Tama", weight: None },
            Row { id: 3, name: "alice", weight: Some(12.0) },
            Row { id: 4, name: "Bob", weight: Some(3.2) },
        ]
    }

    fn ids(view: &[&Row]) -> Vec<EntityId> {
        view.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_toggle_cycles_three_states() {
        let mut sort = SortConfig::default();
        sort.toggle("name");
        assert_eq!(sort.direction, SortDirection::Ascending);
        sort.toggle("name");
        assert_eq!(sort.direction, SortDirection::Descending);
        sort.toggle("name");
        assert_eq!(sort.direction, SortDirection::None);
        sort.toggle("name");
        assert_eq!(sort.direction, SortDirection::Ascending);
    }

    #[test]
    fn test_new_key_resets_to_ascending() {
        let mut sort = SortConfig::new("name", SortDirection::Descending);
        sort.toggle("weight");
        assert_eq!(sort, SortConfig::new("weight", SortDirection::Ascending));
        assert_eq!(sort.direction_for("name"), SortDirection::None);
    }

    #[test]
    fn test_three_clicks_restore_original_order() {
        let data = rows();
        let original = ids(&sort_rows(&data, &SortConfig::default()));
        let mut sort = SortConfig::default();
        for _ in 0..3 {
            sort.toggle("name");
        }
        assert_eq!(ids(&sort_rows(&data, &sort)), original);
    }

    #[test]
    fn test_string_sort_is_case_insensitive() {
        let data = rows();
        let sort = SortConfig::new("name", SortDirection::Ascending);
        assert_eq!(ids(&sort_rows(&data, &sort)), vec![3, 4, 1, 2]);
    }

    #[test]
    fn test_nulls_last_in_both_directions() {
        let data = rows();
        let asc = SortConfig::new("weight", SortDirection::Ascending);
        assert_eq!(ids(&sort_rows(&data, &asc)), vec![4, 1, 3, 2]);

        let desc = SortConfig::new("weight", SortDirection::Descending);
        assert_eq!(ids(&sort_rows(&data, &desc)), vec![3, 1, 4, 2]);
    }

    #[test]
    fn test_numbers_compare_numerically() {
        let a = CellValue::Number(9.0);
        let b = CellValue::Number(10.0);
        assert_eq!(a.compare(&b), Ordering::Less);
    }

    #[test]
    fn test_client_pagination_slices_and_clamps() {
        let data = rows();
        let view = build_view(
            &data,
            &SortConfig::default(),
            &Pagination::Client { page: 9, page_size: 3 },
        );
        assert_eq!(view.page, 2);
        assert_eq!(view.page_count, 2);
        assert_eq!(view.total, 4);
        assert_eq!(ids(&view.rows), vec![4]);
    }

    #[test]
    fn test_server_pagination_renders_rows_as_given() {
        let data = rows();
        let view = build_view(
            &data,
            &SortConfig::default(),
            &Pagination::Server { total: Some(25), page: 3, page_size: 10 },
        );
        assert_eq!(view.rows.len(), 4);
        assert_eq!(view.page, 3);
        assert_eq!(view.page_count, 3);
        assert_eq!(view.total, 25);
    }

    #[test]
    fn test_page_count_never_zero() {
        assert_eq!(page_count(0, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(5, 0), 5);
    }

    #[test]
    fn test_renderer_by_key() {
        assert_eq!(Renderer::for_key("status"), Renderer::StatusTag);
        assert_eq!(Renderer::for_key("contact"), Renderer::ContactTuple);
        assert_eq!(Renderer::for_key("actions"), Renderer::ActionCluster);
        assert_eq!(Renderer::for_key("vaccinations"), Renderer::NestedList);
        assert_eq!(Renderer::for_key("tag_list"), Renderer::NestedList);
        assert_eq!(Renderer::for_key("name"), Renderer::Text);
        assert!(!Column::actions("操作").sortable);
    }

    #[test]
    fn test_pinned_columns_split_by_half() {
        let layout = PinnedLayout::new(6).with_fixed_columns(&[0, 1, 5, 9]);
        assert_eq!(layout.column_pin(0), Some(PinEdge::Leading));
        assert_eq!(layout.column_pin(1), Some(PinEdge::Leading));
        assert_eq!(layout.column_pin(2), None);
        assert_eq!(layout.column_pin(5), Some(PinEdge::Trailing));
        assert_eq!(layout.column_pin(9), None);

        let widths = [80, 120, 100, 100, 100, 60];
        assert_eq!(layout.column_offset(0, &widths), 0);
        assert_eq!(layout.column_offset(1, &widths), 80);
        assert_eq!(layout.column_offset(5, &widths), 0);
        assert!(layout.column_style(1, &widths).unwrap().contains("left: 80px"));
    }

    #[test]
    fn test_pinning_does_not_change_data_order() {
        let data = rows();
        let sort = SortConfig::new("name", SortDirection::Ascending);
        let _layout = PinnedLayout::new(2).with_fixed_columns(&[0]).with_fixed_rows(&[0]);
        assert_eq!(ids(&sort_rows(&data, &sort)), vec![3, 4, 1, 2]);
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Null.display(), "-");
        assert_eq!(CellValue::Number(3.0).display(), "3");
        assert_eq!(CellValue::Number(3.25).display(), "3.25");
        assert_eq!(
            CellValue::Contact { email: "a@b.jp".into(), phone: "".into() }.display(),
            "a@b.jp"
        );
        assert_eq!(CellValue::List(vec!["狂犬病".into(), "混合".into()]).display(), "狂犬病, 混合");
    }
}
