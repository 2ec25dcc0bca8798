//! コンソール出力（テーブル・トースト）

use petcare_common::table::{Column, Renderer, TableRow};
use petcare_common::{DisplayPage, ToastQueue, ToastScheme};

/// 端末上の表示幅（全角は2）
pub fn display_width(text: &str) -> usize {
    text.chars().map(|c| if c.is_ascii() { 1 } else { 2 }).sum()
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(text));
    format!("{}{}", text, " ".repeat(fill))
}

/// 一覧をテキストの表にする（操作列は出さない）
pub fn render_table<R: TableRow>(columns: &[Column], rows: &[R]) -> String {
    let columns: Vec<&Column> = columns
        .iter()
        .filter(|c| c.renderer != Renderer::ActionCluster)
        .collect();

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|c| row.cell(&c.key).display()).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| display_width(&row[i]))
                .chain(std::iter::once(display_width(&column.label)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: Vec<String>| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(value, width)| pad(value, *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(line(columns.iter().map(|c| c.label.clone()).collect()));
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in cells {
        out.push(line(row));
    }
    out.join("\n")
}

pub fn page_footer<E>(page: &DisplayPage<E>) -> String {
    let mode = if page.searching { "検索結果" } else { "全体" };
    format!(
        "{} {}件 / {}ページ中 {}ページ目",
        mode, page.total, page.page_count, page.page
    )
}

/// キューに溜まったトーストを出力して空にする
pub fn flush_toasts(toasts: &ToastQueue) {
    for item in toasts.items() {
        let mark = match item.scheme {
            ToastScheme::Success => "✔",
            ToastScheme::Danger => "✖",
            ToastScheme::Warning => "⚠",
            ToastScheme::Primary => "•",
        };
        let lines = item.message.lines();
        match lines.as_slice() {
            [single] => println!("{} {}: {}", mark, item.title, single),
            many => {
                println!("{} {}", mark, item.title);
                for line in many {
                    println!("  - {}", line);
                }
            }
        }
    }
    toasts.clear();
}
