//! 汎用データテーブル
//!
//! カラム定義の描画種別ごとにセルを描き分ける。
//! ヘッダクリックでソートを切り替え、固定列は sticky で張り付ける。

use crate::app::use_revision;
use leptos::prelude::*;
use petcare_common::table::{CellValue, PinnedLayout, Renderer};
use petcare_common::{Column, Entity, ListView, RowAction, TableRow};

/// sticky の offset 計算に使う列幅
fn column_width(column: &Column) -> u32 {
    match column.renderer {
        Renderer::ActionCluster => 180,
        _ if column.key == "id" => 64,
        _ => 160,
    }
}

#[component]
pub fn DataTable<E, F>(
    list: ListView<E>,
    columns: Vec<Column>,
    #[prop(optional)] fixed_columns: Vec<usize>,
    on_action: F,
) -> impl IntoView
where
    E: Entity + TableRow,
    F: Fn(RowAction, E) + 'static + Clone + Send + Sync,
{
    let revision = use_revision();
    let layout = PinnedLayout::new(columns.len()).with_fixed_columns(&fixed_columns);
    let widths: Vec<u32> = columns.iter().map(column_width).collect();
    let styles: Vec<String> = (0..columns.len())
        .map(|i| layout.column_style(i, &widths).unwrap_or_default())
        .collect();

    let header = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let key = column.key.clone();
            let sortable = column.sortable;
            let indicator = {
                let list = list.clone();
                let key = key.clone();
                move || {
                    revision.track();
                    list.sort().direction_for(&key).indicator()
                }
            };
            let list = list.clone();
            view! {
                <th
                    style=styles[i].clone()
                    class:sortable=sortable
                    on:click=move |_| {
                        if sortable {
                            list.toggle_sort(&key);
                        }
                    }
                >
                    {column.label.clone()}
                    <span class="sort-indicator">{indicator}</span>
                </th>
            }
        })
        .collect_view();

    let is_loading = {
        let list = list.clone();
        move || {
            revision.track();
            list.store().is_loading()
        }
    };

    let column_count = columns.len();
    let body = move || {
        revision.track();
        let rows = list.display().rows;
        if rows.is_empty() {
            return view! {
                <tr>
                    <td class="empty" colspan=column_count.to_string()>"該当するデータがありません"</td>
                </tr>
            }
            .into_any();
        }
        rows.into_iter()
            .map(|row| {
                let cells = columns
                    .iter()
                    .enumerate()
                    .map(|(i, column)| {
                        let cell = render_cell(column, &row, on_action.clone());
                        view! { <td style=styles[i].clone()>{cell}</td> }
                    })
                    .collect_view();
                view! { <tr>{cells}</tr> }
            })
            .collect_view()
            .into_any()
    };

    view! {
        <div class="table-wrapper" class:loading=is_loading>
            <table class="data-table">
                <thead>
                    <tr>{header}</tr>
                </thead>
                <tbody>{body}</tbody>
            </table>
        </div>
    }
}

fn render_cell<E, F>(column: &Column, row: &E, on_action: F) -> AnyView
where
    E: Entity + TableRow,
    F: Fn(RowAction, E) + 'static + Clone + Send + Sync,
{
    if column.renderer == Renderer::ActionCluster {
        return RowAction::ALL
            .into_iter()
            .map(|action| {
                let on_action = on_action.clone();
                let row = row.clone();
                view! {
                    <button
                        class=format!("btn btn-small {}", action.css_class())
                        on:click=move |_| on_action(action, row.clone())
                    >
                        {action.label()}
                    </button>
                }
            })
            .collect_view()
            .into_any();
    }

    match (column.renderer, row.cell(&column.key)) {
        (Renderer::StatusTag, CellValue::Status { code, label }) => view! {
            <span class=format!("status-tag status-{}", code)>{label}</span>
        }
        .into_any(),
        (Renderer::ContactTuple, CellValue::Contact { email, phone }) => view! {
            <div class="contact">
                <div>{email}</div>
                <div class="text-muted">{phone}</div>
            </div>
        }
        .into_any(),
        (Renderer::NestedList, CellValue::List(items)) if !items.is_empty() => view! {
            <ul class="nested-list">
                {items.into_iter().map(|item| view! { <li>{item}</li> }).collect_view()}
            </ul>
        }
        .into_any(),
        (_, value) => value.display().into_any(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pinned_offsets_for_id_and_actions() {
        let mut columns = petcare_common::models::client_columns();
        columns.push(Column::actions("操作"));
        let widths: Vec<u32> = columns.iter().map(column_width).collect();
        let last = columns.len() - 1;
        let layout = PinnedLayout::new(columns.len()).with_fixed_columns(&[0, last]);

        assert_eq!(widths[0], 64);
        assert_eq!(widths[last], 180);
        assert_eq!(
            layout.column_style(0, &widths).as_deref(),
            Some("position: sticky; left: 0px; z-index: 2;")
        );
        assert_eq!(
            layout.column_style(last, &widths).as_deref(),
            Some("position: sticky; right: 0px; z-index: 2;")
        );
        assert!(layout.column_style(1, &widths).is_none());
    }
}
