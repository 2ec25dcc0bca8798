//! 検索とページングの合成
//!
//! 検索語が空ならサーバページング（`items` と `total` をそのまま使う）、
//! 空でなければ全件（`all_items`）を絞り込んでクライアント側でページングする。

use crate::models::Entity;
use crate::store::StoreSnapshot;
use crate::table::{build_view, Pagination, SortConfig, TableRow};

/// 検索中の固定ページサイズ
pub const SEARCH_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ListMode {
    #[default]
    Paged,
    /// 正規化済み（前後空白除去・小文字化）の検索語
    Search(String),
}

impl ListMode {
    pub fn from_term(term: &str) -> Self {
        let needle = normalize_term(term);
        if needle.is_empty() {
            ListMode::Paged
        } else {
            ListMode::Search(needle)
        }
    }

    pub fn is_search(&self) -> bool {
        matches!(self, ListMode::Search(_))
    }
}

pub fn normalize_term(term: &str) -> String {
    term.trim().to_lowercase()
}

/// 検索語を含むエンティティだけを元の順序で返す
pub fn filter_items<E: Entity>(items: &[E], term: &str) -> Vec<E> {
    let needle = normalize_term(term);
    if needle.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| item.matches(&needle))
        .cloned()
        .collect()
}

/// 画面に出す1ページ分
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayPage<E> {
    pub rows: Vec<E>,
    pub page: u32,
    pub page_count: u32,
    pub total: u64,
    pub searching: bool,
}

/// ストアの状態と表示条件から表示ページを導出する
///
/// `page` は検索中のみ使う（サーバページングではストアのページが正）。
pub fn derive_page<E: Entity + TableRow>(
    mode: &ListMode,
    snapshot: &StoreSnapshot<E>,
    sort: &SortConfig,
    page: u32,
) -> DisplayPage<E> {
    match mode {
        ListMode::Paged => {
            let view = build_view(
                &snapshot.items,
                sort,
                &Pagination::Server {
                    total: snapshot.total,
                    page: snapshot.page,
                    page_size: snapshot.page_size,
                },
            );
            DisplayPage {
                rows: view.rows.into_iter().cloned().collect(),
                page: view.page,
                page_count: view.page_count,
                total: view.total,
                searching: false,
            }
        }
        ListMode::Search(needle) => {
            let matched = filter_items(&snapshot.all_items, needle);
            let view = build_view(
                &matched,
                sort,
                &Pagination::Client {
                    page,
                    page_size: SEARCH_PAGE_SIZE,
                },
            );
            DisplayPage {
                rows: view.rows.into_iter().cloned().collect(),
                page: view.page,
                page_count: view.page_count,
                total: view.total,
                searching: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Client;
    use crate::table::SortDirection;
    use crate::testing::client_json;

    fn client(id: i64, first: &str, last: &str) -> Client {
        serde_json::from_value(client_json(id, first, last)).unwrap()
    }

    fn snapshot(items: Vec<Client>, all_items: Vec<Client>, total: Option<u64>) -> StoreSnapshot<Client> {
        StoreSnapshot {
            items,
            all_items,
            total,
            page: 2,
            page_size: 10,
            current: None,
            error: None,
            is_loading: false,
        }
    }

    #[test]
    fn test_mode_from_term() {
        assert_eq!(ListMode::from_term("   "), ListMode::Paged);
        assert_eq!(ListMode::from_term(" Yamada "), ListMode::Search("yamada".into()));
    }

    #[test]
    fn test_filter_is_case_insensitive_and_keeps_order() {
        let items = vec![
            client(1, "Taro", "Yamada"),
            client(2, "Hanako", "Sato"),
            client(3, "Jiro", "YAMADA"),
        ];
        let found = filter_items(&items, "yaMAda");
        assert_eq!(found.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_empty_search_reproduces_server_view() {
        let items = vec![client(11, "A", "X"), client(12, "B", "Y")];
        let snap = snapshot(items.clone(), vec![], Some(25));

        let page = derive_page(&ListMode::from_term(""), &snap, &SortConfig::default(), 1);

        assert_eq!(page.rows, items);
        assert_eq!(page.page, 2);
        assert_eq!(page.page_count, 3);
        assert_eq!(page.total, 25);
        assert!(!page.searching);
    }

    #[test]
    fn test_search_paginates_locally_with_fixed_size() {
        let all: Vec<Client> = (1..=23).map(|i| client(i, &format!("Pochi{}", i), "Owner")).collect();
        let snap = snapshot(vec![], all, Some(23));
        let mode = ListMode::from_term("owner");

        let page = derive_page(&mode, &snap, &SortConfig::default(), 3);

        assert!(page.searching);
        assert_eq!(page.total, 23);
        assert_eq!(page.page_count, 3);
        assert_eq!(page.rows.len(), 3);
        assert_eq!(page.rows[0].id, 21);
    }

    #[test]
    fn test_search_sorts_before_paging() {
        let all = vec![
            client(1, "Charlie", "Owner"),
            client(2, "alice", "Owner"),
            client(3, "Bob", "Owner"),
        ];
        let snap = snapshot(vec![], all, None);
        let sort = SortConfig::new("first_name", SortDirection::Ascending);

        let page = derive_page(&ListMode::from_term("owner"), &snap, &sort, 1);

        assert_eq!(page.rows.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 3, 1]);
    }

    #[test]
    fn test_search_page_is_clamped() {
        let snap = snapshot(vec![], vec![client(1, "Taro", "Yamada")], None);

        let page = derive_page(&ListMode::from_term("taro"), &snap, &SortConfig::default(), 9);

        assert_eq!(page.page, 1);
        assert_eq!(page.rows.len(), 1);
    }
}
