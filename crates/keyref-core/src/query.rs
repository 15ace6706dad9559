//! Multi-criteria filter and search over a shortcut collection.
//!
//! [`run_query`] applies, in order: category, OS availability, favorites
//! membership, text search, then a popularity sort. Every stage is a
//! conjunctive predicate, so the order only affects intermediate state.
//! Nothing here mutates its input.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use crate::types::{Os, ShortcutRecord};

/// Category value that disables the category stage.
pub const ALL_CATEGORIES: &str = "all";

/// Default size of the popular-shortcuts list.
pub const DEFAULT_POPULAR_LIMIT: usize = 10;

/// Filter criteria for [`run_query`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    pub search_text: String,
    /// `None` matches every category.
    pub category: Option<String>,
    /// Empty means no OS filtering; otherwise a record passes if it has keys
    /// for at least one of these.
    pub os: BTreeSet<Os>,
    pub favorites_only: bool,
    pub favorite_ids: BTreeSet<i64>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    /// Restrict to one category; [`ALL_CATEGORIES`] clears the restriction.
    pub fn category(mut self, category: &str) -> Self {
        self.category = (category != ALL_CATEGORIES).then(|| category.to_owned());
        self
    }

    pub fn os<I: IntoIterator<Item = Os>>(mut self, os: I) -> Self {
        self.os = os.into_iter().collect();
        self
    }

    pub fn favorites_only<I: IntoIterator<Item = i64>>(mut self, ids: I) -> Self {
        self.favorites_only = true;
        self.favorite_ids = ids.into_iter().collect();
        self
    }
}

/// Run the full filter pipeline and sort the survivors by popularity.
pub fn run_query<'a, I>(collection: I, filter: &QueryFilter) -> Vec<ShortcutRecord>
where
    I: IntoIterator<Item = &'a ShortcutRecord>,
{
    let term = normalized_term(&filter.search_text);

    let mut matched: Vec<ShortcutRecord> = collection
        .into_iter()
        .filter(|r| filter.category.as_deref().is_none_or(|c| r.category == c))
        .filter(|r| filter.os.is_empty() || filter.os.iter().any(|os| r.has_shortcut_for(*os)))
        .filter(|r| !filter.favorites_only || filter.favorite_ids.contains(&r.id))
        .filter(|r| term.as_deref().is_none_or(|t| matches_term(r, t)))
        .cloned()
        .collect();

    sort_by_popularity(&mut matched);
    matched
}

/// The search stage on its own. Input order is preserved and a blank query
/// matches everything.
pub fn search<'a, I>(collection: I, text: &str) -> Vec<ShortcutRecord>
where
    I: IntoIterator<Item = &'a ShortcutRecord>,
{
    let Some(term) = normalized_term(text) else {
        return collection.into_iter().cloned().collect();
    };
    collection
        .into_iter()
        .filter(|r| matches_term(r, &term))
        .cloned()
        .collect()
}

/// Highest popularity first; equal popularity falls back to ascending id.
pub fn sort_by_popularity(records: &mut [ShortcutRecord]) {
    records.sort_by_key(|r| (Reverse(r.popularity), r.id));
}

/// The `limit` most popular records.
pub fn top_popular<'a, I>(collection: I, limit: usize) -> Vec<ShortcutRecord>
where
    I: IntoIterator<Item = &'a ShortcutRecord>,
{
    let mut all: Vec<ShortcutRecord> = collection.into_iter().cloned().collect();
    sort_by_popularity(&mut all);
    all.truncate(limit);
    all
}

/// Records sharing a tool, in the order the tool first appears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolGroup {
    pub tool: String,
    pub shortcuts: Vec<ShortcutRecord>,
}

pub fn group_by_tool(records: Vec<ShortcutRecord>) -> Vec<ToolGroup> {
    let mut groups: Vec<ToolGroup> = Vec::new();
    for record in records {
        match groups.iter_mut().find(|g| g.tool == record.tool) {
            Some(group) => group.shortcuts.push(record),
            None => groups.push(ToolGroup {
                tool: record.tool.clone(),
                shortcuts: vec![record],
            }),
        }
    }
    groups
}

fn normalized_term(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

/// `term` must already be trimmed and lower-cased.
pub fn matches_term(record: &ShortcutRecord, term: &str) -> bool {
    let contains = |field: &str| field.to_lowercase().contains(term);

    contains(record.title.as_str())
        || contains(record.description.as_str())
        || contains(record.tool.as_str())
        || record.key_combinations().any(contains)
        || record.aliases.iter().any(|a| contains(a.as_str()))
        || record.tags.iter().any(|t| contains(t.as_str()))
        || matches_equivalence(record, term)
}

/// What a fixed query string is treated as matching.
#[derive(Debug, Clone, Copy)]
enum Equivalent {
    /// Case-insensitive substring of the Windows key combination.
    WindowsKeys(&'static str),
    /// Literal substring of the title.
    Title(&'static str),
}

/// Korean/English query equivalences. Deliberately a closed table.
const EQUIVALENCES: &[(&str, Equivalent)] = &[
    ("복사", Equivalent::WindowsKeys("ctrl+c")),
    ("copy", Equivalent::Title("복사")),
    ("붙여넣기", Equivalent::WindowsKeys("ctrl+v")),
    ("paste", Equivalent::Title("붙여넣기")),
    ("저장", Equivalent::WindowsKeys("ctrl+s")),
    ("save", Equivalent::Title("저장")),
];

fn matches_equivalence(record: &ShortcutRecord, term: &str) -> bool {
    EQUIVALENCES
        .iter()
        .filter(|(query, _)| *query == term)
        .any(|(_, equivalent)| match equivalent {
            Equivalent::WindowsKeys(keys) => record
                .windows_shortcut
                .as_deref()
                .is_some_and(|w| w.to_lowercase().contains(keys)),
            Equivalent::Title(fragment) => record.title.contains(fragment),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewShortcut;

    fn rec(id: i64, tool: &str, category: &str, title: &str, popularity: u32) -> ShortcutRecord {
        NewShortcut::new(tool, category, title, "")
            .with_popularity(popularity)
            .into_record(id)
    }

    fn ids(records: &[ShortcutRecord]) -> Vec<i64> {
        records.iter().map(|r| r.id).collect()
    }

    fn sample() -> Vec<ShortcutRecord> {
        let mut copy = rec(1, "Windows", "os", "복사", 100);
        copy.windows_shortcut = Some("Ctrl+C".into());
        copy.macos_shortcut = Some("Cmd+C".into());

        let mut tab = rec(2, "Chrome", "browser", "새 탭", 95);
        tab.windows_shortcut = Some("Ctrl+T".into());
        tab.aliases = vec!["new tab".into()];

        let mut mac_only = rec(3, "Finder", "os", "Spotlight", 80);
        mac_only.macos_shortcut = Some("Cmd+Space".into());

        let mut save = rec(4, "Figma", "design", "파일 저장", 95);
        save.windows_shortcut = Some("Ctrl+S".into());
        save.tags = vec!["file".into()];

        vec![copy, tab, mac_only, save]
    }

    #[test]
    fn category_stage_keeps_exact_matches() {
        let all = sample();
        let os = run_query(&all, &QueryFilter::new().category("os"));
        assert_eq!(ids(&os), vec![1, 3]);
        assert!(os.iter().all(|r| r.category == "os"));

        assert_eq!(run_query(&all, &QueryFilter::new().category("all")).len(), all.len());
        assert!(run_query(&all, &QueryFilter::new().category("OS")).is_empty());
    }

    #[test]
    fn categories_partition_the_catalog() {
        let all = sample();
        let total: usize = ["os", "browser", "design"]
            .iter()
            .map(|c| run_query(&all, &QueryFilter::new().category(c)).len())
            .sum();
        assert_eq!(total, all.len());
    }

    #[test]
    fn os_stage_uses_or_semantics() {
        let all = sample();
        let mac_only: Vec<ShortcutRecord> = all.iter().filter(|r| r.id == 3).cloned().collect();

        assert!(run_query(&mac_only, &QueryFilter::new().os([Os::Windows])).is_empty());
        assert_eq!(
            ids(&run_query(&mac_only, &QueryFilter::new().os([Os::Macos, Os::Linux]))),
            vec![3]
        );
        assert_eq!(
            ids(&run_query(
                &mac_only,
                &QueryFilter::new().os([Os::Windows, Os::Macos, Os::Linux])
            )),
            vec![3]
        );
    }

    #[test]
    fn favorites_stage() {
        let all = sample();
        let favs = run_query(&all, &QueryFilter::new().favorites_only([3, 4, 99]));
        assert_eq!(ids(&favs), vec![4, 3]);

        let mut none = QueryFilter::new();
        none.favorite_ids = [1].into_iter().collect();
        assert_eq!(run_query(&all, &none).len(), all.len());
    }

    #[test]
    fn search_is_case_insensitive_over_keys() {
        let all = sample();
        let found = run_query(&all, &QueryFilter::new().search("ctrl+c"));
        assert_eq!(ids(&found), vec![1]);
        assert_eq!(ids(&run_query(&all, &QueryFilter::new().search("CMD+SPACE"))), vec![3]);
    }

    #[test]
    fn search_covers_aliases_tags_and_tool() {
        let all = sample();
        assert_eq!(ids(&run_query(&all, &QueryFilter::new().search("tab"))), vec![2]);
        assert_eq!(ids(&run_query(&all, &QueryFilter::new().search("FILE"))), vec![4]);
        assert_eq!(ids(&run_query(&all, &QueryFilter::new().search("finder"))), vec![3]);
    }

    #[test]
    fn search_without_alias_does_not_match_latin_tab() {
        let mut all = sample();
        all[1].aliases.clear();
        assert!(run_query(&all, &QueryFilter::new().search("tab")).is_empty());
    }

    #[test]
    fn blank_search_disables_stage() {
        let all = sample();
        assert_eq!(run_query(&all, &QueryFilter::new().search("   ")).len(), all.len());
    }

    #[test]
    fn bilingual_equivalences() {
        let mut all = sample();
        all[0].title = "Copy selection".into();
        // "복사" matches through the Windows keys even though no field contains it.
        assert_eq!(ids(&run_query(&all, &QueryFilter::new().search("복사"))), vec![1]);

        let all = sample();
        // "copy" matches the Korean title.
        assert_eq!(ids(&run_query(&all, &QueryFilter::new().search("copy"))), vec![1]);
        assert_eq!(ids(&run_query(&all, &QueryFilter::new().search(" Save "))), vec![4]);
        assert_eq!(ids(&run_query(&all, &QueryFilter::new().search("저장"))), vec![4]);
        assert!(run_query(&all, &QueryFilter::new().search("paste")).is_empty());
    }

    #[test]
    fn popularity_sort_breaks_ties_by_id() {
        let all = vec![
            rec(7, "a", "os", "x", 95),
            rec(2, "a", "os", "x", 80),
            rec(5, "a", "os", "x", 100),
            rec(3, "a", "os", "x", 95),
        ];
        let sorted = run_query(&all, &QueryFilter::new());
        assert_eq!(ids(&sorted), vec![5, 3, 7, 2]);
    }

    #[test]
    fn combined_stages_are_conjunctive() {
        let all = sample();
        let filter = QueryFilter::new()
            .category("os")
            .os([Os::Windows])
            .search("c");
        assert_eq!(ids(&run_query(&all, &filter)), vec![1]);
    }

    #[test]
    fn search_stage_alone_preserves_order() {
        let all = sample();
        assert_eq!(ids(&search(&all, "ctrl")), vec![1, 2, 4]);
        assert_eq!(search(&all, "").len(), all.len());
    }

    #[test]
    fn top_popular_truncates() {
        let all = sample();
        assert_eq!(ids(&top_popular(&all, 2)), vec![1, 2]);
        assert_eq!(top_popular(&all, 0).len(), 0);
        assert_eq!(top_popular(&all, 50).len(), all.len());
    }

    #[test]
    fn grouping_follows_first_appearance() {
        let records = vec![
            rec(1, "Slack", "communication", "a", 10),
            rec(2, "Figma", "design", "b", 9),
            rec(3, "Slack", "communication", "c", 8),
        ];
        let groups = group_by_tool(records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].tool, "Slack");
        assert_eq!(ids(&groups[0].shortcuts), vec![1, 3]);
        assert_eq!(groups[1].tool, "Figma");
    }
}
