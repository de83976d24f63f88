//! Question list state: the full fetched collection, the operator's filter
//! predicates, and the page currently shown.
//!
//! Filtering and paging never touch the network. Loads (full list or date range)
//! are tagged with a [`LoadTicket`]; only the most recently issued ticket may
//! replace the collection, so a slow response cannot overwrite a newer one.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use futures_util::future::join;
use itertools::Itertools;
use tokio::sync::Mutex;

use crate::api::ApiClient;
use crate::models::{difficulty_label, Category, CategoryRef, Question};
use crate::toast::Toasts;

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// A filter axis: either unconstrained (`all`) or one exact value.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Selector<T> {
    #[default]
    All,
    Only(T),
}

impl<T: FromStr> Selector<T> {
    /// `""` and `"all"` mean no constraint; unparseable values are treated the same way.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            return Selector::All;
        }
        match raw.parse() {
            Ok(value) => Selector::Only(value),
            Err(_) => {
                tracing::warn!(value = raw, "Ignoring unparseable filter value");
                Selector::All
            }
        }
    }
}

impl<T: ToString> Selector<T> {
    pub fn as_param(&self) -> String {
        match self {
            Selector::All => "all".to_owned(),
            Selector::Only(value) => value.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Filters {
    pub search: String,
    pub category: Selector<String>,
    pub difficulty: Selector<u8>,
}

/// Category id -> name, built once per category load.
#[derive(Clone, Debug, Default)]
pub struct CategoryLookup {
    names: HashMap<String, String>,
}

impl CategoryLookup {
    pub fn new(categories: &[Category]) -> Self {
        CategoryLookup {
            names: categories
                .iter()
                .map(|c| (c.id.clone(), c.name.clone()))
                .collect(),
        }
    }

    /// Display name for a reference. Unknown ids come back unresolved.
    pub fn resolve<'a>(&'a self, reference: &'a CategoryRef) -> &'a str {
        match reference {
            CategoryRef::Embedded {
                name: Some(name), ..
            } => name,
            other => {
                let id = other.id();
                self.names.get(id).map(String::as_str).unwrap_or(id)
            }
        }
    }
}

pub fn matches(question: &Question, filters: &Filters, lookup: &CategoryLookup) -> bool {
    let search = filters.search.trim().to_lowercase();
    let matches_search = search.is_empty()
        || question.title.text.to_lowercase().contains(&search)
        || question
            .categories
            .iter()
            .any(|c| lookup.resolve(c).to_lowercase().contains(&search));

    let matches_category = match &filters.category {
        Selector::All => true,
        Selector::Only(name) => question.categories.iter().any(|c| lookup.resolve(c) == name),
    };

    let matches_difficulty = match filters.difficulty {
        Selector::All => true,
        Selector::Only(difficulty) => question.difficulty == difficulty,
    };

    matches_search && matches_category && matches_difficulty
}

pub fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1))
}

/// Items of 1-based `page`. Out-of-range pages are empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let page_size = page_size.max(1);
    let start = page.saturating_sub(1).saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageMarker {
    Page(usize),
    Ellipsis,
}

/// Page buttons to render: first, last, current and its neighbours. A hidden page
/// two steps away from the current one becomes the single ellipsis of its run.
pub fn page_window(current: usize, total: usize) -> Vec<PageMarker> {
    (1..=total)
        .filter_map(|page| {
            if page == 1 || page == total || (page + 1 >= current && page <= current + 1) {
                Some(PageMarker::Page(page))
            } else if page + 2 == current || page == current + 2 {
                Some(PageMarker::Ellipsis)
            } else {
                None
            }
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug)]
pub struct QuestionList {
    questions: Vec<Question>,
    categories: Vec<Category>,
    lookup: CategoryLookup,
    filters: Filters,
    page: usize,
    page_size: usize,
    date_range: Option<DateRange>,
    latest_ticket: u64,
    loaded: bool,
}

impl Default for QuestionList {
    fn default() -> Self {
        QuestionList::new(DEFAULT_PAGE_SIZE)
    }
}

impl QuestionList {
    pub fn new(page_size: usize) -> Self {
        QuestionList {
            questions: Vec::new(),
            categories: Vec::new(),
            lookup: CategoryLookup::default(),
            filters: Filters::default(),
            page: 1,
            page_size: page_size.max(1),
            date_range: None,
            latest_ticket: 0,
            loaded: false,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn lookup(&self) -> &CategoryLookup {
        &self.lookup
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn date_range(&self) -> Option<DateRange> {
        self.date_range
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn find(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Replaces the predicates; the page goes back to 1 if anything changed.
    pub fn set_filters(&mut self, filters: Filters) {
        if filters != self.filters {
            self.filters = filters;
            self.page = 1;
        }
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        let filters = Filters {
            search: search.into(),
            ..self.filters.clone()
        };
        self.set_filters(filters);
    }

    pub fn set_category(&mut self, category: Selector<String>) {
        let filters = Filters {
            category,
            ..self.filters.clone()
        };
        self.set_filters(filters);
    }

    pub fn set_difficulty(&mut self, difficulty: Selector<u8>) {
        let filters = Filters {
            difficulty,
            ..self.filters.clone()
        };
        self.set_filters(filters);
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered().len(), self.page_size)
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.total_pages().max(1));
    }

    pub fn filtered(&self) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| matches(q, &self.filters, &self.lookup))
            .collect()
    }

    pub fn current_page(&self) -> Vec<&Question> {
        paginate(&self.filtered(), self.page, self.page_size).to_vec()
    }

    /// Distinct category names present in the collection, first appearance first.
    pub fn category_choices(&self) -> Vec<String> {
        self.questions
            .iter()
            .flat_map(|q| q.categories.iter().map(|c| self.lookup.resolve(c)))
            .filter(|name| !name.is_empty())
            .unique()
            .map(str::to_owned)
            .collect()
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.latest_ticket += 1;
        LoadTicket(self.latest_ticket)
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.latest_ticket
    }

    /// Installs a loaded collection unless a newer load has been issued since.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        questions: Vec<Question>,
        categories: Option<Vec<Category>>,
        date_range: Option<DateRange>,
    ) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(ticket = ticket.0, latest = self.latest_ticket, "Discarding stale load");
            return false;
        }
        if let Some(categories) = categories {
            self.set_categories(categories);
        }
        self.questions = questions;
        if date_range != self.date_range {
            self.date_range = date_range;
            self.page = 1;
        }
        self.loaded = true;
        self.go_to_page(self.page);
        true
    }

    pub fn set_categories(&mut self, categories: Vec<Category>) {
        self.lookup = CategoryLookup::new(&categories);
        self.categories = categories;
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.questions.len();
        self.questions.retain(|q| q.id != id);
        let removed = self.questions.len() != before;
        if removed {
            self.go_to_page(self.page);
        }
        removed
    }

    /// Swaps in the server's copy of a question.
    pub fn replace_one(&mut self, question: Question) -> bool {
        match self.questions.iter_mut().find(|q| q.id == question.id) {
            Some(slot) => {
                *slot = question;
                true
            }
            None => false,
        }
    }

    pub fn view(&self) -> ListView {
        let filtered = self.filtered();
        let total_pages = total_pages(filtered.len(), self.page_size);
        let offset = (self.page - 1) * self.page_size;
        let rows = paginate(&filtered, self.page, self.page_size)
            .iter()
            .enumerate()
            .map(|(n, q)| QuestionRow::new(offset + n + 1, q, &self.lookup))
            .collect();
        ListView {
            rows,
            page: self.page,
            total_pages,
            window: page_window(self.page, total_pages)
                .into_iter()
                .map(|marker| PageLink::new(marker, self.page))
                .collect(),
            filtered: filtered.len(),
            total: self.questions.len(),
            date_range: self.date_range,
        }
    }
}

/// One table row, already resolved for display.
#[derive(Debug, Clone)]
pub struct QuestionRow {
    pub number: usize,
    pub id: String,
    pub title: String,
    pub title_image: Option<String>,
    pub categories: Vec<String>,
    pub difficulty: u8,
    pub difficulty_label: &'static str,
    pub correct: char,
    pub created_by: String,
    pub approved: bool,
    pub approved_by: String,
}

impl QuestionRow {
    fn new(number: usize, question: &Question, lookup: &CategoryLookup) -> Self {
        QuestionRow {
            number,
            id: question.id.clone(),
            title: question.title.text.clone(),
            title_image: question.title.image.clone().filter(|i| !i.is_empty()),
            categories: question
                .categories
                .iter()
                .map(|c| lookup.resolve(c).to_owned())
                .collect(),
            difficulty: question.difficulty,
            difficulty_label: difficulty_label(question.difficulty),
            correct: question.correct_label(),
            created_by: question
                .created_by
                .as_ref()
                .map(|p| p.display_name().to_owned())
                .unwrap_or_else(|| "Unknown".to_owned()),
            approved: question.is_approved,
            approved_by: question
                .approved_by
                .as_ref()
                .map(|p| p.display_name().to_owned())
                .unwrap_or_default(),
        }
    }

    pub fn categories_text(&self) -> String {
        if self.categories.is_empty() {
            "Uncategorized".to_owned()
        } else {
            self.categories.join(", ")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub number: Option<usize>,
    pub current: bool,
}

impl PageLink {
    fn new(marker: PageMarker, current: usize) -> Self {
        match marker {
            PageMarker::Page(n) => PageLink {
                number: Some(n),
                current: n == current,
            },
            PageMarker::Ellipsis => PageLink {
                number: None,
                current: false,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListView {
    pub rows: Vec<QuestionRow>,
    pub page: usize,
    pub total_pages: usize,
    pub window: Vec<PageLink>,
    pub filtered: usize,
    pub total: usize,
    pub date_range: Option<DateRange>,
}

impl ListView {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Loads questions and categories together and installs them.
pub async fn refresh(api: &ApiClient, list: &Mutex<QuestionList>, toasts: &mut Toasts) -> bool {
    let ticket = list.lock().await.begin_load();
    let (questions, categories) = join(api.list_questions(), api.list_categories()).await;
    let categories = categories
        .map_err(|err| tracing::warn!(error = %err, "Loading categories failed"))
        .ok();
    let mut list = list.lock().await;
    match questions {
        Ok(questions) => {
            tracing::info!(count = questions.len(), "Loaded questions");
            list.finish_load(ticket, questions, categories, None)
        }
        Err(err) => {
            tracing::error!(error = %err, "Loading questions failed");
            if list.is_current(ticket) {
                toasts.error("Failed to load questions. Please try again.");
            }
            false
        }
    }
}

/// Replaces the collection with the backend's date-filtered result.
pub async fn apply_date_filter(
    api: &ApiClient,
    list: &Mutex<QuestionList>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    toasts: &mut Toasts,
) -> bool {
    let (Some(from), Some(to)) = (from, to) else {
        toasts.error("Please select both from and to dates");
        return false;
    };
    if from > to {
        toasts.error("From date cannot be after to date");
        return false;
    }
    let ticket = list.lock().await.begin_load();
    match api.questions_by_date_range(from, to).await {
        Ok(questions) => {
            let count = questions.len();
            let installed =
                list.lock()
                    .await
                    .finish_load(ticket, questions, None, Some(DateRange { from, to }));
            if installed {
                toasts.success(format!("Loaded {count} questions"));
            }
            installed
        }
        Err(err) => {
            tracing::error!(error = %err, %from, %to, "Date filter failed");
            if list.lock().await.is_current(ticket) {
                toasts.error("Failed to filter questions by date");
            }
            false
        }
    }
}

pub async fn clear_date_filter(
    api: &ApiClient,
    list: &Mutex<QuestionList>,
    toasts: &mut Toasts,
) -> bool {
    refresh(api, list, toasts).await
}

pub async fn delete_question(
    api: &ApiClient,
    list: &Mutex<QuestionList>,
    id: &str,
    toasts: &mut Toasts,
) -> bool {
    match api.delete_question(id).await {
        Ok(()) => {
            list.lock().await.remove(id);
            toasts.success("Question deleted successfully!");
            true
        }
        Err(err) => {
            toasts.error(err.message_or("Failed to delete question. Please try again."));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{question, question_json, FakeBackend};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn categories() -> Vec<Category> {
        vec![
            Category {
                id: "c-sci".into(),
                name: "Science".into(),
                created_at: None,
            },
            Category {
                id: "c-hist".into(),
                name: "History".into(),
                created_at: None,
            },
        ]
    }

    fn sample() -> Vec<Question> {
        vec![
            question("1", "Boiling point of water", json!(["c-sci"]), 1),
            question("2", "Battle of Hastings year", json!(["c-hist"]), 3),
            question("3", "Speed of light", json!([{"_id": "c-sci", "name": "Science"}]), 5),
            question("4", "Who built the pyramids", json!(["c-gone"]), 3),
            question("5", "Untagged riddle", json!([]), 2),
        ]
    }

    fn loaded_list(page_size: usize, questions: Vec<Question>) -> QuestionList {
        let mut list = QuestionList::new(page_size);
        let ticket = list.begin_load();
        assert!(list.finish_load(ticket, questions, Some(categories()), None));
        list
    }

    fn ids(list: &QuestionList) -> Vec<&str> {
        list.filtered().iter().map(|q| q.id.as_str()).collect()
    }

    #[test]
    fn unresolved_reference_falls_back_to_raw_id() {
        let lookup = CategoryLookup::new(&categories());
        assert_eq!(lookup.resolve(&CategoryRef::Id("c-sci".into())), "Science");
        assert_eq!(lookup.resolve(&CategoryRef::Id("c-gone".into())), "c-gone");
        let embedded = CategoryRef::Embedded {
            id: "c-hist".into(),
            name: None,
        };
        assert_eq!(lookup.resolve(&embedded), "History");
    }

    #[test]
    fn all_sentinels_impose_no_constraint() {
        let list = loaded_list(20, sample());
        assert_eq!(ids(&list), vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn filter_is_conjunction_of_axes() {
        let mut list = loaded_list(20, sample());
        list.set_search("SCIENCE");
        assert_eq!(ids(&list), vec!["1", "3"]);

        list.set_difficulty(Selector::Only(5));
        assert_eq!(ids(&list), vec!["3"]);

        list.set_search("");
        list.set_difficulty(Selector::Only(3));
        list.set_category(Selector::Only("History".into()));
        assert_eq!(ids(&list), vec!["2"]);

        list.set_category(Selector::Only("c-gone".into()));
        assert_eq!(ids(&list), vec!["4"]);
    }

    #[test]
    fn every_combination_matches_manual_filter() {
        let list_questions = sample();
        let lookup = CategoryLookup::new(&categories());
        let searches = ["", "of", "science", "zzz"];
        let cats = [Selector::All, Selector::Only("Science".to_owned()), Selector::Only("History".to_owned())];
        let diffs = [Selector::All, Selector::Only(1), Selector::Only(3)];
        for search in searches {
            for category in &cats {
                for difficulty in &diffs {
                    let filters = Filters {
                        search: search.to_owned(),
                        category: category.clone(),
                        difficulty: difficulty.clone(),
                    };
                    let expected: Vec<&str> = list_questions
                        .iter()
                        .filter(|q| {
                            let s = search.is_empty()
                                || q.title.text.to_lowercase().contains(search)
                                || q.categories.iter().any(|c| lookup.resolve(c).to_lowercase().contains(search));
                            let c = match category {
                                Selector::All => true,
                                Selector::Only(n) => q.categories.iter().any(|c| lookup.resolve(c) == n),
                            };
                            let d = match difficulty {
                                Selector::All => true,
                                Selector::Only(d) => q.difficulty == *d,
                            };
                            s && c && d
                        })
                        .map(|q| q.id.as_str())
                        .collect();
                    let mut list = loaded_list(20, list_questions.clone());
                    list.set_filters(filters);
                    assert_eq!(ids(&list), expected);
                }
            }
        }
    }

    #[test]
    fn changing_any_predicate_resets_page() {
        let many: Vec<Question> = (0..50)
            .map(|i| question(&i.to_string(), &format!("Question {i}"), json!(["c-sci"]), 2))
            .collect();
        let mut list = loaded_list(20, many);
        list.go_to_page(3);
        assert_eq!(list.page(), 3);
        list.set_filters(list.filters().clone());
        assert_eq!(list.page(), 3, "same predicates keep the page");

        list.set_search("Question");
        assert_eq!(list.page(), 1);
        list.go_to_page(2);
        list.set_category(Selector::Only("Science".into()));
        assert_eq!(list.page(), 1);
        list.go_to_page(2);
        list.set_difficulty(Selector::Only(2));
        assert_eq!(list.page(), 1);
    }

    #[test]
    fn pages_reconstruct_filtered_sequence() {
        let items: Vec<u32> = (0..47).collect();
        for size in [1, 5, 20, 47, 100] {
            let pages = total_pages(items.len(), size);
            let mut rebuilt = Vec::new();
            for page in 1..=pages {
                let slice = paginate(&items, page, size);
                assert!(slice.len() <= size);
                rebuilt.extend_from_slice(slice);
            }
            assert_eq!(rebuilt, items);
            assert!(paginate(&items, pages + 1, size).is_empty());
        }
    }

    #[test]
    fn page_window_shapes() {
        use PageMarker::{Ellipsis as E, Page as P};
        assert_eq!(page_window(1, 1), vec![P(1)]);
        assert_eq!(page_window(1, 10), vec![P(1), P(2), E, P(10)]);
        assert_eq!(page_window(5, 10), vec![P(1), E, P(4), P(5), P(6), E, P(10)]);
        assert_eq!(page_window(3, 10), vec![P(1), P(2), P(3), P(4), E, P(10)]);
        assert_eq!(page_window(10, 10), vec![P(1), E, P(9), P(10)]);
        assert_eq!(page_window(4, 5), vec![P(1), E, P(3), P(4), P(5)]);
        for total in 2..15 {
            for current in 1..=total {
                let window = page_window(current, total);
                assert_eq!(window.first(), Some(&P(1)));
                assert_eq!(window.last(), Some(&P(total)));
                assert!(window.contains(&P(current)));
                assert!(!window.windows(2).any(|w| w[0] == E && w[1] == E));
            }
        }
    }

    #[test]
    fn stale_load_is_discarded() {
        let mut list = QuestionList::new(20);
        let first = list.begin_load();
        let second = list.begin_load();
        assert!(list.finish_load(second, sample(), None, None));
        assert!(!list.finish_load(first, vec![], None, None));
        assert_eq!(list.questions().len(), 5);
    }

    #[test]
    fn category_choices_keep_first_appearance_order() {
        let list = loaded_list(20, sample());
        assert_eq!(list.category_choices(), vec!["Science", "History", "c-gone"]);
    }

    #[test]
    fn view_numbers_rows_across_pages() {
        let many: Vec<Question> = (0..25)
            .map(|i| question(&i.to_string(), &format!("Q{i}"), json!([]), 1))
            .collect();
        let mut list = loaded_list(20, many);
        list.go_to_page(2);
        let view = list.view();
        assert_eq!(view.page, 2);
        assert_eq!(view.total_pages, 2);
        assert_eq!(view.rows.len(), 5);
        assert_eq!(view.rows[0].number, 21);
        assert!(view.has_previous());
        assert!(!view.has_next());
        list.go_to_page(3);
        assert_eq!(list.page(), 2, "paging clamps at the end");
    }

    #[tokio::test]
    async fn superseded_date_filter_failure_stays_quiet() {
        let backend = FakeBackend::start(Router::new().route(
            "/api/questions/filter-by-date",
            get(|| async {
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                axum::http::StatusCode::INTERNAL_SERVER_ERROR
            }),
        ))
        .await;
        let api = backend.client();
        let list = Mutex::new(QuestionList::default());
        let mut toasts = Toasts::default();
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d);

        let newer_load = async {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            list.lock().await.begin_load();
        };
        let (applied, ()) = tokio::join!(
            apply_date_filter(&api, &list, day(1), day(5), &mut toasts),
            newer_load
        );
        assert!(!applied);
        assert_eq!(toasts.errors(), 0);

        apply_date_filter(&api, &list, day(1), day(5), &mut toasts).await;
        assert_eq!(toasts.errors(), 1);
    }

    #[tokio::test]
    async fn date_filter_validates_before_calling() {
        let list = Mutex::new(QuestionList::default());
        let api = crate::testing::unreachable_client();
        let mut toasts = Toasts::default();
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d);

        assert!(!apply_date_filter(&api, &list, day(1), None, &mut toasts).await);
        assert!(!apply_date_filter(&api, &list, day(9), day(2), &mut toasts).await);
        let messages: Vec<String> = toasts.drain().into_iter().map(|t| t.message).collect();
        assert_eq!(
            messages,
            vec!["Please select both from and to dates", "From date cannot be after to date"]
        );
    }

    #[tokio::test]
    async fn date_filter_replaces_collection_and_clear_restores_it() {
        let full_loads = Arc::new(AtomicUsize::new(0));
        let counter = full_loads.clone();
        let backend = FakeBackend::start(
            Router::new()
                .route(
                    "/api/questions",
                    get(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                        async {
                            Json(json!([
                                question_json("a", "Alpha", json!([]), 1),
                                question_json("b", "Beta", json!([]), 1),
                                question_json("c", "Gamma", json!([]), 1)
                            ]))
                        }
                    }),
                )
                .route("/api/categories", get(|| async { Json(json!([])) }))
                .route(
                    "/api/questions/filter-by-date",
                    get(|| async { Json(json!({"questions": [question_json("b", "Beta", json!([]), 1)], "count": 1})) }),
                ),
        )
        .await;
        let api = backend.client();
        let list = Mutex::new(QuestionList::default());
        let mut toasts = Toasts::default();

        assert!(refresh(&api, &list, &mut toasts).await);
        assert_eq!(list.lock().await.questions().len(), 3);

        let from = NaiveDate::from_ymd_opt(2024, 1, 1);
        let to = NaiveDate::from_ymd_opt(2024, 1, 31);
        assert!(apply_date_filter(&api, &list, from, to, &mut toasts).await);
        {
            let list = list.lock().await;
            assert_eq!(list.questions().len(), 1);
            assert!(list.date_range().is_some());
        }
        assert_eq!(toasts.drain()[0].message, "Loaded 1 questions");

        assert!(clear_date_filter(&api, &list, &mut toasts).await);
        let list = list.lock().await;
        assert_eq!(list.questions().len(), 3);
        assert!(list.date_range().is_none());
        assert_eq!(full_loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_delete_keeps_row() {
        let list = Mutex::new(loaded_list(20, sample()));
        let api = crate::testing::unreachable_client();
        let mut toasts = Toasts::default();
        assert!(!delete_question(&api, &list, "1", &mut toasts).await);
        assert_eq!(list.lock().await.questions().len(), 5);
        assert_eq!(toasts.errors(), 1);
    }
}
