use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::client::{ClientError, MemberClient};
use crate::models::member::Member;

pub const PAGE_SIZES: [usize; 2] = [5, 10];
pub const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchField {
    #[default]
    All,
    Name,
    Email,
    Phone,
    City,
    Country,
}

impl SearchField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::All => "all",
            SearchField::Name => "name",
            SearchField::Email => "email",
            SearchField::Phone => "phone",
            SearchField::City => "city",
            SearchField::Country => "country",
        }
    }

    fn value<'a>(&self, member: &'a Member) -> Option<&'a str> {
        match self {
            SearchField::All => None,
            SearchField::Name => Some(member.name.as_str()),
            SearchField::Email => Some(member.email.as_str()),
            SearchField::Phone => member.phone.as_deref(),
            SearchField::City => member.city.as_deref(),
            SearchField::Country => member.country.as_deref(),
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(SearchField::All),
            "name" => Ok(SearchField::Name),
            "email" => Ok(SearchField::Email),
            "phone" => Ok(SearchField::Phone),
            "city" => Ok(SearchField::City),
            "country" => Ok(SearchField::Country),
            other => Err(format!("unknown search field: {other}")),
        }
    }
}

const ANY_FIELD: [SearchField; 5] = [
    SearchField::Name,
    SearchField::Email,
    SearchField::Phone,
    SearchField::City,
    SearchField::Country,
];

/// Case-insensitive substring match. `term` must already be lowercased.
/// A member with no value for the field never matches.
pub fn matches(member: &Member, term: &str, field: SearchField) -> bool {
    let hit = |f: SearchField| {
        f.value(member)
            .is_some_and(|v| v.to_lowercase().contains(term))
    };
    match field {
        SearchField::All => ANY_FIELD.into_iter().any(hit),
        single => hit(single),
    }
}

/// The visible set: everything for a blank term, otherwise the matches.
pub fn filter_members<'a>(members: &'a [Member], term: &str, field: SearchField) -> Vec<&'a Member> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return members.iter().collect();
    }
    members
        .iter()
        .filter(|m| matches(m, &term, field))
        .collect()
}

pub fn page_count(visible: usize, page_size: usize) -> usize {
    visible.div_ceil(page_size.max(1))
}

/// Items on 1-based `page`. Out-of-range pages yield an empty slice.
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(page_size);
    if page == 0 || start >= items.len() {
        return &[];
    }
    let end = (start + page_size).min(items.len());
    &items[start..end]
}

/// State behind the member list screen: the fetched set plus the search and
/// paging controls. Everything shown is derived on demand.
#[derive(Debug, Clone)]
pub struct MemberListView {
    members: Vec<Member>,
    search_term: String,
    search_field: SearchField,
    current_page: usize,
    page_size: usize,
    loading: bool,
    error: Option<String>,
}

impl Default for MemberListView {
    fn default() -> Self {
        Self::new()
    }
}

impl MemberListView {
    /// A view that has not fetched yet.
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            search_term: String::new(),
            search_field: SearchField::All,
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            loading: true,
            error: None,
        }
    }

    pub fn with_members(members: Vec<Member>) -> Self {
        Self {
            members,
            loading: false,
            ..Self::new()
        }
    }

    /// Fetches the full set once. A failure leaves the view in an error state.
    pub async fn load(&mut self, client: &MemberClient) {
        self.loading = true;
        match client.list().await {
            Ok(members) => {
                self.members = members;
                self.error = None;
            }
            Err(e) => {
                tracing::warn!("error loading members: {e}");
                self.error = Some("Unable to load member list".to_string());
            }
        }
        self.loading = false;
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn search_field(&self) -> SearchField {
        self.search_field
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.current_page = 1;
    }

    pub fn set_search_field(&mut self, field: SearchField) {
        self.search_field = field;
        self.current_page = 1;
    }

    pub fn clear_search(&mut self) {
        self.search_term.clear();
        self.search_field = SearchField::All;
        self.current_page = 1;
    }

    /// Returns false and changes nothing for a zero size.
    pub fn set_page_size(&mut self, size: usize) -> bool {
        if size == 0 {
            return false;
        }
        self.page_size = size;
        self.current_page = 1;
        true
    }

    pub fn visible(&self) -> Vec<&Member> {
        filter_members(&self.members, &self.search_term, self.search_field)
    }

    pub fn page_count(&self) -> usize {
        page_count(self.visible().len(), self.page_size)
    }

    pub fn current_items(&self) -> Vec<&Member> {
        let visible = self.visible();
        page_slice(&visible, self.current_page, self.page_size).to_vec()
    }

    /// Moves to `page` if it lies in `1..=page_count`; otherwise a no-op.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page < 1 || page > self.page_count() {
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.page_count()
    }

    pub fn previous_page(&mut self) -> bool {
        self.has_previous() && self.go_to_page(self.current_page - 1)
    }

    pub fn next_page(&mut self) -> bool {
        self.has_next() && self.go_to_page(self.current_page + 1)
    }

    pub fn page_numbers(&self) -> RangeInclusive<usize> {
        1..=self.page_count()
    }

    /// "Showing 6 to 10 of 12 results", or `None` when nothing is visible.
    pub fn summary(&self) -> Option<String> {
        let total = self.visible().len();
        if total == 0 {
            return None;
        }
        let start = (self.current_page - 1) * self.page_size;
        let end = (start + self.page_size).min(total);
        Some(format!("Showing {} to {end} of {total} results", start + 1))
    }

    /// "3 of 12": visible count over the full set.
    pub fn count_label(&self) -> String {
        format!("{} of {}", self.visible().len(), self.members.len())
    }

    /// Drops a member from the local set. Keeps the current page in range.
    pub fn remove(&mut self, id: i64) -> Option<Member> {
        let index = self.members.iter().position(|m| m.id == id)?;
        let removed = self.members.remove(index);
        self.current_page = self.current_page.min(self.page_count()).max(1);
        Some(removed)
    }

    /// Deletes on the server, then locally. No re-fetch.
    pub async fn delete(&mut self, client: &MemberClient, id: i64) -> Result<(), ClientError> {
        client.delete(id).await?;
        self.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: i64, name: &str, city: Option<&str>) -> Member {
        Member {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            birthday: None,
            country: None,
            city: city.map(String::from),
            district: None,
            address: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn numbered(n: i64) -> Vec<Member> {
        (1..=n)
            .map(|i| member(i, &format!("Tester{i}"), Some("Hanoi")))
            .collect()
    }

    fn ids(members: &[&Member]) -> Vec<i64> {
        members.iter().map(|m| m.id).collect()
    }

    #[test]
    fn test_city_search_is_case_insensitive() {
        let members = vec![
            member(1, "Ann", Some("Hanoi")),
            member(2, "Bob", Some("Paris")),
        ];
        let visible = filter_members(&members, "han", SearchField::City);
        assert_eq!(ids(&visible), vec![1]);
    }

    #[test]
    fn test_blank_term_shows_everything() {
        let members = numbered(3);
        assert_eq!(filter_members(&members, "   ", SearchField::Name).len(), 3);
    }

    #[test]
    fn test_missing_value_never_matches() {
        let members = vec![member(1, "Ann", None), member(2, "Bob", Some("Annecy"))];
        let visible = filter_members(&members, "ann", SearchField::City);
        assert_eq!(ids(&visible), vec![2]);
    }

    #[test]
    fn test_all_fields_is_an_or() {
        let mut bob = member(2, "Bob", Some("Paris"));
        bob.country = Some("France".into());
        let members = vec![member(1, "Ann", Some("Hanoi")), bob];

        assert_eq!(ids(&filter_members(&members, "FRAN", SearchField::All)), vec![2]);
        assert_eq!(ids(&filter_members(&members, "ann@", SearchField::All)), vec![1]);
        assert!(filter_members(&members, "france", SearchField::Name).is_empty());
    }

    #[test]
    fn test_district_is_not_searched() {
        let mut ann = member(1, "Ann", None);
        ann.district = Some("Cau Giay".into());
        assert!(filter_members(&[ann], "giay", SearchField::All).is_empty());
    }

    #[test]
    fn test_search_field_parsing() {
        assert_eq!("City".parse::<SearchField>().unwrap(), SearchField::City);
        assert_eq!("all".parse::<SearchField>().unwrap(), SearchField::All);
        assert!("district".parse::<SearchField>().is_err());
    }

    #[test]
    fn test_twelve_records_three_pages() {
        let mut view = MemberListView::with_members(numbered(12));
        assert_eq!(view.page_size(), 5);
        assert_eq!(view.page_count(), 3);
        assert_eq!(ids(&view.current_items()), vec![1, 2, 3, 4, 5]);

        assert!(view.go_to_page(3));
        assert_eq!(ids(&view.current_items()), vec![11, 12]);
        assert_eq!(view.summary().unwrap(), "Showing 11 to 12 of 12 results");

        assert!(!view.go_to_page(0));
        assert!(!view.go_to_page(4));
        assert_eq!(view.current_page(), 3);
    }

    #[test]
    fn test_prev_next_disabled_at_edges() {
        let mut view = MemberListView::with_members(numbered(12));
        assert!(!view.has_previous());
        assert!(!view.previous_page());
        assert_eq!(view.current_page(), 1);

        assert!(view.next_page());
        assert!(view.next_page());
        assert!(!view.has_next());
        assert!(!view.next_page());
        assert_eq!(view.current_page(), 3);
        assert_eq!(view.page_numbers().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_search_changes_reset_page() {
        let mut view = MemberListView::with_members(numbered(12));
        view.go_to_page(3);
        view.set_search_term("tester1");
        assert_eq!(view.current_page(), 1);

        view.set_search_term("");
        view.go_to_page(2);
        view.set_search_field(SearchField::Name);
        assert_eq!(view.current_page(), 1);

        view.go_to_page(2);
        assert!(view.set_page_size(10));
        assert_eq!(view.current_page(), 1);
        assert_eq!(view.page_count(), 2);
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let mut view = MemberListView::with_members(numbered(12));
        view.go_to_page(2);
        assert!(!view.set_page_size(0));
        assert_eq!(view.page_size(), 5);
        assert_eq!(view.current_page(), 2);
    }

    #[test]
    fn test_clear_search_resets_term_and_field() {
        let mut view = MemberListView::with_members(numbered(3));
        view.set_search_field(SearchField::Email);
        view.set_search_term("nobody");
        assert!(view.visible().is_empty());
        assert!(view.summary().is_none());
        assert_eq!(view.count_label(), "0 of 3");

        view.clear_search();
        assert_eq!(view.search_field(), SearchField::All);
        assert_eq!(view.search_term(), "");
        assert_eq!(view.count_label(), "3 of 3");
    }

    #[test]
    fn test_remove_recomputes_pages() {
        let mut view = MemberListView::with_members(numbered(11));
        assert!(view.go_to_page(3));
        assert_eq!(view.remove(11).unwrap().id, 11);
        assert_eq!(view.page_count(), 2);
        assert_eq!(view.current_page(), 2);
        assert_eq!(ids(&view.current_items()), vec![6, 7, 8, 9, 10]);
        assert!(view.remove(99).is_none());
    }

    #[test]
    fn test_empty_set_has_no_pages() {
        let mut view = MemberListView::with_members(Vec::new());
        assert_eq!(view.page_count(), 0);
        assert!(view.current_items().is_empty());
        assert!(!view.go_to_page(1));
        assert!(!view.has_next());
        assert_eq!(view.current_page(), 1);
    }

    #[test]
    fn test_new_view_is_loading() {
        let view = MemberListView::new();
        assert!(view.is_loading());
        assert!(view.error().is_none());
    }

    #[test]
    fn test_page_slice_bounds() {
        let items = [1, 2, 3, 4, 5, 6, 7];
        assert_eq!(page_slice(&items, 2, 5), &[6, 7]);
        assert!(page_slice(&items, 0, 5).is_empty());
        assert!(page_slice(&items, 3, 5).is_empty());
    }
}
