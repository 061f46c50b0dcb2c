use uuid::Uuid;

use crate::core::contact::Contact;
use crate::core::project::Project;
use crate::core::task::Task;
use crate::store::Store;

/// Fields whose unweighted distance exceeds this do not match. Tuned for
/// tolerance to minor typos; not caller-configurable.
const SCORE_THRESHOLD: f64 = 0.4;

/// Distance assigned to an exact status/priority label match. Slightly
/// worse than a perfect text match so exact-name hits rank first.
const LABEL_MATCH_DISTANCE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Project,
    Task,
    Contact,
}

/// One indexed entity, cloned out of the store at build time.
#[derive(Debug, Clone)]
pub enum SearchItem {
    Project(Project),
    Task(Task),
    Contact(Contact),
}

impl SearchItem {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Project(_) => EntityKind::Project,
            Self::Task(_) => EntityKind::Task,
            Self::Contact(_) => EntityKind::Contact,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Project(p) => p.id,
            Self::Task(t) => t.id,
            Self::Contact(c) => c.id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Project(p) => &p.name,
            Self::Task(t) => &t.title,
            Self::Contact(c) => &c.name,
        }
    }

    /// Weighted text fields: name/title weigh double, the rest weigh one.
    fn fields(&self) -> Vec<(&str, f64)> {
        match self {
            Self::Project(p) => vec![(p.name.as_str(), 2.0), (p.description.as_str(), 1.0)],
            Self::Task(t) => vec![(t.title.as_str(), 2.0)],
            Self::Contact(c) => {
                let mut fields = vec![(c.name.as_str(), 2.0)];
                if let Some(ref email) = c.email {
                    fields.push((email.as_str(), 1.0));
                }
                if let Some(ref phone) = c.phone {
                    fields.push((phone.as_str(), 1.0));
                }
                fields
            }
        }
    }

    /// English and Hebrew status labels, where the entity has a status.
    fn status_labels(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Project(p) => Some((p.status.as_label(), p.status.as_hebrew())),
            Self::Task(t) => Some((t.status.as_label(), t.status.as_hebrew())),
            Self::Contact(_) => None,
        }
    }

    fn priority_labels(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Project(p) => Some((p.priority.as_label(), p.priority.as_hebrew())),
            Self::Task(t) => Some((t.priority.as_label(), t.priority.as_hebrew())),
            Self::Contact(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub item: SearchItem,
    /// Lower is better. 0.0 is a perfect match.
    pub score: f64,
}

impl SearchResult {
    /// Inverted score for display: 100 is a perfect match.
    pub fn score_percent(&self) -> u8 {
        ((1.0 - self.score).clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

/// Structured filters applied as an AND conjunction after the fuzzy stage.
/// Without a query this acts as a listing API over the full union.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub query: Option<String>,
    pub kind: Option<EntityKind>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub project_id: Option<Uuid>,
}

/// Fuzzy index over the union of projects, tasks and contacts.
///
/// Rebuilt from the current collections whenever they change; there is no
/// incremental update. Collections are expected to stay in the hundreds.
pub struct SearchIndex {
    items: Vec<SearchItem>,
}

impl SearchIndex {
    pub fn build(store: &Store) -> Self {
        let mut items = Vec::with_capacity(
            store.projects().len() + store.tasks().len() + store.contacts().len(),
        );
        items.extend(store.projects().iter().cloned().map(SearchItem::Project));
        items.extend(store.tasks().iter().cloned().map(SearchItem::Task));
        items.extend(store.contacts().iter().cloned().map(SearchItem::Contact));
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Free-text fuzzy search. An empty or whitespace query returns no
    /// results.
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<SearchResult> = self
            .items
            .iter()
            .filter_map(|item| {
                item_distance(item, &query).map(|score| SearchResult {
                    item: item.clone(),
                    score,
                })
            })
            .collect();

        results.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.item.label().cmp(b.item.label()))
        });
        results
    }

    /// Fuzzy stage (when a query is present) followed by ANDed structured
    /// filters. Entities lacking a filtered field are excluded by that
    /// filter (contacts have no status or priority).
    pub fn advanced_search(&self, filters: &SearchFilters) -> Vec<SearchResult> {
        let mut results = match filters.query.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => self.search(query),
            _ => self
                .items
                .iter()
                .map(|item| SearchResult {
                    item: item.clone(),
                    score: 0.0,
                })
                .collect(),
        };

        if let Some(kind) = filters.kind {
            results.retain(|r| r.item.kind() == kind);
        }
        if let Some(ref status) = filters.status {
            results.retain(|r| matches_label(r.item.status_labels(), status));
        }
        if let Some(ref priority) = filters.priority {
            results.retain(|r| matches_label(r.item.priority_labels(), priority));
        }
        if let Some(project_id) = filters.project_id {
            results.retain(|r| match &r.item {
                SearchItem::Project(p) => p.id == project_id,
                SearchItem::Task(t) => t.project_id == project_id,
                SearchItem::Contact(c) => c.in_project(project_id),
            });
        }

        results
    }

    pub fn search_projects(&self, query: &str) -> Vec<Project> {
        self.search(query)
            .into_iter()
            .filter_map(|r| match r.item {
                SearchItem::Project(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn search_tasks(&self, query: &str) -> Vec<Task> {
        self.search(query)
            .into_iter()
            .filter_map(|r| match r.item {
                SearchItem::Task(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn search_contacts(&self, query: &str) -> Vec<Contact> {
        self.search(query)
            .into_iter()
            .filter_map(|r| match r.item {
                SearchItem::Contact(c) => Some(c),
                _ => None,
            })
            .collect()
    }
}

fn matches_label(labels: Option<(&'static str, &'static str)>, wanted: &str) -> bool {
    let Some((english, hebrew)) = labels else {
        return false;
    };
    english.eq_ignore_ascii_case(wanted.trim()) || hebrew == wanted.trim()
}

/// Best weighted distance across an item's matching fields, or None when
/// no field matches. Lower is better. The threshold gates on the raw
/// distance; the weight only ranks admitted matches.
fn item_distance(item: &SearchItem, query: &str) -> Option<f64> {
    let mut best: Option<f64> = None;

    for (text, weight) in item.fields() {
        if text.is_empty() {
            continue;
        }
        let distance = 1.0 - field_similarity(query, &text.to_lowercase());
        if distance > SCORE_THRESHOLD {
            continue;
        }
        let weighted = distance / weight;
        best = Some(best.map_or(weighted, |b: f64| b.min(weighted)));
    }

    // Exact-ish status/priority matching, unweighted.
    for labels in [item.status_labels(), item.priority_labels()] {
        if matches_label(labels, query) {
            best = Some(best.map_or(LABEL_MATCH_DISTANCE, |b: f64| b.min(LABEL_MATCH_DISTANCE)));
        }
    }

    best
}

/// Similarity in [0, 1]. Jaro-Winkler over the whole field, boosted when
/// the query appears as a substring anywhere (match location is ignored).
fn field_similarity(query: &str, text: &str) -> f64 {
    if text == query {
        return 1.0;
    }
    let mut similarity = strsim::jaro_winkler(query, text);
    if text.contains(query) {
        similarity = similarity.max(0.95);
    }
    // Word-level pass so a single matching word in a long field scores.
    for word in text.split_whitespace() {
        similarity = similarity.max(strsim::jaro_winkler(query, word) * 0.98);
    }
    similarity.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::project::ProjectStatus;
    use crate::core::task::TaskStatus;

    fn sample_store() -> Store {
        let mut store = Store::in_memory();

        let mut alpha = Project::new("Alpha");
        alpha.status = ProjectStatus::Active;
        alpha.description = "Website redesign".into();
        let alpha_id = store.add_project(alpha);

        let mut beta = Project::new("Beta");
        beta.status = ProjectStatus::Planning;
        store.add_project(beta);

        let mut task = Task::new(alpha_id, "Design homepage");
        task.status = TaskStatus::InProgress;
        store.add_task(task);

        let mut contact = Contact::new("Dana Levi");
        contact.email = Some("dana@example.com".into());
        contact.phone = Some("050-1234567".into());
        contact.project_ids = vec![alpha_id];
        store.add_contact(contact);

        store
    }

    #[test]
    fn empty_query_returns_nothing() {
        let index = SearchIndex::build(&sample_store());
        assert!(index.search("").is_empty());
        assert!(index.search("   ").is_empty());
    }

    #[test]
    fn exact_name_has_best_score() {
        let index = SearchIndex::build(&sample_store());
        let results = index.search("Alpha");
        assert!(!results.is_empty());
        match &results[0].item {
            SearchItem::Project(p) => assert_eq!(p.name, "Alpha"),
            other => panic!("expected project first, got {:?}", other.kind()),
        }
        for r in &results[1..] {
            assert!(r.score >= results[0].score);
        }
    }

    #[test]
    fn unrelated_names_are_excluded() {
        let index = SearchIndex::build(&sample_store());
        let results = index.search("Alpha");
        assert_eq!(results.len(), 1);
        assert!(matches!(&results[0].item, SearchItem::Project(p) if p.name == "Alpha"));
    }

    #[test]
    fn tolerates_minor_typos() {
        let index = SearchIndex::build(&sample_store());
        let results = index.search("Alpa");
        assert!(
            results
                .iter()
                .any(|r| matches!(&r.item, SearchItem::Project(p) if p.name == "Alpha"))
        );
    }

    #[test]
    fn matches_contact_by_email() {
        let index = SearchIndex::build(&sample_store());
        let results = index.search("dana@example.com");
        assert!(
            results
                .iter()
                .any(|r| matches!(&r.item, SearchItem::Contact(c) if c.name == "Dana Levi"))
        );
    }

    #[test]
    fn status_filter_without_query_ignores_contacts() {
        let index = SearchIndex::build(&sample_store());
        let results = index.advanced_search(&SearchFilters {
            status: Some("Active".into()),
            ..SearchFilters::default()
        });
        assert_eq!(results.len(), 1);
        assert!(matches!(&results[0].item, SearchItem::Project(p) if p.name == "Alpha"));
    }

    #[test]
    fn no_query_lists_full_union() {
        let store = sample_store();
        let index = SearchIndex::build(&store);
        let results = index.advanced_search(&SearchFilters::default());
        assert_eq!(
            results.len(),
            store.projects().len() + store.tasks().len() + store.contacts().len()
        );
    }

    #[test]
    fn filters_are_a_conjunction() {
        let index = SearchIndex::build(&sample_store());
        let results = index.advanced_search(&SearchFilters {
            kind: Some(EntityKind::Task),
            status: Some("InProgress".into()),
            ..SearchFilters::default()
        });
        assert_eq!(results.len(), 1);

        let none = index.advanced_search(&SearchFilters {
            kind: Some(EntityKind::Task),
            status: Some("Done".into()),
            ..SearchFilters::default()
        });
        assert!(none.is_empty());
    }

    #[test]
    fn project_id_filter_spans_entity_kinds() {
        let store = sample_store();
        let alpha_id = store
            .projects()
            .iter()
            .find(|p| p.name == "Alpha")
            .unwrap()
            .id;
        let index = SearchIndex::build(&store);

        let results = index.advanced_search(&SearchFilters {
            project_id: Some(alpha_id),
            ..SearchFilters::default()
        });

        // The project itself, its task, and its member contact.
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn hebrew_status_filter_matches() {
        let index = SearchIndex::build(&sample_store());
        let results = index.advanced_search(&SearchFilters {
            status: Some("פעיל".into()),
            ..SearchFilters::default()
        });
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn score_percent_inverts_distance() {
        let index = SearchIndex::build(&sample_store());
        let results = index.search("Alpha");
        assert_eq!(results[0].score_percent(), 100);
    }
}
