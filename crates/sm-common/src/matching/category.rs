use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use super::scoring::ScoringResult;
use crate::{Listing, Request, config::ConfigError, model::Category};

const EXACT_SCORE: f64 = 100.0;
const STEP_PENALTY: f64 = 20.0;

/// 希望種別 → 代替可能な種別（優先度順）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompatibilityTable {
    entries: HashMap<Category, Vec<Category>>,
}

impl Default for CompatibilityTable {
    fn default() -> Self {
        Self::canonical()
    }
}

impl CompatibilityTable {
    pub fn canonical() -> Self {
        use Category::*;

        let entries = HashMap::from([
            (Office, vec![Office, SharedDesk]),
            (MeetingRoom, vec![MeetingRoom, ConferenceRoom, Office]),
            (ConferenceRoom, vec![ConferenceRoom, MeetingRoom, Office]),
            (SharedDesk, vec![SharedDesk, Office]),
            (Other, vec![Other, Office, MeetingRoom, ConferenceRoom]),
        ]);

        Self { entries }
    }

    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn substitutes(&self, category: Category) -> &[Category] {
        self.entries
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn set(&mut self, category: Category, substitutes: Vec<Category>) {
        self.entries.insert(category, substitutes);
    }

    /// 全種別にエントリ（空リスト可）があることを確認する
    pub fn validate(&self) -> Result<(), ConfigError> {
        match Category::iter().find(|c| !self.entries.contains_key(c)) {
            Some(missing) => Err(ConfigError::MissingCategory(missing.as_ref().to_string())),
            None => Ok(()),
        }
    }
}

/// 種別スコア: 完全一致100、代替リストの i 番目は 100 - 20i（下限0）
pub fn score_category(
    table: &CompatibilityTable,
    request: &Request,
    listing: &Listing,
) -> ScoringResult {
    if request.category == listing.category {
        return ScoringResult::new(
            EXACT_SCORE,
            format!("種別一致: {}", listing.category.as_ref()),
        );
    }

    let substitutes = table.substitutes(request.category);
    match substitutes.iter().position(|c| *c == listing.category) {
        Some(index) => {
            let score = (EXACT_SCORE - index as f64 * STEP_PENALTY).max(0.0);
            ScoringResult::new(
                score,
                format!(
                    "代替種別: {} → {} (優先度{})",
                    request.category.as_ref(),
                    listing.category.as_ref(),
                    index
                ),
            )
        }
        None => ScoringResult::miss(format!(
            "種別非互換: {} → {}",
            request.category.as_ref(),
            listing.category.as_ref()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn canonical_table_covers_every_category() {
        assert!(CompatibilityTable::canonical().validate().is_ok());
    }

    #[test]
    fn missing_category_is_a_configuration_error() {
        let mut table = CompatibilityTable::empty();
        table.set(Category::Office, vec![]);

        assert!(matches!(
            table.validate(),
            Err(ConfigError::MissingCategory(name)) if name == "meeting_room"
        ));
    }

    #[test]
    fn scores_decay_with_substitute_position() {
        let table = CompatibilityTable::canonical();
        let request = fixtures::request();
        let mut listing = fixtures::listing();

        assert_eq!(score_category(&table, &request, &listing).score, 100.0);

        listing.category = Category::ConferenceRoom;
        assert_eq!(score_category(&table, &request, &listing).score, 80.0);

        listing.category = Category::Office;
        assert_eq!(score_category(&table, &request, &listing).score, 60.0);

        listing.category = Category::SharedDesk;
        let result = score_category(&table, &request, &listing);
        assert_eq!(result.score, 0.0);
        assert!(result.details.contains("非互換"));
    }

    #[test]
    fn long_substitute_lists_floor_at_zero() {
        let mut table = CompatibilityTable::canonical();
        table.set(
            Category::MeetingRoom,
            vec![
                Category::MeetingRoom,
                Category::ConferenceRoom,
                Category::Office,
                Category::Other,
                Category::Other,
                Category::Other,
                Category::SharedDesk,
            ],
        );
        let mut listing = fixtures::listing();
        listing.category = Category::SharedDesk;

        assert_eq!(score_category(&table, &fixtures::request(), &listing).score, 0.0);
    }

    #[test]
    fn edited_table_changes_scores() {
        let mut table = CompatibilityTable::canonical();
        table.set(Category::MeetingRoom, vec![Category::SharedDesk]);
        let mut listing = fixtures::listing();
        listing.category = Category::SharedDesk;

        assert_eq!(score_category(&table, &fixtures::request(), &listing).score, 100.0);
    }

    #[test]
    fn table_deserializes_from_json_map() {
        let table: CompatibilityTable = serde_json::from_value(serde_json::json!({
            "office": ["office"],
            "meeting_room": [],
            "conference_room": ["meeting_room"],
            "shared_desk": [],
            "other": []
        }))
        .unwrap();

        assert!(table.validate().is_ok());
        assert_eq!(
            table.substitutes(Category::ConferenceRoom),
            &[Category::MeetingRoom]
        );
        assert!(table.substitutes(Category::MeetingRoom).is_empty());
    }
}
