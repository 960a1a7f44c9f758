//! Matches category names against the rank dictionary to suggest the
//! normalized name stored on each category.

use std::collections::BTreeMap;
use std::path::Path;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;
use crate::normalize::comparison_key;
use crate::xml::CategoryRecord;

pub const UNMATCHED_RANK: &str = "Другой";
pub const UNKNOWN_CATEGORY: &str = "Неизвестно";

/// One rank or division with its display names per gender code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    pub name: String,
    pub genders: BTreeMap<String, String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankDictionary {
    pub entries: Vec<RankEntry>,
}

fn entry(name: &str, female: &str, male: &str, keywords: &[&str]) -> RankEntry {
    RankEntry {
        name: name.to_string(),
        genders: BTreeMap::from([
            ("F".to_string(), female.to_string()),
            ("M".to_string(), male.to_string()),
        ]),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

fn same_for_both(name: &str, keywords: &[&str]) -> RankEntry {
    entry(name, name, name, keywords)
}

lazy_static! {
    static ref BUILTIN_DICTIONARY: RankDictionary = RankDictionary {
        entries: vec![
            entry("МС", "МС, Женщины", "МС, Мужчины", &["мс", "мастер спорта", "мастер спорта россии"]),
            entry(
                "КМС",
                "КМС, Девушки",
                "КМС, Юноши",
                &[
                    "кмс",
                    "кандидат в мастера спорта",
                    "кандидат в мастера спорта россии",
                    "кандидат в мастера",
                    "кандидат мастера спорта",
                    "кандидат в мастера спорта, юниоры",
                    "кандидат в мастера спорта, юниорки",
                ],
            ),
            entry(
                "1 Спортивный",
                "1 Спортивный, Девочки",
                "1 Спортивный, Мальчики",
                &["1 спортивный", "первый спортивный", "1 спорт", "1 спортивный разряд", "первый спортивный разряд"],
            ),
            entry(
                "2 Спортивный",
                "2 Спортивный, Девочки",
                "2 Спортивный, Мальчики",
                &["2 спортивный", "второй спортивный", "2 спорт", "2 спортивный разряд", "второй спортивный разряд"],
            ),
            entry(
                "3 Спортивный",
                "3 Спортивный, Девочки",
                "3 Спортивный, Мальчики",
                &["3 спортивный", "третий спортивный", "3 спорт", "3 спортивный разряд", "третий спортивный разряд"],
            ),
            entry("1 Юношеский", "1 Юношеский, Девочки", "1 Юношеский, Мальчики", &["1 юношеский", "первый юношеский", "1 юн"]),
            entry("2 Юношеский", "2 Юношеский, Девочки", "2 Юношеский, Мальчики", &["2 юношеский", "второй юношеский", "2 юн"]),
            entry("3 Юношеский", "3 Юношеский, Девочки", "3 Юношеский, Мальчики", &["3 юношеский", "третий юношеский", "3 юн"]),
            entry("Юный Фигурист", "Юный Фигурист, Девочки", "Юный Фигурист, Мальчики", &["юный фигурист", "юный", "юф"]),
            entry("Дебют", "Дебют, Девочки", "Дебют, Мальчики", &["дебют", "дебютный"]),
            entry("Новичок", "Новичок, Девочки", "Новичок, Мальчики", &["новичок", "начинающий"]),
            same_for_both(
                "1 Спортивный, Пары",
                &["парное катание, 1 спортивный", "пары, 1 спортивный", "парное, 1 спортивный", "парное катание, 1 спортивный разряд"],
            ),
            same_for_both(
                "2 Спортивный, Пары",
                &["парное катание, 2 спортивный", "пары, 2 спортивный", "парное, 2 спортивный"],
            ),
            same_for_both(
                "3 Спортивный, Пары",
                &["парное катание, 3 спортивный", "пары, 3 спортивный", "парное, 3 спортивный"],
            ),
            same_for_both(
                "КМС, Пары",
                &[
                    "парное катание, кандидат в мастера спорта",
                    "пары, кандидат в мастера спорта",
                    "парное, кандидат в мастера спорта",
                    "парное катание, кмс",
                    "пары, кмс",
                ],
            ),
            same_for_both(
                "МС, Пары",
                &["парное катание, мастер спорта", "пары, мастер спорта", "парное, мастер спорта", "парное катание, мс", "пары, мс"],
            ),
            same_for_both(
                "1 Спортивный, Танцы",
                &["танцы на льду, 1 спортивный", "танцы, 1 спортивный", "ледяные танцы, 1 спортивный", "танцы на льду, 1 спортивный разряд"],
            ),
            same_for_both(
                "2 Спортивный, Танцы",
                &["танцы на льду, 2 спортивный", "танцы, 2 спортивный", "ледяные танцы, 2 спортивный"],
            ),
            same_for_both(
                "3 Спортивный, Танцы",
                &["танцы на льду, 3 спортивный", "танцы, 3 спортивный", "ледяные танцы, 3 спортивный"],
            ),
            same_for_both(
                "КМС, Танцы",
                &[
                    "танцы на льду, кандидат в мастера спорта",
                    "танцы, кандидат в мастера спорта",
                    "ледяные танцы, кандидат в мастера спорта",
                    "танцы на льду, кмс",
                    "танцы, кмс",
                ],
            ),
            same_for_both(
                "МС, Танцы",
                &["танцы на льду, мастер спорта", "танцы, мастер спорта", "ледяные танцы, мастер спорта", "танцы на льду, мс", "танцы, мс"],
            ),
        ],
    };
}

impl Default for RankDictionary {
    fn default() -> Self {
        BUILTIN_DICTIONARY.clone()
    }
}

impl RankDictionary {
    pub fn builtin() -> &'static RankDictionary {
        &BUILTIN_DICTIONARY
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    /// The entry owning the longest keyword contained in `key`. Longest
    /// wins so that "кмс" is not read as "мс".
    fn best_entry(&self, key: &str) -> Option<&RankEntry> {
        self.entries
            .iter()
            .flat_map(|entry| entry.keywords.iter().map(move |keyword| (entry, keyword)))
            .filter(|(_, keyword)| !keyword.is_empty() && key.contains(keyword.to_lowercase().as_str()))
            .fold(None, |best: Option<(&RankEntry, usize)>, (entry, keyword)| {
                let length = keyword.chars().count();
                match best {
                    Some((_, best_length)) if best_length >= length => best,
                    _ => Some((entry, length)),
                }
            })
            .map(|(entry, _)| entry)
    }
}

/// Analyzer output for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySuggestion {
    /// Position of the category in the parsed file.
    pub index: usize,
    pub original_name: String,
    pub gender: Option<String>,
    pub suggested_name: String,
    /// Set when no rank matched, or a rank matched but its display name
    /// depends on a gender the category does not state.
    pub needs_review: bool,
}

pub struct CategoryAnalyzer<'a> {
    dictionary: &'a RankDictionary,
}

impl<'a> CategoryAnalyzer<'a> {
    pub fn new(dictionary: &'a RankDictionary) -> Self {
        Self { dictionary }
    }

    /// Suggested normalized name and whether a human should confirm it.
    pub fn suggest(&self, name: &str, gender: Option<&str>) -> (String, bool) {
        let key = comparison_key(name);
        if key.is_empty() {
            return (UNKNOWN_CATEGORY.to_string(), true);
        }
        let gender = gender.map(|g| g.trim().to_uppercase());

        match self.dictionary.best_entry(&key) {
            Some(entry) => match gender.as_deref().and_then(|g| entry.genders.get(g)) {
                Some(display) => (display.clone(), false),
                None => {
                    let gender_neutral = entry.genders.values().all(|display| display == &entry.name)
                        && !entry.genders.is_empty();
                    (entry.name.clone(), !gender_neutral)
                }
            },
            None => {
                let suffix = match gender.as_deref() {
                    Some("F") => ", Девочки",
                    Some("M") => ", Мальчики",
                    _ => "",
                };
                (format!("{UNMATCHED_RANK}{suffix}"), true)
            }
        }
    }

    pub fn analyze(&self, categories: &[CategoryRecord]) -> Vec<CategorySuggestion> {
        categories
            .iter()
            .enumerate()
            .map(|(index, category)| {
                let (suggested_name, needs_review) =
                    self.suggest(&category.name, category.gender.as_deref());
                debug!(
                    index,
                    name = %category.name,
                    suggested = %suggested_name,
                    needs_review,
                    "Category analyzed"
                );
                CategorySuggestion {
                    index,
                    original_name: category.name.clone(),
                    gender: category.gender.clone(),
                    suggested_name,
                    needs_review,
                }
            })
            .collect()
    }
}

/// Sort weight of a normalized category name, lower is more senior.
/// Unknown ranks sort last.
pub fn rank_weight(name: &str) -> u8 {
    let base = name.split(',').next().unwrap_or_default().trim();
    match base {
        "МС" => 1,
        "КМС" => 2,
        "1 Спортивный" => 3,
        "2 Спортивный" => 4,
        "3 Спортивный" => 5,
        "1 Юношеский" => 6,
        "2 Юношеский" => 7,
        "3 Юношеский" => 8,
        "Юный Фигурист" => 9,
        "Дебют" => 10,
        "Новичок" => 11,
        _ => 12,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> CategoryAnalyzer<'static> {
        CategoryAnalyzer::new(RankDictionary::builtin())
    }

    #[test]
    fn test_builtin_dictionary_size() {
        assert_eq!(RankDictionary::builtin().entries.len(), 21);
    }

    #[test]
    fn test_gendered_display_name() {
        assert_eq!(
            analyzer().suggest("КМС, девушки", Some("F")),
            ("КМС, Девушки".to_string(), false)
        );
        assert_eq!(
            analyzer().suggest("Мастер спорта", Some("m")),
            ("МС, Мужчины".to_string(), false)
        );
    }

    #[test]
    fn test_longest_keyword_wins() {
        assert_eq!(analyzer().suggest("кмс", Some("M")).0, "КМС, Юноши");
        assert_eq!(analyzer().suggest("Пары, КМС", Some("X")).0, "КМС, Пары");
        assert_eq!(analyzer().suggest("1 спортивный разряд", Some("F")).0, "1 Спортивный, Девочки");
    }

    #[test]
    fn test_latin_look_alikes_are_repaired() {
        assert_eq!(analyzer().suggest("3 Юнoшеский", Some("F")).0, "3 Юношеский, Девочки");
    }

    #[test]
    fn test_pairs_do_not_need_gender() {
        assert_eq!(
            analyzer().suggest("Парное катание, 2 спортивный", None),
            ("2 Спортивный, Пары".to_string(), false)
        );
    }

    #[test]
    fn test_missing_gender_needs_review() {
        assert_eq!(
            analyzer().suggest("Дебют", None),
            ("Дебют".to_string(), true)
        );
    }

    #[test]
    fn test_unmatched_names() {
        assert_eq!(
            analyzer().suggest("Открытый класс", Some("F")),
            ("Другой, Девочки".to_string(), true)
        );
        assert_eq!(
            analyzer().suggest("Открытый класс", Some("M")),
            ("Другой, Мальчики".to_string(), true)
        );
        assert_eq!(analyzer().suggest("Открытый класс", None).0, "Другой");
        assert_eq!(analyzer().suggest("  ", Some("F")).0, UNKNOWN_CATEGORY);
    }

    #[test]
    fn test_analyze_keeps_file_order() {
        let categories = vec![
            CategoryRecord {
                name: "Новичок".to_string(),
                gender: Some("F".to_string()),
                ..Default::default()
            },
            CategoryRecord {
                name: "Сборная".to_string(),
                ..Default::default()
            },
        ];
        let analysis = analyzer().analyze(&categories);
        assert_eq!(analysis.len(), 2);
        assert_eq!(analysis[0].index, 0);
        assert_eq!(analysis[0].suggested_name, "Новичок, Девочки");
        assert!(!analysis[0].needs_review);
        assert_eq!(analysis[1].index, 1);
        assert!(analysis[1].needs_review);
    }

    #[test]
    fn test_dictionary_from_json() {
        let json = r#"{"entries":[{"name":"Элита","genders":{"F":"Элита, Ж"},"keywords":["элит"]}]}"#;
        let dictionary = RankDictionary::from_json(json).unwrap();
        let analyzer = CategoryAnalyzer::new(&dictionary);
        assert_eq!(analyzer.suggest("Элитный класс", Some("F")).0, "Элита, Ж");
        assert!(analyzer.suggest("Элитный класс", Some("M")).1);
    }

    #[test]
    fn test_rank_weight() {
        assert_eq!(rank_weight("МС, Женщины"), 1);
        assert_eq!(rank_weight("Новичок, Мальчики"), 11);
        assert_eq!(rank_weight("КМС, Пары"), 2);
        assert_eq!(rank_weight("Другой, Девочки"), 12);
    }
}
