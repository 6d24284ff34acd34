//! Static catalog of the highscoreables the sync walks.

use board_core::{Category, Highscoreable, HighscoreableId};

/// Every level, episode and story of `categories`, taken from the tab
/// tables. Userlevels have no static catalog and are skipped.
pub fn catalog(categories: &[Category]) -> Vec<Highscoreable> {
    let mut entities = Vec::new();
    for &category in categories {
        for info in category.tabs() {
            for id in info.first_id..=info.last_id {
                let name = format!("{}-{:03}", info.tab, id - info.first_id);
                entities.push(Highscoreable::new(HighscoreableId::new(category, id), name));
            }
        }
    }
    entities
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_catalog_covers_tab_ranges() {
        let entities = catalog(&[Category::Level, Category::Story]);
        let expected: u32 = [Category::Level, Category::Story]
            .iter()
            .flat_map(|c| c.tabs())
            .map(|info| info.last_id - info.first_id + 1)
            .sum();
        assert_eq!(entities.len(), expected as usize);

        let keys: HashSet<_> = entities.iter().map(|h| h.key).collect();
        assert_eq!(keys.len(), entities.len());
        assert!(entities.iter().all(|h| h.tab.is_some()));
    }

    #[test]
    fn test_catalog_skips_userlevels() {
        assert!(catalog(&[Category::Userlevel]).is_empty());
    }
}
