use std::fmt;

use anyhow::{Context, Result};
use sqlx::{FromRow, PgPool};
use tracing::warn;

/// Youngest student age the seeded catalog is tuned for.
pub const SUPPORTED_MIN_AGE: i32 = 5;
/// Oldest student age the seeded catalog is tuned for.
pub const SUPPORTED_MAX_AGE: i32 = 18;

/// The two catalog roles. A combination always pairs one word of each,
/// rendered as "{style} {theme}".
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Role {
    Style,
    Theme,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Style => "style",
            Role::Theme => "theme",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "style" => Some(Role::Style),
            "theme" => Some(Role::Theme),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One catalog word. Inactive words are skipped by selection but never
/// deleted, so historical combination strings stay interpretable.
#[derive(Debug, Clone)]
pub struct GenreWord {
    pub id: i64,
    pub word: String,
    pub role: Role,
    pub min_age: i32,
    pub max_age: i32,
    pub active: bool,
}

impl GenreWord {
    pub fn covers_age(&self, age: i32) -> bool {
        self.min_age <= age && age <= self.max_age
    }
}

#[derive(FromRow)]
struct WordRow {
    id: i64,
    word: String,
    role: String,
    min_age: i32,
    max_age: i32,
    active: bool,
}

impl WordRow {
    fn into_word(self) -> Result<GenreWord> {
        let role = Role::parse(&self.role)
            .with_context(|| format!("unrecognized genre role {:?}", self.role))?;
        Ok(GenreWord {
            id: self.id,
            word: self.word,
            role,
            min_age: self.min_age,
            max_age: self.max_age,
            active: self.active,
        })
    }
}

// (word, min_age, max_age); ranges overlap so every age in the supported
// span has several options per role.
const STYLE_SEEDS: &[(&str, i32, i32)] = &[
    ("Whimsical", 5, 10),
    ("Silly", 5, 9),
    ("Cozy", 5, 8),
    ("Sunny", 5, 8),
    ("Playful", 5, 9),
    ("Magical", 5, 12),
    ("Snowy", 5, 10),
    ("Curious", 6, 11),
    ("Dreamy", 6, 10),
    ("Enchanted", 6, 12),
    ("Brave", 7, 12),
    ("Spooky", 8, 13),
    ("Futuristic", 8, 16),
    ("Daring", 9, 14),
    ("Ancient", 9, 15),
    ("Cosmic", 9, 16),
    ("Medieval", 10, 16),
    ("Mythic", 10, 17),
    ("Steampunk", 12, 18),
    ("Dystopian", 14, 18),
];

const THEME_SEEDS: &[(&str, i32, i32)] = &[
    ("Adventure", 5, 18),
    ("Friendship", 5, 12),
    ("Discovery", 5, 14),
    ("Rescue", 5, 13),
    ("Folktale", 5, 12),
    ("Fable", 5, 11),
    ("Journey", 5, 15),
    ("Comedy", 5, 16),
    ("Treasure", 6, 14),
    ("Mystery", 6, 18),
    ("Fantasy", 6, 18),
    ("Quest", 7, 18),
    ("Sports", 7, 16),
    ("Invention", 8, 16),
    ("Expedition", 9, 17),
    ("Legend", 9, 17),
    ("Survival", 10, 18),
    ("Heist", 11, 18),
    ("Saga", 12, 18),
    ("Thriller", 13, 18),
];

/// Inserts the seed words if they are not already present. Safe to run on
/// every startup; existing rows (including ones an operator deactivated or
/// re-ranged) are left untouched.
pub async fn ensure_seeded(pool: &PgPool) -> Result<()> {
    seed_role(pool, Role::Style, STYLE_SEEDS).await?;
    seed_role(pool, Role::Theme, THEME_SEEDS).await?;
    Ok(())
}

async fn seed_role(pool: &PgPool, role: Role, seeds: &[(&str, i32, i32)]) -> Result<()> {
    for &(word, min_age, max_age) in seeds {
        sqlx::query(
            "INSERT INTO genre_words (word, role, min_age, max_age) VALUES ($1, $2, $3, $4)
             ON CONFLICT (role, word) DO NOTHING",
        )
        .bind(word)
        .bind(role.as_str())
        .bind(min_age)
        .bind(max_age)
        .execute(pool)
        .await
        .with_context(|| format!("failed to seed {role} word {word}"))?;
    }
    Ok(())
}

/// All active words of one role, ordered by word.
pub async fn fetch_active_words(pool: &PgPool, role: Role) -> Result<Vec<GenreWord>> {
    let rows = sqlx::query_as::<_, WordRow>(
        "SELECT id, word, role, min_age, max_age, active FROM genre_words
         WHERE role = $1 AND active = TRUE
         ORDER BY word",
    )
    .bind(role.as_str())
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to load active {role} words"))?;

    rows.into_iter().map(WordRow::into_word).collect()
}

/// Active words of the role whose age range contains `age`. When no active
/// word covers the age (age 0, negative, far above the seeded span), every
/// active word of the role qualifies instead; selection must keep working for
/// ages the catalog was never tuned for.
pub async fn active_words_for_role(pool: &PgPool, role: Role, age: i32) -> Result<Vec<GenreWord>> {
    let words = fetch_active_words(pool, role).await?;

    if !words.is_empty() && !words.iter().any(|word| word.covers_age(age)) {
        warn!(
            role = role.as_str(),
            age, "no active words cover this age; using the full role list"
        );
    }

    Ok(filter_by_age(words, age))
}

fn filter_by_age(words: Vec<GenreWord>, age: i32) -> Vec<GenreWord> {
    if words.iter().any(|word| word.covers_age(age)) {
        words
            .into_iter()
            .filter(|word| word.covers_age(age))
            .collect()
    } else {
        words
    }
}

#[cfg(test)]
pub(crate) fn seeded_words(role: Role) -> Vec<GenreWord> {
    let seeds = match role {
        Role::Style => STYLE_SEEDS,
        Role::Theme => THEME_SEEDS,
    };
    seeds
        .iter()
        .enumerate()
        .map(|(idx, &(word, min_age, max_age))| GenreWord {
            id: idx as i64 + 1,
            word: word.to_string(),
            role,
            min_age,
            max_age,
            active: true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seed_lists_hold_twenty_words_each() {
        assert_eq!(STYLE_SEEDS.len(), 20);
        assert_eq!(THEME_SEEDS.len(), 20);
    }

    #[test]
    fn seed_words_are_unique_within_role() {
        for seeds in [STYLE_SEEDS, THEME_SEEDS] {
            let distinct: HashSet<&str> = seeds.iter().map(|&(word, _, _)| word).collect();
            assert_eq!(distinct.len(), seeds.len());
        }
    }

    #[test]
    fn every_supported_age_has_words_in_both_roles() {
        for age in SUPPORTED_MIN_AGE..=SUPPORTED_MAX_AGE {
            for seeds in [STYLE_SEEDS, THEME_SEEDS] {
                let covered = seeds
                    .iter()
                    .any(|&(_, min_age, max_age)| min_age <= age && age <= max_age);
                assert!(covered, "no seed word covers age {age}");
            }
        }
    }

    #[test]
    fn age_filter_keeps_only_covering_words() {
        let youngest = filter_by_age(seeded_words(Role::Style), SUPPORTED_MIN_AGE);
        assert!(!youngest.is_empty());
        assert!(youngest.iter().all(|word| word.covers_age(SUPPORTED_MIN_AGE)));
        assert!(youngest.iter().all(|word| word.word != "Spooky"));

        let oldest = filter_by_age(seeded_words(Role::Style), SUPPORTED_MAX_AGE);
        assert!(!oldest.is_empty());
        assert!(oldest.iter().all(|word| word.covers_age(SUPPORTED_MAX_AGE)));
    }

    #[test]
    fn age_filter_falls_back_to_full_list_for_uncovered_ages() {
        for age in [0, -5, 100] {
            let filtered = filter_by_age(seeded_words(Role::Theme), age);
            assert_eq!(filtered.len(), THEME_SEEDS.len());
        }
    }

    #[test]
    fn role_column_values_round_trip() {
        for role in [Role::Style, Role::Theme] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("plot"), None);
    }
}
