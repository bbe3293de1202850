use std::collections::HashSet;

use anyhow::{Result, bail};
use rand::Rng;
use serde::Serialize;
use sqlx::PgPool;
use tracing::warn;

use crate::catalog::{self, GenreWord, Role};
use crate::history::{self, RECENT_WINDOW};

/// A proposed style/theme pairing for one story.
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub combination: String,
    pub style_word: String,
    pub theme_word: String,
}

/// Picks a combination for the student, avoiding the `RECENT_WINDOW` most
/// recently used pairings. This is a pure read: the caller records the
/// result via `history::record` once the story is actually persisted.
///
/// Select and record are two calls with no lock between them, so two
/// in-flight requests for the same student can both avoid the same history
/// and return colliding pairs; the recency window only holds airtight under
/// serialized access per student.
///
/// Unknown students select like students with no history. Any age is
/// accepted; ages outside the seeded span fall back to the full catalog
/// (see `catalog::active_words_for_role`). The only failure modes are a
/// store error and a catalog with no active words for a role.
pub async fn select(pool: &PgPool, student_id: i64, age: i32) -> Result<Selection> {
    let styles = catalog::active_words_for_role(pool, Role::Style, age).await?;
    let themes = catalog::active_words_for_role(pool, Role::Theme, age).await?;

    let recent = history::recent(pool, student_id, RECENT_WINDOW).await?;
    let recent_set: HashSet<String> = recent
        .into_iter()
        .map(|entry| entry.combination)
        .collect();

    let Some((style, theme)) =
        pick_combination(&styles, &themes, &recent_set, &mut rand::thread_rng())
    else {
        bail!("genre catalog has no active words for one of the roles");
    };

    let combination = render_combination(&style.word, &theme.word);

    // A draw landing inside the recency window means the cross-product was
    // exhausted and the fallback branch engaged.
    if recent_set.contains(&combination) {
        warn!(
            student_id,
            combination = %combination,
            "recent history exhausted every pairing; repeating a recent combination"
        );
    }

    Ok(Selection {
        combination,
        style_word: style.word.clone(),
        theme_word: theme.word.clone(),
    })
}

/// Draws one style/theme pair uniformly at random, excluding recently used
/// combinations while any unused pair remains. Once recent history covers
/// the whole cross-product, the draw comes from the full cross-product
/// instead of failing. Returns `None` only when a role list is empty.
fn pick_combination<'a, R: Rng>(
    styles: &'a [GenreWord],
    themes: &'a [GenreWord],
    recent: &HashSet<String>,
    rng: &mut R,
) -> Option<(&'a GenreWord, &'a GenreWord)> {
    if styles.is_empty() || themes.is_empty() {
        return None;
    }

    let mut fresh = Vec::with_capacity(styles.len() * themes.len());
    for style in styles {
        for theme in themes {
            if !recent.contains(&render_combination(&style.word, &theme.word)) {
                fresh.push((style, theme));
            }
        }
    }

    if fresh.is_empty() {
        let style = &styles[rng.gen_range(0..styles.len())];
        let theme = &themes[rng.gen_range(0..themes.len())];
        return Some((style, theme));
    }

    Some(fresh[rng.gen_range(0..fresh.len())])
}

fn render_combination(style: &str, theme: &str) -> String {
    format!("{style} {theme}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(role: Role, names: &[&str]) -> Vec<GenreWord> {
        names
            .iter()
            .map(|name| GenreWord {
                id: 0,
                word: name.to_string(),
                role,
                min_age: 5,
                max_age: 18,
                active: true,
            })
            .collect()
    }

    fn cross_product(styles: &[GenreWord], themes: &[GenreWord]) -> HashSet<String> {
        styles
            .iter()
            .flat_map(|style| {
                themes
                    .iter()
                    .map(|theme| render_combination(&style.word, &theme.word))
            })
            .collect()
    }

    #[test]
    fn pick_pairs_one_style_with_one_theme() {
        let styles = words(Role::Style, &["Whimsical", "Spooky"]);
        let themes = words(Role::Theme, &["Mystery", "Quest"]);
        let recent = HashSet::new();

        let (style, theme) =
            pick_combination(&styles, &themes, &recent, &mut rand::thread_rng())
                .expect("catalog is non-empty");

        assert!(styles.iter().any(|w| w.word == style.word));
        assert!(themes.iter().any(|w| w.word == theme.word));
    }

    #[test]
    fn pick_never_returns_a_recent_combination() {
        let styles = words(Role::Style, &["Whimsical", "Spooky"]);
        let themes = words(Role::Theme, &["Mystery", "Quest"]);
        let recent: HashSet<String> = [
            "Whimsical Mystery".to_string(),
            "Whimsical Quest".to_string(),
            "Spooky Mystery".to_string(),
        ]
        .into();

        // Only one pair remains; the draw must land on it every time.
        for _ in 0..50 {
            let (style, theme) =
                pick_combination(&styles, &themes, &recent, &mut rand::thread_rng())
                    .expect("one pair remains");
            assert_eq!(render_combination(&style.word, &theme.word), "Spooky Quest");
        }
    }

    #[test]
    fn pick_falls_back_when_history_covers_every_pair() {
        let styles = words(
            Role::Style,
            &["Whimsical", "Spooky", "Cozy", "Daring", "Magical", "Brave"],
        );
        let themes = words(
            Role::Theme,
            &["Mystery", "Quest", "Rescue", "Heist", "Comedy", "Legend"],
        );
        let recent = cross_product(&styles, &themes);
        assert_eq!(recent.len(), 36);

        let (style, theme) =
            pick_combination(&styles, &themes, &recent, &mut rand::thread_rng())
                .expect("fallback still draws");
        assert!(recent.contains(&render_combination(&style.word, &theme.word)));
    }

    #[test]
    fn pick_requires_words_in_both_roles() {
        let styles = words(Role::Style, &["Whimsical"]);
        let themes = words(Role::Theme, &[]);
        let recent = HashSet::new();

        assert!(pick_combination(&styles, &themes, &recent, &mut rand::thread_rng()).is_none());
        assert!(pick_combination(&themes, &styles, &recent, &mut rand::thread_rng()).is_none());
    }

    #[test]
    fn ten_fresh_draws_from_the_seed_catalog_stay_distinct() {
        let styles = catalog::seeded_words(Role::Style);
        let themes = catalog::seeded_words(Role::Theme);
        let mut seen = HashSet::new();

        // Each draw is fed back into the exclusion set, the way a student's
        // history grows between stories.
        for _ in 0..10 {
            let (style, theme) =
                pick_combination(&styles, &themes, &seen, &mut rand::thread_rng())
                    .expect("pairs remain");
            let combination = render_combination(&style.word, &theme.word);
            assert!(seen.insert(combination));
        }
    }

    #[test]
    fn combination_renders_style_before_theme() {
        assert_eq!(render_combination("Whimsical", "Mystery"), "Whimsical Mystery");
    }
}
