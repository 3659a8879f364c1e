//! Genre tags used for the home feed and search suggestions.

use rand::seq::SliceRandom;

/// Genres sampled when the popular feed is unavailable
pub const FEED_GENRES: [&str; 5] = ["rock", "pop", "electronic", "jazz", "instrumental"];

/// Fallback genres for searches that match no keyword
pub const SUGGESTION_GENRES: [&str; 4] = ["rock", "pop", "electronic", "instrumental"];

const KEYWORDS: [(&[&str], &str); 10] = [
    (&["rock"], "rock"),
    (&["pop"], "pop"),
    (&["jazz"], "jazz"),
    (&["electronic", "edm"], "electronic"),
    (&["acoustic"], "acoustic"),
    (&["piano"], "piano"),
    (&["guitar"], "guitar"),
    (&["chill", "relax"], "chillout"),
    (&["ambient"], "ambient"),
    (&["dance"], "dance"),
];

/// Genre tag matching a free-text query, if any keyword hits.
///
/// Keywords are checked in a fixed order, so "pop rock" maps to "rock".
pub fn keyword_genre(query: &str) -> Option<&'static str> {
    let lower = query.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
        .map(|(_, genre)| *genre)
}

/// Genre tag to suggest alongside search results
pub fn related_genre(query: &str) -> &'static str {
    keyword_genre(query).unwrap_or_else(|| random_of(&SUGGESTION_GENRES))
}

pub(crate) fn random_feed_genre() -> &'static str {
    random_of(&FEED_GENRES)
}

fn random_of(genres: &[&'static str]) -> &'static str {
    genres.choose(&mut rand::thread_rng()).copied().unwrap_or("rock")
}
