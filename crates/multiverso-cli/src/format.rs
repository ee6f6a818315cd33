use chrono::{DateTime, Utc};
use multiverso_core::{Character, CharacterStatus, Episode};

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a timestamp for display
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%b %d, %Y").to_string()
}

pub fn status_marker(status: CharacterStatus) -> &'static str {
    match status {
        CharacterStatus::Alive => "+",
        CharacterStatus::Dead => "x",
        CharacterStatus::Unknown => "?",
    }
}

/// One line per character in list output
pub fn character_row(character: &Character, favorite: bool) -> String {
    let status = format!("{} {}", status_marker(character.status), character.status);
    format!(
        "{} {:>4}  {:<28} {:<10} {}",
        if favorite { '*' } else { ' ' },
        character.id,
        truncate_string(&character.name, 28),
        status,
        truncate_string(&character.species_display(), 32),
    )
}

pub fn episode_row(episode: &Episode) -> String {
    format!(
        "  {:<44} {}",
        truncate_string(&episode.title(), 44),
        episode.air_date
    )
}
