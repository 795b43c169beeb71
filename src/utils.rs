//! Small helpers shared by the fetch transforms: name capitalization, id
//! extraction from resource URLs, sprite URL derivation.

use crate::error::PokedexError;

/// Root of the sprite repository. The path layout below it is fixed by that
/// repository, so the derived URL must match it byte for byte.
pub const SPRITE_BASE_URL: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon";

/// Uppercase the first character of `name` and leave the rest unchanged.
///
/// Reapplying is a no-op: `capitalize("Bulbasaur") == "Bulbasaur"`.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Extract the numeric species id from a resource URL.
///
/// The id is the final path segment before the trailing slash, e.g.
/// `https://pokeapi.co/api/v2/pokemon-species/25/` -> 25. Anything that does
/// not parse as a positive integer is an [`PokedexError::InvalidId`].
pub fn species_id_from_url(url: &str) -> Result<u32, PokedexError> {
    let trimmed = url.trim_end_matches('/');
    let segment = trimmed.rsplit('/').next().unwrap_or(trimmed);
    match segment.parse::<u32>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(PokedexError::InvalidId(url.to_string())),
    }
}

/// Sprite URL for a species id: `{SPRITE_BASE_URL}/{id}.png`, no other
/// formatting.
pub fn sprite_url(id: u32) -> String {
    format!("{}/{}.png", SPRITE_BASE_URL, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_uppercases_first_character_only() {
        assert_eq!(capitalize("bulbasaur"), "Bulbasaur");
        assert_eq!(capitalize("x"), "X");
        assert_eq!(capitalize("ho-oh"), "Ho-oh");
    }

    #[test]
    fn capitalize_is_idempotent() {
        let once = capitalize("ivysaur");
        assert_eq!(capitalize(&once), once);
        assert_eq!(capitalize("Venusaur"), "Venusaur");
    }

    #[test]
    fn capitalize_empty_is_empty() {
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn species_id_from_url_takes_trailing_segment() {
        assert_eq!(
            species_id_from_url("https://pokeapi.co/api/v2/pokemon-species/1/").unwrap(),
            1
        );
        assert_eq!(
            species_id_from_url("https://pokeapi.co/api/v2/pokemon-species/151").unwrap(),
            151
        );
    }

    #[test]
    fn species_id_from_url_rejects_non_numeric() {
        assert!(matches!(
            species_id_from_url("https://pokeapi.co/api/v2/pokemon-species/bulbasaur/"),
            Err(PokedexError::InvalidId(_))
        ));
        assert!(matches!(
            species_id_from_url(""),
            Err(PokedexError::InvalidId(_))
        ));
    }

    #[test]
    fn species_id_from_url_rejects_zero() {
        assert!(matches!(
            species_id_from_url("https://pokeapi.co/api/v2/pokemon-species/0/"),
            Err(PokedexError::InvalidId(_))
        ));
    }

    #[test]
    fn sprite_url_matches_repository_layout() {
        assert_eq!(
            sprite_url(25),
            "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/25.png"
        );
    }
}
