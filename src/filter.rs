//! The listing token and the name filter.
//!
//! A rendered generation view embeds its listing as an opaque serialized
//! token instead of keeping server-side state; the filter action hands the
//! token back together with the query and gets a subset to re-render.

use serde::{Deserialize, Serialize};

use crate::models::SimplePokemon;

/// Current token layout version. Bump when the embedded shape changes.
pub const TOKEN_VERSION: u32 = 1;

/// The serialized listing a view embeds and the filter action echoes back.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListingToken {
    pub v: u32,
    pub pokemon: Vec<SimplePokemon>,
}

/// Serialize a listing into a token string for embedding in the view.
pub fn encode_listing(pokemon: &[SimplePokemon]) -> String {
    let token = ListingToken {
        v: TOKEN_VERSION,
        pokemon: pokemon.to_vec(),
    };
    serde_json::to_string(&token).unwrap_or_default()
}

/// Decode a listing token handed back by the client.
///
/// The token is untrusted input and decoding fails open, wholesale: bad
/// JSON, a wrong shape, or an unknown version all yield an empty listing.
/// The filter action then degrades to "no matches" instead of erroring.
/// Do not turn this into a hard error; callers rely on the tolerant
/// contract.
pub fn decode_listing(raw: &str) -> Vec<SimplePokemon> {
    match serde_json::from_str::<ListingToken>(raw) {
        Ok(token) if token.v == TOKEN_VERSION => token.pokemon,
        Ok(token) => {
            log::warn!("discarding listing token with unknown version {}", token.v);
            Vec::new()
        }
        Err(err) => {
            log::debug!("undecodable listing token: {}", err);
            Vec::new()
        }
    }
}

/// Keep the entries whose name contains `query`, case-insensitively.
///
/// An absent or empty query is the identity. Relative order is preserved
/// and nothing is ever added, so the result is always a subset of the
/// input.
pub fn filter_by_name(list: Vec<SimplePokemon>, query: Option<&str>) -> Vec<SimplePokemon> {
    let query = match query {
        Some(q) if !q.is_empty() => q.to_lowercase(),
        _ => return list,
    };
    list.into_iter()
        .filter(|p| p.name.to_lowercase().contains(&query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::sprite_url;

    fn listing(entries: &[(u32, &str)]) -> Vec<SimplePokemon> {
        entries
            .iter()
            .map(|&(id, name)| SimplePokemon {
                id,
                name: name.to_string(),
                image_url: sprite_url(id),
            })
            .collect()
    }

    fn starters() -> Vec<SimplePokemon> {
        listing(&[(1, "Bulbasaur"), (2, "Ivysaur"), (3, "Venusaur")])
    }

    #[test]
    fn empty_or_absent_query_is_identity() {
        let list = starters();
        assert_eq!(filter_by_name(list.clone(), None), list);
        assert_eq!(filter_by_name(list.clone(), Some("")), list);
    }

    #[test]
    fn filter_matches_substring_case_insensitively() {
        let kept = filter_by_name(starters(), Some("saur"));
        assert_eq!(kept.len(), 3);

        let kept = filter_by_name(starters(), Some("SAUR"));
        assert_eq!(kept.len(), 3);

        let kept = filter_by_name(starters(), Some("ivy"));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "Ivysaur");
    }

    #[test]
    fn filter_with_no_match_is_empty_not_an_error() {
        assert!(filter_by_name(starters(), Some("ZZZ")).is_empty());
    }

    #[test]
    fn filter_preserves_relative_order() {
        let list = listing(&[(4, "Charmander"), (1, "Bulbasaur"), (6, "Charizard")]);
        let kept = filter_by_name(list, Some("char"));
        let ids: Vec<u32> = kept.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![4, 6]);
    }

    #[test]
    fn token_round_trip_preserves_the_listing() {
        let list = starters();
        let token = encode_listing(&list);
        let decoded = decode_listing(&token);
        assert_eq!(decoded, list);
        assert_eq!(decoded[0].name, "Bulbasaur");
        assert_eq!(decoded[0].image_url, sprite_url(1));
    }

    #[test]
    fn undecodable_token_yields_empty_listing() {
        assert!(decode_listing("").is_empty());
        assert!(decode_listing("not json").is_empty());
        assert!(decode_listing("[1, 2, 3]").is_empty());
        assert!(decode_listing(r#"{"pokemon": []}"#).is_empty());
    }

    #[test]
    fn unknown_token_version_yields_empty_listing() {
        let raw = r#"{"v": 2, "pokemon": [{"id": 1, "name": "Bulbasaur", "image_url": "x"}]}"#;
        assert!(decode_listing(raw).is_empty());
    }

    #[test]
    fn filtering_a_round_tripped_token_is_a_subset() {
        let list = starters();
        let token = encode_listing(&list);
        let kept = filter_by_name(decode_listing(&token), Some("venu"));
        assert_eq!(kept.len(), 1);
        assert!(list.contains(&kept[0]));
    }
}
