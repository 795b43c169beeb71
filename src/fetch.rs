//! Upstream PokeAPI access.
//!
//! Each page issues exactly one GET over a shared client. The payload
//! reshaping lives in pure `parse_*` functions so it can be exercised on
//! string fixtures without a network.

use serde::Deserialize;

use crate::error::PokedexError;
use crate::models::{PokemonDetail, SimplePokemon};
use crate::utils::{capitalize, species_id_from_url, sprite_url};

/// Progress of the background sprite prefetch, polled by the UI gauge.
#[derive(Debug)]
pub struct PrefetchState {
    pub in_progress: bool,
    pub fetched: usize,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    pokemon_species: Vec<SpeciesEntry>,
}

#[derive(Debug, Deserialize)]
struct SpeciesEntry {
    name: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct PokemonResponse {
    name: String,
    height: u32,
    weight: u32,
    types: Vec<TypeSlot>,
}

#[derive(Debug, Deserialize)]
struct TypeSlot {
    #[serde(rename = "type")]
    type_ref: NamedResource,
}

#[derive(Debug, Deserialize)]
struct NamedResource {
    name: String,
}

/// Reshape a `generation/{id}` payload into the flat, id-sorted listing.
///
/// One entry with a missing field or a bad resource URL fails the whole
/// listing; there is no per-entry skip. An empty `pokemon_species` array is
/// an empty listing, not an error.
pub fn parse_generation(body: &str) -> Result<Vec<SimplePokemon>, PokedexError> {
    let response: GenerationResponse =
        serde_json::from_str(body).map_err(|e| PokedexError::UpstreamMalformed(e.to_string()))?;

    let mut pokemon = response
        .pokemon_species
        .into_iter()
        .map(|entry| {
            let id = species_id_from_url(&entry.url)?;
            Ok(SimplePokemon {
                id,
                name: capitalize(&entry.name),
                image_url: sprite_url(id),
            })
        })
        .collect::<Result<Vec<_>, PokedexError>>()?;
    pokemon.sort_by_key(|p| p.id);
    Ok(pokemon)
}

/// Reshape a `pokemon/{id}` payload into the flat detail view model.
///
/// Only the Pokémon's own name is capitalized; type names stay lowercase in
/// upstream order, primary type first.
pub fn parse_pokemon(id: u32, body: &str) -> Result<PokemonDetail, PokedexError> {
    let response: PokemonResponse =
        serde_json::from_str(body).map_err(|e| PokedexError::UpstreamMalformed(e.to_string()))?;

    Ok(PokemonDetail {
        id,
        name: capitalize(&response.name),
        height: response.height,
        weight: response.weight,
        types: response
            .types
            .into_iter()
            .map(|slot| slot.type_ref.name)
            .collect(),
    })
}

/// Fetch one generation listing.
pub async fn fetch_generation(
    client: &reqwest::Client,
    base_url: &str,
    generation: u32,
) -> Result<Vec<SimplePokemon>, PokedexError> {
    let url = format!("{}/generation/{}", base_url, generation);
    log::debug!("GET {}", url);
    let response = client.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(PokedexError::UpstreamUnavailable(format!(
            "GET {} returned {}",
            url,
            response.status()
        )));
    }
    let body = response.text().await?;
    parse_generation(&body)
}

/// Fetch one Pokémon's detail. An upstream 404 means the id does not exist.
pub async fn fetch_pokemon(
    client: &reqwest::Client,
    base_url: &str,
    id: u32,
) -> Result<PokemonDetail, PokedexError> {
    let url = format!("{}/pokemon/{}", base_url, id);
    log::debug!("GET {}", url);
    let response = client.get(&url).send().await?;
    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(PokedexError::NotFound(id));
    }
    if !response.status().is_success() {
        return Err(PokedexError::UpstreamUnavailable(format!(
            "GET {} returned {}",
            url,
            response.status()
        )));
    }
    let body = response.text().await?;
    parse_pokemon(id, &body)
}

/// Fetch the raw PNG behind a derived sprite URL.
pub async fn fetch_sprite(
    client: &reqwest::Client,
    image_url: &str,
) -> Result<Vec<u8>, PokedexError> {
    let response = client.get(image_url).send().await?;
    if !response.status().is_success() {
        return Err(PokedexError::UpstreamUnavailable(format!(
            "GET {} returned {}",
            image_url,
            response.status()
        )));
    }
    Ok(response.bytes().await?.to_vec())
}
