use serde::{Deserialize, Serialize};

/// One row of a generation listing: enough to render the list entry and
/// link to the detail view. Serialized into the listing token, so it must
/// round-trip through serde unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplePokemon {
    pub id: u32,
    pub name: String,
    pub image_url: String,
}

// Identity is the species id; two entries with the same id refer to the
// same Pokémon whatever the derived fields say.
impl PartialEq for SimplePokemon {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SimplePokemon {}

/// Flat projection of one `pokemon/{id}` payload. Height and weight keep
/// the upstream units (decimeters, hectograms); type names stay lowercase
/// in upstream order, primary type first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PokemonDetail {
    pub id: u32,
    pub name: String,
    pub height: u32,
    pub weight: u32,
    pub types: Vec<String>,
}

/// A fetched generation page. Rebuilt on every fetch, never persisted.
#[derive(Debug, Clone)]
pub struct GenerationView {
    pub generation: u32,
    pub pokemon: Vec<SimplePokemon>,
}
