//! Projection Module
//!
//! Reduces an upstream entry to the minimal shape kept for batch lookups.

use serde::{Deserialize, Serialize};

use crate::upstream::{SpeciesDetail, Sprites};

/// Whitelisted subset of an upstream entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedItem {
    pub id: u64,
    pub name: String,
    pub types: Vec<ProjectedType>,
    pub sprites: ProjectedSprites,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedType {
    pub slot: u32,
    #[serde(rename = "type")]
    pub kind: TypeName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeName {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedSprites {
    pub front_default: Option<String>,
    /// Serialized as `{}` when no high-resolution artwork exists
    #[serde(default)]
    pub other: ProjectedArtwork,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedArtwork {
    #[serde(
        rename = "official-artwork",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub official_artwork: Option<ArtworkRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkRef {
    pub front_default: String,
}

impl ProjectedItem {
    /// Keeps id, name, ordered type slots and the image references.
    pub fn from_detail(detail: SpeciesDetail) -> Self {
        let SpeciesDetail {
            id,
            name,
            sprites,
            mut types,
            ..
        } = detail;

        types.sort_by_key(|t| t.slot);

        Self {
            id,
            name,
            types: types
                .into_iter()
                .map(|t| ProjectedType {
                    slot: t.slot,
                    kind: TypeName { name: t.kind.name },
                })
                .collect(),
            sprites: ProjectedSprites::from(sprites),
        }
    }
}

impl From<SpeciesDetail> for ProjectedItem {
    fn from(detail: SpeciesDetail) -> Self {
        Self::from_detail(detail)
    }
}

impl From<Sprites> for ProjectedSprites {
    fn from(sprites: Sprites) -> Self {
        // Only a non-empty artwork URL counts as a high-resolution variant
        let official_artwork = sprites
            .other
            .and_then(|other| other.official_artwork)
            .and_then(|artwork| artwork.front_default)
            .filter(|url| !url.is_empty())
            .map(|front_default| ArtworkRef { front_default });

        Self {
            front_default: sprites.front_default,
            other: ProjectedArtwork { official_artwork },
        }
    }
}
