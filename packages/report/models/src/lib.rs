#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Report domains and their aggregates.
//!
//! Every public-works domain (building rehabilitation, spatial planning,
//! water resources, roads and bridges, agricultural extension and the
//! rice-field inventory) is modelled here as a closed set of enumerations
//! plus one aggregate type that owns its photos. The normalization tables
//! and the road/water multiplier tables live next to the enums they key
//! on so the ingestion pipeline and the read model consult the same data.

#[macro_use]
mod macros;

pub mod agriculture;
pub mod building;
pub mod executive;
pub mod filter;
pub mod normalize;
pub mod rice_field;
pub mod road;
pub mod shared;
pub mod spatial;
pub mod user;
pub mod water;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use filter::{FilterField, FilterKind};

/// The reporting domains served by the portal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Domain {
    /// Public building rehabilitation and new construction
    Building,
    /// Spatial-planning violations
    Spatial,
    /// Irrigation and water-resources damage
    Water,
    /// Road and bridge damage (Bina Marga)
    Road,
    /// Agricultural extension visits
    Agriculture,
    /// Rice-field inventory
    RiceField,
}

impl Domain {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Building,
            Self::Spatial,
            Self::Water,
            Self::Road,
            Self::Agriculture,
            Self::RiceField,
        ]
    }

    /// URL segment under `/api/v1`, also used as the cache namespace.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Building => "reports",
            Self::Spatial => "spatial-planning",
            Self::Water => "water-resources",
            Self::Road => "bina-marga",
            Self::Agriculture => "agriculture",
            Self::RiceField => "rice-fields",
        }
    }

    /// Object-store folder that receives this domain's photos.
    #[must_use]
    pub const fn folder(self) -> &'static str {
        self.slug()
    }

    /// Ordered photo role tags. Tags cycle when a report carries more
    /// photos than there are tags.
    #[must_use]
    pub const fn photo_tags(self) -> &'static [&'static str] {
        match self {
            Self::Building => &["front", "side", "back", "interior"],
            Self::Spatial => &["overview", "violation_detail", "boundary", "supporting"],
            Self::Water => &["before", "damage_detail", "surrounding", "supporting"],
            Self::Road => &["overview", "damage_detail", "measurement", "traffic"],
            Self::Agriculture => &["field", "crop", "farmer", "supporting"],
            Self::RiceField => &[],
        }
    }

    /// Closed set of overview grouping scopes. Because the set is closed,
    /// every cached overview key can be deleted by exact name.
    #[must_use]
    pub const fn overview_scopes(self) -> &'static [&'static str] {
        match self {
            Self::Building => &["all", "rehabilitation", "new_construction"],
            Self::Road => &["all", "road", "bridge"],
            Self::Agriculture => &["all", "pangan", "hortikultura", "perkebunan"],
            Self::Spatial | Self::Water | Self::RiceField => &["all"],
        }
    }

    /// Returns the photo tag for the photo at `index`.
    #[must_use]
    pub fn photo_tag(self, index: usize) -> &'static str {
        let tags = self.photo_tags();
        if tags.is_empty() {
            "photo"
        } else {
            tags[index % tags.len()]
        }
    }
}

/// Geographic placement of a report. Coordinates are stored verbatim as
/// submitted; they are never geocoded from the address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// District (kecamatan), title-cased.
    pub district: String,
    /// Village (desa/kelurahan), title-cased.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub village: Option<String>,
    /// WGS84 latitude in `[-90, 90]`.
    pub latitude: f64,
    /// WGS84 longitude in `[-180, 180]`.
    pub longitude: f64,
    /// Free-form street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// A photo owned by exactly one report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    /// Photo id.
    pub id: String,
    /// Owning report id.
    pub report_id: String,
    /// Absolute public URL of the stored object.
    pub url: String,
    /// Role tag (`front`, `damage_detail`, ...).
    pub tag: String,
    /// Position within the report, starting at 0.
    pub sort_order: i32,
    /// When the photo was attached.
    pub created_at: DateTime<Utc>,
}

/// Stored priority ordinals. Higher sorts first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Priority {
    /// Urgency ordinal.
    pub urgency_rank: i32,
    /// Damage-level ordinal.
    pub damage_rank: i32,
}

/// A report projected onto a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub district: String,
    pub label: String,
    pub category: Option<String>,
    pub status: Option<String>,
    pub reported_at: DateTime<Utc>,
}

/// Authenticated subject decoded from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// `User.id` of the caller.
    pub user_id: String,
    /// Username at token issue time.
    pub username: String,
    /// Role at token issue time.
    pub role: user::Role,
}

impl Principal {
    /// Whether the principal may mutate a record created by `owner_id`.
    #[must_use]
    pub fn can_modify(&self, owner_id: &str) -> bool {
        self.role == user::Role::Superadmin || self.user_id == owner_id
    }
}

/// A persisted domain record together with its owned photos.
///
/// Implemented by each of the six domain aggregates. The pipeline and the
/// repositories are generic over this trait.
pub trait Aggregate:
    Clone + std::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Domain this aggregate belongs to.
    const DOMAIN: Domain;

    /// Filterable query keys for list endpoints.
    const FILTERS: &'static [FilterField];

    /// Record id.
    fn id(&self) -> &str;

    /// `User.id` of the creator.
    fn created_by(&self) -> &str;

    /// Timestamp the report refers to; list ordering and date-range
    /// filters apply to it.
    fn reported_at(&self) -> DateTime<Utc>;

    /// Where the report is located.
    fn location(&self) -> &Location;

    /// Current status code, for domains that carry one.
    fn status(&self) -> Option<&'static str>;

    /// Owned photos in attachment order.
    fn photos(&self) -> &[Photo];

    /// Mutable photo list, or `None` for domains that carry no photos.
    fn photos_mut(&mut self) -> Option<&mut Vec<Photo>>;

    /// Priority ordinals computed from the record's enums.
    fn priority(&self) -> Priority;

    /// The stored value of a filter or grouping column, rendered the way
    /// it compares after normalization.
    fn filter_value(&self, key: &str) -> Option<String>;

    /// The value of a numeric column used by aggregation queries.
    fn metric(&self, key: &str) -> Option<f64>;

    /// Short label shown for the report on a map.
    fn map_label(&self) -> String;

    /// Category shown for the report on a map.
    fn map_category(&self) -> Option<String>;

    /// Projects the report onto a [`MapPoint`].
    fn map_point(&self) -> MapPoint {
        let location = self.location();
        MapPoint {
            id: self.id().to_string(),
            latitude: location.latitude,
            longitude: location.longitude,
            district: location.district.clone(),
            label: self.map_label(),
            category: self.map_category(),
            status: self.status().map(str::to_string),
            reported_at: self.reported_at(),
        }
    }

    /// Stamps `updated_at`.
    fn touch(&mut self, now: DateTime<Utc>);
}
