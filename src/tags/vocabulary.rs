use crate::entity::Tags;

/// Existence state of a feature, used both as a key prefix
/// (`demolished:building=yes`) and as a bare value (`railway=abandoned`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleStatus {
    // nonexistent, might be built
    Proposed,
    Planned,
    // under maintenance or between groundbreaking and opening
    Construction,
    // existent but not functional
    Disused,
    // dilapidated to nonexistent
    Abandoned,
    Was,
    // nonexistent, still may appear in imagery
    Dismantled,
    Razed,
    Demolished,
    Destroyed,
    Removed,
    Obliterated,
    // existent occasionally, e.g. stormwater drainage basin
    Intermittent,
}

impl LifecycleStatus {
    pub const ALL: [LifecycleStatus; 13] = [
        Self::Proposed,
        Self::Planned,
        Self::Construction,
        Self::Disused,
        Self::Abandoned,
        Self::Was,
        Self::Dismantled,
        Self::Razed,
        Self::Demolished,
        Self::Destroyed,
        Self::Removed,
        Self::Obliterated,
        Self::Intermittent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Planned => "planned",
            Self::Construction => "construction",
            Self::Disused => "disused",
            Self::Abandoned => "abandoned",
            Self::Was => "was",
            Self::Dismantled => "dismantled",
            Self::Razed => "razed",
            Self::Demolished => "demolished",
            Self::Destroyed => "destroyed",
            Self::Removed => "removed",
            Self::Obliterated => "obliterated",
            Self::Intermittent => "intermittent",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == token)
    }
}

pub const PRIMARY_KEYS: [&str; 20] = [
    "building",
    "highway",
    "railway",
    "waterway",
    "aeroway",
    "aerialway",
    "piste:type",
    "boundary",
    "power",
    "amenity",
    "natural",
    "landuse",
    "leisure",
    "military",
    "place",
    "man_made",
    "route",
    "attraction",
    "building:part",
    "indoor",
];

pub const SECONDARY_KEYS: [&str; 22] = [
    "oneway",
    "bridge",
    "tunnel",
    "embankment",
    "cutting",
    "barrier",
    "surface",
    "tracktype",
    "footway",
    "crossing",
    "service",
    "sport",
    "public_transport",
    "location",
    "parking",
    "golf",
    "type",
    "leisure",
    "man_made",
    "indoor",
    "construction",
    "proposed",
];

pub const WIKIDATA_KEYS: [&str; 5] = [
    "wikidata",
    "flag:wikidata",
    "brand:wikidata",
    "network:wikidata",
    "operator:wikidata",
];

/// `highway` values that generally do not allow motor vehicles.
pub const PATH_HIGHWAY_VALUES: [&str; 7] = [
    "path",
    "footway",
    "cycleway",
    "bridleway",
    "pedestrian",
    "corridor",
    "steps",
];

/// Solid and smooth surfaces akin to the assumed default road surface.
pub const PAVED_TAGS: [(&str, &[&str]); 2] = [
    (
        "surface",
        &[
            "paved",
            "asphalt",
            "concrete",
            "chipseal",
            "concrete:lanes",
            "concrete:plates",
        ],
    ),
    ("tracktype", &["grade1"]),
];

/// Solid, if somewhat uncommon surfaces with a high range of smoothness.
pub const SEMIPAVED_TAGS: [(&str, &[&str]); 1] = [(
    "surface",
    &[
        "cobblestone",
        "cobblestone:flattened",
        "unhewn_cobblestone",
        "sett",
        "paving_stones",
        "metal",
        "wood",
    ],
)];

/// Tags whose presence alone makes a way one-directional.
pub const ONEWAY_TAGS: [(&str, &[&str]); 7] = [
    (
        "aerialway",
        &[
            "chair_lift",
            "drag_lift",
            "j-bar",
            "magic_carpet",
            "mixed_lift",
            "platter",
            "rope_tow",
            "t-bar",
            "zip_line",
        ],
    ),
    ("highway", &["motorway"]),
    ("junction", &["circular", "roundabout"]),
    ("man_made", &["goods_conveyor", "piste:halfpipe"]),
    ("piste:type", &["downhill", "sled", "yes"]),
    (
        "seamark:type",
        &[
            "two-way_route",
            "recommended_traffic_lane",
            "separation_lane",
            "separation_roundabout",
        ],
    ),
    (
        "waterway",
        &[
            "canal",
            "ditch",
            "drain",
            "fish_pass",
            "pressurised",
            "river",
            "spillway",
            "stream",
            "tidal_channel",
        ],
    ),
];

/// False for bookkeeping keys that carry no meaning for rendering.
pub fn is_interesting_tag(key: &str) -> bool {
    key != "attribution"
        && key != "created_by"
        && key != "source"
        && key != "odbl"
        && !key.starts_with("source:")
        && !key.starts_with("source_ref")
        && !key.starts_with("tiger:")
}

/// Strips a leading lifecycle prefix: `disused:railway` -> `railway`.
pub fn remove_lifecycle_prefix(key: &str) -> &str {
    match key.split_once(':') {
        Some((prefix, rest)) if LifecycleStatus::from_token(prefix).is_some() => rest,
        _ => key,
    }
}

/// True when the tags imply a direction of travel without an `oneway` tag.
pub fn implies_oneway(tags: &Tags) -> bool {
    ONEWAY_TAGS.iter().any(|(key, values)| {
        tags.get(key)
            .is_some_and(|value| values.contains(&value))
    })
}

pub(crate) fn table_lookup<'a>(table: &'a [(String, Vec<String>)], key: &str) -> Option<&'a [String]> {
    table
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, values)| values.as_slice())
}
