//! Declarative attribute table for the volume resource and the typed diff
//! between recorded state and desired configuration.

use crate::volume::{ValidationError, VolumeConfig, VolumeState};

/// Value kind carried by an attribute.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttributeKind {
    /// UTF-8 string.
    String,
    /// Unsigned integer.
    Integer,
}

/// How an attribute is supplied.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Presence {
    /// Must be set by the configuration.
    Required,
    /// May be set by the configuration; otherwise left unset.
    Optional,
    /// May be set by the configuration; otherwise filled in by the provider.
    OptionalComputed,
    /// Only ever set by the provider.
    Computed,
}

/// Description of a single resource attribute.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Attribute {
    /// Attribute name as exposed to the plan engine.
    pub name: &'static str,
    /// Value kind.
    pub kind: AttributeKind,
    /// Whether the attribute is required, optional, or computed.
    pub presence: Presence,
    /// Changing the attribute replaces the volume.
    pub force_new: bool,
    /// Attributes that cannot be set together with this one.
    pub conflicts_with: &'static [&'static str],
    /// Allowed values, when the attribute is an enumeration.
    pub allowed_values: &'static [&'static str],
    /// Human-readable description.
    pub description: &'static str,
}

impl Attribute {
    const fn new(
        name: &'static str,
        kind: AttributeKind,
        presence: Presence,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            kind,
            presence,
            force_new: false,
            conflicts_with: &[],
            allowed_values: &[],
            description,
        }
    }

    const fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    const fn conflicts_with(mut self, others: &'static [&'static str]) -> Self {
        self.conflicts_with = others;
        self
    }

    const fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.allowed_values = values;
        self
    }
}

/// Attribute table of the Instance volume resource.
pub const VOLUME_SCHEMA: &[Attribute] = &[
    Attribute::new(
        "name",
        AttributeKind::String,
        Presence::OptionalComputed,
        "The name of the volume",
    ),
    Attribute::new(
        "type",
        AttributeKind::String,
        Presence::Required,
        "The volume type",
    )
    .force_new()
    .one_of(&["b_ssd", "l_ssd"]),
    Attribute::new(
        "size_in_gb",
        AttributeKind::Integer,
        Presence::Optional,
        "The size of the volume in gigabyte",
    )
    .conflicts_with(&["from_snapshot_id", "from_volume_id"]),
    Attribute::new(
        "from_volume_id",
        AttributeKind::String,
        Presence::Optional,
        "Create a copy of an existing volume",
    )
    .force_new()
    .conflicts_with(&["from_snapshot_id", "size_in_gb"]),
    Attribute::new(
        "from_snapshot_id",
        AttributeKind::String,
        Presence::Optional,
        "Create a volume based on a snapshot",
    )
    .force_new()
    .conflicts_with(&["from_volume_id", "size_in_gb"]),
    Attribute::new(
        "server_id",
        AttributeKind::String,
        Presence::Computed,
        "The server associated with this volume",
    ),
    Attribute::new(
        "organization_id",
        AttributeKind::String,
        Presence::Computed,
        "The organization the volume belongs to",
    ),
    Attribute::new(
        "project_id",
        AttributeKind::String,
        Presence::OptionalComputed,
        "The project the volume belongs to",
    )
    .force_new(),
    Attribute::new(
        "zone",
        AttributeKind::String,
        Presence::OptionalComputed,
        "The zone the volume lives in",
    )
    .force_new(),
];

/// Looks up an attribute by name.
#[must_use]
pub fn attribute(name: &str) -> Option<&'static Attribute> {
    VOLUME_SCHEMA.iter().find(|attr| attr.name == name)
}

/// In-place changes required to move a volume from its recorded state to the
/// desired configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VolumeDiff {
    /// New name, when it differs from state.
    pub rename: Option<String>,
    /// New size in gigabytes, when it differs from state.
    pub resize: Option<u64>,
}

impl VolumeDiff {
    /// Reports whether no in-place change is required.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rename.is_none() && self.resize.is_none()
    }
}

/// Outcome of comparing desired configuration against recorded state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Plan {
    /// The volume can be updated in place.
    Update(VolumeDiff),
    /// A force-new attribute changed; the volume must be replaced.
    Replace {
        /// First force-new attribute found to differ.
        attribute: &'static str,
    },
}

fn differs(desired: Option<&str>, recorded: Option<&str>) -> bool {
    desired.is_some_and(|value| Some(value) != recorded)
}

/// Compares `desired` against `state`.
///
/// Unset optional attributes in `desired` are treated as unmanaged and never
/// produce a change. Size changes are validated here, so a plan that comes
/// back as [`Plan::Update`] is safe to apply.
///
/// # Errors
///
/// Returns [`ValidationError::ResizeNotSupported`] when a size change targets
/// a local volume and [`ValidationError::ResizeDown`] when the requested size
/// is smaller than the recorded one.
pub fn plan(state: &VolumeState, desired: &VolumeConfig) -> Result<Plan, ValidationError> {
    if desired.volume_type != state.volume_type {
        return Ok(Plan::Replace { attribute: "type" });
    }
    if differs(desired.zone.as_deref(), Some(state.zone.as_str())) {
        return Ok(Plan::Replace { attribute: "zone" });
    }
    if differs(desired.project_id.as_deref(), Some(state.project_id.as_str())) {
        return Ok(Plan::Replace {
            attribute: "project_id",
        });
    }
    if desired.source.from_volume_id() != state.from_volume_id.as_deref() {
        return Ok(Plan::Replace {
            attribute: "from_volume_id",
        });
    }
    if desired.source.from_snapshot_id() != state.from_snapshot_id.as_deref() {
        return Ok(Plan::Replace {
            attribute: "from_snapshot_id",
        });
    }

    let rename = desired
        .name
        .as_ref()
        .filter(|name| **name != state.name)
        .cloned();

    let resize = match desired.source.size_in_gb() {
        Some(requested) if requested != state.size_in_gb => {
            if !state.volume_type.is_resizable() {
                return Err(ValidationError::ResizeNotSupported);
            }
            if requested < state.size_in_gb {
                return Err(ValidationError::ResizeDown {
                    current: state.size_in_gb,
                    requested,
                });
            }
            Some(requested)
        }
        _ => None,
    };

    Ok(Plan::Update(VolumeDiff { rename, resize }))
}
