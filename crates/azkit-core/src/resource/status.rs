use std::fmt;

/// Lifecycle state of a resource entity as seen by this process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResourceStatus {
    /// Not loaded yet.
    #[default]
    Unknown,
    Loading,
    Creating,
    Active,
    Updating,
    Deleting,
    /// Absent in the cloud, either never created or removed.
    Deleted,
    /// A service specific state such as `Stopped` or `Provisioning`.
    Custom(String),
}

impl ResourceStatus {
    /// Map a vendor provisioning/state string.
    pub fn from_remote(state: Option<&str>) -> Self {
        match state.map(str::trim) {
            None | Some("") => Self::Active,
            Some(s) if s.eq_ignore_ascii_case("succeeded")
                || s.eq_ignore_ascii_case("running")
                || s.eq_ignore_ascii_case("ready")
                || s.eq_ignore_ascii_case("active") =>
            {
                Self::Active
            }
            Some(s) if s.eq_ignore_ascii_case("creating") => Self::Creating,
            Some(s) if s.eq_ignore_ascii_case("updating") => Self::Updating,
            Some(s) if s.eq_ignore_ascii_case("deleting") => Self::Deleting,
            Some(s) => Self::Custom(s.to_string()),
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }

    /// An operation is in flight.
    pub fn is_transitional(&self) -> bool {
        matches!(
            self,
            Self::Loading | Self::Creating | Self::Updating | Self::Deleting
        )
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("Unknown"),
            Self::Loading => f.write_str("Loading"),
            Self::Creating => f.write_str("Creating"),
            Self::Active => f.write_str("Active"),
            Self::Updating => f.write_str("Updating"),
            Self::Deleting => f.write_str("Deleting"),
            Self::Deleted => f.write_str("Deleted"),
            Self::Custom(s) => f.write_str(s),
        }
    }
}
