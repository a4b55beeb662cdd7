//! Extension-bundle sniffing from `host.json` and the install-or-skip decision.

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::binding::BindingEnum;
use crate::domain::DomainError;

pub const EXTENSION_BUNDLE_ID: &str = "Microsoft.Azure.Functions.ExtensionBundle";
pub const EXTENSION_BUNDLE_PREVIEW_ID: &str = "Microsoft.Azure.Functions.ExtensionBundle.Preview";

/// Functions host runtime generation a template supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExtensionVersion {
    #[serde(rename = "~1")]
    V1,
    #[serde(rename = "~2")]
    V2,
    #[serde(rename = "~3")]
    V3,
    #[serde(rename = "~4")]
    V4,
}

impl ExtensionVersion {
    /// Map an extension bundle version range such as `[4.*, 5.0.0)` to the
    /// host generation it targets.
    ///
    /// Bundle 1.x shipped with host v2, 2.x with v3, and 3.x onwards with v4.
    pub fn from_bundle_range(range: &str) -> Result<Self, DomainError> {
        let major = range
            .trim()
            .trim_start_matches(['[', '('])
            .split(['.', ',', ')', ']'])
            .next()
            .map(str::trim)
            .and_then(|m| m.parse::<u32>().ok())
            .ok_or_else(|| DomainError::InvalidBundleVersion(range.to_string()))?;

        match major {
            1 => Ok(Self::V2),
            2 => Ok(Self::V3),
            3.. => Ok(Self::V4),
            0 => Err(DomainError::InvalidBundleVersion(range.to_string())),
        }
    }

    /// Read `/extensionBundle/version` from a parsed `host.json`.
    ///
    /// Missing or unparsable ranges yield `None`, which disables template
    /// filtering.
    pub fn from_host_json(host: &Value) -> Option<Self> {
        host.pointer("/extensionBundle/version")
            .and_then(Value::as_str)
            .and_then(|range| Self::from_bundle_range(range).ok())
    }
}

impl fmt::Display for ExtensionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "~1"),
            Self::V2 => write!(f, "~2"),
            Self::V3 => write!(f, "~3"),
            Self::V4 => write!(f, "~4"),
        }
    }
}

/// `/extensionBundle/id` of a parsed `host.json`.
pub fn extension_bundle_id(host: &Value) -> Option<&str> {
    host.pointer("/extensionBundle/id").and_then(Value::as_str)
}

/// Why extension installation was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Flag,
    BundleConfigured,
    HttpOnly,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag => write!(f, "skipInstallExtensions flag is set, skip install extension"),
            Self::BundleConfigured => write!(f, "Extension bundle specified, skip install extension"),
            Self::HttpOnly => write!(f, "Skip install Function extension for HTTP Trigger Functions"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionDecision {
    Install,
    Skip(SkipReason),
}

/// Decide whether `func extensions install` has to run for a staged app.
pub fn extension_install_decision(
    skip_flag: bool,
    host_json: Option<&Value>,
    bindings: &BTreeSet<BindingEnum>,
) -> ExtensionDecision {
    if skip_flag {
        return ExtensionDecision::Skip(SkipReason::Flag);
    }

    let recognised_bundle = host_json.and_then(extension_bundle_id).is_some_and(|id| {
        id.eq_ignore_ascii_case(EXTENSION_BUNDLE_ID)
            || id.eq_ignore_ascii_case(EXTENSION_BUNDLE_PREVIEW_ID)
    });
    if recognised_bundle {
        return ExtensionDecision::Skip(SkipReason::BundleConfigured);
    }

    if bindings.iter().all(|b| b.is_builtin_http()) {
        return ExtensionDecision::Skip(SkipReason::HttpOnly);
    }

    ExtensionDecision::Install
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bundle_ranges_map_to_host_versions() {
        assert_eq!(
            ExtensionVersion::from_bundle_range("[4.*, 5.0.0)").unwrap(),
            ExtensionVersion::V4
        );
        assert_eq!(
            ExtensionVersion::from_bundle_range("[3.3.0, 4.0.0)").unwrap(),
            ExtensionVersion::V4
        );
        assert_eq!(
            ExtensionVersion::from_bundle_range("[2.*, 3.0.0)").unwrap(),
            ExtensionVersion::V3
        );
        assert_eq!(
            ExtensionVersion::from_bundle_range("[1.*, 2.0.0)").unwrap(),
            ExtensionVersion::V2
        );
        assert!(ExtensionVersion::from_bundle_range("latest").is_err());
    }

    #[test]
    fn host_json_without_bundle_has_no_version() {
        assert_eq!(ExtensionVersion::from_host_json(&json!({"version": "2.0"})), None);
    }

    fn kinds(list: &[BindingEnum]) -> BTreeSet<BindingEnum> {
        list.iter().copied().collect()
    }

    #[test]
    fn flag_skips_install() {
        let decision =
            extension_install_decision(true, None, &kinds(&[BindingEnum::QueueTrigger]));
        assert_eq!(decision, ExtensionDecision::Skip(SkipReason::Flag));
    }

    #[test]
    fn recognised_bundle_skips_install_case_insensitively() {
        let host = json!({"extensionBundle": {"id": "microsoft.azure.functions.extensionbundle.preview"}});
        let decision =
            extension_install_decision(false, Some(&host), &kinds(&[BindingEnum::QueueTrigger]));
        assert_eq!(decision, ExtensionDecision::Skip(SkipReason::BundleConfigured));
    }

    #[test]
    fn http_only_skips_install() {
        let decision = extension_install_decision(
            false,
            Some(&json!({"version": "2.0"})),
            &kinds(&[BindingEnum::HttpTrigger, BindingEnum::HttpOutput]),
        );
        assert_eq!(decision, ExtensionDecision::Skip(SkipReason::HttpOnly));
    }

    #[test]
    fn other_bindings_install() {
        let host = json!({"extensionBundle": {"id": "Contoso.Bundle"}});
        let decision = extension_install_decision(
            false,
            Some(&host),
            &kinds(&[BindingEnum::HttpTrigger, BindingEnum::BlobOutput]),
        );
        assert_eq!(decision, ExtensionDecision::Install);
    }
}
