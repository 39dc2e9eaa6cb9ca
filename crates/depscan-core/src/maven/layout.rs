//! Maven repository layout and `maven-metadata.xml`.

use crate::model::Coordinate;
use crate::remote::error::ResolveError;
use roxmltree::Document;

/// `groupId` and `artifactId` of a `group:artifact` name.
///
/// # Errors
/// Returns `Malformed` when the name has no `:` or an empty half.
pub fn split_name(coordinate: &Coordinate) -> Result<(&str, &str), ResolveError> {
    match coordinate.name.split_once(':') {
        Some((group, artifact)) if !group.is_empty() && !artifact.is_empty() => {
            Ok((group, artifact))
        }
        _ => Err(ResolveError::malformed(
            coordinate.to_string(),
            "Expected a groupId:artifactId name",
        )),
    }
}

/// Relative directory holding every version of an artifact.
#[must_use]
pub fn artifact_dir(group: &str, artifact: &str) -> String {
    format!("{}/{artifact}", group.replace('.', "/"))
}

/// Relative path of a POM.
#[must_use]
pub fn pom_path(group: &str, artifact: &str, version: &str) -> String {
    format!(
        "{}/{version}/{artifact}-{version}.pom",
        artifact_dir(group, artifact)
    )
}

/// Relative path of the remote version listing.
#[must_use]
pub fn metadata_path(group: &str, artifact: &str) -> String {
    format!("{}/maven-metadata.xml", artifact_dir(group, artifact))
}

/// True if a version still needs picking from the version listing.
#[must_use]
pub fn needs_version_listing(version: &str) -> bool {
    let version = version.trim();
    version.is_empty() || super::version::is_range(version)
}

/// True if a version still holds an unexpanded `${...}`.
#[must_use]
pub fn is_unexpanded(version: &str) -> bool {
    version.contains("${")
}

/// Published versions of one artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionListing {
    pub release: Option<String>,
    pub latest: Option<String>,
    pub versions: Vec<String>,
}

impl VersionListing {
    /// The version to use when nothing is asked for.
    #[must_use]
    pub fn preferred(&self) -> Option<&str> {
        self.release.as_deref().or(self.latest.as_deref())
    }
}

/// Parse `maven-metadata.xml`.
///
/// # Errors
/// Returns a message when the document is not XML.
pub fn parse_version_listing(xml: &str) -> Result<VersionListing, String> {
    let document = Document::parse(xml).map_err(|e| format!("Invalid XML: {e}"))?;
    let text_of = |tag: &str| {
        document
            .descendants()
            .find(|n| n.is_element() && n.tag_name().name() == tag)
            .and_then(|n| n.text())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    };

    let versions = document
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "versions")
        .flat_map(|list| list.children())
        .filter(|n| n.is_element() && n.tag_name().name() == "version")
        .filter_map(|n| n.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    Ok(VersionListing {
        release: text_of("release"),
        latest: text_of("latest"),
        versions,
    })
}
