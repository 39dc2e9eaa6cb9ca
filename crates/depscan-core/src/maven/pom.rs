//! POM parsing.

use crate::model::Coordinate;
use crate::remote::metadata::{interpolate, DeclaredDependency, PackageMetadata};
use roxmltree::{Document, Node};
use std::borrow::Cow;

/// A parsed POM: its metadata plus the module list of an aggregator.
#[derive(Debug, Clone)]
pub struct Pom {
    pub metadata: PackageMetadata,
    /// `<modules>` entries, relative directory paths.
    pub modules: Vec<String>,
    pub packaging: String,
}

/// Parse POM XML.
///
/// Group and version fall back to the `<parent>` values when the project
/// omits them. A `${...}` in the project version is expanded from the POM's
/// own properties. Dependency versions are left raw until the parent merge.
///
/// # Errors
/// Returns a message when the document is not XML, has no `<project>`, or
/// lacks the identifying elements.
pub fn parse_pom(xml: &str) -> Result<Pom, String> {
    let normalized = normalize_xml_entities(xml);
    let document = Document::parse(normalized.as_ref()).map_err(|e| format!("Invalid XML: {e}"))?;
    let project = document
        .descendants()
        .find(|node| node.has_tag_name("project"))
        .ok_or_else(|| "Missing <project> element".to_string())?;

    let parent = child(&project, "parent").map(parse_parent).transpose()?;

    let artifact_id =
        node_text(&project, "artifactId").ok_or_else(|| "Missing <artifactId>".to_string())?;
    let group_id = node_text(&project, "groupId")
        .or_else(|| parent.as_ref().and_then(|p| p.name.split_once(':')).map(|(g, _)| g.to_string()))
        .ok_or_else(|| "Missing <groupId>".to_string())?;
    let version = node_text(&project, "version")
        .or_else(|| parent.as_ref().map(|p| p.version.clone()))
        .ok_or_else(|| "Missing <version>".to_string())?;

    let mut metadata = PackageMetadata::new(Coordinate::new(format!("{group_id}:{artifact_id}"), version));
    metadata.parent = parent;
    metadata.properties = parse_properties(&project);

    let version = interpolate(&metadata.coordinate.version, &metadata.properties);
    metadata.coordinate.version = version;

    metadata.managed = child(&project, "dependencyManagement")
        .map(|dm| parse_dependency_list(&dm))
        .unwrap_or_default()
        .into_iter()
        // BOM imports are not followed
        .filter(|d| d.scope.as_deref() != Some("import"))
        .collect();
    metadata.requires = parse_dependency_list(&project);

    let modules = child(&project, "modules")
        .map(|modules| {
            modules
                .children()
                .filter(|c| c.is_element() && c.tag_name().name() == "module")
                .filter_map(|c| c.text())
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Ok(Pom {
        metadata,
        modules,
        packaging: node_text(&project, "packaging").unwrap_or_else(|| "jar".to_string()),
    })
}

fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == tag)
}

fn node_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|c| c.text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn parse_parent(node: Node<'_, '_>) -> Result<Coordinate, String> {
    let group_id = node_text(&node, "groupId").ok_or_else(|| "Missing parent <groupId>".to_string())?;
    let artifact_id =
        node_text(&node, "artifactId").ok_or_else(|| "Missing parent <artifactId>".to_string())?;
    let version = node_text(&node, "version").ok_or_else(|| "Missing parent <version>".to_string())?;
    Ok(Coordinate::new(format!("{group_id}:{artifact_id}"), version))
}

fn parse_properties(project: &Node<'_, '_>) -> std::collections::BTreeMap<String, String> {
    child(project, "properties")
        .map(|props| {
            props
                .children()
                .filter(Node::is_element)
                .map(|prop| {
                    let key = prop.tag_name().name().to_string();
                    let value = prop.text().map(|t| t.trim().to_string()).unwrap_or_default();
                    (key, value)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Read the `<dependencies>` under `parent`. Entries without a group or
/// artifact are skipped.
fn parse_dependency_list(parent: &Node<'_, '_>) -> Vec<DeclaredDependency> {
    let Some(list) = child(parent, "dependencies") else {
        return Vec::new();
    };

    list.children()
        .filter(|c| c.is_element() && c.tag_name().name() == "dependency")
        .filter_map(|dep| {
            let group_id = node_text(&dep, "groupId")?;
            let artifact_id = node_text(&dep, "artifactId")?;
            let mut declared = DeclaredDependency::new(
                format!("{group_id}:{artifact_id}"),
                node_text(&dep, "version").unwrap_or_default(),
            );
            declared.scope = node_text(&dep, "scope");
            declared.optional = node_text(&dep, "optional")
                .is_some_and(|value| value.eq_ignore_ascii_case("true"));
            Some(declared)
        })
        .collect()
}

/// Replace entities XML does not predefine (HTML leftovers such as `&nbsp;`
/// in descriptions) so the parser accepts the document.
fn normalize_xml_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(at) = rest.find('&') {
        output.push_str(&rest[..at]);
        let after = &rest[at + 1..];
        let entity_end = after
            .char_indices()
            .take(32)
            .find(|(_, c)| *c == ';')
            .map(|(i, _)| i);

        match entity_end {
            Some(end) => {
                let name = &after[..end];
                let known = matches!(
                    name.to_ascii_lowercase().as_str(),
                    "lt" | "gt" | "amp" | "quot" | "apos"
                ) || name.starts_with('#');
                if known {
                    output.push('&');
                    output.push_str(&after[..=end]);
                } else {
                    output.push(' ');
                }
                rest = &after[end + 1..];
            }
            None => {
                output.push_str("&amp;");
                rest = after;
            }
        }
    }
    output.push_str(rest);
    Cow::Owned(output)
}
