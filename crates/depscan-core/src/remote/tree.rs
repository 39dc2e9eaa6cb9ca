//! Dependency tree assembly by on-demand remote resolution.

use super::error::ResolveError;
use super::metadata::DeclaredDependency;
use super::resolver::Resolver;
use crate::lockfile::MAX_ANCESTORS;
use crate::model::{Coordinate, DependencyNode};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::debug;

/// Build the dependency tree rooted at `root`.
///
/// Every declared requirement of the root is followed. Below the root only
/// requirements visible to consumers are (see
/// [`DeclaredDependency::is_transitive`]). Sibling subtrees are resolved
/// concurrently and kept in declaration order.
///
/// A coordinate that cannot be resolved becomes a leaf with its requested
/// name and constraint. The only error is cancellation.
pub async fn build_dep_tree(
    resolver: &Resolver,
    root: &Coordinate,
) -> Result<DependencyNode, ResolveError> {
    let node = build_node(resolver, root.clone(), Vec::new()).await?;
    // An empty ancestor path never suppresses the root.
    Ok(node.unwrap_or_else(|| DependencyNode::leaf(root.name.clone(), root.version.clone())))
}

/// Build one subtree. `ancestors` holds the resolved coordinates on the path
/// from the root down to, but not including, this node.
fn build_node(
    resolver: &Resolver,
    request: Coordinate,
    ancestors: Vec<Coordinate>,
) -> BoxFuture<'_, Result<Option<DependencyNode>, ResolveError>> {
    async move {
        if ancestors.len() > MAX_ANCESTORS || ancestors.contains(&request) {
            return Ok(None);
        }

        let metadata = match resolver.resolve(&request).await {
            Ok(metadata) => metadata,
            Err(ResolveError::Cancelled) => return Err(ResolveError::Cancelled),
            Err(e) => {
                debug!(coordinate = %request, error = %e, "Unresolved, keeping declared constraint");
                return Ok(Some(DependencyNode::leaf(request.name, request.version)));
            }
        };

        // The request may have been a range that resolved onto an ancestor.
        if ancestors.contains(&metadata.coordinate) {
            return Ok(None);
        }

        let is_root = ancestors.is_empty();
        let requests: Vec<Coordinate> = metadata
            .requires
            .iter()
            .filter(|dep| is_root || dep.is_transitive())
            .map(DeclaredDependency::coordinate)
            .collect();

        let mut path = ancestors;
        path.push(metadata.coordinate.clone());

        let children: Vec<Option<DependencyNode>> = stream::iter(
            requests
                .into_iter()
                .map(|child| build_node(resolver, child, path.clone())),
        )
        .buffered(resolver.max_concurrency())
        .try_collect()
        .await?;

        Ok(Some(DependencyNode {
            name: metadata.coordinate.name.clone(),
            version: metadata.coordinate.version.clone(),
            dependencies: children.into_iter().flatten().collect(),
        }))
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::metadata::PackageMetadata;
    use crate::remote::repository::testing::MemoryRepository;
    use crate::remote::repository::Repository;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn coord(name: &str, version: &str) -> Coordinate {
        Coordinate::new(name, version)
    }

    fn pkg(name: &str, version: &str, requires: &[(&str, &str)]) -> PackageMetadata {
        PackageMetadata::new(coord(name, version)).with_requires(
            requires
                .iter()
                .map(|(n, v)| DeclaredDependency::new(*n, *v))
                .collect(),
        )
    }

    fn resolver(repo: MemoryRepository) -> Resolver {
        Resolver::new(CancellationToken::new()).with_repository(Arc::new(repo))
    }

    #[tokio::test]
    async fn test_parent_merge_scenario() {
        let repo = MemoryRepository::new("mem")
            .with(PackageMetadata::new(coord("g:x", "1.0")).with_parent(coord("g:y", "2.0")))
            .with(pkg("g:y", "2.0", &[("g:z", "1.0")]))
            .with(pkg("g:z", "1.0", &[]));

        let tree = build_dep_tree(&resolver(repo), &coord("g:x", "1.0"))
            .await
            .unwrap();

        assert_eq!(tree.name, "g:x");
        assert_eq!(tree.dependencies, vec![DependencyNode::leaf("g:z", "1.0")]);
    }

    #[tokio::test]
    async fn test_unresolved_child_becomes_leaf() {
        let repo = MemoryRepository::new("mem").with(pkg("g:a", "1", &[("g:missing", "[2.0,)")]));

        let tree = build_dep_tree(&resolver(repo), &coord("g:a", "1")).await.unwrap();
        assert_eq!(
            tree.dependencies,
            vec![DependencyNode::leaf("g:missing", "[2.0,)")]
        );
    }

    #[tokio::test]
    async fn test_unresolved_root_becomes_leaf() {
        let tree = build_dep_tree(&resolver(MemoryRepository::new("mem")), &coord("foo/bar", "^2.0"))
            .await
            .unwrap();
        assert_eq!(tree, DependencyNode::leaf("foo/bar", "^2.0"));
    }

    #[tokio::test]
    async fn test_malformed_child_becomes_leaf() {
        let repo = MemoryRepository::new("mem")
            .with(pkg("g:a", "1", &[("g:bad", "1")]))
            .with_error(coord("g:bad", "1"), ResolveError::malformed("g:bad", "broken xml"));

        let tree = build_dep_tree(&resolver(repo), &coord("g:a", "1")).await.unwrap();
        assert_eq!(tree.dependencies, vec![DependencyNode::leaf("g:bad", "1")]);
    }

    #[tokio::test]
    async fn test_cycle_terminates() {
        let repo = MemoryRepository::new("mem")
            .with(pkg("g:a", "1", &[("g:b", "1")]))
            .with(pkg("g:b", "1", &[("g:a", "1")]));

        let tree = build_dep_tree(&resolver(repo), &coord("g:a", "1")).await.unwrap();
        assert_eq!(tree.depth(), 2);
    }

    #[tokio::test]
    async fn test_range_resolving_onto_ancestor_terminates() {
        let repo = MemoryRepository::new("mem")
            .with(pkg("g:a", "1", &[("g:b", "1")]))
            .with(pkg("g:b", "1", &[("g:a", "[1,2)")]))
            .with_alias(coord("g:a", "[1,2)"), pkg("g:a", "1", &[("g:b", "1")]));

        let tree = build_dep_tree(&resolver(repo), &coord("g:a", "1")).await.unwrap();
        assert!(tree.child("g:b").unwrap().dependencies.is_empty());
    }

    #[tokio::test]
    async fn test_depth_bound() {
        let repo = MemoryRepository::new("mem")
            .with(pkg("a", "1", &[("b", "1")]))
            .with(pkg("b", "1", &[("c", "1")]))
            .with(pkg("c", "1", &[("d", "1")]))
            .with(pkg("d", "1", &[("e", "1")]))
            .with(pkg("e", "1", &[("f", "1")]))
            .with(pkg("f", "1", &[]));

        let tree = build_dep_tree(&resolver(repo), &coord("a", "1")).await.unwrap();
        assert_eq!(tree.depth(), MAX_ANCESTORS + 1);
    }

    #[tokio::test]
    async fn test_children_keep_declaration_order() {
        let repo = MemoryRepository::new("mem")
            .with(pkg("root", "1", &[("zeta", "1"), ("alpha", "1"), ("mid", "1")]))
            .with(pkg("zeta", "1", &[]))
            .with(pkg("alpha", "1", &[]))
            .with(pkg("mid", "1", &[]));

        let tree = build_dep_tree(&resolver(repo), &coord("root", "1")).await.unwrap();
        let names: Vec<&str> = tree.dependencies.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[tokio::test]
    async fn test_non_transitive_scopes_skipped_below_root() {
        let repo = MemoryRepository::new("mem")
            .with(
                PackageMetadata::new(coord("app", "1")).with_requires(vec![
                    DeclaredDependency::new("lib", "1"),
                    DeclaredDependency::new("junit", "4").with_scope("test"),
                ]),
            )
            .with(PackageMetadata::new(coord("lib", "1")).with_requires(vec![
                DeclaredDependency::new("runtime-dep", "1").with_scope("runtime"),
                DeclaredDependency::new("mockito", "2").with_scope("test"),
                DeclaredDependency::new("servlet", "3").with_scope("provided"),
                DeclaredDependency::new("extra", "1").with_optional(true),
            ]))
            .with(pkg("junit", "4", &[]))
            .with(pkg("runtime-dep", "1", &[]));

        let tree = build_dep_tree(&resolver(repo), &coord("app", "1")).await.unwrap();

        assert!(tree.child("junit").is_some());
        let lib = tree.child("lib").unwrap();
        let names: Vec<&str> = lib.dependencies.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["runtime-dep"]);
    }

    #[tokio::test]
    async fn test_shared_subtree_fetched_once() {
        let repo = Arc::new(
            MemoryRepository::new("mem")
                .with(pkg("root", "1", &[("left", "1"), ("right", "1")]))
                .with(pkg("left", "1", &[("shared", "1")]))
                .with(pkg("right", "1", &[("shared", "1")]))
                .with(pkg("shared", "1", &[])),
        );
        let resolver = Resolver::new(CancellationToken::new())
            .with_repository(Arc::clone(&repo) as Arc<dyn Repository>)
            .with_max_concurrency(1);

        let tree = build_dep_tree(&resolver, &coord("root", "1")).await.unwrap();

        assert!(tree.child("left").unwrap().child("shared").is_some());
        assert!(tree.child("right").unwrap().child("shared").is_some());
        let shared_fetches = repo
            .fetched()
            .iter()
            .filter(|c| c.name == "shared")
            .count();
        assert_eq!(shared_fetches, 1);
    }

    #[tokio::test]
    async fn test_cancellation_is_an_error() {
        let repo = MemoryRepository::new("mem").with(pkg("g:a", "1", &[]));
        let cancel = CancellationToken::new();
        let resolver = Resolver::new(cancel.clone()).with_repository(Arc::new(repo));
        cancel.cancel();

        let err = build_dep_tree(&resolver, &coord("g:a", "1")).await.unwrap_err();
        assert_eq!(err, ResolveError::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_during_fetch_aborts_tree() {
        let repo = Arc::new(
            MemoryRepository::new("mem")
                .with(pkg("g:a", "1", &[("g:b", "1"), ("g:c", "1")]))
                .with(pkg("g:b", "1", &[]))
                .with_stall(coord("g:c", "1")),
        );
        let cancel = CancellationToken::new();
        let resolver = Resolver::new(cancel.clone())
            .with_repository(Arc::clone(&repo) as Arc<dyn Repository>);

        let root = coord("g:a", "1");
        let build = build_dep_tree(&resolver, &root);
        let cancel_when_stalled = async {
            repo.wait_for_stall().await;
            cancel.cancel();
        };

        let (result, ()) = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            async { tokio::join!(build, cancel_when_stalled) },
        )
        .await
        .expect("cancellation did not interrupt the pending fetch");

        assert_eq!(result.unwrap_err(), ResolveError::Cancelled);
        assert!(repo.fetched().contains(&coord("g:c", "1")));
    }
}
