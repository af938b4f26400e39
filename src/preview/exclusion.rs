use crate::error::PreviewError;
use crate::store::{SchemeId, SchemeStore};
use crate::tree::PipelineTree;
use ahash::AHashSet;

/// Activities to skip when running the given execution schemes.
///
/// A scheme lists the nodes it runs, so everything outside the union of the requested
/// schemes is excluded, except non-optional activities which always run. With no
/// scheme ids nothing is excluded. With `check_exist`, scheme ids the store does not
/// know fail the call.
///
/// The result follows activity declaration order.
pub fn excluded_by_schemes(
    tree: &PipelineTree,
    scheme_ids: &[SchemeId],
    check_exist: bool,
    store: &dyn SchemeStore,
) -> Result<Vec<String>, PreviewError> {
    if scheme_ids.is_empty() {
        return Ok(Vec::new());
    }

    let schemes = store.fetch_scheme_node_ids(scheme_ids)?;
    if check_exist {
        let mut missing: Vec<SchemeId> = scheme_ids
            .iter()
            .filter(|id| !schemes.contains_key(*id))
            .copied()
            .collect();
        if !missing.is_empty() {
            missing.sort_unstable();
            missing.dedup();
            return Err(PreviewError::SchemeNotFound { missing });
        }
    }

    let included: AHashSet<&str> = schemes
        .values()
        .flat_map(|nodes| nodes.iter().map(String::as_str))
        .collect();

    Ok(tree
        .activities()
        .filter(|a| a.is_optional() && !included.contains(a.id.as_str()))
        .map(|a| a.id.clone())
        .collect())
}

/// Activities to skip when only `appoint_ids` should run.
///
/// Non-optional activities are never excluded, appointed or not.
pub fn excluded_by_appoint<S: AsRef<str>>(tree: &PipelineTree, appoint_ids: &[S]) -> Vec<String> {
    let appointed: AHashSet<&str> = appoint_ids.iter().map(AsRef::as_ref).collect();
    tree.activities()
        .filter(|a| a.is_optional() && !appointed.contains(a.id.as_str()))
        .map(|a| a.id.clone())
        .collect()
}
