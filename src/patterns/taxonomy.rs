//! Path walks over the folder taxonomy.

use super::raw::FolderNode;
use super::types::SampleType;

/// Outcome of walking the taxonomy below a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FolderWalk {
    /// Every segment (and the tag, if given) found a place
    Resolved(Vec<String>),
    /// The walk stopped at a point that offers LOOP / ONE SHOT and no tag was given
    NeedsTag(Vec<String>),
    /// A segment or the tag has no place in the tree
    Unresolved,
}

/// Walk `segments` below `node`, placing `tag` wherever the tree offers it.
///
/// Sub-folder names are consumed first. A tag is placed either as the leaf
/// of a tag list (`KICK/LOOP`) or as a mapping key on the way down
/// (`INSTRUMENTS/LOOP/PADS`).
pub(crate) fn walk(node: &FolderNode, segments: &[String], tag: Option<SampleType>) -> FolderWalk {
    let mut path = Vec::with_capacity(segments.len() + 1);
    let mut node = node;
    let mut rest = segments;
    let mut pending = tag;

    loop {
        match node {
            FolderNode::Branch(children) => {
                if let Some((segment, tail)) = rest.split_first()
                    && let Some(child) = children.get(segment)
                {
                    path.push(segment.clone());
                    node = child;
                    rest = tail;
                    continue;
                }

                match pending {
                    Some(t) => {
                        if let Some(child) = children.get(t.as_str()) {
                            path.push(t.as_str().to_string());
                            node = child;
                            pending = None;
                            continue;
                        }
                        return FolderWalk::Unresolved;
                    }
                    None if offers_tag(children.keys()) => return FolderWalk::NeedsTag(path),
                    None if rest.is_empty() => return FolderWalk::Resolved(path),
                    None => return FolderWalk::Unresolved,
                }
            }
            FolderNode::Tags(tags) => {
                if !rest.is_empty() {
                    return FolderWalk::Unresolved;
                }
                return match pending {
                    None if tags.is_empty() => FolderWalk::Resolved(path),
                    None => FolderWalk::NeedsTag(path),
                    Some(t) if tags.iter().any(|label| label == t.as_str()) => {
                        path.push(t.as_str().to_string());
                        FolderWalk::Resolved(path)
                    }
                    Some(_) => FolderWalk::Unresolved,
                };
            }
        }
    }
}

/// Split a sub-pattern path key into sub-folder segments and a tag.
///
/// A `LOOP` / `ONE SHOT` segment at the end of the key is the tag
/// (`KICK/LOOP`). Failing that, one at the start is (`LOOP/PADS`), for
/// taxonomies that branch on the tag first.
pub fn split_path_key(key: &str) -> (Vec<String>, Option<SampleType>) {
    let mut segments: Vec<String> = key
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if let Some(tag) = segments.last().and_then(|s| SampleType::from_label(s)) {
        segments.pop();
        return (segments, Some(tag));
    }
    if let Some(tag) = segments.first().and_then(|s| SampleType::from_label(s)) {
        segments.remove(0);
        return (segments, Some(tag));
    }
    (segments, None)
}

fn offers_tag<'a>(mut labels: impl Iterator<Item = &'a str>) -> bool {
    labels.any(|label| SampleType::from_label(label).is_some())
}

/// Collect every leaf directory below `node`, prefixed with `prefix`.
pub(crate) fn leaf_paths(node: &FolderNode, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
    match node {
        FolderNode::Tags(tags) if tags.is_empty() => out.push(prefix.clone()),
        FolderNode::Tags(tags) => {
            for tag in tags {
                let mut path = prefix.clone();
                path.push(tag.clone());
                out.push(path);
            }
        }
        FolderNode::Branch(children) if children.is_empty() => out.push(prefix.clone()),
        FolderNode::Branch(children) => {
            for (name, child) in children.iter() {
                prefix.push(name.to_string());
                leaf_paths(child, prefix, out);
                prefix.pop();
            }
        }
    }
}
