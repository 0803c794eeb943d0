//! Coursebin slice: the flat node forest and its edits.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::coursebin::{transform_course, SectionSelector};
use crate::models::node::Node;
use crate::models::task::CoursePayload;

fn next_group(nodes: &[Node]) -> u32 {
    nodes
        .iter()
        .filter_map(Node::as_course)
        .map(|c| c.group.unwrap_or(0))
        .max()
        .unwrap_or(0)
        + 1
}

/// Replace a course with freshly fetched data, keeping local edits.
pub fn add_course(nodes: &mut Vec<Node>, payload: &CoursePayload) {
    let previous: HashMap<&str, &Node> = nodes
        .iter()
        .filter(|n| n.course() == payload.name)
        .map(|n| (n.node_id(), n))
        .collect();

    let mut fresh = transform_course(payload);
    let group = next_group(nodes);
    for node in &mut fresh {
        if let Some(old) = previous.get(node.node_id()) {
            node.inherit_from(old);
        }
        if let Some(course) = node.as_course_mut() {
            if course.group.is_none() {
                course.group = Some(group);
            }
        }
    }

    let kept = fresh.len();
    nodes.retain(|n| n.course() != payload.name);
    nodes.extend(fresh);
    log::debug!("Course {} now has {} nodes", payload.name, kept);
}

fn first_with_id<'a>(nodes: &'a mut [Node], node_id: &str) -> Option<&'a mut Node> {
    nodes.iter_mut().find(|n| n.node_id() == node_id)
}

pub fn toggle_include(nodes: &mut [Node], node_id: &str) {
    if let Some(node) = first_with_id(nodes, node_id) {
        let exclude = !node.exclude();
        node.set_exclude(exclude);
    }
}

pub fn toggle_penalize(nodes: &mut [Node], node_id: &str) {
    if let Some(node) = first_with_id(nodes, node_id) {
        let exempt = !node.exempt();
        node.set_exempt(exempt);
    }
}

/// Set `exempt` on a node and everything below it.
///
/// Each id is visited once, so a parent cycle in a loaded coursebin ends
/// the walk instead of looping.
pub fn recursive_set_penalize(nodes: &mut [Node], node_id: &str, exempt: bool) {
    let mut visited: BTreeSet<String> = BTreeSet::new();
    let mut frontier: BTreeSet<String> = BTreeSet::from([node_id.to_string()]);
    while !frontier.is_empty() {
        for node in nodes.iter_mut() {
            if frontier.contains(node.node_id()) {
                node.set_exempt(exempt);
            }
        }
        visited.extend(frontier.iter().cloned());
        frontier = nodes
            .iter()
            .filter(|n| n.parent().is_some_and(|p| frontier.contains(p)))
            .map(|n| n.node_id().to_string())
            .filter(|id| !visited.contains(id))
            .collect();
    }
}

pub fn delete_course(nodes: &mut Vec<Node>, course: &str) {
    nodes.retain(|n| n.course() != course);
}

pub fn set_include_all(nodes: &mut [Node], include: bool) {
    for node in nodes.iter_mut().filter(|n| n.is_section()) {
        node.set_exclude(!include);
    }
}

/// Groups start at 1; `0` is ignored.
pub fn set_group(nodes: &mut [Node], node_id: &str, group: u32) {
    if group == 0 {
        log::warn!("Ignoring group 0 for {}", node_id);
        return;
    }
    if let Some(course) = first_with_id(nodes, node_id).and_then(Node::as_course_mut) {
        course.group = Some(group);
    }
}

/// Number every course 1, 2, 3... in list order.
pub fn reset_groups(nodes: &mut [Node]) {
    for (i, course) in nodes.iter_mut().filter_map(Node::as_course_mut).enumerate() {
        course.group = Some(i as u32 + 1);
    }
}

/// Compact the groups in use to 1..=n, keeping their relative order.
pub fn compact_groups(nodes: &mut [Node]) {
    let used: BTreeSet<u32> = nodes
        .iter()
        .filter_map(Node::as_course)
        .filter_map(|c| c.group)
        .collect();
    let renumber: BTreeMap<u32, u32> = used
        .into_iter()
        .enumerate()
        .map(|(i, g)| (g, i as u32 + 1))
        .collect();
    for course in nodes.iter_mut().filter_map(Node::as_course_mut) {
        course.group = course.group.and_then(|g| renumber.get(&g).copied());
    }
}

/// Exclude closed sections and sections the user is not cleared for.
pub fn filter_selection(
    nodes: &mut [Node],
    exclude_closed: bool,
    cleared_only: bool,
    cleared_sections: &str,
) {
    let cleared = SectionSelector::parse(cleared_sections);
    for section in nodes.iter_mut().filter_map(Node::as_section_mut) {
        section.exclude = (section.data.closed && exclude_closed)
            || (cleared_only && section.data.need_clearance && !cleared.matches(section));
    }
}

/// Mark exactly the selected sections as exempt from penalties.
pub fn filter_penalize(nodes: &mut [Node], exempted_sections: &str) {
    let exempted = SectionSelector::parse(exempted_sections);
    for section in nodes.iter_mut().filter_map(Node::as_section_mut) {
        section.exempt = exempted.matches(section);
    }
}

/// Names of courses that take part in generation, in list order.
pub fn included_course_names(nodes: &[Node]) -> Vec<&str> {
    nodes
        .iter()
        .filter_map(Node::as_course)
        .filter(|c| !c.exclude)
        .map(|c| c.course.as_str())
        .collect()
}
