//! Conversion of a fetched course into coursebin nodes.
//!
//! Sections arrive in registrar order, grouped by type. A course like
//!
//! ```text
//! Lec 1, Lec 2, Lab 3, Lec 4, Dis 5
//! ```
//!
//! becomes two parts, because `Lec` shows up again after `Lab`:
//!
//! ```text
//! course
//! ├── part 0: Lec (1, 2), Lab (3)
//! └── part 1: Lec (4), Dis (5)
//! ```

use std::collections::HashSet;

use crate::models::node::{ComponentNode, CourseNode, Node, PartNode, SectionData, SectionNode};
use crate::models::task::CoursePayload;

fn course_node(payload: &CoursePayload) -> CourseNode {
    CourseNode {
        node_id: payload.name.clone(),
        key: payload.name.clone(),
        course: payload.name.clone(),
        term: payload.term.clone(),
        updated: payload.updated,
        group: None,
        exclude: false,
        exempt: false,
    }
}

fn part_node(course: &CourseNode, part: u32) -> PartNode {
    PartNode {
        node_id: format!("{}.{}", course.node_id, part),
        key: format!("{}.{}", course.key, part),
        parent: course.node_id.clone(),
        course: course.course.clone(),
        part,
        exclude: false,
        exempt: false,
    }
}

fn component_node(part: &PartNode, component: &str) -> ComponentNode {
    ComponentNode {
        node_id: format!("{}.{}", part.node_id, component),
        key: format!("{}.{}", part.key, component),
        parent: part.node_id.clone(),
        course: part.course.clone(),
        part: part.part,
        component: component.to_string(),
        exclude: false,
        exempt: false,
    }
}

fn section_node(component: &ComponentNode, data: &SectionData) -> SectionNode {
    SectionNode {
        node_id: format!("{}.{}", component.node_id, data.section_id),
        key: format!("{}.{}", component.key, data.section_id),
        parent: component.node_id.clone(),
        course: component.course.clone(),
        part: component.part,
        component: component.component.clone(),
        exclude: false,
        exempt: false,
        data: data.clone(),
    }
}

/// Flatten a course payload into its node list.
///
/// The course node comes first, followed by part, component and section
/// nodes in the order they are encountered.
pub fn transform_course(payload: &CoursePayload) -> Vec<Node> {
    let course = course_node(payload);
    let mut nodes = Vec::with_capacity(payload.sections.len() * 2 + 1);

    let mut visited: HashSet<&str> = HashSet::new();
    let mut part: Option<PartNode> = None;
    let mut component: Option<ComponentNode> = None;
    let mut part_count = 0u32;

    nodes.push(Node::Course(course.clone()));

    for section in &payload.sections {
        let section_type = section.section_type.as_str();
        let type_changed = component
            .as_ref()
            .map_or(true, |c| c.component != section_type);

        if type_changed {
            if part.is_none() || visited.contains(section_type) {
                let next = part_node(&course, part_count);
                part_count += 1;
                nodes.push(Node::Part(next.clone()));
                part = Some(next);
                visited.clear();
            }

            // A part is always open at this point.
            if let Some(current_part) = part.as_ref() {
                let next = component_node(current_part, section_type);
                nodes.push(Node::Component(next.clone()));
                component = Some(next);
                visited.insert(section_type);
            }
        }

        if let Some(current) = component.as_ref() {
            nodes.push(Node::Section(section_node(current, section)));
        }
    }

    nodes
}
