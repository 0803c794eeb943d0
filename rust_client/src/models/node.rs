//! Coursebin nodes.
//!
//! A coursebin is a flat, ordered list of nodes forming a forest:
//! course → part → component → section. Every node carries a dot-delimited
//! `node_id` that encodes its ancestry, so `csci-356.0.lecture.29911` is a
//! section of the `lecture` component in part `0` of course `csci-356`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Section identifier as sent by the backend.
///
/// The registrar uses numeric ids but some payloads carry them as strings;
/// the original representation is kept so it round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionId {
    Number(i64),
    Text(String),
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionId::Number(n) => write!(f, "{}", n),
            SectionId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for SectionId {
    fn from(n: i64) -> Self {
        SectionId::Number(n)
    }
}

impl From<&str> for SectionId {
    fn from(s: &str) -> Self {
        SectionId::Text(s.to_string())
    }
}

/// Backend-provided section fields.
///
/// Only the fields the client reads are typed; everything else is kept in
/// `extra` and re-emitted verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionData {
    pub section_id: SectionId,
    pub section_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub need_clearance: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SectionData {
    pub fn new(section_id: impl Into<SectionId>, section_type: impl Into<String>) -> Self {
        Self {
            section_id: section_id.into(),
            section_type: section_type.into(),
            start: None,
            end: None,
            days: None,
            instructor: None,
            location: None,
            closed: false,
            need_clearance: false,
            registered: None,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseNode {
    pub node_id: String,
    pub key: String,
    pub course: String,
    pub term: String,
    pub updated: DateTime<Utc>,
    /// User-assigned bucket; unset until the course enters the coursebin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<u32>,
    #[serde(default)]
    pub exclude: bool,
    #[serde(default)]
    pub exempt: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartNode {
    pub node_id: String,
    pub key: String,
    pub parent: String,
    pub course: String,
    pub part: u32,
    #[serde(default)]
    pub exclude: bool,
    #[serde(default)]
    pub exempt: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentNode {
    pub node_id: String,
    pub key: String,
    pub parent: String,
    pub course: String,
    pub part: u32,
    pub component: String,
    #[serde(default)]
    pub exclude: bool,
    #[serde(default)]
    pub exempt: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionNode {
    pub node_id: String,
    pub key: String,
    pub parent: String,
    pub course: String,
    pub part: u32,
    pub component: String,
    #[serde(default)]
    pub exclude: bool,
    #[serde(default)]
    pub exempt: bool,
    #[serde(flatten)]
    pub data: SectionData,
}

/// One entry of the coursebin forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Course(CourseNode),
    Part(PartNode),
    Component(ComponentNode),
    Section(SectionNode),
}

/// Discriminant of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Course,
    Part,
    Component,
    Section,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Course(_) => NodeKind::Course,
            Node::Part(_) => NodeKind::Part,
            Node::Component(_) => NodeKind::Component,
            Node::Section(_) => NodeKind::Section,
        }
    }

    pub fn node_id(&self) -> &str {
        match self {
            Node::Course(n) => &n.node_id,
            Node::Part(n) => &n.node_id,
            Node::Component(n) => &n.node_id,
            Node::Section(n) => &n.node_id,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Node::Course(n) => &n.key,
            Node::Part(n) => &n.key,
            Node::Component(n) => &n.key,
            Node::Section(n) => &n.key,
        }
    }

    /// Owning node's id; `None` for course nodes.
    pub fn parent(&self) -> Option<&str> {
        match self {
            Node::Course(_) => None,
            Node::Part(n) => Some(&n.parent),
            Node::Component(n) => Some(&n.parent),
            Node::Section(n) => Some(&n.parent),
        }
    }

    pub fn course(&self) -> &str {
        match self {
            Node::Course(n) => &n.course,
            Node::Part(n) => &n.course,
            Node::Component(n) => &n.course,
            Node::Section(n) => &n.course,
        }
    }

    pub fn exclude(&self) -> bool {
        match self {
            Node::Course(n) => n.exclude,
            Node::Part(n) => n.exclude,
            Node::Component(n) => n.exclude,
            Node::Section(n) => n.exclude,
        }
    }

    pub fn exempt(&self) -> bool {
        match self {
            Node::Course(n) => n.exempt,
            Node::Part(n) => n.exempt,
            Node::Component(n) => n.exempt,
            Node::Section(n) => n.exempt,
        }
    }

    pub fn set_exclude(&mut self, exclude: bool) {
        match self {
            Node::Course(n) => n.exclude = exclude,
            Node::Part(n) => n.exclude = exclude,
            Node::Component(n) => n.exclude = exclude,
            Node::Section(n) => n.exclude = exclude,
        }
    }

    pub fn set_exempt(&mut self, exempt: bool) {
        match self {
            Node::Course(n) => n.exempt = exempt,
            Node::Part(n) => n.exempt = exempt,
            Node::Component(n) => n.exempt = exempt,
            Node::Section(n) => n.exempt = exempt,
        }
    }

    pub fn is_section(&self) -> bool {
        matches!(self, Node::Section(_))
    }

    pub fn as_course(&self) -> Option<&CourseNode> {
        match self {
            Node::Course(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_course_mut(&mut self) -> Option<&mut CourseNode> {
        match self {
            Node::Course(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_section(&self) -> Option<&SectionNode> {
        match self {
            Node::Section(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_section_mut(&mut self) -> Option<&mut SectionNode> {
        match self {
            Node::Section(n) => Some(n),
            _ => None,
        }
    }

    /// Carry local state over from the node this one replaces.
    ///
    /// Freshly fetched data wins; the user's flags, the course group and any
    /// backend fields the new payload no longer carries are kept from
    /// `previous`. Nodes of a different kind are left untouched.
    pub fn inherit_from(&mut self, previous: &Node) {
        if self.kind() != previous.kind() {
            return;
        }
        self.set_exclude(previous.exclude());
        self.set_exempt(previous.exempt());
        match (self, previous) {
            (Node::Course(new), Node::Course(old)) => {
                if new.group.is_none() {
                    new.group = old.group;
                }
            }
            (Node::Section(new), Node::Section(old)) => {
                for (key, value) in &old.data.extra {
                    new.data
                        .extra
                        .entry(key.clone())
                        .or_insert_with(|| value.clone());
                }
            }
            _ => {}
        }
    }
}
