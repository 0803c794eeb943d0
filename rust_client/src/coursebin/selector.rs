//! Free-text section selectors.
//!
//! A selector is a comma-separated list. Plain entries match a course name,
//! a component or a section id; colon-separated entries narrow down from the
//! course: `csci-356`, `csci-356:lab`, `csci-356:lab:29911`.

use crate::models::node::SectionNode;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionSelector {
    tokens: Vec<String>,
    tuples: Vec<Vec<String>>,
}

impl SectionSelector {
    pub fn parse(text: &str) -> Self {
        let mut selector = Self::default();
        for entry in text.split(',') {
            if entry.contains(':') {
                selector.tuples.push(
                    entry
                        .split(':')
                        .map(|part| part.trim().to_lowercase())
                        .collect(),
                );
            } else {
                let token = entry.trim().to_lowercase();
                if !token.is_empty() {
                    selector.tokens.push(token);
                }
            }
        }
        selector
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.tuples.is_empty()
    }

    pub fn matches(&self, section: &SectionNode) -> bool {
        let course = section.course.to_lowercase();
        let component = section.component.to_lowercase();
        let section_id = section.data.section_id.to_string().to_lowercase();

        let token_hit = self
            .tokens
            .iter()
            .any(|t| *t == course || *t == component || *t == section_id);
        if token_hit {
            return true;
        }

        self.tuples.iter().any(|tuple| match tuple.as_slice() {
            [c] => *c == course,
            [c, comp] => *c == course && *comp == component,
            [c, comp, id, ..] => *c == course && *comp == component && *id == section_id,
            [] => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::node::SectionData;

    fn section(course: &str, component: &str, id: i64) -> SectionNode {
        SectionNode {
            node_id: format!("{}.0.{}.{}", course, component, id),
            key: format!("{}.0.{}.{}", course, component, id),
            parent: format!("{}.0.{}", course, component),
            course: course.into(),
            part: 0,
            component: component.into(),
            exclude: false,
            exempt: false,
            data: SectionData::new(id, component),
        }
    }

    #[test]
    fn test_bare_tokens() {
        let selector = SectionSelector::parse(" Lab , 29911,, ");
        assert!(selector.matches(&section("csci-356", "Lab", 1)));
        assert!(selector.matches(&section("math-225", "Lec", 29911)));
        assert!(!selector.matches(&section("math-225", "Lec", 29912)));
    }

    #[test]
    fn test_bare_token_matches_course() {
        let selector = SectionSelector::parse("CSCI-356");
        assert!(selector.matches(&section("csci-356", "Lec", 1)));
    }

    #[test]
    fn test_tuples() {
        let one = SectionSelector::parse("csci-356:");
        // "csci-356:" splits into ["csci-356", ""], which needs an empty component
        assert!(!one.matches(&section("csci-356", "Lec", 1)));

        let two = SectionSelector::parse("csci-356 : LAB");
        assert!(two.matches(&section("csci-356", "Lab", 1)));
        assert!(!two.matches(&section("csci-356", "Lec", 1)));
        assert!(!two.matches(&section("math-225", "Lab", 1)));

        let three = SectionSelector::parse("csci-356:lab:29911:extra");
        assert!(three.matches(&section("csci-356", "Lab", 29911)));
        assert!(!three.matches(&section("csci-356", "Lab", 29912)));
    }

    #[test]
    fn test_empty_selector_matches_nothing() {
        let selector = SectionSelector::parse("");
        assert!(selector.is_empty());
        assert!(!selector.matches(&section("csci-356", "Lec", 1)));
    }
}
